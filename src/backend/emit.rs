//! IR to wasm binary encoding.
//!
//! Function index space: host imports, then the runtime helpers, then program functions, then the init function,
//! then target entry points. Linear memory holds scratch space below [`DATA_BASE`], the data segment, a few
//! target-specific constant bytes, and finally the state slots.

use std::borrow::Cow;

use wasm_encoder::{
    CodeSection, ConstExpr, CustomSection, DataSection, EntityType, ExportKind, ExportSection, Function,
    FunctionSection, ImportSection, Instruction, MemArg, MemorySection, MemoryType, Module, TypeSection, ValType,
};

use super::ir::{DATA_BASE, IrFunction, IrModule, Op, RuntimeFn, SLOT_SIZE};
use super::target::{DEBUG_PRINT, FD_WRITE, HostImport, IC_TRAP, MSG_REPLY, MSG_REPLY_DATA_APPEND, PROC_EXIT, Target};

const PAGE_SIZE: u64 = 65536;

/// Custom section naming the target profile.
pub const TARGET_SECTION: &str = "motoko:target";
/// Custom section carrying the Candid interface of a canister.
pub const CANDID_SECTION: &str = "icp:public candid:service";

/// Empty Candid reply: magic, no type table, no values.
const EMPTY_REPLY: &[u8] = b"DIDL\x00\x00";

const WORD: MemArg = MemArg {
    offset: 0,
    align: 2,
    memory_index: 0,
};

/// Encode a lowered program for `target`. `candid` is embedded in canister modules.
pub fn emit(module: &IrModule, target: Target, candid: Option<&str>) -> Vec<u8> {
    Emitter::new(module, target).finish(candid)
}

/// Deduplicated function types.
#[derive(Default)]
struct Types {
    sigs: Vec<(Vec<ValType>, Vec<ValType>)>,
}

impl Types {
    fn index(&mut self, params: &[ValType], results: &[ValType]) -> u32 {
        if let Some(i) = self.sigs.iter().position(|(p, r)| p == params && r == results) {
            return i as u32;
        }
        self.sigs.push((params.to_vec(), results.to_vec()));
        (self.sigs.len() - 1) as u32
    }

    fn section(&self) -> TypeSection {
        let mut section = TypeSection::new();
        for (params, results) in &self.sigs {
            section.ty().function(params.iter().copied(), results.iter().copied());
        }
        section
    }
}

/// Memory addresses fixed once the data segment is known.
struct Layout {
    /// Target constant bytes: a newline for WASI, the empty reply for IC.
    extra_addr: u32,
    extra: &'static [u8],
    slot_base: u32,
    pages: u64,
}

impl Layout {
    fn new(module: &IrModule, target: Target) -> Self {
        let extra: &'static [u8] = match target {
            Target::Wasi => b"\n",
            Target::InternetComputer => EMPTY_REPLY,
        };
        let extra_addr = DATA_BASE + module.data.len() as u32;
        let end = extra_addr + extra.len() as u32;
        let slot_base = end.div_ceil(SLOT_SIZE) * SLOT_SIZE;
        let top = u64::from(slot_base) + u64::from(module.slots) * u64::from(SLOT_SIZE);
        Self {
            extra_addr,
            extra,
            slot_base,
            pages: top.div_ceil(PAGE_SIZE).max(1),
        }
    }
}

struct Emitter<'a> {
    module: &'a IrModule,
    target: Target,
    layout: Layout,
    types: Types,
    imports: ImportSection,
    functions: FunctionSection,
    exports: ExportSection,
    code: CodeSection,
}

impl<'a> Emitter<'a> {
    fn new(module: &'a IrModule, target: Target) -> Self {
        Self {
            module,
            target,
            layout: Layout::new(module, target),
            types: Types::default(),
            imports: ImportSection::new(),
            functions: FunctionSection::new(),
            exports: ExportSection::new(),
            code: CodeSection::new(),
        }
    }

    fn import_count(&self) -> u32 {
        self.target.imports().len() as u32
    }

    fn host(&self, import: HostImport) -> u32 {
        // Every helper only calls imports of its own target.
        self.target.import_index(import).unwrap_or(0)
    }

    fn runtime_index(&self, helper: RuntimeFn) -> u32 {
        self.import_count() + helper.index()
    }

    fn user_index(&self, func: u32) -> u32 {
        self.import_count() + RuntimeFn::ALL.len() as u32 + func
    }

    fn init_index(&self) -> u32 {
        self.user_index(self.module.functions.len() as u32)
    }

    /// Next function index to be defined.
    fn next_index(&self) -> u32 {
        self.import_count() + self.functions.len()
    }

    fn define(&mut self, params: &[ValType], results: &[ValType], body: &Function) -> u32 {
        let index = self.next_index();
        let ty = self.types.index(params, results);
        self.functions.function(ty);
        self.code.function(body);
        index
    }

    fn finish(mut self, candid: Option<&str>) -> Vec<u8> {
        for import in self.target.imports() {
            let ty = self.types.index(import.params, import.results);
            self.imports.import(import.module, import.name, EntityType::Function(ty));
        }
        for helper in RuntimeFn::ALL {
            let body = self.runtime_body(helper);
            self.define(&[ValType::I64], &[], &body);
        }
        let module = self.module;
        for func in &module.functions {
            let body = self.lower_body(func);
            let params = vec![ValType::I64; func.params as usize];
            let results: &[ValType] = if func.returns { &[ValType::I64] } else { &[] };
            self.define(&params, results, &body);
        }
        let init = self.lower_body(&module.init);
        let init_index = self.define(&[], &[], &init);
        match self.target {
            Target::Wasi => self.wasi_entry(init_index),
            Target::InternetComputer => self.canister_entries(init_index),
        }

        let mut memories = MemorySection::new();
        memories.memory(MemoryType {
            minimum: self.layout.pages,
            maximum: None,
            memory64: false,
            shared: false,
            page_size_log2: None,
        });
        if self.target == Target::Wasi {
            self.exports.export("memory", ExportKind::Memory, 0);
        }

        let mut data = DataSection::new();
        if !module.data.is_empty() {
            data.active(0, &ConstExpr::i32_const(DATA_BASE as i32), module.data.iter().copied());
        }
        data.active(
            0,
            &ConstExpr::i32_const(self.layout.extra_addr as i32),
            self.layout.extra.iter().copied(),
        );

        let mut wasm = Module::new();
        wasm.section(&self.types.section());
        wasm.section(&self.imports);
        wasm.section(&self.functions);
        wasm.section(&memories);
        wasm.section(&self.exports);
        wasm.section(&self.code);
        wasm.section(&data);
        wasm.section(&CustomSection {
            name: Cow::Borrowed(TARGET_SECTION),
            data: Cow::Borrowed(self.target.as_str().as_bytes()),
        });
        if let (Target::InternetComputer, Some(candid)) = (self.target, candid) {
            wasm.section(&CustomSection {
                name: Cow::Borrowed(CANDID_SECTION),
                data: Cow::Borrowed(candid.as_bytes()),
            });
        }
        wasm.finish()
    }

    fn lower_body(&self, func: &IrFunction) -> Function {
        let mut body = Function::new([(func.locals, ValType::I64)]);
        for op in &func.body {
            match op {
                Op::Ins(ins) => body.instruction(ins),
                Op::CallUser(index) => body.instruction(&Instruction::Call(self.user_index(*index))),
                Op::CallRuntime(helper) => body.instruction(&Instruction::Call(self.runtime_index(*helper))),
                Op::SlotAddr(slot) => {
                    let addr = self.layout.slot_base + slot * SLOT_SIZE;
                    body.instruction(&Instruction::I32Const(addr as i32))
                }
            };
        }
        body.instruction(&Instruction::End);
        body
    }

    // ========================================================================
    // Runtime helpers
    // ========================================================================

    /// Both helpers take one packed text argument.
    fn runtime_body(&self, helper: RuntimeFn) -> Function {
        let mut f = Function::new([]);
        match (self.target, helper) {
            (Target::Wasi, RuntimeFn::Print) => self.wasi_print(&mut f),
            (Target::Wasi, RuntimeFn::Trap) => {
                self.wasi_print(&mut f);
                f.instruction(&Instruction::I32Const(1));
                f.instruction(&Instruction::Call(self.host(PROC_EXIT)));
                f.instruction(&Instruction::Unreachable);
            }
            (Target::InternetComputer, RuntimeFn::Print) => {
                text_ptr_len(&mut f);
                f.instruction(&Instruction::Call(self.host(DEBUG_PRINT)));
            }
            (Target::InternetComputer, RuntimeFn::Trap) => {
                text_ptr_len(&mut f);
                f.instruction(&Instruction::Call(self.host(IC_TRAP)));
                f.instruction(&Instruction::Unreachable);
            }
        }
        f.instruction(&Instruction::End);
        f
    }

    /// Write the text and a newline to stdout as two iovecs at address 0; `nwritten` goes to address 16.
    fn wasi_print(&self, f: &mut Function) {
        f.instruction(&Instruction::I32Const(0));
        f.instruction(&Instruction::LocalGet(0));
        f.instruction(&Instruction::I64Const(32));
        f.instruction(&Instruction::I64ShrU);
        f.instruction(&Instruction::I32WrapI64);
        f.instruction(&Instruction::I32Store(WORD));
        f.instruction(&Instruction::I32Const(4));
        f.instruction(&Instruction::LocalGet(0));
        f.instruction(&Instruction::I32WrapI64);
        f.instruction(&Instruction::I32Store(WORD));
        for (addr, value) in [(8, self.layout.extra_addr as i32), (12, 1)] {
            f.instruction(&Instruction::I32Const(addr));
            f.instruction(&Instruction::I32Const(value));
            f.instruction(&Instruction::I32Store(WORD));
        }
        for arg in [1, 0, 2, 16] {
            f.instruction(&Instruction::I32Const(arg));
        }
        f.instruction(&Instruction::Call(self.host(FD_WRITE)));
        f.instruction(&Instruction::Drop);
    }

    // ========================================================================
    // Entry points
    // ========================================================================

    fn wasi_entry(&mut self, init_index: u32) {
        let mut start = Function::new([]);
        start.instruction(&Instruction::Call(init_index));
        start.instruction(&Instruction::I32Const(0));
        start.instruction(&Instruction::Call(self.host(PROC_EXIT)));
        start.instruction(&Instruction::End);
        let index = self.define(&[], &[], &start);
        self.exports.export("_start", ExportKind::Func, index);
    }

    fn canister_entries(&mut self, init_index: u32) {
        self.exports.export("canister_init", ExportKind::Func, init_index);
        let module = self.module;
        for method in &module.methods {
            let mut wrapper = Function::new([]);
            for _ in 0..method.arity {
                wrapper.instruction(&Instruction::I64Const(0));
            }
            wrapper.instruction(&Instruction::Call(self.user_index(method.func)));
            wrapper.instruction(&Instruction::Drop);
            if !method.oneway {
                wrapper.instruction(&Instruction::I32Const(self.layout.extra_addr as i32));
                wrapper.instruction(&Instruction::I32Const(EMPTY_REPLY.len() as i32));
                wrapper.instruction(&Instruction::Call(self.host(MSG_REPLY_DATA_APPEND)));
                wrapper.instruction(&Instruction::Call(self.host(MSG_REPLY)));
            }
            wrapper.instruction(&Instruction::End);
            let index = self.define(&[], &[], &wrapper);
            let kind = if method.query { "canister_query" } else { "canister_update" };
            self.exports.export(&format!("{kind} {}", method.name), ExportKind::Func, index);
        }
        debug_assert_eq!(self.init_index() + 1 + module.methods.len() as u32, self.next_index());
    }
}

/// Unpack the text argument (local 0) into `ptr, len` as `i32`s.
fn text_ptr_len(f: &mut Function) {
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I64Const(32));
    f.instruction(&Instruction::I64ShrU);
    f.instruction(&Instruction::I32WrapI64);
    f.instruction(&Instruction::LocalGet(0));
    f.instruction(&Instruction::I32WrapI64);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::ir::IrMethod;

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn sample() -> IrModule {
        let mut module = IrModule::default();
        let hello = module.text(b"hello");
        module.slots = 1;
        module.functions.push(IrFunction {
            name: "main".into(),
            params: 0,
            locals: 0,
            returns: true,
            body: vec![Op::SlotAddr(0), Op::Ins(Instruction::I64Load(MemArg {
                offset: 0,
                align: 3,
                memory_index: 0,
            }))],
        });
        module.init = IrFunction {
            name: "init".into(),
            body: vec![Op::Ins(Instruction::I64Const(hello)), Op::CallRuntime(RuntimeFn::Print)],
            ..IrFunction::default()
        };
        module.methods.push(IrMethod {
            name: "main".into(),
            func: 0,
            arity: 0,
            query: true,
            oneway: false,
        });
        module
    }

    #[test]
    fn modules_start_with_the_wasm_header() {
        for target in [Target::Wasi, Target::InternetComputer] {
            let bytes = emit(&sample(), target, None);
            assert_eq!(&bytes[..8], b"\0asm\x01\0\0\0");
        }
    }

    #[test]
    fn wasi_modules_export_start_and_memory() {
        let bytes = emit(&sample(), Target::Wasi, None);
        assert!(contains(&bytes, b"_start"));
        assert!(contains(&bytes, b"fd_write"));
        assert!(contains(&bytes, b"hello"));
        assert!(!contains(&bytes, b"canister_query"));
        assert!(contains(&bytes, TARGET_SECTION.as_bytes()));
    }

    #[test]
    fn canister_modules_export_methods_and_interface() {
        let bytes = emit(&sample(), Target::InternetComputer, Some("service : {}\n"));
        assert!(contains(&bytes, b"canister_init"));
        assert!(contains(&bytes, b"canister_query main"));
        assert!(contains(&bytes, b"msg_reply"));
        assert!(contains(&bytes, CANDID_SECTION.as_bytes()));
        assert!(contains(&bytes, b"service : {}"));
        assert!(!contains(&bytes, b"_start"));
    }

    #[test]
    fn slots_follow_the_data_segment() {
        let module = sample();
        let layout = Layout::new(&module, Target::InternetComputer);
        assert_eq!(layout.extra_addr, DATA_BASE + 5);
        assert_eq!(layout.slot_base, 80);
        assert_eq!(layout.pages, 1);
    }
}
