//! Typed AST to wasm IR lowering.
//!
//! Lowers the entry unit of a checked program:
//! - top-level and actor-level `let`/`var` bindings live in memory state slots, initialized by the init function;
//! - functions declared anywhere become wasm functions over `i64` values;
//! - local bindings inside functions and blocks become wasm locals;
//! - `mo:prim` calls map to runtime helpers.
//!
//! ## Notes
//! - Constructs without a lowering (floats, text operations, aggregates, closures, pattern matching) compile to
//!   `unreachable`, so the artifact is always produced and traps only if such code runs.
//! - Static types come from the unit's [`TypeCheckInfo`]; lowering never re-derives them.

use std::collections::{HashMap, HashSet};

use motoko_core::lang::prims::PrimTypeId;
use motoko_syntax::ast::*;
use wasm_encoder::{BlockType, Instruction, MemArg, ValType};

use super::CodegenError;
use super::ir::{IrFunction, IrMethod, IrModule, Op, RuntimeFn};
use crate::frontend::resolver::{ImportKey, ResolvedUnit};
use crate::frontend::semantic::TypeCheckInfo;
use crate::frontend::types::{FuncSort, Type};

const SLOT_MEMARG: MemArg = MemArg {
    offset: 0,
    align: 3,
    memory_index: 0,
};

/// Lower the unit's program to IR.
#[tracing::instrument(skip_all, fields(unit = %unit.path))]
pub fn lower_unit(unit: &ResolvedUnit) -> Result<IrModule, CodegenError> {
    let prim_aliases = unit
        .program
        .imports()
        .filter(|(import, _)| {
            unit.imports
                .iter()
                .any(|i| i.written == import.path.node && i.key == ImportKey::Prim)
        })
        .map(|(import, _)| import.name.node.clone())
        .collect();
    let mut lowering = Lowering::new(&unit.info, prim_aliases);
    lowering.lower_program(&unit.program);
    let module = lowering.finish();
    if module.data.len() > u32::MAX as usize / 2 {
        return Err(CodegenError::DataTooLarge {
            size: module.data.len(),
        });
    }
    tracing::debug!(
        functions = module.functions.len(),
        methods = module.methods.len(),
        data = module.data.len(),
        "lowered unit"
    );
    Ok(module)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// A local of the function with the given context id.
    Local { owner: u32, index: u32 },
    Slot(u32),
    Func(u32),
}

/// The function being lowered.
#[derive(Default)]
struct FnCtx {
    id: u32,
    params: u32,
    locals: u32,
    returns: bool,
    ops: Vec<Op>,
}

struct Lowering<'a> {
    info: &'a TypeCheckInfo,
    prim_aliases: HashSet<String>,
    module: IrModule,
    arities: Vec<u32>,
    scopes: Vec<HashMap<String, Binding>>,
    cur: FnCtx,
    next_ctx: u32,
    texts: HashMap<Vec<u8>, i64>,
}

impl<'a> Lowering<'a> {
    fn new(info: &'a TypeCheckInfo, prim_aliases: HashSet<String>) -> Self {
        Self {
            info,
            prim_aliases,
            module: IrModule::default(),
            arities: Vec::new(),
            scopes: vec![HashMap::new()],
            cur: FnCtx::default(),
            next_ctx: 1,
            texts: HashMap::new(),
        }
    }

    fn finish(mut self) -> IrModule {
        self.module.init = IrFunction {
            name: "init".into(),
            params: 0,
            locals: self.cur.locals,
            returns: false,
            body: std::mem::take(&mut self.cur.ops),
        };
        self.module
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn ins(&mut self, ins: Instruction<'static>) {
        self.cur.ops.push(Op::Ins(ins));
    }

    fn op(&mut self, op: Op) {
        self.cur.ops.push(op);
    }

    fn unsupported(&mut self, construct: &'static str) {
        tracing::debug!(construct, "no lowering; emitting trap");
        self.ins(Instruction::Unreachable);
    }

    fn unit(&mut self) {
        self.ins(Instruction::I64Const(0));
    }

    fn new_local(&mut self) -> u32 {
        let index = self.cur.params + self.cur.locals;
        self.cur.locals += 1;
        index
    }

    fn new_slot(&mut self) -> u32 {
        let slot = self.module.slots;
        self.module.slots += 1;
        slot
    }

    fn bind(&mut self, name: &str, binding: Binding) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.to_string(), binding);
        }
    }

    fn lookup(&self, name: &str) -> Option<Binding> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    fn prim_of(&self, id: ExpId) -> Option<PrimTypeId> {
        self.info.exp_type(id).and_then(Type::as_prim)
    }

    fn text(&mut self, text: &str) -> i64 {
        if let Some(packed) = self.texts.get(text.as_bytes()) {
            return *packed;
        }
        let packed = self.module.text(text.as_bytes());
        self.texts.insert(text.as_bytes().to_vec(), packed);
        packed
    }

    /// Push the value of a binding.
    fn load(&mut self, binding: Binding) {
        match binding {
            Binding::Local { owner, index } if owner == self.cur.id => self.ins(Instruction::LocalGet(index)),
            Binding::Slot(slot) => {
                self.op(Op::SlotAddr(slot));
                self.ins(Instruction::I64Load(SLOT_MEMARG));
            }
            Binding::Local { .. } => self.unsupported("captured local"),
            Binding::Func(_) => self.unsupported("function value"),
        }
    }

    /// Store the value produced by `value` into a binding.
    fn store(&mut self, binding: Binding, value: impl FnOnce(&mut Self)) {
        match binding {
            Binding::Local { owner, index } if owner == self.cur.id => {
                value(self);
                self.ins(Instruction::LocalSet(index));
            }
            Binding::Slot(slot) => {
                self.op(Op::SlotAddr(slot));
                value(self);
                self.ins(Instruction::I64Store(SLOT_MEMARG));
            }
            _ => {
                value(self);
                self.ins(Instruction::Drop);
                self.unsupported("assignment to captured binding");
            }
        }
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    fn lower_program(&mut self, program: &Program) {
        self.declare(&program.decs, true);
        for field in &program.decs {
            if self.lower_dec(field, true) {
                self.ins(Instruction::Drop);
            }
        }
    }

    /// Bind the names of a declaration list ahead of its lowering.
    fn declare(&mut self, fields: &[DecField], top: bool) {
        for field in fields {
            match &field.dec.node {
                Dec::Func(dec) => self.declare_func(&dec.name.node, dec.func.params.len() as u32),
                Dec::Let(dec) if top => {
                    for name in dec.pat.bound_names() {
                        let slot = self.new_slot();
                        self.bind(name, Binding::Slot(slot));
                    }
                }
                Dec::Var(dec) if top => {
                    let slot = self.new_slot();
                    self.bind(&dec.name.node, Binding::Slot(slot));
                }
                Dec::Object(dec) if top && dec.sort == ObjSort::Actor => self.declare(&dec.fields, true),
                Dec::Class(dec) if top && dec.sort == ObjSort::Actor => {
                    for param in &dec.params {
                        let slot = self.new_slot();
                        self.bind(&param.name.node, Binding::Slot(slot));
                    }
                    self.declare(&dec.fields, true);
                }
                _ => {}
            }
        }
    }

    fn declare_func(&mut self, name: &str, arity: u32) {
        let index = self.module.functions.len() as u32;
        self.module.functions.push(IrFunction {
            name: name.to_string(),
            params: arity,
            ..IrFunction::default()
        });
        self.arities.push(arity);
        self.bind(name, Binding::Func(index));
    }

    /// Lower one declaration. Returns whether it pushed a value.
    fn lower_dec(&mut self, field: &DecField, top: bool) -> bool {
        match &field.dec.node {
            Dec::Exp(exp) => {
                self.lower_exp(exp);
                true
            }
            Dec::Let(dec) => {
                self.lower_let(&dec.pat, &dec.exp, top);
                false
            }
            Dec::Var(dec) => {
                let binding = match self.lookup(&dec.name.node) {
                    Some(binding @ Binding::Slot(_)) if top => binding,
                    _ => {
                        let index = self.new_local();
                        let binding = Binding::Local {
                            owner: self.cur.id,
                            index,
                        };
                        self.bind(&dec.name.node, binding);
                        binding
                    }
                };
                self.store(binding, |this| this.lower_exp(&dec.exp));
                false
            }
            Dec::Func(dec) => {
                if let Some(Binding::Func(index)) = self.lookup(&dec.name.node) {
                    self.lower_function(index, &dec.func);
                }
                false
            }
            Dec::Object(dec) if top && dec.sort == ObjSort::Actor => {
                self.lower_actor_body(&dec.fields);
                false
            }
            Dec::Class(dec) if top && dec.sort == ObjSort::Actor => {
                self.lower_actor_body(&dec.fields);
                false
            }
            Dec::Object(_) | Dec::Module(_) | Dec::Class(_) => {
                tracing::debug!("skipping nested object declaration");
                false
            }
            Dec::Type(_) | Dec::Import(_) | Dec::Error => false,
        }
    }

    fn lower_let(&mut self, pat: &Pat, exp: &Exp, top: bool) {
        let name = match &pat.kind {
            PatKind::Var(name) => Some(name),
            PatKind::Annot(inner, _) => match &inner.kind {
                PatKind::Var(name) => Some(name),
                _ => None,
            },
            _ => None,
        };
        let Some(name) = name else {
            self.lower_exp(exp);
            self.ins(Instruction::Drop);
            if !pat.bound_names().is_empty() {
                self.unsupported("destructuring pattern");
            }
            return;
        };
        let binding = match self.lookup(name) {
            Some(binding @ Binding::Slot(_)) if top => binding,
            _ => {
                let index = self.new_local();
                let binding = Binding::Local {
                    owner: self.cur.id,
                    index,
                };
                self.bind(name, binding);
                binding
            }
        };
        self.store(binding, |this| this.lower_exp(exp));
    }

    fn lower_actor_body(&mut self, fields: &[DecField]) {
        for field in fields {
            self.lower_dec(field, true);
            let Dec::Func(dec) = &field.dec.node else {
                continue;
            };
            if !field.is_public() {
                continue;
            }
            let Some(Binding::Func(func)) = self.lookup(&dec.name.node) else {
                continue;
            };
            let Some(sig) = self.info.scope.function(&dec.name.node) else {
                continue;
            };
            self.module.methods.push(IrMethod {
                name: dec.name.node.clone(),
                func,
                arity: sig.func.params.len() as u32,
                query: sig.func.sort == FuncSort::Query,
                oneway: !matches!(sig.func.ret, Type::Async(_)),
            });
        }
    }

    fn lower_function(&mut self, index: u32, func: &FuncLit) {
        let params = func.params.len() as u32;
        let ctx = FnCtx {
            id: self.next_ctx,
            params,
            locals: 0,
            returns: true,
            ops: Vec::new(),
        };
        self.next_ctx += 1;
        let outer = std::mem::replace(&mut self.cur, ctx);
        self.scopes.push(HashMap::new());
        for (i, param) in func.params.iter().enumerate() {
            let binding = Binding::Local {
                owner: self.cur.id,
                index: i as u32,
            };
            self.bind(&param.name.node, binding);
        }
        self.lower_exp(&func.body);
        self.scopes.pop();
        let ctx = std::mem::replace(&mut self.cur, outer);

        if let Some(slot) = self.module.functions.get_mut(index as usize) {
            slot.params = params;
            slot.locals = ctx.locals;
            slot.returns = true;
            slot.body = ctx.ops;
        }
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    /// Lower `exp`, leaving exactly one `i64` on the stack.
    fn lower_exp(&mut self, exp: &Exp) {
        match &exp.kind {
            ExpKind::Lit(lit) => self.lower_lit(lit),
            ExpKind::Var(name) => match self.lookup(name) {
                Some(binding) => self.load(binding),
                None => self.unsupported("unbound variable"),
            },
            ExpKind::Unary(op, operand) => match op {
                UnOp::Neg => {
                    self.ins(Instruction::I64Const(0));
                    self.lower_exp(operand);
                    self.ins(Instruction::I64Sub);
                }
                UnOp::Pos => self.lower_exp(operand),
                UnOp::Not => {
                    self.lower_exp(operand);
                    self.ins(Instruction::I64Eqz);
                    self.ins(Instruction::I64ExtendI32U);
                }
            },
            ExpKind::Binary(lhs, op, rhs) => {
                let prim = self.prim_of(exp.id);
                let Some(ins) = arith(*op, prim) else {
                    self.unsupported("non-integral arithmetic");
                    return;
                };
                self.lower_exp(lhs);
                self.lower_exp(rhs);
                self.ins(ins);
                if *op == BinOp::Sub && prim == Some(PrimTypeId::Nat) {
                    self.check_natural();
                }
            }
            ExpKind::Compare(lhs, op, rhs) => {
                if !self.prim_of(lhs.id).is_some_and(is_scalar) {
                    self.unsupported("non-scalar comparison");
                    return;
                }
                self.lower_exp(lhs);
                self.lower_exp(rhs);
                self.ins(compare(*op));
                self.ins(Instruction::I64ExtendI32U);
            }
            ExpKind::And(lhs, rhs) => {
                self.lower_exp(lhs);
                self.ins(Instruction::I32WrapI64);
                self.ins(Instruction::If(BlockType::Result(ValType::I64)));
                self.lower_exp(rhs);
                self.ins(Instruction::Else);
                self.ins(Instruction::I64Const(0));
                self.ins(Instruction::End);
            }
            ExpKind::Or(lhs, rhs) => {
                self.lower_exp(lhs);
                self.ins(Instruction::I32WrapI64);
                self.ins(Instruction::If(BlockType::Result(ValType::I64)));
                self.ins(Instruction::I64Const(1));
                self.ins(Instruction::Else);
                self.lower_exp(rhs);
                self.ins(Instruction::End);
            }
            ExpKind::Assign(target, value) => {
                match &target.kind {
                    ExpKind::Var(name) => match self.lookup(name) {
                        Some(binding) => self.store(binding, |this| this.lower_exp(value)),
                        None => self.unsupported("unbound assignment target"),
                    },
                    _ => self.unsupported("structured assignment target"),
                }
                self.unit();
            }
            ExpKind::OpAssign(target, op, value) => {
                let prim = self.prim_of(target.id);
                let binding = match &target.kind {
                    ExpKind::Var(name) => self.lookup(name),
                    _ => None,
                };
                match (binding, arith(*op, prim)) {
                    (Some(binding), Some(ins)) => self.store(binding, |this| {
                        this.load(binding);
                        this.lower_exp(value);
                        this.ins(ins);
                        if *op == BinOp::Sub && prim == Some(PrimTypeId::Nat) {
                            this.check_natural();
                        }
                    }),
                    _ => self.unsupported("compound assignment"),
                }
                self.unit();
            }
            ExpKind::Tuple(elems) if elems.is_empty() => self.unit(),
            ExpKind::Block(decs) => self.lower_block(decs),
            ExpKind::If(cond, then, els) => {
                self.lower_exp(cond);
                self.ins(Instruction::I32WrapI64);
                self.ins(Instruction::If(BlockType::Result(ValType::I64)));
                self.lower_exp(then);
                self.ins(Instruction::Else);
                match els {
                    Some(els) => self.lower_exp(els),
                    None => self.unit(),
                }
                self.ins(Instruction::End);
            }
            ExpKind::While(cond, body) => {
                self.ins(Instruction::Block(BlockType::Empty));
                self.ins(Instruction::Loop(BlockType::Empty));
                self.lower_exp(cond);
                self.ins(Instruction::I32WrapI64);
                self.ins(Instruction::I32Eqz);
                self.ins(Instruction::BrIf(1));
                self.lower_exp(body);
                self.ins(Instruction::Drop);
                self.ins(Instruction::Br(0));
                self.ins(Instruction::End);
                self.ins(Instruction::End);
                self.unit();
            }
            ExpKind::Loop(body) => {
                self.ins(Instruction::Loop(BlockType::Empty));
                self.lower_exp(body);
                self.ins(Instruction::Drop);
                self.ins(Instruction::Br(0));
                self.ins(Instruction::End);
                self.unit();
            }
            ExpKind::Return(value) => {
                if !self.cur.returns {
                    self.unsupported("return outside function");
                    return;
                }
                match value {
                    Some(value) => self.lower_exp(value),
                    None => self.unit(),
                }
                self.ins(Instruction::Return);
            }
            ExpKind::Ignore(inner) => {
                self.lower_exp(inner);
                self.ins(Instruction::Drop);
                self.unit();
            }
            ExpKind::Assert(cond) => {
                self.lower_exp(cond);
                self.ins(Instruction::I64Eqz);
                self.ins(Instruction::If(BlockType::Empty));
                self.ins(Instruction::Unreachable);
                self.ins(Instruction::End);
                self.unit();
            }
            ExpKind::Async(inner) | ExpKind::Await(inner) | ExpKind::Annot(inner, _) => self.lower_exp(inner),
            ExpKind::Call { func, arg, .. } => self.lower_call(func, arg),
            ExpKind::Tuple(_) => self.unsupported("tuple"),
            ExpKind::Record(_) => self.unsupported("record"),
            ExpKind::Array { .. } => self.unsupported("array"),
            ExpKind::Opt(_) => self.unsupported("option"),
            ExpKind::Dot(..) | ExpKind::Proj(..) | ExpKind::Index(..) => self.unsupported("member access"),
            ExpKind::For(..) => self.unsupported("for loop"),
            ExpKind::Switch(..) => self.unsupported("switch"),
            ExpKind::Show(_) => self.unsupported("debug_show"),
            ExpKind::Func(_) => self.unsupported("function expression"),
            ExpKind::Error => self.unsupported("error placeholder"),
        }
    }

    fn lower_lit(&mut self, lit: &Lit) {
        match lit {
            Lit::Nat(digits) => match digits.parse::<i64>() {
                Ok(value) => self.ins(Instruction::I64Const(value)),
                Err(_) => self.unsupported("literal beyond 64 bits"),
            },
            Lit::Bool(b) => self.ins(Instruction::I64Const(i64::from(*b))),
            Lit::Char(c) => self.ins(Instruction::I64Const(i64::from(u32::from(*c)))),
            Lit::Null => self.unit(),
            Lit::Text(text) => {
                let packed = self.text(text);
                self.ins(Instruction::I64Const(packed));
            }
            Lit::Float(_) => self.unsupported("float literal"),
        }
    }

    /// Trap if the `i64` on top of the stack is negative.
    fn check_natural(&mut self) {
        let tmp = self.new_local();
        self.ins(Instruction::LocalTee(tmp));
        self.ins(Instruction::I64Const(0));
        self.ins(Instruction::I64LtS);
        self.ins(Instruction::If(BlockType::Empty));
        let message = self.text("Natural subtraction underflow");
        self.ins(Instruction::I64Const(message));
        self.op(Op::CallRuntime(RuntimeFn::Trap));
        self.ins(Instruction::End);
        self.ins(Instruction::LocalGet(tmp));
    }

    fn lower_block(&mut self, decs: &[DecField]) {
        if decs.is_empty() {
            self.unit();
            return;
        }
        self.scopes.push(HashMap::new());
        self.declare(decs, false);
        for (i, field) in decs.iter().enumerate() {
            let pushed = self.lower_dec(field, false);
            let last = i + 1 == decs.len();
            match (pushed, last) {
                (true, false) => self.ins(Instruction::Drop),
                (false, true) => self.block_result(field),
                _ => {}
            }
        }
        self.scopes.pop();
    }

    /// Value of a block ending in a non-expression declaration.
    fn block_result(&mut self, field: &DecField) {
        let name = match &field.dec.node {
            Dec::Let(dec) => dec.pat.bound_names().first().map(|n| n.to_string()),
            _ => None,
        };
        match name.and_then(|n| self.lookup(&n)) {
            Some(binding) => self.load(binding),
            None => self.unit(),
        }
    }

    fn lower_call(&mut self, func: &Exp, arg: &Exp) {
        match &func.kind {
            ExpKind::Var(name) => match self.lookup(name) {
                Some(Binding::Func(index)) => {
                    let arity = self.arities.get(index as usize).copied().unwrap_or(0);
                    self.lower_args(arg, arity);
                    self.op(Op::CallUser(index));
                }
                _ => self.unsupported("indirect call"),
            },
            ExpKind::Dot(receiver, member) => {
                let prim = match &receiver.kind {
                    ExpKind::Var(alias) => self.prim_aliases.contains(alias) && self.lookup(alias).is_none(),
                    _ => false,
                };
                if !prim {
                    self.unsupported("method call");
                    return;
                }
                self.lower_prim_call(&member.node, arg);
            }
            _ => self.unsupported("indirect call"),
        }
    }

    fn lower_prim_call(&mut self, name: &str, arg: &Exp) {
        match name {
            "debugPrint" => {
                self.lower_exp(arg);
                self.op(Op::CallRuntime(RuntimeFn::Print));
                self.unit();
            }
            "trap" => {
                self.lower_exp(arg);
                self.op(Op::CallRuntime(RuntimeFn::Trap));
                self.ins(Instruction::Unreachable);
            }
            "textSize" => {
                self.lower_exp(arg);
                self.ins(Instruction::I64Const(0xffff_ffff));
                self.ins(Instruction::I64And);
            }
            _ => self.unsupported("primitive"),
        }
    }

    fn lower_args(&mut self, arg: &Exp, arity: u32) {
        match (arity, &arg.kind) {
            (0, ExpKind::Tuple(elems)) if elems.is_empty() => {}
            (0, _) => {
                self.lower_exp(arg);
                self.ins(Instruction::Drop);
            }
            (1, _) => self.lower_exp(arg),
            (n, ExpKind::Tuple(elems)) if elems.len() == n as usize => {
                for elem in elems {
                    self.lower_exp(elem);
                }
            }
            _ => self.unsupported("tuple argument"),
        }
    }
}

fn is_scalar(prim: PrimTypeId) -> bool {
    !matches!(prim, PrimTypeId::Text | PrimTypeId::Blob | PrimTypeId::Float | PrimTypeId::Principal)
}

/// Instruction for an arithmetic operator on values of type `prim`; `None` when there is none.
fn arith(op: BinOp, prim: Option<PrimTypeId>) -> Option<Instruction<'static>> {
    let prim = prim?;
    if !motoko_core::lang::prims::is_integral(prim) {
        return None;
    }
    let unsigned = motoko_core::lang::prims::is_unsigned(prim);
    Some(match op {
        BinOp::Add => Instruction::I64Add,
        BinOp::Sub => Instruction::I64Sub,
        BinOp::Mul => Instruction::I64Mul,
        BinOp::Div if unsigned => Instruction::I64DivU,
        BinOp::Div => Instruction::I64DivS,
        BinOp::Mod if unsigned => Instruction::I64RemU,
        BinOp::Mod => Instruction::I64RemS,
        BinOp::Pow | BinOp::Cat => return None,
    })
}

fn compare(op: RelOp) -> Instruction<'static> {
    match op {
        RelOp::Eq => Instruction::I64Eq,
        RelOp::Neq => Instruction::I64Ne,
        RelOp::Lt => Instruction::I64LtS,
        RelOp::Le => Instruction::I64LeS,
        RelOp::Gt => Instruction::I64GtS,
        RelOp::Ge => Instruction::I64GeS,
    }
}
