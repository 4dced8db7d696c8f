//! Target-independent wasm IR.
//!
//! Lowering produces straight wasm instructions plus a few symbolic operations whose encoding depends on the target
//! (function indices shift with the number of host imports) or on the final memory layout (state slot addresses
//! follow the data segment).
//!
//! Every Motoko value is a single `i64`: numbers and `Char`s directly, `Bool` as 0/1, `()` as 0, and `Text` as a
//! packed `(offset << 32) | length` pointing into the data segment.

use wasm_encoder::Instruction;

/// Start of the data segment. Lower addresses are scratch space for host calls.
pub const DATA_BASE: u32 = 64;

/// Size of one state slot.
pub const SLOT_SIZE: u32 = 8;

/// Runtime helpers emitted into every module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuntimeFn {
    /// `(text: i64) -> ()`: print a line.
    Print,
    /// `(text: i64) -> ()`: abort with a message; never returns.
    Trap,
}

impl RuntimeFn {
    pub const ALL: [RuntimeFn; 2] = [RuntimeFn::Print, RuntimeFn::Trap];

    pub fn index(self) -> u32 {
        match self {
            RuntimeFn::Print => 0,
            RuntimeFn::Trap => 1,
        }
    }
}

#[derive(Debug, Clone)]
pub enum Op {
    Ins(Instruction<'static>),
    /// Call a lowered program function, by position in [`IrModule::functions`].
    CallUser(u32),
    CallRuntime(RuntimeFn),
    /// Push the `i32` address of a state slot.
    SlotAddr(u32),
}

impl From<Instruction<'static>> for Op {
    fn from(ins: Instruction<'static>) -> Self {
        Op::Ins(ins)
    }
}

/// A lowered function over `i64` values. Returns one `i64` unless `returns` is false.
#[derive(Debug, Clone, Default)]
pub struct IrFunction {
    pub name: String,
    pub params: u32,
    /// Extra `i64` locals beyond the parameters.
    pub locals: u32,
    pub returns: bool,
    pub body: Vec<Op>,
}

/// A public actor method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IrMethod {
    pub name: String,
    pub func: u32,
    pub arity: u32,
    pub query: bool,
    /// One-way methods do not reply.
    pub oneway: bool,
}

/// A lowered program.
#[derive(Debug, Clone, Default)]
pub struct IrModule {
    pub functions: Vec<IrFunction>,
    /// Runs the top-level declarations; no parameters, no result.
    pub init: IrFunction,
    pub methods: Vec<IrMethod>,
    /// Text literals, placed at [`DATA_BASE`].
    pub data: Vec<u8>,
    pub slots: u32,
}

impl IrModule {
    /// Intern `bytes` in the data segment and return the packed text value.
    pub fn text(&mut self, bytes: &[u8]) -> i64 {
        let offset = DATA_BASE as usize + self.data.len();
        self.data.extend_from_slice(bytes);
        pack_text(offset as u32, bytes.len() as u32)
    }
}

pub fn pack_text(offset: u32, len: u32) -> i64 {
    (((offset as u64) << 32) | len as u64) as i64
}
