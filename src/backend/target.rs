//! Compilation targets and their host interfaces.

use serde::Serialize;
use wasm_encoder::ValType;

/// Binary profile of a compiled program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Target {
    /// Standalone WebAssembly System Interface program.
    Wasi,
    /// Internet Computer canister.
    InternetComputer,
}

/// A host function imported by a target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostImport {
    pub module: &'static str,
    pub name: &'static str,
    pub params: &'static [ValType],
    pub results: &'static [ValType],
}

const fn host(
    module: &'static str,
    name: &'static str,
    params: &'static [ValType],
    results: &'static [ValType],
) -> HostImport {
    HostImport {
        module,
        name,
        params,
        results,
    }
}

pub const FD_WRITE: HostImport = host(
    "wasi_snapshot_preview1",
    "fd_write",
    &[ValType::I32, ValType::I32, ValType::I32, ValType::I32],
    &[ValType::I32],
);
pub const PROC_EXIT: HostImport = host("wasi_snapshot_preview1", "proc_exit", &[ValType::I32], &[]);

pub const MSG_REPLY: HostImport = host("ic0", "msg_reply", &[], &[]);
pub const MSG_REPLY_DATA_APPEND: HostImport =
    host("ic0", "msg_reply_data_append", &[ValType::I32, ValType::I32], &[]);
pub const DEBUG_PRINT: HostImport = host("ic0", "debug_print", &[ValType::I32, ValType::I32], &[]);
pub const IC_TRAP: HostImport = host("ic0", "trap", &[ValType::I32, ValType::I32], &[]);

const WASI_IMPORTS: &[HostImport] = &[FD_WRITE, PROC_EXIT];
const IC_IMPORTS: &[HostImport] = &[MSG_REPLY, MSG_REPLY_DATA_APPEND, DEBUG_PRINT, IC_TRAP];

impl Target {
    pub fn as_str(self) -> &'static str {
        match self {
            Target::Wasi => "wasi",
            Target::InternetComputer => "ic",
        }
    }

    /// Host functions, in import order.
    pub fn imports(self) -> &'static [HostImport] {
        match self {
            Target::Wasi => WASI_IMPORTS,
            Target::InternetComputer => IC_IMPORTS,
        }
    }

    /// Function index of an import of this target.
    pub fn import_index(self, import: HostImport) -> Option<u32> {
        self.imports().iter().position(|i| *i == import).map(|i| i as u32)
    }
}

impl std::fmt::Display for Target {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WasmArtifact {
    #[serde(serialize_with = "serialize_bytes")]
    pub bytes: Vec<u8>,
    pub target: Target,
}

fn serialize_bytes<S: serde::Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_import_their_hosts() {
        assert_eq!(Target::Wasi.import_index(PROC_EXIT), Some(1));
        assert_eq!(Target::InternetComputer.import_index(IC_TRAP), Some(3));
        assert_eq!(Target::Wasi.import_index(MSG_REPLY), None);
    }
}
