//! Motoko compiler backend
//!
//! Compiles a checked unit to a WebAssembly module for one of two targets.
//!
//! The pipeline is:
//! 1. Typed AST plus [`TypeCheckInfo`](crate::frontend::semantic::TypeCheckInfo) → [`lower`] → target-independent
//!    [`ir::IrModule`]
//! 2. IR + [`Target`] → [`emit`] → wasm bytes
//!
//! ## Module Organization
//!
//! - `target.rs` - Targets, their host imports, and the artifact type
//! - `ir.rs` - Value representation and symbolic operations
//! - `lower.rs` - AST lowering
//! - `emit.rs` - Binary encoding and target entry points
//!
//! Canister modules embed the Candid interface of their actor in the `icp:public candid:service` custom section.

#![deny(clippy::unwrap_used)]

pub mod emit;
pub mod ir;
pub mod lower;
pub mod target;

pub use target::{Target, WasmArtifact};

use crate::frontend::resolver::ResolvedUnit;

/// Errors that stop code generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodegenError {
    #[error("program data of {size} bytes does not fit in linear memory")]
    DataTooLarge { size: usize },
    #[error("{0} was not resolved")]
    MissingUnit(String),
}

/// Compile a checked unit for `target`.
#[tracing::instrument(skip_all, fields(unit = %unit.path, %target))]
pub fn compile_unit(unit: &ResolvedUnit, target: Target) -> Result<WasmArtifact, CodegenError> {
    let module = lower::lower_unit(unit)?;
    let candid = match target {
        Target::InternetComputer => Some(crate::interface::extract(unit)),
        Target::Wasi => None,
    };
    let bytes = emit::emit(&module, target, candid.as_deref());
    tracing::debug!(bytes = bytes.len(), "emitted module");
    Ok(WasmArtifact { bytes, target })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flags;
    use crate::frontend::cache::ScopeCache;
    use crate::frontend::resolver;
    use crate::vfs::VirtualFs;

    fn compile(source: &str, target: Target) -> WasmArtifact {
        let mut store = VirtualFs::in_memory();
        store.save("main.mo", source);
        let resolution =
            resolver::resolve(&store, &Flags::default(), &["main.mo".into()], false, ScopeCache::new()).unwrap();
        assert!(!resolution.has_errors(), "{:?}", resolution.diagnostics);
        let unit = resolution.unit("main.mo").unwrap();
        compile_unit(unit, target).unwrap()
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    const COUNTER: &str = "actor {\n  var count = 0;\n  public func inc() : async () { count += 1 };\n  public query func get() : async Nat { count };\n  public func reset() { count := 0 };\n}";

    #[test]
    fn targets_produce_different_modules() {
        let wasi = compile(COUNTER, Target::Wasi);
        let ic = compile(COUNTER, Target::InternetComputer);
        assert_eq!(&wasi.bytes[..4], b"\0asm");
        assert_eq!(&ic.bytes[..4], b"\0asm");
        assert_ne!(wasi.bytes, ic.bytes);
    }

    #[test]
    fn canister_exports_follow_method_sorts() {
        let ic = compile(COUNTER, Target::InternetComputer);
        assert!(contains(&ic.bytes, b"canister_update inc"));
        assert!(contains(&ic.bytes, b"canister_query get"));
        assert!(contains(&ic.bytes, b"canister_update reset"));
        assert!(contains(&ic.bytes, b"get: () -> (nat) query;"));
    }

    #[test]
    fn wasi_programs_print_through_fd_write() {
        let wasi = compile("import Prim \"mo:prim\";\nPrim.debugPrint(\"hello wasi\");", Target::Wasi);
        assert!(contains(&wasi.bytes, b"hello wasi"));
        assert!(contains(&wasi.bytes, b"_start"));
        assert!(!contains(&wasi.bytes, emit::CANDID_SECTION.as_bytes()));
    }

    #[test]
    fn methods_lower_with_their_arity() {
        let mut store = VirtualFs::in_memory();
        store.save(
            "main.mo",
            "actor { func add(a : Nat, b : Nat) : Nat { a + b }; public func sum(n : Nat) : async Nat { add(n, 2) } }",
        );
        let resolution =
            resolver::resolve(&store, &Flags::default(), &["main.mo".into()], false, ScopeCache::new()).unwrap();
        let module = lower::lower_unit(&resolution.units[0]).unwrap();
        let names: Vec<&str> = module.functions.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["add", "sum"]);
        assert_eq!(module.functions[0].params, 2);
        assert_eq!(module.methods.len(), 1);
        assert_eq!(module.methods[0].name, "sum");
        assert_eq!(module.methods[0].arity, 1);
        assert!(!module.methods[0].query);
        assert!(!module.methods[0].oneway);
    }
}
