//! Service interface extraction.
//!
//! Collects the external surface of a checked program's actor (its public methods, their doc comments, the class
//! parameters of an actor class) into a [`Service`] and renders it as a Candid service description.
//!
//! ## Notes
//! - The last top-level actor (or actor class) of the unit is its service; programs without one describe the empty
//!   service `service : {}`.
//! - Method types come from the unit's [`ModuleScope`]; only doc comments are read from the syntax tree.
//!
//! ## Examples
//!
//! ```rust
//! use motoko::config::Flags;
//! use motoko::frontend::resolver;
//! use motoko::frontend::cache::ScopeCache;
//! use motoko::vfs::VirtualFs;
//!
//! let mut store = VirtualFs::in_memory();
//! store.save("a.mo", "actor { public func ping() : async () {} }");
//! let resolution = resolver::resolve(&store, &Flags::default(), &["a.mo".into()], false, ScopeCache::new()).unwrap();
//! let text = motoko::interface::extract(&resolution.units[0]);
//! assert_eq!(text, "service : {\n  ping: () -> ();\n}\n");
//! ```

mod candid;

use std::collections::BTreeMap;

use motoko_syntax::ast::{Dec, DecField, ObjSort, Program};

use crate::frontend::resolver::ResolvedUnit;
use crate::frontend::scope::ModuleScope;
use crate::frontend::types::{FuncType, Type};

pub use candid::render;

/// One public method of a service.
#[derive(Debug, Clone)]
pub struct Method {
    pub name: String,
    pub doc: Option<String>,
    pub func: FuncType,
}

/// External surface of an actor.
#[derive(Debug, Clone, Default)]
pub struct Service {
    /// Doc comment of the program.
    pub doc: Option<String>,
    /// Parameters of an actor class; `None` for a plain actor.
    pub init: Option<Vec<Type>>,
    pub methods: Vec<Method>,
    /// Doc comments of public type declarations, by type name.
    pub type_docs: BTreeMap<String, String>,
}

/// Candid description of the unit's service.
#[tracing::instrument(skip_all, fields(unit = %unit.path))]
pub fn extract(unit: &ResolvedUnit) -> String {
    match service_of(&unit.program, &unit.scope) {
        Some(service) => render(&service),
        None => "service : {}\n".to_string(),
    }
}

/// The service a program exports, if it has an actor.
pub fn service_of(program: &Program, scope: &ModuleScope) -> Option<Service> {
    let actor = program.decs.iter().rev().find_map(|field| match &field.dec.node {
        Dec::Object(dec) if dec.sort == ObjSort::Actor => Some((&dec.fields, None)),
        Dec::Class(dec) if dec.sort == ObjSort::Actor => Some((&dec.fields, Some(dec.name.node.as_str()))),
        _ => None,
    })?;
    let (fields, class_name) = actor;

    let init = class_name.map(|name| {
        scope
            .values
            .get(name)
            .and_then(Type::as_func)
            .map(|ctor| ctor.params)
            .unwrap_or_default()
    });

    let docs = member_docs(fields);
    let methods = scope
        .functions
        .iter()
        .map(|sig| Method {
            name: sig.name.clone(),
            doc: docs.get(sig.name.as_str()).cloned(),
            func: sig.func.clone(),
        })
        .collect();
    let type_docs = fields
        .iter()
        .filter(|f| f.is_public())
        .filter_map(|f| match (&f.dec.node, &f.doc) {
            (Dec::Type(dec), Some(doc)) => Some((dec.name.node.clone(), doc.clone())),
            _ => None,
        })
        .collect();

    Some(Service {
        doc: program.doc.clone(),
        init,
        methods,
        type_docs,
    })
}

/// Doc comments of the functions declared in an actor body.
fn member_docs(fields: &[DecField]) -> BTreeMap<&str, String> {
    fields
        .iter()
        .filter_map(|f| match (&f.dec.node, &f.doc) {
            (Dec::Func(dec), Some(doc)) => Some((dec.name.node.as_str(), doc.clone())),
            _ => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use motoko_syntax::parser;

    use super::*;
    use crate::config::Flags;
    use crate::frontend::typechecker;

    fn service(source: &str) -> Option<Service> {
        let program = parser::parse_source(source, false).program.unwrap();
        let output = typechecker::check_unit(&program, "a.mo", &HashMap::new(), &Flags::default());
        assert!(output.errors.is_empty(), "{:?}", output.errors);
        service_of(&program, &output.scope)
    }

    #[test]
    fn modules_have_no_service() {
        assert!(service("module { public func f() {} }").is_none());
    }

    #[test]
    fn methods_keep_declaration_order_and_docs() {
        let svc = service("actor { /// Second\n public func b() : async () {}; public query func a() : async Nat { 1 } }")
            .unwrap();
        let names: Vec<&str> = svc.methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(svc.methods[0].doc.as_deref(), Some("Second"));
        assert!(svc.init.is_none());
    }

    #[test]
    fn actor_classes_have_init_arguments() {
        let svc = service("actor class Counter(start : Nat) { public func get() : async Nat { start } }").unwrap();
        assert_eq!(svc.init.as_ref().map(Vec::len), Some(1));
    }
}
