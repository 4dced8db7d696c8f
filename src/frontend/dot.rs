//! Contextual dot resolution.
//!
//! `e.f(..)` where `f` is not a member of `e`'s type may call a public function `f` of an imported module whose
//! first parameter accepts `e` (`Text.size` style). The typechecker records such resolutions; this module answers
//! the two editor queries about them:
//!
//! - [`resolve_dot_call_binding`]: which module function does this dot expression call?
//! - [`suggest_dot_completions`]: which imported functions could follow `receiver.`?

use serde::Serialize;

use motoko_syntax::syntax_tree::ExpHandle;

use super::scope::ModuleScope;
use super::semantic::SemanticArena;
use super::typechecker::receiver_application;

/// The module function a contextual dot expression calls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DotCallBinding {
    /// Import alias of the module, or its URI when the import binds no name.
    pub module_name_or_uri: String,
    pub func_name: String,
}

/// A function that may be called on a receiver with dot syntax.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextualSuggestion {
    pub module_uri: String,
    pub func_name: String,
    /// Full function type, `(self : Text, n : Nat) -> Nat`.
    pub func_type: String,
}

/// Binding of the dot expression behind `handle`.
///
/// `None` for expressions that are not contextual dots and for handles of other sessions.
pub fn resolve_dot_call_binding(arena: &SemanticArena, handle: ExpHandle) -> Option<DotCallBinding> {
    let (info, id) = arena.resolve(handle)?;
    let binding = info.dot_binding(id)?;
    Some(DotCallBinding {
        module_name_or_uri: binding.module_alias.clone().unwrap_or_else(|| binding.module_uri.clone()),
        func_name: binding.func_name.clone(),
    })
}

/// Functions of the modules `scope` imports that accept the static type of `receiver` as first argument, sorted by
/// module URI then function name.
#[tracing::instrument(skip_all, fields(scope = %scope.uri))]
pub fn suggest_dot_completions(
    arena: &SemanticArena,
    scope: &ModuleScope,
    receiver: ExpHandle,
) -> Vec<ContextualSuggestion> {
    let Some((info, id)) = arena.resolve(receiver) else {
        return Vec::new();
    };
    let Some(receiver_ty) = info.exp_type(id).filter(|ty| !ty.is_error()) else {
        return Vec::new();
    };

    let mut suggestions: Vec<ContextualSuggestion> = scope
        .imports
        .iter()
        .flat_map(|module| {
            module
                .scope
                .functions
                .iter()
                .filter(|sig| receiver_application(&sig.func, receiver_ty).is_some())
                .map(|sig| ContextualSuggestion {
                    module_uri: module.uri.clone(),
                    func_name: sig.name.clone(),
                    func_type: sig.func.to_string(),
                })
        })
        .collect();
    suggestions.sort_by(|a, b| (&a.module_uri, &a.func_name).cmp(&(&b.module_uri, &b.func_name)));
    suggestions.dedup();
    suggestions
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Arc;

    use motoko_syntax::ast::{ExpId, ExpKind};
    use motoko_syntax::parser;

    use super::*;
    use crate::config::Flags;
    use crate::frontend::typechecker::{self, ImportTarget};

    const LIB: &str = "module { public func foo(self : Text) { ignore self }; public func bar(self : Text, n : Nat) : Nat { n } }";
    const MAIN: &str = r#"import Lib "lib"; let t = "world"; t.foo()"#;

    /// Check `MAIN` against `LIB` and register it in a fresh arena.
    fn checked_main() -> (SemanticArena, u32, Arc<ModuleScope>, parser::ParseOutcome) {
        let lib = parser::parse_source(LIB, false).program.unwrap();
        let lib = typechecker::check_unit(&lib, "lib.mo", &HashMap::new(), &Flags::default());
        let imports = HashMap::from([(
            "lib".to_string(),
            ImportTarget::Module {
                uri: "lib.mo".into(),
                scope: lib.scope,
            },
        )]);
        let outcome = parser::parse_source(MAIN, false);
        let program = outcome.program.as_ref().unwrap();
        let main = typechecker::check_unit(program, "main.mo", &imports, &Flags::default());
        let mut arena = SemanticArena::new();
        let base = arena.register(&main.info);
        (arena, base, main.scope, outcome)
    }

    /// Ids of the `t.foo` dot and of the receiver `t` in `MAIN`.
    fn dot_and_receiver(outcome: &parser::ParseOutcome) -> (ExpId, ExpId) {
        let program = outcome.program.as_ref().unwrap();
        let last = &program.decs.last().unwrap().dec.node;
        let motoko_syntax::ast::Dec::Exp(call) = last else {
            panic!("expected expression, got {last:?}");
        };
        let ExpKind::Call { func, .. } = &call.kind else {
            panic!("expected call");
        };
        let ExpKind::Dot(receiver, _) = &func.kind else {
            panic!("expected dot");
        };
        (func.id, receiver.id)
    }

    #[test]
    fn test_dot_binding_names_alias_and_function() {
        let (arena, base, _, outcome) = checked_main();
        let (dot, receiver) = dot_and_receiver(&outcome);
        assert_eq!(
            resolve_dot_call_binding(&arena, arena.handle(base, dot)),
            Some(DotCallBinding {
                module_name_or_uri: "Lib".into(),
                func_name: "foo".into(),
            })
        );
        assert_eq!(resolve_dot_call_binding(&arena, arena.handle(base, receiver)), None);
    }

    #[test]
    fn test_suggestions_are_sorted_and_typed() {
        let (arena, base, scope, outcome) = checked_main();
        let (_, receiver) = dot_and_receiver(&outcome);
        let suggestions = suggest_dot_completions(&arena, &scope, arena.handle(base, receiver));
        let rendered: Vec<(&str, &str, &str)> = suggestions
            .iter()
            .map(|s| (s.module_uri.as_str(), s.func_name.as_str(), s.func_type.as_str()))
            .collect();
        assert_eq!(
            rendered,
            vec![
                ("lib.mo", "bar", "(self : Text, n : Nat) -> Nat"),
                ("lib.mo", "foo", "(self : Text) -> ()"),
            ]
        );
    }

    #[test]
    fn test_foreign_handles_resolve_to_nothing() {
        let (arena, base, scope, outcome) = checked_main();
        let (dot, _) = dot_and_receiver(&outcome);
        let other = SemanticArena::new();
        let foreign = other.handle(base, dot);
        assert_eq!(resolve_dot_call_binding(&arena, foreign), None);
        assert!(suggest_dot_completions(&arena, &scope, foreign).is_empty());
    }

    #[test]
    fn test_suggestion_wire_shape() {
        let suggestion = ContextualSuggestion {
            module_uri: "lib.mo".into(),
            func_name: "foo".into(),
            func_type: "(self : Text) -> ()".into(),
        };
        let json = serde_json::to_value(&suggestion).unwrap();
        assert_eq!(json["moduleUri"], "lib.mo");
        assert_eq!(json["funcName"], "foo");
        assert_eq!(json["funcType"], "(self : Text) -> ()");
    }
}
