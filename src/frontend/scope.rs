//! Module scopes.
//!
//! A [`ModuleScope`] is everything importers and tooling need from a checked unit: its top-level bindings, its
//! exported type constructors, the modules it imports and the signatures of its public functions.
//!
//! ## Notes
//! - Scopes are immutable once built and shared through `Arc`, so the scope cache and importers hold the same value.
//! - `mo:prim` is a synthetic scope built in code ([`prim_scope`]); it has no source unit.

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use serde::{Serialize, Serializer};

use super::types::{ConDef, Field, FuncType, ObjSort, Type};

/// Logical URI of the built-in primitive module.
pub const PRIM_URI: &str = "mo:prim";

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleScope {
    pub uri: String,
    /// Top-level value bindings of the unit.
    pub values: BTreeMap<String, Type>,
    /// Type constructors visible to importers (`Lib.T`).
    #[serde(serialize_with = "con_names")]
    pub types: BTreeMap<String, Arc<ConDef>>,
    pub imports: Vec<ImportedModule>,
    /// Type of the unit's external surface: the module object, the actor, or the last expression.
    pub export: Type,
    /// Public functions of the exported module or actor, in declaration order.
    pub functions: Vec<FunctionSig>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedModule {
    /// Import alias; absent when the module is not bound to a name.
    pub alias: Option<String>,
    pub uri: String,
    #[serde(skip)]
    pub scope: Arc<ModuleScope>,
}

/// A public function's signature with its qualified name `uri.name`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionSig {
    pub name: String,
    pub qualified_name: String,
    pub params: Vec<ParamSig>,
    #[serde(rename = "type", serialize_with = "func_text")]
    pub func: FuncType,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamSig {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: Type,
}

impl FunctionSig {
    pub fn new(uri: &str, name: &str, func: FuncType) -> Self {
        let params = func
            .params
            .iter()
            .enumerate()
            .map(|(i, ty)| ParamSig {
                name: func.param_names.get(i).cloned().flatten().unwrap_or_else(|| "_".into()),
                ty: ty.clone(),
            })
            .collect();
        Self {
            name: name.to_string(),
            qualified_name: format!("{uri}.{name}"),
            params,
            func,
        }
    }
}

impl ModuleScope {
    pub fn empty(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            values: BTreeMap::new(),
            types: BTreeMap::new(),
            imports: Vec::new(),
            export: Type::unit(),
            functions: Vec::new(),
        }
    }

    /// Whether importers may bind this unit as a module.
    pub fn is_module(&self) -> bool {
        matches!(self.export.fields(), Some((ObjSort::Module, _)))
    }

    pub fn function(&self, name: &str) -> Option<&FunctionSig> {
        self.functions.iter().find(|f| f.name == name)
    }
}

fn con_names<S: Serializer>(types: &BTreeMap<String, Arc<ConDef>>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(types.keys())
}

fn func_text<S: Serializer>(func: &FuncType, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(func)
}

/// The `mo:prim` scope, built once per process.
pub fn prim_scope() -> Arc<ModuleScope> {
    static PRIM: OnceLock<Arc<ModuleScope>> = OnceLock::new();
    PRIM.get_or_init(|| Arc::new(build_prim_scope())).clone()
}

/// Primitive functions: name, parameter types, return type.
fn prim_functions() -> Vec<(&'static str, Vec<Type>, Type)> {
    vec![
        ("debugPrint", vec![Type::TEXT], Type::unit()),
        ("intToText", vec![Type::INT], Type::TEXT),
        ("natToText", vec![Type::NAT], Type::TEXT),
        ("textSize", vec![Type::TEXT], Type::NAT),
        ("trap", vec![Type::TEXT], Type::Non),
    ]
}

fn build_prim_scope() -> ModuleScope {
    let mut scope = ModuleScope::empty(PRIM_URI);
    let mut fields = Vec::new();
    for (name, params, ret) in prim_functions() {
        let func = FuncType::local(params, ret);
        scope.values.insert(name.to_string(), Type::func(func.clone()));
        fields.push(Field {
            name: name.to_string(),
            ty: Type::func(func.clone()),
            mutable: false,
        });
        scope.functions.push(FunctionSig::new(PRIM_URI, name, func));
    }
    scope.export = Type::obj(ObjSort::Module, fields);
    scope
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prim_scope_is_a_module_with_qualified_functions() {
        let prim = prim_scope();
        assert!(prim.is_module());
        let debug = prim.function("debugPrint").map(|f| f.qualified_name.as_str());
        assert_eq!(debug, Some("mo:prim.debugPrint"));
        assert_eq!(
            prim.export.field("natToText").map(|f| f.ty.to_string()),
            Some("Nat -> Text".to_string())
        );
    }

    #[test]
    fn scope_serializes_types_as_text() {
        let prim = prim_scope();
        let json = serde_json::to_value(prim.as_ref()).unwrap_or_default();
        assert_eq!(json["uri"], "mo:prim");
        assert_eq!(json["values"]["textSize"], "Text -> Nat");
        assert_eq!(json["functions"][0]["qualifiedName"], "mo:prim.debugPrint");
    }
}
