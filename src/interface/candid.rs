//! Candid rendering.
//!
//! Named, non-generic type constructors reachable from a method signature become `type N = ...;` definitions
//! (sorted by name); generic constructor applications are expanded in place. Doc comments render as `/// ` lines
//! above what they document.

use std::collections::{BTreeMap, HashSet};

use motoko_core::lang::prims;
use motoko_syntax::ast::ObjSort;

use super::Service;
use crate::frontend::types::{FuncSort, FuncType, Type};

/// Render a service description. The result ends with exactly one newline.
pub fn render(service: &Service) -> String {
    let mut env = TypeEnv::default();
    let methods: Vec<(String, Option<&str>, String)> = service
        .methods
        .iter()
        .map(|m| (m.name.clone(), m.doc.as_deref(), env.method(&m.func)))
        .collect();
    let init = service.init.as_ref().map(|params| env.args(params));

    let mut out = CandidWriter::default();
    for (name, body) in &env.defs {
        if let Some(doc) = service.type_docs.get(name) {
            out.doc(doc);
        }
        out.line(&format!("type {name} = {body};"));
    }
    if let Some(doc) = &service.doc {
        out.doc(doc);
    }
    let head = match &init {
        Some(args) => format!("service : ({args}) -> "),
        None => "service : ".to_string(),
    };
    if methods.is_empty() {
        out.line(&format!("{head}{{}}"));
        return out.finish();
    }
    out.line(&format!("{head}{{"));
    out.indent();
    for (name, doc, sig) in &methods {
        if let Some(doc) = doc {
            out.doc(doc);
        }
        out.line(&format!("{}: {sig};", field_name(name)));
    }
    out.dedent();
    out.line("}");
    out.finish()
}

// ============================================================================
// Types
// ============================================================================

/// Type definitions collected while rendering.
#[derive(Default)]
struct TypeEnv {
    defs: BTreeMap<String, String>,
    visiting: HashSet<String>,
}

impl TypeEnv {
    /// `(args) -> (results) [query|oneway]`
    fn method(&mut self, func: &FuncType) -> String {
        let args = self.args(&func.params);
        let (results, oneway) = match &func.ret {
            Type::Async(inner) => (self.results(inner), false),
            ret if ret.is_unit() => (String::new(), true),
            ret => (self.results(ret), false),
        };
        let annotation = match func.sort {
            FuncSort::Query => " query",
            _ if oneway => " oneway",
            _ => "",
        };
        format!("({args}) -> ({results}){annotation}")
    }

    fn args(&mut self, params: &[Type]) -> String {
        params.iter().map(|t| self.ty(t)).collect::<Vec<_>>().join(", ")
    }

    fn results(&mut self, ret: &Type) -> String {
        match ret {
            Type::Tuple(items) => self.args(items),
            other => self.ty(other),
        }
    }

    fn ty(&mut self, ty: &Type) -> String {
        match ty {
            Type::Prim(id) => prims::candid_name(*id).to_string(),
            Type::Any | Type::Error | Type::Var(_) => "reserved".into(),
            Type::Non => "empty".into(),
            Type::Con(con, args) if args.is_empty() => {
                let name = con.name.clone();
                if self.defs.contains_key(&name) || self.visiting.contains(&name) {
                    return name;
                }
                self.visiting.insert(name.clone());
                let body = match con.body() {
                    Some(body) => self.ty(body),
                    None => "reserved".into(),
                };
                self.visiting.remove(&name);
                self.defs.insert(name.clone(), body);
                name
            }
            Type::Con(con, args) => self.ty(&con.instantiate(args)),
            Type::Opt(inner) => format!("opt {}", self.ty(inner)),
            Type::Array(_, elem) => format!("vec {}", self.ty(elem)),
            Type::Tuple(items) if items.is_empty() => "record {}".into(),
            Type::Tuple(items) => format!("record {{ {} }}", self.args(items).replace(", ", "; ")),
            Type::Obj(ObjSort::Actor, fields) => {
                let members: Vec<String> = fields
                    .iter()
                    .filter_map(|f| f.ty.as_func().map(|func| (f, func)))
                    .map(|(f, func)| format!("{} : {}", field_name(&f.name), self.method(&func)))
                    .collect();
                format!("service {{ {} }}", members.join("; "))
            }
            Type::Obj(ObjSort::Object, fields) => {
                let members: Vec<String> = fields
                    .iter()
                    .map(|f| format!("{} : {}", field_name(&f.name), self.ty(&f.ty)))
                    .collect();
                format!("record {{ {} }}", members.join("; "))
            }
            Type::Obj(ObjSort::Module, _) => "reserved".into(),
            Type::Func(func) if func.is_shared() => format!("func {}", self.method(func)),
            Type::Func(_) => "reserved".into(),
            Type::Async(inner) => self.ty(inner),
        }
    }
}

/// Field and method names; quoted when not a plain identifier.
fn field_name(name: &str) -> String {
    let plain = name.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if plain { name.to_string() } else { format!("\"{name}\"") }
}

// ============================================================================
// Output
// ============================================================================

/// Line writer with two-space indentation.
#[derive(Default)]
struct CandidWriter {
    output: String,
    indent_level: usize,
}

impl CandidWriter {
    fn indent(&mut self) {
        self.indent_level += 1;
    }

    fn dedent(&mut self) {
        self.indent_level = self.indent_level.saturating_sub(1);
    }

    fn line(&mut self, text: &str) {
        self.output.push_str(&"  ".repeat(self.indent_level));
        self.output.push_str(text);
        self.output.push('\n');
    }

    /// One `/// ` line per line of `doc`.
    fn doc(&mut self, doc: &str) {
        for line in doc.lines() {
            self.line(&format!("/// {line}"));
        }
    }

    fn finish(self) -> String {
        self.output
    }
}

#[cfg(test)]
mod tests {
    use super::super::Method;
    use super::*;
    use crate::frontend::types::ConDef;

    fn method(name: &str, sort: FuncSort, params: Vec<Type>, ret: Type) -> Method {
        Method {
            name: name.into(),
            doc: None,
            func: FuncType {
                sort,
                type_params: Vec::new(),
                param_names: vec![None; params.len()],
                params,
                ret,
            },
        }
    }

    #[test]
    fn renders_definitions_docs_and_annotations() {
        let t = ConDef::new("T", Vec::new());
        t.define(Type::NAT);
        let mut main = method(
            "main",
            FuncSort::Query,
            Vec::new(),
            Type::Async(Box::new(Type::Con(t, Vec::new()))),
        );
        main.doc = Some("Function comment".into());
        let service = Service {
            doc: Some("Program comment\n      multi-line".into()),
            init: None,
            methods: vec![main, method("log", FuncSort::Shared, vec![Type::TEXT], Type::unit())],
            type_docs: BTreeMap::new(),
        };
        assert_eq!(
            render(&service),
            "type T = nat;\n/// Program comment\n///       multi-line\nservice : {\n  /// Function comment\n  main: () -> (T) query;\n  log: (text) -> () oneway;\n}\n"
        );
    }

    #[test]
    fn structured_types() {
        let mut env = TypeEnv::default();
        let record = Type::obj(
            ObjSort::Object,
            vec![crate::frontend::types::Field {
                name: "name".into(),
                ty: Type::Opt(Box::new(Type::TEXT)),
                mutable: false,
            }],
        );
        assert_eq!(env.ty(&record), "record { name : opt text }");
        assert_eq!(env.ty(&Type::Array(false, Box::new(Type::INT))), "vec int");
        assert_eq!(env.ty(&Type::Tuple(vec![Type::NAT, Type::BOOL])), "record { nat; bool }");
    }

    #[test]
    fn generic_constructors_expand_in_place() {
        let a = ConDef::new("A", vec!["B".into()]);
        a.define(Type::Var("B".into()));
        let mut env = TypeEnv::default();
        assert_eq!(env.ty(&Type::Con(a, vec![Type::TEXT])), "text");
        assert!(env.defs.is_empty());
    }

    #[test]
    fn empty_actor_and_class_init() {
        let service = Service {
            init: Some(vec![Type::NAT]),
            ..Service::default()
        };
        assert_eq!(render(&service), "service : (nat) -> {}\n");
    }
}
