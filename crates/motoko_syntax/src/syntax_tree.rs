//! Serializable syntax tree handed to tooling.
//!
//! [`lower_program`] turns an AST [`Program`] into a tree of named [`SyntaxNode`]s whose JSON form is
//! `{"name": .., "args": [..]}` with plain strings as leaves. A few reserved wrapper names carry metadata:
//!
//! - `*`: doc comment, `args = [text, documented]`
//! - `@`: positioned declaration, pattern or type, `args = [Pos, Pos, node]`
//! - `@:`: positioned, typed expression, `args = [Pos, Pos, ":"(exp, type)]` (typed trees only; untyped trees
//!   position expressions with `@`)
//! - `Pos`: `args = [file, line, column]`, 1-based line and 0-based column
//!
//! ## Notes
//! - Expression nodes of typed trees carry `rawExp`, an opaque [`ExpHandle`] into the semantic arena that typed
//!   them. The tree never references semantic data directly.
//! - Doc comments wrap programs and type, variable, function, module, object and class declarations.

use serde::{Deserialize, Serialize};

use crate::ast::*;
use crate::diagnostics::LineIndex;

/// Opaque reference to the semantic record of one expression.
///
/// Only meaningful to the session whose arena produced it; other sessions resolve it to nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExpHandle {
    pub arena: u32,
    pub index: u32,
}

/// One node of the serialized tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SyntaxNode {
    pub name: &'static str,
    pub args: Vec<SyntaxArg>,
    #[serde(rename = "rawExp", skip_serializing_if = "Option::is_none")]
    pub raw_exp: Option<ExpHandle>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SyntaxArg {
    Node(SyntaxNode),
    Text(String),
}

impl SyntaxArg {
    pub fn as_node(&self) -> Option<&SyntaxNode> {
        match self {
            SyntaxArg::Node(node) => Some(node),
            SyntaxArg::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            SyntaxArg::Text(text) => Some(text),
            SyntaxArg::Node(_) => None,
        }
    }
}

impl From<SyntaxNode> for SyntaxArg {
    fn from(node: SyntaxNode) -> Self {
        SyntaxArg::Node(node)
    }
}

impl From<String> for SyntaxArg {
    fn from(text: String) -> Self {
        SyntaxArg::Text(text)
    }
}

impl From<&str> for SyntaxArg {
    fn from(text: &str) -> Self {
        SyntaxArg::Text(text.to_string())
    }
}

impl SyntaxNode {
    pub fn new(name: &'static str, args: Vec<SyntaxArg>) -> Self {
        Self {
            name,
            args,
            raw_exp: None,
        }
    }

    pub fn leaf(name: &'static str) -> Self {
        Self::new(name, Vec::new())
    }

    /// The `i`-th argument, if it is a node.
    pub fn arg(&self, i: usize) -> Option<&SyntaxNode> {
        self.args.get(i).and_then(SyntaxArg::as_node)
    }

    /// First node named `name` in depth-first pre-order, including `self`.
    pub fn find_first(&self, name: &str) -> Option<&SyntaxNode> {
        if self.name == name {
            return Some(self);
        }
        self.args
            .iter()
            .filter_map(SyntaxArg::as_node)
            .find_map(|child| child.find_first(name))
    }

    /// Every node in depth-first pre-order.
    pub fn walk(&self) -> Vec<&SyntaxNode> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            out.push(node);
            stack.extend(node.args.iter().rev().filter_map(SyntaxArg::as_node));
        }
        out
    }
}

/// Semantic information attached to expressions of a typed tree.
pub trait ExpAnnotator {
    /// Rendered static type of the expression.
    fn exp_type(&self, id: ExpId) -> Option<String>;

    /// Arena handle of the expression.
    fn handle(&self, id: ExpId) -> Option<ExpHandle>;
}

/// Lower `program` (parsed from the unit `file`) to its serialized tree.
///
/// With an `annotator`, expressions are wrapped in typed `@:` nodes and carry `rawExp`.
#[tracing::instrument(skip_all, fields(file = %file, typed = annotator.is_some()))]
pub fn lower_program(
    program: &Program,
    file: &str,
    index: &LineIndex<'_>,
    annotator: Option<&dyn ExpAnnotator>,
) -> SyntaxNode {
    let lowerer = Lowerer {
        file,
        index,
        annotator,
    };
    let decs = program.decs.iter().map(|field| lowerer.top_dec(field).into()).collect();
    let prog = SyntaxNode::new("Prog", decs);
    match &program.doc {
        Some(doc) => doc_node(doc, prog),
        None => prog,
    }
}

fn doc_node(doc: &str, node: SyntaxNode) -> SyntaxNode {
    SyntaxNode::new("*", vec![doc.into(), node.into()])
}

struct Lowerer<'a> {
    file: &'a str,
    index: &'a LineIndex<'a>,
    annotator: Option<&'a dyn ExpAnnotator>,
}

impl Lowerer<'_> {
    fn pos(&self, offset: usize) -> SyntaxNode {
        let at = self.index.line_col(offset);
        SyntaxNode::new(
            "Pos",
            vec![
                self.file.into(),
                (at.line + 1).to_string().into(),
                at.character.to_string().into(),
            ],
        )
    }

    fn at(&self, span: Span, node: SyntaxNode) -> SyntaxNode {
        SyntaxNode::new(
            "@",
            vec![self.pos(span.start).into(), self.pos(span.end).into(), node.into()],
        )
    }

    // ========================================================================
    // Declarations
    // ========================================================================

    /// A program or block declaration: positioned, doc-wrapped when documented.
    fn top_dec(&self, field: &DecField) -> SyntaxNode {
        let node = self.at(field.dec.span, self.dec(&field.dec.node));
        self.documented(field, node)
    }

    /// An object, module, actor or class body field.
    fn dec_field(&self, field: &DecField) -> SyntaxNode {
        let stability = match field.stability {
            Some(StableMod::Stable) => "Stable",
            Some(StableMod::Transient) => "Transient",
            Some(StableMod::Flexible) => "Flexible",
            None => "(Flexible)",
        };
        let node = SyntaxNode::new(
            "DecField",
            vec![
                self.at(field.dec.span, self.dec(&field.dec.node)).into(),
                field.vis.as_str().into(),
                stability.into(),
            ],
        );
        self.documented(field, node)
    }

    fn documented(&self, field: &DecField, node: SyntaxNode) -> SyntaxNode {
        let documentable = matches!(
            field.dec.node,
            Dec::Type(_) | Dec::Var(_) | Dec::Let(_) | Dec::Func(_) | Dec::Module(_) | Dec::Class(_) | Dec::Object(_)
        );
        match &field.doc {
            Some(doc) if documentable => doc_node(doc, node),
            _ => node,
        }
    }

    fn dec(&self, dec: &Dec) -> SyntaxNode {
        match dec {
            Dec::Exp(exp) => SyntaxNode::new("ExpD", vec![self.exp(exp).into()]),
            Dec::Let(d) => SyntaxNode::new("LetD", vec![self.pat(&d.pat).into(), self.exp(&d.exp).into()]),
            Dec::Var(d) => {
                let mut args: Vec<SyntaxArg> = vec![d.name.node.as_str().into()];
                if let Some(ty) = &d.ty {
                    args.push(self.typ(ty).into());
                }
                args.push(self.exp(&d.exp).into());
                SyntaxNode::new("VarD", args)
            }
            Dec::Type(d) => {
                let mut args: Vec<SyntaxArg> = vec![d.name.node.as_str().into()];
                args.extend(d.params.iter().map(|b| self.type_bind(b).into()));
                args.push(self.typ(&d.ty).into());
                SyntaxNode::new("TypD", args)
            }
            Dec::Func(d) => SyntaxNode::new(
                "FuncD",
                vec![d.name.node.as_str().into(), self.func_lit(&d.func).into()],
            ),
            Dec::Module(d) => {
                let mut args: Vec<SyntaxArg> = vec![d.name.as_ref().map(|n| n.node.as_str()).unwrap_or("").into()];
                args.extend(d.fields.iter().map(|f| self.dec_field(f).into()));
                SyntaxNode::new("ModuleD", args)
            }
            Dec::Object(d) => {
                let name = if d.sort == ObjSort::Actor { "ActorD" } else { "ObjectD" };
                let mut args: Vec<SyntaxArg> = vec![
                    d.name.as_ref().map(|n| n.node.as_str()).unwrap_or("").into(),
                    SyntaxArg::from(if d.persistent { "Persistent" } else { "" }),
                ];
                args.extend(d.fields.iter().map(|f| self.dec_field(f).into()));
                SyntaxNode::new(name, args)
            }
            Dec::Class(d) => {
                let mut args: Vec<SyntaxArg> = vec![d.sort.as_str().into(), d.name.node.as_str().into()];
                args.extend(d.type_params.iter().map(|b| self.type_bind(b).into()));
                args.push(self.params(&d.params).into());
                if let Some(ret) = &d.ret {
                    args.push(self.typ(ret).into());
                }
                args.extend(d.fields.iter().map(|f| self.dec_field(f).into()));
                SyntaxNode::new("ClassD", args)
            }
            Dec::Import(d) => SyntaxNode::new(
                "ImportD",
                vec![d.name.node.as_str().into(), d.path.node.as_str().into()],
            ),
            Dec::Error => SyntaxNode::leaf("ErrorD"),
        }
    }

    fn func_lit(&self, func: &FuncLit) -> SyntaxNode {
        let mut args: Vec<SyntaxArg> = vec![func.sort.as_str().into()];
        args.extend(func.type_params.iter().map(|b| self.type_bind(b).into()));
        args.push(self.params(&func.params).into());
        args.push(match &func.ret {
            Some(ret) => self.typ(ret).into(),
            None => SyntaxNode::leaf("TupT").into(),
        });
        args.push(self.exp(&func.body).into());
        SyntaxNode::new("FuncE", args)
    }

    fn params(&self, params: &[Param]) -> SyntaxNode {
        let items = params
            .iter()
            .map(|p| {
                let var = self.at(p.name.span, SyntaxNode::new("VarP", vec![p.name.node.as_str().into()]));
                let span = p.name.span.merge(p.ty.span);
                self.at(span, SyntaxNode::new("AnnotP", vec![var.into(), self.typ(&p.ty).into()]))
                    .into()
            })
            .collect();
        SyntaxNode::new("TupP", items)
    }

    fn type_bind(&self, bind: &TypeBind) -> SyntaxNode {
        let mut args: Vec<SyntaxArg> = vec![bind.name.node.as_str().into()];
        if let Some(bound) = &bind.bound {
            args.push(self.typ(bound).into());
        }
        SyntaxNode::new("TypBind", args)
    }

    // ========================================================================
    // Expressions
    // ========================================================================

    fn exp(&self, exp: &Exp) -> SyntaxNode {
        let mut node = self.exp_kind(&exp.kind);
        let (start, end) = (self.pos(exp.span.start), self.pos(exp.span.end));
        match self.annotator {
            Some(annotator) => {
                node.raw_exp = annotator.handle(exp.id);
                let ty = annotator.exp_type(exp.id).unwrap_or_else(|| "???".to_string());
                let typed = SyntaxNode::new(":", vec![node.into(), ty.into()]);
                SyntaxNode::new("@:", vec![start.into(), end.into(), typed.into()])
            }
            None => SyntaxNode::new("@", vec![start.into(), end.into(), node.into()]),
        }
    }

    fn exps(&self, exps: &[Exp]) -> Vec<SyntaxArg> {
        exps.iter().map(|e| self.exp(e).into()).collect()
    }

    fn exp_kind(&self, kind: &ExpKind) -> SyntaxNode {
        match kind {
            ExpKind::Lit(lit) => SyntaxNode::new("LitE", vec![lit_node(lit).into()]),
            ExpKind::Var(name) => SyntaxNode::new("VarE", vec![name.as_str().into()]),
            ExpKind::Unary(op, e) => {
                let op = match op {
                    UnOp::Neg => "NegOp",
                    UnOp::Pos => "PosOp",
                    UnOp::Not => "NotOp",
                };
                SyntaxNode::new("UnE", vec![op.into(), self.exp(e).into()])
            }
            ExpKind::Binary(l, op, r) => {
                SyntaxNode::new("BinE", vec![self.exp(l).into(), op.as_str().into(), self.exp(r).into()])
            }
            ExpKind::Compare(l, op, r) => {
                SyntaxNode::new("RelE", vec![self.exp(l).into(), op.as_str().into(), self.exp(r).into()])
            }
            ExpKind::And(l, r) => SyntaxNode::new("AndE", vec![self.exp(l).into(), self.exp(r).into()]),
            ExpKind::Or(l, r) => SyntaxNode::new("OrE", vec![self.exp(l).into(), self.exp(r).into()]),
            ExpKind::Assign(l, r) => SyntaxNode::new("AssignE", vec![self.exp(l).into(), self.exp(r).into()]),
            ExpKind::OpAssign(l, op, r) => {
                SyntaxNode::new("OpAssignE", vec![self.exp(l).into(), op.as_str().into(), self.exp(r).into()])
            }
            ExpKind::Tuple(elems) => SyntaxNode::new("TupE", self.exps(elems)),
            ExpKind::Record(fields) => SyntaxNode::new(
                "ObjBlockE",
                fields
                    .iter()
                    .map(|f| {
                        SyntaxNode::new(
                            "ExpField",
                            vec![
                                f.name.node.as_str().into(),
                                mutability(f.mutable),
                                self.exp(&f.exp).into(),
                            ],
                        )
                        .into()
                    })
                    .collect(),
            ),
            ExpKind::Array { mutable, elems } => {
                let mut args: Vec<SyntaxArg> = vec![mutability(*mutable)];
                args.extend(self.exps(elems));
                SyntaxNode::new("ArrayE", args)
            }
            ExpKind::Opt(e) => SyntaxNode::new("OptE", vec![self.exp(e).into()]),
            ExpKind::Dot(e, name) => SyntaxNode::new("DotE", vec![self.exp(e).into(), name.node.as_str().into()]),
            ExpKind::Proj(e, i) => SyntaxNode::new("ProjE", vec![self.exp(e).into(), i.to_string().into()]),
            ExpKind::Index(e, i) => SyntaxNode::new("IdxE", vec![self.exp(e).into(), self.exp(i).into()]),
            ExpKind::Call { func, inst, arg } => {
                let inst = inst.as_deref().unwrap_or_default();
                SyntaxNode::new(
                    "CallE",
                    vec![
                        self.exp(func).into(),
                        SyntaxNode::new("Inst", inst.iter().map(|t| self.typ(t).into()).collect()).into(),
                        self.exp(arg).into(),
                    ],
                )
            }
            ExpKind::Block(decs) => SyntaxNode::new("BlockE", decs.iter().map(|d| self.top_dec(d).into()).collect()),
            ExpKind::If(c, t, e) => {
                let mut args: Vec<SyntaxArg> = vec![self.exp(c).into(), self.exp(t).into()];
                if let Some(e) = e {
                    args.push(self.exp(e).into());
                }
                SyntaxNode::new("IfE", args)
            }
            ExpKind::While(c, b) => SyntaxNode::new("WhileE", vec![self.exp(c).into(), self.exp(b).into()]),
            ExpKind::Loop(b) => SyntaxNode::new("LoopE", vec![self.exp(b).into()]),
            ExpKind::For(p, e, b) => SyntaxNode::new(
                "ForE",
                vec![self.pat(p).into(), self.exp(e).into(), self.exp(b).into()],
            ),
            ExpKind::Switch(e, cases) => {
                let mut args: Vec<SyntaxArg> = vec![self.exp(e).into()];
                args.extend(
                    cases
                        .iter()
                        .map(|c| SyntaxNode::new("case", vec![self.pat(&c.pat).into(), self.exp(&c.exp).into()]).into()),
                );
                SyntaxNode::new("SwitchE", args)
            }
            ExpKind::Return(e) => SyntaxNode::new("RetE", e.iter().map(|e| self.exp(e).into()).collect()),
            ExpKind::Ignore(e) => SyntaxNode::new("IgnoreE", vec![self.exp(e).into()]),
            ExpKind::Assert(e) => SyntaxNode::new("AssertE", vec![self.exp(e).into()]),
            ExpKind::Async(e) => SyntaxNode::new("AsyncE", vec![self.exp(e).into()]),
            ExpKind::Await(e) => SyntaxNode::new("AwaitE", vec![self.exp(e).into()]),
            ExpKind::Show(e) => SyntaxNode::new("ShowE", vec![self.exp(e).into()]),
            ExpKind::Func(func) => self.func_lit(func),
            ExpKind::Annot(e, ty) => SyntaxNode::new("AnnotE", vec![self.exp(e).into(), self.typ(ty).into()]),
            ExpKind::Error => SyntaxNode::leaf("ErrorE"),
        }
    }

    // ========================================================================
    // Patterns and types
    // ========================================================================

    fn pat(&self, pat: &Pat) -> SyntaxNode {
        let node = match &pat.kind {
            PatKind::Wild => SyntaxNode::leaf("WildP"),
            PatKind::Var(name) => SyntaxNode::new("VarP", vec![name.as_str().into()]),
            PatKind::Lit(lit) => SyntaxNode::new("LitP", vec![lit_node(lit).into()]),
            PatKind::Tuple(pats) => SyntaxNode::new("TupP", pats.iter().map(|p| self.pat(p).into()).collect()),
            PatKind::Opt(p) => SyntaxNode::new("OptP", vec![self.pat(p).into()]),
            PatKind::Annot(p, ty) => SyntaxNode::new("AnnotP", vec![self.pat(p).into(), self.typ(ty).into()]),
            PatKind::Error => SyntaxNode::leaf("ErrorP"),
        };
        self.at(pat.span, node)
    }

    fn typ(&self, typ: &Typ) -> SyntaxNode {
        let node = match &typ.kind {
            TypKind::Path { path, args } => {
                let dotted = path.iter().map(|p| p.node.as_str()).collect::<Vec<_>>().join(".");
                let mut out: Vec<SyntaxArg> = vec![dotted.into()];
                out.extend(args.iter().map(|a| self.typ(a).into()));
                SyntaxNode::new("PathT", out)
            }
            TypKind::Opt(t) => SyntaxNode::new("OptT", vec![self.typ(t).into()]),
            TypKind::Array { mutable, elem } => SyntaxNode::new(
                "ArrayT",
                vec![mutability(*mutable), self.typ(elem).into()],
            ),
            TypKind::Tuple(items) => SyntaxNode::new("TupT", self.typ_items(items)),
            TypKind::Record(fields) => SyntaxNode::new("ObjT", self.typ_fields("Object", fields)),
            TypKind::Obj(sort, fields) => SyntaxNode::new("ObjT", self.typ_fields(sort.as_str(), fields)),
            TypKind::Func {
                sort,
                type_params,
                params,
                ret,
            } => {
                let mut args: Vec<SyntaxArg> = vec![sort.as_str().into()];
                args.extend(type_params.iter().map(|b| self.type_bind(b).into()));
                args.push(SyntaxNode::new("TupT", self.typ_items(params)).into());
                args.push(self.typ(ret).into());
                SyntaxNode::new("FuncT", args)
            }
            TypKind::Async(t) => SyntaxNode::new("AsyncT", vec![self.typ(t).into()]),
            TypKind::Error => SyntaxNode::leaf("ErrorT"),
        };
        self.at(typ.span, node)
    }

    fn typ_items(&self, items: &[TypItem]) -> Vec<SyntaxArg> {
        items
            .iter()
            .map(|item| match &item.name {
                Some(name) => SyntaxNode::new("TypItem", vec![name.as_str().into(), self.typ(&item.ty).into()]).into(),
                None => self.typ(&item.ty).into(),
            })
            .collect()
    }

    fn typ_fields(&self, sort: &'static str, fields: &[TypField]) -> Vec<SyntaxArg> {
        let mut out: Vec<SyntaxArg> = vec![sort.into()];
        out.extend(fields.iter().map(|f| {
            SyntaxNode::new(
                "TypField",
                vec![
                    f.name.node.as_str().into(),
                    mutability(f.mutable),
                    self.typ(&f.ty).into(),
                ],
            )
            .into()
        }));
        out
    }
}

fn mutability(mutable: bool) -> SyntaxArg {
    SyntaxArg::from(if mutable { "Var" } else { "Const" })
}

fn lit_node(lit: &Lit) -> SyntaxNode {
    match lit {
        Lit::Nat(digits) => SyntaxNode::new("NatLit", vec![digits.as_str().into()]),
        Lit::Float(digits) => SyntaxNode::new("FloatLit", vec![digits.as_str().into()]),
        Lit::Text(text) => SyntaxNode::new("TextLit", vec![text.to_string().into()]),
        Lit::Char(c) => SyntaxNode::new("CharLit", vec![c.to_string().into()]),
        Lit::Bool(b) => SyntaxNode::new("BoolLit", vec![b.to_string().into()]),
        Lit::Null => SyntaxNode::leaf("NullLit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_source;

    fn lower(source: &str) -> SyntaxNode {
        let program = parse_source(source, false).program.expect("program");
        let index = LineIndex::new(source);
        lower_program(&program, "t.mo", &index, None)
    }

    #[test]
    fn untyped_literal_program_shape() {
        let json = serde_json::to_string(&lower("1")).unwrap_or_default();
        insta::assert_snapshot!(
            json,
            @r#"{"name":"Prog","args":[{"name":"@","args":[{"name":"Pos","args":["t.mo","1","0"]},{"name":"Pos","args":["t.mo","1","1"]},{"name":"ExpD","args":[{"name":"@","args":[{"name":"Pos","args":["t.mo","1","0"]},{"name":"Pos","args":["t.mo","1","1"]},{"name":"LitE","args":[{"name":"NatLit","args":["1"]}]}]}]}]}]}"#
        );
    }

    #[test]
    fn doc_comments_wrap_documented_nodes() {
        let tree = lower("/// Module doc\nimport P \"mo:prim\";\nmodule M {\n  /// Class comment\n  public class C() {};\n}");
        assert_eq!(tree.name, "*");
        assert_eq!(tree.args[0].as_text(), Some("Module doc"));
        let json = serde_json::to_string(&tree).unwrap_or_default();
        assert!(json.contains(r#""name":"*","args":["Class comment""#));
    }

    struct FixedTypes;

    impl ExpAnnotator for FixedTypes {
        fn exp_type(&self, _id: ExpId) -> Option<String> {
            Some("Nat".to_string())
        }

        fn handle(&self, id: ExpId) -> Option<ExpHandle> {
            Some(ExpHandle { arena: 7, index: id.0 })
        }
    }

    #[test]
    fn typed_expressions_carry_type_and_handle() {
        let source = "f(1)";
        let program = parse_source(source, false).program.expect("program");
        let index = LineIndex::new(source);
        let tree = lower_program(&program, "t.mo", &index, Some(&FixedTypes));
        let exp_d = tree.arg(0).and_then(|at| at.arg(2)).expect("ExpD");
        assert_eq!(exp_d.name, "ExpD");
        let typed = exp_d.arg(0).expect("@:");
        assert_eq!(typed.name, "@:");
        let colon = typed.arg(2).expect(":");
        assert_eq!(colon.args[1].as_text(), Some("Nat"));
        let call = colon.arg(0).expect("CallE");
        assert_eq!(call.name, "CallE");
        assert_eq!(call.raw_exp, Some(ExpHandle { arena: 7, index: 2 }));
        let callee = call.arg(0).and_then(|t| t.arg(2)).and_then(|c| c.arg(0)).expect("VarE");
        assert_eq!(callee.name, "VarE");
        assert_eq!(callee.raw_exp, Some(ExpHandle { arena: 7, index: 0 }));
    }

    #[test]
    fn find_first_searches_depth_first() {
        let tree = lower("let x = 1; x");
        assert!(tree.find_first("LetD").is_some());
        assert_eq!(tree.find_first("VarE").and_then(|n| n.args[0].as_text()), Some("x"));
        assert!(tree.walk().iter().any(|n| n.name == "VarP"));
    }
}
