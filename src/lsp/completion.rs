//! Position queries over typed syntax trees.
//!
//! Typed trees position every expression with an `@:` node, `[Pos, Pos, ":"(exp, type)]`, and the expression node
//! carries its semantic handle. These helpers find the expression an editor position refers to.

use tower_lsp::lsp_types::Position;

use motoko_syntax::syntax_tree::{ExpHandle, SyntaxNode};

/// A positioned, typed expression of a tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedExp {
    pub start: Position,
    pub end: Position,
    pub handle: Option<ExpHandle>,
    pub ty: String,
}

/// The innermost expression that ends exactly at `at`: the receiver of a `.` typed at `at`.
pub fn expression_ending_at(tree: &SyntaxNode, at: Position) -> Option<TypedExp> {
    let mut found = Vec::new();
    collect(tree, &mut found);
    found
        .into_iter()
        .filter(|exp| exp.end == at && exp.start < exp.end)
        .max_by_key(|exp| (exp.start.line, exp.start.character))
}

/// The innermost expression whose range contains `at`.
pub fn expression_at(tree: &SyntaxNode, at: Position) -> Option<TypedExp> {
    let mut found = Vec::new();
    collect(tree, &mut found);
    let key = |p: Position| (p.line, p.character);
    found
        .into_iter()
        .filter(|exp| key(exp.start) <= key(at) && key(at) < key(exp.end))
        .max_by_key(|exp| key(exp.start))
}

fn collect(node: &SyntaxNode, out: &mut Vec<TypedExp>) {
    if node.name == "@:" {
        if let Some(exp) = typed_exp(node) {
            out.push(exp);
        }
    }
    for child in node.args.iter().filter_map(|arg| arg.as_node()) {
        collect(child, out);
    }
}

fn typed_exp(node: &SyntaxNode) -> Option<TypedExp> {
    let [start, end, typed] = node.args.as_slice() else {
        return None;
    };
    let typed = typed.as_node()?;
    let exp = typed.args.first()?.as_node()?;
    Some(TypedExp {
        start: position(start.as_node()?)?,
        end: position(end.as_node()?)?,
        handle: exp.raw_exp,
        ty: typed.args.get(1)?.as_text()?.to_string(),
    })
}

/// `Pos(file, line, column)` with a 1-based line, as a 0-based LSP position.
fn position(pos: &SyntaxNode) -> Option<Position> {
    if pos.name != "Pos" {
        return None;
    }
    let line: u32 = pos.args.get(1)?.as_text()?.parse().ok()?;
    let character: u32 = pos.args.get(2)?.as_text()?.parse().ok()?;
    Some(Position::new(line.checked_sub(1)?, character))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Session;

    fn typed_tree(source: &str) -> SyntaxNode {
        let mut session = Session::new();
        session.save_unit("main.mo", source);
        let result = session.parse_typed(&["main.mo".into()]).unwrap();
        result.code.unwrap().remove(0).ast
    }

    #[test]
    fn receivers_are_the_innermost_expression_before_the_dot() {
        let tree = typed_tree("let t = \"ab\";\nlet n = 1 + t.size()");
        // `t` spans 1:12-1:13 (0-based line 1).
        let receiver = expression_ending_at(&tree, Position::new(1, 13)).unwrap();
        assert_eq!(receiver.start, Position::new(1, 12));
        assert_eq!(receiver.ty, "Text");
        assert!(receiver.handle.is_some());
    }

    #[test]
    fn hover_finds_the_innermost_expression() {
        let tree = typed_tree("let n = 1;\nn");
        let inner = expression_at(&tree, Position::new(1, 0)).unwrap();
        assert_eq!(inner.start, Position::new(1, 0));
        assert_eq!(inner.ty, "Nat");
        assert!(expression_at(&tree, Position::new(3, 0)).is_none());
    }
}
