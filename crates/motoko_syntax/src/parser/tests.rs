#[cfg(test)]
/// Parser unit tests.
///
/// These cover specific syntactic forms, doc comment attachment, and recovery behavior (one error per malformed
/// fragment, no cascades).
mod tests {
    use super::*;

    fn parse_ok(source: &str) -> Program {
        let outcome = parse_source(source, false);
        assert!(outcome.errors.is_empty(), "unexpected errors: {:?}", outcome.errors);
        outcome.program.expect("strict parse should produce a program")
    }

    fn only_exp(program: &Program) -> &Exp {
        match &program.decs.last().expect("at least one declaration").dec.node {
            Dec::Exp(exp) => exp,
            other => panic!("expected expression declaration, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_operand_is_single_error_at_end_of_input() {
        let outcome = parse_source("1+", false);
        assert!(outcome.program.is_none());
        assert_eq!(outcome.errors.len(), 1);
        let err = &outcome.errors[0];
        assert_eq!(err.span, Span::new(2, 2));
        assert_eq!(err.code, "M0001");
        assert_eq!(
            err.message,
            "unexpected end of input, expected one of token or <phrase> sequence:\n  <exp_bin(ob)> (e.g. '42')"
        );
    }

    #[test]
    fn test_recovery_keeps_tree_with_placeholder() {
        let outcome = parse_source("1+", true);
        assert_eq!(outcome.errors.len(), 1);
        let program = outcome.program.expect("recovered program");
        match &only_exp(&program).kind {
            ExpKind::Binary(_, BinOp::Add, rhs) => assert_eq!(rhs.kind, ExpKind::Error),
            other => panic!("expected binary, got {other:?}"),
        }
    }

    #[test]
    fn test_recovery_resynchronizes_at_semicolon() {
        let outcome = parse_source("let x = ; let y = 2; y", true);
        assert_eq!(outcome.errors.len(), 1, "got {:?}", outcome.errors);
        let program = outcome.program.expect("recovered program");
        assert_eq!(program.decs.len(), 3);
        assert!(matches!(program.decs[1].dec.node, Dec::Let(_)));
    }

    #[test]
    fn test_recovery_inside_block_does_not_eat_closing_brace() {
        let outcome = parse_source("func f() { let = 1; 2 }; f()", true);
        assert_eq!(outcome.errors.len(), 1, "got {:?}", outcome.errors);
        let program = outcome.program.expect("recovered program");
        assert_eq!(program.decs.len(), 2);
        assert!(matches!(program.decs[0].dec.node, Dec::Func(_)));
    }

    #[test]
    fn test_missing_closing_brace_recovers() {
        let outcome = parse_source("func f() { x.", true);
        assert!(outcome.program.is_some());
        assert!(!outcome.errors.is_empty());
    }

    #[test]
    fn test_lexical_error_is_syntax_error() {
        let outcome = parse_source("let s = \"abc", false);
        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].code, "M0001");
    }

    #[test]
    fn test_operator_precedence() {
        let program = parse_ok("1 + 2 * 3 == 7 and true");
        let ExpKind::And(lhs, _) = &only_exp(&program).kind else {
            panic!("expected `and` at the top");
        };
        let ExpKind::Compare(sum, RelOp::Eq, _) = &lhs.kind else {
            panic!("expected comparison under `and`");
        };
        let ExpKind::Binary(_, BinOp::Add, product) = &sum.kind else {
            panic!("expected addition under comparison");
        };
        assert!(matches!(product.kind, ExpKind::Binary(_, BinOp::Mul, _)));
    }

    #[test]
    fn test_text_concatenation_is_additive() {
        let program = parse_ok(r#""a" # "b" # "c""#);
        let ExpKind::Binary(lhs, BinOp::Cat, _) = &only_exp(&program).kind else {
            panic!("expected concatenation");
        };
        assert!(matches!(lhs.kind, ExpKind::Binary(_, BinOp::Cat, _)));
    }

    #[test]
    fn test_assignment_and_compound_assignment() {
        let program = parse_ok("var x = 1; x := 2; x += 3");
        assert!(matches!(program.decs[1].dec.node, Dec::Exp(Exp { kind: ExpKind::Assign(..), .. })));
        assert!(matches!(
            program.decs[2].dec.node,
            Dec::Exp(Exp {
                kind: ExpKind::OpAssign(_, BinOp::Add, _),
                ..
            })
        ));
    }

    #[test]
    fn test_instantiated_call_and_less_than() {
        let program = parse_ok("f<Nat>(1); a < b");
        assert!(matches!(
            &program.decs[0].dec.node,
            Dec::Exp(Exp { kind: ExpKind::Call { inst: Some(inst), .. }, .. }) if inst.len() == 1
        ));
        assert!(matches!(
            program.decs[1].dec.node,
            Dec::Exp(Exp {
                kind: ExpKind::Compare(_, RelOp::Lt, _),
                ..
            })
        ));
    }

    #[test]
    fn test_dot_call_shape() {
        let program = parse_ok(r#"import Lib "lib"; let t = "world"; t.foo()"#);
        assert_eq!(program.decs.len(), 3);
        let ExpKind::Call { func, arg, inst: None } = &only_exp(&program).kind else {
            panic!("expected call");
        };
        assert!(matches!(&func.kind, ExpKind::Dot(recv, name) if name.node == "foo" && matches!(recv.kind, ExpKind::Var(_))));
        assert_eq!(arg.kind, ExpKind::Tuple(vec![]));
    }

    #[test]
    fn test_juxtaposed_call() {
        let program = parse_ok(r#"Prim.debugPrint "hi""#);
        assert!(matches!(only_exp(&program).kind, ExpKind::Call { .. }));
    }

    #[test]
    fn test_persistent_actor_with_generic_type_and_query() {
        let program = parse_ok(
            r#"persistent actor { type A<B> = B; public query func main() : async A<Text> { "abc" } }"#,
        );
        let Dec::Object(actor) = &program.decs[0].dec.node else {
            panic!("expected actor");
        };
        assert_eq!(actor.sort, ObjSort::Actor);
        assert!(actor.persistent);
        assert_eq!(actor.fields.len(), 2);
        let Dec::Func(main) = &actor.fields[1].dec.node else {
            panic!("expected function");
        };
        assert!(actor.fields[1].is_public());
        assert_eq!(main.func.sort, FuncSort::Query);
        assert!(matches!(main.func.ret.as_ref().map(|t| &t.kind), Some(TypKind::Async(_))));
    }

    #[test]
    fn test_function_types_keep_parameter_names() {
        let program = parse_ok("type F = shared query <T>(self : Text, n : Nat) -> async ()");
        let Dec::Type(dec) = &program.decs[0].dec.node else {
            panic!("expected type declaration");
        };
        let TypKind::Func {
            sort,
            type_params,
            params,
            ..
        } = &dec.ty.kind
        else {
            panic!("expected function type");
        };
        assert_eq!(*sort, FuncSort::Query);
        assert_eq!(type_params.len(), 1);
        assert_eq!(params[0].name.as_deref(), Some("self"));
        assert_eq!(params[1].name.as_deref(), Some("n"));
    }

    #[test]
    fn test_doc_comments_attach_to_declarations() {
        let program = parse_ok(
            "/** Program comment\n    multi-line */\nimport Prim \"mo:prim\";\nmodule {\n  /// Type comment\n  public type T = Nat;\n}",
        );
        assert_eq!(program.doc.as_deref(), Some("Program comment\n    multi-line"));
        assert_eq!(program.decs[0].doc, None);
        let Dec::Module(module) = &program.decs[1].dec.node else {
            panic!("expected module");
        };
        assert_eq!(module.fields[0].doc.as_deref(), Some("Type comment"));
    }

    #[test]
    fn test_control_flow_forms() {
        let program = parse_ok(
            "var i = 0; while (i < 3) { i += 1 }; for (x in [1, 2].vals()) { ignore x }; \
             switch (?1) { case null 0; case (?n) n }; if (i == 3) 1 else 2",
        );
        assert!(matches!(program.decs[1].dec.node, Dec::Exp(Exp { kind: ExpKind::While(..), .. })));
        assert!(matches!(program.decs[2].dec.node, Dec::Exp(Exp { kind: ExpKind::For(..), .. })));
        assert!(matches!(
            &program.decs[3].dec.node,
            Dec::Exp(Exp { kind: ExpKind::Switch(_, cases), .. }) if cases.len() == 2
        ));
        assert!(matches!(only_exp(&program).kind, ExpKind::If(_, _, Some(_))));
    }

    #[test]
    fn test_records_blocks_and_tuples() {
        let program = parse_ok("let r = { a = 1; var b = 2 }; let b = { 1 }; let t = (1, \"x\"); t.1");
        let Dec::Let(r) = &program.decs[0].dec.node else {
            panic!("expected let");
        };
        assert!(matches!(&r.exp.kind, ExpKind::Record(fields) if fields.len() == 2 && fields[1].mutable));
        let Dec::Let(b) = &program.decs[1].dec.node else {
            panic!("expected let");
        };
        assert!(matches!(b.exp.kind, ExpKind::Block(_)));
        assert!(matches!(only_exp(&program).kind, ExpKind::Proj(_, 1)));
    }

    #[test]
    fn test_expression_ids_are_dense_and_deterministic() {
        let first = parse_ok("let x = 1 + 2; x");
        let second = parse_ok("let x = 1 + 2; x");
        assert_eq!(first.exp_count, 4);
        assert_eq!(first, second);
    }

    #[test]
    fn test_reserved_keyword_is_rejected() {
        let outcome = parse_source("break", false);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("'break'"));
    }

    /// Parse on a thread with a roomy stack, so unoptimized builds can descend the permitted depth.
    fn parse_deep(source: String, recover: bool) -> ParseOutcome {
        std::thread::Builder::new()
            .stack_size(256 * 1024 * 1024)
            .spawn(move || parse_source(&source, recover))
            .expect("spawn parser thread")
            .join()
            .expect("parser thread panicked")
    }

    fn nested(open: &str, inner: &str, close: &str, depth: usize) -> String {
        format!("{}{inner}{}", open.repeat(depth), close.repeat(depth))
    }

    #[test]
    fn test_nesting_below_the_limit_parses() {
        let outcome = parse_deep(nested("(", "1", ")", MAX_NESTING - 10), false);
        assert!(outcome.errors.is_empty(), "{:?}", outcome.errors);
        assert!(outcome.program.is_some());
    }

    #[test]
    fn test_deep_nesting_is_a_syntax_error() {
        for source in [
            nested("(", "1", ")", 5000),
            nested("[", "1", "]", 5000),
            nested("{ ", "1", " }", 5000),
            nested("-", "1", "", 5000),
            nested("?", "1", "", 5000),
            format!("let x : {}Nat = null", "?".repeat(5000)),
            format!("let {} = 1", nested("(", "x", ")", 5000)),
            format!("{}1", "x := ".repeat(5000)),
            format!("1{}", " ** 2".repeat(5000)),
        ] {
            let strict = parse_deep(source.clone(), false);
            assert!(strict.program.is_none());
            assert_eq!(strict.errors.len(), 1);
            assert_eq!(strict.errors[0].code, "M0001");
            assert!(strict.errors[0].message.starts_with("nesting too deep"), "{}", strict.errors[0].message);

            let recovered = parse_deep(source, true);
            assert!(recovered.program.is_some());
            assert!(recovered.errors.iter().any(|e| e.message.starts_with("nesting too deep")));
        }
    }
}
