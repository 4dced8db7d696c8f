//! End-to-end tests of the session API.
//!
//! These drive a [`Session`] the way tools do: save units, then parse, check, compile, run and query them, asserting
//! on the serialized shapes callers see.

use motoko::api::{self, ScopeCache, Session, Target};

const AST_MO: &str = r#"
  /** Program comment
      multi-line */
  import Prim "mo:prim";

  persistent actor {
    /// Type comment
    type T = Nat;
    /// Variable comment
    var x : T = 0;
    /** Function comment */
    public query func main() : async T { x };
    /// Sub-module comment
    module M {
      /// Class comment
      public class C() {};
    };
  }"#;

const LIB_MO: &str =
    "module { public func foo(self : Text) { ignore self }; public func bar(self : Text, n : Nat) : Nat { n } }";

fn session() -> Session {
    let mut session = Session::new();
    session.save_unit("empty.mo", "");
    session.save_unit("ok.mo", "1");
    session.save_unit("bad.mo", "1+");
    session.save_unit(
        "actor.mo",
        r#"persistent actor { type A<B> = B; public query func main() : async A<Text> { "abc" } }"#,
    );
    session.save_unit("ast.mo", AST_MO);
    session.save_unit("lib.mo", LIB_MO);
    session.save_unit("dot.mo", r#"import Lib "lib"; let t = "world"; t.foo()"#);
    session
}

// ============================================================================
// Unit store and compilation
// ============================================================================

#[test]
fn saved_units_read_back() {
    let session = session();
    assert_eq!(session.read_unit("empty.mo").unwrap(), "");
    assert_eq!(session.read_unit("ok.mo").unwrap(), "1");
}

#[test]
fn empty_units_compile_for_both_targets() {
    let session = session();
    let wasi = session.compile(Target::Wasi, "empty.mo").unwrap();
    let ic = session.compile(Target::InternetComputer, "empty.mo").unwrap();
    assert!(wasi.diagnostics.is_empty());
    assert!(ic.diagnostics.is_empty());

    let wasi = wasi.code.unwrap();
    let ic = ic.code.unwrap();
    for artifact in [&wasi, &ic] {
        assert_eq!(&artifact.bytes[..8], &[0, 97, 115, 109, 1, 0, 0, 0]);
    }
    assert_ne!(wasi.bytes, ic.bytes);
}

#[test]
fn removed_units_fail_with_a_resource_fault() {
    let mut session = session();
    session.remove_unit("empty.mo");
    let err = session.compile(Target::InternetComputer, "empty.mo").unwrap_err();
    assert!(err.to_string().contains("No such file or directory"), "{err}");
}

#[test]
fn syntax_errors_are_returned_as_diagnostics() {
    let session = session();
    let result = session.compile(Target::InternetComputer, "bad.mo").unwrap();
    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "diagnostics": [{
                "range": {
                    "start": {"line": 0, "character": 2},
                    "end": {"line": 0, "character": 2},
                },
                "severity": 1,
                "source": "bad.mo",
                "code": "M0001",
                "category": "syntax",
                "message": "unexpected end of input, expected one of token or <phrase> sequence:\n  <exp_bin(ob)> (e.g. '42')",
            }],
            "code": null,
        })
    );
}

#[test]
fn check_reports_but_never_returns_code() {
    let session = session();
    let ok = session.check("ok.mo").unwrap();
    assert!(ok.diagnostics.is_empty());
    assert!(ok.code.is_none());

    let bad = session.check("bad.mo").unwrap();
    assert_eq!(bad.diagnostics.len(), 1);
    assert_eq!(bad.diagnostics[0].code.as_deref(), Some("M0001"));
    assert!(bad.code.is_none());
}

#[test]
fn long_multibyte_text_literals_check_cleanly() {
    let mut session = session();
    session.save_unit("text.mo", format!("let s = \"{}\"; s.size()", "⛔|".repeat(10_000)));
    let result = session.check("text.mo").unwrap();
    assert!(result.diagnostics.is_empty(), "{:?}", result.diagnostics);
    assert!(result.code.is_none());
}

// ============================================================================
// Interpreter
// ============================================================================

#[test]
fn running_an_actor_prints_its_principal() {
    let session = session();
    let run = session.run(&[], "actor.mo");
    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "stdout": "`ys6dh-5cjiq-5dc` : actor {main : shared query () -> async A<Text>}\n",
            "stderr": "",
            "result": {"error": null},
        })
    );
}

#[test]
fn blob_placeholders_type_check_and_fail_when_run() {
    let mut session = session();
    session.set_blob_import_placeholders(true);
    session.save_unit("blob.mo", r#"import MyBlob "blob:file:path/to/blob.txt"; MyBlob.size();"#);

    let text = session.read_unit("blob.mo").unwrap();
    assert!(api::parse(&text, true).code.is_some());

    let run = session.run(&[], "blob.mo");
    let json = serde_json::to_value(&run).unwrap();
    assert_eq!(
        json,
        serde_json::json!({
            "stdout": "",
            "stderr": "blob.mo:1.1-1.43: execution error, blob import placeholder\n",
            "result": {"error": {}},
        })
    );
}

#[test]
fn blob_imports_are_rejected_without_the_toggle() {
    let mut session = session();
    session.save_unit("blob.mo", r#"import MyBlob "blob:file:path/to/blob.txt"; MyBlob.size();"#);
    let result = session.check("blob.mo").unwrap();
    assert!(result.has_errors());
}

// ============================================================================
// Syntax trees
// ============================================================================

fn assert_doc_comments(tree: &motoko_syntax::syntax_tree::SyntaxNode) {
    let json = serde_json::to_string(tree).unwrap();
    for needle in [
        r#""name":"*","args":["Program comment\n      multi-line""#,
        r#""name":"*","args":["Type comment""#,
        r#""name":"*","args":["Variable comment""#,
        r#""name":"*","args":["Function comment""#,
        r#""name":"*","args":["Sub-module comment""#,
        r#""name":"*","args":["Class comment""#,
    ] {
        assert!(json.contains(needle), "missing {needle}");
    }
}

#[test]
fn doc_comments_appear_in_every_tree_shape() {
    let mut session = session();
    let text = session.read_unit("ast.mo").unwrap();

    assert_doc_comments(&api::parse(&text, false).code.unwrap());
    assert_doc_comments(&api::parse(&text, true).code.unwrap());

    let typed = session.parse_typed(&["ast.mo".into()]).unwrap();
    assert_doc_comments(&typed.code.unwrap()[0].ast);

    for recover in [false, true] {
        let cached = session
            .parse_typed_with_cache(recover, &["ast.mo".into()], ScopeCache::new())
            .unwrap();
        let (units, _) = cached.code.unwrap();
        assert_doc_comments(&units[0].ast);
    }
}

#[test]
fn typed_results_expose_scopes() {
    let mut session = session();
    let typed = session.parse_typed(&["ast.mo".into()]).unwrap();
    let json = serde_json::to_value(&typed).unwrap();
    assert!(!json["code"][0]["scope"].is_null());

    let cached = session
        .parse_typed_with_cache(true, &["ast.mo".into()], ScopeCache::new())
        .unwrap();
    let json = serde_json::to_value(&cached).unwrap();
    assert!(!json["code"][0][0]["scope"].is_null());
    assert_eq!(json["code"][0][0]["immediateImports"], serde_json::json!(["mo:prim"]));
}

#[test]
fn recovery_keeps_a_tree_for_malformed_input() {
    let mut session = session();
    let text = session.read_unit("bad.mo").unwrap();
    assert!(api::parse(&text, false).code.is_none());
    assert!(api::parse(&text, true).code.is_some());

    let strict = session
        .parse_typed_with_cache(false, &["bad.mo".into()], ScopeCache::new())
        .unwrap();
    assert!(strict.code.is_none());
}

// ============================================================================
// Interfaces
// ============================================================================

#[test]
fn candid_interface_of_documented_actor() {
    let session = session();
    let candid = session.extract_interface("ast.mo").unwrap().code.unwrap();
    assert_eq!(
        candid,
        "type T = nat;\n/// Program comment\n///       multi-line\nservice : {\n  /// Function comment\n  main: () -> (T) query;\n}\n"
    );
}

// ============================================================================
// Contextual dots
// ============================================================================

#[test]
fn contextual_dot_binding_and_suggestions() {
    let mut session = session();
    let result = session
        .parse_typed_with_cache(true, &["dot.mo".into()], ScopeCache::new())
        .unwrap();
    let (units, _) = result.code.expect("dot.mo should type check");
    let ast = &units[0].ast;
    let scope = &units[0].scope;

    // Prog -> last declaration (@) -> ExpD -> call (@:) -> CallE -> DotE (@:)
    let exp_d = ast.arg(2).and_then(|at| at.arg(2)).unwrap();
    assert_eq!(exp_d.name, "ExpD");
    let call = exp_d.arg(0).and_then(|at| at.arg(2)).and_then(|typed| typed.arg(0)).unwrap();
    assert_eq!(call.name, "CallE");
    let dot = call.arg(0).and_then(|at| at.arg(2)).and_then(|typed| typed.arg(0)).unwrap();
    assert_eq!(dot.name, "DotE");

    let binding = session.resolve_dot_call_binding(dot.raw_exp.unwrap()).unwrap();
    assert_eq!(binding.func_name, "foo");
    assert_eq!(binding.module_name_or_uri, "Lib");

    let var = dot.arg(0).and_then(|at| at.arg(2)).and_then(|typed| typed.arg(0)).unwrap();
    assert_eq!(var.name, "VarE");
    assert!(session.resolve_dot_call_binding(var.raw_exp.unwrap()).is_none());

    let suggestions = session.suggest_dot_completions(scope, var.raw_exp.unwrap());
    assert_eq!(
        serde_json::to_value(&suggestions).unwrap(),
        serde_json::json!([
            {"moduleUri": "lib.mo", "funcName": "bar", "funcType": "(self : Text, n : Nat) -> Nat"},
            {"moduleUri": "lib.mo", "funcName": "foo", "funcType": "(self : Text) -> ()"},
        ])
    );
}

#[test]
fn handles_of_other_sessions_resolve_to_nothing() {
    let mut first = session();
    let second = session();
    let result = first
        .parse_typed_with_cache(true, &["dot.mo".into()], ScopeCache::new())
        .unwrap();
    let (units, _) = result.code.unwrap();
    let dot = units[0].ast.find_first("DotE").unwrap();
    assert!(first.resolve_dot_call_binding(dot.raw_exp.unwrap()).is_some());
    assert!(second.resolve_dot_call_binding(dot.raw_exp.unwrap()).is_none());
}

// ============================================================================
// Configuration
// ============================================================================

#[test]
fn extra_flags_are_validated_synchronously() {
    let mut session = session();
    session.set_extra_flags(&["-W=M0223".into()]).unwrap();

    let err = session.set_extra_flags(&["--invalid-flag".into()]).unwrap_err();
    assert!(err.to_string().contains("unknown option"));

    let err = session.set_extra_flags(&["-W=MMM".into()]).unwrap_err();
    assert_eq!(err.to_string(), "moc: invalid warning code: MMM");
}

#[test]
fn enabled_warnings_do_not_block_artifacts() {
    let mut session = session();
    session.save_unit("unused.mo", "func f() : Nat { let unused = 1; 2 }; f()");
    session.set_extra_flags(&["-W=M0194".into()]).unwrap();
    let result = session.compile(Target::Wasi, "unused.mo").unwrap();
    assert!(result.diagnostics.iter().any(|d| d.code.as_deref() == Some("M0194")));
    assert!(result.code.is_some());

    session.set_extra_flags(&["-Werror".into()]).unwrap();
    let result = session.compile(Target::Wasi, "unused.mo").unwrap();
    assert!(result.has_errors());
    assert!(result.code.is_none());
}

#[test]
fn the_default_session_is_shared() {
    let guard = motoko::default_session().lock().unwrap();
    assert!(guard.read_unit("never-saved.mo").is_err());
}
