//! Typechecker unit tests.

use super::*;
use motoko_syntax::parser;

fn check_with(source: &str, imports: &HashMap<String, ImportTarget>, flags: &Flags) -> CheckOutput {
    let program = parser::parse_source(source, false)
        .program
        .unwrap_or_else(|| panic!("parse failed: {source}"));
    check_unit(&program, "main.mo", imports, flags)
}

fn check(source: &str) -> CheckOutput {
    check_with(source, &HashMap::new(), &Flags::default())
}

fn codes_of(output: &CheckOutput) -> Vec<&'static str> {
    output.errors.iter().map(|e| e.code).collect()
}

fn flags(args: &[&str]) -> Flags {
    let mut flags = Flags::default();
    let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
    flags.apply_extra_flags(&args).unwrap();
    flags
}

const LIB: &str = "module { public func foo(self : Text) { ignore self }; public func bar(self : Text, n : Nat) : Nat { n } }";

fn lib_imports() -> HashMap<String, ImportTarget> {
    let program = parser::parse_source(LIB, false).program.unwrap();
    let lib = check_unit(&program, "lib.mo", &HashMap::new(), &Flags::default());
    assert!(lib.errors.is_empty(), "{:?}", lib.errors);
    HashMap::from([(
        "lib".to_string(),
        ImportTarget::Module {
            uri: "lib.mo".into(),
            scope: lib.scope,
        },
    )])
}

// ========================================
// Exports and surfaces
// ========================================

#[test]
fn test_actor_export_type() {
    let output = check(
        r#"actor { type A<B> = B; public query func main() : async A<Text> { "abc" } }"#,
    );
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(
        output.scope.export.to_string(),
        "actor {main : shared query () -> async A<Text>}"
    );
}

#[test]
fn test_module_surface_functions() {
    let program = parser::parse_source(LIB, false).program.unwrap();
    let output = check_unit(&program, "lib.mo", &HashMap::new(), &Flags::default());
    assert!(output.scope.is_module());
    let names: Vec<&str> = output.scope.functions.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["foo", "bar"]);
    let bar = output.scope.function("bar").unwrap();
    assert_eq!(bar.func.to_string(), "(self : Text, n : Nat) -> Nat");
    assert_eq!(bar.qualified_name, "lib.mo.bar");
}

#[test]
fn test_let_value_is_the_export() {
    let output = check("let x : Int = 1; x + 1");
    assert!(output.errors.is_empty());
    assert_eq!(output.scope.export.to_string(), "Int");
    assert_eq!(output.scope.values.get("x").map(ToString::to_string), Some("Int".into()));
}

#[test]
fn test_forward_references_in_declaration_lists() {
    let output = check("func even(n : Nat) : Bool { if (n == 0) true else odd(n - 1) }; func odd(n : Nat) : Bool { if (n == 0) false else even(n - 1) }; even(4)");
    assert!(output.errors.is_empty(), "{:?}", output.errors);
}

// ========================================
// Errors
// ========================================

#[test]
fn test_unbound_variable() {
    let output = check("let y = x + 1");
    assert_eq!(codes_of(&output), vec![codes::UNBOUND_VARIABLE]);
    assert_eq!(output.errors[0].message, "unbound variable x");
}

#[test]
fn test_type_mismatch_message() {
    let output = check(r#"let n : Nat = "hello""#);
    assert_eq!(codes_of(&output), vec![codes::TYPE_MISMATCH]);
    assert_eq!(
        output.errors[0].message,
        "expression of type\n  Text\ncannot produce expected type\n  Nat"
    );
}

#[test]
fn test_literal_out_of_range() {
    let output = check("let b : Nat8 = 256");
    assert_eq!(codes_of(&output), vec![codes::TYPE_MISMATCH]);
    assert!(check("let b : Int8 = -128").errors.is_empty());
}

#[test]
fn test_negative_literal_out_of_range_is_an_int() {
    let output = check("let x : Nat = -1");
    assert_eq!(codes_of(&output), vec![codes::TYPE_MISMATCH]);
    assert_eq!(
        output.errors[0].message,
        "literal of type\n  Int\ndoes not have expected type\n  Nat\n(-1 is out of range)"
    );

    let output = check("let y : Nat8 = 256");
    assert_eq!(
        output.errors[0].message,
        "literal of type\n  Nat\ndoes not have expected type\n  Nat8\n(256 is out of range)"
    );
}

#[test]
fn test_missing_field() {
    let output = check("let r = { a = 1 }; r.b");
    assert_eq!(codes_of(&output), vec![codes::FIELD_MISSING]);
    assert_eq!(output.errors[0].message, "field b does not exist in type\n  {a : Nat}");
}

#[test]
fn test_public_actor_field_must_be_shared() {
    let output = check("actor { public let x = 1 }");
    assert_eq!(codes_of(&output), vec![codes::NON_SHARED_PUBLIC]);
}

#[test]
fn test_non_shared_public_function_shows_its_declared_type() {
    let output = check("actor { public func f() : Nat { 0 } }");
    assert_eq!(codes_of(&output), vec![codes::NON_SHARED_PUBLIC]);
    assert_eq!(output.errors[0].message, "public actor field f has non-shared function type\n  () -> Nat");

    let output = check("actor { public shared func g() : Nat { 0 } }");
    assert_eq!(output.errors[0].message, "public actor field g has non-shared function type\n  shared () -> Nat");
}

#[test]
fn test_misplaced_await_and_return() {
    let output = check("func f() : Nat { await (async 1) }");
    assert!(codes_of(&output).contains(&codes::MISPLACED_AWAIT));
    let output = check("return 1");
    assert_eq!(codes_of(&output), vec![codes::MISPLACED_RETURN]);
}

#[test]
fn test_assignment_needs_mutable_target() {
    let output = check("let x = 1; x := 2");
    assert_eq!(codes_of(&output), vec![codes::NOT_MUTABLE]);
    assert!(check("var x = 1; x := 2").errors.is_empty());
}

#[test]
fn test_unbound_type() {
    let output = check("let x : Missing = 1");
    assert_eq!(codes_of(&output), vec![codes::UNBOUND_TYPE]);
}

#[test]
fn test_errors_accumulate() {
    let output = check("let a = x; let b = y; let c : Nat = \"z\"");
    assert_eq!(
        codes_of(&output),
        vec![codes::UNBOUND_VARIABLE, codes::UNBOUND_VARIABLE, codes::TYPE_MISMATCH]
    );
}

// ========================================
// Warnings and flags
// ========================================

#[test]
fn test_nat_subtraction_warning() {
    let source = "let a : Nat = 1; let b : Nat = 2; a - b";
    let output = check(source);
    assert_eq!(codes_of(&output), vec![codes::NAT_SUBTRACTION]);
    assert!(!output.errors[0].is_error());

    let allowed = check_with(source, &HashMap::new(), &flags(&["-A=M0155"]));
    assert!(allowed.errors.is_empty());

    let promoted = check_with(source, &HashMap::new(), &flags(&["-Werror"]));
    assert!(promoted.errors[0].is_error());

    let hidden = check_with(source, &HashMap::new(), &flags(&["--hide-warnings"]));
    assert!(hidden.errors.is_empty());
}

#[test]
fn test_redundant_instantiation_warning() {
    let source = "func id<T>(x : T) : T { x }; id<Nat>(1)";
    assert!(check(source).errors.is_empty());
    let output = check_with(source, &HashMap::new(), &flags(&["-W=M0223"]));
    assert_eq!(codes_of(&output), vec![codes::REDUNDANT_INSTANTIATION]);
}

#[test]
fn test_unused_identifier_warning() {
    let source = "func f() : Nat { let unused = 1; 2 }";
    assert!(check(source).errors.is_empty());
    let output = check_with(source, &HashMap::new(), &flags(&["-W=M0194"]));
    assert_eq!(codes_of(&output), vec![codes::UNUSED_IDENTIFIER]);
    assert_eq!(
        output.errors[0].message,
        "unused identifier unused (delete or rename to wildcard `_` or `_unused`)"
    );
}

// ========================================
// Imports and contextual dot
// ========================================

#[test]
fn test_contextual_dot_binding() {
    let imports = lib_imports();
    let output = check_with(r#"import Lib "lib"; let t = "world"; t.foo()"#, &imports, &Flags::default());
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    let bindings: Vec<&DotBinding> = output.info.dot_bindings.values().collect();
    assert_eq!(
        bindings,
        vec![&DotBinding {
            module_alias: Some("Lib".into()),
            module_uri: "lib.mo".into(),
            func_name: "foo".into(),
        }]
    );
    assert_eq!(output.scope.export.to_string(), "()");
}

#[test]
fn test_contextual_dot_with_arguments() {
    let imports = lib_imports();
    let output = check_with(r#"import Lib "lib"; let t = "world"; t.bar(3)"#, &imports, &Flags::default());
    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert_eq!(output.scope.export.to_string(), "Nat");
}

#[test]
fn test_contextual_dot_requires_matching_receiver() {
    let imports = lib_imports();
    let output = check_with(r#"import Lib "lib"; let n = 1; n.foo()"#, &imports, &Flags::default());
    assert_eq!(codes_of(&output), vec![codes::FIELD_MISSING]);
}

#[test]
fn test_import_of_non_module() {
    let program = parser::parse_source("actor {}", false).program.unwrap();
    let actor = check_unit(&program, "a.mo", &HashMap::new(), &Flags::default());
    let imports = HashMap::from([(
        "a".to_string(),
        ImportTarget::Module {
            uri: "a.mo".into(),
            scope: actor.scope,
        },
    )]);
    let output = check_with(r#"import A "a"; 1"#, &imports, &Flags::default());
    assert_eq!(codes_of(&output), vec![codes::IMPORT_NOT_MODULE]);
    assert_eq!(output.errors[0].message, "file a.mo must contain a module");
}

#[test]
fn test_expression_types_are_recorded() {
    let output = check("let x = 1; x");
    assert!(output.info.exp_types.iter().all(Option::is_some));
}
