//! Property-based tests for the Motoko compiler
//!
//! These tests use proptest to verify invariants across many randomly
//! generated inputs, catching edge cases that hand-written tests might miss.

use motoko::api::{self, Session, Target};
use motoko::config::Flags;
use proptest::prelude::*;

// =============================================================================
// Parser Properties
// =============================================================================

/// Fragments that combine into plausible (and often malformed) programs.
fn fragment() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "let", "var", "x", "=", "1", "+", "(", ")", "{", "}", ";", "func", "f", ":", "Nat", "\"t\"", "actor", "if",
        "else", "[", "]", ",", "?", "null", "import", "module", "public", ".", "#", "await", "async",
    ])
}

fn program() -> impl Strategy<Value = String> {
    prop::collection::vec(fragment(), 0..24).prop_map(|parts| parts.join(" "))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// Property: a strict parse either yields a tree or at least one diagnostic, never both absent
    #[test]
    fn strict_parse_reports_every_failure(source in program()) {
        let result = api::parse(&source, false);
        if result.code.is_none() {
            prop_assert!(!result.diagnostics.is_empty());
        }
    }

    /// Property: strict failures stop at exactly one diagnostic
    #[test]
    fn strict_parse_reports_one_error(source in program()) {
        let result = api::parse(&source, false);
        if result.code.is_none() {
            prop_assert_eq!(result.diagnostics.len(), 1);
        }
    }

    /// Property: recovery never changes the outcome of input that parses cleanly
    #[test]
    fn recovery_agrees_on_clean_input(source in program()) {
        let strict = api::parse(&source, false);
        if strict.code.is_some() && strict.diagnostics.is_empty() {
            let recovered = api::parse(&source, true);
            prop_assert!(recovered.diagnostics.is_empty());
            prop_assert_eq!(recovered.code, strict.code);
        }
    }

    /// Property: arbitrary text never panics the parser in either mode
    #[test]
    fn parser_handles_arbitrary_text(source in "\\PC{0,64}") {
        let _ = api::parse(&source, false);
        let _ = api::parse(&source, true);
    }

    /// Property: diagnostic ranges never point past the end of the text
    #[test]
    fn diagnostic_ranges_stay_in_the_text(source in program()) {
        let lines = source.lines().count().max(1) as u32;
        for diagnostic in api::parse(&source, true).diagnostics {
            prop_assert!(diagnostic.range.start <= diagnostic.range.end);
            prop_assert!(diagnostic.range.end.line < lines);
        }
    }
}

// =============================================================================
// Pipeline Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: artifacts are present exactly when no diagnostic is an error
    #[test]
    fn artifacts_follow_the_error_invariant(source in program()) {
        let mut session = Session::new();
        session.save_unit("main.mo", source);
        let result = session.compile(Target::Wasi, "main.mo").unwrap();
        prop_assert_eq!(result.code.is_some(), !result.has_errors());
    }

    /// Property: Nat arithmetic in the interpreter matches Rust's
    #[test]
    fn interpreter_adds_and_multiplies_nats(a in 0u64..1_000_000, b in 0u64..1_000_000) {
        let mut session = Session::new();
        session.save_unit("main.mo", format!("{a} * {b} + {a}"));
        let run = session.run(&[], "main.mo");
        prop_assert!(!run.failed(), "{}", run.stderr);
        prop_assert_eq!(run.stdout, format!("{} : Nat\n", group_digits(a * b + a)));
    }

    /// Property: failed flag updates leave the flags untouched
    #[test]
    fn rejected_flags_change_nothing(junk in "[a-z]{1,8}") {
        let mut flags = Flags::default();
        flags.apply_extra_flags(&["-W=M0223".to_string()]).unwrap();
        let before = flags.clone();
        let args = vec!["--hide-warnings".to_string(), format!("--{junk}")];
        prop_assert!(flags.apply_extra_flags(&args).is_err());
        prop_assert_eq!(flags, before);
    }
}

/// `1234567` as `1_234_567`, the way Nat values print.
fn group_digits(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('_');
        }
        out.push(c);
    }
    out
}
