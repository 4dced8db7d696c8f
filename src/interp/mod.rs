//! Reference interpreter.
//!
//! Evaluates a checked program directly from its syntax tree, using the static types recorded by the typechecker
//! where evaluation depends on them (numeric ranges, literal kinds, printing). `async` blocks run eagerly and `await`
//! unwraps their result.
//!
//! ## Notes
//! - Integers are arbitrary precision. Fixed-width results are checked against the range of their static type.
//! - Units run in dependency order; each imported unit is evaluated once and its value shared by importers.
//! - A program whose type is not `()` prints its value as `<value> : <type>` after running.

mod eval;
pub mod principal;
pub mod value;

use motoko_syntax::diagnostics::{LineIndex, LineCol, Range, format_range};

use crate::frontend::resolver::Resolution;
use crate::vfs;

/// A fault raised while running a program.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{path}:{}: execution error, {message}", format_range(.range))]
pub struct ExecutionError {
    pub path: String,
    pub range: Range,
    pub message: String,
}

/// Output of a run. `stdout` keeps what was printed before a fault.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Execution {
    pub stdout: String,
    pub error: Option<ExecutionError>,
}

/// Run `entry` and the units it imports. `resolution` must be free of errors.
#[tracing::instrument(skip_all, fields(entry = %entry))]
pub fn execute(resolution: &Resolution, entry: &str) -> Execution {
    let path = vfs::normalize(entry);
    let Some(entry_index) = resolution.units.iter().position(|u| u.path == path) else {
        let origin = LineCol { line: 0, character: 0 };
        return Execution {
            stdout: String::new(),
            error: Some(ExecutionError {
                path,
                range: Range {
                    start: origin,
                    end: origin,
                },
                message: "unit was not resolved".into(),
            }),
        };
    };

    let mut interpreter = eval::Interpreter::new(&resolution.units);
    let mut result = None;
    for index in 0..=entry_index {
        match interpreter.run_unit(index) {
            Ok(value) => result = Some(value),
            Err(fault) => {
                let unit = &resolution.units[fault.unit];
                let range = LineIndex::new(&unit.text).range(fault.span);
                tracing::debug!(unit = %unit.path, message = %fault.message, "execution fault");
                return Execution {
                    stdout: std::mem::take(&mut interpreter.stdout),
                    error: Some(ExecutionError {
                        path: unit.path.clone(),
                        range,
                        message: fault.message,
                    }),
                };
            }
        }
    }

    let mut stdout = std::mem::take(&mut interpreter.stdout);
    let ty = &resolution.units[entry_index].scope.export;
    if let Some(value) = result {
        if !ty.is_unit() && !ty.is_error() {
            stdout.push_str(&format!("{} : {ty}\n", value::show(&value, ty)));
        }
    }
    Execution { stdout, error: None }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Flags;
    use crate::frontend::cache::ScopeCache;
    use crate::frontend::resolver;
    use crate::vfs::VirtualFs;

    fn run_with(files: &[(&str, &str)], flags: &Flags) -> Execution {
        let mut store = VirtualFs::in_memory();
        for (path, text) in files {
            store.save(path, *text);
        }
        let entry = files[files.len() - 1].0;
        let resolution = resolver::resolve(&store, flags, &[entry.to_string()], false, ScopeCache::new()).unwrap();
        assert!(!resolution.has_errors(), "{:?}", resolution.diagnostics);
        execute(&resolution, entry)
    }

    fn run(source: &str) -> Execution {
        run_with(&[("main.mo", source)], &Flags::default())
    }

    #[test]
    fn actors_print_as_principals_with_their_type() {
        let out = run("persistent actor { type A<B> = B; public query func main() : async A<Text> { \"abc\" } }");
        assert_eq!(out.stdout, "`ys6dh-5cjiq-5dc` : actor {main : shared query () -> async A<Text>}\n");
        assert!(out.error.is_none());
    }

    #[test]
    fn program_values_print_with_their_type() {
        assert_eq!(run("1").stdout, "1 : Nat\n");
        assert_eq!(run("(1 : Int) + 2").stdout, "+3 : Int\n");
        assert_eq!(run("\"a\" # \"b\"").stdout, "\"ab\" : Text\n");
        assert_eq!(run("").stdout, "");
    }

    #[test]
    fn prim_functions_print_and_convert() {
        let out = run("import Prim \"mo:prim\";\nPrim.debugPrint(Prim.natToText(40 + 2));\nPrim.debugPrint(\"done\")");
        assert_eq!(out.stdout, "42\ndone\n");
    }

    #[test]
    fn recursion_loops_and_mutation() {
        let source = "func fact(n : Nat) : Nat { if (n == 0) 1 else n * fact(n - 1) };\nvar total = 0;\nvar i = 0;\nwhile (i < 5) { total += fact(i); i += 1 };\ntotal";
        assert_eq!(run(source).stdout, "34 : Nat\n");
    }

    #[test]
    fn iteration_over_arrays_and_text() {
        let source = "var n = 0;\nfor (x in [1, 2, 3].vals()) { n += x };\nfor (c in \"ab\".chars()) { n += 10 };\nn";
        assert_eq!(run(source).stdout, "26 : Nat\n");
    }

    #[test]
    fn overflow_is_an_execution_error() {
        let out = run("let x : Nat8 = 200;\nx + 100");
        let error = out.error.unwrap();
        assert_eq!(error.message, "arithmetic overflow");
        assert_eq!(error.to_string(), "main.mo:2.1-2.8: execution error, arithmetic overflow");
    }

    #[test]
    fn nat_and_int_are_unbounded() {
        assert_eq!(
            run("2 ** 200").stdout,
            "1_606_938_044_258_990_275_541_962_092_341_162_602_522_202_993_782_792_835_301_376 : Nat\n"
        );
        assert_eq!(
            run("(0 : Int) - 2 ** 130").stdout,
            "-1_361_129_467_683_753_853_853_498_429_727_072_845_824 : Int\n"
        );
        assert_eq!(
            run("340282366920938463463374607431768211456 + 1").stdout,
            "340_282_366_920_938_463_463_374_607_431_768_211_457 : Nat\n"
        );
        let out = run("let n : Nat = 0;\nn - 1");
        assert_eq!(out.error.unwrap().message, "arithmetic overflow");
    }

    #[test]
    fn output_before_a_trap_is_kept() {
        let out = run("import Prim \"mo:prim\";\nPrim.debugPrint(\"before\");\nassert (1 > 2)");
        assert_eq!(out.stdout, "before\n");
        assert_eq!(out.error.unwrap().message, "assertion failure");
    }

    #[test]
    fn imported_modules_and_contextual_dots() {
        let out = run_with(
            &[
                ("lib.mo", "module { public func twice(self : Nat) : Nat { self * 2 } }"),
                ("main.mo", "import Lib \"lib\";\nlet n = 21;\nn.twice()"),
            ],
            &Flags::default(),
        );
        assert_eq!(out.stdout, "42 : Nat\n");
    }

    #[test]
    fn blob_placeholders_fail_at_run_time() {
        let flags = Flags {
            blob_import_placeholders: true,
            ..Flags::default()
        };
        let out = run_with(
            &[("blob.mo", "import MyBlob \"blob:file:path/to/blob.txt\"; MyBlob.size();")],
            &flags,
        );
        assert_eq!(out.stdout, "");
        assert_eq!(
            out.error.unwrap().to_string(),
            "blob.mo:1.1-1.43: execution error, blob import placeholder"
        );
    }

    #[test]
    fn switch_and_options() {
        let source = "let o : ?Nat = ?5;\nswitch (o) { case (null) { 0 }; case (?n) { n + 1 } }";
        assert_eq!(run(source).stdout, "6 : Nat\n");
    }
}
