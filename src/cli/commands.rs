//! CLI command implementations
//!
//! All command functions return `CliResult<ExitCode>` instead of calling
//! `process::exit`. Error handling and exits happen in the top-level `run()`.

use std::fs;
use std::path::{Path, PathBuf};

use motoko_syntax::diagnostics::{Diagnostic, SourceReport};
use motoko_syntax::syntax_tree::{SyntaxArg, SyntaxNode};

use crate::api;
use crate::backend::Target;
use crate::session::Session;

use super::{CliError, CliResult, ExitCode, SessionFlags};

/// Maximum source file size (100 MB)
///
/// Files larger than this are rejected before parsing.
const MAX_SOURCE_SIZE: u64 = 100 * 1024 * 1024;

/// A disk-backed session configured from the command-line flags.
pub fn session(flags: &SessionFlags) -> CliResult<Session> {
    let mut session = Session::with_disk();
    session.set_extra_flags(&flags.to_args())?;
    Ok(session)
}

/// Print diagnostics to stderr, with source snippets where the unit can be read.
///
/// Returns whether any diagnostic is an error.
pub fn report_diagnostics(session: &Session, diagnostics: &[Diagnostic]) -> bool {
    for diagnostic in diagnostics {
        match session.read_unit(&diagnostic.source) {
            Ok(text) => eprintln!("{:?}", miette::Report::new(SourceReport::new(diagnostic, &text))),
            Err(_) => eprintln!("{}", diagnostic.render_line()),
        }
    }
    diagnostics.iter().any(Diagnostic::is_error)
}

fn exit_for(has_errors: bool) -> ExitCode {
    if has_errors { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}

/// Reject oversized sources before they reach the parser.
fn check_source_size(file_path: &str) -> CliResult<()> {
    let Ok(metadata) = fs::metadata(file_path) else {
        // Missing files surface as resource faults from the session.
        return Ok(());
    };
    if metadata.len() > MAX_SOURCE_SIZE {
        return Err(CliError::failure(format!(
            "Source file '{}' is too large ({} bytes, max {} bytes)",
            file_path,
            metadata.len(),
            MAX_SOURCE_SIZE
        )));
    }
    Ok(())
}

/// Type check files.
pub fn check_files(session: &Session, files: &[String]) -> CliResult<ExitCode> {
    let mut has_errors = false;
    for file in files {
        check_source_size(file)?;
        let result = session.check(file)?;
        has_errors |= report_diagnostics(session, &result.diagnostics);
    }
    if !has_errors {
        eprintln!("✓ Type check passed!");
    }
    Ok(exit_for(has_errors))
}

/// Compile a file and write the module next to it (or to `output`).
pub fn compile_file(session: &Session, file: &str, target: Target, output: Option<&Path>) -> CliResult<ExitCode> {
    check_source_size(file)?;
    let result = session.compile(target, file)?;
    report_diagnostics(session, &result.diagnostics);
    let Some(artifact) = result.code else {
        return Ok(ExitCode::FAILURE);
    };
    let out = output.map(Path::to_path_buf).unwrap_or_else(|| default_output(file));
    fs::write(&out, &artifact.bytes)
        .map_err(|e| CliError::failure(format!("Error writing '{}': {}", out.display(), e)))?;
    println!("✓ Wrote {} ({} bytes, {})", out.display(), artifact.bytes.len(), target);
    Ok(ExitCode::SUCCESS)
}

fn default_output(file: &str) -> PathBuf {
    Path::new(file).with_extension("wasm")
}

/// Interpret files in order.
pub fn run_files(session: &Session, files: &[String]) -> CliResult<ExitCode> {
    let Some((main, prelude)) = files.split_last() else {
        return Err(CliError::failure("Error: run requires at least one file"));
    };
    for file in files {
        check_source_size(file)?;
    }
    let result = session.run(prelude, main);
    print!("{}", result.stdout);
    eprint!("{}", result.stderr);
    Ok(exit_for(result.failed()))
}

/// Print the Candid interface of an actor.
pub fn print_interface(session: &Session, file: &str) -> CliResult<ExitCode> {
    check_source_size(file)?;
    let result = session.extract_interface(file)?;
    report_diagnostics(session, &result.diagnostics);
    match result.code {
        Some(candid) => {
            print!("{candid}");
            Ok(ExitCode::SUCCESS)
        }
        None => Ok(ExitCode::FAILURE),
    }
}

/// Parse a file and print its tree.
pub fn parse_file(session: &Session, file: &str, recover: bool, json: bool) -> CliResult<ExitCode> {
    check_source_size(file)?;
    let text = session.read_unit(file)?;
    let result = api::parse(&text, recover);
    if json {
        let out = serde_json::to_string_pretty(&result)
            .map_err(|e| CliError::failure(format!("Error serializing syntax tree: {}", e)))?;
        println!("{out}");
    } else {
        let diagnostics: Vec<Diagnostic> = result
            .diagnostics
            .iter()
            .cloned()
            .map(|mut d| {
                d.source = file.to_string();
                d
            })
            .collect();
        report_diagnostics(session, &diagnostics);
        if let Some(tree) = &result.code {
            println!("{}", render_tree(tree));
        }
    }
    Ok(exit_for(result.code.is_none()))
}

/// Render a tree as nested `Name(arg, ..)` terms.
pub fn render_tree(node: &SyntaxNode) -> String {
    let args: Vec<String> = node
        .args
        .iter()
        .map(|arg| match arg {
            SyntaxArg::Node(child) => render_tree(child),
            SyntaxArg::Text(text) => format!("{text:?}"),
        })
        .collect();
    if args.is_empty() {
        node.name.to_string()
    } else {
        format!("{}({})", node.name, args.join(", "))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn trees_render_as_terms() {
        let tree = api::parse("1", false).code.unwrap();
        let text = render_tree(&tree);
        assert!(text.starts_with("Prog("), "{text}");
        assert!(text.contains("LitE"), "{text}");
    }

    #[test]
    fn default_output_swaps_the_extension() {
        assert_eq!(default_output("dir/main.mo"), PathBuf::from("dir/main.wasm"));
    }

    #[test]
    fn missing_files_are_resource_faults() {
        let session = Session::new();
        let err = check_files(&session, &["missing.mo".into()]).unwrap_err();
        assert_eq!(err.message, "moc: missing.mo: No such file or directory");
    }
}
