//! Layering guardrails between the workspace crates.
//!
//! The syntax frontend (`motoko_syntax`) and the vocabulary crate (`motoko_core`) are shared with tooling that does
//! not want the compiler pipeline: they must never depend on the root `motoko` crate, on the async/LSP stack, or on
//! the wasm encoder. Inside the root crate, `wasm_encoder` is confined to `src/backend`.

use std::fs;
use std::path::Path;

/// Dependency names listed in the `[dependencies]` table of a manifest.
fn main_dependencies(manifest: &str) -> Vec<String> {
    let mut in_dependencies = false;
    let mut names = Vec::new();

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        if line.starts_with('[') {
            in_dependencies = line == "[dependencies]";
            continue;
        }
        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }
        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if let Some((name, _)) = line_no_comment.split_once('=') {
            names.push(name.trim().to_string());
        }
    }
    names
}

#[test]
fn shared_crates_stay_below_the_compiler() {
    let forbidden = ["motoko", "tower-lsp", "tokio", "wasm-encoder", "clap"];
    for manifest in [
        include_str!("../crates/motoko_syntax/Cargo.toml"),
        include_str!("../crates/motoko_core/Cargo.toml"),
    ] {
        for dep in main_dependencies(manifest) {
            assert!(
                !forbidden.contains(&dep.as_str()),
                "`{dep}` must not appear in the [dependencies] of a shared crate"
            );
        }
    }
}

#[test]
fn vocabulary_crate_has_no_dependencies() {
    let deps = main_dependencies(include_str!("../crates/motoko_core/Cargo.toml"));
    assert!(deps.is_empty(), "motoko_core should stay dependency-free, found {deps:?}");
}

fn rust_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) {
    let Ok(entries) = fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            rust_files(&path, out);
        } else if path.extension().is_some_and(|ext| ext == "rs") {
            out.push(path);
        }
    }
}

#[test]
fn wasm_encoding_stays_in_the_backend() {
    let root = Path::new(env!("CARGO_MANIFEST_DIR"));
    let backend = root.join("src").join("backend");
    let mut files = Vec::new();
    rust_files(&root.join("src"), &mut files);
    assert!(!files.is_empty());

    for file in files {
        if file.starts_with(&backend) {
            continue;
        }
        let text = fs::read_to_string(&file).unwrap();
        assert!(
            !text.contains("wasm_encoder"),
            "{} uses wasm_encoder outside src/backend",
            file.display()
        );
    }
}
