//! Virtual unit store.
//!
//! Units are addressed by logical, normalized paths (`lib.mo`, `pkg/base/Text.mo`). Saved texts overlay the disk;
//! reads of unsaved paths fall back to the file system so the CLI can compile files in place.
//!
//! ## Notes
//! - A removed unit stays removed even if a file with that path exists on disk.
//! - Paths are normalized once on entry: `./a/../b.mo` and `b.mo` name the same unit.

use std::collections::{HashMap, HashSet};
use std::fs;

/// A unit could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResourceError {
    #[error("{path}: No such file or directory")]
    NotFound { path: String },
    #[error("{path}: {message}")]
    Unreadable { path: String, message: String },
}

#[derive(Debug, Default, Clone)]
pub struct VirtualFs {
    units: HashMap<String, String>,
    removed: HashSet<String>,
    disk_fallback: bool,
}

impl VirtualFs {
    /// An in-memory store that also reads unsaved paths from disk.
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            removed: HashSet::new(),
            disk_fallback: true,
        }
    }

    /// A purely in-memory store.
    pub fn in_memory() -> Self {
        Self {
            disk_fallback: false,
            ..Self::default()
        }
    }

    pub fn save(&mut self, path: &str, text: impl Into<String>) {
        let path = normalize(path);
        self.removed.remove(&path);
        self.units.insert(path, text.into());
    }

    pub fn remove(&mut self, path: &str) {
        let path = normalize(path);
        self.units.remove(&path);
        self.removed.insert(path);
    }

    pub fn read(&self, path: &str) -> Result<String, ResourceError> {
        let path = normalize(path);
        if let Some(text) = self.units.get(&path) {
            return Ok(text.clone());
        }
        if self.removed.contains(&path) || !self.disk_fallback {
            return Err(ResourceError::NotFound { path });
        }
        fs::read_to_string(&path).map_err(|err| match err.kind() {
            std::io::ErrorKind::NotFound => ResourceError::NotFound { path: path.clone() },
            _ => ResourceError::Unreadable {
                path: path.clone(),
                message: err.to_string(),
            },
        })
    }

    pub fn exists(&self, path: &str) -> bool {
        self.read(path).is_ok()
    }
}

/// Normalize a logical path: forward slashes, no `.` segments, `..` folded where possible.
pub fn normalize(path: &str) -> String {
    let absolute = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match parts.last() {
                Some(&last) if last != ".." => {
                    parts.pop();
                }
                _ if absolute => {}
                _ => parts.push(".."),
            },
            other => parts.push(other),
        }
    }
    let joined = parts.join("/");
    if absolute { format!("/{joined}") } else { joined }
}

/// Directory part of a normalized path (`""` for top-level units).
pub fn parent(path: &str) -> &str {
    path.rfind('/').map(|i| &path[..i]).unwrap_or("")
}

/// Join `relative` onto directory `dir` and normalize.
pub fn join(dir: &str, relative: &str) -> String {
    if relative.starts_with('/') || dir.is_empty() {
        normalize(relative)
    } else {
        normalize(&format!("{dir}/{relative}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn saved_units_overlay_and_removal_sticks() {
        let mut vfs = VirtualFs::in_memory();
        vfs.save("./a/../ok.mo", "1");
        assert_eq!(vfs.read("ok.mo").as_deref(), Ok("1"));
        vfs.remove("ok.mo");
        let err = vfs.read("ok.mo").unwrap_err();
        assert_eq!(err.to_string(), "ok.mo: No such file or directory");
    }

    #[test]
    fn join_resolves_relative_imports() {
        assert_eq!(join("", "lib.mo"), "lib.mo");
        assert_eq!(join("src/app", "../lib/util.mo"), "src/lib/util.mo");
        assert_eq!(parent("src/app/main.mo"), "src/app");
        assert_eq!(normalize("../x.mo"), "../x.mo");
    }
}
