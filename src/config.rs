//! Session configuration.
//!
//! [`Flags`] carries everything that changes how units are checked: per-code warning levels, `-Werror`, the blob
//! import toggle and registered packages. Flags are set programmatically or from `moc`-style argument lists via
//! [`Flags::apply_extra_flags`].
//!
//! ## Notes
//! - `apply_extra_flags` is all-or-nothing: on error, the flags are left exactly as they were.
//! - [`Flags::fingerprint`] covers every setting that can change checking output, so the scope cache never reuses a
//!   result computed under different flags.
//!
//! ## Examples
//! ```rust
//! use motoko::config::{ConfigError, Flags, Level};
//!
//! let mut flags = Flags::default();
//! flags.apply_extra_flags(&["-W=M0223".to_string()]).unwrap();
//! assert_eq!(flags.level_for("M0223"), Level::Warn);
//!
//! let err = flags.apply_extra_flags(&["-W=MMM".to_string()]).unwrap_err();
//! assert_eq!(err, ConfigError::InvalidWarningCode("MMM".to_string()));
//! ```

use std::collections::BTreeMap;

pub use motoko_core::lang::codes::DefaultLevel as Level;
use motoko_core::lang::codes;

/// A configuration fault, reported synchronously when flags are set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("moc: unknown option '{0}'")]
    UnknownOption(String),
    #[error("moc: invalid warning code: {0}")]
    InvalidWarningCode(String),
    #[error("moc: option '{0}' needs an argument")]
    MissingArgument(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flags {
    /// Per-code overrides of the registry's default warning level.
    pub warning_levels: BTreeMap<&'static str, Level>,
    /// Promote every enabled warning to an error.
    pub werror: bool,
    /// Drop warnings from results entirely.
    pub hide_warnings: bool,
    /// Accept `blob:` imports as `Blob`-typed placeholders.
    pub blob_import_placeholders: bool,
    /// `mo:<name>` package roots.
    pub packages: BTreeMap<String, String>,
}

impl Flags {
    /// Effective level of diagnostic `code` under these flags.
    pub fn level_for(&self, code: &str) -> Level {
        let Some(info) = codes::info_for(code) else {
            return Level::Error;
        };
        if info.kind == codes::CodeKind::Error {
            return Level::Error;
        }
        let level = self.warning_levels.get(info.code).copied().unwrap_or(info.default_level);
        match level {
            Level::Warn if self.werror => Level::Error,
            other => other,
        }
    }

    /// Apply `moc`-style flags. Either every flag applies or none does.
    ///
    /// ## Accepted forms
    /// - `-W=<codes>`, `-E=<codes>`, `-A=<codes>` (comma separated), or the same with the codes as the next argument
    /// - `-Werror`, `--hide-warnings`, `--blob-import-placeholders`
    /// - `--package <name> <dir>`
    #[tracing::instrument(skip_all, fields(count = args.len()))]
    pub fn apply_extra_flags(&mut self, args: &[String]) -> Result<(), ConfigError> {
        let mut next = self.clone();
        let mut iter = args.iter();
        while let Some(arg) = iter.next() {
            match arg.as_str() {
                "-Werror" => next.werror = true,
                "--hide-warnings" => next.hide_warnings = true,
                "--blob-import-placeholders" => next.blob_import_placeholders = true,
                "--package" => {
                    let name = iter.next().ok_or_else(|| ConfigError::MissingArgument(arg.clone()))?;
                    let dir = iter.next().ok_or_else(|| ConfigError::MissingArgument(arg.clone()))?;
                    next.packages.insert(name.clone(), dir.clone());
                }
                flag @ ("-W" | "-E" | "-A") => {
                    let list = iter.next().ok_or_else(|| ConfigError::MissingArgument(arg.clone()))?;
                    next.set_levels(level_of_flag(flag), list)?;
                }
                other => match other.split_once('=') {
                    Some((flag @ ("-W" | "-E" | "-A"), list)) => next.set_levels(level_of_flag(flag), list)?,
                    _ => return Err(ConfigError::UnknownOption(other.to_string())),
                },
            }
        }
        *self = next;
        Ok(())
    }

    fn set_levels(&mut self, level: Level, list: &str) -> Result<(), ConfigError> {
        for code in list.split(',').map(str::trim).filter(|c| !c.is_empty()) {
            let info = codes::info_for(code)
                .filter(|info| info.kind == codes::CodeKind::Warning)
                .ok_or_else(|| ConfigError::InvalidWarningCode(code.to_string()))?;
            self.warning_levels.insert(info.code, level);
        }
        Ok(())
    }

    /// Stable text covering every setting that influences checking.
    pub fn fingerprint(&self) -> String {
        let levels: Vec<String> = codes::warning_codes()
            .map(|info| format!("{}={:?}", info.code, self.level_for(info.code)))
            .collect();
        let packages: Vec<String> = self.packages.iter().map(|(name, dir)| format!("{name}:{dir}")).collect();
        format!(
            "levels[{}];hide={};blob={};pkgs[{}]",
            levels.join(","),
            self.hide_warnings,
            self.blob_import_placeholders,
            packages.join(",")
        )
    }
}

fn level_of_flag(flag: &str) -> Level {
    match flag {
        "-E" => Level::Error,
        "-A" => Level::Allow,
        _ => Level::Warn,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(args: &[&str]) -> Vec<String> {
        args.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_follow_code_registry() {
        let flags = Flags::default();
        assert_eq!(flags.level_for("M0194"), Level::Allow);
        assert_eq!(flags.level_for("M0223"), Level::Allow);
        assert_eq!(flags.level_for("M0155"), Level::Warn);
        assert_eq!(flags.level_for("M0057"), Level::Error);
    }

    #[test]
    fn levels_accept_lists_and_separate_arguments() {
        let mut flags = Flags::default();
        flags
            .apply_extra_flags(&strings(&["-W=M0194,M0223", "-E", "M0155"]))
            .unwrap();
        assert_eq!(flags.level_for("M0194"), Level::Warn);
        assert_eq!(flags.level_for("M0223"), Level::Warn);
        assert_eq!(flags.level_for("M0155"), Level::Error);
        flags.apply_extra_flags(&strings(&["-A=M0223", "-Werror"])).unwrap();
        assert_eq!(flags.level_for("M0223"), Level::Allow);
        assert_eq!(flags.level_for("M0194"), Level::Error);
    }

    #[test]
    fn failures_leave_flags_untouched() {
        let mut flags = Flags::default();
        let err = flags
            .apply_extra_flags(&strings(&["-W=M0223", "--invalid-flag"]))
            .unwrap_err();
        assert_eq!(err.to_string(), "moc: unknown option '--invalid-flag'");
        assert_eq!(flags, Flags::default());

        let err = flags.apply_extra_flags(&strings(&["-W=MMM"])).unwrap_err();
        assert_eq!(err.to_string(), "moc: invalid warning code: MMM");

        let err = flags.apply_extra_flags(&strings(&["-W=M0057"])).unwrap_err();
        assert_eq!(err, ConfigError::InvalidWarningCode("M0057".into()));
    }

    #[test]
    fn packages_and_toggles() {
        let mut flags = Flags::default();
        flags
            .apply_extra_flags(&strings(&["--package", "base", "vendor/base", "--blob-import-placeholders"]))
            .unwrap();
        assert_eq!(flags.packages.get("base").map(String::as_str), Some("vendor/base"));
        assert!(flags.blob_import_placeholders);
        assert_ne!(flags.fingerprint(), Flags::default().fingerprint());
        assert!(matches!(
            flags.apply_extra_flags(&strings(&["--package", "x"])),
            Err(ConfigError::MissingArgument(_))
        ));
    }
}
