//! `.pdscriptrc` configuration file parser.
//!
//! | Directive | Action |
//! |-----------|--------|
//! | `/set <name>=<value>` or `/set <name> <value>` | set a node option |
//! | `/path <dir>` | append a directory to the script search path |
//! | Lines starting with `;` | comment, ignored |
//! | Any other `/command` | silently skipped |
//!
//! Recognised `/set` options:
//!
//! | Name               | Default  | Meaning                               |
//! |--------------------|----------|---------------------------------------|
//! | `scratch_capacity` | 1024     | max atoms per `outlet(...)` list      |
//! | `output_capacity`  | 1024     | console line buffer size in bytes     |
//! | `outlet_name`      | `outlet` | Lua name of the emission callback     |
//! | `bang_name`        | `bang`   | Lua function run by a bare `bang`     |

use std::path::{Path, PathBuf};

use crate::collect::DEFAULT_SCRATCH_CAPACITY;
use crate::sink::DEFAULT_OUTPUT_CAPACITY;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Options for one [`crate::BridgeHandle`].
#[derive(Debug, Clone, PartialEq)]
pub struct BridgeConfig {
    pub scratch_capacity: usize,
    pub output_capacity: usize,
    pub outlet_name: String,
    pub bang_name: String,
    /// Directories searched, in order, for relative `load` paths.
    pub search_path: Vec<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            scratch_capacity: DEFAULT_SCRATCH_CAPACITY,
            output_capacity: DEFAULT_OUTPUT_CAPACITY,
            outlet_name: "outlet".to_owned(),
            bang_name: "bang".to_owned(),
            search_path: Vec::new(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Unknown directives are silently skipped.  Returns the config and a
    /// list of any errors on recognised lines; a bad line leaves the
    /// corresponding option at its previous value.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = BridgeConfig::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some(rest) = line.strip_prefix('/') else { continue };

            let (cmd, args_str) = rest
                .split_once(|c: char| c.is_ascii_whitespace())
                .unwrap_or((rest, ""));
            let tokens = split_args(args_str.trim());

            let result = match cmd {
                "set" => parse_set(&tokens, &mut config),
                "path" => parse_path(&tokens, &mut config),
                _ => Ok(()),
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    ///
    /// Relative `/path` entries are taken relative to the file's directory.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        let (mut config, errors) = Self::load_str(&s);
        if let Some(base) = path.parent() {
            for dir in &mut config.search_path {
                if dir.is_relative() {
                    *dir = base.join(&*dir);
                }
            }
        }
        Ok((config, errors))
    }

    /// Resolve a script path against the search path.
    ///
    /// Absolute paths and paths that exist relative to the working directory
    /// are returned unchanged; otherwise the first search directory holding
    /// the file wins.  If nothing matches, `path` is returned as given and
    /// the loader reports the failure.
    pub fn resolve_script(&self, path: &Path) -> PathBuf {
        if path.is_absolute() || path.exists() {
            return path.to_path_buf();
        }
        self.search_path
            .iter()
            .map(|dir| dir.join(path))
            .find(|p| p.exists())
            .unwrap_or_else(|| path.to_path_buf())
    }
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── /set ──────────────────────────────────────────────────────────────────────

/// Parse `/set <name>=<value>` or `/set <name> <value>`.
fn parse_set(tokens: &[String], config: &mut BridgeConfig) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("/set: requires an argument".into());
    }

    let (name, value) = if let Some((name, value)) = tokens[0].split_once('=') {
        (name.to_owned(), value.to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("/set: missing value for '{}'", tokens[0]));
    };

    match name.as_str() {
        "scratch_capacity" => config.scratch_capacity = parse_capacity(&name, &value)?,
        "output_capacity" => config.output_capacity = parse_capacity(&name, &value)?,
        "outlet_name" => config.outlet_name = parse_lua_name(&name, value)?,
        "bang_name" => config.bang_name = parse_lua_name(&name, value)?,
        "" => return Err("/set: variable name cannot be empty".into()),
        _ => return Err(format!("/set: unknown option '{name}'")),
    }
    Ok(())
}

fn parse_capacity(name: &str, value: &str) -> Result<usize, String> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("/set: {name} must be a positive integer, got '{value}'")),
    }
}

fn parse_lua_name(name: &str, value: String) -> Result<String, String> {
    let valid = value.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
        && value.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(value)
    } else {
        Err(format!("/set: {name} must be a Lua identifier, got '{value}'"))
    }
}

// ── /path ─────────────────────────────────────────────────────────────────────

fn parse_path(tokens: &[String], config: &mut BridgeConfig) -> Result<(), String> {
    match tokens {
        [dir] => {
            config.search_path.push(expand_home(dir));
            Ok(())
        }
        [] => Err("/path: requires a directory".into()),
        _ => Err(format!("/path: expected one directory, got {}", tokens.len())),
    }
}

/// Expand a leading `~/` to the user's home directory.
fn expand_home(dir: &str) -> PathBuf {
    if let Some(rest) = dir.strip_prefix("~/") {
        if let Some(base) = directories::BaseDirs::new() {
            return base.home_dir().join(rest);
        }
    }
    PathBuf::from(dir)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    // -- split_args -----------------------------------------------------------

    #[test]
    fn split_simple() {
        assert_eq!(split_args("foo bar baz"), ["foo", "bar", "baz"]);
    }

    #[test]
    fn split_quoted_spaces() {
        assert_eq!(split_args(r#""My Scripts" lib"#), ["My Scripts", "lib"]);
    }

    #[test]
    fn split_escaped_quote_inside_quotes() {
        assert_eq!(split_args(r#""say \"hi\"""#), [r#"say "hi""#]);
    }

    // -- /set -----------------------------------------------------------------

    #[test]
    fn defaults() {
        let (cfg, errs) = BridgeConfig::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg, BridgeConfig::default());
        assert_eq!(cfg.scratch_capacity, 1024);
        assert_eq!(cfg.outlet_name, "outlet");
    }

    #[test]
    fn set_equals_syntax() {
        let (cfg, errs) = BridgeConfig::load_str("/set scratch_capacity=16");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.scratch_capacity, 16);
    }

    #[test]
    fn set_space_syntax() {
        let (cfg, errs) = BridgeConfig::load_str("/set outlet_name emit");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.outlet_name, "emit");
    }

    #[test]
    fn zero_capacity_is_error() {
        let (cfg, errs) = BridgeConfig::load_str("/set output_capacity=0");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 1);
        assert_eq!(cfg.output_capacity, DEFAULT_OUTPUT_CAPACITY);
    }

    #[test]
    fn bad_lua_name_is_error() {
        let (cfg, errs) = BridgeConfig::load_str("/set bang_name=9lives");
        assert_eq!(errs.len(), 1);
        assert_eq!(cfg.bang_name, "bang");
    }

    #[test]
    fn unknown_option_is_error() {
        let (_, errs) = BridgeConfig::load_str("\n/set colour=blue");
        assert_eq!(errs.len(), 1);
        assert_eq!(errs[0].line, 2);
        assert!(errs[0].to_string().contains("colour"));
    }

    // -- /path ----------------------------------------------------------------

    #[test]
    fn path_entries_accumulate() {
        let (cfg, errs) = BridgeConfig::load_str("/path /opt/lua\n/path \"my scripts\"");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.search_path, [PathBuf::from("/opt/lua"), PathBuf::from("my scripts")]);
    }

    #[test]
    fn path_without_dir_is_error() {
        let (_, errs) = BridgeConfig::load_str("/path");
        assert_eq!(errs.len(), 1);
    }

    #[test]
    fn load_file_anchors_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let rc = dir.path().join(".pdscriptrc");
        std::fs::write(&rc, "/path scripts\n/path /abs\n").unwrap();
        let (cfg, errs) = BridgeConfig::load_file(&rc).unwrap();
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.search_path, [dir.path().join("scripts"), PathBuf::from("/abs")]);
    }

    #[test]
    fn resolve_script_uses_search_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("synth.lua"), "x = 1").unwrap();
        let mut cfg = BridgeConfig::new();
        cfg.search_path.push(PathBuf::from("/definitely/not/here"));
        cfg.search_path.push(dir.path().to_path_buf());
        assert_eq!(cfg.resolve_script(Path::new("synth.lua")), dir.path().join("synth.lua"));
        assert_eq!(cfg.resolve_script(Path::new("missing.lua")), PathBuf::from("missing.lua"));
    }

    // -- Comments & skipping --------------------------------------------------

    #[test]
    fn comments_blank_lines_and_unknown_commands() {
        let src = "\
;; node options\n\
\n\
/set scratch_capacity=64\n\
/def something else\n\
; /set bang_name=ignored\n\
/set bang_name=tick\n\
";
        let (cfg, errs) = BridgeConfig::load_str(src);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.scratch_capacity, 64);
        assert_eq!(cfg.bang_name, "tick");
    }
}
