//! Command-line argument parsing.
//!
//! Usage:
//!   pdscript [-f[<file>]] [-c<chunk>] [-qd] [<script>...]

use std::path::{Path, PathBuf};

use crate::config::BridgeConfig;

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// Which config file to use.
    pub config: ConfigFile,
    /// Lua chunk to run after the scripts are loaded (`-c<chunk>`).
    pub command: Option<String>,
    /// Suppress the startup banner (`-q`).
    pub quiet: bool,
    /// Debug logging (`-d`).
    pub debug: bool,
    /// Scripts to load at startup, in order.
    pub scripts: Vec<PathBuf>,
}

/// How to choose the config file.
#[derive(Debug, Default)]
pub enum ConfigFile {
    /// Search the standard locations (default).
    #[default]
    Search,
    /// `-f` with no file argument: use built-in defaults.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or(&[]))
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        // `--` ends flag processing.
        if arg == "--" {
            args.scripts.extend(argv[i + 1..].iter().map(PathBuf::from));
            break;
        }

        if !arg.starts_with('-') || arg == "-" {
            args.scripts.push(PathBuf::from(arg));
            i += 1;
            continue;
        }

        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'd' => args.debug = true,
                'q' => args.quiet = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else if i + 1 < argv.len() && !argv[i + 1].starts_with('-') {
                        i += 1;
                        args.config = ConfigFile::Explicit(PathBuf::from(&argv[i]));
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -c<chunk>
                'c' => {
                    let chunk = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-c requires a Lua chunk argument".to_owned());
                    };
                    args.command = Some(chunk);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    Ok(args)
}

// ── Config helpers ────────────────────────────────────────────────────────────

/// Search for the user config file.
///
/// Order: `$PDSCRIPTRC`, the platform config dir (`pdscriptrc`),
/// `~/.pdscriptrc`, `./.pdscriptrc`.  Returns the first path that exists.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::var("PDSCRIPTRC") {
        candidates.push(PathBuf::from(p));
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "pdscript") {
        candidates.push(dirs.config_dir().join("pdscriptrc"));
    }
    if let Some(base) = directories::BaseDirs::new() {
        candidates.push(base.home_dir().join(".pdscriptrc"));
    }
    candidates.push(PathBuf::from("./.pdscriptrc"));
    candidates.into_iter().find(|p| p.exists())
}

/// Resolve `choice` to a config.  Problems are returned as warning strings;
/// a missing or unreadable file falls back to the defaults.
pub fn load_config(choice: &ConfigFile) -> (BridgeConfig, Vec<String>) {
    let path = match choice {
        ConfigFile::Skip => return (BridgeConfig::default(), Vec::new()),
        ConfigFile::Explicit(p) => Some(p.clone()),
        ConfigFile::Search => find_user_config(),
    };
    let Some(path) = path else { return (BridgeConfig::default(), Vec::new()) };
    load_config_file(&path)
}

fn load_config_file(path: &Path) -> (BridgeConfig, Vec<String>) {
    match BridgeConfig::load_file(path) {
        Ok((cfg, errs)) => {
            let warnings = errs
                .iter()
                .map(|e| format!("{}: {e}", path.display()))
                .collect();
            (cfg, warnings)
        }
        Err(e) => (BridgeConfig::default(), vec![format!("{}: {e}", path.display())]),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
