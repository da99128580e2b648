//! Free-form argument handling: metacharacter stripping, tokenizing and the
//! flag-precedence guard for user supplied engine arguments.

use crate::error::ScanError;
use std::collections::HashSet;

/// Characters removed from free-form input before tokenizing.
pub const SHELL_METACHARS: [char; 5] = [';', '&', '|', '`', '$'];

/// Engine flags that only the service may set, whatever the profile: scan
/// inputs, every flag that writes or loads files, code execution and updates.
const SERVICE_OWNED_FLAGS: &[&str] = &[
    "target",
    "list",
    "json-export",
    "jsonl-export",
    "output",
    "markdown-export",
    "sarif-export",
    "error-log",
    "trace-log",
    "store-resp",
    "store-resp-dir",
    "config",
    "report-config",
    "secret-file",
    "workflows",
    "resume",
    "project",
    "project-path",
    "code",
    "update",
    "update-templates",
    "update-template-dir",
];

/// Short and long spellings the engine accepts for the same flag.
const FLAG_ALIASES: &[(&str, &str)] = &[
    ("u", "target"),
    ("l", "list"),
    ("t", "templates"),
    ("s", "severity"),
    ("rl", "rate-limit"),
    ("je", "json-export"),
    ("jle", "jsonl-export"),
    ("o", "output"),
    ("me", "markdown-export"),
    ("se", "sarif-export"),
    ("elog", "error-log"),
    ("tlog", "trace-log"),
    ("sresp", "store-resp"),
    ("srd", "store-resp-dir"),
    ("rc", "report-config"),
    ("sf", "secret-file"),
    ("w", "workflows"),
    ("up", "update"),
    ("ut", "update-templates"),
    ("ud", "update-template-dir"),
];

pub fn strip_metachars(input: &str) -> String {
    input.chars().filter(|c| !SHELL_METACHARS.contains(c)).collect()
}

/// Strip metacharacters and split on whitespace. Absent or blank input gives no tokens.
pub fn tokenize(input: Option<&str>) -> Vec<String> {
    match input {
        Some(raw) => strip_metachars(raw)
            .split_whitespace()
            .map(str::to_string)
            .collect(),
        None => Vec::new(),
    }
}

/// Canonical engine flag name for a token, or `None` when the token is a value.
///
/// `-s`, `--severity` and `-severity=low` all resolve to `severity`.
pub fn flag_name(token: &str) -> Option<&str> {
    let stripped = token.trim_start_matches('-');
    if stripped.len() == token.len() {
        return None;
    }
    let name = stripped.split('=').next().unwrap_or_default();
    if !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    let canonical = FLAG_ALIASES
        .iter()
        .find(|(alias, _)| *alias == name)
        .map(|(_, full)| *full)
        .unwrap_or(name);
    Some(canonical)
}

/// Reject extra tokens that would override a flag the service or the profile
/// already placed in `built`.
pub fn guard_extra_flags(extras: &[String], built: &[String]) -> Result<(), ScanError> {
    let controlled: HashSet<&str> = built.iter().filter_map(|arg| flag_name(arg)).collect();

    for token in extras {
        let Some(name) = flag_name(token) else {
            continue;
        };
        if SERVICE_OWNED_FLAGS.contains(&name) {
            return Err(ScanError::validation(format!(
                "argument {} is reserved and cannot be passed in args",
                token
            )));
        }
        if controlled.contains(name) {
            return Err(ScanError::validation(format!(
                "argument {} duplicates a flag already set for this scan",
                token
            )));
        }
    }
    Ok(())
}
