//! Configuration validation with unknown field detection.

use serde_json::Value;
use std::collections::HashSet;

use super::ContextSettings;

/// Known top-level config field names.
const KNOWN_TOP_LEVEL: &[&str] = &["context", "logging"];

/// Known fields for each section.
const KNOWN_CONTEXT: &[&str] = &[
    "max_context_tokens",
    "enforce_max_turns",
    "truncate_turns",
    "compression_threshold",
    "llm_compress_instruction",
    "llm_compress_keep_recent",
    "llm_compress_timeout_secs",
];

const KNOWN_LOGGING: &[&str] = &["level", "format", "file"];

/// A validation diagnostic.
#[derive(Debug)]
pub struct Diagnostic {
    pub level: DiagnosticLevel,
    pub path: String,
    pub message: String,
}

#[derive(Debug, PartialEq)]
pub enum DiagnosticLevel {
    Ok,
    Warn,
    Error,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, path: &str, message: impl Into<String>) -> Self {
        Self {
            level,
            path: path.to_string(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let prefix = match self.level {
            DiagnosticLevel::Ok => "[OK]",
            DiagnosticLevel::Warn => "[WARN]",
            DiagnosticLevel::Error => "[ERROR]",
        };
        if self.path.is_empty() {
            write!(f, "{} {}", prefix, self.message)
        } else {
            write!(f, "{} {}: {}", prefix, self.path, self.message)
        }
    }
}

/// Simple Levenshtein distance for "did you mean?" suggestions.
pub fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut matrix = vec![vec![0usize; b.len() + 1]; a.len() + 1];

    for (i, row) in matrix.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, val) in matrix[0].iter_mut().enumerate() {
        *val = j;
    }

    for (i, ca) in a.iter().enumerate() {
        for (j, cb) in b.iter().enumerate() {
            let cost = if ca == cb { 0 } else { 1 };
            matrix[i + 1][j + 1] = std::cmp::min(
                std::cmp::min(matrix[i][j + 1] + 1, matrix[i + 1][j] + 1),
                matrix[i][j] + cost,
            );
        }
    }
    matrix[a.len()][b.len()]
}

/// Suggest the closest known field name (if distance <= 3).
pub fn suggest_field(unknown: &str, known: &[&str]) -> Option<String> {
    known
        .iter()
        .map(|k| (k, levenshtein(unknown, k)))
        .filter(|(_, d)| *d <= 3)
        .min_by_key(|(_, d)| *d)
        .map(|(k, _)| format!("did you mean '{}'?", k))
}

/// Report keys of `obj` missing from `known`. Returns true if any were found.
fn check_unknown_keys(
    obj: &serde_json::Map<String, Value>,
    known: &[&str],
    prefix: &str,
    diagnostics: &mut Vec<Diagnostic>,
) -> bool {
    let known_set: HashSet<&str> = known.iter().copied().collect();
    let mut has_unknown = false;
    for key in obj.keys() {
        if known_set.contains(key.as_str()) {
            continue;
        }
        has_unknown = true;
        let msg = match suggest_field(key, known) {
            Some(suggestion) => format!("Unknown field '{}', {}", key, suggestion),
            None => format!("Unknown field '{}'", key),
        };
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };
        diagnostics.push(Diagnostic::new(DiagnosticLevel::Error, &path, msg));
    }
    has_unknown
}

/// Validate a raw JSON config value against known field names.
pub fn validate_config(raw: &Value) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    let obj = match raw.as_object() {
        Some(o) => o,
        None => {
            diagnostics.push(Diagnostic::new(
                DiagnosticLevel::Error,
                "",
                "Config must be a JSON object",
            ));
            return diagnostics;
        }
    };

    diagnostics.push(Diagnostic::new(DiagnosticLevel::Ok, "", "Valid JSON"));

    let mut has_unknown = check_unknown_keys(obj, KNOWN_TOP_LEVEL, "", &mut diagnostics);
    if let Some(context) = obj.get("context").and_then(|v| v.as_object()) {
        has_unknown |= check_unknown_keys(context, KNOWN_CONTEXT, "context", &mut diagnostics);
    }
    if let Some(logging) = obj.get("logging").and_then(|v| v.as_object()) {
        has_unknown |= check_unknown_keys(logging, KNOWN_LOGGING, "logging", &mut diagnostics);
    }

    if !has_unknown {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Ok,
            "",
            "All fields recognized",
        ));
    }

    diagnostics
}

/// Check the semantic ranges of context settings.
pub fn validate_context_settings(settings: &ContextSettings) -> Vec<Diagnostic> {
    let mut diagnostics = Vec::new();

    if settings.enforce_max_turns < -1 {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "context.enforce_max_turns",
            format!(
                "must be -1 (disabled) or >= 0, got {}",
                settings.enforce_max_turns
            ),
        ));
    }

    if settings.truncate_turns < 1 {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "context.truncate_turns",
            format!("must be >= 1, got {}", settings.truncate_turns),
        ));
    }

    let threshold = settings.compression_threshold;
    if !(threshold > 0.0 && threshold <= 1.0) {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Error,
            "context.compression_threshold",
            format!("must be in (0, 1], got {}", threshold),
        ));
    }

    let keep_recent = settings.llm_compress_keep_recent;
    if keep_recent > 0 && keep_recent < 2 {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Warn,
            "context.llm_compress_keep_recent",
            "less than one full turn is kept verbatim after summarization",
        ));
    }

    if diagnostics.is_empty() {
        diagnostics.push(Diagnostic::new(
            DiagnosticLevel::Ok,
            "context",
            "Context settings valid",
        ));
    }
    diagnostics
}
