use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

const SENSITIVE_KEYS: &[&str] = &[
    "authorization",
    "offline_token",
    "refresh_token",
    "access_token",
    "id_token",
    "client_secret",
    "password",
    "x-ocm-offline-token",
];

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\beyJ[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\.[a-zA-Z0-9_-]{10,}\b")
                .expect("inline redaction regex"),
            INLINE_REDACTION,
        ),
        (
            Regex::new(r"\b(Bearer)\s+([A-Za-z0-9._~+/=-]{6,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(
                r#"\b(offline[_-]?token|refresh[_-]?token|access[_-]?token|id[_-]?token|client[_-]?secret)\b("?\s*[:=]\s*"?)([^\s"'&,}]+)"#,
            )
            .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_lowercase();
    if normalized.is_empty() {
        return false;
    }
    SENSITIVE_KEYS.contains(&normalized.as_str()) || normalized.ends_with("token")
}

fn truncate_string(value: &str, max_length: usize) -> String {
    if value.len() <= max_length {
        return value.to_string();
    }
    format!("{}...", truncate_utf8_prefix(value, max_length))
}

/// Masks bearer tokens, JWTs and `*_token=` pairs, then caps the length.
///
/// `extra_secrets` are literal values that must never survive, e.g. the
/// credential used for the current call. Values shorter than six bytes are
/// ignored to avoid shredding ordinary words.
pub fn redact_text(value: &str, max_string: usize, extra_secrets: Option<&[String]>) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).to_string();
        }
    }
    if let Some(values) = extra_secrets {
        for raw in values {
            let needle = raw.trim();
            if needle.len() < 6 {
                continue;
            }
            out = out.replace(needle, INLINE_REDACTION);
        }
    }
    truncate_string(&out, max_string)
}

pub fn redact_object(value: &Value, max_string: usize) -> Value {
    match value {
        Value::String(text) => Value::String(redact_text(text, max_string, None)),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|item| redact_object(item, max_string))
                .collect(),
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, entry) in map.iter() {
                if is_sensitive_key(key) {
                    out.insert(key.clone(), Value::String(DEFAULT_REDACTION.to_string()));
                } else {
                    out.insert(key.clone(), redact_object(entry, max_string));
                }
            }
            Value::Object(out)
        }
        _ => value.clone(),
    }
}
