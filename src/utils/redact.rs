use crate::utils::text::truncate_utf8_prefix;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::collections::BTreeMap;

const DEFAULT_REDACTION: &str = "[REDACTED]";
const INLINE_REDACTION: &str = "***REDACTED***";

const SENSITIVE_HEADER_KEYS: &[&str] = &[
    "authorization",
    "proxy-authorization",
    "cookie",
    "set-cookie",
    "x-api-key",
    "x-auth-token",
    "x-access-token",
];

static INLINE_REDACTION_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (
            Regex::new(r"\b(Bearer|Basic)\s+([A-Za-z0-9._~+/=-]{6,})").expect("inline redaction regex"),
            "$1 ***REDACTED***",
        ),
        (
            Regex::new(r"(https?://)[^/\s:@]+:[^/\s@]+@").expect("inline redaction regex"),
            "${1}***REDACTED***@",
        ),
        (
            Regex::new(r#"\b(password|token|api[_-]?key|secret)\b\s*([:=])\s*([^\s"'`&]+)"#)
                .expect("inline redaction regex"),
            "$1$2***REDACTED***",
        ),
    ]
});

pub fn is_sensitive_header(name: &str, extra_names: &[String]) -> bool {
    let normalized = name.trim().to_lowercase();
    SENSITIVE_HEADER_KEYS.contains(&normalized.as_str())
        || extra_names
            .iter()
            .any(|extra| extra.trim().eq_ignore_ascii_case(&normalized))
}

/// Masks well-known credential shapes plus any literal secret in `extra_secrets`,
/// then caps the result at `max_bytes`.
pub fn redact_text(value: &str, max_bytes: usize, extra_secrets: &[String]) -> String {
    let mut out = value.to_string();
    for (re, replacement) in INLINE_REDACTION_PATTERNS.iter() {
        if re.is_match(&out) {
            out = re.replace_all(&out, *replacement).into_owned();
        }
    }
    for secret in extra_secrets {
        let needle = secret.trim();
        if needle.len() < 4 {
            continue;
        }
        out = out.replace(needle, INLINE_REDACTION);
    }
    if out.len() > max_bytes {
        return format!("{}...", truncate_utf8_prefix(&out, max_bytes));
    }
    out
}

/// Renders headers for logs with credential-bearing entries masked.
pub fn redact_headers(headers: &BTreeMap<String, String>, extra_names: &[String]) -> Value {
    let mut out = serde_json::Map::new();
    for (name, value) in headers {
        let rendered = if is_sensitive_header(name, extra_names) {
            DEFAULT_REDACTION.to_string()
        } else {
            value.clone()
        };
        out.insert(name.clone(), Value::String(rendered));
    }
    Value::Object(out)
}
