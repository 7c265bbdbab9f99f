use serde_json::Value;
use std::borrow::Cow;

const BODY_SNIPPET_MAX_CHARS: usize = 500;
const BEARER_PREFIX: &str = "bearer ";

pub fn mask_token(token: &str) -> String {
    let token = token.trim();
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        return "***".to_string();
    }
    format!("{visible}***")
}

fn is_sensitive_key(key: &str) -> bool {
    let key = key.trim().to_ascii_lowercase();
    key == "access"
        || key == "refresh"
        || key.contains("token")
        || key.contains("password")
        || key == "authorization"
}

fn redact_json_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map.iter_mut() {
                if is_sensitive_key(key) {
                    if let Some(raw) = nested.as_str() {
                        *nested = Value::String(mask_token(raw));
                        continue;
                    }
                }
                redact_json_fields(nested);
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_json_fields),
        Value::String(text) => {
            let redacted = redact_bearer(text).into_owned();
            *text = redacted;
        }
        _ => {}
    }
}

fn find_ascii_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    let hay = haystack.as_bytes();
    let nee = needle.as_bytes();
    if nee.len() > hay.len() {
        return None;
    }
    (0..=hay.len() - nee.len()).find(|&i| hay[i..i + nee.len()].eq_ignore_ascii_case(nee))
}

/// Replaces every `Bearer <token>` credential with `Bearer REDACTED`.
pub fn redact_bearer(input: &str) -> Cow<'_, str> {
    if find_ascii_case_insensitive(input, BEARER_PREFIX).is_none() {
        return Cow::Borrowed(input);
    }

    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(idx) = find_ascii_case_insensitive(rest, BEARER_PREFIX) {
        let end = idx + BEARER_PREFIX.len();
        out.push_str(&rest[..end]);
        rest = &rest[end..];

        let consumed: usize = rest
            .chars()
            .take_while(|ch| ch.is_ascii_alphanumeric() || matches!(ch, '-' | '_' | '.' | '~' | '+' | '/' | '='))
            .map(char::len_utf8)
            .sum();
        out.push_str("REDACTED");
        rest = &rest[consumed..];
    }
    out.push_str(rest);
    Cow::Owned(out)
}

/// Masks JSON token and password fields and bearer credentials, keeping the
/// rest of the body intact.
pub fn redact_body(body: &str) -> String {
    let trimmed = body.trim();
    if let Ok(mut value) = serde_json::from_str::<Value>(trimmed) {
        redact_json_fields(&mut value);
        if let Ok(encoded) = serde_json::to_string(&value) {
            return encoded;
        }
    }
    redact_bearer(trimmed).into_owned()
}

/// Log-safe excerpt of a response body: redacted, then bounded in length.
pub fn sanitize_body(body: &str) -> String {
    redact_body(body).chars().take(BODY_SNIPPET_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mask_token_keeps_only_a_short_prefix() {
        assert_eq!(mask_token("eyJhbGciOiJIUzI1NiJ9.payload"), "eyJh***");
        assert_eq!(mask_token("short"), "***");
    }

    #[test]
    fn redact_bearer_replaces_credentials() {
        let input = "Authorization: Bearer abc.def-ghi\nOther: ok";
        let out = redact_bearer(input);
        assert_eq!(out, "Authorization: Bearer REDACTED\nOther: ok");
    }

    #[test]
    fn redact_bearer_borrows_when_nothing_to_do() {
        assert!(matches!(redact_bearer("plain text"), Cow::Borrowed(_)));
    }

    #[test]
    fn sanitize_body_masks_token_fields() {
        let body = r#"{"access":"eyJaccess-token-value","refresh":"eyJrefresh-token-value","detail":"ok","nested":{"password":"hunter2hunter2"}}"#;
        let out = sanitize_body(body);
        assert!(!out.contains("eyJaccess-token-value"));
        assert!(!out.contains("eyJrefresh-token-value"));
        assert!(!out.contains("hunter2hunter2"));
        assert!(out.contains("\"detail\":\"ok\""));
    }

    #[test]
    fn redact_body_keeps_long_bodies_whole() {
        let detail = "y".repeat(800);
        let body = format!(r#"{{"detail":"{detail}","password":"hunter2hunter2"}}"#);
        let out = redact_body(&body);
        assert!(out.contains(&detail));
        assert!(!out.contains("hunter2hunter2"));
        assert_eq!(redact_body("Bearer abc.def"), "Bearer REDACTED");
    }

    #[test]
    fn sanitize_body_bounds_length() {
        let body = "x".repeat(2_000);
        assert_eq!(sanitize_body(&body).chars().count(), 500);
    }
}
