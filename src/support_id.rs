//! Support ID decoding for gateway error messages.
//!
//! Some failures carry a diagnostic id in `description2`, percent-encoded and
//! wrapped as `[... Support ID: <id>]`. Decoding it makes the message readable
//! when quoted to support.

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

const SUPPORT_ID_PATTERN: &str = r"Support ID: (.*)\]";

fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(SUPPORT_ID_PATTERN).expect("support id pattern is a valid regex"))
}

/// Percent-decodes the support id inside every error of an `errormessage` block.
///
/// `error` may hold a single error object or a sequence of them; the result
/// keeps whichever shape came in. Errors without a support id, and blocks
/// without errors, are returned unchanged.
///
/// ```
/// use intacct_link::support_id::decode_support_id;
/// use serde_json::json;
///
/// let block = json!({"error": {
///     "errorno": "XL03000006",
///     "description2": "Invalid request [Support ID: Foo%20Bar]"
/// }});
///
/// let decoded = decode_support_id(block);
/// assert_eq!(decoded["error"]["description2"], "Invalid request [Support ID: Foo Bar]");
/// ```
pub fn decode_support_id(mut errors: Value) -> Value {
    match errors.get_mut("error") {
        Some(Value::Array(items)) => items.iter_mut().for_each(patch_error),
        Some(error) if error.is_object() => patch_error(error),
        _ => {}
    }
    errors
}

fn patch_error(error: &mut Value) {
    if let Some(Value::String(description)) = error.get_mut("description2") {
        if let Some(decoded) = decode_message(description) {
            *description = decoded;
        }
    }
}

/// Decodes the support id inside a single message.
///
/// Returns `None` when the message has no support id or the id is not valid
/// percent-encoded UTF-8.
pub fn decode_message(message: &str) -> Option<String> {
    let captures = pattern().captures(message)?;
    let encoded = captures.get(1)?;
    if encoded.as_str().is_empty() {
        return None;
    }
    let decoded = urlencoding::decode(encoded.as_str()).ok()?;

    let mut out = String::with_capacity(message.len());
    out.push_str(&message[..encoded.start()]);
    out.push_str(&decoded);
    out.push_str(&message[encoded.end()..]);
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_pattern_compiles() {
        assert!(Regex::new(SUPPORT_ID_PATTERN).is_ok());
        assert!(pattern().is_match("x [Support ID: abc]"));
    }

    #[test]
    fn test_decodes_every_error_in_a_sequence() {
        let block = json!({"error": [
            {"description2": "First [Support ID: a%2Fb%40c]"},
            {"description": "no description2"},
            {"description2": "Second [Support ID: x%7Ey]"}
        ]});

        let decoded = decode_support_id(block);

        assert_eq!(decoded["error"][0]["description2"], "First [Support ID: a/b@c]");
        assert_eq!(decoded["error"][1], json!({"description": "no description2"}));
        assert_eq!(decoded["error"][2]["description2"], "Second [Support ID: x~y]");
    }

    #[test]
    fn test_leaves_unmatched_messages_alone() {
        let block = json!({"error": {"description2": "Plain failure, 50%20 off"}});
        assert_eq!(decode_support_id(block.clone()), block);

        assert_eq!(decode_support_id(Value::Null), Value::Null);
        assert_eq!(decode_message("Support ID: ]"), None);
        assert_eq!(decode_message("Support ID: %FF]"), None);
    }

    #[test]
    fn test_splices_in_place() {
        assert_eq!(
            decode_message("Oops [Support ID: Foo%20Bar] please retry").as_deref(),
            Some("Oops [Support ID: Foo Bar] please retry")
        );
    }
}
