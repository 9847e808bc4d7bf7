//! Credential scrubbing for log output.

use serde_json::{Map, Value};

/// Replacement for every scrubbed value.
pub const MASK: &str = "***";

/// Returns a copy of `envelope` that is safe to log.
///
/// Under every root (`request` or `response`), each entry of the `control`
/// block and of `operation.authentication` is replaced with [`MASK`]. The
/// input is left untouched, so the transmitted envelope never sees the mask.
///
/// ```
/// use intacct_link::redact::{redact, MASK};
/// use serde_json::json;
///
/// let envelope = json!({"request": {
///     "control": {"senderid": "acme", "password": "hunter2"},
///     "operation": {"authentication": {"sessionid": "abc"}, "content": {}}
/// }});
///
/// let safe = redact(&envelope);
/// assert_eq!(safe["request"]["control"]["password"], MASK);
/// assert_eq!(safe["request"]["operation"]["authentication"]["sessionid"], MASK);
/// assert_eq!(envelope["request"]["control"]["password"], "hunter2");
/// ```
pub fn redact(envelope: &Value) -> Value {
    let mut copy = envelope.clone();
    if let Value::Object(roots) = &mut copy {
        for body in roots.values_mut() {
            if let Some(control) = body.get_mut("control").and_then(Value::as_object_mut) {
                mask_all(control);
            }
            if let Some(auth) = body
                .pointer_mut("/operation/authentication")
                .and_then(Value::as_object_mut)
            {
                mask_all(auth);
            }
        }
    }
    copy
}

fn mask_all(section: &mut Map<String, Value>) {
    for value in section.values_mut() {
        *value = Value::String(MASK.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_masks_login_block_wholesale() {
        let envelope = json!({"request": {
            "control": {"senderid": "acme", "password": "s3cret", "uniqueid": false},
            "operation": {
                "authentication": {"login": {"userid": "u", "password": "p"}},
                "content": {"function": {"@controlid": "x", "getAPISession": null}}
            }
        }});

        let safe = redact(&envelope);

        assert_eq!(
            safe["request"]["control"],
            json!({"senderid": MASK, "password": MASK, "uniqueid": MASK})
        );
        assert_eq!(safe["request"]["operation"]["authentication"], json!({"login": MASK}));
        assert_eq!(
            safe["request"]["operation"]["content"],
            envelope["request"]["operation"]["content"]
        );
    }

    #[test]
    fn test_response_root_and_missing_sections() {
        let response = json!({"response": {
            "control": {"status": "success"},
            "operation": {"result": {"status": "success"}}
        }});
        let safe = redact(&response);
        assert_eq!(safe["response"]["control"]["status"], MASK);
        assert_eq!(safe["response"]["operation"], response["response"]["operation"]);

        assert_eq!(redact(&json!("plain")), json!("plain"));
    }
}
