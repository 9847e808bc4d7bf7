//! XML envelope codec.
//!
//! Envelopes travel as XML, but everything above the transport works with a
//! [`Value`] tree. The two are mapped onto each other with a few conventions:
//!
//! - an object key becomes a child element
//! - a key starting with `@` becomes an attribute of the enclosing element
//! - the `#text` key holds text content next to attributes or children
//! - an array becomes repeated sibling elements with the same name
//! - `null` becomes an empty element
//!
//! Decoding reverses this. Leaves always come back as strings (or `null` for
//! empty elements); numbers and booleans are the caller's to coerce.
//!
//! ```
//! use intacct_link::codec::{decode, encode};
//! use serde_json::json;
//!
//! let tree = json!({"query": {"@id": "1", "object": "VENDOR", "pagesize": 1000}});
//! let xml = encode(&tree).unwrap();
//! assert_eq!(
//!     decode(&xml).unwrap(),
//!     json!({"query": {"@id": "1", "object": "VENDOR", "pagesize": "1000"}})
//! );
//! ```

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use serde_json::{Map, Value};

/// Prefix marking a key as an attribute rather than a child element.
pub const ATTRIBUTE_PREFIX: char = '@';

/// Key holding the text content of an element that also has attributes or children.
pub const TEXT_KEY: &str = "#text";

/// Errors raised while encoding or decoding an envelope.
#[derive(thiserror::Error, Debug)]
pub enum CodecError {
    /// The tree does not have exactly one root element.
    #[error("envelope must have exactly one root element, found {0}")]
    InvalidRoot(usize),

    /// The root element was given as a sequence.
    #[error("root element `{0}` cannot be a sequence")]
    SequenceRoot(String),

    /// An attribute or text entry held a mapping or a sequence.
    #[error("`{0}` must hold a scalar value")]
    NotScalar(String),

    /// Writing the markup failed.
    #[error("failed to write XML: {0}")]
    Write(String),

    /// The body is not UTF-8.
    #[error("body is not valid UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The body is not well-formed XML.
    #[error("body is not well-formed XML: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Serializes a tree into UTF-8 XML, starting with an XML declaration.
pub fn encode(tree: &Value) -> Result<Vec<u8>, CodecError> {
    let root = match tree {
        Value::Object(map) if map.len() == 1 => map,
        Value::Object(map) => return Err(CodecError::InvalidRoot(map.len())),
        _ => return Err(CodecError::InvalidRoot(0)),
    };

    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))
        .map_err(write_error)?;

    for (name, value) in root {
        if value.is_array() {
            return Err(CodecError::SequenceRoot(name.clone()));
        }
        write_element(&mut writer, name, value)?;
    }

    Ok(writer.into_inner())
}

fn write_element(writer: &mut Writer<Vec<u8>>, name: &str, value: &Value) -> Result<(), CodecError> {
    match value {
        Value::Array(items) => {
            for item in items {
                write_element(writer, name, item)?;
            }
            Ok(())
        }
        Value::Object(map) => {
            let mut start = BytesStart::new(name);
            for (key, attr) in map {
                if let Some(attr_name) = key.strip_prefix(ATTRIBUTE_PREFIX) {
                    let text = scalar_text(attr).ok_or_else(|| CodecError::NotScalar(key.clone()))?;
                    start.push_attribute((attr_name, text.as_str()));
                }
            }
            writer.write_event(Event::Start(start)).map_err(write_error)?;

            // Text leads the children; decode reads it back the same way.
            if let Some(child) = map.get(TEXT_KEY) {
                let text = scalar_text(child).ok_or_else(|| CodecError::NotScalar(TEXT_KEY.to_string()))?;
                write_text(writer, &text)?;
            }
            for (key, child) in map {
                if key.starts_with(ATTRIBUTE_PREFIX) || key == TEXT_KEY {
                    continue;
                }
                write_element(writer, key, child)?;
            }

            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error)
        }
        scalar => {
            writer
                .write_event(Event::Start(BytesStart::new(name)))
                .map_err(write_error)?;
            if let Some(text) = scalar_text(scalar) {
                write_text(writer, &text)?;
            }
            writer
                .write_event(Event::End(BytesEnd::new(name)))
                .map_err(write_error)
        }
    }
}

fn write_text(writer: &mut Writer<Vec<u8>>, text: &str) -> Result<(), CodecError> {
    if text.is_empty() {
        return Ok(());
    }
    writer
        .write_event(Event::Text(BytesText::new(text)))
        .map_err(write_error)
}

/// Literal text of a scalar, `None` for mappings and sequences.
fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => Some(String::new()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Array(_) | Value::Object(_) => None,
    }
}

fn write_error(err: impl std::fmt::Display) -> CodecError {
    CodecError::Write(err.to_string())
}

/// Parses UTF-8 XML into a tree rooted at the document element.
pub fn decode(body: &[u8]) -> Result<Value, CodecError> {
    let text = std::str::from_utf8(body)?;
    let document = roxmltree::Document::parse(text.trim_start_matches('\u{feff}'))?;
    let root = document.root_element();

    let mut tree = Map::new();
    tree.insert(root.tag_name().name().to_string(), element_to_value(root));
    Ok(Value::Object(tree))
}

fn element_to_value(node: roxmltree::Node<'_, '_>) -> Value {
    let mut map = Map::new();
    for attr in node.attributes() {
        map.insert(
            format!("{}{}", ATTRIBUTE_PREFIX, attr.name()),
            Value::String(attr.value().to_string()),
        );
    }

    let mut text = String::new();
    for child in node.children() {
        if child.is_element() {
            insert_child(&mut map, child.tag_name().name(), element_to_value(child));
        } else if child.is_text() {
            text.push_str(child.text().unwrap_or_default());
        }
    }

    let text = text.trim();
    if map.is_empty() {
        if text.is_empty() {
            Value::Null
        } else {
            Value::String(text.to_string())
        }
    } else {
        if !text.is_empty() {
            map.insert(TEXT_KEY.to_string(), Value::String(text.to_string()));
        }
        Value::Object(map)
    }
}

/// Repeated siblings collapse into a sequence in document order.
fn insert_child(map: &mut Map<String, Value>, name: &str, value: Value) {
    match map.get_mut(name) {
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
        None => {
            map.insert(name.to_string(), value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn encode_str(tree: &Value) -> String {
        String::from_utf8(encode(tree).unwrap()).unwrap()
    }

    #[test]
    fn test_encode_elements_attributes_and_sequences() {
        let tree = json!({
            "function": {
                "@controlid": "abc",
                "query": {
                    "object": "VENDOR",
                    "select": {"field": ["VENDORID", "NAME"]},
                    "pagesize": 1000,
                    "options": {"showprivate": true}
                }
            }
        });

        assert_eq!(
            encode_str(&tree),
            "<?xml version=\"1.0\" encoding=\"utf-8\"?>\
             <function controlid=\"abc\"><query><object>VENDOR</object>\
             <select><field>VENDORID</field><field>NAME</field></select>\
             <pagesize>1000</pagesize><options><showprivate>true</showprivate></options>\
             </query></function>"
        );
    }

    #[test]
    fn test_encode_null_as_empty_element_and_escapes_text() {
        let tree = json!({"content": {"getAPISession": null, "memo": "a < b & c"}});
        let xml = encode_str(&tree);
        assert!(xml.contains("<getAPISession></getAPISession>"));
        assert!(xml.contains("<memo>a &lt; b &amp; c</memo>"));
    }

    #[test]
    fn test_text_written_before_children() {
        let xml = encode_str(&json!({"a": {"b": "x", "#text": "t"}}));
        assert!(xml.ends_with("<a>t<b>x</b></a>"));
    }

    #[test]
    fn test_encode_rejects_bad_roots() {
        assert!(matches!(
            encode(&json!({"a": "1", "b": "2"})),
            Err(CodecError::InvalidRoot(2))
        ));
        assert!(matches!(encode(&json!("text")), Err(CodecError::InvalidRoot(0))));
        assert!(matches!(
            encode(&json!({"a": ["1", "2"]})),
            Err(CodecError::SequenceRoot(_))
        ));
        assert!(matches!(
            encode(&json!({"a": {"@id": {"nested": "x"}}})),
            Err(CodecError::NotScalar(_))
        ));
    }

    #[test]
    fn test_decode_response() {
        let body = br#"<?xml version="1.0" encoding="UTF-8"?>
<response>
  <control><status>success</status></control>
  <operation>
    <result>
      <status>success</status>
      <data listtype="VENDOR" count="2" totalcount="2">
        <VENDOR><VENDORID>V1</VENDORID><NAME>Acme &amp; Co</NAME></VENDOR>
        <VENDOR><VENDORID>V2</VENDORID><NAME></NAME></VENDOR>
      </data>
    </result>
  </operation>
</response>"#;

        let tree = decode(body).unwrap();
        let data = &tree["response"]["operation"]["result"]["data"];
        assert_eq!(data["@totalcount"], "2");
        assert_eq!(data["VENDOR"][0]["NAME"], "Acme & Co");
        assert_eq!(data["VENDOR"][1]["NAME"], Value::Null);
        assert_eq!(tree["response"]["control"]["status"], "success");
    }

    #[test]
    fn test_decode_text_next_to_attributes() {
        let tree = decode(br#"<description2 lang="en">Bad value</description2>"#).unwrap();
        assert_eq!(
            tree,
            json!({"description2": {"@lang": "en", "#text": "Bad value"}})
        );
    }

    #[test]
    fn test_decode_rejects_malformed_markup() {
        assert!(matches!(decode(b"<response><control>"), Err(CodecError::Parse(_))));
        assert!(matches!(decode(b"not xml at all"), Err(CodecError::Parse(_))));
        assert!(matches!(decode(&[0xff, 0xfe, 0x00]), Err(CodecError::Utf8(_))));
    }

    #[test]
    fn test_encode_decode_encode_is_stable() {
        let samples = [
            json!({"request": {
                "control": {"senderid": "s", "uniqueid": false, "dtdversion": "3.0"},
                "operation": {"content": {"function": {
                    "@controlid": "f-1",
                    "create": {"GLBATCH": {
                        "JOURNAL": "GJ",
                        "ENTRIES": {"GLENTRY": [
                            {"ACCOUNTNO": "1000", "AMOUNT": 12.5},
                            {"ACCOUNTNO": "2000", "AMOUNT": -12.5, "MEMO": null}
                        ]}
                    }}
                }}}
            }}),
            json!({"lookup": {"object": "APBILL", "note": {"@kind": "x", "#text": "t"}}}),
            json!({"delete": {"object": "GLBATCH", "keys": ""}}),
            json!({"a": {"#text": "t", "b": "x"}}),
            json!({"a": {"b": "x", "#text": "t", "@id": "1"}}),
        ];

        for sample in samples {
            let once = encode(&sample).unwrap();
            let twice = encode(&decode(&once).unwrap()).unwrap();
            assert_eq!(once, twice);
        }
    }
}
