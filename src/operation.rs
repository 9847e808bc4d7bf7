//! Typed facade over the gateway's function verbs.
//!
//! Payloads stay loosely typed [`Value`] trees, since their shape belongs to the
//! record-mapping layer. What this module pins down is the verb, the object the
//! call targets, and the few structural rewrites the gateway needs before a
//! payload goes on the wire.

use crate::{Error, Result};
use serde_json::{json, Map, Value};
use std::fmt;

/// A gateway function name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Verb {
    /// `create`
    Create,
    /// `update`
    Update,
    /// `delete`
    Delete,
    /// `query`
    Query,
    /// `read`
    Read,
    /// `readByQuery`
    ReadByQuery,
    /// `lookup`
    Lookup,
    /// Any other function, e.g. `create_supdoc` or `getAPISession`.
    Other(String),
}

impl Verb {
    /// Parses a function name.
    pub fn parse(name: &str) -> Self {
        match name {
            "create" => Verb::Create,
            "update" => Verb::Update,
            "delete" => Verb::Delete,
            "query" => Verb::Query,
            "read" => Verb::Read,
            "readByQuery" => Verb::ReadByQuery,
            "lookup" => Verb::Lookup,
            other => Verb::Other(other.to_string()),
        }
    }

    /// The function name as sent on the wire.
    pub fn as_str(&self) -> &str {
        match self {
            Verb::Create => "create",
            Verb::Update => "update",
            Verb::Delete => "delete",
            Verb::Query => "query",
            Verb::Read => "read",
            Verb::ReadByQuery => "readByQuery",
            Verb::Lookup => "lookup",
            Verb::Other(name) => name,
        }
    }

    /// Whether this verb writes a record (`create`, `update_*` and friends).
    ///
    /// Writes name their object through the record's element, so the
    /// `object` entry has to be dropped from their payload. `delete` is not a
    /// write here: the gateway identifies the records to delete by `object`
    /// plus `keys`, so deletes keep their `object` entry.
    pub fn is_write(&self) -> bool {
        let name = self.as_str();
        name.contains("create") || name.contains("update")
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One function call: a verb and its payload.
///
/// # Examples
///
/// ```
/// use intacct_link::{Operation, Verb};
/// use serde_json::json;
///
/// let op = Operation::create("VENDOR", json!({"VENDORID": "V100", "NAME": "Acme"}));
/// assert_eq!(op.verb(), &Verb::Create);
/// assert_eq!(op.object(), Some("VENDOR"));
///
/// let op = Operation::from_tree(json!({"delete": {"object": "GLBATCH", "keys": "42"}})).unwrap();
/// assert_eq!(op.verb(), &Verb::Delete);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    verb: Verb,
    payload: Value,
}

impl Operation {
    /// Creates an operation from a verb and payload.
    pub fn new(verb: Verb, payload: Value) -> Self {
        Self { verb, payload }
    }

    /// Reads a collaborator-supplied `{verb: payload}` mapping.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] unless the tree is a mapping with
    /// exactly one key.
    pub fn from_tree(tree: Value) -> Result<Self> {
        let Value::Object(map) = tree else {
            return Err(Error::InvalidOperation("operation must be a mapping".to_string()));
        };
        if map.len() != 1 {
            return Err(Error::InvalidOperation(format!(
                "operation must hold exactly one verb, found {}",
                map.len()
            )));
        }
        let Some((verb, payload)) = map.into_iter().next() else {
            return Err(Error::InvalidOperation("operation is empty".to_string()));
        };
        Ok(Self::new(Verb::parse(&verb), payload))
    }

    /// `create` one record of `object`.
    pub fn create(object: &str, record: Value) -> Self {
        Self::new(Verb::Create, object_payload(object, record))
    }

    /// `update` one record of `object`.
    pub fn update(object: &str, record: Value) -> Self {
        Self::new(Verb::Update, object_payload(object, record))
    }

    /// `delete` the records of `object` whose keys are listed (comma separated).
    pub fn delete(object: &str, keys: &str) -> Self {
        Self::new(Verb::Delete, json!({"object": object, "keys": keys}))
    }

    /// `read` records of `object` by key.
    pub fn read(object: &str, keys: &str, fields: &str) -> Self {
        Self::new(
            Verb::Read,
            json!({"object": object, "keys": keys, "fields": fields}),
        )
    }

    /// `readByQuery` over `object`, returning up to `pagesize` rows.
    pub fn read_by_query(object: &str, fields: &str, query: Option<&str>, pagesize: usize) -> Self {
        Self::new(
            Verb::ReadByQuery,
            json!({
                "object": object,
                "fields": fields,
                "query": query,
                "pagesize": pagesize.to_string(),
            }),
        )
    }

    /// `lookup` the definition of `object`.
    pub fn lookup(object: &str) -> Self {
        Self::new(Verb::Lookup, json!({"object": object}))
    }

    /// The function name.
    pub fn verb(&self) -> &Verb {
        &self.verb
    }

    /// The raw payload.
    pub fn payload(&self) -> &Value {
        &self.payload
    }

    /// The object this call targets, from the payload's `object` (or
    /// `@object`) entry.
    pub fn object(&self) -> Option<&str> {
        self.payload
            .get("object")
            .or_else(|| self.payload.get("@object"))
            .and_then(Value::as_str)
    }

    /// Replaces the payload with the record stored under the upper-cased
    /// object tag, for collaborators that hand over `{object, TAG: record}`
    /// but need only the record sent.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidOperation`] if the payload names no object or
    /// holds no record under its tag.
    pub fn into_object_payload(self) -> Result<Self> {
        let object = self
            .object()
            .ok_or_else(|| Error::InvalidOperation(format!("`{}` payload names no object", self.verb)))?
            .to_uppercase();
        let record = self.payload.get(&object).cloned().ok_or_else(|| {
            Error::InvalidOperation(format!("`{}` payload has no `{}` entry", self.verb, object))
        })?;
        Ok(Self::new(self.verb, record))
    }

    /// The function name and the payload as it goes on the wire.
    pub(crate) fn into_parts(self) -> (Verb, Value) {
        let mut payload = self.payload;
        if self.verb.is_write() {
            if let Value::Object(map) = &mut payload {
                map.shift_remove("object");
            }
        }
        (self.verb, payload)
    }
}

fn object_payload(object: &str, record: Value) -> Value {
    let mut map = Map::new();
    map.insert("object".to_string(), json!(object));
    map.insert(object.to_uppercase(), record);
    Value::Object(map)
}
