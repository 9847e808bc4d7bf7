//! Bulk reads over gateway object collections.
//!
//! Listing an unfiltered collection is a two-step affair: a one-row count query
//! learns `@totalcount`, then pages of [`PAGE_SIZE`] rows are fetched at
//! increasing offsets until the count is covered. Filtered listings send a
//! single query and return that one page.

use crate::{objects::object_tag, operation::Operation, Client, Error, Result, Verb};
use serde_json::{json, Value};

/// Rows per page when walking a collection.
pub const PAGE_SIZE: usize = 1000;

/// Field selected by the count query.
const RECORD_ID_FIELD: &str = "RECORDNO";

impl Client {
    /// Lists every record of `object` (e.g. `VENDOR`), selecting `fields`.
    ///
    /// With a `filter`, only the first page of matches is returned: filtered
    /// listings are not paginated. Without one, paging stops early if the
    /// gateway returns an empty page before `@totalcount` rows arrived.
    pub async fn list_entities(
        &self,
        object: &str,
        fields: &[&str],
        filter: Option<&Value>,
    ) -> Result<Vec<Value>> {
        if let Some(filter) = filter {
            let result = self.send(filtered_query(object, fields, filter)).await?;
            return Ok(records(&result, object));
        }

        let counted = self.send(count_query(object)).await?;
        let total = total_count(&counted)?;
        tracing::debug!(object = object, total = total, "Listing records");

        let mut all = Vec::new();
        for offset in (0..total).step_by(PAGE_SIZE) {
            let page = records(&self.send(page_query(object, fields, offset)).await?, object);
            if page.is_empty() {
                tracing::warn!(
                    object = object,
                    offset = offset,
                    total = total,
                    "Page came back empty before the count was reached"
                );
                break;
            }
            all.extend(page);
        }
        Ok(all)
    }

    /// Runs one query of up to [`PAGE_SIZE`] rows over `object`.
    ///
    /// Returns `None` when nothing matched. Otherwise returns the data stored
    /// under the object tag: a single record, or a sequence when several
    /// records matched.
    pub async fn query_single(
        &self,
        object: &str,
        fields: &[&str],
        filter: Option<&Value>,
    ) -> Result<Option<Value>> {
        let mut query = json!({
            "object": object,
            "select": {"field": fields},
            "pagesize": PAGE_SIZE.to_string(),
        });
        if let Some(filter) = filter {
            query["filter"] = filter.clone();
        }

        let result = self.send(Operation::new(Verb::Query, query)).await?;
        if total_count(&result)? == 0 {
            return Ok(None);
        }
        Ok(result.pointer("/data").and_then(|data| data.get(object)).cloned())
    }

    /// [`list_entities`](Self::list_entities) for a stream name such as
    /// `accounts_payable_vendors`.
    pub async fn get_entity(&self, stream: &str, fields: &[&str]) -> Result<Vec<Value>> {
        self.list_entities(resolve(stream)?, fields, None).await
    }

    /// [`query_single`](Self::query_single) for a stream name.
    pub async fn query_entity(
        &self,
        stream: &str,
        fields: &[&str],
        filter: Option<&Value>,
    ) -> Result<Option<Value>> {
        self.query_single(resolve(stream)?, fields, filter).await
    }

    /// Up to ten records of `object` with every field, for schema discovery.
    pub async fn get_sample(&self, object: &str) -> Result<Vec<Value>> {
        let object = object.to_uppercase();
        let result = self
            .send(Operation::read_by_query(&object, "*", None, 10))
            .await?;
        Ok(records(&result, &object.to_lowercase()))
    }

    /// The field definitions of `object`.
    pub async fn get_definition(&self, object: &str) -> Result<Value> {
        self.send(Operation::lookup(&object.to_uppercase())).await
    }

    /// Reads records of `object` by key.
    pub async fn read(&self, object: &str, keys: &str, fields: &str) -> Result<Value> {
        self.send(Operation::read(&object.to_uppercase(), keys, fields))
            .await
    }
}

fn resolve(stream: &str) -> Result<&'static str> {
    object_tag(stream).ok_or_else(|| Error::InvalidOperation(format!("unknown stream `{}`", stream)))
}

fn count_query(object: &str) -> Operation {
    Operation::new(
        Verb::Query,
        json!({
            "object": object,
            "select": {"field": RECORD_ID_FIELD},
            "pagesize": "1",
            "options": {"showprivate": "true"},
        }),
    )
}

fn filtered_query(object: &str, fields: &[&str], filter: &Value) -> Operation {
    Operation::new(
        Verb::Query,
        json!({
            "object": object,
            "select": {"field": fields},
            "pagesize": "1",
            "options": {"showprivate": "true"},
            "filter": filter,
        }),
    )
}

fn page_query(object: &str, fields: &[&str], offset: usize) -> Operation {
    Operation::new(
        Verb::Query,
        json!({
            "object": object,
            "select": {"field": fields},
            "options": {"showprivate": "true"},
            "pagesize": PAGE_SIZE.to_string(),
            "offset": offset.to_string(),
        }),
    )
}

/// Reads `data/@totalcount` from a query result.
fn total_count(result: &Value) -> Result<usize> {
    result
        .pointer("/data/@totalcount")
        .and_then(Value::as_str)
        .and_then(|count| count.trim().parse().ok())
        .ok_or_else(|| Error::UnexpectedResponse {
            response: result.clone(),
        })
}

/// The records under `data/<object>` as a sequence.
///
/// A lone record arrives unwrapped and an empty page has no entry at all;
/// both are normalized here.
fn records(result: &Value, object: &str) -> Vec<Value> {
    match result.pointer("/data").and_then(|data| data.get(object)) {
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Null) | None => Vec::new(),
        Some(record) => vec![record.clone()],
    }
}
