// src/db/documents.rs
//
// JSON document collections on top of SQLite. The primitives mirror what a
// managed document store gives a client: equality filters, newest-first
// ordering on `createdAt`, resume-after cursors, server-side count, get/add/
// set, field-level update and hard delete.

use crate::db::connection::Database;
use crate::domain::timestamp;
use crate::errors::ServerError;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rusqlite::types::Value as SqlValue;
use rusqlite::{params, params_from_iter, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const REPORTS: &str = "reports";
pub const APPEALS: &str = "appeals";
pub const ENFORCERS: &str = "enforcers";

/// A stored document: its key, its JSON body and the creation time the store
/// orders by.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Map<String, Value>,
    created_ms: i64,
}

impl Document {
    fn from_row(id: String, raw: &str, created_ms: i64) -> Result<Self, ServerError> {
        let data: Map<String, Value> = serde_json::from_str(raw)
            .map_err(|e| ServerError::DbError(format!("corrupt document {id}: {e}")))?;
        Ok(Self {
            id,
            data,
            created_ms,
        })
    }

    /// Resume point that starts right after this document.
    pub fn cursor(&self) -> Cursor {
        Cursor {
            document_id: self.id.clone(),
            created_ms: self.created_ms,
        }
    }

    /// Decode into a model. The document key is exposed as `documentId` and
    /// always wins over a `documentId` stored in the body.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, ServerError> {
        let mut body = self.data.clone();
        body.insert("documentId".to_string(), Value::String(self.id.clone()));
        Ok(serde_json::from_value(Value::Object(body))?)
    }
}

/// Opaque pagination token pointing at the last document of a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cursor {
    document_id: String,
    created_ms: i64,
}

impl Cursor {
    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub fn token(&self) -> String {
        URL_SAFE_NO_PAD.encode(format!("{}:{}", self.created_ms, self.document_id))
    }

    pub fn parse(token: &str) -> Result<Self, ServerError> {
        let bad = || ServerError::BadRequest("invalid cursor".into());
        let raw = URL_SAFE_NO_PAD.decode(token.trim()).map_err(|_| bad())?;
        let raw = String::from_utf8(raw).map_err(|_| bad())?;
        let (millis, id) = raw.split_once(':').ok_or_else(bad)?;
        if id.is_empty() {
            return Err(bad());
        }
        Ok(Self {
            document_id: id.to_string(),
            created_ms: millis.parse().map_err(|_| bad())?,
        })
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.token())
    }
}

impl From<Cursor> for String {
    fn from(c: Cursor) -> Self {
        c.token()
    }
}

impl TryFrom<String> for Cursor {
    type Error = ServerError;

    fn try_from(token: String) -> Result<Self, Self::Error> {
        Cursor::parse(&token)
    }
}

/// A query against one collection.
///
/// Without `order_by_created_desc` documents come back in key order, which
/// is what the store does for a bare filter.
#[derive(Debug, Clone, PartialEq)]
pub struct DocQuery {
    collection: String,
    filters: Vec<(String, String)>,
    newest_first: bool,
    limit: Option<usize>,
    start_after: Option<Cursor>,
}

impl DocQuery {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
            newest_first: false,
            limit: None,
            start_after: None,
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<String>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn order_by_created_desc(mut self) -> Self {
        self.newest_first = true;
        self
    }

    pub fn limit(mut self, n: usize) -> Self {
        self.limit = Some(n);
        self
    }

    pub fn start_after(mut self, cursor: Option<Cursor>) -> Self {
        self.start_after = cursor;
        self
    }

    /// Same filters with no order, limit or cursor: what a count runs on.
    pub fn unbounded(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            filters: self.filters.clone(),
            newest_first: false,
            limit: None,
            start_after: None,
        }
    }

    fn where_sql(&self, args: &mut Vec<SqlValue>) -> Result<String, ServerError> {
        let mut sql = String::from(" WHERE collection = ?");
        args.push(SqlValue::Text(self.collection.clone()));

        for (field, value) in &self.filters {
            check_field_name(field)?;
            sql.push_str(" AND json_extract(data, ?) = ?");
            args.push(SqlValue::Text(format!("$.{field}")));
            args.push(SqlValue::Text(value.clone()));
        }
        Ok(sql)
    }

    fn select_sql(&self) -> Result<(String, Vec<SqlValue>), ServerError> {
        let mut args = Vec::new();
        let mut sql = String::from("SELECT id, data, created_ms FROM documents");
        sql.push_str(&self.where_sql(&mut args)?);

        match (&self.start_after, self.newest_first) {
            (Some(c), true) => {
                sql.push_str(" AND (created_ms < ? OR (created_ms = ? AND id < ?))");
                args.push(SqlValue::Integer(c.created_ms));
                args.push(SqlValue::Integer(c.created_ms));
                args.push(SqlValue::Text(c.document_id.clone()));
            }
            (Some(c), false) => {
                sql.push_str(" AND id > ?");
                args.push(SqlValue::Text(c.document_id.clone()));
            }
            (None, _) => {}
        }

        if self.newest_first {
            sql.push_str(" ORDER BY created_ms DESC, id DESC");
        } else {
            sql.push_str(" ORDER BY id ASC");
        }

        if let Some(n) = self.limit {
            sql.push_str(" LIMIT ?");
            args.push(SqlValue::Integer(i64::try_from(n).unwrap_or(i64::MAX)));
        }
        Ok((sql, args))
    }
}

fn check_field_name(field: &str) -> Result<(), ServerError> {
    let ok = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(ServerError::BadRequest(format!("invalid field name: {field}")))
    }
}

fn created_ms_of(data: &Map<String, Value>) -> i64 {
    let created = data.get("createdAt").and_then(timestamp::normalize);
    timestamp::millis_or_epoch(created.as_ref())
}

fn encode_body(data: &Map<String, Value>) -> Result<String, ServerError> {
    serde_json::to_string(data).map_err(|e| ServerError::DbError(format!("encode failed: {e}")))
}

pub fn get_docs(db: &Database, query: &DocQuery) -> Result<Vec<Document>, ServerError> {
    let (sql, args) = query.select_sql()?;

    db.with_conn(|conn| {
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((
                    row.get::<_, String>(0)?, // id
                    row.get::<_, String>(1)?, // data
                    row.get::<_, i64>(2)?,    // created_ms
                ))
            })
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let mut out = Vec::new();
        for row in rows {
            let (id, raw, created_ms) = row.map_err(|e| ServerError::DbError(e.to_string()))?;
            out.push(Document::from_row(id, &raw, created_ms)?);
        }
        Ok(out)
    })
}

/// Server-side count of everything matching the query's filters.
pub fn count(db: &Database, query: &DocQuery) -> Result<u64, ServerError> {
    let mut args = Vec::new();
    let sql = format!(
        "SELECT COUNT(*) FROM documents{}",
        query.unbounded().where_sql(&mut args)?
    );

    let n: i64 = db.with_conn(|conn| {
        conn.query_row(&sql, params_from_iter(args.iter()), |r| r.get(0))
            .map_err(|e| ServerError::DbError(format!("count failed: {e}")))
    })?;
    Ok(u64::try_from(n).unwrap_or(0))
}

pub fn get_doc(db: &Database, collection: &str, id: &str) -> Result<Option<Document>, ServerError> {
    db.with_conn(|conn| {
        let row = conn
            .query_row(
                "SELECT id, data, created_ms FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, i64>(2)?)),
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        row.map(|(id, raw, created_ms)| Document::from_row(id, &raw, created_ms))
            .transpose()
    })
}

/// Insert under a fresh store-assigned key and return it.
pub fn add_doc(db: &Database, collection: &str, data: Map<String, Value>) -> Result<String, ServerError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    set_doc(db, collection, &id, data)?;
    Ok(id)
}

/// Create or overwrite the document at `id`.
pub fn set_doc(
    db: &Database,
    collection: &str,
    id: &str,
    data: Map<String, Value>,
) -> Result<(), ServerError> {
    if id.is_empty() {
        return Err(ServerError::Validation("document id is required".into()));
    }
    let body = encode_body(&data)?;
    let created_ms = created_ms_of(&data);

    db.with_conn(|conn| {
        conn.execute(
            r#"
            INSERT INTO documents (collection, id, data, created_ms)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(collection, id) DO UPDATE SET
                data = excluded.data,
                created_ms = excluded.created_ms
            "#,
            params![collection, id, body, created_ms],
        )
        .map_err(|e| ServerError::DbError(format!("set document failed: {e}")))?;
        Ok(())
    })
}

/// Set top-level fields on an existing document. Other fields are untouched.
/// Fails with `NotFound` when the document does not exist.
pub fn update_doc(
    db: &Database,
    collection: &str,
    id: &str,
    fields: Map<String, Value>,
) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        let tx = conn
            .transaction()
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        let raw: Option<String> = tx
            .query_row(
                "SELECT data FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |r| r.get(0),
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))?;
        let Some(raw) = raw else {
            return Err(ServerError::NotFound);
        };

        let mut data = Document::from_row(id.to_string(), &raw, 0)?.data;
        data.extend(fields);

        tx.execute(
            "UPDATE documents SET data = ?1, created_ms = ?2 WHERE collection = ?3 AND id = ?4",
            params![encode_body(&data)?, created_ms_of(&data), collection, id],
        )
        .map_err(|e| ServerError::DbError(format!("update document failed: {e}")))?;

        tx.commit().map_err(|e| ServerError::DbError(e.to_string()))
    })
}

/// Hard delete. Deleting a missing document is not an error.
pub fn delete_doc(db: &Database, collection: &str, id: &str) -> Result<(), ServerError> {
    db.with_conn(|conn| {
        conn.execute(
            "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
            params![collection, id],
        )
        .map_err(|e| ServerError::DbError(format!("delete document failed: {e}")))?;
        Ok(())
    })
}
