//! The request entry point: allow-list, classify, compile, execute, shape.

use crate::allow::TableAllowList;
use crate::classify::{Classified, IgnoreReason, Ignored, classify};
use crate::client::GenericClient;
use crate::compile::{CompiledQuery, compile_count, compile_select};
use crate::error::{GateError, GateResult};
use crate::params::QueryParams;
use crate::row::{JsonRow, rows_to_json};
use serde::Serialize;
use std::collections::BTreeMap;

/// Whether a request returns rows or a count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Rows,
    Count,
}

impl RequestKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rows => "rows",
            Self::Count => "count",
        }
    }
}

/// A request that passed the allow-list and has been compiled.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreparedRequest {
    pub table: String,
    pub kind: RequestKind,
    pub query: CompiledQuery,
    pub ignored: Vec<Ignored>,
    /// Join parameters that were accepted but not compiled.
    pub joins: BTreeMap<String, BTreeMap<String, String>>,
}

/// The JSON body returned for a request.
///
/// Serializes as `{"ok": true, "count": n, "data": [...]}` for rows,
/// `{"ok": true, "count": n}` for counts and
/// `{"ok": false, "message": "...", "error": "..."}` for failures.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GateResponse {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Vec<JsonRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl GateResponse {
    pub fn rows(data: Vec<JsonRow>) -> Self {
        Self {
            ok: true,
            count: Some(data.len() as i64),
            data: Some(data),
            message: None,
            error: None,
        }
    }

    pub fn count(n: i64) -> Self {
        Self {
            ok: true,
            count: Some(n),
            data: None,
            message: None,
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>, error: Option<String>) -> Self {
        Self {
            ok: false,
            count: None,
            data: None,
            message: Some(message.into()),
            error,
        }
    }

    /// The failure payload for an error raised while serving `table`.
    pub fn from_error(table: &str, err: &GateError) -> Self {
        match err {
            GateError::TableNotAllowed(_) => {
                Self::failure(format!("The table {table} doesn't exist."), None)
            }
            GateError::Decode { .. } => Self::failure("Error reading data.", None),
            other => Self::failure(
                "Contact the developer.",
                Some(other.driver_message().unwrap_or_else(|| other.to_string())),
            ),
        }
    }

    /// HTTP status for this body: 201 on success, 500 on failure.
    pub fn status_code(&self) -> u16 {
        if self.ok { 201 } else { 500 }
    }
}

/// Serves table queries for a fixed allow-list.
///
/// Immutable after construction; share it behind an `Arc`.
#[derive(Debug, Clone)]
pub struct TableGate {
    allow_list: TableAllowList,
}

impl TableGate {
    pub fn new(allow_list: TableAllowList) -> Self {
        Self { allow_list }
    }

    pub fn allow_list(&self) -> &TableAllowList {
        &self.allow_list
    }

    /// Check the table, pull out `_count`, then classify and compile.
    pub fn prepare(&self, table: &str, mut params: QueryParams) -> GateResult<PreparedRequest> {
        if let Err(err) = self.allow_list.check(table) {
            tracing::warn!(table, "table rejected by allow-list");
            return Err(err);
        }

        let kind = if params.take_count_flag() {
            RequestKind::Count
        } else {
            RequestKind::Rows
        };

        let Classified { spec, ignored } = classify(&params);
        for item in &ignored {
            if item.reason == IgnoreReason::JoinNotCompiled {
                tracing::warn!(table, key = %item.key, "join parameter is not compiled");
            } else {
                tracing::debug!(table, key = %item.key, reason = %item.reason, "parameter ignored");
            }
        }

        let query = match kind {
            RequestKind::Rows => compile_select(&spec, table),
            RequestKind::Count => compile_count(&spec, table),
        };

        Ok(PreparedRequest {
            table: table.to_string(),
            kind,
            query,
            ignored,
            joins: spec.joins,
        })
    }

    /// Run a prepared request once and build the success body.
    pub async fn execute(
        &self,
        conn: &impl GenericClient,
        request: &PreparedRequest,
    ) -> GateResult<GateResponse> {
        let query = &request.query;
        let params = query.params_ref();
        tracing::debug!(
            target: "tablegate.sql",
            kind = request.kind.as_str(),
            table = %request.table,
            param_count = params.len(),
            sql = %query.sql,
        );

        match request.kind {
            RequestKind::Count => {
                let row = conn.query_one(&query.sql, &params).await?;
                let n: i64 = row
                    .try_get(0)
                    .map_err(|e| GateError::decode("count", e.to_string()))?;
                Ok(GateResponse::count(n))
            }
            RequestKind::Rows => {
                let rows = conn.query(&query.sql, &params).await?;
                Ok(GateResponse::rows(rows_to_json(&rows)?))
            }
        }
    }

    /// Serve one request. Never fails: errors become failure bodies.
    pub async fn handle(
        &self,
        conn: &impl GenericClient,
        table: &str,
        params: QueryParams,
    ) -> GateResponse {
        let result = match self.prepare(table, params) {
            Ok(request) => self.execute(conn, &request).await,
            Err(err) => Err(err),
        };

        result.unwrap_or_else(|err| {
            if !err.is_table_not_allowed() {
                tracing::error!(table, error = %err, "request failed");
            }
            GateResponse::from_error(table, &err)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gate() -> TableGate {
        TableGate::new(TableAllowList::new(["users", "analyst_recommendations"]).unwrap())
    }

    #[test]
    fn prepare_rejects_unlisted_table() {
        let err = gate()
            .prepare("secrets", QueryParams::parse("a=1"))
            .unwrap_err();
        assert!(err.is_table_not_allowed());
    }

    #[test]
    fn prepare_switches_to_count() {
        let req = gate()
            .prepare("users", QueryParams::parse("_count&age=18,21&_limit=5"))
            .unwrap();
        assert_eq!(req.kind, RequestKind::Count);
        assert_eq!(req.query.sql, "SELECT COUNT(*) FROM users WHERE age IN ($1, $2)");
    }

    #[test]
    fn prepare_keeps_joins_and_ignored() {
        let req = gate()
            .prepare("users", QueryParams::parse("orders->total=5&_limit=x"))
            .unwrap();
        assert_eq!(req.kind, RequestKind::Rows);
        assert_eq!(req.query.sql, "SELECT * FROM users");
        assert_eq!(req.joins["orders"]["total"], "5");
        assert_eq!(req.ignored.len(), 2);
    }

    #[test]
    fn rows_body_shape() {
        let mut row = JsonRow::new();
        row.insert("id".into(), json!(1));
        let body = serde_json::to_value(GateResponse::rows(vec![row])).unwrap();
        assert_eq!(body, json!({"ok": true, "count": 1, "data": [{"id": 1}]}));
    }

    #[test]
    fn empty_rows_body_has_empty_data() {
        let body = serde_json::to_value(GateResponse::rows(Vec::new())).unwrap();
        assert_eq!(body, json!({"ok": true, "count": 0, "data": []}));
    }

    #[test]
    fn count_body_shape() {
        let body = serde_json::to_value(GateResponse::count(42)).unwrap();
        assert_eq!(body, json!({"ok": true, "count": 42}));
    }

    #[test]
    fn failure_bodies() {
        let rejected = GateResponse::from_error(
            "secrets",
            &GateError::TableNotAllowed("secrets".into()),
        );
        assert_eq!(
            serde_json::to_value(&rejected).unwrap(),
            json!({"ok": false, "message": "The table secrets doesn't exist."})
        );
        assert_eq!(rejected.status_code(), 500);

        let decode = GateResponse::from_error("users", &GateError::decode("x", "bad"));
        assert_eq!(decode.message.as_deref(), Some("Error reading data."));
        assert_eq!(decode.error, None);

        let pool = GateResponse::from_error("users", &GateError::Pool("timed out".into()));
        assert_eq!(
            serde_json::to_value(&pool).unwrap(),
            json!({"ok": false, "message": "Contact the developer.", "error": "timed out"})
        );
    }

    #[test]
    fn success_status_is_created() {
        assert_eq!(GateResponse::count(0).status_code(), 201);
    }
}
