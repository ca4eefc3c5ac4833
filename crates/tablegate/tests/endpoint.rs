//! Query-string in, statement out, through the public API only.

use tablegate::{
    CompiledQuery, Filter, IgnoreReason, QueryParams, RequestKind, ScalarValue, TableAllowList,
    TableGate, classify, compile_count, compile_select,
};

fn gate() -> TableGate {
    TableGate::new(TableAllowList::new(["users", "analyst_recommendations"]).unwrap())
}

fn prepare(table: &str, qs: &str) -> tablegate::PreparedRequest {
    gate().prepare(table, QueryParams::parse(qs)).unwrap()
}

fn placeholder_numbers(sql: &str) -> Vec<usize> {
    let mut out = Vec::new();
    let mut rest = sql;
    while let Some(pos) = rest.find('$') {
        rest = &rest[pos + 1..];
        let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
        if let Ok(n) = digits.parse() {
            out.push(n);
        }
    }
    out
}

fn assert_well_numbered(q: &CompiledQuery) {
    let numbers = placeholder_numbers(&q.sql);
    assert_eq!(numbers, (1..=q.args.len()).collect::<Vec<_>>(), "{}", q.sql);
}

#[test]
fn like_request() {
    let req = prepare("users", "name=_lkjoh_lk");
    assert_eq!(req.query.sql, "SELECT * FROM users WHERE name LIKE $1");
    assert_eq!(req.query.args, vec![ScalarValue::Text("%joh%".into())]);
}

#[test]
fn url_encoded_values_are_decoded_first() {
    let req = prepare("users", "name=_lkjohn%20doe_lk&status=1%2C2%2C_null");
    assert_eq!(
        req.query.sql,
        "SELECT * FROM users WHERE name LIKE $1 AND (status IN ($2, $3) OR status IS NULL)"
    );
    assert_eq!(
        req.query.args,
        vec![
            ScalarValue::Text("%john doe%".into()),
            ScalarValue::Integer(1),
            ScalarValue::Integer(2),
        ]
    );
}

#[test]
fn pagination_request() {
    let req = prepare("users", "_limit=10&_offset=5");
    assert_eq!(req.query.sql, "SELECT * FROM users LIMIT $1 OFFSET $2");
    assert_eq!(
        req.query.args,
        vec![ScalarValue::Integer(10), ScalarValue::Integer(5)]
    );
}

#[test]
fn full_request_is_well_numbered() {
    let req = prepare(
        "analyst_recommendations",
        "ticker=AAPL&analyst=_lkmor_lk&rating=1,2&horizon=12,_null\
         &_scmp=ticker,rating&_orderby=ticker&_ordertype=ASC&_limit=20&_offset=40&_cache=1",
    );
    assert_eq!(req.kind, RequestKind::Rows);
    assert_eq!(
        req.query.sql,
        "SELECT ticker, rating FROM analyst_recommendations \
         WHERE ticker = $1 AND analyst LIKE $2 AND rating IN ($3, $4) \
         AND (horizon IN ($5) OR horizon IS NULL) \
         ORDER BY ticker ASC LIMIT $6 OFFSET $7"
    );
    assert_well_numbered(&req.query);
    assert!(req.ignored.is_empty());
}

#[test]
fn count_request_drops_select_only_clauses() {
    let req = prepare(
        "users",
        "_count=1&age=18,21&_orderby=name&_ordertype=desc&_limit=10&_offset=5&_cmp=id",
    );
    assert_eq!(req.kind, RequestKind::Count);
    assert_eq!(req.query.sql, "SELECT COUNT(*) FROM users WHERE age IN ($1, $2)");
    assert_well_numbered(&req.query);
}

#[test]
fn hostile_keys_never_reach_sql() {
    let req = prepare(
        "users",
        "id%3D1%20OR%201%3D1--=x&_orderby=name;DROP&_ordertype=asc&_cmp=*,id",
    );
    assert_eq!(req.query.sql, "SELECT id FROM users");
    assert!(req.query.args.is_empty());
    assert_eq!(
        req.ignored
            .iter()
            .filter(|i| i.reason == IgnoreReason::InvalidIdentifier)
            .count(),
        3
    );
}

#[test]
fn hostile_values_are_bound() {
    let req = prepare("users", "name=x' OR '1'='1");
    assert_eq!(req.query.sql, "SELECT * FROM users WHERE name = $1");
    assert_eq!(req.query.args, vec![ScalarValue::Text("x' OR '1'='1".into())]);
}

#[test]
fn unlisted_table_is_rejected() {
    let err = gate()
        .prepare("pg_shadow", QueryParams::new())
        .unwrap_err();
    assert!(err.is_table_not_allowed());
}

#[test]
fn every_filter_syntax_is_exclusive() {
    let params = QueryParams::parse("a=1&b=_lk2_lk&c=3,4&d=5,_null");
    let spec = classify(&params).spec;
    let kinds: Vec<&str> = spec
        .filters
        .iter()
        .map(|f| match f {
            Filter::Eq { .. } => "eq",
            Filter::Like { .. } => "like",
            Filter::In { .. } => "in",
            Filter::InOrNull { .. } => "in_or_null",
        })
        .collect();
    assert_eq!(kinds, vec!["eq", "like", "in", "in_or_null"]);

    for q in [compile_select(&spec, "t"), compile_count(&spec, "t")] {
        assert_well_numbered(&q);
    }
}

#[test]
fn prepared_request_serializes() {
    let req = prepare("users", "status=1,_null&orders->id=3");
    let value = serde_json::to_value(&req).unwrap();
    assert_eq!(value["kind"], "rows");
    assert_eq!(value["query"]["args"], serde_json::json!([1]));
    assert_eq!(value["joins"]["orders"]["id"], "3");
    assert_eq!(value["ignored"][0]["reason"], "join_not_compiled");
}
