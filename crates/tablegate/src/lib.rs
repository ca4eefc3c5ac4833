//! # tablegate
//!
//! Query whitelisted PostgreSQL tables with URL query parameters.
//!
//! ## Features
//!
//! - **One flat map in, one statement out**: `?name=_lkjoh_lk&age=18,21&_limit=10`
//!   becomes `SELECT * FROM users WHERE name LIKE $1 AND age IN ($2, $3) LIMIT $4`
//! - **Values are always bound**: identifiers are validated, never quoted
//! - **Best effort**: unusable parameters are dropped and reported, not fatal
//! - **Transaction-friendly**: run on any `GenericClient`
//!
//! ## Parameter syntax
//!
//! | Parameter                     | Meaning                                  |
//! |-------------------------------|------------------------------------------|
//! | `col=v`                       | `col = $n`                               |
//! | `col=_lkv_lk`                 | `col LIKE '%v%'`                         |
//! | `col=a,b`                     | `col IN ($n, $m)`                        |
//! | `col=a,b,_null`               | `(col IN ($n, $m) OR col IS NULL)`       |
//! | `_cmp=a,b` / `_scmp=a,b`      | projection (strict wins)                 |
//! | `_orderby=col&_ordertype=asc` | ordering, both keys required             |
//! | `_limit=n` / `_offset=n`      | pagination                               |
//! | `_distinct`                   | `SELECT DISTINCT` / `COUNT(DISTINCT col)`|
//! | `_count`                      | count instead of rows                    |
//! | `table->attr=v`               | parsed, not compiled                     |
//!
//! ## Example
//!
//! ```ignore
//! use tablegate::{QueryParams, TableAllowList, TableGate};
//!
//! let gate = TableGate::new(TableAllowList::new(["users"])?);
//! let pool = tablegate::create_pool(&database_url)?;
//! let client = pool.get().await?;
//!
//! let body = gate
//!     .handle(&client, "users", QueryParams::parse("status=1,2,_null&_limit=10"))
//!     .await;
//! println!("{}", serde_json::to_string(&body)?);
//! ```

pub mod allow;
pub mod classify;
pub mod client;
pub mod compile;
pub mod config;
pub mod error;
pub mod gate;
pub mod ident;
pub mod params;
pub mod pool;
pub mod row;
pub mod value;

pub use allow::TableAllowList;
pub use classify::{
    Classified, Distinct, Filter, IgnoreReason, Ignored, OrderBy, Projection, QuerySpec,
    SortDirection, classify,
};
pub use client::GenericClient;
pub use compile::{CompiledQuery, SqlBuilder, compile_count, compile_select};
pub use config::GateConfig;
pub use error::{GateError, GateResult};
pub use gate::{GateResponse, PreparedRequest, RequestKind, TableGate};
pub use ident::Ident;
pub use params::QueryParams;
pub use pool::{create_pool, create_pool_from_config, create_pool_with_config};
pub use row::{JsonRow, row_to_json};
pub use value::ScalarValue;
