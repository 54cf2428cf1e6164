//! # sqlfrag
//!
//! Composable, injection-safe SQL fragments for PostgreSQL.
//!
//! ## Features
//!
//! - **Values never become SQL text**: interpolated values are always bound as
//!   `$1, $2, ...` parameters
//! - **Nest freely**: fragments are immutable and shared, so one condition can
//!   appear in many queries; placeholders are numbered when the whole tree is rendered
//! - **Deferred values**: bind a computation now, supply its inputs when the
//!   query is executed
//! - **Small combinator set**: `and` / `or` / `comma` / `join`, `parenthesize`,
//!   `not`, `concat`, plus identifier and literal escaping
//! - **tokio-postgres ready**: [`Query::params_ref`] plugs straight into
//!   `Client::query`, or execute through [`GenericClient`]
//!
//! ## Example
//!
//! ```ignore
//! use sqlfrag::{and, ident, sql};
//!
//! let mut conds = vec![sql!("status = " {"active"})];
//! if let Some(min_age) = min_age {
//!     conds.push(sql!("age >= " {min_age}));
//! }
//!
//! let q = sql!("SELECT * FROM " {ident("users")?} " WHERE " {and(conds)});
//! assert_eq!(q.query(), "SELECT * FROM users WHERE status = $1 AND age >= $2");
//!
//! let rows = q.to_query()?.fetch_all(&client).await?;
//! ```

pub mod client;
pub mod combinators;
pub mod config;
pub mod error;
pub mod escape;
pub mod fragment;
pub mod query;
pub mod template;
pub mod value;

pub use client::GenericClient;
pub use combinators::{
    and, comma, concat, ident, ident_with, join, join_default, literal, literal_with, or,
    parenthesize_all, unsafe_raw, unsafe_raw_opt,
};
pub use config::ExecConfig;
pub use error::{FragError, FragResult};
pub use escape::{Escaper, PgEscaper};
pub use fragment::{Fragment, Part};
pub use query::Query;
pub use template::Template;
pub use value::{Arg, CallArgs, Deferred, Param, Value};
