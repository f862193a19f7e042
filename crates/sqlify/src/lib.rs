//! # sqlify
//!
//! Typed SQL templates compiled into parameterized PostgreSQL executors.
//!
//! ## Features
//!
//! - **Typed placeholders**: `$(name)` and `$(name):type` in SQL text, validated before execution
//! - **Transformers**: callbacks computing a parameter from the argument bag at call time
//! - **Positional markers**: templates compile to `$1..$N` text plus ordered parameter descriptors
//! - **Schema models**: `CREATE TABLE`/`CREATE VIEW` text becomes `find`/`create`/`update`/`delete` helpers
//! - **Query hooks**: tracing, statistics and abort hooks around every execution
//!
//! ## Example
//!
//! ```ignore
//! use sqlify::{Sqlify, Template, args};
//!
//! let db = Sqlify::new(client);
//!
//! let by_status = db.sql(
//!     &Template::new("SELECT * FROM orders WHERE user_id = $(user_id):integer AND status = ")
//!         .transform(|a| a.get("status").cloned().unwrap_or("open".into())),
//! )?;
//! let rows = by_status.invoke(&args! { "user_id" => 42 }).await?;
//!
//! match db.from_file("sql/users.sql")? {
//!     sqlify::Loaded::Model(users) => { users.create(&args! { "name" => "Ada" }).await?; }
//!     sqlify::Loaded::Query(query) => { query.invoke(None).await?; }
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod executor;
pub mod ident;
pub mod model;
pub mod monitor;
pub mod schema;
pub mod sqlify;
pub mod template;
pub mod value;

#[cfg(feature = "pool")]
pub mod pool;

#[cfg(test)]
mod test_support;

pub use client::Connection;
pub use config::SqlifyConfig;
pub use error::{SqlifyError, SqlifyResult};
pub use executor::{Executor, bind_values};
pub use ident::Ident;
pub use model::Model;
pub use monitor::{
    CompositeHook, HookAction, QueryContext, QueryHook, QueryResult, QueryStats, QueryType,
    StatsHook, TagStats, TracingSqlHook,
};
pub use schema::{Entity, EntityKind, Field, FieldType, is_schema, parse_entity};
pub use sqlify::{Loaded, Sqlify};
pub use template::{
    CompiledTemplate, Embedded, Param, ParamSource, ParamType, Template, Transformer, compile,
};
pub use value::{Args, Value};

#[cfg(feature = "pool")]
pub use pool::{create_pool, create_pool_with_config, create_pool_with_tls};
