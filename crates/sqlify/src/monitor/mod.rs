//! Invocation hooks.
//!
//! Every [`Executor`](crate::Executor) call that passes binding is reported
//! to the executor's hook chain: [`QueryHook::before_query`] may abort it
//! before the connection is touched, [`QueryHook::after_query`] receives the
//! row count or error. Hooks see the compiled text, the names of the named
//! placeholders and the executor tag. Bound values are never exposed.
//!
//! ```rust,ignore
//! let stats = Arc::new(StatsHook::new());
//! let find = db
//!     .query("SELECT * FROM users WHERE id = $(id):integer")?
//!     .tagged("users.find")
//!     .with_hook(TracingSqlHook::new())
//!     .with_hook_arc(stats.clone());
//!
//! find.invoke(&args! { "id" => 1 }).await?;
//! assert_eq!(stats.stats().tag("users.find").map(|t| t.calls), Some(1));
//! ```

mod hooks;
mod tracing_hook;
mod types;


pub use hooks::{CompositeHook, QueryStats, StatsHook, TagStats};
pub use tracing_hook::TracingSqlHook;
pub use types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};

/// Longest prefix of `s` that fits in `max_bytes` and ends on a char boundary.
pub(crate) fn truncate_sql_bytes(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
