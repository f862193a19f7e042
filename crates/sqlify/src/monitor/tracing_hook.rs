use super::truncate_sql_bytes;
use super::types::{HookAction, QueryContext, QueryHook, QueryResult};
use std::time::Duration;
use tracing::Level;

const DEFAULT_SQL_LIMIT: usize = 240;

/// Logs every invocation through `tracing` under the `sqlify.sql` target.
///
/// SQL loaded from files is usually spread over many lines, so whitespace runs
/// are collapsed before the text is logged (and cut at `sql_limit` bytes).
/// Failures are always logged at `WARN`.
///
/// Installed on every executor when
/// [`SqlifyConfig::logging_enabled`](crate::SqlifyConfig) is set.
#[derive(Debug, Clone, Copy)]
pub struct TracingSqlHook {
    event_level: Level,
    sql_limit: Option<usize>,
}

impl Default for TracingSqlHook {
    fn default() -> Self {
        Self {
            event_level: Level::DEBUG,
            sql_limit: Some(DEFAULT_SQL_LIMIT),
        }
    }
}

/// `tracing::event!` needs a constant level; dispatch on the runtime one.
macro_rules! sql_event {
    ($level:expr, $($rest:tt)+) => {{
        let level = $level;
        if level == Level::ERROR {
            tracing::event!(target: "sqlify.sql", Level::ERROR, $($rest)+)
        } else if level == Level::WARN {
            tracing::event!(target: "sqlify.sql", Level::WARN, $($rest)+)
        } else if level == Level::INFO {
            tracing::event!(target: "sqlify.sql", Level::INFO, $($rest)+)
        } else if level == Level::DEBUG {
            tracing::event!(target: "sqlify.sql", Level::DEBUG, $($rest)+)
        } else {
            tracing::event!(target: "sqlify.sql", Level::TRACE, $($rest)+)
        }
    }};
}

impl TracingSqlHook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level of the "invoking" and "invocation finished" events.
    pub fn at_level(self, event_level: Level) -> Self {
        Self { event_level, ..self }
    }

    /// Byte limit for logged SQL; `None` logs statements whole.
    pub fn sql_limit(self, sql_limit: Option<usize>) -> Self {
        Self { sql_limit, ..self }
    }

    pub fn event_level(&self) -> Level {
        self.event_level
    }

    /// Single-line, possibly shortened form of `sql` used in log events.
    pub(crate) fn display_sql(&self, sql: &str) -> String {
        let compact = sql.split_whitespace().collect::<Vec<_>>().join(" ");
        let Some(limit) = self.sql_limit.filter(|&limit| compact.len() > limit) else {
            return compact;
        };
        format!("{}...", truncate_sql_bytes(&compact, limit))
    }
}

impl QueryHook for TracingSqlHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        sql_event!(
            self.event_level,
            tag = ctx.tag.as_deref().unwrap_or("-"),
            kind = %ctx.query_type,
            named = ?ctx.named_params,
            computed = ctx.computed_params,
            sql = %self.display_sql(&ctx.sql),
            "invoking"
        );
        HookAction::Continue
    }

    fn after_query(&self, ctx: &QueryContext, elapsed: Duration, result: &QueryResult) {
        let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
        if let QueryResult::Error(error) = result {
            tracing::warn!(
                target: "sqlify.sql",
                tag = ctx.tag.as_deref().unwrap_or("-"),
                %error,
                elapsed_ms,
                sql = %self.display_sql(&ctx.sql),
                "invocation failed"
            );
            return;
        }
        sql_event!(
            self.event_level,
            tag = ctx.tag.as_deref().unwrap_or("-"),
            %result,
            elapsed_ms,
            "invocation finished"
        );
    }
}
