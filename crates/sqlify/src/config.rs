//! Configuration for [`Sqlify`](crate::Sqlify).

use crate::monitor::{CompositeHook, TracingSqlHook};
use crate::template::ParamType;
use tracing::Level;

/// Configuration for `Sqlify`.
#[derive(Debug, Clone)]
pub struct SqlifyConfig {
    /// Whether every executor logs its SQL through a [`TracingSqlHook`](crate::monitor::TracingSqlHook).
    pub logging_enabled: bool,
    /// Level of the SQL log events.
    pub log_level: Level,
    /// Byte limit for logged SQL. `None` logs the full statement.
    pub log_sql_limit: Option<usize>,
    /// Tag prefix for executors (`<prefix>.<name>`), reported to hooks.
    pub tag_prefix: Option<String>,
    /// Primary key column used by generated model helpers.
    pub primary_key: String,
    /// Declared type of the primary key placeholder in `find_one`.
    pub primary_key_type: ParamType,
}

impl Default for SqlifyConfig {
    fn default() -> Self {
        Self {
            logging_enabled: false,
            log_level: Level::DEBUG,
            log_sql_limit: Some(240),
            tag_prefix: None,
            primary_key: "id".to_string(),
            primary_key_type: ParamType::Integer,
        }
    }
}

impl SqlifyConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log every query via `tracing`.
    pub fn enable_logging(mut self) -> Self {
        self.logging_enabled = true;
        self
    }

    pub fn log_level(mut self, level: Level) -> Self {
        self.log_level = level;
        self
    }

    /// Cut logged SQL at `limit` bytes, or log it whole with `None`.
    pub fn log_sql_limit(mut self, limit: Option<usize>) -> Self {
        self.log_sql_limit = limit;
        self
    }

    pub fn tag_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.tag_prefix = Some(prefix.into());
        self
    }

    /// Override the primary key column and placeholder type used by models.
    pub fn primary_key(mut self, column: impl Into<String>, ty: ParamType) -> Self {
        self.primary_key = column.into();
        self.primary_key_type = ty;
        self
    }

    /// Hooks installed on every executor created under this config.
    pub(crate) fn hooks(&self) -> CompositeHook {
        let hooks = CompositeHook::new();
        if !self.logging_enabled {
            return hooks;
        }
        hooks.add(
            TracingSqlHook::new()
                .at_level(self.log_level)
                .sql_limit(self.log_sql_limit),
        )
    }

    pub(crate) fn tag_for(&self, name: &str) -> String {
        match &self.tag_prefix {
            Some(prefix) => format!("{prefix}.{name}"),
            None => name.to_string(),
        }
    }
}
