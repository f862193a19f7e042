//! Execution binder.
//!
//! An [`Executor`] pairs a [`CompiledTemplate`] with a [`Connection`]. Every
//! invocation resolves the template parameters against a fresh argument bag,
//! validates them, and forwards `(text, values)` to the connection.
//!
//! # Example
//!
//! ```ignore
//! let find = Executor::new(conn, CompiledTemplate::parse(
//!     "SELECT * FROM users WHERE id = $(id):integer",
//! )?);
//!
//! let rows = find.invoke(&args! { "id" => 1 }).await?;
//! ```

mod validate;

pub(crate) use validate::validate;


use crate::client::Connection;
use crate::error::{SqlifyError, SqlifyResult};
use crate::monitor::{CompositeHook, HookAction, QueryContext, QueryHook, QueryResult};
use crate::template::{CompiledTemplate, ParamSource};
use crate::value::{Args, Value};
use std::sync::Arc;
use std::time::Instant;

/// Resolve the parameters of `template` into positional values.
///
/// Named parameters are checked (presence, then declared type) before any
/// transformer runs, so a failing call never evaluates a transformer.
/// The returned vector has one entry per parameter: `values[i]` binds to `$i+1`.
pub fn bind_values(template: &CompiledTemplate, args: Option<&Args>) -> SqlifyResult<Vec<Value>> {
    for param in template.params().iter().filter(|p| !p.is_transformer()) {
        let value = args
            .and_then(|a| a.get(&param.name))
            .ok_or_else(|| SqlifyError::missing(&param.name))?;
        validate::validate(&param.name, param.ty, value)?;
    }

    let empty = Args::new();
    let bag = args.unwrap_or(&empty);
    template
        .params()
        .iter()
        .map(|param| match &param.source {
            ParamSource::Transformer(t) => Ok(t.call(bag)),
            ParamSource::Named => bag
                .get(&param.name)
                .cloned()
                .ok_or_else(|| SqlifyError::missing(&param.name)),
        })
        .collect()
}

/// A compiled template bound to a connection.
///
/// Cheap to clone; holds no per-call state.
pub struct Executor<C> {
    conn: Arc<C>,
    template: Arc<CompiledTemplate>,
    hooks: CompositeHook,
    tag: Option<String>,
}

impl<C> Clone for Executor<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            template: Arc::clone(&self.template),
            hooks: self.hooks.clone(),
            tag: self.tag.clone(),
        }
    }
}

impl<C> std::fmt::Debug for Executor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("sql", &self.template.text())
            .field("param_count", &self.template.param_count())
            .field("tag", &self.tag)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

impl<C: Connection> Executor<C> {
    pub fn new(conn: Arc<C>, template: impl Into<Arc<CompiledTemplate>>) -> Self {
        Self {
            conn,
            template: template.into(),
            hooks: CompositeHook::new(),
            tag: None,
        }
    }

    pub fn template(&self) -> &CompiledTemplate {
        &self.template
    }

    /// Compiled SQL text with positional markers.
    pub fn text(&self) -> &str {
        self.template.text()
    }

    pub fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    /// Associate a tag reported to hooks.
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_hook<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.with_hook_arc(Arc::new(hook))
    }

    pub fn with_hook_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.hooks.push_arc(hook);
        self
    }

    pub(crate) fn with_hooks(mut self, hooks: CompositeHook) -> Self {
        self.hooks = hooks;
        self
    }

    /// Resolve the values this executor would send for `args`, without executing.
    pub fn bind_values<'a>(&self, args: impl Into<Option<&'a Args>>) -> SqlifyResult<Vec<Value>> {
        bind_values(&self.template, args.into())
    }

    /// Bind `args` and run the query. Rows are returned unchanged.
    ///
    /// Pass `None` when the template has no named parameters.
    pub async fn invoke<'a>(&self, args: impl Into<Option<&'a Args>>) -> SqlifyResult<Vec<C::Row>> {
        let values = bind_values(&self.template, args.into())?;
        self.execute(values).await
    }

    /// Run the compiled text with already resolved values, through the hooks.
    pub(crate) async fn execute(&self, values: Vec<Value>) -> SqlifyResult<Vec<C::Row>> {
        let sql = self.template.text();

        if self.hooks.is_empty() {
            return self.conn.query(sql, &values).await;
        }

        let mut ctx = QueryContext::for_template(&self.template);
        if let Some(tag) = &self.tag {
            ctx = ctx.with_tag(tag.clone());
        }
        if let HookAction::Abort(reason) = self.hooks.before_query(&ctx) {
            return Err(SqlifyError::Aborted(reason));
        }

        let start = Instant::now();
        let result = self.conn.query(sql, &values).await;
        let outcome = match &result {
            Ok(rows) => QueryResult::Rows(rows.len()),
            Err(e) => QueryResult::error(e.to_string()),
        };
        self.hooks.after_query(&ctx, start.elapsed(), &outcome);
        result
    }
}
