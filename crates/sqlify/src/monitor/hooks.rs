use super::types::{HookAction, QueryContext, QueryHook, QueryResult, QueryType};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

/// Ordered chain of hooks. The first `Abort` wins and later hooks are not
/// consulted; every hook sees `after_query`.
#[derive(Clone, Default)]
pub struct CompositeHook {
    hooks: Vec<Arc<dyn QueryHook>>,
}

impl CompositeHook {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(clippy::should_implement_trait)]
    pub fn add<H: QueryHook + 'static>(self, hook: H) -> Self {
        self.add_arc(Arc::new(hook))
    }

    pub fn add_arc(mut self, hook: Arc<dyn QueryHook>) -> Self {
        self.push_arc(hook);
        self
    }

    pub fn push_arc(&mut self, hook: Arc<dyn QueryHook>) {
        self.hooks.push(hook);
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }
}

impl QueryHook for CompositeHook {
    fn before_query(&self, ctx: &QueryContext) -> HookAction {
        self.hooks
            .iter()
            .map(|hook| hook.before_query(ctx))
            .find(|action| matches!(action, HookAction::Abort(_)))
            .unwrap_or(HookAction::Continue)
    }

    fn after_query(&self, ctx: &QueryContext, elapsed: Duration, result: &QueryResult) {
        self.hooks
            .iter()
            .for_each(|hook| hook.after_query(ctx, elapsed, result));
    }
}

/// Counters for one executor tag.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagStats {
    pub calls: u64,
    pub failures: u64,
    pub total_duration: Duration,
}

/// Snapshot of what a [`StatsHook`] has observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryStats {
    pub total_queries: u64,
    pub failed_queries: u64,
    pub total_duration: Duration,
    /// Invocations per statement kind; kinds never seen are absent.
    pub by_type: BTreeMap<QueryType, u64>,
    /// Invocations per executor tag; untagged executors are not listed.
    pub by_tag: BTreeMap<String, TagStats>,
    /// Compiled text of the slowest invocation and its duration.
    pub slowest: Option<(String, Duration)>,
}

impl QueryStats {
    pub fn count(&self, query_type: QueryType) -> u64 {
        self.by_type.get(&query_type).copied().unwrap_or(0)
    }

    pub fn tag(&self, tag: &str) -> Option<&TagStats> {
        self.by_tag.get(tag)
    }
}

/// Aggregates invocation counts and timings, grouped by statement kind and
/// by executor tag.
#[derive(Debug, Default)]
pub struct StatsHook {
    inner: Mutex<QueryStats>,
}

impl StatsHook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> QueryStats {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        *self.inner.lock().unwrap_or_else(PoisonError::into_inner) = QueryStats::default();
    }
}

impl QueryHook for StatsHook {
    fn after_query(&self, ctx: &QueryContext, elapsed: Duration, result: &QueryResult) {
        let mut stats = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let failed = u64::from(result.is_error());

        stats.total_queries += 1;
        stats.failed_queries += failed;
        stats.total_duration = stats.total_duration.saturating_add(elapsed);
        *stats.by_type.entry(ctx.query_type).or_default() += 1;

        if let Some(tag) = &ctx.tag {
            let entry = stats.by_tag.entry(tag.clone()).or_default();
            entry.calls += 1;
            entry.failures += failed;
            entry.total_duration = entry.total_duration.saturating_add(elapsed);
        }

        if stats.slowest.as_ref().is_none_or(|(_, d)| elapsed > *d) {
            stats.slowest = Some((ctx.sql.clone(), elapsed));
        }
    }
}
