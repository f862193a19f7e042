use crate::template::CompiledTemplate;
use std::fmt;
use std::time::Duration;

/// Statement kind, judged from the leading keyword of the compiled text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum QueryType {
    Select,
    Insert,
    Update,
    Delete,
    /// `CREATE`, `ALTER`, `DROP`, `TRUNCATE`
    Ddl,
    Other,
}

impl QueryType {
    pub const ALL: [QueryType; 6] = [
        QueryType::Select,
        QueryType::Insert,
        QueryType::Update,
        QueryType::Delete,
        QueryType::Ddl,
        QueryType::Other,
    ];

    /// Classify SQL text. Comments and opening parentheses before the first
    /// keyword are ignored; a `WITH` query is classified by its main statement.
    pub fn from_sql(sql: &str) -> Self {
        let mut words = TopLevelWords::new(sql);
        match words.next() {
            Some(w) if w.eq_ignore_ascii_case("WITH") => {
                words.find_map(Self::from_keyword).unwrap_or(QueryType::Select)
            }
            Some(w) => Self::from_keyword(w).unwrap_or(QueryType::Other),
            None => QueryType::Other,
        }
    }

    fn from_keyword(word: &str) -> Option<Self> {
        let kind = match word.to_ascii_uppercase().as_str() {
            "SELECT" | "VALUES" | "TABLE" => QueryType::Select,
            "INSERT" => QueryType::Insert,
            "UPDATE" => QueryType::Update,
            "DELETE" => QueryType::Delete,
            "CREATE" | "ALTER" | "DROP" | "TRUNCATE" => QueryType::Ddl,
            _ => return None,
        };
        Some(kind)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QueryType::Select => "select",
            QueryType::Insert => "insert",
            QueryType::Update => "update",
            QueryType::Delete => "delete",
            QueryType::Ddl => "ddl",
            QueryType::Other => "other",
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Words outside comments, string literals and parentheses.
///
/// Parentheses before the first word are transparent so `(SELECT ...)` is
/// still a select; after that, parenthesised text is skipped.
struct TopLevelWords<'a> {
    rest: &'a str,
    depth: usize,
    started: bool,
}

impl<'a> TopLevelWords<'a> {
    fn new(sql: &'a str) -> Self {
        Self {
            rest: sql,
            depth: 0,
            started: false,
        }
    }

    fn skip(&mut self, n: usize) {
        self.rest = &self.rest[n..];
    }
}

impl<'a> Iterator for TopLevelWords<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        loop {
            let c = self.rest.chars().next()?;
            if self.rest.starts_with("--") {
                let end = self.rest.find('\n').unwrap_or(self.rest.len());
                self.skip(end);
            } else if self.rest.starts_with("/*") {
                let end = self.rest.find("*/").map_or(self.rest.len(), |i| i + 2);
                self.skip(end);
            } else if c == '\'' || c == '"' {
                let end = self.rest[1..].find(c).map_or(self.rest.len(), |i| i + 2);
                self.skip(end);
            } else if c == '(' {
                if self.started {
                    self.depth += 1;
                }
                self.skip(1);
            } else if c == ')' {
                self.depth = self.depth.saturating_sub(1);
                self.skip(1);
            } else if c.is_ascii_alphabetic() || c == '_' {
                let end = self
                    .rest
                    .find(|ch: char| !(ch.is_ascii_alphanumeric() || ch == '_' || ch == '$'))
                    .unwrap_or(self.rest.len());
                let word = &self.rest[..end];
                self.skip(end);
                if self.depth == 0 {
                    self.started = true;
                    return Some(word);
                }
            } else {
                self.skip(c.len_utf8());
            }
        }
    }
}

/// What a hook sees of an invocation: the compiled text and its parameter
/// layout, never the bound values.
#[derive(Debug, Clone)]
pub struct QueryContext {
    /// Compiled SQL with positional markers.
    pub sql: String,
    pub query_type: QueryType,
    /// Names of the named placeholders, in marker order (duplicates kept).
    pub named_params: Vec<String>,
    /// Number of transformer-computed parameters.
    pub computed_params: usize,
    /// Executor tag, e.g. `users.find_one`.
    pub tag: Option<String>,
}

impl QueryContext {
    /// Context for ad-hoc SQL without named parameters.
    pub fn new(sql: &str) -> Self {
        Self {
            sql: sql.to_string(),
            query_type: QueryType::from_sql(sql),
            named_params: Vec::new(),
            computed_params: 0,
            tag: None,
        }
    }

    pub fn for_template(template: &CompiledTemplate) -> Self {
        let mut ctx = Self::new(template.text());
        ctx.named_params = template.named_params().map(str::to_string).collect();
        ctx.computed_params = template.param_count() - ctx.named_params.len();
        ctx
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    /// Total number of positional markers.
    pub fn param_count(&self) -> usize {
        self.named_params.len() + self.computed_params
    }

    pub fn reads_param(&self, name: &str) -> bool {
        self.named_params.iter().any(|p| p == name)
    }
}

/// Error text reported to hooks is cut to this many bytes.
const MAX_ERROR_LEN: usize = 512;

/// How an invocation ended, as reported to `after_query`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResult {
    Rows(usize),
    Error(String),
}

impl QueryResult {
    pub fn error(msg: impl Into<String>) -> Self {
        let msg = msg.into();
        let cut = super::truncate_sql_bytes(&msg, MAX_ERROR_LEN).len();
        if cut < msg.len() {
            Self::Error(format!("{}...", &msg[..cut]))
        } else {
            Self::Error(msg)
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, QueryResult::Error(_))
    }
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryResult::Rows(1) => f.write_str("1 row"),
            QueryResult::Rows(n) => write!(f, "{n} rows"),
            QueryResult::Error(e) => write!(f, "failed: {e}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookAction {
    Continue,
    /// Stop before the connection is called; the executor returns
    /// [`SqlifyError::Aborted`](crate::SqlifyError::Aborted) with this reason.
    Abort(String),
}

/// Observer of [`Executor`](crate::Executor) invocations.
///
/// `before_query` runs once binding has succeeded, so a hook never sees an
/// invocation that failed validation. `after_query` runs after the connection
/// returned, successfully or not.
pub trait QueryHook: Send + Sync {
    fn before_query(&self, _ctx: &QueryContext) -> HookAction {
        HookAction::Continue
    }

    fn after_query(&self, _ctx: &QueryContext, _elapsed: Duration, _result: &QueryResult) {}
}
