//! The `Sqlify` facade: one connection, one configuration, many executors.

use crate::client::Connection;
use crate::config::SqlifyConfig;
use crate::error::{SqlifyError, SqlifyResult};
use crate::executor::Executor;
use crate::model::Model;
use crate::schema::{is_schema, parse_entity};
use crate::template::{CompiledTemplate, Template};
use std::path::Path;
use std::sync::Arc;

/// Entry point binding templates, files and schemas to a connection.
///
/// # Example
///
/// ```ignore
/// use sqlify::{Sqlify, Template, args};
///
/// let db = Sqlify::new(client);
/// let find = db.sql(&Template::new("SELECT * FROM users WHERE id = $(id):integer"))?;
/// let rows = find.invoke(&args! { "id" => 1 }).await?;
/// ```
pub struct Sqlify<C> {
    conn: Arc<C>,
    config: SqlifyConfig,
}

impl<C> Clone for Sqlify<C> {
    fn clone(&self) -> Self {
        Self {
            conn: Arc::clone(&self.conn),
            config: self.config.clone(),
        }
    }
}

/// Result of loading a SQL file.
#[derive(Debug)]
pub enum Loaded<C> {
    /// Plain SQL compiled into an executor.
    Query(Executor<C>),
    /// A `CREATE TABLE`/`CREATE VIEW` statement turned into a model.
    Model(Model<C>),
}

impl<C> Loaded<C> {
    pub fn into_query(self) -> Option<Executor<C>> {
        match self {
            Loaded::Query(exec) => Some(exec),
            Loaded::Model(_) => None,
        }
    }

    pub fn into_model(self) -> Option<Model<C>> {
        match self {
            Loaded::Model(model) => Some(model),
            Loaded::Query(_) => None,
        }
    }
}

impl<C: Connection> Sqlify<C> {
    pub fn new(conn: C) -> Self {
        Self::from_arc(Arc::new(conn))
    }

    /// Share a connection that is already reference counted.
    pub fn from_arc(conn: Arc<C>) -> Self {
        Self {
            conn,
            config: SqlifyConfig::default(),
        }
    }

    pub fn with_config(mut self, config: SqlifyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &SqlifyConfig {
        &self.config
    }

    pub fn connection(&self) -> &C {
        &self.conn
    }

    /// Compile a template and bind it to this connection.
    pub fn sql(&self, template: &Template) -> SqlifyResult<Executor<C>> {
        Ok(self.bind(template.compile()?, None))
    }

    /// Compile plain SQL text (no embedded values).
    pub fn query(&self, text: &str) -> SqlifyResult<Executor<C>> {
        Ok(self.bind(CompiledTemplate::parse(text)?, None))
    }

    /// Bind an already compiled template; `name` is used for the executor tag.
    pub fn bind(&self, template: CompiledTemplate, name: Option<&str>) -> Executor<C> {
        let exec = Executor::new(Arc::clone(&self.conn), template).with_hooks(self.config.hooks());
        match name {
            Some(name) => exec.tagged(self.config.tag_for(name)),
            None => match &self.config.tag_prefix {
                Some(prefix) => exec.tagged(prefix.clone()),
                None => exec,
            },
        }
    }

    /// Build a model from `CREATE TABLE`/`CREATE VIEW` text.
    ///
    /// `name` is used when the statement does not name the entity.
    pub fn model_from_schema(&self, text: &str, name: &str) -> SqlifyResult<Model<C>> {
        let entity = parse_entity(text, name)?;
        Model::with_config(Arc::clone(&self.conn), entity, &self.config)
    }

    /// Classify SQL text as a schema or a query and bind it.
    pub fn from_sql_text(&self, text: &str, name: &str) -> SqlifyResult<Loaded<C>> {
        if is_schema(text) {
            return self.model_from_schema(text, name).map(Loaded::Model);
        }
        let template = CompiledTemplate::parse(text)?;
        Ok(Loaded::Query(self.bind(template, Some(name))))
    }

    /// Read a `.sql` file and load it with [`from_sql_text`](Self::from_sql_text).
    ///
    /// The file stem names the entity or executor.
    pub fn from_file(&self, path: impl AsRef<Path>) -> SqlifyResult<Loaded<C>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SqlifyError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("query");

        tracing::debug!(
            target: "sqlify.loader",
            path = %path.display(),
            schema = is_schema(&text),
            "loading sql file"
        );
        self.from_sql_text(&text, name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args;
    use crate::test_support::RecordingConnection;
    use crate::value::Value;

    fn db() -> Sqlify<RecordingConnection> {
        Sqlify::new(RecordingConnection::new())
    }

    #[tokio::test]
    async fn sql_compiles_and_binds() {
        let db = db();
        let exec = db
            .sql(&Template::new("SELECT * FROM ").raw("users").text(" WHERE id = $(id):integer"))
            .unwrap();
        exec.invoke(&args! { "id" => 1 }).await.unwrap();
        assert_eq!(
            db.connection().last_call(),
            (
                "SELECT * FROM users WHERE id = $1".to_string(),
                vec![Value::Int(1)]
            )
        );
    }

    #[test]
    fn unknown_type_tag_is_a_template_error() {
        let err = db().query("SELECT $(x):money").unwrap_err();
        assert!(matches!(err, SqlifyError::Template(_)));
    }

    #[test]
    fn sql_text_is_classified() {
        let db = db();
        let loaded = db
            .from_sql_text("CREATE TABLE users (id int, name text)", "users")
            .unwrap();
        let model = loaded.into_model().unwrap();
        assert_eq!(model.entity().fields.len(), 2);

        let loaded = db.from_sql_text("SELECT * FROM users", "all_users").unwrap();
        let exec = loaded.into_query().unwrap();
        assert_eq!(exec.tag(), Some("all_users"));
    }

    #[test]
    fn tag_prefix_applies_to_executors() {
        let db = db().with_config(SqlifyConfig::new().tag_prefix("reports"));
        let exec = db.query("SELECT 1").unwrap();
        assert_eq!(exec.tag(), Some("reports"));
        let named = db.bind(CompiledTemplate::parse("SELECT 1").unwrap(), Some("daily"));
        assert_eq!(named.tag(), Some("reports.daily"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = db().from_file("/nonexistent/dir/users.sql").unwrap_err();
        assert!(matches!(err, SqlifyError::Io { .. }));
        assert!(err.to_string().contains("users.sql"));
    }
}
