//! CRUD helpers generated from an [`Entity`].
//!
//! `find` and `find_one` are ordinary [`Executor`]s compiled once per model.
//! `create`, `update` and `delete` build their statement per call, because the
//! column list depends on the argument bag. Keys are validated as SQL
//! identifiers before they reach the text; values are always bound.

use crate::client::Connection;
use crate::config::SqlifyConfig;
use crate::error::{SqlifyError, SqlifyResult};
use crate::executor::{Executor, validate};
use crate::ident::Ident;
use crate::monitor::CompositeHook;
use crate::schema::Entity;
use crate::template::{CompiledTemplate, Param, ParamType};
use crate::value::{Args, Value};
use std::sync::Arc;

/// Query helpers for one table or view.
pub struct Model<C> {
    entity: Entity,
    table: Ident,
    primary_key: Ident,
    primary_key_type: ParamType,
    conn: Arc<C>,
    hooks: CompositeHook,
    tags: Tags,
    find: Executor<C>,
    find_one: Executor<C>,
}

struct Tags {
    create: String,
    update: String,
    delete: String,
}

impl<C> std::fmt::Debug for Model<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("entity", &self.entity)
            .field("table", &self.table.to_string())
            .field("primary_key", &self.primary_key.to_string())
            .finish()
    }
}

impl<C: Connection> Model<C> {
    /// Build a model with the default configuration.
    pub fn new(conn: Arc<C>, entity: Entity) -> SqlifyResult<Self> {
        Self::with_config(conn, entity, &SqlifyConfig::default())
    }

    pub fn with_config(conn: Arc<C>, entity: Entity, config: &SqlifyConfig) -> SqlifyResult<Self> {
        let table = Ident::parse(&entity.name)?;
        let primary_key = Ident::parse(&config.primary_key)?;
        let pk_name = config.primary_key.as_str();
        if !pk_name.chars().all(|c| c == '_' || c.is_ascii_alphanumeric()) {
            return Err(SqlifyError::validation(format!(
                "Primary key '{pk_name}' cannot be used as a placeholder name"
            )));
        }

        let hooks = config.hooks();
        let tag = |op: &str| config.tag_for(&format!("{}.{op}", entity.name));

        let find = Executor::new(
            Arc::clone(&conn),
            CompiledTemplate::parse(format!("SELECT * FROM {table}"))?,
        )
        .with_hooks(hooks.clone())
        .tagged(tag("find"));

        let find_one = Executor::new(
            Arc::clone(&conn),
            CompiledTemplate::parse(format!(
                "SELECT * FROM {table} WHERE {primary_key} = $({pk_name}):{} LIMIT 1",
                config.primary_key_type
            ))?,
        )
        .with_hooks(hooks.clone())
        .tagged(tag("find_one"));

        let tags = Tags {
            create: tag("create"),
            update: tag("update"),
            delete: tag("delete"),
        };

        Ok(Self {
            entity,
            table,
            primary_key,
            primary_key_type: config.primary_key_type,
            conn,
            hooks,
            tags,
            find,
            find_one,
        })
    }

    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// `SELECT * FROM <table>`
    pub fn find(&self) -> &Executor<C> {
        &self.find
    }

    /// `SELECT * FROM <table> WHERE <pk> = $(<pk>) LIMIT 1`
    pub fn find_one(&self) -> &Executor<C> {
        &self.find_one
    }

    /// Insert one row with the columns named by `data` and return it.
    ///
    /// An empty bag inserts `DEFAULT VALUES`.
    pub async fn create(&self, data: &Args) -> SqlifyResult<Vec<C::Row>> {
        let columns = self.columns(data)?;

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES RETURNING *", self.table)
        } else {
            let names = columns
                .iter()
                .map(|(ident, _, _)| ident.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            let markers = (1..=columns.len())
                .map(|i| format!("${i}"))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "INSERT INTO {} ({names}) VALUES ({markers}) RETURNING *",
                self.table
            )
        };

        let (params, values): (Vec<Param>, Vec<Value>) = columns
            .into_iter()
            .map(|(_, param, value)| (param, value))
            .unzip();
        self.run(&self.tags.create, sql, params, values).await
    }

    /// Update the row whose primary key equals `id`; the key binds to `$1`.
    pub async fn update(&self, id: impl Into<Value>, data: &Args) -> SqlifyResult<Vec<C::Row>> {
        let columns = self.columns(data)?;
        if columns.is_empty() {
            return Err(SqlifyError::validation(format!(
                "Update of {} requires at least one column",
                self.entity.name
            )));
        }

        let assignments = columns
            .iter()
            .enumerate()
            .map(|(i, (ident, _, _))| format!("{ident} = ${}", i + 2))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = $1 RETURNING *",
            self.table, self.primary_key
        );

        let (pk_param, pk_value) = self.key(id.into())?;
        let mut params = vec![pk_param];
        let mut values = vec![pk_value];
        for (_, param, value) in columns {
            params.push(param);
            values.push(value);
        }
        self.run(&self.tags.update, sql, params, values).await
    }

    /// Delete the row whose primary key equals `id`.
    pub async fn delete(&self, id: impl Into<Value>) -> SqlifyResult<Vec<C::Row>> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1",
            self.table, self.primary_key
        );
        let (param, value) = self.key(id.into())?;
        self.run(&self.tags.delete, sql, vec![param], vec![value])
            .await
    }

    fn key(&self, id: Value) -> SqlifyResult<(Param, Value)> {
        let name = self.primary_key.name();
        validate(name, self.primary_key_type, &id)?;
        Ok((Param::named(name, self.primary_key_type), id))
    }

    /// Validated `(column, descriptor, value)` triples in bag order.
    ///
    /// Values for known columns are checked against the column type; nulls
    /// are left to the database.
    fn columns(&self, data: &Args) -> SqlifyResult<Vec<(Ident, Param, Value)>> {
        data.iter()
            .map(|(name, value)| {
                let ident = Ident::parse(name)?;
                let ty = match self.entity.field(name) {
                    Some(field) => field.ty.param_type(),
                    None => {
                        tracing::warn!(
                            target: "sqlify.model",
                            entity = %self.entity.name,
                            column = name,
                            "column is not declared by the entity"
                        );
                        None
                    }
                };
                let ty = ty.unwrap_or_default();
                if !value.is_null() {
                    validate(name, ty, value)?;
                }
                Ok((ident, Param::named(name, ty), value.clone()))
            })
            .collect()
    }

    async fn run(
        &self,
        tag: &str,
        sql: String,
        params: Vec<Param>,
        values: Vec<Value>,
    ) -> SqlifyResult<Vec<C::Row>> {
        let template = CompiledTemplate { text: sql, params };
        Executor::new(Arc::clone(&self.conn), template)
            .with_hooks(self.hooks.clone())
            .tagged(tag)
            .execute(values)
            .await
    }
}
