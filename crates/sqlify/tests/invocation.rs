use sqlify::{Args, Connection, Loaded, Sqlify, SqlifyError, SqlifyResult, Template, Value, args};
use std::sync::Mutex;

/// Collaborator that records calls and returns the bound values as one row.
#[derive(Default)]
struct Recorder {
    calls: Mutex<Vec<(String, Vec<Value>)>>,
}

impl Recorder {
    fn calls(&self) -> Vec<(String, Vec<Value>)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Connection for Recorder {
    type Row = Vec<Value>;

    async fn query(&self, sql: &str, params: &[Value]) -> SqlifyResult<Vec<Vec<Value>>> {
        self.calls
            .lock()
            .unwrap()
            .push((sql.to_string(), params.to_vec()));
        Ok(vec![params.to_vec()])
    }
}

#[tokio::test]
async fn placeholder_round_trip() -> SqlifyResult<()> {
    let db = Sqlify::new(Recorder::default());
    let find = db.query("SELECT * FROM t WHERE id = $(id):integer")?;

    let rows = find.invoke(&args! { "id" => 1 }).await?;
    assert_eq!(rows, vec![vec![Value::Int(1)]]);
    assert_eq!(
        db.connection().calls(),
        vec![("SELECT * FROM t WHERE id = $1".to_string(), vec![Value::Int(1)])]
    );
    Ok(())
}

#[tokio::test]
async fn plain_text_passes_through() -> SqlifyResult<()> {
    let db = Sqlify::new(Recorder::default());
    let exec = db.sql(&Template::new("SELECT now()"))?;
    assert_eq!(exec.template().param_count(), 0);

    exec.invoke(None).await?;
    assert_eq!(
        db.connection().calls(),
        vec![("SELECT now()".to_string(), Vec::new())]
    );
    Ok(())
}

#[tokio::test]
async fn transformer_and_named_placeholders_interleave() -> SqlifyResult<()> {
    let db = Sqlify::new(Recorder::default());
    let exec = db.sql(
        &Template::new("SELECT * FROM orders WHERE user_id = $(user_id):integer AND status = ")
            .transform(|a: &Args| match a.get("archived") {
                Some(Value::Bool(true)) => "archived",
                _ => "open",
            })
            .text(" AND total > $(min):float"),
    )?;

    exec.invoke(&args! { "user_id" => 5, "min" => 9.5, "archived" => true })
        .await?;

    let (sql, values) = db.connection().calls().remove(0);
    assert_eq!(
        sql,
        "SELECT * FROM orders WHERE user_id = $1 AND status = $2 AND total > $3"
    );
    assert_eq!(
        values,
        vec![Value::Int(5), Value::Text("archived".into()), Value::Float(9.5)]
    );
    Ok(())
}

#[tokio::test]
async fn failures_never_reach_the_connection() {
    let db = Sqlify::new(Recorder::default());
    let exec = db
        .query("UPDATE t SET data = $(payload):json, flag = $(flag):boolean WHERE id = $(id):integer")
        .unwrap();

    let err = exec
        .invoke(&args! { "payload" => "{}", "flag" => true })
        .await
        .unwrap_err();
    assert!(matches!(err, SqlifyError::MissingParameter { ref name } if name == "id"));

    let err = exec
        .invoke(&args! { "payload" => "{}", "flag" => "true", "id" => 1 })
        .await
        .unwrap_err();
    assert!(err.is_type_validation());

    let err = exec
        .invoke(&args! { "payload" => "{not json", "flag" => true, "id" => 1 })
        .await
        .unwrap_err();
    assert!(err.is_malformed_json());

    assert!(db.connection().calls().is_empty());
}

#[tokio::test]
async fn schema_file_loads_as_model() -> SqlifyResult<()> {
    let dir = std::env::temp_dir().join(format!("sqlify-loader-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    let schema = dir.join("accounts.sql");
    let query = dir.join("active_accounts.sql");
    std::fs::write(
        &schema,
        "CREATE TABLE accounts (\n  id bigserial PRIMARY KEY,\n  owner text NOT NULL,\n  balance numeric(12, 2)\n);\n",
    )
    .unwrap();
    std::fs::write(&query, "SELECT * FROM accounts WHERE balance > $(min):float").unwrap();

    let db = Sqlify::new(Recorder::default());

    let Loaded::Model(accounts) = db.from_file(&schema)? else {
        panic!("expected a model");
    };
    assert_eq!(accounts.entity().name, "accounts");
    accounts.update(1, &args! { "balance" => 10 }).await?;

    let Loaded::Query(active) = db.from_file(&query)? else {
        panic!("expected a query");
    };
    assert_eq!(active.tag(), Some("active_accounts"));
    active.invoke(&args! { "min" => 0 }).await?;

    let calls = db.connection().calls();
    assert_eq!(
        calls[0].0,
        "UPDATE accounts SET balance = $2 WHERE id = $1 RETURNING *"
    );
    assert_eq!(calls[1].1, vec![Value::Int(0)]);

    std::fs::remove_dir_all(&dir).unwrap();
    Ok(())
}
