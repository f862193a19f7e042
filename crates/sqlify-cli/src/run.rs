use crate::cli::RunArgs;
use crate::config::ConfigFile;
use crate::render;
use colored::Colorize;
use sqlify::{Args, Loaded, Sqlify, SqlifyConfig, Value};
use tokio_postgres::NoTls;

pub async fn run(args: RunArgs, config: &ConfigFile) -> anyhow::Result<()> {
    let database_url = args
        .database
        .clone()
        .or_else(|| config.database.url.clone())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| {
            anyhow::anyhow!("no database url: pass --database, set database.url or DATABASE_URL")
        })?;

    let (client, connection) = tokio_postgres::connect(&database_url, NoTls)
        .await
        .map_err(|e| anyhow::anyhow!("failed to connect to database: {e}"))?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!(target: "sqlify.cli", error = %e, "connection error");
        }
    });

    let mut sqlify_config = SqlifyConfig::new().tag_prefix("cli");
    if config.log.sql {
        sqlify_config = sqlify_config.enable_logging();
    }
    let db = Sqlify::new(client).with_config(sqlify_config);

    let bag: Args = args
        .args
        .iter()
        .map(|(name, raw)| (name.clone(), parse_value(raw)))
        .collect();

    let rows = match db.from_file(&args.file)? {
        Loaded::Query(exec) => {
            tracing::debug!(target: "sqlify.cli", sql = exec.text(), "running query");
            exec.invoke(&bag).await?
        }
        Loaded::Model(model) => {
            tracing::debug!(target: "sqlify.cli", entity = %model.entity().name, "listing rows");
            model.find().invoke(None).await?
        }
    };

    match render::rows_table(&rows) {
        Some(table) => println!("{table}"),
        None => println!("{}", "(no rows)".dimmed()),
    }
    println!("{} {} row(s)", "OK".green().bold(), rows.len());
    Ok(())
}

/// JSON literals become typed values; anything else is text.
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::String(_)) | Err(_) => Value::Text(raw.to_string()),
        Ok(json) => Value::from_json(json),
    }
}
