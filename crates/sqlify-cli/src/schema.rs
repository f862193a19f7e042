use crate::cli::SchemaArgs;
use crate::compile::read_sql;
use crate::render;
use colored::Colorize;
use comfy_table::Cell;
use sqlify::parse_entity;

pub fn run(args: SchemaArgs) -> anyhow::Result<()> {
    let text = read_sql(&args.file)?;
    let fallback = args
        .file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let entity = parse_entity(&text, fallback)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&entity)?);
        return Ok(());
    }

    println!(
        "{} {} ({:?})",
        "Entity:".cyan().bold(),
        entity.name,
        entity.kind
    );
    if entity.fields.is_empty() {
        println!("{}", "(no fields found)".dimmed());
        return Ok(());
    }

    let mut table = render::table(&["Field", "SQL type", "Type"]);
    for field in &entity.fields {
        let ty = match field.ty.param_type() {
            Some(ty) => ty.as_str().to_string(),
            None => "unknown".to_string(),
        };
        table.add_row(vec![
            Cell::new(&field.name),
            Cell::new(&field.sql_type),
            Cell::new(ty),
        ]);
    }
    println!("{table}");
    Ok(())
}
