use crate::cli::CompileArgs;
use crate::render;
use colored::Colorize;
use comfy_table::Cell;
use sqlify::{CompiledTemplate, is_schema};

pub fn run(args: CompileArgs) -> anyhow::Result<()> {
    let text = read_sql(&args.file)?;
    if is_schema(&text) {
        eprintln!(
            "{} {} looks like a schema; see `sqlify schema` for its entity",
            "note:".yellow().bold(),
            args.file.display()
        );
    }

    let compiled = CompiledTemplate::parse(&text)?;
    println!("{}", compiled.text().trim());

    if compiled.param_count() == 0 {
        println!("\n{}", "(no parameters)".dimmed());
        return Ok(());
    }

    let mut table = render::table(&["Marker", "Name", "Type"]);
    for (i, param) in compiled.params().iter().enumerate() {
        table.add_row(vec![
            Cell::new(format!("${}", i + 1)),
            Cell::new(&param.name),
            Cell::new(param.ty.as_str()),
        ]);
    }
    println!("\n{table}");
    Ok(())
}

pub(crate) fn read_sql(path: &std::path::Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))
}
