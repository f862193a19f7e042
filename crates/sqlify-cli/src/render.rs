use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use comfy_table::{Attribute, Cell, ContentArrangement, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tokio_postgres::types::{FromSql, Type};

pub fn table(headers: &[&str]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(
            headers
                .iter()
                .map(|h| Cell::new(h).add_attribute(Attribute::Bold)),
        );
    table
}

pub fn rows_table(rows: &[Row]) -> Option<Table> {
    let first = rows.first()?;
    let headers: Vec<&str> = first.columns().iter().map(|c| c.name()).collect();
    let mut table = table(&headers);
    for row in rows {
        table.add_row((0..row.len()).map(|i| Cell::new(cell_text(row, i))));
    }
    Some(table)
}

fn get<'a, T>(row: &'a Row, idx: usize) -> String
where
    T: FromSql<'a> + ToString,
{
    match row.try_get::<_, Option<T>>(idx) {
        Ok(Some(v)) => v.to_string(),
        Ok(None) => "NULL".to_string(),
        Err(_) => "?".to_string(),
    }
}

/// Best-effort text for a cell; unsupported types show their type name.
fn cell_text(row: &Row, idx: usize) -> String {
    let ty = row.columns()[idx].type_();
    match *ty {
        Type::BOOL => get::<bool>(row, idx),
        Type::INT2 => get::<i16>(row, idx),
        Type::INT4 => get::<i32>(row, idx),
        Type::INT8 => get::<i64>(row, idx),
        Type::FLOAT4 => get::<f32>(row, idx),
        Type::FLOAT8 => get::<f64>(row, idx),
        Type::NUMERIC => get::<Decimal>(row, idx),
        Type::TEXT | Type::VARCHAR | Type::BPCHAR | Type::NAME => get::<String>(row, idx),
        Type::DATE => get::<NaiveDate>(row, idx),
        Type::TIMESTAMP => get::<NaiveDateTime>(row, idx),
        Type::TIMESTAMPTZ => get::<DateTime<Utc>>(row, idx),
        Type::JSON | Type::JSONB => get::<serde_json::Value>(row, idx),
        _ => format!("<{}>", ty.name()),
    }
}
