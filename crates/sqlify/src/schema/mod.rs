//! Schema-to-entity mapping.
//!
//! Extracts a best-effort [`Entity`] (name, kind, ordered fields) from a
//! `CREATE TABLE` or `CREATE VIEW` statement. This is not a SQL parser:
//! table columns come from a `(name, type)` scan of each top-level definition
//! in the body, view columns from the select list.

mod types;

#[cfg(test)]
mod tests;

pub use types::{FieldType, normalize_sql_type};

use crate::error::{SqlifyError, SqlifyResult};
use regex::Regex;
use serde::Serialize;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Table,
    View,
}

/// A column of an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Field {
    pub name: String,
    /// Declared SQL type as written (empty for view columns).
    pub sql_type: String,
    pub ty: FieldType,
}

/// Table or view described by a schema statement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    pub fields: Vec<Field>,
}

impl Entity {
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field(name).is_some()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|f| f.name.as_str())
    }
}

fn create_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r#"(?is)\bcreate\s+(?:or\s+replace\s+)?(?:(?:temp|temporary|unlogged|materialized)\s+)?(table|view)\b(?:\s+if\s+not\s+exists)?(?:\s+([\w."$]+))?"#,
        )
        .expect("invalid built-in schema regex")
    })
}

fn alias_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)\s+as\s+("(?:[^"]|"")+"|[\w$]+)\s*$"#)
            .expect("invalid built-in alias regex")
    })
}

fn column_ref_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(?:(?:"(?:[^"]|"")+"|[\w$]+)\.)*("(?:[^"]|"")+"|[\w$]+)$"#)
            .expect("invalid built-in column regex")
    })
}

/// Keywords that start a table-level constraint rather than a column.
const CONSTRAINT_KEYWORDS: &[&str] = &[
    "PRIMARY",
    "UNIQUE",
    "CONSTRAINT",
    "FOREIGN",
    "CHECK",
    "EXCLUDE",
    "LIKE",
];

/// Keywords that end the type phrase of a column definition.
const COLUMN_OPTION_KEYWORDS: &[&str] = &[
    "NOT",
    "NULL",
    "DEFAULT",
    "PRIMARY",
    "REFERENCES",
    "UNIQUE",
    "CHECK",
    "CONSTRAINT",
    "GENERATED",
    "COLLATE",
];

/// Whether `text` contains a `CREATE TABLE` or `CREATE VIEW` statement.
pub fn is_schema(text: &str) -> bool {
    create_regex().is_match(text)
}

/// Extract the entity described by the first `CREATE TABLE`/`CREATE VIEW`
/// statement in `text`.
///
/// `fallback_name` names the entity when the statement does not.
pub fn parse_entity(text: &str, fallback_name: &str) -> SqlifyResult<Entity> {
    let caps = create_regex().captures(text).ok_or_else(|| {
        SqlifyError::validation("No CREATE TABLE or CREATE VIEW statement found")
    })?;

    let kind = match caps.get(1).map(|m| m.as_str().to_ascii_lowercase()) {
        Some(k) if k == "view" => EntityKind::View,
        _ => EntityKind::Table,
    };
    let name = caps
        .get(2)
        .map(|m| m.as_str().to_string())
        .filter(|n| !n.is_empty())
        .unwrap_or_else(|| fallback_name.to_string());
    if name.is_empty() {
        return Err(SqlifyError::validation("Entity name could not be determined"));
    }

    let rest = caps.get(0).map_or("", |m| &text[m.end()..]);
    let fields = match kind {
        EntityKind::Table => table_fields(rest),
        EntityKind::View => view_fields(rest),
    };

    tracing::debug!(
        target: "sqlify.schema",
        entity = %name,
        kind = ?kind,
        fields = fields.len(),
        "parsed schema"
    );

    Ok(Entity { name, kind, fields })
}

fn table_fields(rest: &str) -> Vec<Field> {
    let Some(body) = paren_body(rest) else {
        return Vec::new();
    };

    let mut fields: Vec<Field> = Vec::new();
    for def in split_top_level(body) {
        let Some((name, rest)) = split_column_name(def) else {
            continue;
        };
        if is_keyword(name, CONSTRAINT_KEYWORDS) {
            continue;
        }
        let mut tokens = rest.split_whitespace();
        let Some(first_type) = tokens.next() else {
            continue;
        };

        let mut type_words = vec![first_type];
        type_words.extend(tokens.take_while(|t| !is_keyword(t, COLUMN_OPTION_KEYWORDS)));
        let sql_type = type_words.join(" ");

        let name = unquote(name);
        if fields.iter().any(|f| f.name == name) {
            continue;
        }
        fields.push(Field {
            ty: FieldType::from_sql_type(&sql_type),
            name,
            sql_type,
        });
    }
    fields
}

fn view_fields(rest: &str) -> Vec<Field> {
    let Some(select_at) = find_keyword(rest, "SELECT") else {
        return Vec::new();
    };
    let mut list = &rest[select_at + "SELECT".len()..];
    if let Some(distinct_at) = find_keyword(list, "DISTINCT")
        && list[..distinct_at].trim().is_empty()
    {
        list = &list[distinct_at + "DISTINCT".len()..];
    }
    if let Some(from_at) = find_keyword(list, "FROM") {
        list = &list[..from_at];
    }

    let mut fields: Vec<Field> = Vec::new();
    for item in split_top_level(list) {
        let name = if let Some(caps) = alias_regex().captures(item) {
            caps.get(1).map(|m| unquote(m.as_str()))
        } else {
            column_ref_regex()
                .captures(item)
                .and_then(|caps| caps.get(1))
                .map(|m| unquote(m.as_str()))
        };
        let Some(name) = name else {
            continue;
        };
        if fields.iter().any(|f| f.name == name) {
            continue;
        }
        fields.push(Field {
            name,
            sql_type: String::new(),
            ty: FieldType::Unknown,
        });
    }
    fields
}

fn is_keyword(token: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| token.eq_ignore_ascii_case(k))
}

/// Leading (possibly quoted) column name and the remainder of the definition.
fn split_column_name(def: &str) -> Option<(&str, &str)> {
    if let Some(quoted) = def.strip_prefix('"') {
        let mut chars = quoted.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '"' {
                continue;
            }
            if chars.peek().map(|&(_, n)| n) == Some('"') {
                chars.next();
                continue;
            }
            return Some((&def[..i + 2], &quoted[i + 1..]));
        }
        return None;
    }
    let end = def.find(char::is_whitespace).unwrap_or(def.len());
    Some((&def[..end], &def[end..]))
}

fn unquote(s: &str) -> String {
    match s.strip_prefix('"').and_then(|s| s.strip_suffix('"')) {
        Some(inner) => inner.replace("\"\"", "\""),
        None => s.to_string(),
    }
}

/// Text between the first `(` and its matching `)`.
fn paren_body(s: &str) -> Option<&str> {
    let start = s.find('(')?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    for (i, c) in s[start..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => {
                depth -= 1;
                if depth == 0 {
                    return Some(&s[start + 1..start + i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split on commas outside parentheses and quotes; items are trimmed, empty ones dropped.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'' | '"') => quote = Some(c),
            (None, '(') => depth += 1,
            (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                items.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&s[start..]);
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .collect()
}

/// Byte offset of `keyword` as a whole word outside parentheses and quotes.
fn find_keyword(s: &str, keyword: &str) -> Option<usize> {
    let bytes = s.as_bytes();
    let is_word = |b: u8| b.is_ascii_alphanumeric() || b == b'_' || b == b'$';
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    for (i, &b) in bytes.iter().enumerate() {
        match (quote, b) {
            (Some(q), b) if b == q => quote = None,
            (Some(_), _) => {}
            (None, b'\'' | b'"') => quote = Some(b),
            (None, b'(') => depth += 1,
            (None, b')') => depth = depth.saturating_sub(1),
            (None, _) if depth == 0 => {
                let end = i + keyword.len();
                if end <= bytes.len()
                    && bytes[i..end].eq_ignore_ascii_case(keyword.as_bytes())
                    && (i == 0 || !is_word(bytes[i - 1]))
                    && (end == bytes.len() || !is_word(bytes[end]))
                {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}
