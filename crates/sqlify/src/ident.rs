//! SQL identifiers spliced into generated model statements.
//!
//! Table names come from schema text and column names from argument bag keys.
//! Neither can be bound as a parameter, so each one is checked here before it
//! reaches `INSERT`/`UPDATE`/`DELETE` text. A name is a dot-separated list of
//! parts. A bare part matches `[A-Za-z_][A-Za-z0-9_$]*`; a quoted part is any
//! non-empty text between double quotes, with `""` standing for one quote.

use crate::error::{SqlifyError, SqlifyResult};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentPart {
    Bare(String),
    Quoted(String),
}

impl IdentPart {
    pub fn as_str(&self) -> &str {
        match self {
            IdentPart::Bare(s) | IdentPart::Quoted(s) => s,
        }
    }
}

/// A validated, possibly schema-qualified identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    parts: Vec<IdentPart>,
}

impl Ident {
    pub fn parse(s: &str) -> SqlifyResult<Self> {
        let invalid = |why: &str| SqlifyError::validation(format!("Invalid identifier '{s}': {why}"));

        if s.is_empty() {
            return Err(invalid("empty"));
        }
        if s.contains('\0') {
            return Err(invalid("contains NUL"));
        }

        split_parts(s)
            .map_err(invalid)?
            .into_iter()
            .map(|raw| parse_part(raw).map_err(invalid))
            .collect::<SqlifyResult<Vec<_>>>()
            .map(|parts| Self { parts })
    }

    pub fn parts(&self) -> &[IdentPart] {
        &self.parts
    }

    /// The unqualified name (`users` for `public."users"`).
    pub fn name(&self) -> &str {
        self.parts.last().map_or("", IdentPart::as_str)
    }
}

/// Split on dots that are not inside a quoted part.
fn split_parts(s: &str) -> Result<Vec<&str>, &'static str> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    for (i, c) in s.char_indices() {
        match c {
            '"' => quoted = !quoted,
            '.' if !quoted => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if quoted {
        return Err("unclosed quote");
    }
    parts.push(&s[start..]);
    Ok(parts)
}

fn parse_part(raw: &str) -> Result<IdentPart, &'static str> {
    if raw.is_empty() {
        return Err("empty part");
    }

    if let Some(body) = raw.strip_prefix('"') {
        let inner = body.strip_suffix('"').ok_or("text after closing quote")?;
        if inner.is_empty() {
            return Err("empty quoted part");
        }
        // A lone quote inside means the part closed early and continued.
        if inner.replace("\"\"", "").contains('"') {
            return Err("text after closing quote");
        }
        return Ok(IdentPart::Quoted(inner.replace("\"\"", "\"")));
    }

    let mut chars = raw.chars();
    let first_ok = chars
        .next()
        .is_some_and(|c| c == '_' || c.is_ascii_alphabetic());
    let rest_ok = chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric());
    if first_ok && rest_ok {
        Ok(IdentPart::Bare(raw.to_string()))
    } else {
        Err("unexpected character")
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sep = "";
        for part in &self.parts {
            f.write_str(sep)?;
            sep = ".";
            match part {
                IdentPart::Bare(s) => f.write_str(s)?,
                IdentPart::Quoted(s) => write!(f, "\"{}\"", s.replace('"', "\"\""))?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_and_qualified_names() {
        let ident = Ident::parse("public.users").unwrap();
        assert_eq!(ident.to_string(), "public.users");
        assert_eq!(ident.name(), "users");
        assert_eq!(ident.parts().len(), 2);
        assert_eq!(Ident::parse("_tmp$1").unwrap().name(), "_tmp$1");
    }

    #[test]
    fn quoted_parts_round_trip() {
        let ident = Ident::parse(r#"app."Order Items""#).unwrap();
        assert_eq!(ident.name(), "Order Items");
        assert_eq!(ident.to_string(), r#"app."Order Items""#);

        let ident = Ident::parse(r#""say ""hi""".x"#).unwrap();
        assert_eq!(ident.parts()[0].as_str(), r#"say "hi""#);
        assert_eq!(ident.to_string(), r#""say ""hi""".x"#);

        assert_eq!(Ident::parse(r#""a.b""#).unwrap().parts().len(), 1);
    }

    #[test]
    fn rejects_text_that_could_escape_the_statement() {
        for bad in [
            "users; DROP TABLE users",
            "name) VALUES (1); --",
            "a b",
            r#""x"y"#,
            r#""x"y""#,
        ] {
            assert!(Ident::parse(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn rejects_malformed_names() {
        for bad in ["", "1st", "a..b", "a.", ".a", r#""open"#, r#""""#, "a\0b"] {
            let err = Ident::parse(bad).unwrap_err();
            assert!(matches!(err, SqlifyError::Validation(_)), "{bad:?}");
        }
    }
}
