use super::param::{Embedded, Param, ParamType, Transformer};
use super::CompiledTemplate;
use crate::error::{SqlifyError, SqlifyResult};
use std::fmt::Write as _;
use std::sync::OnceLock;

// Transformers are emitted as NUL-delimited sentinels so they can never be
// confused with text that a caller typed into a fragment.
const SENTINEL_PREFIX: &str = "\u{0}sqlify:";
const SENTINEL_SUFFIX: char = '\u{0}';

fn placeholder_regex() -> &'static regex::Regex {
    static PLACEHOLDER_RE: OnceLock<regex::Regex> = OnceLock::new();
    PLACEHOLDER_RE.get_or_init(|| {
        regex::Regex::new(r"\$\(([\w.]+)\)(?::(\w+))?|\x00sqlify:(\d+)\x00")
            .expect("invalid built-in placeholder regex")
    })
}

/// Compile literal fragments interleaved with embedded values.
///
/// `fragments` must contain exactly one more element than `embedded`.
///
/// # Example
///
/// ```ignore
/// let t = compile(&["SELECT * FROM ", " WHERE id = $(id):integer"], vec![Embedded::raw("users")])?;
/// assert_eq!(t.text(), "SELECT * FROM users WHERE id = $1");
/// ```
pub fn compile<S: AsRef<str>>(
    fragments: &[S],
    embedded: Vec<Embedded>,
) -> SqlifyResult<CompiledTemplate> {
    if fragments.len() != embedded.len() + 1 {
        return Err(SqlifyError::template(format!(
            "expected {} fragments for {} embedded values, got {}",
            embedded.len() + 1,
            embedded.len(),
            fragments.len()
        )));
    }

    let (assembled, transformers) = assemble(fragments, embedded);
    let compiled = Scanner::new(transformers).scan(&assembled)?;

    tracing::trace!(
        target: "sqlify.template",
        param_count = compiled.params.len(),
        sql = %compiled.text,
        "compiled template"
    );
    Ok(compiled)
}

/// Pass one: splice raw values, replace transformers with numbered sentinels.
fn assemble<S: AsRef<str>>(
    fragments: &[S],
    embedded: Vec<Embedded>,
) -> (String, Vec<Option<Transformer>>) {
    let cap = fragments.iter().map(|f| f.as_ref().len()).sum::<usize>() + embedded.len() * 16;
    let mut out = String::with_capacity(cap);
    let mut transformers = Vec::new();

    for (fragment, value) in fragments.iter().zip(embedded) {
        out.push_str(fragment.as_ref());
        match value {
            Embedded::Raw(v) => {
                let _ = write!(out, "{v}");
            }
            Embedded::Transformer(t) => {
                let _ = write!(out, "{SENTINEL_PREFIX}{}{SENTINEL_SUFFIX}", transformers.len());
                transformers.push(Some(t));
            }
        }
    }
    if let Some(last) = fragments.last() {
        out.push_str(last.as_ref());
    }
    (out, transformers)
}

/// Pass two: one left-to-right scan assigning `$n` markers.
///
/// Every match appends its descriptor at the moment its marker is assigned,
/// so descriptor `i` always belongs to marker `$i+1`.
struct Scanner {
    transformers: Vec<Option<Transformer>>,
    params: Vec<Param>,
}

impl Scanner {
    fn new(transformers: Vec<Option<Transformer>>) -> Self {
        Self {
            transformers,
            params: Vec::new(),
        }
    }

    fn scan(mut self, assembled: &str) -> SqlifyResult<CompiledTemplate> {
        let mut text = String::with_capacity(assembled.len());
        let mut last = 0;

        for caps in placeholder_regex().captures_iter(assembled) {
            let Some(whole) = caps.get(0) else { continue };
            text.push_str(&assembled[last..whole.start()]);
            last = whole.end();

            let param = match (caps.get(1), caps.get(3)) {
                (Some(name), _) => {
                    let ty = match caps.get(2) {
                        Some(tag) => tag.as_str().parse::<ParamType>()?,
                        None => ParamType::default(),
                    };
                    Param::named(name.as_str(), ty)
                }
                (None, Some(slot)) => self.take_transformer(slot.as_str())?,
                (None, None) => continue,
            };
            self.params.push(param);
            let _ = write!(text, "${}", self.params.len());
        }
        text.push_str(&assembled[last..]);

        if self.transformers.iter().any(Option::is_some) {
            return Err(SqlifyError::template(
                "a transformer placeholder was lost while compiling",
            ));
        }

        Ok(CompiledTemplate {
            text,
            params: self.params,
        })
    }

    fn take_transformer(&mut self, slot: &str) -> SqlifyResult<Param> {
        let index: usize = slot
            .parse()
            .map_err(|_| SqlifyError::template(format!("invalid transformer slot '{slot}'")))?;
        let transformer = self
            .transformers
            .get_mut(index)
            .and_then(Option::take)
            .ok_or_else(|| {
                SqlifyError::template(format!(
                    "transformer slot {index} is unknown or referenced twice"
                ))
            })?;
        Ok(Param::transformer(index, transformer))
    }
}
