use anyhow::Context as _;
use serde::Deserialize;
use std::path::Path;

/// Contents of `sqlify.toml`.
///
/// ```toml
/// [database]
/// url = "${DATABASE_URL}"
///
/// [log]
/// level = "debug"
/// sql = true
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogConfig {
    /// Default `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,
    /// Log every executed statement.
    #[serde(default)]
    pub sql: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            sql: false,
        }
    }
}

fn default_level() -> String {
    "warn".to_string()
}

impl ConfigFile {
    /// Load `path`. A missing file yields the defaults unless `required`.
    pub fn load(path: &Path, required: bool) -> anyhow::Result<Self> {
        if !required && !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        Self::parse(&raw).with_context(|| format!("invalid config {}", path.display()))
    }

    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        toml::from_str::<ConfigFile>(raw)?.resolve_env()?.check()
    }

    /// Substitute `${VAR}` references in the string settings.
    fn resolve_env(mut self) -> anyhow::Result<Self> {
        self.database.url = self.database.url.as_deref().map(expand_env_vars).transpose()?;
        self.log.level = expand_env_vars(&self.log.level)?;
        Ok(self)
    }

    fn check(self) -> anyhow::Result<Self> {
        if self.database.url.as_deref().is_some_and(|url| url.trim().is_empty()) {
            anyhow::bail!("[database] url is set but empty");
        }
        if self.log.level.trim().is_empty() {
            anyhow::bail!("[log] level is empty");
        }
        Ok(self)
    }
}

/// Replace `${NAME}` with the value of the environment variable `NAME`.
/// A `$` not followed by `{` is kept as is.
fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut expanded = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(open) = rest.find("${") {
        expanded.push_str(&rest[..open]);
        let reference = &rest[open + 2..];
        let Some(close) = reference.find('}') else {
            anyhow::bail!("unterminated `${{` in {input:?}");
        };
        let name = &reference[..close];
        if name.is_empty() {
            anyhow::bail!("empty `${{}}` in {input:?}");
        }
        match std::env::var(name) {
            Ok(value) => expanded.push_str(&value),
            Err(_) => anyhow::bail!("environment variable {name} is not set"),
        }
        rest = &reference[close + 1..];
    }

    expanded.push_str(rest);
    Ok(expanded)
}
