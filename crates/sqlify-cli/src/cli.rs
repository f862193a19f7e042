use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpTopic {
    Root,
    Compile,
    Schema,
    Run,
}

#[derive(Debug, Clone)]
pub enum Command {
    Help(HelpTopic),
    Compile(CompileArgs),
    Schema(SchemaArgs),
    Run(RunArgs),
}

#[derive(Debug, Clone)]
pub struct CompileArgs {
    pub file: PathBuf,
}

#[derive(Debug, Clone)]
pub struct SchemaArgs {
    pub file: PathBuf,
    pub json: bool,
}

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub file: PathBuf,
    pub config: PathBuf,
    /// Set when `--config` was given explicitly; a missing file is then an error.
    pub config_required: bool,
    pub database: Option<String>,
    pub args: Vec<(String, String)>,
}

pub fn parse_args(args: &[String]) -> anyhow::Result<Command> {
    let mut it = args.iter().skip(1).map(|s| s.as_str());
    let Some(first) = it.next() else {
        return Ok(Command::Help(HelpTopic::Root));
    };

    match first {
        "-h" | "--help" | "help" => Ok(Command::Help(match it.next() {
            None => HelpTopic::Root,
            Some("compile") => HelpTopic::Compile,
            Some("schema") => HelpTopic::Schema,
            Some("run") => HelpTopic::Run,
            Some(other) => anyhow::bail!("unknown command: {other}"),
        })),
        "compile" => parse_compile(it),
        "schema" => parse_schema(it),
        "run" => parse_run(it),
        _ => anyhow::bail!("unknown command: {first}"),
    }
}

fn parse_compile<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut file: Option<PathBuf> = None;

    for token in it {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Compile)),
            _ if token.starts_with('-') => anyhow::bail!("unknown option: {token}"),
            _ => set_file(&mut file, token)?,
        }
    }

    let Some(file) = file else {
        anyhow::bail!("compile requires a <FILE> argument");
    };
    Ok(Command::Compile(CompileArgs { file }))
}

fn parse_schema<'a>(it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut file: Option<PathBuf> = None;
    let mut json = false;

    for token in it {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Schema)),
            "--json" => json = true,
            _ if token.starts_with('-') => anyhow::bail!("unknown option: {token}"),
            _ => set_file(&mut file, token)?,
        }
    }

    let Some(file) = file else {
        anyhow::bail!("schema requires a <FILE> argument");
    };
    Ok(Command::Schema(SchemaArgs { file, json }))
}

fn parse_run<'a>(mut it: impl Iterator<Item = &'a str>) -> anyhow::Result<Command> {
    let mut file: Option<PathBuf> = None;
    let mut config = PathBuf::from("sqlify.toml");
    let mut config_required = false;
    let mut database: Option<String> = None;
    let mut args: Vec<(String, String)> = Vec::new();

    while let Some(token) = it.next() {
        match token {
            "-h" | "--help" => return Ok(Command::Help(HelpTopic::Run)),
            "--config" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--config requires a value");
                };
                config = PathBuf::from(v);
                config_required = true;
            }
            _ if token.starts_with("--config=") => {
                config = PathBuf::from(token.trim_start_matches("--config="));
                config_required = true;
            }
            "--database" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--database requires a value");
                };
                database = Some(v.to_string());
            }
            _ if token.starts_with("--database=") => {
                database = Some(token.trim_start_matches("--database=").to_string());
            }
            "--arg" => {
                let Some(v) = it.next() else {
                    anyhow::bail!("--arg requires a value");
                };
                args.push(parse_arg(v)?);
            }
            _ if token.starts_with("--arg=") => {
                args.push(parse_arg(token.trim_start_matches("--arg="))?);
            }
            _ if token.starts_with('-') => anyhow::bail!("unknown option: {token}"),
            _ => set_file(&mut file, token)?,
        }
    }

    let Some(file) = file else {
        anyhow::bail!("run requires a <FILE> argument");
    };
    Ok(Command::Run(RunArgs {
        file,
        config,
        config_required,
        database,
        args,
    }))
}

fn set_file(slot: &mut Option<PathBuf>, token: &str) -> anyhow::Result<()> {
    if let Some(existing) = slot {
        anyhow::bail!(
            "unexpected argument: {token} (file already set to {})",
            existing.display()
        );
    }
    *slot = Some(PathBuf::from(token));
    Ok(())
}

fn parse_arg(raw: &str) -> anyhow::Result<(String, String)> {
    let Some((name, value)) = raw.split_once('=') else {
        anyhow::bail!("--arg expects name=value, got: {raw}");
    };
    let name = name.trim();
    if name.is_empty() {
        anyhow::bail!("--arg name must not be empty: {raw}");
    }
    Ok((name.to_string(), value.to_string()))
}

pub fn print_help(topic: HelpTopic) {
    match topic {
        HelpTopic::Root => {
            println!(
                "\
sqlify - compile and run typed SQL templates

USAGE:
  sqlify <COMMAND> [OPTIONS]

COMMANDS:
  compile       Show the compiled text and parameters of a SQL file
  schema        Show the entity extracted from a CREATE TABLE/VIEW file
  run           Execute a SQL file against Postgres
  help          Print help

Run `sqlify <command> --help` for more."
            );
        }
        HelpTopic::Compile => {
            println!(
                "\
USAGE:
  sqlify compile <FILE>

Placeholders are written as $(name) or $(name):type, where type is one of
string, integer, float, boolean, date, json.

OPTIONS:
  -h, --help            Print help"
            );
        }
        HelpTopic::Schema => {
            println!(
                "\
USAGE:
  sqlify schema <FILE> [OPTIONS]

OPTIONS:
  --json                Print the entity as JSON
  -h, --help            Print help"
            );
        }
        HelpTopic::Run => {
            println!(
                "\
USAGE:
  sqlify run <FILE> [OPTIONS]

Schema files list the rows of their table or view.

OPTIONS:
  --config <FILE>       Config file path (default: sqlify.toml, optional)
  --database <URL>      Override database.url from config (falls back to DATABASE_URL)
  --arg <NAME=VALUE>    Argument for a placeholder; repeatable. JSON literals
                        (numbers, true/false, null, objects) are decoded, anything
                        else is passed as text
  -h, --help            Print help"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(parts: &[&str]) -> Vec<String> {
        std::iter::once("sqlify")
            .chain(parts.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn no_arguments_prints_root_help() {
        let cmd = parse_args(&argv(&[])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Root)));
    }

    #[test]
    fn help_for_command() {
        let cmd = parse_args(&argv(&["help", "run"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Run)));
        let cmd = parse_args(&argv(&["schema", "--help"])).unwrap();
        assert!(matches!(cmd, Command::Help(HelpTopic::Schema)));
    }

    #[test]
    fn parse_run_with_args() {
        let cmd = parse_args(&argv(&[
            "run",
            "queries/find_user.sql",
            "--database=postgres://localhost/app",
            "--arg",
            "id=1",
            "--arg=filter=a=b",
        ]))
        .unwrap();
        let Command::Run(run) = cmd else {
            panic!("expected run");
        };

        assert_eq!(run.file, PathBuf::from("queries/find_user.sql"));
        assert_eq!(run.config, PathBuf::from("sqlify.toml"));
        assert!(!run.config_required);
        assert_eq!(run.database.as_deref(), Some("postgres://localhost/app"));
        assert_eq!(
            run.args,
            vec![
                ("id".to_string(), "1".to_string()),
                ("filter".to_string(), "a=b".to_string()),
            ]
        );
    }

    #[test]
    fn parse_schema_json() {
        let Command::Schema(schema) = parse_args(&argv(&["schema", "users.sql", "--json"])).unwrap()
        else {
            panic!("expected schema");
        };
        assert!(schema.json);
    }

    #[test]
    fn rejects_bad_input() {
        assert!(parse_args(&argv(&["compile"])).is_err());
        assert!(parse_args(&argv(&["compile", "a.sql", "b.sql"])).is_err());
        assert!(parse_args(&argv(&["run", "a.sql", "--arg", "novalue"])).is_err());
        assert!(parse_args(&argv(&["run", "a.sql", "--database"])).is_err());
        assert!(parse_args(&argv(&["frobnicate"])).is_err());
    }
}
