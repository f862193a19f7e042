mod cli;
mod compile;
mod config;
mod render;
mod run;
mod schema;

use tracing_subscriber::EnvFilter;

pub async fn run(args: Vec<String>) -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Compile(args) => {
            init_logging(&config::LogConfig::default());
            compile::run(args)
        }
        cli::Command::Schema(args) => {
            init_logging(&config::LogConfig::default());
            schema::run(args)
        }
        cli::Command::Run(args) => {
            let config = config::ConfigFile::load(&args.config, args.config_required)?;
            init_logging(&config.log);
            run::run(args, &config).await
        }
    }
}

/// `RUST_LOG` wins over the configured level.
fn init_logging(log: &config::LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(log)));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Filter directives used when `RUST_LOG` is unset. `[log] sql` lets the
/// statement events through whatever the base level is.
fn default_filter(log: &config::LogConfig) -> String {
    if log.sql {
        format!("{},sqlify.sql=debug", log.level)
    } else {
        log.level.clone()
    }
}
