use anyhow::Result;
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use prepcall::app::{run_call_command, run_feedback_command, run_interviews_command};
use prepcall::cli::{Cli, Commands, ConfigAction};
use prepcall::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    log::debug!("prepcall {}", prepcall::version_string());

    match cli.command {
        Commands::Call(args) => {
            let config = load_config(cli.config.as_deref())?;
            if let Err(e) = run_call_command(config, args, cli.quiet).await {
                eprintln!("{} {}", "Error:".red(), e);
                std::process::exit(1);
            }
        }
        Commands::Feedback { action } => {
            let config = load_config(cli.config.as_deref())?;
            run_feedback_command(config, action).await?;
        }
        Commands::Interviews { action } => {
            let config = load_config(cli.config.as_deref())?;
            run_interviews_command(config, action).await?;
        }
        Commands::Config { action } => {
            handle_config_command(action, cli.config.as_deref())?;
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "prepcall", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// Log level from -q/-v; `RUST_LOG` wins when set.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => log::LevelFilter::Error,
        (false, 0) => log::LevelFilter::Warn,
        (false, 1) => log::LevelFilter::Info,
        (false, 2) => log::LevelFilter::Debug,
        (false, _) => log::LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp(None)
        .init();
}

/// Load configuration from file with environment overrides.
fn load_config(custom_path: Option<&std::path::Path>) -> Result<Config> {
    let config = if let Some(path) = custom_path {
        Config::load(path)?
    } else {
        Config::load_or_default(&Config::default_path())?
    };

    Ok(config.with_env_overrides())
}

/// Handle config subcommands.
fn handle_config_command(
    action: ConfigAction,
    custom_path: Option<&std::path::Path>,
) -> Result<()> {
    let config_path = custom_path
        .map(std::path::PathBuf::from)
        .unwrap_or_else(Config::default_path);

    match action {
        ConfigAction::Get { key } => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            match config.get_value(&key)? {
                Some(value) => println!("{}", value),
                None => {
                    eprintln!("Error: unknown or unset key '{}'", key);
                    std::process::exit(1);
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load_or_default(&config_path)?;
            config.set_value(&key, &value)?;
            config.save(&config_path)?;
            println!("Set {} = {}", key, value);
        }
        ConfigAction::List { key } => {
            let config = Config::load_or_default(&config_path)?.with_env_overrides();
            match key {
                Some(section) => match config.get_value(&section)? {
                    Some(value) => println!("{}", value),
                    None => {
                        eprintln!("Error: unknown section '{}'", section);
                        std::process::exit(1);
                    }
                },
                None => print!("{}", config.to_toml()?),
            }
        }
        ConfigAction::Dump => {
            print!("{}", Config::default().to_toml()?);
        }
        ConfigAction::Path => {
            println!("{}", config_path.display());
        }
    }

    Ok(())
}
