mod commands;

use anyhow::Context;
use clap::{ArgAction, CommandFactory, Parser, Subcommand};
use snipty::config::{Config, ROOT_PATH_ENV};
use snipty::reporter::{self, Level, Reporter};
use snipty::{PackageManager, SniptyError};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "snipty")]
#[command(author, version, about = "Minimalistic package manager for snippets.", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Give less output; repeat up to 3 times (warnings, errors, nothing)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    quiet: u8,

    /// Project root path; default: SNIPTY_ROOT_PATH or the current directory
    #[arg(short, long, env = ROOT_PATH_ENV, value_name = "PROJECT ROOT PATH", global = true)]
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Install a snippet, or every tracked snippet missing from disk
    Install {
        /// Snippet name; can be a path
        name: Option<String>,

        /// Snippet URL
        url: Option<String>,

        /// Install even if the snippet was already installed or the path exists
        #[arg(short, long)]
        force: bool,
    },

    /// List tracked snippets with checksums
    List,

    /// Check snippets for changes against their source
    Check {
        /// Snippet name; checks every snippet when omitted
        name: Option<String>,

        /// Display diff results
        #[arg(short, long)]
        diff: bool,
    },

    /// Remove a snippet from the codebase
    Uninstall {
        /// Snippet name; can be a path
        name: String,
    },

    /// Stop tracking a snippet but keep it in the codebase
    Untrack {
        /// Snippet name; can be a path
        name: String,
    },

    /// Stop tracking snippets that are missing from disk
    Prune,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    reporter::init_colors();

    let cli = Cli::parse();
    let level = Level::from_quiet(cli.quiet);

    let Some(command) = cli.command else {
        eprintln!("{}", Cli::command().render_help());
        return ExitCode::from(1);
    };

    if let Commands::Install {
        name: Some(_),
        url: None,
        ..
    } = &command
    {
        Cli::command()
            .error(
                clap::error::ErrorKind::MissingRequiredArgument,
                "a snippet URL is required when a snippet name is given",
            )
            .exit();
    }

    match run(cli.path, command, level).await {
        Ok(code) => ExitCode::from(code.clamp(0, 255) as u8),
        Err(err) => {
            let reporter = Reporter::new(level);
            let code = match err.downcast_ref::<SniptyError>() {
                Some(domain) => {
                    reporter.error(domain);
                    domain.exit_code()
                }
                None => {
                    reporter.error(format!("{:#}", err));
                    1
                }
            };
            ExitCode::from(code as u8)
        }
    }
}

async fn run(path: Option<PathBuf>, command: Commands, level: Level) -> anyhow::Result<i32> {
    let config = match path {
        Some(root) => Config::new(root),
        None => Config::from_env().context("Failed to determine the project root")?,
    };
    tracing::debug!("Project root: {}", config.root.display());

    let mut pm = PackageManager::new(config, Reporter::new(level))?;

    let code = match command {
        Commands::Install { name, url, force } => {
            commands::install(&mut pm, name.as_deref(), url.as_deref(), force).await?
        }
        Commands::List => commands::list(&mut pm)?,
        Commands::Check { name, diff } => commands::check(&mut pm, name.as_deref(), diff).await?,
        Commands::Uninstall { name } => commands::uninstall(&mut pm, &name)?,
        Commands::Untrack { name } => commands::untrack(&mut pm, &name)?,
        Commands::Prune => commands::prune(&mut pm)?,
    };

    Ok(code)
}
