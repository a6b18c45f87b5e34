#![forbid(unsafe_code)]

use std::process::ExitCode;

use anyhow::Context as _;
use clap::{CommandFactory as _, Parser, Subcommand};

use crate::config::{self, Config};
use crate::fetch::Fetch;
use crate::logging;
use crate::output::table::TaskTable;
use crate::task::model::{StoredTask, Task};
use crate::tui;

#[derive(Debug, Parser)]
#[command(
    name = "taskboard",
    version,
    about = "Terminal front-end for a REST task list"
)]
pub struct Cli {
    /// Task resource URL (overrides config and TASKBOARD_API_URL)
    #[arg(long = "api-url", global = true)]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub cmd: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Open the interactive task board (default)
    Ui,
    #[command(alias = "ls")]
    List(ListArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
    Version,
}

#[derive(Debug, Parser)]
pub struct ListArgs {
    /// Output in JSON format
    #[arg(long = "json", conflicts_with = "csv")]
    pub json: bool,
    /// Output as CSV
    #[arg(long = "csv")]
    pub csv: bool,
}

#[derive(Debug, Parser)]
pub struct CompletionArgs {
    pub shell: clap_complete::Shell,
}

#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub cmd: ConfigCmd,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCmd {
    List,
    Set(ConfigSetArgs),
    Get(ConfigGetArgs),
}

#[derive(Debug, Parser)]
pub struct ConfigSetArgs {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Parser)]
pub struct ConfigGetArgs {
    pub key: String,
}

pub async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.cmd {
        None | Some(Commands::Ui) => cmd_ui(cli.api_url.as_deref()).await,
        Some(Commands::List(args)) => cmd_list(cli.api_url.as_deref(), &args).await,
        Some(Commands::Completion(args)) => {
            let mut cmd = Cli::command();
            clap_complete::generate(args.shell, &mut cmd, "taskboard", &mut std::io::stdout());
            Ok(ExitCode::SUCCESS)
        }
        Some(Commands::Config(args)) => match args.cmd {
            ConfigCmd::List => {
                print!("{}", config::list_resolved_toml()?);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Set(set) => {
                config::set_value_string(&set.key, &set.value)?;
                println!("Set {} = {}", set.key, set.value);
                Ok(ExitCode::SUCCESS)
            }
            ConfigCmd::Get(get) => match config::get_value_string(&get.key)? {
                Some(v) => {
                    println!("{v}");
                    Ok(ExitCode::SUCCESS)
                }
                None => anyhow::bail!(
                    "configuration key '{}' not found - use 'taskboard config list' to see available keys",
                    get.key
                ),
            },
        },
        Some(Commands::Version) => Ok(cmd_version()),
    }
}

async fn load_cfg(api_url: Option<&str>) -> anyhow::Result<Config> {
    let api_url = api_url.map(str::to_owned);
    let cfg = tokio::task::spawn_blocking(move || -> anyhow::Result<Config> {
        let (cfg, _paths) = config::load(api_url.as_deref())?;
        Ok(cfg)
    })
    .await??;
    Ok(cfg)
}

async fn cmd_ui(api_url: Option<&str>) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg(api_url).await?;
    logging::init(&cfg.log)?;

    if !tui::is_tty() {
        // Non-TTY fallback: print the list once.
        return print_list(&cfg, &ListArgs { json: false, csv: false }).await;
    }

    tui::app::run(cfg).await?;
    Ok(ExitCode::SUCCESS)
}

async fn cmd_list(api_url: Option<&str>, args: &ListArgs) -> anyhow::Result<ExitCode> {
    let cfg = load_cfg(api_url).await?;
    logging::init(&cfg.log)?;
    print_list(&cfg, args).await
}

async fn print_list(cfg: &Config, args: &ListArgs) -> anyhow::Result<ExitCode> {
    let fetch: Fetch<Vec<StoredTask>> =
        Fetch::new(reqwest::Client::new(), cfg.api.base_url.clone());
    let tasks: Vec<Task> = {
        let state = fetch.settled().await;
        if let Some(err) = &state.error {
            anyhow::bail!("failed to list tasks: {err}");
        }
        state
            .data
            .iter()
            .flatten()
            .cloned()
            .map(Task::from)
            .collect()
    };

    if args.json {
        let mut out = serde_json::to_string_pretty(&tasks)?;
        out.push('\n');
        print!("{out}");
    } else if args.csv {
        TaskTable::new(&tasks)
            .write_csv(std::io::stdout().lock())
            .context("failed to write CSV")?;
    } else {
        TaskTable::new(&tasks)
            .print()
            .context("failed to write table")?;
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_version() -> ExitCode {
    println!("taskboard version {}", env!("CARGO_PKG_VERSION"));
    println!(
        "  os/arch: {}/{}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    ExitCode::SUCCESS
}
