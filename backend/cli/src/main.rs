mod config;
mod config_cmd;
mod doctor_cmd;
mod key_cmd;
mod scan_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use tagscan_logging::init_logger;
use tagscan_tui::{run_ui, ScannerDeps};

use config::AppContext;
use scan_cmd::ScanArgs;

#[derive(Parser)]
#[command(name = "tagscan")]
#[command(about = "tagscan: shipping-tag scanner with Gemini recognition and CSV export")]
#[command(version)]
struct Cli {
    /// Config directory (default: $TAGSCAN_CONFIG_DIR or ~/.tagscan)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive scanner (default)
    Ui,
    /// Scan image files as one truck session and export the result
    Scan {
        /// Session date, YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// Truck number
        #[arg(long)]
        truck: String,
        /// Export directory (overrides export.outputDir)
        #[arg(long)]
        out: Option<PathBuf>,
        /// PNG images, one capture each
        #[arg(required = true)]
        images: Vec<PathBuf>,
    },
    /// Manage the stored Gemini API key
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },
    /// Show or initialize the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Check credential, camera source, and export directory
    Doctor,
}

#[derive(Subcommand)]
enum KeyAction {
    Set { value: String },
    Show,
    Clear,
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_dir = cli.config_dir.unwrap_or_else(tagscan_config::config_dir);
    let ctx = AppContext::load(config_dir).await?;

    let command = cli.command.unwrap_or(Commands::Ui);
    // The UI owns the terminal; logs go to the file only.
    let console = !matches!(command, Commands::Ui);
    init_logger(ctx.log_dir(), ctx.config.log_level(), console)?;
    ctx.report.log();

    match command {
        Commands::Ui => {
            info!(config_dir = %ctx.config_dir.display(), "Starting scanner UI");
            let store = ctx.credential_store();
            let deps = ScannerDeps {
                camera: ctx.camera(),
                client: ctx.recognition_client(store.clone()),
                store,
                exporter: ctx.exporter(None),
                instruction: ctx.instruction(),
            };
            run_ui(deps).await.context("Scanner UI failed")?;
        }
        Commands::Scan {
            date,
            truck,
            out,
            images,
        } => {
            scan_cmd::run(
                &ctx,
                ScanArgs {
                    date,
                    truck,
                    out,
                    images,
                },
            )
            .await?;
        }
        Commands::Key { action } => {
            let store = ctx.file_store();
            match action {
                KeyAction::Set { value } => key_cmd::set(&store, &value)?,
                KeyAction::Show => key_cmd::show(&store)?,
                KeyAction::Clear => key_cmd::clear(&store)?,
            }
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => config_cmd::show(&ctx)?,
            ConfigAction::Init { force } => config_cmd::init(&ctx, force).await?,
        },
        Commands::Doctor => {
            if !doctor_cmd::run(&ctx)? {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
