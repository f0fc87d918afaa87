use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "mqk")]
#[command(about = "execution and risk core CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Runner lifecycle.
    Run {
        #[command(subcommand)]
        cmd: RunCmd,
    },
    /// Live-control arm/disarm state machine.
    Control {
        #[command(subcommand)]
        cmd: ControlCmd,
    },
    /// Compute a layered config hash and print the canonical JSON.
    ConfigHash {
        /// Paths in merge order (base -> engine -> risk -> ...).
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

#[derive(Subcommand)]
enum RunCmd {
    /// Boot the runner: instance lock, intent bus, and every loop task.
    Start(commands::run::StartArgs),
    /// Print the current runtime directory's control state and lock status.
    Status {
        #[arg(long, default_value = ".")]
        runtime_dir: String,
    },
}

#[derive(Subcommand)]
enum ControlCmd {
    /// Step 1 of arming: issues a challenge the operator must echo back.
    Arm {
        #[arg(long, default_value = ".")]
        runtime_dir: String,
    },
    /// Step 2 of arming: completes arming if `--response` matches the outstanding challenge.
    ConfirmArm {
        #[arg(long, default_value = ".")]
        runtime_dir: String,
        #[arg(long)]
        response: String,
    },
    /// Unconditionally returns to Disarmed.
    Disarm {
        #[arg(long, default_value = ".")]
        runtime_dir: String,
    },
    /// Prints the current live-control state.
    Status {
        #[arg(long, default_value = ".")]
        runtime_dir: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::from_filename(".env.local");
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Commands::Run { cmd } => match cmd {
            RunCmd::Start(args) => commands::run::run_start(args).await?,
            RunCmd::Status { runtime_dir } => commands::run::run_status(&runtime_dir)?,
        },
        Commands::Control { cmd } => match cmd {
            ControlCmd::Arm { runtime_dir } => commands::control::arm(&runtime_dir)?,
            ControlCmd::ConfirmArm { runtime_dir, response } => commands::control::confirm_arm(&runtime_dir, &response)?,
            ControlCmd::Disarm { runtime_dir } => commands::control::disarm(&runtime_dir)?,
            ControlCmd::Status { runtime_dir } => commands::control::status(&runtime_dir)?,
        },
        Commands::ConfigHash { paths } => {
            let path_refs: Vec<&str> = paths.iter().map(String::as_str).collect();
            let loaded = mqk_config::load_layered_yaml(&path_refs)?;
            println!("config_hash={}", loaded.config_hash);
            println!("{}", loaded.canonical_json);
        }
    }

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
}
