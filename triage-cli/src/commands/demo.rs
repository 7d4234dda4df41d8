//! Demo command - switch between the live help desk and a local demo workspace

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use super::get_triage_dir;
use triage_core::adapters::demo::demo_workspace;
use triage_core::adapters::workspace::LocalWorkspace;
use triage_core::config::Config;
use triage_core::DEMO_WORKSPACE_FILE;

#[derive(Subcommand)]
pub enum DemoCommands {
    /// Enable demo mode
    #[command(name = "on")]
    On,
    /// Disable demo mode
    #[command(name = "off")]
    Off {
        /// Also delete the demo workspace so the next `demo on` starts fresh
        #[arg(long)]
        reset: bool,
    },
    /// Show demo mode status
    Status,
}

pub fn run(command: Option<DemoCommands>) -> Result<()> {
    let triage_dir = get_triage_dir()?;
    std::fs::create_dir_all(&triage_dir)?;
    let workspace_path = triage_dir.join(DEMO_WORKSPACE_FILE);
    let mut config = Config::load(&triage_dir)?;

    match command {
        Some(DemoCommands::On) => {
            LocalWorkspace::open_or_seed(&workspace_path, demo_workspace)?;
            config.enable_demo_mode();
            config.save(&triage_dir)?;
            println!("{}", "Demo mode enabled".green());
            println!("Rules are read from {}. Run 'triage rules list' to see them.", workspace_path.display());
        }
        Some(DemoCommands::Off { reset }) => {
            config.disable_demo_mode();
            config.save(&triage_dir)?;
            if reset && workspace_path.exists() {
                std::fs::remove_file(&workspace_path)?;
            }
            println!("{}", "Demo mode disabled".yellow());
        }
        Some(DemoCommands::Status) | None => {
            if config.demo_mode {
                println!("Demo mode is {}", "ON".green());
            } else {
                println!("Demo mode is {}", "OFF".yellow());
            }
        }
    }
    Ok(())
}
