// Command-line arguments. With no subcommand the interactive menu runs;
// the subcommands cover the same actions for scripts and shortcuts.

use crate::backup;
use crate::config::ManagerConfig;
use crate::launch::EmulatorBuild;
use crate::ui::Session;
use anyhow::{bail, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "xenia-manager", version, about = "Launcher and updater for the Xenia emulator")]
pub struct Args {
    /// Install folder (defaults to XENIA_MANAGER_HOME or the executable's folder)
    #[arg(long, global = true)]
    pub base_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List configured games
    Games,
    /// Launch a game by name, or a built-in folder such as `Xenia`
    Launch {
        game: String,
        /// Start without waiting and without syncing save data
        #[arg(long)]
        detached: bool,
        /// Use xenia.exe instead of xenia_canary.exe (implies --detached)
        #[arg(long)]
        non_canary: bool,
    },
    /// Download the latest emulator build or patches
    Update {
        #[arg(value_enum)]
        target: UpdateTarget,
    },
    /// Copy SaveData into Backups
    Backup,
    /// Copy Backups into SaveData
    Restore,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum UpdateTarget {
    Canary,
    NonCanary,
    Patches,
}

/// Folder for a launch target: a configured game's path, or the name itself.
pub fn resolve_game_folder(config: &ManagerConfig, game: &str) -> String {
    config
        .find_game(game)
        .map(|g| g.path.clone())
        .unwrap_or_else(|| game.to_string())
}

pub fn run(session: &Session, command: Command) -> Result<()> {
    match command {
        Command::Games => {
            let config = session.load_config()?;
            if config.games.is_empty() {
                println!("No games found.");
            }
            for game in &config.games {
                println!("{:>3}  {:<30} Core/{}", game.id, game.name, game.path);
            }
        }
        Command::Launch {
            game,
            detached,
            non_canary,
        } => {
            let config = session.load_config()?;
            let folder = resolve_game_folder(&config, &game);
            if non_canary || detached {
                let build = if non_canary {
                    EmulatorBuild::NonCanary
                } else {
                    EmulatorBuild::Canary
                };
                session.launcher.launch_detached(&folder, build, &config)?;
            } else {
                session.launch_with_progress(&folder)?;
            }
        }
        Command::Update { target } => {
            let updater = session.updater();
            match target {
                UpdateTarget::Canary => {
                    let report = updater.update_canary()?;
                    println!("Installed {} into {} folders", report.release, report.targets.len());
                }
                UpdateTarget::NonCanary => {
                    let report = updater.update_non_canary()?;
                    println!("Installed {} into {} folders", report.release, report.targets.len());
                }
                UpdateTarget::Patches => {
                    let n = updater.update_patches()?;
                    println!("Installed {} patch entries", n);
                }
            }
        }
        Command::Backup => {
            let n = backup::backup(&session.layout)?;
            println!("Backup completed ({} files)", n);
        }
        Command::Restore => {
            let n = backup::restore(&session.layout)?;
            if n == 0 {
                bail!("No backup found in {}", session.layout.backups_dir().display());
            }
            println!("Restore completed ({} files)", n);
        }
    }
    Ok(())
}
