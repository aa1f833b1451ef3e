// UI layer: keyboard-driven menus built on `dialoguer`.
// Every handler is small and synchronous. Failures are printed in red and
// the user lands back on the menu they came from.

use crate::api::ReleaseClient;
use crate::autoinput;
use crate::backup;
use crate::config::{AutoOption, ManagerConfig};
use crate::games;
use crate::launch::{EmulatorBuild, LaunchEvent, Launcher};
use crate::paths::{Layout, CANARY_4K_FOLDER, CANARY_FOLDER, NON_CANARY_FOLDER};
use crate::shell::{self, FolderState};
use crate::update::{self, Updater};
use anyhow::Result;
use crossterm::style::Stylize;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::fmt::Display;
use std::time::Duration;

const CANARY_UPDATE_DETAILS: &str = "This will download and update Xenia to the latest version from the repository.\n\
Details:\n\
- The latest version will be fetched from https://github.com/xenia-canary/xenia-canary.\n\
- Existing Xenia files will be replaced with the new ones.\n\
- Your game data and added games will not be affected.";

const NON_CANARY_UPDATE_DETAILS: &str = "This will download and update Non Canary Xenia to the latest version from the repository.\n\
Details:\n\
- The latest version will be fetched from https://github.com/xenia-project/release-builds-windows.\n\
- Existing Non Canary Xenia files will be replaced with the new ones.\n\
- Your game data and added games will not be affected.";

const PATCHES_UPDATE_DETAILS: &str = "This will remove all current patches and download new ones from the repository.\n\
Details:\n\
- Existing patches will be deleted.\n\
- New patches will be downloaded from https://github.com/xenia-canary/game-patches.\n\
- The process might take a few minutes depending on your internet connection.";

const HELP_TEXT: &str = "Black screen after you select a game?\n\n\
  Press Esc, click File - Open and select the default.xex/iso file of the game\n\
  from within your games folder. Xenia will remember the path from then on.\n\n\
Only 1 backup is kept at a time.\n\n\
Copy your cache and content folders into SaveData and the launcher will manage\n\
your save data across games.\n\n\
Auto launch only works once you have played a game at least once through the launcher.\n\n\
Updating Xenia does not touch your own game folders; update those yourself.\n\
Use `Open Folder` on a game to find its xenia_canary.exe.";

const MISSING_GAME_TOML: &str = "You must launch Xenia at least once to have a config file!";

/// Everything a menu handler needs.
pub struct Session {
    pub layout: Layout,
    pub client: ReleaseClient,
    pub launcher: Launcher,
}

impl Session {
    pub fn new(layout: Layout, client: ReleaseClient) -> Self {
        let launcher = Launcher::new(layout.clone(), autoinput::default_sender());
        Session {
            layout,
            client,
            launcher,
        }
    }

    pub fn load_config(&self) -> crate::error::Result<ManagerConfig> {
        ManagerConfig::load_or_init(&self.layout.config_file())
    }

    pub fn save_config(&self, config: &ManagerConfig) -> crate::error::Result<()> {
        config.save(&self.layout.config_file())
    }

    /// Load, change and save the config in one step. Nothing is written if
    /// loading or `change` fails.
    pub fn update_config<T, F>(&self, change: F) -> crate::error::Result<T>
    where
        F: FnOnce(&mut ManagerConfig) -> crate::error::Result<T>,
    {
        let mut config = self.load_config()?;
        let out = change(&mut config)?;
        self.save_config(&config)?;
        Ok(out)
    }

    pub fn updater(&self) -> Updater<'_> {
        Updater::new(&self.layout, &self.client)
    }

    /// Synced canary launch with an indicatif bar for the save-data copies.
    pub fn launch_with_progress(&self, game_folder: &str) -> Result<()> {
        let config = self.load_config()?;
        let bar = ProgressBar::new(0);
        bar.set_style(ProgressStyle::with_template("{msg}\n{bar:40} {pos}/{len}")?);
        let result = self.launcher.launch_synced(game_folder, &config, |event| match event {
            LaunchEvent::Status(msg) => {
                log::info!("{}", msg);
                bar.set_message(msg);
            }
            LaunchEvent::Copied { done, total } => {
                bar.set_length(total as u64);
                bar.set_position(done as u64);
            }
        });
        bar.finish_and_clear();
        result?;
        Ok(())
    }
}

fn spinner(msg: &'static str) -> Result<ProgressBar> {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
    spinner.set_message(msg);
    spinner.enable_steady_tick(Duration::from_millis(100));
    Ok(spinner)
}

fn report_error(e: impl Display) {
    log::error!("{}", e);
    println!("{}", format!("Error: {}", e).red());
}

fn info(msg: impl Display) {
    println!("{}", msg.to_string().green());
}

fn title(text: &str) {
    println!("\n{}", text.bold().cyan());
}

fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// First-run offer to fetch Xenia and the patches; asked once per install.
pub fn initial_prompt(session: &Session) -> Result<()> {
    match session.load_config() {
        Ok(config) if config.prompt_shown => return Ok(()),
        Ok(_) => {}
        Err(e) => {
            report_error(e);
            return Ok(());
        }
    }
    title("Initial Setup");
    println!(
        "Would you like to update Xenia and download patches?\n\n\
         - Update Xenia to the latest version from https://github.com/xenia-canary/xenia-canary.\n\
         - Download new game patches from https://github.com/xenia-canary/game-patches.\n\
         - This process might take a few minutes depending on your internet connection."
    );
    if confirm("Update now?")? {
        run_canary_update(session, false)?;
        run_patches_update(session, false)?;
    }
    if let Err(e) = session.update_config(|config| {
        config.mark_prompt_shown();
        Ok(())
    }) {
        report_error(e);
    }
    Ok(())
}

/// Main interactive menu. Runs until the user picks "Exit".
pub fn main_menu(session: &Session) -> Result<()> {
    initial_prompt(session)?;
    loop {
        title("Main Menu");
        let items = vec!["Games", "Launch Xenia", "Edit Config", "Help", "Extra Options", "Exit"];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => games_menu(session)?,
            1 => launch_menu(session)?,
            2 => edit_config_menu(session)?,
            3 => {
                title("Help");
                println!("{}", HELP_TEXT);
            }
            4 => extra_options(session)?,
            5 => break,
            _ => {}
        }
    }
    Ok(())
}

fn games_menu(session: &Session) -> Result<()> {
    loop {
        title("Games");
        let config = match session.load_config() {
            Ok(config) => config,
            Err(e) => {
                report_error(e);
                return Ok(());
            }
        };
        if config.games.is_empty() {
            println!("No games found. Please add a new game.");
        }
        let mut items: Vec<String> = vec!["Add Game".into()];
        items.extend(config.games.iter().map(|g| g.name.clone()));
        items.push("Back".into());

        let selection = Select::new().items(&items).default(0).interact()?;
        if selection == 0 {
            handle_add_game(session)?;
        } else if selection == items.len() - 1 {
            return Ok(());
        } else {
            let game = config.games[selection - 1].clone();
            game_options(session, &game.name, &game.path)?;
        }
    }
}

fn handle_add_game(session: &Session) -> Result<()> {
    let name: String = Input::new()
        .with_prompt("Game name (this can be anything you want)")
        .allow_empty(true)
        .interact_text()?;
    let folder: String = Input::new()
        .with_prompt("Game folder name (created under Core if it doesn't exist)")
        .allow_empty(true)
        .interact_text()?;
    let image: String = Input::new()
        .with_prompt(format!(
            "Image file name with extension, placed in {} (or none)",
            session.layout.images_dir().display()
        ))
        .default("none".into())
        .interact_text()?;

    let spinner = spinner("Setting up game folder...")?;
    let result = games::add_game(&session.layout, &name, &folder, &image);
    spinner.finish_and_clear();
    match result {
        Ok(entry) => info(format!("Game '{}' added successfully!", entry.name)),
        Err(e) => report_error(e),
    }
    Ok(())
}

fn game_options(session: &Session, name: &str, folder: &str) -> Result<()> {
    loop {
        title(name);
        let items = vec!["Launch", "Edit Config", "Remove", "Open Folder", "Back"];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                if let Err(e) = session.launch_with_progress(folder) {
                    report_error(e);
                }
            }
            1 => {
                let result = session
                    .layout
                    .game_config_file(folder)
                    .and_then(|file| shell::open_file(&file, MISSING_GAME_TOML));
                if let Err(e) = result {
                    report_error(e);
                }
            }
            2 => {
                if handle_remove_game(session, name, folder)? {
                    return Ok(());
                }
            }
            3 => {
                let result = session
                    .layout
                    .game_dir(folder)
                    .and_then(|dir| shell::open_folder(&dir, false));
                if let Err(e) = result {
                    report_error(e);
                }
            }
            _ => return Ok(()),
        }
    }
}

/// Returns true when the game was removed.
fn handle_remove_game(session: &Session, name: &str, folder: &str) -> Result<bool> {
    if !confirm(&format!("Do you want to remove the game '{}'?", name))? {
        return Ok(false);
    }
    let dir = match session.layout.game_dir(folder) {
        Ok(dir) => dir,
        Err(e) => {
            report_error(e);
            return Ok(false);
        }
    };
    let delete_data = confirm(&format!(
        "Do you want to delete the data for '{}' located at '{}'?",
        name,
        dir.display()
    ))?;
    match games::remove_game(&session.layout, name, delete_data) {
        Ok(removal) => {
            match removal.data_deleted {
                Some(true) => info(format!("Data for '{}' has been deleted.", name)),
                Some(false) => report_error(format!("Data path '{}' does not exist.", dir.display())),
                None => {}
            }
            info(format!("'{}' has been removed from the configuration.", name));
            Ok(true)
        }
        Err(e) => {
            report_error(e);
            Ok(false)
        }
    }
}

fn launch_menu(session: &Session) -> Result<()> {
    title("Launch Xenia");
    let items = vec![
        "Launch Xenia Canary",
        "Launch Xenia Canary with 4K Settings",
        "Launch Normal Xenia",
        "Back",
    ];
    let selection = Select::new().items(&items).default(0).interact()?;
    let result = match selection {
        0 => session.launch_with_progress(CANARY_FOLDER),
        1 => session.launch_with_progress(CANARY_4K_FOLDER),
        2 => launch_normal(session).map_err(Into::into),
        _ => return Ok(()),
    };
    if let Err(e) = result {
        report_error(e);
    }
    Ok(())
}

fn launch_normal(session: &Session) -> crate::error::Result<()> {
    let config = session.load_config()?;
    session
        .launcher
        .launch_detached(NON_CANARY_FOLDER, EmulatorBuild::NonCanary, &config)?;
    info("Xenia launched successfully.");
    Ok(())
}

fn edit_config_menu(session: &Session) -> Result<()> {
    title("Edit Config");
    let items = vec![
        "Edit Xenia Config",
        "Edit 4K Xenia Config",
        "Edit Xenia Manager Config",
        "Back",
    ];
    let selection = Select::new().items(&items).default(0).interact()?;
    let result = match selection {
        0 => session
            .layout
            .game_config_file(CANARY_FOLDER)
            .and_then(|file| shell::open_file(&file, MISSING_GAME_TOML)),
        1 => session
            .layout
            .game_config_file(CANARY_4K_FOLDER)
            .and_then(|file| shell::open_file(&file, MISSING_GAME_TOML)),
        2 => shell::open_file(&session.layout.config_file(), "Games config file not found!"),
        _ => return Ok(()),
    };
    if let Err(e) = result {
        report_error(e);
    }
    Ok(())
}

fn extra_options(session: &Session) -> Result<()> {
    loop {
        title("Extra Options");
        let items = vec![
            "Backup Save Data",
            "Restore Save Data",
            "Delete Save Data Backup",
            "Update Xenia",
            "Update Patches",
            "Update Non-Canary Xenia",
            "Delete Update Backups",
            "Toggle Auto Launch",
            "Set Auto Launch Delay",
            "Set Auto Launch Key",
            "Toggle Auto Fullscreen",
            "Set Auto Fullscreen Delay",
            "Set Auto Fullscreen Key",
            "Open SaveData Folder",
            "Open Patches Folder",
            "Back",
        ];
        let selection = Select::new().items(&items).default(0).interact()?;
        match selection {
            0 => {
                if confirm("Are you sure you want to backup save data?")? {
                    match backup::backup(&session.layout) {
                        Ok(n) => info(format!("Backup completed! ({} files)", n)),
                        Err(e) => report_error(e),
                    }
                }
            }
            1 => {
                if confirm("Are you sure you want to restore save data?")? {
                    match backup::restore(&session.layout) {
                        Ok(n) => info(format!("Restore completed! ({} files)", n)),
                        Err(e) => report_error(e),
                    }
                }
            }
            2 => {
                if confirm("Are you sure you want to delete save data backups?")? {
                    match backup::delete_backups(&session.layout) {
                        Ok(()) => info("Backups removed!"),
                        Err(e) => report_error(e),
                    }
                }
            }
            3 => run_canary_update(session, true)?,
            4 => run_patches_update(session, true)?,
            5 => run_non_canary_update(session, true)?,
            6 => {
                if confirm("Delete the Update staging folders?")? {
                    match update::delete_update_staging(&session.layout) {
                        Ok(()) => info("Update backups removed!"),
                        Err(e) => report_error(e),
                    }
                }
            }
            7 => toggle_option(session, AutoOption::Launch)?,
            8 => set_delay(session, AutoOption::Launch)?,
            9 => set_key(session, AutoOption::Launch)?,
            10 => toggle_option(session, AutoOption::Fullscreen)?,
            11 => set_delay(session, AutoOption::Fullscreen)?,
            12 => set_key(session, AutoOption::Fullscreen)?,
            13 => open_managed_folder(&session.layout.save_data_dir()),
            14 => open_managed_folder(&session.layout.patches_dir()),
            _ => return Ok(()),
        }
    }
}

fn open_managed_folder(dir: &std::path::Path) {
    match shell::open_folder(dir, true) {
        Ok(FolderState::Created) => info(format!("The folder {} has been created.", dir.display())),
        Ok(FolderState::Existed) => {}
        Err(e) => report_error(e),
    }
}

fn run_canary_update(session: &Session, ask: bool) -> Result<()> {
    if ask && !confirm(&format!("{}\nDo you want to continue?", CANARY_UPDATE_DETAILS))? {
        return Ok(());
    }
    let spinner = spinner("Updating Xenia Canary...")?;
    let result = session.updater().update_canary();
    spinner.finish_and_clear();
    match result {
        Ok(report) => info(format!(
            "Update to {} completed! - Core & Resources Only - Your games have not been updated!",
            report.release
        )),
        Err(e) => report_error(e),
    }
    Ok(())
}

fn run_non_canary_update(session: &Session, ask: bool) -> Result<()> {
    if ask && !confirm(&format!("{}\nDo you want to continue?", NON_CANARY_UPDATE_DETAILS))? {
        return Ok(());
    }
    let spinner = spinner("Updating Non Canary Xenia...")?;
    let result = session.updater().update_non_canary();
    spinner.finish_and_clear();
    match result {
        Ok(report) => info(format!(
            "Update to {} completed! - Non Canary Core & Non Canary Resources Only - Your games have not been updated!",
            report.release
        )),
        Err(e) => report_error(e),
    }
    Ok(())
}

fn run_patches_update(session: &Session, ask: bool) -> Result<()> {
    if ask && !confirm(&format!("{}\nDo you want to continue?", PATCHES_UPDATE_DETAILS))? {
        return Ok(());
    }
    let spinner = spinner("Downloading patches...")?;
    let result = session.updater().update_patches();
    spinner.finish_and_clear();
    match result {
        Ok(n) => info(format!("Patches updated successfully! ({} entries)", n)),
        Err(e) => report_error(e),
    }
    Ok(())
}

// Config errors are reported and the menu carries on; only terminal I/O
// errors from dialoguer leave these functions.

fn toggle_option(session: &Session, option: AutoOption) -> Result<()> {
    match session.update_config(|config| Ok(config.toggle(option))) {
        Ok(enabled) => info(format!(
            "{} is now {}.",
            option.label(),
            if enabled { "enabled" } else { "disabled" }
        )),
        Err(e) => report_error(e),
    }
    Ok(())
}

fn set_delay(session: &Session, option: AutoOption) -> Result<()> {
    let current = match session.load_config() {
        Ok(config) => config.delay(option),
        Err(e) => {
            report_error(e);
            return Ok(());
        }
    };
    let seconds: u64 = Input::new()
        .with_prompt(format!("{} delay in seconds", option.label()))
        .default(current)
        .interact_text()?;
    match session.update_config(|config| {
        config.set_delay(option, seconds);
        Ok(())
    }) {
        Ok(()) => info(format!("{} delay set to '{}'.", option.label(), seconds)),
        Err(e) => report_error(e),
    }
    Ok(())
}

fn set_key(session: &Session, option: AutoOption) -> Result<()> {
    let current = match session.load_config() {
        Ok(config) => config.key(option).to_string(),
        Err(e) => {
            report_error(e);
            return Ok(());
        }
    };
    let key: String = Input::new()
        .with_prompt(format!("{} key", option.label()))
        .default(current)
        .interact_text()?;
    match session.update_config(|config| {
        config.set_key(option, &key)?;
        Ok(config.key(option).to_string())
    }) {
        Ok(key) => info(format!("{} key set to '{}'.", option.label(), key)),
        Err(e) => report_error(e),
    }
    Ok(())
}
