// Entrypoint for the launcher.
// - Parses arguments, sets up logging, resolves the install folder.
// - Runs a subcommand if one was given, otherwise the interactive menu.

use clap::Parser;
use xenia_manager::{api::ReleaseClient, cli, paths::Layout, ui};

fn main() -> anyhow::Result<()> {
    let args = cli::Args::parse();

    let level = if args.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    let layout = Layout::resolve(args.base_dir);
    log::info!("Using install folder {}", layout.base().display());

    // Release lookups honour `GITHUB_API_URL` and `XENIA_PATCHES_URL`.
    let client = ReleaseClient::from_env()?;
    let session = ui::Session::new(layout, client);

    match args.command {
        Some(command) => cli::run(&session, command)?,
        None => ui::main_menu(&session)?,
    }
    Ok(())
}
