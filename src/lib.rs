// Library root
// -----------
// The binary (`main.rs`) wires these modules into an interactive menu and a
// handful of subcommands.
//
// Module responsibilities:
// - `paths`: where everything lives under the install folder.
// - `config`: the `games_config.json` document (preferences + game list).
// - `mirror`: recursive copy / delete helpers used by every other module.
// - `api`: GitHub releases lookups and downloads.
// - `update`: emulator and patch updates built on `api` and `mirror`.
// - `launch`: running Xenia with save data staged in and copied back out.
// - `autoinput`: the timed keypresses sent after a launch.
// - `backup`, `games`, `shell`: the smaller menu actions.
// - `ui` / `cli`: the terminal front ends.
pub mod api;
pub mod autoinput;
pub mod backup;
pub mod cli;
pub mod config;
pub mod error;
pub mod games;
pub mod launch;
pub mod mirror;
pub mod paths;
pub mod shell;
pub mod ui;
pub mod update;
