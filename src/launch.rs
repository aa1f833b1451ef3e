// Emulator invocation.
// A synced launch stages the shared save data into the game folder, runs
// Xenia there until it exits, then copies `cache/` and `content/` back to
// `SaveData/` and empties them in the game folder. Nothing here is
// transactional; a crash in the middle leaves the copies half done.

use crate::autoinput::{self, AutoInputPlan, KeySender};
use crate::config::ManagerConfig;
use crate::error::{ManagerError, Result};
use crate::mirror::{clear_dir, copy_tree};
use crate::paths::{Layout, SAVE_SUBDIRS};
use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmulatorBuild {
    Canary,
    NonCanary,
}

impl EmulatorBuild {
    pub fn executable(self) -> &'static str {
        match self {
            EmulatorBuild::Canary => "xenia_canary.exe",
            EmulatorBuild::NonCanary => "xenia.exe",
        }
    }
}

/// Progress notifications for whoever is driving the launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    Status(String),
    Copied { done: usize, total: usize },
}

pub struct Launcher {
    layout: Layout,
    sender: Arc<dyn KeySender>,
}

impl Launcher {
    pub fn new(layout: Layout, sender: Arc<dyn KeySender>) -> Self {
        Launcher { layout, sender }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// `Core/<game>/<exe>`, or `MissingExecutable`.
    pub fn resolve_executable(&self, game_folder: &str, build: EmulatorBuild) -> Result<PathBuf> {
        let exe = self.layout.game_dir(game_folder)?.join(build.executable());
        if !exe.is_file() {
            log::error!("Xenia executable not found: {}", exe.display());
            return Err(ManagerError::MissingExecutable(exe));
        }
        Ok(exe)
    }

    /// Stage save data, run canary Xenia to completion, copy save data back.
    pub fn launch_synced<F>(&self, game_folder: &str, config: &ManagerConfig, mut progress: F) -> Result<()>
    where
        F: FnMut(LaunchEvent),
    {
        let exe = self.resolve_executable(game_folder, EmulatorBuild::Canary)?;
        let game_dir = self.layout.game_dir(game_folder)?;
        let save_dir = self.layout.save_data_dir();

        progress(LaunchEvent::Status("Copying save data to game folder...".into()));
        copy_tree(&save_dir, &game_dir, |done, total| {
            progress(LaunchEvent::Copied { done, total })
        })?;

        progress(LaunchEvent::Status("Launching Xenia...".into()));
        // Never joined.
        let _worker = autoinput::spawn(AutoInputPlan::from_config(config), self.sender.clone());

        log::info!("Running {} in {}", exe.display(), game_dir.display());
        match Command::new(&exe).current_dir(&game_dir).status() {
            Ok(status) if status.success() => log::info!("Xenia exited normally"),
            Ok(status) => log::warn!("Xenia exited with {}", status),
            Err(e) => {
                log::error!("Error launching Xenia: {}", e);
                progress(LaunchEvent::Status(format!("Error launching Xenia: {}", e)));
            }
        }

        progress(LaunchEvent::Status("Copying save data back...".into()));
        for sub in SAVE_SUBDIRS {
            copy_tree(&game_dir.join(sub), &save_dir.join(sub), |done, total| {
                progress(LaunchEvent::Copied { done, total })
            })?;
        }
        for sub in SAVE_SUBDIRS {
            clear_dir(&game_dir.join(sub))?;
        }

        progress(LaunchEvent::Status("Done.".into()));
        Ok(())
    }

    /// Start Xenia without waiting for it and without touching save data.
    pub fn launch_detached(
        &self,
        game_folder: &str,
        build: EmulatorBuild,
        config: &ManagerConfig,
    ) -> Result<Child> {
        let exe = self.resolve_executable(game_folder, build)?;
        let game_dir = self.layout.game_dir(game_folder)?;
        let child = Command::new(&exe).current_dir(&game_dir).spawn()?;
        log::info!("Started {} (pid {})", exe.display(), child.id());
        let _worker = autoinput::spawn(AutoInputPlan::from_config(config), self.sender.clone());
        Ok(child)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autoinput::LogOnlySender;
    use std::fs;
    use tempfile::tempdir;

    fn launcher(base: &std::path::Path) -> Launcher {
        Launcher::new(Layout::new(base), Arc::new(LogOnlySender))
    }

    #[test]
    fn missing_executable_aborts_before_copying() {
        let tmp = tempdir().unwrap();
        let launcher = launcher(tmp.path());
        let save = launcher.layout().save_data_dir().join("content");
        fs::create_dir_all(&save).unwrap();
        fs::write(save.join("profile.bin"), "p").unwrap();

        let mut events = Vec::new();
        let err = launcher
            .launch_synced("halo3", &ManagerConfig::default(), |e| events.push(e))
            .unwrap_err();

        assert!(matches!(err, ManagerError::MissingExecutable(_)));
        assert!(events.is_empty());
        assert!(!launcher.layout().game_dir("halo3").unwrap().join("content").exists());
    }

    #[test]
    fn resolve_executable_per_build() {
        let tmp = tempdir().unwrap();
        let launcher = launcher(tmp.path());
        let dir = launcher.layout().game_dir("NonCanaryXenia").unwrap();
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("xenia.exe"), "").unwrap();

        assert!(launcher.resolve_executable("NonCanaryXenia", EmulatorBuild::NonCanary).is_ok());
        assert!(launcher.resolve_executable("NonCanaryXenia", EmulatorBuild::Canary).is_err());
    }

    /// Shell script standing in for `xenia_canary.exe` in `game_dir`.
    #[cfg(unix)]
    fn stand_in_emulator(game_dir: &std::path::Path, body: &str) {
        use std::io::Write;
        use std::os::unix::fs::PermissionsExt;

        let exe = game_dir.join("xenia_canary.exe");
        {
            let mut script = fs::File::create(&exe).unwrap();
            write!(script, "#!/bin/sh\n{}", body).unwrap();
            script.sync_all().unwrap();
        }
        fs::set_permissions(&exe, fs::Permissions::from_mode(0o755)).unwrap();
    }

    #[cfg(unix)]
    #[test]
    fn synced_launch_round_trips_save_data() {
        let tmp = tempdir().unwrap();
        let launcher = launcher(tmp.path());
        let layout = launcher.layout().clone();
        let game_dir = layout.game_dir("halo3").unwrap();
        fs::create_dir_all(&game_dir).unwrap();
        fs::create_dir_all(layout.save_data_dir().join("content")).unwrap();
        fs::write(layout.save_data_dir().join("content/profile.bin"), "profile").unwrap();

        // Checks the staged profile and writes a new save.
        stand_in_emulator(
            &game_dir,
            "test -f content/profile.bin || exit 3\n\
             mkdir -p content/4D5307E6 cache\n\
             echo slot1 > content/4D5307E6/save.dat\n\
             echo shader > cache/shader.bin\n",
        );

        let mut events = Vec::new();
        launcher
            .launch_synced("halo3", &ManagerConfig::default(), |e| events.push(e))
            .unwrap();

        let save = layout.save_data_dir();
        assert_eq!(
            fs::read_to_string(save.join("content/4D5307E6/save.dat")).unwrap().trim(),
            "slot1"
        );
        assert!(save.join("cache/shader.bin").is_file());
        assert!(!game_dir.join("content").exists());
        assert!(!game_dir.join("cache").exists());
        assert_eq!(events.last(), Some(&LaunchEvent::Status("Done.".into())));
    }

    #[cfg(unix)]
    #[test]
    fn failed_copy_back_keeps_game_save_data() {
        let tmp = tempdir().unwrap();
        let launcher = launcher(tmp.path());
        let layout = launcher.layout().clone();
        let game_dir = layout.game_dir("halo3").unwrap();
        fs::create_dir_all(&game_dir).unwrap();

        // Writes a save, then leaves a symlink loop the copy-back cannot walk.
        stand_in_emulator(
            &game_dir,
            "mkdir -p content/4D5307E6\n\
             echo slot1 > content/4D5307E6/save.dat\n\
             ln -s .. content/4D5307E6/loop\n",
        );

        let err = launcher
            .launch_synced("halo3", &ManagerConfig::default(), |_| {})
            .unwrap_err();

        assert!(matches!(err, ManagerError::Io(_)));
        assert!(game_dir.join("content/4D5307E6/save.dat").is_file());
    }
}
