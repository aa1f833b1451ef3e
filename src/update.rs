// Emulator and patch updates.
// Download an archive, unpack it into a staging folder, then mirror the
// staging folder into the install targets. No checksums and no rollback:
// a failure part-way leaves whatever was already copied in place.

use crate::api::{AssetSelector, ReleaseClient, CANARY_REPO, NON_CANARY_ASSET, NON_CANARY_REPO};
use crate::error::Result;
use crate::launch::EmulatorBuild;
use crate::mirror::{clear_dir, copy_tree, move_children, reset_dir};
use crate::paths::{Layout, CANARY_4K_FOLDER, CANARY_FOLDER, GAME_TOML, NON_CANARY_FOLDER};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

/// Folder inside the patches branch archive that holds the patch files.
const PATCHES_ARCHIVE_ROOT: &str = "game-patches-main/patches";

/// What an update run installed.
#[derive(Debug, Clone)]
pub struct UpdateReport {
    pub release: String,
    pub files: usize,
    pub targets: Vec<PathBuf>,
}

/// Unpack a zip held in memory into `dest`.
pub fn extract_zip(bytes: &[u8], dest: &Path) -> Result<()> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    log::info!("Extracting {} entries to {}", archive.len(), dest.display());
    fs::create_dir_all(dest)?;
    archive.extract(dest)?;
    Ok(())
}

/// Reset `staging`, unpack the release into it and mirror it onto each target.
pub fn install_release_archive(bytes: &[u8], staging: &Path, targets: &[PathBuf]) -> Result<usize> {
    reset_dir(staging)?;
    extract_zip(bytes, staging)?;
    let mut files = 0;
    for target in targets {
        files = copy_tree(staging, target, |_, _| {})?;
    }
    Ok(files)
}

/// Replace the contents of `Patches/` with the patches from a branch archive.
pub fn install_patches_archive(bytes: &[u8], layout: &Layout) -> Result<usize> {
    let patches = layout.patches_dir();
    let staging = layout.patches_staging_dir();
    reset_dir(&patches)?;
    reset_dir(&staging)?;

    extract_zip(bytes, &staging)?;

    let extracted = PATCHES_ARCHIVE_ROOT
        .split('/')
        .fold(staging.clone(), |acc, part| acc.join(part));
    let moved = if extracted.is_dir() {
        move_children(&extracted, &patches)?
    } else {
        log::warn!("Patch archive has no {} folder", PATCHES_ARCHIVE_ROOT);
        0
    };
    clear_dir(&staging)?;
    log::info!("Installed {} patch entries into {}", moved, patches.display());
    Ok(moved)
}

/// Create the built-in canary folders, seeding them from `Resources/` when
/// they have no emulator yet, and drop the 4K config into the 4K folder.
pub fn initialize_directories(layout: &Layout) -> Result<()> {
    let resources = layout.resources_dir();
    for folder in [CANARY_FOLDER, CANARY_4K_FOLDER] {
        let dir = layout.game_dir(folder)?;
        fs::create_dir_all(&dir)?;
        if !dir.join(EmulatorBuild::Canary.executable()).is_file() {
            copy_tree(&resources, &dir, |_, _| {})?;
        }
    }

    let uhd = layout.uhd_toml();
    if uhd.is_file() {
        let dst = layout.game_dir(CANARY_4K_FOLDER)?.join(GAME_TOML);
        fs::copy(&uhd, &dst)?;
        log::debug!("Copied {} to {}", uhd.display(), dst.display());
    }
    Ok(())
}

/// Drives updates against the remote repositories.
pub struct Updater<'a> {
    layout: &'a Layout,
    client: &'a ReleaseClient,
}

impl<'a> Updater<'a> {
    pub fn new(layout: &'a Layout, client: &'a ReleaseClient) -> Self {
        Updater { layout, client }
    }

    /// Latest canary build into `Core/Xenia`, `Core/4k/Xenia` and `Resources/`.
    /// Game folders are left alone.
    pub fn update_canary(&self) -> Result<UpdateReport> {
        initialize_directories(self.layout)?;
        let targets = vec![
            self.layout.game_dir(CANARY_FOLDER)?,
            self.layout.game_dir(CANARY_4K_FOLDER)?,
            self.layout.resources_dir(),
        ];
        self.update_from_release(
            CANARY_REPO,
            AssetSelector::Suffix(".zip"),
            &self.layout.canary_staging_dir(),
            targets,
        )
    }

    /// Latest upstream build into `Core/NonCanaryXenia` and `NonCanaryXResources/`.
    pub fn update_non_canary(&self) -> Result<UpdateReport> {
        initialize_directories(self.layout)?;
        let targets = vec![
            self.layout.game_dir(NON_CANARY_FOLDER)?,
            self.layout.non_canary_resources_dir(),
        ];
        self.update_from_release(
            NON_CANARY_REPO,
            AssetSelector::Exact(NON_CANARY_ASSET),
            &self.layout.non_canary_staging_dir(),
            targets,
        )
    }

    pub fn update_patches(&self) -> Result<usize> {
        let bytes = self.client.download(self.client.patches_url())?;
        install_patches_archive(&bytes, self.layout)
    }

    fn update_from_release(
        &self,
        repo: &str,
        selector: AssetSelector<'_>,
        staging: &Path,
        targets: Vec<PathBuf>,
    ) -> Result<UpdateReport> {
        let release = self.client.latest_release(repo)?;
        let asset = release.find_asset(selector)?;
        let bytes = self.client.download(&asset.browser_download_url)?;
        let files = install_release_archive(&bytes, staging, &targets)?;
        log::info!("Installed {} ({} files) from {}", release.tag_name, files, asset.name);
        Ok(UpdateReport {
            release: release.tag_name.clone(),
            files,
            targets,
        })
    }
}

/// Remove the `Update/` staging folders.
pub fn delete_update_staging(layout: &Layout) -> Result<()> {
    clear_dir(&layout.update_dir())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ManagerError;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::FileOptions;

    fn zip_of(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, body) in entries {
            writer.start_file(*name, FileOptions::default()).unwrap();
            writer.write_all(body.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn release_archive_is_mirrored_to_every_target() {
        let tmp = tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        let staging = layout.canary_staging_dir();
        fs::create_dir_all(&staging).unwrap();
        fs::write(staging.join("stale.txt"), "old").unwrap();

        let bytes = zip_of(&[("xenia_canary.exe", "exe"), ("LICENSE", "bsd")]);
        let targets = vec![layout.game_dir("Xenia").unwrap(), layout.resources_dir()];
        let files = install_release_archive(&bytes, &staging, &targets).unwrap();

        assert_eq!(files, 2);
        assert!(!staging.join("stale.txt").exists());
        for target in &targets {
            assert_eq!(fs::read_to_string(target.join("xenia_canary.exe")).unwrap(), "exe");
        }
    }

    #[test]
    fn corrupt_archive_is_an_archive_error() {
        let tmp = tempdir().unwrap();
        let err = extract_zip(b"definitely not a zip", tmp.path()).unwrap_err();
        assert!(matches!(err, ManagerError::Archive(_)));
    }

    #[test]
    fn patches_replace_previous_contents() {
        let tmp = tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        fs::create_dir_all(layout.patches_dir()).unwrap();
        fs::write(layout.patches_dir().join("old.patch.toml"), "old").unwrap();

        let bytes = zip_of(&[
            ("game-patches-main/README.md", "readme"),
            ("game-patches-main/patches/4D5307E6 - Halo 3.patch.toml", "halo"),
            ("game-patches-main/patches/545107D1 - Saints Row.patch.toml", "sr"),
        ]);
        let moved = install_patches_archive(&bytes, &layout).unwrap();

        assert_eq!(moved, 2);
        assert!(!layout.patches_dir().join("old.patch.toml").exists());
        assert!(layout.patches_dir().join("4D5307E6 - Halo 3.patch.toml").is_file());
        assert!(!layout.patches_staging_dir().exists());
    }

    #[test]
    fn initialize_seeds_builtin_folders_and_4k_config() {
        let tmp = tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        fs::create_dir_all(layout.resources_dir()).unwrap();
        fs::write(layout.resources_dir().join("xenia_canary.exe"), "exe").unwrap();
        fs::write(layout.uhd_toml(), "[GPU]\ndraw_resolution_scale_x = 3\n").unwrap();

        initialize_directories(&layout).unwrap();

        assert!(layout.game_dir("Xenia").unwrap().join("xenia_canary.exe").is_file());
        assert!(layout.game_dir("4k\\Xenia").unwrap().join("xenia_canary.exe").is_file());
        let toml = fs::read_to_string(layout.game_config_file("4k/Xenia").unwrap()).unwrap();
        assert!(toml.contains("draw_resolution_scale_x"));
    }

    #[test]
    fn delete_update_staging_removes_update_folder() {
        let tmp = tempdir().unwrap();
        let layout = Layout::new(tmp.path());
        fs::create_dir_all(layout.non_canary_staging_dir()).unwrap();
        delete_update_staging(&layout).unwrap();
        assert!(!layout.update_dir().exists());
    }
}
