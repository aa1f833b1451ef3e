// Save-data backup and restore.
// There is a single backup slot under `Backups/`; backing up again merges
// newer files over the old ones.

use crate::error::Result;
use crate::mirror::{clear_dir, copy_tree};
use crate::paths::{Layout, SAVE_SUBDIRS};
use std::path::Path;

/// Copy `SaveData/{cache,content}` into `Backups/`. Returns files copied.
pub fn backup(layout: &Layout) -> Result<usize> {
    mirror_save_dirs(&layout.save_data_dir(), &layout.backups_dir())
}

/// Copy `Backups/{cache,content}` back into `SaveData/`.
pub fn restore(layout: &Layout) -> Result<usize> {
    mirror_save_dirs(&layout.backups_dir(), &layout.save_data_dir())
}

pub fn delete_backups(layout: &Layout) -> Result<()> {
    for sub in SAVE_SUBDIRS {
        clear_dir(&layout.backups_dir().join(sub))?;
    }
    log::info!("Save data backups removed");
    Ok(())
}

fn mirror_save_dirs(from: &Path, to: &Path) -> Result<usize> {
    let mut total = 0;
    for sub in SAVE_SUBDIRS {
        total += copy_tree(&from.join(sub), &to.join(sub), |_, _| {})?;
    }
    Ok(total)
}
