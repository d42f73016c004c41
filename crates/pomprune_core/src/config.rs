use anyhow::{Result, anyhow};
use log::{debug, trace};
use std::{
    env,
    path::{Path, PathBuf},
};

use crate::{CONFIG_DIR_NAME, DESCRIPTOR_FILE_NAME};

/// Finds the reactor root for the current directory.
pub fn find_reactor_root() -> Result<PathBuf> {
    find_reactor_root_from(&env::current_dir()?)
}

/// Walks up from `start` to the first directory holding a `.mvn` directory,
/// falling back to the nearest directory holding a descriptor.
pub fn find_reactor_root_from(start: &Path) -> Result<PathBuf> {
    debug!("Searching for reactor root from {:?}", start);
    let mut first_descriptor_dir: Option<PathBuf> = None;
    let mut current_dir = start.to_path_buf();

    loop {
        let config_dir = current_dir.join(CONFIG_DIR_NAME);
        trace!("Checking for {} at: {:?}", CONFIG_DIR_NAME, config_dir);
        if config_dir.is_dir() {
            debug!("Found reactor root at: {:?}", current_dir);
            return Ok(current_dir);
        }
        if first_descriptor_dir.is_none() && current_dir.join(DESCRIPTOR_FILE_NAME).is_file() {
            first_descriptor_dir = Some(current_dir.clone());
        }

        // Try to move up to parent directory
        match current_dir.parent() {
            Some(parent) => current_dir = parent.to_path_buf(),
            None => break,
        }
    }

    match first_descriptor_dir {
        Some(dir) => {
            debug!("No {} directory found, using descriptor directory {:?}", CONFIG_DIR_NAME, dir);
            Ok(dir)
        }
        None => {
            debug!("Could not find a reactor root in any parent folder");
            Err(anyhow!(
                "Could not find a {} directory or {} in any parent folder",
                CONFIG_DIR_NAME,
                DESCRIPTOR_FILE_NAME
            ))
        }
    }
}
