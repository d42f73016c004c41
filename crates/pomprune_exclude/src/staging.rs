use anyhow::{Context, Result};
use log::{debug, trace};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// A rewritten descriptor written beside its destination but not yet in place.
///
/// Dropping an uncommitted write removes the staged file, so a batch that
/// fails part-way leaves no output behind.
#[derive(Debug)]
pub struct StagedWrite {
    temp_path: PathBuf,
    final_path: PathBuf,
    committed: bool,
}

impl StagedWrite {
    pub fn stage(destination: &Path, content: &[u8]) -> Result<Self> {
        let temp_path = staging_path(destination);
        trace!("Staging {} as {}", destination.display(), temp_path.display());
        let guard =
            Self { temp_path, final_path: destination.to_path_buf(), committed: false };
        fs::write(&guard.temp_path, content)
            .with_context(|| format!("Unable to write {}", guard.temp_path.display()))?;
        Ok(guard)
    }

    pub fn staging_path(&self) -> &Path {
        &self.temp_path
    }

    /// Moves the staged file over its destination.
    pub fn commit(mut self) -> Result<()> {
        fs::rename(&self.temp_path, &self.final_path).with_context(|| {
            format!(
                "Unable to move {} to {}",
                self.temp_path.display(),
                self.final_path.display()
            )
        })?;
        debug!("Wrote {}", self.final_path.display());
        self.committed = true;
        Ok(())
    }
}

impl Drop for StagedWrite {
    fn drop(&mut self) {
        if !self.committed {
            let _ = fs::remove_file(&self.temp_path);
        }
    }
}

fn staging_path(destination: &Path) -> PathBuf {
    let name = destination.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
    destination.with_file_name(format!("{}.tmp", name))
}
