use std::io;
use std::path::{Path, PathBuf};

/// Fixed name of the intermediate download, reused for every task
pub const TEMP_VIDEO_NAME: &str = "temp_video";

/// Owner of the temporary video file; the file is deleted when this is dropped
#[derive(Debug)]
pub struct TempVideo {
    path: PathBuf,
    released: bool,
}

impl TempVideo {
    /// Take ownership of `path`, or `None` if nothing was downloaded there
    pub fn claim(path: &Path) -> Option<Self> {
        path.is_file().then(|| Self {
            path: path.to_path_buf(),
            released: false,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Delete the file now, surfacing any error
    pub fn remove(mut self) -> io::Result<()> {
        self.released = true;
        remove_if_present(&self.path)
    }
}

impl Drop for TempVideo {
    fn drop(&mut self) {
        if self.released {
            return;
        }
        if let Err(e) = remove_if_present(&self.path) {
            tracing::warn!("Failed to remove temporary file {}: {}", self.path.display(), e);
        }
    }
}

/// Remove a file, treating "already gone" as success
pub fn remove_if_present(path: &Path) -> io::Result<()> {
    match fs_err::remove_file(path) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
