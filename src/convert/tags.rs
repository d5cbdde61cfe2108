use anyhow::Context;
use id3::{ErrorKind, Tag, TagLike, Version};
use std::path::Path;

use crate::Result;

/// Writes artist and title into a finished audio file
#[cfg_attr(test, mockall::automock)]
pub trait TagWriter: Send + Sync {
    fn write_tags(&self, path: &Path, artist: &str, title: &str) -> Result<()>;
}

/// ID3v2.4 tags via the `id3` crate
pub struct Id3TagWriter;

impl TagWriter for Id3TagWriter {
    fn write_tags(&self, path: &Path, artist: &str, title: &str) -> Result<()> {
        let mut tag = match Tag::read_from_path(path) {
            Ok(tag) => tag,
            Err(e) if matches!(e.kind, ErrorKind::NoTag) => Tag::new(),
            Err(e) => {
                return Err(anyhow::Error::new(e)
                    .context(format!("Failed to read tags of {}", path.display())))
            }
        };

        tag.set_title(title);
        tag.set_artist(artist);

        tag.write_to_path(path, Version::Id3v24)
            .with_context(|| format!("Failed to write tags to {}", path.display()))?;

        Ok(())
    }
}
