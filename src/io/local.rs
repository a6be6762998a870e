use super::ReadAt;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// The archive file does not exist.
#[derive(Debug, thiserror::Error)]
#[error("Archive not found: {}", .path.display())]
pub struct ArchiveNotFound {
    pub path: PathBuf,
    #[source]
    source: std::io::Error,
}

/// Local archive reader with positional reads
pub struct LocalFileReader {
    file: std::fs::File,
    size: u64,
}

impl LocalFileReader {
    /// Open `path` for reading. A missing file is reported as
    /// [`ArchiveNotFound`].
    pub fn open(path: &Path) -> Result<Self> {
        let file = match std::fs::File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ArchiveNotFound {
                    path: path.to_path_buf(),
                    source: e,
                }
                .into());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to open archive: {}", path.display()));
            }
        };
        let size = file.metadata()?.len();
        log::debug!("opened {} ({} bytes)", path.display(), size);
        Ok(Self { file, size })
    }
}

#[async_trait]
impl ReadAt for LocalFileReader {
    async fn read_at(&self, offset: u64, buf: &mut [u8]) -> Result<usize> {
        if offset >= self.size {
            return Ok(0);
        }

        #[cfg(unix)]
        {
            use std::os::unix::fs::FileExt;
            Ok(self.file.read_at(buf, offset)?)
        }

        #[cfg(windows)]
        {
            use std::os::windows::fs::FileExt;
            // seek_read moves the cursor, but nothing here relies on it
            Ok(self.file.seek_read(buf, offset)?)
        }

        #[cfg(not(any(unix, windows)))]
        {
            use std::io::{Read, Seek, SeekFrom};
            let mut file = &self.file;
            file.seek(SeekFrom::Start(offset))?;
            Ok(file.read(buf)?)
        }
    }

    fn size(&self) -> u64 {
        self.size
    }
}
