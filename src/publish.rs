use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Serializer;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::target::Target;

/// Prefix of the temporary files created next to the output file.
const TEMP_PREFIX: &str = "sd";

/// Temp files are created with 0600, the document must be readable by
/// Prometheus.
#[cfg(unix)]
const OUTPUT_MODE: u32 = 0o644;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("could not marshal json, {0}")]
    Marshal(#[source] serde_json::Error),

    #[error("could not create directory {path:?}, {err}")]
    CreateDir { path: PathBuf, err: io::Error },

    #[error("could not create temp file in {dir:?}, {err}")]
    CreateTemp { dir: PathBuf, err: io::Error },

    #[error("could not write to temp file {path:?}, {err}")]
    Write { path: PathBuf, err: io::Error },

    #[error("could not rename {from:?} to {to:?}, {err}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        err: io::Error,
    },
}

/// Encode targets in Prometheus' file_sd JSON format, indented with tabs.
pub fn encode(targets: &[Target]) -> Result<Vec<u8>, serde_json::Error> {
    let mut buf = Vec::with_capacity(512 * targets.len().max(1));
    let mut serializer = Serializer::with_formatter(&mut buf, PrettyFormatter::with_indent(b"\t"));
    targets.serialize(&mut serializer)?;

    Ok(buf)
}

/// Publisher replaces the output file atomically, readers see either the
/// old content or the new content, never a partial write.
pub struct Publisher {
    path: PathBuf,
}

impl Publisher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Publisher { path: path.into() }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write targets to the output file, returns the number of bytes
    /// written.
    pub fn publish(&self, targets: &[Target]) -> Result<usize, PublishError> {
        let data = encode(targets).map_err(PublishError::Marshal)?;

        self.write_with(|file| file.write_all(&data))?;

        Ok(data.len())
    }

    /// The temp file must live in the same directory as the output file,
    /// `rename` fails across filesystems.
    fn write_with<F>(&self, write: F) -> Result<(), PublishError>
    where
        F: FnOnce(&mut File) -> io::Result<()>,
    {
        let dir = match self.path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => {
                fs::create_dir_all(dir).map_err(|err| PublishError::CreateDir {
                    path: dir.to_path_buf(),
                    err,
                })?;

                dir
            }
            _ => Path::new("."),
        };

        // Dropping the temp file removes it, so a failed write never
        // leaves garbage behind.
        let mut temp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .tempfile_in(dir)
            .map_err(|err| PublishError::CreateTemp {
                dir: dir.to_path_buf(),
                err,
            })?;

        if let Err(err) = set_output_mode(temp.as_file())
            .and_then(|_| write(temp.as_file_mut()))
            .and_then(|_| temp.as_file().sync_all())
        {
            return Err(PublishError::Write {
                path: temp.path().to_path_buf(),
                err,
            });
        }

        temp.persist(&self.path).map_err(|err| PublishError::Rename {
            from: err.file.path().to_path_buf(),
            to: self.path.clone(),
            err: err.error,
        })?;

        Ok(())
    }
}

#[cfg(unix)]
fn set_output_mode(file: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    file.set_permissions(fs::Permissions::from_mode(OUTPUT_MODE))
}

#[cfg(not(unix))]
fn set_output_mode(_file: &File) -> io::Result<()> {
    Ok(())
}
