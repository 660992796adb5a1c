//! Shard status file.
//!
//! Touching the file tells the invoking harness that this runner understands sharding. Without it, the harness
//! assumes every shard ran the whole suite.

use std::fs::{File, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;
use std::time::SystemTime;

use tracing::debug;

use crate::error::FatalError;

/// Create `path` if absent, otherwise refresh its modification time. Contents are never changed.
///
/// An existing file is opened read-only: refreshing the timestamp needs ownership, not write access.
pub fn touch(path: &Path) -> Result<(), FatalError> {
    let wrap = |source| FatalError::StatusFile {
        path: path.to_path_buf(),
        source,
    };
    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(_) => debug!("created status file {}", path.display()),
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            File::open(path)
                .and_then(|file| file.set_modified(SystemTime::now()))
                .map_err(wrap)?;
            debug!("refreshed status file {}", path.display());
        }
        Err(err) => return Err(wrap(err)),
    }
    Ok(())
}
