//! Dataset loader: gzip-compressed JSON array of user records.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use flate2::read::MultiGzDecoder;
use tracing::info;

use crate::error::LoadError;
use crate::record::UserRecord;

/// Read and decode the users catalog at `path`.
///
/// Any failure is a [`LoadError`]; callers are expected to abort startup.
pub fn load_users(path: impl AsRef<Path>) -> Result<Vec<UserRecord>, LoadError> {
    let path = path.as_ref();
    info!(path = %path.display(), "loading users file");

    let io_error = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(io_error)?;
    // Concatenated gzip members decode as one stream.
    let mut decoder = MultiGzDecoder::new(BufReader::new(file));
    let mut json = Vec::new();
    decoder.read_to_end(&mut json).map_err(io_error)?;

    let users: Vec<UserRecord> =
        serde_json::from_slice(&json).map_err(|source| LoadError::Decode {
            path: path.to_path_buf(),
            source,
        })?;

    info!(count = users.len(), "users file decoded");
    Ok(users)
}
