//! Persistence codec for finished match logs.
//!
//! A [`MatchLog`] is stored as its JSON text compressed with LZ4 (block
//! format, uncompressed size prepended as a little-endian `u32`). There is no
//! header or version field; the format is fixed for the lifetime of recorded
//! matches.
//!
//! # Example
//!
//! ```
//! use ironclad_replay::log::{LogEntry, MatchLog};
//! use ironclad_replay::persist;
//!
//! let log = MatchLog {
//!     map: "arena-3".to_owned(),
//!     team_a: "Red Comets".to_owned(),
//!     team_b: "Blue Rooks".to_owned(),
//!     entries: vec![LogEntry::top_level(0, r#"{"kind":"Spawn","receiver":"Red;Hero;1;0"}"#)],
//! };
//!
//! let bytes = persist::encode(&log).unwrap();
//! assert_eq!(persist::decode(&bytes).unwrap(), log);
//! ```

use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::log::MatchLog;
use crate::ReplayError;

/// Serialize and compress a match log.
///
/// # Errors
///
/// [`ReplayError::Json`] if the log cannot be serialized.
pub fn encode(log: &MatchLog) -> Result<Vec<u8>, ReplayError> {
    let text = serde_json::to_vec(log)?;
    let bytes = lz4_flex::compress_prepend_size(&text);
    debug!(
        entries = log.entries.len(),
        json_bytes = text.len(),
        compressed_bytes = bytes.len(),
        "encoded match log"
    );
    Ok(bytes)
}

/// Decompress and deserialize a match log.
///
/// # Errors
///
/// [`ReplayError::Decompress`] for corrupt or truncated blocks,
/// [`ReplayError::Json`] if the decompressed text is not a match log.
pub fn decode(bytes: &[u8]) -> Result<MatchLog, ReplayError> {
    let text = lz4_flex::decompress_size_prepended(bytes)?;
    Ok(serde_json::from_slice(&text)?)
}

/// Encode `log` and write it to `path`, replacing any existing file.
///
/// Returns the number of bytes written.
pub fn write(path: &Path, log: &MatchLog) -> Result<usize, ReplayError> {
    let bytes = encode(log)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ReplayError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, &bytes).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(
        path = %path.display(),
        entries = log.entries.len(),
        bytes = bytes.len(),
        "match log written"
    );
    Ok(bytes.len())
}

/// Read and decode the match log stored at `path`.
pub fn load(path: &Path) -> Result<MatchLog, ReplayError> {
    let bytes = fs::read(path).map_err(|source| ReplayError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let log = decode(&bytes)?;
    info!(
        path = %path.display(),
        map = %log.map,
        entries = log.entries.len(),
        "match log loaded"
    );
    Ok(log)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
