// File: src/capture/writer.rs
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use uuid::Uuid;

use crate::constants::layout::{
    HASH_SEPARATOR, MAX_OBJECT_STEM_BYTES, OBJECT_EXTENSION, OBJECT_HASH_HEX_LEN, TEMP_FILE_PREFIX,
};
use crate::errors::SnapshotError;
use crate::fleet::FleetItem;

/// Persists single objects as pretty JSON files
#[derive(Debug, Clone, Default)]
pub struct ObjectWriter;

impl ObjectWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write `item` into `dest_dir`, replacing any earlier write of the same object
    pub async fn write(&self, item: &FleetItem, dest_dir: &Path) -> Result<PathBuf, SnapshotError> {
        let file_name = object_file_name(&item.kind, item.namespace.as_deref(), &item.name);
        let path = dest_dir.join(&file_name);
        let tmp_path = dest_dir.join(format!("{}{}", TEMP_FILE_PREFIX, Uuid::new_v4().simple()));

        let body = serde_json::to_vec_pretty(&item.payload).map_err(|e| SnapshotError::Write {
            path: path.clone(),
            reason: format!("serialization failed: {}", e),
        })?;

        fs::write(&tmp_path, &body).await.map_err(|e| SnapshotError::Write {
            path: tmp_path.clone(),
            reason: e.to_string(),
        })?;

        fs::rename(&tmp_path, &path).await.map_err(|e| SnapshotError::Write {
            path: path.clone(),
            reason: e.to_string(),
        })?;

        debug!("Wrote {} ({} bytes)", path.display(), body.len());
        Ok(path)
    }
}

/// `<kind>-<namespace>-<name>.json`, with an empty namespace for cluster-scoped objects.
///
/// `-` is escaped in kind and namespace so the first two dashes always
/// delimit the segments; distinct objects never share a file name.
/// Stems longer than [`MAX_OBJECT_STEM_BYTES`] are cut and suffixed with
/// `~<hash>` of the full identity so the name stays under `NAME_MAX`.
pub fn object_file_name(kind: &str, namespace: Option<&str>, name: &str) -> String {
    let stem = format!(
        "{}-{}-{}",
        escape_segment(kind, true),
        escape_segment(namespace.unwrap_or(""), true),
        escape_segment(name, false),
    );

    if stem.len() <= MAX_OBJECT_STEM_BYTES {
        return format!("{}.{}", stem, OBJECT_EXTENSION);
    }

    let keep = MAX_OBJECT_STEM_BYTES - OBJECT_HASH_HEX_LEN - HASH_SEPARATOR.len_utf8();
    format!(
        "{}{}{}.{}",
        truncate_at_char_boundary(&stem, keep),
        HASH_SEPARATOR,
        identity_hash(kind, namespace.unwrap_or(""), name),
        OBJECT_EXTENSION
    )
}

fn identity_hash(kind: &str, namespace: &str, name: &str) -> String {
    let mut hasher = Sha256::new();
    for part in [kind, namespace, name] {
        hasher.update(part.as_bytes());
        hasher.update([0u8]);
    }
    let digest = format!("{:x}", hasher.finalize());
    digest[..OBJECT_HASH_HEX_LEN].to_string()
}

fn truncate_at_char_boundary(s: &str, max_bytes: usize) -> &str {
    let mut end = max_bytes.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

fn escape_segment(segment: &str, escape_dash: bool) -> String {
    let mut escaped = String::with_capacity(segment.len());
    for (i, c) in segment.chars().enumerate() {
        match c {
            '%' => escaped.push_str("%25"),
            '-' if escape_dash => escaped.push_str("%2D"),
            '/' => escaped.push_str("%2F"),
            '\\' => escaped.push_str("%5C"),
            '\0' => escaped.push_str("%00"),
            '~' => escaped.push_str("%7E"),
            '.' if i == 0 => escaped.push_str("%2E"),
            c => escaped.push(c),
        }
    }
    escaped
}
