//! Central repository for formats, file names, defaults and limits
//!
//! Anything that is part of the on-disk capture layout lives in [`layout`];
//! changing those values breaks readers of existing captures.

use std::time::Duration;

/// On-disk capture layout: `storage/<snapshot>/<capture>/<category>/<file>`
pub mod layout {
    /// Directory name format for a capture, always rendered in UTC
    pub const CAPTURE_DIR_FORMAT: &str = "%Y%m%dT%H%M%S%.3fZ";

    /// Separator between the timestamp and the collision counter
    pub const COLLISION_SEPARATOR: char = '-';

    /// Width of the zero-padded collision counter (`-001`)
    pub const COLLISION_SUFFIX_WIDTH: usize = 3;

    /// Upper bound on collision suffixes tried for one timestamp
    pub const MAX_COLLISION_SUFFIX: u32 = 999;

    /// Directory that receives referenced config/secret objects
    pub const REFERENCED_DIR: &str = "referenced";

    /// Written only when a capture completes without error
    pub const MANIFEST_FILE: &str = "capture.json";

    /// Extension of every captured object file
    pub const OBJECT_EXTENSION: &str = "json";

    /// Longest object file stem kept verbatim; longer ones are truncated and hashed
    pub const MAX_OBJECT_STEM_BYTES: usize = 200;

    /// Hex digits of the identity hash appended to truncated stems
    pub const OBJECT_HASH_HEX_LEN: usize = 16;

    /// Marks a truncated stem; escaped in verbatim stems so the two never collide
    pub const HASH_SEPARATOR: char = '~';

    /// Prefix of in-flight object writes
    pub const TEMP_FILE_PREFIX: &str = ".tmp-";
}

/// HTTP client constants for the Fleet API
pub mod http {
    use super::Duration;

    /// Timeout for establishing HTTP connections
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Path prefix of the Fleet API
    pub const API_PREFIX: &str = "/api/v1";
}

/// Default configuration values
pub mod defaults {
    /// Default SQLite database location
    pub const DATABASE_PATH: &str = "data/fleet-snapshot.db";

    /// Default config directory, overridable through [`CONFIG_DIR_ENV`]
    pub const CONFIG_DIR: &str = "config";

    /// Environment variable holding the config directory
    pub const CONFIG_DIR_ENV: &str = "FLEET_SNAPSHOT_CONFIG_DIR";

    /// Driver tick: 6-field cron, once per minute at second 0
    pub const RECONCILE_SCHEDULE: &str = "0 * * * * *";

    /// Default Fleet API request timeout in seconds
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;
}

/// Status and history values
pub mod runs {
    /// Message stored for runs cut short by a process restart
    pub const INTERRUPTED_MESSAGE: &str = "capture interrupted before completion";
}
