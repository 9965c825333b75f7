//! Access-control engine settings: path rules, share tokens, and resolution limits.

use serde::{Deserialize, Serialize};

/// Virtual path validation and naming settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathConfig {
    /// Maximum number of segments in a virtual path.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Maximum length (in characters) of a single path segment.
    #[serde(default = "default_max_segment_length")]
    pub max_segment_length: usize,
    /// How many `name (n).ext` candidates to try before giving up.
    #[serde(default = "default_max_rename_attempts")]
    pub max_rename_attempts: u32,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            max_depth: default_max_depth(),
            max_segment_length: default_max_segment_length(),
            max_rename_attempts: default_max_rename_attempts(),
        }
    }
}

/// Share token issuance settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Number of random bytes in a token before encoding.
    #[serde(default = "default_token_bytes")]
    pub token_bytes: usize,
    /// Insert attempts on token collision.
    #[serde(default = "default_max_token_attempts")]
    pub max_token_attempts: u32,
    /// Record `last_used_at` on successful validation.
    #[serde(default = "default_true")]
    pub track_last_used: bool,
    /// Upper bound on a token's lifetime, if any.
    #[serde(default)]
    pub max_lifetime_hours: Option<u64>,
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            token_bytes: default_token_bytes(),
            max_token_attempts: default_max_token_attempts(),
            track_last_used: true,
            max_lifetime_hours: None,
        }
    }
}

/// Permission resolution settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Ancestor chains longer than this are reported as cycles.
    #[serde(default = "default_max_ancestor_depth")]
    pub max_ancestor_depth: usize,
    /// Creating content directly under one's own root also requires the
    /// upload capability.
    #[serde(default)]
    pub require_upload_capability: bool,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            max_ancestor_depth: default_max_ancestor_depth(),
            require_upload_capability: false,
        }
    }
}

fn default_max_depth() -> usize {
    64
}

fn default_max_segment_length() -> usize {
    255
}

fn default_max_rename_attempts() -> u32 {
    1000
}

fn default_token_bytes() -> usize {
    32
}

fn default_max_token_attempts() -> u32 {
    5
}

fn default_max_ancestor_depth() -> usize {
    256
}

fn default_true() -> bool {
    true
}
