//! Virtual path parsing.

use docvault_core::config::PathConfig;
use docvault_core::error::AppError;
use docvault_core::result::AppResult;
use docvault_entity::resource::ROOT_PATH;

/// A validated path inside one owner's scope.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The owner's root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse a raw path.
    ///
    /// Both `/` and `\` separate segments. One leading and one trailing
    /// separator are tolerated; any other empty segment, `.`, `..`, control
    /// characters, over-long segments, or excessive depth fail with
    /// `InvalidPath`.
    pub fn parse(raw: &str, config: &PathConfig) -> AppResult<Self> {
        let unified = raw.replace('\\', "/");
        let trimmed = unified.strip_prefix('/').unwrap_or(&unified);
        let trimmed = trimmed.strip_suffix('/').unwrap_or(trimmed);
        if trimmed.is_empty() {
            return Ok(Self::root());
        }

        let segments: Vec<String> = trimmed.split('/').map(str::to_string).collect();
        if segments.len() > config.max_depth {
            return Err(AppError::invalid_path(format!(
                "Path is deeper than {} levels",
                config.max_depth
            )));
        }
        for segment in &segments {
            validate_segment(segment, config)?;
        }
        Ok(Self { segments })
    }

    /// Path segments, outermost first.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Whether this is the owner's root.
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// The last segment.
    pub fn file_name(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// The containing path.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        Some(Self {
            segments: self.segments[..self.segments.len() - 1].to_vec(),
        })
    }

    /// Canonical string form.
    pub fn canonical(&self) -> String {
        if self.is_root() {
            ROOT_PATH.to_string()
        } else {
            format!("/{}", self.segments.join("/"))
        }
    }
}

impl std::fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.canonical())
    }
}

/// Validate a single resource name.
pub fn validate_segment(segment: &str, config: &PathConfig) -> AppResult<()> {
    if segment.trim().is_empty() {
        return Err(AppError::invalid_path("Path contains an empty segment"));
    }
    if segment == "." || segment == ".." {
        return Err(AppError::invalid_path("Path traversal is not allowed"));
    }
    if segment.contains('/') || segment.contains('\\') {
        return Err(AppError::invalid_path("Name must not contain separators"));
    }
    if segment.chars().any(char::is_control) {
        return Err(AppError::invalid_path(
            "Path contains control characters",
        ));
    }
    if segment.chars().count() > config.max_segment_length {
        return Err(AppError::invalid_path(format!(
            "Path segment is longer than {} characters",
            config.max_segment_length
        )));
    }
    Ok(())
}
