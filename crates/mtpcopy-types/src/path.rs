//! Virtual paths addressing directories inside a device tree

use crate::{Error, Result};
use std::fmt;

/// Returns true for `/` and for the platform-native separator
pub fn is_separator(c: char) -> bool {
    c == '/' || c == std::path::MAIN_SEPARATOR
}

/// A parsed device-side directory address such as `/DCIM/Camera`
///
/// Segments are matched case-sensitively and ordinally against folder names.
/// The root is represented by an empty segment list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VirtualPath {
    segments: Vec<String>,
}

impl VirtualPath {
    /// The device root (`/`)
    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    /// Parse a virtual path string
    ///
    /// The first character must be a separator. Exactly one trailing
    /// separator is stripped before splitting, so `/A/` and `/A` are the same
    /// path. Empty interior segments (`/A//B`) are rejected.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut chars = raw.chars();
        match chars.next() {
            None => return Err(Error::invalid_path(raw, "path is empty")),
            Some(c) if !is_separator(c) => {
                return Err(Error::invalid_path(raw, "path must start with a separator"))
            }
            Some(_) => {}
        }

        let mut body = chars.as_str();
        if let Some(last) = body.chars().last() {
            if is_separator(last) {
                body = &body[..body.len() - last.len_utf8()];
            }
        }

        if body.is_empty() {
            return Ok(Self::root());
        }

        let mut segments = Vec::new();
        for segment in body.split(is_separator) {
            if segment.is_empty() {
                return Err(Error::invalid_path(raw, "path contains an empty segment"));
            }
            segments.push(segment.to_string());
        }

        Ok(Self { segments })
    }

    /// Path segments from the root downwards
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Check if this is the device root
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Append a child segment
    pub fn join<S: Into<String>>(&self, segment: S) -> Self {
        let mut segments = self.segments.clone();
        segments.push(segment.into());
        Self { segments }
    }
}

impl fmt::Display for VirtualPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl std::str::FromStr for VirtualPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}
