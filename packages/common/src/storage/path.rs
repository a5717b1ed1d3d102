use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// A validated path relative to the storage root, e.g. `submissions/FRM001/<uuid>.pdf`.
///
/// Segments are restricted to ASCII letters, digits, `-`, `_` and `.`; empty
/// segments, `.`/`..` and absolute paths are rejected so a stored path can
/// never escape the root it is joined onto.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoredPath(String);

impl StoredPath {
    /// Parse and validate a relative storage path.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        if raw.is_empty() {
            return Err(StorageError::InvalidPath("path is empty".into()));
        }
        if raw.starts_with('/') || raw.contains('\\') {
            return Err(StorageError::InvalidPath(format!(
                "'{raw}' must be a relative forward-slash path"
            )));
        }
        for segment in raw.split('/') {
            validate_segment(segment).map_err(|reason| {
                StorageError::InvalidPath(format!("'{raw}': {reason}"))
            })?;
        }
        Ok(Self(raw.to_string()))
    }

    /// Join a folder and a file name into a path, validating both.
    pub fn join(folder: &str, file_name: &str) -> Result<Self, StorageError> {
        Self::parse(&format!("{}/{}", folder.trim_matches('/'), file_name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The lowercase extension of the final segment, if any.
    pub fn extension(&self) -> Option<String> {
        let name = self.0.rsplit('/').next()?;
        let (_, ext) = name.rsplit_once('.')?;
        Some(ext.to_ascii_lowercase())
    }
}

fn validate_segment(segment: &str) -> Result<(), &'static str> {
    if segment.is_empty() {
        return Err("empty path segment");
    }
    if segment == "." || segment == ".." {
        return Err("relative segments are not allowed");
    }
    if segment.starts_with('.') {
        return Err("hidden segments are not allowed");
    }
    if !segment
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err("unsupported characters");
    }
    Ok(())
}

impl fmt::Display for StoredPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for StoredPath {
    type Error = StorageError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoredPath> for String {
    fn from(path: StoredPath) -> Self {
        path.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_nested_relative_paths() {
        let path = StoredPath::parse("form-submissions/FRM001/abc_1.pdf").unwrap();
        assert_eq!(path.as_str(), "form-submissions/FRM001/abc_1.pdf");
        assert_eq!(path.extension().as_deref(), Some("pdf"));
    }

    #[test]
    fn rejects_traversal_and_absolute_paths() {
        for bad in ["", "/etc/passwd", "a/../b", "..", "a//b", "a\\b", ".env", "a/b c"] {
            assert!(
                matches!(StoredPath::parse(bad), Err(StorageError::InvalidPath(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn join_trims_folder_slashes() {
        let path = StoredPath::join("/downloads/", "x.png").unwrap();
        assert_eq!(path.as_str(), "downloads/x.png");
    }

    #[test]
    fn extension_is_lowercased() {
        let path = StoredPath::parse("a/B.PNG").unwrap();
        assert_eq!(path.extension().as_deref(), Some("png"));
        assert_eq!(StoredPath::parse("a/noext").unwrap().extension(), None);
    }
}
