use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use super::error::ContentError;

/// Supplies the raw text of a message by its id.
///
/// Implemented for closures, for in-memory maps and for a directory of
/// one file per message.
pub trait ContentSource: Send + Sync {
    fn fetch(&self, message_id: &str) -> Result<String, ContentError>;
}

impl<F> ContentSource for F
where
    F: Fn(&str) -> Result<String, ContentError> + Send + Sync,
{
    fn fetch(&self, message_id: &str) -> Result<String, ContentError> {
        self(message_id)
    }
}

impl ContentSource for HashMap<String, String> {
    fn fetch(&self, message_id: &str) -> Result<String, ContentError> {
        self.get(message_id)
            .cloned()
            .ok_or_else(|| ContentError::Missing {
                message_id: message_id.to_string(),
            })
    }
}

/// Reads `<root>/<message id>` with path separators in the id replaced by `_`.
#[derive(Debug, Clone)]
pub struct DirectoryContentSource {
    root: PathBuf,
}

impl DirectoryContentSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, message_id: &str) -> PathBuf {
        let file_name: String = message_id
            .trim_start_matches('<')
            .trim_end_matches('>')
            .chars()
            .map(|c| if c == '/' || c == '\\' { '_' } else { c })
            .collect();
        self.root.join(file_name)
    }
}

impl ContentSource for DirectoryContentSource {
    fn fetch(&self, message_id: &str) -> Result<String, ContentError> {
        let path = self.path_for(message_id);
        match fs::read(&path) {
            // Mail archives carry arbitrary charsets; decode what we can
            Ok(bytes) => Ok(String::from_utf8_lossy(&bytes).into_owned()),
            Err(err) if err.kind() == ErrorKind::NotFound => Err(ContentError::Missing {
                message_id: message_id.to_string(),
            }),
            Err(source) => Err(ContentError::Io {
                message_id: message_id.to_string(),
                path,
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_source_reports_missing() {
        let mut map = HashMap::new();
        map.insert("a@x".to_string(), "body".to_string());

        assert_eq!(map.fetch("a@x").unwrap(), "body");
        assert!(matches!(
            map.fetch("b@x"),
            Err(ContentError::Missing { message_id }) if message_id == "b@x"
        ));
    }

    #[test]
    fn closure_source() {
        let source = |id: &str| -> Result<String, ContentError> { Ok(format!("content of {id}")) };
        assert_eq!(source.fetch("m1").unwrap(), "content of m1");
    }

    #[test]
    fn directory_source_reads_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a_b@example.org"), b"hello \xff world").unwrap();
        let source = DirectoryContentSource::new(dir.path());

        assert_eq!(source.path_for("<a/b@example.org>"), dir.path().join("a_b@example.org"));
        assert_eq!(source.fetch("a/b@example.org").unwrap(), "hello \u{fffd} world");
        assert!(matches!(
            source.fetch("missing@example.org"),
            Err(ContentError::Missing { .. })
        ));
    }
}
