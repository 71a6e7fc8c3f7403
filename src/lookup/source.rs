use std::path::PathBuf;

use async_trait::async_trait;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("{source_name} sheet is unavailable: {reason}")]
    Unavailable { source_name: String, reason: String },
}

/// A read-only table (one spreadsheet tab) delivered as CSV text
#[async_trait]
pub trait TableSource: Send + Sync {
    fn name(&self) -> &str;

    async fn fetch(&self) -> Result<String, SourceError>;
}

/// CSV export stored on disk
pub struct FileSource {
    name: String,
    path: PathBuf,
}

impl FileSource {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
        }
    }
}

#[async_trait]
impl TableSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        tracing::debug!(source = %self.name, path = %self.path.display(), "Reading table source");

        tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| SourceError::Unavailable {
                source_name: self.name.clone(),
                reason: format!("{}: {}", self.path.display(), e),
            })
    }
}

/// In-memory table, handy for fixtures and demos
pub struct InlineSource {
    name: String,
    body: String,
}

impl InlineSource {
    pub fn new(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
        }
    }
}

#[async_trait]
impl TableSource for InlineSource {
    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self) -> Result<String, SourceError> {
        Ok(self.body.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn test_file_source_reads_contents() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "SKU,Brand\nTS100,Gildan\n").unwrap();

        let source = FileSource::new("Products", file.path());
        let body = source.fetch().await.unwrap();
        assert!(body.starts_with("SKU,Brand"));
    }

    #[tokio::test]
    async fn test_missing_file_is_unavailable() {
        let source = FileSource::new("Products", "/nonexistent/products.csv");
        let err = source.fetch().await.unwrap_err();
        assert!(err.to_string().contains("Products sheet is unavailable"));
    }
}
