use camino::{Utf8Path, Utf8PathBuf};
use std::future::Future;
use std::io;
use tokio::io::AsyncReadExt;

/// Something a configuration can be loaded from.
///
/// A source reports its name and byte length up front so it can be validated
/// before any content is read. [`read_text`](Self::read_text) yields the
/// text; it fails if the underlying source has become unavailable.
pub trait ConfigSource {
    /// Display name, including the extension (e.g. `large_config.json`)
    fn name(&self) -> &str;

    /// Size in bytes
    fn size(&self) -> u64;

    /// Extension of [`name`](Self::name), without the dot
    fn extension(&self) -> Option<&str> {
        Utf8Path::new(self.name()).extension()
    }

    /// Read the content as UTF-8 text.
    ///
    /// Reads at most `limit + 1` bytes when the content can change after
    /// [`size`](Self::size) was reported, so a result longer than `limit`
    /// means the source outgrew it. Sources with fixed content may return
    /// it whole.
    fn read_text(&self, limit: u64) -> impl Future<Output = io::Result<String>> + Send;
}

/// A configuration file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: Utf8PathBuf,
    name: String,
    size: u64,
}

impl FileSource {
    /// Describe a file from its filesystem metadata. Content is not read.
    pub fn open<P: AsRef<Utf8Path>>(path: P) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let metadata = std::fs::metadata(&path)?;
        if !metadata.is_file() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} is not a file", path),
            ));
        }

        let name = path.file_name().unwrap_or(path.as_str()).to_string();
        Ok(Self {
            name,
            size: metadata.len(),
            path,
        })
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }
}

impl ConfigSource for FileSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.size
    }

    async fn read_text(&self, limit: u64) -> io::Result<String> {
        let file = tokio::fs::File::open(&self.path).await?;
        let mut bytes = Vec::new();
        file.take(limit.saturating_add(1))
            .read_to_end(&mut bytes)
            .await?;

        if bytes.len() as u64 > limit {
            // The cut may split a character; lossy decoding never shortens the text
            return Ok(String::from_utf8_lossy(&bytes).into_owned());
        }
        String::from_utf8(bytes).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// A configuration already held in memory (uploads, tests, generated documents).
#[derive(Debug, Clone)]
pub struct MemorySource {
    name: String,
    text: String,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

impl ConfigSource for MemorySource {
    fn name(&self) -> &str {
        &self.name
    }

    fn size(&self) -> u64 {
        self.text.len() as u64
    }

    async fn read_text(&self, _limit: u64) -> io::Result<String> {
        Ok(self.text.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_memory_source_reports_byte_length() {
        let source = MemorySource::new("cabinet.json", "{\"games\":[]}");
        assert_eq!(source.size(), 12);
        assert_eq!(source.extension(), Some("json"));
    }

    #[test]
    fn test_extension_missing() {
        let source = MemorySource::new("README", "");
        assert_eq!(source.extension(), None);
    }

    #[tokio::test]
    async fn test_file_source_reads_text() {
        let text = r#"{"games": [{"name": "Joust"}]}"#;
        let mut temp_file: NamedTempFile = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        temp_file.write_all(text.as_bytes()).unwrap();
        temp_file.flush().unwrap();

        let path = Utf8PathBuf::try_from(temp_file.path().to_path_buf()).unwrap();
        let source = FileSource::open(&path).unwrap();

        assert_eq!(source.extension(), Some("json"));
        assert_eq!(source.size(), text.len() as u64);
        assert!(source.read_text(1024).await.unwrap().contains("Joust"));
    }

    #[tokio::test]
    async fn test_file_source_read_is_capped() {
        let mut temp_file: NamedTempFile = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        temp_file.write_all(&[b'x'; 500]).unwrap();
        temp_file.flush().unwrap();

        let path = Utf8PathBuf::try_from(temp_file.path().to_path_buf()).unwrap();
        let source = FileSource::open(&path).unwrap();

        assert_eq!(source.read_text(64).await.unwrap().len(), 65);
        assert_eq!(source.read_text(500).await.unwrap().len(), 500);
    }

    #[tokio::test]
    async fn test_file_source_invalid_utf8_within_limit() {
        let mut temp_file: NamedTempFile = tempfile::Builder::new()
            .suffix(".json")
            .tempfile()
            .unwrap();
        temp_file.write_all(&[0xff, 0xfe, b'{']).unwrap();
        temp_file.flush().unwrap();

        let path = Utf8PathBuf::try_from(temp_file.path().to_path_buf()).unwrap();
        let source = FileSource::open(&path).unwrap();

        let err = source.read_text(1024).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_file_source_rejects_directory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
        let err = FileSource::open(&path).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
