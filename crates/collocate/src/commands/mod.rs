//! Command implementations.

use anyhow::Context;
use camino::Utf8Path;

pub mod collocates;
pub mod info;

/// Read a corpus file, checking its size against the configured limit first.
pub fn read_input_file(path: &Utf8Path, max_bytes: Option<usize>) -> anyhow::Result<String> {
    let metadata =
        std::fs::metadata(path.as_std_path()).with_context(|| format!("failed to read {path}"))?;
    if let Some(max) = max_bytes {
        let size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if size > max {
            anyhow::bail!("input too large: {path} is {size} bytes (limit: {max} bytes)");
        }
    }

    std::fs::read_to_string(path.as_std_path()).with_context(|| format!("failed to read {path}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use tempfile::TempDir;

    #[test]
    fn reads_within_limit() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("a.txt")).unwrap();
        std::fs::write(&path, "a b c").unwrap();
        assert_eq!(read_input_file(&path, Some(5)).unwrap(), "a b c");
        assert_eq!(read_input_file(&path, None).unwrap(), "a b c");
    }

    #[test]
    fn rejects_oversized_input() {
        let tmp = TempDir::new().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("a.txt")).unwrap();
        std::fs::write(&path, "a b c").unwrap();
        let err = read_input_file(&path, Some(4)).unwrap_err();
        assert!(err.to_string().contains("input too large"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = read_input_file(Utf8Path::new("/nonexistent/corpus.txt"), None).unwrap_err();
        assert!(err.to_string().contains("corpus.txt"));
    }
}
