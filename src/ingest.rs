//! Reading files for ingestion.
//!
//! Only text-like files are admitted. What counts as text is decided by a
//! [`TextGate`]; the default gate trusts a list of known text extensions and
//! falls back to sniffing the file header with `infer`.

use std::io::Read;
use std::path::{Path, PathBuf};

/// Bytes read from the start of a file for type sniffing
const SNIFF_LEN: usize = 8192;

const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "rst", "csv", "tsv", "json", "yaml", "yml", "toml", "xml", "html",
    "htm", "log", "ini", "cfg", "conf", "py", "rs", "js", "ts", "c", "h", "cpp", "java", "go",
    "sh",
];

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Path is not a file: {}", .0.display())]
    NotAFile(PathBuf),

    #[error("Unsupported file type: {} ({kind})", .path.display())]
    UnsupportedType { path: PathBuf, kind: String },

    #[error("Error reading file {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Decides whether a file may enter the embedding pipeline.
pub trait TextGate {
    /// `head` holds up to the first few kilobytes of the file.
    fn is_text_like(&self, path: &Path, head: &[u8]) -> bool;
}

/// Extension allowlist, then content sniffing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTextGate;

impl TextGate for DefaultTextGate {
    fn is_text_like(&self, path: &Path, head: &[u8]) -> bool {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        if let Some(ext) = &extension {
            if TEXT_EXTENSIONS.contains(&ext.as_str()) {
                return true;
            }
        }

        match infer::get(head) {
            Some(kind) => kind.matcher_type() == infer::MatcherType::Text,
            None => !head.contains(&0),
        }
    }
}

/// Read a text file, rejecting anything the gate does not accept.
///
/// Content that is not valid UTF-8 is decoded as Latin-1.
pub fn read_text(path: &Path, gate: &dyn TextGate) -> Result<String, IngestError> {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(IngestError::NotFound(path.to_path_buf()));
        }
        Err(source) => {
            return Err(IngestError::Decode {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    if !metadata.is_file() {
        return Err(IngestError::NotAFile(path.to_path_buf()));
    }

    let decode_err = |source| IngestError::Decode {
        path: path.to_path_buf(),
        source,
    };

    let mut head = Vec::with_capacity(SNIFF_LEN);
    std::fs::File::open(path)
        .and_then(|file| file.take(SNIFF_LEN as u64).read_to_end(&mut head))
        .map_err(decode_err)?;

    if !gate.is_text_like(path, &head) {
        let kind = infer::get(&head)
            .map(|kind| kind.mime_type().to_string())
            .unwrap_or_else(|| "binary".to_string());
        return Err(IngestError::UnsupportedType {
            path: path.to_path_buf(),
            kind,
        });
    }

    let bytes = std::fs::read(path).map_err(decode_err)?;

    Ok(match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            log::debug!("{} is not valid utf-8, decoding as latin-1", path.display());
            latin1(err.as_bytes())
        }
    })
}

fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // smallest valid PNG header
    const PNG_HEAD: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0x0D];

    struct RejectAll;

    impl TextGate for RejectAll {
        fn is_text_like(&self, _path: &Path, _head: &[u8]) -> bool {
            false
        }
    }

    #[test]
    fn test_reads_utf8_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "héllo wörld").unwrap();

        assert_eq!(read_text(&path, &DefaultTextGate).unwrap(), "héllo wörld");
    }

    #[test]
    fn test_latin1_fallback() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("legacy.txt");
        std::fs::write(&path, [b'c', b'a', b'f', 0xE9]).unwrap();

        assert_eq!(read_text(&path, &DefaultTextGate).unwrap(), "café");
    }

    #[test]
    fn test_missing_file() {
        let tmp = tempfile::tempdir().unwrap();
        let result = read_text(&tmp.path().join("nope.txt"), &DefaultTextGate);
        assert!(matches!(result, Err(IngestError::NotFound(_))));
    }

    #[test]
    fn test_directory_is_not_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let result = read_text(tmp.path(), &DefaultTextGate);
        assert!(matches!(result, Err(IngestError::NotAFile(_))));
    }

    #[test]
    fn test_binary_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("image.bin");
        std::fs::write(&path, PNG_HEAD).unwrap();

        let result = read_text(&path, &DefaultTextGate);
        match result {
            Err(IngestError::UnsupportedType { kind, .. }) => assert_eq!(kind, "image/png"),
            other => panic!("expected UnsupportedType, got {other:?}"),
        }
    }

    #[test]
    fn test_gate_is_pluggable() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("notes.txt");
        std::fs::write(&path, "plain text").unwrap();

        let result = read_text(&path, &RejectAll);
        assert!(matches!(result, Err(IngestError::UnsupportedType { .. })));
    }

    #[test]
    fn test_default_gate() {
        let gate = DefaultTextGate;
        assert!(gate.is_text_like(Path::new("README.MD"), b"# title"));
        assert!(gate.is_text_like(Path::new("notes"), b"no extension, plain text"));
        assert!(!gate.is_text_like(Path::new("photo.jpg"), PNG_HEAD));
        assert!(!gate.is_text_like(Path::new("blob.dat"), &[1, 2, 0, 4]));
    }

    #[test]
    fn test_empty_file_reads_as_empty_text() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();

        assert_eq!(read_text(&path, &DefaultTextGate).unwrap(), "");
    }
}
