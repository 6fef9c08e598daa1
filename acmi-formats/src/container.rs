//! ZIP container detection and extraction.
//!
//! ZIP extraction is a host-supplied capability, not a parser this crate
//! owns: `ZipExtractor` is the seam, and the `zip` feature wires in a
//! default implementation backed by the `zip` crate so the façade works
//! out of the box.

use acmi_common::AcmiError;

/// First two bytes of a ZIP local-file-header signature.
pub const ZIP_MAGIC: [u8; 2] = *b"PK";

pub fn looks_like_zip(bytes: &[u8]) -> bool {
    bytes.len() >= 2 && bytes[0..2] == ZIP_MAGIC
}

/// A collaborator that unwraps a single-entry ZIP archive to its content
/// bytes. The container must hold exactly one member; anything else is a
/// `CorruptContainer` error.
pub trait ZipExtractor {
    fn extract_single(&self, bytes: &[u8]) -> Result<Vec<u8>, AcmiError>;
}

/// Default `zip`-crate-backed extractor.
#[cfg(feature = "zip")]
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultZipExtractor;

#[cfg(feature = "zip")]
impl ZipExtractor for DefaultZipExtractor {
    fn extract_single(&self, bytes: &[u8]) -> Result<Vec<u8>, AcmiError> {
        use std::io::{Cursor, Read};

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| AcmiError::CorruptContainer(e.to_string()))?;

        if archive.len() != 1 {
            return Err(AcmiError::CorruptContainer(format!("expected exactly one entry, found {}", archive.len())));
        }

        let mut entry = archive.by_index(0).map_err(|e| AcmiError::CorruptContainer(e.to_string()))?;
        let mut out = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut out).map_err(|e| AcmiError::CorruptContainer(e.to_string()))?;
        Ok(out)
    }
}

#[cfg(all(test, feature = "zip"))]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with_entries(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let options = zip::write::SimpleFileOptions::default();
            for (name, content) in entries {
                writer.start_file(*name, options).unwrap();
                writer.write_all(content.as_bytes()).unwrap();
            }
            writer.finish().unwrap();
        }
        buf
    }

    #[test]
    fn test_looks_like_zip() {
        assert!(looks_like_zip(b"PK\x03\x04rest"));
        assert!(!looks_like_zip(b"FileType=text"));
        assert!(!looks_like_zip(b"P"));
    }

    #[test]
    fn test_single_entry_extracts() {
        let bytes = zip_with_entries(&[("recording.acmi", "FileType=text/acmi/tacview\n")]);
        let extracted = DefaultZipExtractor.extract_single(&bytes).unwrap();
        assert_eq!(b"FileType=text/acmi/tacview\n".to_vec(), extracted);
    }

    #[test]
    fn test_multi_entry_is_corrupt_container() {
        let bytes = zip_with_entries(&[("a.acmi", "one"), ("b.acmi", "two")]);
        let err = DefaultZipExtractor.extract_single(&bytes).unwrap_err();
        assert!(matches!(err, AcmiError::CorruptContainer(_)));
    }
}
