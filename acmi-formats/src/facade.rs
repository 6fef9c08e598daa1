//! Public entry point: container detection, delegation to the line scanner
//! and record decoder, and assembly of the finished [`AcmiData`].

use acmi_common::{AcmiError, CancellationToken, GeoidGrid};

#[cfg(feature = "zip")]
use crate::container::DefaultZipExtractor;
use crate::container::{looks_like_zip, ZipExtractor};
use crate::decoder::{parse_header, Decoder};
use crate::model::AcmiData;
use crate::scanner;

/// Options accepted by [`parse`].
pub struct ParseOptions<'g, 'e> {
    /// Entity type names to exclude; an entity whose `types` intersects
    /// this list, or which is `Untyped` when `"Untyped"` is listed, never
    /// enters `entities` or any scene.
    pub filter: Vec<String>,
    /// Read-only geoid grid used to correct `T=` MSL altitudes to height
    /// above the WGS84 ellipsoid. `None` treats geoid height as zero
    /// everywhere.
    pub geoid: Option<&'g GeoidGrid>,
    /// Cooperative cancellation, polled between physical lines.
    pub cancel: CancellationToken,
    /// ZIP-container extractor collaborator, a host-supplied capability.
    /// `None` falls back to the `zip`-crate default when the `zip` feature
    /// is enabled.
    pub extractor: Option<&'e dyn ZipExtractor>,
}

impl<'g, 'e> Default for ParseOptions<'g, 'e> {
    fn default() -> Self {
        ParseOptions { filter: Vec::new(), geoid: None, cancel: CancellationToken::new(), extractor: None }
    }
}

/// Parses a possibly-ZIP-wrapped ACMI byte stream into a structured
/// [`AcmiData`]. `async` because container extraction may suspend on I/O;
/// line scanning and record decoding never suspend once the plain-text
/// bytes are in memory.
pub async fn parse(bytes: &[u8], options: ParseOptions<'_, '_>) -> Result<AcmiData, AcmiError> {
    let text_bytes: Vec<u8> = if looks_like_zip(bytes) {
        match options.extractor {
            Some(extractor) => extractor.extract_single(bytes)?,
            #[cfg(feature = "zip")]
            None => DefaultZipExtractor.extract_single(bytes)?,
            #[cfg(not(feature = "zip"))]
            None => return Err(AcmiError::CorruptContainer("no zip extractor available".into())),
        }
    } else {
        bytes.to_vec()
    };

    if options.cancel.is_cancelled() {
        return Err(AcmiError::Cancelled);
    }

    let text = String::from_utf8_lossy(&text_bytes);
    let (header_lines, lines) = scanner::scan(&text, &options.cancel)?;
    let header = parse_header(&header_lines);

    if !header.is_valid() {
        let reason = if header.file_type.is_empty() && header.file_version.is_empty() {
            AcmiError::HeaderMissing
        } else if header.file_type != "text/acmi/tacview" {
            AcmiError::HeaderWrongType(header.file_type.clone())
        } else {
            AcmiError::HeaderUnsupportedVersion(header.file_version.clone())
        };
        tracing::warn!(%reason, "ACMI header invalid, parsing halted before content loop");
    }

    let mut decoder = Decoder::new(header, options.filter, options.geoid);
    if decoder.is_header_valid() {
        for line in &lines {
            if options.cancel.is_cancelled() {
                return Err(AcmiError::Cancelled);
            }
            decoder.process_line(line);
        }
    }

    Ok(decoder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    const S1: &str = "FileType=text/acmi/tacview\nFileVersion=2.2\n0,ReferenceTime=2024-01-01T00:00:00Z\n0,ReferenceLongitude=0\n0,ReferenceLatitude=0\n#0\na,T=0|0|0,Name=x,Type=Air+FixedWing\n#1\na,T=0.0001|0|100\n";

    #[tokio::test]
    async fn test_parse_plain_text() {
        let data = parse(S1.as_bytes(), ParseOptions::default()).await.unwrap();
        assert!(data.is_valid);
        assert_eq!(1, data.entities.len());
        assert_eq!(2, data.frames.len());
    }

    #[tokio::test]
    async fn test_parse_filters_entity() {
        let options = ParseOptions { filter: vec!["Air".to_string()], ..Default::default() };
        let data = parse(S1.as_bytes(), options).await.unwrap();
        assert_eq!(0, data.entities.len());
    }

    #[tokio::test]
    async fn test_parse_invalid_header_halts_before_content() {
        let input = "Nope\nNope\n#0\na,Name=x\n";
        let data = parse(input.as_bytes(), ParseOptions::default()).await.unwrap();
        assert!(!data.is_valid);
        assert!(data.entities.is_empty());
    }

    #[tokio::test]
    async fn test_parse_missing_header_degrades_instead_of_erroring() {
        let data = parse(b"only-one-line", ParseOptions::default()).await.unwrap();
        assert!(!data.is_valid);
        assert!(data.entities.is_empty());
    }

    #[tokio::test]
    async fn test_parse_cancelled_token_is_terminal() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let options = ParseOptions { cancel, ..Default::default() };
        let err = parse(S1.as_bytes(), options).await.unwrap_err();
        assert!(matches!(err, AcmiError::Cancelled));
    }

    #[cfg(feature = "zip")]
    #[tokio::test]
    async fn test_parse_zip_wrapped_input() {
        use std::io::Write;

        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let zip_options = zip::write::SimpleFileOptions::default();
            writer.start_file("recording.acmi", zip_options).unwrap();
            writer.write_all(S1.as_bytes()).unwrap();
            writer.finish().unwrap();
        }

        let data = parse(&buf, ParseOptions::default()).await.unwrap();
        assert!(data.is_valid);
        assert_eq!(1, data.entities.len());
    }

    #[cfg(feature = "zip")]
    #[tokio::test]
    async fn test_parse_multi_entry_zip_is_corrupt_container() {
        use std::io::Write;

        let mut buf = Vec::new();
        {
            let mut writer = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            let zip_options = zip::write::SimpleFileOptions::default();
            writer.start_file("a.acmi", zip_options).unwrap();
            writer.write_all(b"one").unwrap();
            writer.start_file("b.acmi", zip_options).unwrap();
            writer.write_all(b"two").unwrap();
            writer.finish().unwrap();
        }

        let err = parse(&buf, ParseOptions::default()).await.unwrap_err();
        assert!(matches!(err, AcmiError::CorruptContainer(_)));
    }
}
