use std::io::{Cursor, Read};

use anyhow::{Context, Result};
use zip::ZipArchive;

use crate::outcome::ConversionOutcome;
use crate::text_scanner::scan_to_outcome;

const ZIP_SIGNATURE: &[u8] = b"PK\x03\x04";

/// Extract presentation text by scanning for drawing text runs.
///
/// A readable package is inflated first so the scan sees slide XML rather than
/// compressed bytes; anything else is scanned as-is. Only `ppt/slides/slideN.xml`
/// parts are inflated, so speaker notes (`ppt/notesSlides/`) and layout or master
/// placeholder text are not part of the output.
pub fn decode_pptx(bytes: &[u8]) -> ConversionOutcome {
    if !bytes.starts_with(ZIP_SIGNATURE) {
        return scan_to_outcome(bytes);
    }

    match inflate_slide_parts(bytes) {
        Ok(Some(slide_xml)) => scan_to_outcome(&slide_xml),
        Ok(None) => scan_to_outcome(bytes),
        Err(e) => {
            log::warn!("Scanning PPTX bytes without inflating the package: {:#}", e);
            scan_to_outcome(bytes)
        }
    }
}

/// Concatenate `ppt/slides/slideN.xml` parts in slide order.
/// Returns `None` when the package has no slide parts.
fn inflate_slide_parts(bytes: &[u8]) -> Result<Option<Vec<u8>>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))
        .context("Failed to read PowerPoint file as ZIP archive")?;

    let mut slide_files: Vec<String> = archive
        .file_names()
        .filter(|name| is_slide_part(name))
        .map(String::from)
        .collect();
    if slide_files.is_empty() {
        return Ok(None);
    }
    slide_files.sort_by_key(|name| extract_slide_number(name));

    let mut slide_xml = Vec::new();
    for slide_file in &slide_files {
        let mut file = archive
            .by_name(slide_file)
            .with_context(|| format!("Slide part {} not found", slide_file))?;
        file.read_to_end(&mut slide_xml)
            .with_context(|| format!("Failed to inflate slide part {}", slide_file))?;
        slide_xml.push(b'\n');
    }

    Ok(Some(slide_xml))
}

fn is_slide_part(name: &str) -> bool {
    name.starts_with("ppt/slides/slide") && name.ends_with(".xml")
}

/// Extract slide number from "ppt/slides/slide12.xml"
fn extract_slide_number(filename: &str) -> usize {
    filename
        .strip_prefix("ppt/slides/slide")
        .and_then(|rest| rest.strip_suffix(".xml"))
        .and_then(|number| number.parse().ok())
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text_scanner::NO_TEXT_CAVEAT;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn slide_xml(texts: &[&str]) -> String {
        let runs: String = texts
            .iter()
            .map(|t| format!("<a:r><a:t>{}</a:t></a:r>", t))
            .collect();
        format!("<p:sld><p:cSld><p:spTree><a:p>{}</a:p></p:spTree></p:cSld></p:sld>", runs)
    }

    fn package(parts: &[(&str, String)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
        for (name, content) in parts {
            writer.start_file(*name, options).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn test_extract_slide_number() {
        assert_eq!(extract_slide_number("ppt/slides/slide1.xml"), 1);
        assert_eq!(extract_slide_number("ppt/slides/slide12.xml"), 12);
        assert_eq!(extract_slide_number("ppt/slides/slideX.xml"), usize::MAX);
    }

    #[test]
    fn test_package_slides_are_scanned_in_numeric_order() {
        let bytes = package(&[
            ("[Content_Types].xml", "<Types/>".to_string()),
            ("ppt/slides/slide10.xml", slide_xml(&["tenth"])),
            ("ppt/slides/slide2.xml", slide_xml(&["second"])),
            ("ppt/slides/slide1.xml", slide_xml(&["first", "  "])),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>".to_string()),
        ]);

        let markdown = decode_pptx(&bytes).into_markdown().unwrap();
        assert_eq!(
            markdown,
            "# 📑 演示文稿内容\n\n## 幻灯片 1\n\nfirst\n\nsecond\n\ntenth\n\n"
        );
    }

    #[test]
    fn test_speaker_notes_are_not_scanned() {
        let bytes = package(&[
            ("ppt/slides/slide1.xml", slide_xml(&["on the slide"])),
            ("ppt/notesSlides/notesSlide1.xml", slide_xml(&["speaker only"])),
            ("ppt/slideLayouts/slideLayout1.xml", slide_xml(&["Click to add title"])),
        ]);

        let markdown = decode_pptx(&bytes).into_markdown().unwrap();
        assert!(markdown.contains("on the slide"));
        assert!(!markdown.contains("speaker only"));
        assert!(!markdown.contains("Click to add title"));
    }

    #[test]
    fn test_package_without_text_is_caveat() {
        let bytes = package(&[("ppt/slides/slide1.xml", "<p:sld/>".to_string())]);
        assert_eq!(
            decode_pptx(&bytes),
            ConversionOutcome::Caveat(NO_TEXT_CAVEAT.to_string())
        );
    }

    #[test]
    fn test_raw_xml_bytes_are_scanned_directly() {
        let bytes = slide_xml(&["loose"]).into_bytes();
        let markdown = decode_pptx(&bytes).into_markdown().unwrap();
        assert!(markdown.contains("## 幻灯片 1\n\nloose"));
    }

    #[test]
    fn test_broken_package_falls_back_to_raw_scan() {
        let mut bytes = ZIP_SIGNATURE.to_vec();
        bytes.extend_from_slice(b"garbage <a:t>survivor</a:t> more garbage");
        let markdown = decode_pptx(&bytes).into_markdown().unwrap();
        assert!(markdown.contains("survivor"));
    }
}
