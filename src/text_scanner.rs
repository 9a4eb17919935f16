//! Tolerant text-run scanner for packed presentation XML.
//!
//! The scanner does not parse the XML tree. It decodes the bytes lossily and looks for
//! `<a:t ...>text</a:t>` runs, which is enough to recover slide text from damaged or
//! partially readable packages.

use anyhow::{Result, anyhow};
use regex::Regex;

use crate::outcome::{ConversionError, ConversionOutcome, DocumentFormat};

/// Number of text fragments grouped under one slide heading
pub const FRAGMENTS_PER_PAGE: usize = 30;

pub const NO_TEXT_CAVEAT: &str = "> ⚠️ 无法提取 PPTX 文字内容，文件可能加密或格式不支持。";

const DOCUMENT_HEADING: &str = "# 📑 演示文稿内容\n\n";

lazy_static::lazy_static! {
    static ref TEXT_RUN_PATTERN: Result<Regex, regex::Error> = Regex::new(r"<a:t[^>]*>([^<]+)</a:t>");
}

/// Inner text of every drawing text run, in document order, untrimmed
pub fn scan_text_runs(bytes: &[u8]) -> Result<Vec<String>> {
    let pattern = TEXT_RUN_PATTERN
        .as_ref()
        .map_err(|e| anyhow!("invalid text run pattern: {}", e))?;
    let text = String::from_utf8_lossy(bytes);

    Ok(pattern
        .captures_iter(&text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect())
}

/// Unescape and trim fragments, drop the empty ones and group the rest into pages
pub fn paginate_fragments(fragments: &[String]) -> Vec<Vec<String>> {
    let kept: Vec<String> = fragments
        .iter()
        .map(|fragment| unescape_fragment(fragment))
        .map(|fragment| fragment.trim().to_string())
        .filter(|fragment| !fragment.is_empty())
        .collect();

    kept.chunks(FRAGMENTS_PER_PAGE)
        .map(<[String]>::to_vec)
        .collect()
}

fn unescape_fragment(fragment: &str) -> String {
    match quick_xml::escape::unescape(fragment) {
        Ok(text) => text.into_owned(),
        Err(e) => {
            log::debug!("Keeping text run verbatim, unescape failed: {}", e);
            fragment.to_string()
        }
    }
}

/// Render paged fragments under a document heading and one `## 幻灯片 n` heading per page
pub fn render_pages(pages: &[Vec<String>]) -> String {
    let mut markdown = DOCUMENT_HEADING.to_string();
    for (index, page) in pages.iter().enumerate() {
        markdown.push_str(&format!("## 幻灯片 {}\n\n", index + 1));
        markdown.push_str(&page.join("\n\n"));
        markdown.push_str("\n\n");
    }
    markdown
}

/// Scan bytes for text runs and turn the result into an outcome; never panics out
pub fn scan_to_outcome(bytes: &[u8]) -> ConversionOutcome {
    match scan_text_runs(bytes) {
        Ok(runs) if runs.is_empty() => ConversionOutcome::Caveat(NO_TEXT_CAVEAT.to_string()),
        Ok(runs) => {
            let pages = paginate_fragments(&runs);
            log::debug!("Scanned {} text runs into {} pages", runs.len(), pages.len());
            ConversionOutcome::Converted(render_pages(&pages))
        }
        Err(e) => ConversionOutcome::Failure(ConversionError::Decode {
            format: DocumentFormat::Pptx,
            message: format!("> ⚠️ PPTX 解析失败：{}", e),
        }),
    }
}
