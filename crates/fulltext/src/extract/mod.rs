//! Main-content extraction
//!
//! Markup is parsed into a [`Dom`], boilerplate subtrees are dropped, the
//! rest is cut into [`TextBlock`]s and density scoring picks the content
//! region. Plain text skips the tree and is split on blank lines.

mod blocks;
mod score;

pub use blocks::{collect_blocks, is_boilerplate, TextBlock};
pub use score::{score_candidates, select_region, text_density, Candidate};

use crate::config::DEFAULT_MIN_TEXT_DENSITY;
use crate::dom::{Dom, ROOT};
use crate::error::RetrievalError;
use crate::types::{ClassifiedDocument, ExtractionResult, MimeCategory};
use score::{link_density, MAX_LINK_DENSITY};

const HEADINGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Extraction options
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExtractOptions {
    /// At least one selected block must reach this density
    pub min_text_density: f64,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            min_text_density: DEFAULT_MIN_TEXT_DENSITY,
        }
    }
}

/// Extract the main content of a classified document
pub fn extract(
    doc: &ClassifiedDocument,
    options: &ExtractOptions,
) -> Result<ExtractionResult, RetrievalError> {
    match doc.category {
        MimeCategory::Html => extract_html(&doc.text, options),
        MimeCategory::PlainText => extract_plain_text(&doc.text, options),
        MimeCategory::Unsupported => Err(RetrievalError::UnsupportedContentType(
            doc.reason
                .clone()
                .unwrap_or_else(|| "content is not text".to_string()),
        )),
    }
}

/// Extract the main content of an HTML document
///
/// Never panics on malformed or truncated markup.
pub fn extract_html(
    html: &str,
    options: &ExtractOptions,
) -> Result<ExtractionResult, RetrievalError> {
    let dom = Dom::parse(html);
    let title = find_title(&dom);
    let blocks = collect_blocks(&dom);
    let candidates = score_candidates(&dom, &blocks);

    let region = select_region(&dom, &candidates)
        .ok_or_else(|| RetrievalError::ExtractionFailed("no readable text found".to_string()))?;

    let selected: Vec<&TextBlock> = blocks
        .iter()
        .filter(|block| region.iter().any(|&root| dom.is_within(block.container, root)))
        .filter(|block| link_density(block.chars, block.link_chars) <= MAX_LINK_DENSITY)
        .collect();

    finish(title, &blocks, &selected, options)
}

/// Extract a plain-text document; paragraphs are separated by blank lines
pub fn extract_plain_text(
    text: &str,
    options: &ExtractOptions,
) -> Result<ExtractionResult, RetrievalError> {
    let mut blocks = Vec::new();
    let mut words: Vec<&str> = Vec::new();

    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !words.is_empty() {
                let chars = words.iter().map(|w| w.chars().count()).sum();
                blocks.push(TextBlock {
                    text: words.join(" "),
                    container: ROOT,
                    chars,
                    link_chars: 0,
                    tags: 1,
                });
                words.clear();
            }
        } else {
            words.extend(line.split_whitespace());
        }
    }

    let selected: Vec<&TextBlock> = blocks.iter().collect();
    finish(None, &blocks, &selected, options)
}

fn finish(
    title: Option<String>,
    all: &[TextBlock],
    selected: &[&TextBlock],
    options: &ExtractOptions,
) -> Result<ExtractionResult, RetrievalError> {
    if !selected
        .iter()
        .any(|block| text_density(block) >= options.min_text_density)
    {
        return Err(RetrievalError::ExtractionFailed(format!(
            "no text block reached a density of {}",
            options.min_text_density
        )));
    }

    Ok(ExtractionResult {
        title,
        blocks: selected.iter().map(|block| block.text.clone()).collect(),
        confidence: confidence(all, selected),
    })
}

/// Share of the plain text kept, discounted by the links kept with it
fn confidence(all: &[TextBlock], selected: &[&TextBlock]) -> f64 {
    let total: usize = all.iter().map(TextBlock::plain_chars).sum();
    if total == 0 {
        return 0.0;
    }
    let kept: usize = selected.iter().map(|b| b.plain_chars()).sum();
    let chars: usize = selected.iter().map(|b| b.chars).sum();
    let link_chars: usize = selected.iter().map(|b| b.link_chars).sum();

    let value = kept as f64 / total as f64 * (1.0 - link_density(chars, link_chars));
    value.clamp(0.0, 1.0)
}

/// Document `<title>` text, else the text of the highest-level heading
///
/// `<title>` elements of inline SVG images are not document titles.
fn find_title(dom: &Dom) -> Option<String> {
    let document_title = dom
        .find_all("title")
        .filter(|&id| !dom.has_ancestor_named(id, "svg"))
        .map(|id| dom.text_content(id))
        .find(|text| !text.is_empty());

    document_title.or_else(|| {
        HEADINGS
            .iter()
            .filter_map(|name| dom.find_first(name))
            .map(|id| dom.text_content(id))
            .find(|text| !text.is_empty())
    })
}
