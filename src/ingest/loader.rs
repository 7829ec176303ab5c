//! Document loading: reads supported files into plain text.
//!
//! Markdown is stripped to plain text through the pulldown-cmark event
//! stream so headings, emphasis markers and link targets don't pollute the
//! embeddings. PDFs go through lopdf text extraction.
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use pulldown_cmark::{Event, Parser, TagEnd};

/// File extensions the loader understands.
pub fn is_supported_extension(ext: &str) -> bool {
    matches!(ext, "md" | "markdown" | "txt" | "pdf")
}

/// Load a file into plain text, dispatching on its extension.
pub fn load_text(path: &Path) -> Result<String> {
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default();

    match ext {
        "md" | "markdown" => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            Ok(strip_markdown(&raw))
        }
        "txt" => fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        "pdf" => extract_pdf_text(path),
        other => anyhow::bail!("unsupported extension: {other}"),
    }
}

/// Reduce markdown to plain text via the pulldown-cmark event stream.
///
/// Block boundaries (paragraphs, headings, list items, code blocks) become
/// blank lines so the chunker still sees paragraph structure.
pub fn strip_markdown(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for event in Parser::new(input) {
        match event {
            Event::Text(text) | Event::Code(text) => out.push_str(&text),
            Event::SoftBreak => out.push(' '),
            Event::HardBreak => out.push('\n'),
            Event::End(
                TagEnd::Paragraph
                | TagEnd::Heading(_)
                | TagEnd::Item
                | TagEnd::CodeBlock
                | TagEnd::BlockQuote(_),
            ) => out.push_str("\n\n"),
            _ => {}
        }
    }

    out.trim().to_string()
}

/// Extract text from every page of a PDF.
fn extract_pdf_text(path: &Path) -> Result<String> {
    let doc = lopdf::Document::load(path)
        .with_context(|| format!("failed to parse PDF {}", path.display()))?;

    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let text = doc
        .extract_text(&pages)
        .with_context(|| format!("failed to extract text from {}", path.display()))?;

    Ok(text)
}
