//! Scan pass: index every numbered target in the rendered document.
//!
//! Runs before the patch pass so forward references (a placeholder that
//! precedes its target in document order) resolve like any other. Equation
//! numbers are assigned *here*, in scan order, which by construction equals
//! document order, so they agree with the expansion-time figure/footnote
//! numbering scheme.

use super::common::{attr_value, create_xml_reader, has_class, is_void};
use crate::utils::anchor::anchor_id;
use anyhow::Result;
use quick_xml::events::{BytesStart, Event};
use std::collections::HashMap;

/// One sidebar entry, in document order.
#[derive(Debug, Clone)]
pub struct NavEntry {
    pub text: String,
    pub id: String,
    /// Flagged sub-item (`navitem`) rather than a top-level heading.
    pub sub: bool,
    /// The element already carried an `id` attribute.
    pub had_id: bool,
}

/// Everything the patch pass needs to know about the document.
#[derive(Debug, Default)]
pub struct DocumentIndex {
    /// Figure label → assigned number, from `figure-<n>` class tokens.
    pub figures: HashMap<String, u32>,
    /// Equation label → display number, assigned in scan order.
    pub equations: HashMap<String, u32>,
    /// Footnote body numbers present inline.
    pub footnote_bodies: Vec<u32>,
    /// Count of footnote marks (sanity signal only).
    pub footnote_marks: usize,
    /// Sidebar entries: `<h2>` headings and flagged sub-items.
    pub nav: Vec<NavEntry>,
    pub has_footnote_container: bool,
    pub has_nav_list: bool,
    pub has_title: bool,
    pub has_meta_description: bool,
    pub has_nav_script: bool,
}

/// Heading/sub-item text being accumulated until its end tag.
struct TextCapture {
    buf: String,
    depth: usize,
    existing_id: Option<String>,
    sub: bool,
}

pub fn scan_document(content: &[u8]) -> Result<DocumentIndex> {
    let mut index = DocumentIndex::default();
    let mut reader = create_xml_reader(content);
    let mut in_article = 0usize;
    let mut capture: Option<TextCapture> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                if let Some(cap) = capture.as_mut() {
                    if !is_void(elem.name().as_ref()) {
                        cap.depth += 1;
                    }
                    continue;
                }
                if elem.name().as_ref() == b"article" {
                    in_article += 1;
                }
                scan_element(&elem, &mut index);

                match elem.name().as_ref() {
                    b"h2" if in_article > 0 => {
                        capture = Some(TextCapture {
                            buf: String::new(),
                            depth: 0,
                            existing_id: attr_value(&elem, b"id"),
                            sub: false,
                        });
                    }
                    b"span" if has_class(&elem, "article-subnav-item") => {
                        capture = Some(TextCapture {
                            buf: String::new(),
                            depth: 0,
                            existing_id: attr_value(&elem, b"id"),
                            sub: true,
                        });
                    }
                    b"title" => index.has_title = true,
                    _ => {}
                }
            }
            Ok(Event::Empty(elem)) => scan_element(&elem, &mut index),
            Ok(Event::Text(text)) => {
                if let Some(cap) = capture.as_mut() {
                    match text.xml_content() {
                        Ok(chunk) => cap.buf.push_str(&chunk),
                        Err(_) => cap.buf.push_str(&String::from_utf8_lossy(&text)),
                    }
                }
            }
            Ok(Event::End(elem)) => {
                if let Some(mut cap) = capture.take() {
                    if cap.depth == 0 {
                        index.nav.push(finish_capture(cap));
                    } else {
                        cap.depth -= 1;
                        capture = Some(cap);
                    }
                    continue;
                }
                if elem.name().as_ref() == b"article" {
                    in_article = in_article.saturating_sub(1);
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => anyhow::bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    Ok(index)
}

/// Turn an accumulated heading/sub-item capture into a sidebar entry.
fn finish_capture(cap: TextCapture) -> NavEntry {
    let text = cap.buf.trim().to_owned();
    let (id, had_id) = match cap.existing_id {
        Some(id) => (id, true),
        None => (anchor_id(&text), false),
    };
    NavEntry {
        text,
        id,
        sub: cap.sub,
        had_id,
    }
}

/// Record what a single start/empty element contributes to the index.
fn scan_element(elem: &BytesStart<'_>, index: &mut DocumentIndex) {
    match elem.name().as_ref() {
        b"img" if has_class(elem, "figure-image") => {
            if let (Some(number), Some(label)) = (figure_number(elem), attr_value(elem, b"id")) {
                index.figures.entry(label).or_insert(number);
            }
        }
        b"span" => {
            if let Some(label) = attr_value(elem, b"data-eqlabel") {
                let next = index.equations.len() as u32 + 1;
                index.equations.entry(label).or_insert(next);
            } else if has_class(elem, "footnote-text-all") {
                if let Some(number) = footnote_number(elem) {
                    index.footnote_bodies.push(number);
                }
            }
        }
        b"a" if has_class(elem, "footnote-mark") => index.footnote_marks += 1,
        b"div" if has_class(elem, "footnote-text-container") => {
            index.has_footnote_container = true;
        }
        b"ul" if has_class(elem, "article-navigation-list") => index.has_nav_list = true,
        b"meta" => {
            if attr_value(elem, b"name").as_deref() == Some("description") {
                index.has_meta_description = true;
            }
        }
        b"script" => {
            if attr_value(elem, b"src").is_some_and(|src| src.contains("nav-sync")) {
                index.has_nav_script = true;
            }
        }
        _ => {}
    }
}

/// Extract the assigned number from a `figure-<n>` class token.
fn figure_number(elem: &BytesStart<'_>) -> Option<u32> {
    attr_value(elem, b"class")?
        .split_whitespace()
        .find_map(|token| token.strip_prefix("figure-")?.parse().ok())
}

/// Extract the number from a `footnote-<n>` id.
fn footnote_number(elem: &BytesStart<'_>) -> Option<u32> {
    attr_value(elem, b"id")?.strip_prefix("footnote-")?.parse().ok()
}
