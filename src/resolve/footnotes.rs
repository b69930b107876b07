//! Footnote body relocation.
//!
//! Footnote bodies are emitted inline next to their marks; the patch pass
//! lifts each body subtree out of the flow and re-emits all of them inside
//! the page's footnote container, sorted ascending by number. Marks stay
//! where they are. If the page has no container the bodies are left inline,
//! which the resolve report surfaces as a warning.

use super::common::{XmlWriter, attr_value, capture_subtree, is_void};
use super::figures::write_ref_anchor;
use super::scan::DocumentIndex;
use super::{RefKind, ResolveReport, Unresolved, is_external_link, with_new_tab_attrs};
use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;

/// Collects footnote body subtrees during the patch pass and replays them
/// into the container, in ascending numeric order.
pub struct FootnoteRelocator {
    bodies: BTreeMap<u32, Vec<Event<'static>>>,
    enabled: bool,
    flushed: bool,
}

impl FootnoteRelocator {
    /// `enabled` is false when the page has no footnote container; bodies
    /// then stay inline (deterministic fallback).
    pub fn new(enabled: bool) -> Self {
        Self {
            bodies: BTreeMap::new(),
            enabled,
            flushed: false,
        }
    }

    /// Try to capture a footnote body whose start tag was just read.
    ///
    /// Returns true when the subtree was captured (and must not be written
    /// in place). Bodies encountered after the container already closed are
    /// left inline.
    pub fn try_capture(
        &mut self,
        reader: &mut Reader<&[u8]>,
        elem: &BytesStart<'_>,
    ) -> Result<bool> {
        if !self.enabled || self.flushed {
            return Ok(false);
        }
        let Some(number) = attr_value(elem, b"id")
            .and_then(|id| id.strip_prefix("footnote-")?.parse::<u32>().ok())
        else {
            return Ok(false);
        };
        let events = capture_subtree(reader, elem)?;
        self.bodies.insert(number, events);
        Ok(true)
    }

    /// Bodies captured but not yet replayed into the container.
    pub fn has_pending(&self) -> bool {
        !self.bodies.is_empty()
    }

    /// Replay all captured bodies into the container, resolving any
    /// cross-reference placeholders they carry. Returns the number of
    /// bodies moved.
    pub fn flush(
        &mut self,
        writer: &mut XmlWriter,
        index: &DocumentIndex,
        report: &mut ResolveReport,
    ) -> Result<usize> {
        let moved = self.bodies.len();
        for events in self.bodies.values() {
            write_body(writer, events, index, report)?;
        }
        self.bodies.clear();
        self.flushed = true;
        Ok(moved)
    }
}

/// Replay one captured body, patching reference anchors inside it.
fn write_body(
    writer: &mut XmlWriter,
    events: &[Event<'static>],
    index: &DocumentIndex,
    report: &mut ResolveReport,
) -> Result<()> {
    let mut i = 0;
    while i < events.len() {
        if let Event::Start(elem) = &events[i] {
            if let Some(label) = attr_value(elem, b"data-figref") {
                let number = index.figures.get(&label).copied();
                if number.is_none() {
                    report.unresolved.push(Unresolved {
                        kind: RefKind::Figure,
                        label: label.clone(),
                    });
                }
                write_ref_anchor(writer, "internal", "data-figref", &label, number)?;
                i = end_of_subtree(events, i);
                continue;
            }
            if let Some(label) = attr_value(elem, b"data-eqref") {
                let number = index.equations.get(&label).copied();
                if number.is_none() {
                    report.unresolved.push(Unresolved {
                        kind: RefKind::Equation,
                        label: label.clone(),
                    });
                }
                write_ref_anchor(writer, "eqreflink internal", "data-eqref", &label, number)?;
                i = end_of_subtree(events, i);
                continue;
            }
            // Relocated bodies get the same new-tab treatment as the rest
            // of the article.
            if elem.name().as_ref() == b"a" && is_external_link(elem) {
                writer.write_event(Event::Start(with_new_tab_attrs(elem)))?;
                i += 1;
                continue;
            }
        }
        writer.write_event(events[i].clone())?;
        i += 1;
    }
    Ok(())
}

/// Index just past the end tag matching the start tag at `start`.
fn end_of_subtree(events: &[Event<'static>], start: usize) -> usize {
    let mut depth = 0usize;
    let mut i = start + 1;
    while i < events.len() {
        match &events[i] {
            Event::Start(e) if !is_void(e.name().as_ref()) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return i + 1;
                }
                depth -= 1;
            }
            _ => {}
        }
        i += 1;
    }
    i
}
