//! Equation marker numbering and `eqref` patching.
//!
//! Equation numbers are assigned by the scan pass in document scan order; the
//! patch pass writes them into the marker spans (which also receive their
//! label as an element id, making the `href="#label"` links land) and into
//! every reference placeholder sharing the label.

use super::common::{XmlWriter, skip_subtree};
use super::figures::write_ref_anchor;
use super::scan::DocumentIndex;
use super::{RefKind, ResolveReport, Unresolved};
use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Patch a `data-eqref` anchor whose start tag was just read.
pub fn patch_eqref(
    reader: &mut Reader<&[u8]>,
    writer: &mut XmlWriter,
    label: &str,
    index: &DocumentIndex,
    report: &mut ResolveReport,
) -> Result<()> {
    let number = index.equations.get(label).copied();
    if number.is_none() {
        report.unresolved.push(Unresolved {
            kind: RefKind::Equation,
            label: label.to_owned(),
        });
    }
    write_ref_anchor(writer, "eqreflink internal", "data-eqref", label, number)?;
    skip_subtree(reader)
}

/// Rewrite an equation marker span with its label id and display number.
///
/// `had_content` distinguishes `<span ...></span>` (start + end events, the
/// original content must be consumed) from a self-closed `<span .../>`.
pub fn patch_eqlabel(
    reader: &mut Reader<&[u8]>,
    writer: &mut XmlWriter,
    label: &str,
    index: &DocumentIndex,
    had_content: bool,
) -> Result<()> {
    let mut span = BytesStart::new("span");
    span.push_attribute(("class", "eqlabel"));
    span.push_attribute(("id", label));
    span.push_attribute(("data-eqlabel", label));
    writer.write_event(Event::Start(span))?;

    // Every marker is indexed by the scan pass, so the lookup always hits.
    if let Some(number) = index.equations.get(label) {
        let text = format!("({number})");
        writer.write_event(Event::Text(BytesText::new(&text)))?;
    }
    writer.write_event(Event::End(BytesEnd::new("span")))?;

    if had_content {
        skip_subtree(reader)?;
    }
    Ok(())
}
