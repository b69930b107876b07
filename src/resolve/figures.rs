//! Figure reference patching.
//!
//! A `figref` placeholder resolves to the number bound to its target label in
//! the scan index, never to a constant, so multi-figure pages get the true
//! target number regardless of where the reference sits relative to the
//! figure.

use super::common::{XmlWriter, skip_subtree};
use super::scan::DocumentIndex;
use super::{RefKind, ResolveReport, Unresolved};
use anyhow::Result;
use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Rewrite a reference anchor with its resolved number, or the `??` marker
/// plus an `xref-missing` class when the target label does not exist.
pub fn write_ref_anchor(
    writer: &mut XmlWriter,
    base_class: &str,
    attr_name: &str,
    label: &str,
    number: Option<u32>,
) -> Result<()> {
    let class = match number {
        Some(_) => base_class.to_owned(),
        None => format!("{base_class} xref-missing"),
    };
    let href = format!("#{label}");

    let mut anchor = BytesStart::new("a");
    anchor.push_attribute(("class", class.as_str()));
    anchor.push_attribute(("href", href.as_str()));
    anchor.push_attribute((attr_name, label));
    writer.write_event(Event::Start(anchor))?;

    let text = match number {
        Some(n) => n.to_string(),
        None => "??".to_owned(),
    };
    writer.write_event(Event::Text(BytesText::new(&text)))?;
    writer.write_event(Event::End(BytesEnd::new("a")))?;
    Ok(())
}

/// Patch a `data-figref` anchor whose start tag was just read. Consumes the
/// original placeholder content up to the matching end tag.
pub fn patch_figref(
    reader: &mut Reader<&[u8]>,
    writer: &mut XmlWriter,
    label: &str,
    index: &DocumentIndex,
    report: &mut ResolveReport,
) -> Result<()> {
    let number = index.figures.get(label).copied();
    if number.is_none() {
        report.unresolved.push(Unresolved {
            kind: RefKind::Figure,
            label: label.to_owned(),
        });
    }
    write_ref_anchor(writer, "internal", "data-figref", label, number)?;
    skip_subtree(reader)
}
