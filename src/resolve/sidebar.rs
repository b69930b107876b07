//! Sidebar list derivation.
//!
//! The scan pass collects headings and flagged sub-items; here the patch pass
//! stamps generated anchor ids onto elements that lack one and regenerates
//! the `article-navigation-list` contents from scratch (so re-resolving a
//! page never duplicates entries). Scroll position sync and current-section
//! highlighting live in the shipped `nav-sync.js` asset, which works against
//! the ids and list produced here.

use super::common::XmlWriter;
use super::scan::NavEntry;
use anyhow::Result;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// Return the heading/sub-item start tag, with the generated anchor id added
/// when the element had none.
pub fn with_anchor_id(elem: &BytesStart<'_>, entry: &NavEntry) -> BytesStart<'static> {
    let mut elem = elem.to_owned();
    if !entry.had_id {
        elem.push_attribute(("id", entry.id.as_str()));
    }
    elem
}

/// Write the sidebar `<li>` entries, one per nav entry in document order.
pub fn write_nav_list(writer: &mut XmlWriter, nav: &[NavEntry]) -> Result<()> {
    for entry in nav {
        let mut li = BytesStart::new("li");
        if entry.sub {
            li.push_attribute(("class", "subnavitem"));
        }
        writer.write_event(Event::Start(li))?;

        let href = format!("#{}", entry.id);
        let mut anchor = BytesStart::new("a");
        anchor.push_attribute(("class", "internal"));
        anchor.push_attribute(("href", href.as_str()));
        writer.write_event(Event::Start(anchor))?;
        writer.write_event(Event::Text(BytesText::new(&entry.text)))?;
        writer.write_event(Event::End(BytesEnd::new("a")))?;

        writer.write_event(Event::End(BytesEnd::new("li")))?;
    }
    Ok(())
}
