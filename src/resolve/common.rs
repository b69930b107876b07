//! Shared quick-xml plumbing for the resolution passes.

use anyhow::Result;
use quick_xml::{
    Reader, Writer,
    events::{BytesEnd, BytesStart, BytesText, Event, attributes::Attribute},
};
use std::io::Cursor;

pub type XmlWriter = Writer<Cursor<Vec<u8>>>;

/// HTML elements that never carry content; their start tags do not open a
/// nesting level even when written without `/>`.
const VOID_ELEMENTS: &[&[u8]] = &[
    b"area", b"base", b"br", b"col", b"embed", b"hr", b"img", b"input", b"link", b"meta",
    b"source", b"track", b"wbr",
];

#[inline]
pub fn is_void(tag: &[u8]) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

#[inline]
pub fn create_xml_reader(content: &[u8]) -> Reader<&[u8]> {
    let mut reader = Reader::from_reader(content);
    reader.config_mut().trim_text(false);
    reader.config_mut().enable_all_checks(false);
    reader
}

/// Unescaped value of the named attribute, if present.
pub fn attr_value(elem: &BytesStart<'_>, name: &[u8]) -> Option<String> {
    elem.attributes().flatten().find_map(|attr| {
        if attr.key.as_ref() == name {
            Some(unescape_attr(&attr))
        } else {
            None
        }
    })
}

/// Whether the element's `class` attribute contains `token`.
pub fn has_class(elem: &BytesStart<'_>, token: &str) -> bool {
    attr_value(elem, b"class")
        .is_some_and(|classes| classes.split_whitespace().any(|c| c == token))
}

fn unescape_attr(attr: &Attribute<'_>) -> String {
    match attr.unescape_value() {
        Ok(value) => value.into_owned(),
        Err(_) => String::from_utf8_lossy(attr.value.as_ref()).into_owned(),
    }
}

/// Write a text element: `<tag>text</tag>`.
#[inline]
pub fn write_text_element(writer: &mut XmlWriter, tag: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(tag)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}

/// Write an empty element with attributes: `<tag attr1="val1" ... />`.
#[inline]
pub fn write_empty_elem(writer: &mut XmlWriter, tag: &str, attrs: &[(&str, &str)]) -> Result<()> {
    let mut elem = BytesStart::new(tag);
    for (k, v) in attrs {
        elem.push_attribute((*k, *v));
    }
    writer.write_event(Event::Empty(elem))?;
    Ok(())
}

/// Write a script element with optional defer.
pub fn write_script(writer: &mut XmlWriter, src: &str, defer: bool) -> Result<()> {
    let mut elem = BytesStart::new("script");
    elem.push_attribute(("src", src));
    if defer {
        elem.push_attribute(("defer", ""));
    }
    writer.write_event(Event::Start(elem))?;
    // Space ensures proper HTML parsing of script tags
    writer.write_event(Event::Text(BytesText::new(" ")))?;
    writer.write_event(Event::End(BytesEnd::new("script")))?;
    Ok(())
}

/// Consume events until the end tag matching an already-read start tag,
/// discarding everything in between.
pub fn skip_subtree(reader: &mut Reader<&[u8]>) -> Result<()> {
    let mut depth = 0usize;
    loop {
        match reader.read_event()? {
            Event::Start(e) if !is_void(e.name().as_ref()) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    return Ok(());
                }
                depth -= 1;
            }
            Event::Eof => anyhow::bail!("unexpected end of document inside element"),
            _ => {}
        }
    }
}

/// Capture an element's whole subtree (start tag included) as owned events.
pub fn capture_subtree(
    reader: &mut Reader<&[u8]>,
    start: &BytesStart<'_>,
) -> Result<Vec<Event<'static>>> {
    let mut events: Vec<Event<'static>> = vec![Event::Start(start.to_owned())];
    let mut depth = 0usize;
    loop {
        let ev = reader.read_event()?;
        match &ev {
            Event::Start(e) if !is_void(e.name().as_ref()) => depth += 1,
            Event::End(_) => {
                if depth == 0 {
                    events.push(ev.into_owned());
                    return Ok(events);
                }
                depth -= 1;
            }
            Event::Eof => anyhow::bail!("unexpected end of document inside element"),
            _ => {}
        }
        events.push(ev.into_owned());
    }
}
