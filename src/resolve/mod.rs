//! Resolution pass: the load-time half of cross-referencing, run at build
//! time over the fully expanded document.
//!
//! Two strictly ordered sub-passes:
//!
//! 1. **scan** indexes every numbered target (figures by bound number,
//!    equations by scan order, footnote bodies, heading structure).
//! 2. **patch** streams the document through quick-xml again and rewrites it:
//!    reference placeholders get resolved numbers, footnote bodies move into
//!    their container, headings/sub-items get anchor ids, the sidebar list is
//!    regenerated, external article links open in new tabs, and head content
//!    (title, description meta, nav-sync script) is injected when absent.
//!
//! Both sub-passes are pure functions of the input bytes, and the patch pass
//! is idempotent: resolving an already-resolved document is byte-identical.

pub mod common;
mod equations;
mod figures;
mod footnotes;
mod scan;
mod sidebar;

use crate::config::SiteConfig;
use scan::{DocumentIndex, scan_document};
use anyhow::Result;
use common::{
    XmlWriter, attr_value, create_xml_reader, has_class, is_void, skip_subtree,
    write_empty_elem, write_script, write_text_element,
};
use footnotes::FootnoteRelocator;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};
use std::fmt;
use std::io::Cursor;

/// Reference categories that resolve against a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Figure,
    Equation,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefKind::Figure => write!(f, "figure"),
            RefKind::Equation => write!(f, "equation"),
        }
    }
}

/// A reference whose target label does not exist in the document.
#[derive(Debug, Clone)]
pub struct Unresolved {
    pub kind: RefKind,
    pub label: String,
}

/// What the patch pass did, for logging and `check`.
#[derive(Debug, Default)]
pub struct ResolveReport {
    pub unresolved: Vec<Unresolved>,
    pub footnotes_total: usize,
    pub footnotes_moved: usize,
    pub missing_footnote_container: bool,
    /// Mark and body counts disagree, usually hand-edited output.
    pub footnote_mark_mismatch: bool,
    pub nav_entries: usize,
    pub missing_nav_list: bool,
}

/// Resolved document plus its report.
pub struct Resolved {
    pub html: Vec<u8>,
    pub report: ResolveReport,
}

/// Resolve all cross-references in an expanded page.
pub fn resolve_html(content: &[u8], config: &SiteConfig) -> Result<Resolved> {
    let index = scan_document(content)?;

    let mut report = ResolveReport {
        footnotes_total: index.footnote_bodies.len(),
        nav_entries: index.nav.len(),
        missing_footnote_container: !index.footnote_bodies.is_empty()
            && !index.has_footnote_container,
        footnote_mark_mismatch: index.footnote_marks != index.footnote_bodies.len(),
        missing_nav_list: !index.nav.is_empty() && !index.has_nav_list,
        ..Default::default()
    };

    let mut writer: XmlWriter = Writer::new(Cursor::new(Vec::with_capacity(content.len())));
    let mut reader = create_xml_reader(content);
    let mut relocator = FootnoteRelocator::new(index.has_footnote_container);

    // Nesting count of open <article> elements.
    let mut in_article = 0usize;
    // Position in `index.nav`, advanced on each heading/sub-item.
    let mut nav_pos = 0usize;
    // Depth inside the footnote container while waiting for its end tag.
    let mut container_depth: Option<usize> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(elem)) => {
                if let Some(label) = attr_value(&elem, b"data-figref") {
                    figures::patch_figref(&mut reader, &mut writer, &label, &index, &mut report)?;
                    continue;
                }
                if let Some(label) = attr_value(&elem, b"data-eqref") {
                    equations::patch_eqref(&mut reader, &mut writer, &label, &index, &mut report)?;
                    continue;
                }
                if let Some(label) = attr_value(&elem, b"data-eqlabel") {
                    equations::patch_eqlabel(&mut reader, &mut writer, &label, &index, true)?;
                    continue;
                }
                if has_class(&elem, "footnote-text-all")
                    && relocator.try_capture(&mut reader, &elem)?
                {
                    continue;
                }
                if elem.name().as_ref() == b"ul" && has_class(&elem, "article-navigation-list") {
                    writer.write_event(Event::Start(elem.to_owned()))?;
                    sidebar::write_nav_list(&mut writer, &index.nav)?;
                    // Drop whatever the list held (stale entries from a
                    // previous resolve), then close it.
                    skip_subtree(&mut reader)?;
                    writer.write_event(Event::End(BytesEnd::new("ul")))?;
                    continue;
                }

                let name = elem.name().as_ref().to_vec();
                let out_elem = start_elem_for(&elem, &index, config, in_article, &mut nav_pos);
                if name == b"article" {
                    in_article += 1;
                }
                writer.write_event(Event::Start(out_elem))?;

                if let Some(depth) = container_depth.as_mut() {
                    if !is_void(&name) {
                        *depth += 1;
                    }
                } else if name == b"div" && has_class(&elem, "footnote-text-container") {
                    container_depth = Some(0);
                }
            }
            Ok(Event::Empty(elem)) => {
                if let Some(label) = attr_value(&elem, b"data-eqlabel") {
                    equations::patch_eqlabel(&mut reader, &mut writer, &label, &index, false)?;
                } else if elem.name().as_ref() == b"div"
                    && has_class(&elem, "footnote-text-container")
                {
                    // A self-closed container still receives the bodies; it
                    // is re-emitted open so they have somewhere to land.
                    writer.write_event(Event::Start(elem.to_owned()))?;
                    report.footnotes_moved = relocator.flush(&mut writer, &index, &mut report)?;
                    writer.write_event(Event::End(BytesEnd::new("div")))?;
                } else {
                    writer.write_event(Event::Empty(elem))?;
                }
            }
            Ok(Event::End(elem)) => {
                if let Some(depth) = container_depth.as_mut() {
                    if *depth == 0 {
                        report.footnotes_moved =
                            relocator.flush(&mut writer, &index, &mut report)?;
                        container_depth = None;
                    } else {
                        *depth -= 1;
                    }
                    writer.write_event(Event::End(elem))?;
                    continue;
                }
                match elem.name().as_ref() {
                    b"article" => {
                        in_article = in_article.saturating_sub(1);
                        writer.write_event(Event::End(elem))?;
                    }
                    b"head" => {
                        write_head_content(&mut writer, config, &index)?;
                        writer.write_event(Event::End(elem))?;
                    }
                    _ => writer.write_event(Event::End(elem))?,
                }
            }
            Ok(Event::Eof) => {
                // Container never closed: put the captured bodies back at
                // the end of the stream rather than dropping them.
                if relocator.has_pending() {
                    report.footnotes_moved = relocator.flush(&mut writer, &index, &mut report)?;
                }
                break;
            }
            Ok(event) => writer.write_event(event)?,
            Err(e) => anyhow::bail!(
                "HTML parse error at position {}: {:?}",
                reader.error_position(),
                e
            ),
        }
    }

    Ok(Resolved {
        html: writer.into_inner().into_inner(),
        report,
    })
}

/// Decide how a plain start element is written: anchor ids for headings and
/// sub-items, `lang` on `<html>`, new-tab attributes on external article
/// links. Everything else passes through unchanged.
fn start_elem_for(
    elem: &BytesStart<'_>,
    index: &DocumentIndex,
    config: &SiteConfig,
    in_article: usize,
    nav_pos: &mut usize,
) -> BytesStart<'static> {
    match elem.name().as_ref() {
        b"h2" if in_article > 0 => {
            let entry = index.nav.get(*nav_pos);
            *nav_pos += 1;
            match entry {
                Some(entry) => sidebar::with_anchor_id(elem, entry),
                None => elem.to_owned(),
            }
        }
        b"span" if has_class(elem, "article-subnav-item") => {
            let entry = index.nav.get(*nav_pos);
            *nav_pos += 1;
            match entry {
                Some(entry) => sidebar::with_anchor_id(elem, entry),
                None => elem.to_owned(),
            }
        }
        b"html" => with_lang(elem, config),
        b"a" if in_article > 0 && is_external_link(elem) => with_new_tab_attrs(elem),
        _ => elem.to_owned(),
    }
}

/// Add the configured `lang` attribute to `<html>` when absent.
fn with_lang(elem: &BytesStart<'_>, config: &SiteConfig) -> BytesStart<'static> {
    let mut elem = elem.to_owned();
    if config.base.language.is_empty() || attr_value(&elem, b"lang").is_some() {
        return elem;
    }
    elem.push_attribute(("lang", config.base.language.as_str()));
    elem
}

/// Non-internal absolute links inside the article open in a new tab.
fn is_external_link(elem: &BytesStart<'_>) -> bool {
    if has_class(elem, "internal") {
        return false;
    }
    attr_value(elem, b"href")
        .is_some_and(|href| href.starts_with("http://") || href.starts_with("https://"))
}

fn with_new_tab_attrs(elem: &BytesStart<'_>) -> BytesStart<'static> {
    let has_target = attr_value(elem, b"target").is_some();
    let has_rel = attr_value(elem, b"rel").is_some();
    let mut elem = elem.to_owned();
    if !has_target {
        elem.push_attribute(("target", "_blank"));
    }
    if !has_rel {
        elem.push_attribute(("rel", "noopener noreferrer"));
    }
    elem
}

/// Write head content before the closing tag, skipping anything the page
/// already carries so re-resolving stays idempotent.
fn write_head_content(
    writer: &mut XmlWriter,
    config: &SiteConfig,
    index: &DocumentIndex,
) -> Result<()> {
    if !index.has_title && !config.base.title.is_empty() {
        write_text_element(writer, "title", &config.base.title)?;
    }
    if !index.has_meta_description && !config.base.description.is_empty() {
        write_empty_elem(
            writer,
            "meta",
            &[
                ("name", "description"),
                ("content", &config.base.description),
            ],
        )?;
    }
    if config.build.nav_sync && index.has_nav_list && !index.has_nav_script {
        write_script(writer, "/nav-sync.js", true)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::expand_document;

    fn resolve(html: &str) -> Resolved {
        resolve_html(html.as_bytes(), &SiteConfig::default()).unwrap()
    }

    fn pipeline(input: &str) -> Resolved {
        let config = SiteConfig::default();
        let expanded = expand_document(input, &config).unwrap();
        resolve_html(expanded.as_bytes(), &config).unwrap()
    }

    fn html_str(resolved: &Resolved) -> String {
        String::from_utf8_lossy(&resolved.html).into_owned()
    }

    #[test]
    fn test_figref_resolves_to_true_target_number() {
        // Reference-before-target ordering: the reference to the *second*
        // figure must display 2, not a constant.
        let input = "<article>\
            {% figref fig:b %}\
            {% figure %}src={a.png}\nlabel={fig:a}{% endfigure %}\
            {% figure %}src={b.png}\nlabel={fig:b}{% endfigure %}\
            </article>";
        let resolved = pipeline(input);
        let html = html_str(&resolved);
        assert!(html.contains("data-figref=\"fig:b\">2</a>"));
        assert!(resolved.report.unresolved.is_empty());
    }

    #[test]
    fn test_figref_first_figure_scenario() {
        let input = "<article>\
            {% figure %}src={a.png}\nalt={A}\ncaption={First}\nlabel={fig:a}{% endfigure %}\
            <p>{% figref fig:a %}</p>\
            </article>";
        let html = html_str(&pipeline(input));
        assert!(html.contains("src=\"/assets/images/a.png\""));
        assert!(html.contains("figure-1"));
        assert!(html.contains("data-figref=\"fig:a\">1</a>"));
    }

    #[test]
    fn test_unresolved_figref_keeps_marker() {
        let resolved = pipeline("<article>{% figref fig:ghost %}</article>");
        let html = html_str(&resolved);
        assert!(html.contains("xref-missing"));
        assert!(html.contains(">??</a>"));
        assert_eq!(resolved.report.unresolved.len(), 1);
        assert_eq!(resolved.report.unresolved[0].label, "fig:ghost");
        assert_eq!(resolved.report.unresolved[0].kind, RefKind::Figure);
    }

    #[test]
    fn test_equations_resolve_in_scan_order() {
        // References precede their targets; numbers follow marker order.
        let input = "<article>\
            <p>{% eqref eq:b %} and {% eqref eq:a %}</p>\
            {% latex display %}a = 1 \\label{eq:a}{% endlatex %}\
            {% latex display %}b = 2 \\label{eq:b}{% endlatex %}\
            </article>";
        let resolved = pipeline(input);
        let html = html_str(&resolved);
        assert!(html.contains("data-eqref=\"eq:a\">1</a>"));
        assert!(html.contains("data-eqref=\"eq:b\">2</a>"));
        assert!(html.contains("id=\"eq:a\" data-eqlabel=\"eq:a\">(1)</span>"));
        assert!(html.contains("id=\"eq:b\" data-eqlabel=\"eq:b\">(2)</span>"));
        assert!(resolved.report.unresolved.is_empty());
    }

    #[test]
    fn test_footnote_bodies_move_into_container_sorted() {
        let input = "<article>\
            <p>one{% footnote first note %}</p>\
            <p>two{% footnote second note %}</p>\
            </article>\
            <div class=\"footnote-text-container\"></div>";
        let resolved = pipeline(input);
        let html = html_str(&resolved);

        // Both bodies live inside the container, ascending.
        let container = html
            .split("<div class=\"footnote-text-container\">")
            .nth(1)
            .unwrap();
        let first = container.find("id=\"footnote-1\"").unwrap();
        let second = container.find("id=\"footnote-2\"").unwrap();
        assert!(first < second);

        // Marks stay in the article, before the container.
        let article_part = html
            .split("<div class=\"footnote-text-container\">")
            .next()
            .unwrap();
        assert!(article_part.contains("href=\"#footnote-1\""));
        assert!(article_part.contains("id=\"footnote-mark-2\""));
        assert!(!article_part.contains("footnote-text-all"));

        assert_eq!(resolved.report.footnotes_moved, 2);
        assert!(!resolved.report.missing_footnote_container);
    }

    #[test]
    fn test_footnote_bodies_move_into_self_closed_container() {
        let input = "<article><p>x{% footnote a note %}</p></article>\
            <div class=\"footnote-text-container\"/>";
        let resolved = pipeline(input);
        let html = html_str(&resolved);

        let container = html
            .split("<div class=\"footnote-text-container\">")
            .nth(1)
            .unwrap();
        assert!(container.contains("a note"));
        assert!(container.contains("id=\"footnote-1\""));
        assert_eq!(resolved.report.footnotes_moved, 1);
    }

    #[test]
    fn test_footnote_bodies_survive_unclosed_container() {
        // Malformed input, but the body text must not vanish from the page.
        let input = "<article><p>x{% footnote a note %}</p></article>\
            <div class=\"footnote-text-container\">";
        let resolved = pipeline(input);
        let html = html_str(&resolved);
        assert!(html.contains("a note"));
        assert!(html.contains("id=\"footnote-1\""));
        assert_eq!(resolved.report.footnotes_moved, 1);
    }

    #[test]
    fn test_external_link_inside_footnote_body_opens_new_tab() {
        let html = "<article>\
             <span class=\"footnote-text-all\" id=\"footnote-1\">\
             <span class=\"footnote-text\">see \
             <a href=\"https://example.com\">ref</a></span></span>\
             </article>\
             <div class=\"footnote-text-container\"></div>";
        let resolved = resolve(html);
        let out = html_str(&resolved);
        let container = out
            .split("<div class=\"footnote-text-container\">")
            .nth(1)
            .unwrap();
        assert!(container.contains(
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">ref</a>"
        ));
    }

    #[test]
    fn test_footnotes_without_container_stay_inline() {
        let input = "<article><p>x{% footnote orphan %}</p></article>";
        let resolved = pipeline(input);
        let html = html_str(&resolved);
        assert!(html.contains("footnote-text-all"));
        assert!(resolved.report.missing_footnote_container);
        assert_eq!(resolved.report.footnotes_moved, 0);
    }

    #[test]
    fn test_figref_inside_footnote_body_resolves() {
        // A reference placeholder riding inside a relocated footnote body
        // still gets patched when the body is replayed into the container.
        let html = "<article>\
             <img class=\"figure-image figure-1\" id=\"fig:a\" src=\"/i/a.png\"/>\
             <span class=\"footnote-text-all\" id=\"footnote-1\">\
             <span class=\"footnote-text\">see Figure \
             <a class=\"internal\" href=\"#fig:a\" data-figref=\"fig:a\">??</a></span></span>\
             </article>\
             <div class=\"footnote-text-container\"></div>";
        let resolved = resolve(html);
        let out = html_str(&resolved);
        let container = out
            .split("<div class=\"footnote-text-container\">")
            .nth(1)
            .unwrap();
        assert!(container.contains("data-figref=\"fig:a\">1</a>"));
    }

    #[test]
    fn test_sidebar_list_and_anchor_ids() {
        let input = "<html><head></head><body><article>\
            <h2>Getting Started</h2>\
            <p>{% navitem Key Idea %}</p>\
            <h2 id=\"wrap-up\">Wrap Up</h2>\
            </article>\
            <nav><ul class=\"article-navigation-list\"></ul></nav>\
            </body></html>";
        let resolved = pipeline(input);
        let html = html_str(&resolved);

        assert!(html.contains("<h2 id=\"Getting_Started\">"));
        assert!(html.contains("<span class=\"article-subnav-item\" id=\"Key_Idea\">"));
        // Existing ids are kept, not regenerated.
        assert!(html.contains("<h2 id=\"wrap-up\">"));

        assert!(html.contains("<li><a class=\"internal\" href=\"#Getting_Started\">Getting Started</a></li>"));
        assert!(html.contains("<li class=\"subnavitem\"><a class=\"internal\" href=\"#Key_Idea\">Key Idea</a></li>"));
        assert!(html.contains("<li><a class=\"internal\" href=\"#wrap-up\">Wrap Up</a></li>"));

        // The nav-sync script was injected into the head.
        assert!(html.contains("<script src=\"/nav-sync.js\" defer=\"\">"));
        assert_eq!(resolved.report.nav_entries, 3);
    }

    #[test]
    fn test_external_links_open_in_new_tab() {
        let html = html_str(&resolve(
            "<article>\
             <a href=\"https://example.com\">ext</a>\
             <a class=\"internal\" href=\"#x\">int</a>\
             <a href=\"/local\">local</a>\
             </article>\
             <a href=\"https://example.com\">outside</a>",
        ));
        assert!(html.contains(
            "<a href=\"https://example.com\" target=\"_blank\" rel=\"noopener noreferrer\">ext</a>"
        ));
        assert!(html.contains("<a class=\"internal\" href=\"#x\">int</a>"));
        assert!(html.contains("<a href=\"/local\">local</a>"));
        // Links outside the article are untouched.
        assert!(html.contains("<a href=\"https://example.com\">outside</a>"));
    }

    #[test]
    fn test_resolve_is_idempotent() {
        let input = "<html lang=\"en\"><head><title>t</title></head><body><article>\
            <h2>Section</h2>\
            {% figure %}src={a.png}\nlabel={fig:a}{% endfigure %}\
            <p>{% figref fig:a %}{% footnote note %}</p>\
            {% latex display %}x \\label{eq:x}{% endlatex %}\
            <p>{% eqref eq:x %}</p>\
            </article>\
            <nav><ul class=\"article-navigation-list\"></ul></nav>\
            <div class=\"footnote-text-container\"></div>\
            </body></html>";
        let config = SiteConfig::default();
        let expanded = expand_document(input, &config).unwrap();
        let once = resolve_html(expanded.as_bytes(), &config).unwrap();
        let twice = resolve_html(&once.html, &config).unwrap();
        assert_eq!(once.html, twice.html);
    }

    #[test]
    fn test_full_pipeline_is_deterministic() {
        let input = "<article>{% figure %}src={a.png}\nlabel={fig:a}{% endfigure %}\
                     {% figref fig:a %}</article>";
        let a = html_str(&pipeline(input));
        let b = html_str(&pipeline(input));
        assert_eq!(a, b);
    }
}
