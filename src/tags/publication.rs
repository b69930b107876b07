//! `publication` block: numbered bibliography entries.
//!
//! Entries share the per-document bibliography counter. A `reset` flag in the
//! tag markup restarts numbering at 1, which is how several independent
//! publication lists coexist on one page.

use super::{escape, parse_kv};
use crate::counter::Kind;
use crate::expand::ExpandContext;

/// Link kinds rendered below the citation text, in fixed order.
const LINK_KINDS: &[(&str, &str)] = &[
    ("arxiv", "PDF"),
    ("researchgate", "PDF"),
    ("openreview", "PDF"),
    ("github", "Code"),
];

/// Expand a `{% publication [reset] %}` block body into a bibliography entry.
///
/// A body with no parseable `key={value}` pairs renders as empty output and
/// consumes no bibliography number; the `reset` flag only takes effect when
/// the entry actually renders.
pub fn expand_publication(markup: &str, body: &str, ctx: &mut ExpandContext<'_>) -> String {
    let info = parse_kv(body);
    if info.is_empty() {
        return String::new();
    }

    if markup.split_whitespace().any(|flag| flag == "reset") {
        ctx.counters.reset(Kind::Bibliography);
    }
    let number = ctx.counters.next(Kind::Bibliography);

    let authors = highlight_author(info.get("authors").unwrap_or(&""), ctx);
    let title = info.get("title").unwrap_or(&"");
    let venue = info.get("venue").unwrap_or(&"");
    let year = info.get("year").unwrap_or(&"");

    let mut out = String::with_capacity(512);
    out.push_str("<div class=\"bibentry\">");
    out.push_str(&format!(
        "<div class=\"bibentry-counter\">[{number}]</div>"
    ));
    out.push_str("<div class=\"bibentry-content\">");
    out.push_str(&format!(
        "<div class=\"bibentry-text\">{authors}, \"{title},\" <i>{venue}</i>, {year}.</div>"
    ));

    if LINK_KINDS.iter().any(|(kind, _)| info.contains_key(kind)) {
        out.push_str("<div class=\"bibentry-links\">");
        for (kind, prefix) in LINK_KINDS {
            let Some(id) = info.get(kind) else { continue };
            out.push_str("<span class=\"bibentry-link-entry\">");
            out.push_str(&format!(
                "<span class=\"bibentry-link-entry-text\">{prefix}:</span>"
            ));
            out.push_str(&link_anchor(kind, id));
            out.push_str("</span>");
        }
        out.push_str("</div>");
    }

    if let Some(award) = info.get("award") {
        out.push_str(&format!(
            "<div class=\"bibentry-award\">\
             <span class=\"bibentry-award-textarea\">\
             <i class=\"fas fa-trophy\"></i> {award}</span></div>"
        ));
    }

    out.push_str("</div></div>");
    out
}

/// Bold the configured author name wherever it appears in the author list.
fn highlight_author(authors: &str, ctx: &ExpandContext<'_>) -> String {
    match &ctx.config.render.highlight_author {
        Some(name) if !name.is_empty() => authors.replace(name, &format!("<b>{name}</b>")),
        _ => authors.to_owned(),
    }
}

/// External link anchor for one link kind.
fn link_anchor(kind: &str, id: &str) -> String {
    let id = escape(id);
    let (href, text) = match kind {
        "arxiv" => (format!("https://arxiv.org/abs/{id}"), "arXiv.org".to_owned()),
        "researchgate" => (
            format!("https://www.researchgate.net/publication/{id}"),
            "<i class=\"fab fa-researchgate\"></i>".to_owned(),
        ),
        "openreview" => (
            format!("https://openreview.net/forum?id={id}"),
            "OpenReview<span class=\"openreview-net\">.net</span>".to_owned(),
        ),
        _ => (
            format!("https://github.com/{id}"),
            "<i class=\"fab fa-github-square\"></i>".to_owned(),
        ),
    };
    format!(
        "<a class=\"{kind}\" href=\"{href}\" \
         target=\"_blank\" rel=\"noopener noreferrer\">{text}</a>"
    )
}
