//! `footnote` inline tag.
//!
//! Emits the superscript mark and the footnote body side by side at the
//! authoring position. The resolver later lifts every body into the page's
//! footnote container, keeping the marks in place. Mark and body link to each
//! other through `footnote-mark-<n>` / `footnote-<n>` ids.

use crate::counter::Kind;
use crate::expand::ExpandContext;

/// Expand a `{% footnote <text> %}` tag.
pub fn expand_footnote(markup: &str, ctx: &mut ExpandContext<'_>) -> String {
    let number = ctx.counters.next(Kind::Footnote);
    let text = markup.trim();

    let mark = format!(
        "<sup><a href=\"#footnote-{number}\" id=\"footnote-mark-{number}\" \
         class=\"internal footnote-mark\">{number}</a></sup>"
    );
    let body = format!(
        "<span class=\"footnote-text-all\" id=\"footnote-{number}\">\
         <span class=\"footnote-number\"><sup>\
         <a href=\"#footnote-mark-{number}\" class=\"internal\">{number}</a>\
         </sup></span>\
         <span class=\"footnote-text\">{text}</span></span>"
    );

    format!("{mark}{body}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::counter::Counters;

    #[test]
    fn test_footnote_mark_and_body_are_paired() {
        let config = SiteConfig::default();
        let mut ctx = ExpandContext {
            config: &config,
            counters: Counters::new(),
        };
        let html = expand_footnote("a remark", &mut ctx);

        assert!(html.contains("href=\"#footnote-1\""));
        assert!(html.contains("id=\"footnote-mark-1\""));
        assert!(html.contains("id=\"footnote-1\""));
        assert!(html.contains("href=\"#footnote-mark-1\""));
        assert!(html.contains("<span class=\"footnote-text\">a remark</span>"));
    }

    #[test]
    fn test_footnote_numbers_increase_in_document_order() {
        let config = SiteConfig::default();
        let mut ctx = ExpandContext {
            config: &config,
            counters: Counters::new(),
        };
        expand_footnote("first", &mut ctx);
        let second = expand_footnote("second", &mut ctx);
        assert!(second.contains("id=\"footnote-2\""));
        assert!(second.contains(">2</a></sup>"));
    }
}
