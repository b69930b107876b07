//! `figure` block and `figref` inline tag.
//!
//! A figure block renders an `<img>` wrapped with a numbered caption. The
//! assigned number is exposed as a `figure-<n>` class token and the label (if
//! any) as the element id, which is what the resolver greps for when patching
//! `figref` placeholders.

use super::{escape, parse_kv, parse_kv_markup};
use crate::counter::Kind;
use crate::expand::ExpandContext;

/// Expand a `{% figure %}` block into a figure container.
///
/// `key={value}` pairs are read from the block body (one per line) and from
/// the tag markup itself; body pairs win on conflict. No parseable pairs, or
/// a missing `src` key, renders as empty output and does not consume a
/// figure number, so numbering stays contiguous across the page.
pub fn expand_figure(markup: &str, body: &str, ctx: &mut ExpandContext<'_>) -> String {
    let mut info = parse_kv_markup(markup);
    info.extend(parse_kv(body));
    let Some(src) = info.get("src") else {
        return String::new();
    };

    let number = ctx.counters.next(Kind::Figure);
    let image_base = ctx.config.render.image_base.trim_end_matches('/');

    let mut out = String::with_capacity(256);
    out.push_str("<div class=\"figure-container\">");
    out.push_str(&format!(
        "<img class=\"figure-image figure-{number}\" src=\"{image_base}/{}\"",
        escape(src)
    ));
    if let Some(alt) = info.get("alt") {
        out.push_str(&format!(" alt=\"{}\"", escape(alt)));
    }
    if let Some(label) = info.get("label") {
        out.push_str(&format!(" id=\"{}\"", escape(label)));
    }
    if let Some(width) = info.get("width") {
        out.push_str(&format!(" width=\"{}\"", escape(width)));
    }
    out.push_str("/>");

    out.push_str("<div class=\"figure-caption\"");
    if let Some(captionwidth) = info.get("captionwidth") {
        out.push_str(&format!(" style=\"width: {};\"", escape(captionwidth)));
    }
    out.push('>');
    out.push_str(&format!(
        "<span class=\"figure-number\">Figure {number}</span>. "
    ));
    // Captions may contain authored HTML, inserted as-is.
    out.push_str(info.get("caption").unwrap_or(&""));
    out.push_str("</div></div>");
    out
}

/// Expand a `{% figref <label> %}` tag into a reference placeholder.
///
/// The target label rides in `data-figref` so the resolver can match it
/// byte-for-byte, whatever characters the label contains. The visible `??`
/// is replaced with the target's number at resolution time.
pub fn expand_figref(markup: &str) -> String {
    let label = markup.trim();
    let label = escape(label);
    format!(
        "<span class=\"figref\">Figure \
         <a class=\"internal\" href=\"#{label}\" data-figref=\"{label}\">??</a></span>"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::counter::Counters;

    fn ctx_with<'a>(config: &'a SiteConfig) -> ExpandContext<'a> {
        ExpandContext {
            config,
            counters: Counters::new(),
        }
    }

    #[test]
    fn test_figure_renders_image_and_caption() {
        let config = SiteConfig::default();
        let mut ctx = ctx_with(&config);
        let body = "src={a.png}\nalt={A}\ncaption={First}\nlabel={fig:a}";
        let html = expand_figure("", body, &mut ctx);

        assert!(html.contains("src=\"/assets/images/a.png\""));
        assert!(html.contains("class=\"figure-image figure-1\""));
        assert!(html.contains("id=\"fig:a\""));
        assert!(html.contains("<span class=\"figure-number\">Figure 1</span>. First"));
    }

    #[test]
    fn test_figure_numbers_are_sequential() {
        let config = SiteConfig::default();
        let mut ctx = ctx_with(&config);
        expand_figure("", "src={a.png}\ncaption={A}", &mut ctx);
        let second = expand_figure("", "src={b.png}\ncaption={B}", &mut ctx);
        assert!(second.contains("figure-2"));
        assert!(second.contains("Figure 2"));
    }

    #[test]
    fn test_figure_missing_src_is_empty_and_skips_no_number() {
        let config = SiteConfig::default();
        let mut ctx = ctx_with(&config);
        assert_eq!(expand_figure("", "caption={orphan}", &mut ctx), "");
        assert_eq!(expand_figure("", "", &mut ctx), "");

        // The next valid figure is still number 1.
        let html = expand_figure("", "src={a.png}\ncaption={A}", &mut ctx);
        assert!(html.contains("figure-1"));
    }

    #[test]
    fn test_figure_optional_widths() {
        let config = SiteConfig::default();
        let mut ctx = ctx_with(&config);
        let body = "src={a.png}\nwidth={300}\ncaptionwidth={50%}";
        let html = expand_figure("", body, &mut ctx);
        assert!(html.contains("width=\"300\""));
        assert!(html.contains("style=\"width: 50%;\""));
    }

    #[test]
    fn test_figure_pairs_in_tag_markup() {
        let config = SiteConfig::default();
        let mut ctx = ctx_with(&config);
        let markup = "src={a.png} alt={A} caption={First} label={fig:a}";
        let html = expand_figure(markup, "", &mut ctx);

        assert!(html.contains("src=\"/assets/images/a.png\""));
        assert!(html.contains("id=\"fig:a\""));
        assert!(html.contains("Figure 1</span>. First"));
    }

    #[test]
    fn test_figref_carries_target_label() {
        let html = expand_figref("fig:a");
        assert!(html.contains("data-figref=\"fig:a\""));
        assert!(html.contains("href=\"#fig:a\""));
        assert!(html.contains(">??</a>"));
    }
}
