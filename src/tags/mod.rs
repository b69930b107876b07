//! Template tag handlers.
//!
//! Each submodule expands one authoring tag into HTML carrying the attribute
//! contract consumed by the resolver (`crate::resolve`). Handlers are pure
//! functions of `(markup, body, context)`; all numbering state lives in the
//! per-document `Counters` inside `ExpandContext`.

pub mod equation;
pub mod figure;
pub mod footnote;
pub mod navigation;
pub mod publication;
pub mod youtube;

use crate::expand::ExpandContext;
use regex::Regex;
use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::LazyLock;
use thiserror::Error;

/// Tag names that take a `{% name %}...{% endname %}` body.
pub const BLOCK_TAGS: &[&str] = &["figure", "publication", "latex", "latexmm"];

/// `key={value}` line pattern for figure and publication bodies.
static KV_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^([a-z]+)=\{(.*?)\}").expect("valid kv regex"));

/// Unanchored `key={value}` pattern, for pairs written inside tag markup.
static KV_INLINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([a-z]+)=\{([^{}]*)\}").expect("valid inline kv regex"));

/// Fatal tag expansion errors.
///
/// Only embed-style tags fail the build; malformed figure/publication bodies
/// degrade to empty output instead (see `parse_kv` callers).
#[derive(Debug, Error)]
pub enum TagError {
    #[error("no YouTube ID provided in the `youtube` tag")]
    MissingVideoId,

    #[error("malformed `youtube` tag markup: `{0}` (expected `<id> [width height]`)")]
    MalformedEmbed(String),

    #[error("unterminated `{{% {0} %}}` block: missing `{{% end{0} %}}`")]
    UnterminatedBlock(String),
}

/// Whether `name` is a block tag (has a body and an `end` marker).
pub fn is_block(name: &str) -> bool {
    BLOCK_TAGS.contains(&name)
}

/// Expand a block tag. Returns `None` for unknown names (passthrough).
pub fn expand_block(
    name: &str,
    markup: &str,
    body: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Option<String>, TagError> {
    let html = match name {
        "figure" => figure::expand_figure(markup, body, ctx),
        "publication" => publication::expand_publication(markup, body, ctx),
        "latex" => equation::expand_latex(markup, body),
        "latexmm" => equation::expand_latexmm(body),
        _ => return Ok(None),
    };
    Ok(Some(html))
}

/// Expand an inline tag. Returns `None` for unknown names (passthrough).
pub fn expand_inline(
    name: &str,
    markup: &str,
    ctx: &mut ExpandContext<'_>,
) -> Result<Option<String>, TagError> {
    let html = match name {
        "figref" => figure::expand_figref(markup),
        "eqref" => equation::expand_eqref(markup),
        "footnote" => footnote::expand_footnote(markup, ctx),
        "navitem" => navigation::expand_navitem(markup),
        "youtube" => youtube::expand_youtube(markup, ctx)?,
        _ => return Ok(None),
    };
    Ok(Some(html))
}

/// Parse `key={value}` lines from a block body.
///
/// Unknown keys are kept (callers ignore what they don't use). Lines not
/// matching the pattern are skipped; an empty map signals the caller to
/// render nothing.
pub fn parse_kv(body: &str) -> HashMap<&str, &str> {
    collect_kv(&KV_RE, body)
}

/// Parse `key={value}` pairs written in a tag's markup, position-free.
pub fn parse_kv_markup(markup: &str) -> HashMap<&str, &str> {
    collect_kv(&KV_INLINE_RE, markup)
}

fn collect_kv<'a>(re: &Regex, input: &'a str) -> HashMap<&'a str, &'a str> {
    re.captures_iter(input)
        .filter_map(|caps| match (caps.get(1), caps.get(2)) {
            (Some(k), Some(v)) => Some((k.as_str(), v.as_str())),
            _ => None,
        })
        .collect()
}

/// Escape text for use in an attribute value or text node.
pub fn escape(raw: &str) -> Cow<'_, str> {
    quick_xml::escape::escape(raw)
}
