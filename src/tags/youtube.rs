//! `youtube` inline tag: responsive iframe embed.

use super::{TagError, escape};
use crate::expand::ExpandContext;
use regex::Regex;
use std::sync::LazyLock;

/// `<id> [width height]` markup syntax.
static SYNTAX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\S+)(?:\s+(\d+)\s+(\d+))?\s*$").expect("valid embed regex"));

/// Expand a `{% youtube <id> [width height] %}` tag.
///
/// A missing or malformed id is a fatal build error, unlike the figure and
/// publication blocks which degrade to empty output.
pub fn expand_youtube(markup: &str, ctx: &ExpandContext<'_>) -> Result<String, TagError> {
    if markup.trim().is_empty() {
        return Err(TagError::MissingVideoId);
    }
    let caps = SYNTAX
        .captures(markup)
        .ok_or_else(|| TagError::MalformedEmbed(markup.trim().to_owned()))?;

    let id = caps.get(1).map_or("", |m| m.as_str());
    let (width, height) = match (caps.get(2), caps.get(3)) {
        (Some(w), Some(h)) => (
            w.as_str().parse().unwrap_or(ctx.config.render.youtube_width),
            h.as_str().parse().unwrap_or(ctx.config.render.youtube_height),
        ),
        _ => (
            ctx.config.render.youtube_width,
            ctx.config.render.youtube_height,
        ),
    };

    Ok(format!(
        "<iframe class=\"video\" width=\"{width}\" height=\"{height}\" \
         src=\"https://www.youtube.com/embed/{id}\" title=\"YouTube video player\" \
         frameborder=\"0\" allow=\"accelerometer; autoplay; clipboard-write; \
         encrypted-media; gyroscope; picture-in-picture\" allowfullscreen=\"\"></iframe>",
        id = escape(id)
    ))
}
