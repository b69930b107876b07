//! Template expansion: the build-time half of cross-referencing.
//!
//! Walks `{% tag %}` occurrences in document order, dispatching to the
//! handlers in `crate::tags`. Numbered entities get their sequence numbers
//! here, from the per-document `Counters`; references are emitted as
//! placeholders and patched later by `crate::resolve`.

use crate::config::SiteConfig;
use crate::counter::Counters;
use crate::tags::{self, TagError};
use anyhow::Result;
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

/// `{% name markup %}` occurrence.
static TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{%\s*(\w+)((?s).*?)%\}").expect("valid tag regex"));

/// Per-block-tag `{% endname %}` markers, compiled once.
static END_RES: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    tags::BLOCK_TAGS
        .iter()
        .map(|&name| {
            let re = Regex::new(&format!(r"\{{%\s*end{name}\s*%\}}")).expect("valid end regex");
            (name, re)
        })
        .collect()
});

/// State threaded through tag handlers for one document.
pub struct ExpandContext<'a> {
    pub config: &'a SiteConfig,
    pub counters: Counters,
}

/// Expand every template tag in `input`, in document order.
///
/// Unknown tag names pass through untouched so a host template engine can
/// still own them. Block bodies are not re-scanned for nested tags.
pub fn expand_document(input: &str, config: &SiteConfig) -> Result<String, TagError> {
    let mut ctx = ExpandContext {
        config,
        counters: Counters::new(),
    };

    let mut out = String::with_capacity(input.len());
    let mut pos = 0;

    while let Some(caps) = TAG_RE.captures(&input[pos..]) {
        let Some(m) = caps.get(0) else { break };
        let name = caps.get(1).map_or("", |g| g.as_str());
        let markup = caps.get(2).map_or("", |g| g.as_str()).trim();

        out.push_str(&input[pos..pos + m.start()]);

        if tags::is_block(name) {
            let body_start = pos + m.end();
            let end_re = &END_RES[name];
            let Some(end) = end_re.find(&input[body_start..]) else {
                return Err(TagError::UnterminatedBlock(name.to_owned()));
            };
            let body = &input[body_start..body_start + end.start()];
            match tags::expand_block(name, markup, body, &mut ctx)? {
                Some(html) => out.push_str(&html),
                // Unreachable for known block names, kept for symmetry.
                None => out.push_str(&input[pos + m.start()..body_start + end.end()]),
            }
            pos = body_start + end.end();
        } else {
            match tags::expand_inline(name, markup, &mut ctx)? {
                Some(html) => out.push_str(&html),
                None => out.push_str(m.as_str()),
            }
            pos += m.end();
        }
    }

    out.push_str(&input[pos..]);
    Ok(out)
}
