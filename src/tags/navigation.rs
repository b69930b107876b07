//! `navitem` inline tag: flags a sub-item for the navigation sidebar.
//!
//! The span itself is invisible structure; the resolver picks these up when
//! deriving the sidebar list and assigns them generated anchor ids.

/// Expand a `{% navitem <text> %}` tag.
pub fn expand_navitem(markup: &str) -> String {
    format!(
        "<span class=\"article-subnav-item\">{}</span>",
        markup.trim()
    )
}
