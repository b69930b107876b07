//! `latex`/`latexmm` blocks and the `eqref` inline tag.
//!
//! Equations render through client-side KaTeX: the expansion emits a script
//! that calls `katex.renderToString` on the raw LaTeX source. Equation
//! *numbering* is intentionally absent here. A display block's `\label{...}`
//! directives are stripped from the source and re-emitted as empty marker
//! spans (`data-eqlabel`), and the resolver assigns numbers to those markers
//! in document scan order, which is also where forward `eqref` placeholders
//! get patched.

use super::escape;
use regex::{Captures, Regex};
use std::sync::LazyLock;

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\label\{([^{}]*)\}").expect("valid label regex"));

static MATH_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\$(.+?)\$").expect("valid math regex"));

static EQREF_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\\eqref\{(.+?)\}").expect("valid eqref regex"));

/// Expand a `{% latex [display] %}` block.
pub fn expand_latex(markup: &str, body: &str) -> String {
    let display = markup.split_whitespace().any(|flag| flag == "display");
    if !display {
        return render_math(body, false);
    }

    // Pull labels out of the source; KaTeX never sees them.
    let labels: Vec<String> = LABEL_RE
        .captures_iter(body)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_owned()))
        .collect();
    let source = LABEL_RE.replace_all(body, "");

    let mut out = render_math(source.trim(), true);
    for label in &labels {
        let label = escape(label);
        out.push_str(&format!(
            "<span class=\"eqlabel\" data-eqlabel=\"{label}\"></span>"
        ));
    }
    out
}

/// Expand a `{% latexmm %}` block: inline `$...$` math and `\eqref{...}`.
pub fn expand_latexmm(body: &str) -> String {
    let rendered = MATH_RE.replace_all(body, |caps: &Captures<'_>| {
        render_math(caps.get(1).map_or("", |m| m.as_str()), false)
    });
    EQREF_RE
        .replace_all(&rendered, |caps: &Captures<'_>| {
            render_eqref(caps.get(1).map_or("", |m| m.as_str()))
        })
        .into_owned()
}

/// Expand an `{% eqref <label> %}` tag.
pub fn expand_eqref(markup: &str) -> String {
    render_eqref(markup.trim())
}

/// Emit the KaTeX render script for one equation.
///
/// The LaTeX source goes into a `String.raw` literal untouched, preserving
/// backslashes. Macro set and options match the site's authoring contract.
fn render_math(latex: &str, display: bool) -> String {
    let mut out = String::with_capacity(latex.len() + 256);
    out.push_str("<script>");
    out.push_str("var math_string = katex.renderToString(String.raw`");
    out.push_str(latex);
    out.push_str("`, {");
    if display {
        out.push_str("displayMode: true,");
    }
    out.push_str("globalGroup: true,");
    out.push_str("throwOnError: false,");
    out.push_str("strict: false,");
    out.push_str("macros: {");
    out.push_str(r#""\\T": String.raw`^{\scriptscriptstyle{\mathsf{T}}}`,"#);
    out.push_str(r#""\\grad": String.raw`\nabla`,"#);
    out.push_str("}});");
    out.push_str("document.write('<span class=\"");
    out.push_str(if display { "display" } else { "inline" });
    out.push_str("-equation\">'+math_string+'</span>');");
    out.push_str("</script>");
    out
}

/// Emit an equation reference placeholder.
fn render_eqref(label: &str) -> String {
    let label = escape(label);
    format!(
        "(<a class=\"eqreflink internal\" href=\"#{label}\" data-eqref=\"{label}\">??</a>)"
    )
}
