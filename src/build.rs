//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── collect_pages() ──► walk content/ for .html pages
//!     │
//!     ├── per page (parallel):
//!     │       expand_document() ──► resolve_html() ──► minify ──► write
//!     │
//!     ├── copy_assets() ──► mirror assets/ into the output
//!     │
//!     └── nav-sync.js ──► shipped to the output root when enabled
//! ```
//!
//! `check_site` runs the same pipeline in memory and reports unresolved
//! references without touching the output directory.

use crate::{
    config::SiteConfig,
    expand::expand_document,
    log,
    resolve::{ResolveReport, resolve_html},
    utils::minify::minify_html,
};
use anyhow::{Context, Result, anyhow};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
    sync::atomic::{AtomicBool, AtomicUsize, Ordering},
};
use walkdir::WalkDir;

/// Sidebar scroll-sync script, shipped to the output root.
const NAV_SYNC_JS: &str = include_str!("../assets/nav-sync.js");

/// Build the entire site: expand tags, resolve cross-references, and write
/// every page to the output directory in parallel.
///
/// If `config.build.clean` is true, clears the output directory first.
pub fn build_site(config: &SiteConfig) -> Result<()> {
    let output = &config.build.output;

    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("Failed to clear output directory: {}", output.display()))?;
    }
    fs::create_dir_all(output)
        .with_context(|| format!("Failed to create output directory: {}", output.display()))?;

    let pages = collect_pages(&config.build.content);
    log!("build"; "found {} pages", pages.len());

    let has_error = AtomicBool::new(false);

    let (pages_result, assets_result) = rayon::join(
        || {
            pages.par_iter().try_for_each(|path| {
                if has_error.load(Ordering::Relaxed) {
                    return Err(anyhow!("Aborted"));
                }
                if let Err(e) = build_page(path, config) {
                    if !has_error.swap(true, Ordering::Relaxed) {
                        log!("error"; "{}: {:#}", path.display(), e);
                    }
                    return Err(anyhow!("Build failed"));
                }
                Ok(())
            })
        },
        || copy_assets(config),
    );

    pages_result?;
    assets_result?;

    if config.build.nav_sync {
        fs::write(output.join("nav-sync.js"), NAV_SYNC_JS)
            .context("Failed to write nav-sync.js")?;
    }

    log!("build"; "done");
    Ok(())
}

/// Resolve every page in memory and report unresolved references.
///
/// Returns an error if any page fails to parse or carries an unresolved
/// reference, so `check` can gate CI.
pub fn check_site(config: &SiteConfig) -> Result<()> {
    let pages = collect_pages(&config.build.content);
    log!("check"; "checking {} pages", pages.len());

    let unresolved_total = AtomicUsize::new(0);
    let failed = AtomicBool::new(false);

    pages.par_iter().for_each(|path| {
        let rel = rel_display(path, &config.build.content);
        match resolve_page(path, config) {
            Ok(report) => {
                for unresolved in &report.unresolved {
                    log!("check"; "{rel}: unresolved {} reference `{}`",
                        unresolved.kind, unresolved.label);
                }
                report_structure(&rel, &report);
                unresolved_total.fetch_add(report.unresolved.len(), Ordering::Relaxed);
            }
            Err(e) => {
                log!("error"; "{rel}: {e:#}");
                failed.store(true, Ordering::Relaxed);
            }
        }
    });

    if failed.load(Ordering::Relaxed) {
        anyhow::bail!("Check failed: some pages could not be resolved");
    }

    let unresolved = unresolved_total.load(Ordering::Relaxed);
    if unresolved > 0 {
        anyhow::bail!("Check failed: {unresolved} unresolved reference(s)");
    }

    log!("check"; "ok");
    Ok(())
}

/// Collect all `.html` pages under the content directory.
fn collect_pages(content: &Path) -> Vec<PathBuf> {
    WalkDir::new(content)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case("html"))
        })
        .map(|entry| entry.into_path())
        .collect()
}

/// Expand and resolve a single page, writing it to its mirrored output path.
fn build_page(path: &Path, config: &SiteConfig) -> Result<()> {
    let rel = path
        .strip_prefix(&config.build.content)
        .unwrap_or(path)
        .to_path_buf();

    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let expanded = expand_document(&raw, config)?;
    let resolved = resolve_html(expanded.as_bytes(), config)?;

    report_page(&rel_display(path, &config.build.content), &resolved.report);

    let out_path = config.build.output.join(&rel);
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    let html = minify_html(&resolved.html, config);
    fs::write(&out_path, &html)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;

    Ok(())
}

/// Expand and resolve a page in memory, returning only its report.
fn resolve_page(path: &Path, config: &SiteConfig) -> Result<ResolveReport> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let expanded = expand_document(&raw, config)?;
    Ok(resolve_html(expanded.as_bytes(), config)?.report)
}

/// Log per-page warnings after a build pass.
fn report_page(rel: &str, report: &ResolveReport) {
    for unresolved in &report.unresolved {
        log!("warn"; "{rel}: unresolved {} reference `{}`",
            unresolved.kind, unresolved.label);
    }
    report_structure(rel, report);
}

/// Log structural warnings shared by build and check.
fn report_structure(rel: &str, report: &ResolveReport) {
    if report.missing_footnote_container {
        log!("warn"; "{rel}: {} footnote(s) but no .footnote-text-container",
            report.footnotes_total);
    }
    if report.missing_nav_list {
        log!("warn"; "{rel}: {} nav entries but no .article-navigation-list",
            report.nav_entries);
    }
    if report.footnote_mark_mismatch {
        log!("warn"; "{rel}: footnote marks and bodies disagree");
    }
}

/// Mirror the assets directory into the output, preserving relative paths.
fn copy_assets(config: &SiteConfig) -> Result<()> {
    let assets = &config.build.assets;
    if !assets.exists() {
        return Ok(());
    }

    let files: Vec<PathBuf> = WalkDir::new(assets)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect();

    files.par_iter().try_for_each(|path| {
        let rel = path.strip_prefix(assets).unwrap_or(path);
        let out_path = config.build.output.join(rel);
        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(path, &out_path)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
        Ok(())
    })
}

/// Render a path relative to the content directory for log messages.
fn rel_display(path: &Path, content: &Path) -> String {
    path.strip_prefix(content)
        .unwrap_or(path)
        .display()
        .to_string()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project(pages: &[(&str, &str)]) -> (TempDir, SiteConfig) {
        let dir = TempDir::new().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        for (rel, body) in pages {
            let path = content.join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, body).unwrap();
        }

        let mut config = SiteConfig::default();
        config.build.content = content;
        config.build.output = dir.path().join("public");
        config.build.assets = dir.path().join("assets");
        (dir, config)
    }

    #[test]
    fn test_build_writes_resolved_pages() {
        let input = concat!(
            "<html><head></head><body><article>",
            "<p>See {% figref fig:a %}.</p>",
            "{% figure %}src={a.png}\nlabel={fig:a}\ncaption={A caption}{% endfigure %}",
            "</article></body></html>",
        );
        let (_dir, config) = project(&[("post.html", input)]);
        build_site(&config).unwrap();

        let html = fs::read_to_string(config.build.output.join("post.html")).unwrap();
        assert!(html.contains("figure-1"));
        assert!(html.contains("data-figref=\"fig:a\">1</a>"));
    }

    #[test]
    fn test_build_mirrors_nested_paths() {
        let (_dir, config) = project(&[("posts/2026/entry.html", "<article><p>hi</p></article>")]);
        build_site(&config).unwrap();

        assert!(config.build.output.join("posts/2026/entry.html").exists());
    }

    #[test]
    fn test_build_skips_non_html_files() {
        let (_dir, config) = project(&[("notes.txt", "not a page")]);
        build_site(&config).unwrap();

        assert!(!config.build.output.join("notes.txt").exists());
    }

    #[test]
    fn test_build_ships_nav_sync_script() {
        let (_dir, config) = project(&[("post.html", "<article><p>hi</p></article>")]);
        build_site(&config).unwrap();
        assert!(config.build.output.join("nav-sync.js").exists());

        let (_dir, mut config) = project(&[("post.html", "<article><p>hi</p></article>")]);
        config.build.nav_sync = false;
        build_site(&config).unwrap();
        assert!(!config.build.output.join("nav-sync.js").exists());
    }

    #[test]
    fn test_build_copies_assets() {
        let (_dir, config) = project(&[("post.html", "<article><p>hi</p></article>")]);
        let css_dir = config.build.assets.join("css");
        fs::create_dir_all(&css_dir).unwrap();
        fs::write(css_dir.join("main.css"), "body { margin: 0; }").unwrap();

        build_site(&config).unwrap();

        let copied = config.build.output.join("css/main.css");
        assert_eq!(
            fs::read_to_string(copied).unwrap(),
            "body { margin: 0; }"
        );
    }

    #[test]
    fn test_build_clean_removes_stale_output() {
        let (_dir, mut config) = project(&[("post.html", "<article><p>hi</p></article>")]);
        fs::create_dir_all(&config.build.output).unwrap();
        fs::write(config.build.output.join("stale.html"), "old").unwrap();

        config.build.clean = true;
        build_site(&config).unwrap();

        assert!(!config.build.output.join("stale.html").exists());
        assert!(config.build.output.join("post.html").exists());
    }

    #[test]
    fn test_check_reports_unresolved() {
        let input = "<article><p>See {% figref fig:ghost %}.</p></article>";
        let (_dir, config) = project(&[("post.html", input)]);

        let err = check_site(&config).unwrap_err();
        assert!(err.to_string().contains("1 unresolved"));
        // Check never writes output.
        assert!(!config.build.output.exists());
    }

    #[test]
    fn test_check_passes_clean_site() {
        let input = concat!(
            "<article>",
            "<p>See {% figref fig:a %}.</p>",
            "{% figure %}src={a.png}\nlabel={fig:a}{% endfigure %}",
            "</article>",
        );
        let (_dir, config) = project(&[("post.html", input)]);
        check_site(&config).unwrap();
    }

    #[test]
    fn test_build_fails_on_unterminated_block() {
        let input = "<article>{% figure %}src={a.png}\nnever closed</article>";
        let (_dir, config) = project(&[("post.html", input)]);
        assert!(build_site(&config).is_err());
    }
}
