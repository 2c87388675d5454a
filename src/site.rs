// Build driver: walk the docs directory, attribute every page, write HTML.

use crate::aggregate::{Author, PageAuthorship};
use crate::config::SiteConfig;
use crate::engine::AttributionEngine;
use crate::errors::{BuildError, HistoryError};
use crate::fallback::Resolution;
use crate::history::HistoryReader;
use crate::render::{self, PageView};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Inputs of one build. Paths are used as given; nothing depends on the
/// process working directory beyond how the caller resolved them.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub config_file: PathBuf,
    pub site_dir: PathBuf,
    /// Timestamp used for build-date fallbacks. Defaults to now.
    pub build_time: Option<DateTime<Utc>>,
}

impl BuildOptions {
    pub fn new(config_file: impl Into<PathBuf>, site_dir: impl Into<PathBuf>) -> Self {
        BuildOptions {
            config_file: config_file.into(),
            site_dir: site_dir.into(),
            build_time: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PageReport {
    /// Path relative to the docs directory.
    pub source: String,
    /// Path relative to the site directory.
    pub output: String,
    /// `None` when the plugin is disabled.
    pub authorship: Option<PageAuthorship>,
    pub resolution: Option<Resolution>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BuildReport {
    pub pages: Vec<PageReport>,
    /// Assets copied verbatim, relative to the site directory.
    pub assets: Vec<String>,
    pub warnings: Vec<String>,
    pub site_authors: Vec<Author>,
}

impl BuildReport {
    pub fn page(&self, source: &str) -> Option<&PageReport> {
        self.pages.iter().find(|p| p.source == source)
    }

    pub fn save(&self, path: &Path) -> Result<(), BuildError> {
        let contents = serde_json::to_string_pretty(self).map_err(|e| BuildError::Report {
            path: path.to_path_buf(),
            source: e,
        })?;
        write_file(path, (contents + "\n").as_bytes())
    }
}

enum SourceKind {
    Page,
    Asset,
}

struct SourceFile {
    /// Relative to the docs directory, `/`-separated.
    relative: String,
    path: PathBuf,
    kind: SourceKind,
}

/// Run a full build.
pub fn build(options: &BuildOptions) -> Result<BuildReport, BuildError> {
    // ── Phase 1: Gather ─────────────────────────────────────────────
    let config = SiteConfig::load(&options.config_file)?;
    if !config.docs_dir.is_dir() {
        return Err(BuildError::DocsDirMissing {
            path: config.docs_dir.clone(),
        });
    }
    let sources = collect_sources(&config.docs_dir)?;
    let build_time = options.build_time.unwrap_or_else(Utc::now);
    info!(
        "building {} from {}",
        config.site_name,
        config.docs_dir.display()
    );

    // ── Phase 2: Attribute ──────────────────────────────────────────
    let mut engine = match &config.plugin {
        Some(plugin) => {
            let reader = match HistoryReader::discover(&config.docs_dir) {
                Ok(reader) => reader,
                Err(HistoryError::NotARepository { .. }) if plugin.fallback_to_empty => {
                    debug!("no git repository found, continuing without history");
                    HistoryReader::unavailable()
                }
                Err(HistoryError::NotARepository { path }) => {
                    return Err(BuildError::NoRepository { path });
                }
                Err(e) => return Err(e.into()),
            };
            Some(AttributionEngine::new(reader, plugin.clone(), build_time))
        }
        None => None,
    };

    let mut report = BuildReport::default();
    let mut outcomes = Vec::new();
    for source in &sources {
        if !matches!(source.kind, SourceKind::Page) {
            continue;
        }
        let outcome = match engine.as_mut() {
            Some(engine) => Some(engine.attribute(&source.relative, &source.path)?),
            None => None,
        };
        if let Some(warning) = outcome.as_ref().and_then(|o| o.warning.clone()) {
            report.warnings.push(warning);
        }
        outcomes.push(outcome);
    }

    let strict = config.plugin.as_ref().is_some_and(|p| p.strict);
    if strict && !report.warnings.is_empty() {
        return Err(BuildError::Strict {
            count: report.warnings.len(),
        });
    }

    report.site_authors = engine.as_ref().map(|e| e.site_authors()).unwrap_or_default();
    let site_block = config
        .plugin
        .as_ref()
        .map(|p| render::site_authors_block(&report.site_authors, &p.render));
    let render_options = config.plugin.as_ref().map(|p| p.render).unwrap_or_default();

    // ── Phase 3: Write ──────────────────────────────────────────────
    let mut outcomes = outcomes.into_iter();
    for source in &sources {
        match source.kind {
            SourceKind::Asset => {
                let target = options.site_dir.join(&source.relative);
                let bytes = fs::read(&source.path).map_err(|e| BuildError::Io {
                    path: source.path.clone(),
                    source: e,
                })?;
                write_file(&target, &bytes)?;
                report.assets.push(source.relative.clone());
            }
            SourceKind::Page => {
                let outcome = outcomes.next().flatten();
                let markdown = fs::read_to_string(&source.path).map_err(|e| BuildError::Io {
                    path: source.path.clone(),
                    source: e,
                })?;
                let output = output_path(&source.relative, config.use_directory_urls);
                let html = render::render_page(&PageView {
                    site_name: &config.site_name,
                    source_path: &source.relative,
                    markdown: &markdown,
                    page_block: outcome
                        .as_ref()
                        .and_then(|o| render::page_authors_block(&o.authorship, &render_options)),
                    last_modified: outcome
                        .as_ref()
                        .and_then(|o| render::last_modified_block(&o.authorship)),
                    site_block: site_block.as_deref(),
                });
                write_file(&options.site_dir.join(&output), html.as_bytes())?;
                report.pages.push(PageReport {
                    source: source.relative.clone(),
                    output,
                    resolution: outcome.as_ref().map(|o| o.resolution),
                    authorship: outcome.map(|o| o.authorship),
                });
            }
        }
    }

    info!(
        "built {} page(s) into {} with {} warning(s)",
        report.pages.len(),
        options.site_dir.display(),
        report.warnings.len()
    );
    Ok(report)
}

/// Every file under `docs_dir`, sorted, skipping dotfiles and dot-directories.
fn collect_sources(docs_dir: &Path) -> Result<Vec<SourceFile>, BuildError> {
    let mut sources = Vec::new();
    let walker = WalkDir::new(docs_dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0 || !entry.file_name().to_string_lossy().starts_with('.')
        });
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        let Ok(relative) = entry.path().strip_prefix(docs_dir) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join("/");
        let kind = if is_markdown(&relative) {
            SourceKind::Page
        } else {
            SourceKind::Asset
        };
        sources.push(SourceFile {
            relative,
            path: entry.path().to_path_buf(),
            kind,
        });
    }
    Ok(drop_shadowed_readmes(sources))
}

/// `index.md` wins over `README.md` in the same directory; both would be
/// written to the same `index.html`.
fn drop_shadowed_readmes(mut sources: Vec<SourceFile>) -> Vec<SourceFile> {
    let indexes: HashSet<String> = sources
        .iter()
        .filter(|s| matches!(s.kind, SourceKind::Page))
        .filter_map(|s| {
            let (dir, stem) = split_page(&s.relative);
            (stem == "index").then(|| dir.unwrap_or_default().to_string())
        })
        .collect();
    sources.retain(|s| {
        if !matches!(s.kind, SourceKind::Page) {
            return true;
        }
        let (dir, stem) = split_page(&s.relative);
        if stem.eq_ignore_ascii_case("readme") && indexes.contains(dir.unwrap_or_default()) {
            warn!(
                "Excluding '{}' from the site because it conflicts with 'index.md' in the same directory.",
                s.relative
            );
            return false;
        }
        true
    });
    sources
}

/// Directory (if any) and file stem of a docs-relative path.
fn split_page(relative: &str) -> (Option<&str>, &str) {
    let (dir, file) = match relative.rsplit_once('/') {
        Some((dir, file)) => (Some(dir), file),
        None => (None, relative),
    };
    let stem = match file.rsplit_once('.') {
        Some((stem, _)) => stem,
        None => file,
    };
    (dir, stem)
}

fn is_markdown(path: &str) -> bool {
    let lower = path.to_lowercase();
    lower.ends_with(".md") || lower.ends_with(".markdown")
}

/// Site-relative output path for a page.
///
/// `index.md` and `README.md` become their directory's `index.html`;
/// other pages become `<name>/index.html` with directory URLs, or
/// `<name>.html` without.
pub fn output_path(relative: &str, use_directory_urls: bool) -> String {
    let (dir, stem) = split_page(relative);
    let prefix = dir.map(|d| format!("{d}/")).unwrap_or_default();

    if stem == "index" || stem.eq_ignore_ascii_case("readme") {
        format!("{prefix}index.html")
    } else if use_directory_urls {
        format!("{prefix}{stem}/index.html")
    } else {
        format!("{prefix}{stem}.html")
    }
}

fn write_file(path: &Path, contents: &[u8]) -> Result<(), BuildError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| BuildError::Io {
            path: parent.to_path_buf(),
            source: e,
        })?;
    }
    fs::write(path, contents).map_err(|e| BuildError::Io {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_paths_follow_directory_urls() {
        assert_eq!(output_path("index.md", true), "index.html");
        assert_eq!(output_path("page_with_tag.md", true), "page_with_tag/index.html");
        assert_eq!(output_path("page_with_tag.md", false), "page_with_tag.html");
        assert_eq!(output_path("guide/README.md", true), "guide/index.html");
        assert_eq!(output_path("guide/setup.md", true), "guide/setup/index.html");
    }
}
