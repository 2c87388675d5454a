// Per-page attribution: exclusion check, history lookup, aggregation and
// fallback, in that order.

use crate::aggregate::{Author, PageAuthorship, SiteAuthors, aggregate};
use crate::config::PluginConfig;
use crate::errors::HistoryError;
use crate::fallback::{self, MissingHistory, Resolution};
use crate::history::{History, HistoryReader};
use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct PageOutcome {
    pub authorship: PageAuthorship,
    pub resolution: Resolution,
    pub warning: Option<String>,
}

/// Build-scoped attribution state. One engine per build; pages are
/// attributed one at a time.
pub struct AttributionEngine {
    reader: HistoryReader,
    config: PluginConfig,
    build_time: DateTime<Utc>,
    site: SiteAuthors,
}

impl AttributionEngine {
    pub fn new(reader: HistoryReader, config: PluginConfig, build_time: DateTime<Utc>) -> Self {
        AttributionEngine {
            reader,
            config,
            build_time,
            site: SiteAuthors::default(),
        }
    }

    /// Attribute one page.
    ///
    /// `docs_path` is the page path relative to the docs directory (used for
    /// exclusion and in messages); `source` is the file on disk.
    pub fn attribute(
        &mut self,
        docs_path: &str,
        source: &Path,
    ) -> Result<PageOutcome, HistoryError> {
        if self.config.exclude.is_excluded(docs_path) {
            debug!("{docs_path}: excluded");
            return Ok(PageOutcome {
                authorship: PageAuthorship::excluded(docs_path),
                resolution: Resolution::NoHistoryExcluded,
                warning: None,
            });
        }

        let history = self.history_for(source)?;
        let commits = history.commits();
        let authorship = aggregate(
            docs_path,
            commits,
            &self.config.exclude,
            &self.config.attribution,
        );
        self.site.add_page(commits);

        let reason = match &history {
            History::Commits(_) => MissingHistory::AllIgnored,
            History::Uncommitted => MissingHistory::Uncommitted,
            History::EmptyRepository => MissingHistory::EmptyRepository,
            History::NoRepository => MissingHistory::NoRepository,
        };
        let resolved = fallback::apply(authorship, reason, &self.config.fallback, self.build_time);

        if let Some(message) = &resolved.warning {
            warn!("{message}");
        }
        debug!(
            "{docs_path}: {:?}, {} author(s)",
            resolved.resolution,
            resolved.authorship.authors.len()
        );

        Ok(PageOutcome {
            authorship: resolved.authorship,
            resolution: resolved.resolution,
            warning: resolved.warning,
        })
    }

    /// Authors across every page attributed so far.
    pub fn site_authors(&self) -> Vec<Author> {
        self.site.authors(&self.config.attribution)
    }

    fn history_for(&self, source: &Path) -> Result<History, HistoryError> {
        if !self.reader.is_available() {
            return Ok(History::NoRepository);
        }
        match self.reader.relative_path(source) {
            Ok(relative) => self.reader.file_history(&relative),
            Err(HistoryError::PathOutsideRepository { path, .. }) => {
                debug!("{} is outside the repository", path.display());
                Ok(History::NoRepository)
            }
            Err(e) => Err(e),
        }
    }
}
