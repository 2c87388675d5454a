// Fallback resolution: what a page shows when git has nothing to say about it.

use crate::aggregate::{Author, PageAuthorship};
use crate::history::Identity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Emit a build warning naming the file; the build continues.
    #[default]
    Warn,
    /// Say nothing.
    Suppress,
    /// Credit the configured fallback author.
    UseDefaultAuthor,
}

impl fmt::Display for FallbackPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FallbackPolicy::Warn => write!(f, "warn"),
            FallbackPolicy::Suppress => write!(f, "suppress"),
            FallbackPolicy::UseDefaultAuthor => write!(f, "use_default_author"),
        }
    }
}

/// Terminal state of the resolver for one page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    HasHistory,
    NoHistoryExcluded,
    NoHistoryWarn,
    NoHistorySuppress,
    NoHistoryDefaultAuthor,
}

/// Why a page ended up without history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingHistory {
    Uncommitted,
    EmptyRepository,
    NoRepository,
    /// Commits exist but every one was ignored, or every author was.
    AllIgnored,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FallbackConfig {
    pub policy: FallbackPolicy,
    pub default_author: Option<Identity>,
    /// Use the build timestamp as last-modified date for pages without history.
    pub to_build_date: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolved {
    pub resolution: Resolution,
    pub authorship: PageAuthorship,
    pub warning: Option<String>,
}

/// Resolver transitions. The exclusion check always comes first: an
/// excluded page never warns, whatever its git state.
pub fn resolve(excluded: bool, has_history: bool, policy: FallbackPolicy) -> Resolution {
    if excluded {
        return Resolution::NoHistoryExcluded;
    }
    if has_history {
        return Resolution::HasHistory;
    }
    match policy {
        FallbackPolicy::Warn => Resolution::NoHistoryWarn,
        FallbackPolicy::Suppress => Resolution::NoHistorySuppress,
        FallbackPolicy::UseDefaultAuthor => Resolution::NoHistoryDefaultAuthor,
    }
}

/// Apply the fallback policy to an aggregated page. `reason` is only
/// consulted when the page turns out to have no history.
pub fn apply(
    mut authorship: PageAuthorship,
    reason: MissingHistory,
    config: &FallbackConfig,
    build_time: DateTime<Utc>,
) -> Resolved {
    let resolution = resolve(authorship.excluded, authorship.has_history, config.policy);
    let mut warning = None;

    match resolution {
        Resolution::HasHistory | Resolution::NoHistoryExcluded => {}
        Resolution::NoHistoryWarn => {
            warning = Some(warning_message(&authorship.file_path, reason));
        }
        Resolution::NoHistorySuppress => {}
        Resolution::NoHistoryDefaultAuthor => {
            if let Some(identity) = &config.default_author {
                authorship.authors = vec![Author {
                    name: identity.name.clone(),
                    email: identity.email.clone(),
                    commit_count: 0,
                    first_commit: build_time,
                    last_commit: build_time,
                    contribution: 1.0,
                }];
            }
        }
    }

    if config.to_build_date
        && !matches!(
            resolution,
            Resolution::HasHistory | Resolution::NoHistoryExcluded
        )
    {
        authorship.last_modified = Some(build_time);
    }

    Resolved {
        resolution,
        authorship,
        warning,
    }
}

pub fn warning_message(file: &str, reason: MissingHistory) -> String {
    match reason {
        MissingHistory::Uncommitted => format!("{file} has not been committed yet."),
        MissingHistory::EmptyRepository => {
            format!("{file} has no git history: the repository has no commits yet.")
        }
        MissingHistory::NoRepository => format!("{file} is not inside a git repository."),
        MissingHistory::AllIgnored => {
            format!("{file} has no commits left after applying ignore rules.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exclusion_wins_over_history() {
        assert_eq!(
            resolve(true, true, FallbackPolicy::Warn),
            Resolution::NoHistoryExcluded
        );
    }

    #[test]
    fn policy_only_matters_without_history() {
        for policy in [
            FallbackPolicy::Warn,
            FallbackPolicy::Suppress,
            FallbackPolicy::UseDefaultAuthor,
        ] {
            assert_eq!(resolve(false, true, policy), Resolution::HasHistory);
        }
    }
}
