// Attribution: turn a file's commit history into an ordered author list.

use crate::exclude::ExclusionRules;
use crate::history::{Commit, Identity};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortAuthorsBy {
    /// Order of first contribution, oldest first.
    #[default]
    FirstContribution,
    /// Case-insensitive by name.
    Name,
    /// Most commits first; ties keep first-contribution order.
    Contribution,
}

/// One entry of a page's (or the site's) author list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Author {
    pub name: String,
    pub email: String,
    pub commit_count: usize,
    pub first_commit: DateTime<Utc>,
    pub last_commit: DateTime<Utc>,
    /// Share of attributed commits this author took part in, `0.0..=1.0`.
    pub contribution: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageAuthorship {
    /// Page path relative to the docs directory.
    pub file_path: String,
    pub authors: Vec<Author>,
    pub last_modified: Option<DateTime<Utc>>,
    pub excluded: bool,
    pub has_history: bool,
}

impl PageAuthorship {
    pub fn excluded(file_path: &str) -> Self {
        PageAuthorship {
            file_path: file_path.to_string(),
            authors: Vec::new(),
            last_modified: None,
            excluded: true,
            has_history: false,
        }
    }

    pub fn without_history(file_path: &str) -> Self {
        PageAuthorship {
            excluded: false,
            ..Self::excluded(file_path)
        }
    }

    pub fn emails(&self) -> Vec<&str> {
        self.authors.iter().map(|a| a.email.as_str()).collect()
    }
}

/// Knobs that change how commits are attributed.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AttributionOptions {
    pub sort_authors_by: SortAuthorsBy,
    /// Authors below this share (`0.0..=1.0`) are dropped.
    pub authorship_threshold: f64,
    /// Lowercased emails never credited.
    pub ignore_authors: BTreeSet<String>,
    /// Lowercased commit hashes or hash prefixes whose changes are skipped.
    pub ignore_commits: Vec<String>,
    /// Credit `Co-authored-by:` trailers as well as the author.
    pub add_co_authors: bool,
}

impl AttributionOptions {
    pub fn is_ignored_commit(&self, id: &str) -> bool {
        let id = id.to_lowercase();
        self.ignore_commits
            .iter()
            .any(|prefix| id.starts_with(prefix.as_str()))
    }

    pub fn is_ignored_author(&self, identity: &Identity) -> bool {
        self.ignore_authors.contains(&identity.key())
    }
}

/// Build the authorship record for one page.
///
/// `commits` must be most recent first, as returned by the history reader.
/// Excluded pages short-circuit to an empty, excluded record.
pub fn aggregate(
    file_path: &str,
    commits: &[Commit],
    rules: &ExclusionRules,
    options: &AttributionOptions,
) -> PageAuthorship {
    if rules.is_excluded(file_path) {
        return PageAuthorship::excluded(file_path);
    }

    let mut tally = Tally::default();
    let mut last_modified = None;
    for commit in commits.iter().rev() {
        if tally.record(commit, options) {
            last_modified = Some(commit.timestamp);
        }
    }

    let authors = tally.into_authors(options);
    PageAuthorship {
        file_path: file_path.to_string(),
        has_history: !authors.is_empty(),
        last_modified: if authors.is_empty() { None } else { last_modified },
        authors,
        excluded: false,
    }
}

/// Running author tally over a sequence of commits, oldest first.
#[derive(Debug, Default)]
struct Tally {
    authors: Vec<Author>,
    index: HashMap<String, usize>,
    attributed: usize,
}

impl Tally {
    /// Credit a commit. Returns false when the commit was ignored or every
    /// identity on it was.
    fn record(&mut self, commit: &Commit, options: &AttributionOptions) -> bool {
        if options.is_ignored_commit(&commit.id) {
            return false;
        }

        let mut credited: HashSet<String> = HashSet::new();
        let co_authors: &[Identity] = if options.add_co_authors {
            &commit.co_authors
        } else {
            &[]
        };
        for identity in std::iter::once(&commit.author).chain(co_authors) {
            if options.is_ignored_author(identity) {
                continue;
            }
            let key = identity.key();
            if !credited.insert(key.clone()) {
                continue;
            }
            match self.index.get(&key) {
                Some(&i) => {
                    let author = &mut self.authors[i];
                    author.commit_count += 1;
                    author.first_commit = author.first_commit.min(commit.timestamp);
                    author.last_commit = author.last_commit.max(commit.timestamp);
                }
                None => {
                    self.index.insert(key, self.authors.len());
                    self.authors.push(Author {
                        name: identity.name.clone(),
                        email: identity.email.clone(),
                        commit_count: 1,
                        first_commit: commit.timestamp,
                        last_commit: commit.timestamp,
                        contribution: 0.0,
                    });
                }
            }
        }
        if credited.is_empty() {
            return false;
        }
        self.attributed += 1;
        true
    }

    fn into_authors(self, options: &AttributionOptions) -> Vec<Author> {
        let total = self.attributed.max(1) as f64;
        let mut authors = self.authors;
        for author in &mut authors {
            author.contribution = author.commit_count as f64 / total;
        }

        if options.authorship_threshold > 0.0 {
            let above: Vec<Author> = authors
                .iter()
                .filter(|a| a.contribution >= options.authorship_threshold)
                .cloned()
                .collect();
            if !above.is_empty() {
                authors = above;
            }
        }

        sort_authors(&mut authors, options.sort_authors_by);
        authors
    }
}

/// Stable sort, so equal keys keep first-contribution order.
pub fn sort_authors(authors: &mut [Author], by: SortAuthorsBy) {
    match by {
        SortAuthorsBy::FirstContribution => {}
        SortAuthorsBy::Name => authors.sort_by_key(|a| a.name.to_lowercase()),
        SortAuthorsBy::Contribution => {
            authors.sort_by(|a, b| b.commit_count.cmp(&a.commit_count));
        }
    }
}

/// Site-wide author tally. A commit touching several pages is credited once.
#[derive(Debug, Default)]
pub struct SiteAuthors {
    seen: HashSet<String>,
    commits: Vec<Commit>,
}

impl SiteAuthors {
    pub fn add_page(&mut self, commits: &[Commit]) {
        for commit in commits {
            if self.seen.insert(commit.id.clone()) {
                self.commits.push(commit.clone());
            }
        }
    }

    /// Final author list across every page added so far.
    pub fn authors(&self, options: &AttributionOptions) -> Vec<Author> {
        let mut ordered: Vec<&Commit> = self.commits.iter().collect();
        ordered.sort_by(|a, b| a.timestamp.cmp(&b.timestamp).then_with(|| a.id.cmp(&b.id)));

        let mut tally = Tally::default();
        for commit in ordered {
            tally.record(commit, options);
        }
        tally.into_authors(options)
    }
}
