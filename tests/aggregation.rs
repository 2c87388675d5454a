// tests/aggregation.rs
//
// Turning commit history into an author list: de-duplication, ordering,
// ignore rules, thresholds and exclusion. Pure: no git, no filesystem.

use chrono::{TimeZone, Utc};
use git_authors::aggregate::{AttributionOptions, SiteAuthors, SortAuthorsBy, aggregate};
use git_authors::exclude::ExclusionRules;
use git_authors::history::{Commit, Identity};

fn commit(id: &str, name: &str, email: &str, day: u32) -> Commit {
    Commit {
        id: id.to_string(),
        author: Identity::new(name, email),
        timestamp: Utc.with_ymd_and_hms(2024, 1, day, 12, 0, 0).unwrap(),
        summary: format!("commit {id}"),
        co_authors: Vec::new(),
        files_changed: vec!["index.md".to_string()],
    }
}

/// Most recent first, the way the history reader returns them.
fn history() -> Vec<Commit> {
    vec![
        commit("cccc03", "Ann", "ann@x.org", 3),
        commit("bbbb02", "Bob", "bob@x.org", 2),
        commit("aaaa01", "Ann", "ann@x.org", 1),
    ]
}

fn no_rules() -> ExclusionRules {
    ExclusionRules::empty()
}

#[test]
fn each_email_appears_once_in_first_contribution_order() {
    let page = aggregate("index.md", &history(), &no_rules(), &AttributionOptions::default());
    assert_eq!(page.emails(), vec!["ann@x.org", "bob@x.org"]);
    assert_eq!(page.authors[0].commit_count, 2);
    assert!(page.has_history);
    assert!(!page.excluded);
}

#[test]
fn emails_are_deduplicated_case_insensitively() {
    let commits = vec![
        commit("bbbb02", "Tim V.", "VinkTim@Gmail.com", 2),
        commit("aaaa01", "Tim Vink", "vinktim@gmail.com", 1),
    ];
    let page = aggregate("index.md", &commits, &no_rules(), &AttributionOptions::default());
    assert_eq!(page.authors.len(), 1);
    // The first appearance fixes the displayed name.
    assert_eq!(page.authors[0].name, "Tim Vink");
}

#[test]
fn last_modified_is_the_most_recent_commit() {
    let page = aggregate("index.md", &history(), &no_rules(), &AttributionOptions::default());
    assert_eq!(
        page.last_modified,
        Some(Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap())
    );
}

#[test]
fn sort_by_name_is_case_insensitive() {
    let commits = vec![
        commit("bbbb02", "alice", "alice@x.org", 2),
        commit("aaaa01", "Zed", "zed@x.org", 1),
    ];
    let options = AttributionOptions {
        sort_authors_by: SortAuthorsBy::Name,
        ..Default::default()
    };
    let page = aggregate("index.md", &commits, &no_rules(), &options);
    assert_eq!(page.emails(), vec!["alice@x.org", "zed@x.org"]);
}

#[test]
fn sort_by_contribution_puts_most_commits_first() {
    let commits = vec![
        commit("dddd04", "Bob", "bob@x.org", 4),
        commit("cccc03", "Bob", "bob@x.org", 3),
        commit("bbbb02", "Cat", "cat@x.org", 2),
        commit("aaaa01", "Ann", "ann@x.org", 1),
    ];
    let options = AttributionOptions {
        sort_authors_by: SortAuthorsBy::Contribution,
        ..Default::default()
    };
    let page = aggregate("index.md", &commits, &no_rules(), &options);
    // Ann and Cat tie; they keep first-contribution order.
    assert_eq!(page.emails(), vec!["bob@x.org", "ann@x.org", "cat@x.org"]);
    assert!((page.authors[0].contribution - 0.5).abs() < 1e-9);
}

#[test]
fn ignored_commits_are_skipped_by_prefix() {
    let options = AttributionOptions {
        ignore_commits: vec!["bbbb".to_string()],
        ..Default::default()
    };
    let page = aggregate("index.md", &history(), &no_rules(), &options);
    assert_eq!(page.emails(), vec!["ann@x.org"]);
    assert!((page.authors[0].contribution - 1.0).abs() < 1e-9);
}

#[test]
fn ignored_authors_are_never_credited() {
    let options = AttributionOptions {
        ignore_authors: ["ann@x.org".to_string()].into_iter().collect(),
        ..Default::default()
    };
    let page = aggregate("index.md", &history(), &no_rules(), &options);
    assert_eq!(page.emails(), vec!["bob@x.org"]);
}

#[test]
fn commits_by_ignored_authors_do_not_dilute_contribution() {
    let commits = vec![
        commit("cccc03", "Bot", "bot@x.org", 3),
        commit("bbbb02", "Bot", "bot@x.org", 2),
        commit("aaaa01", "Ann", "ann@x.org", 1),
    ];
    let options = AttributionOptions {
        ignore_authors: ["bot@x.org".to_string()].into_iter().collect(),
        authorship_threshold: 0.5,
        ..Default::default()
    };
    let page = aggregate("index.md", &commits, &no_rules(), &options);
    assert_eq!(page.emails(), vec!["ann@x.org"]);
    assert!((page.authors[0].contribution - 1.0).abs() < 1e-9);
    assert_eq!(
        page.last_modified,
        Some(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
    );
}

#[test]
fn everything_ignored_means_no_history() {
    let options = AttributionOptions {
        ignore_commits: vec!["aaaa".into(), "bbbb".into(), "cccc".into()],
        ..Default::default()
    };
    let page = aggregate("index.md", &history(), &no_rules(), &options);
    assert!(page.authors.is_empty());
    assert!(!page.has_history);
    assert_eq!(page.last_modified, None);
}

#[test]
fn threshold_drops_minor_contributors() {
    let options = AttributionOptions {
        authorship_threshold: 0.5,
        ..Default::default()
    };
    let page = aggregate("index.md", &history(), &no_rules(), &options);
    assert_eq!(page.emails(), vec!["ann@x.org"]);
}

#[test]
fn co_authors_are_credited_when_enabled() {
    let mut paired = commit("aaaa01", "Ann", "ann@x.org", 1);
    paired.co_authors = vec![
        Identity::new("Bob", "bob@x.org"),
        Identity::new("Ann again", "ANN@x.org"),
    ];
    let commits = vec![paired];

    let without = aggregate("index.md", &commits, &no_rules(), &AttributionOptions::default());
    assert_eq!(without.emails(), vec!["ann@x.org"]);

    let options = AttributionOptions {
        add_co_authors: true,
        ..Default::default()
    };
    let with = aggregate("index.md", &commits, &no_rules(), &options);
    assert_eq!(with.emails(), vec!["ann@x.org", "bob@x.org"]);
    assert_eq!(with.authors[0].commit_count, 1);
}

#[test]
fn excluded_page_short_circuits() {
    let rules = ExclusionRules::new(["index.md"]).unwrap();
    let page = aggregate("index.md", &history(), &rules, &AttributionOptions::default());
    assert!(page.excluded);
    assert!(page.authors.is_empty());
    assert!(!page.has_history);
}

#[test]
fn aggregation_is_deterministic() {
    let options = AttributionOptions {
        sort_authors_by: SortAuthorsBy::Contribution,
        ..Default::default()
    };
    let first = aggregate("index.md", &history(), &no_rules(), &options);
    let second = aggregate("index.md", &history(), &no_rules(), &options);
    assert_eq!(first, second);
}

#[test]
fn site_authors_count_shared_commits_once() {
    let shared = commit("aaaa01", "Ann", "ann@x.org", 1);
    let mut site = SiteAuthors::default();
    site.add_page(&[shared.clone()]);
    site.add_page(&[commit("bbbb02", "Bob", "bob@x.org", 2), shared]);

    let authors = site.authors(&AttributionOptions::default());
    assert_eq!(authors.len(), 2);
    assert_eq!(authors[0].email, "ann@x.org");
    assert_eq!(authors[0].commit_count, 1);
}
