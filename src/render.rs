// HTML output: authorship blocks and the page shell they are injected into.

use crate::aggregate::{Author, PageAuthorship};
use chrono::{DateTime, Utc};

/// Markdown tag replaced by the page's authorship block.
pub const PAGE_AUTHORS_TAG: &str = "{{ git_page_authors }}";
/// Markdown tag replaced by the site-wide author list.
pub const SITE_AUTHORS_TAG: &str = "{{ git_site_authors }}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderOptions {
    pub show_email_address: bool,
    pub show_contribution: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        RenderOptions {
            show_email_address: true,
            show_contribution: false,
        }
    }
}

/// The `git-page-authors` block, or `None` when the page shows nothing
/// (excluded, or no authors after fallback).
pub fn page_authors_block(authorship: &PageAuthorship, options: &RenderOptions) -> Option<String> {
    if authorship.excluded || authorship.authors.is_empty() {
        return None;
    }
    Some(format!(
        "<span class='git-page-authors git-authors'>{}</span>",
        author_list(&authorship.authors, options)
    ))
}

pub fn site_authors_block(authors: &[Author], options: &RenderOptions) -> String {
    format!(
        "<span class='git-site-authors git-authors'>{}</span>",
        author_list(authors, options)
    )
}

pub fn last_modified_block(authorship: &PageAuthorship) -> Option<String> {
    if authorship.excluded {
        return None;
    }
    authorship.last_modified.map(|ts| {
        format!(
            "<span class='git-page-last-modified'>{}</span>",
            format_date(ts)
        )
    })
}

pub fn format_date(ts: DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}

fn author_list(authors: &[Author], options: &RenderOptions) -> String {
    let mut out = String::from("<ul>");
    for author in authors {
        let name = html_escape(&author.name);
        out.push_str("<li>");
        if options.show_email_address && !author.email.is_empty() {
            out.push_str(&format!(
                "<a href='mailto:{}'>{name}</a>",
                html_escape(&author.email)
            ));
        } else {
            out.push_str(&name);
        }
        if options.show_contribution {
            out.push_str(&format!(" ({:.1}%)", author.contribution * 100.0));
        }
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    out
}

/// Page contents handed to [`render_page`].
pub struct PageView<'a> {
    pub site_name: &'a str,
    pub source_path: &'a str,
    pub markdown: &'a str,
    pub page_block: Option<String>,
    pub last_modified: Option<String>,
    /// `None` when the plugin is disabled; tags are then left as written.
    pub site_block: Option<&'a str>,
}

/// Produce the HTML document for one page.
///
/// Markdown is not rendered; it is escaped into a `<pre>` block. Tags are
/// substituted after escaping. Without a page tag, the authorship block is
/// appended after the content.
pub fn render_page(view: &PageView<'_>) -> String {
    let mut body = html_escape(view.markdown);
    let mut footer = String::new();

    if let Some(site_block) = view.site_block {
        body = replace_tag(&body, SITE_AUTHORS_TAG, site_block);
        let page_block = view.page_block.as_deref().unwrap_or("");
        if contains_tag(&body, PAGE_AUTHORS_TAG) {
            body = replace_tag(&body, PAGE_AUTHORS_TAG, page_block);
        } else {
            footer.push_str(page_block);
        }
        if let Some(last_modified) = &view.last_modified {
            footer.push_str(last_modified);
        }
    }

    let mut out = String::new();
    out.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
    out.push_str(&format!(
        "<title>{} - {}</title>\n",
        html_escape(view.source_path),
        html_escape(view.site_name)
    ));
    out.push_str("</head>\n<body>\n<article>\n<pre class='page-source'>");
    out.push_str(&body);
    out.push_str("</pre>\n</article>\n");
    if !footer.is_empty() {
        out.push_str("<footer>");
        out.push_str(&footer);
        out.push_str("</footer>\n");
    }
    out.push_str("</body>\n</html>\n");
    out
}

/// Tags are accepted with or without the inner spaces.
fn tag_variants(tag: &str) -> [String; 2] {
    [tag.to_string(), tag.replace(' ', "")]
}

fn contains_tag(text: &str, tag: &str) -> bool {
    tag_variants(tag).iter().any(|t| text.contains(t.as_str()))
}

fn replace_tag(text: &str, tag: &str, with: &str) -> String {
    let mut out = text.to_string();
    for variant in tag_variants(tag) {
        out = out.replace(&variant, with);
    }
    out
}

pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
