// Site configuration: the YAML file a build starts from, plus the validated
// options of the git-authors plugin inside it.

use crate::aggregate::{AttributionOptions, SortAuthorsBy};
use crate::errors::ConfigError;
use crate::exclude::ExclusionRules;
use crate::fallback::{FallbackConfig, FallbackPolicy};
use crate::history::Identity;
use crate::render::RenderOptions;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Name under which the plugin is listed in `plugins:`.
pub const PLUGIN_NAME: &str = "git-authors";

/// Plugin options exactly as written in YAML. Unknown keys are an error.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginOptions {
    pub enabled: bool,
    pub exclude: Vec<String>,
    pub fallback_policy: FallbackPolicy,
    pub fallback_author: Option<Identity>,
    pub fallback_to_build_date: bool,
    /// Build without git history when the docs are not in a repository.
    pub fallback_to_empty: bool,
    pub show_email_address: bool,
    pub show_contribution: bool,
    pub sort_authors_by: SortAuthorsBy,
    pub authorship_threshold_percent: f64,
    pub ignore_authors: Vec<String>,
    pub ignore_commits: Vec<String>,
    pub add_co_authors: bool,
    /// Treat build warnings as errors.
    pub strict: bool,
}

impl Default for PluginOptions {
    fn default() -> Self {
        PluginOptions {
            enabled: true,
            exclude: Vec::new(),
            fallback_policy: FallbackPolicy::Warn,
            fallback_author: None,
            fallback_to_build_date: false,
            fallback_to_empty: false,
            show_email_address: true,
            show_contribution: false,
            sort_authors_by: SortAuthorsBy::FirstContribution,
            authorship_threshold_percent: 0.0,
            ignore_authors: Vec::new(),
            ignore_commits: Vec::new(),
            add_co_authors: false,
            strict: false,
        }
    }
}

/// Validated, immutable plugin configuration for one build.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PluginConfig {
    pub exclude: ExclusionRules,
    pub attribution: AttributionOptions,
    pub fallback: FallbackConfig,
    pub fallback_to_empty: bool,
    pub render: RenderOptions,
    pub strict: bool,
}

impl PluginConfig {
    pub fn from_options(options: PluginOptions) -> Result<Self, ConfigError> {
        let threshold = options.authorship_threshold_percent;
        if !(0.0..=100.0).contains(&threshold) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }

        match (options.fallback_policy, &options.fallback_author) {
            (FallbackPolicy::UseDefaultAuthor, None) => {
                return Err(ConfigError::MissingFallbackAuthor);
            }
            (FallbackPolicy::Warn | FallbackPolicy::Suppress, Some(_)) => {
                return Err(ConfigError::UnusedFallbackAuthor {
                    policy: options.fallback_policy.to_string(),
                });
            }
            _ => {}
        }

        let mut ignore_commits = Vec::new();
        for id in &options.ignore_commits {
            let id = id.trim();
            let is_hex = id.chars().all(|c| c.is_ascii_hexdigit());
            if !is_hex || !(4..=40).contains(&id.len()) {
                return Err(ConfigError::InvalidCommitId(id.to_string()));
            }
            ignore_commits.push(id.to_lowercase());
        }

        Ok(PluginConfig {
            exclude: ExclusionRules::new(&options.exclude)?,
            attribution: AttributionOptions {
                sort_authors_by: options.sort_authors_by,
                authorship_threshold: threshold / 100.0,
                ignore_authors: options
                    .ignore_authors
                    .iter()
                    .map(|e| e.trim().to_lowercase())
                    .collect(),
                ignore_commits,
                add_co_authors: options.add_co_authors,
            },
            fallback: FallbackConfig {
                policy: options.fallback_policy,
                default_author: options.fallback_author,
                to_build_date: options.fallback_to_build_date,
            },
            fallback_to_empty: options.fallback_to_empty,
            render: RenderOptions {
                show_email_address: options.show_email_address,
                show_contribution: options.show_contribution,
            },
            strict: options.strict,
        })
    }
}

#[derive(Debug, Deserialize)]
struct RawSiteConfig {
    #[serde(default)]
    site_name: Option<serde_yaml::Value>,
    #[serde(default)]
    docs_dir: Option<serde_yaml::Value>,
    #[serde(default)]
    use_directory_urls: Option<bool>,
    #[serde(default)]
    plugins: Option<RawPlugins>,
}

/// `plugins:` may be a list (`- name` or `- name: {..}`) or a mapping.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPlugins {
    List(Vec<RawPluginEntry>),
    Map(BTreeMap<String, serde_yaml::Value>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawPluginEntry {
    Name(String),
    Configured(BTreeMap<String, serde_yaml::Value>),
}

impl RawPlugins {
    /// The raw options of our plugin, if listed. `Null` means "listed
    /// without options".
    fn find(self, name: &str) -> Option<serde_yaml::Value> {
        match self {
            RawPlugins::Map(mut map) => map.remove(name),
            RawPlugins::List(entries) => entries.into_iter().find_map(|entry| match entry {
                RawPluginEntry::Name(n) if n == name => Some(serde_yaml::Value::Null),
                RawPluginEntry::Name(_) => None,
                RawPluginEntry::Configured(mut map) => map.remove(name),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteConfig {
    pub site_name: String,
    /// Resolved against the config file's directory.
    pub docs_dir: PathBuf,
    pub use_directory_urls: bool,
    /// `None` when the plugin is not listed or `enabled: false`.
    pub plugin: Option<PluginConfig>,
}

impl SiteConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&contents, path)
    }

    /// Parse config text as if it had been read from `path`. `!ENV` tags
    /// read the process environment.
    pub fn parse(contents: &str, path: &Path) -> Result<Self, ConfigError> {
        Self::parse_with_env(contents, path, &|name| std::env::var(name).ok())
    }

    fn parse_with_env(
        contents: &str,
        path: &Path,
        env: &dyn Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let raw: RawSiteConfig =
            serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                path: path.to_path_buf(),
                source: e,
            })?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        let setting = |key: &'static str, value: Option<serde_yaml::Value>| {
            string_setting(value, env).ok_or_else(|| ConfigError::InvalidSetting {
                path: path.to_path_buf(),
                key,
            })
        };
        let site_name = setting("site_name", raw.site_name)?;
        let docs_dir = setting("docs_dir", raw.docs_dir)?;
        let docs_dir = base.join(docs_dir.unwrap_or_else(|| "docs".to_string()));

        let options = match raw.plugins.and_then(|p| p.find(PLUGIN_NAME)) {
            None => None,
            Some(serde_yaml::Value::Null) => Some(PluginOptions::default()),
            Some(value) => Some(serde_yaml::from_value::<PluginOptions>(value).map_err(
                |e| ConfigError::PluginOptions {
                    path: path.to_path_buf(),
                    source: e,
                },
            )?),
        };

        let plugin = match options {
            Some(options) if options.enabled => Some(PluginConfig::from_options(options)?),
            Some(_) => {
                debug!("{PLUGIN_NAME} plugin disabled by configuration");
                None
            }
            None => None,
        };

        Ok(SiteConfig {
            site_name: site_name.unwrap_or_else(|| "Documentation".to_string()),
            docs_dir,
            use_directory_urls: raw.use_directory_urls.unwrap_or(true),
            plugin,
        })
    }
}

/// A top-level string setting, either literal or MkDocs' `!ENV` form:
/// `!ENV NAME` or `!ENV [NAME, OTHER, default]`. The first variable that is
/// set wins, then the trailing default. `Some(None)` means "use the built-in
/// default"; `None` means the value has the wrong shape.
fn string_setting(
    value: Option<serde_yaml::Value>,
    env: &dyn Fn(&str) -> Option<String>,
) -> Option<Option<String>> {
    use serde_yaml::Value;

    let value = match value {
        None | Some(Value::Null) => return Some(None),
        Some(Value::Tagged(tagged)) if tagged.tag == "ENV" => tagged.value,
        Some(value) => return scalar(&value).map(Some),
    };
    let items = match value {
        Value::Sequence(items) => items,
        name => vec![name],
    };
    let (names, default) = match items.split_last() {
        Some((last, rest)) if !rest.is_empty() => (rest, Some(last)),
        _ => (items.as_slice(), None),
    };
    for name in names {
        if let Some(found) = env(name.as_str()?) {
            return Some(Some(found));
        }
    }
    match default {
        None | Some(Value::Null) => Some(None),
        Some(value) => scalar(value).map(Some),
    }
}

fn scalar(value: &serde_yaml::Value) -> Option<String> {
    use serde_yaml::Value;
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
