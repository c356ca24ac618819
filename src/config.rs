use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::Error;
use crate::retry::RetryPolicy;

/// Name of the project configuration file.
pub const CONFIG_FILE: &str = ".docsync.toml";

/// Default location of the anchor map, relative to the project root.
pub const DEFAULT_MAP_PATH: &str = ".docsync/map.json";

/// Default worker pool width.
pub const DEFAULT_CONCURRENCY: usize = 5;

/// Project configuration loaded from `.docsync.toml`.
/// Include/exclude patterns are path prefixes applied to markdown files.
#[derive(Debug, Clone)]
pub struct Config {
    /// Auto-commit settings.
    pub commit: CommitConfig,
    /// Worker pool width, at least 1.
    pub concurrency: usize,
    /// Markdown path prefixes never scanned.
    exclude: Vec<String>,
    /// External generator settings.
    pub generator: GeneratorConfig,
    /// Markdown path prefixes scanned; empty scans everything.
    include: Vec<String>,
    /// Anchor map location, relative to the project root.
    pub map_path: PathBuf,
    /// Generation retry settings.
    pub retry: RetryPolicy,
}

/// `[generator]` section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Program and arguments. `None` means only placeholders are produced.
    pub command: Option<Vec<String>>,
    /// Deadline per generation call.
    pub timeout: Duration,
}

/// `[commit]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CommitConfig {
    /// Push after committing.
    pub push: bool,
}

/// Raw TOML structure for `.docsync.toml`.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct DocsyncToml {
    #[serde(default)]
    commit: RawCommit,
    concurrency: Option<usize>,
    #[serde(default)]
    exclude: Vec<String>,
    #[serde(default)]
    generator: RawGenerator,
    #[serde(default)]
    include: Vec<String>,
    map_path: Option<PathBuf>,
    #[serde(default)]
    retry: RawRetry,
}

/// Raw `[commit]` table.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawCommit {
    #[serde(default)]
    push: bool,
}

/// Raw `[generator]` table.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawGenerator {
    command: Option<Vec<String>>,
    timeout_secs: Option<u64>,
}

/// Raw `[retry]` table.
#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct RawRetry {
    delay_ms: Option<u64>,
    max_attempts: Option<u32>,
}

impl Config {
    /// Read `.docsync.toml` under `root`. An absent file means all defaults;
    /// a present but invalid one is an error rather than a silent fallback.
    ///
    /// # Errors
    ///
    /// `Error::Io` when the file exists but can't be read, `Error::TomlDe`
    /// when it doesn't match the schema.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let text = match std::fs::read_to_string(&path) {
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            other => other?,
        };
        return Ok(Self::from_raw(toml::from_str::<DocsyncToml>(&text)?));
    }

    /// Apply defaults to the parsed file.
    fn from_raw(raw: DocsyncToml) -> Self {
        let retry_defaults = RetryPolicy::default();
        return Self {
            commit: CommitConfig { push: raw.commit.push },
            concurrency: raw.concurrency.unwrap_or(DEFAULT_CONCURRENCY).max(1),
            exclude: raw.exclude,
            generator: GeneratorConfig {
                command: raw.generator.command.filter(|argv| return !argv.is_empty()),
                timeout: Duration::from_secs(raw.generator.timeout_secs.unwrap_or(60)),
            },
            include: raw.include,
            map_path: raw.map_path.unwrap_or_else(|| return PathBuf::from(DEFAULT_MAP_PATH)),
            retry: RetryPolicy {
                delay: raw.retry.delay_ms.map_or(retry_defaults.delay, Duration::from_millis),
                max_attempts: raw.retry.max_attempts.unwrap_or(retry_defaults.max_attempts),
            },
        };
    }

    /// Whether a markdown file (relative to the root) is in scope: under some
    /// `include` prefix when any are set, and under no `exclude` prefix.
    /// Prefixes match whole path components.
    pub fn should_scan(&self, relative: &Path) -> bool {
        let under = |prefixes: &[String]| return prefixes.iter().any(|p| return relative.starts_with(p));
        return (self.include.is_empty() || under(&self.include)) && !under(&self.exclude);
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self::from_raw(DocsyncToml::default());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.map_path, PathBuf::from(DEFAULT_MAP_PATH));
        assert_eq!(config.concurrency, 5);
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.retry.delay, Duration::from_millis(1000));
        assert_eq!(config.generator.timeout, Duration::from_secs(60));
        assert!(config.generator.command.is_none());
        assert!(!config.commit.push);
        assert!(config.should_scan(Path::new("anything.md")));
    }

    #[test]
    fn sections_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(CONFIG_FILE),
            r#"
map_path = "meta/anchors.json"
include = ["docs/"]
exclude = ["docs/drafts/"]
concurrency = 0

[retry]
max_attempts = 5
delay_ms = 10

[generator]
command = ["./gen.sh", "--fast"]
timeout_secs = 5

[commit]
push = true
"#,
        )
        .unwrap();

        let config = Config::load(dir.path()).unwrap();

        assert_eq!(config.map_path, PathBuf::from("meta/anchors.json"));
        assert_eq!(config.concurrency, 1);
        assert_eq!(config.retry.max_attempts, 5);
        assert_eq!(config.retry.delay, Duration::from_millis(10));
        assert_eq!(config.generator.command, Some(vec!["./gen.sh".to_string(), "--fast".to_string()]));
        assert_eq!(config.generator.timeout, Duration::from_secs(5));
        assert!(config.commit.push);
        assert!(config.should_scan(Path::new("docs/api.md")));
        assert!(!config.should_scan(Path::new("docs/drafts/wip.md")));
        assert!(!config.should_scan(Path::new("docsite/index.md")));
        assert!(!config.should_scan(Path::new("README.md")));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "concurrency = \"many\"\n").unwrap();

        assert!(matches!(Config::load(dir.path()), Err(Error::TomlDe(_))));
    }
}
