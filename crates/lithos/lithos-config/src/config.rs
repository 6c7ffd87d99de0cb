use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Which slot implementation a contention run exercises.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SlotKind {
    Mutex,
    Ring,
}

impl SlotKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SlotKind::Mutex => "mutex",
            SlotKind::Ring => "ring",
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
pub struct ContentionConfig {
    #[serde(default = "defaults::reader_count")]
    pub reader_count: usize,
    #[serde(default = "defaults::writer_count")]
    pub writer_count: usize,
    /// Reads performed by each reader per run.
    #[serde(default = "defaults::iterations")]
    pub iterations: u64,
    /// Pause between two writes of the same writer.
    #[serde(default = "defaults::writer_interval_ns")]
    pub writer_interval_ns: u64,
    #[serde(default = "defaults::runs")]
    pub runs: usize,
    #[serde(default = "defaults::log_level")]
    pub log_level: String,
    #[serde(default = "defaults::implementations")]
    pub implementations: Vec<SlotKind>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read '{path}'")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

mod defaults {
    use super::SlotKind;

    pub fn reader_count() -> usize {
        4
    }

    pub fn writer_count() -> usize {
        2
    }

    pub fn iterations() -> u64 {
        1_000_000
    }

    pub fn writer_interval_ns() -> u64 {
        1
    }

    pub fn runs() -> usize {
        3
    }

    pub fn log_level() -> String {
        "info".into()
    }

    pub fn implementations() -> Vec<SlotKind> {
        vec![SlotKind::Mutex, SlotKind::Ring]
    }
}

impl Default for ContentionConfig {
    fn default() -> Self {
        Self {
            reader_count: defaults::reader_count(),
            writer_count: defaults::writer_count(),
            iterations: defaults::iterations(),
            writer_interval_ns: defaults::writer_interval_ns(),
            runs: defaults::runs(),
            log_level: defaults::log_level(),
            implementations: defaults::implementations(),
        }
    }
}

impl ContentionConfig {
    pub fn load(path: impl AsRef<Path> + ToString) -> Result<Self, ConfigError> {
        let toml_to_str = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        let config = Self::from_toml(&toml_to_str)?;
        tracing::debug!(path = %path.to_string(), ?config, "loaded contention config");
        Ok(config)
    }

    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let config: ContentionConfig = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reader_count == 0 {
            return Err(ConfigError::Invalid("reader_count must be at least 1".into()));
        }
        if self.writer_count == 0 {
            return Err(ConfigError::Invalid("writer_count must be at least 1".into()));
        }
        if self.iterations == 0 {
            return Err(ConfigError::Invalid("iterations must be at least 1".into()));
        }
        if self.runs == 0 {
            return Err(ConfigError::Invalid("runs must be at least 1".into()));
        }
        if self.implementations.is_empty() {
            return Err(ConfigError::Invalid("no implementations selected".into()));
        }
        Ok(())
    }

    pub fn writer_interval(&self) -> Duration {
        Duration::from_nanos(self.writer_interval_ns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_file_uses_defaults() {
        let cfg = ContentionConfig::from_toml("").expect("empty config should parse");
        assert_eq!(cfg.reader_count, 4);
        assert_eq!(cfg.writer_count, 2);
        assert_eq!(cfg.iterations, 1_000_000);
        assert_eq!(cfg.writer_interval(), Duration::from_nanos(1));
        assert_eq!(cfg.runs, 3);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.implementations, vec![SlotKind::Mutex, SlotKind::Ring]);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = ContentionConfig::from_toml(
            r#"
            reader_count = 8
            writer_count = 1
            iterations = 500
            writer_interval_ns = 1000
            implementations = ["ring"]
            "#,
        )
        .expect("config should parse");
        assert_eq!(cfg.reader_count, 8);
        assert_eq!(cfg.writer_count, 1);
        assert_eq!(cfg.iterations, 500);
        assert_eq!(cfg.writer_interval(), Duration::from_micros(1));
        assert_eq!(cfg.implementations, vec![SlotKind::Ring]);
        assert_eq!(cfg.runs, 3);
    }

    #[test]
    fn unknown_implementation_is_a_parse_error() {
        let err = ContentionConfig::from_toml(r#"implementations = ["rwlock"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)), "got {err:?}");
    }

    #[test]
    fn zero_readers_is_rejected() {
        let err = ContentionConfig::from_toml("reader_count = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)), "got {err:?}");
    }

    #[test]
    fn default_matches_empty_file() {
        let parsed = ContentionConfig::from_toml("").unwrap();
        let default = ContentionConfig::default();
        assert_eq!(parsed.reader_count, default.reader_count);
        assert_eq!(parsed.iterations, default.iterations);
        assert_eq!(parsed.implementations, default.implementations);
        assert!(default.validate().is_ok());
    }

    #[test]
    fn load_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "runs = 1\nlog_level = \"debug\"").unwrap();
        let path = file.path().to_string_lossy().into_owned();
        let cfg = ContentionConfig::load(path).unwrap();
        assert_eq!(cfg.runs, 1);
        assert_eq!(cfg.log_level, "debug");
    }

    #[test]
    fn load_reports_missing_file() {
        let err = ContentionConfig::load("/nonexistent/lithos/contention.toml").unwrap_err();
        match err {
            ConfigError::Read { path, .. } => {
                assert_eq!(path, "/nonexistent/lithos/contention.toml")
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
