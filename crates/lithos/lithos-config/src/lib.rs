mod config;

pub use config::{ConfigError, ContentionConfig, SlotKind};
