use serde::{Deserialize, Serialize};

use tracegate_config::{ConfigError, ConfigProvider};

/// Configuration record for a deterministic sampler.
///
/// Persisted in the configuration document under `SamplerConfig.<name>`, where `<name>` is the
/// name the sampler was started with.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct SamplerConfig {
    /// Keep approximately one out of every `sample_rate` traces.
    ///
    /// Values below 1 are forced to 1 when the threshold is derived.
    pub sample_rate: i64,
}

impl SamplerConfig {
    /// Returns the dotted lookup key for the sampler with the given name.
    pub fn key(name: &str) -> String {
        format!("SamplerConfig.{name}")
    }

    /// Fetches the record for the sampler with the given name.
    ///
    /// Fails if the record is absent or cannot be deserialized; a present record with a missing
    /// `SampleRate` field defaults to 0.
    pub fn fetch(provider: &dyn ConfigProvider, name: &str) -> Result<Self, ConfigError> {
        provider.deserialize_named(&Self::key(name))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tracegate_config::Config;

    use super::*;

    #[test]
    fn test_key() {
        assert_eq!(SamplerConfig::key("production"), "SamplerConfig.production");
    }

    #[test]
    fn test_fetch() {
        let config = Config::from_yaml("SamplerConfig:\n  x:\n    SampleRate: 4\n").unwrap();
        let provider: Arc<dyn ConfigProvider> = Arc::new(config);

        let config = SamplerConfig::fetch(provider.as_ref(), "x").unwrap();
        assert_eq!(config.sample_rate, 4);
    }

    #[test]
    fn test_fetch_missing_field_defaults() {
        let config = Config::from_yaml("SamplerConfig:\n  x: {}\n").unwrap();
        let provider: Arc<dyn ConfigProvider> = Arc::new(config);

        let config = SamplerConfig::fetch(provider.as_ref(), "x").unwrap();
        assert_eq!(config.sample_rate, 0);
    }

    #[test]
    fn test_fetch_absent_record() {
        let config = Config::from_yaml("SamplerConfig: {}\n").unwrap();
        let provider: Arc<dyn ConfigProvider> = Arc::new(config);

        let error = SamplerConfig::fetch(provider.as_ref(), "x").unwrap_err();
        assert!(matches!(error, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_fetch_malformed_record() {
        let config = Config::from_yaml("SamplerConfig:\n  x:\n    SampleRate: fast\n").unwrap();
        let provider: Arc<dyn ConfigProvider> = Arc::new(config);

        let error = SamplerConfig::fetch(provider.as_ref(), "x").unwrap_err();
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
    }
}
