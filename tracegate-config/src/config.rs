use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;
use serde_yaml::Value;
use thiserror::Error;

use tracegate_log::LogConfig;

/// Callback invoked after each completed configuration reload.
pub type ReloadCallback = Box<dyn Fn() + Send + Sync>;

/// Indicates config related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to open or read the config file.
    #[error("could not open config file {path:?}")]
    CouldNotOpenFile {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Parsing YAML failed.
    #[error("could not parse yaml config file")]
    BadYaml(#[from] serde_yaml::Error),

    /// There is no configuration entry under the given key.
    #[error("no configuration entry under key {key:?}")]
    NotFound {
        /// The dotted key that was looked up.
        key: String,
    },

    /// The entry exists but does not have the requested shape.
    #[error("invalid value for configuration entry {key:?}")]
    InvalidValue {
        /// The dotted key that was looked up.
        key: String,
        /// The underlying deserialization error.
        #[source]
        source: serde_yaml::Error,
    },
}

/// Read access to named configuration records with reload notifications.
///
/// This is the interface consumed by components that hold a live view of their own configuration
/// section, most notably the samplers. It is deliberately narrow: a dotted-key lookup into the
/// current document, and a subscription that fires after every completed reload.
pub trait ConfigProvider: Send + Sync {
    /// Looks up the configuration entry under a dotted key.
    ///
    /// Returns [`ConfigError::NotFound`] if any segment of the key is missing from the document.
    fn named_config(&self, key: &str) -> Result<Value, ConfigError>;

    /// Registers a callback invoked after each completed configuration reload.
    ///
    /// Callbacks must not propagate errors to the notification mechanism; failures inside a
    /// callback are the callback's own to report.
    fn on_reload(&self, callback: ReloadCallback);
}

impl<'a> dyn ConfigProvider + 'a {
    /// Looks up the entry under a dotted key and deserializes it into `T`.
    pub fn deserialize_named<T: DeserializeOwned>(&self, key: &str) -> Result<T, ConfigError> {
        let value = self.named_config(key)?;
        serde_yaml::from_value(value).map_err(|source| ConfigError::InvalidValue {
            key: key.to_owned(),
            source,
        })
    }
}

/// The tracegate configuration document.
///
/// The parsed document is published through an atomic pointer swap on reload; readers obtained
/// through [`ConfigProvider`] always observe one consistent document.
pub struct Config {
    path: Option<PathBuf>,
    doc: ArcSwap<Value>,
    reload_callbacks: Mutex<Vec<ReloadCallback>>,
}

impl Config {
    /// Loads the configuration from a YAML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let doc = load_document(&path)?;

        Ok(Self {
            path: Some(path),
            doc: ArcSwap::from_pointee(doc),
            reload_callbacks: Mutex::new(Vec::new()),
        })
    }

    /// Parses the configuration from a YAML string.
    ///
    /// A config created this way is not backed by a file; [`Config::reload`] only re-notifies
    /// subscribers. Use [`Config::replace`] to swap in new contents.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigError> {
        let doc = serde_yaml::from_str(yaml)?;

        Ok(Self {
            path: None,
            doc: ArcSwap::from_pointee(doc),
            reload_callbacks: Mutex::new(Vec::new()),
        })
    }

    /// Re-reads the backing file, publishes the new document, and notifies subscribers.
    ///
    /// On error the previously published document stays in place and no notification fires.
    pub fn reload(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            let doc = load_document(path)?;
            self.doc.store(Arc::new(doc));
        }

        self.notify_reload();
        Ok(())
    }

    /// Replaces the document with newly parsed contents and notifies subscribers.
    pub fn replace(&self, yaml: &str) -> Result<(), ConfigError> {
        let doc = serde_yaml::from_str(yaml)?;
        self.doc.store(Arc::new(doc));

        self.notify_reload();
        Ok(())
    }

    /// Returns the logging configuration from the `Logging` section.
    ///
    /// Falls back to defaults if the section is absent.
    pub fn logging(&self) -> Result<LogConfig, ConfigError> {
        match self.named_config("Logging") {
            Ok(value) => serde_yaml::from_value(value).map_err(|source| {
                ConfigError::InvalidValue {
                    key: "Logging".to_owned(),
                    source,
                }
            }),
            Err(ConfigError::NotFound { .. }) => Ok(LogConfig::default()),
            Err(error) => Err(error),
        }
    }

    fn notify_reload(&self) {
        let callbacks = self
            .reload_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        for callback in callbacks.iter() {
            callback();
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

impl ConfigProvider for Config {
    fn named_config(&self, key: &str) -> Result<Value, ConfigError> {
        let doc = self.doc.load();
        let mut current: &Value = &doc;

        for segment in key.split('.') {
            current = current.get(segment).ok_or_else(|| ConfigError::NotFound {
                key: key.to_owned(),
            })?;
        }

        Ok(current.clone())
    }

    fn on_reload(&self, callback: ReloadCallback) {
        self.reload_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(callback);
    }
}

fn load_document(path: &Path) -> Result<Value, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::CouldNotOpenFile {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(serde_yaml::from_str(&contents)?)
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    const YAML: &str = r"
Logging:
  Level: debug
  Format: json
SamplerConfig:
  production:
    SampleRate: 10
  staging:
    SampleRate: 1
";

    fn provider(yaml: &str) -> Arc<dyn ConfigProvider> {
        Arc::new(Config::from_yaml(yaml).unwrap())
    }

    #[test]
    fn test_named_config_nested() {
        let config = provider(YAML);
        let value = config.named_config("SamplerConfig.production").unwrap();

        assert_eq!(value.get("SampleRate").and_then(Value::as_u64), Some(10));
    }

    #[test]
    fn test_named_config_missing() {
        let config = provider(YAML);
        let error = config.named_config("SamplerConfig.unknown").unwrap_err();

        assert!(matches!(error, ConfigError::NotFound { .. }));
    }

    #[test]
    fn test_deserialize_named() {
        #[derive(Debug, serde::Deserialize, PartialEq)]
        #[serde(rename_all = "PascalCase")]
        struct Record {
            sample_rate: u64,
        }

        let config = provider(YAML);
        let record: Record = config
            .deserialize_named("SamplerConfig.production")
            .unwrap();

        assert_eq!(record, Record { sample_rate: 10 });
    }

    #[test]
    fn test_deserialize_named_wrong_shape() {
        #[derive(Debug, serde::Deserialize)]
        struct Record {
            #[allow(dead_code)]
            sample_rate: Vec<String>,
        }

        let config = provider(YAML);
        let error = config
            .deserialize_named::<Record>("SamplerConfig.production")
            .unwrap_err();

        assert!(matches!(error, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_logging_section() {
        let config = Config::from_yaml(YAML).unwrap();
        let logging = config.logging().unwrap();

        assert_eq!(logging.level, tracegate_log::LogLevel::Debug);
        assert_eq!(logging.format, tracegate_log::LogFormat::Json);
    }

    #[test]
    fn test_logging_section_defaults() {
        let config = Config::from_yaml("SamplerConfig: {}").unwrap();
        let logging = config.logging().unwrap();

        assert_eq!(logging.level, tracegate_log::LogLevel::Info);
    }

    #[test]
    fn test_reload_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "SamplerConfig:\n  x:\n    SampleRate: 2\n").unwrap();

        let config = Config::from_path(file.path()).unwrap();
        let reloads = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&reloads);
        config.on_reload(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        let value = config.named_config("SamplerConfig.x").unwrap();
        assert_eq!(value.get("SampleRate").and_then(Value::as_u64), Some(2));

        fs::write(file.path(), "SamplerConfig:\n  x:\n    SampleRate: 7\n").unwrap();
        config.reload().unwrap();

        let value = config.named_config("SamplerConfig.x").unwrap();
        assert_eq!(value.get("SampleRate").and_then(Value::as_u64), Some(7));
        assert_eq!(reloads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_reload_keeps_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "SamplerConfig:\n  x:\n    SampleRate: 2\n").unwrap();

        let config = Config::from_path(file.path()).unwrap();
        let reloads = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&reloads);
        config.on_reload(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        fs::write(file.path(), "SamplerConfig: [").unwrap();
        assert!(config.reload().is_err());

        // The previous document stays published and no notification fired.
        let value = config.named_config("SamplerConfig.x").unwrap();
        assert_eq!(value.get("SampleRate").and_then(Value::as_u64), Some(2));
        assert_eq!(reloads.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_replace_notifies() {
        let config = Config::from_yaml("A: 1").unwrap();
        let reloads = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&reloads);
        config.on_reload(Box::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        }));

        config.replace("A: 2").unwrap();

        assert_eq!(
            config.named_config("A").unwrap().as_u64(),
            Some(2)
        );
        assert_eq!(reloads.load(Ordering::SeqCst), 1);
    }
}
