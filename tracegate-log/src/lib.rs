//! Logging facade for tracegate.
//!
//! # Setup
//!
//! To enable logging, invoke the [`init`] function with a [`LogConfig`]. The configuration
//! implements `serde` traits, so it can be obtained from the configuration file.
//!
//! ```
//! use tracegate_log::LogConfig;
//!
//! let config = LogConfig {
//!     enable_backtraces: true,
//!     ..LogConfig::default()
//! };
//!
//! tracegate_log::init(&config);
//! ```
//!
//! # Logging
//!
//! Logging happens through the five macros re-exported from `tracing`: [`error!`], [`warn!`],
//! [`info!`], [`debug!`] and [`trace!`], where `error!` represents the highest-priority messages
//! and `trace!` the lowest. All macros accept structured key-value fields in addition to a format
//! string.
//!
//! ## Conventions
//!
//! Log messages should start lowercase and end without punctuation. Prefer short and precise log
//! messages over verbose text. Choose the log level according to these rules:
//!
//! - [`error!`] for bugs and invalid behavior.
//! - [`warn!`] for undesirable behavior.
//! - [`info!`] for messages relevant to the average user.
//! - [`debug!`] for messages usually relevant to debugging.
//! - [`trace!`] for full auxiliary information.
//!
//! # Logging Error Types
//!
//! To log error types with their full cause chain, use the [`LogError`] wrapper:
//!
//! ```
//! use tracegate_log::LogError;
//!
//! if let Err(error) = std::env::var("FOO") {
//!     tracegate_log::error!("env failed: {}", LogError(&error));
//! }
//! ```
//!
//! # Testing
//!
//! For unit testing, there is a separate initialization macro [`init_test!`] that should be
//! called at the beginning of the test method. It enables test mode of the logger and customizes
//! log levels for the current crate.
//!
//! ```
//! #[test]
//! fn test_something() {
//!     tracegate_log::init_test!();
//! }
//! ```

#![warn(missing_docs)]

mod setup;
pub use setup::*;

pub use test::*;

mod utils;
pub use utils::*;

// Expose the minimal log facade.
#[doc(inline)]
pub use tracing::{debug, error, info, trace, warn};
