//! Configuration for the tracegate server.
//!
//! The configuration is a single YAML document. Components do not hold parsed copies of their
//! sections; instead, they look up their own record through [`ConfigProvider`] under a dotted
//! key (for example `SamplerConfig.my-dataset`) and re-read it whenever a reload notification
//! arrives. This keeps the document the single source of truth across live reconfigurations.
//!
//! [`Config`] holds the document behind an atomic pointer: a reload parses the entire new
//! document first and publishes it in one swap, so concurrent readers observe either the old or
//! the new document in full, never a partially applied one. After each completed reload, all
//! callbacks registered via [`ConfigProvider::on_reload`] are invoked.
//!
//! Detecting that the file changed is the job of an external watcher, which calls
//! [`Config::reload`].

#![warn(missing_docs)]

mod config;
pub use config::*;
