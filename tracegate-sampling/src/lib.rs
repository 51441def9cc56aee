//! Deterministic trace sampling.
//!
//! To keep ingest affordable at scale, tracegate forwards only a controlled fraction of incoming
//! traces downstream. How large that fraction is gets configured per sampler as a rate of
//! 1-in-N; *which* traces make up the fraction is decided here.
//!
//! # Determinism
//!
//! Spans of one trace arrive at different hosts, and every host must come to the same keep or
//! drop verdict without coordinating with the others. The decision is therefore a pure function
//! of the trace ID: a salted hash of the ID is compared against an acceptance bound derived from
//! the sample rate, so any process configured with the same rate reproduces the decision — across
//! replicas, across restarts, and across the lifetime of the trace.
//!
//! # Live reconfiguration
//!
//! Sample rates change at runtime. [`DeterministicSampler`] subscribes to configuration reloads
//! and derives a fresh [`ThresholdState`] off to the side, installing it with a single atomic
//! swap. Concurrent decisions observe either the old or the new threshold in full, never a
//! mixture of one rate with another rate's bound. A reload that fails leaves the active
//! threshold untouched.

#![warn(missing_docs)]

mod config;
mod deterministic;

pub use config::SamplerConfig;
pub use deterministic::{DeterministicSampler, SamplingDecision, ThresholdState};
