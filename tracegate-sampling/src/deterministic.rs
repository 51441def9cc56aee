use std::sync::Arc;

use arc_swap::ArcSwap;
use sha1::{Digest, Sha1};

use tracegate_config::{ConfigError, ConfigProvider};

use crate::config::SamplerConfig;

/// Extra bytes mixed into the trace ID before hashing, so that this sampler does not select the
/// same traces as any other component that hashes trace IDs (eg deterministic shard assignment).
///
/// The salt is part of the wire contract: every process in the fleet must use the same value, and
/// changing it silently changes the decision for every trace.
const SHARDING_SALT: &str = "5VQ8l2jE5aJLPVqk";

/// The outcome of a sampling decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SamplingDecision {
    /// The sample rate in effect when the decision was made.
    ///
    /// Callers record this alongside kept traces so that downstream accounting knows the trace
    /// stands in for `sample_rate` traces.
    pub sample_rate: u32,
    /// Whether the trace is kept.
    pub keep: bool,
}

/// A sample rate with its derived acceptance threshold.
///
/// Values are immutable once constructed; reconfiguration produces a new `ThresholdState` rather
/// than mutating the installed one, which is what makes a single pointer swap sufficient for
/// consistency under concurrent reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdState {
    sample_rate: u32,
    acceptance_bound: u32,
}

impl ThresholdState {
    /// Derives the threshold for the requested sample rate.
    ///
    /// Rates below 1 are forced to 1 with a logged warning, rates above `u32::MAX` saturate.
    /// The acceptance bound is the largest possible hash value divided by the rate; at a rate of
    /// 1 every hash value falls below the bound and every trace is kept.
    pub fn new(requested_rate: i64) -> Self {
        let sample_rate = if requested_rate < 1 {
            tracegate_log::warn!(
                sample_rate = requested_rate,
                "configured sample rate is less than 1, forcing to 1"
            );
            1
        } else {
            u32::try_from(requested_rate).unwrap_or(u32::MAX)
        };

        Self {
            sample_rate,
            acceptance_bound: u32::MAX / sample_rate,
        }
    }

    /// The sample rate this threshold was derived from.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Hash values up to and including this bound are kept.
    pub fn acceptance_bound(&self) -> u32 {
        self.acceptance_bound
    }

    fn load(provider: &dyn ConfigProvider, name: &str) -> Result<Self, ConfigError> {
        let config = SamplerConfig::fetch(provider, name)?;
        Ok(Self::new(config.sample_rate))
    }
}

/// A sampler that derives keep/drop decisions deterministically from the trace ID.
///
/// Every process configured with the same sample rate comes to the same decision for a given
/// trace without coordination; see the [crate docs](crate) for how this is used across the
/// pipeline.
pub struct DeterministicSampler {
    name: String,
    config: Arc<dyn ConfigProvider>,
    state: ArcSwap<ThresholdState>,
}

impl DeterministicSampler {
    /// Creates the sampler, loads its configuration, and subscribes to reloads.
    ///
    /// The configuration record is looked up under `SamplerConfig.<name>`. A record that is
    /// absent or malformed fails startup; reload failures after startup are logged at error
    /// level and leave the active threshold untouched.
    pub fn start(
        name: &str,
        config: Arc<dyn ConfigProvider>,
    ) -> Result<Arc<Self>, ConfigError> {
        tracegate_log::debug!(name, "starting deterministic sampler");

        let state = ThresholdState::load(config.as_ref(), name)?;
        let sampler = Arc::new(Self {
            name: name.to_owned(),
            config: Arc::clone(&config),
            state: ArcSwap::from_pointee(state),
        });

        // The callback must neither keep the sampler alive nor propagate errors into the
        // notification mechanism.
        let weak = Arc::downgrade(&sampler);
        config.on_reload(Box::new(move || {
            let Some(sampler) = weak.upgrade() else {
                return;
            };

            tracegate_log::debug!(
                name = sampler.name.as_str(),
                "reloading deterministic sampler config"
            );

            if let Err(error) = sampler.reconfigure() {
                tracegate_log::error!(
                    error = %error,
                    name = sampler.name.as_str(),
                    "failed to reload deterministic sampler config"
                );
            }
        }));

        tracegate_log::debug!(name, "finished starting deterministic sampler");
        Ok(sampler)
    }

    /// The name under which this sampler looks up its configuration.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Re-reads the configuration record and installs the freshly derived threshold.
    ///
    /// The new threshold is built in full before it is published with a single atomic swap;
    /// concurrent [`decide`](Self::decide) calls observe either the previous or the new
    /// threshold. On error the previous threshold stays active.
    pub fn reconfigure(&self) -> Result<(), ConfigError> {
        let state = ThresholdState::load(self.config.as_ref(), &self.name)?;
        self.state.store(Arc::new(state));
        Ok(())
    }

    /// Decides whether the trace with the given ID is kept.
    ///
    /// For a fixed threshold this is a pure function of the trace ID: the ID is hashed together
    /// with a fixed salt and the big-endian value of the first four digest bytes is
    /// compared against the acceptance bound. At a rate of 1 no hashing happens and every trace
    /// is kept, including the empty ID.
    pub fn decide(&self, trace_id: &str) -> SamplingDecision {
        let state = self.state.load();

        if state.sample_rate <= 1 {
            return SamplingDecision {
                sample_rate: 1,
                keep: true,
            };
        }

        let mut hasher = Sha1::new();
        hasher.update(trace_id.as_bytes());
        hasher.update(SHARDING_SALT.as_bytes());
        let digest = hasher.finalize();

        let hash = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);

        SamplingDecision {
            sample_rate: state.sample_rate,
            keep: hash <= state.acceptance_bound,
        }
    }
}
