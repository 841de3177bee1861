//! Run configuration for [`LockstepRunner`](crate::LockstepRunner).

use eddy_core::ConfigError;

/// What the runner does when a step leaves non-finite state behind.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InstabilityPolicy {
    /// Skip the scan entirely.
    Ignore,
    /// Scan after every step, log a warning and report the hit on the
    /// [`StepResult`](crate::StepResult). Stepping continues.
    #[default]
    Warn,
    /// Like [`Warn`](Self::Warn), then refuse further steps until
    /// [`resume`](crate::LockstepRunner::resume) is called.
    Halt,
}

/// Configuration for a [`LockstepRunner`](crate::LockstepRunner).
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Timestep passed to every `step()`.
    pub dt: f64,
    /// Reaction to a failed NaN/Inf scan.
    pub instability_policy: InstabilityPolicy,
}

impl Default for RunConfig {
    /// One lattice time unit with the [`Warn`](InstabilityPolicy::Warn)
    /// policy.
    fn default() -> Self {
        Self {
            dt: 1.0,
            instability_policy: InstabilityPolicy::default(),
        }
    }
}

impl RunConfig {
    /// A config with the given `dt` and the default policy.
    pub fn with_dt(dt: f64) -> Self {
        Self {
            dt,
            ..Self::default()
        }
    }

    /// Set the instability policy.
    pub fn policy(mut self, policy: InstabilityPolicy) -> Self {
        self.instability_policy = policy;
        self
    }

    /// Check `dt` on its own and against an optional solver ceiling.
    ///
    /// `dt` must be finite and strictly positive; with a ceiling it must
    /// also not exceed `max_dt`.
    pub fn validate(&self, max_dt: Option<f64>) -> Result<(), ConfigError> {
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(ConfigError::InvalidDt { dt: self.dt });
        }
        if let Some(max_dt) = max_dt {
            if self.dt > max_dt {
                return Err(ConfigError::DtOutOfRange {
                    dt: self.dt,
                    max_dt,
                });
            }
        }
        Ok(())
    }
}
