//! Engine configuration from environment-style variables.
//!
//! [`EngineConfig`] can be built three ways:
//!
//! - struct literal with [`Default`] for programmatic use
//! - [`EngineConfig::from_env`], lenient: bad values keep their default
//!   and log a warning
//! - [`EngineConfig::try_from_lookup`], strict: bad values are a
//!   [`ConfigError`]
//!
//! Both lookup forms take the variable source as a closure so tests never
//! touch the process environment.

use std::error::Error;
use std::fmt;
use std::path::PathBuf;

use foilmu_physics::ComptonRetention;
use foilmu_reference::Interpolation;

/// Path of a reference table tried before the fixed fallbacks.
pub const ENV_REFERENCE_CSV: &str = "FOILMU_REFERENCE_CSV";
/// Log-log reference interpolation toggle.
pub const ENV_LOG_INTERP: &str = "FOILMU_LOG_INTERP";
/// Whether μ_tr stands in for μ_en when no reference is available.
pub const ENV_PREFER_CALC_MU_TR: &str = "FOILMU_PREFER_CALC_MU_TR";
/// Simpson step count for the Compton retention integral.
pub const ENV_COMPTON_STEPS: &str = "FOILMU_COMPTON_STEPS";
/// Summary CSV output path.
pub const ENV_SUMMARY_CSV: &str = "FOILMU_SUMMARY_CSV";

/// Default summary file name, relative to the working directory.
pub const DEFAULT_SUMMARY_CSV: &str = "transmission_summary.csv";

// ── EngineConfig ───────────────────────────────────────────────────

/// Settings read once when a [`RunController`](crate::RunController) is built.
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Reference table tried first. `None` = only the fixed fallbacks.
    pub reference_path: Option<PathBuf>,
    /// Reference interpolation mode. Default: linear.
    pub interpolation: Interpolation,
    /// Use μ_tr as the CPE estimate when no reference ratio exists. Default: true.
    pub prefer_calculator_mu_tr: bool,
    /// Compton Simpson steps, already coerced to even and ≥ 32. Default: 512.
    pub compton_steps: usize,
    /// Where [`flush_summary`](crate::RunController::flush_summary) appends.
    pub summary_path: PathBuf,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_path: None,
            interpolation: Interpolation::Linear,
            prefer_calculator_mu_tr: true,
            compton_steps: ComptonRetention::DEFAULT_STEPS,
            summary_path: PathBuf::from(DEFAULT_SUMMARY_CSV),
        }
    }
}

impl EngineConfig {
    /// Read from the process environment, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through `lookup`, falling back to defaults.
    ///
    /// Unrecognised flag tokens and non-numeric step counts keep the
    /// default and log a warning.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| match lookup(name) {
            None => default,
            Some(value) => parse_flag(name, &value).unwrap_or_else(|err| {
                tracing::warn!("{err}; using default {default}");
                default
            }),
        };

        let interpolation = if flag(ENV_LOG_INTERP, false) {
            Interpolation::LogLog
        } else {
            Interpolation::Linear
        };
        let prefer_calculator_mu_tr = flag(ENV_PREFER_CALC_MU_TR, defaults.prefer_calculator_mu_tr);
        let compton_steps = match lookup(ENV_COMPTON_STEPS) {
            None => defaults.compton_steps,
            Some(value) => parse_steps(ENV_COMPTON_STEPS, &value).unwrap_or_else(|err| {
                tracing::warn!("{err}; using default {}", defaults.compton_steps);
                defaults.compton_steps
            }),
        };

        Self {
            reference_path: path_var(&lookup, ENV_REFERENCE_CSV),
            interpolation,
            prefer_calculator_mu_tr,
            compton_steps,
            summary_path: path_var(&lookup, ENV_SUMMARY_CSV).unwrap_or(defaults.summary_path),
        }
    }

    /// Read through `lookup`, rejecting any value that does not parse.
    pub fn try_from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |name: &str, default: bool| -> Result<bool, ConfigError> {
            lookup(name).map_or(Ok(default), |v| parse_flag(name, &v))
        };
        let config = Self {
            reference_path: path_var(&lookup, ENV_REFERENCE_CSV),
            interpolation: if flag(ENV_LOG_INTERP, false)? {
                Interpolation::LogLog
            } else {
                Interpolation::Linear
            },
            prefer_calculator_mu_tr: flag(ENV_PREFER_CALC_MU_TR, true)?,
            compton_steps: lookup(ENV_COMPTON_STEPS)
                .map_or(Ok(defaults.compton_steps), |v| parse_steps(ENV_COMPTON_STEPS, &v))?,
            summary_path: path_var(&lookup, ENV_SUMMARY_CSV).unwrap_or(defaults.summary_path),
        };
        config.validate()?;
        Ok(config)
    }

    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.summary_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptySummaryPath);
        }
        Ok(())
    }
}

fn path_var<F>(lookup: &F, name: &str) -> Option<PathBuf>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Parse a boolean token: `1/true/on/yes` or `0/false/off/no`, any case.
pub fn parse_flag(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Ok(true),
        "0" | "false" | "off" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}

/// Parse a step count and coerce it the way [`ComptonRetention::new`] does.
///
/// Negative numbers coerce to the minimum.
pub fn parse_steps(name: &str, value: &str) -> Result<usize, ConfigError> {
    let n: i64 = value.trim().parse().map_err(|_| ConfigError::InvalidInteger {
        name: name.to_string(),
        value: value.to_string(),
    })?;
    let n = usize::try_from(n.max(0)).unwrap_or(usize::MAX);
    Ok(ComptonRetention::coerce_steps(n))
}

// ── ConfigError ────────────────────────────────────────────────────

/// Errors detected by strict configuration parsing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A boolean variable held an unrecognised token.
    InvalidFlag {
        /// Variable name.
        name: String,
        /// The rejected value.
        value: String,
    },
    /// An integer variable did not parse.
    InvalidInteger {
        /// Variable name.
        name: String,
        /// The rejected value.
        value: String,
    },
    /// The summary path is empty.
    EmptySummaryPath,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidFlag { name, value } => {
                write!(f, "{name}: unrecognised boolean {value:?}")
            }
            Self::InvalidInteger { name, value } => {
                write!(f, "{name}: not an integer: {value:?}")
            }
            Self::EmptySummaryPath => write!(f, "summary path must not be empty"),
        }
    }
}

impl Error for ConfigError {}
