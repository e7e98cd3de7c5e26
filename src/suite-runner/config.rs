use std::{env, str::FromStr, time::Duration};

use regex::Regex;
use tracing::debug;

use libinterrupt::err::{InterruptError, InterruptResult};

pub const DEFAULT_SPECS: usize = 5;
pub const DEFAULT_SPEC_MILLIS: u64 = 1000;
pub const DEFAULT_STEP_MILLIS: u64 = 50;

/// Runner settings, read from the environment (and `.env`, if present).
#[derive(Debug)]
pub struct SuiteConfig {
    /// Number of specs in the suite.
    pub specs: usize,
    /// How long each spec works before passing.
    pub spec_duration: Duration,
    /// Longest stretch a spec works without checking for an interrupt.
    pub step: Duration,
    /// Only specs whose name matches are run.
    pub focus: Option<Regex>,
    /// Print the current spec and a stack report when interrupted.
    pub interrupt_report: bool,
}

impl SuiteConfig {
    /// Load `.env` and build the config from the process environment.
    pub fn from_env() -> InterruptResult<Self> {
        match dotenv::dotenv() {
            Ok(path) => debug!(path = %path.display(), "loaded .env"),
            Err(e) if e.not_found() => (),
            Err(e) => return Err(e.into()),
        }
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from `lookup`, which maps a variable name to its
    /// value if set.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> InterruptResult<Self> {
        let specs = parse_var(&lookup, "SUITE_SPECS", DEFAULT_SPECS)?;
        let spec_millis =
            parse_var(&lookup, "SUITE_SPEC_MILLIS", DEFAULT_SPEC_MILLIS)?;
        let step_millis =
            parse_var(&lookup, "SUITE_STEP_MILLIS", DEFAULT_STEP_MILLIS)?;
        if step_millis == 0 {
            return Err(InterruptError::Config {
                key: "SUITE_STEP_MILLIS",
                value: step_millis.to_string(),
            });
        }

        let focus = match lookup("SUITE_FOCUS") {
            Some(pat) if !pat.is_empty() => Some(Regex::new(&pat)?),
            _ => None,
        };

        let interrupt_report =
            parse_var(&lookup, "SUITE_INTERRUPT_REPORT", true)?;

        Ok(Self {
            specs,
            spec_duration: Duration::from_millis(spec_millis),
            step: Duration::from_millis(step_millis),
            focus,
            interrupt_report,
        })
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: T,
) -> InterruptResult<T> {
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| InterruptError::Config { key, value }),
    }
}
