//! Logging initialization module
//!
//! One subscriber per process. The filter comes from `JSONDELTA_LOG` when
//! set, else from the profile's default directives.

use std::sync::Once;
use tracing_subscriber::{util::SubscriberInitExt, EnvFilter};

/// Environment variable overriding the profile's filter directives
pub const LOG_ENV_VAR: &str = "JSONDELTA_LOG";

/// Logging profile configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    /// Human-readable output, per-level score traces included
    Development,
    /// JSON lines, run start/end only
    Production,
    /// No output; tests install the capture layer instead
    Test,
}

impl Profile {
    /// Filter directives used when `JSONDELTA_LOG` is unset
    pub fn default_directives(&self) -> &'static str {
        match self {
            Profile::Development => "jsondelta_core=debug",
            Profile::Production => "jsondelta_core=info",
            Profile::Test => "off",
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_env(LOG_ENV_VAR)
            .unwrap_or_else(|_| EnvFilter::new(self.default_directives()))
    }
}

static INIT_ONCE: Once = Once::new();

/// Initialize the logging facility
///
/// Only the first call installs a subscriber; later calls are no-ops
/// whatever their profile.
///
/// # Example
///
/// ```
/// use jsondelta_core::logging_facility::{init, Profile};
///
/// init(Profile::Development);
/// ```
pub fn init(profile: Profile) {
    INIT_ONCE.call_once(|| match profile {
        Profile::Development => {
            tracing_subscriber::fmt()
                .with_env_filter(profile.filter())
                .with_target(false)
                .init();
        }
        Profile::Production => {
            tracing_subscriber::fmt()
                .json()
                .with_env_filter(profile.filter())
                .init();
        }
        Profile::Test => {
            // Capture is installed by init_test_capture()
            tracing_subscriber::registry().init();
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_idempotent() {
        init(Profile::Test);
        init(Profile::Test);
    }

    #[test]
    fn test_default_directives() {
        assert_eq!(
            Profile::Production.default_directives(),
            "jsondelta_core=info"
        );
        assert!(Profile::Development.default_directives().ends_with("debug"));
        assert_eq!(Profile::Test.default_directives(), "off");
    }
}
