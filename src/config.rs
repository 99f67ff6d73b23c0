//! Environment-based configuration.
//!
//! snitch has no configuration files. The only tunable read from the
//! environment is the stack trace depth used by
//! [`LogReporter::from_env`](crate::LogReporter::from_env):
//!
//! - `SNITCH_STACK_TRACE_DEPTH` - maximum number of stack frames walked after
//!   each logged error. `0` disables stack traces.
//!
//! The environment is read once per process; later changes are not observed.

use std::{env, num::ParseIntError, sync::OnceLock};

/// Name of the variable holding the [`LogReporter`](crate::LogReporter) stack
/// trace depth.
pub const STACK_TRACE_DEPTH_VAR: &str = "SNITCH_STACK_TRACE_DEPTH";

/// Errors produced while reading configuration from the environment.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The stack trace depth is not a non-negative integer.
    #[error("invalid value {value:?} for {var}: expected a non-negative integer")]
    InvalidStackTraceDepth {
        /// Variable the value was read from.
        var: &'static str,
        /// The rejected value.
        value: String,
        /// Why parsing failed.
        #[source]
        source: ParseIntError,
    },
    /// The variable is set but is not valid unicode.
    #[error("{var} is set but is not valid unicode")]
    NotUnicode {
        /// Variable the value was read from.
        var: &'static str,
    },
}

/// Parses a stack trace depth. Surrounding whitespace is ignored.
///
/// ```
/// use snitch::config::parse_stack_trace_depth;
///
/// assert_eq!(parse_stack_trace_depth(" 16 "), Ok(16));
/// assert!(parse_stack_trace_depth("deep").is_err());
/// ```
pub fn parse_stack_trace_depth(value: &str) -> Result<usize, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|source| ConfigError::InvalidStackTraceDepth {
            var: STACK_TRACE_DEPTH_VAR,
            value: value.to_owned(),
            source,
        })
}

#[derive(Debug)]
pub(crate) struct EnvOptions {
    pub(crate) stack_trace_depth: Result<Option<usize>, ConfigError>,
}

impl EnvOptions {
    pub(crate) fn get() -> &'static Self {
        static SNITCH_ENV: OnceLock<EnvOptions> = OnceLock::new();

        SNITCH_ENV.get_or_init(|| {
            let stack_trace_depth = match env::var(STACK_TRACE_DEPTH_VAR) {
                Ok(value) => parse_stack_trace_depth(&value).map(Some),
                Err(env::VarError::NotPresent) => Ok(None),
                Err(env::VarError::NotUnicode(_)) => Err(ConfigError::NotUnicode {
                    var: STACK_TRACE_DEPTH_VAR,
                }),
            };
            EnvOptions { stack_trace_depth }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_stack_trace_depth() {
        assert_eq!(parse_stack_trace_depth("0"), Ok(0));
        assert_eq!(parse_stack_trace_depth("32\n"), Ok(32));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for value in ["", "-1", "1.5", "ten"] {
            let err = parse_stack_trace_depth(value).unwrap_err();
            assert!(
                matches!(&err, ConfigError::InvalidStackTraceDepth { value: v, .. } if v == value),
                "{err:?}"
            );
            assert!(err.to_string().contains(STACK_TRACE_DEPTH_VAR));
        }
    }
}
