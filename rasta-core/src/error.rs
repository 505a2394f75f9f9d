use std::fmt;

/// Contract violations and internal-invariant breaks.
///
/// Every public entry point in this crate validates its parameters and the
/// engine's own invariants before doing any work; a violation here means the
/// caller (or this crate) is wrong, not that the peer sent a bad message.
/// These are terminal: the caller is expected to hand the value to a
/// fatal-error sink and stop driving the connection, not to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fatal {
	NotInitialized,
	AlreadyInitialized,
	InvalidParameter(&'static str),
	InvalidConfiguration(&'static str),
	InternalError(&'static str),
}

impl fmt::Display for Fatal {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Fatal::NotInitialized => write!(f, "core used before init()"),
			Fatal::AlreadyInitialized => write!(f, "init() called more than once"),
			Fatal::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
			Fatal::InvalidConfiguration(msg) => write!(f, "invalid configuration: {msg}"),
			Fatal::InternalError(msg) => write!(f, "internal invariant violated: {msg}"),
		}
	}
}

impl std::error::Error for Fatal {}

pub type Result<T> = std::result::Result<T, Fatal>;
