//! Structured adapter errors and the introspection helpers that read them back.
//!
//! Action routines may fail with any error type. When an [`AdapterError`] sits
//! anywhere in the source chain, its code, probable cause, and suggested
//! remediation are copied onto the terminal event. Otherwise the fields read
//! [`NONE`].

use std::error::Error as StdError;
use std::fmt;

/// Value reported for introspection fields of unstructured errors.
pub const NONE: &str = "None";

/// Error codes emitted by this adapter.
pub mod codes {
    pub const OP_INVALID: &str = "ErrOpInvalid";
    pub const MISSING_METADATA: &str = "ErrMissingMetadata";
    pub const OVERLOADED: &str = "ErrOverloaded";
    pub const SHUTTING_DOWN: &str = "ErrShuttingDown";
    pub const OPERATION_TIMEOUT: &str = "ErrOperationTimeout";
    pub const COMMAND_FAILED: &str = "ErrCommandFailed";
    pub const COMMAND_SPAWN: &str = "ErrCommandSpawn";
    pub const HANDLER_PANICKED: &str = "ErrHandlerPanicked";
}

/// Error carrying a code, a probable cause, and a suggested remediation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterError {
    pub code: String,
    pub short_description: String,
    pub long_description: String,
    pub probable_cause: String,
    pub suggested_remediation: String,
}

impl AdapterError {
    #[must_use]
    pub fn new(
        code: impl Into<String>,
        short_description: impl Into<String>,
        long_description: impl Into<String>,
        probable_cause: impl Into<String>,
        suggested_remediation: impl Into<String>,
    ) -> Self {
        Self {
            code: code.into(),
            short_description: short_description.into(),
            long_description: long_description.into(),
            probable_cause: probable_cause.into(),
            suggested_remediation: suggested_remediation.into(),
        }
    }

    /// The fixed error reported for operation names the adapter does not serve.
    #[must_use]
    pub fn op_invalid() -> Self {
        Self::new(
            codes::OP_INVALID,
            "Invalid operation",
            "The requested operation is not supported by the NSM adapter",
            "The operation name is unknown or the operation is not supported",
            "Request one of the operations listed by the adapter",
        )
    }

    /// A known operation whose table entry lacks something the handler needs.
    #[must_use]
    pub fn missing_metadata(operation: &str, what: &str) -> Self {
        Self::new(
            codes::MISSING_METADATA,
            "Operation metadata incomplete",
            format!("operation '{operation}' has no {what} in the operations table"),
            "The operations table was overridden without the required entry",
            "Restore the entry in the operations file or use the built-in catalogue",
        )
    }

    #[must_use]
    pub fn overloaded(queue_capacity: usize) -> Self {
        Self::new(
            codes::OVERLOADED,
            "Adapter overloaded",
            format!("operation queue is full ({queue_capacity} pending operations)"),
            "More operations were submitted than the worker pool can queue",
            "Retry once running operations complete, or raise --queue-capacity",
        )
    }

    #[must_use]
    pub fn shutting_down() -> Self {
        Self::new(
            codes::SHUTTING_DOWN,
            "Adapter shutting down",
            "the worker pool no longer accepts operations",
            "The adapter received a shutdown signal",
            "Resubmit the operation once the adapter is running again",
        )
    }

    #[must_use]
    pub fn operation_timeout(operation: &str, timeout_ms: u64) -> Self {
        Self::new(
            codes::OPERATION_TIMEOUT,
            "Operation timed out",
            format!("operation '{operation}' did not finish within {timeout_ms}ms"),
            "The cluster or the tooling backing the operation is unresponsive",
            "Check cluster connectivity, or raise --operation-timeout-ms",
        )
    }

    /// A handler that panicked instead of returning.
    #[must_use]
    pub fn handler_panicked(operation: &str, message: &str) -> Self {
        Self::new(
            codes::HANDLER_PANICKED,
            "Operation handler panicked",
            format!("operation '{operation}' panicked: {message}"),
            "An action routine hit an unexpected internal state",
            "Check the adapter logs for the panic and report it",
        )
    }

    #[must_use]
    pub fn command_failed(program: &str, exit: &str, stderr: &str) -> Self {
        Self::new(
            codes::COMMAND_FAILED,
            format!("{program} failed"),
            format!("{program} exited with {exit}: {}", stderr.trim()),
            format!("{program} could not apply the requested change to the cluster"),
            format!("Inspect the {program} output and the cluster state"),
        )
    }

    #[must_use]
    pub fn command_spawn(program: &str, err: &std::io::Error) -> Self {
        Self::new(
            codes::COMMAND_SPAWN,
            format!("could not run {program}"),
            format!("failed to start {program}: {err}"),
            format!("{program} is not installed or not on PATH"),
            format!("Install {program} and make sure it is on the adapter's PATH"),
        )
    }
}

impl fmt::Display for AdapterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.long_description.is_empty() {
            f.write_str(&self.short_description)
        } else {
            write!(f, "{}: {}", self.short_description, self.long_description)
        }
    }
}

impl StdError for AdapterError {}

/// Finds the first [`AdapterError`] in `err`'s source chain.
#[must_use]
pub fn find_adapter_error<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a AdapterError> {
    std::iter::successors(Some(err), |&e| e.source())
        .find_map(|e| e.downcast_ref::<AdapterError>())
}

/// Error code of `err`, or [`NONE`].
#[must_use]
pub fn error_code(err: &(dyn StdError + 'static)) -> String {
    find_adapter_error(err).map_or_else(|| NONE.to_string(), |e| e.code.clone())
}

/// Probable cause of `err`, or [`NONE`].
#[must_use]
pub fn probable_cause(err: &(dyn StdError + 'static)) -> String {
    find_adapter_error(err).map_or_else(|| NONE.to_string(), |e| e.probable_cause.clone())
}

/// Suggested remediation for `err`, or [`NONE`].
#[must_use]
pub fn suggested_remediation(err: &(dyn StdError + 'static)) -> String {
    find_adapter_error(err).map_or_else(|| NONE.to_string(), |e| e.suggested_remediation.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Wrapper(AdapterError);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("wrapped")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn reads_fields_from_structured_error() {
        let err = AdapterError::op_invalid();
        assert_eq!(error_code(&err), codes::OP_INVALID);
        assert_eq!(probable_cause(&err), err.probable_cause);
        assert_eq!(suggested_remediation(&err), err.suggested_remediation);
    }

    #[test]
    fn walks_the_source_chain() {
        let err = Wrapper(AdapterError::shutting_down());
        assert_eq!(error_code(&err), codes::SHUTTING_DOWN);
    }

    #[test]
    fn unstructured_errors_report_none() {
        let err = std::io::Error::other("boom");
        assert_eq!(error_code(&err), NONE);
        assert_eq!(probable_cause(&err), NONE);
        assert_eq!(suggested_remediation(&err), NONE);
    }

    #[test]
    fn reads_through_anyhow() {
        let err = anyhow::Error::new(AdapterError::overloaded(4));
        assert_eq!(error_code(&*err), codes::OVERLOADED);

        let with_context = anyhow::Error::new(AdapterError::overloaded(4)).context("submitting");
        assert_eq!(error_code(&*with_context), codes::OVERLOADED);
    }

    #[test]
    fn display_joins_descriptions() {
        let err = AdapterError::missing_metadata("nsm_mesh", "version");
        assert_eq!(
            err.to_string(),
            "Operation metadata incomplete: operation 'nsm_mesh' has no version in the operations table"
        );
        let bare = AdapterError::new("c", "short", "", "", "");
        assert_eq!(bare.to_string(), "short");
    }
}
