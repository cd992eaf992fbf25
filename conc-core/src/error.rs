//! Error types for the concentration solver.

use thiserror::Error;

use crate::problem::MAX_LOG_X;

/// Process exit code reserved for unrecoverable mole-fraction overflow.
///
/// The sibling executables in the suite parse this code to distinguish a
/// numerical blow-up from ordinary failure; the library itself never exits
/// the process, it returns [`ConcError::Overflow`] and leaves the mapping
/// to the binary.
pub const OVERFLOW_EXIT_CODE: i32 = 121;

/// Errors that can occur during a solve.
#[derive(Error, Debug)]
pub enum ConcError {
    /// Problem or settings validation failed
    #[error("Invalid problem: {0}")]
    InvalidProblem(String),

    /// The exponential map overflowed outside the perturbation envelope
    #[error("mole-fraction overflow: log x = {log_x:.3} exceeds cap {limit}")]
    Overflow {
        /// Offending exponent argument
        log_x: f64,
        /// The enforced cap ([`MAX_LOG_X`])
        limit: f64,
    },
}

impl ConcError {
    pub(crate) fn overflow(log_x: f64) -> Self {
        ConcError::Overflow {
            log_x,
            limit: MAX_LOG_X,
        }
    }
}

/// Result type for solver operations.
pub type ConcResult<T> = Result<T, ConcError>;
