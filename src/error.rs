//! Error types raised by the classifier layer.
//!
//! Row-level oddities (short rows, long rows, undecodable fields) are not
//! errors: the driver counts them and carries on. The only fatal condition
//! local to classification is an integer column whose range exceeds the
//! widest supported integer type.

use thiserror::Error;

/// Observed integer range that no supported integer width can hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("observed range [{min}, {max}] exceeds the 64-bit signed integer range")]
pub struct IntegerOverflow {
    pub min: i128,
    pub max: i128,
}

#[derive(Debug, Error)]
pub enum InferError {
    #[error("Column '{column}' cannot be declared as an integer")]
    IntegerOverflow {
        column: String,
        #[source]
        source: IntegerOverflow,
    },
    #[error("Invalid {kind} pattern '{pattern}'")]
    InvalidPattern {
        kind: &'static str,
        pattern: String,
        #[source]
        source: regex::Error,
    },
}
