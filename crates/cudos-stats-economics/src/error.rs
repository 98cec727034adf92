//! Error types for the economics primitives

use thiserror::Error;

/// Result type alias for economics operations
pub type Result<T> = std::result::Result<T, EconomicsError>;

/// Errors raised while parsing or evaluating the economic model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomicsError {
    /// Decimal string could not be parsed
    #[error("Invalid decimal '{0}'")]
    InvalidDecimal(String),

    /// Integer string could not be parsed
    #[error("Invalid integer '{0}'")]
    InvalidInteger(String),

    /// Decimal has more fractional digits than supported
    #[error("Decimal '{value}' exceeds {max} fractional digits")]
    TooPrecise { value: String, max: usize },

    /// Division by a zero value
    #[error("Division by zero: {0}")]
    DivisionByZero(&'static str),

    /// Genesis parameters are out of range
    #[error("Invalid genesis parameter {name}: {reason}")]
    InvalidGenesis { name: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = EconomicsError::TooPrecise {
            value: "0.1234567890123456789".to_string(),
            max: 18,
        };
        assert!(err.to_string().contains("18 fractional digits"));

        let err = EconomicsError::DivisionByZero("bonded tokens");
        assert_eq!(err.to_string(), "Division by zero: bonded tokens");
    }
}
