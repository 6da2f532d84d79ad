//! Error types for QORM.

use thiserror::Error;

/// Errors surfaced by schema construction, query compilation, field binding
/// and row materialization.
#[derive(Debug, Error)]
pub enum OrmError {
    /// The declarative schema description was rejected at construction time.
    #[error("construction error for `{entity}`: {message}")]
    Construction {
        entity: &'static str,
        message: String,
    },

    /// Malformed `db:"…"` tag on a field.
    #[error("invalid tag on field `{field}`: {message}")]
    Tag { field: &'static str, message: String },

    /// A node visit failed during SQL emission. Nothing partial is cached.
    #[error("compile error: {0}")]
    Compile(String),

    /// A supplied field token does not resolve against the target record.
    #[error("binding error: {0}")]
    Binding(String),

    /// A scanned value could not be converted into its destination field.
    #[error("conversion error for column `{column}`: {source}")]
    Conversion {
        column: String,
        #[source]
        source: ConvertError,
    },

    /// The row source failed while reporting columns or scanning.
    #[error("row source error: {0}")]
    Row(String),
}

impl OrmError {
    /// Create a construction error for the given entity.
    pub fn construction(entity: &'static str, message: impl Into<String>) -> Self {
        Self::Construction {
            entity,
            message: message.into(),
        }
    }

    /// Create a tag error for the given field.
    pub fn tag(field: &'static str, message: impl Into<String>) -> Self {
        Self::Tag {
            field,
            message: message.into(),
        }
    }

    /// Create a compile error.
    pub fn compile(message: impl Into<String>) -> Self {
        Self::Compile(message.into())
    }

    /// Create a binding error.
    pub fn binding(message: impl Into<String>) -> Self {
        Self::Binding(message.into())
    }

    /// Create a row source error.
    pub fn row(message: impl Into<String>) -> Self {
        Self::Row(message.into())
    }
}

/// A rejected value conversion. Carries enough detail to see exactly which
/// coercion failed; converters return these, they never abort.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConvertError {
    #[error("cannot convert {from} to {to}")]
    Unsupported {
        from: &'static str,
        to: &'static str,
    },

    #[error("value {value} overflows {to}")]
    Overflow { value: String, to: &'static str },

    #[error("negative value {value} cannot convert to {to}")]
    SignLoss { value: String, to: &'static str },

    #[error("value {value} loses precision converting to {to}")]
    PrecisionLoss { value: String, to: &'static str },

    #[error("cannot parse {text:?} as {to}: {message}")]
    Parse {
        text: String,
        to: &'static str,
        message: String,
    },

    #[error("null value in non-nullable destination {to}")]
    UnexpectedNull { to: &'static str },

    #[error("json error: {0}")]
    Json(String),
}

/// Result type alias for QORM operations.
pub type OrmResult<T> = Result<T, OrmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = OrmError::binding("pointer does not belong to record");
        assert_eq!(
            err.to_string(),
            "binding error: pointer does not belong to record"
        );
    }

    #[test]
    fn test_conversion_error_display() {
        let err = OrmError::Conversion {
            column: "age".to_string(),
            source: ConvertError::SignLoss {
                value: "-5".to_string(),
                to: "u64",
            },
        };
        assert_eq!(
            err.to_string(),
            "conversion error for column `age`: negative value -5 cannot convert to u64"
        );
    }
}
