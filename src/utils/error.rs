use thiserror::Error;

#[derive(Error, Debug)]
pub enum ItemGenError {
    #[error("Template '{template_id}' is invalid: {reason}")]
    InvalidTemplate { template_id: String, reason: String },

    #[error("Invalid param spec for '{param}': {reason}")]
    InvalidParamSpec { param: String, reason: String },

    #[error("Could not sample param '{param}' after {attempts} attempts (exclusion set too restrictive)")]
    SamplingExhausted { param: String, attempts: usize },

    #[error("Unsafe expression blocked: {expression} ({reason})")]
    UnsafeExpression { expression: String, reason: String },

    #[error("Failed to evaluate '{expression}': {message}")]
    EvaluationError { expression: String, message: String },

    #[error("Template '{template_id}' not satisfiable after {attempts} attempts (seed '{seed}')")]
    Unsatisfiable {
        template_id: String,
        seed: String,
        attempts: usize,
        last_failure: Option<String>,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Bank file '{file}' is invalid: {message}")]
    BankError { file: String, message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Worker task failed: {message}")]
    TaskError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Template,
    Expression,
    Storage,
    Configuration,
    Runtime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ItemGenError {
    /// 穩定的錯誤種類名稱，供 `{templateId, seed, errorKind, message}` 報表使用
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidTemplate { .. } => "InvalidTemplate",
            Self::InvalidParamSpec { .. } => "InvalidParamSpec",
            Self::SamplingExhausted { .. } => "SamplingExhausted",
            Self::UnsafeExpression { .. } => "UnsafeExpression",
            Self::EvaluationError { .. } => "EvaluationError",
            Self::Unsatisfiable { .. } => "Unsatisfiable",
            Self::IoError(_) => "IoError",
            Self::SerializationError(_) => "SerializationError",
            Self::BankError { .. } => "BankError",
            Self::ConfigValidationError { .. } => "ConfigValidationError",
            Self::InvalidConfigValueError { .. } => "InvalidConfigValue",
            Self::MissingConfigError { .. } => "MissingConfig",
            Self::TaskError { .. } => "TaskError",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidTemplate { .. }
            | Self::InvalidParamSpec { .. }
            | Self::SamplingExhausted { .. }
            | Self::Unsatisfiable { .. } => ErrorCategory::Template,
            Self::UnsafeExpression { .. } | Self::EvaluationError { .. } => {
                ErrorCategory::Expression
            }
            Self::IoError(_) | Self::SerializationError(_) | Self::BankError { .. } => {
                ErrorCategory::Storage
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
            Self::TaskError { .. } => ErrorCategory::Runtime,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 重新取樣即可能成功
            Self::SamplingExhausted { .. } | Self::EvaluationError { .. } => ErrorSeverity::Medium,
            Self::InvalidTemplate { .. }
            | Self::InvalidParamSpec { .. }
            | Self::UnsafeExpression { .. }
            | Self::Unsatisfiable { .. }
            | Self::BankError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorSeverity::High,
            Self::IoError(_) | Self::SerializationError(_) | Self::TaskError { .. } => {
                ErrorSeverity::Critical
            }
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            Self::InvalidTemplate { .. } => {
                "Every template needs a `stem` and an `answer`".to_string()
            }
            Self::InvalidParamSpec { param, .. } => format!(
                "Give param '{}' either a non-empty `values` list or numeric `min`/`max` bounds",
                param
            ),
            Self::SamplingExhausted { param, .. } => format!(
                "Widen the range of '{}' or shrink its `exclude` list",
                param
            ),
            Self::UnsafeExpression { .. } => {
                "Remove braces, brackets, semicolons and host references from the expression"
                    .to_string()
            }
            Self::EvaluationError { .. } => {
                "Check identifiers and Math.* function names used by the expression".to_string()
            }
            Self::Unsatisfiable { last_failure, .. } => match last_failure {
                Some(cause) => format!(
                    "Relax the template constraints or parameter ranges (last rejection: {})",
                    cause
                ),
                None => "Relax the template constraints or parameter ranges".to_string(),
            },
            Self::IoError(_) => "Check that the file exists and is readable".to_string(),
            Self::SerializationError(_) | Self::BankError { .. } => {
                "Make sure the bank file is a JSON array of {id, template} entries".to_string()
            }
            Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Review the configuration file and command line flags".to_string()
            }
            Self::TaskError { .. } => "Re-run with a lower --concurrency".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Unsatisfiable {
                template_id,
                attempts,
                ..
            } => format!(
                "Template '{}' could not produce a valid item in {} attempts",
                template_id, attempts
            ),
            Self::IoError(e) => format!("File access failed: {}", e),
            other => other.to_string(),
        }
    }

    /// 是否屬於 generate 內部應吞掉並重試的錯誤
    pub fn is_attempt_local(&self) -> bool {
        matches!(
            self,
            Self::SamplingExhausted { .. } | Self::EvaluationError { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, ItemGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names_are_stable() {
        let err = ItemGenError::Unsatisfiable {
            template_id: "t1".to_string(),
            seed: "s".to_string(),
            attempts: 250,
            last_failure: None,
        };
        assert_eq!(err.kind(), "Unsatisfiable");
        assert_eq!(err.category(), ErrorCategory::Template);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_recovery_suggestion_mentions_last_failure() {
        let err = ItemGenError::Unsatisfiable {
            template_id: "t1".to_string(),
            seed: "s".to_string(),
            attempts: 250,
            last_failure: Some("constraint '1 == 2' was falsy".to_string()),
        };
        assert!(err.recovery_suggestion().contains("1 == 2"));
    }

    #[test]
    fn test_attempt_local_errors() {
        let eval = ItemGenError::EvaluationError {
            expression: "x +".to_string(),
            message: "unexpected end".to_string(),
        };
        let unsafe_expr = ItemGenError::UnsafeExpression {
            expression: "{}".to_string(),
            reason: "brace".to_string(),
        };
        assert!(eval.is_attempt_local());
        assert!(!unsafe_expr.is_attempt_local());
    }
}
