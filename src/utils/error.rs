use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Fetch failed for {url}: {reason}")]
    FetchError { url: String, reason: String },

    #[error("Listing parse error: {message}")]
    ParseError { message: String },

    #[error("Dataset is missing required columns: {}", .missing.join(", "))]
    SchemaError { missing: Vec<String> },

    #[error("Not a number: {value:?}")]
    FormatError { value: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Spreadsheet export failed: {0}")]
    ExportError(#[from] rust_xlsxwriter::XlsxError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: {value:?} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Output,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn fetch(url: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        EtlError::FetchError {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::FetchError { .. } => ErrorCategory::Network,
            EtlError::ParseError { .. }
            | EtlError::SchemaError { .. }
            | EtlError::FormatError { .. }
            | EtlError::CsvError(_) => ErrorCategory::Data,
            EtlError::ExportError(_) | EtlError::IoError(_) => ErrorCategory::Output,
            EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 單一儲存格失敗只會變成缺值
            EtlError::FormatError { .. } => ErrorSeverity::Low,
            EtlError::FetchError { .. } => ErrorSeverity::Medium,
            EtlError::ParseError { .. }
            | EtlError::SchemaError { .. }
            | EtlError::CsvError(_)
            | EtlError::ConfigError { .. }
            | EtlError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            EtlError::ExportError(_) | EtlError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// Short message meant for the person running the tool, not for the log.
    pub fn user_friendly_message(&self) -> String {
        match self {
            EtlError::FetchError { url, .. } => {
                format!("Could not download data from the ANP portal ({})", url)
            }
            EtlError::ParseError { .. } => {
                "No production years could be found on the ANP listing page".to_string()
            }
            EtlError::SchemaError { missing } => format!(
                "The downloaded file does not have the expected columns: {}",
                missing.join(", ")
            ),
            EtlError::FormatError { value } => format!("Value {:?} is not a number", value),
            EtlError::CsvError(_) => "The downloaded file is not a readable CSV".to_string(),
            EtlError::ExportError(_) => "The spreadsheet could not be generated".to_string(),
            EtlError::IoError(e) => format!("File system error: {}", e),
            EtlError::ConfigError { message } => format!("Invalid configuration: {}", message),
            EtlError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid configuration value for '{}': {}", field, reason)
            }
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check your connection and that the portal is reachable, then try again"
            }
            ErrorCategory::Data => match self {
                EtlError::ParseError { .. } => {
                    "The portal layout may have changed; check source.listing_url and source.link_keywords"
                }
                _ => "Check dataset.delimiter and dataset.fallback_encoding for this file",
            },
            ErrorCategory::Output => "Check that load.output_path exists and is writable",
            ErrorCategory::Configuration => "Fix the configuration file and run again",
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_lists_missing_columns() {
        let err = EtlError::SchemaError {
            missing: vec!["Campo".to_string(), "Poço".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Dataset is missing required columns: Campo, Poço"
        );
        assert_eq!(err.category(), ErrorCategory::Data);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_fetch_error_is_retryable_severity() {
        let err = EtlError::fetch("http://example.com/a.csv", "HTTP 503");
        assert_eq!(err.category(), ErrorCategory::Network);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert!(err.user_friendly_message().contains("http://example.com/a.csv"));
    }

    #[test]
    fn test_config_errors_share_one_category() {
        let errors = [
            EtlError::ConfigError {
                message: "TOML parsing error".to_string(),
            },
            EtlError::InvalidConfigValueError {
                field: "load.column_width".to_string(),
                value: "0".to_string(),
                reason: "Width must be greater than 0 and at most 255".to_string(),
            },
        ];
        for err in errors {
            assert_eq!(err.category(), ErrorCategory::Configuration);
            assert_eq!(err.severity(), ErrorSeverity::High);
        }
    }
}
