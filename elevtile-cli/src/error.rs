//! CLI error types.

use std::fmt;

/// Errors that terminate a CLI command.
#[derive(Debug)]
pub enum CliError {
    /// Failed to construct the HTTP client or tile source.
    Source(String),

    /// Invalid command-line input.
    Input(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Source(msg) => write!(f, "{}", msg),
            CliError::Input(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for CliError {}

impl From<elevtile::SourceError> for CliError {
    fn from(err: elevtile::SourceError) -> Self {
        CliError::Source(err.to_string())
    }
}

impl From<elevtile::HttpError> for CliError {
    fn from(err: elevtile::HttpError) -> Self {
        CliError::Source(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_passes_message_through() {
        let err = CliError::Input("bbox must have four components".to_string());
        assert_eq!(err.to_string(), "bbox must have four components");
    }

    #[test]
    fn test_from_source_error() {
        let err: CliError = elevtile::SourceError::MissingApiKey {
            provider: "MapTiler",
        }
        .into();
        assert!(err.to_string().contains("MapTiler"));
    }
}
