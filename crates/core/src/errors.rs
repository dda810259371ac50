use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Coarse failure category surfaced to the operator together with an exit code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorClass {
    Configuration,
    Input,
    Prerequisite,
    Persistence,
    Output,
    Internal,
}

impl ErrorClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Configuration => "config_validation",
            Self::Input => "input",
            Self::Prerequisite => "prerequisite",
            Self::Persistence => "persistence",
            Self::Output => "output_write",
            Self::Internal => "internal",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Internal => 1,
            Self::Configuration => 2,
            Self::Input => 3,
            Self::Prerequisite => 4,
            Self::Persistence => 5,
            Self::Output => 6,
        }
    }
}

#[derive(Debug, Error)]
pub enum LeadflowError {
    #[error("could not read input from {source_label}: {source}")]
    InputUnreadable { source_label: String, source: io::Error },
    #[error("missing prerequisite artifact `{}`; run `leadflow run` for this output directory first", path.display())]
    MissingArtifact { path: PathBuf },
    #[error("artifact `{}` could not be parsed: {source}", path.display())]
    InvalidArtifact { path: PathBuf, source: serde_json::Error },
    #[error("unsupported CRM export format `{0}` (expected salesforce)")]
    UnsupportedCrmFormat(String),
    #[error("invalid {field} `{value}` (expected {expected})")]
    InvalidValue { field: &'static str, value: String, expected: &'static str },
    #[error("follow-up template failed to render: {0}")]
    Template(#[from] tera::Error),
    #[error("could not serialize {artifact}: {source}")]
    Serialization { artifact: &'static str, source: serde_json::Error },
    #[error("could not write `{}`: {source}", path.display())]
    WriteArtifact { path: PathBuf, source: io::Error },
}

impl LeadflowError {
    pub fn class(&self) -> ErrorClass {
        match self {
            Self::InputUnreadable { .. } => ErrorClass::Input,
            Self::MissingArtifact { .. } | Self::InvalidArtifact { .. } => {
                ErrorClass::Prerequisite
            }
            Self::UnsupportedCrmFormat(_) | Self::InvalidValue { .. } => {
                ErrorClass::Configuration
            }
            Self::Template(_) | Self::Serialization { .. } => ErrorClass::Internal,
            Self::WriteArtifact { .. } => ErrorClass::Output,
        }
    }
}
