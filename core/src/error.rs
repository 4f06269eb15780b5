use thiserror::Error;

/// Errors raised by the defscope library.
#[derive(Error, Debug)]
pub enum DefscopeError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] XmlError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DefscopeError>;

/// A document that could not be read as markup.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message} at byte {position}")]
pub struct XmlError {
    pub message: String,
    pub position: u64,
}

impl XmlError {
    pub fn new(message: impl Into<String>, position: u64) -> Self {
        Self {
            message: message.into(),
            position,
        }
    }
}

/// Failure while rendering one field summary. Never escapes a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SummaryError {
    #[error("unreadable text in <{0}>")]
    UnreadableText(String),
}
