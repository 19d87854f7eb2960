use thiserror::Error;

/// Result alias used across the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A pitch name that could not be parsed (e.g. `"H4"`, `"C#"`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid pitch name {name:?}: {reason}")]
pub struct PitchParseError {
    pub name: String,
    pub reason: &'static str,
}

/// A note length that could not be parsed (e.g. `"3n"`, `"fast"`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid note length {text:?}: {reason}")]
pub struct DurationParseError {
    pub text: String,
    pub reason: &'static str,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Pitch(#[from] PitchParseError),

    #[error(transparent)]
    Duration(#[from] DurationParseError),

    /// Configuration parsed but describes an unusable session.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("failed to parse configuration: {0}")]
    ConfigSyntax(#[from] toml::de::Error),

    #[error("failed to decode packet data: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
