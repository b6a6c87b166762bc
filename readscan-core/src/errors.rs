use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReadScanError {
    #[error("Malformed input: {0}")]
    InputFormat(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Alignment source error: {0}")]
    Alignment(String),

    #[error("Task `{task}` failed: {reason}")]
    TaskFailed { task: String, reason: String },

    #[error("Failed to write output view(s): {}", .0.join(", "))]
    Output(Vec<String>),

    #[error("Can't parse config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ReadScanError>;
