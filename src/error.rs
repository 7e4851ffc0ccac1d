use std::io;
use std::path::PathBuf;
use std::result;
use thiserror::Error;

pub type Result<T> = result::Result<T, ListenerError>;

#[derive(Debug, Error)]
pub enum ListenerError {
    #[error("tshark not found at {}. Install Wireshark/tshark and/or pass --tshark", .0.display())]
    DecoderNotFound(PathBuf),

    #[error("Unable to run tshark at {}: {reason}", path.display())]
    DecoderUnusable { path: PathBuf, reason: String },

    #[error("Failed to list interfaces: {0}")]
    InterfaceListing(String),

    #[error("tshark reported no capture interfaces")]
    NoInterfaces,

    #[error("Failed to start tshark: {0}")]
    Spawn(#[source] io::Error),

    #[error("tshark stdout was not captured")]
    MissingStdout,

    /// File system failures, carrying the path that was being touched.
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unable to install signal handler: {0}")]
    Signal(#[from] ctrlc::Error),

    #[error("Interactive prompt failed: {0}")]
    Prompt(#[source] io::Error),

    #[error("Invalid interface selection: {0}")]
    InvalidSelection(String),
}

impl ListenerError {
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
