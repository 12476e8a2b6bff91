use thiserror::Error;

#[derive(Error, Debug)]
pub enum SshError {
    #[error("no address configured for host {host}")]
    NoAddress { host: String },

    #[error("failed to run ssh")]
    Spawn {
        #[source]
        source: std::io::Error,
    },

    #[error("could not connect to {address}: {stderr}")]
    Connect { address: String, stderr: String },

    #[error("io error during {operation}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

impl SshError {
    pub fn io(operation: impl Into<String>, source: std::io::Error) -> Self {
        SshError::Io {
            operation: operation.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, SshError>;
