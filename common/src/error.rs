use std::path::PathBuf;

use thiserror::Error;

/// Failure kinds of the logger. The poller picks a policy per kind.
#[derive(Debug, Error)]
pub enum Error {
    /// The session could not be opened. Fatal.
    #[error("error connecting to OPC UA server at {url}: {reason}")]
    Connection { url: String, reason: String },

    /// Walking the address space failed part way. Diagnostic only.
    #[error("error browsing nodes: {0}")]
    Browse(String),

    /// The node value could not be fetched. The tick is skipped.
    #[error("error reading node {node_id}: {reason}")]
    Read { node_id: String, reason: String },

    /// The log line could not be appended. The reading is dropped.
    #[error("error writing to log file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        let err = Error::Read {
            node_id: "ns=1;s=G1_pressure".into(),
            reason: "BadNodeIdUnknown".into(),
        };
        assert_eq!(
            err.to_string(),
            "error reading node ns=1;s=G1_pressure: BadNodeIdUnknown"
        );

        let err = Error::Connection {
            url: "opc.tcp://localhost:4840".into(),
            reason: "BadTimeout".into(),
        };
        assert_eq!(
            err.to_string(),
            "error connecting to OPC UA server at opc.tcp://localhost:4840: BadTimeout"
        );
    }
}
