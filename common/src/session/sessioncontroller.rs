// SPDX-License-Identifier: MIT

use pressure_logger_model::{Measurement, NodeEntry};

use crate::Result;

pub type SessionPointer = Box<dyn Session>;

/// An open connection to one OPC UA endpoint.
///
/// Implemented once per backend. Reads keep failing after the connection
/// dropped, there is no reconnect.
pub trait Session {
    /// The endpoint this session was opened against.
    fn endpoint_url(&self) -> &str;

    /// Reads the current scalar value of `node_id`.
    fn read_value(&self, node_id: &str) -> Result<Measurement>;

    /// The root of the address space.
    fn root_node(&self) -> Result<NodeEntry>;

    /// The `Objects` folder below the root.
    fn objects_node(&self) -> Result<NodeEntry>;

    /// Immediate children of `node` along hierarchical references.
    fn children(&self, node: &NodeEntry) -> Result<Vec<NodeEntry>>;

    /// Closes the connection.
    fn disconnect(&mut self);
}

/// Opens sessions. One per backend.
pub trait Connector {
    type Session: Session;

    fn connect(&self, endpoint_url: &str) -> Result<Self::Session>;
}

impl<S: Session + ?Sized> Session for Box<S> {
    fn endpoint_url(&self) -> &str {
        (**self).endpoint_url()
    }

    fn read_value(&self, node_id: &str) -> Result<Measurement> {
        (**self).read_value(node_id)
    }

    fn root_node(&self) -> Result<NodeEntry> {
        (**self).root_node()
    }

    fn objects_node(&self) -> Result<NodeEntry> {
        (**self).objects_node()
    }

    fn children(&self, node: &NodeEntry) -> Result<Vec<NodeEntry>> {
        (**self).children(node)
    }

    fn disconnect(&mut self) {
        (**self).disconnect()
    }
}
