// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use pressure_logger_model::{Measurement, NodeEntry};
use serde::Deserialize;

use crate::session::sessioncontroller::{Connector, Session};
use crate::{Error, Result};

/// An address space held in memory.
#[derive(Deserialize, Clone, Default)]
struct AddressSpace {
    root: NodeEntry,
    objects: NodeEntry,
    #[serde(default)]
    children: HashMap<String, Vec<NodeEntry>>,
    #[serde(default)]
    values: HashMap<String, Measurement>,
}

/// Hands out sessions on a canned address space, for simulated runs and tests.
#[derive(Clone)]
pub struct DummyConnector {
    address_space: Option<AddressSpace>,
}

impl DummyConnector {
    /// A connector serving the bundled HiCube address space.
    pub fn new() -> Result<Self, serde_json::Error> {
        let json_data = std::include_str!("./dummyaddressspace.json");

        Self::from_json(json_data)
    }

    /// A connector serving the address space described by `json_data`.
    pub fn from_json(json_data: &str) -> Result<Self, serde_json::Error> {
        let address_space = serde_json::from_str::<AddressSpace>(json_data)?;

        Ok(Self {
            address_space: Some(address_space),
        })
    }

    /// A connector whose server never answers.
    pub fn unreachable() -> Self {
        Self {
            address_space: None,
        }
    }

    /// Overrides the value served for `node_id`.
    pub fn with_value(mut self, node_id: &str, value: Measurement) -> Self {
        if let Some(address_space) = self.address_space.as_mut() {
            address_space.values.insert(node_id.to_string(), value);
        }
        self
    }
}

impl Connector for DummyConnector {
    type Session = DummySession;

    fn connect(&self, endpoint_url: &str) -> Result<DummySession> {
        let connection_error = |reason: &str| Error::Connection {
            url: endpoint_url.to_string(),
            reason: reason.to_string(),
        };

        if !endpoint_url.starts_with("opc.tcp://") {
            return Err(connection_error("BadTcpEndpointUrlInvalid"));
        }

        let address_space = self
            .address_space
            .clone()
            .ok_or_else(|| connection_error("BadCommunicationError"))?;

        Ok(DummySession {
            endpoint_url: endpoint_url.to_string(),
            address_space,
            connected: true,
            disconnects: Arc::default(),
        })
    }
}

pub struct DummySession {
    endpoint_url: String,
    address_space: AddressSpace,
    connected: bool,
    disconnects: Arc<AtomicUsize>,
}

impl DummySession {
    /// Counts calls to [`Session::disconnect`], shared so it outlives the session.
    pub fn disconnect_counter(&self) -> Arc<AtomicUsize> {
        self.disconnects.clone()
    }

    fn ensure_connected(&self) -> Result<(), String> {
        if self.connected {
            Ok(())
        } else {
            Err("BadSessionClosed".to_string())
        }
    }
}

impl Session for DummySession {
    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    fn read_value(&self, node_id: &str) -> Result<Measurement> {
        let read_error = |reason: String| Error::Read {
            node_id: node_id.to_string(),
            reason,
        };

        self.ensure_connected().map_err(read_error)?;
        self.address_space
            .values
            .get(node_id)
            .copied()
            .ok_or_else(|| read_error("BadNodeIdUnknown".to_string()))
    }

    fn root_node(&self) -> Result<NodeEntry> {
        self.ensure_connected().map_err(Error::Browse)?;
        Ok(self.address_space.root.clone())
    }

    fn objects_node(&self) -> Result<NodeEntry> {
        self.ensure_connected().map_err(Error::Browse)?;
        Ok(self.address_space.objects.clone())
    }

    fn children(&self, node: &NodeEntry) -> Result<Vec<NodeEntry>> {
        self.ensure_connected().map_err(Error::Browse)?;
        Ok(self
            .address_space
            .children
            .get(&node.node_id)
            .cloned()
            .unwrap_or_default())
    }

    fn disconnect(&mut self) {
        self.connected = false;
        self.disconnects.fetch_add(1, Ordering::SeqCst);
    }
}

#[test]
fn test_dummy_session() {
    let mut session = DummyConnector::new()
        .unwrap()
        .connect("opc.tcp://localhost:4840")
        .unwrap();

    assert_eq!(session.root_node().unwrap().display_name, "Root");
    let objects = session.objects_node().unwrap();
    assert_eq!(objects.node_id, "i=85");
    assert_eq!(session.children(&objects).unwrap().len(), 2);
    assert_eq!(
        session.read_value("ns=1;s=G1_pressure").unwrap(),
        Measurement::Float(5.2e-7)
    );

    session.disconnect();
    assert!(matches!(
        session.read_value("ns=1;s=G1_pressure"),
        Err(Error::Read { .. })
    ));
    assert!(matches!(session.objects_node(), Err(Error::Browse(_))));
}

#[test]
fn test_dummy_unknown_node() {
    let session = DummyConnector::new()
        .unwrap()
        .connect("opc.tcp://localhost:4840")
        .unwrap();

    match session.read_value("ns=1;s=G2_pressure") {
        Err(Error::Read { node_id, reason }) => {
            assert_eq!(node_id, "ns=1;s=G2_pressure");
            assert_eq!(reason, "BadNodeIdUnknown");
        }
        other => panic!("unexpected result: {other:?}"),
    }
}

#[test]
fn test_dummy_rejects_bad_url() {
    let connector = DummyConnector::new().unwrap();
    assert!(matches!(
        connector.connect("http://localhost:4840"),
        Err(Error::Connection { .. })
    ));
}
