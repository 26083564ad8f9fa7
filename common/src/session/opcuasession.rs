// SPDX-License-Identifier: MIT

use std::str::FromStr;
use std::sync::Arc;

use opcua::client::prelude::*;
use opcua::sync::RwLock;
use pressure_logger_model::{Measurement, NodeEntry};

use crate::session::sessioncontroller::{Connector, Session};
use crate::{Error, Result};

const APPLICATION_NAME: &str = "Pressure Logger";
const APPLICATION_URI: &str = "urn:PressureLogger";

/// Opens anonymous, unsecured sessions against an OPC UA server.
pub struct OpcUaConnector {
    application_name: String,
}

impl Default for OpcUaConnector {
    fn default() -> Self {
        Self {
            application_name: APPLICATION_NAME.into(),
        }
    }
}

impl OpcUaConnector {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Connector for OpcUaConnector {
    type Session = OpcUaSession;

    fn connect(&self, endpoint_url: &str) -> Result<OpcUaSession> {
        let connection_error = |reason: String| Error::Connection {
            url: endpoint_url.to_string(),
            reason,
        };

        let mut client = ClientBuilder::new()
            .application_name(self.application_name.as_str())
            .application_uri(APPLICATION_URI)
            .product_uri(APPLICATION_URI)
            .trust_server_certs(true)
            .create_sample_keypair(true)
            .session_retry_limit(0)
            .client()
            .ok_or_else(|| connection_error("invalid client configuration".into()))?;

        let session = client
            .connect_to_endpoint(
                (
                    endpoint_url,
                    SecurityPolicy::None.to_str(),
                    MessageSecurityMode::None,
                    UserTokenPolicy::anonymous(),
                ),
                IdentityToken::Anonymous,
            )
            .map_err(|status| connection_error(status.to_string()))?;

        Ok(OpcUaSession {
            endpoint_url: endpoint_url.to_string(),
            _client: client,
            session,
        })
    }
}

/// A live session of the `opcua` client.
pub struct OpcUaSession {
    endpoint_url: String,
    // The client owns the session's runtime configuration, keep it alive with the session.
    _client: Client,
    session: Arc<RwLock<opcua::client::prelude::Session>>,
}

impl OpcUaSession {
    fn read_attributes(
        &self,
        node_id: &NodeId,
        attributes: &[AttributeId],
    ) -> Result<Vec<DataValue>, String> {
        let nodes_to_read = attributes
            .iter()
            .map(|attribute| ReadValueId {
                node_id: node_id.clone(),
                attribute_id: *attribute as u32,
                index_range: UAString::null(),
                data_encoding: QualifiedName::null(),
            })
            .collect::<Vec<_>>();

        let session = self.session.read();
        let values = session
            .read(&nodes_to_read, TimestampsToReturn::Neither, 0.0)
            .map_err(|status| status.to_string())?;

        if values.len() != nodes_to_read.len() {
            return Err(format!(
                "expected {} values, server returned {}",
                nodes_to_read.len(),
                values.len()
            ));
        }
        for value in &values {
            if let Some(status) = value.status {
                if !status.is_good() {
                    return Err(status.to_string());
                }
            }
        }
        Ok(values)
    }

    /// Reads browse and display name of a well known node.
    fn describe(&self, node_id: NodeId) -> Result<NodeEntry> {
        let values = self
            .read_attributes(&node_id, &[AttributeId::BrowseName, AttributeId::DisplayName])
            .map_err(Error::Browse)?;

        let browse_name = match &values[0].value {
            Some(Variant::QualifiedName(name)) => qualified_name(name),
            _ => String::new(),
        };
        let display_name = match &values[1].value {
            Some(Variant::LocalizedText(text)) => text.text.as_ref().to_string(),
            _ => String::new(),
        };

        Ok(NodeEntry {
            node_id: node_id.to_string(),
            browse_name,
            display_name,
        })
    }
}

impl Session for OpcUaSession {
    fn endpoint_url(&self) -> &str {
        &self.endpoint_url
    }

    fn read_value(&self, node_id: &str) -> Result<Measurement> {
        let read_error = |reason: String| Error::Read {
            node_id: node_id.to_string(),
            reason,
        };

        let node = NodeId::from_str(node_id)
            .map_err(|status| read_error(format!("invalid node id ({status})")))?;
        let mut values = self
            .read_attributes(&node, &[AttributeId::Value])
            .map_err(read_error)?;

        match values.pop().and_then(|value| value.value) {
            Some(variant) => measurement_from_variant(variant).map_err(read_error),
            None => Err(read_error("no value returned".into())),
        }
    }

    fn root_node(&self) -> Result<NodeEntry> {
        self.describe(ObjectId::RootFolder.into())
    }

    fn objects_node(&self) -> Result<NodeEntry> {
        self.describe(ObjectId::ObjectsFolder.into())
    }

    fn children(&self, node: &NodeEntry) -> Result<Vec<NodeEntry>> {
        let node_id = NodeId::from_str(&node.node_id)
            .map_err(|status| Error::Browse(format!("invalid node id {} ({status})", node.node_id)))?;

        let description = BrowseDescription {
            node_id,
            browse_direction: BrowseDirection::Forward,
            reference_type_id: ReferenceTypeId::HierarchicalReferences.into(),
            include_subtypes: true,
            node_class_mask: 0,
            result_mask: BrowseDescriptionResultMask::all().bits() as u32,
        };

        let session = self.session.read();
        let results = session
            .browse(&[description])
            .map_err(|status| Error::Browse(status.to_string()))?
            .unwrap_or_default();

        collect_children(results, |continuation_point| {
            session.browse_next(false, &[continuation_point.clone()])
        })
    }

    fn disconnect(&mut self) {
        self.session.write().disconnect();
    }
}

fn qualified_name(name: &QualifiedName) -> String {
    format!("{}:{}", name.namespace_index, name.name.as_ref())
}

fn node_entry_from_reference(reference: &ReferenceDescription) -> NodeEntry {
    NodeEntry {
        node_id: reference.node_id.node_id.to_string(),
        browse_name: qualified_name(&reference.browse_name),
        display_name: reference.display_name.text.as_ref().to_string(),
    }
}

/// Gathers the references of a browse response, following continuation points
/// with `browse_next` until the server has no more pages.
fn collect_children<F>(first_page: Vec<BrowseResult>, mut browse_next: F) -> Result<Vec<NodeEntry>>
where
    F: FnMut(&ByteString) -> Result<Option<Vec<BrowseResult>>, StatusCode>,
{
    let mut children = Vec::new();
    let mut pages = first_page;

    loop {
        let mut continuation_point = None;
        for result in pages {
            if !result.status_code.is_good() {
                return Err(Error::Browse(result.status_code.to_string()));
            }
            children.extend(
                result
                    .references
                    .unwrap_or_default()
                    .iter()
                    .map(node_entry_from_reference),
            );
            if !result.continuation_point.is_null() {
                continuation_point = Some(result.continuation_point);
            }
        }

        match continuation_point {
            Some(continuation_point) => {
                pages = browse_next(&continuation_point)
                    .map_err(|status| Error::Browse(status.to_string()))?
                    .unwrap_or_default();
            }
            None => return Ok(children),
        }
    }
}

/// Maps scalar numeric and boolean variants, everything else is a type mismatch.
fn measurement_from_variant(variant: Variant) -> Result<Measurement, String> {
    let measurement = match variant {
        Variant::Double(value) => Measurement::Float(value),
        // Widen through the shortest decimal form so 1.23e-3f32 stays 1.23e-3.
        Variant::Float(value) => Measurement::Float(
            value
                .to_string()
                .parse::<f64>()
                .unwrap_or_else(|_| f64::from(value)),
        ),
        Variant::SByte(value) => Measurement::Integer(value.into()),
        Variant::Int16(value) => Measurement::Integer(value.into()),
        Variant::Int32(value) => Measurement::Integer(value.into()),
        Variant::Int64(value) => Measurement::Integer(value),
        Variant::Byte(value) => Measurement::Unsigned(value.into()),
        Variant::UInt16(value) => Measurement::Unsigned(value.into()),
        Variant::UInt32(value) => Measurement::Unsigned(value.into()),
        Variant::UInt64(value) => Measurement::Unsigned(value),
        Variant::Boolean(value) => Measurement::Boolean(value),
        other => return Err(format!("BadTypeMismatch: {other:?} is not a scalar number")),
    };
    Ok(measurement)
}
