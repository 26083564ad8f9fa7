// SPDX-License-Identifier: MIT

mod dummysession;
mod sessioncontroller;

pub use sessioncontroller::Connector;
pub use sessioncontroller::Session;
pub use sessioncontroller::SessionPointer;

pub use dummysession::{DummyConnector, DummySession};

#[cfg(feature = "opcua")]
mod opcuasession;

#[cfg(feature = "opcua")]
pub use opcuasession::{OpcUaConnector, OpcUaSession};

use pressure_logger_model::Measurement;

use crate::Result;

/// Opens a session to `endpoint_url` through `connector`.
pub fn connect<C: Connector>(connector: &C, endpoint_url: &str) -> Result<C::Session> {
    let session = connector.connect(endpoint_url)?;
    log::info!("Connected to OPC UA server at {endpoint_url}");
    Ok(session)
}

/// Fetches the current value of `node_id`. A failure means "skip this cycle".
pub fn read_measurement<S: Session + ?Sized>(session: &S, node_id: &str) -> Result<Measurement> {
    let value = session.read_value(node_id)?;
    log::debug!("Read {node_id} = {value}");
    Ok(value)
}

/// Owns a session and releases it exactly once, on [`SessionGuard::close`] or on drop.
pub struct SessionGuard<S: Session> {
    session: S,
    closed: bool,
}

impl<S: Session> SessionGuard<S> {
    pub fn new(session: S) -> Self {
        Self {
            session,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Disconnects the session. Later calls do nothing.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.session.disconnect();
        log::info!(
            "Disconnected from OPC UA server at {}",
            self.session.endpoint_url()
        );
    }
}

impl<S: Session> std::ops::Deref for SessionGuard<S> {
    type Target = S;

    fn deref(&self) -> &S {
        &self.session
    }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_connect_and_read() {
        let session = connect(&DummyConnector::new().unwrap(), "opc.tcp://localhost:4840").unwrap();
        assert_eq!(session.endpoint_url(), "opc.tcp://localhost:4840");

        let value = read_measurement(&session, "ns=1;s=G1_pressure").unwrap();
        assert!(matches!(value, Measurement::Float(_)));
    }

    #[test]
    fn test_connect_failure() {
        let result = connect(&DummyConnector::unreachable(), "opc.tcp://10.0.5.76:4840");
        assert!(matches!(result, Err(Error::Connection { .. })));
    }

    #[test]
    fn test_guard_disconnects_once() {
        let session = DummyConnector::new()
            .unwrap()
            .connect("opc.tcp://localhost:4840")
            .unwrap();
        let disconnects = session.disconnect_counter();

        let mut guard = SessionGuard::new(session);
        guard.close();
        guard.close();
        assert!(guard.is_closed());
        drop(guard);

        assert_eq!(disconnects.load(std::sync::atomic::Ordering::SeqCst), 1);
    }

    #[test]
    fn test_guard_disconnects_on_drop() {
        let session = DummyConnector::new()
            .unwrap()
            .connect("opc.tcp://localhost:4840")
            .unwrap();
        let disconnects = session.disconnect_counter();

        drop(SessionGuard::new(session));

        assert_eq!(disconnects.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
