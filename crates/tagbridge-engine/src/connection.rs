// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Connection lifecycle management.
//!
//! The [`ConnectionManager`] owns the single client session of an engine
//! instance and enforces the connection state machine:
//!
//! ```text
//! Disconnected -> Connecting -> Connected
//! Connected    -> Disconnected
//! Connecting | Connected -> Faulted
//! Faulted      -> Connecting     (retry, fresh session)
//! ```
//!
//! Every successful connect and every disconnect bumps a generation
//! counter. Callers snapshot the generation before dispatching a browse
//! and compare it when the result arrives; a mismatch means the result
//! belongs to a previous session and must be discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;

use tagbridge_core::client::TagServerClient;
use tagbridge_core::error::{EngineError, EngineResult};
use tagbridge_core::types::{ConnectionState, ServerDescriptor};

// =============================================================================
// ConnectionManager
// =============================================================================

/// Owns the engine's single server session.
pub struct ConnectionManager<C> {
    /// The external client, serialized behind a mutex.
    client: Arc<Mutex<C>>,

    /// Last completed state transition. Never held across an await.
    state: RwLock<ConnectionState>,

    /// Session generation, bumped on connect and disconnect.
    generation: AtomicU64,
}

impl<C: TagServerClient> ConnectionManager<C> {
    /// Creates a manager around a disconnected client.
    pub fn new(client: C) -> Self {
        Self {
            client: Arc::new(Mutex::new(client)),
            state: RwLock::new(ConnectionState::Disconnected),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns a handle to the underlying client.
    pub fn client(&self) -> Arc<Mutex<C>> {
        Arc::clone(&self.client)
    }

    /// Returns the current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read().expect("connection state poisoned")
    }

    /// Returns `true` if the last completed transition was to `Connected`.
    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Returns the current session generation.
    ///
    /// Compare generations around an asynchronous browse to detect a
    /// result that arrived after the connection changed underneath it.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Connects to the named server with an explicit deadline.
    ///
    /// On success transitions `Disconnected/Faulted -> Connecting ->
    /// Connected` and returns the new session generation. A transport
    /// failure faults the connection; a retry goes through `Connecting`
    /// again with a fresh session. The deadline is mandatory so a hung
    /// client cannot hang the engine.
    ///
    /// # Errors
    ///
    /// - [`EngineError::ConnectionFailed`] - transport or negotiation
    ///   failure, or a connect attempted while already connected
    /// - [`EngineError::Timeout`] - the deadline elapsed
    pub async fn connect(
        &self,
        server: &ServerDescriptor,
        timeout: Duration,
    ) -> EngineResult<u64> {
        self.transition_to_connecting(server)?;

        let connect = async {
            let mut client = self.client.lock().await;
            client.connect(server).await
        };

        match tokio::time::timeout(timeout, connect).await {
            Ok(Ok(())) => {
                self.set_state(ConnectionState::Connected);
                let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
                tracing::info!(server = %server, generation, "connected");
                Ok(generation)
            }
            Ok(Err(e)) => {
                self.set_state(ConnectionState::Faulted);
                tracing::warn!(server = %server, error = %e, "connect failed");
                Err(EngineError::connection_failed_with(&server.name, e))
            }
            Err(_) => {
                // The in-flight connect future is dropped here; the next
                // attempt starts a fresh session.
                self.set_state(ConnectionState::Faulted);
                tracing::warn!(server = %server, ?timeout, "connect timed out");
                Err(EngineError::timeout(timeout))
            }
        }
    }

    /// Releases the session. Idempotent: a no-op when not connected.
    ///
    /// The state transitions to `Disconnected` even if the client reports
    /// an error while releasing; the error is logged, not raised.
    pub async fn disconnect(&self) -> EngineResult<()> {
        if !self.is_connected() {
            return Ok(());
        }

        let result = {
            let mut client = self.client.lock().await;
            client.disconnect().await
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "client reported an error while disconnecting");
        }

        self.set_state(ConnectionState::Disconnected);
        self.generation.fetch_add(1, Ordering::SeqCst);
        tracing::info!("disconnected");
        Ok(())
    }

    /// Marks the connection as faulted after an observed transport error.
    pub fn mark_faulted(&self) {
        let mut state = self.state.write().expect("connection state poisoned");
        if state.can_transition_to(ConnectionState::Faulted) {
            *state = ConnectionState::Faulted;
        }
    }

    fn transition_to_connecting(&self, server: &ServerDescriptor) -> EngineResult<()> {
        let mut state = self.state.write().expect("connection state poisoned");
        if !state.can_transition_to(ConnectionState::Connecting) {
            return Err(EngineError::connection_failed(
                &server.name,
                format!("connect not permitted from state {}", state),
            ));
        }
        *state = ConnectionState::Connecting;
        Ok(())
    }

    fn set_state(&self, next: ConnectionState) {
        *self.state.write().expect("connection state poisoned") = next;
    }
}

impl<C> std::fmt::Debug for ConnectionManager<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("state", &*self.state.read().expect("connection state poisoned"))
            .field("generation", &self.generation.load(Ordering::SeqCst))
            .finish()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use tagbridge_sim::{SimNamespace, SimTagServer};

    const TIMEOUT: Duration = Duration::from_secs(1);

    fn manager() -> ConnectionManager<SimTagServer> {
        ConnectionManager::new(SimTagServer::new(SimNamespace::demo()))
    }

    #[tokio::test]
    async fn test_connect_transitions_to_connected() {
        let manager = manager();
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager
            .connect(&ServerDescriptor::new("Sim.1"), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
        assert!(manager.is_connected());
        assert_eq!(manager.generation(), 1);
    }

    #[tokio::test]
    async fn test_connect_failure_faults() {
        let manager = manager();
        let err = manager
            .connect(&ServerDescriptor::new("Unknown.1"), TIMEOUT)
            .await
            .unwrap_err();
        assert_eq!(err.error_type(), "connection_failed");
        assert_eq!(manager.state(), ConnectionState::Faulted);
    }

    #[tokio::test]
    async fn test_retry_after_fault() {
        let server = SimTagServer::new(SimNamespace::demo());
        server.fail_connect(true);
        let manager = ConnectionManager::new(server.clone());

        let descriptor = ServerDescriptor::new("Sim.1");
        assert!(manager.connect(&descriptor, TIMEOUT).await.is_err());
        assert_eq!(manager.state(), ConnectionState::Faulted);

        // Faulted -> Connecting -> Connected with a fresh session.
        server.fail_connect(false);
        manager.connect(&descriptor, TIMEOUT).await.unwrap();
        assert_eq!(manager.state(), ConnectionState::Connected);
    }

    #[tokio::test]
    async fn test_connect_while_connected_rejected() {
        let manager = manager();
        let descriptor = ServerDescriptor::new("Sim.1");
        manager.connect(&descriptor, TIMEOUT).await.unwrap();

        let err = manager.connect(&descriptor, TIMEOUT).await.unwrap_err();
        assert_eq!(err.error_type(), "connection_failed");
        // The established session is untouched.
        assert!(manager.is_connected());
    }

    #[tokio::test]
    async fn test_disconnect_idempotent() {
        let manager = manager();
        manager
            .connect(&ServerDescriptor::new("Sim.1"), TIMEOUT)
            .await
            .unwrap();

        manager.disconnect().await.unwrap();
        assert!(!manager.is_connected());

        // Second disconnect is a no-op, not an error.
        manager.disconnect().await.unwrap();
        assert!(!manager.is_connected());
    }

    #[tokio::test]
    async fn test_generation_changes_on_reconnect() {
        let manager = manager();
        let descriptor = ServerDescriptor::new("Sim.1");

        let first = manager.connect(&descriptor, TIMEOUT).await.unwrap();
        manager.disconnect().await.unwrap();
        let second = manager.connect(&descriptor, TIMEOUT).await.unwrap();

        // A browse dispatched under `first` is stale under `second`.
        assert_ne!(first, second);
    }
}
