// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # tagbridge-tests
//!
//! Shared fixtures for TagBridge integration tests.

#![warn(missing_docs)]
#![deny(unsafe_code)]

/// Common test utilities.
pub mod common {
    /// Fixtures for driving the engine against the simulator.
    pub mod fixtures {
        use std::time::Duration;

        use tagbridge_core::types::{ServerDescriptor, TagId, Value};
        use tagbridge_engine::Engine;
        use tagbridge_sim::{SimBranch, SimNamespace, SimTagServer};

        /// The simulated server name used throughout the tests.
        pub const DEMO_SERVER: &str = "Sim.1";

        /// Connect deadline used by fixtures.
        pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

        /// An engine plus a handle to the simulator behind it.
        pub struct EngineFixture {
            /// The engine under test.
            pub engine: Engine<SimTagServer>,
            /// Simulator handle for pushing values and inspecting state.
            pub server: SimTagServer,
        }

        /// Builds a connected engine over the demo namespace.
        pub async fn connected_engine() -> EngineFixture {
            connected_engine_with(SimNamespace::demo()).await
        }

        /// Builds a connected engine over a custom namespace.
        pub async fn connected_engine_with(namespace: SimNamespace) -> EngineFixture {
            let server = SimTagServer::new(namespace);
            let engine = Engine::new(server.clone());
            engine
                .connect(&ServerDescriptor::new(DEMO_SERVER), CONNECT_TIMEOUT)
                .await
                .expect("fixture connect failed");
            EngineFixture { engine, server }
        }

        /// A namespace with one branch of `count` numbered tags, for
        /// concurrency tests.
        pub fn bank_namespace(count: usize) -> SimNamespace {
            let mut branch = SimBranch::new("Bank");
            for i in 0..count {
                branch = branch.with_tag(format!("Tag{}", i), Value::Float64(0.0));
            }
            SimNamespace::new().with_branch(branch)
        }

        /// Waits until the engine's live value for `tag_id` matches
        /// `expected`, or panics after two seconds.
        pub async fn wait_for_value(engine: &Engine<SimTagServer>, tag_id: &TagId, expected: &str) {
            tokio::time::timeout(Duration::from_secs(2), async {
                loop {
                    if let Some(live) = engine.read(tag_id) {
                        if live.value == expected {
                            return;
                        }
                    }
                    tokio::time::sleep(Duration::from_millis(5)).await;
                }
            })
            .await
            .unwrap_or_else(|_| panic!("value for {} never became {}", tag_id, expected));
        }
    }
}
