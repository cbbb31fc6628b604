// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Paychannel integration tests.
//!
//! Provides a scripted [`MockGateway`] and a [`TestHarness`] that wires a
//! temporary SQLite ledger, an in-memory session store and the dialogue
//! engine together.

pub mod harness;
pub mod mock_gateway;

pub use harness::{TestHarness, TestHarnessBuilder};
pub use mock_gateway::MockGateway;
