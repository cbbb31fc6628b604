// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! USSD dialogue engine for Paychannel.
//!
//! Drives the dial -> confirm -> (OTP) -> charge conversation, keeps
//! per-session state in a TTL-bounded [`SessionStore`], and reconciles
//! pending payments through [`PaymentVerifier`].

pub mod dial;
pub mod dialogue;
pub mod prompt;
pub mod session;
pub mod sweeper;
pub mod turns;
pub mod verify;

pub use dialogue::{DialogueEngine, EngineSettings};
pub use session::{DialogueSession, DialogueState, InMemorySessionStore, SessionStore};
pub use sweeper::spawn_session_sweeper;
pub use verify::{PaymentVerifier, VerificationReport};
