// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Durable record of payment attempts.

use async_trait::async_trait;

use crate::error::PaychannelError;
use crate::types::{NewPayment, PaymentAttempt, PaymentStatus, StatusChange};

/// Append-and-advance store of payment attempts.
///
/// Implementations must make `update_status` atomic: the current status is
/// read and the new one written under one lock or transaction, so concurrent
/// writers cannot move a terminal row backwards.
#[async_trait]
pub trait PaymentLedger: Send + Sync {
    /// Records a new attempt with status `pending`.
    async fn create_pending(&self, payment: NewPayment) -> Result<PaymentAttempt, PaychannelError>;

    /// Moves an attempt to `status`, optionally replacing the stored gateway response.
    ///
    /// Returns [`StatusChange::Unchanged`] when the row already holds the same
    /// terminal status, and [`PaychannelError::InvalidTransition`] for moves
    /// that would break monotonicity.
    async fn update_status(
        &self,
        reference: &str,
        status: PaymentStatus,
        gateway_response: Option<String>,
    ) -> Result<StatusChange, PaychannelError>;

    /// Fetches an attempt by reference.
    async fn get_payment(&self, reference: &str) -> Result<Option<PaymentAttempt>, PaychannelError>;
}
