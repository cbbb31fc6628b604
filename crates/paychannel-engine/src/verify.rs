// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reconciliation of pending payment attempts against the money gateway.

use std::sync::Arc;

use paychannel_core::error::PaychannelError;
use paychannel_core::traits::{MoneyGateway, PaymentLedger};
use paychannel_core::types::{PaymentAttempt, PaymentStatus};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of one verification.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationReport {
    pub payment: PaymentAttempt,
    /// Whether this call moved the ledger row.
    pub changed: bool,
}

/// Asks the gateway for the final state of pending attempts and records it.
pub struct PaymentVerifier {
    ledger: Arc<dyn PaymentLedger>,
    gateway: Arc<dyn MoneyGateway>,
}

impl PaymentVerifier {
    pub fn new(ledger: Arc<dyn PaymentLedger>, gateway: Arc<dyn MoneyGateway>) -> Self {
        Self { ledger, gateway }
    }

    /// Verifies `reference`.
    ///
    /// Terminal rows are reported as they are without contacting the gateway.
    /// If another writer settles the row while the gateway is being asked,
    /// that writer's status is kept and reported.
    pub async fn verify(&self, reference: &str) -> Result<VerificationReport, PaychannelError> {
        let payment = self.current(reference).await?;
        if payment.status.is_terminal() {
            debug!(reference, status = %payment.status, "already settled");
            return Ok(VerificationReport {
                payment,
                changed: false,
            });
        }

        let verification = self.gateway.verify(reference).await?;
        let status = PaymentStatus::from(verification.status);
        if status == PaymentStatus::Pending {
            return Ok(VerificationReport {
                payment,
                changed: false,
            });
        }

        match self
            .ledger
            .update_status(reference, status, verification.gateway_response)
            .await {
            Ok(change) => {
                let changed = change.is_applied();
                if changed {
                    info!(reference, status = %status, "payment settled by verification");
                }
                Ok(VerificationReport {
                    payment: change.into_payment(),
                    changed,
                })
            }
            Err(PaychannelError::InvalidTransition { .. }) => Ok(VerificationReport {
                payment: self.current(reference).await?,
                changed: false,
            }),
            Err(e) => Err(e),
        }
    }

    async fn current(&self, reference: &str) -> Result<PaymentAttempt, PaychannelError> {
        self.ledger
            .get_payment(reference)
            .await?
            .ok_or_else(|| PaychannelError::PaymentNotFound {
                reference: reference.to_string(),
            })
    }
}
