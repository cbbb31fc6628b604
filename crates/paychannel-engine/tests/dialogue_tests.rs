// SPDX-FileCopyrightText: 2026 Paychannel Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dialogue engine behavior over a real SQLite ledger and a scripted gateway.

use std::sync::Arc;
use std::time::Duration;

use paychannel_core::PaychannelError;
use paychannel_core::traits::PaymentLedger;
use paychannel_core::traits::gateway::GATEWAY_UNREACHABLE;
use paychannel_core::types::{
    ChannelType, ChargeMethod, ChargeResult, GatewayTransactionStatus, MobileNetwork, NewPayment,
    OtpResult, PaymentStatus,
};
use paychannel_engine::prompt;
use paychannel_engine::{DialogueSession, DialogueState, SessionStore};
use paychannel_test_utils::{MockGateway, TestHarness};
use rust_decimal_macros::dec;

async fn harness() -> TestHarness {
    TestHarness::builder()
        .with_channel("Church Dues", dec!(50))
        .with_channel_config("Closed Fund", dec!(10), false)
        .build()
        .await
        .unwrap()
}

// --- Dial ---

#[tokio::test]
async fn dial_shows_confirmation_menu() {
    let h = harness().await;
    let response = h.dial("s1", "*928*1#").await;

    assert!(response.continue_session);
    assert_eq!(
        response.message,
        "Church Dues\nAmount: GHS 50.00\n1. Confirm\n2. Cancel"
    );
    assert!(response.message.contains("GHS 50"));
    assert_eq!(response.session_id, "s1");
    assert_eq!(response.msisdn, "233241234567");

    let session = h.sessions.get("s1").await.unwrap().unwrap();
    assert_eq!(session.channel_id, h.channels[0].id);
    assert_eq!(session.state, DialogueState::AwaitingConfirmation);
}

#[tokio::test]
async fn disabled_or_unknown_codes_create_no_session() {
    let h = harness().await;
    for dial in ["*928*2#", "*928*99#"] {
        let response = h.dial("s1", dial).await;
        assert!(!response.continue_session);
        assert_eq!(response.message, prompt::INVALID_CHANNEL);
    }
    assert!(h.sessions.get("s1").await.unwrap().is_none());
}

#[tokio::test]
async fn malformed_dial_is_rejected() {
    let h = harness().await;
    let response = h.dial("s1", "hello").await;
    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::INVALID_FORMAT);
    assert!(h.sessions.is_empty());
}

#[tokio::test]
async fn unknown_session_is_expired() {
    let h = harness().await;
    let response = h.reply("ghost", "1").await;
    assert!(!response.continue_session);
    assert_eq!(response.message, "Session expired. Dial again.");
}

// --- Confirmation ---

#[tokio::test]
async fn cancel_never_reaches_gateway() {
    let h = harness().await;
    h.dial("s1", "*928*1#").await;
    let response = h.reply("s1", "2").await;

    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::CANCELLED);
    assert!(h.sessions.get("s1").await.unwrap().is_none());
    assert_eq!(h.gateway.charge_calls(), 0);
    assert!(h.payments().await.unwrap().is_empty());
}

#[tokio::test]
async fn other_input_reprompts() {
    let h = harness().await;
    h.dial("s1", "*928*1#").await;
    let response = h.reply("s1", "3").await;

    assert!(response.continue_session);
    assert_eq!(response.message, "Invalid option\n1. Confirm\n2. Cancel");
    assert!(h.sessions.get("s1").await.unwrap().is_some());
    assert_eq!(h.gateway.charge_calls(), 0);
}

#[tokio::test]
async fn approved_charge_ends_session_with_pending_row() {
    let h = harness().await;
    h.dial("s1", "*928*1#").await;
    let response = h.reply("s1", "1").await;

    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::PAYMENT_INITIATED);
    assert!(h.sessions.get("s1").await.unwrap().is_none());

    let payments = h.payments().await.unwrap();
    assert_eq!(payments.len(), 1);
    let payment = &payments[0];
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.amount, dec!(50));
    assert_eq!(payment.channel_id, h.channels[0].id);
    assert_eq!(payment.phone_number, "233241234567");

    let requests = h.gateway.charge_requests().await;
    assert_eq!(requests.len(), 1);
    let charge = &requests[0];
    assert_eq!(charge.reference, payment.reference);
    assert_eq!(charge.email, "233241234567-agg-user@mtn.com");
    assert_eq!(charge.network, MobileNetwork::Mtn);
    assert_eq!(charge.amount, dec!(50));
    assert_eq!(charge.metadata["source"], "ussd");
    assert_eq!(charge.metadata["channel"], "Church Dues");
}

#[tokio::test]
async fn otp_required_moves_session_to_awaiting_otp() {
    let h = harness().await;
    h.gateway.push_charge(ChargeResult::OtpRequired).await;
    h.dial("s1", "*928*1#").await;
    let response = h.reply("s1", "1").await;

    assert!(response.continue_session);
    assert_eq!(response.message, prompt::ENTER_OTP);

    let session = h.sessions.get("s1").await.unwrap().unwrap();
    assert!(session.awaiting_otp());
    let reference = session.payment_reference().unwrap().to_string();

    let payment = h.storage.get_payment(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn rejected_charge_records_reason_and_stays_pending() {
    let h = harness().await;
    h.gateway
        .push_charge(ChargeResult::rejected("Insufficient funds"))
        .await;
    h.dial("s1", "*928*1#").await;
    let response = h.reply("s1", "1").await;

    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::PAYMENT_FAILED);
    assert!(h.sessions.get("s1").await.unwrap().is_none());

    let payments = h.payments().await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert_eq!(payments[0].gateway_response.as_deref(), Some("Insufficient funds"));
}

#[tokio::test]
async fn unsupported_network_is_a_failed_payment() {
    let h = harness().await;
    h.gateway
        .push_charge_error(PaychannelError::Unsupported {
            gateway: "payswitch".into(),
            what: "network orange".into(),
        })
        .await;
    h.dial("s1", "*928*1#").await;
    let response = h.reply("s1", "1").await;

    assert_eq!(response.message, prompt::PAYMENT_FAILED);
    let payments = h.payments().await.unwrap();
    assert_eq!(payments.len(), 1);
    assert_eq!(
        payments[0].gateway_response.as_deref(),
        Some("payswitch does not support network orange")
    );
}

#[tokio::test]
async fn slow_gateway_times_out_as_unreachable() {
    let h = TestHarness::builder()
        .with_channel("Dues", dec!(5))
        .with_gateway(MockGateway::new().with_delay(Duration::from_millis(500)))
        .with_gateway_timeout(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    h.dial("s1", "*1#").await;
    let response = h.reply("s1", "1").await;

    assert_eq!(response.message, prompt::PAYMENT_FAILED);
    let payments = h.payments().await.unwrap();
    assert_eq!(payments[0].status, PaymentStatus::Pending);
    assert_eq!(payments[0].gateway_response.as_deref(), Some(GATEWAY_UNREACHABLE));
}

#[tokio::test]
async fn concurrent_confirms_charge_once() {
    let h = TestHarness::builder()
        .with_channel("Dues", dec!(5))
        .with_gateway(MockGateway::new().with_delay(Duration::from_millis(50)))
        .build()
        .await
        .unwrap();
    h.dial("s1", "*1#").await;

    let event = TestHarness::event("s1", "1", false);
    let (a, b) = tokio::join!(h.engine.handle(&event), h.engine.handle(&event));

    assert_eq!(h.gateway.charge_calls(), 1);
    assert_eq!(h.payments().await.unwrap().len(), 1);
    let messages = [a.message, b.message];
    assert!(messages.contains(&prompt::PAYMENT_INITIATED.to_string()));
    assert!(messages.contains(&prompt::SESSION_EXPIRED.to_string()));
}

#[tokio::test]
async fn independent_sessions_do_not_interfere() {
    let h = harness().await;
    h.dial("a", "*928*1#").await;
    h.dial("b", "*928*1#").await;

    assert_eq!(h.reply("a", "2").await.message, prompt::CANCELLED);
    let b = h.sessions.get("b").await.unwrap().unwrap();
    assert_eq!(b.state, DialogueState::AwaitingConfirmation);
}

// --- OTP ---

async fn awaiting_otp(h: &TestHarness) -> String {
    h.gateway.push_charge(ChargeResult::OtpRequired).await;
    h.dial("s1", "*928*1#").await;
    h.reply("s1", "1").await;
    h.sessions
        .get("s1")
        .await
        .unwrap()
        .unwrap()
        .payment_reference()
        .unwrap()
        .to_string()
}

#[tokio::test]
async fn non_digit_otp_reprompts_without_gateway_call() {
    let h = harness().await;
    awaiting_otp(&h).await;

    for bad in ["", "12a4", "  "] {
        let response = h.reply("s1", bad).await;
        assert!(response.continue_session);
        assert_eq!(response.message, prompt::INVALID_OTP);
    }
    assert_eq!(h.gateway.otp_calls(), 0);
    assert!(h.sessions.get("s1").await.unwrap().unwrap().awaiting_otp());
}

#[tokio::test]
async fn digit_otp_is_submitted_once() {
    let h = harness().await;
    let reference = awaiting_otp(&h).await;

    let response = h.reply("s1", "123456").await;
    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::OTP_SUBMITTED);
    assert_eq!(h.gateway.otp_calls(), 1);
    assert_eq!(
        h.gateway.submitted_otps().await,
        vec![("123456".to_string(), reference.clone())]
    );
    assert!(h.sessions.get("s1").await.unwrap().is_none());

    let payment = h.storage.get_payment(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
}

#[tokio::test]
async fn requery_is_reported_as_submitted() {
    let h = harness().await;
    awaiting_otp(&h).await;
    h.gateway.push_otp(OtpResult::Requery).await;
    assert_eq!(h.reply("s1", "1111").await.message, prompt::OTP_SUBMITTED);
}

#[tokio::test]
async fn rejected_otp_fails_payment() {
    let h = harness().await;
    let reference = awaiting_otp(&h).await;
    h.gateway.push_otp(OtpResult::rejected("Wrong OTP")).await;

    let response = h.reply("s1", "000000").await;
    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::OTP_FAILED);
    assert!(h.sessions.get("s1").await.unwrap().is_none());

    let payment = h.storage.get_payment(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Failed);
    assert_eq!(payment.gateway_response.as_deref(), Some("Wrong OTP"));
}

#[tokio::test]
async fn unreachable_otp_leaves_payment_open_for_verification() {
    let h = harness().await;
    let reference = awaiting_otp(&h).await;
    h.gateway
        .push_otp(OtpResult::rejected(GATEWAY_UNREACHABLE))
        .await;

    let response = h.reply("s1", "123456").await;
    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::OTP_FAILED);

    let payment = h.storage.get_payment(&reference).await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.gateway_response.as_deref(), Some(GATEWAY_UNREACHABLE));

    h.gateway
        .push_verification(GatewayTransactionStatus::Success)
        .await;
    let report = h.verifier.verify(&reference).await.unwrap();
    assert!(report.changed);
    assert_eq!(report.payment.status, PaymentStatus::Success);
    assert_eq!(
        h.storage.get_payment(&reference).await.unwrap().unwrap().status,
        PaymentStatus::Success
    );
}

#[tokio::test]
async fn timed_out_otp_leaves_payment_pending() {
    let h = TestHarness::builder()
        .with_channel("Dues", dec!(5))
        .with_gateway(MockGateway::new().with_delay(Duration::from_millis(500)))
        .with_gateway_timeout(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    let channel = h.channels[0].clone();
    h.storage
        .create_pending(NewPayment {
            reference: "PAY-otp-timeout".into(),
            channel_id: channel.id.clone(),
            amount: channel.amount,
            currency: channel.currency.clone(),
            phone_number: "233241234567".into(),
            channel_type: ChannelType::Ussd,
            charge_type: ChargeMethod::Momo,
        })
        .await
        .unwrap();
    h.sessions
        .create(
            "s1",
            DialogueSession {
                channel_id: channel.id,
                state: DialogueState::AwaitingOtp {
                    reference: "PAY-otp-timeout".into(),
                },
            },
        )
        .await
        .unwrap();

    let response = h.reply("s1", "123456").await;
    assert_eq!(response.message, prompt::OTP_FAILED);
    assert_eq!(h.gateway.otp_calls(), 1);

    let payment = h.storage.get_payment("PAY-otp-timeout").await.unwrap().unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    assert_eq!(payment.gateway_response.as_deref(), Some(GATEWAY_UNREACHABLE));
}

// --- Consistency faults ---

#[tokio::test]
#[tracing_test::traced_test]
async fn vanished_channel_is_a_logged_consistency_fault() {
    let h = harness().await;
    h.sessions
        .create("s1", DialogueSession::new("no-such-channel"))
        .await
        .unwrap();

    let response = h.reply("s1", "1").await;
    assert!(!response.continue_session);
    assert_eq!(response.message, prompt::SERVICE_UNAVAILABLE);
    assert!(h.sessions.get("s1").await.unwrap().is_none());
    assert_eq!(h.gateway.charge_calls(), 0);
    assert!(h.payments().await.unwrap().is_empty());
    assert!(logs_contain("USSD turn aborted"));
}

// --- Session expiry ---

#[tokio::test]
async fn idle_session_expires() {
    let h = TestHarness::builder()
        .with_channel("Dues", dec!(5))
        .with_session_ttl(Duration::from_millis(50))
        .build()
        .await
        .unwrap();
    h.dial("s1", "*1#").await;
    tokio::time::sleep(Duration::from_millis(120)).await;

    let response = h.reply("s1", "1").await;
    assert_eq!(response.message, prompt::SESSION_EXPIRED);
    assert_eq!(h.gateway.charge_calls(), 0);
}

// --- Verification ---

#[tokio::test]
async fn verification_settles_pending_payment() {
    let h = harness().await;
    h.dial("s1", "*928*1#").await;
    h.reply("s1", "1").await;
    let reference = h.payments().await.unwrap()[0].reference.clone();

    h.gateway
        .push_verification_text(GatewayTransactionStatus::Success, "Approved")
        .await;
    let report = h.verifier.verify(&reference).await.unwrap();
    assert!(report.changed);
    assert_eq!(report.payment.status, PaymentStatus::Success);
    assert_eq!(report.payment.gateway_response.as_deref(), Some("Approved"));

    let stored = h.storage.get_payment(&reference).await.unwrap().unwrap();
    assert_eq!(stored.gateway_response.as_deref(), Some("Approved"));
}

#[tokio::test]
async fn verification_of_settled_payment_is_idempotent() {
    let h = harness().await;
    h.dial("s1", "*928*1#").await;
    h.reply("s1", "1").await;
    let reference = h.payments().await.unwrap()[0].reference.clone();
    h.storage
        .update_status(&reference, PaymentStatus::Success, Some("{\"ok\":true}".into()))
        .await
        .unwrap();
    let before = h.storage.get_payment(&reference).await.unwrap().unwrap();

    let report = h.verifier.verify(&reference).await.unwrap();
    assert!(!report.changed);
    assert_eq!(report.payment, before);
    assert_eq!(h.gateway.verify_calls(), 0);
    assert_eq!(h.storage.get_payment(&reference).await.unwrap().unwrap(), before);
}

#[tokio::test]
async fn verification_still_pending_changes_nothing() {
    let h = harness().await;
    h.dial("s1", "*928*1#").await;
    h.reply("s1", "1").await;
    let reference = h.payments().await.unwrap()[0].reference.clone();

    let report = h.verifier.verify(&reference).await.unwrap();
    assert!(!report.changed);
    assert_eq!(report.payment.status, PaymentStatus::Pending);
    assert_eq!(h.gateway.verify_calls(), 1);
}

#[tokio::test]
async fn verification_of_unknown_reference_is_not_found() {
    let h = harness().await;
    let err = h.verifier.verify("PAY-missing").await.unwrap_err();
    assert!(matches!(err, PaychannelError::PaymentNotFound { .. }));
}

#[tokio::test]
async fn verification_loses_race_to_otp_failure_gracefully() {
    let h = TestHarness::builder()
        .with_channel("Dues", dec!(5))
        .with_gateway(MockGateway::new().with_delay(Duration::from_millis(50)))
        .build()
        .await
        .unwrap();
    h.dial("s1", "*1#").await;
    h.reply("s1", "1").await;
    let reference = h.payments().await.unwrap()[0].reference.clone();
    h.gateway.push_verification(GatewayTransactionStatus::Success).await;

    let verifier = Arc::clone(&h.verifier);
    let r = reference.clone();
    let verify = tokio::spawn(async move { verifier.verify(&r).await });
    // Lands while the verifier is waiting on the gateway.
    tokio::time::sleep(Duration::from_millis(10)).await;
    h.storage
        .update_status(&reference, PaymentStatus::Failed, None)
        .await
        .unwrap();

    let report = verify.await.unwrap().unwrap();
    assert!(!report.changed);
    assert_eq!(report.payment.status, PaymentStatus::Failed);
}
