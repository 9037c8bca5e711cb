//! Tests for PeerVerificationService

use super::*;
use crate::domain::{TimerId, VerificationConfig, VerificationError, VerificationState};
use crate::ports::{AlertSeverity, PeerRegistry};
use crate::testing::{wait_until, ScriptedEncryption, TestNode};
use shared_bus::InMemoryMesh;
use shared_crypto::{EciesEncryption, EncryptionService};
use shared_types::{Namespace, PeerId, SessionKind};
use std::sync::Arc;
use std::time::Duration;

fn ecies() -> Arc<dyn EncryptionService> {
    Arc::new(EciesEncryption::new())
}

fn node(mesh: &InMemoryMesh, name: &str) -> TestNode {
    TestNode::spawn(mesh, name, SessionKind::Group, ecies(), VerificationConfig::default()).unwrap()
}

fn node_with(
    mesh: &InMemoryMesh,
    name: &str,
    session: SessionKind,
    encryption: Arc<dyn EncryptionService>,
    timeout: Duration,
) -> TestNode {
    TestNode::spawn(
        mesh,
        name,
        session,
        encryption,
        VerificationConfig::with_timeout(timeout),
    )
    .unwrap()
}

// =============================================================================
// Handshake outcomes
// =============================================================================

#[tokio::test]
async fn test_correct_echo_verifies_peer() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();

    let pending = a.entry_for(&b).unwrap();
    assert_eq!(pending.verification_state, VerificationState::Pending);
    let timer = pending.verification_timer.clone().unwrap();
    assert!(timer.is_live());

    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Verified)).await);

    let verified = a.entry_for(&b).unwrap();
    assert!(verified.verification_timer.is_none());
    assert!(!timer.is_live());
    assert!(a.alerts.is_empty());
}

#[tokio::test]
async fn test_token_never_sent_in_plaintext() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();

    let ciphertext = a.entry_for(&b).unwrap().encrypted_verification_token.unwrap();
    assert!(!ciphertext.windows(6).any(|w| w == b"abc123"));
}

#[tokio::test]
async fn test_wrong_echo_resets_and_alerts_once() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::decrypting_to("wrong")),
        Duration::from_secs(10),
    );
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();

    assert!(wait_until(|| a.alerts.len() == 1).await);
    let entry = a.entry_for(&b).unwrap();
    assert_eq!(entry.verification_state, VerificationState::Unverified);
    assert!(entry.verification_timer.is_none());

    let alerts = a.alerts.alerts();
    assert_eq!(alerts[0].message, "Verification for bob failed");
    assert_eq!(alerts[0].severity, AlertSeverity::Error);

    // The mismatch surfaces as a handler error at the dispatch boundary.
    assert!(wait_until(|| a.channel.stats().handler_failures == 1).await);
}

#[tokio::test]
async fn test_mismatch_error_carries_both_tokens() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_decrypt()),
        Duration::from_secs(10),
    );
    let peer_b = a.learn(&b, "abc123");
    a.service.init_peer_verification(&peer_b).await.unwrap();

    let err = a
        .service
        .handle_raw_token("wrong".into(), b.peer_id.clone())
        .await
        .unwrap_err();

    match err {
        VerificationError::TokenMismatch {
            peer_id,
            expected,
            received,
        } => {
            assert_eq!(peer_id, b.peer_id);
            assert_eq!(expected, "abc123");
            assert_eq!(received, "wrong");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(a.state_of(&b), Some(VerificationState::Unverified));
}

#[tokio::test(start_paused = true)]
async fn test_no_echo_times_out() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Group, ecies(), Duration::from_secs(5));
    let failing = Arc::new(ScriptedEncryption::failing_decrypt());
    let b = node_with(&mesh, "bob", SessionKind::Group, failing.clone(), Duration::from_secs(5));
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(a.state_of(&b), Some(VerificationState::Pending));
    assert!(a.alerts.is_empty());
    assert_eq!(failing.decrypt_calls(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    let entry = a.entry_for(&b).unwrap();
    assert_eq!(entry.verification_state, VerificationState::Unverified);
    assert!(entry.verification_timer.is_none());

    let alerts = a.alerts.alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].message, "Verification for bob timed out");
    assert_eq!(alerts[0].severity, AlertSeverity::Error);

    // Decryption failure is swallowed by the responder.
    assert_eq!(b.channel.stats().handler_failures, 0);

    tokio::time::sleep(Duration::from_secs(30)).await;
    assert_eq!(a.alerts.len(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_zero_timeout_expires_after_commit() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Group, ecies(), Duration::ZERO);
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_decrypt()),
        Duration::ZERO,
    );
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();

    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Unverified)).await);
    let entry = a.entry_for(&b).unwrap();
    assert!(entry.verification_timer.is_none());
    assert!(entry.encrypted_verification_token.is_some());
    assert!(wait_until(|| a.alerts.len() == 1).await);
    assert_eq!(a.alerts.alerts()[0].message, "Verification for bob timed out");
}

#[tokio::test(start_paused = true)]
async fn test_late_echo_after_timeout_is_dropped() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Group, ecies(), Duration::from_secs(5));
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_decrypt()),
        Duration::from_secs(5),
    );
    let peer_b = a.learn(&b, "abc123");
    a.service.init_peer_verification(&peer_b).await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    a.service
        .handle_raw_token("abc123".into(), b.peer_id.clone())
        .await
        .unwrap();

    assert_eq!(a.state_of(&b), Some(VerificationState::Unverified));
    assert_eq!(a.alerts.len(), 1);
}

#[tokio::test]
async fn test_unknown_sender_is_not_found() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    a.learn(&b, "abc123");
    let commits = a.registry.commit_count();

    let ghost = PeerId::new("peer-ghost").unwrap();
    let err = a
        .service
        .handle_raw_token("abc123".into(), ghost.clone())
        .await
        .unwrap_err();

    assert!(matches!(err, VerificationError::PeerNotFound(id) if id == ghost));
    assert_eq!(a.registry.commit_count(), commits);
    assert_eq!(a.state_of(&b), Some(VerificationState::Unverified));
}

#[tokio::test]
async fn test_unknown_sender_over_the_wire_does_not_break_channel() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let stranger = node(&mesh, "carol");
    let peer_b = a.learn(&b, "abc123");

    let raw = stranger
        .channel
        .sender::<String>(VERIFICATION_TOKEN_RAW, Namespace::Group)
        .unwrap();
    raw.send(&"abc123".to_string(), Some(&[a.peer_id.clone()]))
        .await
        .unwrap();

    assert!(wait_until(|| a.channel.stats().handler_failures == 1).await);
    assert_eq!(a.registry.len(), 1);

    // The channel keeps working afterwards.
    a.service.init_peer_verification(&peer_b).await.unwrap();
    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Verified)).await);
}

#[tokio::test]
async fn test_encrypt_failure_leaves_peer_untouched() {
    let mesh = InMemoryMesh::new();
    let a = node_with(
        &mesh,
        "alice",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_encrypt()),
        Duration::from_secs(10),
    );
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");

    let err = a.service.init_peer_verification(&peer_b).await.unwrap_err();

    assert!(matches!(err, VerificationError::Crypto(_)));
    let entry = a.entry_for(&b).unwrap();
    assert_eq!(entry.verification_state, VerificationState::Unverified);
    assert!(entry.verification_timer.is_none());
}

#[tokio::test]
async fn test_verified_peer_is_not_challenged_again() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");
    a.service.init_peer_verification(&peer_b).await.unwrap();
    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Verified)).await);
    let sent = a.channel.stats().frames_sent;

    let current = a.entry_for(&b).unwrap();
    a.service.init_peer_verification(&current).await.unwrap();

    assert_eq!(a.channel.stats().frames_sent, sent);
    let entry = a.entry_for(&b).unwrap();
    assert_eq!(entry.verification_state, VerificationState::Verified);
    assert!(entry.verification_timer.is_none());
}

#[tokio::test]
async fn test_departed_peer_cannot_be_challenged() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");
    a.registry.remove_peer(&b.peer_id);

    let err = a.service.init_peer_verification(&peer_b).await.unwrap_err();
    assert!(matches!(err, VerificationError::PeerNotFound(_)));
}

// =============================================================================
// Timers
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_second_attempt_replaces_timer() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Group, ecies(), Duration::from_secs(5));
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_decrypt()),
        Duration::from_secs(5),
    );
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();
    let first = a.entry_for(&b).unwrap().verification_timer.unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;
    let current = a.entry_for(&b).unwrap();
    a.service.init_peer_verification(&current).await.unwrap();
    let second = a.entry_for(&b).unwrap().verification_timer.unwrap();

    assert_ne!(first.id(), second.id());
    assert!(!first.is_live());
    assert!(second.is_live());

    // The first timer's deadline passes without effect.
    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(a.state_of(&b), Some(VerificationState::Pending));
    assert!(a.alerts.is_empty());

    tokio::time::sleep(Duration::from_secs(3)).await;
    assert_eq!(a.state_of(&b), Some(VerificationState::Unverified));
    assert_eq!(a.alerts.len(), 1);
}

#[tokio::test]
async fn test_stale_timer_does_not_mutate_registry() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_decrypt()),
        Duration::from_secs(10),
    );
    let peer_b = a.learn(&b, "abc123");
    a.service.init_peer_verification(&peer_b).await.unwrap();

    let live = a.entry_for(&b).unwrap().timer_id().unwrap();
    let commits = a.registry.commit_count();

    assert!(!a
        .service
        .on_verification_timeout(&b.peer_id, TimerId::new(live.value() + 100)));

    assert_eq!(a.registry.commit_count(), commits);
    assert_eq!(a.state_of(&b), Some(VerificationState::Pending));
    assert!(a.alerts.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_removed_peer_timer_never_alerts() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Group, ecies(), Duration::from_secs(5));
    let b = node_with(
        &mesh,
        "bob",
        SessionKind::Group,
        Arc::new(ScriptedEncryption::failing_decrypt()),
        Duration::from_secs(5),
    );
    let peer_b = a.learn(&b, "abc123");
    a.service.init_peer_verification(&peer_b).await.unwrap();
    let timer = a.entry_for(&b).unwrap().verification_timer.unwrap();

    a.registry.remove_peer(&b.peer_id);
    assert!(!timer.is_live());

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert!(a.alerts.is_empty());
}

// =============================================================================
// Scheduling
// =============================================================================

#[tokio::test]
async fn test_scheduled_peer_is_verified_after_commit() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");

    a.service.verify_peer(&peer_b);

    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Verified)).await);
    assert!(a.service.scheduled_peer_id().is_none());
}

#[tokio::test]
async fn test_only_latest_scheduled_peer_starts() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let c = node(&mesh, "carol");
    let peer_b = a.learn(&b, "token-b");
    let peer_c = a.learn(&c, "token-c");

    a.service.verify_peer(&peer_b);
    a.service.verify_peer(&peer_c);
    assert_eq!(a.service.scheduled_peer_id(), Some(c.peer_id.clone()));

    assert!(wait_until(|| a.state_of(&c) == Some(VerificationState::Verified)).await);
    tokio::time::sleep(Duration::from_millis(50)).await;

    let entry_b = a.entry_for(&b).unwrap();
    assert_eq!(entry_b.verification_state, VerificationState::Unverified);
    assert!(entry_b.encrypted_verification_token.is_none());
}

#[tokio::test]
async fn test_drain_uses_current_registry_entry() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let stale = a.learn(&b, "old-token");

    // Entry replaced after scheduling; the drain must encrypt the new token.
    a.service.verify_peer(&stale);
    a.learn(&b, "new-token");

    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Verified)).await);
    assert!(a.entry_for(&b).unwrap().verification_token.matches("new-token"));
    assert!(a.alerts.is_empty());
}

#[tokio::test]
async fn test_scheduled_peer_that_left_is_skipped() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    let b = node(&mesh, "bob");
    let peer_b = a.learn(&b, "abc123");

    a.service.verify_peer(&peer_b);
    a.registry.remove_peer(&b.peer_id);
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(a.channel.stats().frames_sent, 0);
    assert!(a.service.scheduled_peer_id().is_none());
}

#[tokio::test]
async fn test_direct_session_ignores_scheduling() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Direct, ecies(), Duration::from_secs(10));
    let b = node_with(&mesh, "bob", SessionKind::Direct, ecies(), Duration::from_secs(10));
    let peer_b = a.learn(&b, "abc123");

    a.service.verify_peer(&peer_b);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(a.state_of(&b), Some(VerificationState::Unverified));
    assert!(a.service.scheduled_peer_id().is_none());

    // Direct sessions verify through the explicit path.
    a.service.init_peer_verification(&peer_b).await.unwrap();
    assert!(wait_until(|| a.state_of(&b) == Some(VerificationState::Verified)).await);
}

#[tokio::test(start_paused = true)]
async fn test_namespaces_do_not_cross() {
    let mesh = InMemoryMesh::new();
    let a = node_with(&mesh, "alice", SessionKind::Group, ecies(), Duration::from_secs(5));
    let b = node_with(&mesh, "bob", SessionKind::Direct, ecies(), Duration::from_secs(5));
    let peer_b = a.learn(&b, "abc123");

    a.service.init_peer_verification(&peer_b).await.unwrap();
    tokio::time::sleep(Duration::from_secs(6)).await;

    assert_eq!(a.state_of(&b), Some(VerificationState::Unverified));
    assert_eq!(a.alerts.len(), 1);
    assert_eq!(b.channel.stats().frames_unrouted, 1);
}

#[tokio::test]
async fn test_service_exposes_session_and_config() {
    let mesh = InMemoryMesh::new();
    let a = node(&mesh, "alice");
    assert_eq!(a.service.session(), SessionKind::Group);
    assert_eq!(*a.service.config(), VerificationConfig::default());
    assert!(a.channel.is_registered(VERIFICATION_TOKEN_ENCRYPTED, Namespace::Group));
    assert!(a.channel.is_registered(VERIFICATION_TOKEN_RAW, Namespace::Group));
    assert!(!a.channel.is_registered(VERIFICATION_TOKEN_RAW, Namespace::Direct));
}
