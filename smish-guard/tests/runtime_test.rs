//! Integration tests for the pipeline runtime

use smish_guard::classifier::{Classifier, Label, LinearModel, TfidfVectorizer};
use smish_guard::config::Config;
use smish_guard::error::GuardError;
use smish_guard::export;
use smish_guard::listener::MessageClient;
use smish_guard::message::{Message, Source};
use smish_guard::pipeline::Outcome;
use smish_guard::runtime::{Event, EventReceiver, Runtime};
use smish_guard::store::{LogEntry, LogStore};
use smish_guard::verification::Decision;
use std::collections::HashMap;
use std::time::Duration;
use tokio::time::timeout;

/// Three-class model over a five-term vocabulary:
/// `lunch` → Legit, `bit`/`ly` → Smishing, `win`/`prize` → Spam
fn test_classifier() -> Classifier {
    let vocabulary: HashMap<String, usize> = ["win", "prize", "bit", "ly", "lunch"]
        .iter()
        .enumerate()
        .map(|(i, term)| (term.to_string(), i))
        .collect();
    let vectorizer = TfidfVectorizer::new(vocabulary, vec![1.0; 5]).unwrap();

    let model = LinearModel::new(
        vec![0, 1, 2],
        vec![
            vec![-1.0, -1.0, -1.0, -1.0, 2.0],
            vec![0.0, 0.0, 3.0, 3.0, -1.0],
            vec![2.0, 2.0, 0.0, 0.0, -1.0],
        ],
        vec![0.1, 0.0, 0.0],
    )
    .unwrap();

    Classifier::new(vectorizer, model)
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.listener.listen_addr = "127.0.0.1:0".to_string();
    config
}

/// Next logged entry that is not a system notice
async fn next_logged(events: &mut EventReceiver) -> LogEntry {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event channel closed");

        if let Event::Logged(entry) = event {
            if entry.label != Label::Info {
                return entry;
            }
        }
    }
}

#[tokio::test]
async fn test_manual_legit_logged_directly() {
    let (runtime, handle, _events) = Runtime::spawn(&test_config(), test_classifier(), LogStore::new());

    let outcome = handle.submit(Message::manual("See you at lunch")).await.unwrap();
    match outcome {
        Outcome::Logged(entry) => {
            assert_eq!(entry.label, Label::Legit);
            assert_eq!(entry.source, Some(Source::ManualInput));
            assert!(entry.warnings.is_empty());
        }
        other => panic!("expected logged entry, got {:?}", other),
    }
    assert_eq!(handle.store().len().await, 1);

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_manual_verification_override() {
    let (runtime, handle, mut events) =
        Runtime::spawn(&test_config(), test_classifier(), LogStore::new());

    let outcome = handle
        .submit(Message::manual("Claim your prize at bit.ly/x"))
        .await
        .unwrap();

    let pending = match outcome {
        Outcome::PendingVerification(pending) => pending,
        other => panic!("expected pending verification, got {:?}", other),
    };
    assert_eq!(pending.verdict.label, Label::Smishing);
    assert!(handle.store().is_empty().await);

    let entry = handle
        .resolve(pending.ticket, Decision::Override(Label::Spam))
        .await
        .unwrap();
    assert_eq!(entry.label, Label::Spam);
    assert_eq!(next_logged(&mut events).await.id, entry.id);

    // a ticket is answered once
    let again = handle.resolve(pending.ticket, Decision::Accept).await;
    assert!(matches!(again, Err(GuardError::Verification(_))));
    assert_eq!(handle.store().len().await, 1);

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_pending_verification_does_not_block_network() {
    let (runtime, handle, mut events) =
        Runtime::spawn(&test_config(), test_classifier(), LogStore::new());
    let addr = handle.start_network().await.unwrap();

    let outcome = handle
        .submit(Message::manual("Claim your prize at bit.ly/x"))
        .await
        .unwrap();
    assert!(matches!(outcome, Outcome::PendingVerification(_)));

    MessageClient::new(addr.to_string())
        .send(Some("+15550100"), "See you at lunch")
        .await
        .unwrap();

    let entry = next_logged(&mut events).await;
    assert_eq!(entry.label, Label::Legit);
    assert_eq!(entry.sender.as_deref(), Some("+15550100"));

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_concurrent_network_messages_all_logged() {
    let (runtime, handle, mut events) =
        Runtime::spawn(&test_config(), test_classifier(), LogStore::new());
    let addr = handle.start_network().await.unwrap().to_string();

    let senders: Vec<_> = ["alice", "bob"]
        .into_iter()
        .map(|sender| {
            let addr = addr.clone();
            tokio::spawn(async move {
                MessageClient::new(addr)
                    .send(Some(sender), "Win a prize")
                    .await
            })
        })
        .collect();
    for sender in senders {
        sender.await.unwrap().unwrap();
    }

    let first = next_logged(&mut events).await;
    let second = next_logged(&mut events).await;
    assert_eq!(first.label, Label::Spam);
    assert_eq!(second.label, Label::Spam);
    assert_ne!(first.sender, second.sender);

    let messages = handle.store().list(None).await;
    let classified: Vec<_> = messages.iter().filter(|e| e.label != Label::Info).collect();
    assert_eq!(classified.len(), 2);
    assert!(messages
        .iter()
        .any(|e| e.label == Label::Info && e.message.starts_with("Network server listening on port")));

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_network_sample_end_to_end() {
    let (runtime, handle, mut events) =
        Runtime::spawn(&test_config(), test_classifier(), LogStore::new());
    let addr = handle.start_network().await.unwrap();
    let client = MessageClient::new(addr.to_string());

    let text = "Win a FREE prize! Click http://bit.ly/x now";
    client.send(Some("+15550100"), text).await.unwrap();
    client.send(Some("+15550100"), text).await.unwrap();

    for _ in 0..2 {
        let entry = next_logged(&mut events).await;
        assert_eq!(entry.label, Label::Smishing);
        assert_eq!(entry.message, text);
        assert!(entry.warnings.iter().any(|w| w == "URLs: http://bit.ly/x"));
    }

    handle.stop_network().await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logs.txt");
    export::export_all(handle.store(), &path).await.unwrap();

    let content = std::fs::read_to_string(&path).unwrap();
    assert_eq!(content.matches("[Smishing] Win a FREE prize!").count(), 1);
    assert!(content.contains("    URLs: http://bit.ly/x\n"));
    assert!(content.contains("[Info] Network server stopped."));

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_unavailable_model() {
    let (runtime, handle, mut events) =
        Runtime::spawn(&test_config(), Classifier::unavailable(), LogStore::new());

    let event = timeout(Duration::from_secs(5), events.recv()).await.unwrap();
    assert!(matches!(event, Some(Event::Notice(_))));

    let result = handle.submit(Message::manual("hello")).await;
    assert!(matches!(result, Err(GuardError::ModelUnavailable)));
    assert!(handle.store().is_empty().await);

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_empty_input_rejected() {
    let (runtime, handle, _events) = Runtime::spawn(&test_config(), test_classifier(), LogStore::new());

    let result = handle.submit(Message::manual("   ")).await;
    assert!(matches!(result, Err(GuardError::EmptyMessage)));

    let result = handle.submit(Message::manual("Type here...")).await;
    assert!(matches!(result, Err(GuardError::EmptyMessage)));

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_remove_entry() {
    let (runtime, handle, mut events) =
        Runtime::spawn(&test_config(), test_classifier(), LogStore::new());

    let entry = match handle.submit(Message::manual("See you at lunch")).await.unwrap() {
        Outcome::Logged(entry) => entry,
        other => panic!("expected logged entry, got {:?}", other),
    };
    next_logged(&mut events).await;

    let removed = handle.remove(entry.id).await.unwrap();
    assert_eq!(removed.map(|e| e.id), Some(entry.id));
    assert!(handle.store().is_empty().await);
    assert!(handle.remove(entry.id).await.unwrap().is_none());

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();
}

#[tokio::test]
async fn test_handle_after_shutdown() {
    let (runtime, handle, _events) = Runtime::spawn(&test_config(), test_classifier(), LogStore::new());

    handle.shutdown().await.unwrap();
    runtime.await.unwrap();

    let result = handle.submit(Message::manual("hello")).await;
    assert!(matches!(result, Err(GuardError::RuntimeClosed)));
}
