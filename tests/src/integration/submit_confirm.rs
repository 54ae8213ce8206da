//! # Submit and Confirm Flows
//!
//! A submitter arms its confirmation listener before submitting, so the
//! callback fires for the committed record whichever of the write and read
//! paths completes first. These flows drive both paths against the
//! in-memory log, including a log that lags our clock and a read replica
//! that flags records invalid.

#[cfg(test)]
mod tests {
    use crate::fixtures::{eventually, keypair, InvalidatingLog, WAIT};
    use csl_02_topic_messaging::{
        ConsensusSubmitter, MessagingError, SubmitterConfig, PRECONDITION_PREFIX,
    };
    use futures::future::join_all;
    use shared_log::{InMemoryLogConfig, InMemoryTopicLog, LogError, TopicRecord};
    use shared_types::{MessageEnvelope, TopicId};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    type Events = (
        mpsc::UnboundedReceiver<TopicRecord>,
        mpsc::UnboundedReceiver<MessagingError>,
    );

    fn envelope(index: u64) -> MessageEnvelope<serde_json::Value> {
        MessageEnvelope::new(serde_json::json!({"list": "status-1", "index": index}))
    }

    /// Submitter config that forwards confirmations and errors to channels.
    fn observed(guard: Duration) -> (SubmitterConfig, Events) {
        let (record_tx, record_rx) = mpsc::unbounded_channel();
        let (error_tx, error_rx) = mpsc::unbounded_channel();
        let config = SubmitterConfig::builder()
            .sign_message(keypair())
            .default_transaction()
            .confirmation_guard(guard)
            .on_message_confirmed(move |record| {
                let _ = record_tx.send(record.clone());
            })
            .on_error(move |err| {
                let _ = error_tx.send(err.clone());
            })
            .build();
        (config, (record_rx, error_rx))
    }

    fn lagging_log(lag: Duration) -> (InMemoryTopicLog, TopicId) {
        let log = InMemoryTopicLog::with_config(InMemoryLogConfig::default().with_clock_lag(lag));
        let topic = log.create_topic().unwrap();
        (log, topic)
    }

    // =========================================================================
    // CONFIRMATION
    // =========================================================================

    #[tokio::test]
    async fn test_confirmation_carries_committed_signed_bytes() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let (config, (mut records, mut errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(1), topic, config).unwrap();

        let receipt = submitter.execute(&log).await.unwrap().unwrap();
        let confirmed = timeout(WAIT, records.recv()).await.unwrap().unwrap();

        assert_eq!(receipt.topic_id, topic);
        assert_eq!(confirmed, log.records(topic)[0]);
        let parsed =
            MessageEnvelope::<serde_json::Value>::from_wire_bytes(&confirmed.contents).unwrap();
        assert!(parsed.verify(&keypair().public_key()));
        assert_eq!(parsed.message()["index"], 1);
        assert!(errors.try_recv().is_err());
        assert!(eventually(|| log.subscriber_count() == 0).await);
    }

    #[tokio::test]
    async fn test_clock_lag_within_guard_still_confirms() {
        let (log, topic) = lagging_log(Duration::from_millis(500));
        let (config, (mut records, _errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(2), topic, config).unwrap();

        submitter.execute(&log).await.unwrap().unwrap();

        let confirmed = timeout(WAIT, records.recv()).await.unwrap().unwrap();
        assert_eq!(confirmed.sequence_number, 1);
    }

    #[tokio::test]
    async fn test_clock_lag_beyond_guard_misses_confirmation() {
        let (log, topic) = lagging_log(Duration::from_secs(5));
        let (config, (mut records, mut errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(3), topic, config).unwrap();

        submitter.execute(&log).await.unwrap().unwrap();

        assert_eq!(log.records(topic).len(), 1);
        assert!(timeout(Duration::from_millis(200), records.recv()).await.is_err());
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_delayed_commit_confirms_after_receipt() {
        let log = InMemoryTopicLog::with_config(
            InMemoryLogConfig::default().with_commit_delay(Duration::from_millis(50)),
        );
        let topic = log.create_topic().unwrap();
        let (config, (mut records, _errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(4), topic, config).unwrap();

        submitter.execute(&log).await.unwrap().unwrap();
        assert!(log.records(topic).is_empty());

        let confirmed = timeout(WAIT, records.recv()).await.unwrap().unwrap();
        assert_eq!(log.records(topic), vec![confirmed]);
    }

    #[tokio::test]
    async fn test_busy_neighbour_topic_does_not_block_confirmation() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let neighbour = log.create_topic().unwrap();
        let (config, (mut records, mut errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(11), topic, config).unwrap();

        submitter.execute(&log).await.unwrap().unwrap();
        for i in 0..1500u32 {
            log.publish_raw(neighbour, i.to_be_bytes().to_vec(), true).unwrap();
        }

        let confirmed = timeout(WAIT, records.recv()).await.unwrap().unwrap();
        assert_eq!(confirmed, log.records(topic)[0]);
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_confirmation_survives_burst_on_own_topic() {
        let log = InMemoryTopicLog::with_config(
            InMemoryLogConfig::default().with_channel_capacity(16),
        );
        let topic = log.create_topic().unwrap();
        let (config, (mut records, mut errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(12), topic, config).unwrap();

        submitter.execute(&log).await.unwrap().unwrap();
        for i in 0..200u32 {
            log.publish_raw(topic, i.to_be_bytes().to_vec(), true).unwrap();
        }

        let confirmed = timeout(WAIT, records.recv()).await.unwrap().unwrap();
        assert_eq!(confirmed.sequence_number, 1);
        assert!(errors.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_other_publishers_do_not_confirm() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let (config, (mut records, _errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(5), topic, config).unwrap();

        log.publish_raw(topic, b"someone else".to_vec(), true).unwrap();
        submitter.execute(&log).await.unwrap().unwrap();
        log.publish_raw(topic, b"someone else again".to_vec(), true).unwrap();

        let confirmed = timeout(WAIT, records.recv()).await.unwrap().unwrap();
        assert_eq!(confirmed.sequence_number, 2);
        assert!(timeout(Duration::from_millis(100), records.recv()).await.is_err());
    }

    #[tokio::test]
    async fn test_invalid_commit_reports_confirmation_error() {
        let log = InvalidatingLog::default();
        let topic = log.inner.create_topic().unwrap();
        let (config, (mut records, mut errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(6), topic, config).unwrap();

        submitter.execute(&log).await.unwrap().unwrap();

        let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
        let committed = log.inner.records(topic)[0].contents.clone();
        match err {
            MessagingError::Confirmation { reason, contents } => {
                assert_eq!(reason, "record flagged invalid by the log");
                assert_eq!(contents, committed);
            }
            other => panic!("expected confirmation error, got {other:?}"),
        }
        assert!(records.try_recv().is_err());
        assert!(eventually(|| log.inner.subscriber_count() == 0).await);
    }

    // =========================================================================
    // FAILURE ROUTING
    // =========================================================================

    #[tokio::test]
    async fn test_rejected_submission_releases_listener() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let config = SubmitterConfig::builder()
            .sign_message(keypair())
            .default_transaction()
            .on_message_confirmed(|_| {})
            .build();
        let submitter = ConsensusSubmitter::new(envelope(7), topic, config).unwrap();
        log.reject_next_submission(LogError::Rejected("insufficient fee".into()));

        let err = submitter.execute(&log).await.unwrap_err();

        assert_eq!(
            err,
            MessagingError::Submission(LogError::Rejected("insufficient fee".into()))
        );
        assert!(!submitter.is_executed());
        assert!(eventually(|| log.subscriber_count() == 0).await);
    }

    #[tokio::test]
    async fn test_rejected_submission_routed_to_handler() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let (config, (_records, mut errors)) = observed(Duration::from_secs(1));
        let submitter = ConsensusSubmitter::new(envelope(8), topic, config).unwrap();
        log.reject_next_submission(LogError::Unavailable("node down".into()));

        assert_eq!(submitter.execute(&log).await, Ok(None));

        let err = timeout(WAIT, errors.recv()).await.unwrap().unwrap();
        assert_eq!(
            err,
            MessagingError::Submission(LogError::Unavailable("node down".into()))
        );
        assert!(eventually(|| log.subscriber_count() == 0).await);

        // Not executed, so a retry is allowed.
        let receipt = submitter.execute(&log).await.unwrap();
        assert!(receipt.is_some());
    }

    #[tokio::test]
    async fn test_missing_signer_never_reaches_log() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let handled = Arc::new(Mutex::new(0usize));
        let h = Arc::clone(&handled);
        let config = SubmitterConfig::builder()
            .on_error(move |_| *h.lock().unwrap() += 1)
            .build();
        let submitter = ConsensusSubmitter::new(envelope(9), topic, config).unwrap();

        let err = submitter.execute(&log).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            format!(
                "{PRECONDITION_PREFIX}a signer is required for an unsigned message, \
                 a transaction builder is required"
            )
        );
        assert_eq!(log.submissions(), 0);
        assert_eq!(*handled.lock().unwrap(), 0);
    }

    #[tokio::test]
    async fn test_concurrent_executes_submit_once() {
        let (log, topic) = lagging_log(Duration::ZERO);
        let (config, (mut records, _errors)) = observed(Duration::from_secs(1));
        let submitter = Arc::new(ConsensusSubmitter::new(envelope(10), topic, config).unwrap());

        let attempts = (0..8).map(|_| {
            let submitter = Arc::clone(&submitter);
            let log = log.clone();
            async move { submitter.execute(&log).await }
        });
        let results = join_all(attempts).await;

        let accepted = results.iter().filter(|r| matches!(r, Ok(Some(_)))).count();
        let refused = results
            .iter()
            .filter(|r| matches!(r, Err(MessagingError::Validation(_))))
            .count();
        assert_eq!(accepted, 1);
        assert_eq!(refused, 7);
        assert_eq!(log.submissions(), 1);

        timeout(WAIT, records.recv()).await.unwrap().unwrap();
        assert!(timeout(Duration::from_millis(100), records.recv()).await.is_err());
    }
}
