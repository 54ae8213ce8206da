//! # Listener Ordering Flows
//!
//! Records published by several writers reach a listener in the log's total
//! order, with filters removing records but never reordering them.

#[cfg(test)]
mod tests {
    use crate::fixtures::{eventually, WAIT};
    use csl_02_topic_messaging::{ConsensusListener, MessagingError};
    use shared_log::{InMemoryLogConfig, InMemoryTopicLog, LogError, TopicLogClient, TopicRecord};
    use shared_types::Timestamp;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;
    use tokio::sync::mpsc;
    use tokio::time::timeout;

    async fn collect(rx: &mut mpsc::UnboundedReceiver<TopicRecord>, n: usize) -> Vec<TopicRecord> {
        let mut out = Vec::with_capacity(n);
        while out.len() < n {
            let record = timeout(WAIT, rx.recv())
                .await
                .expect("timed out waiting for records")
                .expect("listener channel closed");
            out.push(record);
        }
        out
    }

    // =========================================================================
    // ORDERING
    // =========================================================================

    #[tokio::test]
    async fn test_concurrent_writers_delivered_in_commit_order() {
        // Smaller than the burst, so the listener has to catch up from history.
        let log = InMemoryTopicLog::with_config(
            InMemoryLogConfig::default().with_channel_capacity(8),
        );
        let topic = log.create_topic().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = ConsensusListener::new(topic)
            .subscribe(&log, move |record, _| {
                let _ = tx.send(record.clone());
            })
            .await
            .unwrap();

        let writers: Vec<_> = (0..4u8)
            .map(|w| {
                let log = log.clone();
                tokio::spawn(async move {
                    for i in 0..25u8 {
                        log.submit(shared_log::SubmitTransaction::new(topic, vec![w, i]))
                            .await
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.await.unwrap();
        }

        let delivered = collect(&mut rx, 100).await;
        let sequences: Vec<u64> = delivered.iter().map(|r| r.sequence_number).collect();
        assert_eq!(sequences, (1..=100).collect::<Vec<_>>());
        assert!(delivered
            .windows(2)
            .all(|w| w[0].consensus_timestamp < w[1].consensus_timestamp));

        // Each writer's own messages keep their submission order.
        for w in 0..4u8 {
            let own: Vec<u8> = delivered
                .iter()
                .filter(|r| r.contents[0] == w)
                .map(|r| r.contents[1])
                .collect();
            assert_eq!(own, (0..25).collect::<Vec<_>>());
        }
        handle.unsubscribe();
    }

    #[tokio::test]
    async fn test_history_and_live_records_form_one_sequence() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();
        for i in 0..5u8 {
            log.publish_raw(topic, vec![i], true).unwrap();
        }

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = ConsensusListener::new(topic)
            .subscribe(&log, move |record, _| {
                let _ = tx.send(record.sequence_number);
            })
            .await
            .unwrap();

        for i in 5..10u8 {
            log.publish_raw(topic, vec![i], true).unwrap();
        }

        let mut got = Vec::new();
        while got.len() < 10 {
            got.push(timeout(WAIT, rx.recv()).await.unwrap().unwrap());
        }
        assert_eq!(got, (1..=10).collect::<Vec<u64>>());
    }

    #[tokio::test]
    async fn test_start_time_skips_older_records() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();
        let first = log.publish_raw(topic, b"old".to_vec(), true).unwrap();
        let second = log.publish_raw(topic, b"new".to_vec(), true).unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = ConsensusListener::new(topic)
            .start_time(first.consensus_timestamp.next())
            .subscribe(&log, move |record, _| {
                let _ = tx.send(record.clone());
            })
            .await
            .unwrap();

        let got = timeout(WAIT, rx.recv()).await.unwrap().unwrap();
        assert_eq!(got, second);
        assert!(timeout(Duration::from_millis(100), rx.recv()).await.is_err());
    }

    // =========================================================================
    // FILTERS AND VALIDATION
    // =========================================================================

    #[tokio::test]
    async fn test_filters_remove_without_reordering() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = ConsensusListener::new(topic)
            .filter(|r| r.contents[0] % 2 == 0)
            .filter(|r| r.contents[0] != 4)
            .subscribe(&log, move |record, _| {
                let _ = tx.send(record.contents[0]);
            })
            .await
            .unwrap();

        for i in 0..10u8 {
            log.publish_raw(topic, vec![i], true).unwrap();
        }

        let mut got = Vec::new();
        while got.len() < 4 {
            got.push(timeout(WAIT, rx.recv()).await.unwrap().unwrap());
        }
        assert_eq!(got, vec![0, 2, 6, 8]);
    }

    #[tokio::test]
    async fn test_invalid_records_go_to_invalid_handler_in_order() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();

        let delivered = Arc::new(Mutex::new(Vec::new()));
        let invalid = Arc::new(Mutex::new(Vec::new()));
        let (d, i) = (Arc::clone(&delivered), Arc::clone(&invalid));

        let _handle = ConsensusListener::new(topic)
            .validator(|r| {
                if r.contents == b"bad" {
                    Err("payload rejected".to_string())
                } else {
                    Ok(())
                }
            })
            .on_invalid_message(move |record, reason, _| {
                i.lock().unwrap().push((record.sequence_number, reason.to_string()));
            })
            .subscribe(&log, move |record, _| {
                d.lock().unwrap().push(record.sequence_number);
            })
            .await
            .unwrap();

        log.publish_raw(topic, b"ok".to_vec(), true).unwrap();
        log.publish_raw(topic, b"bad".to_vec(), true).unwrap();
        log.publish_raw(topic, b"ok".to_vec(), false).unwrap();
        log.publish_raw(topic, b"ok".to_vec(), true).unwrap();

        assert!(eventually(|| delivered.lock().unwrap().len() == 2).await);
        assert_eq!(*delivered.lock().unwrap(), vec![1, 4]);
        let invalid = invalid.lock().unwrap();
        assert_eq!(invalid.len(), 2);
        assert_eq!(invalid[0], (2, "payload rejected".to_string()));
        assert_eq!(invalid[1].0, 3);
    }

    // =========================================================================
    // CANCELLATION AND FAULTS
    // =========================================================================

    #[tokio::test]
    async fn test_no_delivery_after_unsubscribe_returns() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();

        let count = Arc::new(Mutex::new(0usize));
        let c = Arc::clone(&count);
        let handle = ConsensusListener::new(topic)
            .subscribe(&log, move |_, _| {
                *c.lock().unwrap() += 1;
            })
            .await
            .unwrap();

        log.publish_raw(topic, vec![1], true).unwrap();
        assert!(eventually(|| *count.lock().unwrap() == 1).await);

        handle.unsubscribe();
        assert!(!handle.is_active());
        for i in 0..10u8 {
            log.publish_raw(topic, vec![i], true).unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(*count.lock().unwrap(), 1);

        timeout(WAIT, handle.closed()).await.unwrap();
        assert!(eventually(|| log.subscriber_count() == 0).await);
    }

    #[tokio::test]
    async fn test_stream_fault_ends_subscription_once() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();

        let errors = Arc::new(Mutex::new(Vec::new()));
        let e = Arc::clone(&errors);
        let handle = ConsensusListener::new(topic)
            .on_error(move |err, _| e.lock().unwrap().push(err.clone()))
            .subscribe(&log, |_, _| {})
            .await
            .unwrap();

        assert!(eventually(|| log.subscriber_count() == 1).await);
        log.inject_stream_fault(topic, LogError::StreamFault("replica restarted".into()));

        timeout(WAIT, handle.closed()).await.unwrap();
        let errors = errors.lock().unwrap();
        assert_eq!(
            *errors,
            vec![MessagingError::Listener(LogError::StreamFault(
                "replica restarted".into()
            ))]
        );
    }

    #[tokio::test]
    async fn test_ignored_faults_keep_delivering() {
        let log = InMemoryTopicLog::new();
        let topic = log.create_topic().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = ConsensusListener::new(topic)
            .ignore_errors(true)
            .subscribe(&log, move |record, _| {
                let _ = tx.send(record.sequence_number);
            })
            .await
            .unwrap();

        assert!(eventually(|| log.subscriber_count() == 1).await);
        log.inject_stream_fault(topic, LogError::StreamFault("transient".into()));
        log.publish_raw(topic, vec![7], true).unwrap();

        assert_eq!(timeout(WAIT, rx.recv()).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn test_delayed_commits_still_arrive_in_order() {
        let log = InMemoryTopicLog::with_config(
            InMemoryLogConfig::default().with_commit_delay(Duration::from_millis(20)),
        );
        let topic = log.create_topic().unwrap();

        let (tx, mut rx) = mpsc::unbounded_channel();
        let _handle = ConsensusListener::new(topic)
            .start_time(Timestamp::EPOCH)
            .subscribe(&log, move |record, _| {
                let _ = tx.send(record.clone());
            })
            .await
            .unwrap();

        log.submit(shared_log::SubmitTransaction::new(topic, b"a".to_vec()))
            .await
            .unwrap();
        assert!(log.records(topic).is_empty());

        let got = collect(&mut rx, 1).await;
        assert_eq!(got[0].contents, b"a");
        assert_eq!(got[0].sequence_number, 1);
    }
}
