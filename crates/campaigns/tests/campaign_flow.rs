//! End-to-end campaign flow over the in-memory store and transport.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tidypush_campaigns::CampaignRunner;
use tidypush_core::config::PushConfig;
use tidypush_core::types::{
    CleanLogEntry, DeviceSettings, ErrorDetails, Platform, Receipt, Recipient, TicketRef,
    TransportErrorCode,
};
use tidypush_delivery::MemoryTransport;
use tidypush_store::{InMemoryStore, RecipientStore};
use uuid::Uuid;

fn recipient(
    name: &str,
    is_premium: bool,
    days_since_active: i64,
    token: Option<&str>,
) -> Recipient {
    Recipient {
        id: Uuid::new_v4(),
        name: name.to_string(),
        is_premium,
        last_active_at: Utc::now() - Duration::days(days_since_active),
        device: DeviceSettings {
            push_token: token.map(String::from),
            platform: Platform::Ios,
            push_enabled: token.is_some(),
            token_updated_at: None,
        },
    }
}

fn runner(
    store: Arc<InMemoryStore>,
    transport: Arc<MemoryTransport>,
    max_batch_size: usize,
) -> CampaignRunner {
    CampaignRunner::new(
        store,
        transport,
        &PushConfig {
            max_batch_size,
            chunk_concurrency: 1,
            ..Default::default()
        },
    )
}

#[tokio::test]
async fn weekly_stats_flow_reports_aggregates() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(MemoryTransport::new());
    let now = Utc::now();

    let active = recipient("Active", false, 0, Some("ExponentPushToken[active]"));
    let active_id = active.id;
    store.insert_recipient(active);
    for (mb, files) in [(1250.5, 100), (890.2, 30), (159.3, 20)] {
        store.record_clean(CleanLogEntry {
            recipient_id: active_id,
            timestamp: now - Duration::days(2),
            space_freed_mb: mb,
            files_removed: files,
        });
    }
    // Premium and quiet recipients must not receive the digest.
    store.insert_recipient(recipient("Premium", true, 0, Some("ExponentPushToken[prem]")));
    store.insert_recipient(recipient("Quiet", false, 0, Some("ExponentPushToken[quiet]")));

    let outcome = runner(store, transport.clone(), 100)
        .run_weekly_stats(now)
        .await
        .unwrap();

    assert_eq!(outcome.attempted, 1);
    assert_eq!(outcome.tickets_ok, 1);

    let batches = transport.batches();
    assert_eq!(batches.len(), 1);
    let message = &batches[0][0];
    assert_eq!(message.to, "ExponentPushToken[active]");
    assert!(message.body.contains("2300.0MB"));
    assert!(message.body.contains("150 files"));
}

#[tokio::test]
async fn re_engagement_targets_dormant_and_rotates_variants() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(MemoryTransport::new());
    let now = Utc::now();

    for i in 0..4 {
        store.insert_recipient(recipient(
            &format!("Dormant {i}"),
            false,
            5,
            Some(&format!("ExponentPushToken[dormant-{i}]")),
        ));
    }
    store.insert_recipient(recipient("Fresh", false, 1, Some("ExponentPushToken[fresh]")));
    store.insert_recipient(recipient("Gone", false, 10, Some("ExponentPushToken[gone]")));

    let outcome = runner(store, transport.clone(), 100)
        .run_re_engagement(now)
        .await
        .unwrap();

    assert_eq!(outcome.attempted, 4);
    let batch = &transport.batches()[0];
    // Variants rotate by position: members 0 and 3 share copy, 0 and 1 differ.
    assert_eq!(batch[0].title, batch[3].title);
    assert_ne!(batch[0].title, batch[1].title);
}

#[tokio::test]
async fn partial_chunk_failure_is_reported_not_fatal() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(MemoryTransport::new());

    for i in 0..30 {
        store.insert_recipient(recipient(
            &format!("R{i}"),
            false,
            0,
            Some(&format!("ExponentPushToken[r-{i}]")),
        ));
    }
    transport.fail_send_call(1);

    let outcome = runner(store, transport, 10)
        .run_daily_reminders(Utc::now())
        .await
        .unwrap();

    assert_eq!(outcome.attempted, 30);
    assert_eq!(outcome.submitted, 20);
    assert_eq!(outcome.failed_tokens.len(), 10);
    assert_eq!(outcome.tickets_ok, 20);
}

#[tokio::test]
async fn device_invalid_receipt_purges_token_and_segment() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(MemoryTransport::new());
    let now = Utc::now();

    let doomed = recipient("Doomed", false, 5, Some("ExponentPushToken[doomed]"));
    let doomed_id = doomed.id;
    store.insert_recipient(doomed);

    let runner = runner(store.clone(), transport.clone(), 100);

    // First run reaches the dormant recipient.
    let outcome = runner.run_re_engagement(now).await.unwrap();
    assert_eq!(outcome.tickets_ok, 1);

    // The transport later reports the device as gone.
    transport.set_receipt(
        "ticket-0",
        Receipt::Error {
            message: Some("device gone".to_string()),
            details: Some(ErrorDetails {
                error: Some(TransportErrorCode::DeviceNotRegistered),
            }),
        },
    );
    let summary = runner
        .reconcile_receipts(&[TicketRef {
            id: "ticket-0".to_string(),
            recipient_id: doomed_id,
        }])
        .await
        .unwrap();
    assert_eq!(summary.error, 1);
    assert_eq!(summary.purged, vec![doomed_id]);

    // Token is gone from the store, so the next run excludes the recipient
    // even though the dormancy window still matches.
    let purged = store.get_recipient(doomed_id).await.unwrap().unwrap();
    assert!(purged.device.push_token.is_none());
    let rerun = runner.run_re_engagement(now).await.unwrap();
    assert_eq!(rerun.attempted, 0);
}

#[tokio::test]
async fn unknown_receipts_are_left_for_retry() {
    let store = Arc::new(InMemoryStore::new());
    let transport = Arc::new(MemoryTransport::new());

    let r = recipient("R", false, 0, Some("ExponentPushToken[r]"));
    let id = r.id;
    store.insert_recipient(r);

    let runner = runner(store.clone(), transport.clone(), 100);
    runner.run_daily_reminders(Utc::now()).await.unwrap();

    // No receipt scripted: lookup succeeds but has no answer for the id.
    let summary = runner
        .reconcile_receipts(&[TicketRef {
            id: "ticket-0".to_string(),
            recipient_id: id,
        }])
        .await
        .unwrap();
    assert_eq!(summary.unknown, 1);
    assert!(summary.purged.is_empty());

    // Token untouched.
    let untouched = store.get_recipient(id).await.unwrap().unwrap();
    assert!(untouched.device.push_token.is_some());
}
