//! 엔드투엔드 통합 테스트
//!
//! 채널 전송 -> 프로세서 -> 엔진 -> 전달 워커의 전체 흐름을 검증합니다.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logwarden_alert_engine::{
    AlertEngine, AlertRule, ChannelConsumer, ChannelDispatcher, DispatchWorker, FileRuleStore,
    MemoryStateStore, ProcessorBuilder, ProcessorConfigBuilder, RuleStore,
    rule::types::{AlertActions, AlertConditions, CompareOp},
};
use logwarden_core::types::{DeliveryStatus, Severity};

fn burst_rule(enabled: bool) -> AlertRule {
    AlertRule {
        id: "user-service-errors".to_owned(),
        name: "User Service Errors".to_owned(),
        description: "Repeated failures in user-service".to_owned(),
        enabled,
        conditions: AlertConditions {
            log_level: "ERROR".to_owned(),
            namespace: String::new(),
            service: "user-service".to_owned(),
            keywords: vec!["failed".to_owned(), "error".to_owned()],
            threshold: 3,
            time_window: Duration::from_secs(300),
            operator: CompareOp::Gt,
        },
        actions: AlertActions {
            channel: "#alerts".to_owned(),
            severity: Severity::High,
            webhook_url: String::new(),
        },
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

fn error_payload(index: usize) -> Bytes {
    Bytes::from(format!(
        r#"{{"level":"ERROR","message":"request {index} failed with status 500","service":"user-service","namespace":"production"}}"#
    ))
}

#[tokio::test]
async fn end_to_end_burst_produces_exactly_one_delivered_alert() {
    let engine = Arc::new(AlertEngine::with_rules(vec![burst_rule(true)]).unwrap());

    let (payload_tx, payload_rx) = mpsc::channel(64);
    let consumer = ChannelConsumer::new(payload_rx, "INFO");

    let config = ProcessorConfigBuilder::new()
        .batch_size(10)
        .flush_interval_secs(1)
        .build()
        .unwrap();

    let (mut processor, alert_rx) =
        ProcessorBuilder::new(consumer, MemoryStateStore::new(), Arc::clone(&engine))
            .config(config)
            .build()
            .unwrap();

    // 전달 워커: 전달된 알림을 그대로 수신 채널로 넘김
    let (delivered_tx, mut delivered_rx) = mpsc::channel(8);
    let worker = DispatchWorker::new(alert_rx.unwrap(), ChannelDispatcher::new(delivered_tx));
    let stats = worker.stats_handle();
    let worker_handle = tokio::spawn(worker.run());

    // 4건의 매칭 레코드 -- count=4 > 3에서 정확히 1회 발화
    for i in 0..4 {
        payload_tx.send(error_payload(i)).await.unwrap();
    }
    drop(payload_tx);

    processor.process_logs(CancellationToken::new()).await.unwrap();
    // 프로세서를 드롭해야 알림 채널이 닫혀 워커가 종료됨
    drop(processor);
    worker_handle.await.unwrap();

    let delivered = delivered_rx.recv().await.unwrap();
    assert_eq!(delivered.rule_id, "user-service-errors");
    assert_eq!(delivered.count, 4);
    assert_eq!(delivered.severity, Severity::High);
    assert!(delivered.message.contains("User Service Errors"));

    // 더 이상 전달된 알림이 없어야 함
    assert!(delivered_rx.recv().await.is_none());
    assert_eq!(stats.delivered(), 1);
    assert_eq!(stats.failed(), 0);

    // 엔진 상태도 활성으로 기록되어야 함
    let status = engine.alert_status("user-service-errors").unwrap();
    assert_eq!(status.count, 4);
}

#[tokio::test]
async fn disabled_rule_produces_zero_alerts_regardless_of_traffic() {
    let engine = Arc::new(AlertEngine::with_rules(vec![burst_rule(false)]).unwrap());

    let (payload_tx, payload_rx) = mpsc::channel(64);
    let consumer = ChannelConsumer::new(payload_rx, "INFO");

    let (mut processor, alert_rx) =
        ProcessorBuilder::new(consumer, MemoryStateStore::new(), Arc::clone(&engine))
            .build()
            .unwrap();
    let mut alert_rx = alert_rx.unwrap();

    for i in 0..20 {
        payload_tx.send(error_payload(i)).await.unwrap();
    }
    drop(payload_tx);

    processor.process_logs(CancellationToken::new()).await.unwrap();

    assert!(alert_rx.try_recv().is_err());
    assert!(engine.alert_status("user-service-errors").is_none());
    assert_eq!(processor.metrics().messages_processed, 20);
}

#[tokio::test]
async fn failed_delivery_is_counted_and_does_not_stop_processing() {
    let engine = Arc::new(AlertEngine::with_rules(vec![burst_rule(true)]).unwrap());

    let (payload_tx, payload_rx) = mpsc::channel(64);
    let consumer = ChannelConsumer::new(payload_rx, "INFO");

    let (mut processor, alert_rx) =
        ProcessorBuilder::new(consumer, MemoryStateStore::new(), Arc::clone(&engine))
            .build()
            .unwrap();

    // 전달 채널의 수신측을 닫아 전달이 항상 실패하게 만든다
    let (delivered_tx, delivered_rx) = mpsc::channel(1);
    drop(delivered_rx);
    let (outcome_tx, mut outcome_rx) = mpsc::channel(8);
    let worker = DispatchWorker::new(alert_rx.unwrap(), ChannelDispatcher::new(delivered_tx))
        .with_policy(logwarden_alert_engine::DispatchPolicy {
            retry_attempts: 1,
            retry_delay: Duration::from_millis(1),
        })
        .with_outcome_sender(outcome_tx);
    let stats = worker.stats_handle();
    let worker_handle = tokio::spawn(worker.run());

    for i in 0..4 {
        payload_tx.send(error_payload(i)).await.unwrap();
    }
    drop(payload_tx);

    processor.process_logs(CancellationToken::new()).await.unwrap();

    // 전달 실패와 무관하게 모든 레코드가 처리되었어야 함
    assert_eq!(processor.metrics().messages_processed, 4);

    drop(processor);
    worker_handle.await.unwrap();

    let terminal = outcome_rx.recv().await.unwrap();
    assert_eq!(terminal.status, DeliveryStatus::Failed);
    assert_eq!(stats.failed(), 1);
}

#[tokio::test]
async fn rules_loaded_from_file_drive_the_pipeline() {
    // 규칙 세트를 파일에 저장했다가 다시 로드하여 엔진에 설치
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("rules.json");
    let rule_store = FileRuleStore::new(&path);

    let original = burst_rule(true);
    rule_store.save_rules(&[original.clone()]).await.unwrap();

    let loaded = rule_store.load_rules().await.unwrap();
    assert_eq!(loaded, vec![original]);

    let engine = Arc::new(AlertEngine::with_rules(loaded).unwrap());

    let (payload_tx, payload_rx) = mpsc::channel(16);
    let consumer = ChannelConsumer::new(payload_rx, "INFO");

    let (mut processor, alert_rx) =
        ProcessorBuilder::new(consumer, MemoryStateStore::new(), Arc::clone(&engine))
            .build()
            .unwrap();
    let mut alert_rx = alert_rx.unwrap();

    for i in 0..4 {
        payload_tx.send(error_payload(i)).await.unwrap();
    }
    drop(payload_tx);
    processor.process_logs(CancellationToken::new()).await.unwrap();

    let alert = alert_rx.recv().await.unwrap();
    assert_eq!(alert.rule_id, "user-service-errors");
}

#[tokio::test]
async fn rule_swap_takes_effect_without_restarting_the_pipeline() {
    let engine = Arc::new(AlertEngine::with_rules(vec![burst_rule(true)]).unwrap());

    let (payload_tx, payload_rx) = mpsc::channel(64);
    let consumer = ChannelConsumer::new(payload_rx, "INFO");

    let (mut processor, alert_rx) =
        ProcessorBuilder::new(consumer, MemoryStateStore::new(), Arc::clone(&engine))
            .build()
            .unwrap();
    let mut alert_rx = alert_rx.unwrap();

    let cancel = CancellationToken::new();
    let cancel_clone = cancel.clone();
    let handle = tokio::spawn(async move {
        let result = processor.process_logs(cancel_clone).await;
        (processor, result)
    });

    // 실행 중에 규칙을 비활성 버전으로 교체
    engine.install_rules(vec![burst_rule(false)]).unwrap();

    for i in 0..10 {
        payload_tx.send(error_payload(i)).await.unwrap();
    }
    tokio::time::sleep(Duration::from_millis(1500)).await;

    cancel.cancel();
    let (processor, result) = handle.await.unwrap();
    result.unwrap();

    // 교체된 스냅샷이 적용되어 어떤 알림도 발화하지 않아야 함
    assert!(alert_rx.try_recv().is_err());
    assert_eq!(processor.metrics().messages_processed, 10);
}
