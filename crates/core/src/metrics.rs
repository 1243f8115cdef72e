//! 메트릭 상수 및 설명 등록
//!
//! 모든 Prometheus 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 각 모듈은 이 상수를 사용하여 `metrics::counter!()`, `metrics::gauge!()`,
//! `metrics::histogram!()` 매크로를 호출합니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `logwarden_`
//! - 모듈명: `engine_`, `processor_`, `store_`, `dispatch_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency), 없음 (gauge)

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 로그 레벨 레이블 키
pub const LABEL_LEVEL: &str = "level";

/// 서비스 레이블 키
pub const LABEL_SERVICE: &str = "service";

/// 심각도 레이블 키 (low, medium, high, critical)
pub const LABEL_SEVERITY: &str = "severity";

/// 규칙 ID 레이블 키
pub const LABEL_RULE: &str = "rule";

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

// ─── Alert Engine 메트릭 ────────────────────────────────────────────

/// Engine: 현재 설치된 규칙 수 (gauge)
pub const ENGINE_RULES_LOADED: &str = "logwarden_engine_rules_loaded";

/// Engine: 규칙 매칭 수 (counter)
pub const ENGINE_RULE_MATCHES_TOTAL: &str = "logwarden_engine_rule_matches_total";

/// Engine: 트리거된 알림 수 (counter)
pub const ENGINE_ALERTS_TRIGGERED_TOTAL: &str = "logwarden_engine_alerts_triggered_total";

/// Engine: 중복 억제된 트리거 수 (counter)
pub const ENGINE_ALERTS_SUPPRESSED_TOTAL: &str = "logwarden_engine_alerts_suppressed_total";

/// Engine: 활성 매치 윈도우 수 (gauge)
pub const ENGINE_ACTIVE_WINDOWS: &str = "logwarden_engine_active_windows";

// ─── Log Processor 메트릭 ───────────────────────────────────────────

/// Processor: 처리 성공한 로그 수 (counter)
pub const PROCESSOR_LOGS_PROCESSED_TOTAL: &str = "logwarden_processor_logs_processed_total";

/// Processor: 처리 실패한 로그 수 (counter)
pub const PROCESSOR_FAILURES_TOTAL: &str = "logwarden_processor_failures_total";

/// Processor: 플러시된 배치 수 (counter)
pub const PROCESSOR_BATCHES_FLUSHED_TOTAL: &str = "logwarden_processor_batches_flushed_total";

/// Processor: 배치 처리 소요 시간 (histogram, 초)
pub const PROCESSOR_BATCH_DURATION_SECONDS: &str = "logwarden_processor_batch_duration_seconds";

/// Processor: 현재 에러율 (gauge, 0.0~1.0)
pub const PROCESSOR_ERROR_RATE: &str = "logwarden_processor_error_rate";

/// Processor: 채널 포화로 드롭된 알림 수 (counter)
pub const PROCESSOR_ALERTS_DROPPED_TOTAL: &str = "logwarden_processor_alerts_dropped_total";

// ─── State Store 메트릭 ─────────────────────────────────────────────

/// Store: 통계 쓰기 재시도 수 (counter)
pub const STORE_WRITE_RETRIES_TOTAL: &str = "logwarden_store_write_retries_total";

/// Store: 재시도 소진 후 포기한 쓰기 수 (counter)
pub const STORE_WRITE_FAILURES_TOTAL: &str = "logwarden_store_write_failures_total";

// ─── Dispatch 메트릭 ────────────────────────────────────────────────

/// Dispatch: 전달 성공한 알림 수 (counter)
pub const DISPATCH_ALERTS_SENT_TOTAL: &str = "logwarden_dispatch_alerts_sent_total";

/// Dispatch: 전달 실패한 알림 수 (counter)
pub const DISPATCH_ALERTS_FAILED_TOTAL: &str = "logwarden_dispatch_alerts_failed_total";

/// Dispatch: 알림 전달 소요 시간 (histogram, 초)
pub const DISPATCH_DELIVERY_DURATION_SECONDS: &str = "logwarden_dispatch_delivery_duration_seconds";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 배치 처리 지연 시간 히스토그램 버킷 (초)
///
/// 100us ~ 10s 범위, 로그 단위 분포
pub const BATCH_DURATION_BUCKETS: [f64; 10] = [
    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 10.0,
];

/// 알림 전달 지연 시간 히스토그램 버킷 (초)
///
/// 10ms ~ 30s 범위 (외부 웹훅 호출 포함)
pub const DELIVERY_DURATION_BUCKETS: [f64; 8] = [0.01, 0.05, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// `metrics::describe_counter!()`, `describe_gauge!()`, `describe_histogram!()`을
/// 호출하여 Prometheus HELP 텍스트를 설정합니다.
///
/// 이 함수는 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_gauge, describe_histogram};

    // Alert Engine
    describe_gauge!(ENGINE_RULES_LOADED, "Number of alert rules currently installed");
    describe_counter!(
        ENGINE_RULE_MATCHES_TOTAL,
        "Total number of log records matching a rule's conditions"
    );
    describe_counter!(
        ENGINE_ALERTS_TRIGGERED_TOTAL,
        "Total number of alerts triggered by threshold evaluation"
    );
    describe_counter!(
        ENGINE_ALERTS_SUPPRESSED_TOTAL,
        "Total number of triggers suppressed while an incident is already active"
    );
    describe_gauge!(
        ENGINE_ACTIVE_WINDOWS,
        "Number of per-rule match windows currently held in memory"
    );

    // Log Processor
    describe_counter!(
        PROCESSOR_LOGS_PROCESSED_TOTAL,
        "Total number of log records evaluated successfully"
    );
    describe_counter!(
        PROCESSOR_FAILURES_TOTAL,
        "Total number of records whose processing failed"
    );
    describe_counter!(
        PROCESSOR_BATCHES_FLUSHED_TOTAL,
        "Total number of batches flushed to the alert engine"
    );
    describe_histogram!(
        PROCESSOR_BATCH_DURATION_SECONDS,
        "Time to evaluate a single log batch in seconds"
    );
    describe_gauge!(
        PROCESSOR_ERROR_RATE,
        "Current processor error rate (failures / total)"
    );
    describe_counter!(
        PROCESSOR_ALERTS_DROPPED_TOTAL,
        "Total number of alerts dropped because the dispatch channel was full"
    );

    // State Store
    describe_counter!(
        STORE_WRITE_RETRIES_TOTAL,
        "Total number of retried state store writes"
    );
    describe_counter!(
        STORE_WRITE_FAILURES_TOTAL,
        "Total number of state store writes abandoned after exhausting retries"
    );

    // Dispatch
    describe_counter!(
        DISPATCH_ALERTS_SENT_TOTAL,
        "Total number of alerts delivered to the notification channel"
    );
    describe_counter!(
        DISPATCH_ALERTS_FAILED_TOTAL,
        "Total number of alerts whose delivery failed after retries"
    );
    describe_histogram!(
        DISPATCH_DELIVERY_DURATION_SECONDS,
        "Time to deliver a single alert in seconds"
    );
}
