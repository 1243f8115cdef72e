//! 로그 프로세서 -- 배치 소비/평가/통계 영속화/헬스체크
//!
//! [`LogProcessor`]는 전송 컨슈머에서 레코드를 끌어와 배치로 모으고,
//! 배치 크기 도달 또는 플러시 간격 경과 시(둘 중 먼저) 플러시합니다.
//! 플러시된 배치의 각 레코드는 평가기로 전달되며, 레코드 한 건의 평가
//! panic은 그 레코드의 실패로만 카운트되고 배치나 스트림을 중단하지
//! 않습니다.
//!
//! 배치 처리 후 [`LogStats`]가 상태 저장소에 영속화됩니다. 영속화
//! 실패는 재시도 후 경고로 강등됩니다 -- 통계는 best-effort이고,
//! 알림 평가는 통계 실패로 롤백되지 않습니다.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use chrono::{DateTime, TimeDelta, Utc};
use metrics::{counter, gauge, histogram};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use logwarden_core::metrics as metric_names;
use logwarden_core::types::{Alert, HealthStatus, LogEntry, LogStats};

use crate::config::ProcessorConfig;
use crate::engine::LogEvaluator;
use crate::error::AlertEngineError;
use crate::state::StateStore;
use crate::transport::TransportConsumer;

/// 프로세서 처리 카운터
///
/// 배치마다 원자적으로 갱신되며, [`snapshot`](ProcessorMetrics::snapshot)
/// 으로 일관된 읽기 전용 뷰를 얻습니다.
#[derive(Debug, Default)]
pub struct ProcessorMetrics {
    processed: AtomicU64,
    failed: AtomicU64,
    last_processed: RwLock<Option<DateTime<Utc>>>,
}

impl ProcessorMetrics {
    fn record_batch(&self, processed: u64, failed: u64) {
        self.processed.fetch_add(processed, Ordering::Relaxed);
        self.failed.fetch_add(failed, Ordering::Relaxed);
        let mut last = self
            .last_processed
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *last = Some(Utc::now());
    }

    fn record_failure(&self, failed: u64) {
        self.failed.fetch_add(failed, Ordering::Relaxed);
    }

    /// 현재 카운터의 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> ProcessorMetricsSnapshot {
        let processed = self.processed.load(Ordering::Relaxed);
        let failed = self.failed.load(Ordering::Relaxed);
        let total = processed + failed;
        let error_rate = if total > 0 {
            failed as f64 / total as f64
        } else {
            0.0
        };
        let last_processed = *self
            .last_processed
            .read()
            .unwrap_or_else(PoisonError::into_inner);

        ProcessorMetricsSnapshot {
            messages_processed: processed,
            messages_failure: failed,
            error_rate,
            last_processed,
        }
    }
}

/// 프로세서 카운터 스냅샷
#[derive(Debug, Clone, Serialize)]
pub struct ProcessorMetricsSnapshot {
    /// 처리 성공한 레코드 수
    pub messages_processed: u64,
    /// 처리 실패한 레코드 수
    pub messages_failure: u64,
    /// 에러율 (failure / (processed + failure))
    pub error_rate: f64,
    /// 마지막 배치 처리 시각
    pub last_processed: Option<DateTime<Utc>>,
}

/// select! 한 바퀴의 결과
enum Step {
    Cancelled,
    FlushTick,
    Fetched(Result<Option<LogEntry>, AlertEngineError>),
}

/// 로그 프로세서
///
/// # 사용 예시
/// ```ignore
/// use logwarden_alert_engine::{AlertEngine, ProcessorBuilder};
///
/// let (mut processor, alert_rx) =
///     ProcessorBuilder::new(consumer, store, Arc::new(engine)).build()?;
///
/// let cancel = CancellationToken::new();
/// processor.process_logs(cancel).await?;
/// ```
pub struct LogProcessor<C, S, E> {
    consumer: C,
    store: S,
    engine: Arc<E>,
    config: ProcessorConfig,
    metrics: Arc<ProcessorMetrics>,
    stats: LogStats,
    alert_tx: mpsc::Sender<Alert>,
}

impl<C, S, E> LogProcessor<C, S, E>
where
    C: TransportConsumer,
    S: StateStore,
    E: LogEvaluator,
{
    /// 취소되거나 전송 계층이 닫힐 때까지 레코드 스트림을 처리합니다.
    ///
    /// 취소는 레코드 단위로 관찰되므로 종료 지연은 레코드 한 건의 평가
    /// 시간으로 제한됩니다. 취소 시 진행 중인 부분 배치는 best-effort로
    /// 플러시됩니다.
    pub async fn process_logs(
        &mut self,
        cancel: CancellationToken,
    ) -> Result<(), AlertEngineError> {
        tracing::info!(
            batch_size = self.config.batch_size,
            flush_interval_secs = self.config.flush_interval_secs,
            "starting log processor"
        );

        let flush_interval = self.config.flush_interval();
        let mut batch: Vec<LogEntry> = Vec::with_capacity(self.config.batch_size);
        let mut deadline = tokio::time::Instant::now() + flush_interval;

        loop {
            let step = tokio::select! {
                _ = cancel.cancelled() => Step::Cancelled,
                _ = tokio::time::sleep_until(deadline), if !batch.is_empty() => Step::FlushTick,
                fetched = self.consumer.fetch() => Step::Fetched(fetched),
            };

            match step {
                Step::Cancelled => {
                    tracing::info!(pending = batch.len(), "cancellation observed, draining");
                    self.flush_batch(&mut batch).await;
                    self.consumer.close().await;
                    return Ok(());
                }
                Step::FlushTick => {
                    self.flush_batch(&mut batch).await;
                }
                Step::Fetched(Ok(Some(entry))) => {
                    if batch.is_empty() {
                        deadline = tokio::time::Instant::now() + flush_interval;
                    }
                    batch.push(self.normalize(entry));
                    if batch.len() >= self.config.batch_size {
                        self.flush_batch(&mut batch).await;
                    }
                }
                Step::Fetched(Ok(None)) => {
                    tracing::info!(pending = batch.len(), "transport closed, draining");
                    self.flush_batch(&mut batch).await;
                    return Ok(());
                }
                Step::Fetched(Err(err)) => {
                    // 일시적 전송/디코딩 에러 -- 레코드 한 건의 실패로 카운트
                    self.metrics.record_failure(1);
                    if self.config.enable_metrics {
                        counter!(metric_names::PROCESSOR_FAILURES_TOTAL).increment(1);
                    }
                    tracing::warn!(error = %err, "failed to fetch record, continuing");
                }
            }
        }
    }

    /// 레벨이 비어 있으면 기본 레벨을 적용합니다.
    fn normalize(&self, mut entry: LogEntry) -> LogEntry {
        if entry.level.is_empty() {
            entry.level = self.config.default_log_level.clone();
        }
        entry
    }

    /// 배치를 평가기에 플러시합니다.
    ///
    /// 레코드별 평가 panic은 복구되어 그 레코드의 실패로만 카운트됩니다.
    async fn flush_batch(&mut self, batch: &mut Vec<LogEntry>) {
        if batch.is_empty() {
            return;
        }

        let started = std::time::Instant::now();
        let size = batch.len() as u64;
        let mut failed = 0u64;
        let mut alerts = Vec::new();

        for entry in batch.drain(..) {
            let engine = Arc::clone(&self.engine);
            match catch_unwind(AssertUnwindSafe(|| engine.evaluate_log(&entry))) {
                Ok(mut fired) => {
                    self.stats.record(&entry);
                    alerts.append(&mut fired);
                }
                Err(_) => {
                    failed += 1;
                    tracing::error!(
                        entry = %entry,
                        "record evaluation panicked, record skipped"
                    );
                }
            }
        }

        let processed = size - failed;
        self.metrics.record_batch(processed, failed);

        for alert in alerts {
            match self.alert_tx.try_send(alert) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(alert)) => {
                    counter!(metric_names::PROCESSOR_ALERTS_DROPPED_TOTAL).increment(1);
                    tracing::warn!(
                        rule_id = %alert.rule_id,
                        "alert channel full, alert dropped"
                    );
                }
                Err(mpsc::error::TrySendError::Closed(alert)) => {
                    tracing::warn!(
                        rule_id = %alert.rule_id,
                        "alert channel closed, alert dropped"
                    );
                }
            }
        }

        self.persist_stats().await;

        if self.config.enable_metrics {
            counter!(metric_names::PROCESSOR_BATCHES_FLUSHED_TOTAL).increment(1);
            counter!(metric_names::PROCESSOR_LOGS_PROCESSED_TOTAL).increment(processed);
            if failed > 0 {
                counter!(metric_names::PROCESSOR_FAILURES_TOTAL).increment(failed);
            }
            histogram!(metric_names::PROCESSOR_BATCH_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
            gauge!(metric_names::PROCESSOR_ERROR_RATE).set(self.metrics.snapshot().error_rate);
        }

        tracing::debug!(size, failed, "batch flushed");
    }

    /// 누적 통계를 상태 저장소에 영속화합니다.
    ///
    /// 재시도 소진 후에는 경고를 남기고 계속 진행합니다.
    async fn persist_stats(&mut self) {
        self.stats.last_updated = Utc::now();

        let mut attempt = 0u32;
        loop {
            match self.store.save_log_stats(&self.stats).await {
                Ok(()) => return,
                Err(err) if attempt < self.config.retry_attempts => {
                    attempt += 1;
                    counter!(metric_names::STORE_WRITE_RETRIES_TOTAL).increment(1);
                    tracing::warn!(
                        attempt,
                        max = self.config.retry_attempts,
                        error = %err,
                        "stats persistence failed, retrying"
                    );
                    tokio::time::sleep(self.config.retry_delay() * attempt).await;
                }
                Err(err) => {
                    counter!(metric_names::STORE_WRITE_FAILURES_TOTAL).increment(1);
                    tracing::warn!(
                        error = %err,
                        "stats persistence failed, continuing without persistence"
                    );
                    return;
                }
            }
        }
    }

    /// 프로세서 카운터의 스냅샷을 반환합니다.
    pub fn metrics(&self) -> ProcessorMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// 카운터 핸들을 반환합니다. 실행 중인 프로세서를 외부에서 관찰할 때
    /// 사용합니다.
    pub fn metrics_handle(&self) -> Arc<ProcessorMetrics> {
        Arc::clone(&self.metrics)
    }

    /// 누적 로그 통계를 반환합니다.
    pub fn stats(&self) -> &LogStats {
        &self.stats
    }

    /// 프로세서 건강 상태를 판정합니다.
    ///
    /// 에러율이 임계값을 넘거나 라이브니스 윈도우 안에 처리가 없으면
    /// 비정상, 전송 컨슈머가 비정상을 보고하면 성능 저하로 판정합니다.
    pub fn health_check(&self) -> HealthStatus {
        let snapshot = self.metrics.snapshot();

        if snapshot.error_rate > self.config.max_error_rate {
            return HealthStatus::Unhealthy(format!(
                "error rate {:.1}% exceeds threshold {:.1}%",
                snapshot.error_rate * 100.0,
                self.config.max_error_rate * 100.0
            ));
        }

        match snapshot.last_processed {
            Some(last) => {
                let idle = Utc::now() - last;
                if idle > TimeDelta::seconds(self.config.liveness_window_secs as i64) {
                    return HealthStatus::Unhealthy(format!(
                        "no records processed in the last {}s",
                        self.config.liveness_window_secs
                    ));
                }
            }
            None => {
                return HealthStatus::Degraded("no records processed yet".to_owned());
            }
        }

        if !self.consumer.health_check() {
            return HealthStatus::Degraded("transport consumer reports unhealthy".to_owned());
        }

        HealthStatus::Healthy
    }
}

/// 로그 프로세서 빌더
///
/// 프로세서를 구성하고 알림 전달 채널을 생성합니다.
pub struct ProcessorBuilder<C, S, E> {
    consumer: C,
    store: S,
    engine: Arc<E>,
    config: ProcessorConfig,
    alert_tx: Option<mpsc::Sender<Alert>>,
}

impl<C, S, E> ProcessorBuilder<C, S, E>
where
    C: TransportConsumer,
    S: StateStore,
    E: LogEvaluator,
{
    /// 새 빌더를 생성합니다.
    pub fn new(consumer: C, store: S, engine: Arc<E>) -> Self {
        Self {
            consumer,
            store,
            engine,
            config: ProcessorConfig::default(),
            alert_tx: None,
        }
    }

    /// 프로세서 설정을 지정합니다.
    pub fn config(mut self, config: ProcessorConfig) -> Self {
        self.config = config;
        self
    }

    /// 외부 알림 전달 채널을 설정합니다.
    ///
    /// 설정하지 않으면 빌더가 새 채널을 생성합니다.
    pub fn alert_sender(mut self, tx: mpsc::Sender<Alert>) -> Self {
        self.alert_tx = Some(tx);
        self
    }

    /// 프로세서를 빌드합니다.
    ///
    /// # Returns
    /// - `LogProcessor`: 프로세서 인스턴스
    /// - `Option<mpsc::Receiver<Alert>>`: 알림 수신 채널
    ///   (외부 alert_sender를 설정한 경우 None)
    pub fn build(
        self,
    ) -> Result<(LogProcessor<C, S, E>, Option<mpsc::Receiver<Alert>>), AlertEngineError> {
        self.config.validate()?;

        let (alert_tx, alert_rx) = if let Some(tx) = self.alert_tx {
            (tx, None)
        } else {
            let (tx, rx) = mpsc::channel(self.config.alert_channel_capacity);
            (tx, Some(rx))
        };

        let processor = LogProcessor {
            consumer: self.consumer,
            store: self.store,
            engine: self.engine,
            config: self.config,
            metrics: Arc::new(ProcessorMetrics::default()),
            stats: LogStats::default(),
            alert_tx,
        };

        Ok((processor, alert_rx))
    }
}
