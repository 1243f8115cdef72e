//! 알림 전달 -- fire-and-observe 전달 워커
//!
//! 전달 전송(웹훅/HTTP 푸시)은 외부 협력자이며, 엔진/프로세서는
//! [`AlertDispatcher`] trait을 통해서만 의존합니다. [`DispatchWorker`]는
//! 알림 채널을 소유하고 배치 루프 밖에서 전달을 수행하므로, 느린
//! 전달이 수집을 굶기지 않습니다.
//!
//! 전달 실패는 제한된 재시도 후 알림을 `Failed`로 표시하고 카운트할 뿐,
//! 이후 평가를 막지 않습니다.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use metrics::{counter, histogram};
use tokio::sync::mpsc;

use logwarden_core::metrics as metric_names;
use logwarden_core::types::{Alert, DeliveryStatus};

use crate::error::AlertEngineError;

/// 알림 전달자 계약
#[allow(async_fn_in_trait)]
pub trait AlertDispatcher: Send + Sync {
    /// 알림 한 건을 전달합니다.
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertEngineError>;
}

/// 전달 재시도 정책
///
/// 저장소 쓰기 재시도와 같은 형태(횟수 × 선형 증가 간격)를 사용합니다.
#[derive(Debug, Clone)]
pub struct DispatchPolicy {
    /// 최초 시도 이후 재시도 횟수
    pub retry_attempts: u32,
    /// 재시도 간격 (시도 횟수에 비례해 증가)
    pub retry_delay: Duration,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self {
            retry_attempts: 3,
            retry_delay: Duration::from_secs(1),
        }
    }
}

/// 전달 결과 카운터
#[derive(Debug, Default)]
pub struct DispatchStats {
    delivered: AtomicU64,
    failed: AtomicU64,
}

impl DispatchStats {
    /// 전달 성공 수를 반환합니다.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Relaxed)
    }

    /// 전달 실패 수를 반환합니다.
    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }
}

/// 알림 전달 워커
///
/// 알림 수신 채널을 소유하고, 수신한 알림을 전달자에 넘긴 뒤 결과를
/// 기록합니다. 종결 상태의 알림은 선택적 outcome 채널로 내보내져
/// 감사(audit) 용도로 소비될 수 있습니다.
pub struct DispatchWorker<D> {
    rx: mpsc::Receiver<Alert>,
    dispatcher: D,
    policy: DispatchPolicy,
    stats: Arc<DispatchStats>,
    outcome_tx: Option<mpsc::Sender<Alert>>,
}

impl<D: AlertDispatcher> DispatchWorker<D> {
    /// 새 전달 워커를 생성합니다.
    pub fn new(rx: mpsc::Receiver<Alert>, dispatcher: D) -> Self {
        Self {
            rx,
            dispatcher,
            policy: DispatchPolicy::default(),
            stats: Arc::new(DispatchStats::default()),
            outcome_tx: None,
        }
    }

    /// 재시도 정책을 설정합니다.
    pub fn with_policy(mut self, policy: DispatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// 종결 상태 알림을 내보낼 채널을 설정합니다.
    pub fn with_outcome_sender(mut self, tx: mpsc::Sender<Alert>) -> Self {
        self.outcome_tx = Some(tx);
        self
    }

    /// 전달 카운터 핸들을 반환합니다.
    pub fn stats_handle(&self) -> Arc<DispatchStats> {
        Arc::clone(&self.stats)
    }

    /// 알림 채널이 닫힐 때까지 전달 루프를 실행합니다.
    pub async fn run(mut self) {
        while let Some(mut alert) = self.rx.recv().await {
            let started = std::time::Instant::now();
            match self.deliver_with_retry(&alert).await {
                Ok(()) => {
                    alert.status = DeliveryStatus::Sent;
                    self.stats.delivered.fetch_add(1, Ordering::Relaxed);
                    counter!(metric_names::DISPATCH_ALERTS_SENT_TOTAL).increment(1);
                    tracing::info!(
                        alert_id = %alert.id,
                        rule_id = %alert.rule_id,
                        severity = %alert.severity,
                        "alert delivered"
                    );
                }
                Err(err) => {
                    alert.status = DeliveryStatus::Failed;
                    self.stats.failed.fetch_add(1, Ordering::Relaxed);
                    counter!(metric_names::DISPATCH_ALERTS_FAILED_TOTAL).increment(1);
                    tracing::warn!(
                        alert_id = %alert.id,
                        rule_id = %alert.rule_id,
                        error = %err,
                        "alert delivery failed"
                    );
                }
            }
            histogram!(metric_names::DISPATCH_DELIVERY_DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());

            if let Some(ref outcome_tx) = self.outcome_tx
                && outcome_tx.try_send(alert).is_err()
            {
                tracing::debug!("outcome channel full or closed, terminal alert dropped");
            }
        }

        tracing::debug!("alert channel closed, dispatch worker exiting");
    }

    async fn deliver_with_retry(&self, alert: &Alert) -> Result<(), AlertEngineError> {
        let mut attempt = 0u32;
        loop {
            match self.dispatcher.deliver(alert).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < self.policy.retry_attempts => {
                    attempt += 1;
                    tracing::debug!(
                        alert_id = %alert.id,
                        attempt,
                        max = self.policy.retry_attempts,
                        error = %err,
                        "delivery attempt failed, retrying"
                    );
                    tokio::time::sleep(self.policy.retry_delay * attempt).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// 채널 전달자
///
/// 알림을 mpsc 채널로 전달하는 참조 구현입니다. 테스트와 인프로세스
/// 임베딩(자체 전달 루프를 가진 호스트)에 사용됩니다.
pub struct ChannelDispatcher {
    tx: mpsc::Sender<Alert>,
}

impl ChannelDispatcher {
    /// 새 채널 전달자를 생성합니다.
    pub fn new(tx: mpsc::Sender<Alert>) -> Self {
        Self { tx }
    }
}

impl AlertDispatcher for ChannelDispatcher {
    async fn deliver(&self, alert: &Alert) -> Result<(), AlertEngineError> {
        self.tx
            .send(alert.clone())
            .await
            .map_err(|_| AlertEngineError::Delivery {
                alert_id: alert.id.clone(),
                reason: "delivery channel closed".to_owned(),
            })
    }
}
