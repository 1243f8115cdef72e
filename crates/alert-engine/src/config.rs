//! 로그 프로세서 설정
//!
//! [`ProcessorConfig`]는 core의 [`ProcessorSettings`](logwarden_core::config::ProcessorSettings)를
//! 기반으로 프로세서 전용 설정을 제공합니다.
//!
//! # 사용 예시
//! ```ignore
//! use logwarden_core::config::LogwardenConfig;
//! use logwarden_alert_engine::config::ProcessorConfig;
//!
//! let core_config = LogwardenConfig::default();
//! let config = ProcessorConfig::from_core(&core_config);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::DispatchPolicy;
use crate::error::AlertEngineError;

/// 로그 프로세서 설정
///
/// core의 `ProcessorSettings`/`HealthConfig`에서 파생되며,
/// 프로세서 내부에서 사용하는 추가 설정을 포함합니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorConfig {
    /// 배치 크기 (이 개수만큼 모이면 플러시)
    pub batch_size: usize,
    /// 배치 플러시 간격 (초, 배치의 첫 레코드 기준)
    pub flush_interval_secs: u64,
    /// 영속화 실패 시 재시도 횟수
    pub retry_attempts: u32,
    /// 재시도 간격 (밀리초, 시도 횟수에 비례해 증가)
    pub retry_delay_ms: u64,
    /// Prometheus 메트릭 방출 여부
    pub enable_metrics: bool,
    /// 전송 계층이 레벨을 제공하지 않을 때 적용할 기본 로그 레벨
    pub default_log_level: String,

    // --- 확장 설정 (core에 없는 추가 필드) ---
    /// 허용 가능한 최대 에러율 (헬스체크 임계값)
    pub max_error_rate: f64,
    /// 이 시간(초) 동안 처리가 없으면 비정상으로 판정
    pub liveness_window_secs: u64,
    /// 알림 전달 채널 용량
    pub alert_channel_capacity: usize,
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_secs: 5,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            enable_metrics: true,
            default_log_level: "INFO".to_owned(),
            max_error_rate: 0.1,
            liveness_window_secs: 300,
            alert_channel_capacity: 1024,
        }
    }
}

impl ProcessorConfig {
    /// core의 통합 설정에서 프로세서 설정을 생성합니다.
    pub fn from_core(core: &logwarden_core::config::LogwardenConfig) -> Self {
        Self {
            batch_size: core.processor.batch_size,
            flush_interval_secs: core.processor.flush_interval_secs,
            retry_attempts: core.processor.retry_attempts,
            retry_delay_ms: core.processor.retry_delay_ms,
            enable_metrics: core.processor.enable_metrics,
            default_log_level: core.processor.default_log_level.clone(),
            max_error_rate: core.health.max_error_rate,
            liveness_window_secs: core.health.liveness_window_secs,
            ..Self::default()
        }
    }

    /// 플러시 간격을 `Duration`으로 반환합니다.
    pub fn flush_interval(&self) -> Duration {
        Duration::from_secs(self.flush_interval_secs)
    }

    /// 재시도 간격을 `Duration`으로 반환합니다.
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// 전달 워커에 적용할 재시도 정책을 반환합니다.
    ///
    /// 저장소 쓰기와 동일한 재시도 설정을 공유합니다.
    pub fn dispatch_policy(&self) -> DispatchPolicy {
        DispatchPolicy {
            retry_attempts: self.retry_attempts,
            retry_delay: self.retry_delay(),
        }
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), AlertEngineError> {
        const MAX_BATCH_SIZE: usize = 100_000;
        const MAX_FLUSH_INTERVAL_SECS: u64 = 3600;

        if self.batch_size == 0 || self.batch_size > MAX_BATCH_SIZE {
            return Err(AlertEngineError::Config {
                field: "batch_size".to_owned(),
                reason: format!("must be 1-{MAX_BATCH_SIZE}"),
            });
        }

        if self.flush_interval_secs == 0 || self.flush_interval_secs > MAX_FLUSH_INTERVAL_SECS {
            return Err(AlertEngineError::Config {
                field: "flush_interval_secs".to_owned(),
                reason: format!("must be 1-{MAX_FLUSH_INTERVAL_SECS}"),
            });
        }

        if self.retry_delay_ms == 0 {
            return Err(AlertEngineError::Config {
                field: "retry_delay_ms".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.max_error_rate <= 0.0 || self.max_error_rate > 1.0 {
            return Err(AlertEngineError::Config {
                field: "max_error_rate".to_owned(),
                reason: "must be within (0.0, 1.0]".to_owned(),
            });
        }

        if self.liveness_window_secs == 0 {
            return Err(AlertEngineError::Config {
                field: "liveness_window_secs".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        if self.alert_channel_capacity == 0 {
            return Err(AlertEngineError::Config {
                field: "alert_channel_capacity".to_owned(),
                reason: "must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// 프로세서 설정 빌더
#[derive(Default)]
pub struct ProcessorConfigBuilder {
    config: ProcessorConfig,
}

impl ProcessorConfigBuilder {
    /// 새 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// 배치 크기를 설정합니다.
    pub fn batch_size(mut self, size: usize) -> Self {
        self.config.batch_size = size;
        self
    }

    /// 플러시 간격(초)을 설정합니다.
    pub fn flush_interval_secs(mut self, secs: u64) -> Self {
        self.config.flush_interval_secs = secs;
        self
    }

    /// 재시도 횟수를 설정합니다.
    pub fn retry_attempts(mut self, attempts: u32) -> Self {
        self.config.retry_attempts = attempts;
        self
    }

    /// 재시도 간격(밀리초)을 설정합니다.
    pub fn retry_delay_ms(mut self, ms: u64) -> Self {
        self.config.retry_delay_ms = ms;
        self
    }

    /// 메트릭 방출 여부를 설정합니다.
    pub fn enable_metrics(mut self, enabled: bool) -> Self {
        self.config.enable_metrics = enabled;
        self
    }

    /// 기본 로그 레벨을 설정합니다.
    pub fn default_log_level(mut self, level: impl Into<String>) -> Self {
        self.config.default_log_level = level.into();
        self
    }

    /// 최대 허용 에러율을 설정합니다.
    pub fn max_error_rate(mut self, rate: f64) -> Self {
        self.config.max_error_rate = rate;
        self
    }

    /// 라이브니스 윈도우(초)를 설정합니다.
    pub fn liveness_window_secs(mut self, secs: u64) -> Self {
        self.config.liveness_window_secs = secs;
        self
    }

    /// 알림 채널 용량을 설정합니다.
    pub fn alert_channel_capacity(mut self, capacity: usize) -> Self {
        self.config.alert_channel_capacity = capacity;
        self
    }

    /// 설정을 검증하고 `ProcessorConfig`를 생성합니다.
    pub fn build(self) -> Result<ProcessorConfig, AlertEngineError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
