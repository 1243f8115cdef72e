//! 설정 관리 — logwarden.toml 파싱 및 런타임 설정
//!
//! [`LogwardenConfig`]는 모든 모듈의 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. 환경변수 (`LOGWARDEN_PROCESSOR_BATCH_SIZE=200` 형식)
//! 2. 설정 파일 (`logwarden.toml`)
//! 3. 기본값 (`Default` 구현)
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), logwarden_core::error::LogwardenError> {
//! use logwarden_core::config::LogwardenConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = LogwardenConfig::load("logwarden.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = LogwardenConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, LogwardenError};

/// Logwarden 통합 설정
///
/// `logwarden.toml` 파일의 최상위 구조를 나타냅니다.
/// 각 모듈은 자기 섹션만 읽어 사용합니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogwardenConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 전송 계층(컨슈머) 설정
    #[serde(default)]
    pub transport: TransportConfig,
    /// 로그 프로세서 설정
    #[serde(default)]
    pub processor: ProcessorSettings,
    /// 헬스체크 임계값 설정
    #[serde(default)]
    pub health: HealthConfig,
    /// 규칙 로딩/기본값 설정
    #[serde(default)]
    pub rules: RulesConfig,
}

impl LogwardenConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, LogwardenError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                LogwardenError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                LogwardenError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, LogwardenError> {
        toml::from_str(toml_str).map_err(|e| {
            LogwardenError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `LOGWARDEN_{SECTION}_{FIELD}`
    /// 예: `LOGWARDEN_TRANSPORT_TOPIC=application-logs`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "LOGWARDEN_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "LOGWARDEN_GENERAL_LOG_FORMAT");

        // Transport
        override_csv(&mut self.transport.brokers, "LOGWARDEN_TRANSPORT_BROKERS");
        override_string(&mut self.transport.topic, "LOGWARDEN_TRANSPORT_TOPIC");
        override_string(&mut self.transport.group_id, "LOGWARDEN_TRANSPORT_GROUP_ID");
        override_u64(
            &mut self.transport.max_wait_secs,
            "LOGWARDEN_TRANSPORT_MAX_WAIT_SECS",
        );

        // Processor
        override_usize(
            &mut self.processor.batch_size,
            "LOGWARDEN_PROCESSOR_BATCH_SIZE",
        );
        override_u64(
            &mut self.processor.flush_interval_secs,
            "LOGWARDEN_PROCESSOR_FLUSH_INTERVAL_SECS",
        );
        override_u32(
            &mut self.processor.retry_attempts,
            "LOGWARDEN_PROCESSOR_RETRY_ATTEMPTS",
        );
        override_u64(
            &mut self.processor.retry_delay_ms,
            "LOGWARDEN_PROCESSOR_RETRY_DELAY_MS",
        );
        override_bool(
            &mut self.processor.enable_metrics,
            "LOGWARDEN_PROCESSOR_ENABLE_METRICS",
        );
        override_string(
            &mut self.processor.default_log_level,
            "LOGWARDEN_PROCESSOR_DEFAULT_LOG_LEVEL",
        );

        // Health
        override_f64(
            &mut self.health.max_error_rate,
            "LOGWARDEN_HEALTH_MAX_ERROR_RATE",
        );
        override_u64(
            &mut self.health.liveness_window_secs,
            "LOGWARDEN_HEALTH_LIVENESS_WINDOW_SECS",
        );

        // Rules
        override_bool(&mut self.rules.enabled, "LOGWARDEN_RULES_ENABLED");
        override_string(&mut self.rules.path, "LOGWARDEN_RULES_PATH");
        override_u32(
            &mut self.rules.default_threshold,
            "LOGWARDEN_RULES_DEFAULT_THRESHOLD",
        );
        override_u64(
            &mut self.rules.default_time_window_secs,
            "LOGWARDEN_RULES_DEFAULT_TIME_WINDOW_SECS",
        );
        override_string(
            &mut self.rules.default_channel,
            "LOGWARDEN_RULES_DEFAULT_CHANNEL",
        );
        override_string(
            &mut self.rules.default_severity,
            "LOGWARDEN_RULES_DEFAULT_SEVERITY",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), LogwardenError> {
        const MAX_BATCH_SIZE: usize = 100_000;
        const MAX_FLUSH_INTERVAL_SECS: u64 = 3600;

        if self.transport.brokers.is_empty() {
            return Err(invalid("transport.brokers", "must not be empty"));
        }
        if self.transport.topic.is_empty() {
            return Err(invalid("transport.topic", "must not be empty"));
        }
        if self.transport.group_id.is_empty() {
            return Err(invalid("transport.group_id", "must not be empty"));
        }

        if self.processor.batch_size == 0 || self.processor.batch_size > MAX_BATCH_SIZE {
            return Err(invalid(
                "processor.batch_size",
                &format!("must be 1-{MAX_BATCH_SIZE}"),
            ));
        }
        if self.processor.flush_interval_secs == 0
            || self.processor.flush_interval_secs > MAX_FLUSH_INTERVAL_SECS
        {
            return Err(invalid(
                "processor.flush_interval_secs",
                &format!("must be 1-{MAX_FLUSH_INTERVAL_SECS}"),
            ));
        }
        if self.processor.retry_delay_ms == 0 {
            return Err(invalid("processor.retry_delay_ms", "must be greater than 0"));
        }

        if self.health.max_error_rate <= 0.0 || self.health.max_error_rate > 1.0 {
            return Err(invalid(
                "health.max_error_rate",
                "must be within (0.0, 1.0]",
            ));
        }
        if self.health.liveness_window_secs == 0 {
            return Err(invalid(
                "health.liveness_window_secs",
                "must be greater than 0",
            ));
        }

        if self.rules.default_threshold == 0 {
            return Err(invalid("rules.default_threshold", "must be greater than 0"));
        }
        if self.rules.default_time_window_secs == 0 {
            return Err(invalid(
                "rules.default_time_window_secs",
                "must be greater than 0",
            ));
        }
        if crate::types::Severity::from_str_loose(&self.rules.default_severity).is_none() {
            return Err(invalid(
                "rules.default_severity",
                "must be one of: low, medium, high, critical",
            ));
        }

        Ok(())
    }
}

fn invalid(field: &str, reason: &str) -> LogwardenError {
    LogwardenError::Config(ConfigError::InvalidValue {
        field: field.to_owned(),
        reason: reason.to_owned(),
    })
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace/debug/info/warn/error)
    pub log_level: String,
    /// 로그 출력 형식 (text/json)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "text".to_owned(),
        }
    }
}

/// 전송 계층(컨슈머) 설정
///
/// 외부 전송 클라이언트가 소비하는 인터페이스 경계 설정입니다.
/// 프로세서 자체는 브로커에 직접 접속하지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// 브로커 주소 목록
    pub brokers: Vec<String>,
    /// 토픽/서브젝트 이름
    pub topic: String,
    /// 컨슈머 그룹 ID
    pub group_id: String,
    /// 레코드 폴링 최대 대기 시간 (초)
    pub max_wait_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            brokers: vec!["127.0.0.1:9094".to_owned()],
            topic: "application-logs".to_owned(),
            group_id: "logwarden-group".to_owned(),
            max_wait_secs: 2,
        }
    }
}

/// 로그 프로세서 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessorSettings {
    /// 배치 크기 (이 개수만큼 모이면 플러시)
    pub batch_size: usize,
    /// 배치 플러시 간격 (초, 배치의 첫 레코드 기준)
    pub flush_interval_secs: u64,
    /// 영속화 실패 시 재시도 횟수
    pub retry_attempts: u32,
    /// 재시도 간격 (밀리초)
    pub retry_delay_ms: u64,
    /// Prometheus 메트릭 방출 여부
    pub enable_metrics: bool,
    /// 전송 계층이 레벨을 제공하지 않을 때 적용할 기본 로그 레벨
    pub default_log_level: String,
}

impl Default for ProcessorSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            flush_interval_secs: 5,
            retry_attempts: 3,
            retry_delay_ms: 1000,
            enable_metrics: true,
            default_log_level: "INFO".to_owned(),
        }
    }
}

/// 헬스체크 임계값 설정
///
/// 임계값은 정책이 아니라 설정입니다. 운영 환경에 맞게 조정하십시오.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    /// 허용 가능한 최대 에러율 (0.0 초과 1.0 이하)
    pub max_error_rate: f64,
    /// 이 시간(초) 동안 레코드 처리가 없으면 비정상으로 판정
    pub liveness_window_secs: u64,
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            max_error_rate: 0.1,
            liveness_window_secs: 300,
        }
    }
}

/// 규칙 로딩/기본값 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RulesConfig {
    /// 기본 규칙 카탈로그 활성화 여부
    pub enabled: bool,
    /// 규칙 세트 문서 경로 (JSON)
    pub path: String,
    /// 기본 임계값
    pub default_threshold: u32,
    /// 기본 시간 윈도우 (초)
    pub default_time_window_secs: u64,
    /// 기본 알림 채널
    pub default_channel: String,
    /// 기본 심각도 (low/medium/high/critical)
    pub default_severity: String,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: "/etc/logwarden/rules.json".to_owned(),
            default_threshold: 5,
            default_time_window_secs: 300,
            default_channel: "#alerts".to_owned(),
            default_severity: "medium".to_owned(),
        }
    }
}

// ─── 환경변수 오버라이드 헬퍼 ───────────────────────────────────────

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(value) = std::env::var(env_key)
        && !value.is_empty()
    {
        *target = value;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.to_lowercase().as_str() {
            "true" | "1" | "yes" => *target = true,
            "false" | "0" | "no" => *target = false,
            _ => warn!(key = env_key, value, "ignoring invalid boolean env override"),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value, "ignoring invalid integer env override"),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value, "ignoring invalid integer env override"),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value, "ignoring invalid integer env override"),
        }
    }
}

fn override_f64(target: &mut f64, env_key: &str) {
    if let Ok(value) = std::env::var(env_key) {
        match value.parse() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(key = env_key, value, "ignoring invalid float env override"),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(value) = std::env::var(env_key)
        && !value.is_empty()
    {
        *target = value
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}
