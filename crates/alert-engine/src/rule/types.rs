//! 알림 규칙 데이터 타입
//!
//! JSON 규칙 세트 문서에서 역직렬화되는 구조체들을 정의합니다.
//!
//! # JSON 스키마
//! ```json
//! {
//!   "id": "high-error-rate",
//!   "name": "High Error Rate",
//!   "description": "Alert on application errors",
//!   "enabled": true,
//!   "conditions": {
//!     "log_level": "ERROR",
//!     "namespace": "production",
//!     "service": "user-service",
//!     "keywords": ["failed", "timeout"],
//!     "threshold": 5,
//!     "time_window": 300000000000,
//!     "operator": "gt"
//!   },
//!   "actions": {
//!     "channel": "#alerts",
//!     "severity": "high",
//!     "webhook_url": "https://hooks.example.com/T000/B000"
//!   },
//!   "created_at": "2025-06-01T12:00:00Z",
//!   "updated_at": "2025-06-01T12:00:00Z"
//! }
//! ```
//!
//! `time_window`는 기존 규칙 파일과의 호환을 위해 나노초 정수로
//! 직렬화됩니다 ([`duration_nanos`] 참조).

use std::time::Duration;

use chrono::{DateTime, Utc};
use logwarden_core::types::Severity;
use serde::{Deserialize, Serialize};

use crate::error::AlertEngineError;

/// 임계값 비교 연산자
///
/// 윈도우 내 매칭 수 `count`를 규칙의 `threshold`와 비교합니다.
/// 미지정 시 기본값은 `Gt`입니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompareOp {
    /// count > threshold (기본값)
    #[default]
    Gt,
    /// count >= threshold
    Gte,
    /// count < threshold
    Lt,
    /// count <= threshold
    Lte,
    /// count == threshold
    Eq,
}

impl CompareOp {
    /// 비교 결과를 반환합니다.
    pub fn holds(self, count: u32, threshold: u32) -> bool {
        match self {
            Self::Gt => count > threshold,
            Self::Gte => count >= threshold,
            Self::Lt => count < threshold,
            Self::Lte => count <= threshold,
            Self::Eq => count == threshold,
        }
    }

    /// 직렬화 시 사용되는 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Gt => "gt",
            Self::Gte => "gte",
            Self::Lt => "lt",
            Self::Lte => "lte",
            Self::Eq => "eq",
        }
    }
}

/// 알림 트리거 조건
///
/// `log_level`/`namespace`/`service`는 빈 문자열이면 모든 값에 매칭됩니다.
/// `keywords`가 비어 있지 않으면 메시지가 키워드 중 **하나 이상**을
/// 대소문자 무시 부분 문자열로 포함해야 합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertConditions {
    /// 매칭할 로그 레벨 (빈 문자열 = 모든 레벨)
    #[serde(default)]
    pub log_level: String,
    /// 매칭할 네임스페이스 (빈 문자열 = 모든 네임스페이스)
    #[serde(default)]
    pub namespace: String,
    /// 매칭할 서비스 (빈 문자열 = 모든 서비스)
    #[serde(default)]
    pub service: String,
    /// 메시지 키워드 목록 (OR 결합, 대소문자 무시)
    #[serde(default)]
    pub keywords: Vec<String>,
    /// 임계값
    pub threshold: u32,
    /// 시간 윈도우 (와이어 형식: 나노초 정수)
    #[serde(with = "duration_nanos")]
    pub time_window: Duration,
    /// 비교 연산자
    #[serde(default)]
    pub operator: CompareOp,
}

/// 알림 트리거 시 수행할 액션
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlertActions {
    /// 알림 채널 (예: "#alerts")
    #[serde(default)]
    pub channel: String,
    /// 심각도 (미지정 시 medium)
    #[serde(default)]
    pub severity: Severity,
    /// 전달 대상 웹훅 URL
    #[serde(default)]
    pub webhook_url: String,
}

/// 알림 규칙
///
/// 엔진 관점에서 불변 값 객체입니다. 수정은 규칙 전체 교체로 이루어지며
/// 식별자는 `id`입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRule {
    /// 규칙 고유 ID (규칙 세트 내에서 유일해야 함)
    pub id: String,
    /// 규칙 이름 (알림에 표시)
    pub name: String,
    /// 규칙 설명
    #[serde(default)]
    pub description: String,
    /// 활성화 여부 -- 비활성 규칙은 매치 테스트조차 수행되지 않습니다.
    pub enabled: bool,
    /// 트리거 조건
    pub conditions: AlertConditions,
    /// 트리거 액션
    pub actions: AlertActions,
    /// 생성 시각
    pub created_at: DateTime<Utc>,
    /// 수정 시각
    pub updated_at: DateTime<Utc>,
}

impl AlertRule {
    /// 규칙의 유효성을 검증합니다.
    ///
    /// 연산자와 심각도는 enum으로 표현되므로 역직렬화 단계에서 이미
    /// 거부되며, 여기서는 재검사하지 않습니다.
    pub fn validate(&self) -> Result<(), AlertEngineError> {
        if self.id.is_empty() {
            return Err(AlertEngineError::RuleValidation {
                rule_id: "(empty)".to_owned(),
                reason: "rule id must not be empty".to_owned(),
            });
        }

        if self.id.len() > 256 {
            return Err(AlertEngineError::RuleValidation {
                rule_id: self.id.clone(),
                reason: "rule id must not exceed 256 characters".to_owned(),
            });
        }

        if self.name.is_empty() {
            return Err(AlertEngineError::RuleValidation {
                rule_id: self.id.clone(),
                reason: "rule name must not be empty".to_owned(),
            });
        }

        if self.conditions.threshold == 0 {
            return Err(AlertEngineError::RuleValidation {
                rule_id: self.id.clone(),
                reason: "threshold must be greater than 0".to_owned(),
            });
        }

        if self.conditions.time_window.is_zero() {
            return Err(AlertEngineError::RuleValidation {
                rule_id: self.id.clone(),
                reason: "time window must be greater than 0".to_owned(),
            });
        }

        Ok(())
    }
}

/// `Duration`을 나노초 정수로 직렬화하는 serde 모듈
///
/// 기존 규칙 파일의 `time_window` 필드(int64 나노초)와 바이트 단위로
/// 호환됩니다.
pub mod duration_nanos {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    /// `Duration`을 나노초 정수로 직렬화합니다.
    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let nanos = u64::try_from(value.as_nanos()).unwrap_or(u64::MAX);
        serializer.serialize_u64(nanos)
    }

    /// 나노초 정수에서 `Duration`을 역직렬화합니다.
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let nanos = u64::deserialize(deserializer)?;
        Ok(Duration::from_nanos(nanos))
    }
}
