//! 도메인 타입 — 시스템 전역에서 사용되는 공통 타입
//!
//! 파이프라인의 모든 모듈이 공유하는 데이터 구조를 정의합니다.
//! 로그 수집 계층에서 들어오는 `LogEntry`, 규칙 평가 결과로 생성되는
//! `Alert`, 운영 상태를 나타내는 `AlertStatus`/`LogStats`가 여기에 있습니다.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 로그 엔트리
///
/// 전송 계층에서 수신한 구조화된 애플리케이션 로그 한 건을 나타냅니다.
/// 와이어 페이로드는 필드 일부가 빠질 수 있으므로 모든 필드에 serde
/// 기본값이 적용됩니다. 수신 이후에는 불변으로 취급합니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 로그 발생 시각 (누락 시 수신 시각)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    /// 로그 레벨 (DEBUG/INFO/WARN/ERROR/FATAL)
    #[serde(default)]
    pub level: String,
    /// 로그 메시지
    #[serde(default)]
    pub message: String,
    /// 네임스페이스 (멀티테넌트 클러스터의 테넌트 구분)
    #[serde(default)]
    pub namespace: String,
    /// 서비스명
    #[serde(default)]
    pub service: String,
    /// 호스트명
    #[serde(default)]
    pub host: String,
    /// 원본 페이로드 (디버깅용, 코덱이 채움)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    /// 추가 레이블 (key-value)
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}/{}: {}",
            self.level, self.host, self.namespace, self.service, self.message,
        )
    }
}

/// 심각도 레벨
///
/// 알림 액션의 심각도를 나타냅니다. `Ord` 구현으로 비교가 가능합니다
/// (`Low < Medium < High < Critical`). 미지정 시 기본값은 `Medium`입니다.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// 낮은 심각도
    Low,
    /// 중간 심각도 (기본값)
    #[default]
    Medium,
    /// 높은 심각도
    High,
    /// 치명적 — 즉시 대응 필요
    Critical,
}

impl Severity {
    /// 직렬화 시 사용되는 소문자 이름을 반환합니다.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    /// 문자열에서 심각도를 파싱합니다. 대소문자를 구분하지 않습니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" | "med" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" | "crit" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 알림 전달 상태
///
/// `Pending`으로 생성되어 전달 결과에 따라 `Sent` 또는 `Failed`로
/// 종결됩니다. 종결 상태에서 되돌아가지 않습니다.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    /// 전달 대기 중 (생성 직후)
    #[default]
    Pending,
    /// 전달 성공
    Sent,
    /// 전달 실패
    Failed,
}

/// 알림
///
/// 규칙의 임계값 조건이 충족되어 생성된 알림 한 건입니다.
/// 트리거 판정당 한 번 생성되며, 전달 결과에 따라 상태가 종결됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    /// 알림 고유 ID
    pub id: String,
    /// 트리거된 규칙 ID
    pub rule_id: String,
    /// 트리거된 규칙 이름
    pub rule_name: String,
    /// 트리거를 일으킨 로그 엔트리
    pub log_entry: LogEntry,
    /// 트리거 시각
    pub timestamp: DateTime<Utc>,
    /// 심각도 (규칙 액션에서 복사)
    pub severity: Severity,
    /// 전달 상태
    pub status: DeliveryStatus,
    /// 렌더링된 알림 메시지
    pub message: String,
    /// 트리거 시점의 윈도우 내 매칭 수
    pub count: u32,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} (rule: {}, count: {})",
            self.severity, self.rule_name, self.rule_id, self.count,
        )
    }
}

/// 규칙별 알림 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertState {
    /// 임계값 미달 (정상)
    Inactive,
    /// 임계값 충족으로 알림 발생 중
    Active,
}

/// 규칙별 최근 트리거 상태
///
/// 트리거 판정 때마다 엔진이 덮어쓰는 파생 데이터입니다.
/// 규칙당 하나만 유지됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertStatus {
    /// 규칙 ID
    pub rule_id: String,
    /// 마지막 트리거 시각
    pub last_trigger: DateTime<Utc>,
    /// 마지막 판정 시점의 윈도우 내 매칭 수
    pub count: u32,
    /// 현재 상태
    pub status: AlertState,
}

/// 로그 처리 통계
///
/// 배치 처리 후 갱신되어 상태 저장소에 영속화되는 단조 증가 카운터입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogStats {
    /// 처리된 전체 로그 수
    pub total_logs: u64,
    /// 레벨별 로그 수
    pub logs_by_level: HashMap<String, u64>,
    /// 서비스별 로그 수
    pub logs_by_service: HashMap<String, u64>,
    /// 마지막 갱신 시각
    pub last_updated: DateTime<Utc>,
}

impl Default for LogStats {
    fn default() -> Self {
        Self {
            total_logs: 0,
            logs_by_level: HashMap::new(),
            logs_by_service: HashMap::new(),
            last_updated: Utc::now(),
        }
    }
}

impl LogStats {
    /// 로그 엔트리 한 건을 통계에 반영합니다.
    ///
    /// 서비스명이 비어 있으면 서비스별 카운터는 건너뜁니다.
    pub fn record(&mut self, entry: &LogEntry) {
        self.total_logs += 1;
        if !entry.level.is_empty() {
            *self.logs_by_level.entry(entry.level.clone()).or_insert(0) += 1;
        }
        if !entry.service.is_empty() {
            *self
                .logs_by_service
                .entry(entry.service.clone())
                .or_insert(0) += 1;
        }
    }
}

/// 구성 요소 건강 상태
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// 정상
    Healthy,
    /// 성능 저하 (동작은 하지만 주의 필요)
    Degraded(String),
    /// 비정상
    Unhealthy(String),
}

impl HealthStatus {
    /// 정상 여부를 반환합니다.
    pub fn is_healthy(&self) -> bool {
        matches!(self, Self::Healthy)
    }

    /// 비정상 여부를 반환합니다.
    pub fn is_unhealthy(&self) -> bool {
        matches!(self, Self::Unhealthy(_))
    }
}
