//! 기본 규칙 카탈로그 -- 제로 설정 시작점
//!
//! 숨겨진 전역 상태 없이, 명시적 설정 구조체를 받는 순수 팩토리
//! 함수들로 구성됩니다. 설정에 규칙 목록이 직접 주어지면 그 목록이
//! 그대로 반환되고, 없으면 기준 카탈로그(에러율, 데이터베이스 연결,
//! 메모리 경고)가 합성됩니다.

use std::time::Duration;

use chrono::Utc;
use logwarden_core::types::Severity;

use super::types::{AlertActions, AlertConditions, AlertRule, CompareOp};

/// 기본 규칙 생성 설정
#[derive(Debug, Clone)]
pub struct DefaultRulesConfig {
    /// 기본 규칙 생성 여부
    pub enabled: bool,
    /// 명시적 규칙 목록 (비어 있지 않으면 이 목록이 그대로 반환됨)
    pub rules: Vec<AlertRule>,
    /// 기본 임계값
    pub default_threshold: u32,
    /// 기본 시간 윈도우
    pub default_time_window: Duration,
    /// 기본 알림 채널
    pub default_channel: String,
    /// 기본 심각도
    pub default_severity: Severity,
}

impl Default for DefaultRulesConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
            default_threshold: 5,
            default_time_window: Duration::from_secs(300),
            default_channel: "#alerts".to_owned(),
            default_severity: Severity::Medium,
        }
    }
}

impl DefaultRulesConfig {
    /// core의 통합 설정에서 기본 규칙 설정을 생성합니다.
    pub fn from_core(core: &logwarden_core::config::LogwardenConfig) -> Self {
        Self {
            enabled: core.rules.enabled,
            rules: Vec::new(),
            default_threshold: core.rules.default_threshold,
            default_time_window: Duration::from_secs(core.rules.default_time_window_secs),
            default_channel: core.rules.default_channel.clone(),
            default_severity: Severity::from_str_loose(&core.rules.default_severity)
                .unwrap_or_default(),
        }
    }
}

/// 기본 설정으로 기준 규칙 카탈로그를 생성합니다.
pub fn default_rules() -> Vec<AlertRule> {
    default_rules_with_config(&DefaultRulesConfig::default())
}

/// 주어진 설정으로 기본 규칙을 생성합니다.
///
/// - `enabled`가 false면 빈 목록을 반환합니다.
/// - `rules`가 비어 있지 않으면 그 목록을 그대로 반환합니다.
/// - 그 외에는 기준 카탈로그를 합성합니다. 치명적 이슈용 규칙은
///   기본값보다 낮은 임계값/짧은 윈도우를(하한 포함), 경고성 규칙은
///   더 높은 임계값/긴 윈도우를 파생합니다.
pub fn default_rules_with_config(config: &DefaultRulesConfig) -> Vec<AlertRule> {
    if !config.enabled {
        return Vec::new();
    }

    if !config.rules.is_empty() {
        return config.rules.clone();
    }

    let now = Utc::now();

    vec![
        AlertRule {
            id: "default-error-alert".to_owned(),
            name: "Application Error Alert".to_owned(),
            description: "Alert on application errors".to_owned(),
            enabled: true,
            conditions: AlertConditions {
                log_level: "ERROR".to_owned(),
                namespace: String::new(),
                service: String::new(),
                keywords: Vec::new(),
                threshold: config.default_threshold,
                time_window: config.default_time_window,
                operator: CompareOp::Gt,
            },
            actions: AlertActions {
                channel: config.default_channel.clone(),
                severity: Severity::High,
                webhook_url: String::new(),
            },
            created_at: now,
            updated_at: now,
        },
        AlertRule {
            id: "default-database-alert".to_owned(),
            name: "Database Connection Issues".to_owned(),
            description: "Alert on database connection problems".to_owned(),
            enabled: true,
            conditions: AlertConditions {
                log_level: "ERROR".to_owned(),
                namespace: String::new(),
                service: String::new(),
                keywords: vec![
                    "database".to_owned(),
                    "connection".to_owned(),
                    "failed".to_owned(),
                ],
                threshold: config.default_threshold.saturating_sub(2).max(1),
                time_window: (config.default_time_window / 2).max(Duration::from_secs(120)),
                operator: CompareOp::Gt,
            },
            actions: AlertActions {
                channel: config.default_channel.clone(),
                severity: Severity::Critical,
                webhook_url: String::new(),
            },
            created_at: now,
            updated_at: now,
        },
        AlertRule {
            id: "default-memory-warning".to_owned(),
            name: "High Memory Usage Warning".to_owned(),
            description: "Alert on high memory usage warnings".to_owned(),
            enabled: true,
            conditions: AlertConditions {
                log_level: "WARN".to_owned(),
                namespace: String::new(),
                service: String::new(),
                keywords: vec!["memory".to_owned(), "usage".to_owned(), "high".to_owned()],
                threshold: config.default_threshold.saturating_mul(2).max(5),
                time_window: config
                    .default_time_window
                    .saturating_mul(2)
                    .max(Duration::from_secs(600)),
                operator: CompareOp::Gt,
            },
            actions: AlertActions {
                channel: config.default_channel.clone(),
                severity: config.default_severity,
                webhook_url: String::new(),
            },
            created_at: now,
            updated_at: now,
        },
    ]
}

/// 새 규칙 작성용 템플릿을 생성합니다.
///
/// `id`/`name`은 비어 있으므로 호출자가 채운 뒤 검증해야 합니다.
pub fn rule_template_with_config(config: &DefaultRulesConfig) -> AlertRule {
    let now = Utc::now();
    AlertRule {
        id: String::new(),
        name: String::new(),
        description: String::new(),
        enabled: true,
        conditions: AlertConditions {
            log_level: "ERROR".to_owned(),
            namespace: String::new(),
            service: String::new(),
            keywords: Vec::new(),
            threshold: config.default_threshold,
            time_window: config.default_time_window,
            operator: CompareOp::Gt,
        },
        actions: AlertActions {
            channel: config.default_channel.clone(),
            severity: config.default_severity,
            webhook_url: String::new(),
        },
        created_at: now,
        updated_at: now,
    }
}
