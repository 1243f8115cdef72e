//! 알림 규칙 모듈 -- 모델, 검증, 필터/통계, 기본 카탈로그, 영속화
//!
//! # 구성
//! - [`types`]: 규칙 데이터 구조 및 유효성 검증
//! - [`defaults`]: 기본 규칙 카탈로그 팩토리
//! - [`loader`]: JSON 규칙 세트 문서 로딩/저장
//!
//! 필터링([`filter_rules`]), 집계([`rule_stats`]), ID 생성
//! ([`generate_rule_id`])은 부수 효과 없는 순수 함수입니다.

pub mod defaults;
pub mod loader;
pub mod types;

pub use defaults::{
    DefaultRulesConfig, default_rules, default_rules_with_config, rule_template_with_config,
};
pub use loader::{FileRuleStore, RuleSetDocument, RuleStore};
pub use types::{AlertActions, AlertConditions, AlertRule, CompareOp};

use std::collections::HashMap;

use logwarden_core::types::Severity;
use serde::{Deserialize, Serialize};

/// 규칙 필터 조건
///
/// 설정되지 않은 조건(None 또는 빈 문자열)은 모든 규칙에 매칭됩니다.
/// 설정된 조건은 모두 만족해야 합니다 (AND 결합).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuleFilter {
    /// 활성화 여부
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// 네임스페이스
    #[serde(default)]
    pub namespace: String,
    /// 서비스
    #[serde(default)]
    pub service: String,
    /// 심각도
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,
    /// 로그 레벨
    #[serde(default)]
    pub log_level: String,
}

/// 필터 조건에 맞는 규칙의 부분 집합을 반환합니다.
///
/// 입력 순서는 출력에서 유지됩니다.
pub fn filter_rules(rules: &[AlertRule], filter: &RuleFilter) -> Vec<AlertRule> {
    rules
        .iter()
        .filter(|rule| matches_filter(rule, filter))
        .cloned()
        .collect()
}

fn matches_filter(rule: &AlertRule, filter: &RuleFilter) -> bool {
    if let Some(enabled) = filter.enabled
        && rule.enabled != enabled
    {
        return false;
    }

    if !filter.namespace.is_empty() && rule.conditions.namespace != filter.namespace {
        return false;
    }

    if !filter.service.is_empty() && rule.conditions.service != filter.service {
        return false;
    }

    if let Some(severity) = filter.severity
        && rule.actions.severity != severity
    {
        return false;
    }

    if !filter.log_level.is_empty() && rule.conditions.log_level != filter.log_level {
        return false;
    }

    true
}

/// 규칙 세트 집계 통계
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleStats {
    /// 전체 규칙 수
    pub total_rules: usize,
    /// 활성 규칙 수
    pub enabled_rules: usize,
    /// 비활성 규칙 수
    pub disabled_rules: usize,
    /// 심각도별 규칙 수
    pub by_severity: HashMap<String, usize>,
    /// 네임스페이스별 규칙 수 (빈 네임스페이스 제외)
    pub by_namespace: HashMap<String, usize>,
    /// 서비스별 규칙 수 (빈 서비스 제외)
    pub by_service: HashMap<String, usize>,
}

/// 규칙 세트의 집계 통계를 계산합니다.
pub fn rule_stats(rules: &[AlertRule]) -> RuleStats {
    let mut stats = RuleStats {
        total_rules: rules.len(),
        ..Default::default()
    };

    for rule in rules {
        if rule.enabled {
            stats.enabled_rules += 1;
        } else {
            stats.disabled_rules += 1;
        }

        *stats
            .by_severity
            .entry(rule.actions.severity.as_str().to_owned())
            .or_insert(0) += 1;

        if !rule.conditions.namespace.is_empty() {
            *stats
                .by_namespace
                .entry(rule.conditions.namespace.clone())
                .or_insert(0) += 1;
        }

        if !rule.conditions.service.is_empty() {
            *stats
                .by_service
                .entry(rule.conditions.service.clone())
                .or_insert(0) += 1;
        }
    }

    stats
}

/// 규칙 이름에서 규칙 ID를 생성합니다.
///
/// 소문자로 변환하고, 공백과 언더스코어를 하이픈으로 바꾼 뒤,
/// `[a-z0-9-]` 밖의 문자를 모두 제거합니다.
/// 기존 ID와의 유일성은 보장하지 않습니다 -- 호출자의 책임입니다.
pub fn generate_rule_id(name: &str) -> String {
    let mut id = String::with_capacity(name.len());
    for ch in name.to_lowercase().chars() {
        match ch {
            'a'..='z' | '0'..='9' | '-' => id.push(ch),
            '_' => id.push('-'),
            c if c.is_whitespace() => id.push('-'),
            _ => {}
        }
    }
    id
}
