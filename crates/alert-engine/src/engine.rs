//! 알림 엔진 -- 규칙 매칭, 윈도우 카운팅, 트리거 판정
//!
//! [`AlertEngine`]은 들어오는 로그 엔트리를 활성 규칙 전체에 대해
//! 평가하고, 슬라이딩 윈도우 임계값이 충족되면 알림을 생성합니다.
//!
//! # 동시성 모델
//! - 활성 규칙 세트는 불변 스냅샷(`Arc<Vec<AlertRule>>`)이며,
//!   [`install_rules`](AlertEngine::install_rules)가 포인터 교체로
//!   원자적으로 발행합니다. 진행 중인 평가는 자신의 스냅샷을 계속 봅니다.
//! - 매치 윈도우는 규칙 ID별 `Mutex`로 보호됩니다. 서로 다른 규칙의
//!   동시 평가는 서로를 차단하지 않고, 같은 규칙에 대한 append/prune/
//!   compare는 하나의 배타 구간에서 원자적으로 수행됩니다.
//!
//! 이 엔진은 단일 프로세스 시맨틱만 보장합니다. 여러 레플리카가 같은
//! 규칙 세트를 평가하면 알림이 중복될 수 있습니다.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use metrics::{counter, gauge};

use logwarden_core::metrics as metric_names;
use logwarden_core::types::{Alert, AlertState, AlertStatus, DeliveryStatus, LogEntry};

use crate::error::AlertEngineError;
use crate::rule::types::{AlertConditions, AlertRule};
use crate::window::MatchWindow;

/// 로그 평가기 trait
///
/// 프로세서가 평가 로직에 의존하는 경계입니다. 테스트에서 평가 동작을
/// 대체할 수 있도록 [`AlertEngine`]과 분리되어 있습니다.
pub trait LogEvaluator: Send + Sync {
    /// 로그 엔트리를 평가하여 트리거된 알림을 반환합니다.
    fn evaluate_log(&self, entry: &LogEntry) -> Vec<Alert>;
}

/// 알림 평가 엔진
///
/// # 사용 예시
/// ```ignore
/// use logwarden_alert_engine::{AlertEngine, rule::default_rules};
///
/// let engine = AlertEngine::with_rules(default_rules())?;
/// let alerts = engine.evaluate_log(&entry);
/// ```
pub struct AlertEngine {
    /// 활성 규칙 스냅샷 (copy-on-write)
    rules: RwLock<Arc<Vec<AlertRule>>>,
    /// 규칙별 매치 윈도우
    windows: RwLock<HashMap<String, Arc<Mutex<MatchWindow>>>>,
    /// 규칙별 최근 트리거 상태
    statuses: RwLock<HashMap<String, AlertStatus>>,
}

impl AlertEngine {
    /// 규칙이 없는 새 엔진을 생성합니다.
    pub fn new() -> Self {
        Self {
            rules: RwLock::new(Arc::new(Vec::new())),
            windows: RwLock::new(HashMap::new()),
            statuses: RwLock::new(HashMap::new()),
        }
    }

    /// 주어진 규칙 세트로 엔진을 생성합니다.
    pub fn with_rules(rules: Vec<AlertRule>) -> Result<Self, AlertEngineError> {
        let engine = Self::new();
        engine.install_rules(rules)?;
        Ok(engine)
    }

    /// 규칙 세트 전체를 교체합니다.
    ///
    /// 모든 규칙이 검증을 통과해야 하며, 하나라도 실패하면 아무것도
    /// 설치되지 않습니다 (거부). 성공 시 새 스냅샷이 원자적으로
    /// 발행되고, 사라진 규칙의 윈도우/상태는 제거됩니다.
    pub fn install_rules(&self, rules: Vec<AlertRule>) -> Result<(), AlertEngineError> {
        for rule in &rules {
            rule.validate()?;
        }

        let snapshot = Arc::new(rules);
        {
            let mut current = self
                .rules
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            *current = Arc::clone(&snapshot);
        }

        // 사라진 규칙의 상태 정리
        {
            let mut windows = self
                .windows
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            windows.retain(|id, _| snapshot.iter().any(|r| &r.id == id));
            gauge!(metric_names::ENGINE_ACTIVE_WINDOWS).set(windows.len() as f64);
        }
        {
            let mut statuses = self
                .statuses
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            statuses.retain(|id, _| snapshot.iter().any(|r| &r.id == id));
        }

        gauge!(metric_names::ENGINE_RULES_LOADED).set(snapshot.len() as f64);
        tracing::info!(count = snapshot.len(), "installed rule set");
        Ok(())
    }

    /// 단일 규칙을 추가하거나 교체합니다 (ID 기준).
    pub fn upsert_rule(&self, rule: AlertRule) -> Result<(), AlertEngineError> {
        rule.validate()?;
        let mut rules: Vec<AlertRule> = self.snapshot().as_ref().clone();
        if let Some(existing) = rules.iter_mut().find(|r| r.id == rule.id) {
            *existing = rule;
        } else {
            rules.push(rule);
        }
        self.install_rules(rules)
    }

    /// 규칙을 제거합니다. 제거된 규칙을 반환합니다.
    pub fn remove_rule(&self, rule_id: &str) -> Option<AlertRule> {
        let mut rules: Vec<AlertRule> = self.snapshot().as_ref().clone();
        let position = rules.iter().position(|r| r.id == rule_id)?;
        let removed = rules.remove(position);
        // 검증을 통과한 규칙들만 남으므로 재설치는 실패하지 않음
        let _ = self.install_rules(rules);
        Some(removed)
    }

    /// 현재 규칙 스냅샷을 반환합니다.
    pub fn snapshot(&self) -> Arc<Vec<AlertRule>> {
        Arc::clone(&self.rules.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// 현재 설치된 규칙 수를 반환합니다.
    pub fn rule_count(&self) -> usize {
        self.snapshot().len()
    }

    /// 규칙의 최근 트리거 상태를 반환합니다.
    pub fn alert_status(&self, rule_id: &str) -> Option<AlertStatus> {
        self.statuses
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(rule_id)
            .cloned()
    }

    /// 현재 보유 중인 매치 윈도우 수를 반환합니다.
    pub fn active_window_count(&self) -> usize {
        self.windows
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// 로그 엔트리가 규칙 조건에 매칭되는지 평가합니다.
    ///
    /// 비용이 싼 검사부터 순서대로 단락(short-circuit)합니다.
    /// 키워드는 하나 이상이 대소문자 무시 부분 문자열로 포함되면
    /// 매칭입니다 (OR 결합).
    fn matches_conditions(entry: &LogEntry, conditions: &AlertConditions) -> bool {
        if !conditions.log_level.is_empty() && entry.level != conditions.log_level {
            return false;
        }

        if !conditions.namespace.is_empty() && entry.namespace != conditions.namespace {
            return false;
        }

        if !conditions.service.is_empty() && entry.service != conditions.service {
            return false;
        }

        if !conditions.keywords.is_empty() {
            let message = entry.message.to_lowercase();
            return conditions
                .keywords
                .iter()
                .any(|keyword| message.contains(&keyword.to_lowercase()));
        }

        true
    }

    /// 규칙의 매치 윈도우를 가져오거나 생성합니다.
    fn window_for(&self, rule: &AlertRule) -> Arc<Mutex<MatchWindow>> {
        {
            let windows = self.windows.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(window) = windows.get(&rule.id) {
                return Arc::clone(window);
            }
        }

        let mut windows = self.windows.write().unwrap_or_else(PoisonError::into_inner);
        let window = Arc::clone(
            windows
                .entry(rule.id.clone())
                .or_insert_with(|| {
                    Arc::new(Mutex::new(MatchWindow::new(rule.conditions.time_window)))
                }),
        );
        gauge!(metric_names::ENGINE_ACTIVE_WINDOWS).set(windows.len() as f64);
        window
    }

    /// 트리거 상태를 기록합니다.
    fn mark_triggered(&self, rule_id: &str, now: DateTime<Utc>, count: u32) {
        let mut statuses = self.statuses.write().unwrap_or_else(PoisonError::into_inner);
        statuses.insert(
            rule_id.to_owned(),
            AlertStatus {
                rule_id: rule_id.to_owned(),
                last_trigger: now,
                count,
                status: AlertState::Active,
            },
        );
    }

    /// 임계값 미달로 복귀한 규칙의 상태를 갱신합니다.
    fn mark_recovered(&self, rule_id: &str, count: u32) {
        let mut statuses = self.statuses.write().unwrap_or_else(PoisonError::into_inner);
        if let Some(status) = statuses.get_mut(rule_id) {
            status.status = AlertState::Inactive;
            status.count = count;
        }
    }

    /// 알림 메시지를 렌더링합니다.
    fn build_alert_message(rule: &AlertRule, entry: &LogEntry, count: u32) -> String {
        format!(
            "Alert: {}\nService: {}\nNamespace: {}\nLevel: {}\nCount: {} in {}\nMessage: {}",
            rule.name,
            if entry.service.is_empty() {
                "unknown"
            } else {
                &entry.service
            },
            entry.namespace,
            entry.level,
            count,
            format_window(rule.conditions.time_window),
            entry.message,
        )
    }

    /// 트리거된 알림을 생성합니다.
    fn build_alert(rule: &AlertRule, entry: &LogEntry, count: u32, now: DateTime<Utc>) -> Alert {
        Alert {
            id: uuid::Uuid::new_v4().to_string(),
            rule_id: rule.id.clone(),
            rule_name: rule.name.clone(),
            log_entry: entry.clone(),
            timestamp: now,
            severity: rule.actions.severity,
            status: DeliveryStatus::Pending,
            message: Self::build_alert_message(rule, entry, count),
            count,
        }
    }
}

impl LogEvaluator for AlertEngine {
    /// 로그 엔트리를 모든 활성 규칙에 대해 평가합니다.
    ///
    /// 매칭된 규칙마다 윈도우에 엔트리 타임스탬프를 기록하고 프루닝한 뒤
    /// 임계값을 판정합니다. 억제 래치가 해제된 상태에서 판정이
    /// 성립하면 알림을 생성하고 래치를 설정합니다. 판정이 성립하지
    /// 않으면 래치를 해제하여 다음 사건에 대비합니다.
    fn evaluate_log(&self, entry: &LogEntry) -> Vec<Alert> {
        let rules = self.snapshot();
        let now = Utc::now();
        let mut alerts = Vec::new();

        for rule in rules.iter() {
            if !rule.enabled {
                continue;
            }

            if !Self::matches_conditions(entry, &rule.conditions) {
                continue;
            }

            counter!(metric_names::ENGINE_RULE_MATCHES_TOTAL).increment(1);

            let window = self.window_for(rule);
            let mut guard = window.lock().unwrap_or_else(PoisonError::into_inner);
            guard.resize(rule.conditions.time_window);
            let count = guard.record(entry.timestamp, now);
            let holds = rule.conditions.operator.holds(count, rule.conditions.threshold);

            if holds && !guard.alerted() {
                guard.set_alerted(true);
                drop(guard);

                self.mark_triggered(&rule.id, now, count);
                counter!(metric_names::ENGINE_ALERTS_TRIGGERED_TOTAL).increment(1);
                tracing::info!(
                    rule_id = %rule.id,
                    count,
                    threshold = rule.conditions.threshold,
                    operator = rule.conditions.operator.as_str(),
                    "alert triggered"
                );
                alerts.push(Self::build_alert(rule, entry, count, now));
            } else if holds {
                counter!(metric_names::ENGINE_ALERTS_SUPPRESSED_TOTAL).increment(1);
                tracing::debug!(rule_id = %rule.id, count, "trigger suppressed, incident active");
            } else if guard.alerted() {
                guard.set_alerted(false);
                drop(guard);
                self.mark_recovered(&rule.id, count);
                tracing::debug!(rule_id = %rule.id, count, "incident recovered");
            }
        }

        alerts
    }
}

impl Default for AlertEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// 시간 윈도우를 사람이 읽을 수 있는 형태로 포맷합니다.
fn format_window(window: Duration) -> String {
    let secs = window.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{}m", secs / 60)
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::TimeDelta;
    use logwarden_core::types::Severity;

    use crate::rule::types::{AlertActions, CompareOp};

    fn base() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    fn scenario_rule() -> AlertRule {
        AlertRule {
            id: "error-burst".to_owned(),
            name: "Error Burst".to_owned(),
            description: "Repeated failures in user-service".to_owned(),
            enabled: true,
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

    fn matching_entry(timestamp: DateTime<Utc>) -> LogEntry {
        LogEntry {
            timestamp,
            level: "ERROR".to_owned(),
            message: "request failed with status 500".to_owned(),
            namespace: "production".to_owned(),
            service: "user-service".to_owned(),
            host: "node-01".to_owned(),
            raw: None,
            labels: HashMap::new(),
        }
    }

    #[test]
    fn four_matches_within_window_trigger_exactly_one_alert() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();
        // 프루닝은 실제 현재 시각 기준이므로 타임스탬프는 근접 과거를 사용
        let start = Utc::now() - TimeDelta::seconds(90);

        let mut alerts = Vec::new();
        // 2분 안에 4건의 ERROR/user-service/"failed" 레코드
        for i in 0..4 {
            let entry = matching_entry(start + TimeDelta::seconds(i * 30));
            alerts.extend(engine.evaluate_log(&entry));
        }

        assert_eq!(alerts.len(), 1);
        let alert = &alerts[0];
        assert_eq!(alert.count, 4);
        assert_eq!(alert.severity, Severity::High);
        assert_eq!(alert.rule_id, "error-burst");
        assert_eq!(alert.status, DeliveryStatus::Pending);
        assert!(alert.message.contains("Error Burst"));
        assert!(alert.message.contains("Count: 4 in 5m"));
    }

    #[test]
    fn matches_spread_beyond_window_never_trigger() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();

        // 1분 간격 3건은 이미 윈도우(5분) 밖의 과거 -- 프루닝되어 카운트에
        // 남지 않으므로, 6분 뒤 도착한 4번째 레코드로는 트리거되지 않음
        let start = Utc::now() - TimeDelta::minutes(8);
        for i in 0..3 {
            let entry = matching_entry(start + TimeDelta::minutes(i));
            assert!(engine.evaluate_log(&entry).is_empty());
        }
        let late = matching_entry(Utc::now());
        assert!(engine.evaluate_log(&late).is_empty());
    }

    #[test]
    fn disabled_rule_never_fires_nor_mutates_state() {
        let mut rule = scenario_rule();
        rule.enabled = false;
        let engine = AlertEngine::with_rules(vec![rule]).unwrap();

        for i in 0..10 {
            let entry = matching_entry(base() + TimeDelta::seconds(i));
            assert!(engine.evaluate_log(&entry).is_empty());
        }

        assert!(engine.alert_status("error-burst").is_none());
        assert_eq!(engine.active_window_count(), 0);
    }

    #[test]
    fn level_mismatch_does_not_match() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();
        let mut entry = matching_entry(base());
        entry.level = "WARN".to_owned();
        assert!(engine.evaluate_log(&entry).is_empty());
        assert_eq!(engine.active_window_count(), 0);
    }

    #[test]
    fn service_mismatch_does_not_match() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();
        let mut entry = matching_entry(base());
        entry.service = "payment-service".to_owned();
        assert!(engine.evaluate_log(&entry).is_empty());
    }

    #[test]
    fn keyword_match_is_case_insensitive_or() {
        let rule = scenario_rule();
        let mut entry = matching_entry(base());

        // "error" 키워드만 포함 (OR이므로 충분)
        entry.message = "Unexpected ERROR in handler".to_owned();
        assert!(AlertEngine::matches_conditions(&entry, &rule.conditions));

        // 어느 키워드도 없음
        entry.message = "all good".to_owned();
        assert!(!AlertEngine::matches_conditions(&entry, &rule.conditions));
    }

    #[test]
    fn rule_without_keywords_matches_on_fields_alone() {
        let mut rule = scenario_rule();
        rule.conditions.keywords.clear();
        let mut entry = matching_entry(base());
        entry.message = "anything at all".to_owned();
        assert!(AlertEngine::matches_conditions(&entry, &rule.conditions));
    }

    #[test]
    fn empty_constraints_match_any_entry() {
        let mut rule = scenario_rule();
        rule.conditions.log_level = String::new();
        rule.conditions.service = String::new();
        rule.conditions.keywords.clear();

        let mut entry = matching_entry(base());
        entry.level = "DEBUG".to_owned();
        entry.service = "whatever".to_owned();
        assert!(AlertEngine::matches_conditions(&entry, &rule.conditions));
    }

    #[test]
    fn non_matching_record_does_not_touch_other_rule_counters() {
        let mut other = scenario_rule();
        other.id = "other-rule".to_owned();
        other.conditions.service = "payment-service".to_owned();

        let engine = AlertEngine::with_rules(vec![scenario_rule(), other]).unwrap();

        // user-service 레코드는 other-rule의 윈도우를 만들지 않아야 함
        engine.evaluate_log(&matching_entry(base()));
        assert_eq!(engine.active_window_count(), 1);
    }

    #[test]
    fn repeated_triggers_are_suppressed_until_recovery() {
        let mut rule = scenario_rule();
        rule.conditions.threshold = 2;
        rule.conditions.time_window = Duration::from_secs(3600);
        let engine = AlertEngine::with_rules(vec![rule]).unwrap();

        let mut fired = 0;
        for i in 0..6 {
            let entry = matching_entry(Utc::now() + TimeDelta::milliseconds(i));
            fired += engine.evaluate_log(&entry).len();
        }
        // 3번째 레코드에서 count=3 > 2로 1회 발화, 이후는 억제
        assert_eq!(fired, 1);

        let status = engine.alert_status("error-burst").unwrap();
        assert_eq!(status.status, AlertState::Active);
        assert_eq!(status.count, 3);
    }

    #[test]
    fn alert_status_recovers_when_test_stops_holding() {
        let mut rule = scenario_rule();
        rule.conditions.operator = CompareOp::Eq;
        rule.conditions.threshold = 3;
        rule.conditions.time_window = Duration::from_secs(3600);
        let engine = AlertEngine::with_rules(vec![rule]).unwrap();

        let near_past = Utc::now() - TimeDelta::seconds(10);
        for i in 0..3 {
            engine.evaluate_log(&matching_entry(near_past + TimeDelta::seconds(i)));
        }
        // count=3 == 3에서 발화, 상태 Active
        assert_eq!(
            engine.alert_status("error-burst").unwrap().status,
            AlertState::Active
        );

        // 4번째 매치로 count=4 != 3 -- 판정 실패로 래치 해제, 상태 Inactive
        engine.evaluate_log(&matching_entry(Utc::now()));
        let status = engine.alert_status("error-burst").unwrap();
        assert_eq!(status.status, AlertState::Inactive);
        assert_eq!(status.count, 4);
    }

    #[test]
    fn eq_operator_fires_at_exact_count() {
        let mut rule = scenario_rule();
        rule.conditions.operator = CompareOp::Eq;
        rule.conditions.threshold = 2;
        rule.conditions.time_window = Duration::from_secs(3600);
        let engine = AlertEngine::with_rules(vec![rule]).unwrap();

        let now = Utc::now();
        assert!(engine.evaluate_log(&matching_entry(now)).is_empty()); // count=1
        let fired = engine.evaluate_log(&matching_entry(now + TimeDelta::milliseconds(1)));
        assert_eq!(fired.len(), 1); // count=2 == 2
        assert_eq!(fired[0].count, 2);
    }

    #[test]
    fn lt_operator_fires_on_first_match() {
        let mut rule = scenario_rule();
        rule.conditions.operator = CompareOp::Lt;
        rule.conditions.threshold = 3;
        let engine = AlertEngine::with_rules(vec![rule]).unwrap();

        let fired = engine.evaluate_log(&matching_entry(Utc::now()));
        assert_eq!(fired.len(), 1); // count=1 < 3
    }

    #[test]
    fn install_rules_rejects_invalid_set_atomically() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();

        let mut bad = scenario_rule();
        bad.id = "bad".to_owned();
        bad.conditions.threshold = 0;
        let result = engine.install_rules(vec![scenario_rule(), bad]);
        assert!(result.is_err());

        // 기존 스냅샷은 그대로
        assert_eq!(engine.rule_count(), 1);
    }

    #[test]
    fn install_rules_drops_state_of_removed_rules() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();
        engine.evaluate_log(&matching_entry(Utc::now()));
        assert_eq!(engine.active_window_count(), 1);

        let mut replacement = scenario_rule();
        replacement.id = "new-rule".to_owned();
        engine.install_rules(vec![replacement]).unwrap();

        assert_eq!(engine.active_window_count(), 0);
        assert!(engine.alert_status("error-burst").is_none());
    }

    #[test]
    fn upsert_rule_replaces_by_id() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();

        let mut updated = scenario_rule();
        updated.name = "Error Burst v2".to_owned();
        engine.upsert_rule(updated).unwrap();

        assert_eq!(engine.rule_count(), 1);
        assert_eq!(engine.snapshot()[0].name, "Error Burst v2");
    }

    #[test]
    fn remove_rule_returns_removed() {
        let engine = AlertEngine::with_rules(vec![scenario_rule()]).unwrap();
        let removed = engine.remove_rule("error-burst").unwrap();
        assert_eq!(removed.id, "error-burst");
        assert_eq!(engine.rule_count(), 0);
        assert!(engine.remove_rule("error-burst").is_none());
    }

    #[test]
    fn multiple_rules_evaluate_independently() {
        let mut warn_rule = scenario_rule();
        warn_rule.id = "warn-rule".to_owned();
        warn_rule.conditions.log_level = "WARN".to_owned();
        warn_rule.conditions.keywords.clear();
        warn_rule.conditions.threshold = 1;
        warn_rule.conditions.operator = CompareOp::Gte;

        let engine = AlertEngine::with_rules(vec![scenario_rule(), warn_rule]).unwrap();

        let mut warn_entry = matching_entry(Utc::now());
        warn_entry.level = "WARN".to_owned();
        warn_entry.message = "disk space low".to_owned();

        let fired = engine.evaluate_log(&warn_entry);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].rule_id, "warn-rule");
    }

    #[test]
    fn alert_carries_triggering_entry_and_message() {
        let mut rule = scenario_rule();
        rule.conditions.threshold = 1;
        rule.conditions.operator = CompareOp::Gte;
        let engine = AlertEngine::with_rules(vec![rule]).unwrap();

        let entry = matching_entry(Utc::now());
        let fired = engine.evaluate_log(&entry);
        assert_eq!(fired.len(), 1);
        assert_eq!(fired[0].log_entry.message, entry.message);
        assert!(fired[0].message.contains("Service: user-service"));
        assert!(fired[0].message.contains("Level: ERROR"));
        assert!(!fired[0].id.is_empty());
    }

    #[test]
    fn format_window_humanizes_minutes() {
        assert_eq!(format_window(Duration::from_secs(300)), "5m");
        assert_eq!(format_window(Duration::from_secs(90)), "90s");
        assert_eq!(format_window(Duration::from_secs(45)), "45s");
    }

    #[test]
    fn concurrent_evaluation_on_different_rules() {
        use std::sync::Arc as StdArc;

        let mut rule_b = scenario_rule();
        rule_b.id = "rule-b".to_owned();
        rule_b.conditions.service = "payment-service".to_owned();

        let engine = StdArc::new(AlertEngine::with_rules(vec![scenario_rule(), rule_b]).unwrap());

        let mut handles = Vec::new();
        for worker in 0..4 {
            let engine = StdArc::clone(&engine);
            handles.push(std::thread::spawn(move || {
                for i in 0..50 {
                    let mut entry = matching_entry(Utc::now());
                    if worker % 2 == 0 {
                        entry.service = "payment-service".to_owned();
                    }
                    entry.message = format!("request failed #{i}");
                    engine.evaluate_log(&entry);
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // 두 규칙 모두 매치를 축적했고 상태가 일관되게 남아야 함
        assert_eq!(engine.active_window_count(), 2);
        assert!(engine.alert_status("error-burst").is_some());
        assert!(engine.alert_status("rule-b").is_some());
    }
}
