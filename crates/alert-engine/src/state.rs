//! 상태 저장소 경계 -- 로그 처리 통계 영속화
//!
//! [`StateStore`]는 프로세서가 집계한 [`LogStats`]를 영속화하는 교체
//! 가능한 계약입니다. 구현체는 동시 쓰기와 경합하는 읽기가 이전 값
//! 또는 새 값 전체를 관찰하도록(찢어진 쓰기 금지) 키당 단일 쓰기
//! 시맨틱을 보장해야 합니다.
//!
//! [`MemoryStateStore`]는 집계 레코드 하나를 읽기/쓰기 락으로 보호하는
//! 참조 구현입니다.

use std::sync::{PoisonError, RwLock};

use logwarden_core::types::LogStats;

use crate::error::AlertEngineError;

/// 상태 저장소 계약
#[allow(async_fn_in_trait)]
pub trait StateStore: Send + Sync {
    /// 로그 통계를 저장합니다.
    async fn save_log_stats(&self, stats: &LogStats) -> Result<(), AlertEngineError>;

    /// 로그 통계를 읽습니다.
    async fn get_log_stats(&self) -> Result<LogStats, AlertEngineError>;
}

impl<S: StateStore> StateStore for std::sync::Arc<S> {
    async fn save_log_stats(&self, stats: &LogStats) -> Result<(), AlertEngineError> {
        (**self).save_log_stats(stats).await
    }

    async fn get_log_stats(&self) -> Result<LogStats, AlertEngineError> {
        (**self).get_log_stats().await
    }
}

/// 인메모리 상태 저장소
///
/// 단일 집계 레코드를 읽기/쓰기 락 하나로 보호합니다.
#[derive(Debug, Default)]
pub struct MemoryStateStore {
    stats: RwLock<LogStats>,
}

impl MemoryStateStore {
    /// 새 인메모리 저장소를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    async fn save_log_stats(&self, stats: &LogStats) -> Result<(), AlertEngineError> {
        let mut guard = self.stats.write().unwrap_or_else(PoisonError::into_inner);
        *guard = stats.clone();
        Ok(())
    }

    async fn get_log_stats(&self) -> Result<LogStats, AlertEngineError> {
        let guard = self.stats.read().unwrap_or_else(PoisonError::into_inner);
        Ok(guard.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use chrono::Utc;
    use logwarden_core::types::LogEntry;

    fn entry(level: &str, service: &str) -> LogEntry {
        LogEntry {
            timestamp: Utc::now(),
            level: level.to_owned(),
            message: "m".to_owned(),
            namespace: "ns".to_owned(),
            service: service.to_owned(),
            host: "h".to_owned(),
            raw: None,
            labels: HashMap::new(),
        }
    }

    #[tokio::test]
    async fn save_then_get_returns_stored_stats() {
        let store = MemoryStateStore::new();
        let mut stats = LogStats::default();
        stats.record(&entry("ERROR", "api"));
        stats.record(&entry("INFO", "api"));

        store.save_log_stats(&stats).await.unwrap();
        let loaded = store.get_log_stats().await.unwrap();
        assert_eq!(loaded, stats);
    }

    #[tokio::test]
    async fn get_on_fresh_store_returns_zeroed_stats() {
        let store = MemoryStateStore::new();
        let stats = store.get_log_stats().await.unwrap();
        assert_eq!(stats.total_logs, 0);
        assert!(stats.logs_by_level.is_empty());
    }

    #[tokio::test]
    async fn concurrent_reads_and_writes_observe_whole_records() {
        use std::sync::Arc;

        let store = Arc::new(MemoryStateStore::new());
        let mut handles = Vec::new();

        for i in 0..8u64 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                let mut stats = LogStats::default();
                // total과 by_level 합이 항상 일치하는 레코드를 기록
                for _ in 0..i + 1 {
                    stats.record(&entry("ERROR", "api"));
                }
                store.save_log_stats(&stats).await.unwrap();
                let observed = store.get_log_stats().await.unwrap();
                // 어떤 쓰기가 이겼든 레코드는 내부적으로 일관되어야 함
                assert_eq!(
                    observed.total_logs,
                    observed.logs_by_level.values().sum::<u64>()
                );
            }));
        }

        for handle in handles {
            handle.await.unwrap();
        }
    }
}
