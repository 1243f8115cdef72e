#![doc = include_str!("../README.md")]
//!
//! # 모듈 구성
//!
//! - [`rule`]: 알림 규칙 모델, 검증, 필터/통계, 기본 카탈로그, JSON 영속화
//! - [`window`]: 규칙별 슬라이딩 매치 윈도우 (터치 시 프루닝)
//! - [`engine`]: 규칙 매칭 + 윈도우 카운팅 + 트리거 판정
//! - [`codec`]: 와이어 페이로드를 `LogEntry`로 디코딩
//! - [`transport`]: 전송 컨슈머 경계 trait
//! - [`processor`]: 배치 소비/플러시/재시도/메트릭/헬스체크
//! - [`dispatch`]: 알림 전달 워커 (fire-and-observe)
//! - [`state`]: 상태 저장소 경계 trait 및 인메모리 참조 구현
//! - [`config`]: 프로세서 설정 (core 설정 확장)
//! - [`error`]: 도메인 에러 타입
//!
//! # 아키텍처
//!
//! ```text
//! TransportConsumer -> LogProcessor (batches) -> AlertEngine.evaluate_log
//!        |                  |                        |
//!     fetch/close       StateStore(LogStats)     per-rule MatchWindow
//!                                                     |
//!                                           mpsc -> DispatchWorker -> AlertDispatcher
//! ```

pub mod codec;
pub mod config;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod processor;
pub mod rule;
pub mod state;
pub mod transport;
pub mod window;

// --- 주요 타입 re-export ---

// 엔진
pub use engine::{AlertEngine, LogEvaluator};

// 프로세서
pub use processor::{LogProcessor, ProcessorBuilder, ProcessorMetrics, ProcessorMetricsSnapshot};

// 설정
pub use config::{ProcessorConfig, ProcessorConfigBuilder};

// 에러
pub use error::AlertEngineError;

// 규칙
pub use rule::{
    AlertActions, AlertConditions, AlertRule, CompareOp, DefaultRulesConfig, FileRuleStore,
    RuleFilter, RuleSetDocument, RuleStats, RuleStore, default_rules, default_rules_with_config,
    filter_rules, generate_rule_id, rule_stats,
};

// 윈도우
pub use window::MatchWindow;

// 상태 저장소
pub use state::{MemoryStateStore, StateStore};

// 전송/전달
pub use dispatch::{
    AlertDispatcher, ChannelDispatcher, DispatchPolicy, DispatchStats, DispatchWorker,
};
pub use transport::{ChannelConsumer, TransportConsumer};

// 코덱
pub use codec::decode_log_entry;
