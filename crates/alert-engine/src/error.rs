//! 알림 엔진 에러 타입
//!
//! [`AlertEngineError`]는 규칙 검증, 평가, 영속화, 전달, 전송 계층 등
//! 파이프라인 내부에서 발생하는 모든 에러를 표현합니다.
//! `From<AlertEngineError> for LogwardenError` 변환이 구현되어 있어
//! 상위 레이어에서 `?` 연산자로 자연스럽게 전파할 수 있습니다.

use logwarden_core::error::{LogwardenError, PipelineError};

/// 알림 엔진 도메인 에러
///
/// 실패는 가능한 가장 작은 범위(레코드 한 건, 쓰기 한 번, 전달 한 번)에서
/// 복구되며, 여기 정의된 변형은 해당 범위를 식별합니다.
#[derive(Debug, thiserror::Error)]
pub enum AlertEngineError {
    /// 규칙 유효성 검증 실패 -- 엔진에 설치되기 전에 거부됩니다.
    #[error("rule validation error: rule '{rule_id}': {reason}")]
    RuleValidation {
        /// 문제가 된 규칙 ID
        rule_id: String,
        /// 검증 실패 사유
        reason: String,
    },

    /// 규칙 세트 문서 로딩 실패
    #[error("rule load error: {path}: {reason}")]
    RuleLoad {
        /// 규칙 파일 경로
        path: String,
        /// 로딩 실패 사유
        reason: String,
    },

    /// 단일 레코드 평가 실패 -- 해당 레코드에 한정되며 배치를 중단하지 않습니다.
    #[error("evaluation error: {reason}")]
    Evaluation {
        /// 실패 사유
        reason: String,
    },

    /// 상태 저장소 읽기/쓰기 실패 -- 재시도 후 best-effort로 강등됩니다.
    #[error("persistence error: {op}: {reason}")]
    Persistence {
        /// 실패한 연산 (save_log_stats, get_log_stats)
        op: String,
        /// 실패 사유
        reason: String,
    },

    /// 알림 전달 실패 -- 알림은 failed로 표시되고 카운트됩니다.
    #[error("delivery error: alert '{alert_id}': {reason}")]
    Delivery {
        /// 실패한 알림 ID
        alert_id: String,
        /// 실패 사유
        reason: String,
    },

    /// 전송 계층 에러 -- 영구 종료가 아닌 한 일시적으로 취급됩니다.
    #[error("transport error: {0}")]
    Transport(String),

    /// 와이어 페이로드 디코딩 실패
    #[error("decode error: {0}")]
    Decode(String),

    /// 설정 에러
    #[error("config error: {field}: {reason}")]
    Config {
        /// 설정 필드명
        field: String,
        /// 에러 사유
        reason: String,
    },

    /// 채널 통신 에러
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<AlertEngineError> for LogwardenError {
    fn from(err: AlertEngineError) -> Self {
        LogwardenError::Pipeline(PipelineError::Halted(err.to_string()))
    }
}
