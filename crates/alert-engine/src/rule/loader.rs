//! 규칙 영속화 -- JSON 규칙 세트 문서 로딩/저장
//!
//! 규칙은 규칙 객체의 순서 있는 시퀀스를 담는 하나의 JSON 문서로
//! 저장됩니다. 이 레이아웃은 기존 규칙 파일과의 상호 운용을 위해
//! 필드 단위로 정확히 왕복(round-trip)되어야 합니다.
//!
//! [`RuleStore`]는 영속화 경계 trait이며, [`FileRuleStore`]가 파일
//! 기반 참조 구현입니다. 데이터베이스 등 다른 백엔드는 동일한 trait을
//! 구현하면 됩니다.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::types::AlertRule;
use crate::error::AlertEngineError;

/// 규칙 세트 문서
///
/// 영속화 레이아웃의 최상위 구조입니다. 규칙 순서는 보존됩니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleSetDocument {
    /// 규칙 목록
    pub rules: Vec<AlertRule>,
}

/// 규칙 영속화 경계 trait
///
/// 엔진은 평가 시점에 활성 규칙의 스냅샷만 필요로 합니다.
/// 핫 리로드 시맨틱은 이 trait의 호출자가 결정합니다.
#[allow(async_fn_in_trait)]
pub trait RuleStore: Send + Sync {
    /// 규칙의 순서 있는 시퀀스를 로드합니다.
    async fn load_rules(&self) -> Result<Vec<AlertRule>, AlertEngineError>;

    /// 규칙 시퀀스를 저장합니다.
    async fn save_rules(&self, rules: &[AlertRule]) -> Result<(), AlertEngineError>;
}

/// 파일 기반 규칙 저장소
///
/// 하나의 JSON 문서 파일에 규칙 세트를 저장합니다.
pub struct FileRuleStore {
    /// 규칙 세트 문서 경로
    path: PathBuf,
}

impl FileRuleStore {
    /// 새 파일 규칙 저장소를 생성합니다.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 저장소 경로를 반환합니다.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_error(&self, reason: impl ToString) -> AlertEngineError {
        AlertEngineError::RuleLoad {
            path: self.path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}

impl RuleStore for FileRuleStore {
    async fn load_rules(&self) -> Result<Vec<AlertRule>, AlertEngineError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| self.load_error(e))?;

        let document: RuleSetDocument =
            serde_json::from_str(&content).map_err(|e| self.load_error(e))?;

        for rule in &document.rules {
            rule.validate()?;
        }

        tracing::info!(
            path = %self.path.display(),
            count = document.rules.len(),
            "loaded alert rules"
        );
        Ok(document.rules)
    }

    async fn save_rules(&self, rules: &[AlertRule]) -> Result<(), AlertEngineError> {
        let document = RuleSetDocument {
            rules: rules.to_vec(),
        };
        let content = serde_json::to_string_pretty(&document).map_err(|e| self.load_error(e))?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.load_error(e))?;

        tracing::debug!(
            path = %self.path.display(),
            count = rules.len(),
            "saved alert rules"
        );
        Ok(())
    }
}
