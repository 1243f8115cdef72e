//! 와이어 페이로드 코덱 -- 원시 바이트를 LogEntry로 변환
//!
//! 전송 계층에서 받은 JSON 페이로드를 [`LogEntry`]로 디코딩합니다.
//! 일부 로그 수집기는 실제 로그를 `message` 필드 안에 JSON 문자열로
//! 중첩시키므로, 중첩 필드 추출(service/level/message/timestamp)을
//! 지원합니다.
//!
//! 정규화 규칙:
//! - 레벨이 비어 있으면 설정된 기본 레벨을 적용
//! - 원본 페이로드는 `raw` 필드에 보존
//! - 메시지가 비어 있는 엔트리는 디코딩 실패로 거부

use chrono::{DateTime, Utc};
use logwarden_core::types::LogEntry;
use serde_json::Value;

use crate::error::AlertEngineError;

/// 허용되는 최대 페이로드 크기 (바이트)
const MAX_PAYLOAD_SIZE: usize = 1024 * 1024; // 1MB

/// JSON 페이로드를 `LogEntry`로 디코딩합니다.
///
/// 디코딩 실패는 해당 레코드에 한정되는 [`AlertEngineError::Decode`]로
/// 보고됩니다.
pub fn decode_log_entry(payload: &[u8], default_level: &str) -> Result<LogEntry, AlertEngineError> {
    if payload.len() > MAX_PAYLOAD_SIZE {
        return Err(AlertEngineError::Decode(format!(
            "payload too large: {} bytes (max: {MAX_PAYLOAD_SIZE})",
            payload.len()
        )));
    }

    let value: Value = serde_json::from_slice(payload)
        .map_err(|e| AlertEngineError::Decode(format!("invalid json: {e}")))?;
    let had_timestamp = value.get("timestamp").is_some();

    let mut entry: LogEntry = serde_json::from_value(value)
        .map_err(|e| AlertEngineError::Decode(format!("invalid log entry: {e}")))?;

    entry.raw = Some(String::from_utf8_lossy(payload).into_owned());

    extract_nested_message(&mut entry, had_timestamp);

    if entry.level.is_empty() {
        entry.level = default_level.to_owned();
    }

    if entry.message.is_empty() {
        return Err(AlertEngineError::Decode(
            "log entry message is empty".to_owned(),
        ));
    }

    Ok(entry)
}

/// `message` 필드가 JSON 객체 문자열이면 중첩 필드를 끌어올립니다.
///
/// - `service`: 값이 있으면 덮어씀
/// - `level`: 외부 레벨이 비어 있거나 INFO/DEFAULT일 때만 덮어씀
/// - `message`: 실제 메시지 본문으로 교체
/// - `timestamp`: 외부 페이로드에 타임스탬프가 없었을 때만 적용
fn extract_nested_message(entry: &mut LogEntry, had_timestamp: bool) {
    if entry.message.is_empty() {
        return;
    }

    let Ok(Value::Object(nested)) = serde_json::from_str::<Value>(&entry.message) else {
        // 메시지가 JSON이 아니면 그대로 둠
        return;
    };

    if let Some(Value::String(service)) = nested.get("service")
        && !service.is_empty()
    {
        entry.service = service.clone();
    }

    if let Some(Value::String(level)) = nested.get("level")
        && !level.is_empty()
        && (entry.level.is_empty() || entry.level == "INFO" || entry.level == "DEFAULT")
    {
        entry.level = level.clone();
    }

    if !had_timestamp
        && let Some(Value::String(timestamp)) = nested.get("timestamp")
        && let Ok(parsed) = DateTime::parse_from_rfc3339(timestamp)
    {
        entry.timestamp = parsed.with_timezone(&Utc);
    }

    if let Some(Value::String(message)) = nested.get("message")
        && !message.is_empty()
    {
        entry.message = message.clone();
    }
}
