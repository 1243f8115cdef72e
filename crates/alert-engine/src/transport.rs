//! 전송 계층 경계 -- 레코드 스트림 컨슈머 trait
//!
//! 와이어 레벨 전송 클라이언트(브로커 프로토콜, 컨슈머 그룹 리밸런싱)는
//! 이 크레이트의 범위 밖이며, 프로세서는 [`TransportConsumer`]라는 좁은
//! 인터페이스를 통해서만 레코드 스트림에 의존합니다.
//!
//! [`ChannelConsumer`]는 mpsc 채널로 페이로드를 공급받는 인프로세스
//! 참조 구현으로, 테스트와 임베딩에 사용됩니다.

use bytes::Bytes;
use tokio::sync::mpsc;

use logwarden_core::types::LogEntry;

use crate::codec::decode_log_entry;
use crate::error::AlertEngineError;

/// 전송 컨슈머 계약
///
/// `fetch`의 에러는 컨텍스트가 취소되었거나 `close`가 호출된 경우가
/// 아닌 한 일시적인 것으로 취급됩니다. 스트림의 정상 종료는
/// `Ok(None)`으로 표현됩니다.
#[allow(async_fn_in_trait)]
pub trait TransportConsumer: Send {
    /// 다음 로그 엔트리를 가져옵니다.
    ///
    /// `Ok(None)`은 전송 계층이 정상적으로 닫혔음을 의미합니다.
    /// 프로세서가 `select!`에서 플러시 타이머/취소와 경쟁시키므로
    /// 이 future는 취소 안전(cancel-safe)해야 합니다.
    async fn fetch(&mut self) -> Result<Option<LogEntry>, AlertEngineError>;

    /// 전송 계층의 건강 상태를 반환합니다.
    fn health_check(&self) -> bool;

    /// 컨슈머를 닫습니다. 이후 `fetch`는 `Ok(None)`을 반환합니다.
    async fn close(&mut self);
}

/// 채널 기반 컨슈머
///
/// mpsc 채널로 원시 페이로드를 받아 [`decode_log_entry`]로 디코딩합니다.
/// 디코딩 실패는 레코드 한 건에 한정되는 일시적 에러로 반환됩니다.
pub struct ChannelConsumer {
    rx: mpsc::Receiver<Bytes>,
    default_level: String,
    closed: bool,
}

impl ChannelConsumer {
    /// 새 채널 컨슈머를 생성합니다.
    pub fn new(rx: mpsc::Receiver<Bytes>, default_level: impl Into<String>) -> Self {
        Self {
            rx,
            default_level: default_level.into(),
            closed: false,
        }
    }
}

impl TransportConsumer for ChannelConsumer {
    async fn fetch(&mut self) -> Result<Option<LogEntry>, AlertEngineError> {
        if self.closed {
            return Ok(None);
        }

        match self.rx.recv().await {
            Some(payload) => decode_log_entry(&payload, &self.default_level).map(Some),
            None => {
                self.closed = true;
                Ok(None)
            }
        }
    }

    fn health_check(&self) -> bool {
        !self.closed
    }

    async fn close(&mut self) {
        self.closed = true;
        self.rx.close();
        tracing::debug!("channel consumer closed");
    }
}
