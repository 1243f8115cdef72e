//! 슬라이딩 매치 윈도우 -- 규칙별 매칭 타임스탬프 카운팅
//!
//! [`MatchWindow`]는 한 규칙의 최근 매칭 타임스탬프 시퀀스를 유지합니다.
//! 프루닝은 별도 타이머 없이 터치(기록) 시점마다 수행되므로, 메모리는
//! "마지막 윈도우 내 매칭 수"로 제한되고 유휴 규칙은 비용이 없습니다.
//!
//! `alerted` 래치는 사건(incident)당 한 번만 알림이 나가도록 하는
//! 억제 상태입니다. 임계값 판정이 다시 실패하는 첫 터치에서 해제됩니다.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};

/// 규칙별 슬라이딩 매치 윈도우
#[derive(Debug)]
pub struct MatchWindow {
    /// 윈도우 길이
    window: TimeDelta,
    /// 윈도우 내 매칭 타임스탬프 (오래된 것부터)
    events: VecDeque<DateTime<Utc>>,
    /// 사건당 1회 알림 억제 래치
    alerted: bool,
}

impl MatchWindow {
    /// 주어진 길이의 새 윈도우를 생성합니다.
    pub fn new(window: Duration) -> Self {
        Self {
            window: TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX),
            events: VecDeque::new(),
            alerted: false,
        }
    }

    /// 매칭 타임스탬프를 기록하고, 프루닝 후 남은 개수를 반환합니다.
    ///
    /// 개수에는 방금 기록한 이벤트도 포함됩니다 (단, 이미 윈도우 밖이면
    /// 즉시 프루닝됩니다).
    pub fn record(&mut self, at: DateTime<Utc>, now: DateTime<Utc>) -> u32 {
        self.events.push_back(at);
        self.prune(now);
        self.count()
    }

    /// `now - window`보다 오래된 타임스탬프를 제거합니다.
    ///
    /// 경계의 타임스탬프(정확히 윈도우 길이만큼 오래된 것)는 유지됩니다.
    pub fn prune(&mut self, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while let Some(front) = self.events.front() {
            if *front < cutoff {
                self.events.pop_front();
            } else {
                break;
            }
        }
    }

    /// 윈도우 내 매칭 수를 반환합니다.
    pub fn count(&self) -> u32 {
        u32::try_from(self.events.len()).unwrap_or(u32::MAX)
    }

    /// 윈도우가 비어 있는지 확인합니다.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// 억제 래치 상태를 반환합니다.
    pub fn alerted(&self) -> bool {
        self.alerted
    }

    /// 억제 래치를 설정/해제합니다.
    pub fn set_alerted(&mut self, alerted: bool) {
        self.alerted = alerted;
    }

    /// 윈도우 길이가 변경되었으면 갱신하고 이벤트를 초기화합니다.
    ///
    /// 규칙이 교체되어 윈도우 길이가 달라진 경우, 이전 길이로 수집된
    /// 타임스탬프는 새 규칙의 카운트로 의미가 없으므로 버립니다.
    pub fn resize(&mut self, window: Duration) {
        let new_window = TimeDelta::from_std(window).unwrap_or(TimeDelta::MAX);
        if new_window != self.window {
            self.window = new_window;
            self.events.clear();
            self.alerted = false;
        }
    }
}
