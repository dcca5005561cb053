//! Tool call 상태 기계
//!
//! ```text
//! Validating ──► Scheduled ──► (AwaitingApproval) ──► Executing ──► Success | Error
//!     │              │                 │                   │
//!     └──────────────┴────► Cancelled ◄┴───────────────────┘
//! ```
//!
//! `AwaitingApproval`에서 파라미터가 수정되면 `Validating`으로 돌아갑니다.
//! 종료 상태(`Success`, `Error`, `Cancelled`)에서는 더 이상 전이할 수 없습니다.

use chrono::{DateTime, Utc};
use kiln_foundation::{ConfirmationDetails, Error, Result, ToolCallRequest, ToolCallResponse};
use serde::Serialize;

/// 호출 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolCallState {
    Validating,
    Scheduled,
    AwaitingApproval,
    Executing,
    Success,
    Error,
    Cancelled,
}

impl ToolCallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolCallState::Validating => "validating",
            ToolCallState::Scheduled => "scheduled",
            ToolCallState::AwaitingApproval => "awaiting_approval",
            ToolCallState::Executing => "executing",
            ToolCallState::Success => "success",
            ToolCallState::Error => "error",
            ToolCallState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ToolCallState::Success | ToolCallState::Error | ToolCallState::Cancelled
        )
    }

    /// 허용된 전이인지
    pub fn can_transition_to(&self, next: ToolCallState) -> bool {
        use ToolCallState::*;

        if self.is_terminal() {
            return false;
        }
        if next == Cancelled {
            return true;
        }
        matches!(
            (self, next),
            (Validating, Scheduled)
                | (Validating, Error)
                | (Scheduled, AwaitingApproval)
                | (Scheduled, Executing)
                | (AwaitingApproval, Executing)
                | (AwaitingApproval, Validating)
                | (Executing, Success)
                | (Executing, Error)
        )
    }
}

impl std::fmt::Display for ToolCallState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// ToolCallRecord
// ============================================================================

/// 호출 하나의 lifecycle 기록
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRecord {
    pub request: ToolCallRequest,
    pub state: ToolCallState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confirmation: Option<ConfirmationDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<ToolCallResponse>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    /// 거쳐 간 상태 (순서대로)
    pub history: Vec<ToolCallState>,
}

impl ToolCallRecord {
    pub fn new(request: ToolCallRequest) -> Self {
        Self {
            request,
            state: ToolCallState::Validating,
            confirmation: None,
            response: None,
            started_at: None,
            ended_at: None,
            history: vec![ToolCallState::Validating],
        }
    }

    pub fn call_id(&self) -> &str {
        &self.request.call_id
    }

    /// 상태 전이
    ///
    /// 허용되지 않은 전이는 거부되고 상태는 그대로 남습니다.
    pub fn transition(&mut self, next: ToolCallState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::Internal(format!(
                "Illegal tool call transition {} -> {} ({})",
                self.state, next, self.request.call_id
            )));
        }

        let now = Utc::now();
        if next == ToolCallState::Executing {
            self.started_at = Some(now);
        }
        if next.is_terminal() {
            self.ended_at = Some(now);
        }
        self.state = next;
        self.history.push(next);
        Ok(())
    }

    /// 실행 시간 (ms)
    pub fn duration_ms(&self) -> Option<i64> {
        match (self.started_at, self.ended_at) {
            (Some(start), Some(end)) => Some((end - start).num_milliseconds()),
            _ => None,
        }
    }
}
