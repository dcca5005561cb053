//! Confirmation - 사용자 확인 요청/응답
//!
//! Scheduler는 `ConfirmationRequest`를 terminal layer로 보내고 대기합니다.
//! Terminal layer는 `resolve(outcome)`을 정확히 한 번 호출합니다.
//!
//! ```text
//! Scheduler ──ConfirmationRequest──► terminal layer
//!     ▲                                   │
//!     └────── oneshot (outcome) ──────────┘
//! ```
//!
//! `resolve`는 `self`를 소비하므로 두 번 호출할 수 없습니다.
//! 호출이 이미 취소되어 수신측이 사라졌다면 resolve는 아무 일도 하지 않습니다.

use super::whitelist::{mcp_server_key, mcp_tool_key, tool_key};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::oneshot;

// ============================================================================
// ConfirmationDetails - 확인 요청 내용
// ============================================================================

/// 확인 요청 내용 (tagged union)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConfirmationDetails {
    /// 일반 정보 확인 (URL fetch 등)
    Info {
        title: String,
        tool_name: String,
        prompt: String,
        #[serde(default)]
        urls: Vec<String>,
    },

    /// Shell 명령 실행
    Exec {
        title: String,
        command: String,
        root_command: String,
        #[serde(default)]
        roots: Vec<String>,
    },

    /// 파일 수정
    Edit {
        title: String,
        file_path: String,
        original: Option<String>,
        proposed: String,
    },

    /// MCP 서버 도구 호출
    Mcp {
        title: String,
        server_name: String,
        tool_name: String,
    },
}

impl ConfirmationDetails {
    pub fn title(&self) -> &str {
        match self {
            ConfirmationDetails::Info { title, .. }
            | ConfirmationDetails::Exec { title, .. }
            | ConfirmationDetails::Edit { title, .. }
            | ConfirmationDetails::Mcp { title, .. } => title,
        }
    }

    /// 한 줄 요약 (프롬프트 표시용)
    pub fn summary(&self) -> String {
        match self {
            ConfirmationDetails::Info { prompt, urls, .. } => {
                if urls.is_empty() {
                    prompt.clone()
                } else {
                    urls.join(", ")
                }
            }
            ConfirmationDetails::Exec { command, .. } => command.clone(),
            ConfirmationDetails::Edit { file_path, .. } => file_path.clone(),
            ConfirmationDetails::Mcp {
                server_name,
                tool_name,
                ..
            } => format!("{}.{}", server_name, tool_name),
        }
    }

    /// 결과에 따라 whitelist에 추가할 allow key
    ///
    /// Exec는 명령의 모든 segment root를 추가합니다.
    pub fn allow_keys(&self, outcome: &ConfirmationOutcome) -> Vec<String> {
        use ConfirmationOutcome::*;

        match (self, outcome) {
            (
                ConfirmationDetails::Exec {
                    root_command,
                    roots,
                    ..
                },
                ProceedAlways | ProceedAlwaysTool | ProceedAlwaysServer,
            ) => {
                let mut keys = vec![root_command.clone()];
                for root in roots {
                    if !keys.contains(root) {
                        keys.push(root.clone());
                    }
                }
                keys
            }
            (ConfirmationDetails::Mcp { server_name, .. }, ProceedAlwaysServer) => {
                vec![mcp_server_key(server_name)]
            }
            (
                ConfirmationDetails::Mcp {
                    server_name,
                    tool_name,
                    ..
                },
                ProceedAlways | ProceedAlwaysTool,
            ) => vec![mcp_tool_key(server_name, tool_name)],
            (
                ConfirmationDetails::Info { tool_name, .. },
                ProceedAlways | ProceedAlwaysTool | ProceedAlwaysServer,
            ) => vec![tool_key(tool_name)],
            _ => Vec::new(),
        }
    }

    /// 결과가 세션을 AutoEditApprove로 바꾸는지
    pub fn enables_auto_edit(&self, outcome: &ConfirmationOutcome) -> bool {
        match outcome {
            ConfirmationOutcome::ApproveEdit => true,
            ConfirmationOutcome::ProceedAlways => {
                matches!(self, ConfirmationDetails::Edit { .. })
            }
            _ => false,
        }
    }
}

// ============================================================================
// ConfirmationOutcome - 사용자 응답
// ============================================================================

/// 사용자 응답
#[derive(Debug, Clone, PartialEq)]
pub enum ConfirmationOutcome {
    /// 이번 한 번만 실행
    ProceedOnce,
    /// 같은 root/도구는 세션 동안 묻지 않음
    ProceedAlways,
    /// MCP 서버 전체 허용
    ProceedAlwaysServer,
    /// 이 도구 허용
    ProceedAlwaysTool,
    /// 실행하고 이후 edit는 자동 승인
    ApproveEdit,
    /// 파라미터를 수정해서 다시 확인
    ModifyWithEditor(Value),
    /// 거부
    Deny,
    /// 취소
    Cancel,
}

// ============================================================================
// ConfirmationRequest / ConfirmationResponder
// ============================================================================

/// 단발성 응답 채널
#[derive(Debug)]
pub struct ConfirmationResponder {
    tx: oneshot::Sender<ConfirmationOutcome>,
}

impl ConfirmationResponder {
    /// 응답 전달
    ///
    /// 대기 중인 호출이 이미 취소되었으면 무시됩니다.
    pub fn resolve(self, outcome: ConfirmationOutcome) {
        let _ = self.tx.send(outcome);
    }

    /// 대기측이 아직 살아 있는지
    pub fn is_pending(&self) -> bool {
        !self.tx.is_closed()
    }

    /// 대기측이 사라질 때(호출 취소)까지 대기
    pub async fn closed(&mut self) {
        self.tx.closed().await
    }
}

/// Terminal layer로 전달되는 확인 요청
#[derive(Debug)]
pub struct ConfirmationRequest {
    pub call_id: String,
    pub tool_name: String,
    pub details: ConfirmationDetails,
    pub responder: ConfirmationResponder,
}

impl ConfirmationRequest {
    /// 요청과 응답 수신측 생성
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        details: ConfirmationDetails,
    ) -> (Self, oneshot::Receiver<ConfirmationOutcome>) {
        let (tx, rx) = oneshot::channel();
        let request = Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            details,
            responder: ConfirmationResponder { tx },
        };
        (request, rx)
    }

    /// 응답 전달 (요청 소비)
    pub fn resolve(self, outcome: ConfirmationOutcome) {
        self.responder.resolve(outcome);
    }
}
