//! Core Types - Tool 호출 데이터 타입
//!
//! Provider adapter와 Scheduler 사이를 오가는 요청/응답 타입을 정의합니다.
//! - `ToolCallRequest`: 모델이 요청한 도구 호출 (불변)
//! - `ToolCallResponse`: 모델로 돌려보낼 호출 결과
//! - `ToolOutput`: 도구 실행 결과 (모델용 content + 사람용 display)

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// ToolCallRequest
// ============================================================================

/// 모델이 요청한 도구 호출
///
/// `call_id`는 lifecycle 전체와 최종 응답에서 join key로 쓰입니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallRequest {
    /// 호출 ID
    pub call_id: String,

    /// 도구 이름
    pub tool_name: String,

    /// 파라미터 (JSON 객체)
    #[serde(default)]
    pub parameters: Value,
}

impl ToolCallRequest {
    pub fn new(
        call_id: impl Into<String>,
        tool_name: impl Into<String>,
        parameters: Value,
    ) -> Self {
        Self {
            call_id: call_id.into(),
            tool_name: tool_name.into(),
            parameters,
        }
    }
}

// ============================================================================
// ToolKind - 도구 분류
// ============================================================================

/// 도구 분류
///
/// `Edit`는 AutoEditApprove 모드에서 확인 없이 실행되는 edit-class 도구입니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Read,
    Edit,
    Execute,
    Fetch,
    Think,
    Other,
}

impl ToolKind {
    pub fn is_edit(&self) -> bool {
        matches!(self, ToolKind::Edit)
    }
}

impl std::fmt::Display for ToolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolKind::Read => "read",
            ToolKind::Edit => "edit",
            ToolKind::Execute => "execute",
            ToolKind::Fetch => "fetch",
            ToolKind::Think => "think",
            ToolKind::Other => "other",
        };
        write!(f, "{}", s)
    }
}

// ============================================================================
// ToolOutput - 도구 실행 결과
// ============================================================================

/// 도구 실행 결과
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    /// 모델에게 전달되는 내용
    pub llm_content: String,

    /// 사용자에게 표시되는 문자열
    pub display: String,
}

impl ToolOutput {
    /// content와 display가 같은 결과
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        Self {
            display: content.clone(),
            llm_content: content,
        }
    }

    /// 표시 문자열 지정
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = display.into();
        self
    }
}

// ============================================================================
// ToolCallResponse - Provider로 돌려보낼 결과
// ============================================================================

/// 호출 단위 에러 분류
///
/// 모두 한 호출에 국한되며 batch나 세션을 중단시키지 않습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    /// 잘못된/누락된 파라미터
    Validation,
    /// 등록되지 않은 도구
    NotFound,
    /// 도구 실행 실패
    Execution,
    /// 취소 토큰 발화
    Cancelled,
    /// 사용자가 거부
    ConfirmationDenied,
}

impl std::fmt::Display for ToolErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ToolErrorKind::Validation => "validation",
            ToolErrorKind::NotFound => "not_found",
            ToolErrorKind::Execution => "execution",
            ToolErrorKind::Cancelled => "cancelled",
            ToolErrorKind::ConfirmationDenied => "confirmation_denied",
        };
        write!(f, "{}", s)
    }
}

/// 호출 에러
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallError {
    pub kind: ToolErrorKind,
    pub message: String,
}

impl ToolCallError {
    pub fn new(kind: ToolErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// 호출 결과 (Scheduler → provider adapter)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResponse {
    /// 원본 요청의 호출 ID
    pub call_id: String,

    /// Provider 형식의 function-response payload
    pub response_parts: Vec<Value>,

    /// 사람용 결과 문자열
    pub result_display: String,

    /// 에러 (성공 시 None)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ToolCallError>,
}

impl ToolCallResponse {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn error_kind(&self) -> Option<ToolErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }
}

// ============================================================================
// SandboxConfig
// ============================================================================

/// Shell 격리 설정
///
/// `command`는 `docker`, `podman`, `sandbox-exec` 중 하나입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SandboxConfig {
    pub command: String,
    pub image: String,
}

impl SandboxConfig {
    pub fn new(command: impl Into<String>, image: impl Into<String>) -> Self {
        Self {
            command: command.into(),
            image: image.into(),
        }
    }

    /// 컨테이너 기반인지 (docker/podman)
    pub fn is_container(&self) -> bool {
        matches!(self.command.as_str(), "docker" | "podman")
    }
}
