//! Response Converter
//!
//! 호출 결과를 provider의 function-response 형식으로 바꿉니다.
//! Provider adapter마다 형식이 다르므로 trait으로 분리합니다.

use kiln_foundation::{
    Error, ToolCallError, ToolCallRequest, ToolCallResponse, ToolErrorKind, ToolOutput,
};
use serde_json::{json, Value};
use std::any::Any;

/// 결과 → provider payload 변환
pub trait ResponseConverter: Send + Sync {
    /// 성공 결과
    fn success(&self, request: &ToolCallRequest, output: &ToolOutput) -> Vec<Value>;

    /// 실패 결과
    fn failure(&self, request: &ToolCallRequest, error: &ToolCallError) -> Vec<Value>;
}

/// 기본 변환기
///
/// ```text
/// {"functionResponse": {"id": .., "name": .., "response": {"output": ..}}}
/// {"functionResponse": {"id": .., "name": .., "response": {"error": ..}}}
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FunctionResponseConverter;

impl ResponseConverter for FunctionResponseConverter {
    fn success(&self, request: &ToolCallRequest, output: &ToolOutput) -> Vec<Value> {
        vec![json!({
            "functionResponse": {
                "id": request.call_id,
                "name": request.tool_name,
                "response": { "output": output.llm_content },
            }
        })]
    }

    fn failure(&self, request: &ToolCallRequest, error: &ToolCallError) -> Vec<Value> {
        vec![json!({
            "functionResponse": {
                "id": request.call_id,
                "name": request.tool_name,
                "response": { "error": error.message },
            }
        })]
    }
}

// ============================================================================
// Response helpers (scheduler, headless 공용)
// ============================================================================

/// 성공 응답 생성
pub fn success_response(
    converter: &dyn ResponseConverter,
    request: &ToolCallRequest,
    output: &ToolOutput,
) -> ToolCallResponse {
    ToolCallResponse {
        call_id: request.call_id.clone(),
        response_parts: converter.success(request, output),
        result_display: output.display.clone(),
        error: None,
    }
}

/// 실패 응답 생성
pub fn failure_response(
    converter: &dyn ResponseConverter,
    request: &ToolCallRequest,
    kind: ToolErrorKind,
    message: impl Into<String>,
) -> ToolCallResponse {
    let error = ToolCallError::new(kind, message);
    ToolCallResponse {
        call_id: request.call_id.clone(),
        response_parts: converter.failure(request, &error),
        result_display: error.message.clone(),
        error: Some(error),
    }
}

/// 도구 에러 → 호출 에러 분류
pub fn error_kind_of(error: &Error) -> ToolErrorKind {
    match error {
        Error::Cancelled => ToolErrorKind::Cancelled,
        Error::Validation(_) | Error::InvalidInput(_) => ToolErrorKind::Validation,
        Error::ToolNotFound(_) => ToolErrorKind::NotFound,
        Error::PermissionDenied(_) => ToolErrorKind::ConfirmationDenied,
        _ => ToolErrorKind::Execution,
    }
}

/// panic payload → 메시지
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
