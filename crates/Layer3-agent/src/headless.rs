//! Non-interactive Executor
//!
//! 사용자 확인 없이 도구 하나를 바로 실행합니다 (headless 실행, 스크립트).
//! approval mode와 whitelist는 보지 않지만 파라미터 검증은 거칩니다.

use crate::converter::{
    error_kind_of, failure_response, panic_message, success_response, FunctionResponseConverter,
    ResponseConverter,
};
use futures::FutureExt;
use kiln_core::ToolRegistry;
use kiln_foundation::{
    CancellationToken, Error, ToolCallRequest, ToolCallResponse, ToolContext, ToolErrorKind,
};
use std::panic::AssertUnwindSafe;
use tracing::{debug, warn};

/// 도구 하나 실행 (기본 변환기)
pub async fn execute_tool_call(
    registry: &ToolRegistry,
    request: &ToolCallRequest,
    ctx: &dyn ToolContext,
    cancel: Option<CancellationToken>,
) -> ToolCallResponse {
    execute_tool_call_with(&FunctionResponseConverter, registry, request, ctx, cancel).await
}

/// 도구 하나 실행
///
/// 어떤 실패도 에러 응답으로 바뀌며 panic도 밖으로 전파되지 않습니다.
pub async fn execute_tool_call_with(
    converter: &dyn ResponseConverter,
    registry: &ToolRegistry,
    request: &ToolCallRequest,
    ctx: &dyn ToolContext,
    cancel: Option<CancellationToken>,
) -> ToolCallResponse {
    let Some(tool) = registry.get(&request.tool_name) else {
        return failure_response(
            converter,
            request,
            ToolErrorKind::NotFound,
            Error::ToolNotFound(request.tool_name.clone()).to_string(),
        );
    };

    if let Err(e) = tool.validate(&request.parameters, ctx) {
        return failure_response(converter, request, ToolErrorKind::Validation, e.to_string());
    }

    let token = cancel.unwrap_or_else(CancellationToken::new);
    debug!("Headless execution: {}", tool.describe(&request.parameters));

    let run = AssertUnwindSafe(tool.execute(request.parameters.clone(), ctx, token))
        .catch_unwind()
        .await;

    match run {
        Ok(Ok(output)) => success_response(converter, request, &output),
        Ok(Err(e)) => failure_response(converter, request, error_kind_of(&e), e.to_string()),
        Err(payload) => {
            let message = format!("Tool panicked: {}", panic_message(payload.as_ref()));
            warn!("{}", message);
            failure_response(converter, request, ToolErrorKind::Execution, message)
        }
    }
}
