//! # kiln-agent
//!
//! Tool-call 오케스트레이션 레이어입니다.
//!
//! ## 핵심 컴포넌트
//!
//! - **Scheduler**: tool call 상태 기계 (검증 → 확인 → 실행 → 결과)
//! - **Headless**: 확인 없이 도구 하나를 실행하는 진입점
//! - **Profile**: agent별 도구 제한과 시스템 프롬프트
//! - **Converter**: 결과를 provider function-response 형식으로 변환
//!
//! ## 사용 예
//!
//! ```ignore
//! use kiln_agent::{resolve_agent, Scheduler};
//!
//! let profile = resolve_agent(Some("plan"), &settings.agent_profiles());
//! let (confirm_tx, mut confirm_rx) = tokio::sync::mpsc::unbounded_channel();
//!
//! let mut scheduler = Scheduler::new(registry, ctx)
//!     .with_profile(&profile)
//!     .with_confirmation(confirm_tx);
//!
//! // terminal layer
//! tokio::spawn(async move {
//!     while let Some(req) = confirm_rx.recv().await {
//!         req.resolve(ConfirmationOutcome::ProceedOnce);
//!     }
//! });
//!
//! scheduler.begin_turn();
//! let outcome = scheduler.schedule(batch, &cancel).await;
//! ```

pub mod converter;
pub mod headless;
pub mod profile;
pub mod scheduler;

// ============================================================================
// Primary Exports
// ============================================================================

pub use converter::{FunctionResponseConverter, ResponseConverter};
pub use headless::{execute_tool_call, execute_tool_call_with};
pub use profile::{
    builtin_profiles, compose_system_prompt, filter_registry, filter_tools_for_agent,
    is_tool_allowed, list_agents, resolve_agent, AgentProfile, DEFAULT_AGENT,
};
pub use scheduler::{
    BatchOutcome, Scheduler, SchedulerEvent, ToolCallRecord, ToolCallState, ROUND_LIMIT_MESSAGE,
};

// ============================================================================
// Prelude
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::headless::execute_tool_call;
    pub use crate::profile::{resolve_agent, AgentProfile};
    pub use crate::scheduler::{BatchOutcome, Scheduler, SchedulerEvent};
    pub use kiln_foundation::{
        CancellationToken, ConfirmationOutcome, ConfirmationRequest, ToolCallRequest,
        ToolCallResponse,
    };
}
