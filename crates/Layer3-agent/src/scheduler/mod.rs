//! # Tool Call Scheduler
//!
//! 모델이 요청한 tool call batch를 검증, 확인, 실행하고 결과를 모읍니다.
//!
//! ## 흐름
//!
//! ```text
//! ToolCallRequest
//!      │
//!      ▼
//! Validating ── 없는 도구 / validate 실패 ──► Error
//!      │
//!      ▼
//! Scheduled ── 확인 필요? ──► AwaitingApproval ── ConfirmationRequest ──► terminal layer
//!      │                           │  ◄──────────── oneshot outcome ────────────┘
//!      ▼                           ▼
//! Executing ◄──────────────── proceed (ProceedAlways → whitelist 추가)
//!      │
//!      ▼
//! Success | Error | Cancelled  ──► ToolCallResponse (ResponseConverter)
//! ```
//!
//! - batch는 요청 순서대로 하나씩 처리되며 결과도 같은 순서입니다.
//! - 호출 단위 에러는 batch를 멈추지 않습니다.
//! - 각 호출은 batch 토큰의 child token을 받습니다.

mod state;

pub use state::{ToolCallRecord, ToolCallState};

use crate::converter::{
    error_kind_of, failure_response, panic_message, success_response, FunctionResponseConverter,
    ResponseConverter,
};
use crate::profile::{filter_registry, AgentProfile};
use futures::FutureExt;
use kiln_core::hook::{HookEvent, HookEventType, HookMode, HookRunner, HooksSettings};
use kiln_core::ToolRegistry;
use kiln_foundation::{
    CancellationToken, ConfirmationDetails, ConfirmationOutcome, ConfirmationRequest, Error,
    Tool, ToolCallRequest, ToolCallResponse, ToolContext, ToolErrorKind, ToolOutput,
};
use serde_json::Value;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 라운드 상한 초과 메시지
pub const ROUND_LIMIT_MESSAGE: &str = "tool round limit reached";

// ============================================================================
// Events / Outcome
// ============================================================================

/// 관찰용 이벤트
#[derive(Debug, Clone, PartialEq)]
pub enum SchedulerEvent {
    /// 상태 변경
    StateChanged {
        call_id: String,
        state: ToolCallState,
    },
    /// 확인 요청 발행
    ConfirmationRequested { call_id: String },
}

/// batch 처리 결과
#[derive(Debug)]
pub struct BatchOutcome {
    /// 요청 순서대로의 응답
    pub responses: Vec<ToolCallResponse>,
    /// 호출별 lifecycle 기록
    pub records: Vec<ToolCallRecord>,
    /// 라운드 상한에 걸려 실행하지 않았는지
    pub round_limit_reached: bool,
}

struct SchedulerHooks {
    runner: HookRunner,
    settings: HooksSettings,
    mode: HookMode,
}

/// 확인 대기 결과
enum Approval {
    Proceed(ConfirmationOutcome),
    Modify(Value),
    Denied,
    Cancelled,
    NoHandler,
}

// ============================================================================
// Scheduler
// ============================================================================

/// Tool call scheduler
pub struct Scheduler {
    registry: ToolRegistry,
    ctx: Arc<dyn ToolContext>,
    confirmations: Option<mpsc::UnboundedSender<ConfirmationRequest>>,
    events: Option<mpsc::UnboundedSender<SchedulerEvent>>,
    hooks: Option<SchedulerHooks>,
    converter: Box<dyn ResponseConverter>,
    max_rounds: Option<u32>,
    rounds: u32,
}

impl Scheduler {
    /// 새 scheduler
    ///
    /// 세션 정책(approval mode, whitelist)은 `ctx.policy()`를 사용합니다.
    pub fn new(registry: ToolRegistry, ctx: Arc<dyn ToolContext>) -> Self {
        Self {
            registry,
            ctx,
            confirmations: None,
            events: None,
            hooks: None,
            converter: Box::new(FunctionResponseConverter),
            max_rounds: None,
            rounds: 0,
        }
    }

    /// 확인 요청 채널 (terminal layer)
    pub fn with_confirmation(mut self, tx: mpsc::UnboundedSender<ConfirmationRequest>) -> Self {
        self.confirmations = Some(tx);
        self
    }

    /// 이벤트 채널
    pub fn with_events(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    /// PreToolUse / PostToolUse hook (기본 NonBlocking)
    pub fn with_hooks(mut self, runner: HookRunner, settings: HooksSettings) -> Self {
        self.hooks = Some(SchedulerHooks {
            runner,
            settings,
            mode: HookMode::NonBlocking,
        });
        self
    }

    /// hook 대기 방식
    pub fn with_hook_mode(mut self, mode: HookMode) -> Self {
        if let Some(hooks) = self.hooks.as_mut() {
            hooks.mode = mode;
        }
        self
    }

    pub fn with_converter(mut self, converter: Box<dyn ResponseConverter>) -> Self {
        self.converter = converter;
        self
    }

    /// 턴당 batch 상한
    pub fn with_max_rounds(mut self, max_rounds: Option<u32>) -> Self {
        self.max_rounds = max_rounds;
        self
    }

    /// profile 적용 (도구 필터링 + 라운드 상한)
    pub fn with_profile(mut self, profile: &AgentProfile) -> Self {
        self.registry = filter_registry(&self.registry, profile);
        self.max_rounds = profile.max_tool_rounds;
        self
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// 이번 턴에 처리한 batch 수
    pub fn rounds(&self) -> u32 {
        self.rounds
    }

    /// 새 대화 턴 시작 (라운드 카운터 초기화)
    pub fn begin_turn(&mut self) {
        self.rounds = 0;
    }

    /// batch 처리
    pub async fn schedule(
        &mut self,
        batch: Vec<ToolCallRequest>,
        cancel: &CancellationToken,
    ) -> BatchOutcome {
        self.rounds += 1;

        if let Some(max) = self.max_rounds {
            if self.rounds > max {
                warn!("Tool round limit reached ({}), skipping {} call(s)", max, batch.len());
                let records: Vec<ToolCallRecord> = batch
                    .into_iter()
                    .map(|request| {
                        let mut record = ToolCallRecord::new(request);
                        self.emit_state(&record);
                        self.fail(
                            &mut record,
                            ToolCallState::Error,
                            ToolErrorKind::Execution,
                            ROUND_LIMIT_MESSAGE,
                        );
                        record
                    })
                    .collect();
                return Self::outcome(records, true);
            }
        }

        debug!("Scheduling {} tool call(s), round {}", batch.len(), self.rounds);

        let mut records = Vec::with_capacity(batch.len());
        for request in batch {
            records.push(self.run_call(request, cancel).await);
        }
        Self::outcome(records, false)
    }

    fn outcome(records: Vec<ToolCallRecord>, round_limit_reached: bool) -> BatchOutcome {
        let responses = records
            .iter()
            .filter_map(|r| r.response.clone())
            .collect();
        BatchOutcome {
            responses,
            records,
            round_limit_reached,
        }
    }

    // ========================================================================
    // 호출 하나
    // ========================================================================

    async fn run_call(&self, request: ToolCallRequest, batch: &CancellationToken) -> ToolCallRecord {
        let mut record = ToolCallRecord::new(request);
        self.emit_state(&record);

        let token = batch.child_token();
        if token.is_cancelled() {
            self.cancel(&mut record, ToolErrorKind::Cancelled, "Tool call cancelled by user.");
            return record;
        }

        let Some(tool) = self.registry.get(&record.request.tool_name) else {
            let message = Error::ToolNotFound(record.request.tool_name.clone()).to_string();
            self.fail(&mut record, ToolCallState::Error, ToolErrorKind::NotFound, message);
            return record;
        };

        let mut params = record.request.parameters.clone();

        loop {
            if let Err(e) = tool.validate(&params, self.ctx.as_ref()) {
                self.fail(
                    &mut record,
                    ToolCallState::Error,
                    ToolErrorKind::Validation,
                    e.to_string(),
                );
                return record;
            }
            self.advance(&mut record, ToolCallState::Scheduled);

            let Some(details) = self.confirmation_for(tool.as_ref(), &params) else {
                break;
            };

            self.advance(&mut record, ToolCallState::AwaitingApproval);
            record.confirmation = Some(details.clone());

            match self.await_approval(&record, details.clone(), &token).await {
                Approval::Proceed(outcome) => {
                    self.ctx.policy().apply_outcome(&details, &outcome);
                    break;
                }
                Approval::Modify(modified) => {
                    debug!("Parameters modified for {}", record.call_id());
                    params = modified;
                    self.advance(&mut record, ToolCallState::Validating);
                }
                Approval::Denied => {
                    self.cancel(
                        &mut record,
                        ToolErrorKind::ConfirmationDenied,
                        "Tool call denied by user.",
                    );
                    return record;
                }
                Approval::Cancelled => {
                    self.cancel(&mut record, ToolErrorKind::Cancelled, "Tool call cancelled by user.");
                    return record;
                }
                Approval::NoHandler => {
                    self.cancel(
                        &mut record,
                        ToolErrorKind::ConfirmationDenied,
                        "Tool call requires confirmation but no confirmation handler is attached.",
                    );
                    return record;
                }
            }
        }

        self.execute(&mut record, tool, params, token).await;
        record
    }

    /// 확인이 필요하면 확인 내용
    fn confirmation_for(&self, tool: &dyn Tool, params: &Value) -> Option<ConfirmationDetails> {
        if !tool.requires_confirmation() {
            return None;
        }
        if !self.ctx.policy().needs_confirmation(tool.kind()) {
            return None;
        }
        tool.confirmation(params, self.ctx.as_ref())
    }

    async fn await_approval(
        &self,
        record: &ToolCallRecord,
        details: ConfirmationDetails,
        token: &CancellationToken,
    ) -> Approval {
        let Some(tx) = &self.confirmations else {
            return Approval::NoHandler;
        };

        let (request, rx) =
            ConfirmationRequest::new(record.call_id(), &record.request.tool_name, details);
        if tx.send(request).is_err() {
            return Approval::NoHandler;
        }
        self.emit(SchedulerEvent::ConfirmationRequested {
            call_id: record.call_id().to_string(),
        });

        let outcome = tokio::select! {
            outcome = rx => outcome.ok(),
            _ = token.cancelled() => None,
        };

        match outcome {
            Some(ConfirmationOutcome::ModifyWithEditor(params)) => Approval::Modify(params),
            Some(ConfirmationOutcome::Deny) => Approval::Denied,
            Some(ConfirmationOutcome::Cancel) | None => Approval::Cancelled,
            Some(outcome) => Approval::Proceed(outcome),
        }
    }

    async fn execute(
        &self,
        record: &mut ToolCallRecord,
        tool: Arc<dyn Tool>,
        params: Value,
        token: CancellationToken,
    ) {
        self.fire_hook(HookEventType::PreToolUse, &record.request, &params, None)
            .await;

        self.advance(record, ToolCallState::Executing);
        info!("Executing tool: {} ({})", tool.describe(&params), record.call_id());

        let run = AssertUnwindSafe(tool.execute(params.clone(), self.ctx.as_ref(), token.clone()))
            .catch_unwind()
            .await;

        match run {
            Ok(Ok(output)) if token.is_cancelled() => {
                self.cancel(record, ToolErrorKind::Cancelled, output.llm_content);
            }
            Ok(Ok(output)) => {
                self.fire_hook(
                    HookEventType::PostToolUse,
                    &record.request,
                    &params,
                    Some(&output.llm_content),
                )
                .await;
                self.succeed(record, &output);
            }
            Ok(Err(e)) if token.is_cancelled() || matches!(e, Error::Cancelled) => {
                self.cancel(record, ToolErrorKind::Cancelled, e.to_string());
            }
            Ok(Err(e)) => {
                let message = e.to_string();
                self.fire_hook(
                    HookEventType::PostToolUse,
                    &record.request,
                    &params,
                    Some(&message),
                )
                .await;
                self.fail(record, ToolCallState::Error, error_kind_of(&e), message);
            }
            Err(payload) => {
                let message = format!("Tool panicked: {}", panic_message(payload.as_ref()));
                warn!("{} ({})", message, record.call_id());
                self.fire_hook(
                    HookEventType::PostToolUse,
                    &record.request,
                    &params,
                    Some(&message),
                )
                .await;
                self.fail(record, ToolCallState::Error, ToolErrorKind::Execution, message);
            }
        }
    }

    // ========================================================================
    // 상태 / 응답 헬퍼
    // ========================================================================

    fn advance(&self, record: &mut ToolCallRecord, next: ToolCallState) {
        match record.transition(next) {
            Ok(()) => self.emit_state(record),
            Err(e) => warn!("{}", e),
        }
    }

    fn succeed(&self, record: &mut ToolCallRecord, output: &ToolOutput) {
        record.response = Some(success_response(
            self.converter.as_ref(),
            &record.request,
            output,
        ));
        self.advance(record, ToolCallState::Success);
    }

    fn fail(
        &self,
        record: &mut ToolCallRecord,
        state: ToolCallState,
        kind: ToolErrorKind,
        message: impl Into<String>,
    ) {
        record.response = Some(failure_response(
            self.converter.as_ref(),
            &record.request,
            kind,
            message,
        ));
        self.advance(record, state);
    }

    fn cancel(&self, record: &mut ToolCallRecord, kind: ToolErrorKind, message: impl Into<String>) {
        self.fail(record, ToolCallState::Cancelled, kind, message);
    }

    fn emit_state(&self, record: &ToolCallRecord) {
        debug!("Tool call {} -> {}", record.call_id(), record.state);
        self.emit(SchedulerEvent::StateChanged {
            call_id: record.call_id().to_string(),
            state: record.state,
        });
    }

    fn emit(&self, event: SchedulerEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    async fn fire_hook(
        &self,
        kind: HookEventType,
        request: &ToolCallRequest,
        params: &Value,
        output: Option<&str>,
    ) {
        let Some(hooks) = &self.hooks else {
            return;
        };

        let mut event = HookEvent::new(kind)
            .with_target(&request.tool_name)
            .with_env("KILN_TOOL_NAME", &request.tool_name)
            .with_env("KILN_CALL_ID", &request.call_id)
            .with_env("KILN_TOOL_INPUT", params.to_string());
        if let Some(output) = output {
            event = event.with_env("KILN_TOOL_OUTPUT", output);
        }

        hooks.runner.run(&event, &hooks.settings, hooks.mode).await;
    }
}
