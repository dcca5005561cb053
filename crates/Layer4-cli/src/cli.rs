//! Non-interactive CLI commands

use crate::confirm;
use crate::hooks;
use crate::session::Session;
use anyhow::Context;
use kiln_agent::{
    compose_system_prompt, execute_tool_call, filter_registry, list_agents, resolve_agent,
    Scheduler, SchedulerEvent,
};
use kiln_core::hook::{HookEventType, HookMode, HookOutcome, HookRunner};
use kiln_foundation::{CancellationToken, ToolCallRequest, ToolContext};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// 기본 시스템 프롬프트
const BASE_SYSTEM_PROMPT: &str = "You are kiln, a coding agent working in the user's terminal. \
Use the available tools to inspect and change the workspace, and ask before anything destructive.";

/// batch 파일 항목 (callId는 생략 가능)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchEntry {
    #[serde(default)]
    call_id: Option<String>,
    tool_name: String,
    #[serde(default)]
    parameters: Value,
}

impl BatchEntry {
    fn into_request(self) -> ToolCallRequest {
        let call_id = self
            .call_id
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let parameters = if self.parameters.is_null() {
            json!({})
        } else {
            self.parameters
        };
        ToolCallRequest::new(call_id, self.tool_name, parameters)
    }
}

fn parse_batch(content: &str) -> anyhow::Result<Vec<ToolCallRequest>> {
    let entries: Vec<BatchEntry> =
        serde_json::from_str(content).context("Batch file must be a JSON array of tool calls")?;
    Ok(entries.into_iter().map(BatchEntry::into_request).collect())
}

/// Ctrl-C → 취소 토큰 (두 번째 Ctrl-C는 즉시 종료)
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        info!("Interrupted, cancelling tool calls");
        trigger.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted again, exiting");
            std::process::exit(130);
        }
    });
    token
}

// ============================================================================
// exec
// ============================================================================

/// 도구 하나를 확인 없이 실행
pub async fn run_exec(
    session: &Session,
    tool: &str,
    params: Option<&str>,
    call_id: Option<String>,
) -> anyhow::Result<bool> {
    let parameters = match params {
        Some(raw) => serde_json::from_str(raw).context("--params must be valid JSON")?,
        None => json!({}),
    };
    let call_id = call_id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let request = ToolCallRequest::new(call_id, tool, parameters);

    let response = execute_tool_call(
        &session.registry,
        &request,
        session.ctx.as_ref(),
        Some(cancel_on_ctrl_c()),
    )
    .await;

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(!response.is_error())
}

// ============================================================================
// batch
// ============================================================================

/// batch 파일을 scheduler로 실행
pub async fn run_batch(session: &Session, file: &Path, agent: Option<&str>) -> anyhow::Result<bool> {
    let content = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read batch file {}", file.display()))?;
    let batch = parse_batch(&content)?;

    let agent_name = agent.or(session.settings.default_agent.as_deref());
    let profile = resolve_agent(agent_name, &session.settings.agent_profiles());
    info!("Running {} tool call(s) as agent '{}'", batch.len(), profile.name);

    let (confirm_tx, confirm_rx) = mpsc::unbounded_channel();
    let prompt = confirm::spawn_prompt(confirm_rx);

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let events = tokio::spawn(async move {
        while let Some(event) = events_rx.recv().await {
            if let SchedulerEvent::StateChanged { call_id, state } = event {
                debug!("{} -> {}", call_id, state);
            }
        }
    });

    let ctx: Arc<dyn ToolContext> = session.ctx.clone();
    let mut scheduler = Scheduler::new(session.registry.clone(), ctx)
        .with_profile(&profile)
        .with_confirmation(confirm_tx)
        .with_events(events_tx)
        .with_hooks(HookRunner::new(&session.working_dir), session.hooks());

    hooks::fire_kind(session, HookEventType::SessionStart, HookMode::Blocking).await;

    let cancel = cancel_on_ctrl_c();
    scheduler.begin_turn();
    let outcome = scheduler.schedule(batch, &cancel).await;
    drop(scheduler);

    hooks::fire_kind(session, HookEventType::SessionEnd, HookMode::Blocking).await;

    let _ = prompt.await;
    let _ = events.await;

    if outcome.round_limit_reached {
        eprintln!("Tool round limit reached for agent '{}'", profile.name);
    }

    let ok = outcome.responses.iter().all(|r| !r.is_error());
    println!(
        "{}",
        serde_json::to_string_pretty(&json!({
            "agent": profile.name,
            "responses": outcome.responses,
            "roundLimitReached": outcome.round_limit_reached,
        }))?
    );
    Ok(ok)
}

// ============================================================================
// agents / tools
// ============================================================================

/// agent profile 목록
pub fn run_agents(session: &Session, show_prompt: bool) {
    let default = session
        .settings
        .default_agent
        .as_deref()
        .unwrap_or(kiln_agent::DEFAULT_AGENT);

    for profile in list_agents(&session.settings.agent_profiles()) {
        let marker = if profile.name == default { "*" } else { " " };
        println!(
            "{} {:<12} {}",
            marker,
            profile.name,
            profile.description.as_deref().unwrap_or("")
        );
        if let Some(include) = &profile.include_tools_only {
            println!("    tools: {}", include.join(", "));
        } else if let Some(exclude) = &profile.exclude_tools {
            println!("    excludes: {}", exclude.join(", "));
        }
        if let Some(rounds) = profile.max_tool_rounds {
            println!("    max tool rounds: {}", rounds);
        }
        if show_prompt {
            println!("    prompt:");
            for line in compose_system_prompt(BASE_SYSTEM_PROMPT, &profile).lines() {
                println!("      {}", line);
            }
        }
    }
}

/// (agent 필터 적용) 도구 목록
pub fn run_tools(session: &Session, agent: Option<&str>, json_output: bool) -> anyhow::Result<()> {
    let registry = match agent {
        Some(name) => filter_registry(
            &session.registry,
            &resolve_agent(Some(name), &session.settings.agent_profiles()),
        ),
        None => session.registry.clone(),
    };

    if json_output {
        println!("{}", serde_json::to_string_pretty(&registry.definitions())?);
        return Ok(());
    }

    for tool in registry.all() {
        let confirm = if tool.requires_confirmation() { " (confirm)" } else { "" };
        println!("{:<12} [{}]{}", tool.name(), tool.kind(), confirm);
    }
    Ok(())
}

// ============================================================================
// hook
// ============================================================================

/// 이벤트 hook 실행
pub async fn run_hook(
    session: &Session,
    event: &str,
    target: Option<&str>,
    blocking: bool,
) -> anyhow::Result<()> {
    let mut hook_event = hooks::event_for(event);
    if let Some(target) = target {
        hook_event = hook_event.with_target(target);
    }
    let mode = if blocking {
        HookMode::Blocking
    } else {
        HookMode::NonBlocking
    };

    let report = hooks::fire(session, hook_event, mode).await;
    if report.spawned == 0 {
        println!("No hooks configured for {}", event);
        return Ok(());
    }

    let runs = match report.background {
        Some(handle) => handle.await.context("Hook task failed")?,
        None => report.runs,
    };
    for run in runs {
        let status = match run.outcome {
            HookOutcome::Completed { exit_code } => match exit_code {
                Some(code) => format!("exit {}", code),
                None => "terminated".to_string(),
            },
            HookOutcome::TimedOut => "timed out".to_string(),
            HookOutcome::SpawnFailed(e) => format!("failed to start: {}", e),
        };
        println!("{} ({}ms): {}", run.command, run.duration_ms, status);
    }
    Ok(())
}
