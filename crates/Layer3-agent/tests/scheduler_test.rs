//! Scheduler 통합 테스트
//!
//! 실제 builtin 도구(shell, write_file, read_file)와 함께 batch 흐름을 검증합니다.

#![cfg(unix)]

use kiln_agent::{resolve_agent, Scheduler, SchedulerEvent, ToolCallState};
use kiln_core::hook::{HookEntry, HookEventType, HookMode, HookRunner, HooksSettings};
use kiln_core::{RuntimeContext, ToolRegistry};
use kiln_foundation::{
    ApprovalMode, CancellationToken, ConfirmationDetails, ConfirmationOutcome,
    ConfirmationRequest, SessionPolicy, ToolCallRequest, ToolErrorKind,
};
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::mpsc;

fn session(root: &Path, mode: ApprovalMode) -> (Arc<SessionPolicy>, Arc<RuntimeContext>) {
    let policy = Arc::new(SessionPolicy::new(mode));
    let ctx = Arc::new(RuntimeContext::new(
        "integration",
        root.to_path_buf(),
        Arc::clone(&policy),
    ));
    (policy, ctx)
}

fn shell(id: &str, command: &str) -> ToolCallRequest {
    ToolCallRequest::new(id, "shell", json!({ "command": command }))
}

#[tokio::test]
async fn test_ls_proceed_always_then_skips_approval() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("hello.txt"), "hi").unwrap();

    let (policy, ctx) = session(dir.path(), ApprovalMode::Ask);
    let (tx, mut rx) = mpsc::unbounded_channel::<ConfirmationRequest>();
    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx).with_confirmation(tx);

    let prompts = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(req) = rx.recv().await {
            if let ConfirmationDetails::Exec { root_command, .. } = &req.details {
                seen.push(root_command.clone());
            }
            req.resolve(ConfirmationOutcome::ProceedAlways);
        }
        seen
    });

    let cancel = CancellationToken::new();
    let first = scheduler.schedule(vec![shell("c1", "ls")], &cancel).await;
    let record = &first.records[0];
    assert_eq!(
        record.history,
        vec![
            ToolCallState::Validating,
            ToolCallState::Scheduled,
            ToolCallState::AwaitingApproval,
            ToolCallState::Executing,
            ToolCallState::Success,
        ]
    );
    assert!(first.responses[0].result_display.contains("hello.txt"));
    assert!(policy.is_allowed("ls"));

    scheduler.begin_turn();
    let second = scheduler.schedule(vec![shell("c2", "ls -la")], &cancel).await;
    assert_eq!(second.records[0].state, ToolCallState::Success);
    assert!(!second.records[0]
        .history
        .contains(&ToolCallState::AwaitingApproval));

    drop(scheduler);
    assert_eq!(prompts.await.unwrap(), vec!["ls".to_string()]);
}

#[tokio::test]
async fn test_mixed_batch_keeps_order_and_continues() {
    let dir = tempfile::tempdir().unwrap();
    let (_policy, ctx) = session(dir.path(), ApprovalMode::FullAuto);
    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx);

    let batch = vec![
        ToolCallRequest::new("a", "missing_tool", json!({})),
        shell("b", ""),
        shell("c", "exit 3"),
        ToolCallRequest::new(
            "d",
            "write_file",
            json!({ "path": "out.txt", "content": "written" }),
        ),
    ];
    let outcome = scheduler.schedule(batch, &CancellationToken::new()).await;

    let ids: Vec<_> = outcome.responses.iter().map(|r| r.call_id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c", "d"]);
    assert_eq!(outcome.responses[0].error_kind(), Some(ToolErrorKind::NotFound));
    assert_eq!(outcome.responses[1].error_kind(), Some(ToolErrorKind::Validation));
    // non-zero exit은 성공 결과
    assert!(!outcome.responses[2].is_error());
    assert!(outcome.responses[2].response_parts[0]["functionResponse"]["response"]["output"]
        .as_str()
        .unwrap()
        .contains("Exit Code: 3"));
    assert!(!outcome.responses[3].is_error());
    assert_eq!(
        std::fs::read_to_string(dir.path().join("out.txt")).unwrap(),
        "written"
    );
}

#[tokio::test]
async fn test_auto_edit_still_asks_for_shell() {
    let dir = tempfile::tempdir().unwrap();
    let (_policy, ctx) = session(dir.path(), ApprovalMode::AutoEditApprove);
    let (tx, mut rx) = mpsc::unbounded_channel::<ConfirmationRequest>();
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx)
        .with_confirmation(tx)
        .with_events(events_tx);

    tokio::spawn(async move {
        while let Some(req) = rx.recv().await {
            req.resolve(ConfirmationOutcome::Deny);
        }
    });

    let outcome = scheduler
        .schedule(
            vec![
                ToolCallRequest::new("w", "write_file", json!({ "path": "a.txt", "content": "x" })),
                shell("s", "echo hi"),
            ],
            &CancellationToken::new(),
        )
        .await;

    assert!(!outcome.responses[0].is_error());
    assert_eq!(
        outcome.responses[1].error_kind(),
        Some(ToolErrorKind::ConfirmationDenied)
    );

    let mut confirmations = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SchedulerEvent::ConfirmationRequested { call_id } = event {
            confirmations.push(call_id);
        }
    }
    assert_eq!(confirmations, vec!["s".to_string()]);
}

#[tokio::test]
async fn test_cancel_kills_running_shell() {
    let dir = tempfile::tempdir().unwrap();
    let (_policy, ctx) = session(dir.path(), ApprovalMode::FullAuto);
    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let started = std::time::Instant::now();
    let outcome = scheduler
        .schedule(vec![shell("long", "sleep 30"), shell("next", "echo never")], &cancel)
        .await;

    assert!(started.elapsed() < std::time::Duration::from_secs(10));
    assert_eq!(outcome.records[0].state, ToolCallState::Cancelled);
    assert_eq!(outcome.records[1].state, ToolCallState::Cancelled);
    assert_eq!(
        outcome.records[1].history,
        vec![ToolCallState::Validating, ToolCallState::Cancelled]
    );
}

#[tokio::test]
async fn test_hooks_fire_around_execution() {
    let dir = tempfile::tempdir().unwrap();
    let (_policy, ctx) = session(dir.path(), ApprovalMode::FullAuto);

    let mut hooks = HooksSettings::new();
    hooks.insert(
        HookEventType::PreToolUse.as_str().to_string(),
        vec![HookEntry::command("echo \"pre:$KILN_TOOL_NAME:$KILN_CALL_ID\" >> hooks.log")
            .with_matcher("shell")],
    );
    hooks.insert(
        HookEventType::PostToolUse.as_str().to_string(),
        vec![HookEntry::command("echo \"post:$KILN_CALL_ID\" >> hooks.log")],
    );

    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx)
        .with_hooks(HookRunner::new(dir.path()), hooks)
        .with_hook_mode(HookMode::Blocking);

    let outcome = scheduler
        .schedule(
            vec![
                shell("c1", "true"),
                ToolCallRequest::new("c2", "read_file", json!({ "path": "nope.txt" })),
            ],
            &CancellationToken::new(),
        )
        .await;
    assert_eq!(outcome.responses.len(), 2);

    let log = std::fs::read_to_string(dir.path().join("hooks.log")).unwrap();
    let lines: Vec<_> = log.lines().collect();
    // PreToolUse matcher는 shell만, PostToolUse는 실행 실패에도 발화
    assert_eq!(lines, vec!["pre:shell:c1", "post:c1", "post:c2"]);
}

#[tokio::test]
async fn test_hooks_skip_calls_that_never_execute() {
    let dir = tempfile::tempdir().unwrap();
    let (_policy, ctx) = session(dir.path(), ApprovalMode::Ask);
    let (tx, mut rx) = mpsc::unbounded_channel::<ConfirmationRequest>();
    tokio::spawn(async move {
        while let Some(req) = rx.recv().await {
            req.resolve(ConfirmationOutcome::Deny);
        }
    });

    let mut hooks = HooksSettings::new();
    for event in [HookEventType::PreToolUse, HookEventType::PostToolUse] {
        hooks.insert(
            event.as_str().to_string(),
            vec![HookEntry::command("echo \"$KILN_HOOK_EVENT:$KILN_CALL_ID\" >> hooks.log")],
        );
    }

    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx)
        .with_confirmation(tx)
        .with_hooks(HookRunner::new(dir.path()), hooks)
        .with_hook_mode(HookMode::Blocking);

    let outcome = scheduler
        .schedule(
            vec![
                shell("empty", ""),
                ToolCallRequest::new("ghost", "missing_tool", json!({})),
                shell("denied", "echo hi"),
            ],
            &CancellationToken::new(),
        )
        .await;

    let kinds: Vec<_> = outcome.responses.iter().map(|r| r.error_kind()).collect();
    assert_eq!(
        kinds,
        vec![
            Some(ToolErrorKind::Validation),
            Some(ToolErrorKind::NotFound),
            Some(ToolErrorKind::ConfirmationDenied),
        ]
    );
    assert!(!dir.path().join("hooks.log").exists());
}

#[tokio::test]
async fn test_chained_command_asks_for_unapproved_root() {
    let dir = tempfile::tempdir().unwrap();
    let (policy, ctx) = session(dir.path(), ApprovalMode::Ask);
    policy.whitelist().add("ls");

    let (tx, mut rx) = mpsc::unbounded_channel::<ConfirmationRequest>();
    let prompts = tokio::spawn(async move {
        let mut seen = Vec::new();
        while let Some(req) = rx.recv().await {
            if let ConfirmationDetails::Exec { roots, .. } = &req.details {
                seen.push(roots.clone());
            }
            req.resolve(ConfirmationOutcome::Deny);
        }
        seen
    });

    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx).with_confirmation(tx);
    let outcome = scheduler
        .schedule(
            vec![shell("plain", "ls"), shell("chained", "ls; touch marker")],
            &CancellationToken::new(),
        )
        .await;

    assert!(!outcome.responses[0].is_error());
    assert_eq!(
        outcome.responses[1].error_kind(),
        Some(ToolErrorKind::ConfirmationDenied)
    );
    assert!(!dir.path().join("marker").exists());

    drop(scheduler);
    assert_eq!(
        prompts.await.unwrap(),
        vec![vec!["ls".to_string(), "touch".to_string()]]
    );
}

#[tokio::test]
async fn test_profile_restricts_tools_and_rounds() {
    let dir = tempfile::tempdir().unwrap();
    let (_policy, ctx) = session(dir.path(), ApprovalMode::FullAuto);

    let profile = resolve_agent(Some("plan"), &[]).with_max_tool_rounds(1);
    let mut scheduler = Scheduler::new(ToolRegistry::with_builtins(), ctx).with_profile(&profile);
    let cancel = CancellationToken::new();

    let first = scheduler.schedule(vec![shell("c1", "ls")], &cancel).await;
    assert_eq!(first.responses[0].error_kind(), Some(ToolErrorKind::NotFound));

    let second = scheduler
        .schedule(
            vec![ToolCallRequest::new("c2", "todo_read", json!({}))],
            &cancel,
        )
        .await;
    assert!(second.round_limit_reached);
    assert!(second.responses[0].is_error());
}
