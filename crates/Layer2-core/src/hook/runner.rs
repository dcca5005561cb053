//! Hook Runner - Hook 실행 엔진
//!
//! 이벤트에 등록된 모든 command hook을 동시에 실행합니다.
//! Hook은 best-effort 부가 채널이라 실패가 세션 에러로 올라가지 않습니다.
//!
//! ```text
//! entry ──spawn──► child.wait() ─┐
//!                                 ├─ select! ─► Completed / TimedOut
//!                 sleep(timeout) ─┘                 (SIGTERM + warn!)
//! ```
//!
//! 진 쪽 future(타이머 포함)는 select!에서 바로 drop됩니다.

use super::types::{HookEntry, HookEvent, HooksSettings};
use futures::future::join_all;
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// 기본 hook 타임아웃 (5초)
pub const DEFAULT_HOOK_TIMEOUT: Duration = Duration::from_millis(5000);

/// 대기 방식
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookMode {
    /// 모든 hook이 끝나거나 타임아웃될 때까지 대기
    Blocking,
    /// 즉시 반환
    NonBlocking,
}

/// 항목 하나의 결과
#[derive(Debug, Clone, PartialEq)]
pub enum HookOutcome {
    /// 종료 (exit code는 참고용)
    Completed { exit_code: Option<i32> },
    /// 타임아웃으로 종료 신호를 받음
    TimedOut,
    /// 실행 실패
    SpawnFailed(String),
}

/// 항목 실행 기록
#[derive(Debug, Clone)]
pub struct HookRun {
    pub command: String,
    pub outcome: HookOutcome,
    pub duration_ms: u64,
}

/// `run` 결과
#[derive(Debug)]
pub struct HookReport {
    /// 실행한 항목 수
    pub spawned: usize,
    /// Blocking 모드 결과
    pub runs: Vec<HookRun>,
    /// NonBlocking 모드의 백그라운드 대기 핸들
    pub background: Option<JoinHandle<Vec<HookRun>>>,
}

impl HookReport {
    fn empty() -> Self {
        Self {
            spawned: 0,
            runs: Vec::new(),
            background: None,
        }
    }
}

// ============================================================================
// HookRunner
// ============================================================================

/// Hook 실행기
#[derive(Debug, Clone)]
pub struct HookRunner {
    working_dir: PathBuf,
}

impl HookRunner {
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }

    /// 이벤트 실행
    ///
    /// 해당 이벤트 항목이 없으면 아무것도 spawn하지 않고 바로 반환합니다.
    pub async fn run(
        &self,
        event: &HookEvent,
        settings: &HooksSettings,
        mode: HookMode,
    ) -> HookReport {
        let entries: Vec<HookEntry> = settings
            .get(&event.name)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|e| e.matches(event.target.as_deref()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        if entries.is_empty() {
            return HookReport::empty();
        }

        debug!("Running {} hook(s) for {}", entries.len(), event.name);

        let mut env = event.env.clone();
        env.insert("KILN_HOOK_EVENT".to_string(), event.name.clone());

        let handles: Vec<JoinHandle<HookRun>> = entries
            .into_iter()
            .map(|entry| {
                let timeout = entry.timeout_or(DEFAULT_HOOK_TIMEOUT);
                tokio::spawn(run_entry(
                    entry,
                    env.clone(),
                    self.working_dir.clone(),
                    timeout,
                ))
            })
            .collect();
        let spawned = handles.len();

        let collect = async move {
            join_all(handles)
                .await
                .into_iter()
                .filter_map(|r| r.ok())
                .collect::<Vec<_>>()
        };

        match mode {
            HookMode::Blocking => HookReport {
                spawned,
                runs: collect.await,
                background: None,
            },
            HookMode::NonBlocking => HookReport {
                spawned,
                runs: Vec::new(),
                background: Some(tokio::spawn(collect)),
            },
        }
    }
}

/// 대기 결과
enum Waited {
    Exited(std::io::Result<std::process::ExitStatus>),
    Elapsed,
}

async fn run_entry(
    entry: HookEntry,
    env: HashMap<String, String>,
    working_dir: PathBuf,
    timeout: Duration,
) -> HookRun {
    let start = Instant::now();
    let finish = |outcome| HookRun {
        command: entry.command.clone(),
        outcome,
        duration_ms: start.elapsed().as_millis() as u64,
    };

    let spawned = Command::new("sh")
        .arg("-c")
        .arg(&entry.command)
        .current_dir(&working_dir)
        .envs(&env)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn();

    let mut child = match spawned {
        Ok(child) => child,
        Err(e) => {
            warn!("Hook command failed to start: {} ({})", entry.command, e);
            return finish(HookOutcome::SpawnFailed(e.to_string()));
        }
    };

    let waited = tokio::select! {
        status = child.wait() => Waited::Exited(status),
        _ = tokio::time::sleep(timeout) => Waited::Elapsed,
    };

    match waited {
        Waited::Exited(Ok(status)) => finish(HookOutcome::Completed {
            exit_code: status.code(),
        }),
        Waited::Exited(Err(e)) => {
            warn!("Hook command could not be awaited: {} ({})", entry.command, e);
            finish(HookOutcome::SpawnFailed(e.to_string()))
        }
        Waited::Elapsed => {
            terminate(&mut child);
            warn!(
                "Hook command timed out after {}ms: {}",
                timeout.as_millis(),
                entry.command
            );
            // 종료된 child 회수
            tokio::spawn(async move {
                let _ = child.wait().await;
            });
            finish(HookOutcome::TimedOut)
        }
    }
}

/// 종료 신호 전송 (Unix: SIGTERM)
fn terminate(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Some(pid) = child.id() {
            // SAFETY: pid는 아직 회수되지 않은 우리 child
            unsafe {
                libc::kill(pid as libc::pid_t, libc::SIGTERM);
            }
            return;
        }
    }
    let _ = child.start_kill();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hook::types::{HookEntry, HookEventType};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tracing_subscriber::layer::SubscriberExt;

    fn settings(event: HookEventType, entries: Vec<HookEntry>) -> HooksSettings {
        let mut map = HooksSettings::new();
        map.insert(event.as_str().to_string(), entries);
        map
    }

    /// WARN 이벤트 카운터
    struct WarnCounter(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for WarnCounter {
        fn on_event(
            &self,
            event: &tracing::Event<'_>,
            _ctx: tracing_subscriber::layer::Context<'_, S>,
        ) {
            if *event.metadata().level() == tracing::Level::WARN {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    #[tokio::test]
    async fn test_no_entries_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let runner = HookRunner::new(dir.path());
        let report = runner
            .run(
                &HookEvent::new(HookEventType::SessionStart),
                &HooksSettings::new(),
                HookMode::Blocking,
            )
            .await;
        assert_eq!(report.spawned, 0);
        assert!(report.background.is_none());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_blocking_runs_all_with_env() {
        let dir = tempfile::tempdir().unwrap();
        let runner = HookRunner::new(dir.path());
        let hooks = settings(
            HookEventType::PostToolUse,
            vec![
                HookEntry::command("echo \"$KILN_HOOK_EVENT:$KILN_TOOL_NAME\" > a.txt"),
                HookEntry::command("exit 7"),
            ],
        );
        let event = HookEvent::new(HookEventType::PostToolUse)
            .with_target("shell")
            .with_env("KILN_TOOL_NAME", "shell");

        let report = runner.run(&event, &hooks, HookMode::Blocking).await;
        assert_eq!(report.spawned, 2);
        assert_eq!(report.runs.len(), 2);
        assert!(report
            .runs
            .iter()
            .any(|r| r.outcome == HookOutcome::Completed { exit_code: Some(7) }));

        let written = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        assert_eq!(written.trim(), "PostToolUse:shell");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_matcher_filters_entries() {
        let dir = tempfile::tempdir().unwrap();
        let runner = HookRunner::new(dir.path());
        let hooks = settings(
            HookEventType::PreToolUse,
            vec![
                HookEntry::command("true").with_matcher("write_file"),
                HookEntry::command("true").with_matcher("shell"),
            ],
        );
        let event = HookEvent::new(HookEventType::PreToolUse).with_target("shell");
        let report = runner.run(&event, &hooks, HookMode::Blocking).await;
        assert_eq!(report.spawned, 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_blocking_returns_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let runner = HookRunner::new(dir.path());
        let hooks = settings(
            HookEventType::Notification,
            vec![HookEntry::command("sleep 1; touch done")],
        );

        let started = Instant::now();
        let report = runner
            .run(
                &HookEvent::new(HookEventType::Notification),
                &hooks,
                HookMode::NonBlocking,
            )
            .await;
        assert!(started.elapsed() < Duration::from_millis(500));
        assert!(report.runs.is_empty());

        let runs = report.background.unwrap().await.unwrap();
        assert_eq!(runs.len(), 1);
        assert!(dir.path().join("done").exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_timeout_sends_sigterm_and_warns_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let subscriber = tracing_subscriber::registry().with(WarnCounter(Arc::clone(&count)));
        let _guard = tracing::subscriber::set_default(subscriber);

        let dir = tempfile::tempdir().unwrap();
        let runner = HookRunner::new(dir.path());
        let hooks = settings(
            HookEventType::PreToolUse,
            vec![HookEntry::command("trap 'touch terminated; exit 0' TERM; sleep 10 & wait")
                .with_timeout_ms(100)],
        );

        let started = Instant::now();
        let report = runner
            .run(&HookEvent::new(HookEventType::PreToolUse), &hooks, HookMode::Blocking)
            .await;
        let elapsed = started.elapsed();

        assert!(elapsed >= Duration::from_millis(100));
        assert!(elapsed < Duration::from_secs(5));
        assert_eq!(report.runs[0].outcome, HookOutcome::TimedOut);
        assert_eq!(count.load(Ordering::SeqCst), 1);

        // trap 실행 대기
        for _ in 0..50 {
            if dir.path().join("terminated").exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(dir.path().join("terminated").exists());
    }

    #[tokio::test]
    async fn test_spawn_failure_resolves() {
        let runner = HookRunner::new("/definitely/not/a/dir");
        let hooks = settings(HookEventType::Stop, vec![HookEntry::command("true")]);
        let report = runner
            .run(&HookEvent::new(HookEventType::Stop), &hooks, HookMode::Blocking)
            .await;
        assert!(matches!(report.runs[0].outcome, HookOutcome::SpawnFailed(_)));
    }
}
