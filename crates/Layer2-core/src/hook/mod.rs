//! # Hook System
//!
//! lifecycle 이벤트에서 외부 명령을 실행합니다.
//!
//! ## 이벤트 타입
//!
//! - `SessionStart` / `SessionEnd`: 세션 시작/종료
//! - `PreToolUse`: Tool 승인 후 실행 직전
//! - `PostToolUse`: Tool 실행 후
//! - `Notification`, `UserPromptSubmit`, `Stop`
//!
//! ## 병합
//!
//! user scope(`~/.kiln/settings.json`)와 workspace scope(`.kiln/settings.json`)의
//! hook은 `merge_hooks`로 한 번 병합된 뒤 사용됩니다.
//!
//! ## 예시
//!
//! ```ignore
//! let merged = merge_hooks(user_hooks, workspace_hooks).unwrap_or_default();
//! let runner = HookRunner::new(working_dir);
//!
//! let event = HookEvent::new(HookEventType::PreToolUse)
//!     .with_target("shell")
//!     .with_env("KILN_TOOL_NAME", "shell");
//! runner.run(&event, &merged, HookMode::NonBlocking).await;
//! ```

mod runner;
mod types;

pub use runner::{HookMode, HookOutcome, HookReport, HookRun, HookRunner, DEFAULT_HOOK_TIMEOUT};
pub use types::{
    merge_hooks, HookEntry, HookEntryType, HookEvent, HookEventType, HooksSettings,
};
