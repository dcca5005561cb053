//! kiln-core: Core Runtime for Kiln
//!
//! Layer2 - 도구 구현 레이어
//!
//! # 주요 모듈
//!
//! - `tool`: Tool registry 및 Builtin 도구들 (shell, read_file, write_file, ...)
//! - `hook`: lifecycle Hook 실행
//! - `config`: `.kiln/settings.json` 로드, sandbox 선택
//!
//! # 사용 예시
//!
//! ```ignore
//! use kiln_core::{RuntimeContext, SettingsLoader, ToolRegistry};
//!
//! let settings = SettingsLoader::new(&cwd).load();
//! let registry = ToolRegistry::for_workspace(&cwd);
//! let ctx = RuntimeContext::new("session-1", cwd, policy)
//!     .with_sandbox(resolve_sandbox(None, None, &settings)?);
//! ```

pub mod config;
pub mod hook;
pub mod tool;

// Re-exports: Tool
pub use tool::{
    command_root, command_roots, split_segments, ReadFileTool, RuntimeContext, ShellTool,
    TodoItem, TodoReadTool, TodoStatus, TodoStore, TodoWriteTool, ToolRegistry, WebFetchTool,
    WriteFileTool,
};

// Re-exports: Hook
pub use hook::{
    merge_hooks, HookEntry, HookEvent, HookEventType, HookMode, HookOutcome, HookReport,
    HookRunner, HooksSettings,
};

// Re-exports: Config
pub use config::{
    resolve_sandbox, AgentProfile, KilnSettings, SandboxSetting, SettingsLoader,
    DEFAULT_SANDBOX_IMAGE,
};

// Layer1 re-exports
pub use kiln_foundation::{Error, Result, Tool, ToolContext};

/// Layer2 버전
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[test]
    fn test_tool_exports() {
        let registry = ToolRegistry::with_builtins();
        assert!(!registry.is_empty());
        assert!(registry.contains(ShellTool::NAME));
        assert!(registry.contains(ReadFileTool::NAME));
        assert!(registry.contains(WriteFileTool::NAME));
    }
}
