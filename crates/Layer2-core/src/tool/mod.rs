//! Tool System
//!
//! - `registry`: 이름 → 도구 (등록 순서 유지)
//! - `context`: Layer1 ToolContext 구현 (RuntimeContext)
//! - `builtin`: 내장 도구
//! - `command`: shell root command 추출
//! - `sandbox`: sandbox 경유 Command 구성
//! - `path`: working root 경로 검증

pub mod builtin;
pub mod command;
pub mod context;
pub mod path;
pub mod registry;
pub mod sandbox;

pub use builtin::{
    ReadFileTool, ShellTool, TodoItem, TodoReadTool, TodoStatus, TodoStore, TodoWriteTool,
    WebFetchTool, WriteFileTool,
};
pub use command::{command_root, command_roots, split_segments};
pub use context::RuntimeContext;
pub use registry::ToolRegistry;
