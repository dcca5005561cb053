//! # kiln-foundation
//!
//! Foundation layer for Kiln:
//! - Core: 핵심 Trait 정의 (Tool, ToolContext) 및 호출 타입
//! - Permission: 세션 정책 (approval mode, whitelist, 확인 요청)
//! - Storage: JsonStore (설정, task list 캐시)
//!
//! ## 아키텍처
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │  ToolCallRequest (provider adapter)                     │
//! │                     │                                   │
//! │                     ▼                                   │
//! │       Tool Registry ──► Tool (validate/confirm/exec)    │
//! │                     │                                   │
//! │                     ▼                                   │
//! │   SessionPolicy (ApprovalMode + CommandWhitelist)       │
//! │                     │                                   │
//! │          ┌─────────┴─────────┐                         │
//! │          ▼                   ▼                         │
//! │   ConfirmationRequest    ToolCallResponse              │
//! │   (terminal layer)       (provider adapter)            │
//! └─────────────────────────────────────────────────────────┘
//! ```

pub mod core;
pub mod error;
pub mod permission;
pub mod storage;

// ============================================================================
// Error
// ============================================================================
pub use error::{Error, Result};

// ============================================================================
// Core (핵심 Trait 및 타입)
// ============================================================================
pub use crate::core::{
    // Types (types.rs)
    SandboxConfig,
    ToolCallError,
    ToolCallRequest,
    ToolCallResponse,
    ToolErrorKind,
    ToolKind,
    ToolOutput,
    // Traits (traits.rs)
    Tool,
    ToolContext,
};

// ============================================================================
// Permission (세션 정책)
// ============================================================================
pub use permission::{
    mcp_server_key, mcp_tool_key, tool_key, ApprovalMode, CommandWhitelist, ConfirmationDetails,
    ConfirmationOutcome, ConfirmationRequest, ConfirmationResponder, SessionPolicy,
};

// ============================================================================
// Storage
// ============================================================================
pub use storage::{JsonStore, KILN_DIR};

// ============================================================================
// Re-exports
// ============================================================================
pub use tokio_util::sync::CancellationToken;
