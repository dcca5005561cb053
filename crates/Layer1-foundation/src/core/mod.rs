//! Core Module - 핵심 인터페이스 및 타입
//!
//! - `types.rs`: 데이터 타입 (ToolCallRequest, ToolCallResponse, ToolOutput 등)
//! - `traits.rs`: 인터페이스 (Tool, ToolContext)

pub mod traits;
pub mod types;

pub use traits::{Tool, ToolContext};
pub use types::{
    SandboxConfig, ToolCallError, ToolCallRequest, ToolCallResponse, ToolErrorKind, ToolKind,
    ToolOutput,
};
