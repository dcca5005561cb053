//! Permission system for Kiln
//!
//! - `mode`: 세션 approval mode (Ask / AutoEditApprove / FullAuto)
//! - `whitelist`: 세션 동안 누적되는 allow key (shell root, MCP, 도구)
//! - `confirmation`: 확인 요청 tagged union + 단발성 응답 채널
//! - `policy`: 위 두 상태를 소유하는 세션 객체
//!
//! ## 사용 예시
//!
//! ```rust,ignore
//! let policy = Arc::new(SessionPolicy::new(ApprovalMode::Ask));
//!
//! if policy.needs_confirmation(tool.kind()) {
//!     if let Some(details) = tool.confirmation(&params, &ctx) {
//!         let (request, rx) = ConfirmationRequest::new(call_id, tool.name(), details.clone());
//!         tx.send(request)?;
//!         let outcome = rx.await?;
//!         policy.apply_outcome(&details, &outcome);
//!     }
//! }
//! ```

mod confirmation;
mod mode;
mod policy;
mod whitelist;

pub use confirmation::{
    ConfirmationDetails, ConfirmationOutcome, ConfirmationRequest, ConfirmationResponder,
};
pub use mode::ApprovalMode;
pub use policy::SessionPolicy;
pub use whitelist::{mcp_server_key, mcp_tool_key, tool_key, CommandWhitelist};
