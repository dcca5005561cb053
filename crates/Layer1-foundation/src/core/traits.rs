//! Core Traits - Tool 인터페이스
//!
//! 모든 도구(shell, read_file, write_file, web_fetch...)는 `Tool` trait을 구현하고
//! Tool Registry에 이름으로 등록됩니다.
//!
//! ```text
//! validate(params) ──► confirmation(params, ctx) ──► execute(params, ctx, cancel)
//!      │                      │                              │
//!      ▼                      ▼                              ▼
//!  Validation 에러      ConfirmationDetails            ToolOutput / Error
//! ```

use super::types::{SandboxConfig, ToolKind, ToolOutput};
use crate::permission::{ConfirmationDetails, SessionPolicy};
use crate::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Tool Trait
// ============================================================================

/// 도구 인터페이스
///
/// 세션 동안 Tool Registry가 소유합니다.
#[async_trait]
pub trait Tool: Send + Sync {
    /// 도구 이름 (registry key)
    fn name(&self) -> &str;

    /// 표시 이름
    fn display_name(&self) -> &str {
        self.name()
    }

    /// 설명 (모델에게 전달)
    fn description(&self) -> &str;

    /// 도구 분류
    fn kind(&self) -> ToolKind;

    /// 파라미터 JSON Schema
    fn schema(&self) -> Value;

    /// 실행 전 사용자 확인이 필요한지
    fn requires_confirmation(&self) -> bool {
        false
    }

    /// 파라미터 검증
    ///
    /// 실패하면 도구 본문은 호출되지 않습니다.
    /// 경로 검증을 위해 working root를 담은 컨텍스트를 받습니다.
    fn validate(&self, _params: &Value, _ctx: &dyn ToolContext) -> Result<()> {
        Ok(())
    }

    /// 사람이 읽는 호출 설명
    fn describe(&self, _params: &Value) -> String {
        self.display_name().to_string()
    }

    /// 확인 요청 내용
    ///
    /// `None`이면 이미 허용된 호출 (whitelist 등)이라 확인을 건너뜁니다.
    fn confirmation(&self, _params: &Value, _ctx: &dyn ToolContext) -> Option<ConfirmationDetails> {
        None
    }

    /// 실행
    ///
    /// `cancel`이 발화되면 가능한 빨리 중단해야 합니다.
    async fn execute(
        &self,
        params: Value,
        ctx: &dyn ToolContext,
        cancel: CancellationToken,
    ) -> Result<ToolOutput>;

    /// Function declaration (provider 전달용)
    fn definition(&self) -> Value {
        json!({
            "name": self.name(),
            "description": self.description(),
            "parameters": self.schema(),
        })
    }
}

// ============================================================================
// ToolContext Trait
// ============================================================================

/// 도구 실행 컨텍스트
///
/// 세션 정책(approval mode, whitelist)과 sandbox 설정을 도구에 전달합니다.
pub trait ToolContext: Send + Sync {
    /// 작업 디렉토리 (working root)
    fn working_dir(&self) -> &Path;

    /// 세션 ID
    fn session_id(&self) -> &str;

    /// 추가 환경 변수
    fn env(&self) -> &HashMap<String, String>;

    /// 세션 정책
    fn policy(&self) -> &SessionPolicy;

    /// Sandbox 설정 (없으면 직접 실행)
    fn sandbox(&self) -> Option<&SandboxConfig>;
}
