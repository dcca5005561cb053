//! Tool Context - 도구 실행 컨텍스트
//!
//! Layer1 ToolContext trait 구현
//! - SessionPolicy 공유 (approval mode, whitelist)
//! - Sandbox 설정 전달
//!
//! ```ignore
//! let policy = Arc::new(SessionPolicy::new(ApprovalMode::Ask));
//! let ctx = RuntimeContext::new(session_id, working_dir, policy)
//!     .with_sandbox(Some(SandboxConfig::new("docker", "kiln-sandbox:latest")));
//!
//! let output = tool.execute(params, &ctx, cancel).await?;
//! ```

use kiln_foundation::{SandboxConfig, SessionPolicy, ToolContext};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

// ============================================================================
// RuntimeContext - Layer1 ToolContext 구현
// ============================================================================

/// 런타임 컨텍스트
pub struct RuntimeContext {
    session_id: String,
    working_dir: PathBuf,
    env: HashMap<String, String>,
    policy: Arc<SessionPolicy>,
    sandbox: Option<SandboxConfig>,
}

impl RuntimeContext {
    /// 새 컨텍스트 생성
    pub fn new(
        session_id: impl Into<String>,
        working_dir: impl Into<PathBuf>,
        policy: Arc<SessionPolicy>,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            working_dir: working_dir.into(),
            env: HashMap::new(),
            policy,
            sandbox: None,
        }
    }

    /// Sandbox 설정
    pub fn with_sandbox(mut self, sandbox: Option<SandboxConfig>) -> Self {
        self.sandbox = sandbox;
        self
    }

    /// 환경 변수 추가
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}

impl ToolContext for RuntimeContext {
    fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    fn session_id(&self) -> &str {
        &self.session_id
    }

    fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    fn policy(&self) -> &SessionPolicy {
        &self.policy
    }

    fn sandbox(&self) -> Option<&SandboxConfig> {
        self.sandbox.as_ref()
    }
}
