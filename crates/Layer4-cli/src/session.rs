//! Session setup
//!
//! settings 로드 → approval mode / sandbox 결정 → 도구 컨텍스트 구성

use anyhow::Context;
use kiln_core::config::{resolve_sandbox, KilnSettings, SettingsLoader};
use kiln_core::{RuntimeContext, ToolRegistry};
use kiln_foundation::{ApprovalMode, SessionPolicy};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info};

/// 세션 옵션 (CLI 전역 플래그)
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub working_dir: Option<PathBuf>,
    pub approval_mode: Option<ApprovalMode>,
    pub sandbox: Option<String>,
    pub sandbox_image: Option<String>,
}

/// 한 번의 `kiln` 실행 세션
pub struct Session {
    pub id: String,
    pub working_dir: PathBuf,
    pub settings: KilnSettings,
    pub ctx: Arc<RuntimeContext>,
    pub registry: ToolRegistry,
}

impl Session {
    pub fn open(options: SessionOptions) -> anyhow::Result<Self> {
        let working_dir = match options.working_dir {
            Some(dir) => dir,
            None => std::env::current_dir().context("Failed to read current directory")?,
        };
        let working_dir = working_dir
            .canonicalize()
            .with_context(|| format!("Working directory not found: {}", working_dir.display()))?;

        let settings = SettingsLoader::new(&working_dir).load();

        let mode = options
            .approval_mode
            .or(settings.approval_mode)
            .unwrap_or_default();
        let policy = Arc::new(SessionPolicy::new(mode));

        let sandbox = resolve_sandbox(
            options.sandbox.as_deref(),
            options.sandbox_image.as_deref(),
            &settings,
        )?;
        if let Some(sb) = &sandbox {
            info!("Sandbox: {} ({})", sb.command, sb.image);
        }

        let id = uuid::Uuid::new_v4().to_string();
        let ctx = Arc::new(
            RuntimeContext::new(id.clone(), working_dir.clone(), policy)
                .with_sandbox(sandbox),
        );
        let registry = ToolRegistry::for_workspace(&working_dir);

        debug!(
            "Session {} in {} (approval mode: {})",
            id,
            working_dir.display(),
            mode
        );

        Ok(Self {
            id,
            working_dir,
            settings,
            ctx,
            registry,
        })
    }

    /// 병합된 hook 설정
    pub fn hooks(&self) -> kiln_core::HooksSettings {
        self.settings.hooks.clone().unwrap_or_default()
    }
}
