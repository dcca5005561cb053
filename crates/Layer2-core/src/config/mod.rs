//! # Configuration System
//!
//! `.kiln/settings.json` 설정 로드
//!
//! ## 설정 우선순위 (낮은 → 높은)
//!
//! 1. User-level: `~/.kiln/settings.json`
//! 2. Workspace-level: `<working_dir>/.kiln/settings.json`
//!
//! ## 사용 예시
//!
//! ```ignore
//! use kiln_core::config::{resolve_sandbox, SettingsLoader};
//!
//! let settings = SettingsLoader::new(Path::new(".")).load();
//! let sandbox = resolve_sandbox(cli.sandbox.as_deref(), None, &settings)?;
//!
//! for profile in settings.agent_profiles() {
//!     // ...
//! }
//! ```

mod loader;
mod sandbox;
mod types;

pub use loader::{load_settings_file, SettingsLoader, SETTINGS_FILE};
pub use sandbox::{
    resolve_sandbox, resolve_sandbox_with, DEFAULT_SANDBOX_IMAGE, SANDBOX_ENV, SANDBOX_IMAGE_ENV,
};
pub use types::{AgentProfile, KilnSettings, SandboxSetting};
