//! Settings Loader
//!
//! ## 검색 경로
//!
//! 1. User scope: `~/.kiln/settings.json`
//! 2. Workspace scope: `<working_dir>/.kiln/settings.json`
//!
//! 두 scope는 `KilnSettings::merge`로 병합되며 workspace가 우선합니다.
//! 읽을 수 없는 파일은 경고 후 건너뜁니다.

use super::types::KilnSettings;
use kiln_foundation::{Error, Result, KILN_DIR};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// 설정 파일 이름
pub const SETTINGS_FILE: &str = "settings.json";

// ============================================================================
// SettingsLoader - 설정 로더
// ============================================================================

/// 설정 로더
#[derive(Debug, Clone)]
pub struct SettingsLoader {
    user_path: Option<PathBuf>,
    workspace_path: PathBuf,
}

impl SettingsLoader {
    /// 기본 경로로 생성
    pub fn new(working_dir: &Path) -> Self {
        Self {
            user_path: dirs::home_dir().map(|home| home.join(KILN_DIR).join(SETTINGS_FILE)),
            workspace_path: working_dir.join(KILN_DIR).join(SETTINGS_FILE),
        }
    }

    /// 경로 직접 지정
    pub fn with_paths(user_path: Option<PathBuf>, workspace_path: PathBuf) -> Self {
        Self {
            user_path,
            workspace_path,
        }
    }

    /// scope별 로드 (user, workspace)
    pub fn load_scoped(&self) -> (Option<KilnSettings>, Option<KilnSettings>) {
        let user = self.user_path.as_deref().and_then(load_lenient);
        let workspace = load_lenient(&self.workspace_path);
        (user, workspace)
    }

    /// 병합된 설정
    pub fn load(&self) -> KilnSettings {
        let (user, workspace) = self.load_scoped();
        KilnSettings::merge(user.unwrap_or_default(), workspace.unwrap_or_default())
    }

    /// 존재하는 설정 파일 목록
    pub fn existing_files(&self) -> Vec<PathBuf> {
        self.user_path
            .iter()
            .chain(std::iter::once(&self.workspace_path))
            .filter(|p| p.exists())
            .cloned()
            .collect()
    }
}

/// 파일 하나 로드
pub fn load_settings_file(path: &Path) -> Result<KilnSettings> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
    serde_json::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn load_lenient(path: &Path) -> Option<KilnSettings> {
    if !path.exists() {
        return None;
    }
    match load_settings_file(path) {
        Ok(settings) => {
            debug!("Loaded settings from {}", path.display());
            Some(settings)
        }
        Err(e) => {
            warn!("Skipping settings file: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiln_foundation::ApprovalMode;

    fn write(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_load_merged_scopes() {
        let home = tempfile::tempdir().unwrap();
        let project = tempfile::tempdir().unwrap();
        let user_path = home.path().join(".kiln/settings.json");
        let ws_path = project.path().join(".kiln/settings.json");

        write(
            &user_path,
            r#"{ "approvalMode": "yolo", "hooks": { "Stop": [{ "command": "u" }] } }"#,
        );
        write(
            &ws_path,
            r#"{ "hooks": { "Stop": [{ "type": "command", "command": "w" }] } }"#,
        );

        let loader = SettingsLoader::with_paths(Some(user_path), ws_path);
        let settings = loader.load();
        assert_eq!(settings.approval_mode, Some(ApprovalMode::FullAuto));
        let stop = &settings.hooks.unwrap()["Stop"];
        assert_eq!(stop[0].command, "u");
        assert_eq!(stop[1].command, "w");
        assert_eq!(loader.existing_files().len(), 2);
    }

    #[test]
    fn test_malformed_file_skipped() {
        let project = tempfile::tempdir().unwrap();
        let ws_path = project.path().join(".kiln/settings.json");
        write(&ws_path, "{ nope");

        let loader = SettingsLoader::with_paths(None, ws_path.clone());
        let (user, workspace) = loader.load_scoped();
        assert!(user.is_none());
        assert!(workspace.is_none());
        assert!(load_settings_file(&ws_path).is_err());
        assert_eq!(loader.load(), KilnSettings::default());
    }
}
