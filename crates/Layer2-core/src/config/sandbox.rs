//! Sandbox 선택
//!
//! 우선순위: CLI 인자 > `KILN_SANDBOX` > settings > 없음
//!
//! 값은 `true`/`false` 또는 명령 이름(`docker`, `podman`, `sandbox-exec`)입니다.
//! `true`는 사용 가능한 명령을 자동으로 찾습니다.

use super::types::KilnSettings;
use kiln_foundation::{Error, Result, SandboxConfig};
use tracing::debug;

pub const SANDBOX_ENV: &str = "KILN_SANDBOX";
pub const SANDBOX_IMAGE_ENV: &str = "KILN_SANDBOX_IMAGE";
pub const DEFAULT_SANDBOX_IMAGE: &str = "kiln-sandbox:latest";

const SANDBOX_COMMANDS: &[&str] = &["docker", "podman", "sandbox-exec"];

/// 프로세스 환경과 PATH 기준으로 sandbox 결정
pub fn resolve_sandbox(
    cli: Option<&str>,
    cli_image: Option<&str>,
    settings: &KilnSettings,
) -> Result<Option<SandboxConfig>> {
    resolve_sandbox_with(
        cli,
        cli_image,
        settings,
        |key| std::env::var(key).ok(),
        |cmd| which::which(cmd).is_ok(),
    )
}

/// 환경 조회와 명령 탐색을 주입받는 버전
pub fn resolve_sandbox_with<E, X>(
    cli: Option<&str>,
    cli_image: Option<&str>,
    settings: &KilnSettings,
    env: E,
    available: X,
) -> Result<Option<SandboxConfig>>
where
    E: Fn(&str) -> Option<String>,
    X: Fn(&str) -> bool,
{
    let value = cli
        .map(str::to_string)
        .or_else(|| env(SANDBOX_ENV))
        .or_else(|| settings.sandbox.as_ref().map(|s| s.as_value()));

    let Some(value) = value else {
        return Ok(None);
    };

    let command = match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "none" => return Ok(None),
        "true" | "1" => detect(&available).ok_or_else(|| {
            Error::Config(
                "Sandbox is enabled but no sandbox command (docker, podman, sandbox-exec) was found"
                    .to_string(),
            )
        })?,
        other if SANDBOX_COMMANDS.contains(&other) => {
            if !available(other) {
                return Err(Error::Config(format!(
                    "Sandbox command '{}' is not installed",
                    other
                )));
            }
            other.to_string()
        }
        other => {
            return Err(Error::Config(format!(
                "Invalid sandbox command '{}'. Must be one of: {}",
                other,
                SANDBOX_COMMANDS.join(", ")
            )))
        }
    };

    let image = cli_image
        .map(str::to_string)
        .or_else(|| env(SANDBOX_IMAGE_ENV))
        .or_else(|| settings.sandbox_image.clone())
        .unwrap_or_else(|| DEFAULT_SANDBOX_IMAGE.to_string());

    debug!("Sandbox resolved: {} ({})", command, image);
    Ok(Some(SandboxConfig::new(command, image)))
}

fn detect<X: Fn(&str) -> bool>(available: &X) -> Option<String> {
    // macOS에서는 seatbelt를 먼저 시도
    if cfg!(target_os = "macos") && available("sandbox-exec") {
        return Some("sandbox-exec".to_string());
    }
    ["docker", "podman"]
        .into_iter()
        .find(|cmd| available(cmd))
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::types::SandboxSetting;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn only(cmds: &'static [&'static str]) -> impl Fn(&str) -> bool {
        move |cmd| cmds.contains(&cmd)
    }

    #[test]
    fn test_nothing_configured() {
        let resolved = resolve_sandbox_with(
            None,
            None,
            &KilnSettings::default(),
            env_of(&[]),
            only(&["docker"]),
        )
        .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_cli_beats_env_and_settings() {
        let settings = KilnSettings {
            sandbox: Some(SandboxSetting::Command("docker".into())),
            ..KilnSettings::default()
        };
        let resolved = resolve_sandbox_with(
            Some("podman"),
            None,
            &settings,
            env_of(&[(SANDBOX_ENV, "false")]),
            only(&["docker", "podman"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.command, "podman");
        assert_eq!(resolved.image, DEFAULT_SANDBOX_IMAGE);
    }

    #[test]
    fn test_env_disables_settings() {
        let settings = KilnSettings {
            sandbox: Some(SandboxSetting::Enabled(true)),
            ..KilnSettings::default()
        };
        let resolved = resolve_sandbox_with(
            None,
            None,
            &settings,
            env_of(&[(SANDBOX_ENV, "false")]),
            only(&["docker"]),
        )
        .unwrap();
        assert!(resolved.is_none());
    }

    #[test]
    fn test_true_autodetects() {
        let resolved = resolve_sandbox_with(
            Some("true"),
            None,
            &KilnSettings::default(),
            env_of(&[(SANDBOX_IMAGE_ENV, "custom:1")]),
            only(&["podman"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.command, "podman");
        assert_eq!(resolved.image, "custom:1");
    }

    #[test]
    fn test_errors() {
        let none_installed = resolve_sandbox_with(
            Some("true"),
            None,
            &KilnSettings::default(),
            env_of(&[]),
            only(&[]),
        );
        assert!(none_installed.is_err());

        let missing = resolve_sandbox_with(
            Some("docker"),
            None,
            &KilnSettings::default(),
            env_of(&[]),
            only(&["podman"]),
        );
        assert!(missing.is_err());

        let invalid = resolve_sandbox_with(
            Some("firejail"),
            None,
            &KilnSettings::default(),
            env_of(&[]),
            only(&["firejail"]),
        );
        assert!(invalid.is_err());
    }

    #[test]
    fn test_image_precedence() {
        let settings = KilnSettings {
            sandbox: Some(SandboxSetting::Command("docker".into())),
            sandbox_image: Some("from-settings".into()),
            ..KilnSettings::default()
        };
        let resolved = resolve_sandbox_with(
            None,
            Some("from-cli"),
            &settings,
            env_of(&[(SANDBOX_IMAGE_ENV, "from-env")]),
            only(&["docker"]),
        )
        .unwrap()
        .unwrap();
        assert_eq!(resolved.image, "from-cli");

        let resolved = resolve_sandbox_with(None, None, &settings, env_of(&[]), only(&["docker"]))
            .unwrap()
            .unwrap();
        assert_eq!(resolved.image, "from-settings");
    }
}
