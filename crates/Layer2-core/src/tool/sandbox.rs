//! Sandbox command wrapping
//!
//! Shell 명령을 설정된 sandbox를 통해 실행하도록 `Command`를 구성합니다.
//!
//! - `docker` / `podman`: `run --rm -i -v <root>:<root> -w <cwd> <image> sh -c <cmd>`
//! - `sandbox-exec` (macOS Seatbelt): `sandbox-exec -p <profile> bash -c <cmd>`
//! - 없음: `bash -c <cmd>` (bash가 없으면 `sh`)

use kiln_foundation::SandboxConfig;
use std::path::Path;
use tokio::process::Command;

/// 호스트 shell 실행 파일
pub fn host_shell() -> &'static str {
    if which::which("bash").is_ok() {
        "bash"
    } else {
        "sh"
    }
}

/// Seatbelt profile 생성
///
/// 기본 거부, 시스템 경로 읽기, 임시 디렉토리와 working root 쓰기 허용.
pub fn seatbelt_profile(working_root: &Path) -> String {
    let mut profile = String::from(
        r#"(version 1)
(deny default)
(allow process-fork)
(allow process-exec)
(allow signal (target self))
(allow sysctl-read)
(allow file-read*)
(allow file-write*
    (subpath "/tmp")
    (subpath "/private/tmp")
    (subpath "/private/var/folders")
    (literal "/dev/null")
    (literal "/dev/stdout")
    (literal "/dev/stderr"))
"#,
    );
    profile.push_str(&format!(
        "(allow file-write* (subpath \"{}\"))\n",
        working_root.display()
    ));
    profile
}

/// 컨테이너 실행 인자
pub fn container_args(
    sandbox: &SandboxConfig,
    command: &str,
    working_root: &Path,
    cwd: &Path,
) -> Vec<String> {
    let root = working_root.display().to_string();
    vec![
        "run".to_string(),
        "--rm".to_string(),
        "-i".to_string(),
        "-v".to_string(),
        format!("{}:{}", root, root),
        "-w".to_string(),
        cwd.display().to_string(),
        sandbox.image.clone(),
        "sh".to_string(),
        "-c".to_string(),
        command.to_string(),
    ]
}

/// 실행할 `Command` 구성
///
/// stdio 설정과 spawn은 호출측 책임입니다.
pub fn build_command(
    command: &str,
    working_root: &Path,
    cwd: &Path,
    sandbox: Option<&SandboxConfig>,
) -> Command {
    match sandbox {
        Some(sb) if sb.is_container() => {
            let mut cmd = Command::new(&sb.command);
            cmd.args(container_args(sb, command, working_root, cwd));
            cmd
        }
        Some(sb) if sb.command == "sandbox-exec" => {
            let mut cmd = Command::new("sandbox-exec");
            cmd.arg("-p")
                .arg(seatbelt_profile(working_root))
                .arg(host_shell())
                .arg("-c")
                .arg(command)
                .current_dir(cwd);
            cmd
        }
        _ => {
            let mut cmd = Command::new(host_shell());
            cmd.arg("-c").arg(command).current_dir(cwd);
            cmd
        }
    }
}
