//! Shell Tool - Shell 명령 실행 도구
//!
//! Shell 명령을 실행하고 출력을 수집합니다.
//! - root command 단위 whitelist (`git`을 한 번 허용하면 모든 `git ...` 허용)
//! - sandbox (docker/podman/sandbox-exec) 경유 실행
//! - 취소 토큰 발화 시 child 종료
//! - 타임아웃 지원
//!
//! non-zero exit는 에러가 아니라 결과 내용의 일부입니다.
//! spawn 실패만 `Err`로 돌려줍니다.

use crate::tool::command::{command_root, command_roots};
use crate::tool::path::resolve_in_root;
use crate::tool::sandbox;
use async_trait::async_trait;
use kiln_foundation::{
    CancellationToken, ConfirmationDetails, Error, Result, Tool, ToolContext, ToolKind, ToolOutput,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::{debug, info};

/// Shell 도구 입력
#[derive(Debug, Deserialize)]
pub struct ShellInput {
    /// 실행할 명령어
    pub command: String,

    /// working root 기준 상대 디렉토리
    #[serde(default)]
    pub directory: Option<String>,

    /// 타임아웃 (밀리초, 기본: 120000 = 2분, 최대: 600000 = 10분)
    #[serde(default)]
    pub timeout: Option<u64>,

    /// 명령어 설명 (UI 표시용)
    #[serde(default)]
    pub description: Option<String>,
}

impl ShellInput {
    fn parse(params: &Value) -> Result<Self> {
        serde_json::from_value(params.clone())
            .map_err(|e| Error::validation(format!("Invalid parameters: {}", e)))
    }
}

/// 프로세스 종료 사유
enum Ending {
    Exited(std::io::Result<ExitStatus>),
    Cancelled,
    TimedOut,
}

/// Shell 도구
pub struct ShellTool;

impl ShellTool {
    /// 새 인스턴스 생성
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "shell";

    /// 기본 타임아웃 (2분)
    const DEFAULT_TIMEOUT_MS: u64 = 120_000;

    /// 최대 타임아웃 (10분)
    const MAX_TIMEOUT_MS: u64 = 600_000;

    /// 최대 출력 크기 (30KB)
    const MAX_OUTPUT_SIZE: usize = 30_000;

    /// 스트림별 수집 상한 (초과 여부를 truncate가 알 수 있도록 조금 더 받음)
    const CAPTURE_LIMIT: usize = Self::MAX_OUTPUT_SIZE + 4;

    /// 실행 디렉토리
    fn target_dir(root: &Path, directory: Option<&str>) -> Result<PathBuf> {
        match directory {
            Some(dir) if !dir.trim().is_empty() => resolve_in_root(root, dir),
            _ => Ok(root.to_path_buf()),
        }
    }

    /// 출력 크기 제한 (char 경계 유지)
    fn truncate(mut output: String) -> String {
        if output.len() > Self::MAX_OUTPUT_SIZE {
            let mut cut = Self::MAX_OUTPUT_SIZE;
            while !output.is_char_boundary(cut) {
                cut -= 1;
            }
            output.truncate(cut);
            output.push_str("\n... [output truncated]");
        }
        output
    }

    /// 모델에게 전달할 결과 문자열
    fn format_result(
        input: &ShellInput,
        stdout: &str,
        stderr: &str,
        note: Option<&str>,
        status: Option<&ExitStatus>,
    ) -> String {
        let mut text = format!(
            "Command: {}\nDirectory: {}\nStdout: {}\nStderr: {}\n",
            input.command,
            input.directory.as_deref().unwrap_or("(root)"),
            if stdout.is_empty() { "(empty)" } else { stdout.trim_end() },
            if stderr.is_empty() { "(empty)" } else { stderr.trim_end() },
        );
        if let Some(note) = note {
            text.push_str(&format!("Error: {}\n", note));
        }
        match status.and_then(|s| s.code()) {
            Some(code) => text.push_str(&format!("Exit Code: {}\n", code)),
            None => text.push_str("Exit Code: (none)\n"),
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.and_then(|s| s.signal()) {
                text.push_str(&format!("Signal: {}\n", signal));
            }
        }
        Self::truncate(text)
    }

    /// 사용자에게 보여줄 문자열
    fn format_display(stdout: &str, stderr: &str, status: Option<&ExitStatus>) -> String {
        let mut display = String::new();
        if !stdout.is_empty() {
            display.push_str(stdout.trim_end());
        }
        if !stderr.is_empty() {
            if !display.is_empty() {
                display.push('\n');
            }
            display.push_str(stderr.trim_end());
        }
        if display.is_empty() {
            display = match status.and_then(|s| s.code()) {
                Some(0) => "[Command completed successfully with no output]".to_string(),
                Some(code) => format!("Command exited with code {}", code),
                None => "Command terminated by signal".to_string(),
            };
        }
        Self::truncate(display)
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "Shell"
    }

    fn description(&self) -> &str {
        "Execute a shell command with `bash -c <command>` in the working root (or a relative \
         `directory` under it). Returns Command, Directory, Stdout, Stderr, Error, Exit Code \
         and Signal. A non-zero exit code is reported in the result, not as a failure."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Execute
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "command": {
                    "type": "string",
                    "description": "Exact bash command to execute"
                },
                "directory": {
                    "type": "string",
                    "description": "Directory to run the command in, relative to the working root. Must already exist."
                },
                "timeout": {
                    "type": "number",
                    "description": "Optional timeout in milliseconds (max 600000)"
                },
                "description": {
                    "type": "string",
                    "description": "Brief description of the command for the user"
                }
            },
            "required": ["command"]
        })
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn validate(&self, params: &Value, ctx: &dyn ToolContext) -> Result<()> {
        let input = ShellInput::parse(params)?;

        if input.command.trim().is_empty() {
            return Err(Error::validation("Command cannot be empty."));
        }
        if command_root(&input.command).is_none() {
            return Err(Error::validation(
                "Could not identify command root to obtain permission from user.",
            ));
        }

        if let Some(dir) = input.directory.as_deref() {
            if Path::new(dir).is_absolute() {
                return Err(Error::validation(
                    "Directory cannot be absolute. Must be relative to the working root.",
                ));
            }
            let resolved = resolve_in_root(ctx.working_dir(), dir)?;
            if !resolved.is_dir() {
                return Err(Error::validation(format!(
                    "Directory '{}' must exist under the working root.",
                    dir
                )));
            }
        }
        Ok(())
    }

    fn describe(&self, params: &Value) -> String {
        let Ok(input) = ShellInput::parse(params) else {
            return self.display_name().to_string();
        };
        let mut text = input.command.clone();
        if let Some(dir) = &input.directory {
            text.push_str(&format!(" [in {}]", dir));
        }
        if let Some(desc) = &input.description {
            text.push_str(&format!(" ({})", desc.replace('\n', " ")));
        }
        text
    }

    fn confirmation(&self, params: &Value, ctx: &dyn ToolContext) -> Option<ConfirmationDetails> {
        let input = ShellInput::parse(params).ok()?;
        let root = command_root(&input.command)?;
        let roots = command_roots(&input.command);

        // 모든 segment root가 허용되어야 건너뜀
        let policy = ctx.policy();
        if policy.is_allowed(&root) && roots.iter().all(|r| policy.is_allowed(r)) {
            debug!("Root commands {:?} already whitelisted", roots);
            return None;
        }

        Some(ConfirmationDetails::Exec {
            title: "Confirm Shell Command".to_string(),
            roots,
            command: input.command,
            root_command: root,
        })
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &dyn ToolContext,
        cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Ok(ToolOutput::new("Command cancelled before start."));
        }

        let input = ShellInput::parse(&params)?;
        let root = ctx.working_dir();
        let cwd = Self::target_dir(root, input.directory.as_deref())?;
        let timeout_ms = input
            .timeout
            .unwrap_or(Self::DEFAULT_TIMEOUT_MS)
            .min(Self::MAX_TIMEOUT_MS);

        let mut cmd = sandbox::build_command(&input.command, root, &cwd, ctx.sandbox());
        cmd.envs(ctx.env())
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!("Executing shell command: {}", input.command);
        let mut child = cmd.spawn().map_err(|e| {
            Error::tool_execution(Self::NAME, format!("Failed to spawn process: {}", e))
        })?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();
        let mut stdout_buf = Vec::new();
        let mut stderr_buf = Vec::new();

        let ending = {
            let run = async {
                let read_out = async {
                    if let Some(pipe) = stdout_pipe.as_mut() {
                        read_capped(pipe, &mut stdout_buf, Self::CAPTURE_LIMIT).await;
                    }
                };
                let read_err = async {
                    if let Some(pipe) = stderr_pipe.as_mut() {
                        read_capped(pipe, &mut stderr_buf, Self::CAPTURE_LIMIT).await;
                    }
                };
                let (_, _, status) = tokio::join!(read_out, read_err, child.wait());
                status
            };

            tokio::select! {
                status = run => Ending::Exited(status),
                _ = cancel.cancelled() => Ending::Cancelled,
                _ = tokio::time::sleep(Duration::from_millis(timeout_ms)) => Ending::TimedOut,
            }
        };

        let (note, status) = match ending {
            Ending::Exited(Ok(status)) => (None, Some(status)),
            Ending::Exited(Err(e)) => {
                return Err(Error::tool_execution(
                    Self::NAME,
                    format!("Failed to wait for process: {}", e),
                ));
            }
            Ending::Cancelled => {
                let _ = child.kill().await;
                (Some("Command was cancelled by user before it could complete.".to_string()), None)
            }
            Ending::TimedOut => {
                let _ = child.kill().await;
                (Some(format!("Command timed out after {} ms", timeout_ms)), None)
            }
        };

        let stdout = String::from_utf8_lossy(&stdout_buf);
        let stderr = String::from_utf8_lossy(&stderr_buf);

        let content = Self::format_result(&input, &stdout, &stderr, note.as_deref(), status.as_ref());
        let display = match &note {
            Some(note) => note.clone(),
            None => Self::format_display(&stdout, &stderr, status.as_ref()),
        };

        Ok(ToolOutput::new(content).with_display(display))
    }
}

/// `limit` 바이트까지만 모으고 나머지는 읽어서 버림
///
/// 파이프를 끝까지 비워야 child가 write에서 막히지 않습니다.
async fn read_capped<R>(pipe: &mut R, buf: &mut Vec<u8>, limit: usize)
where
    R: AsyncRead + Unpin,
{
    let mut chunk = [0u8; 8192];
    loop {
        match pipe.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                let room = limit.saturating_sub(buf.len());
                buf.extend_from_slice(&chunk[..n.min(room)]);
            }
        }
    }
}

// ============================================================================
// 테스트
// ============================================================================
