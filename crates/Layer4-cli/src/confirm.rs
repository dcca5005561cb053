//! stdin 확인 프롬프트 (terminal layer)
//!
//! Scheduler가 보낸 `ConfirmationRequest`를 하나씩 표시하고 답을 읽어 resolve합니다.

use kiln_foundation::{ConfirmationDetails, ConfirmationOutcome, ConfirmationRequest};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// 프롬프트 task 시작
///
/// stdin이 닫히면 남은 요청은 모두 취소로 응답합니다.
pub fn spawn_prompt(rx: mpsc::UnboundedReceiver<ConfirmationRequest>) -> JoinHandle<()> {
    tokio::spawn(prompt_loop(rx, tokio::io::stdin()))
}

/// 답 대기 결과
enum Answer {
    Line(Option<String>),
    Voided,
}

async fn prompt_loop<R>(mut rx: mpsc::UnboundedReceiver<ConfirmationRequest>, input: R)
where
    R: AsyncRead + Unpin,
{
    let mut lines = BufReader::new(input).lines();

    while let Some(mut request) = rx.recv().await {
        // 이미 취소된 호출은 묻지 않음
        if !request.responder.is_pending() {
            debug!("Skipping confirmation for cancelled call {}", request.call_id);
            continue;
        }

        eprintln!();
        eprintln!("{}", request.details.title());
        eprintln!("  {}", request.details.summary());
        if let ConfirmationDetails::Exec { roots, .. } = &request.details {
            if roots.len() > 1 {
                eprintln!("  roots: {}", roots.join(", "));
            }
        }
        eprint!("{} ", choices(&request.details));

        // next_line은 cancel-safe
        let answer = tokio::select! {
            line = lines.next_line() => Answer::Line(line.ok().flatten()),
            _ = request.responder.closed() => Answer::Voided,
        };

        match answer {
            Answer::Line(Some(line)) => {
                let outcome = parse_answer(&line, &request.details);
                request.resolve(outcome);
            }
            Answer::Line(None) => request.resolve(ConfirmationOutcome::Cancel),
            Answer::Voided => {
                eprintln!("(cancelled)");
                debug!("Confirmation voided for {}", request.call_id);
            }
        }
    }
}

fn choices(details: &ConfirmationDetails) -> &'static str {
    match details {
        ConfirmationDetails::Edit { .. } => "Allow? [y]es / [e]dits auto-approve / [n]o:",
        ConfirmationDetails::Mcp { .. } => "Allow? [y]es / [a]lways tool / [s]erver / [n]o:",
        _ => "Allow? [y]es / [a]lways / [n]o:",
    }
}

/// 답 해석 (알 수 없는 답은 거부)
pub fn parse_answer(answer: &str, details: &ConfirmationDetails) -> ConfirmationOutcome {
    let answer = answer.trim().to_ascii_lowercase();
    match (answer.as_str(), details) {
        ("y" | "yes", _) => ConfirmationOutcome::ProceedOnce,
        ("e" | "edits", ConfirmationDetails::Edit { .. }) => ConfirmationOutcome::ApproveEdit,
        ("a" | "always", ConfirmationDetails::Edit { .. }) => ConfirmationOutcome::ApproveEdit,
        ("a" | "always", ConfirmationDetails::Mcp { .. }) => ConfirmationOutcome::ProceedAlwaysTool,
        ("a" | "always", _) => ConfirmationOutcome::ProceedAlways,
        ("s" | "server", ConfirmationDetails::Mcp { .. }) => {
            ConfirmationOutcome::ProceedAlwaysServer
        }
        ("c" | "cancel", _) => ConfirmationOutcome::Cancel,
        _ => ConfirmationOutcome::Deny,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exec() -> ConfirmationDetails {
        ConfirmationDetails::Exec {
            title: "Confirm Shell Command".into(),
            command: "ls -la".into(),
            root_command: "ls".into(),
            roots: vec!["ls".into()],
        }
    }

    fn edit() -> ConfirmationDetails {
        ConfirmationDetails::Edit {
            title: "Confirm Write: a.txt".into(),
            file_path: "a.txt".into(),
            original: None,
            proposed: "x".into(),
        }
    }

    #[tokio::test]
    async fn test_cancelled_call_releases_prompt() {
        // 쓰기 쪽을 열어 둔 채 (입력 없음)
        let (_writer, reader) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(prompt_loop(rx, reader));

        let (request, outcome_rx) = ConfirmationRequest::new("c1", "shell", exec());
        tx.send(request).unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        drop(outcome_rx);
        drop(tx);

        let finished = tokio::time::timeout(std::time::Duration::from_secs(2), handle).await;
        assert!(finished.is_ok(), "prompt task still waiting on input");
    }

    #[tokio::test]
    async fn test_stale_request_does_not_consume_answer() {
        use tokio::io::AsyncWriteExt;

        let (mut writer, reader) = tokio::io::duplex(64);
        let (tx, rx) = mpsc::unbounded_channel();

        let (stale, stale_rx) = ConfirmationRequest::new("old", "shell", exec());
        drop(stale_rx);
        let (live, live_rx) = ConfirmationRequest::new("new", "shell", exec());
        tx.send(stale).unwrap();
        tx.send(live).unwrap();
        drop(tx);

        let handle = tokio::spawn(prompt_loop(rx, reader));
        writer.write_all(b"y\n").await.unwrap();

        assert_eq!(live_rx.await.unwrap(), ConfirmationOutcome::ProceedOnce);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_closed_input_cancels() {
        let (writer, reader) = tokio::io::duplex(64);
        drop(writer);
        let (tx, rx) = mpsc::unbounded_channel();
        let (request, outcome_rx) = ConfirmationRequest::new("c1", "write_file", edit());
        tx.send(request).unwrap();
        drop(tx);

        prompt_loop(rx, reader).await;
        assert_eq!(outcome_rx.await.unwrap(), ConfirmationOutcome::Cancel);
    }

    #[test]
    fn test_parse_answer() {
        assert_eq!(parse_answer("y", &exec()), ConfirmationOutcome::ProceedOnce);
        assert_eq!(parse_answer(" Always \n", &exec()), ConfirmationOutcome::ProceedAlways);
        assert_eq!(parse_answer("e", &edit()), ConfirmationOutcome::ApproveEdit);
        assert_eq!(parse_answer("e", &exec()), ConfirmationOutcome::Deny);
        assert_eq!(parse_answer("", &exec()), ConfirmationOutcome::Deny);
        assert_eq!(parse_answer("c", &edit()), ConfirmationOutcome::Cancel);

        let mcp = ConfirmationDetails::Mcp {
            title: "Confirm MCP Tool".into(),
            server_name: "gh".into(),
            tool_name: "issues".into(),
        };
        assert_eq!(parse_answer("s", &mcp), ConfirmationOutcome::ProceedAlwaysServer);
        assert_eq!(parse_answer("a", &mcp), ConfirmationOutcome::ProceedAlwaysTool);
    }
}
