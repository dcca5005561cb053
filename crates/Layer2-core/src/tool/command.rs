//! Root command extraction
//!
//! 복합 shell 명령에서 whitelist 단위가 되는 root command를 뽑아냅니다.
//!
//! ```text
//! "cat a | grep b"      → cat
//! "cd d && ls"          → cd   (roots: cd, ls)
//! "(echo hi)"           → echo
//! "/usr/bin/env node"   → env
//! "FOO=1 make test"     → make
//! ```

use std::path::Path;

/// 제어 키워드 (root로 보지 않음)
const SHELL_KEYWORDS: &[&str] = &[
    "then", "do", "else", "elif", "fi", "done", "esac", "time", "exec",
];

/// 연산자 기준으로 segment 분리
///
/// 따옴표/escape 안의 연산자는 무시합니다.
/// `2>&1`, `&>` 같은 redirection의 `&`는 구분자가 아닙니다.
pub fn split_segments(command: &str) -> Vec<String> {
    let chars: Vec<char> = command.chars().collect();
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut in_single = false;
    let mut in_double = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if escaped {
            current.push(c);
            escaped = false;
            continue;
        }

        match c {
            '\\' if !in_single => {
                current.push(c);
                escaped = true;
            }
            '\'' if !in_double => {
                in_single = !in_single;
                current.push(c);
            }
            '"' if !in_single => {
                in_double = !in_double;
                current.push(c);
            }
            '&' if !in_single && !in_double => {
                let prev = if i > 0 { chars[i - 1] } else { ' ' };
                let next = chars.get(i + 1).copied().unwrap_or(' ');
                if prev == '>' || prev == '<' || next == '>' {
                    current.push(c);
                } else {
                    segments.push(std::mem::take(&mut current));
                }
            }
            '|' | ';' | '\n' if !in_single && !in_double => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);

    segments
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// segment 하나의 root
fn segment_root(segment: &str) -> Option<String> {
    // subshell / brace group / negation
    let stripped = segment.trim_start_matches(|c: char| matches!(c, '(' | '{' | '!') || c.is_whitespace());

    let tokens = shlex::split(stripped)
        .unwrap_or_else(|| stripped.split_whitespace().map(str::to_string).collect());

    tokens
        .iter()
        .map(|t| t.trim_end_matches([')', '}']))
        .filter(|t| !t.is_empty())
        .find(|t| !is_assignment(t) && !SHELL_KEYWORDS.contains(t))
        .map(basename)
}

/// `VAR=value` 형태인지
fn is_assignment(token: &str) -> bool {
    match token.split_once('=') {
        Some((name, _)) => {
            let mut chars = name.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    }
}

fn basename(token: &str) -> String {
    if token.contains('/') {
        Path::new(token)
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| token.to_string())
    } else {
        token.to_string()
    }
}

/// 첫 번째 root command (whitelist key)
///
/// 공백뿐인 명령은 `None`.
pub fn command_root(command: &str) -> Option<String> {
    split_segments(command)
        .iter()
        .find_map(|segment| segment_root(segment))
}

/// 모든 segment의 root (중복 제거, 순서 유지)
pub fn command_roots(command: &str) -> Vec<String> {
    let mut roots: Vec<String> = Vec::new();
    for root in split_segments(command).iter().filter_map(|s| segment_root(s)) {
        if !roots.contains(&root) {
            roots.push(root);
        }
    }
    roots
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_table() {
        let cases = [
            ("ls", "ls"),
            ("git status", "git"),
            ("cat a | grep b", "cat"),
            ("cd d && ls", "cd"),
            ("/usr/bin/env node", "env"),
            ("(echo hi)", "echo"),
            ("{ echo hi; }", "echo"),
            ("! grep -q x file", "grep"),
            ("FOO=1 BAR=2 make test", "make"),
            ("\"/opt/my tools/run\" --fast", "run"),
        ];
        for (input, expected) in cases {
            assert_eq!(
                command_root(input).as_deref(),
                Some(expected),
                "input: {}",
                input
            );
        }
    }

    #[test]
    fn test_whitespace_only_has_no_root() {
        assert_eq!(command_root(""), None);
        assert_eq!(command_root("   \t  "), None);
        assert!(command_roots("  ").is_empty());
    }

    #[test]
    fn test_quoted_operators_not_split() {
        let segments = split_segments("echo 'a | b' && grep \"x;y\" f");
        assert_eq!(segments, vec!["echo 'a | b'", "grep \"x;y\" f"]);
    }

    #[test]
    fn test_redirection_ampersand() {
        assert_eq!(
            command_roots("cargo build 2>&1 | tail -n 5"),
            vec!["cargo".to_string(), "tail".to_string()]
        );
    }

    #[test]
    fn test_roots_dedup_in_order() {
        assert_eq!(
            command_roots("git add . ; git commit -m 'x' || echo failed & ls"),
            vec!["git".to_string(), "echo".to_string(), "ls".to_string()]
        );
    }
}
