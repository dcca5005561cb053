//! Hook 타입 정의
//!
//! settings.json의 `hooks` 형식:
//!
//! ```text
//! {
//!   "hooks": {
//!     "PreToolUse": [
//!       { "type": "command", "command": "echo $KILN_TOOL_NAME >> tools.log", "matcher": "shell" }
//!     ],
//!     "SessionStart": [
//!       { "type": "command", "command": "./scripts/warmup.sh", "timeout": 2000 }
//!     ]
//!   }
//! }
//! ```

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

// ============================================================================
// HookEventType - 이벤트 타입
// ============================================================================

/// 알려진 lifecycle 이벤트
///
/// settings에는 임의의 이벤트 이름도 쓸 수 있습니다.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEventType {
    /// 세션 시작
    SessionStart,
    /// 세션 종료
    SessionEnd,
    /// Tool 실행 직전 (승인 이후)
    PreToolUse,
    /// Tool 실행 후
    PostToolUse,
    /// 사용자 알림
    Notification,
    /// 프롬프트 제출
    UserPromptSubmit,
    /// 응답 종료
    Stop,
}

impl HookEventType {
    pub const ALL: [HookEventType; 7] = [
        HookEventType::SessionStart,
        HookEventType::SessionEnd,
        HookEventType::PreToolUse,
        HookEventType::PostToolUse,
        HookEventType::Notification,
        HookEventType::UserPromptSubmit,
        HookEventType::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SessionStart => "SessionStart",
            Self::SessionEnd => "SessionEnd",
            Self::PreToolUse => "PreToolUse",
            Self::PostToolUse => "PostToolUse",
            Self::Notification => "Notification",
            Self::UserPromptSubmit => "UserPromptSubmit",
            Self::Stop => "Stop",
        }
    }

    /// 이름으로 조회 (대소문자/구분자 무시)
    pub fn parse(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|e| e.as_str().to_ascii_lowercase() == key)
    }
}

impl std::fmt::Display for HookEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// HookEntry - settings 항목
// ============================================================================

/// Hook 종류 (현재는 command만)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HookEntryType {
    #[default]
    Command,
}

/// Hook 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookEntry {
    #[serde(rename = "type", default)]
    pub kind: HookEntryType,

    /// `sh -c`로 실행할 명령
    pub command: String,

    /// 대상 이름 필터 (tool 이름 등). 정규식, `*`는 전체
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matcher: Option<String>,

    /// 타임아웃 (밀리초)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl HookEntry {
    /// command hook 생성
    pub fn command(command: impl Into<String>) -> Self {
        Self {
            kind: HookEntryType::Command,
            command: command.into(),
            matcher: None,
            timeout: None,
        }
    }

    pub fn with_matcher(mut self, matcher: impl Into<String>) -> Self {
        self.matcher = Some(matcher.into());
        self
    }

    pub fn with_timeout_ms(mut self, ms: u64) -> Self {
        self.timeout = Some(ms);
        self
    }

    /// 항목 타임아웃 (없으면 기본값)
    pub fn timeout_or(&self, default: Duration) -> Duration {
        self.timeout.map(Duration::from_millis).unwrap_or(default)
    }

    /// 대상과 matcher 비교
    ///
    /// 대상이 없는 이벤트(SessionStart 등)는 matcher와 상관없이 실행됩니다.
    pub fn matches(&self, target: Option<&str>) -> bool {
        let (Some(pattern), Some(target)) = (self.matcher.as_deref(), target) else {
            return true;
        };
        if pattern.is_empty() || pattern == "*" {
            return true;
        }
        match Regex::new(&format!("^(?:{})$", pattern)) {
            Ok(re) => re.is_match(target),
            Err(_) => pattern == target,
        }
    }
}

/// 이벤트 이름 → hook 목록
pub type HooksSettings = BTreeMap<String, Vec<HookEntry>>;

// ============================================================================
// merge_hooks
// ============================================================================

/// user scope와 workspace scope hook 병합
///
/// 같은 이벤트는 user 항목 뒤에 workspace 항목을 붙입니다.
/// 한쪽만 있으면 그대로 돌려줍니다.
pub fn merge_hooks(
    user: Option<HooksSettings>,
    workspace: Option<HooksSettings>,
) -> Option<HooksSettings> {
    match (user, workspace) {
        (None, None) => None,
        (Some(user), None) => Some(user),
        (None, Some(workspace)) => Some(workspace),
        (Some(mut merged), Some(workspace)) => {
            for (event, entries) in workspace {
                merged.entry(event).or_default().extend(entries);
            }
            Some(merged)
        }
    }
}

// ============================================================================
// HookEvent - 발생한 이벤트
// ============================================================================

/// 발생한 이벤트
#[derive(Debug, Clone)]
pub struct HookEvent {
    /// 이벤트 이름
    pub name: String,

    /// matcher 비교 대상 (tool 이름 등)
    pub target: Option<String>,

    /// hook 프로세스에 추가할 환경 변수
    pub env: HashMap<String, String>,
}

impl HookEvent {
    pub fn new(event: HookEventType) -> Self {
        Self::named(event.as_str())
    }

    /// 임의 이름 이벤트
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target: None,
            env: HashMap::new(),
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }
}
