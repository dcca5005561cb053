//! Command whitelist - 세션 동안 누적되는 allow key 집합
//!
//! Key 형식:
//! - shell root command: `ls`, `git`
//! - MCP 서버 전체: `mcp:<server>`
//! - MCP 도구 하나: `mcp:<server>.<tool>`
//! - 그 외 도구 전체: `tool:<name>`

use std::collections::BTreeSet;
use std::sync::RwLock;

/// MCP 서버 allow key
pub fn mcp_server_key(server: &str) -> String {
    format!("mcp:{}", server)
}

/// MCP 도구 allow key
pub fn mcp_tool_key(server: &str, tool: &str) -> String {
    format!("mcp:{}.{}", server, tool)
}

/// 도구 전체 allow key
pub fn tool_key(name: &str) -> String {
    format!("tool:{}", name)
}

/// Allow key 집합
///
/// 쓰기 경로는 ProceedAlways 계열 확인 결과 하나뿐입니다.
#[derive(Debug, Default)]
pub struct CommandWhitelist {
    keys: RwLock<BTreeSet<String>>,
}

impl CommandWhitelist {
    pub fn new() -> Self {
        Self::default()
    }

    /// 초기 key로 생성
    pub fn with_keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: RwLock::new(keys.into_iter().map(Into::into).collect()),
        }
    }

    /// 허용 여부
    pub fn contains(&self, key: &str) -> bool {
        self.keys
            .read()
            .map(|keys| keys.contains(key))
            .unwrap_or(false)
    }

    /// key 추가 (새로 추가되면 true)
    pub fn add(&self, key: impl Into<String>) -> bool {
        match self.keys.write() {
            Ok(mut keys) => keys.insert(key.into()),
            Err(_) => false,
        }
    }

    /// 정렬된 key 목록
    pub fn keys(&self) -> Vec<String> {
        self.keys
            .read()
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.keys.read().map(|keys| keys.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
