//! Tool Registry - 도구 등록 및 관리
//!
//! 세션이 사용하는 모든 도구를 이름으로 보관합니다.
//! 등록 순서가 유지되어 agent profile 필터링과 schema 목록이 결정적입니다.
//!
//! ```ignore
//! let registry = ToolRegistry::with_builtins();
//!
//! if let Some(tool) = registry.get("shell") {
//!     tool.validate(&params, &ctx)?;
//! }
//! ```

use super::builtin;
use kiln_foundation::Tool;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// 도구 레지스트리
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// 빈 레지스트리 생성
    pub fn new() -> Self {
        Self::default()
    }

    /// Builtin 도구들을 포함한 레지스트리 생성
    pub fn with_builtins() -> Self {
        Self::from_tools(builtin::all_tools())
    }

    /// workspace용 builtin 레지스트리 (task list를 `.kiln/todos.json`에 저장)
    pub fn for_workspace(root: &std::path::Path) -> Self {
        Self::from_tools(builtin::workspace_tools(root))
    }

    /// 도구 목록으로 생성
    pub fn from_tools(tools: Vec<Arc<dyn Tool>>) -> Self {
        let mut registry = Self::new();
        for tool in tools {
            registry.register(tool);
        }
        registry
    }

    /// 도구 등록
    ///
    /// 같은 이름이 있으면 위치를 유지한 채 교체합니다.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&pos) => {
                debug!("Replacing tool '{}'", name);
                self.tools[pos] = tool;
            }
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// 도구 조회
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.index.get(name).map(|&pos| Arc::clone(&self.tools[pos]))
    }

    /// 도구 존재 여부
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// 모든 도구 (등록 순서)
    pub fn all(&self) -> Vec<Arc<dyn Tool>> {
        self.tools.clone()
    }

    /// 모든 도구 이름 (등록 순서)
    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// 도구 개수
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// 비어있는지 확인
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Function declaration 목록 (provider 전달용)
    pub fn definitions(&self) -> Vec<Value> {
        self.tools.iter().map(|t| t.definition()).collect()
    }
}

// ============================================================================
// 테스트
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_registered_in_order() {
        let registry = ToolRegistry::with_builtins();
        assert_eq!(
            registry.names(),
            vec![
                "read_file",
                "write_file",
                "shell",
                "web_fetch",
                "todo_read",
                "todo_write"
            ]
        );
        assert!(registry.contains("shell"));
        assert!(registry.get("frobnicate").is_none());
    }

    #[test]
    fn test_register_replaces_in_place() {
        let mut registry = ToolRegistry::with_builtins();
        let before = registry.len();
        registry.register(Arc::new(builtin::ShellTool::new()));
        assert_eq!(registry.len(), before);
        assert_eq!(registry.names()[2], "shell");
    }

    #[test]
    fn test_definitions_shape() {
        let registry = ToolRegistry::with_builtins();
        let defs = registry.definitions();
        assert_eq!(defs.len(), registry.len());
        assert_eq!(defs[2]["name"], "shell");
        assert!(defs[2]["parameters"]["properties"]["command"].is_object());
    }
}
