//! Todo Tools - 작업 목록 읽기/쓰기
//!
//! 세션 시작 시 `.kiln/todos.json`을 한 번 읽고, 쓰기마다 파일 전체를 다시 씁니다.
//! 파일 쓰기 실패는 경고만 남기고 메모리 상태는 유지됩니다.

use async_trait::async_trait;
use kiln_foundation::{
    CancellationToken, Error, JsonStore, Result, Tool, ToolContext, ToolKind, ToolOutput,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Task list 파일 이름
pub const TODOS_FILE: &str = "todos.json";

// ============================================================================
// TodoItem
// ============================================================================

/// 작업 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
}

impl TodoStatus {
    fn marker(&self) -> &'static str {
        match self {
            TodoStatus::Pending => "[ ]",
            TodoStatus::InProgress => "[~]",
            TodoStatus::Completed => "[x]",
        }
    }
}

/// 작업 항목
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TodoItem {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
}

// ============================================================================
// TodoStore
// ============================================================================

/// 작업 목록 저장소 (메모리 + 선택적 파일)
#[derive(Debug, Default)]
pub struct TodoStore {
    items: RwLock<Vec<TodoItem>>,
    file: Option<JsonStore>,
}

impl TodoStore {
    /// 파일 없이 메모리만 사용
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// 파일에서 한 번 로드
    ///
    /// 읽기 실패는 빈 목록으로 시작합니다.
    pub fn load(file: JsonStore) -> Self {
        let items = match file.load_optional::<Vec<TodoItem>>(TODOS_FILE) {
            Ok(Some(items)) => {
                debug!("Loaded {} todos from {}", items.len(), file.base_dir().display());
                items
            }
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load task list: {}", e);
                Vec::new()
            }
        };
        Self {
            items: RwLock::new(items),
            file: Some(file),
        }
    }

    /// 현재 목록
    pub fn items(&self) -> Vec<TodoItem> {
        self.items.read().map(|items| items.clone()).unwrap_or_default()
    }

    /// 목록 전체 교체 후 저장
    pub fn replace(&self, items: Vec<TodoItem>) {
        if let Ok(mut current) = self.items.write() {
            *current = items.clone();
        }
        if let Some(file) = &self.file {
            if let Err(e) = file.save(TODOS_FILE, &items) {
                warn!("Failed to persist task list: {}", e);
            }
        }
    }

    /// 체크리스트 형식 문자열
    pub fn render(items: &[TodoItem]) -> String {
        if items.is_empty() {
            return "(no tasks)".to_string();
        }
        items
            .iter()
            .map(|item| format!("{} {} ({})", item.status.marker(), item.content, item.id))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

// ============================================================================
// TodoReadTool
// ============================================================================

/// 작업 목록 읽기
pub struct TodoReadTool {
    store: Arc<TodoStore>,
}

impl TodoReadTool {
    pub const NAME: &'static str = "todo_read";

    pub fn new(store: Arc<TodoStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for TodoReadTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "TodoRead"
    }

    fn description(&self) -> &str {
        "Read the current session task list."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Think
    }

    fn schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(
        &self,
        _params: Value,
        _ctx: &dyn ToolContext,
        _cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        let items = self.store.items();
        let content = serde_json::to_string(&items)?;
        Ok(ToolOutput::new(content).with_display(TodoStore::render(&items)))
    }
}

// ============================================================================
// TodoWriteTool
// ============================================================================

#[derive(Debug, Deserialize)]
struct TodoWriteInput {
    todos: Vec<TodoItem>,
}

/// 작업 목록 쓰기 (전체 교체)
pub struct TodoWriteTool {
    store: Arc<TodoStore>,
}

impl TodoWriteTool {
    pub const NAME: &'static str = "todo_write";

    pub fn new(store: Arc<TodoStore>) -> Self {
        Self { store }
    }

    fn parse(params: &Value) -> Result<TodoWriteInput> {
        serde_json::from_value(params.clone())
            .map_err(|e| Error::validation(format!("Invalid parameters: {}", e)))
    }
}

#[async_trait]
impl Tool for TodoWriteTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "TodoWrite"
    }

    fn description(&self) -> &str {
        "Replace the session task list. At most one task may be in_progress."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Think
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "todos": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "content": { "type": "string" },
                            "status": { "type": "string", "enum": ["pending", "in_progress", "completed"] }
                        },
                        "required": ["id", "content", "status"]
                    }
                }
            },
            "required": ["todos"]
        })
    }

    fn validate(&self, params: &Value, _ctx: &dyn ToolContext) -> Result<()> {
        let input = Self::parse(params)?;
        let in_progress = input
            .todos
            .iter()
            .filter(|t| t.status == TodoStatus::InProgress)
            .count();
        if in_progress > 1 {
            return Err(Error::validation(
                "Only one task can be in_progress at a time.",
            ));
        }
        if input.todos.iter().any(|t| t.content.trim().is_empty()) {
            return Err(Error::validation("Task content must be non-empty."));
        }
        Ok(())
    }

    async fn execute(
        &self,
        params: Value,
        _ctx: &dyn ToolContext,
        _cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        let input = Self::parse(&params)?;
        let count = input.todos.len();
        let display = TodoStore::render(&input.todos);
        self.store.replace(input.todos);
        Ok(ToolOutput::new(format!("Task list updated ({} items).", count)).with_display(display))
    }
}
