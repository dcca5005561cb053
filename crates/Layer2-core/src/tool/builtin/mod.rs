//! Builtin Tools
//!
//! - `read_file`: 파일 읽기 (Read)
//! - `write_file`: 파일 쓰기 (Edit)
//! - `shell`: Shell 명령 실행 (Execute)
//! - `web_fetch`: URL 가져오기 (Fetch)
//! - `todo_read` / `todo_write`: 작업 목록 (Think)

mod read;
mod shell;
mod todo;
mod web_fetch;
mod write;

pub use read::{ReadFileTool, ReadInput};
pub use shell::{ShellInput, ShellTool};
pub use todo::{TodoItem, TodoReadTool, TodoStatus, TodoStore, TodoWriteTool, TODOS_FILE};
pub use web_fetch::{WebFetchInput, WebFetchTool};
pub use write::{WriteFileTool, WriteInput};

use kiln_foundation::{JsonStore, Tool};
use std::path::Path;
use std::sync::Arc;

/// 주어진 task list 저장소로 모든 builtin 도구 생성
pub fn tools_with_store(todos: Arc<TodoStore>) -> Vec<Arc<dyn Tool>> {
    vec![
        Arc::new(ReadFileTool::new()),
        Arc::new(WriteFileTool::new()),
        Arc::new(ShellTool::new()),
        Arc::new(WebFetchTool::new()),
        Arc::new(TodoReadTool::new(Arc::clone(&todos))),
        Arc::new(TodoWriteTool::new(todos)),
    ]
}

/// 모든 builtin 도구 (task list는 메모리만)
pub fn all_tools() -> Vec<Arc<dyn Tool>> {
    tools_with_store(Arc::new(TodoStore::in_memory()))
}

/// workspace용 builtin 도구 (`<root>/.kiln/todos.json` 사용)
pub fn workspace_tools(root: &Path) -> Vec<Arc<dyn Tool>> {
    tools_with_store(Arc::new(TodoStore::load(JsonStore::workspace(root))))
}
