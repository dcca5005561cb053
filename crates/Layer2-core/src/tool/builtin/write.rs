//! Write Tool - 파일 쓰기 도구
//!
//! working root 안의 파일을 새로 쓰거나 덮어씁니다.
//! Edit kind이므로 AutoEditApprove 모드에서는 확인 없이 실행됩니다.

use crate::tool::path::resolve_in_root;
use async_trait::async_trait;
use kiln_foundation::{
    CancellationToken, ConfirmationDetails, Error, Result, Tool, ToolContext, ToolKind,
    ToolOutput,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

/// Write 도구 입력
#[derive(Debug, Deserialize)]
pub struct WriteInput {
    /// 파일 경로
    pub path: String,

    /// 새 내용
    pub content: String,
}

/// Write 도구
pub struct WriteFileTool;

impl WriteFileTool {
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "write_file";

    fn parse(params: &Value) -> Result<WriteInput> {
        serde_json::from_value(params.clone())
            .map_err(|e| Error::validation(format!("Invalid parameters: {}", e)))
    }
}

impl Default for WriteFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "WriteFile"
    }

    fn description(&self) -> &str {
        "Write content to a file inside the working root, creating parent directories as needed. Overwrites existing files."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Edit
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path relative to the working root" },
                "content": { "type": "string", "description": "Full content to write" }
            },
            "required": ["path", "content"]
        })
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn validate(&self, params: &Value, ctx: &dyn ToolContext) -> Result<()> {
        let input = Self::parse(params)?;
        if input.path.trim().is_empty() {
            return Err(Error::validation("The 'path' parameter must be non-empty."));
        }
        let path = resolve_in_root(ctx.working_dir(), &input.path)?;
        if path.is_dir() {
            return Err(Error::validation(format!(
                "Path is a directory, not a file: {}",
                input.path
            )));
        }
        Ok(())
    }

    fn describe(&self, params: &Value) -> String {
        params
            .get("path")
            .and_then(Value::as_str)
            .map(|p| format!("Writing to {}", p))
            .unwrap_or_else(|| "Writing file".to_string())
    }

    fn confirmation(&self, params: &Value, ctx: &dyn ToolContext) -> Option<ConfirmationDetails> {
        let input = Self::parse(params).ok()?;
        let path = resolve_in_root(ctx.working_dir(), &input.path).ok()?;
        let original = std::fs::read_to_string(&path).ok();

        Some(ConfirmationDetails::Edit {
            title: format!("Confirm Write: {}", input.path),
            file_path: input.path,
            original,
            proposed: input.content,
        })
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &dyn ToolContext,
        cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let input = Self::parse(&params)?;
        let path = resolve_in_root(ctx.working_dir(), &input.path)?;
        let existed = path.exists();

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, input.content.as_bytes())
            .await
            .map_err(|e| {
                Error::tool_execution(Self::NAME, format!("Failed to write {}: {}", input.path, e))
            })?;

        info!("Wrote {} bytes to {}", input.content.len(), path.display());
        let message = if existed {
            format!("Successfully overwrote file: {}", input.path)
        } else {
            format!("Successfully created and wrote to new file: {}", input.path)
        };
        Ok(ToolOutput::new(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::context::RuntimeContext;
    use kiln_foundation::SessionPolicy;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_write_creates_parents() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = RuntimeContext::new("s", dir.path(), Arc::new(SessionPolicy::default()));

        let output = WriteFileTool::new()
            .execute(
                json!({ "path": "nested/out.txt", "content": "hi" }),
                &ctx,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert!(output.llm_content.contains("created"));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("nested/out.txt")).unwrap(),
            "hi"
        );
    }

    #[test]
    fn test_confirmation_carries_original() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("f.txt"), "old").unwrap();
        let ctx = RuntimeContext::new("s", dir.path(), Arc::new(SessionPolicy::default()));

        match WriteFileTool::new().confirmation(&json!({ "path": "f.txt", "content": "new" }), &ctx) {
            Some(ConfirmationDetails::Edit {
                original, proposed, ..
            }) => {
                assert_eq!(original.as_deref(), Some("old"));
                assert_eq!(proposed, "new");
            }
            other => panic!("expected edit confirmation, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_directory_target() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("d")).unwrap();
        let ctx = RuntimeContext::new("s", dir.path(), Arc::new(SessionPolicy::default()));
        let tool = WriteFileTool::new();
        assert!(tool.validate(&json!({ "path": "d", "content": "" }), &ctx).is_err());
        assert!(tool.validate(&json!({ "path": "d/x", "content": "" }), &ctx).is_ok());
        assert!(tool.validate(&json!({ "path": "x" }), &ctx).is_err());
    }
}
