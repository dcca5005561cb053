//! Read Tool - 파일 읽기 도구
//!
//! working root 안의 텍스트 파일을 읽습니다.
//! - offset/limit 지원 (1-based 줄 번호)
//! - 확인 없이 실행 (Read kind)

use crate::tool::path::resolve_in_root;
use async_trait::async_trait;
use kiln_foundation::{
    CancellationToken, Error, Result, Tool, ToolContext, ToolKind, ToolOutput,
};
use serde::Deserialize;
use serde_json::{json, Value};

/// Read 도구 입력
#[derive(Debug, Deserialize)]
pub struct ReadInput {
    /// 파일 경로 (working root 기준 상대 또는 root 안의 절대 경로)
    pub path: String,

    /// 시작 줄 번호 (1-based)
    #[serde(default)]
    pub offset: Option<usize>,

    /// 최대 줄 수 (기본: 2000)
    #[serde(default)]
    pub limit: Option<usize>,
}

/// Read 도구
pub struct ReadFileTool;

impl ReadFileTool {
    pub fn new() -> Self {
        Self
    }

    /// 도구 이름
    pub const NAME: &'static str = "read_file";

    /// 기본 줄 제한
    const DEFAULT_LIMIT: usize = 2000;

    fn parse(params: &Value) -> Result<ReadInput> {
        serde_json::from_value(params.clone())
            .map_err(|e| Error::validation(format!("Invalid parameters: {}", e)))
    }
}

impl Default for ReadFileTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "ReadFile"
    }

    fn description(&self) -> &str {
        "Read a text file inside the working root. Supports optional 1-based `offset` and `limit` line windows."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Read
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "path": { "type": "string", "description": "File path relative to the working root" },
                "offset": { "type": "number", "description": "First line to read (1-based)" },
                "limit": { "type": "number", "description": "Maximum number of lines to read" }
            },
            "required": ["path"]
        })
    }

    fn validate(&self, params: &Value, ctx: &dyn ToolContext) -> Result<()> {
        let input = Self::parse(params)?;
        if input.path.trim().is_empty() {
            return Err(Error::validation("The 'path' parameter must be non-empty."));
        }
        if input.offset == Some(0) {
            return Err(Error::validation("Offset is 1-based and must be at least 1."));
        }
        resolve_in_root(ctx.working_dir(), &input.path)?;
        Ok(())
    }

    fn describe(&self, params: &Value) -> String {
        params
            .get("path")
            .and_then(Value::as_str)
            .unwrap_or("(unknown file)")
            .to_string()
    }

    async fn execute(
        &self,
        params: Value,
        ctx: &dyn ToolContext,
        _cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        let input = Self::parse(&params)?;
        let path = resolve_in_root(ctx.working_dir(), &input.path)?;

        let content = tokio::fs::read_to_string(&path).await.map_err(|e| {
            Error::tool_execution(Self::NAME, format!("Failed to read {}: {}", input.path, e))
        })?;

        let total = content.lines().count();
        let start = input.offset.unwrap_or(1).max(1) - 1;
        let limit = input.limit.unwrap_or(Self::DEFAULT_LIMIT);
        let selected: Vec<&str> = content.lines().skip(start).take(limit).collect();
        let shown = selected.len();

        let mut text = selected.join("\n");
        if start + shown < total {
            text.push_str(&format!(
                "\n... [showing lines {}-{} of {}]",
                start + 1,
                start + shown,
                total
            ));
        }

        Ok(ToolOutput::new(text).with_display(format!("Read {} lines from {}", shown, input.path)))
    }
}
