//! WebFetch Tool - URL 내용 가져오기
//!
//! http/https URL의 본문을 가져와 텍스트로 돌려줍니다.
//! 확인 요청은 `info` 종류이며, ProceedAlways 이후에는 `tool:web_fetch`가 허용됩니다.

use async_trait::async_trait;
use kiln_foundation::{
    tool_key, CancellationToken, ConfirmationDetails, Error, Result, Tool, ToolContext, ToolKind,
    ToolOutput,
};
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::OnceLock;
use std::time::Duration;
use tracing::info;

/// WebFetch 도구 입력
#[derive(Debug, Deserialize)]
pub struct WebFetchInput {
    /// 가져올 URL
    pub url: String,

    /// 내용에 대해 모델이 알고 싶은 것 (표시용)
    #[serde(default)]
    pub prompt: Option<String>,
}

/// WebFetch 도구
pub struct WebFetchTool {
    client: Client,
}

impl WebFetchTool {
    pub const NAME: &'static str = "web_fetch";

    /// 요청 타임아웃
    const TIMEOUT: Duration = Duration::from_secs(30);

    /// 최대 본문 크기 (100KB)
    const MAX_CONTENT_LENGTH: usize = 100_000;

    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Self::TIMEOUT)
            .redirect(reqwest::redirect::Policy::limited(5))
            .user_agent(concat!("kiln/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client }
    }

    fn parse(params: &Value) -> Result<WebFetchInput> {
        serde_json::from_value(params.clone())
            .map_err(|e| Error::validation(format!("Invalid parameters: {}", e)))
    }

    fn parse_url(raw: &str) -> Result<url::Url> {
        let parsed =
            url::Url::parse(raw).map_err(|e| Error::validation(format!("Invalid URL: {}", e)))?;
        if !["http", "https"].contains(&parsed.scheme()) {
            return Err(Error::validation(format!(
                "Only http/https URLs are allowed, got: {}",
                parsed.scheme()
            )));
        }
        Ok(parsed)
    }

    /// HTML 태그 제거 (script/style 블록 포함)
    fn html_to_text(html: &str) -> String {
        static BLOCKS: OnceLock<Option<Regex>> = OnceLock::new();
        static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
        static BLANK: OnceLock<Option<Regex>> = OnceLock::new();

        let blocks = BLOCKS.get_or_init(|| Regex::new(r"(?is)<(script|style)[^>]*>.*?</(script|style)>").ok());
        let tags = TAGS.get_or_init(|| Regex::new(r"(?s)<[^>]+>").ok());
        let blank = BLANK.get_or_init(|| Regex::new(r"\n\s*\n+").ok());

        let mut text = html.to_string();
        for re in [blocks, tags].into_iter().flatten() {
            text = re.replace_all(&text, "\n").into_owned();
        }
        if let Some(re) = blank {
            text = re.replace_all(&text, "\n\n").into_owned();
        }
        text.trim().to_string()
    }
}

impl Default for WebFetchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebFetchTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn display_name(&self) -> &str {
        "WebFetch"
    }

    fn description(&self) -> &str {
        "Fetch the content of an http(s) URL and return it as plain text."
    }

    fn kind(&self) -> ToolKind {
        ToolKind::Fetch
    }

    fn schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "url": { "type": "string", "description": "URL to fetch" },
                "prompt": { "type": "string", "description": "What to look for in the content" }
            },
            "required": ["url"]
        })
    }

    fn requires_confirmation(&self) -> bool {
        true
    }

    fn validate(&self, params: &Value, _ctx: &dyn ToolContext) -> Result<()> {
        let input = Self::parse(params)?;
        Self::parse_url(&input.url)?;
        Ok(())
    }

    fn describe(&self, params: &Value) -> String {
        params
            .get("url")
            .and_then(Value::as_str)
            .map(|u| format!("Fetching {}", u))
            .unwrap_or_else(|| "Fetching URL".to_string())
    }

    fn confirmation(&self, params: &Value, ctx: &dyn ToolContext) -> Option<ConfirmationDetails> {
        if ctx.policy().is_allowed(&tool_key(Self::NAME)) {
            return None;
        }
        let input = Self::parse(params).ok()?;
        Some(ConfirmationDetails::Info {
            title: "Confirm Web Fetch".to_string(),
            tool_name: Self::NAME.to_string(),
            prompt: input.prompt.unwrap_or_else(|| input.url.clone()),
            urls: vec![input.url],
        })
    }

    async fn execute(
        &self,
        params: Value,
        _ctx: &dyn ToolContext,
        cancel: CancellationToken,
    ) -> Result<ToolOutput> {
        let input = Self::parse(&params)?;
        let url = Self::parse_url(&input.url)?;

        info!("Fetching URL: {}", url);
        let fetch = async {
            let response = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;
            let status = response.status();
            let is_html = response
                .headers()
                .get("content-type")
                .and_then(|h| h.to_str().ok())
                .map(|ct| ct.contains("text/html"))
                .unwrap_or(false);
            let body = response
                .bytes()
                .await
                .map_err(|e| Error::Http(e.to_string()))?;
            Ok::<_, Error>((status, is_html, body))
        };

        let (status, is_html, body) = tokio::select! {
            result = fetch => result?,
            _ = cancel.cancelled() => return Err(Error::Cancelled),
        };

        if !status.is_success() {
            return Err(Error::tool_execution(
                Self::NAME,
                format!("Request failed with status {}", status),
            ));
        }

        let truncated = body.len() > Self::MAX_CONTENT_LENGTH;
        let raw = String::from_utf8_lossy(&body[..body.len().min(Self::MAX_CONTENT_LENGTH)]);
        let mut content = if is_html {
            Self::html_to_text(&raw)
        } else {
            raw.into_owned()
        };
        if truncated {
            content.push_str("\n... [content truncated]");
        }

        Ok(ToolOutput::new(content)
            .with_display(format!("Fetched {} ({} bytes)", input.url, body.len())))
    }
}
