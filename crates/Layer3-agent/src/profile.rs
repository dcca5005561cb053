//! Agent Profile Resolver
//!
//! 실행 단위로 사용할 도구 집합과 시스템 프롬프트를 결정합니다.
//!
//! ## Built-in profiles
//!
//! | 이름 | 제한 |
//! |------|------|
//! | `default` | 없음 |
//! | `plan` | `read_file`, `todo_read`, `todo_write` 만 허용 |
//! | `explore` | `write_file`, `shell` 제외 |
//! | `chat` | 도구 없음 |
//!
//! settings의 커스텀 profile은 같은 이름의 built-in을 대체합니다.

use kiln_core::tool::builtin::{ReadFileTool, ShellTool, TodoReadTool, TodoWriteTool, WriteFileTool};
use kiln_core::ToolRegistry;
use kiln_foundation::Tool;
use std::sync::Arc;
use tracing::debug;

pub use kiln_core::AgentProfile;

/// 기본 profile 이름
pub const DEFAULT_AGENT: &str = "default";

/// 모든 도구를 뜻하는 exclude 항목
const ALL_TOOLS: &str = "*";

// ============================================================================
// Built-ins
// ============================================================================

/// built-in profile 목록
pub fn builtin_profiles() -> Vec<AgentProfile> {
    vec![
        AgentProfile::new(DEFAULT_AGENT).with_description("General coding agent with every tool"),
        AgentProfile::new("plan")
            .with_description("Read-only planning; produces a task list instead of edits")
            .with_include_tools_only([ReadFileTool::NAME, TodoReadTool::NAME, TodoWriteTool::NAME])
            .with_prompt_suffix(
                "You are in planning mode. Do not modify files or run commands. \
                 Investigate with read-only tools and record the plan with todo_write.",
            ),
        AgentProfile::new("explore")
            .with_description("Investigate the codebase without writing files or running commands")
            .with_exclude_tools([WriteFileTool::NAME, ShellTool::NAME]),
        AgentProfile::new("chat")
            .with_description("Conversation only, no tools")
            .with_exclude_tools([ALL_TOOLS]),
    ]
}

/// built-in 위에 커스텀 profile을 이름 기준으로 덮어쓴 목록
///
/// built-in 순서를 유지하고, 새 이름은 뒤에 붙습니다.
pub fn list_agents(custom: &[AgentProfile]) -> Vec<AgentProfile> {
    let mut profiles = builtin_profiles();
    for profile in custom {
        match profiles.iter_mut().find(|p| p.name == profile.name) {
            Some(existing) => *existing = profile.clone(),
            None => profiles.push(profile.clone()),
        }
    }
    profiles
}

/// 이름으로 profile 결정
///
/// 알 수 없는 이름이면 `default`로 대체합니다.
pub fn resolve_agent(name: Option<&str>, custom: &[AgentProfile]) -> AgentProfile {
    let name = name.unwrap_or(DEFAULT_AGENT);
    let mut profiles = list_agents(custom);

    if let Some(pos) = profiles.iter().position(|p| p.name == name) {
        return profiles.swap_remove(pos);
    }

    debug!("Unknown agent '{}', falling back to '{}'", name, DEFAULT_AGENT);
    match profiles.iter().position(|p| p.name == DEFAULT_AGENT) {
        Some(pos) => profiles.swap_remove(pos),
        None => AgentProfile::new(DEFAULT_AGENT),
    }
}

// ============================================================================
// Tool filtering
// ============================================================================

/// profile이 이 도구를 허용하는지
///
/// `include_tools_only`가 있으면 그것만 봅니다.
pub fn is_tool_allowed(profile: &AgentProfile, tool_name: &str) -> bool {
    if let Some(include) = &profile.include_tools_only {
        return include.iter().any(|n| n == tool_name);
    }
    match &profile.exclude_tools {
        Some(exclude) => !exclude.iter().any(|n| n == ALL_TOOLS || n == tool_name),
        None => true,
    }
}

/// 도구 목록 필터링 (입력 순서 유지)
pub fn filter_tools_for_agent(
    tools: &[Arc<dyn Tool>],
    profile: &AgentProfile,
) -> Vec<Arc<dyn Tool>> {
    tools
        .iter()
        .filter(|t| is_tool_allowed(profile, t.name()))
        .cloned()
        .collect()
}

/// 필터링된 registry
pub fn filter_registry(registry: &ToolRegistry, profile: &AgentProfile) -> ToolRegistry {
    ToolRegistry::from_tools(filter_tools_for_agent(&registry.all(), profile))
}

// ============================================================================
// System prompt
// ============================================================================

/// 시스템 프롬프트 조합
///
/// override가 있으면 base를 대체하고, suffix는 빈 줄 뒤에 붙습니다.
pub fn compose_system_prompt(base: &str, profile: &AgentProfile) -> String {
    let prompt = profile
        .system_prompt_override
        .as_deref()
        .unwrap_or(base)
        .to_string();

    match profile.system_prompt_suffix.as_deref() {
        Some(suffix) if !suffix.trim().is_empty() => {
            if prompt.is_empty() {
                suffix.to_string()
            } else {
                format!("{}\n\n{}", prompt.trim_end(), suffix)
            }
        }
        _ => prompt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use kiln_foundation::{CancellationToken, Result, ToolContext, ToolKind, ToolOutput};
    use serde_json::{json, Value};

    struct NamedTool(&'static str);

    #[async_trait]
    impl Tool for NamedTool {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "test tool"
        }
        fn kind(&self) -> ToolKind {
            ToolKind::Read
        }
        fn schema(&self) -> Value {
            json!({ "type": "object" })
        }
        fn describe(&self, _params: &Value) -> String {
            self.0.to_string()
        }
        async fn execute(
            &self,
            _params: Value,
            _ctx: &dyn ToolContext,
            _cancel: CancellationToken,
        ) -> Result<ToolOutput> {
            Ok(ToolOutput::new(self.0))
        }
    }

    fn tools(names: &[&'static str]) -> Vec<Arc<dyn Tool>> {
        names
            .iter()
            .map(|n| Arc::new(NamedTool(n)) as Arc<dyn Tool>)
            .collect()
    }

    fn names(tools: &[Arc<dyn Tool>]) -> Vec<String> {
        tools.iter().map(|t| t.name().to_string()).collect()
    }

    #[test]
    fn test_include_beats_exclude() {
        let profile = AgentProfile::new("both")
            .with_exclude_tools(["glob", "grep"])
            .with_include_tools_only(["glob", "grep"]);
        let filtered = filter_tools_for_agent(&tools(&["glob", "grep"]), &profile);
        assert_eq!(names(&filtered), vec!["glob", "grep"]);
    }

    #[test]
    fn test_exclude_star_removes_everything() {
        let profile = AgentProfile::new("none").with_exclude_tools(["*"]);
        assert!(filter_tools_for_agent(&tools(&["a", "b"]), &profile).is_empty());
    }

    #[test]
    fn test_exclude_preserves_order() {
        let profile = AgentProfile::new("x").with_exclude_tools(["b"]);
        let filtered = filter_tools_for_agent(&tools(&["c", "b", "a"]), &profile);
        assert_eq!(names(&filtered), vec!["c", "a"]);

        let unrestricted = filter_tools_for_agent(&tools(&["c", "b"]), &AgentProfile::new("d"));
        assert_eq!(names(&unrestricted), vec!["c", "b"]);
    }

    #[test]
    fn test_resolve_unknown_falls_back() {
        let profile = resolve_agent(Some("missing"), &[]);
        assert_eq!(profile.name, DEFAULT_AGENT);
        assert_eq!(resolve_agent(None, &[]).name, DEFAULT_AGENT);
    }

    #[test]
    fn test_custom_overrides_builtin() {
        let custom = vec![
            AgentProfile::new("plan").with_max_tool_rounds(2),
            AgentProfile::new("reviewer").with_include_tools_only(["read_file"]),
        ];
        let plan = resolve_agent(Some("plan"), &custom);
        assert_eq!(plan.max_tool_rounds, Some(2));
        assert!(plan.include_tools_only.is_none());

        let all = list_agents(&custom);
        assert_eq!(all.len(), 5);
        assert_eq!(all[1].name, "plan");
        assert_eq!(all[4].name, "reviewer");
    }

    #[test]
    fn test_builtin_registry_filtering() {
        let registry = ToolRegistry::with_builtins();

        let plan = filter_registry(&registry, &resolve_agent(Some("plan"), &[]));
        assert_eq!(plan.names(), vec!["read_file", "todo_read", "todo_write"]);

        let explore = filter_registry(&registry, &resolve_agent(Some("explore"), &[]));
        assert!(!explore.contains("shell"));
        assert!(!explore.contains("write_file"));
        assert!(explore.contains("web_fetch"));

        assert!(filter_registry(&registry, &resolve_agent(Some("chat"), &[])).is_empty());
    }

    #[test]
    fn test_compose_system_prompt() {
        let base = "You are kiln.";
        assert_eq!(compose_system_prompt(base, &AgentProfile::new("d")), base);

        let suffixed = AgentProfile::new("s").with_prompt_suffix("Plan only.");
        assert_eq!(
            compose_system_prompt(base, &suffixed),
            "You are kiln.\n\nPlan only."
        );

        let replaced = AgentProfile::new("o")
            .with_prompt_override("Custom.")
            .with_prompt_suffix("Extra.");
        assert_eq!(compose_system_prompt(base, &replaced), "Custom.\n\nExtra.");
    }
}
