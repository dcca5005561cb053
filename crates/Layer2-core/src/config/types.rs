//! Configuration 타입 정의
//!
//! `.kiln/settings.json` 스키마

use crate::hook::{merge_hooks, HooksSettings};
use kiln_foundation::ApprovalMode;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ============================================================================
// KilnSettings - 통합 설정
// ============================================================================

/// Kiln 설정 (한 scope 분량)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KilnSettings {
    /// 세션 approval mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approval_mode: Option<ApprovalMode>,

    /// sandbox (`true`/`false` 또는 `docker`/`podman`/`sandbox-exec`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox: Option<SandboxSetting>,

    /// sandbox 컨테이너 이미지
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sandbox_image: Option<String>,

    /// lifecycle hook
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hooks: Option<HooksSettings>,

    /// 커스텀 agent profile (이름 → profile)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub agents: BTreeMap<String, AgentProfile>,

    /// 기본 agent 이름
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_agent: Option<String>,
}

impl KilnSettings {
    /// user scope 위에 workspace scope 병합
    ///
    /// - 단일 값: workspace 우선
    /// - hooks: `merge_hooks` (user 먼저)
    /// - agents: 같은 이름은 workspace 우선
    pub fn merge(user: KilnSettings, workspace: KilnSettings) -> KilnSettings {
        let mut agents = user.agents;
        agents.extend(workspace.agents);

        KilnSettings {
            approval_mode: workspace.approval_mode.or(user.approval_mode),
            sandbox: workspace.sandbox.or(user.sandbox),
            sandbox_image: workspace.sandbox_image.or(user.sandbox_image),
            hooks: merge_hooks(user.hooks, workspace.hooks),
            agents,
            default_agent: workspace.default_agent.or(user.default_agent),
        }
    }

    /// 이름이 채워진 커스텀 profile 목록
    pub fn agent_profiles(&self) -> Vec<AgentProfile> {
        self.agents
            .iter()
            .map(|(name, profile)| {
                let mut profile = profile.clone();
                profile.name = name.clone();
                profile
            })
            .collect()
    }
}

/// sandbox 설정 값
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SandboxSetting {
    Enabled(bool),
    Command(String),
}

impl SandboxSetting {
    /// 환경 변수와 같은 문자열 형식
    pub fn as_value(&self) -> String {
        match self {
            SandboxSetting::Enabled(b) => b.to_string(),
            SandboxSetting::Command(c) => c.clone(),
        }
    }
}

// ============================================================================
// AgentProfile
// ============================================================================

/// Agent profile
///
/// 도구 제한, 시스템 프롬프트 보강, tool round 상한을 묶은 데이터입니다.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentProfile {
    /// 이름 (settings의 map key로 채워짐)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// 시스템 프롬프트 뒤에 붙일 내용
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_suffix: Option<String>,

    /// 시스템 프롬프트 전체 교체
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt_override: Option<String>,

    /// 제외할 도구 (`*`는 전부)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclude_tools: Option<Vec<String>>,

    /// 이 도구들만 허용 (exclude보다 우선)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_tools_only: Option<Vec<String>>,

    /// 한 턴에 처리할 tool-call batch 상한
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tool_rounds: Option<u32>,
}

impl AgentProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_prompt_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.system_prompt_suffix = Some(suffix.into());
        self
    }

    pub fn with_prompt_override(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt_override = Some(prompt.into());
        self
    }

    pub fn with_exclude_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude_tools = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_include_tools_only<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.include_tools_only = Some(tools.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = Some(rounds);
        self
    }
}
