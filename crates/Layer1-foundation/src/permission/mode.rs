//! Approval mode - 세션 단위 확인 정책

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 도구 호출 확인 정책
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ApprovalMode {
    /// 확인이 필요한 모든 호출에서 묻는다
    #[default]
    #[serde(rename = "ask", alias = "default")]
    Ask,

    /// edit-class 도구는 묻지 않는다
    #[serde(rename = "auto_edit", alias = "auto-edit", alias = "autoEdit")]
    AutoEditApprove,

    /// 아무것도 묻지 않는다
    #[serde(rename = "full_auto", alias = "yolo", alias = "full-auto")]
    FullAuto,
}

impl ApprovalMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApprovalMode::Ask => "ask",
            ApprovalMode::AutoEditApprove => "auto_edit",
            ApprovalMode::FullAuto => "full_auto",
        }
    }
}

impl std::fmt::Display for ApprovalMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ApprovalMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ask" | "default" => Ok(ApprovalMode::Ask),
            "auto_edit" | "auto-edit" | "autoedit" => Ok(ApprovalMode::AutoEditApprove),
            "full_auto" | "full-auto" | "yolo" => Ok(ApprovalMode::FullAuto),
            other => Err(Error::InvalidInput(format!(
                "Unknown approval mode '{}' (expected ask, auto_edit or full_auto)",
                other
            ))),
        }
    }
}
