//! Session policy - approval mode + whitelist
//!
//! 프로세스 전역 상태 대신 세션 객체 하나가 두 정책을 소유합니다.
//! `Arc<SessionPolicy>`로 Scheduler와 ToolContext가 공유합니다.

use super::confirmation::{ConfirmationDetails, ConfirmationOutcome};
use super::mode::ApprovalMode;
use super::whitelist::CommandWhitelist;
use crate::core::ToolKind;
use std::sync::RwLock;
use tracing::{debug, info};

/// 세션 정책
#[derive(Debug, Default)]
pub struct SessionPolicy {
    approval_mode: RwLock<ApprovalMode>,
    whitelist: CommandWhitelist,
}

impl SessionPolicy {
    pub fn new(mode: ApprovalMode) -> Self {
        Self {
            approval_mode: RwLock::new(mode),
            whitelist: CommandWhitelist::new(),
        }
    }

    /// 현재 approval mode
    pub fn approval_mode(&self) -> ApprovalMode {
        self.approval_mode
            .read()
            .map(|mode| *mode)
            .unwrap_or_default()
    }

    /// approval mode 변경 (사용자 동작)
    pub fn set_approval_mode(&self, mode: ApprovalMode) {
        if let Ok(mut current) = self.approval_mode.write() {
            if *current != mode {
                info!("Approval mode: {} -> {}", *current, mode);
            }
            *current = mode;
        }
    }

    pub fn whitelist(&self) -> &CommandWhitelist {
        &self.whitelist
    }

    /// allow key가 허용되어 있는지
    pub fn is_allowed(&self, key: &str) -> bool {
        self.whitelist.contains(key)
    }

    /// 현재 mode에서 이 분류의 도구가 확인을 거쳐야 하는지
    pub fn needs_confirmation(&self, kind: ToolKind) -> bool {
        match self.approval_mode() {
            ApprovalMode::Ask => true,
            ApprovalMode::AutoEditApprove => !kind.is_edit(),
            ApprovalMode::FullAuto => false,
        }
    }

    /// 확인 결과 반영
    ///
    /// ProceedAlways 계열은 allow key를 추가하고, edit 승인 계열은 mode를 바꿉니다.
    pub fn apply_outcome(&self, details: &ConfirmationDetails, outcome: &ConfirmationOutcome) {
        for key in details.allow_keys(outcome) {
            if self.whitelist.add(key.clone()) {
                debug!("Whitelisted '{}'", key);
            }
        }
        if details.enables_auto_edit(outcome) {
            self.set_approval_mode(ApprovalMode::AutoEditApprove);
        }
    }
}
