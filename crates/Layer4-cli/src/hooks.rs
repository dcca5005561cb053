//! Session lifecycle hooks
//!
//! settings의 hook을 세션 정보 환경 변수와 함께 실행합니다.

use crate::session::Session;
use kiln_core::hook::{HookEvent, HookEventType, HookMode, HookReport, HookRunner};

/// 이벤트 이름 정규화 (알려진 이름은 표준 표기로)
pub fn event_for(name: &str) -> HookEvent {
    match HookEventType::parse(name) {
        Some(kind) => HookEvent::new(kind),
        None => HookEvent::named(name),
    }
}

/// 세션 hook 실행
pub async fn fire(session: &Session, event: HookEvent, mode: HookMode) -> HookReport {
    let event = event
        .with_env("KILN_SESSION_ID", &session.id)
        .with_env("KILN_WORKING_DIR", session.working_dir.display().to_string());
    HookRunner::new(&session.working_dir)
        .run(&event, &session.hooks(), mode)
        .await
}

/// 알려진 이벤트 실행
pub async fn fire_kind(session: &Session, kind: HookEventType, mode: HookMode) -> HookReport {
    fire(session, HookEvent::new(kind), mode).await
}
