//! Storage module for Kiln
//!
//! - `json`: JSON - 설정 파일과 task list 캐시 저장/로드

mod json;

pub use json::{JsonStore, KILN_DIR};
