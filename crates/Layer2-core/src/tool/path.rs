//! Working root 경로 검증

use kiln_foundation::{Error, Result};
use std::path::{Component, Path, PathBuf};

/// `.`/`..`를 문자열 수준에서 정리 (파일시스템 접근 없음)
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// working root 기준으로 경로 해석
///
/// 상대 경로는 root에 붙이고, 결과가 root 밖이면 Validation 에러.
pub fn resolve_in_root(root: &Path, path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        root.join(candidate)
    };

    let resolved = normalize(&joined);
    if !resolved.starts_with(normalize(root)) {
        return Err(Error::validation(format!(
            "Path '{}' is outside the working root {}",
            path,
            root.display()
        )));
    }
    Ok(resolved)
}
