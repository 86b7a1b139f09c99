//! 카탈로거 매니페스트 -- 요청과 실제 사용 태스크의 감사 기록

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::selection::SelectionRequest;
use crate::stage::Stage;

/// 선택 결정 감사 기록
///
/// `used`는 고정 인프라 스테이지를 제외한 모든 태스크 이름이며 정렬/중복 제거되어 있습니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogerManifest {
    /// 사용자가 요청한 선택
    pub requested: SelectionRequest,
    /// 실제 사용된 태스크 이름
    pub used: Vec<String>,
}

impl CatalogerManifest {
    /// 요청과 스테이지 목록으로 매니페스트를 생성합니다.
    pub fn build(requested: SelectionRequest, stages: &[Stage]) -> Self {
        let used: BTreeSet<String> = stages
            .iter()
            .filter(|s| !s.kind().is_fixed())
            .flat_map(|s| s.names())
            .map(str::to_owned)
            .collect();

        Self {
            requested,
            used: used.into_iter().collect(),
        }
    }

    /// 태스크가 사용되었는지 확인합니다.
    pub fn uses(&self, name: &str) -> bool {
        self.used.binary_search_by(|u| u.as_str().cmp(name)).is_ok()
    }
}
