//! 파일 카탈로거 -- 메타데이터, 다이제스트, 실행 파일, 내용
//!
//! 각 하위 모듈은 설정을 보고 태스크를 만들지 말지 결정하는 `new_task` 팩토리를 가집니다.
//! 분석 대상 파일은 [`target_locations`]가 파일 선택 모드에 따라 정합니다.

pub mod content;
pub mod digest;
pub mod executable;
pub mod metadata;

use std::collections::BTreeSet;

use crate::config::FileSelection;
use crate::task::TaskContext;
use crate::types::Location;

/// 파일 선택 모드에 따른 분석 대상 위치
///
/// `OwnedByPackage`는 이전 스테이지까지 발견된 패키지가 소유하거나 근거로 쓴 경로 중
/// 리졸버에 실제로 있는 것만 반환합니다.
pub(crate) fn target_locations(ctx: &TaskContext, selection: FileSelection) -> Vec<Location> {
    match selection {
        FileSelection::All => ctx.resolver.all_locations(),
        FileSelection::OwnedByPackage => {
            let claimed: BTreeSet<&str> = ctx.snapshot.package_claimed_paths().into_iter().collect();
            claimed
                .into_iter()
                .filter_map(|path| ctx.resolver.location_by_path(path))
                .collect()
        }
        FileSelection::None => Vec::new(),
    }
}
