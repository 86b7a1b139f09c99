//! 스테이지 조립 -- 선택된 태스크를 순차 스테이지로 배치
//!
//! ```text
//! environment -> packages -> files -> relationships -> unknowns -> os-feature-detection
//!                (split: owned-by-package, 6 스테이지)
//! environment -> packages+files   -> relationships -> unknowns -> os-feature-detection
//!                (merged: all / none, 5 스테이지)
//! ```
//!
//! 스테이지 모양은 [`StageShape::for_file_selection`] 한 곳에서만 결정됩니다.

use std::fmt;
use std::sync::Arc;

use crate::config::FileSelection;
use crate::task::Task;

/// 스테이지 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageKind {
    /// 환경 정보 수집 (고정)
    Environment,
    /// 패키지 분석
    Packages,
    /// 파일 분석
    Files,
    /// 패키지와 파일 분석 동시 실행
    PackagesAndFiles,
    /// 관계 계산 (고정)
    Relationships,
    /// 미분류 항목 표시 (고정)
    Unknowns,
    /// OS 기능 감지 (고정)
    OsFeatureDetection,
}

impl StageKind {
    /// 고정 인프라 스테이지 여부 (매니페스트 `used`에서 제외)
    pub fn is_fixed(&self) -> bool {
        matches!(
            self,
            Self::Environment | Self::Relationships | Self::Unknowns | Self::OsFeatureDetection
        )
    }

    /// 메트릭/로그용 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Environment => "environment",
            Self::Packages => "packages",
            Self::Files => "files",
            Self::PackagesAndFiles => "packages-and-files",
            Self::Relationships => "relationships",
            Self::Unknowns => "unknowns",
            Self::OsFeatureDetection => "os-feature-detection",
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 순차 실행 단위. 내부 태스크는 동시에 실행됩니다.
#[derive(Clone)]
pub struct Stage {
    kind: StageKind,
    tasks: Vec<Arc<dyn Task>>,
}

impl Stage {
    /// 스테이지를 생성합니다.
    pub fn new(kind: StageKind, tasks: Vec<Arc<dyn Task>>) -> Self {
        Self { kind, tasks }
    }

    /// 스테이지 종류
    pub fn kind(&self) -> StageKind {
        self.kind
    }

    /// 스테이지의 태스크
    pub fn tasks(&self) -> &[Arc<dyn Task>] {
        &self.tasks
    }

    /// 태스크 이름 목록
    pub fn names(&self) -> Vec<&str> {
        self.tasks.iter().map(|t| t.name()).collect()
    }

    /// 빈 스테이지 여부
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl fmt::Debug for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Stage")
            .field("kind", &self.kind)
            .field("tasks", &self.names())
            .finish()
    }
}

/// 패키지/파일 스테이지 모양
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageShape {
    /// 패키지 스테이지 후 파일 스테이지 (파일 분석이 패키지 결과에 의존)
    Split,
    /// 하나의 동시 스테이지
    Merged,
}

impl StageShape {
    /// 파일 선택 모드로 스테이지 모양을 결정합니다.
    pub fn for_file_selection(selection: FileSelection) -> Self {
        match selection {
            FileSelection::OwnedByPackage => Self::Split,
            FileSelection::All | FileSelection::None => Self::Merged,
        }
    }
}

/// 스테이지 조립 입력
pub struct StageInputs {
    /// 환경 태스크
    pub environment: Arc<dyn Task>,
    /// 선택된 패키지 태스크
    pub packages: Vec<Arc<dyn Task>>,
    /// 선택된 파일 태스크
    pub files: Vec<Arc<dyn Task>>,
    /// 관계 태스크
    pub relationships: Arc<dyn Task>,
    /// 미분류 태스크
    pub unknowns: Arc<dyn Task>,
    /// OS 기능 감지 태스크
    pub os_feature_detection: Arc<dyn Task>,
}

/// 스테이지 목록을 조립합니다.
///
/// 분리 모드에서는 빈 패키지/파일 스테이지도 자리를 유지합니다.
/// 병합 모드에서는 비어 있지 않은 쪽만 하나의 스테이지에 담깁니다.
pub fn assemble(shape: StageShape, inputs: StageInputs) -> Vec<Stage> {
    let StageInputs {
        environment,
        packages,
        files,
        relationships,
        unknowns,
        os_feature_detection,
    } = inputs;

    let mut stages = Vec::with_capacity(6);
    stages.push(Stage::new(StageKind::Environment, vec![environment]));

    match shape {
        StageShape::Split => {
            stages.push(Stage::new(StageKind::Packages, packages));
            stages.push(Stage::new(StageKind::Files, files));
        }
        StageShape::Merged => {
            let mut merged = packages;
            merged.extend(files);
            stages.push(Stage::new(StageKind::PackagesAndFiles, merged));
        }
    }

    stages.push(Stage::new(StageKind::Relationships, vec![relationships]));
    stages.push(Stage::new(StageKind::Unknowns, vec![unknowns]));
    stages.push(Stage::new(
        StageKind::OsFeatureDetection,
        vec![os_feature_detection],
    ));
    stages
}

/// 스테이지별 이름 목록을 반환합니다.
pub fn stage_names(stages: &[Stage]) -> Vec<Vec<String>> {
    stages
        .iter()
        .map(|s| s.names().into_iter().map(str::to_owned).collect())
        .collect()
}
