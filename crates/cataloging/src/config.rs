//! 카탈로깅 엔진 설정
//!
//! [`CreateSbomConfig`]는 core의 [`SbomkitConfig`]를 엔진이 쓰는 타입으로
//! 변환한 설정입니다. 문자열 열거값은 여기서 타입으로 바뀌고, 필드 간 의존 관계는
//! [`CreateSbomConfig::validate`]가 확인합니다.
//!
//! # 사용 예시
//!
//! ```
//! use sbomkit_cataloging::{CreateSbomConfigBuilder, FileSelection, SelectionRequest};
//!
//! let config = CreateSbomConfigBuilder::new()
//!     .selection(SelectionRequest::new().with_removals(["digest"]))
//!     .file_selection(FileSelection::All)
//!     .build()
//!     .unwrap();
//! assert_eq!(config.files.selection, FileSelection::All);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use sbomkit_core::config::SbomkitConfig;

use crate::error::CatalogingError;
use crate::selection::SelectionRequest;
use crate::task::CatalogerReference;

/// 파일 분석 범위
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FileSelection {
    /// 발견된 패키지가 소유한 파일만
    OwnedByPackage,
    /// 대상 전체 파일
    All,
    /// 파일 분석 안 함
    None,
}

impl FileSelection {
    /// 대소문자를 구분하지 않고 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "owned-by-package" | "owned_by_package" => Some(Self::OwnedByPackage),
            "all" => Some(Self::All),
            "none" => Some(Self::None),
            _ => None,
        }
    }

    /// 설정 파일 표기
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnedByPackage => "owned-by-package",
            Self::All => "all",
            Self::None => "none",
        }
    }
}

impl fmt::Display for FileSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 다이제스트 알고리즘
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hasher {
    /// SHA-256
    Sha256,
    /// SHA-512
    Sha512,
}

impl Hasher {
    /// 대소문자를 구분하지 않고 파싱합니다.
    pub fn from_str_loose(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha256" | "sha-256" => Some(Self::Sha256),
            "sha512" | "sha-512" => Some(Self::Sha512),
            _ => None,
        }
    }

    /// 알고리즘 이름
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Sha512 => "sha512",
        }
    }
}

/// 파일 분석 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesConfig {
    /// 분석 범위
    pub selection: FileSelection,
    /// 다이제스트 알고리즘
    pub hashers: Vec<Hasher>,
    /// 내용 수집 설정
    pub content: ContentConfig,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            selection: FileSelection::OwnedByPackage,
            hashers: vec![Hasher::Sha256],
            content: ContentConfig::default(),
        }
    }
}

/// 파일 내용 수집 설정
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentConfig {
    /// 수집 대상 glob
    pub globs: Vec<String>,
    /// 이 크기(바이트)를 넘는 파일은 건너뜀
    pub skip_files_above_size: u64,
}

impl Default for ContentConfig {
    fn default() -> Self {
        Self {
            globs: Vec::new(),
            skip_files_above_size: 256 * 1024,
        }
    }
}

/// 관계 계산 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelationshipsConfig {
    /// 패키지 -> 파일 포함 관계 생성
    pub package_file_ownership: bool,
    /// 소유 파일이 겹치는 패키지 간 관계 생성
    pub package_file_ownership_overlap: bool,
    /// 소유 파일이 겹치는 바이너리 패키지 제외
    pub exclude_binary_packages_with_file_ownership_overlap: bool,
}

impl Default for RelationshipsConfig {
    fn default() -> Self {
        Self {
            package_file_ownership: true,
            package_file_ownership_overlap: true,
            exclude_binary_packages_with_file_ownership_overlap: true,
        }
    }
}

/// 미분류 라벨링 설정
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownsConfig {
    /// 패키지가 정의된 위치의 미분류 항목 제거
    pub remove_when_packages_defined: bool,
    /// 패키지가 없는 실행 파일을 미분류로 기록
    pub executables_without_packages: bool,
}

impl Default for UnknownsConfig {
    fn default() -> Self {
        Self {
            remove_when_packages_defined: true,
            executables_without_packages: true,
        }
    }
}

/// SBOM 생성 설정
#[derive(Debug, Clone)]
pub struct CreateSbomConfig {
    /// 카탈로거 선택 요청
    pub selection: SelectionRequest,
    /// 파일 분석 설정
    pub files: FilesConfig,
    /// 관계 계산 설정
    pub relationships: RelationshipsConfig,
    /// 미분류 라벨링 설정
    pub unknowns: UnknownsConfig,
    /// 스테이지 내 동시 실행 태스크 수
    pub parallelism: usize,
    /// 리졸버 최대 파일 크기 (바이트)
    pub max_file_size: u64,
    /// 호출자가 등록한 카탈로거
    pub catalogers: Vec<CatalogerReference>,
}

impl Default for CreateSbomConfig {
    fn default() -> Self {
        Self {
            selection: SelectionRequest::default(),
            files: FilesConfig::default(),
            relationships: RelationshipsConfig::default(),
            unknowns: UnknownsConfig::default(),
            parallelism: 4,
            max_file_size: 100 * 1024 * 1024, // 100 MB
            catalogers: Vec::new(),
        }
    }
}

/// 의존 플래그 규칙: `dependent`가 켜져 있으면 `prerequisite`도 켜져 있어야 함
struct DependentRule {
    dependent: &'static str,
    prerequisite: &'static str,
    dependent_enabled: fn(&CreateSbomConfig) -> bool,
    prerequisite_enabled: fn(&CreateSbomConfig) -> bool,
}

const DEPENDENT_RULES: &[DependentRule] = &[
    DependentRule {
        dependent: "relationships.exclude_binary_packages_with_file_ownership_overlap",
        prerequisite: "relationships.package_file_ownership_overlap",
        dependent_enabled: |c| c.relationships.exclude_binary_packages_with_file_ownership_overlap,
        prerequisite_enabled: |c| c.relationships.package_file_ownership_overlap,
    },
    DependentRule {
        dependent: "files.content.globs",
        prerequisite: "files.content.skip_files_above_size",
        dependent_enabled: |c| !c.files.content.globs.is_empty(),
        prerequisite_enabled: |c| c.files.content.skip_files_above_size > 0,
    },
];

impl CreateSbomConfig {
    /// core 설정에서 엔진 설정을 생성합니다.
    ///
    /// # Errors
    ///
    /// 알 수 없는 파일 선택 모드나 다이제스트 알고리즘이면
    /// `CatalogingError::Validation`을 반환합니다.
    pub fn from_core(core: &SbomkitConfig) -> Result<Self, CatalogingError> {
        let selection = FileSelection::from_str_loose(&core.files.selection).ok_or_else(|| {
            CatalogingError::Validation {
                field: "files.selection".to_owned(),
                reason: format!("unknown file selection '{}'", core.files.selection),
            }
        })?;

        let hashers = core
            .files
            .hashers
            .iter()
            .map(|h| {
                Hasher::from_str_loose(h).ok_or_else(|| CatalogingError::Validation {
                    field: "files.hashers".to_owned(),
                    reason: format!("unsupported hasher '{h}'"),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            selection: SelectionRequest {
                default_names_or_tags: core.cataloging.default.clone(),
                sub_select_tags: core.cataloging.select.clone(),
                add_names_or_tags: core.cataloging.add.clone(),
                remove_names_or_tags: core.cataloging.remove.clone(),
            },
            files: FilesConfig {
                selection,
                hashers,
                content: ContentConfig {
                    globs: core.files.content.globs.clone(),
                    skip_files_above_size: u64::try_from(core.files.content.skip_files_above_size)
                        .unwrap_or(u64::MAX),
                },
            },
            relationships: RelationshipsConfig {
                package_file_ownership: core.relationships.package_file_ownership,
                package_file_ownership_overlap: core.relationships.package_file_ownership_overlap,
                exclude_binary_packages_with_file_ownership_overlap: core
                    .relationships
                    .exclude_binary_packages_with_file_ownership_overlap,
            },
            unknowns: UnknownsConfig {
                remove_when_packages_defined: core.unknowns.remove_when_packages_defined,
                executables_without_packages: core.unknowns.executables_without_packages,
            },
            parallelism: core.cataloging.parallelism,
            max_file_size: u64::try_from(core.files.max_file_size).unwrap_or(u64::MAX),
            catalogers: Vec::new(),
        })
    }

    /// 필드 간 의존 관계를 검증합니다. 설정은 변경하지 않습니다.
    ///
    /// # 검증 규칙
    ///
    /// - `exclude_binary_packages_with_file_ownership_overlap`은
    ///   `package_file_ownership_overlap`이 필요
    /// - `files.content.globs`는 `skip_files_above_size > 0`이 필요
    /// - `parallelism >= 1`
    pub fn validate(&self) -> Result<(), CatalogingError> {
        for rule in DEPENDENT_RULES {
            if (rule.dependent_enabled)(self) && !(rule.prerequisite_enabled)(self) {
                return Err(CatalogingError::Validation {
                    field: rule.dependent.to_owned(),
                    reason: format!("requires {} to be enabled", rule.prerequisite),
                });
            }
        }

        if self.parallelism == 0 {
            return Err(CatalogingError::Validation {
                field: "parallelism".to_owned(),
                reason: "must be at least 1".to_owned(),
            });
        }

        Ok(())
    }
}

/// 엔진 설정 빌더
///
/// `build()` 시점에 [`CreateSbomConfig::validate`]를 실행합니다.
#[derive(Debug, Default)]
pub struct CreateSbomConfigBuilder {
    config: CreateSbomConfig,
}

impl CreateSbomConfigBuilder {
    /// 기본값으로 빌더를 생성합니다.
    pub fn new() -> Self {
        Self::default()
    }

    /// core 설정에서 시작합니다.
    pub fn from_core(core: &SbomkitConfig) -> Result<Self, CatalogingError> {
        Ok(Self {
            config: CreateSbomConfig::from_core(core)?,
        })
    }

    /// 카탈로거 선택 요청을 지정합니다.
    pub fn selection(mut self, selection: SelectionRequest) -> Self {
        self.config.selection = selection;
        self
    }

    /// 파일 분석 범위를 지정합니다.
    pub fn file_selection(mut self, selection: FileSelection) -> Self {
        self.config.files.selection = selection;
        self
    }

    /// 파일 분석 설정 전체를 지정합니다.
    pub fn files(mut self, files: FilesConfig) -> Self {
        self.config.files = files;
        self
    }

    /// 관계 계산 설정을 지정합니다.
    pub fn relationships(mut self, relationships: RelationshipsConfig) -> Self {
        self.config.relationships = relationships;
        self
    }

    /// 미분류 라벨링 설정을 지정합니다.
    pub fn unknowns(mut self, unknowns: UnknownsConfig) -> Self {
        self.config.unknowns = unknowns;
        self
    }

    /// 동시 실행 태스크 수를 지정합니다.
    pub fn parallelism(mut self, parallelism: usize) -> Self {
        self.config.parallelism = parallelism;
        self
    }

    /// 리졸버 최대 파일 크기를 지정합니다.
    pub fn max_file_size(mut self, max_file_size: u64) -> Self {
        self.config.max_file_size = max_file_size;
        self
    }

    /// 호출자 카탈로거를 추가합니다.
    pub fn cataloger(mut self, reference: CatalogerReference) -> Self {
        self.config.catalogers.push(reference);
        self
    }

    /// 설정을 검증하고 반환합니다.
    pub fn build(self) -> Result<CreateSbomConfig, CatalogingError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
