//! 스캔 대상 기술자 -- 이미지 / 디렉토리 / 파일
//!
//! [`SourceDescription`]은 스캔 대상에 대한 불투명한 기술자입니다.
//! 카탈로깅 엔진은 [`SourceMetadata`]의 종류만 보고 소스 범주를 결정하며,
//! 그 외 필드는 SBOM 출처(provenance) 정보로만 전달됩니다.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SbomkitError, SourceError};

/// 스캔 대상 기술자
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDescription {
    /// 소스 식별자 (예: 디렉토리 경로, 이미지 ID)
    pub id: String,
    /// 사용자에게 보여줄 이름
    pub name: String,
    /// 버전 (알 수 없으면 빈 문자열)
    #[serde(default)]
    pub version: String,
    /// 종류별 메타데이터
    pub metadata: SourceMetadata,
}

/// 종류별 소스 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SourceMetadata {
    /// 컨테이너 이미지
    Image(ImageMetadata),
    /// 디렉토리 트리
    Directory(DirectoryMetadata),
    /// 단일 파일
    File(FileMetadata),
    /// 엔진이 모르는 종류
    Unknown {
        /// 원래 종류 이름
        kind: String,
    },
}

/// 컨테이너 이미지 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageMetadata {
    /// 사용자가 입력한 이미지 참조 (예: `alpine:3.20`)
    pub user_input: String,
    /// 이미지 ID
    #[serde(default)]
    pub image_id: String,
    /// 매니페스트 다이제스트
    #[serde(default)]
    pub manifest_digest: String,
    /// 이미지 태그 목록
    #[serde(default)]
    pub tags: Vec<String>,
}

/// 디렉토리 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryMetadata {
    /// 스캔 루트 경로
    pub path: String,
}

/// 단일 파일 메타데이터
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// 파일 경로
    pub path: String,
}

impl SourceMetadata {
    /// 메타데이터 종류 이름을 반환합니다.
    pub fn kind(&self) -> &str {
        match self {
            Self::Image(_) => "image",
            Self::Directory(_) => "directory",
            Self::File(_) => "file",
            Self::Unknown { kind } => kind,
        }
    }
}

impl SourceDescription {
    /// 메타데이터만으로 기술자를 생성합니다.
    pub fn new(metadata: SourceMetadata) -> Self {
        let id = match &metadata {
            SourceMetadata::Image(m) => m.user_input.clone(),
            SourceMetadata::Directory(m) => m.path.clone(),
            SourceMetadata::File(m) => m.path.clone(),
            SourceMetadata::Unknown { kind } => kind.clone(),
        };
        Self {
            name: id.clone(),
            id,
            version: String::new(),
            metadata,
        }
    }

    /// 로컬 경로로부터 디렉토리 또는 파일 기술자를 생성합니다.
    ///
    /// # Errors
    ///
    /// 경로가 없으면 `SourceError::NotFound`를 반환합니다.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, SbomkitError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SbomkitError::Source(SourceError::NotFound {
                    path: path.display().to_string(),
                })
            } else {
                SbomkitError::Io(e)
            }
        })?;

        let display = path.display().to_string();
        let metadata = if meta.is_dir() {
            SourceMetadata::Directory(DirectoryMetadata { path: display })
        } else {
            SourceMetadata::File(FileMetadata { path: display })
        };
        Ok(Self::new(metadata))
    }

    /// 메타데이터 종류 이름을 반환합니다.
    pub fn kind(&self) -> &str {
        self.metadata.kind()
    }
}

impl fmt::Display for SourceDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.kind())
    }
}
