//! 소스 분류기 -- 스캔 대상 종류별 기본 태그 결정

use std::fmt;

use sbomkit_core::{SourceDescription, SourceMetadata};

use crate::error::CatalogingError;

/// 이미지 소스 기본 패키지 태그
pub const IMAGE_TAG: &str = "image";
/// 디렉토리 소스 기본 패키지 태그
pub const DIRECTORY_TAG: &str = "directory";
/// 파일 분석 태그
pub const FILE_TAG: &str = "file";
/// 패키지 카탈로거 공통 태그
pub const PACKAGE_TAG: &str = "package";
/// 소스 기본 태그로 치환되는 자리표시자
pub const DEFAULT_TOKEN: &str = "default";

/// 소스 범주
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceCategory {
    /// 컨테이너 이미지
    Image,
    /// 디렉토리 (단일 파일 포함)
    Directory,
}

impl SourceCategory {
    /// 범주의 패키지 태그
    pub fn package_tag(&self) -> &'static str {
        match self {
            Self::Image => IMAGE_TAG,
            Self::Directory => DIRECTORY_TAG,
        }
    }

    /// 범주의 기본 태그 쌍 `[패키지 태그, 파일 태그]`
    pub fn default_tags(&self) -> [&'static str; 2] {
        [self.package_tag(), FILE_TAG]
    }
}

impl fmt::Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.package_tag())
    }
}

/// 스캔 대상을 분류하고 기본 태그를 반환합니다.
///
/// 단일 파일은 디렉토리와 같은 기본 태그를 사용합니다.
///
/// # Errors
///
/// 알 수 없는 메타데이터 종류면 `CatalogingError::UnsupportedSource`를 반환합니다.
pub fn classify(
    source: &SourceDescription,
) -> Result<(SourceCategory, [&'static str; 2]), CatalogingError> {
    let category = match &source.metadata {
        SourceMetadata::Image(_) => SourceCategory::Image,
        SourceMetadata::Directory(_) | SourceMetadata::File(_) => SourceCategory::Directory,
        SourceMetadata::Unknown { kind } => {
            return Err(CatalogingError::UnsupportedSource { kind: kind.clone() });
        }
    };
    Ok((category, category.default_tags()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sbomkit_core::{DirectoryMetadata, FileMetadata, ImageMetadata};

    #[test]
    fn image_defaults() {
        let src = SourceDescription::new(SourceMetadata::Image(ImageMetadata::default()));
        let (category, tags) = classify(&src).unwrap();
        assert_eq!(category, SourceCategory::Image);
        assert_eq!(tags, ["image", "file"]);
    }

    #[test]
    fn directory_defaults() {
        let src = SourceDescription::new(SourceMetadata::Directory(DirectoryMetadata::default()));
        assert_eq!(classify(&src).unwrap().1, ["directory", "file"]);
    }

    #[test]
    fn file_source_behaves_like_directory() {
        let src = SourceDescription::new(SourceMetadata::File(FileMetadata::default()));
        let (category, tags) = classify(&src).unwrap();
        assert_eq!(category, SourceCategory::Directory);
        assert_eq!(tags, ["directory", "file"]);
    }

    #[test]
    fn unknown_source_is_rejected() {
        let src = SourceDescription::new(SourceMetadata::Unknown {
            kind: "snap".to_owned(),
        });
        let err = classify(&src).unwrap_err();
        assert!(matches!(err, CatalogingError::UnsupportedSource { kind } if kind == "snap"));
    }
}
