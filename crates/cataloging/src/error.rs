//! 카탈로깅 엔진 에러 타입
//!
//! [`CatalogingError`]는 카탈로깅 엔진 내에서 발생할 수 있는 모든 에러를 나타냅니다.
//! `From<CatalogingError> for SbomkitError` 구현을 통해 `?` 연산자로
//! 상위 에러 타입으로 자연스럽게 전파됩니다.
//!
//! # 에러 카테고리
//!
//! - **스캔 대상**: `UnsupportedSource` (해결 전 즉시 중단)
//! - **설정**: `Validation` (해결 전 즉시 중단, 부분 실행 없음)
//! - **태스크 실행**: `Task`, `Parse` (러너가 수집, 파이프라인은 계속)
//! - **리졸버**: `Resolver`, `Io`, `FileTooBig`
//! - **취소**: `Cancelled` (이후 스테이지 미실행, 매니페스트 미반환)

use sbomkit_core::error::{CatalogError, SbomkitError, SourceError};

/// 카탈로깅 엔진 도메인 에러
#[derive(Debug, thiserror::Error)]
pub enum CatalogingError {
    /// 인식할 수 없는 스캔 대상 메타데이터
    #[error("unsupported source: {kind}")]
    UnsupportedSource {
        /// 메타데이터 종류 이름
        kind: String,
    },

    /// 설정 교차 검증 실패
    #[error("invalid configuration: {field}: {reason}")]
    Validation {
        /// 문제가 된 설정 필드
        field: String,
        /// 실패 사유
        reason: String,
    },

    /// 개별 태스크 실패
    #[error("task '{task}' failed: {reason}")]
    Task {
        /// 태스크 이름
        task: String,
        /// 실패 사유
        reason: String,
    },

    /// 패키지 메타데이터 파싱 실패
    #[error("parse error: {path}: {reason}")]
    Parse {
        /// 파싱 대상 경로
        path: String,
        /// 파싱 실패 사유
        reason: String,
    },

    /// 리졸버 에러
    #[error("resolver error: {0}")]
    Resolver(String),

    /// 파일 I/O 에러
    #[error("io error: {path}: {source}")]
    Io {
        /// 관련 파일 경로
        path: String,
        /// 원본 I/O 에러
        source: std::io::Error,
    },

    /// 파일 크기 초과
    #[error("file too large: {path}: {size} bytes (max: {max})")]
    FileTooBig {
        /// 파일 경로
        path: String,
        /// 실제 파일 크기 (바이트)
        size: u64,
        /// 최대 허용 크기 (바이트)
        max: u64,
    },

    /// 실행 취소됨
    #[error("cataloging cancelled")]
    Cancelled,
}

impl From<CatalogingError> for SbomkitError {
    fn from(err: CatalogingError) -> Self {
        match err {
            CatalogingError::UnsupportedSource { kind } => {
                SbomkitError::Source(SourceError::Unsupported { kind })
            }
            CatalogingError::Validation { field, reason } => SbomkitError::Cataloging(
                CatalogError::Validation(format!("{field}: {reason}")),
            ),
            CatalogingError::Task { task, reason } => {
                SbomkitError::Cataloging(CatalogError::TaskFailed(format!("{task}: {reason}")))
            }
            CatalogingError::Parse { path, reason } => SbomkitError::Cataloging(
                CatalogError::TaskFailed(format!("parse error: {path}: {reason}")),
            ),
            CatalogingError::Resolver(msg) => SbomkitError::Cataloging(CatalogError::Resolver(msg)),
            CatalogingError::Io { path, source } => SbomkitError::Cataloging(
                CatalogError::Resolver(format!("io error: {path}: {source}")),
            ),
            CatalogingError::FileTooBig { path, size, max } => {
                SbomkitError::Cataloging(CatalogError::Resolver(format!(
                    "file too large: {path}: {size} bytes (max: {max})"
                )))
            }
            CatalogingError::Cancelled => SbomkitError::Cataloging(CatalogError::Cancelled),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_display() {
        let err = CatalogingError::Validation {
            field: "relationships.exclude_binary_packages_with_file_ownership_overlap".to_owned(),
            reason: "requires relationships.package_file_ownership_overlap".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("exclude_binary_packages_with_file_ownership_overlap"));
        assert!(msg.contains("requires"));
    }

    #[test]
    fn task_error_display() {
        let err = CatalogingError::Task {
            task: "dpkg-db-cataloger".to_owned(),
            reason: "boom".to_owned(),
        };
        assert_eq!(err.to_string(), "task 'dpkg-db-cataloger' failed: boom");
    }

    #[test]
    fn converts_unsupported_source() {
        let err: SbomkitError = CatalogingError::UnsupportedSource {
            kind: "snap".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            SbomkitError::Source(SourceError::Unsupported { .. })
        ));
    }

    #[test]
    fn converts_validation() {
        let err: SbomkitError = CatalogingError::Validation {
            field: "parallelism".to_owned(),
            reason: "must be at least 1".to_owned(),
        }
        .into();
        assert!(matches!(
            err,
            SbomkitError::Cataloging(CatalogError::Validation(_))
        ));
    }

    #[test]
    fn converts_cancelled() {
        let err: SbomkitError = CatalogingError::Cancelled.into();
        assert!(matches!(err, SbomkitError::Cataloging(CatalogError::Cancelled)));
    }

    #[test]
    fn io_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = CatalogingError::Io {
            path: "/tmp/test".to_owned(),
            source: io_err,
        };
        assert!(err.to_string().contains("/tmp/test"));
    }
}
