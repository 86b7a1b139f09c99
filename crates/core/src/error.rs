//! 에러 타입 -- 도메인별 에러 정의

/// sbomkit 최상위 에러 타입
#[derive(Debug, thiserror::Error)]
pub enum SbomkitError {
    /// 설정 관련 에러
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// 스캔 대상 관련 에러
    #[error("source error: {0}")]
    Source(#[from] SourceError),

    /// 카탈로깅 엔진 에러
    #[error("cataloging error: {0}")]
    Cataloging(#[from] CatalogError),

    /// I/O 에러
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// 설정 관련 에러
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// 설정 파일을 찾을 수 없음
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// 설정 파싱 실패
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// 유효하지 않은 설정 값
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// 스캔 대상 에러
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// 인식할 수 없는 메타데이터 종류
    #[error("unsupported source metadata kind: {kind}")]
    Unsupported { kind: String },

    /// 경로가 존재하지 않음
    #[error("source path not found: {path}")]
    NotFound { path: String },
}

/// 카탈로깅 엔진 에러
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// 설정 교차 검증 실패
    #[error("validation failed: {0}")]
    Validation(String),

    /// 태스크 실행 실패
    #[error("task failed: {0}")]
    TaskFailed(String),

    /// 리졸버 접근 실패
    #[error("resolver error: {0}")]
    Resolver(String),

    /// 실행 취소됨
    #[error("cataloging cancelled")]
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_converts_into_top_level() {
        let err: SbomkitError = ConfigError::InvalidValue {
            field: "files.selection".to_owned(),
            reason: "must be one of: all, none, owned-by-package".to_owned(),
        }
        .into();
        assert!(matches!(err, SbomkitError::Config(_)));
        assert!(err.to_string().contains("files.selection"));
    }

    #[test]
    fn source_error_display_names_the_kind() {
        let err = SourceError::Unsupported {
            kind: "snap".to_owned(),
        };
        assert_eq!(err.to_string(), "unsupported source metadata kind: snap");
    }

    #[test]
    fn cancelled_display() {
        let err: SbomkitError = CatalogError::Cancelled.into();
        assert_eq!(err.to_string(), "cataloging error: cataloging cancelled");
    }
}
