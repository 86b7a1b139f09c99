//! 설정 관리 -- sbomkit.toml 파싱 및 런타임 설정
//!
//! [`SbomkitConfig`]는 로깅과 카탈로깅 엔진 설정을 담는 최상위 구조체입니다.
//!
//! # 설정 로딩 우선순위
//! 1. CLI 인자 (최고 우선)
//! 2. 환경변수 (`SBOMKIT_FILES_SELECTION=all` 형식)
//! 3. 설정 파일 (`sbomkit.toml`)
//! 4. 기본값 (`Default` 구현)
//!
//! 여기서의 `validate()`는 값 범위와 열거형만 확인합니다. 필드 간 의존 관계
//! (예: 바이너리 패키지 제외 ↔ 소유권 중복 계산)는 카탈로깅 엔진의
//! `CreateSbomConfig::validate()`가 검사합니다.
//!
//! # 사용 예시
//! ```no_run
//! # async fn example() -> Result<(), sbomkit_core::error::SbomkitError> {
//! use sbomkit_core::config::SbomkitConfig;
//!
//! // 파일에서 로드 + 환경변수 오버라이드
//! let config = SbomkitConfig::load("sbomkit.toml").await?;
//!
//! // TOML 문자열에서 직접 파싱
//! let config = SbomkitConfig::parse("[files]\nselection = \"all\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, SbomkitError};

/// 파일 선택 모드: 패키지가 소유한 파일만
pub const FILE_SELECTION_OWNED_BY_PACKAGE: &str = "owned-by-package";
/// 파일 선택 모드: 대상 전체 파일
pub const FILE_SELECTION_ALL: &str = "all";
/// 파일 선택 모드: 파일 분석 안 함
pub const FILE_SELECTION_NONE: &str = "none";

/// 지원하는 다이제스트 알고리즘
pub const SUPPORTED_HASHERS: [&str; 2] = ["sha256", "sha512"];

const MAX_PARALLELISM: usize = 256;

/// sbomkit 통합 설정
///
/// `sbomkit.toml` 파일의 최상위 구조를 나타냅니다.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SbomkitConfig {
    /// 일반 설정
    #[serde(default)]
    pub general: GeneralConfig,
    /// 카탈로거 선택 설정
    #[serde(default)]
    pub cataloging: CatalogingConfig,
    /// 파일 분석 설정
    #[serde(default)]
    pub files: FilesConfig,
    /// 관계 계산 설정
    #[serde(default)]
    pub relationships: RelationshipsConfig,
    /// 미분류(unknowns) 라벨링 설정
    #[serde(default)]
    pub unknowns: UnknownsConfig,
}

impl SbomkitConfig {
    /// TOML 파일에서 설정을 로드하고 환경변수 오버라이드를 적용합니다.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, SbomkitError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// 설정 파일이 없으면 기본값에서 시작하는 `load()` 변형입니다.
    pub async fn load_or_default(path: impl AsRef<Path>) -> Result<Self, SbomkitError> {
        match Self::load(path.as_ref()).await {
            Err(SbomkitError::Config(ConfigError::FileNotFound { path })) => {
                tracing::debug!(path = %path, "config file not found, using defaults");
                let mut config = Self::default();
                config.apply_env_overrides();
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }

    /// TOML 파일에서 설정을 로드합니다 (환경변수 오버라이드 없음).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, SbomkitError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                SbomkitError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                SbomkitError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// TOML 문자열에서 설정을 파싱합니다.
    pub fn parse(toml_str: &str) -> Result<Self, SbomkitError> {
        toml::from_str(toml_str).map_err(|e| {
            SbomkitError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// 환경변수로 설정값을 오버라이드합니다.
    ///
    /// 환경변수 네이밍 규칙: `SBOMKIT_{SECTION}_{FIELD}`
    /// 예: `SBOMKIT_CATALOGING_SELECT=javascript,python`
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "SBOMKIT_GENERAL_LOG_LEVEL");
        override_string(&mut self.general.log_format, "SBOMKIT_GENERAL_LOG_FORMAT");

        // Cataloging
        override_csv(&mut self.cataloging.default, "SBOMKIT_CATALOGING_DEFAULT");
        override_csv(&mut self.cataloging.remove, "SBOMKIT_CATALOGING_REMOVE");
        override_csv(&mut self.cataloging.select, "SBOMKIT_CATALOGING_SELECT");
        override_csv(&mut self.cataloging.add, "SBOMKIT_CATALOGING_ADD");
        override_usize(
            &mut self.cataloging.parallelism,
            "SBOMKIT_CATALOGING_PARALLELISM",
        );

        // Files
        override_string(&mut self.files.selection, "SBOMKIT_FILES_SELECTION");
        override_csv(&mut self.files.hashers, "SBOMKIT_FILES_HASHERS");
        override_usize(&mut self.files.max_file_size, "SBOMKIT_FILES_MAX_FILE_SIZE");
        override_csv(&mut self.files.content.globs, "SBOMKIT_FILES_CONTENT_GLOBS");
        override_usize(
            &mut self.files.content.skip_files_above_size,
            "SBOMKIT_FILES_CONTENT_SKIP_FILES_ABOVE_SIZE",
        );

        // Relationships
        override_bool(
            &mut self.relationships.package_file_ownership,
            "SBOMKIT_RELATIONSHIPS_PACKAGE_FILE_OWNERSHIP",
        );
        override_bool(
            &mut self.relationships.package_file_ownership_overlap,
            "SBOMKIT_RELATIONSHIPS_PACKAGE_FILE_OWNERSHIP_OVERLAP",
        );
        override_bool(
            &mut self
                .relationships
                .exclude_binary_packages_with_file_ownership_overlap,
            "SBOMKIT_RELATIONSHIPS_EXCLUDE_BINARY_PACKAGES_WITH_FILE_OWNERSHIP_OVERLAP",
        );

        // Unknowns
        override_bool(
            &mut self.unknowns.remove_when_packages_defined,
            "SBOMKIT_UNKNOWNS_REMOVE_WHEN_PACKAGES_DEFINED",
        );
        override_bool(
            &mut self.unknowns.executables_without_packages,
            "SBOMKIT_UNKNOWNS_EXECUTABLES_WITHOUT_PACKAGES",
        );
    }

    /// 설정값의 유효성을 검증합니다.
    pub fn validate(&self) -> Result<(), SbomkitError> {
        // log_level 검증
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        // log_format 검증
        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.cataloging.parallelism == 0 || self.cataloging.parallelism > MAX_PARALLELISM {
            return Err(ConfigError::InvalidValue {
                field: "cataloging.parallelism".to_owned(),
                reason: format!("must be 1-{MAX_PARALLELISM}"),
            }
            .into());
        }

        // 선택 토큰은 공백일 수 없음
        for (field, tokens) in [
            ("cataloging.default", &self.cataloging.default),
            ("cataloging.remove", &self.cataloging.remove),
            ("cataloging.select", &self.cataloging.select),
            ("cataloging.add", &self.cataloging.add),
        ] {
            if tokens.iter().any(|t| t.trim().is_empty()) {
                return Err(ConfigError::InvalidValue {
                    field: field.to_owned(),
                    reason: "name or tag must not be empty".to_owned(),
                }
                .into());
            }
        }

        let valid_selections = [
            FILE_SELECTION_OWNED_BY_PACKAGE,
            FILE_SELECTION_ALL,
            FILE_SELECTION_NONE,
        ];
        if !valid_selections.contains(&self.files.selection.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "files.selection".to_owned(),
                reason: format!("must be one of: {}", valid_selections.join(", ")),
            }
            .into());
        }

        for hasher in &self.files.hashers {
            if !SUPPORTED_HASHERS.contains(&hasher.as_str()) {
                return Err(ConfigError::InvalidValue {
                    field: "files.hashers".to_owned(),
                    reason: format!(
                        "unsupported hasher '{hasher}', must be one of: {}",
                        SUPPORTED_HASHERS.join(", ")
                    ),
                }
                .into());
            }
        }

        if self.files.max_file_size == 0 {
            return Err(ConfigError::InvalidValue {
                field: "files.max_file_size".to_owned(),
                reason: "must be greater than 0".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// 일반 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// 로그 레벨 (trace, debug, info, warn, error)
    pub log_level: String,
    /// 로그 형식 (json, pretty)
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "warn".to_owned(),
            log_format: "pretty".to_owned(),
        }
    }
}

/// 카탈로거 선택 설정
///
/// 이름 또는 태그 토큰 목록입니다. `default` 목록이 비어 있으면
/// 소스 범주의 기본 태그가 사용되며, `"default"` 토큰은 그 기본 태그로
/// 치환됩니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogingConfig {
    /// 기본 선택 (이름/태그)
    pub default: Vec<String>,
    /// 제거할 이름/태그
    pub remove: Vec<String>,
    /// 태그 부분 선택
    pub select: Vec<String>,
    /// 강제 추가할 이름/태그
    pub add: Vec<String>,
    /// 스테이지 내 동시 실행 태스크 수
    pub parallelism: usize,
}

impl Default for CatalogingConfig {
    fn default() -> Self {
        Self {
            default: Vec::new(),
            remove: Vec::new(),
            select: Vec::new(),
            add: Vec::new(),
            parallelism: 4,
        }
    }
}

/// 파일 분석 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// 파일 선택 모드 (owned-by-package, all, none)
    pub selection: String,
    /// 다이제스트 알고리즘 목록
    pub hashers: Vec<String>,
    /// 리졸버가 인덱싱할 최대 파일 크기 (바이트)
    pub max_file_size: usize,
    /// 파일 내용 수집 설정
    #[serde(default)]
    pub content: ContentConfig,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            selection: FILE_SELECTION_OWNED_BY_PACKAGE.to_owned(),
            hashers: vec!["sha256".to_owned()],
            max_file_size: 100 * 1024 * 1024, // 100 MB
            content: ContentConfig::default(),
        }
    }
}

/// 파일 내용 수집 설정
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentConfig {
    /// 내용을 수집할 경로 glob 목록
    pub globs: Vec<String>,
    /// 이 크기(바이트)를 넘는 파일은 수집하지 않음
    pub skip_files_above_size: usize,
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
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipsConfig {
    /// 패키지 → 파일 소유 관계 생성
    pub package_file_ownership: bool,
    /// 파일 소유권이 겹치는 패키지 간 관계 생성
    pub package_file_ownership_overlap: bool,
    /// 다른 패키지와 소유 파일이 겹치는 바이너리 패키지 제외
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
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
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

// --- 환경변수 오버라이드 헬퍼 ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_usize(target: &mut usize, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<usize>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse usize from env var, ignoring"
            ),
        }
    }
}

fn override_csv(target: &mut Vec<String>, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = SbomkitConfig::default();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.general.log_format, "pretty");
        assert!(config.cataloging.default.is_empty());
        assert_eq!(config.cataloging.parallelism, 4);
        assert_eq!(config.files.selection, FILE_SELECTION_OWNED_BY_PACKAGE);
        assert_eq!(config.files.hashers, vec!["sha256"]);
        assert!(config.relationships.package_file_ownership_overlap);
        assert!(
            config
                .relationships
                .exclude_binary_packages_with_file_ownership_overlap
        );
    }

    #[test]
    fn default_config_passes_validation() {
        let config = SbomkitConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn from_str_empty_toml_uses_defaults() {
        let config = SbomkitConfig::parse("").unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.files.selection, FILE_SELECTION_OWNED_BY_PACKAGE);
    }

    #[test]
    fn from_str_partial_toml_merges_with_defaults() {
        let toml = r#"
[cataloging]
select = ["javascript"]

[files]
selection = "all"
"#;
        let config = SbomkitConfig::parse(toml).unwrap();
        assert_eq!(config.cataloging.select, vec!["javascript"]);
        assert_eq!(config.files.selection, "all");
        // hashers는 기본값 유지
        assert_eq!(config.files.hashers, vec!["sha256"]);
        assert_eq!(config.files.content.skip_files_above_size, 256 * 1024);
    }

    #[test]
    fn from_str_invalid_toml_returns_error() {
        let result = SbomkitConfig::parse("invalid = [[[toml");
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            SbomkitError::Config(ConfigError::ParseFailed { .. })
        ));
    }

    #[test]
    fn validate_rejects_invalid_log_level() {
        let mut config = SbomkitConfig::default();
        config.general.log_level = "verbose".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn validate_rejects_invalid_log_format() {
        let mut config = SbomkitConfig::default();
        config.general.log_format = "xml".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("log_format"));
    }

    #[test]
    fn validate_rejects_unknown_file_selection() {
        let mut config = SbomkitConfig::default();
        config.files.selection = "some".to_owned();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("files.selection"));
    }

    #[test]
    fn validate_rejects_unknown_hasher() {
        let mut config = SbomkitConfig::default();
        config.files.hashers = vec!["md5".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("md5"));
    }

    #[test]
    fn validate_rejects_zero_parallelism() {
        let mut config = SbomkitConfig::default();
        config.cataloging.parallelism = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_selection_token() {
        let mut config = SbomkitConfig::default();
        config.cataloging.remove = vec!["digest".to_owned(), " ".to_owned()];
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cataloging.remove"));
    }

    #[test]
    fn env_override_string() {
        let mut val = "original".to_owned();
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SBOMKIT_STR", "overridden") };
        override_string(&mut val, "TEST_SBOMKIT_STR");
        assert_eq!(val, "overridden");
        unsafe { std::env::remove_var("TEST_SBOMKIT_STR") };
    }

    #[test]
    fn env_override_bool_invalid_keeps_original() {
        let mut val = false;
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SBOMKIT_BOOL_BAD", "not-a-bool") };
        override_bool(&mut val, "TEST_SBOMKIT_BOOL_BAD");
        assert!(!val); // 원래 값 유지
        unsafe { std::env::remove_var("TEST_SBOMKIT_BOOL_BAD") };
    }

    #[test]
    fn env_override_csv_drops_empty_items() {
        let mut val = vec!["a".to_owned()];
        // SAFETY: 테스트는 단일 스레드에서 실행되므로 환경변수 조작이 안전합니다.
        unsafe { std::env::set_var("TEST_SBOMKIT_CSV", "image, ,javascript") };
        override_csv(&mut val, "TEST_SBOMKIT_CSV");
        assert_eq!(val, vec!["image", "javascript"]);
        unsafe { std::env::remove_var("TEST_SBOMKIT_CSV") };
    }

    #[test]
    fn config_serialize_roundtrip() {
        let config = SbomkitConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed = SbomkitConfig::parse(&toml_str).unwrap();
        assert_eq!(config.files.selection, parsed.files.selection);
        assert_eq!(config.cataloging.parallelism, parsed.cataloging.parallelism);
        assert_eq!(
            config.files.content.skip_files_above_size,
            parsed.files.content.skip_files_above_size
        );
    }

    #[tokio::test]
    async fn from_file_not_found() {
        let result = SbomkitConfig::from_file("/nonexistent/path/sbomkit.toml").await;
        let err = result.unwrap_err();
        assert!(matches!(
            err,
            SbomkitError::Config(ConfigError::FileNotFound { .. })
        ));
    }
}
