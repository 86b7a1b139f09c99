//! Cargo.lock 파서
//!
//! [`CargoLockParser`]는 Cargo lockfile (v1~v4)의 `[[package]]` 테이블을 파싱합니다.
//!
//! # Cargo.lock 형식 예시
//!
//! ```toml
//! version = 3
//!
//! [[package]]
//! name = "serde"
//! version = "1.0.204"
//! source = "registry+https://github.com/rust-lang/crates.io-index"
//! checksum = "bc76f558..."
//! dependencies = ["serde_derive"]
//! ```

use serde::Deserialize;

use crate::catalog::pkg::{ManifestParser, ParseInput};
use crate::error::CatalogingError;
use crate::types::{Package, PackageType};

/// Cargo.lock 파서
pub struct CargoLockParser;

/// Cargo.lock 구조 (파싱용)
#[derive(Deserialize)]
struct CargoLockFile {
    #[serde(default)]
    package: Vec<CargoPackageEntry>,
}

/// Cargo.lock 내 개별 패키지 (파싱용)
#[derive(Deserialize)]
struct CargoPackageEntry {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: Vec<String>,
}

impl ManifestParser for CargoLockParser {
    fn globs(&self) -> &[&'static str] {
        &["**/Cargo.lock"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let lock_file: CargoLockFile =
            toml::from_str(input.content).map_err(|e| CatalogingError::Parse {
                path: input.location.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(lock_file
            .package
            .into_iter()
            .map(|entry| {
                let mut pkg = Package::new(
                    entry.name,
                    entry.version,
                    PackageType::RustCrate,
                    input.found_by,
                    input.location.clone(),
                );
                pkg.dependencies = entry
                    .dependencies
                    .iter()
                    .map(|d| dependency_name(d).to_owned())
                    .collect();
                pkg
            })
            .collect())
    }
}

/// `"name"`, `"name 1.0.0"`, `"name 1.0.0 (registry+...)"` 에서 이름 추출
fn dependency_name(spec: &str) -> &str {
    spec.split_whitespace().next().unwrap_or(spec)
}
