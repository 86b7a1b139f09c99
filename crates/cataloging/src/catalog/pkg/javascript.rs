//! JavaScript 파서 -- package-lock.json, 설치된 package.json
//!
//! [`NpmLockParser`]는 NPM의 package-lock.json (v2/v3)을, [`NodePackageJsonParser`]는
//! `node_modules` 아래 설치된 패키지의 package.json을 파싱합니다.
//!
//! # package-lock.json v3 형식 예시
//!
//! ```json
//! {
//!   "name": "my-app",
//!   "lockfileVersion": 3,
//!   "packages": {
//!     "": { "name": "my-app", "version": "1.0.0" },
//!     "node_modules/lodash": { "version": "4.17.21", "resolved": "...", "integrity": "sha512-..." }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::catalog::pkg::{ManifestParser, ParseInput};
use crate::error::CatalogingError;
use crate::types::{Package, PackageType};

/// package-lock.json 파서
pub struct NpmLockParser;

/// package-lock.json 구조 (파싱용)
#[derive(Deserialize)]
struct NpmLockFile {
    #[serde(default)]
    packages: BTreeMap<String, NpmPackageEntry>,
}

/// package-lock.json 내 개별 패키지 (파싱용)
#[derive(Deserialize)]
struct NpmPackageEntry {
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

impl ManifestParser for NpmLockParser {
    fn globs(&self) -> &[&'static str] {
        &["**/package-lock.json"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let lock_file: NpmLockFile =
            serde_json::from_str(input.content).map_err(|e| CatalogingError::Parse {
                path: input.location.path.clone(),
                reason: e.to_string(),
            })?;

        let mut packages = Vec::new();
        for (key, entry) in lock_file.packages {
            // 루트 패키지는 키가 빈 문자열
            if key.is_empty() {
                continue;
            }
            // 버전 없는 항목(링크 등)은 건너뜀
            let Some(version) = entry.version else {
                continue;
            };

            let mut pkg = Package::new(
                extract_package_name(&key),
                version,
                PackageType::Npm,
                input.found_by,
                input.location.clone(),
            );
            pkg.dependencies = entry.dependencies.into_keys().collect();
            packages.push(pkg);
        }

        Ok(packages)
    }
}

/// 설치된 package.json 파서
pub struct NodePackageJsonParser;

/// package.json 구조 (파싱용)
#[derive(Deserialize)]
struct PackageJson {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

impl ManifestParser for NodePackageJsonParser {
    fn globs(&self) -> &[&'static str] {
        &["**/node_modules/**/package.json"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let manifest: PackageJson =
            serde_json::from_str(input.content).map_err(|e| CatalogingError::Parse {
                path: input.location.path.clone(),
                reason: e.to_string(),
            })?;

        // 이름/버전이 없는 package.json은 테스트 픽스처 등이므로 패키지가 아님
        let (Some(name), Some(version)) = (manifest.name, manifest.version) else {
            return Ok(Vec::new());
        };

        let mut pkg = Package::new(
            name,
            version,
            PackageType::Npm,
            input.found_by,
            input.location.clone(),
        );
        pkg.dependencies = manifest.dependencies.into_keys().collect();
        Ok(vec![pkg])
    }
}

/// "node_modules/@scope/name" 또는 "node_modules/name" 에서 패키지명 추출
fn extract_package_name(key: &str) -> String {
    // 마지막 "node_modules/" 이후의 부분을 패키지명으로 사용
    match key.rfind("node_modules/") {
        Some(pos) => key[pos + "node_modules/".len()..].to_owned(),
        None => key.to_owned(),
    }
}
