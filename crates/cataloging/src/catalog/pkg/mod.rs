//! 패키지 카탈로거 -- 생태계별 메타데이터 파서
//!
//! [`ManifestParser`] trait은 각 메타데이터 형식의 파서가 구현해야 하는 인터페이스입니다.
//! [`GenericCataloger`]는 파서가 선언한 glob으로 리졸버에서 파일을 찾아
//! 파싱하고, 같은 파일 집합 안의 의존 관계를 `DependencyOf` 관계로 연결합니다.
//!
//! # 지원 형식
//!
//! - `Cargo.lock` (TOML) -- [`cargo::CargoLockParser`]
//! - `package-lock.json`, `node_modules/*/package.json` -- [`javascript`]
//! - `*.dist-info/METADATA`, `requirements*.txt`, `poetry.lock` -- [`python`]
//! - `go.mod` -- [`golang::GoModParser`]
//! - `var/lib/dpkg/status` -- [`dpkg::DpkgStatusParser`]
//! - `lib/apk/db/installed` -- [`apk::ApkInstalledParser`]
//!
//! # 확장
//!
//! 새로운 형식을 지원하려면 `ManifestParser` trait을 구현하고
//! `catalog::default_package_tasks()`에 태그와 함께 등록합니다.

pub mod apk;
pub mod cargo;
pub mod dpkg;
pub mod golang;
pub mod javascript;
pub mod python;

use std::collections::{BTreeSet, HashMap};

use tracing::{debug, warn};

use crate::error::CatalogingError;
use crate::resolver::Resolver;
use crate::task::Cataloger;
use crate::types::{Location, Package, Relationship, RelationshipType};

/// 파서 입력
pub struct ParseInput<'a> {
    /// 스캔 대상 리졸버 (부가 파일 조회용)
    pub resolver: &'a dyn Resolver,
    /// 파싱 대상 위치
    pub location: &'a Location,
    /// 파일 내용
    pub content: &'a str,
    /// 카탈로거 이름 (`Package::found_by`)
    pub found_by: &'a str,
}

/// 패키지 메타데이터 파서
pub trait ManifestParser: Send + Sync {
    /// 처리할 경로 glob 목록
    fn globs(&self) -> &[&'static str];

    /// 파일 내용을 파싱하여 패키지를 반환합니다.
    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError>;
}

/// glob + 파서로 구성된 범용 카탈로거
///
/// 하나의 카탈로거가 여러 형식을 다룰 수 있도록 파서를 여러 개 가질 수 있습니다.
pub struct GenericCataloger {
    name: &'static str,
    parsers: Vec<Box<dyn ManifestParser>>,
}

impl GenericCataloger {
    /// 카탈로거를 생성합니다.
    pub fn new(name: &'static str, parser: impl ManifestParser + 'static) -> Self {
        Self {
            name,
            parsers: vec![Box::new(parser)],
        }
    }

    /// 파서를 추가합니다.
    pub fn with_parser(mut self, parser: impl ManifestParser + 'static) -> Self {
        self.parsers.push(Box::new(parser));
        self
    }
}

impl Cataloger for GenericCataloger {
    fn name(&self) -> &str {
        self.name
    }

    fn catalog(
        &self,
        resolver: &dyn Resolver,
    ) -> Result<(Vec<Package>, Vec<Relationship>), CatalogingError> {
        let mut packages = Vec::new();
        for parser in &self.parsers {
            let mut locations = BTreeSet::new();
            for glob in parser.globs() {
                locations.extend(resolver.locations_by_glob(glob)?);
            }

            for location in &locations {
                let content = match resolver.read_to_string(location) {
                    Ok(c) => c,
                    Err(e) => {
                        warn!(cataloger = self.name, path = %location, error = %e, "failed to read file, skipping");
                        continue;
                    }
                };

                let input = ParseInput {
                    resolver,
                    location,
                    content: &content,
                    found_by: self.name,
                };
                match parser.parse(&input) {
                    Ok(found) => {
                        debug!(cataloger = self.name, path = %location, packages = found.len(), "parsed");
                        packages.extend(found);
                    }
                    Err(e) => {
                        warn!(cataloger = self.name, path = %location, error = %e, "failed to parse, skipping");
                    }
                }
            }
        }

        let relationships = dependency_relationships(&packages);
        Ok((packages, relationships))
    }
}

/// 같은 근거 파일의 패키지 간 `DependencyOf` 관계를 만듭니다.
///
/// 관계 방향은 의존성 -> 의존하는 패키지입니다.
pub fn dependency_relationships(packages: &[Package]) -> Vec<Relationship> {
    let mut by_key: HashMap<(&str, &str), &Package> = HashMap::new();
    for pkg in packages {
        let evidence = pkg.locations.first().map(|l| l.path.as_str()).unwrap_or("");
        by_key.entry((evidence, pkg.name.as_str())).or_insert(pkg);
    }

    let mut relationships = Vec::new();
    for pkg in packages {
        let evidence = pkg.locations.first().map(|l| l.path.as_str()).unwrap_or("");
        for dep in &pkg.dependencies {
            if let Some(target) = by_key.get(&(evidence, dep.as_str())) {
                if target.id != pkg.id {
                    relationships.push(Relationship {
                        from: target.id.clone(),
                        to: pkg.id.clone(),
                        kind: RelationshipType::DependencyOf,
                    });
                }
            }
        }
    }
    relationships
}

/// `key: value` 형식의 레코드를 빈 줄 기준으로 나눕니다 (dpkg status, PKG-INFO).
///
/// 들여쓰기로 시작하는 줄은 직전 값의 연속으로 취급합니다.
pub(crate) fn parse_rfc822_records(content: &str) -> Vec<Vec<(String, String)>> {
    let mut records = Vec::new();
    let mut current: Vec<(String, String)> = Vec::new();

    for line in content.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                records.push(std::mem::take(&mut current));
            }
            continue;
        }
        if line.starts_with(' ') || line.starts_with('\t') {
            if let Some((_, value)) = current.last_mut() {
                value.push('\n');
                value.push_str(line.trim());
            }
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            current.push((key.trim().to_owned(), value.trim().to_owned()));
        }
    }
    if !current.is_empty() {
        records.push(current);
    }
    records
}

/// 레코드에서 첫 번째 값을 찾습니다.
pub(crate) fn field<'a>(record: &'a [(String, String)], key: &str) -> Option<&'a str> {
    record
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::PackageType;

    #[test]
    fn dependency_relationships_link_within_same_file() {
        let loc = Location::new("/Cargo.lock");
        let mut app = Package::new("app", "0.1.0", PackageType::RustCrate, "c", loc.clone());
        app.dependencies = vec!["serde".to_owned(), "missing".to_owned()];
        let serde = Package::new("serde", "1.0.0", PackageType::RustCrate, "c", loc);
        let other = Package::new(
            "serde",
            "0.9.0",
            PackageType::RustCrate,
            "c",
            Location::new("/other/Cargo.lock"),
        );

        let rels = dependency_relationships(&[app.clone(), serde.clone(), other]);
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].from, serde.id);
        assert_eq!(rels[0].to, app.id);
        assert_eq!(rels[0].kind, RelationshipType::DependencyOf);
    }

    #[test]
    fn rfc822_records_split_on_blank_lines() {
        let content = "Package: a\nVersion: 1\nDescription: first\n more\n\nPackage: b\nVersion: 2\n";
        let records = parse_rfc822_records(content);
        assert_eq!(records.len(), 2);
        assert_eq!(field(&records[0], "package"), Some("a"));
        assert_eq!(field(&records[0], "Description"), Some("first\nmore"));
        assert_eq!(field(&records[1], "Version"), Some("2"));
        assert_eq!(field(&records[1], "Missing"), None);
    }
}
