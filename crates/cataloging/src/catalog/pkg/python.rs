//! Python 파서 -- 설치된 배포본(dist-info/egg-info)과 선언 파일
//!
//! - [`PythonInstalledParser`]: `*.dist-info/METADATA`, `*.egg-info/PKG-INFO`.
//!   같은 디렉토리의 `RECORD`가 있으면 소유 파일 목록으로 사용합니다.
//! - [`PythonRequirementsParser`]: `requirements*.txt`의 고정 버전(`==`) 항목
//! - [`PoetryLockParser`]: `poetry.lock`의 `[[package]]` 항목

use serde::Deserialize;
use tracing::debug;

use crate::catalog::pkg::{ManifestParser, ParseInput, field, parse_rfc822_records};
use crate::error::CatalogingError;
use crate::types::{Location, Package, PackageType};

/// 설치된 Python 배포본 파서
pub struct PythonInstalledParser;

impl ManifestParser for PythonInstalledParser {
    fn globs(&self) -> &[&'static str] {
        &["**/*.dist-info/METADATA", "**/*.egg-info/PKG-INFO"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        // METADATA 헤더는 첫 빈 줄 전까지이며 이후는 본문(long description)
        let records = parse_rfc822_records(input.content);
        let Some(header) = records.first() else {
            return Ok(Vec::new());
        };

        let (Some(name), Some(version)) = (field(header, "Name"), field(header, "Version")) else {
            return Err(CatalogingError::Parse {
                path: input.location.path.clone(),
                reason: "missing Name or Version header".to_owned(),
            });
        };

        let mut pkg = Package::new(
            name,
            version,
            PackageType::Python,
            input.found_by,
            input.location.clone(),
        );
        pkg.dependencies = header
            .iter()
            .filter(|(k, _)| k.eq_ignore_ascii_case("Requires-Dist"))
            .filter_map(|(_, v)| requirement_name(v))
            .map(normalize_name)
            .collect();
        pkg.owned_files = record_files(input);
        Ok(vec![pkg])
    }
}

/// dist-info 옆 `RECORD`에서 소유 파일 목록을 읽습니다.
///
/// `RECORD`의 경로는 site-packages 기준이므로 dist-info의 부모 디렉토리를 붙입니다.
fn record_files(input: &ParseInput<'_>) -> Vec<String> {
    let dist_info = input.location.parent();
    let record = Location::new(format!("{dist_info}/RECORD"));
    if input.resolver.location_by_path(&record.path).is_none() {
        return Vec::new();
    }
    let content = match input.resolver.read_to_string(&record) {
        Ok(c) => c,
        Err(e) => {
            debug!(path = %record, error = %e, "failed to read RECORD");
            return Vec::new();
        }
    };

    let site_packages = Location::new(dist_info).parent().to_owned();
    content
        .lines()
        .filter_map(|line| line.split(',').next())
        .map(str::trim)
        .filter(|p| !p.is_empty() && !p.starts_with(".."))
        .map(|p| {
            if site_packages == "/" {
                format!("/{p}")
            } else {
                format!("{site_packages}/{p}")
            }
        })
        .collect()
}

/// requirements.txt 파서 (고정 버전만)
pub struct PythonRequirementsParser;

impl ManifestParser for PythonRequirementsParser {
    fn globs(&self) -> &[&'static str] {
        &["**/requirements*.txt"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let mut packages = Vec::new();
        for raw in input.content.lines() {
            // 주석, 옵션(-r, --index-url), 환경 마커 제거
            let line = raw.split('#').next().unwrap_or("").trim();
            if line.is_empty() || line.starts_with('-') {
                continue;
            }
            let line = line.split(';').next().unwrap_or("").trim();
            let Some((name, version)) = line.split_once("==") else {
                continue;
            };
            let name = name.split('[').next().unwrap_or(name).trim();
            let version = version.split(',').next().unwrap_or(version).trim();
            if name.is_empty() || version.is_empty() {
                continue;
            }
            packages.push(Package::new(
                normalize_name(name),
                version,
                PackageType::Python,
                input.found_by,
                input.location.clone(),
            ));
        }
        Ok(packages)
    }
}

/// poetry.lock 파서
pub struct PoetryLockParser;

#[derive(Deserialize)]
struct PoetryLockFile {
    #[serde(default)]
    package: Vec<PoetryPackageEntry>,
}

#[derive(Deserialize)]
struct PoetryPackageEntry {
    name: String,
    version: String,
    #[serde(default)]
    dependencies: toml::Table,
}

impl ManifestParser for PoetryLockParser {
    fn globs(&self) -> &[&'static str] {
        &["**/poetry.lock"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let lock_file: PoetryLockFile =
            toml::from_str(input.content).map_err(|e| CatalogingError::Parse {
                path: input.location.path.clone(),
                reason: e.to_string(),
            })?;

        Ok(lock_file
            .package
            .into_iter()
            .map(|entry| {
                let mut pkg = Package::new(
                    normalize_name(&entry.name),
                    entry.version,
                    PackageType::Python,
                    input.found_by,
                    input.location.clone(),
                );
                pkg.dependencies = entry.dependencies.keys().map(|k| normalize_name(k)).collect();
                pkg
            })
            .collect())
    }
}

/// `Requires-Dist` 값에서 패키지 이름만 추출 (`requests (>=2.0) ; extra == "x"` -> `requests`)
fn requirement_name(spec: &str) -> Option<&str> {
    let end = spec
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        .unwrap_or(spec.len());
    let name = &spec[..end];
    (!name.is_empty()).then_some(name)
}

/// PEP 503 이름 정규화
fn normalize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_dash = false;
    for c in name.trim().chars() {
        if c == '-' || c == '_' || c == '.' {
            if !last_dash {
                out.push('-');
            }
            last_dash = true;
        } else {
            out.push(c.to_ascii_lowercase());
            last_dash = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::DirectoryResolver;

    const SAMPLE_METADATA: &str = "Metadata-Version: 2.1\nName: Requests\nVersion: 2.32.3\nRequires-Dist: charset_normalizer (<4,>=2)\nRequires-Dist: idna<4,>=2.5\nRequires-Dist: PySocks!=1.5.7,>=1.5.6 ; extra == \"socks\"\n\nLong description body\nName: not-a-header\n";

    fn fixture() -> (tempfile::TempDir, DirectoryResolver) {
        let dir = tempfile::tempdir().unwrap();
        let dist_info = dir
            .path()
            .join("usr/lib/python3/site-packages/requests-2.32.3.dist-info");
        std::fs::create_dir_all(&dist_info).unwrap();
        std::fs::write(dist_info.join("METADATA"), SAMPLE_METADATA).unwrap();
        std::fs::write(
            dist_info.join("RECORD"),
            "requests/__init__.py,sha256=abc,494\nrequests/api.py,sha256=def,6449\n../../../bin/x,,\n",
        )
        .unwrap();
        let resolver = DirectoryResolver::new(dir.path(), 1 << 20).unwrap();
        (dir, resolver)
    }

    fn parse_with(
        parser: &dyn ManifestParser,
        resolver: &DirectoryResolver,
        path: &str,
        content: &str,
    ) -> Result<Vec<Package>, CatalogingError> {
        let location = Location::new(path);
        parser.parse(&ParseInput {
            resolver,
            location: &location,
            content,
            found_by: "python-test-cataloger",
        })
    }

    #[test]
    fn parse_installed_metadata_with_record() {
        let (_dir, resolver) = fixture();
        let packages = parse_with(
            &PythonInstalledParser,
            &resolver,
            "/usr/lib/python3/site-packages/requests-2.32.3.dist-info/METADATA",
            SAMPLE_METADATA,
        )
        .unwrap();
        assert_eq!(packages.len(), 1);

        let pkg = &packages[0];
        assert_eq!(pkg.name, "Requests");
        assert_eq!(pkg.purl, "pkg:pypi/Requests@2.32.3");
        assert_eq!(pkg.dependencies, vec!["charset-normalizer", "idna", "pysocks"]);
        assert_eq!(
            pkg.owned_files,
            vec![
                "/usr/lib/python3/site-packages/requests/__init__.py",
                "/usr/lib/python3/site-packages/requests/api.py",
            ]
        );
    }

    #[test]
    fn metadata_without_version_is_error() {
        let (_dir, resolver) = fixture();
        let err = parse_with(
            &PythonInstalledParser,
            &resolver,
            "/x.dist-info/METADATA",
            "Name: foo\n",
        )
        .unwrap_err();
        assert!(matches!(err, CatalogingError::Parse { .. }));
    }

    #[test]
    fn parse_requirements_pinned_only() {
        let (_dir, resolver) = fixture();
        let content = "# comment\n-r base.txt\nFlask==3.0.3\nrequests>=2.0\nuvicorn[standard]==0.30.1 ; python_version >= \"3.8\"\n\n";
        let packages =
            parse_with(&PythonRequirementsParser, &resolver, "/requirements.txt", content)
                .unwrap();
        let names: Vec<_> = packages.iter().map(|p| (p.name.as_str(), p.version.as_str())).collect();
        assert_eq!(names, vec![("flask", "3.0.3"), ("uvicorn", "0.30.1")]);
    }

    #[test]
    fn parse_poetry_lock() {
        let (_dir, resolver) = fixture();
        let content = r#"
[[package]]
name = "Jinja2"
version = "3.1.4"

[package.dependencies]
MarkupSafe = ">=2.0"

[[package]]
name = "markupsafe"
version = "2.1.5"
"#;
        let packages =
            parse_with(&PoetryLockParser, &resolver, "/poetry.lock", content).unwrap();
        assert_eq!(packages.len(), 2);
        assert_eq!(packages[0].name, "jinja2");
        assert_eq!(packages[0].dependencies, vec!["markupsafe"]);
    }

    #[test]
    fn normalize_names() {
        assert_eq!(normalize_name("Charset_Normalizer"), "charset-normalizer");
        assert_eq!(normalize_name("zope.interface"), "zope-interface");
        assert_eq!(normalize_name("a__b"), "a-b");
    }

    #[test]
    fn requirement_names() {
        assert_eq!(requirement_name("idna<4,>=2.5"), Some("idna"));
        assert_eq!(requirement_name("charset_normalizer (<4,>=2)"), Some("charset_normalizer"));
        assert_eq!(requirement_name(">=1"), None);
    }
}
