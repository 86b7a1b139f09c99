//! dpkg 상태 DB 파서
//!
//! `var/lib/dpkg/status`의 설치된 패키지 레코드를 읽고, 같은 루트의
//! `var/lib/dpkg/info/<패키지>[:<아키텍처>].list`에서 소유 파일을 가져옵니다.

use crate::catalog::pkg::{ManifestParser, ParseInput, field, parse_rfc822_records};
use crate::error::CatalogingError;
use crate::types::{Location, Package, PackageType};

const STATUS_SUFFIX: &str = "/var/lib/dpkg/status";

/// dpkg status 파서
pub struct DpkgStatusParser;

impl ManifestParser for DpkgStatusParser {
    fn globs(&self) -> &[&'static str] {
        &["**/var/lib/dpkg/status"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let db_root = input
            .location
            .path
            .strip_suffix(STATUS_SUFFIX)
            .unwrap_or("");

        let mut packages = Vec::new();
        for record in parse_rfc822_records(input.content) {
            let (Some(name), Some(version)) = (field(&record, "Package"), field(&record, "Version"))
            else {
                continue;
            };
            // 제거되었지만 설정 파일만 남은 패키지 제외
            if let Some(status) = field(&record, "Status") {
                if !status.ends_with("installed") || status.contains("not-installed") {
                    continue;
                }
            }

            let mut pkg = Package::new(
                name,
                version,
                PackageType::Deb,
                input.found_by,
                input.location.clone(),
            );
            pkg.dependencies = field(&record, "Depends")
                .map(parse_depends)
                .unwrap_or_default();
            pkg.owned_files = owned_files(input, db_root, name, field(&record, "Architecture"));
            packages.push(pkg);
        }
        Ok(packages)
    }
}

/// `libc6 (>= 2.34), libssl3 | libssl1.1` -> `["libc6", "libssl3"]`
fn parse_depends(value: &str) -> Vec<String> {
    value
        .split(',')
        .filter_map(|alt| alt.split('|').next())
        .filter_map(|dep| dep.split_whitespace().next())
        .map(|dep| dep.split(':').next().unwrap_or(dep).to_owned())
        .filter(|dep| !dep.is_empty())
        .collect()
}

fn owned_files(
    input: &ParseInput<'_>,
    db_root: &str,
    name: &str,
    arch: Option<&str>,
) -> Vec<String> {
    let mut candidates = vec![format!("{db_root}/var/lib/dpkg/info/{name}.list")];
    if let Some(arch) = arch {
        candidates.push(format!("{db_root}/var/lib/dpkg/info/{name}:{arch}.list"));
    }

    let Some(list) = candidates
        .iter()
        .find_map(|c| input.resolver.location_by_path(c))
    else {
        return Vec::new();
    };

    let Ok(content) = input.resolver.read_to_string(&list) else {
        return Vec::new();
    };
    content
        .lines()
        .map(str::trim)
        .filter(|p| !p.is_empty() && *p != "/.")
        .map(|p| Location::new(format!("{db_root}{p}")).path)
        .collect()
}
