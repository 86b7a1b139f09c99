//! apk 설치 DB 파서
//!
//! `lib/apk/db/installed`는 빈 줄로 구분된 레코드이며 각 줄은 `X:값` 형식입니다.
//! `F:`(디렉토리) 다음의 `R:`(파일) 줄들이 패키지 소유 파일이 됩니다.

use crate::catalog::pkg::{ManifestParser, ParseInput};
use crate::error::CatalogingError;
use crate::types::{Package, PackageType};

const DB_SUFFIX: &str = "/lib/apk/db/installed";

/// apk installed DB 파서
pub struct ApkInstalledParser;

#[derive(Default)]
struct ApkRecord {
    name: Option<String>,
    version: Option<String>,
    depends: Vec<String>,
    files: Vec<String>,
}

impl ManifestParser for ApkInstalledParser {
    fn globs(&self) -> &[&'static str] {
        &["**/lib/apk/db/installed"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let db_root = input.location.path.strip_suffix(DB_SUFFIX).unwrap_or("");

        let mut records = Vec::new();
        let mut current = ApkRecord::default();
        let mut dir = String::new();

        for line in input.content.lines() {
            if line.trim().is_empty() {
                records.push(std::mem::take(&mut current));
                dir.clear();
                continue;
            }
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key {
                "P" => current.name = Some(value.to_owned()),
                "V" => current.version = Some(value.to_owned()),
                "D" => current.depends = parse_depends(value),
                "F" => dir = value.to_owned(),
                "R" => {
                    let path = if dir.is_empty() {
                        format!("{db_root}/{value}")
                    } else {
                        format!("{db_root}/{dir}/{value}")
                    };
                    current.files.push(path);
                }
                _ => {}
            }
        }
        records.push(current);

        Ok(records
            .into_iter()
            .filter_map(|record| {
                let (name, version) = (record.name?, record.version?);
                let mut pkg = Package::new(
                    name,
                    version,
                    PackageType::Apk,
                    input.found_by,
                    input.location.clone(),
                );
                pkg.dependencies = record.depends;
                pkg.owned_files = record.files;
                Some(pkg)
            })
            .collect())
    }
}

/// `so:libc.musl-x86_64.so.1 musl>=1.2 !conflict` -> `["musl"]`
///
/// 공유 라이브러리/명령 제공자(`so:`, `cmd:`)와 충돌 표기(`!`)는 패키지 이름이 아니므로 제외합니다.
fn parse_depends(value: &str) -> Vec<String> {
    value
        .split_whitespace()
        .filter(|d| !d.contains(':') && !d.starts_with('!'))
        .map(|d| {
            d.split(['<', '>', '=', '~'])
                .next()
                .unwrap_or(d)
                .to_owned()
        })
        .filter(|d| !d.is_empty())
        .collect()
}
