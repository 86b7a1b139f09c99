//! go.mod 파서
//!
//! `require` 지시자(단일 줄 및 블록)의 모듈을 패키지로 보고합니다.
//! `replace` 지시자가 같은 모듈을 다른 버전으로 바꾸면 교체된 버전을 사용합니다.

use std::collections::BTreeMap;

use crate::catalog::pkg::{ManifestParser, ParseInput};
use crate::error::CatalogingError;
use crate::types::{Package, PackageType};

/// go.mod 파서
pub struct GoModParser;

impl ManifestParser for GoModParser {
    fn globs(&self) -> &[&'static str] {
        &["**/go.mod"]
    }

    fn parse(&self, input: &ParseInput<'_>) -> Result<Vec<Package>, CatalogingError> {
        let mut requires: BTreeMap<String, String> = BTreeMap::new();
        let mut replaces: BTreeMap<String, String> = BTreeMap::new();
        let mut block: Option<&str> = None;

        for raw in input.content.lines() {
            let line = raw.split("//").next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }

            if let Some(directive) = block {
                if line == ")" {
                    block = None;
                    continue;
                }
                apply_directive(directive, line, &mut requires, &mut replaces);
                continue;
            }

            let Some((directive, rest)) = line.split_once(char::is_whitespace) else {
                continue;
            };
            let rest = rest.trim();
            if rest == "(" {
                block = Some(match directive {
                    "require" => "require",
                    "replace" => "replace",
                    _ => "other",
                });
                continue;
            }
            apply_directive(directive, rest, &mut requires, &mut replaces);
        }

        if block.is_some() {
            return Err(CatalogingError::Parse {
                path: input.location.path.clone(),
                reason: "unterminated directive block".to_owned(),
            });
        }

        Ok(requires
            .into_iter()
            .map(|(module, version)| {
                let version = replaces.get(&module).cloned().unwrap_or(version);
                Package::new(
                    module,
                    version,
                    PackageType::GoModule,
                    input.found_by,
                    input.location.clone(),
                )
            })
            .collect())
    }
}

fn apply_directive(
    directive: &str,
    line: &str,
    requires: &mut BTreeMap<String, String>,
    replaces: &mut BTreeMap<String, String>,
) {
    match directive {
        "require" => {
            let mut parts = line.split_whitespace();
            if let (Some(module), Some(version)) = (parts.next(), parts.next()) {
                requires.insert(module.to_owned(), version.to_owned());
            }
        }
        "replace" => {
            // old [v] => new v  (로컬 경로 교체는 버전이 없으므로 무시)
            let Some((_, new)) = line.split_once("=>") else {
                return;
            };
            let old = line.split_whitespace().next().unwrap_or("");
            let mut parts = new.split_whitespace();
            if let (Some(new_module), Some(version)) = (parts.next(), parts.next()) {
                if new_module == old {
                    replaces.insert(old.to_owned(), version.to_owned());
                }
            }
        }
        _ => {}
    }
}
