//! SBOM 누적기 -- 스테이지 경계에서 태스크 출력을 병합

use std::collections::{BTreeMap, BTreeSet, HashSet};

use serde::{Deserialize, Serialize};

use crate::task::{Change, TaskOutput};
use crate::types::{
    Executable, FileDigest, FileRecord, LinuxRelease, Package, Relationship, Unknown,
};

/// 카탈로깅 결과 아티팩트 모음
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sbom {
    /// 패키지 (ID 순)
    pub packages: Vec<Package>,
    /// 관계
    pub relationships: Vec<Relationship>,
    /// 파일 메타데이터 (경로 키)
    pub files: BTreeMap<String, FileRecord>,
    /// 파일 다이제스트 (경로 키)
    pub digests: BTreeMap<String, Vec<FileDigest>>,
    /// 실행 파일 (경로 키)
    pub executables: BTreeMap<String, Executable>,
    /// 수집된 파일 내용 (경로 키)
    pub contents: BTreeMap<String, String>,
    /// 미분류 항목
    pub unknowns: Vec<Unknown>,
    /// 배포판 정보
    pub linux_release: Option<LinuxRelease>,
}

impl Sbom {
    /// 태스크 출력을 병합합니다.
    ///
    /// 추가 항목을 먼저 반영한 뒤 변경(`Change`)을 적용합니다.
    /// 같은 ID의 패키지, 같은 관계는 한 번만 남습니다.
    pub fn merge(&mut self, output: TaskOutput) {
        let TaskOutput {
            packages,
            relationships,
            files,
            digests,
            executables,
            contents,
            unknowns,
            linux_release,
            changes,
        } = output;

        let known: HashSet<String> = self.packages.iter().map(|p| p.id.clone()).collect();
        for package in packages {
            if !known.contains(&package.id) {
                self.packages.push(package);
            }
        }
        self.packages.sort_by(|a, b| a.id.cmp(&b.id));
        self.packages.dedup_by(|a, b| a.id == b.id);

        let mut rels: BTreeSet<Relationship> = self.relationships.drain(..).collect();
        rels.extend(relationships);
        self.relationships = rels.into_iter().collect();

        for file in files {
            self.files.insert(file.location.path.clone(), file);
        }
        for (location, values) in digests {
            self.digests.insert(location.path, values);
        }
        for executable in executables {
            self.executables
                .insert(executable.location.path.clone(), executable);
        }
        for (location, content) in contents {
            self.contents.insert(location.path, content);
        }

        let mut unks: BTreeSet<Unknown> = self.unknowns.drain(..).collect();
        unks.extend(unknowns);
        self.unknowns = unks.into_iter().collect();

        if linux_release.is_some() {
            self.linux_release = linux_release;
        }

        for change in changes {
            self.apply(change);
        }
    }

    fn apply(&mut self, change: Change) {
        match change {
            Change::RemovePackage { id } => {
                self.packages.retain(|p| p.id != id);
                self.relationships.retain(|r| r.from != id && r.to != id);
            }
            Change::SetDistro { package_id, distro } => {
                if let Some(pkg) = self.packages.iter_mut().find(|p| p.id == package_id) {
                    if !pkg.purl.contains("?distro=") {
                        pkg.purl = format!("{}?distro={distro}", pkg.purl);
                    }
                    pkg.distro = Some(distro);
                }
            }
            Change::RemoveUnknowns { location } => {
                self.unknowns.retain(|u| u.location != location);
            }
        }
    }

    /// ID로 패키지를 찾습니다.
    pub fn package(&self, id: &str) -> Option<&Package> {
        self.packages
            .binary_search_by(|p| p.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.packages[idx])
    }

    /// 어떤 패키지든 소유(또는 근거로 사용)한 경로 집합
    pub fn package_claimed_paths(&self) -> HashSet<&str> {
        self.packages
            .iter()
            .flat_map(|p| {
                p.owned_files
                    .iter()
                    .map(String::as_str)
                    .chain(p.locations.iter().map(|l| l.path.as_str()))
            })
            .collect()
    }
}
