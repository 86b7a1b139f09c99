//! 고정 인프라 태스크 -- 환경, 관계, 미분류, OS 기능 감지
//!
//! 선택 엔진을 거치지 않고 항상 고정 스테이지에서 실행됩니다.
//! 환경 태스크를 제외한 나머지는 이전 스테이지의 스냅샷만 읽고 변경(`Change`)을 돌려줍니다.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::{RelationshipsConfig, UnknownsConfig};
use crate::error::CatalogingError;
use crate::task::{BoxFuture, Change, Task, TaskContext, TaskOutput, run_blocking};
use crate::types::{LinuxRelease, PackageType, Relationship, RelationshipType, Unknown};

/// 환경 태스크 이름
pub const ENVIRONMENT_TASK: &str = "environment-cataloger";
/// 관계 태스크 이름
pub const RELATIONSHIPS_TASK: &str = "relationships-cataloger";
/// 미분류 태스크 이름
pub const UNKNOWNS_TASK: &str = "unknowns-labeler";
/// OS 기능 감지 태스크 이름
pub const OS_FEATURE_DETECTION_TASK: &str = "os-feature-detection";

const OS_RELEASE_PATHS: [&str; 2] = ["/etc/os-release", "/usr/lib/os-release"];

/// 스캔 대상의 Linux 배포판을 감지하는 태스크
pub struct EnvironmentTask;

impl Task for EnvironmentTask {
    fn name(&self) -> &str {
        ENVIRONMENT_TASK
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            let resolver = Arc::clone(&ctx.resolver);
            run_blocking(ENVIRONMENT_TASK, move || {
                let release = OS_RELEASE_PATHS
                    .iter()
                    .filter_map(|p| resolver.location_by_path(p))
                    .filter_map(|loc| resolver.read_to_string(&loc).ok())
                    .find_map(|content| LinuxRelease::parse(&content));

                match &release {
                    Some(r) => info!(distro = %r.distro_qualifier(), "linux release detected"),
                    None => debug!("no linux release found"),
                }
                Ok(TaskOutput {
                    linux_release: release,
                    ..TaskOutput::default()
                })
            })
            .await
        })
    }
}

/// 패키지-파일, 패키지-패키지 관계를 계산하는 태스크
pub struct RelationshipsTask {
    config: RelationshipsConfig,
}

impl RelationshipsTask {
    /// 태스크를 생성합니다.
    pub fn new(config: RelationshipsConfig) -> Self {
        Self { config }
    }

    fn compute(&self, ctx: &TaskContext) -> TaskOutput {
        let packages = &ctx.snapshot.packages;
        let mut output = TaskOutput::default();

        if self.config.package_file_ownership {
            for pkg in packages {
                for path in &pkg.owned_files {
                    if ctx.resolver.location_by_path(path).is_some() {
                        output.relationships.push(Relationship {
                            from: pkg.id.clone(),
                            to: path.clone(),
                            kind: RelationshipType::Contains,
                        });
                    }
                }
            }
        }

        if !self.config.package_file_ownership_overlap {
            return output;
        }

        // OS 패키지가 소유한 파일을 근거로 발견된 다른 패키지
        let mut removed = BTreeSet::new();
        for parent in packages.iter().filter(|p| p.package_type.is_os_package()) {
            let owned: HashSet<&str> = parent.owned_files.iter().map(String::as_str).collect();
            if owned.is_empty() {
                continue;
            }
            for child in packages.iter().filter(|p| !p.package_type.is_os_package()) {
                if !child.locations.iter().any(|l| owned.contains(l.path.as_str())) {
                    continue;
                }
                if self.config.exclude_binary_packages_with_file_ownership_overlap
                    && child.package_type == PackageType::Binary
                {
                    if removed.insert(child.id.clone()) {
                        debug!(parent = %parent.id, child = %child.id, "binary package owned by os package, excluding");
                        output.changes.push(Change::RemovePackage {
                            id: child.id.clone(),
                        });
                    }
                    continue;
                }
                output.relationships.push(Relationship {
                    from: parent.id.clone(),
                    to: child.id.clone(),
                    kind: RelationshipType::OwnershipByFileOverlap,
                });
            }
        }
        output
    }
}

impl Task for RelationshipsTask {
    fn name(&self) -> &str {
        RELATIONSHIPS_TASK
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            ctx.check_cancelled()?;
            Ok(self.compute(ctx))
        })
    }
}

/// 미분류 항목을 기록/정리하는 태스크
pub struct UnknownsTask {
    config: UnknownsConfig,
}

impl UnknownsTask {
    /// 태스크를 생성합니다.
    pub fn new(config: UnknownsConfig) -> Self {
        Self { config }
    }

    fn compute(&self, ctx: &TaskContext) -> TaskOutput {
        let snapshot = &ctx.snapshot;
        let mut output = TaskOutput::default();

        if self.config.executables_without_packages {
            let claimed = snapshot.package_claimed_paths();
            output.unknowns = snapshot
                .executables
                .values()
                .filter(|e| !claimed.contains(e.location.path.as_str()))
                .map(|e| Unknown {
                    location: e.location.clone(),
                    reason: "no package identified in executable file".to_owned(),
                })
                .collect();
        }

        if self.config.remove_when_packages_defined {
            let package_locations: BTreeSet<_> = snapshot
                .packages
                .iter()
                .flat_map(|p| p.locations.iter())
                .collect();
            output.changes = snapshot
                .unknowns
                .iter()
                .filter(|u| package_locations.contains(&u.location))
                .map(|u| Change::RemoveUnknowns {
                    location: u.location.clone(),
                })
                .collect();
        }
        output
    }
}

impl Task for UnknownsTask {
    fn name(&self) -> &str {
        UNKNOWNS_TASK
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            ctx.check_cancelled()?;
            Ok(self.compute(ctx))
        })
    }
}

/// OS 패키지에 감지된 배포판을 지정하는 태스크
pub struct OsFeatureDetectionTask;

impl Task for OsFeatureDetectionTask {
    fn name(&self) -> &str {
        OS_FEATURE_DETECTION_TASK
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            ctx.check_cancelled()?;
            let Some(release) = &ctx.snapshot.linux_release else {
                return Ok(TaskOutput::default());
            };
            let distro = release.distro_qualifier();
            let changes = ctx
                .snapshot
                .packages
                .iter()
                .filter(|p| p.package_type.is_os_package() && p.distro.is_none())
                .map(|p| Change::SetDistro {
                    package_id: p.id.clone(),
                    distro: distro.clone(),
                })
                .collect();
            Ok(TaskOutput {
                changes,
                ..TaskOutput::default()
            })
        })
    }
}
