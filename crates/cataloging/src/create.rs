//! SBOM 생성 진입점 -- 검증, 분류, 선택, 스테이지 조립, 실행
//!
//! [`make_task_groups`]는 I/O 없이 실행 계획(스테이지 + 매니페스트)만 만들고,
//! [`create_sbom`]은 그 계획을 [`StageRunner`]로 실행합니다.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use sbomkit_core::{SourceDescription, SourceMetadata};

use crate::catalog::infra::{EnvironmentTask, OsFeatureDetectionTask, RelationshipsTask, UnknownsTask};
use crate::catalog::{default_file_tasks, package_tasks};
use crate::classify::classify;
use crate::config::CreateSbomConfig;
use crate::error::CatalogingError;
use crate::manifest::CatalogerManifest;
use crate::resolver::{DirectoryResolver, Resolver};
use crate::runner::{StageRunner, TaskFailure};
use crate::sbom::Sbom;
use crate::selection::select;
use crate::stage::{Stage, StageInputs, StageShape, assemble};
use crate::task::Task;

/// 한 번의 카탈로깅 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct CatalogingResult {
    /// 실행 ID
    pub run_id: String,
    /// 스캔 대상
    pub source: SourceDescription,
    /// 병합된 결과
    pub sbom: Sbom,
    /// 선택 결정 기록
    pub manifest: CatalogerManifest,
    /// 실패한 태스크
    pub failures: Vec<TaskFailure>,
}

/// 설정과 스캔 대상으로 실행할 스테이지와 매니페스트를 만듭니다.
///
/// 설정 교차 검증은 하지 않습니다 ([`create_sbom`]이 먼저 수행).
///
/// # Errors
///
/// 스캔 대상 종류를 알 수 없으면 `CatalogingError::UnsupportedSource`,
/// 호출자 카탈로거 이름이 겹치면 `CatalogingError::Validation`을 반환합니다.
pub fn make_task_groups(
    config: &CreateSbomConfig,
    source: &SourceDescription,
) -> Result<(Vec<Stage>, CatalogerManifest), CatalogingError> {
    let (category, defaults) = classify(source)?;
    let resolved = config.selection.resolve(&defaults);

    let package_universe = package_tasks(config)?;
    let file_universe = default_file_tasks(config);

    let packages = select(&package_universe, &resolved, true);
    // 하위 선택이 파일 태스크 태그를 하나도 언급하지 않으면 파일 그룹은 좁히지 않음
    let narrow_files = resolved.sub_selection_touches(&file_universe);
    let files = select(&file_universe, &resolved, narrow_files);

    let universe: Vec<Arc<dyn Task>> = package_universe
        .iter()
        .chain(file_universe.iter())
        .cloned()
        .collect();
    for token in resolved.unmatched_tokens(&universe, &defaults) {
        warn!(token = %token, "selection token matches no cataloger");
    }

    let shape = StageShape::for_file_selection(config.files.selection);
    let stages = assemble(
        shape,
        StageInputs {
            environment: Arc::new(EnvironmentTask),
            packages,
            files,
            relationships: Arc::new(RelationshipsTask::new(config.relationships)),
            unknowns: Arc::new(UnknownsTask::new(config.unknowns)),
            os_feature_detection: Arc::new(OsFeatureDetectionTask),
        },
    );

    let manifest = CatalogerManifest::build(
        config.selection.with_materialized_defaults(&defaults),
        &stages,
    );
    debug!(
        source = %category,
        ?shape,
        stages = stages.len(),
        used = ?manifest.used,
        "task groups assembled"
    );
    Ok((stages, manifest))
}

/// 스캔 대상을 카탈로깅합니다.
///
/// 설정 검증 -> 분류 -> 선택 -> 스테이지 조립 -> 실행 순서입니다.
///
/// # Errors
///
/// - 설정 검증 실패: `CatalogingError::Validation` (아무 태스크도 실행하지 않음)
/// - 알 수 없는 스캔 대상: `CatalogingError::UnsupportedSource`
/// - 취소: `CatalogingError::Cancelled` (매니페스트 없음)
pub async fn create_sbom(
    source: &SourceDescription,
    resolver: Arc<dyn Resolver>,
    config: &CreateSbomConfig,
    cancel: CancellationToken,
) -> Result<CatalogingResult, CatalogingError> {
    config.validate()?;
    let (stages, manifest) = make_task_groups(config, source)?;

    let run_id = Uuid::new_v4().to_string();
    info!(
        run_id = %run_id,
        source = %source,
        stages = stages.len(),
        catalogers = manifest.used.len(),
        "cataloging started"
    );

    let outcome = StageRunner::new(config.parallelism)
        .run(&stages, resolver, source, &cancel)
        .await?;

    info!(
        run_id = %run_id,
        packages = outcome.sbom.packages.len(),
        relationships = outcome.sbom.relationships.len(),
        failures = outcome.failures.len(),
        "cataloging completed"
    );

    Ok(CatalogingResult {
        run_id,
        source: source.clone(),
        sbom: outcome.sbom,
        manifest,
        failures: outcome.failures,
    })
}

/// 스캔 대상에 맞는 리졸버를 만듭니다 (블로킹 스레드에서 색인).
///
/// # Errors
///
/// 이미지와 알 수 없는 대상은 `CatalogingError::UnsupportedSource`를 반환합니다.
pub async fn resolver_for(
    source: &SourceDescription,
    max_file_size: u64,
) -> Result<Arc<dyn Resolver>, CatalogingError> {
    let build: Box<dyn FnOnce() -> Result<DirectoryResolver, CatalogingError> + Send> =
        match &source.metadata {
            SourceMetadata::Directory(m) => {
                let path = m.path.clone();
                Box::new(move || DirectoryResolver::new(path, max_file_size))
            }
            SourceMetadata::File(m) => {
                let path = m.path.clone();
                Box::new(move || DirectoryResolver::for_file(path, max_file_size))
            }
            SourceMetadata::Image(_) | SourceMetadata::Unknown { .. } => {
                return Err(CatalogingError::UnsupportedSource {
                    kind: source.kind().to_owned(),
                });
            }
        };

    let resolver = tokio::task::spawn_blocking(build)
        .await
        .map_err(|e| CatalogingError::Resolver(format!("indexing task failed: {e}")))??;
    info!(root = %resolver.root().display(), files = resolver.file_count(), "source indexed");
    Ok(Arc::new(resolver))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::stage_names;
    use sbomkit_core::ImageMetadata;

    fn image() -> SourceDescription {
        SourceDescription::new(SourceMetadata::Image(ImageMetadata {
            user_input: "alpine:3.20".to_owned(),
            ..ImageMetadata::default()
        }))
    }

    #[test]
    fn image_defaults_pick_installed_catalogers() {
        let (stages, manifest) = make_task_groups(&CreateSbomConfig::default(), &image()).unwrap();
        let names = stage_names(&stages);
        assert_eq!(names.len(), 6);
        assert!(names[1].contains(&"javascript-package-cataloger".to_owned()));
        assert!(!names[1].contains(&"rust-cargo-lock-cataloger".to_owned()));
        assert_eq!(manifest.requested.default_names_or_tags, vec!["image", "file"]);
    }

    #[tokio::test]
    async fn resolver_for_image_is_unsupported() {
        let err = resolver_for(&image(), 1024).await.err().unwrap();
        assert!(matches!(err, CatalogingError::UnsupportedSource { .. }));
    }

    #[tokio::test]
    async fn resolver_for_directory() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("go.mod"), "module x\n").unwrap();
        let source = SourceDescription::from_path(dir.path()).unwrap();
        let resolver = resolver_for(&source, 1024).await.unwrap();
        assert_eq!(resolver.all_locations().len(), 1);
    }
}
