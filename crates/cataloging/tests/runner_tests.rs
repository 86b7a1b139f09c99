//! 카탈로깅 실행 통합 테스트
//!
//! 임시 디렉토리 픽스처에 대해 `create_sbom` 전체 파이프라인을 실행합니다.

use std::path::Path;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sbomkit_cataloging::resolver::Resolver;
use sbomkit_cataloging::{
    Cataloger, CatalogerReference, CatalogingError, CreateSbomConfig, FileSelection, Location,
    Package, PackageType, Relationship, RelationshipType, RelationshipsConfig, create_sbom,
    resolver_for,
};
use sbomkit_core::SourceDescription;

const CARGO_LOCK: &str = r#"version = 3

[[package]]
name = "app"
version = "0.1.0"
dependencies = ["serde"]

[[package]]
name = "serde"
version = "1.0.204"
source = "registry+https://github.com/rust-lang/crates.io-index"
"#;

const DPKG_STATUS: &str = "Package: bash\nStatus: install ok installed\nVersion: 5.2.15-2+b7\n";

const ELF_HEADER: &[u8] = b"\x7fELF\x02\x01\x01\x00";

fn write(root: &Path, rel: &str, content: &[u8]) {
    let path = root.join(rel);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, content).unwrap();
}

/// Cargo 프로젝트 + debian 루트 파일시스템 조각
fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, "Cargo.lock", CARGO_LOCK.as_bytes());
    write(root, "var/lib/dpkg/status", DPKG_STATUS.as_bytes());
    write(root, "var/lib/dpkg/info/bash.list", b"/.\n/bin\n/bin/bash\n");
    write(root, "bin/bash", ELF_HEADER);
    write(root, "opt/tool", ELF_HEADER);
    write(
        root,
        "etc/os-release",
        b"PRETTY_NAME=\"Debian GNU/Linux 12 (bookworm)\"\nID=debian\nVERSION_ID=\"12\"\n",
    );
    dir
}

async fn setup(dir: &tempfile::TempDir) -> (SourceDescription, Arc<dyn Resolver>) {
    let source = SourceDescription::from_path(dir.path()).unwrap();
    let resolver = resolver_for(&source, 1 << 20).await.unwrap();
    (source, resolver)
}

fn find<'a>(packages: &'a [Package], name: &str) -> &'a Package {
    packages
        .iter()
        .find(|p| p.name == name)
        .unwrap_or_else(|| panic!("package {name} not found"))
}

struct Failing;

impl Cataloger for Failing {
    fn name(&self) -> &str {
        "failing-cataloger"
    }

    fn catalog(
        &self,
        _resolver: &dyn Resolver,
    ) -> Result<(Vec<Package>, Vec<Relationship>), CatalogingError> {
        Err(CatalogingError::Task {
            task: "failing-cataloger".to_owned(),
            reason: "simulated failure".to_owned(),
        })
    }
}

/// `/bin/bash`를 근거로 바이너리 패키지를 보고하는 카탈로거
struct BinaryClassifier;

impl Cataloger for BinaryClassifier {
    fn name(&self) -> &str {
        "binary-classifier-cataloger"
    }

    fn catalog(
        &self,
        resolver: &dyn Resolver,
    ) -> Result<(Vec<Package>, Vec<Relationship>), CatalogingError> {
        let packages = resolver
            .location_by_path("/bin/bash")
            .map(|loc| {
                Package::new(
                    "bash",
                    "5.2.15",
                    PackageType::Binary,
                    "binary-classifier-cataloger",
                    loc,
                )
            })
            .into_iter()
            .collect();
        Ok((packages, Vec::new()))
    }
}

#[tokio::test]
async fn directory_scan_end_to_end() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;

    let result = create_sbom(
        &source,
        resolver,
        &CreateSbomConfig::default(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert!(result.failures.is_empty(), "{:?}", result.failures);
    assert!(!result.run_id.is_empty());

    let sbom = &result.sbom;
    assert_eq!(sbom.packages.len(), 3);
    let app = find(&sbom.packages, "app");
    let serde = find(&sbom.packages, "serde");
    let bash = find(&sbom.packages, "bash");

    // os-feature-detection
    assert_eq!(bash.distro.as_deref(), Some("debian-12"));
    assert_eq!(bash.purl, "pkg:deb/bash@5.2.15-2+b7?distro=debian-12");
    assert!(app.distro.is_none());

    // relationships
    assert!(sbom.relationships.contains(&Relationship {
        from: serde.id.clone(),
        to: app.id.clone(),
        kind: RelationshipType::DependencyOf,
    }));
    assert!(sbom.relationships.contains(&Relationship {
        from: bash.id.clone(),
        to: "/bin/bash".to_owned(),
        kind: RelationshipType::Contains,
    }));

    // owned-by-package: 패키지가 소유/근거로 쓴 파일만 분석
    assert!(sbom.files.contains_key("/bin/bash"));
    assert!(sbom.files.contains_key("/Cargo.lock"));
    assert!(!sbom.files.contains_key("/opt/tool"));
    assert!(sbom.digests.contains_key("/bin/bash"));
    assert!(sbom.executables.contains_key("/bin/bash"));
    assert!(sbom.unknowns.is_empty());

    assert_eq!(sbom.linux_release.as_ref().unwrap().id, "debian");
    assert!(result.manifest.uses("dpkg-db-cataloger"));
    assert!(result.manifest.uses("file-digest-cataloger"));
}

#[tokio::test]
async fn whole_target_mode_labels_unowned_executables() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;
    let mut config = CreateSbomConfig::default();
    config.files.selection = FileSelection::All;

    let result = create_sbom(&source, resolver, &config, CancellationToken::new())
        .await
        .unwrap();

    let sbom = &result.sbom;
    assert!(sbom.files.contains_key("/opt/tool"));
    assert!(sbom.files.contains_key("/etc/os-release"));
    assert_eq!(sbom.executables.len(), 2);
    assert_eq!(sbom.unknowns.len(), 1);
    assert_eq!(sbom.unknowns[0].location, Location::new("/opt/tool"));
}

#[tokio::test]
async fn removed_catalogers_do_not_run() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;
    let mut config = CreateSbomConfig::default();
    config.selection = config.selection.with_removals(["os", "file"]);

    let result = create_sbom(&source, resolver, &config, CancellationToken::new())
        .await
        .unwrap();

    let names: Vec<_> = result.sbom.packages.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names.len(), 2);
    assert!(!names.contains(&"bash"));
    assert!(result.sbom.files.is_empty());
    assert!(result.sbom.digests.is_empty());
}

#[tokio::test]
async fn task_failure_is_recorded_and_pipeline_continues() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;
    let mut config = CreateSbomConfig::default();
    config
        .catalogers
        .push(CatalogerReference::always_enabled(Arc::new(Failing)));

    let result = create_sbom(&source, resolver, &config, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].task, "failing-cataloger");
    assert_eq!(result.failures[0].stage, "packages");
    assert!(result.failures[0].reason.contains("simulated failure"));
    assert_eq!(result.sbom.packages.len(), 3);
    assert!(result.manifest.uses("failing-cataloger"));
}

#[tokio::test]
async fn overlapping_binary_package_is_excluded() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;
    let mut config = CreateSbomConfig::default();
    config
        .catalogers
        .push(CatalogerReference::always_enabled(Arc::new(BinaryClassifier)));

    let result = create_sbom(&source, resolver, &config, CancellationToken::new())
        .await
        .unwrap();
    assert!(
        result
            .sbom
            .packages
            .iter()
            .all(|p| p.package_type != PackageType::Binary)
    );

    // 제외를 끄면 소유 관계로 남음
    let (source, resolver) = setup(&dir).await;
    config.relationships = RelationshipsConfig {
        exclude_binary_packages_with_file_ownership_overlap: false,
        ..RelationshipsConfig::default()
    };
    let result = create_sbom(&source, resolver, &config, CancellationToken::new())
        .await
        .unwrap();
    let binary = result
        .sbom
        .packages
        .iter()
        .find(|p| p.package_type == PackageType::Binary)
        .unwrap();
    assert!(result.sbom.relationships.iter().any(|r| {
        r.kind == RelationshipType::OwnershipByFileOverlap && r.to == binary.id
    }));
}

#[tokio::test]
async fn invalid_config_runs_nothing() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;
    let mut config = CreateSbomConfig::default();
    config.relationships.package_file_ownership_overlap = false;

    let err = create_sbom(&source, resolver, &config, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogingError::Validation { .. }));
}

#[tokio::test]
async fn cancelled_run_returns_no_result() {
    let dir = fixture();
    let (source, resolver) = setup(&dir).await;
    let cancel = CancellationToken::new();
    cancel.cancel();

    let err = create_sbom(&source, resolver, &CreateSbomConfig::default(), cancel)
        .await
        .unwrap_err();
    assert!(matches!(err, CatalogingError::Cancelled));
}

#[tokio::test]
async fn single_file_source() {
    let dir = fixture();
    let source = SourceDescription::from_path(dir.path().join("Cargo.lock")).unwrap();
    let resolver = resolver_for(&source, 1 << 20).await.unwrap();

    let result = create_sbom(
        &source,
        resolver,
        &CreateSbomConfig::default(),
        CancellationToken::new(),
    )
    .await
    .unwrap();

    assert_eq!(result.sbom.packages.len(), 2);
    assert!(result.sbom.linux_release.is_none());
}
