//! 태스크 추상화 -- 이름, 태그 셀렉터, 비동기 실행
//!
//! [`Task`]는 카탈로깅 파이프라인의 실행 단위입니다. 선택 엔진은 태스크의
//! 이름과 [`Selector`]만 보고 포함 여부를 결정하며, 러너는 [`Task::run`]만 호출합니다.
//!
//! 외부에서 등록하는 카탈로거는 동기 [`Cataloger`] trait을 구현하고
//! [`CatalogerReference`]로 감싸 전달합니다. 참조는 항상 실행(always-enabled)이거나
//! 선언한 태그로 선택되는 두 가지 형태만 존재합니다.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use sbomkit_core::SourceDescription;

use crate::error::CatalogingError;
use crate::resolver::Resolver;
use crate::sbom::Sbom;
use crate::types::{
    Executable, FileDigest, FileRecord, LinuxRelease, Location, Package, Relationship, Unknown,
};

/// dyn-compatible 비동기 반환 타입
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// 태그 기반 선택 능력
pub trait Selector: Send + Sync {
    /// 태스크가 선언한 태그 목록
    fn tags(&self) -> &[String];

    /// 주어진 셀렉터를 모두 가지고 있는지 확인합니다.
    fn has_all_selectors(&self, selectors: &[&str]) -> bool {
        selectors
            .iter()
            .all(|s| self.tags().iter().any(|t| t == s))
    }
}

/// 단순 태그 목록 셀렉터
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Tags(Vec<String>);

impl Tags {
    /// 태그 목록으로 셀렉터를 생성합니다.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }
}

impl Selector for Tags {
    fn tags(&self) -> &[String] {
        &self.0
    }
}

/// 카탈로깅 태스크
///
/// 태스크는 생성 후 불변이며 `Arc<dyn Task>`로 공유됩니다.
pub trait Task: Send + Sync {
    /// 실행 단위 내에서 유일한 태스크 이름
    fn name(&self) -> &str;

    /// 태그 셀렉터 (없으면 이름으로만 선택 가능)
    fn selector(&self) -> Option<&dyn Selector> {
        None
    }

    /// 선택 규칙과 무관하게 항상 실행되는지 여부
    fn always_enabled(&self) -> bool {
        false
    }

    /// 태스크를 실행합니다.
    ///
    /// `ctx`는 이전 스테이지까지 병합된 결과의 불변 스냅샷입니다.
    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>>;
}

/// 태스크 실행 컨텍스트
pub struct TaskContext {
    /// 스캔 대상 리졸버
    pub resolver: Arc<dyn Resolver>,
    /// 스캔 대상 기술자
    pub source: SourceDescription,
    /// 이전 스테이지까지의 병합 결과
    pub snapshot: Sbom,
    /// 협력적 취소 토큰
    pub cancel: CancellationToken,
}

impl TaskContext {
    /// 컨텍스트를 생성합니다.
    pub fn new(
        resolver: Arc<dyn Resolver>,
        source: SourceDescription,
        snapshot: Sbom,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            resolver,
            source,
            snapshot,
            cancel,
        }
    }

    /// 취소되었으면 `CatalogingError::Cancelled`를 반환합니다.
    pub fn check_cancelled(&self) -> Result<(), CatalogingError> {
        if self.cancel.is_cancelled() {
            return Err(CatalogingError::Cancelled);
        }
        Ok(())
    }
}

/// 스냅샷에 대한 후처리 변경
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    /// 패키지 제거
    RemovePackage {
        /// 패키지 ID
        id: String,
    },
    /// 패키지 배포판 지정
    SetDistro {
        /// 패키지 ID
        package_id: String,
        /// 배포판 한정자 (예: `debian-12`)
        distro: String,
    },
    /// 특정 위치의 미분류 항목 제거
    RemoveUnknowns {
        /// 위치
        location: Location,
    },
}

/// 태스크 출력
///
/// 러너는 스테이지의 모든 태스크가 끝난 뒤 출력을 한꺼번에 병합합니다.
#[derive(Debug, Clone, Default)]
pub struct TaskOutput {
    /// 발견된 패키지
    pub packages: Vec<Package>,
    /// 발견된 관계
    pub relationships: Vec<Relationship>,
    /// 파일 메타데이터
    pub files: Vec<FileRecord>,
    /// 파일 다이제스트
    pub digests: Vec<(Location, Vec<FileDigest>)>,
    /// 실행 파일
    pub executables: Vec<Executable>,
    /// 파일 내용 (base64가 아닌 원문 UTF-8)
    pub contents: Vec<(Location, String)>,
    /// 미분류 항목
    pub unknowns: Vec<Unknown>,
    /// 배포판 정보
    pub linux_release: Option<LinuxRelease>,
    /// 기존 결과에 대한 변경
    pub changes: Vec<Change>,
}

impl TaskOutput {
    /// 패키지/관계만 가진 출력을 생성합니다.
    pub fn from_packages(packages: Vec<Package>, relationships: Vec<Relationship>) -> Self {
        Self {
            packages,
            relationships,
            ..Self::default()
        }
    }
}

/// 동기 패키지 카탈로거
///
/// 리졸버를 읽어 패키지와 관계를 반환합니다. 블로킹 I/O를 수행해도 됩니다.
pub trait Cataloger: Send + Sync {
    /// 카탈로거 이름
    fn name(&self) -> &str;

    /// 패키지를 수집합니다.
    fn catalog(
        &self,
        resolver: &dyn Resolver,
    ) -> Result<(Vec<Package>, Vec<Relationship>), CatalogingError>;
}

/// 호출자가 등록하는 카탈로거 참조
#[derive(Clone)]
pub struct CatalogerReference {
    cataloger: Arc<dyn Cataloger>,
    always_enabled: bool,
    tags: Vec<String>,
}

impl CatalogerReference {
    /// 선택 규칙과 무관하게 항상 실행되는 참조를 생성합니다.
    pub fn always_enabled(cataloger: Arc<dyn Cataloger>) -> Self {
        Self {
            cataloger,
            always_enabled: true,
            tags: Vec::new(),
        }
    }

    /// 태그로 선택되는 참조를 생성합니다.
    pub fn with_tags<I, S>(cataloger: Arc<dyn Cataloger>, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            cataloger,
            always_enabled: false,
            tags: tags.into_iter().map(Into::into).collect(),
        }
    }

    /// 카탈로거 이름
    pub fn name(&self) -> &str {
        self.cataloger.name()
    }

    /// 실행 가능한 태스크로 변환합니다.
    pub fn to_task(&self) -> Arc<dyn Task> {
        Arc::new(PackageTask {
            cataloger: Arc::clone(&self.cataloger),
            tags: Tags(self.tags.clone()),
            selectable: !self.always_enabled,
            always_enabled: self.always_enabled,
        })
    }
}

impl std::fmt::Debug for CatalogerReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogerReference")
            .field("name", &self.name())
            .field("always_enabled", &self.always_enabled)
            .field("tags", &self.tags)
            .finish()
    }
}

/// [`Cataloger`]를 비동기 [`Task`]로 감싼 패키지 태스크
pub struct PackageTask {
    cataloger: Arc<dyn Cataloger>,
    tags: Tags,
    selectable: bool,
    always_enabled: bool,
}

impl PackageTask {
    /// 태그가 붙은 내장 패키지 태스크를 생성합니다.
    pub fn new(cataloger: Arc<dyn Cataloger>, tags: Tags) -> Self {
        Self {
            cataloger,
            tags,
            selectable: true,
            always_enabled: false,
        }
    }
}

impl Task for PackageTask {
    fn name(&self) -> &str {
        self.cataloger.name()
    }

    fn selector(&self) -> Option<&dyn Selector> {
        self.selectable.then_some(&self.tags as &dyn Selector)
    }

    fn always_enabled(&self) -> bool {
        self.always_enabled
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            let cataloger = Arc::clone(&self.cataloger);
            let resolver = Arc::clone(&ctx.resolver);
            let name = self.name().to_owned();

            let (packages, relationships) =
                tokio::task::spawn_blocking(move || cataloger.catalog(resolver.as_ref()))
                    .await
                    .map_err(|e| CatalogingError::Task {
                        task: name,
                        reason: format!("spawn_blocking failed: {e}"),
                    })??;

            Ok(TaskOutput::from_packages(packages, relationships))
        })
    }
}

/// 동기 클로저를 블로킹 스레드에서 실행하는 헬퍼
///
/// 파일 카탈로거와 인프라 태스크가 리졸버 I/O를 수행할 때 사용합니다.
pub(crate) async fn run_blocking<F>(task: &str, f: F) -> Result<TaskOutput, CatalogingError>
where
    F: FnOnce() -> Result<TaskOutput, CatalogingError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| CatalogingError::Task {
            task: task.to_owned(),
            reason: format!("spawn_blocking failed: {e}"),
        })?
}
