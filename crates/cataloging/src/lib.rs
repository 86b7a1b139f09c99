#![doc = include_str!("../README.md")]
//!
//! # 모듈 구조
//!
//! - [`error`]: 도메인 에러 타입 (`CatalogingError`)
//! - [`config`]: 엔진 설정 (`CreateSbomConfig`, 빌더, 교차 검증)
//! - [`types`]: 도메인 타입 (`Package`, `Relationship`, `Location`, ...)
//! - [`resolver`]: 파일 리졸버 (`Resolver` trait, `DirectoryResolver`)
//! - [`task`]: 태스크 추상화 (`Task`, `Selector`, `Cataloger`, `CatalogerReference`)
//! - [`catalog`]: 내장 패키지/파일 카탈로거와 고정 인프라 태스크
//! - [`classify`]: 소스 분류기
//! - [`selection`]: 선택 엔진 (`SelectionRequest`)
//! - [`stage`]: 스테이지 조립 (`Stage`, `StageShape`)
//! - [`manifest`]: 카탈로거 매니페스트
//! - [`sbom`]: 결과 누적기 (`Sbom`)
//! - [`runner`]: 스테이지 러너 (`StageRunner`)
//! - [`create`]: 진입점 (`make_task_groups`, `create_sbom`)
//!
//! # 아키텍처
//!
//! ```text
//! CreateSbomConfig --validate--> classify(source) --> SelectionRequest::resolve
//!                                                              |
//!                    package tasks + file tasks --select-------+
//!                                                              |
//!                                                     assemble(StageShape)
//!                                                              |
//!                                    +-------------------------+----------------+
//!                                    |                                          |
//!                              Vec<Stage>                              CatalogerManifest
//!                                    |
//!                              StageRunner --> Sbom + failures
//! ```

pub mod catalog;
pub mod classify;
pub mod config;
pub mod create;
pub mod error;
pub mod manifest;
pub mod resolver;
pub mod runner;
pub mod sbom;
pub mod selection;
pub mod stage;
pub mod task;
pub mod types;

// --- Public API Re-exports ---

// 진입점
pub use create::{CatalogingResult, create_sbom, make_task_groups, resolver_for};

// 설정
pub use config::{
    ContentConfig, CreateSbomConfig, CreateSbomConfigBuilder, FileSelection, FilesConfig, Hasher,
    RelationshipsConfig, UnknownsConfig,
};

// 에러
pub use error::CatalogingError;

// 선택/스테이지/매니페스트
pub use classify::{SourceCategory, classify};
pub use manifest::CatalogerManifest;
pub use selection::{ResolvedSelection, SelectionRequest};
pub use stage::{Stage, StageKind, StageShape};

// 태스크
pub use task::{Cataloger, CatalogerReference, Selector, Tags, Task, TaskContext, TaskOutput};

// 실행
pub use resolver::{DirectoryResolver, Resolver};
pub use runner::{StageRunner, TaskFailure};
pub use sbom::Sbom;

// 타입
pub use types::{Location, Package, PackageType, Relationship, RelationshipType};
