#![doc = include_str!("../README.md")]

pub mod config;
pub mod error;
pub mod metrics;
pub mod source;

// --- 주요 타입 re-export ---

// 에러
pub use error::{CatalogError, ConfigError, SbomkitError, SourceError};

// 설정
pub use config::SbomkitConfig;

// 스캔 대상
pub use source::{
    DirectoryMetadata, FileMetadata, ImageMetadata, SourceDescription, SourceMetadata,
};
