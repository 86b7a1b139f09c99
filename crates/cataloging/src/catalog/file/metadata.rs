//! 파일 메타데이터 카탈로거

use std::sync::Arc;

use tracing::warn;

use crate::config::{CreateSbomConfig, FileSelection};
use crate::error::CatalogingError;
use crate::task::{BoxFuture, Selector, Tags, Task, TaskContext, TaskOutput, run_blocking};

use super::target_locations;

/// 태스크 이름
pub const NAME: &str = "file-metadata-cataloger";

/// 대상 파일의 크기와 권한을 기록하는 태스크
pub struct FileMetadataTask {
    tags: Tags,
    selection: FileSelection,
}

/// 파일 선택이 `none`이면 태스크를 만들지 않습니다.
pub fn new_task(config: &CreateSbomConfig) -> Option<Arc<dyn Task>> {
    if config.files.selection == FileSelection::None {
        return None;
    }
    Some(Arc::new(FileMetadataTask {
        tags: Tags::new(["file-metadata", "file"]),
        selection: config.files.selection,
    }))
}

impl Task for FileMetadataTask {
    fn name(&self) -> &str {
        NAME
    }

    fn selector(&self) -> Option<&dyn Selector> {
        Some(&self.tags)
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            let targets = target_locations(ctx, self.selection);
            let resolver = Arc::clone(&ctx.resolver);
            let cancel = ctx.cancel.clone();

            run_blocking(NAME, move || {
                let mut output = TaskOutput::default();
                for location in targets {
                    if cancel.is_cancelled() {
                        return Err(CatalogingError::Cancelled);
                    }
                    match resolver.metadata(&location) {
                        Ok(record) => output.files.push(record),
                        Err(e) => warn!(path = %location, error = %e, "failed to stat file, skipping"),
                    }
                }
                Ok(output)
            })
            .await
        })
    }
}
