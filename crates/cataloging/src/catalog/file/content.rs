//! 파일 내용 카탈로거 -- glob에 일치하는 작은 텍스트 파일의 내용 수집
//!
//! 파일 선택 모드와 무관하게 설정된 glob만 봅니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{ContentConfig, CreateSbomConfig};
use crate::error::CatalogingError;
use crate::task::{BoxFuture, Selector, Tags, Task, TaskContext, TaskOutput, run_blocking};

/// 태스크 이름
pub const NAME: &str = "file-content-cataloger";

/// 파일 내용을 수집하는 태스크
pub struct FileContentTask {
    tags: Tags,
    config: ContentConfig,
}

/// glob이 없으면 태스크를 만들지 않습니다.
pub fn new_task(config: &CreateSbomConfig) -> Option<Arc<dyn Task>> {
    if config.files.content.globs.is_empty() {
        return None;
    }
    Some(Arc::new(FileContentTask {
        tags: Tags::new(["content", "file"]),
        config: config.files.content.clone(),
    }))
}

impl Task for FileContentTask {
    fn name(&self) -> &str {
        NAME
    }

    fn selector(&self) -> Option<&dyn Selector> {
        Some(&self.tags)
    }

    fn run<'a>(&'a self, ctx: &'a TaskContext) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
        Box::pin(async move {
            let resolver = Arc::clone(&ctx.resolver);
            let cancel = ctx.cancel.clone();
            let config = self.config.clone();

            run_blocking(NAME, move || {
                let mut targets = BTreeSet::new();
                for glob in &config.globs {
                    targets.extend(resolver.locations_by_glob(glob)?);
                }

                let mut output = TaskOutput::default();
                for location in targets {
                    if cancel.is_cancelled() {
                        return Err(CatalogingError::Cancelled);
                    }
                    match resolver.metadata(&location) {
                        Ok(record) if record.size > config.skip_files_above_size => {
                            debug!(path = %location, size = record.size, "file above content size limit, skipping");
                            continue;
                        }
                        Ok(_) => {}
                        Err(e) => {
                            warn!(path = %location, error = %e, "failed to stat file, skipping");
                            continue;
                        }
                    }
                    match resolver.read_to_string(&location) {
                        Ok(content) => output.contents.push((location, content)),
                        Err(e) => warn!(path = %location, error = %e, "failed to read file content, skipping"),
                    }
                }
                Ok(output)
            })
            .await
        })
    }
}
