//! 실행 파일 카탈로거 -- 매직 넘버로 형식 판별

use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::{CreateSbomConfig, FileSelection};
use crate::error::CatalogingError;
use crate::task::{BoxFuture, Selector, Tags, Task, TaskContext, TaskOutput, run_blocking};
use crate::types::{Executable, ExecutableFormat, Unknown};

use super::target_locations;

/// 태스크 이름
pub const NAME: &str = "file-executable-cataloger";

const MACHO_MAGICS: [[u8; 4]; 4] = [
    [0xfe, 0xed, 0xfa, 0xce],
    [0xfe, 0xed, 0xfa, 0xcf],
    [0xce, 0xfa, 0xed, 0xfe],
    [0xcf, 0xfa, 0xed, 0xfe],
];

/// 실행 파일을 찾는 태스크
pub struct FileExecutableTask {
    tags: Tags,
    selection: FileSelection,
}

/// 파일 선택이 `none`이면 태스크를 만들지 않습니다.
pub fn new_task(config: &CreateSbomConfig) -> Option<Arc<dyn Task>> {
    if config.files.selection == FileSelection::None {
        return None;
    }
    Some(Arc::new(FileExecutableTask {
        tags: Tags::new(["binary-metadata", "file"]),
        selection: config.files.selection,
    }))
}

/// 파일 앞부분과 권한 비트로 실행 파일 형식을 판별합니다.
///
/// 스크립트(`#!`)는 실행 비트가 있을 때만 실행 파일로 봅니다.
pub fn detect_format(prefix: &[u8], mode: u32) -> Option<ExecutableFormat> {
    if prefix.starts_with(b"\x7fELF") {
        return Some(ExecutableFormat::Elf);
    }
    if prefix.len() >= 4 && MACHO_MAGICS.iter().any(|m| prefix[..4] == m[..]) {
        return Some(ExecutableFormat::MachO);
    }
    if prefix.starts_with(b"MZ") {
        return Some(ExecutableFormat::Pe);
    }
    if prefix.starts_with(b"#!") && mode & 0o111 != 0 {
        return Some(ExecutableFormat::Script);
    }
    None
}

impl Task for FileExecutableTask {
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
                    let record = match resolver.metadata(&location) {
                        Ok(r) => r,
                        Err(e) => {
                            warn!(path = %location, error = %e, "failed to stat file, skipping");
                            continue;
                        }
                    };
                    let prefix = match resolver.read_prefix(&location, 4) {
                        Ok(p) => p,
                        Err(e) => {
                            warn!(path = %location, error = %e, "failed to read file header, skipping");
                            output.unknowns.push(Unknown {
                                location,
                                reason: e.to_string(),
                            });
                            continue;
                        }
                    };
                    if let Some(format) = detect_format(&prefix, record.mode) {
                        debug!(path = %location, ?format, "executable found");
                        output.executables.push(Executable { location, format });
                    }
                }
                Ok(output)
            })
            .await
        })
    }
}
