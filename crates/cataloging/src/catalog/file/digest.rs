//! 파일 다이제스트 카탈로거 (sha256, sha512)

use std::io::Read;
use std::sync::Arc;

use sha2::{Digest, Sha256, Sha512};
use tracing::warn;

use crate::config::{CreateSbomConfig, FileSelection, Hasher};
use crate::error::CatalogingError;
use crate::task::{BoxFuture, Selector, Tags, Task, TaskContext, TaskOutput, run_blocking};
use crate::types::{FileDigest, Unknown};

use super::target_locations;

/// 태스크 이름
pub const NAME: &str = "file-digest-cataloger";

const CHUNK_SIZE: usize = 64 * 1024;

/// 대상 파일의 다이제스트를 계산하는 태스크
pub struct FileDigestTask {
    tags: Tags,
    selection: FileSelection,
    hashers: Vec<Hasher>,
}

/// 파일 선택이 `none`이거나 알고리즘이 없으면 태스크를 만들지 않습니다.
pub fn new_task(config: &CreateSbomConfig) -> Option<Arc<dyn Task>> {
    if config.files.selection == FileSelection::None || config.files.hashers.is_empty() {
        return None;
    }
    Some(Arc::new(FileDigestTask {
        tags: Tags::new(["digest", "file"]),
        selection: config.files.selection,
        hashers: config.files.hashers.clone(),
    }))
}

/// 바이트 내용의 다이제스트를 계산합니다.
pub fn compute(hasher: Hasher, bytes: &[u8]) -> FileDigest {
    let value = match hasher {
        Hasher::Sha256 => hex::encode(Sha256::digest(bytes)),
        Hasher::Sha512 => hex::encode(Sha512::digest(bytes)),
    };
    FileDigest {
        algorithm: hasher.as_str().to_owned(),
        value,
    }
}

enum State {
    Sha256(Sha256),
    Sha512(Sha512),
}

impl State {
    fn new(hasher: Hasher) -> Self {
        match hasher {
            Hasher::Sha256 => Self::Sha256(Sha256::new()),
            Hasher::Sha512 => Self::Sha512(Sha512::new()),
        }
    }

    fn update(&mut self, chunk: &[u8]) {
        match self {
            Self::Sha256(h) => h.update(chunk),
            Self::Sha512(h) => h.update(chunk),
        }
    }

    fn finish(self) -> String {
        match self {
            Self::Sha256(h) => hex::encode(h.finalize()),
            Self::Sha512(h) => hex::encode(h.finalize()),
        }
    }
}

/// 리더를 한 번만 읽으면서 모든 알고리즘의 다이제스트를 계산합니다.
///
/// # Errors
///
/// 읽기 실패 시 `std::io::Error`를 반환합니다.
pub fn compute_streaming(
    hashers: &[Hasher],
    mut reader: impl Read,
) -> std::io::Result<Vec<FileDigest>> {
    let mut states: Vec<State> = hashers.iter().map(|h| State::new(*h)).collect();
    let mut buffer = [0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        for state in &mut states {
            state.update(&buffer[..n]);
        }
    }
    Ok(hashers
        .iter()
        .zip(states)
        .map(|(h, state)| FileDigest {
            algorithm: h.as_str().to_owned(),
            value: state.finish(),
        })
        .collect())
}

impl Task for FileDigestTask {
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
            let hashers = self.hashers.clone();

            run_blocking(NAME, move || {
                let mut output = TaskOutput::default();
                for location in targets {
                    if cancel.is_cancelled() {
                        return Err(CatalogingError::Cancelled);
                    }
                    let digests = resolver.open(&location).and_then(|reader| {
                        compute_streaming(&hashers, reader).map_err(|e| CatalogingError::Io {
                            path: location.path.clone(),
                            source: e,
                        })
                    });
                    match digests {
                        Ok(digests) => output.digests.push((location, digests)),
                        Err(e) => {
                            warn!(path = %location, error = %e, "failed to read file for digest, skipping");
                            output.unknowns.push(Unknown {
                                location,
                                reason: e.to_string(),
                            });
                        }
                    }
                }
                Ok(output)
            })
            .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::file::testing;
    use crate::sbom::Sbom;

    #[test]
    fn known_sha256() {
        let digest = compute(Hasher::Sha256, b"hello");
        assert_eq!(digest.algorithm, "sha256");
        assert_eq!(
            digest.value,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn sha512_length() {
        assert_eq!(compute(Hasher::Sha512, b"").value.len(), 128);
    }

    #[test]
    fn streaming_matches_whole_buffer_across_chunks() {
        let data: Vec<u8> = (0..CHUNK_SIZE * 2 + 17).map(|i| (i % 251) as u8).collect();
        let digests =
            compute_streaming(&[Hasher::Sha256, Hasher::Sha512], data.as_slice()).unwrap();
        assert_eq!(digests[0], compute(Hasher::Sha256, &data));
        assert_eq!(digests[1], compute(Hasher::Sha512, &data));
    }

    #[test]
    fn declines_without_hashers() {
        let mut config = CreateSbomConfig::default();
        config.files.hashers.clear();
        assert!(new_task(&config).is_none());
    }

    #[tokio::test]
    async fn digests_every_file_with_each_hasher() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "hello").unwrap();

        let mut config = CreateSbomConfig::default();
        config.files.selection = FileSelection::All;
        config.files.hashers = vec![Hasher::Sha256, Hasher::Sha512];
        let task = new_task(&config).unwrap();

        let ctx = testing::context(dir.path(), Sbom::default());
        let output = task.run(&ctx).await.unwrap();
        assert_eq!(output.digests.len(), 1);
        let (location, digests) = &output.digests[0];
        assert_eq!(location.path, "/a.txt");
        assert_eq!(digests.len(), 2);
        assert_eq!(digests[1].algorithm, "sha512");
    }
}
