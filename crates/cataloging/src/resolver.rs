//! 파일 리졸버 -- 스캔 대상의 읽기 전용 파일 뷰
//!
//! [`Resolver`] trait은 태스크가 스캔 대상의 파일을 찾고 읽는 유일한 통로입니다.
//! 모든 메서드는 동기 I/O이므로 태스크는 `tokio::task::spawn_blocking` 안에서 호출해야 합니다.
//!
//! [`DirectoryResolver`]는 생성 시점에 `walkdir`로 트리를 한 번 색인하고,
//! 이후에는 색인만 조회합니다. 색인은 실행 중 변경되지 않으므로 여러 태스크가
//! `Arc<dyn Resolver>`로 공유해도 동기화가 필요 없습니다.

use std::collections::BTreeMap;
use std::io::Read;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::CatalogingError;
use crate::types::{FileRecord, Location};

/// 스캔 대상 파일 리졸버
pub trait Resolver: Send + Sync {
    /// 색인된 모든 파일 위치를 경로 순으로 반환합니다.
    fn all_locations(&self) -> Vec<Location>;

    /// 경로가 정확히 일치하는 위치를 반환합니다.
    fn location_by_path(&self, path: &str) -> Option<Location>;

    /// 경로가 주어진 접미어로 끝나는 위치를 반환합니다 (예: `/Cargo.lock`).
    fn locations_by_path_suffix(&self, suffix: &str) -> Vec<Location> {
        self.all_locations()
            .into_iter()
            .filter(|loc| loc.path.ends_with(suffix))
            .collect()
    }

    /// glob 패턴과 일치하는 위치를 반환합니다 (예: `**/*.dist-info/METADATA`).
    ///
    /// # Errors
    ///
    /// 패턴 문법이 잘못되면 `CatalogingError::Resolver`를 반환합니다.
    fn locations_by_glob(&self, pattern: &str) -> Result<Vec<Location>, CatalogingError> {
        let pattern = glob::Pattern::new(pattern)
            .map_err(|e| CatalogingError::Resolver(format!("invalid glob '{pattern}': {e}")))?;
        Ok(self
            .all_locations()
            .into_iter()
            .filter(|loc| pattern.matches(&loc.path))
            .collect())
    }

    /// 파일 내용을 바이트로 읽습니다.
    fn read_bytes(&self, location: &Location) -> Result<Vec<u8>, CatalogingError>;

    /// 파일 내용을 스트리밍으로 읽는 리더를 엽니다 (다이제스트 계산용).
    fn open(&self, location: &Location) -> Result<Box<dyn Read + Send>, CatalogingError> {
        Ok(Box::new(std::io::Cursor::new(self.read_bytes(location)?)))
    }

    /// 파일 앞부분을 최대 `len` 바이트까지 읽습니다 (매직 넘버 판별용).
    fn read_prefix(&self, location: &Location, len: usize) -> Result<Vec<u8>, CatalogingError> {
        let mut bytes = self.read_bytes(location)?;
        bytes.truncate(len);
        Ok(bytes)
    }

    /// 파일 내용을 UTF-8 문자열로 읽습니다.
    fn read_to_string(&self, location: &Location) -> Result<String, CatalogingError> {
        let bytes = self.read_bytes(location)?;
        String::from_utf8(bytes).map_err(|e| CatalogingError::Parse {
            path: location.path.clone(),
            reason: format!("invalid utf-8: {e}"),
        })
    }

    /// 파일 메타데이터를 반환합니다.
    fn metadata(&self, location: &Location) -> Result<FileRecord, CatalogingError>;
}

/// 색인 항목
#[derive(Debug, Clone)]
struct IndexedFile {
    absolute: PathBuf,
    size: u64,
    mode: u32,
}

/// 로컬 디렉토리(또는 단일 파일) 리졸버
#[derive(Debug)]
pub struct DirectoryResolver {
    root: PathBuf,
    index: BTreeMap<String, IndexedFile>,
    max_file_size: u64,
}

impl DirectoryResolver {
    /// 디렉토리 트리를 색인합니다.
    ///
    /// 읽을 수 없는 항목과 `max_file_size`를 넘는 파일은 경고 후 건너뜁니다.
    /// 심볼릭 링크는 따라가지 않습니다.
    ///
    /// # Errors
    ///
    /// 루트가 없거나 디렉토리가 아니면 `CatalogingError::Resolver`를 반환합니다.
    pub fn new(root: impl Into<PathBuf>, max_file_size: u64) -> Result<Self, CatalogingError> {
        let root = root.into();
        if !root.is_dir() {
            return Err(CatalogingError::Resolver(format!(
                "not a directory: {}",
                root.display()
            )));
        }

        let mut index = BTreeMap::new();
        for entry in WalkDir::new(&root).follow_links(false) {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!(error = %e, "failed to read directory entry, skipping");
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let meta = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    warn!(path = %entry.path().display(), error = %e, "failed to read file metadata, skipping");
                    continue;
                }
            };
            if meta.len() > max_file_size {
                warn!(
                    path = %entry.path().display(),
                    size = meta.len(),
                    max = max_file_size,
                    "file too large, skipping"
                );
                continue;
            }

            let Some(relative) = relative_path(&root, entry.path()) else {
                continue;
            };
            index.insert(
                relative,
                IndexedFile {
                    absolute: entry.path().to_path_buf(),
                    size: meta.len(),
                    mode: file_mode(&meta),
                },
            );
        }

        debug!(root = %root.display(), files = index.len(), "directory indexed");
        Ok(Self {
            root,
            index,
            max_file_size,
        })
    }

    /// 단일 파일을 스캔 대상으로 하는 리졸버를 생성합니다.
    ///
    /// 파일은 `/<파일명>` 위치로 노출됩니다.
    ///
    /// # Errors
    ///
    /// 파일이 없거나 `max_file_size`를 넘으면 에러를 반환합니다.
    pub fn for_file(path: impl AsRef<Path>, max_file_size: u64) -> Result<Self, CatalogingError> {
        let path = path.as_ref();
        let meta = std::fs::metadata(path).map_err(|e| CatalogingError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        if !meta.is_file() {
            return Err(CatalogingError::Resolver(format!(
                "not a file: {}",
                path.display()
            )));
        }
        if meta.len() > max_file_size {
            return Err(CatalogingError::FileTooBig {
                path: path.display().to_string(),
                size: meta.len(),
                max: max_file_size,
            });
        }

        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| CatalogingError::Resolver(format!("no file name: {}", path.display())))?;
        let root = path.parent().map(Path::to_path_buf).unwrap_or_default();

        let mut index = BTreeMap::new();
        index.insert(
            format!("/{file_name}"),
            IndexedFile {
                absolute: path.to_path_buf(),
                size: meta.len(),
                mode: file_mode(&meta),
            },
        );
        Ok(Self {
            root,
            index,
            max_file_size,
        })
    }

    /// 스캔 루트 경로
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// 색인된 파일 수
    pub fn file_count(&self) -> usize {
        self.index.len()
    }

    fn lookup(&self, location: &Location) -> Result<&IndexedFile, CatalogingError> {
        self.index
            .get(&location.path)
            .ok_or_else(|| CatalogingError::Resolver(format!("not indexed: {location}")))
    }

    /// 색인 조회 후 현재 크기가 상한 이하인지 확인합니다.
    fn checked_lookup(&self, location: &Location) -> Result<&IndexedFile, CatalogingError> {
        let file = self.lookup(location)?;
        // 색인 이후 파일이 커졌을 수 있으므로 다시 확인
        let size = std::fs::metadata(&file.absolute)
            .map(|m| m.len())
            .unwrap_or(file.size);
        if size > self.max_file_size {
            return Err(CatalogingError::FileTooBig {
                path: location.path.clone(),
                size,
                max: self.max_file_size,
            });
        }
        Ok(file)
    }
}

impl Resolver for DirectoryResolver {
    fn all_locations(&self) -> Vec<Location> {
        self.index.keys().map(|p| Location { path: p.clone() }).collect()
    }

    fn location_by_path(&self, path: &str) -> Option<Location> {
        let location = Location::new(path);
        self.index.contains_key(&location.path).then_some(location)
    }

    fn read_bytes(&self, location: &Location) -> Result<Vec<u8>, CatalogingError> {
        let file = self.checked_lookup(location)?;
        std::fs::read(&file.absolute).map_err(|e| CatalogingError::Io {
            path: location.path.clone(),
            source: e,
        })
    }

    fn open(&self, location: &Location) -> Result<Box<dyn Read + Send>, CatalogingError> {
        let file = self.checked_lookup(location)?;
        let handle = std::fs::File::open(&file.absolute).map_err(|e| CatalogingError::Io {
            path: location.path.clone(),
            source: e,
        })?;
        Ok(Box::new(std::io::BufReader::new(handle)))
    }

    fn read_prefix(&self, location: &Location, len: usize) -> Result<Vec<u8>, CatalogingError> {
        let file = self.lookup(location)?;
        let io_err = |e| CatalogingError::Io {
            path: location.path.clone(),
            source: e,
        };
        let handle = std::fs::File::open(&file.absolute).map_err(io_err)?;
        let mut bytes = Vec::with_capacity(len);
        handle
            .take(u64::try_from(len).unwrap_or(u64::MAX))
            .read_to_end(&mut bytes)
            .map_err(io_err)?;
        Ok(bytes)
    }

    fn metadata(&self, location: &Location) -> Result<FileRecord, CatalogingError> {
        let file = self.lookup(location)?;
        Ok(FileRecord {
            location: location.clone(),
            size: file.size,
            mode: file.mode,
        })
    }
}

/// 루트 기준 `/`로 시작하는 상대 경로를 계산합니다.
fn relative_path(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("/{}", parts.join("/")))
}

#[cfg(unix)]
fn file_mode(meta: &std::fs::Metadata) -> u32 {
    use std::os::unix::fs::PermissionsExt;
    meta.permissions().mode() & 0o7777
}

#[cfg(not(unix))]
fn file_mode(_meta: &std::fs::Metadata) -> u32 {
    0
}
