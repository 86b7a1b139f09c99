//! 도메인 타입 -- 카탈로거가 생산하는 아티팩트
//!
//! 패키지, 관계, 파일 메타데이터, 미분류 항목 등 태스크 출력의 기본 단위를 정의합니다.

use std::fmt;

use serde::{Deserialize, Serialize};

/// 리졸버 내 파일 위치
///
/// 경로는 스캔 루트 기준이며 항상 `/`로 시작합니다 (예: `/usr/lib/os-release`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    /// 스캔 루트 기준 경로
    pub path: String,
}

impl Location {
    /// 경로를 정규화하여 위치를 생성합니다.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into().replace('\\', "/");
        if path.starts_with('/') {
            Self { path }
        } else {
            Self {
                path: format!("/{path}"),
            }
        }
    }

    /// 부모 디렉토리 경로를 반환합니다 (루트면 `/`).
    pub fn parent(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) | None => "/",
            Some(idx) => &self.path[..idx],
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

/// 패키지 유형 (생태계)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageType {
    /// Rust crate (Cargo.lock)
    RustCrate,
    /// npm 패키지
    Npm,
    /// Python 패키지
    Python,
    /// Go 모듈
    GoModule,
    /// Debian 패키지
    Deb,
    /// Alpine 패키지
    Apk,
    /// 바이너리에서 식별된 패키지
    Binary,
}

impl PackageType {
    /// Package URL 타입을 반환합니다.
    pub fn purl_type(&self) -> &'static str {
        match self {
            Self::RustCrate => "cargo",
            Self::Npm => "npm",
            Self::Python => "pypi",
            Self::GoModule => "golang",
            Self::Deb => "deb",
            Self::Apk => "apk",
            Self::Binary => "generic",
        }
    }

    /// OS 패키지 관리자 소속인지 여부
    pub fn is_os_package(&self) -> bool {
        matches!(self, Self::Deb | Self::Apk)
    }
}

impl fmt::Display for PackageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RustCrate => write!(f, "rust-crate"),
            Self::Npm => write!(f, "npm"),
            Self::Python => write!(f, "python"),
            Self::GoModule => write!(f, "go-module"),
            Self::Deb => write!(f, "deb"),
            Self::Apk => write!(f, "apk"),
            Self::Binary => write!(f, "binary"),
        }
    }
}

/// 소프트웨어 패키지
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Package {
    /// 결정적 식별자 (`purl` + 발견 위치)
    pub id: String,
    /// 패키지 이름
    pub name: String,
    /// 패키지 버전
    pub version: String,
    /// 패키지 유형
    pub package_type: PackageType,
    /// Package URL (예: `pkg:cargo/serde@1.0.204`)
    pub purl: String,
    /// 이 패키지를 찾은 카탈로거 이름
    pub found_by: String,
    /// 패키지 근거가 된 파일 위치
    pub locations: Vec<Location>,
    /// 패키지가 소유한다고 선언한 파일 경로
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owned_files: Vec<String>,
    /// 직접 의존하는 패키지 이름
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// OS 배포판 (os-feature-detection이 채움)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distro: Option<String>,
}

impl Package {
    /// 이름/버전/위치로 패키지를 생성합니다. ID와 PURL은 자동으로 계산됩니다.
    pub fn new(
        name: impl Into<String>,
        version: impl Into<String>,
        package_type: PackageType,
        found_by: &str,
        location: Location,
    ) -> Self {
        let name = name.into();
        let version = version.into();
        let purl = Self::make_purl(&package_type, &name, &version);
        Self {
            id: format!("{purl}#{}", location.path),
            name,
            version,
            package_type,
            purl,
            found_by: found_by.to_owned(),
            locations: vec![location],
            owned_files: Vec::new(),
            dependencies: Vec::new(),
            distro: None,
        }
    }

    /// 패키지 이름과 버전으로 PURL을 생성합니다.
    pub fn make_purl(package_type: &PackageType, name: &str, version: &str) -> String {
        format!("pkg:{}/{}@{}", package_type.purl_type(), name, version)
    }
}

impl fmt::Display for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{} ({})", self.name, self.version, self.package_type)
    }
}

/// 관계 유형
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RelationshipType {
    /// 패키지가 파일을 포함
    Contains,
    /// 두 패키지의 소유 파일이 겹침 (from이 to의 파일을 소유)
    OwnershipByFileOverlap,
    /// from 패키지가 to 패키지의 의존성
    DependencyOf,
}

/// 아티팩트 간 관계
///
/// `from`/`to`는 패키지 ID 또는 파일 위치 경로입니다.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Relationship {
    /// 출발 아티팩트
    pub from: String,
    /// 도착 아티팩트
    pub to: String,
    /// 관계 유형
    pub kind: RelationshipType,
}

/// 파일 메타데이터
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// 위치
    pub location: Location,
    /// 크기 (바이트)
    pub size: u64,
    /// 유닉스 권한 비트 (알 수 없으면 0)
    pub mode: u32,
}

/// 파일 다이제스트
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileDigest {
    /// 알고리즘 이름 (sha256, sha512)
    pub algorithm: String,
    /// 16진수 값
    pub value: String,
}

/// 실행 파일 형식
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExecutableFormat {
    /// ELF
    Elf,
    /// Mach-O
    MachO,
    /// PE/COFF
    Pe,
    /// shebang 스크립트
    Script,
}

/// 실행 파일 정보
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Executable {
    /// 위치
    pub location: Location,
    /// 형식
    pub format: ExecutableFormat,
}

/// 분류되지 않은 항목
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Unknown {
    /// 위치
    pub location: Location,
    /// 분류 실패 사유
    pub reason: String,
}

/// 스캔 대상의 Linux 배포판 정보 (`os-release`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinuxRelease {
    /// 배포판 ID (예: `debian`, `alpine`)
    pub id: String,
    /// 버전 ID (예: `12`, `3.20.1`)
    pub version_id: String,
    /// 표시 이름
    pub pretty_name: String,
}

impl LinuxRelease {
    /// `os-release` 형식 텍스트를 파싱합니다. ID가 없으면 `None`.
    pub fn parse(content: &str) -> Option<Self> {
        let mut release = Self::default();
        for line in content.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim().trim_matches('"').to_owned();
            match key.trim() {
                "ID" => release.id = value,
                "VERSION_ID" => release.version_id = value,
                "PRETTY_NAME" => release.pretty_name = value,
                _ => {}
            }
        }
        (!release.id.is_empty()).then_some(release)
    }

    /// PURL distro 한정자 값 (예: `debian-12`)
    pub fn distro_qualifier(&self) -> String {
        if self.version_id.is_empty() {
            self.id.clone()
        } else {
            format!("{}-{}", self.id, self.version_id)
        }
    }
}
