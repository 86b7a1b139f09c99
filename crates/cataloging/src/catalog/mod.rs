//! 태스크 카탈로그 -- 내장 패키지/파일 카탈로거와 고정 인프라 태스크
//!
//! 선택 엔진이 보는 태스크 전체 집합(universe)은 여기서 만들어집니다.
//!
//! - [`default_package_tasks`]: 생태계별 패키지 카탈로거 (태그 포함)
//! - [`package_tasks`]: 내장 패키지 태스크 + 호출자가 등록한 카탈로거
//! - [`default_file_tasks`]: 설정에 따라 생성되는 파일 카탈로거
//! - [`infra`]: 항상 고정 위치에서 실행되는 인프라 태스크

pub mod file;
pub mod infra;
pub mod pkg;

use std::collections::HashSet;
use std::sync::Arc;

use crate::config::CreateSbomConfig;
use crate::error::CatalogingError;
use crate::task::{PackageTask, Tags, Task};

use self::pkg::GenericCataloger;
use self::pkg::apk::ApkInstalledParser;
use self::pkg::cargo::CargoLockParser;
use self::pkg::dpkg::DpkgStatusParser;
use self::pkg::golang::GoModParser;
use self::pkg::javascript::{NodePackageJsonParser, NpmLockParser};
use self::pkg::python::{PoetryLockParser, PythonInstalledParser, PythonRequirementsParser};

fn package_task(cataloger: GenericCataloger, tags: &[&str]) -> Arc<dyn Task> {
    Arc::new(PackageTask::new(
        Arc::new(cataloger),
        Tags::new(tags.iter().copied()),
    ))
}

/// 내장 패키지 태스크를 카탈로그 순서대로 반환합니다.
pub fn default_package_tasks() -> Vec<Arc<dyn Task>> {
    vec![
        package_task(
            GenericCataloger::new("rust-cargo-lock-cataloger", CargoLockParser),
            &["declared", "directory", "language", "rust", "cargo", "package"],
        ),
        package_task(
            GenericCataloger::new("javascript-lock-cataloger", NpmLockParser),
            &["declared", "directory", "language", "javascript", "node", "npm", "package"],
        ),
        package_task(
            GenericCataloger::new("javascript-package-cataloger", NodePackageJsonParser),
            &["installed", "image", "language", "javascript", "node", "package"],
        ),
        package_task(
            GenericCataloger::new("python-installed-package-cataloger", PythonInstalledParser),
            &["installed", "image", "directory", "language", "python", "package"],
        ),
        package_task(
            GenericCataloger::new("python-package-cataloger", PythonRequirementsParser)
                .with_parser(PoetryLockParser),
            &["declared", "directory", "language", "python", "package"],
        ),
        package_task(
            GenericCataloger::new("go-module-file-cataloger", GoModParser),
            &["declared", "directory", "language", "go", "golang", "gomod", "package"],
        ),
        package_task(
            GenericCataloger::new("dpkg-db-cataloger", DpkgStatusParser),
            &["image", "directory", "os", "dpkg", "debian", "package"],
        ),
        package_task(
            GenericCataloger::new("apk-db-cataloger", ApkInstalledParser),
            &["image", "directory", "os", "apk", "alpine", "package"],
        ),
    ]
}

/// 내장 패키지 태스크 뒤에 호출자가 등록한 카탈로거를 붙여 반환합니다.
///
/// # Errors
///
/// 태스크 이름은 실행 안에서 유일해야 합니다. 내장 태스크나 앞선 참조와 이름이
/// 겹치면 `CatalogingError::Validation` (`catalogers`)을 반환합니다.
pub fn package_tasks(config: &CreateSbomConfig) -> Result<Vec<Arc<dyn Task>>, CatalogingError> {
    let mut tasks = default_package_tasks();
    let mut names: HashSet<String> = tasks.iter().map(|t| t.name().to_owned()).collect();

    for reference in &config.catalogers {
        if !names.insert(reference.name().to_owned()) {
            return Err(CatalogingError::Validation {
                field: "catalogers".to_owned(),
                reason: format!("duplicate cataloger name '{}'", reference.name()),
            });
        }
        tasks.push(reference.to_task());
    }
    Ok(tasks)
}

/// 설정에 따라 파일 태스크를 생성합니다.
///
/// 각 팩토리는 설정상 할 일이 없으면 태스크를 만들지 않습니다.
pub fn default_file_tasks(config: &CreateSbomConfig) -> Vec<Arc<dyn Task>> {
    let factories: [fn(&CreateSbomConfig) -> Option<Arc<dyn Task>>; 4] = [
        file::metadata::new_task,
        file::digest::new_task,
        file::executable::new_task,
        file::content::new_task,
    ];
    factories.iter().filter_map(|f| f(config)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileSelection, Hasher};
    use crate::resolver::Resolver;
    use crate::task::{Cataloger, CatalogerReference};
    use crate::types::{Package, Relationship};

    struct Custom(&'static str);

    impl Cataloger for Custom {
        fn name(&self) -> &str {
            self.0
        }
        fn catalog(
            &self,
            _resolver: &dyn Resolver,
        ) -> Result<(Vec<Package>, Vec<Relationship>), CatalogingError> {
            Ok((Vec::new(), Vec::new()))
        }
    }

    fn names(tasks: &[Arc<dyn Task>]) -> Vec<&str> {
        tasks.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn package_task_names_are_unique_and_tagged() {
        let tasks = default_package_tasks();
        let unique: HashSet<_> = names(&tasks).into_iter().collect();
        assert_eq!(unique.len(), tasks.len());
        for task in &tasks {
            let selector = task.selector().unwrap();
            assert!(selector.has_all_selectors(&["package"]), "{}", task.name());
        }
    }

    #[test]
    fn caller_catalogers_are_appended() {
        let mut config = CreateSbomConfig::default();
        config
            .catalogers
            .push(CatalogerReference::always_enabled(Arc::new(Custom("persistent"))));

        let tasks = package_tasks(&config).unwrap();
        assert_eq!(tasks.len(), default_package_tasks().len() + 1);
        let last = tasks.last().unwrap();
        assert_eq!(last.name(), "persistent");
        assert!(last.always_enabled());
    }

    #[test]
    fn caller_cataloger_named_like_builtin_is_rejected() {
        let mut config = CreateSbomConfig::default();
        config.catalogers.push(CatalogerReference::always_enabled(Arc::new(Custom(
            "dpkg-db-cataloger",
        ))));

        let err = package_tasks(&config).err().unwrap();
        assert!(
            matches!(&err, CatalogingError::Validation { field, .. } if field == "catalogers"),
            "{err}"
        );
        assert!(err.to_string().contains("dpkg-db-cataloger"));
    }

    #[test]
    fn caller_catalogers_with_same_name_are_rejected() {
        let mut config = CreateSbomConfig::default();
        for _ in 0..2 {
            config
                .catalogers
                .push(CatalogerReference::always_enabled(Arc::new(Custom("persistent"))));
        }
        assert!(package_tasks(&config).is_err());
    }

    #[test]
    fn default_file_tasks_without_content_globs() {
        let tasks = default_file_tasks(&CreateSbomConfig::default());
        assert_eq!(
            names(&tasks),
            vec![
                "file-metadata-cataloger",
                "file-digest-cataloger",
                "file-executable-cataloger",
            ]
        );
    }

    #[test]
    fn file_factories_decline() {
        let mut config = CreateSbomConfig::default();
        config.files.hashers = Vec::<Hasher>::new();
        config.files.content.globs = vec!["**/*.conf".to_owned()];
        assert_eq!(
            names(&default_file_tasks(&config)),
            vec![
                "file-metadata-cataloger",
                "file-executable-cataloger",
                "file-content-cataloger",
            ]
        );

        config.files.selection = FileSelection::None;
        assert_eq!(
            names(&default_file_tasks(&config)),
            vec!["file-content-cataloger"]
        );
    }
}
