//! 선택 엔진 -- 이름/태그 집합 연산으로 실행할 태스크 결정
//!
//! # 규칙
//!
//! 1. `default` 목록의 자리표시자(`"default"`)는 소스 기본 태그로 제자리 치환됩니다.
//!    목록이 비어 있으면 소스 기본 태그 전체가 사용됩니다.
//! 2. 기본 일치: 이름이 토큰과 같거나, 셀렉터가 있는 태스크의 태그가 토큰과 겹침
//! 3. 제거 일치: 이름 또는 태그가 제거 목록에 있음
//! 4. 하위 선택 일치: 하위 선택이 비었거나 태그가 겹침 (이름은 인정하지 않음)
//! 5. 포함 = 기본 일치 AND 하위 선택 일치 AND NOT 제거 일치
//! 6. always-enabled 태스크는 무조건 포함
//! 7. 추가 목록에 이름/태그가 있는 태스크는 2~5와 무관하게 포함
//!
//! 엔진은 순수 함수이며 결과는 카탈로그 순서를 유지합니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::classify::DEFAULT_TOKEN;
use crate::task::Task;

/// 사용자 선택 요청
///
/// 필드 이름은 매니페스트 JSON 형태(`default`, `selection`, `addition`, `removal`)를 따릅니다.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionRequest {
    /// 기본 이름/태그 (순서 유지, 자리표시자 허용)
    #[serde(rename = "default", default, skip_serializing_if = "Vec::is_empty")]
    pub default_names_or_tags: Vec<String>,
    /// 하위 선택 태그
    #[serde(rename = "selection", default, skip_serializing_if = "Vec::is_empty")]
    pub sub_select_tags: Vec<String>,
    /// 강제 추가 이름/태그
    #[serde(rename = "addition", default, skip_serializing_if = "Vec::is_empty")]
    pub add_names_or_tags: Vec<String>,
    /// 제거 이름/태그
    #[serde(rename = "removal", default, skip_serializing_if = "Vec::is_empty")]
    pub remove_names_or_tags: Vec<String>,
}

impl SelectionRequest {
    /// 빈 요청을 생성합니다 (소스 기본값 사용).
    pub fn new() -> Self {
        Self::default()
    }

    /// 기본 이름/태그를 설정합니다.
    pub fn with_defaults<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.default_names_or_tags = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// 하위 선택 태그를 설정합니다.
    pub fn with_sub_selections<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sub_select_tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// 강제 추가 이름/태그를 설정합니다.
    pub fn with_additions<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_names_or_tags = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// 제거 이름/태그를 설정합니다.
    pub fn with_removals<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.remove_names_or_tags = tokens.into_iter().map(Into::into).collect();
        self
    }

    /// 기본 목록이 비어 있으면 소스 기본 태그로 채운 사본을 반환합니다.
    ///
    /// 명시적인 자리표시자는 그대로 둡니다 (매니페스트 `requested` 용).
    pub fn with_materialized_defaults(&self, defaults: &[&str]) -> Self {
        let mut request = self.clone();
        if request.default_names_or_tags.is_empty() {
            request.default_names_or_tags = defaults.iter().map(|s| (*s).to_owned()).collect();
        }
        request
    }

    /// 소스 기본 태그로 요청을 해석합니다.
    pub fn resolve(&self, defaults: &[&str]) -> ResolvedSelection {
        let default_tokens = if self.default_names_or_tags.is_empty() {
            defaults.iter().map(|s| (*s).to_owned()).collect()
        } else {
            replace_default_tag_references(defaults, &self.default_names_or_tags)
        };

        ResolvedSelection {
            defaults: default_tokens,
            removals: self.remove_names_or_tags.iter().cloned().collect(),
            sub_select: self.sub_select_tags.iter().cloned().collect(),
            additions: self.add_names_or_tags.iter().cloned().collect(),
        }
    }
}

/// 자리표시자를 대체 토큰으로 제자리 치환합니다.
pub fn replace_default_tag_references(replacement: &[&str], tokens: &[String]) -> Vec<String> {
    let mut result = Vec::with_capacity(tokens.len() + replacement.len());
    for token in tokens {
        if token == DEFAULT_TOKEN {
            result.extend(replacement.iter().map(|s| (*s).to_owned()));
        } else {
            result.push(token.clone());
        }
    }
    result
}

/// 자리표시자가 치환된 선택 요청
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSelection {
    defaults: Vec<String>,
    removals: BTreeSet<String>,
    sub_select: BTreeSet<String>,
    additions: BTreeSet<String>,
}

impl ResolvedSelection {
    /// 치환된 기본 토큰 (순서 유지)
    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    /// 하위 선택 태그가 태스크 목록 중 하나라도 해당되는지 확인합니다.
    ///
    /// 비어 있는 하위 선택은 어느 목록에도 해당되지 않습니다.
    pub fn sub_selection_touches(&self, tasks: &[Arc<dyn Task>]) -> bool {
        !self.sub_select.is_empty()
            && tasks
                .iter()
                .any(|t| carries_any_tag(t.as_ref(), self.sub_select.iter()))
    }

    /// 태스크 포함 여부를 판정합니다.
    ///
    /// `apply_sub_select`가 `false`면 하위 선택을 무시합니다.
    pub fn includes(&self, task: &dyn Task, apply_sub_select: bool) -> bool {
        if task.always_enabled() {
            return true;
        }
        if matches_name_or_tag(task, self.additions.iter()) {
            return true;
        }

        let matches_default = matches_name_or_tag(task, self.defaults.iter());
        let matches_removal = matches_name_or_tag(task, self.removals.iter());
        let matches_sub_select = !apply_sub_select
            || self.sub_select.is_empty()
            || carries_any_tag(task, self.sub_select.iter());

        matches_default && matches_sub_select && !matches_removal
    }

    /// 토큰 중 주어진 태스크 어디에도 해당하지 않는 것을 반환합니다.
    ///
    /// `ignore`에 있는 토큰(소스 기본 태그 등)은 검사하지 않습니다.
    pub fn unmatched_tokens(&self, universe: &[Arc<dyn Task>], ignore: &[&str]) -> Vec<String> {
        let tokens: BTreeSet<&String> = self
            .defaults
            .iter()
            .chain(self.removals.iter())
            .chain(self.sub_select.iter())
            .chain(self.additions.iter())
            .collect();

        tokens
            .into_iter()
            .filter(|token| !ignore.contains(&token.as_str()))
            .filter(|token| {
                !universe
                    .iter()
                    .any(|t| matches_name_or_tag(t.as_ref(), std::iter::once(*token)))
            })
            .cloned()
            .collect()
    }
}

/// 선택된 태스크를 카탈로그 순서대로 반환합니다.
pub fn select(
    tasks: &[Arc<dyn Task>],
    selection: &ResolvedSelection,
    apply_sub_select: bool,
) -> Vec<Arc<dyn Task>> {
    tasks
        .iter()
        .filter(|t| selection.includes(t.as_ref(), apply_sub_select))
        .cloned()
        .collect()
}

fn matches_name_or_tag<'a>(task: &dyn Task, mut tokens: impl Iterator<Item = &'a String>) -> bool {
    let selector = task.selector();
    tokens.any(|token| {
        token == task.name() || selector.is_some_and(|s| s.has_all_selectors(&[token.as_str()]))
    })
}

fn carries_any_tag<'a>(task: &dyn Task, mut tags: impl Iterator<Item = &'a String>) -> bool {
    match task.selector() {
        Some(selector) => tags.any(|tag| selector.has_all_selectors(&[tag.as_str()])),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogingError;
    use crate::task::{BoxFuture, Selector, Tags, TaskContext, TaskOutput};

    struct Fake {
        name: &'static str,
        tags: Option<Tags>,
        always: bool,
    }

    impl Task for Fake {
        fn name(&self) -> &str {
            self.name
        }
        fn selector(&self) -> Option<&dyn Selector> {
            self.tags.as_ref().map(|t| t as &dyn Selector)
        }
        fn always_enabled(&self) -> bool {
            self.always
        }
        fn run<'a>(
            &'a self,
            _ctx: &'a TaskContext,
        ) -> BoxFuture<'a, Result<TaskOutput, CatalogingError>> {
            Box::pin(async { Ok(TaskOutput::default()) })
        }
    }

    fn tagged(name: &'static str, tags: &[&str]) -> Arc<dyn Task> {
        Arc::new(Fake {
            name,
            tags: Some(Tags::new(tags.iter().copied())),
            always: false,
        })
    }

    fn universe() -> Vec<Arc<dyn Task>> {
        vec![
            tagged("js-installed", &["image", "javascript", "package"]),
            tagged("js-lock", &["directory", "javascript", "package"]),
            tagged("py-installed", &["image", "directory", "python", "package"]),
            tagged("dpkg", &["image", "directory", "os", "package"]),
            Arc::new(Fake {
                name: "persistent",
                tags: None,
                always: true,
            }),
            Arc::new(Fake {
                name: "named-only",
                tags: None,
                always: false,
            }),
        ]
    }

    fn names(tasks: &[Arc<dyn Task>]) -> Vec<&str> {
        tasks.iter().map(|t| t.name()).collect()
    }

    #[test]
    fn replace_without_placeholder() {
        let tokens = vec!["foo".to_owned(), "bar".to_owned()];
        assert_eq!(replace_default_tag_references(&["replacement"], &tokens), tokens);
    }

    #[test]
    fn replace_placeholder_in_place() {
        let tokens = vec!["foo".to_owned(), "default".to_owned(), "bar".to_owned()];
        assert_eq!(
            replace_default_tag_references(&["replacement"], &tokens),
            vec!["foo", "replacement", "bar"]
        );
    }

    #[test]
    fn empty_defaults_use_source_defaults() {
        let resolved = SelectionRequest::new().resolve(&["image", "file"]);
        assert_eq!(resolved.defaults(), ["image", "file"]);
    }

    #[test]
    fn default_selection_by_tag_keeps_catalog_order() {
        let resolved = SelectionRequest::new().resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(
            names(&selected),
            vec!["js-installed", "py-installed", "dpkg", "persistent"]
        );
    }

    #[test]
    fn name_matches_task_without_selector() {
        let resolved = SelectionRequest::new()
            .with_defaults(["named-only"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(names(&selected), vec!["persistent", "named-only"]);
    }

    #[test]
    fn removal_by_tag_and_name() {
        let resolved = SelectionRequest::new()
            .with_removals(["python", "dpkg"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(names(&selected), vec!["js-installed", "persistent"]);
    }

    #[test]
    fn sub_selection_is_tag_only() {
        let resolved = SelectionRequest::new()
            .with_sub_selections(["js-installed"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(names(&selected), vec!["persistent"]);

        let resolved = SelectionRequest::new()
            .with_sub_selections(["javascript"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(names(&selected), vec!["js-installed", "persistent"]);
    }

    #[test]
    fn sub_selection_can_be_skipped() {
        let resolved = SelectionRequest::new()
            .with_sub_selections(["javascript"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, false);
        assert_eq!(selected.len(), 4);
    }

    #[test]
    fn always_enabled_ignores_removal() {
        let resolved = SelectionRequest::new()
            .with_removals(["persistent", "package"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(names(&selected), vec!["persistent"]);
    }

    #[test]
    fn addition_overrides_removal_and_sub_selection() {
        let resolved = SelectionRequest::new()
            .with_sub_selections(["python"])
            .with_removals(["javascript"])
            .with_additions(["js-lock"])
            .resolve(&["image", "file"]);
        let selected = select(&universe(), &resolved, true);
        assert_eq!(
            names(&selected),
            vec!["js-lock", "py-installed", "persistent"]
        );
    }

    #[test]
    fn sub_selection_touches() {
        let tasks = universe();
        let resolved = SelectionRequest::new()
            .with_sub_selections(["os"])
            .resolve(&["image", "file"]);
        assert!(resolved.sub_selection_touches(&tasks));

        let resolved = SelectionRequest::new()
            .with_sub_selections(["digest"])
            .resolve(&["image", "file"]);
        assert!(!resolved.sub_selection_touches(&tasks));

        let resolved = SelectionRequest::new().resolve(&["image", "file"]);
        assert!(!resolved.sub_selection_touches(&tasks));
    }

    #[test]
    fn unmatched_tokens_reported() {
        let resolved = SelectionRequest::new()
            .with_removals(["nonexistent", "python"])
            .resolve(&["image", "file"]);
        assert_eq!(
            resolved.unmatched_tokens(&universe(), &["image", "file"]),
            vec!["nonexistent".to_owned()]
        );
    }

    #[test]
    fn materialized_defaults_keep_placeholder() {
        let request = SelectionRequest::new().with_defaults(["default", "extra"]);
        assert_eq!(
            request
                .with_materialized_defaults(&["image", "file"])
                .default_names_or_tags,
            vec!["default", "extra"]
        );
        assert_eq!(
            SelectionRequest::new()
                .with_materialized_defaults(&["image", "file"])
                .default_names_or_tags,
            vec!["image", "file"]
        );
    }

    #[test]
    fn serializes_with_manifest_keys() {
        let request = SelectionRequest::new()
            .with_defaults(["image"])
            .with_removals(["digest"]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["default"][0], "image");
        assert_eq!(json["removal"][0], "digest");
        assert!(json.get("selection").is_none());
    }
}
