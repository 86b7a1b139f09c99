//! 스테이지 러너 -- 스테이지 순차 실행, 스테이지 내 태스크 동시 실행
//!
//! # 실행 모델
//!
//! - 스테이지는 엄격히 순서대로 실행됩니다.
//! - 스테이지 안의 태스크는 `JoinSet`으로 동시에 실행되며 `Semaphore`로 동시 실행 수를 제한합니다.
//! - 각 태스크는 이전 스테이지까지 병합된 결과의 스냅샷(`Arc<TaskContext>`)을 봅니다.
//! - 스테이지 출력은 모든 태스크가 끝난 뒤 카탈로그 순서대로 병합됩니다.
//! - 태스크 실패는 수집되어 결과에 기록되며 파이프라인은 계속됩니다.
//! - 취소되면 현재 스테이지의 태스크를 중단하고 `CatalogingError::Cancelled`를 반환합니다.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use sbomkit_core::SourceDescription;
use sbomkit_core::metrics as m;

use crate::error::CatalogingError;
use crate::resolver::Resolver;
use crate::sbom::Sbom;
use crate::stage::Stage;
use crate::task::{TaskContext, TaskOutput};

/// 실패한 태스크 기록
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// 태스크 이름
    pub task: String,
    /// 실행된 스테이지
    pub stage: String,
    /// 실패 사유
    pub reason: String,
}

/// 스테이지 실행 결과
#[derive(Debug, Clone, Default)]
pub struct RunOutcome {
    /// 병합된 결과
    pub sbom: Sbom,
    /// 실패한 태스크
    pub failures: Vec<TaskFailure>,
}

/// 스테이지 러너
#[derive(Debug, Clone)]
pub struct StageRunner {
    parallelism: usize,
}

impl StageRunner {
    /// 스테이지 내 동시 실행 수를 지정하여 러너를 생성합니다 (최소 1).
    pub fn new(parallelism: usize) -> Self {
        Self {
            parallelism: parallelism.max(1),
        }
    }

    /// 스테이지 목록을 실행합니다.
    ///
    /// # Errors
    ///
    /// 실행 중 취소되면 `CatalogingError::Cancelled`를 반환합니다.
    /// 개별 태스크 실패는 에러가 아니라 [`RunOutcome::failures`]에 기록됩니다.
    pub async fn run(
        &self,
        stages: &[Stage],
        resolver: Arc<dyn Resolver>,
        source: &SourceDescription,
        cancel: &CancellationToken,
    ) -> Result<RunOutcome, CatalogingError> {
        let semaphore = Arc::new(Semaphore::new(self.parallelism));
        let mut outcome = RunOutcome::default();

        for stage in stages {
            if cancel.is_cancelled() {
                return Err(cancelled(stage));
            }

            let started = Instant::now();
            let ctx = Arc::new(TaskContext::new(
                Arc::clone(&resolver),
                source.clone(),
                outcome.sbom.clone(),
                cancel.clone(),
            ));

            let results = run_stage(stage, ctx, Arc::clone(&semaphore), cancel).await?;

            for (task, result) in stage.tasks().iter().zip(results) {
                match result {
                    Some(Ok(output)) => {
                        record_success(task.name(), &output);
                        outcome.sbom.merge(output);
                    }
                    Some(Err(e)) => {
                        outcome.failures.push(failure(stage, task.name(), e.to_string()));
                    }
                    None => {
                        outcome.failures.push(failure(
                            stage,
                            task.name(),
                            "task panicked or was aborted".to_owned(),
                        ));
                    }
                }
            }

            let elapsed = started.elapsed().as_secs_f64();
            metrics::histogram!(m::CATALOGING_STAGE_DURATION_SECONDS, m::LABEL_STAGE => stage.kind().as_str())
                .record(elapsed);
            info!(
                stage = %stage.kind(),
                tasks = stage.tasks().len(),
                packages = outcome.sbom.packages.len(),
                elapsed_secs = elapsed,
                "stage completed"
            );
        }

        Ok(outcome)
    }
}

/// 한 스테이지의 태스크를 동시에 실행하고 태스크 순서대로 결과를 반환합니다.
///
/// `None`은 결과를 돌려주지 못한 태스크(패닉)입니다.
async fn run_stage(
    stage: &Stage,
    ctx: Arc<TaskContext>,
    semaphore: Arc<Semaphore>,
    cancel: &CancellationToken,
) -> Result<Vec<Option<Result<TaskOutput, CatalogingError>>>, CatalogingError> {
    let mut results: Vec<Option<Result<TaskOutput, CatalogingError>>> =
        stage.tasks().iter().map(|_| None).collect();
    let mut set = JoinSet::new();

    for (idx, task) in stage.tasks().iter().enumerate() {
        let task = Arc::clone(task);
        let ctx = Arc::clone(&ctx);
        let semaphore = Arc::clone(&semaphore);
        set.spawn(async move {
            let result = match semaphore.acquire_owned().await {
                Ok(_permit) => {
                    debug!(task = task.name(), "task started");
                    task.run(&ctx).await
                }
                Err(e) => Err(CatalogingError::Task {
                    task: task.name().to_owned(),
                    reason: format!("semaphore closed: {e}"),
                }),
            };
            (idx, result)
        });
    }

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                set.abort_all();
                return Err(cancelled(stage));
            }
            joined = set.join_next() => {
                match joined {
                    Some(Ok((idx, result))) => results[idx] = Some(result),
                    Some(Err(e)) => warn!(stage = %stage.kind(), error = %e, "task join failed"),
                    None => break,
                }
            }
        }
    }

    // 마지막 태스크와 취소가 동시에 끝난 경우
    if cancel.is_cancelled() {
        return Err(cancelled(stage));
    }
    Ok(results)
}

fn record_success(task: &str, output: &TaskOutput) {
    metrics::counter!(m::CATALOGING_TASKS_TOTAL, m::LABEL_RESULT => "success").increment(1);
    if !output.packages.is_empty() {
        metrics::counter!(m::CATALOGING_PACKAGES_TOTAL)
            .increment(u64::try_from(output.packages.len()).unwrap_or(u64::MAX));
    }
    debug!(
        task,
        packages = output.packages.len(),
        relationships = output.relationships.len(),
        files = output.files.len(),
        "task completed"
    );
}

fn failure(stage: &Stage, task: &str, reason: String) -> TaskFailure {
    metrics::counter!(m::CATALOGING_TASKS_TOTAL, m::LABEL_RESULT => "failure").increment(1);
    warn!(stage = %stage.kind(), task, reason = %reason, "task failed");
    TaskFailure {
        task: task.to_owned(),
        stage: stage.kind().as_str().to_owned(),
        reason,
    }
}

fn cancelled(stage: &Stage) -> CatalogingError {
    metrics::counter!(m::CATALOGING_CANCELLED_TOTAL).increment(1);
    warn!(stage = %stage.kind(), "cataloging cancelled");
    CatalogingError::Cancelled
}
