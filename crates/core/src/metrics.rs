//! 메트릭 상수 및 설명 등록
//!
//! 모든 메트릭의 이름과 설명을 중앙에서 정의합니다.
//! 카탈로깅 엔진은 이 상수를 사용하여 `metrics::counter!()`,
//! `metrics::histogram!()` 매크로를 호출합니다. 레코더(exporter) 설치는
//! 라이브러리 사용자의 몫이며, 레코더가 없으면 호출은 아무 일도 하지 않습니다.
//!
//! # 네이밍 컨벤션
//!
//! - 접두어: `sbomkit_`
//! - 모듈명: `cataloging_`
//! - 접미어: `_total` (counter), `_seconds` (histogram/latency)
//!
//! # 사용 예시
//!
//! ```ignore
//! use metrics::counter;
//!
//! counter!(sbomkit_core::metrics::CATALOGING_TASKS_TOTAL,
//!     sbomkit_core::metrics::LABEL_RESULT => "success").increment(1);
//! ```

// ─── 레이블 키 상수 ────────────────────────────────────────────────

/// 결과 레이블 키 (success, failure)
pub const LABEL_RESULT: &str = "result";

/// 스테이지 레이블 키 (environment, packages, files, ...)
pub const LABEL_STAGE: &str = "stage";

// ─── Cataloging 메트릭 ─────────────────────────────────────────────

/// Cataloging: 실행된 태스크 수 (counter, label: result)
pub const CATALOGING_TASKS_TOTAL: &str = "sbomkit_cataloging_tasks_total";

/// Cataloging: 스테이지 소요 시간 (histogram, 초, label: stage)
pub const CATALOGING_STAGE_DURATION_SECONDS: &str = "sbomkit_cataloging_stage_duration_seconds";

/// Cataloging: 발견된 패키지 수 (counter)
pub const CATALOGING_PACKAGES_TOTAL: &str = "sbomkit_cataloging_packages_total";

/// Cataloging: 취소된 실행 수 (counter)
pub const CATALOGING_CANCELLED_TOTAL: &str = "sbomkit_cataloging_cancelled_total";

// ─── 히스토그램 버킷 정의 ────────────────────────────────────────────

/// 스테이지 소요 시간 히스토그램 버킷 (초)
///
/// 1ms ~ 300s 범위 (디스크 I/O 포함)
pub const STAGE_DURATION_BUCKETS: [f64; 10] =
    [0.001, 0.01, 0.1, 0.5, 1.0, 5.0, 10.0, 30.0, 60.0, 300.0];

// ─── 설명 등록 함수 ─────────────────────────────────────────────────

/// 모든 메트릭의 설명(description)을 등록합니다.
///
/// 전역 레코더 설치 후 한 번만 호출해야 합니다.
pub fn describe_all() {
    use metrics::{describe_counter, describe_histogram};

    describe_counter!(
        CATALOGING_TASKS_TOTAL,
        "Total number of cataloging tasks executed, by result"
    );
    describe_histogram!(
        CATALOGING_STAGE_DURATION_SECONDS,
        "Time to complete a single cataloging stage in seconds"
    );
    describe_counter!(
        CATALOGING_PACKAGES_TOTAL,
        "Total number of packages discovered by package catalogers"
    );
    describe_counter!(
        CATALOGING_CANCELLED_TOTAL,
        "Total number of cataloging runs stopped by cancellation"
    );
}
