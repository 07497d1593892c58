use adversim_core::expectation::{ExpectationResult, InjectExpectation};
use chrono::{DateTime, Utc};

/// Source identity stamped on auto-fail results.
pub const EXPIRATION_SOURCE_ID: &str = "expiration-manager";
pub const EXPIRATION_SOURCE_NAME: &str = "Expiration manager";

/// Close out pending expectations whose validation window has elapsed.
/// Each one fails with a zero score and an "Expired" result, so downstream
/// aggregation and reporting treat the timeout like any collected verdict.
/// Returns how many expectations were closed.
pub fn expire_overdue(expectations: &mut [InjectExpectation], now: DateTime<Utc>) -> usize {
    let mut closed = 0;
    for expectation in expectations.iter_mut() {
        if expectation.score.is_some() || !expectation.is_expired(now) {
            continue;
        }
        expectation.score = Some(0.0);
        expectation.record_result(ExpectationResult {
            source_id: EXPIRATION_SOURCE_ID.to_string(),
            source_name: EXPIRATION_SOURCE_NAME.to_string(),
            result: "Expired".to_string(),
            score: 0.0,
            created_at: now,
        });
        expectation.updated_at = now;
        tracing::debug!(
            expectation_id = %expectation.id,
            "validation window elapsed, auto-failing"
        );
        closed += 1;
    }
    closed
}

#[cfg(test)]
mod tests {
    use adversim_core::expectation::{ExpectationTarget, ExpectationType, InjectExpectation};
    use chrono::{DateTime, Duration, Utc};
    use uuid::Uuid;

    use super::{EXPIRATION_SOURCE_ID, expire_overdue};

    fn pending(created_at: DateTime<Utc>, expiration_time: i64) -> InjectExpectation {
        InjectExpectation {
            id: Uuid::now_v7(),
            inject_id: Uuid::now_v7(),
            expectation_type: ExpectationType::Detection,
            name: "Expect detection".to_string(),
            description: None,
            score: None,
            expected_score: 100.0,
            expiration_time,
            expectation_group: false,
            target: ExpectationTarget::Asset {
                asset_id: Uuid::now_v7(),
                asset_group_id: None,
            },
            signatures: Vec::new(),
            results: Vec::new(),
            traces: Vec::new(),
            article_id: None,
            challenge_id: None,
            created_at,
            updated_at: created_at,
        }
    }

    #[test]
    fn pending_expectations_fail_once_the_window_elapses() {
        let created_at = Utc::now();
        let now = created_at + Duration::seconds(3600);
        let mut expectations = [pending(created_at, 3600)];

        assert_eq!(expire_overdue(&mut expectations, now), 1);

        let closed = &expectations[0];
        assert_eq!(closed.score, Some(0.0));
        assert_eq!(closed.updated_at, now);
        let result = closed.latest_result().unwrap();
        assert_eq!(result.source_id, EXPIRATION_SOURCE_ID);
        assert_eq!(result.result, "Expired");
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn open_windows_are_left_alone() {
        let created_at = Utc::now();
        let mut expectations = [pending(created_at, 3600)];

        let closed = expire_overdue(&mut expectations, created_at + Duration::seconds(10));

        assert_eq!(closed, 0);
        assert_eq!(expectations[0].score, None);
        assert!(expectations[0].results.is_empty());
    }

    #[test]
    fn answered_expectations_are_never_reopened() {
        let created_at = Utc::now();
        let mut expectations = [pending(created_at, 3600)];
        expectations[0].score = Some(100.0);

        let closed = expire_overdue(&mut expectations, created_at + Duration::days(7));

        assert_eq!(closed, 0);
        assert_eq!(expectations[0].score, Some(100.0));
        assert!(expectations[0].results.is_empty());
    }

    #[test]
    fn a_second_sweep_changes_nothing() {
        let created_at = Utc::now();
        let now = created_at + Duration::seconds(3600);
        let mut expectations = [pending(created_at, 3600)];

        assert_eq!(expire_overdue(&mut expectations, now), 1);
        assert_eq!(expire_overdue(&mut expectations, now + Duration::seconds(60)), 0);
        assert_eq!(expectations[0].results.len(), 1);
    }
}
