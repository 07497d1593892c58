use adversim_core::expectation::InjectExpectation;

use crate::rows::RawInjectExpectation;

/// Map a stored score onto the reporting scale.
///
/// Team-scoped expectations are binary: a team either reached the expected
/// score or it did not, there is no partial credit. Everything else keeps
/// three grades: fulfilled (1.0), attempted but short (0.5), outright zero
/// (0.0). A missing score stays missing — pending is not a grade.
///
/// Comparisons are exact. Stored scores come from a controlled set (zero,
/// the expected score, or values between); there is no epsilon to tune.
pub fn normalized_score(score: Option<f64>, expected_score: f64, team_scoped: bool) -> Option<f64> {
    let score = score?;
    if team_scoped {
        return Some(if score >= expected_score { 1.0 } else { 0.0 });
    }
    if score >= expected_score {
        Some(1.0)
    } else if score == 0.0 {
        Some(0.0)
    } else {
        Some(0.5)
    }
}

/// Hydrated-path adapter.
pub fn expectation_score(expectation: &InjectExpectation) -> Option<f64> {
    normalized_score(
        expectation.score,
        expectation.expected_score,
        expectation.target.is_team(),
    )
}

/// Flattened-path adapter. Must agree with [`expectation_score`] on every
/// `(score, expected_score, team)` triple; both delegate to the same kernel
/// and only differ in how they read the team flag out of their shape.
pub fn row_score(row: &RawInjectExpectation) -> Option<f64> {
    normalized_score(
        row.inject_expectation_score,
        row.inject_expectation_expected_score,
        row.is_team_scoped(),
    )
}
