use adversim_core::expectation::InjectExpectation;

use crate::classify::{ExpectationResultsByType, results_from_expectations};

/// Re-read a set of expectations through the eyes of one security platform.
///
/// Each expectation is detached, its results are narrowed to the ones the
/// given platform produced, and its score is recomputed as the best of what
/// remains. An expectation the platform never answered goes back to pending
/// in the view. The stored expectations are left untouched.
pub fn platform_view(expectations: &[InjectExpectation], source_id: &str) -> Vec<InjectExpectation> {
    expectations
        .iter()
        .map(|expectation| {
            let mut view = expectation.detached_copy();
            view.results.retain(|result| result.source_id == source_id);
            if view.results.is_empty() && !expectation.results.is_empty() {
                tracing::warn!(
                    expectation_id = %expectation.id,
                    source_id,
                    "platform filter dropped every collected result"
                );
            }
            view.score = view.results.iter().map(|result| result.score).fold(
                None,
                |best: Option<f64>, score| {
                    Some(match best {
                        Some(current) if current >= score => current,
                        _ => score,
                    })
                },
            );
            view
        })
        .collect()
}

/// Family result cards for a single platform's view of the expectations.
pub fn results_by_platform(
    expectations: &[InjectExpectation],
    source_id: &str,
) -> Vec<ExpectationResultsByType> {
    results_from_expectations(&platform_view(expectations, source_id))
}
