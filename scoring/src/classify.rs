use adversim_core::expectation::{ExpectationType, InjectExpectation};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::normalize;
use crate::rows::RawInjectExpectation;

/// Reporting families. Each expectation type belongs to at most one family;
/// TEXT and DOCUMENT belong to none and never reach reporting.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectationFamily {
    Prevention,
    Detection,
    Vulnerability,
    HumanResponse,
}

impl ExpectationFamily {
    pub const ALL: [ExpectationFamily; 4] = [
        ExpectationFamily::Prevention,
        ExpectationFamily::Detection,
        ExpectationFamily::Vulnerability,
        ExpectationFamily::HumanResponse,
    ];

    pub fn member_types(self) -> &'static [ExpectationType] {
        match self {
            ExpectationFamily::Prevention => &[ExpectationType::Prevention],
            ExpectationFamily::Detection => &[ExpectationType::Detection],
            ExpectationFamily::Vulnerability => &[ExpectationType::Vulnerability],
            ExpectationFamily::HumanResponse => &[
                ExpectationType::Article,
                ExpectationType::Challenge,
                ExpectationType::Manual,
            ],
        }
    }

    fn id(self) -> &'static str {
        match self {
            ExpectationFamily::Prevention => "prevention",
            ExpectationFamily::Detection => "detection",
            ExpectationFamily::Vulnerability => "vulnerability",
            ExpectationFamily::HumanResponse => "human_response",
        }
    }

    fn success_label(self) -> &'static str {
        match self {
            ExpectationFamily::Prevention => "Blocked",
            ExpectationFamily::Detection => "Detected",
            ExpectationFamily::Vulnerability => "Not Vulnerable",
            ExpectationFamily::HumanResponse => "Successful",
        }
    }

    fn partial_label(self) -> &'static str {
        match self {
            ExpectationFamily::Prevention => "Partially Blocked",
            ExpectationFamily::Detection => "Partially Detected",
            ExpectationFamily::Vulnerability => "Partially Vulnerable",
            ExpectationFamily::HumanResponse => "Partial",
        }
    }

    fn failure_label(self) -> &'static str {
        match self {
            ExpectationFamily::Prevention => "Not Blocked",
            ExpectationFamily::Detection => "Not Detected",
            ExpectationFamily::Vulnerability => "Vulnerable",
            ExpectationFamily::HumanResponse => "Failed",
        }
    }
}

/// Terminal verdict over a set of normalized scores. UNKNOWN means nothing
/// was expected in the first place; PENDING means expectations exist but no
/// verdict landed yet.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectationStatus {
    Failed,
    Pending,
    Partial,
    Success,
    Unknown,
}

/// One bucket of the per-family outcome distribution.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ResultDistribution {
    pub id: String,
    pub label: String,
    pub value: usize,
}

/// Per-family verdict and outcome distribution for one inject set.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ExpectationResultsByType {
    pub family: ExpectationFamily,
    pub status: ExpectationStatus,
    /// Always ordered success, pending, partial, failure; empty when the
    /// family had no scores at all.
    pub distribution: Vec<ResultDistribution>,
}

impl ExpectationResultsByType {
    /// Share of fully successful expectations, zero when nothing was
    /// counted. Derived on demand for API consumers, never persisted.
    pub fn success_rate(&self) -> f64 {
        let total: usize = self.distribution.iter().map(|bucket| bucket.value).sum();
        if total == 0 {
            return 0.0;
        }
        let successes = self.distribution.first().map_or(0, |bucket| bucket.value);
        successes as f64 / total as f64
    }
}

/// Verdict over a list of normalized scores (`None` = pending entry).
pub fn classify(scores: &[Option<f64>]) -> ExpectationStatus {
    if scores.is_empty() {
        return ExpectationStatus::Unknown;
    }
    let answered: Vec<f64> = scores.iter().flatten().copied().collect();
    if answered.is_empty() {
        return ExpectationStatus::Pending;
    }
    let mean = answered.iter().sum::<f64>() / answered.len() as f64;
    if mean == 0.0 {
        ExpectationStatus::Failed
    } else if mean == 1.0 {
        ExpectationStatus::Success
    } else {
        ExpectationStatus::Partial
    }
}

/// Four-bucket outcome distribution with the family's own labels. Every
/// score lands in exactly one bucket, so bucket values sum to the score
/// count. Empty input yields an empty distribution.
pub fn distribution(family: ExpectationFamily, scores: &[Option<f64>]) -> Vec<ResultDistribution> {
    if scores.is_empty() {
        return Vec::new();
    }

    let count = |expected: Option<f64>| scores.iter().filter(|score| **score == expected).count();

    vec![
        ResultDistribution {
            id: format!("{}_success", family.id()),
            label: family.success_label().to_string(),
            value: count(Some(1.0)),
        },
        ResultDistribution {
            id: format!("{}_pending", family.id()),
            label: "Pending".to_string(),
            value: count(None),
        },
        ResultDistribution {
            id: format!("{}_partial", family.id()),
            label: family.partial_label().to_string(),
            value: count(Some(0.5)),
        },
        ResultDistribution {
            id: format!("{}_failure", family.id()),
            label: family.failure_label().to_string(),
            value: count(Some(0.0)),
        },
    ]
}

pub fn family_result(
    family: ExpectationFamily,
    scores: &[Option<f64>],
) -> ExpectationResultsByType {
    ExpectationResultsByType {
        family,
        status: classify(scores),
        distribution: distribution(family, scores),
    }
}

/// Per-family results over any input shape. `scores_for` extracts the
/// normalized scores of the given types from the input; the hydrated and
/// flattened paths pass their own extractor and share everything else.
/// Families with no expectations in the input are skipped entirely.
pub fn results_by_family<T>(
    items: &[T],
    scores_for: impl Fn(&[ExpectationType], &[T]) -> Vec<Option<f64>>,
) -> Vec<ExpectationResultsByType> {
    ExpectationFamily::ALL
        .into_iter()
        .filter_map(|family| {
            let scores = scores_for(family.member_types(), items);
            if scores.is_empty() {
                None
            } else {
                Some(family_result(family, &scores))
            }
        })
        .collect()
}

/// Hydrated-path extractor: one entry per expectation of the given types.
pub fn expectation_scores(
    types: &[ExpectationType],
    expectations: &[InjectExpectation],
) -> Vec<Option<f64>> {
    expectations
        .iter()
        .filter(|expectation| types.contains(&expectation.expectation_type))
        .map(normalize::expectation_score)
        .collect()
}

/// Flattened-path extractor. Rows with unknown type tokens belong to no
/// family and are never counted.
pub fn row_scores(types: &[ExpectationType], rows: &[RawInjectExpectation]) -> Vec<Option<f64>> {
    rows.iter()
        .filter(|row| {
            row.expectation_type()
                .is_some_and(|row_type| types.contains(&row_type))
        })
        .map(normalize::row_score)
        .collect()
}

pub fn results_from_expectations(
    expectations: &[InjectExpectation],
) -> Vec<ExpectationResultsByType> {
    results_by_family(expectations, expectation_scores)
}

pub fn results_from_rows(rows: &[RawInjectExpectation]) -> Vec<ExpectationResultsByType> {
    results_by_family(rows, row_scores)
}
