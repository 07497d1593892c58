use adversim_core::error::ScoringError;
use adversim_core::expectation::{ExpectationResult, ExpectationTarget, InjectExpectation};
use chrono::{DateTime, Utc};

const ROLLUP_SOURCE_ID: &str = "scoring-engine";
const ROLLUP_SOURCE_NAME: &str = "Scoring engine";

/// How a sibling set validates its parent. Selected by the
/// `expectation_group` flag stamped on the children at creation: `true`
/// means one fulfilled child validates the whole set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationPolicy {
    AtLeastOne,
    All,
}

impl ValidationPolicy {
    pub fn from_group_flag(expectation_group: bool) -> Self {
        if expectation_group {
            ValidationPolicy::AtLeastOne
        } else {
            ValidationPolicy::All
        }
    }
}

/// Roll a sibling set's stored scores up into the parent score.
///
/// At-Least-One averages the strictly positive scores and ignores the rest;
/// only a unanimously zero set fails, and zeros mixed with pending children
/// stay undecided because one non-responder could still turn the outcome.
///
/// All averages the complete set once every child answered. While answers
/// are missing the set stays undecided until the first zero lands; from
/// then on the non-null sum is divided by the full sibling count, so a
/// child that never answers permanently depresses the average. Positive
/// answers are not examined while nulls exist and no zero does.
///
/// An empty set has no rollup; the aggregator rejects it before calling.
pub fn rollup_score(policy: ValidationPolicy, scores: &[Option<f64>]) -> Option<f64> {
    if scores.is_empty() {
        return None;
    }
    let players_size = scores.len();
    let zero_count = scores.iter().filter(|score| **score == Some(0.0)).count();
    let null_count = scores.iter().filter(|score| score.is_none()).count();

    match policy {
        ValidationPolicy::AtLeastOne => {
            let positives: Vec<f64> = scores
                .iter()
                .flatten()
                .copied()
                .filter(|score| *score > 0.0)
                .collect();
            if !positives.is_empty() {
                Some(positives.iter().sum::<f64>() / positives.len() as f64)
            } else if zero_count == players_size {
                Some(0.0)
            } else {
                None
            }
        }
        ValidationPolicy::All => {
            let answered_sum: f64 = scores.iter().flatten().sum();
            if null_count == 0 {
                Some(answered_sum / players_size as f64)
            } else if zero_count == 0 {
                None
            } else {
                Some(answered_sum / players_size as f64)
            }
        }
    }
}

/// Whether a child expectation rolls up into the given parent target.
fn is_child_of(child: &ExpectationTarget, parent: &ExpectationTarget) -> bool {
    match (child, parent) {
        (
            ExpectationTarget::Player {
                team_id: child_team, ..
            },
            ExpectationTarget::Team { team_id },
        ) => child_team == team_id,
        (
            ExpectationTarget::Agent {
                asset_id: child_asset,
                ..
            },
            ExpectationTarget::Asset { asset_id, .. },
        ) => child_asset == asset_id,
        (
            ExpectationTarget::Asset {
                asset_group_id: Some(child_group),
                ..
            },
            ExpectationTarget::AssetGroup { asset_group_id },
        ) => child_group == asset_group_id,
        _ => false,
    }
}

/// Result entry appended to a parent on recomputation, derived from a
/// representative child: its latest result when it has one, otherwise a
/// synthesized entry from its current score.
fn rollup_result(child: &InjectExpectation, now: DateTime<Utc>) -> ExpectationResult {
    match child.latest_result() {
        Some(latest) => ExpectationResult {
            source_id: latest.source_id.clone(),
            source_name: latest.source_name.clone(),
            result: latest.result.clone(),
            score: latest.score,
            created_at: now,
        },
        None => ExpectationResult {
            source_id: ROLLUP_SOURCE_ID.to_string(),
            source_name: ROLLUP_SOURCE_NAME.to_string(),
            result: match child.score {
                None => "Pending".to_string(),
                Some(score) if score == 0.0 => "Failed".to_string(),
                Some(_) => "Success".to_string(),
            },
            score: child.score.unwrap_or(0.0),
            created_at: now,
        },
    }
}

/// Recompute one parent from its children.
///
/// The sibling set is the children sharing the parent's inject, type and
/// scope (players of the team, agents on the asset, member asset rows of
/// the group); an empty set means the expectation tree was built wrong
/// upstream and fails fast. The parent score is always recomputed; the
/// result append and `updated_at` refresh happen only when a new child
/// result triggered the recomputation, so re-running on an unchanged set is
/// idempotent.
pub fn recompute_parent(
    parent: &mut InjectExpectation,
    children: &[InjectExpectation],
    is_new_result: bool,
    now: DateTime<Utc>,
) -> Result<(), ScoringError> {
    let to_process: Vec<&InjectExpectation> = children
        .iter()
        .filter(|child| {
            child.inject_id == parent.inject_id
                && child.expectation_type == parent.expectation_type
                && is_child_of(&child.target, &parent.target)
        })
        .collect();

    if to_process.is_empty() {
        return Err(ScoringError::ElementNotFound(format!(
            "no child expectations to aggregate for {} expectation {}",
            parent.target.kind_label(),
            parent.id,
        )));
    }

    let policy = ValidationPolicy::from_group_flag(to_process[0].expectation_group);
    let scores: Vec<Option<f64>> = to_process.iter().map(|child| child.score).collect();
    parent.score = rollup_score(policy, &scores);

    tracing::debug!(
        parent_id = %parent.id,
        policy = ?policy,
        children = to_process.len(),
        score = ?parent.score,
        "recomputed parent expectation"
    );

    if is_new_result {
        let representative = to_process
            .iter()
            .copied()
            .find(|child| !child.results.is_empty())
            .unwrap_or(to_process[0]);
        parent.record_result(rollup_result(representative, now));
        parent.updated_at = now;
    }

    Ok(())
}

/// Recompute a whole parent set against the same child pool.
pub fn recompute_parents(
    parents: &mut [InjectExpectation],
    children: &[InjectExpectation],
    is_new_result: bool,
    now: DateTime<Utc>,
) -> Result<(), ScoringError> {
    for parent in parents.iter_mut() {
        recompute_parent(parent, children, is_new_result, now)?;
    }
    Ok(())
}
