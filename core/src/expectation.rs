use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::signature::ExpectationSignature;

/// Validation window for technical expectations (prevention, detection,
/// vulnerability), in seconds.
pub const DEFAULT_TECHNICAL_EXPIRATION_TIME: i64 = 21_600;
/// Validation window for human-response expectations, in seconds.
pub const DEFAULT_HUMAN_EXPIRATION_TIME: i64 = 86_400;
/// Score a result must reach for the expectation to count as fulfilled.
pub const DEFAULT_EXPECTED_SCORE: f64 = 100.0;

/// What kind of reaction an inject expects from the defense.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectationType {
    Text,
    Document,
    Article,
    Challenge,
    Manual,
    Prevention,
    Detection,
    Vulnerability,
}

impl ExpectationType {
    pub fn as_str(self) -> &'static str {
        match self {
            ExpectationType::Text => "TEXT",
            ExpectationType::Document => "DOCUMENT",
            ExpectationType::Article => "ARTICLE",
            ExpectationType::Challenge => "CHALLENGE",
            ExpectationType::Manual => "MANUAL",
            ExpectationType::Prevention => "PREVENTION",
            ExpectationType::Detection => "DETECTION",
            ExpectationType::Vulnerability => "VULNERABILITY",
        }
    }

    /// Parse a stored type token. Unknown tokens map to `None`: bulk rows may
    /// carry types introduced by a newer writer, and those simply belong to
    /// no reporting family.
    pub fn from_name(value: &str) -> Option<Self> {
        match value {
            "TEXT" => Some(ExpectationType::Text),
            "DOCUMENT" => Some(ExpectationType::Document),
            "ARTICLE" => Some(ExpectationType::Article),
            "CHALLENGE" => Some(ExpectationType::Challenge),
            "MANUAL" => Some(ExpectationType::Manual),
            "PREVENTION" => Some(ExpectationType::Prevention),
            "DETECTION" => Some(ExpectationType::Detection),
            "VULNERABILITY" => Some(ExpectationType::Vulnerability),
            _ => None,
        }
    }
}

/// Who or what an expectation is scored against. Exactly one variant per
/// expectation; the variant also decides how scores are normalized (teams
/// are binary, everything else gets partial credit).
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(tag = "target_type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExpectationTarget {
    /// Individual player, always inside a team.
    Player { user_id: Uuid, team_id: Uuid },
    /// Team umbrella row, recomputed from its players.
    Team { team_id: Uuid },
    /// Executing implant on an endpoint. The group link is set when the
    /// endpoint was reached through an asset group.
    Agent {
        agent_id: Uuid,
        asset_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        asset_group_id: Option<Uuid>,
    },
    /// Endpoint-level row. Group link `None` for direct targeting, `Some`
    /// for the membership row created per group the endpoint was reached
    /// through.
    Asset {
        asset_id: Uuid,
        #[serde(skip_serializing_if = "Option::is_none")]
        asset_group_id: Option<Uuid>,
    },
    /// Asset-group umbrella row, recomputed from its member asset rows.
    AssetGroup { asset_group_id: Uuid },
}

impl ExpectationTarget {
    pub fn team_id(&self) -> Option<Uuid> {
        match self {
            ExpectationTarget::Player { team_id, .. } | ExpectationTarget::Team { team_id } => {
                Some(*team_id)
            }
            _ => None,
        }
    }

    pub fn asset_id(&self) -> Option<Uuid> {
        match self {
            ExpectationTarget::Agent { asset_id, .. } | ExpectationTarget::Asset { asset_id, .. } => {
                Some(*asset_id)
            }
            _ => None,
        }
    }

    pub fn asset_group_id(&self) -> Option<Uuid> {
        match self {
            ExpectationTarget::Agent { asset_group_id, .. }
            | ExpectationTarget::Asset { asset_group_id, .. } => *asset_group_id,
            ExpectationTarget::AssetGroup { asset_group_id } => Some(*asset_group_id),
            _ => None,
        }
    }

    /// Team umbrella rows are the only team-scoped targets; player rows keep
    /// individual scoring even though they reference a team.
    pub fn is_team(&self) -> bool {
        matches!(self, ExpectationTarget::Team { .. })
    }

    pub fn kind_label(&self) -> &'static str {
        match self {
            ExpectationTarget::Player { .. } => "player",
            ExpectationTarget::Team { .. } => "team",
            ExpectationTarget::Agent { .. } => "agent",
            ExpectationTarget::Asset { .. } => "asset",
            ExpectationTarget::AssetGroup { .. } => "asset_group",
        }
    }
}

/// One observation reported against an expectation. Results are immutable
/// and accumulate; the expectation's `score` is the current decision derived
/// from them, never automatically the latest result's score.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct ExpectationResult {
    /// Which security platform or actor produced the observation.
    pub source_id: String,
    pub source_name: String,
    /// Free-form outcome label (e.g. "Blocked", "Pending", "Expired").
    pub result: String,
    pub score: f64,
    pub created_at: DateTime<Utc>,
}

/// Link from an expectation to the raw telemetry alert that matched it.
/// Traces stay on the persisted instance; detached views never carry them.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ExpectationTrace {
    pub source_id: String,
    pub alert_id: String,
    pub created_at: DateTime<Utc>,
}

/// A single expectation row: one (inject, type, target) combination.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InjectExpectation {
    pub id: Uuid,
    pub inject_id: Uuid,
    pub expectation_type: ExpectationType,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Current verdict. `None` until the first decision lands.
    pub score: Option<f64>,
    /// Threshold a result score must reach to count as full success.
    pub expected_score: f64,
    /// Seconds after creation until the expectation auto-fails.
    pub expiration_time: i64,
    /// Aggregation-policy selector: `true` means one fulfilled child
    /// validates the whole sibling set, `false` means all children must.
    pub expectation_group: bool,
    pub target: ExpectationTarget,
    pub signatures: Vec<ExpectationSignature>,
    pub results: Vec<ExpectationResult>,
    pub traces: Vec<ExpectationTrace>,
    /// Cross-link for ARTICLE expectations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub article_id: Option<Uuid>,
    /// Cross-link for CHALLENGE expectations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub challenge_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl InjectExpectation {
    pub fn record_result(&mut self, result: ExpectationResult) {
        self.results.push(result);
    }

    pub fn latest_result(&self) -> Option<&ExpectationResult> {
        self.results.last()
    }

    /// The validation window is closed once its full duration has elapsed.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now.signed_duration_since(self.created_at).num_seconds() >= self.expiration_time
    }

    /// Detached copy for read-only views: signatures and results are
    /// duplicated into fresh collections so the view can be filtered and
    /// rescored without touching the persisted instance. Detached views
    /// never carry trace history.
    pub fn detached_copy(&self) -> Self {
        Self {
            id: self.id,
            inject_id: self.inject_id,
            expectation_type: self.expectation_type,
            name: self.name.clone(),
            description: self.description.clone(),
            score: self.score,
            expected_score: self.expected_score,
            expiration_time: self.expiration_time,
            expectation_group: self.expectation_group,
            target: self.target.clone(),
            signatures: self.signatures.clone(),
            results: self.results.clone(),
            traces: Vec::new(),
            article_id: self.article_id,
            challenge_id: self.challenge_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// What an inject declares it expects, before the factory fans it out over
/// concrete targets.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ExpectationSpec {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Expected score: the success threshold copied onto every created row.
    pub score: f64,
    pub expiration_time: i64,
    pub expectation_group: bool,
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use uuid::Uuid;

    use super::{
        ExpectationResult, ExpectationTarget, ExpectationTrace, ExpectationType, InjectExpectation,
    };

    fn expectation() -> InjectExpectation {
        let now = Utc::now();
        InjectExpectation {
            id: Uuid::now_v7(),
            inject_id: Uuid::now_v7(),
            expectation_type: ExpectationType::Detection,
            name: "Detect lateral movement".to_string(),
            description: None,
            score: None,
            expected_score: 100.0,
            expiration_time: 21_600,
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
            created_at: now,
            updated_at: now,
        }
    }

    fn result(source_id: &str, score: f64) -> ExpectationResult {
        ExpectationResult {
            source_id: source_id.to_string(),
            source_name: source_id.to_string(),
            result: "Detected".to_string(),
            score,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn type_tokens_round_trip() {
        for kind in [
            ExpectationType::Text,
            ExpectationType::Document,
            ExpectationType::Article,
            ExpectationType::Challenge,
            ExpectationType::Manual,
            ExpectationType::Prevention,
            ExpectationType::Detection,
            ExpectationType::Vulnerability,
        ] {
            assert_eq!(ExpectationType::from_name(kind.as_str()), Some(kind));
        }
        assert_eq!(ExpectationType::from_name("SIGMA_RULE"), None);
    }

    #[test]
    fn type_serializes_as_screaming_snake_case() {
        let json = serde_json::to_value(ExpectationType::Prevention).unwrap();
        assert_eq!(json, serde_json::json!("PREVENTION"));
    }

    #[test]
    fn only_team_umbrella_targets_are_team_scoped() {
        let team_id = Uuid::now_v7();
        let team = ExpectationTarget::Team { team_id };
        let player = ExpectationTarget::Player {
            user_id: Uuid::now_v7(),
            team_id,
        };

        assert!(team.is_team());
        assert!(!player.is_team());
        assert_eq!(team.team_id(), Some(team_id));
        assert_eq!(player.team_id(), Some(team_id));
    }

    #[test]
    fn latest_result_is_the_last_recorded() {
        let mut expectation = expectation();
        expectation.record_result(result("crowdstrike", 0.0));
        expectation.record_result(result("sentinel", 100.0));

        let latest = expectation.latest_result().unwrap();
        assert_eq!(latest.source_id, "sentinel");
    }

    #[test]
    fn expiration_closes_at_the_full_window() {
        let mut expectation = expectation();
        expectation.expiration_time = 3600;
        let created_at = expectation.created_at;

        assert!(!expectation.is_expired(created_at + Duration::seconds(3599)));
        assert!(expectation.is_expired(created_at + Duration::seconds(3600)));
    }

    #[test]
    fn detached_copy_never_carries_traces() {
        let mut expectation = expectation();
        expectation.record_result(result("crowdstrike", 100.0));
        expectation.traces.push(ExpectationTrace {
            source_id: "crowdstrike".to_string(),
            alert_id: "alert-77".to_string(),
            created_at: Utc::now(),
        });

        let view = expectation.detached_copy();
        assert!(view.traces.is_empty());
        assert_eq!(view.results.len(), 1);
        assert_eq!(view.id, expectation.id);
        assert_eq!(expectation.traces.len(), 1);
    }

    #[test]
    fn detached_copy_owns_its_collections() {
        let mut expectation = expectation();
        expectation.record_result(result("crowdstrike", 100.0));

        let mut view = expectation.detached_copy();
        view.results.clear();
        assert_eq!(expectation.results.len(), 1);
    }
}
