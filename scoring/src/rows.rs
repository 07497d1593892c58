use adversim_core::error::ScoringError;
use adversim_core::expectation::{ExpectationTarget, ExpectationType};
use uuid::Uuid;

/// Flattened expectation row for bulk multi-inject aggregation, one row per
/// expectation. Dashboards read thousands of these at once; hydrating full
/// object graphs for that is prohibitive, so the query layer maps straight
/// into this shape and the engine computes from it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RawInjectExpectation {
    pub inject_expectation_id: Uuid,
    pub inject_id: Uuid,
    pub inject_expectation_type: String,
    pub inject_expectation_score: Option<f64>,
    pub inject_expectation_expected_score: f64,
    pub inject_expectation_group: bool,
    pub user_id: Option<Uuid>,
    pub team_id: Option<Uuid>,
    pub agent_id: Option<Uuid>,
    pub asset_id: Option<Uuid>,
    pub asset_group_id: Option<Uuid>,
}

impl RawInjectExpectation {
    /// Stored type token, `None` for tokens this version does not know.
    pub fn expectation_type(&self) -> Option<ExpectationType> {
        ExpectationType::from_name(&self.inject_expectation_type)
    }

    /// Team umbrella rows carry a team reference and no user reference.
    pub fn is_team_scoped(&self) -> bool {
        self.team_id.is_some() && self.user_id.is_none()
    }

    /// Classify the row by its most specific populated reference. A row
    /// with none of the five references is a data-integrity failure.
    pub fn target(&self) -> Result<ExpectationTarget, ScoringError> {
        let missing = || ScoringError::MissingTargetReference {
            id: self.inject_expectation_id,
        };

        if let Some(user_id) = self.user_id {
            let team_id = self.team_id.ok_or_else(missing)?;
            return Ok(ExpectationTarget::Player { user_id, team_id });
        }
        if let Some(team_id) = self.team_id {
            return Ok(ExpectationTarget::Team { team_id });
        }
        if let Some(agent_id) = self.agent_id {
            let asset_id = self.asset_id.ok_or_else(missing)?;
            return Ok(ExpectationTarget::Agent {
                agent_id,
                asset_id,
                asset_group_id: self.asset_group_id,
            });
        }
        if let Some(asset_id) = self.asset_id {
            return Ok(ExpectationTarget::Asset {
                asset_id,
                asset_group_id: self.asset_group_id,
            });
        }
        if let Some(asset_group_id) = self.asset_group_id {
            return Ok(ExpectationTarget::AssetGroup { asset_group_id });
        }
        Err(missing())
    }
}
