use std::collections::{BTreeMap, HashSet};

use adversim_core::expectation::{
    ExpectationSpec, ExpectationTarget, ExpectationType, InjectExpectation,
};
use adversim_core::target::{Agent, AssetToExecute, Endpoint};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::signatures::correlation_signatures;

/// Cross-link for human-response expectations bound to published content.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HumanResponseLink {
    Article(Uuid),
    Challenge(Uuid),
}

/// Families whose expectations the external telemetry matcher resolves.
/// Manual expectations are validated by people and carry no signatures.
fn is_telemetry_matched(kind: ExpectationType) -> bool {
    matches!(
        kind,
        ExpectationType::Prevention | ExpectationType::Detection | ExpectationType::Vulnerability
    )
}

fn base_expectation(
    kind: ExpectationType,
    spec: &ExpectationSpec,
    inject_id: Uuid,
    target: ExpectationTarget,
    now: DateTime<Utc>,
) -> InjectExpectation {
    InjectExpectation {
        id: Uuid::now_v7(),
        inject_id,
        expectation_type: kind,
        name: spec.name.clone(),
        description: spec.description.clone(),
        score: None,
        expected_score: spec.score,
        expiration_time: spec.expiration_time,
        expectation_group: spec.expectation_group,
        target,
        signatures: Vec::new(),
        results: Vec::new(),
        traces: Vec::new(),
        article_id: None,
        challenge_id: None,
        created_at: now,
        updated_at: now,
    }
}

/// Fan one expectation out over a single endpoint's targeting path.
///
/// Nothing is created unless at least one agent executed on the endpoint:
/// an endpoint where nothing happened gets no rows at all. For an executing
/// endpoint this produces the direct asset row (when directly targeted),
/// one membership asset row plus one group umbrella per group it was
/// reached through, and one row per executing agent.
///
/// A nested implant's agent row and signatures are attributed to its parent
/// agent, correlating through the inject that deployed the parent.
pub fn expectations_for_asset(
    kind: ExpectationType,
    spec: &ExpectationSpec,
    inject_id: Uuid,
    asset: &AssetToExecute,
    agents: &[Agent],
    targeted: &BTreeMap<String, Endpoint>,
    now: DateTime<Utc>,
) -> Vec<InjectExpectation> {
    let executing: Vec<&Agent> = agents
        .iter()
        .filter(|agent| agent.asset_id == asset.endpoint.id)
        .collect();
    if executing.is_empty() {
        return Vec::new();
    }

    let asset_id = asset.endpoint.id;
    let primary_group = asset.asset_group_ids.first().copied();
    let mut expectations = Vec::new();

    if asset.direct_target {
        expectations.push(base_expectation(
            kind,
            spec,
            inject_id,
            ExpectationTarget::Asset {
                asset_id,
                asset_group_id: None,
            },
            now,
        ));
    }

    for group_id in &asset.asset_group_ids {
        expectations.push(base_expectation(
            kind,
            spec,
            inject_id,
            ExpectationTarget::Asset {
                asset_id,
                asset_group_id: Some(*group_id),
            },
            now,
        ));
        expectations.push(base_expectation(
            kind,
            spec,
            inject_id,
            ExpectationTarget::AssetGroup {
                asset_group_id: *group_id,
            },
            now,
        ));
    }

    for agent in executing {
        let mut expectation = base_expectation(
            kind,
            spec,
            inject_id,
            ExpectationTarget::Agent {
                agent_id: agent.attribution_agent_id(),
                asset_id,
                asset_group_id: primary_group,
            },
            now,
        );
        if is_telemetry_matched(kind) {
            expectation.signatures = correlation_signatures(
                agent.process_prefix(),
                agent.signature_inject_id(inject_id),
                &asset.endpoint,
                agent.attribution_agent_id(),
                targeted,
            );
        }
        expectations.push(expectation);
    }

    expectations
}

/// Fan one expectation out over the whole execution set. Group umbrellas
/// are deduplicated across endpoints so each group gets exactly one
/// umbrella per inject, no matter how many of its members executed.
pub fn expectations_for_execution(
    kind: ExpectationType,
    spec: &ExpectationSpec,
    inject_id: Uuid,
    assets: &[AssetToExecute],
    agents: &[Agent],
    targeted: &BTreeMap<String, Endpoint>,
    now: DateTime<Utc>,
) -> Vec<InjectExpectation> {
    let mut expectations = Vec::new();
    let mut seen_groups: HashSet<Uuid> = HashSet::new();

    for asset in assets {
        let mut batch = expectations_for_asset(kind, spec, inject_id, asset, agents, targeted, now);
        batch.retain(|expectation| match expectation.target {
            ExpectationTarget::AssetGroup { asset_group_id } => seen_groups.insert(asset_group_id),
            _ => true,
        });
        expectations.append(&mut batch);
    }

    tracing::debug!(
        inject_id = %inject_id,
        kind = kind.as_str(),
        count = expectations.len(),
        "built technical expectations"
    );

    expectations
}

/// One team umbrella per targeted team.
pub fn team_expectations(
    kind: ExpectationType,
    spec: &ExpectationSpec,
    inject_id: Uuid,
    team_ids: &[Uuid],
    link: Option<HumanResponseLink>,
    now: DateTime<Utc>,
) -> Vec<InjectExpectation> {
    team_ids
        .iter()
        .map(|team_id| {
            let mut expectation = base_expectation(
                kind,
                spec,
                inject_id,
                ExpectationTarget::Team { team_id: *team_id },
                now,
            );
            apply_link(&mut expectation, link);
            expectation
        })
        .collect()
}

/// One player row per member of a team. These are the children the team
/// umbrella aggregates from.
pub fn player_expectations(
    kind: ExpectationType,
    spec: &ExpectationSpec,
    inject_id: Uuid,
    team_id: Uuid,
    user_ids: &[Uuid],
    link: Option<HumanResponseLink>,
    now: DateTime<Utc>,
) -> Vec<InjectExpectation> {
    user_ids
        .iter()
        .map(|user_id| {
            let mut expectation = base_expectation(
                kind,
                spec,
                inject_id,
                ExpectationTarget::Player {
                    user_id: *user_id,
                    team_id,
                },
                now,
            );
            apply_link(&mut expectation, link);
            expectation
        })
        .collect()
}

fn apply_link(expectation: &mut InjectExpectation, link: Option<HumanResponseLink>) {
    match link {
        Some(HumanResponseLink::Article(article_id)) => expectation.article_id = Some(article_id),
        Some(HumanResponseLink::Challenge(challenge_id)) => {
            expectation.challenge_id = Some(challenge_id)
        }
        None => {}
    }
}
