use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::signature::{NESTED_IMPLANT_PREFIX, RESIDENT_IMPLANT_PREFIX};

/// Endpoint inventory entry, as much of it as scoring needs.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Endpoint {
    pub id: Uuid,
    pub hostname: String,
    /// Statically known addresses.
    pub ips: Vec<String>,
    /// Address observed on the most recent agent check-in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seen_ip: Option<String>,
}

/// One endpoint an inject actually ran on, with the targeting path that
/// reached it.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct AssetToExecute {
    pub endpoint: Endpoint,
    /// Whether the endpoint was also a direct target of the inject, not
    /// only a member of a targeted group.
    pub direct_target: bool,
    /// Groups the endpoint was reached through, in targeting order.
    pub asset_group_ids: Vec<Uuid>,
}

/// How the executing implant got onto the endpoint. A nested implant is
/// dropped by another implant during an inject and carries, by
/// construction, the parent it must be attributed to.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ImplantKind {
    Resident,
    Nested {
        /// Implant that dropped this one.
        parent_agent_id: Uuid,
        /// Inject that deployed the parent implant.
        parent_inject_id: Uuid,
    },
}

/// An implant agent that executed an inject action.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct Agent {
    pub id: Uuid,
    pub asset_id: Uuid,
    pub implant: ImplantKind,
}

impl Agent {
    /// Agent the expectation row and its signatures are attributed to.
    /// A nested implant's actions belong to the implant that dropped it.
    pub fn attribution_agent_id(&self) -> Uuid {
        match self.implant {
            ImplantKind::Resident => self.id,
            ImplantKind::Nested {
                parent_agent_id, ..
            } => parent_agent_id,
        }
    }

    /// Inject id used when building correlation signatures: nested implants
    /// correlate through the inject that deployed their parent, not the
    /// inject currently being scored.
    pub fn signature_inject_id(&self, caller_inject_id: Uuid) -> Uuid {
        match self.implant {
            ImplantKind::Resident => caller_inject_id,
            ImplantKind::Nested {
                parent_inject_id, ..
            } => parent_inject_id,
        }
    }

    pub fn process_prefix(&self) -> &'static str {
        match self.implant {
            ImplantKind::Resident => RESIDENT_IMPLANT_PREFIX,
            ImplantKind::Nested { .. } => NESTED_IMPLANT_PREFIX,
        }
    }
}
