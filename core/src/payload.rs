use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Attack payload carried by an injector contract, resolved into its
/// concrete kind when the record is loaded. Consumers branch with a plain
/// `match`; there is no runtime downcast.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
#[serde(tag = "payload_type", rename_all = "snake_case")]
pub enum Payload {
    Command { command: String },
    Executable { file_name: String },
    FileDrop { file_name: String },
    DnsResolution { hostnames: Vec<String> },
    NetworkTraffic { destinations: Vec<String> },
}

impl Payload {
    /// Values the payload argues against: hostnames or addresses of other
    /// assets referenced by inject arguments. Empty for payload kinds that
    /// only act on the endpoint they run on. The inventory resolves these
    /// into endpoints before signature building.
    pub fn targeted_arguments(&self) -> &[String] {
        match self {
            Payload::DnsResolution { hostnames } => hostnames,
            Payload::NetworkTraffic { destinations } => destinations,
            Payload::Command { .. } | Payload::Executable { .. } | Payload::FileDrop { .. } => &[],
        }
    }
}

/// Injector contract, as much of it as scoring needs: the declared payload
/// and the attack patterns the contract is associated with.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InjectorContract {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Payload>,
    /// External attack-pattern identifiers (e.g. "T1059.001").
    pub attack_pattern_ids: Vec<String>,
}

/// Execution outcome carrier, as much of it as scoring needs.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct InjectStatus {
    /// Structured payload the executor reported actually running, captured
    /// at execution time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload_output: Option<Payload>,
    pub tracked_at: DateTime<Utc>,
}

/// A dispatched attack action.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct Inject {
    pub id: Uuid,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<InjectorContract>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<InjectStatus>,
}

impl Inject {
    /// Payload the inject actually ran. The execution output captured on
    /// the status wins; only when no output was saved does the contract's
    /// declared payload stand in.
    pub fn resolved_payload(&self) -> Option<&Payload> {
        if let Some(status) = &self.status {
            if let Some(output) = &status.payload_output {
                return Some(output);
            }
        }
        if let Some(contract) = &self.contract {
            return contract.payload.as_ref();
        }
        None
    }
}
