use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Process-name prefix for implants installed directly on an endpoint.
pub const RESIDENT_IMPLANT_PREFIX: &str = "adversim-implant-";
/// Process-name prefix for short-lived implants dropped by another implant.
pub const NESTED_IMPLANT_PREFIX: &str = "adversim-spawn-";

/// How the external telemetry matcher should compare a signature value
/// against incoming alerts.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignatureType {
    ParentProcessName,
    Hostname,
    Ipv4Address,
}

/// Identity marker attached to an expectation so incoming detection and
/// prevention events can be routed back to it. Opaque to the scoring math.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq, Eq)]
pub struct ExpectationSignature {
    pub signature_type: SignatureType,
    pub value: String,
}

impl ExpectationSignature {
    pub fn parent_process_name(value: String) -> Self {
        Self {
            signature_type: SignatureType::ParentProcessName,
            value,
        }
    }

    pub fn hostname(value: String) -> Self {
        Self {
            signature_type: SignatureType::Hostname,
            value,
        }
    }

    pub fn ipv4_address(value: String) -> Self {
        Self {
            signature_type: SignatureType::Ipv4Address,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ExpectationSignature, SignatureType};

    #[test]
    fn signature_type_serializes_as_snake_case() {
        let signature = ExpectationSignature::parent_process_name("adversim-implant-x".to_string());
        let json = serde_json::to_value(&signature).unwrap();
        assert_eq!(json["signature_type"], "parent_process_name");
        assert_eq!(json["value"], "adversim-implant-x");
    }

    #[test]
    fn constructors_tag_the_right_type() {
        assert_eq!(
            ExpectationSignature::hostname("fileserver01".to_string()).signature_type,
            SignatureType::Hostname
        );
        assert_eq!(
            ExpectationSignature::ipv4_address("10.0.0.12".to_string()).signature_type,
            SignatureType::Ipv4Address
        );
    }
}
