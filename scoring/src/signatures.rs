use std::collections::{BTreeMap, HashSet};

use adversim_core::signature::ExpectationSignature;
use adversim_core::target::Endpoint;
use uuid::Uuid;

/// Build the correlation signatures for one agent-level expectation.
///
/// `prefix` is the implant process prefix for the agent's implant kind and
/// `inject_id` the inject the implant correlates through (for nested
/// implants that is the parent's originating inject, substituted by the
/// caller). `targeted` maps inject argument values to the endpoints the
/// inventory resolved them to; `BTreeMap` keeps signature output order
/// deterministic.
pub fn correlation_signatures(
    prefix: &str,
    inject_id: Uuid,
    source: &Endpoint,
    agent_id: Uuid,
    targeted: &BTreeMap<String, Endpoint>,
) -> Vec<ExpectationSignature> {
    let mut signatures = vec![ExpectationSignature::parent_process_name(format!(
        "{prefix}{inject_id}-agent-{agent_id}"
    ))];

    // Source-side addresses: every address the implant's own endpoint is
    // known by, so alerts keyed by address instead of process still route
    // here. Static addresses first, then the last-seen one.
    let mut seen: HashSet<&str> = HashSet::new();
    for ip in source.ips.iter().chain(source.seen_ip.iter()) {
        if seen.insert(ip.as_str()) {
            signatures.push(ExpectationSignature::ipv4_address(ip.clone()));
        }
    }

    // Target-side values from inject arguments: a value naming the resolved
    // endpoint by hostname matches as a hostname, anything else as an
    // address.
    for (value, endpoint) in targeted {
        if value.eq_ignore_ascii_case(&endpoint.hostname) {
            signatures.push(ExpectationSignature::hostname(value.clone()));
        } else {
            signatures.push(ExpectationSignature::ipv4_address(value.clone()));
        }
    }

    signatures
}
