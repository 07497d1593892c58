use std::collections::BTreeMap;

use adversim_core::payload::Inject;
use uuid::Uuid;

use crate::classify::{ExpectationResultsByType, results_from_rows};
use crate::rows::RawInjectExpectation;

/// Family result cards per partition. A partition names the injects it
/// covers; each one is reported over its own rows only, so a failure in
/// one partition never bleeds into another.
pub fn results_by_partition<K: Ord + Clone>(
    partitions: &BTreeMap<K, Vec<Uuid>>,
    rows: &[RawInjectExpectation],
) -> BTreeMap<K, Vec<ExpectationResultsByType>> {
    partitions
        .iter()
        .map(|(key, inject_ids)| {
            let members: Vec<RawInjectExpectation> = rows
                .iter()
                .filter(|row| inject_ids.contains(&row.inject_id))
                .cloned()
                .collect();
            (key.clone(), results_from_rows(&members))
        })
        .collect()
}

/// Family result cards per attack pattern, read off the injector
/// contracts. An inject that exercises several patterns contributes its
/// rows to every one of them; injects without a contract or without
/// patterns appear in no group.
pub fn results_by_attack_pattern(
    injects: &[Inject],
    rows: &[RawInjectExpectation],
) -> BTreeMap<String, Vec<ExpectationResultsByType>> {
    let mut injects_by_pattern: BTreeMap<String, Vec<Uuid>> = BTreeMap::new();
    for inject in injects {
        let Some(contract) = &inject.contract else {
            continue;
        };
        for pattern in &contract.attack_pattern_ids {
            injects_by_pattern
                .entry(pattern.clone())
                .or_default()
                .push(inject.id);
        }
    }
    results_by_partition(&injects_by_pattern, rows)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use adversim_core::payload::{Inject, InjectorContract};
    use uuid::Uuid;

    use super::{results_by_attack_pattern, results_by_partition};
    use crate::classify::ExpectationStatus;
    use crate::rows::RawInjectExpectation;

    fn row(inject_id: Uuid, kind: &str, score: Option<f64>) -> RawInjectExpectation {
        RawInjectExpectation {
            inject_expectation_id: Uuid::now_v7(),
            inject_id,
            inject_expectation_type: kind.to_string(),
            inject_expectation_score: score,
            inject_expectation_expected_score: 100.0,
            inject_expectation_group: false,
            user_id: None,
            team_id: None,
            agent_id: None,
            asset_id: Some(Uuid::now_v7()),
            asset_group_id: None,
        }
    }

    fn inject(patterns: &[&str]) -> Inject {
        Inject {
            id: Uuid::now_v7(),
            title: "Run discovery command".to_string(),
            contract: Some(InjectorContract {
                id: Uuid::now_v7(),
                payload: None,
                attack_pattern_ids: patterns.iter().map(|p| p.to_string()).collect(),
            }),
            status: None,
        }
    }

    #[test]
    fn partitions_report_independently() {
        let blocked_inject = Uuid::now_v7();
        let missed_inject = Uuid::now_v7();
        let rows = vec![
            row(blocked_inject, "PREVENTION", Some(100.0)),
            row(missed_inject, "PREVENTION", Some(0.0)),
        ];
        let partitions = BTreeMap::from([
            ("phishing".to_string(), vec![blocked_inject]),
            ("lateral-movement".to_string(), vec![missed_inject]),
        ]);

        let reports = results_by_partition(&partitions, &rows);

        assert_eq!(reports["phishing"][0].status, ExpectationStatus::Success);
        assert_eq!(
            reports["lateral-movement"][0].status,
            ExpectationStatus::Failed
        );
    }

    #[test]
    fn rows_outside_every_partition_are_ignored() {
        let covered = Uuid::now_v7();
        let rows = vec![
            row(covered, "DETECTION", Some(100.0)),
            row(Uuid::now_v7(), "DETECTION", Some(0.0)),
        ];
        let partitions = BTreeMap::from([((), vec![covered])]);

        let reports = results_by_partition(&partitions, &rows);

        assert_eq!(reports[&()][0].status, ExpectationStatus::Success);
    }

    #[test]
    fn partitions_with_no_rows_report_nothing() {
        let partitions = BTreeMap::from([("empty".to_string(), vec![Uuid::now_v7()])]);

        let reports = results_by_partition(&partitions, &[]);

        assert!(reports["empty"].is_empty());
    }

    #[test]
    fn one_inject_feeds_every_pattern_it_exercises() {
        let inject = inject(&["T1059", "T1027"]);
        let rows = vec![row(inject.id, "DETECTION", Some(100.0))];

        let reports = results_by_attack_pattern(std::slice::from_ref(&inject), &rows);

        assert_eq!(reports.len(), 2);
        assert_eq!(reports["T1059"][0].status, ExpectationStatus::Success);
        assert_eq!(reports["T1027"][0].status, ExpectationStatus::Success);
    }

    #[test]
    fn injects_without_contract_or_patterns_appear_in_no_group() {
        let bare = Inject {
            id: Uuid::now_v7(),
            title: "Tabletop notification".to_string(),
            contract: None,
            status: None,
        };
        let unmapped = inject(&[]);
        let rows = vec![
            row(bare.id, "DETECTION", Some(100.0)),
            row(unmapped.id, "DETECTION", Some(0.0)),
        ];

        let reports = results_by_attack_pattern(&[bare, unmapped], &rows);

        assert!(reports.is_empty());
    }
}
