//! Path resolver invariants

use std::collections::BTreeSet;
use std::path::Path;

use proptest::prelude::*;

use campus_nav::locale::{LocaleDataset, LocaleStore, PathRecord};
use campus_nav::navigation::{reverse_and_mirror, EdgeOrientation, PathResolver, ReversePolicy};
use campus_nav::NavError;

const NAMES: [&str; 6] = [
    "Main Gate",
    "Library",
    "AKCNB",
    "Girls Hostel",
    "Parking Lot",
    "VIIT Store",
];

fn mirror_pairs() -> Vec<(String, String)> {
    vec![
        ("left".to_string(), "right".to_string()),
        ("Left".to_string(), "Right".to_string()),
    ]
}

fn step_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(
        prop::sample::select(vec!["walk", "turn", "left", "right", "Left", "Right", "stairs", "(milestone)"]),
        1..6,
    )
    .prop_map(|words| words.join(" "))
}

/// Paths with at most one record per orientation of each pair
fn paths_strategy() -> impl Strategy<Value = Vec<PathRecord>> {
    prop::collection::btree_set((0..NAMES.len(), 0..NAMES.len()), 0..12).prop_flat_map(|edges| {
        let edges: Vec<(usize, usize)> = edges.into_iter().filter(|(a, b)| a != b).collect();
        let count = edges.len();
        prop::collection::vec(prop::collection::vec(step_strategy(), 1..5), count).prop_map(
            move |directions| {
                edges
                    .iter()
                    .zip(directions)
                    .map(|((a, b), dirs)| PathRecord::new(NAMES[*a], NAMES[*b], dirs))
                    .collect()
            },
        )
    })
}

fn policy_strategy() -> impl Strategy<Value = ReversePolicy> {
    prop_oneof![
        Just(ReversePolicy::ReuseAsIs),
        Just(ReversePolicy::ReverseAndMirror)
    ]
}

proptest! {
    #[test]
    fn exact_orientation_is_stable(paths in paths_strategy(), policy in policy_strategy()) {
        let resolver = PathResolver::new(policy);
        for record in &paths {
            let route = resolver
                .resolve(&paths, &mirror_pairs(), &record.from, &record.to)
                .unwrap();
            prop_assert_eq!(route.orientation, EdgeOrientation::Direct);
            prop_assert_eq!(&route.record, record);
        }
    }

    #[test]
    fn unconnected_pairs_are_not_found(paths in paths_strategy(), policy in policy_strategy()) {
        let resolver = PathResolver::new(policy);
        let connected: BTreeSet<(String, String)> = paths
            .iter()
            .flat_map(|p| [(p.from.clone(), p.to.clone()), (p.to.clone(), p.from.clone())])
            .collect();

        for from in NAMES {
            for to in NAMES {
                if from == to || connected.contains(&(from.to_string(), to.to_string())) {
                    continue;
                }
                let err = resolver.resolve(&paths, &mirror_pairs(), from, to).unwrap_err();
                let is_not_found = matches!(err, NavError::NoPathFound { .. });
                prop_assert!(is_not_found);
            }
        }
    }

    #[test]
    fn reverse_only_edges_follow_policy(paths in paths_strategy(), policy in policy_strategy()) {
        let resolver = PathResolver::new(policy);
        for record in &paths {
            if paths.iter().any(|p| p.connects(&record.to, &record.from)) {
                continue;
            }
            let route = resolver
                .resolve(&paths, &mirror_pairs(), &record.to, &record.from)
                .unwrap();
            prop_assert_eq!(route.orientation, EdgeOrientation::Reversed);
            prop_assert_eq!(&route.record.from, &record.to);
            prop_assert_eq!(&route.record.to, &record.from);

            let expected = match policy {
                ReversePolicy::ReuseAsIs => record.directions.clone(),
                ReversePolicy::ReverseAndMirror => {
                    reverse_and_mirror(&record.directions, &mirror_pairs())
                }
            };
            prop_assert_eq!(&route.record.directions, &expected);
        }
    }

    #[test]
    fn mirroring_twice_restores_directions(directions in prop::collection::vec(step_strategy(), 1..8)) {
        let once = reverse_and_mirror(&directions, &mirror_pairs());
        let twice = reverse_and_mirror(&once, &mirror_pairs());
        prop_assert_eq!(twice, directions);
    }
}

// ============================================================================
// Fixture tests
// ============================================================================

fn fixture() -> LocaleDataset {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/campus.yaml");
    LocaleDataset::load_from_file(&path).unwrap()
}

#[test]
fn test_fixture_reverse_reused_as_is() {
    let dataset = fixture();
    let route = PathResolver::new(ReversePolicy::ReuseAsIs)
        .resolve_in(&dataset, "Library", "Main Building")
        .unwrap();
    assert_eq!(route.orientation, EdgeOrientation::Reversed);
    assert_eq!(route.record.directions, dataset.paths[0].directions);
}

#[test]
fn test_fixture_reverse_mirrored() {
    let dataset = fixture();
    let route = PathResolver::new(ReversePolicy::ReverseAndMirror)
        .resolve_in(&dataset, "Library", "Main Building")
        .unwrap();
    assert_eq!(
        route.record.directions,
        vec![
            "The Library will be on your left",
            "Walk straight for 50 meters",
            "Turn right at the intersection",
            "Pass by the fountain (milestone)",
            "Turn left and walk straight for 100 meters",
            "Exit the Main Building through the front entrance",
        ]
    );
}

#[test]
fn test_builtin_typo_edge_matches_case_insensitively() {
    let store = LocaleStore::builtin().unwrap();
    let route = PathResolver::default()
        .resolve_in(store.get("en"), "AKCNB", "Main Gate")
        .unwrap();
    assert_eq!(route.orientation, EdgeOrientation::Direct);
    // Stored spelling is returned unmodified
    assert_eq!(route.record.to, "Main gate");
}

#[test]
fn test_builtin_reverse_edge() {
    let store = LocaleStore::builtin().unwrap();
    let dataset = store.get("en");
    let route = PathResolver::default()
        .resolve_in(dataset, "VIIT Store", "Main Gate")
        .unwrap();
    assert_eq!(route.orientation, EdgeOrientation::Reversed);
    let stored = dataset
        .paths
        .iter()
        .find(|p| p.connects("Main Gate", "VIIT Store"))
        .unwrap();
    assert_eq!(route.record.directions, stored.directions);
}

#[test]
fn test_every_builtin_path_resolves_to_itself() {
    let store = LocaleStore::builtin().unwrap();
    for code in store.codes() {
        let dataset = store.get(code);
        for record in &dataset.paths {
            let route = PathResolver::default()
                .resolve_in(dataset, &record.from, &record.to)
                .unwrap();
            assert_eq!(&route.record, record, "locale {}", code);
        }
    }
}
