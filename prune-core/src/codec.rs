//! Compact and JSON encodings of [`TreeState`].
//!
//! The compact form is `"<seed>_p<id>,<id>,..."`, used as a shareable
//! `state` query parameter. The JSON form is `{"seed": .., "pruned": [..]}`.

use crate::error::StateError;
use crate::prune::PruneSet;
use crate::types::{NodeId, Seed};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Seed used when nothing (valid) was persisted.
pub const FALLBACK_SEED: Seed = 12345;

const PRUNED_MARKER: &str = "_p";

/// Everything needed to reproduce a pruned tree.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeState {
    pub seed: Seed,
    pub pruned: BTreeSet<NodeId>,
}

impl TreeState {
    pub fn new(seed: Seed, pruned: &PruneSet) -> Self {
        Self {
            seed,
            pruned: pruned.iter().collect(),
        }
    }

    pub fn fallback() -> Self {
        Self {
            seed: FALLBACK_SEED,
            pruned: BTreeSet::new(),
        }
    }

    pub fn prune_set(&self) -> PruneSet {
        PruneSet::from_ids(self.pruned.iter().copied())
    }

    pub fn to_json(&self) -> Result<String, StateError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parses the JSON form. Wrong types or missing fields are errors.
    pub fn from_json(text: &str) -> Result<Self, StateError> {
        Ok(serde_json::from_str(text)?)
    }
}

/// `"<seed>_p<ascending ids>"`. The id list is empty when nothing is pruned.
pub fn encode(seed: Seed, pruned: impl IntoIterator<Item = NodeId>) -> String {
    let ids: BTreeSet<NodeId> = pruned.into_iter().collect();
    let joined = ids
        .iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(",");
    format!("{seed}{PRUNED_MARKER}{joined}")
}

/// Parses the compact form leniently.
///
/// A missing or malformed seed falls back to [`FALLBACK_SEED`]; id tokens
/// that do not parse are skipped.
pub fn decode(text: &str) -> TreeState {
    let (seed_part, ids_part) = text.split_once(PRUNED_MARKER).unwrap_or((text, ""));

    let seed = match seed_part.trim().parse::<Seed>() {
        Ok(seed) => seed,
        Err(_) => {
            log::warn!("invalid seed {seed_part:?} in state, using {FALLBACK_SEED}");
            FALLBACK_SEED
        }
    };

    let pruned = ids_part
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| match s.parse::<NodeId>() {
            Ok(id) => Some(id),
            Err(_) => {
                log::warn!("skipping invalid pruned id {s:?}");
                None
            }
        })
        .collect();

    TreeState { seed, pruned }
}

/// Reads the `state` parameter out of a query string such as
/// `"?state=42_p7,9&view=solid"`. Without one, returns the fallback state.
pub fn state_from_query(query: &str) -> TreeState {
    query
        .trim_start_matches('?')
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| *key == "state")
        .map(|(_, value)| decode(&value.replace("%2C", ",").replace("%2c", ",")))
        .unwrap_or_else(TreeState::fallback)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_sorted_ids() {
        assert_eq!(encode(42, [9, 3, 17]), "42_p3,9,17");
        assert_eq!(encode(7, []), "7_p");
    }

    #[test]
    fn decode_inverts_encode() {
        let cases: Vec<(Seed, Vec<NodeId>)> = vec![
            (0, vec![]),
            (12345, vec![4, 5, 6, 7]),
            (-5, vec![3]),
            (i64::MAX, vec![1]),
            (i64::MIN, vec![]),
            (99, (1..500).step_by(7).collect()),
        ];
        for (seed, ids) in cases {
            let state = decode(&encode(seed, ids.iter().copied()));
            assert_eq!(state.seed, seed);
            assert_eq!(state.pruned, ids.into_iter().collect());
        }
    }

    #[test]
    fn malformed_seed_falls_back() {
        assert_eq!(decode("banana_p3,4").seed, FALLBACK_SEED);
        assert_eq!(decode("_p3").seed, FALLBACK_SEED);
        assert_eq!(decode("").seed, FALLBACK_SEED);
        assert_eq!(decode("4.5_p").seed, FALLBACK_SEED);
        assert_eq!(decode("banana_p3,4").pruned, BTreeSet::from([3, 4]));
    }

    #[test]
    fn negative_seeds_are_kept() {
        let state = decode("-5_p3");
        assert_eq!(state.seed, -5);
        assert_eq!(state.pruned, BTreeSet::from([3]));
        assert_eq!(encode(-5, [3]), "-5_p3");

        let parsed = TreeState::from_json(r#"{"seed": -5, "pruned": [3]}"#).unwrap();
        assert_eq!(parsed, state);
    }

    #[test]
    fn bad_ids_are_skipped() {
        let state = decode("10_p1,,x,3, 5");
        assert_eq!(state.seed, 10);
        assert_eq!(state.pruned, BTreeSet::from([1, 3, 5]));
    }

    #[test]
    fn seed_without_marker_is_accepted() {
        assert_eq!(decode("77"), TreeState {
            seed: 77,
            pruned: BTreeSet::new()
        });
    }

    #[test]
    fn query_parameter_is_found() {
        assert_eq!(state_from_query("?view=x&state=5_p1%2C2").seed, 5);
        assert_eq!(
            state_from_query("state=5_p1%2C2").pruned,
            BTreeSet::from([1, 2])
        );
        assert_eq!(state_from_query("?other=1"), TreeState::fallback());
    }

    #[test]
    fn json_round_trip_and_shape_errors() {
        let state = TreeState {
            seed: 31,
            pruned: BTreeSet::from([8, 2]),
        };
        let text = state.to_json().unwrap();
        assert!(text.contains("\"seed\": 31"));
        assert_eq!(TreeState::from_json(&text).unwrap(), state);

        let parsed = TreeState::from_json(r#"{"seed": 4, "pruned": [3, 3, 1]}"#).unwrap();
        assert_eq!(parsed.pruned, BTreeSet::from([1, 3]));

        for bad in [
            r#"{"seed": "4", "pruned": []}"#,
            r#"{"seed": 4, "pruned": "1,2"}"#,
            r#"{"seed": 4}"#,
            r#"{"seed": 1.5, "pruned": []}"#,
            "not json",
        ] {
            assert!(
                matches!(TreeState::from_json(bad), Err(StateError::Json(_))),
                "{bad} should be rejected"
            );
        }
    }
}
