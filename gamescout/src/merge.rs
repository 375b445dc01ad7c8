//! Reconciliation of multi-source scans.
//!
//! Some platforms are observed twice: once from local install data ("what
//! is on this disk") and once from a remote catalog ("what the store knows
//! about"). [`merge_sources`] folds the two identity-keyed outcome maps
//! into one, with explicit field-level precedence: no reflection, no
//! dynamic copying, every field's owner written down here.
//!
//! The merge is pure and deterministic: it reads nothing but its inputs,
//! and re-running it on the same inputs yields the same output.

use std::collections::HashMap;

use crate::outcome::Outcome;
use crate::record::{GameId, GameRecord};

/// Merge the installed-source and remote-source views of one platform.
///
/// - Identity in both, both records: one merged record via
///   [`merge_records`].
/// - Either side an error: the merged entry is that error. Installed-side
///   errors take precedence, a broken local read being more actionable than
///   an absent remote listing.
/// - Identity in one source only: passes through unchanged.
pub fn merge_sources(
    installed: HashMap<GameId, Outcome>,
    remote: HashMap<GameId, Outcome>,
) -> HashMap<GameId, Outcome> {
    let mut merged = installed;

    for (id, remote_outcome) in remote {
        match merged.remove(&id) {
            None => {
                merged.insert(id, remote_outcome);
            }
            Some(installed_outcome) => {
                let combined = match (installed_outcome, remote_outcome) {
                    (Outcome::Game(local), Outcome::Game(catalog)) => {
                        Outcome::Game(merge_records(local, catalog))
                    }
                    // An installed-side error always wins the slot.
                    (Outcome::Error(error), _) => Outcome::Error(error),
                    (Outcome::Game(_), Outcome::Error(error)) => Outcome::Error(error),
                };
                merged.insert(id, combined);
            }
        }
    }

    merged
}

/// Combine one identity's installed-side and remote-side records.
///
/// Runtime/local fields come from the installed side; catalog fields come
/// from the remote side. The owner of every field is explicit:
///
/// | installed side                | remote side        |
/// |-------------------------------|--------------------|
/// | install path, installed flag  | owned flag         |
/// | installed version             | default version    |
/// | install / last-run dates      | description        |
/// | run count                     | publisher          |
/// | launch, launch args, uninstall| homepage, support  |
///
/// The name comes from the installed side, falling back to the remote side
/// when the installed record has none. Problem sets union (installed side
/// first); metadata unions per key with installed-side precedence.
pub fn merge_records(local: GameRecord, catalog: GameRecord) -> GameRecord {
    let mut merged = local;

    if merged.name.is_empty() {
        merged.name = catalog.name;
    }

    merged.owned = catalog.owned;
    merged.default_version = catalog.default_version;
    merged.description = catalog.description;
    merged.publisher = catalog.publisher;
    merged.homepage = catalog.homepage;
    merged.support_url = catalog.support_url;

    for problem in catalog.problems {
        if !merged.problems.contains(&problem) {
            merged.problems.push(problem);
        }
    }
    for (key, values) in catalog.metadata {
        merged.metadata.entry(key).or_insert(values);
    }

    merged
}
