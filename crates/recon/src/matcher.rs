use std::collections::BTreeMap;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::filter::FilteredView;
use crate::key::MatchKey;
use crate::model::{DuplicateMatchWarning, MatchedGroup, MatchedGroups, Observation};

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MatchOptions {
    /// Emit keys contributed by a single (catalog, contractor) pair as groups.
    #[serde(default)]
    pub include_singletons: bool,
}

/// Align line items across catalogs by match key.
///
/// Groups come out ordered by key. Inside a group, observations keep
/// catalog order, then row order. Duplicate rows for one (catalog,
/// contractor, key) are all kept and reported.
pub fn match_catalogs(view: &FilteredView<'_>, options: &MatchOptions) -> MatchedGroups {
    let mut by_key: BTreeMap<MatchKey, Vec<Observation>> = BTreeMap::new();

    for (catalog_index, cv) in view.catalogs.iter().enumerate() {
        for item in &cv.items {
            by_key.entry(item.match_key()).or_default().push(Observation {
                catalog_index,
                catalog_label: cv.label().to_string(),
                contractor_key: item.contractor_key(),
                item: (*item).clone(),
            });
        }
    }

    let mut out = MatchedGroups {
        catalog_labels: view.catalogs.iter().map(|c| c.label().to_string()).collect(),
        ..MatchedGroups::default()
    };

    for (key, observations) in by_key {
        out.warnings.extend(find_duplicates(&key, &observations));

        let first = &observations[0].item;
        let group = MatchedGroup {
            section: first.section.clone(),
            description: first.description.clone(),
            unit: first.unit.clone(),
            key,
            observations,
        };

        if group.pair_count() > 1 || options.include_singletons {
            out.groups.push(group);
        } else {
            out.singletons.push(group);
        }
    }

    for w in &out.warnings {
        warn!(
            "{}: contractor '{}' lists '{}' {} times (rows {:?})",
            w.catalog_label,
            w.contractor,
            w.key,
            w.rows.len(),
            w.rows
        );
    }
    debug!(
        "matched {} catalogs: {} groups, {} singletons, {} duplicate warnings",
        out.catalog_labels.len(),
        out.groups.len(),
        out.singletons.len(),
        out.warnings.len()
    );

    out
}

fn find_duplicates(key: &MatchKey, observations: &[Observation]) -> Vec<DuplicateMatchWarning> {
    let mut pairs: BTreeMap<(usize, &str), Vec<&Observation>> = BTreeMap::new();
    for o in observations {
        pairs.entry((o.catalog_index, o.contractor_key.as_str())).or_default().push(o);
    }

    pairs
        .into_values()
        .filter(|obs| obs.len() > 1)
        .map(|obs| DuplicateMatchWarning {
            catalog_label: obs[0].catalog_label.clone(),
            source_file: obs[0].item.source_file.clone(),
            contractor: obs[0].item.contractor.clone(),
            key: key.clone(),
            rows: obs.iter().map(|o| o.item.row).collect(),
        })
        .collect()
}
