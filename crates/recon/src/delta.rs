//! Year-over-year unit price deltas.

use std::collections::BTreeMap;

use crate::model::{MatchedGroup, PriceDelta, PriceDeltaSeries, SeriesPoint};

/// Relative change from `earlier` to `later`, or `None` when there is no
/// positive baseline to divide by.
pub fn pct_change(earlier: f64, later: f64) -> Option<f64> {
    if earlier > 0.0 && earlier.is_finite() && later.is_finite() {
        Some((later - earlier) / earlier)
    } else {
        None
    }
}

/// Ratio → percentage, rounded half away from zero to 2 decimals.
pub fn round_pct(ratio: f64) -> f64 {
    (ratio * 100.0 * 100.0).round() / 100.0
}

pub fn price_delta(from_label: &str, from_price: f64, to_label: &str, to_price: f64) -> PriceDelta {
    let delta = pct_change(from_price, to_price);
    PriceDelta {
        from_label: from_label.to_string(),
        to_label: to_label.to_string(),
        from_price,
        to_price,
        delta,
        delta_pct: delta.map(round_pct),
    }
}

/// One series per contractor that priced this key in two or more catalogs.
/// Duplicate rows within a catalog are averaged into one point.
pub fn delta_series(group: &MatchedGroup) -> Vec<PriceDeltaSeries> {
    let mut series = Vec::new();

    for contractor_key in group.contractor_keys() {
        // catalog_index → (label, prices)
        let mut per_catalog: BTreeMap<usize, (&str, Vec<f64>)> = BTreeMap::new();
        let mut display_name = "";
        for o in group.observations.iter().filter(|o| o.contractor_key == contractor_key) {
            if display_name.is_empty() {
                display_name = &o.item.contractor;
            }
            per_catalog
                .entry(o.catalog_index)
                .or_insert_with(|| (o.catalog_label.as_str(), Vec::new()))
                .1
                .push(o.item.unit_price);
        }

        if per_catalog.len() < 2 {
            continue;
        }

        let points: Vec<SeriesPoint> = per_catalog
            .into_values()
            .map(|(label, prices)| SeriesPoint {
                catalog_label: label.to_string(),
                unit_price: mean(&prices),
                observations: prices.len(),
            })
            .collect();

        let steps: Vec<PriceDelta> = points
            .windows(2)
            .map(|w| price_delta(&w[0].catalog_label, w[0].unit_price, &w[1].catalog_label, w[1].unit_price))
            .collect();

        let first = &points[0];
        let last = &points[points.len() - 1];
        let overall = price_delta(&first.catalog_label, first.unit_price, &last.catalog_label, last.unit_price);

        series.push(PriceDeltaSeries {
            key: group.key.clone(),
            section: group.section.clone(),
            description: group.description.clone(),
            unit: group.unit.clone(),
            contractor: display_name.to_string(),
            points,
            steps,
            overall,
        });
    }

    series
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::MatchKey;
    use crate::model::{LineItem, Observation};

    fn obs(catalog_index: usize, label: &str, contractor: &str, price: f64) -> Observation {
        Observation {
            catalog_index,
            catalog_label: label.into(),
            contractor_key: contractor.to_lowercase(),
            item: LineItem {
                source_file: format!("{label}.csv"),
                row: 2,
                line_no: None,
                section: "Paving".into(),
                contractor: contractor.into(),
                description: "Asphalt".into(),
                unit: "SY".into(),
                quantity: 100.0,
                unit_price: price,
                extended_price: 100.0 * price,
                incomplete: false,
            },
        }
    }

    fn group(observations: Vec<Observation>) -> MatchedGroup {
        MatchedGroup {
            key: MatchKey::new("Paving", "Asphalt", "SY"),
            section: "Paving".into(),
            description: "Asphalt".into(),
            unit: "SY".into(),
            observations,
        }
    }

    #[test]
    fn pct_change_zero_baseline_is_undefined() {
        assert_eq!(pct_change(0.0, 12.0), None);
        assert_eq!(pct_change(0.0, 0.0), None);
        assert_eq!(pct_change(10.0, 12.0), Some(0.2));
    }

    #[test]
    fn rounding_is_half_away_from_zero() {
        assert_eq!(round_pct(0.2), 20.0);
        assert_eq!(round_pct(1.0 / 3.0), 33.33);
        assert_eq!(round_pct(-0.123456), -12.35);
    }

    #[test]
    fn twenty_percent_increase() {
        let g = group(vec![obs(0, "2023", "Acme", 10.0), obs(1, "2024", "Acme", 12.0)]);
        let series = delta_series(&g);
        assert_eq!(series.len(), 1);
        let s = &series[0];
        assert_eq!(s.contractor, "Acme");
        assert_eq!(s.points.len(), 2);
        assert_eq!(s.steps.len(), 1);
        assert_eq!(s.overall.delta_pct, Some(20.0));
        assert!((s.overall.delta.unwrap() - 0.2).abs() < 1e-12);
    }

    #[test]
    fn zero_baseline_step_is_undefined_not_zero() {
        let g = group(vec![obs(0, "2023", "Acme", 0.0), obs(1, "2024", "Acme", 12.0)]);
        let s = &delta_series(&g)[0];
        assert_eq!(s.overall.delta, None);
        assert_eq!(s.overall.delta_pct, None);
    }

    #[test]
    fn single_catalog_contractors_have_no_series() {
        let g = group(vec![obs(0, "2024", "Acme", 10.0), obs(0, "2024", "Beta", 11.0)]);
        assert!(delta_series(&g).is_empty());
    }

    #[test]
    fn duplicates_are_averaged_not_summed() {
        let g = group(vec![
            obs(0, "2023", "Acme", 10.0),
            obs(0, "2023", "Acme", 12.0),
            obs(1, "2024", "Acme", 22.0),
        ]);
        let s = &delta_series(&g)[0];
        assert_eq!(s.points[0].unit_price, 11.0);
        assert_eq!(s.points[0].observations, 2);
        assert_eq!(s.overall.delta_pct, Some(100.0));
    }

    #[test]
    fn three_catalogs_give_steps_and_overall() {
        let g = group(vec![
            obs(0, "2022", "Acme", 10.0),
            obs(1, "2023", "Acme", 0.0),
            obs(2, "2024", "Acme", 15.0),
        ]);
        let s = &delta_series(&g)[0];
        assert_eq!(s.steps.len(), 2);
        assert_eq!(s.steps[0].delta_pct, Some(-100.0));
        assert_eq!(s.steps[1].delta, None);
        assert_eq!(s.overall.from_label, "2022");
        assert_eq!(s.overall.to_label, "2024");
        assert_eq!(s.overall.delta_pct, Some(50.0));
    }
}
