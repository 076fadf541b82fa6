use crate::delta::mean;
use crate::model::{MatchedGroup, UnitPriceStats};

/// Unit price distribution over every observation in a group, duplicates
/// included as separate observations.
pub fn unit_price_stats(group: &MatchedGroup) -> UnitPriceStats {
    let prices: Vec<f64> = group.observations.iter().map(|o| o.item.unit_price).collect();
    let n = prices.len();
    let avg = mean(&prices);

    let variance = (n > 1).then(|| prices.iter().map(|p| (p - avg).powi(2)).sum::<f64>() / n as f64);

    UnitPriceStats {
        key: group.key.clone(),
        section: group.section.clone(),
        description: group.description.clone(),
        unit: group.unit.clone(),
        observations: n,
        mean: avg,
        variance,
        std_dev: variance.map(f64::sqrt),
        min: prices.iter().copied().fold(f64::INFINITY, f64::min),
        max: prices.iter().copied().fold(f64::NEG_INFINITY, f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::MatchKey;
    use crate::model::{LineItem, Observation};

    fn group(prices: &[f64]) -> MatchedGroup {
        let observations = prices
            .iter()
            .enumerate()
            .map(|(i, &p)| Observation {
                catalog_index: i,
                catalog_label: format!("{}", 2020 + i),
                contractor_key: "acme".into(),
                item: LineItem {
                    source_file: "bids.csv".into(),
                    row: 2 + i,
                    line_no: None,
                    section: "Paving".into(),
                    contractor: "Acme".into(),
                    description: "Asphalt".into(),
                    unit: "SY".into(),
                    quantity: 1.0,
                    unit_price: p,
                    extended_price: p,
                    incomplete: false,
                },
            })
            .collect();
        MatchedGroup {
            key: MatchKey::new("Paving", "Asphalt", "SY"),
            section: "Paving".into(),
            description: "Asphalt".into(),
            unit: "SY".into(),
            observations,
        }
    }

    #[test]
    fn population_variance() {
        let s = unit_price_stats(&group(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]));
        assert_eq!(s.observations, 8);
        assert_eq!(s.mean, 5.0);
        assert_eq!(s.variance, Some(4.0));
        assert_eq!(s.std_dev, Some(2.0));
        assert_eq!(s.min, 2.0);
        assert_eq!(s.max, 9.0);
    }

    #[test]
    fn single_observation_variance_is_undefined() {
        let s = unit_price_stats(&group(&[12.5]));
        assert_eq!(s.mean, 12.5);
        assert_eq!(s.variance, None);
        assert_eq!(s.std_dev, None);
        assert_eq!(s.min, 12.5);
        assert_eq!(s.max, 12.5);
    }

    #[test]
    fn identical_prices_have_zero_variance() {
        let s = unit_price_stats(&group(&[10.0, 10.0]));
        assert_eq!(s.variance, Some(0.0));
    }
}
