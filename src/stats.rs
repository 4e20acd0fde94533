//! Column statistics used for imputation.

use crate::table::Value;
use ordered_float::OrderedFloat;
use std::collections::HashMap;

/// Median of the numeric, non-null cells. Even counts average the two middle values.
///
/// Returns `None` when no cell is numeric.
pub fn median<'a>(cells: impl IntoIterator<Item = &'a Value>) -> Option<f64> {
    let mut xs: Vec<OrderedFloat<f64>> = cells
        .into_iter()
        .filter_map(Value::to_f64)
        .map(OrderedFloat)
        .collect();
    if xs.is_empty() {
        return None;
    }
    xs.sort_unstable();
    let mid = xs.len() / 2;
    if xs.len() % 2 == 1 {
        Some(xs[mid].0)
    } else {
        Some((xs[mid - 1].0 + xs[mid].0) / 2.0)
    }
}

/// Most frequent non-null cell. Ties go to the smallest value, comparing
/// numerically when both candidates are numbers and textually otherwise.
///
/// Returns `None` when every cell is null.
pub fn mode<'a>(cells: impl IntoIterator<Item = &'a Value>) -> Option<Value> {
    let mut counts: HashMap<String, (usize, &Value)> = HashMap::new();
    for v in cells {
        if let Some(k) = v.key() {
            counts.entry(k).or_insert((0, v)).0 += 1;
        }
    }
    counts
        .into_iter()
        .max_by(|(ka, (na, va)), (kb, (nb, vb))| {
            na.cmp(nb).then_with(|| match (va.to_f64(), vb.to_f64()) {
                (Some(a), Some(b)) => OrderedFloat(b).cmp(&OrderedFloat(a)),
                _ => kb.cmp(ka),
            })
        })
        .map(|(_, (_, v))| v.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vals(xs: &[&str]) -> Vec<Value> {
        xs.iter().map(|s| Value::from_raw(s)).collect()
    }

    #[test]
    fn median_ignores_nulls_and_averages_even_counts() {
        assert_eq!(median(&vals(&["0.5", "", "0.7"])), Some(0.6));
        assert_eq!(median(&vals(&["3", "1", "2"])), Some(2.0));
        assert_eq!(median(&vals(&["", "NaN"])), None);
    }

    #[test]
    fn mode_prefers_smallest_on_ties() {
        assert_eq!(mode(&vals(&["W", "L", "W", "L"])), Some(Value::from("L")));
        assert_eq!(mode(&vals(&["W", "W", "L"])), Some(Value::from("W")));
        assert_eq!(mode(&vals(&["10", "9"])), Some(Value::from("9")));
        assert_eq!(mode(&vals(&["", ""])), None);
    }
}
