//! Attribute importance aggregation across trees.

/// An attribute with its aggregated importance and rank.
#[derive(Debug, Clone, serde::Serialize)]
pub struct RankedAttribute {
    /// Attribute column name.
    pub name: String,
    /// Normalized importance (sums to 1.0 across attributes when any split gained).
    pub importance: f64,
    /// 1-based rank (1 = most important).
    pub rank: usize,
}

/// Sum per-tree importances, normalize, and rank descending.
///
/// Equal importances keep column order.
pub(crate) fn aggregate_importances(per_tree: &[Vec<f64>], names: &[String]) -> Vec<RankedAttribute> {
    if per_tree.is_empty() || names.is_empty() {
        return vec![];
    }

    let mut totals = vec![0.0f64; names.len()];
    for tree in per_tree {
        for (total, &value) in totals.iter_mut().zip(tree) {
            *total += value;
        }
    }

    let sum: f64 = totals.iter().sum();
    if sum > 0.0 {
        totals.iter_mut().for_each(|v| *v /= sum);
    }

    let mut ranked: Vec<RankedAttribute> = names
        .iter()
        .zip(totals)
        .map(|(name, importance)| RankedAttribute {
            name: name.clone(),
            importance,
            rank: 0,
        })
        .collect();
    ranked.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    for (i, attribute) in ranked.iter_mut().enumerate() {
        attribute.rank = i + 1;
    }
    ranked
}
