//! Read-model response types computed from active records.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One reading in a trend series.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TrendPoint {
    pub public_id: String,
    pub taken_at: DateTime<Utc>,
    pub value: f64,
    pub unit: String,
}

/// Aggregate over an owner's active readings for one test name.
///
/// Points are ordered oldest to newest. Statistics are `None` when there are
/// no active readings.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TrendSummary {
    pub test_name: String,
    pub points: Vec<TrendPoint>,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub mean: Option<f64>,
    pub latest: Option<TrendPoint>,
}

impl TrendSummary {
    /// Build a summary from points already ordered oldest to newest.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn from_points(test_name: impl Into<String>, points: Vec<TrendPoint>) -> Self {
        let values = points.iter().map(|p| p.value);
        let min = values.clone().reduce(f64::min);
        let max = values.clone().reduce(f64::max);
        let mean = if points.is_empty() {
            None
        } else {
            Some(values.sum::<f64>() / points.len() as f64)
        };
        let latest = points.last().cloned();
        Self {
            test_name: test_name.into(),
            points,
            min,
            max,
            mean,
            latest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now_utc;

    fn point(id: &str, value: f64) -> TrendPoint {
        TrendPoint {
            public_id: id.into(),
            taken_at: now_utc(),
            value,
            unit: "mmol/L".into(),
        }
    }

    #[test]
    fn summary_statistics() {
        let summary = TrendSummary::from_points(
            "LDL",
            vec![point("a", 3.0), point("b", 2.0), point("c", 4.0)],
        );
        assert_eq!(summary.min, Some(2.0));
        assert_eq!(summary.max, Some(4.0));
        assert_eq!(summary.mean, Some(3.0));
        assert_eq!(summary.latest.map(|p| p.public_id), Some("c".to_string()));
    }

    #[test]
    fn empty_summary_has_no_statistics() {
        let summary = TrendSummary::from_points("LDL", Vec::new());
        assert!(summary.points.is_empty());
        assert!(summary.min.is_none());
        assert!(summary.mean.is_none());
        assert!(summary.latest.is_none());
    }
}
