use std::collections::HashMap;

use geo::Coord;
use serde::Deserialize;
use tracing::debug;

use crate::geometry::Projection;
use crate::inputs::MeasurementRegime;

/// One raw survey cluster as it appears in the summary JSON: lon/lat plus
/// per-vaccine positive/negative counts and rates for both measurement
/// regimes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterRecord {
    pub cluster_id: String,
    pub lon: f64,
    pub lat: f64,
    #[serde(default)]
    pub n: f64,
    #[serde(default)]
    pub ones_mr0: HashMap<String, f64>,
    #[serde(default)]
    pub ones_mr1: HashMap<String, f64>,
    #[serde(default)]
    pub zeros_mr0: HashMap<String, f64>,
    #[serde(default)]
    pub zeros_mr1: HashMap<String, f64>,
    #[serde(default)]
    pub rate_mr0: HashMap<String, f64>,
    #[serde(default)]
    pub rate_mr1: HashMap<String, f64>,
}

impl ClusterRecord {
    fn ones(&self, regime: MeasurementRegime, vaccine: &str) -> f64 {
        let table = match regime {
            MeasurementRegime::CardPlusRecall => &self.ones_mr1,
            MeasurementRegime::CardOnly => &self.ones_mr0,
        };
        table.get(vaccine).copied().unwrap_or(0.0)
    }

    fn zeros(&self, regime: MeasurementRegime, vaccine: &str) -> Option<f64> {
        let table = match regime {
            MeasurementRegime::CardPlusRecall => &self.zeros_mr1,
            MeasurementRegime::CardOnly => &self.zeros_mr0,
        };
        table.get(vaccine).copied()
    }

    fn rate(&self, regime: MeasurementRegime, vaccine: &str) -> Option<f64> {
        let table = match regime {
            MeasurementRegime::CardPlusRecall => &self.rate_mr1,
            MeasurementRegime::CardOnly => &self.rate_mr0,
        };
        table.get(vaccine).copied()
    }
}

/// Aggregate outcome counts for one vaccine under one regime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct OutcomeTotals {
    pub n: f64,
    pub ones: f64,
    pub zeros: f64,
    pub rate: f64,
}

/// Per-state slice of the cluster summary: records plus the precomputed
/// totals table keyed by vaccine then regime key ("mr0"/"mr1").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterData {
    #[serde(default)]
    pub clusters: Vec<ClusterRecord>,
    #[serde(default)]
    pub totals: HashMap<String, HashMap<String, OutcomeTotals>>,
}

/// One cluster projected into the viewport, ready for the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterPoint {
    pub cluster_id: String,
    pub position: Coord<f64>,
    pub ones: f64,
    pub zeros: f64,
    pub n: f64,
    pub rate: f64,
    pub radius: f64,
    pub majority: bool,
}

/// The cluster layer for one render: projected points, aggregate totals,
/// and the unweighted mean of per-cluster rates. Derived fresh per render.
#[derive(Debug, Clone)]
pub struct ClusterView {
    pub regime: MeasurementRegime,
    pub points: Vec<ClusterPoint>,
    pub totals: OutcomeTotals,
    pub cluster_mean: f64,
}

impl ClusterView {
    /// A view with no survey records, for renders without cluster data.
    pub fn empty(regime: MeasurementRegime) -> Self {
        Self { regime, points: Vec::new(), totals: OutcomeTotals::default(), cluster_mean: 0.0 }
    }
}

/// Project survey records into the viewport and compute coverage figures.
///
/// Records with non-finite coordinates (before or after projection) are
/// omitted, never fatal. Totals prefer the dataset's precomputed table;
/// otherwise they are summed over the kept points.
pub fn build_cluster_view(
    data: &ClusterData,
    vaccine: &str,
    regime: MeasurementRegime,
    projection: &Projection,
) -> ClusterView {
    let max_n = data
        .clusters
        .iter()
        .map(|c| if c.n.is_finite() { c.n } else { 1.0 })
        .fold(1.0, f64::max);

    let mut points = Vec::new();
    let mut rate_sum = 0.0;

    for record in &data.clusters {
        if !(record.lon.is_finite() && record.lat.is_finite()) {
            continue;
        }
        let position = projection.apply(record.lon, record.lat);
        if !(position.x.is_finite() && position.y.is_finite()) {
            continue;
        }

        let n = record.n;
        let ones = record.ones(regime, vaccine);
        let zeros = match record.zeros(regime, vaccine) {
            Some(z) if z.is_finite() && z >= 0.0 => z,
            _ => (n - ones).max(0.0),
        };
        let rate = match record.rate(regime, vaccine) {
            Some(r) if r.is_finite() => r,
            _ if n > 0.0 => ones / n,
            _ => 0.0,
        };

        let radius = 1.4 + 3.9 * (n.max(1.0) / max_n).sqrt();
        rate_sum += rate;

        points.push(ClusterPoint {
            cluster_id: record.cluster_id.clone(),
            position,
            ones,
            zeros,
            n,
            rate,
            radius,
            majority: ones >= zeros,
        });
    }

    let totals = data
        .totals
        .get(vaccine)
        .and_then(|per_regime| per_regime.get(regime.key()))
        .copied()
        .unwrap_or_else(|| {
            let mut totals = OutcomeTotals::default();
            for point in &points {
                totals.n += point.n;
                totals.ones += point.ones;
                totals.zeros += point.zeros;
            }
            totals.rate = if totals.n > 0.0 { totals.ones / totals.n } else { 0.0 };
            totals
        });

    let cluster_mean = if points.is_empty() { 0.0 } else { rate_sum / points.len() as f64 };
    debug!(kept = points.len(), dropped = data.clusters.len() - points.len(), "built cluster view");

    ClusterView { regime, points, totals, cluster_mean }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_projection() -> Projection {
        Projection { min_lon: 77.0, max_lat: 29.0, scale: 100.0, x_pad: 12.0, y_pad: 12.0 }
    }

    fn record(id: &str, lon: f64, lat: f64, n: f64, ones: f64) -> ClusterRecord {
        ClusterRecord {
            cluster_id: id.to_string(),
            lon,
            lat,
            n,
            ones_mr1: HashMap::from([("MCV1".to_string(), ones)]),
            ..ClusterRecord::default()
        }
    }

    #[test]
    fn projects_and_keeps_finite_records() {
        let data = ClusterData {
            clusters: vec![
                record("c1", 77.5, 28.5, 20.0, 15.0),
                record("c2", f64::NAN, 28.0, 10.0, 5.0),
            ],
            totals: HashMap::new(),
        };

        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        assert_eq!(view.points.len(), 1);
        let p = &view.points[0];
        assert!((p.position.x - 62.0).abs() < 1e-9);
        assert!((p.position.y - 62.0).abs() < 1e-9);
    }

    #[test]
    fn zeros_fall_back_to_n_minus_ones() {
        let data = ClusterData {
            clusters: vec![record("c1", 77.5, 28.5, 20.0, 15.0)],
            totals: HashMap::new(),
        };
        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        let p = &view.points[0];
        assert_eq!(p.zeros, 5.0);
        assert!((p.rate - 0.75).abs() < 1e-12);
        assert!(p.majority);
    }

    #[test]
    fn radius_is_monotone_in_sample_size_and_bounded() {
        let data = ClusterData {
            clusters: vec![
                record("small", 77.1, 28.1, 5.0, 1.0),
                record("big", 77.2, 28.2, 80.0, 40.0),
            ],
            totals: HashMap::new(),
        };
        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        let small = view.points.iter().find(|p| p.cluster_id == "small").unwrap();
        let big = view.points.iter().find(|p| p.cluster_id == "big").unwrap();

        assert!(small.radius < big.radius);
        // max-n cluster pins the upper bound of the encoding.
        assert!((big.radius - 5.3).abs() < 1e-9);
        assert!(small.radius >= 1.4);
    }

    #[test]
    fn totals_prefer_the_precomputed_table() {
        let precomputed = OutcomeTotals { n: 1000.0, ones: 800.0, zeros: 200.0, rate: 0.8 };
        let data = ClusterData {
            clusters: vec![record("c1", 77.5, 28.5, 20.0, 15.0)],
            totals: HashMap::from([(
                "MCV1".to_string(),
                HashMap::from([("mr1".to_string(), precomputed)]),
            )]),
        };
        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        assert_eq!(view.totals, precomputed);
    }

    #[test]
    fn totals_sum_over_kept_points_when_table_is_missing() {
        let data = ClusterData {
            clusters: vec![
                record("c1", 77.5, 28.5, 20.0, 15.0),
                record("c2", 77.6, 28.6, 10.0, 2.0),
            ],
            totals: HashMap::new(),
        };
        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        assert_eq!(view.totals.n, 30.0);
        assert_eq!(view.totals.ones, 17.0);
        assert_eq!(view.totals.zeros, 13.0);
        assert!((view.totals.rate - 17.0 / 30.0).abs() < 1e-12);
    }

    #[test]
    fn cluster_mean_is_unweighted() {
        let data = ClusterData {
            clusters: vec![
                record("c1", 77.5, 28.5, 100.0, 100.0), // rate 1.0
                record("c2", 77.6, 28.6, 10.0, 0.0),    // rate 0.0
            ],
            totals: HashMap::new(),
        };
        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        // Population-weighted would be 100/110; the cluster mean is 0.5.
        assert!((view.cluster_mean - 0.5).abs() < 1e-12);
    }

    #[test]
    fn unknown_vaccine_key_yields_zero_counts() {
        let data = ClusterData {
            clusters: vec![record("c1", 77.5, 28.5, 20.0, 15.0)],
            totals: HashMap::new(),
        };
        let view = build_cluster_view(&data, "DPT3", MeasurementRegime::CardPlusRecall, &test_projection());
        let p = &view.points[0];
        assert_eq!(p.ones, 0.0);
        assert_eq!(p.zeros, 20.0);
        assert_eq!(p.rate, 0.0);
    }

    #[test]
    fn regime_selects_the_matching_field_set() {
        let mut rec = record("c1", 77.5, 28.5, 20.0, 15.0);
        rec.ones_mr0 = HashMap::from([("MCV1".to_string(), 4.0)]);
        let data = ClusterData { clusters: vec![rec], totals: HashMap::new() };

        let mr0 = build_cluster_view(&data, "MCV1", MeasurementRegime::CardOnly, &test_projection());
        assert_eq!(mr0.points[0].ones, 4.0);
        let mr1 = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        assert_eq!(mr1.points[0].ones, 15.0);
    }

    #[test]
    fn deserializes_summary_json_shape() {
        let json = r#"{
            "clusters": [{
                "cluster_id": "UP-001",
                "lon": 80.1, "lat": 26.5, "n": 24,
                "ones_mr1": {"MCV1": 20}, "zeros_mr1": {"MCV1": 4},
                "rate_mr1": {"MCV1": 0.8333}
            }],
            "totals": {"MCV1": {"mr1": {"n": 24, "ones": 20, "zeros": 4, "rate": 0.8333}}}
        }"#;

        let data: ClusterData = serde_json::from_str(json).unwrap();
        assert_eq!(data.clusters.len(), 1);
        assert_eq!(data.clusters[0].n, 24.0);
        let view = build_cluster_view(&data, "MCV1", MeasurementRegime::CardPlusRecall, &test_projection());
        assert_eq!(view.totals.n, 24.0);
    }
}
