//! Comparable company analysis.

use derive_more::Display;
use fathom_inputs::Mode;
use serde::{Deserialize, Serialize};

/// Message returned when no peers are supplied.
pub const NO_COMPARABLES_MESSAGE: &str = "No comparable company data provided.";

/// Last-twelve-month figures of a peer company.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableCompany {
    /// Peer name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_name: Option<String>,
    /// Enterprise value.
    #[serde(default)]
    pub enterprise_value: Option<f64>,
    /// LTM revenue.
    #[serde(default)]
    pub ltm_revenue: Option<f64>,
    /// LTM EBITDA.
    #[serde(default)]
    pub ltm_ebitda: Option<f64>,
    /// LTM net income.
    #[serde(default)]
    pub ltm_net_income: Option<f64>,
    /// Market capitalization.
    #[serde(default)]
    pub market_cap: Option<f64>,
}

/// A trading multiple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MultipleKind {
    /// Enterprise value over revenue.
    #[display("EV/Revenue")]
    EvToRevenue,
    /// Enterprise value over EBITDA.
    #[display("EV/EBITDA")]
    EvToEbitda,
    /// Market cap over net income.
    #[display("P/E")]
    PeRatio,
}

impl MultipleKind {
    /// Every multiple, in reporting order.
    pub const fn all() -> [Self; 3] {
        [Self::EvToRevenue, Self::EvToEbitda, Self::PeRatio]
    }
}

/// A peer with its computed multiples.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparableMultiples {
    /// The peer's inputs.
    #[serde(flatten)]
    pub company: ComparableCompany,
    /// EV / revenue.
    pub ev_to_revenue: Option<f64>,
    /// EV / EBITDA.
    pub ev_to_ebitda: Option<f64>,
    /// Market cap / net income.
    pub pe_ratio: Option<f64>,
}

impl ComparableMultiples {
    /// Compute the multiples of one peer.
    pub fn from_company(company: ComparableCompany) -> Self {
        Self {
            ev_to_revenue: ratio(company.enterprise_value, company.ltm_revenue),
            ev_to_ebitda: ratio(company.enterprise_value, company.ltm_ebitda),
            pe_ratio: ratio(company.market_cap, company.ltm_net_income),
            company,
        }
    }

    /// The value of one multiple, if defined.
    pub const fn get(&self, kind: MultipleKind) -> Option<f64> {
        match kind {
            MultipleKind::EvToRevenue => self.ev_to_revenue,
            MultipleKind::EvToEbitda => self.ev_to_ebitda,
            MultipleKind::PeRatio => self.pe_ratio,
        }
    }
}

/// `numerator / denominator` when both exist, the denominator is non-zero,
/// and the result is finite.
fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    if denominator == 0.0 {
        return None;
    }
    Some(numerator / denominator).filter(|value| value.is_finite())
}

/// Summary statistics of one multiple across peers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleStats {
    /// Arithmetic mean.
    pub mean: f64,
    /// Median; the mean of the middle pair for an even count.
    pub median: f64,
    /// Largest value.
    pub high: f64,
    /// Smallest value.
    pub low: f64,
    /// Number of peers with a defined value.
    pub count: usize,
}

impl MultipleStats {
    /// Statistics over `values`, or `None` when empty.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(f64::total_cmp);

        let count = sorted.len();
        let mid = count / 2;
        let median = if count % 2 == 0 {
            (sorted[mid - 1] + sorted[mid]) / 2.0
        } else {
            sorted[mid]
        };

        Some(Self {
            mean: sorted.iter().sum::<f64>() / count as f64,
            median,
            high: sorted[count - 1],
            low: sorted[0],
            count,
        })
    }
}

/// Statistics per multiple; multiples with no valid value are omitted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompsSummary {
    /// EV / revenue.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_to_revenue: Option<MultipleStats>,
    /// EV / EBITDA.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev_to_ebitda: Option<MultipleStats>,
    /// Market cap / net income.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<MultipleStats>,
}

impl CompsSummary {
    /// Statistics for one multiple.
    pub const fn get(&self, kind: MultipleKind) -> Option<&MultipleStats> {
        match kind {
            MultipleKind::EvToRevenue => self.ev_to_revenue.as_ref(),
            MultipleKind::EvToEbitda => self.ev_to_ebitda.as_ref(),
            MultipleKind::PeRatio => self.pe_ratio.as_ref(),
        }
    }

    /// Whether no multiple had a valid value.
    pub const fn is_empty(&self) -> bool {
        self.ev_to_revenue.is_none() && self.ev_to_ebitda.is_none() && self.pe_ratio.is_none()
    }
}

/// Result of a comparable company analysis.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompsAnalysis {
    /// Statistics per multiple.
    pub summary_metrics: CompsSummary,
    /// Each peer with its multiples, in input order.
    pub detailed_comps: Vec<ComparableMultiples>,
    /// Explanatory note, set when there was nothing to analyse.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Compute multiples for each peer and summarise them.
///
/// Investor mode currently computes the same figures as founder mode.
pub fn generate_comps_analysis(companies: &[ComparableCompany], mode: Mode) -> CompsAnalysis {
    if companies.is_empty() {
        tracing::debug!(%mode, "no comparable companies supplied");
        return CompsAnalysis {
            message: Some(NO_COMPARABLES_MESSAGE.to_string()),
            ..Default::default()
        };
    }

    let detailed_comps: Vec<ComparableMultiples> = companies
        .iter()
        .cloned()
        .map(ComparableMultiples::from_company)
        .collect();

    let stats = |kind: MultipleKind| {
        let values: Vec<f64> = detailed_comps.iter().filter_map(|c| c.get(kind)).collect();
        MultipleStats::from_values(&values)
    };
    let summary_metrics = CompsSummary {
        ev_to_revenue: stats(MultipleKind::EvToRevenue),
        ev_to_ebitda: stats(MultipleKind::EvToEbitda),
        pe_ratio: stats(MultipleKind::PeRatio),
    };

    tracing::debug!(%mode, companies = detailed_comps.len(), "computed comparable multiples");

    CompsAnalysis {
        summary_metrics,
        detailed_comps,
        message: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    fn peer() -> ComparableCompany {
        ComparableCompany {
            company_name: Some("Peer Co".to_string()),
            enterprise_value: Some(10_000_000.0),
            ltm_revenue: Some(2_000_000.0),
            ltm_ebitda: Some(1_000_000.0),
            ltm_net_income: Some(500_000.0),
            market_cap: Some(9_000_000.0),
        }
    }

    #[test]
    fn test_single_peer() {
        let comps = generate_comps_analysis(&[peer()], Mode::Founder);

        let detail = &comps.detailed_comps[0];
        assert_relative_eq!(detail.ev_to_revenue.unwrap(), 5.0);
        assert_relative_eq!(detail.ev_to_ebitda.unwrap(), 10.0);
        assert_relative_eq!(detail.pe_ratio.unwrap(), 18.0);

        for (kind, expected) in MultipleKind::all().into_iter().zip([5.0, 10.0, 18.0]) {
            let stats = comps.summary_metrics.get(kind).unwrap();
            assert_relative_eq!(stats.mean, expected);
            assert_relative_eq!(stats.median, expected);
            assert_relative_eq!(stats.high, expected);
            assert_relative_eq!(stats.low, expected);
            assert_eq!(stats.count, 1);
        }
        assert_eq!(comps.message, None);
    }

    #[test]
    fn test_no_peers() {
        let comps = generate_comps_analysis(&[], Mode::Investor);

        assert!(comps.detailed_comps.is_empty());
        assert!(comps.summary_metrics.is_empty());
        assert_eq!(comps.message.as_deref(), Some(NO_COMPARABLES_MESSAGE));
    }

    #[rstest]
    #[case(Some(1.0), Some(0.0), None)]
    #[case(None, Some(2.0), None)]
    #[case(Some(1.0), None, None)]
    #[case(Some(f64::INFINITY), Some(2.0), None)]
    #[case(Some(f64::NAN), Some(2.0), None)]
    #[case(Some(-4.0), Some(2.0), Some(-2.0))]
    #[case(Some(0.0), Some(2.0), Some(0.0))]
    fn test_ratio(
        #[case] numerator: Option<f64>,
        #[case] denominator: Option<f64>,
        #[case] expected: Option<f64>,
    ) {
        assert_eq!(ratio(numerator, denominator), expected);
    }

    #[test]
    fn test_missing_denominator_omits_metric() {
        let comps = generate_comps_analysis(
            &[ComparableCompany {
                ltm_net_income: Some(0.0),
                ltm_ebitda: None,
                ..peer()
            }],
            Mode::Founder,
        );

        assert!(comps.summary_metrics.ev_to_revenue.is_some());
        assert!(comps.summary_metrics.ev_to_ebitda.is_none());
        assert!(comps.summary_metrics.pe_ratio.is_none());
        assert_eq!(comps.detailed_comps[0].pe_ratio, None);
    }

    #[rstest]
    #[case(&[3.0, 1.0, 2.0], 2.0)]
    #[case(&[4.0, 1.0, 3.0, 2.0], 2.5)]
    #[case(&[7.0], 7.0)]
    fn test_median(#[case] values: &[f64], #[case] median: f64) {
        let stats = MultipleStats::from_values(values).unwrap();
        assert_relative_eq!(stats.median, median);
        assert_eq!(stats.count, values.len());
    }

    #[test]
    fn test_stats_over_valid_values_only() {
        let companies = [
            peer(),
            ComparableCompany {
                enterprise_value: Some(30_000_000.0),
                ..peer()
            },
            ComparableCompany {
                ltm_revenue: Some(0.0),
                ..peer()
            },
        ];
        let comps = generate_comps_analysis(&companies, Mode::Founder);
        let ev_to_revenue = comps.summary_metrics.ev_to_revenue.unwrap();

        assert_eq!(ev_to_revenue.count, 2);
        assert_relative_eq!(ev_to_revenue.low, 5.0);
        assert_relative_eq!(ev_to_revenue.high, 15.0);
        assert_relative_eq!(ev_to_revenue.mean, 10.0);
        assert_relative_eq!(ev_to_revenue.median, 10.0);
        assert_eq!(comps.summary_metrics.ev_to_ebitda.unwrap().count, 3);
    }

    #[test]
    fn test_serialization_omits_empty_metrics() {
        let comps = generate_comps_analysis(
            &[ComparableCompany {
                market_cap: None,
                ..peer()
            }],
            Mode::Founder,
        );
        let json = serde_json::to_value(&comps).unwrap();

        assert!(json["summaryMetrics"].get("peRatio").is_none());
        assert_eq!(json["summaryMetrics"]["evToEbitda"]["median"], 10.0);
        assert_eq!(json["detailedComps"][0]["companyName"], "Peer Co");
        assert!(json["detailedComps"][0]["peRatio"].is_null());
    }
}
