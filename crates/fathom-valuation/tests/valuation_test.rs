//! Integration tests for DCF valuation and comparable company analysis.

use approx::assert_relative_eq;
use fathom_inputs::{Mode, RawInputs, process_inputs};
use fathom_model::generate_three_statement_model;
use fathom_valuation::{ComparableCompany, generate_comps_analysis, generate_dcf_valuation};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case(Mode::Founder)]
#[case(Mode::Investor)]
fn test_full_valuation_by_mode(#[case] mode: Mode) {
    let raw: RawInputs = serde_json::from_value(json!({
        "assumptions": {
            "revenueGrowthRate": [0.10, 0.08, 0.05, 0.03, 0.03],
            "cogsAsPercentageOfRevenue": [0.6],
            "sgaAsPercentageOfRevenue": [0.15],
            "depreciationAsPercentageOfRevenue": [0.03],
            "capexAsPercentageOfRevenue": [0.04],
            "taxRate": 0.21,
            "interestRateOnDebt": 0.05,
            "accountsReceivableAsPercentageOfSales": 0.08,
            "inventoryAsPercentageOfCOGS": 0.12,
            "accountsPayableAsPercentageOfCOGS": 0.08,
            "baseRevenue": 1_000_000,
            "baseCash": 100_000,
            "baseDebt": 50_000
        },
        "valuationAssumptions": {
            "wacc": 0.10,
            "terminalValueMethod": "exitMultiple",
            "exitMultiple": 8
        }
    }))
    .unwrap();

    let inputs = process_inputs(&raw, mode);
    assert!(inputs.is_valid(), "{:?}", inputs.error_messages());

    let model = generate_three_statement_model(&inputs, mode, inputs.projection_years);
    let valuation = generate_dcf_valuation(&model, &inputs, mode);

    let ev = valuation.enterprise_value.unwrap();
    assert!(ev.is_finite() && ev > 0.0);
    assert_relative_eq!(ev, valuation.present_values.iter().sum::<f64>(), max_relative = 1e-12);
}

#[test]
fn test_random_peers_never_produce_non_finite_multiples() {
    let mut rng = StdRng::seed_from_u64(7);
    let maybe = |rng: &mut StdRng| -> Option<f64> {
        match rng.gen_range(0..4) {
            0 => None,
            1 => Some(0.0),
            _ => Some(rng.gen_range(-1e7..1e8)),
        }
    };

    let companies: Vec<ComparableCompany> = (0..200)
        .map(|_| ComparableCompany {
            company_name: None,
            enterprise_value: maybe(&mut rng),
            ltm_revenue: maybe(&mut rng),
            ltm_ebitda: maybe(&mut rng),
            ltm_net_income: maybe(&mut rng),
            market_cap: maybe(&mut rng),
        })
        .collect();

    let comps = generate_comps_analysis(&companies, Mode::Founder);
    assert_eq!(comps.detailed_comps.len(), companies.len());

    for detail in &comps.detailed_comps {
        for value in [detail.ev_to_revenue, detail.ev_to_ebitda, detail.pe_ratio]
            .into_iter()
            .flatten()
        {
            assert!(value.is_finite());
        }
    }
    for stats in [
        comps.summary_metrics.ev_to_revenue,
        comps.summary_metrics.ev_to_ebitda,
        comps.summary_metrics.pe_ratio,
    ]
    .into_iter()
    .flatten()
    {
        assert!(stats.low <= stats.median && stats.median <= stats.high);
        assert!(stats.low <= stats.mean && stats.mean <= stats.high);
    }
}
