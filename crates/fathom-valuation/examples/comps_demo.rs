//! Demonstration of comparable company analysis.

use fathom_inputs::Mode;
use fathom_valuation::{ComparableCompany, MultipleKind, generate_comps_analysis};

fn peer(
    name: &str,
    ev: f64,
    revenue: f64,
    ebitda: f64,
    net_income: f64,
    cap: f64,
) -> ComparableCompany {
    ComparableCompany {
        company_name: Some(name.to_string()),
        enterprise_value: Some(ev),
        ltm_revenue: Some(revenue),
        ltm_ebitda: Some(ebitda),
        ltm_net_income: Some(net_income),
        market_cap: Some(cap),
    }
}

fn main() {
    println!("Fathom Comps Demo\n");

    let peers = vec![
        peer("Northwind", 120e6, 40e6, 12e6, 6e6, 110e6),
        peer("Contoso", 260e6, 70e6, 22e6, 11e6, 240e6),
        peer("Fabrikam", 90e6, 35e6, 7e6, 2.5e6, 85e6),
        // Loss-making peer: P/E is undefined
        peer("Tailspin", 60e6, 30e6, 3e6, 0.0, 55e6),
    ];

    let comps = generate_comps_analysis(&peers, Mode::Founder);

    for comp in &comps.detailed_comps {
        println!(
            "{:<12} EV/Revenue {:>6}  EV/EBITDA {:>6}  P/E {:>6}",
            comp.company.company_name.as_deref().unwrap_or("?"),
            comp.ev_to_revenue.map_or("n/a".into(), |v| format!("{v:.2}")),
            comp.ev_to_ebitda.map_or("n/a".into(), |v| format!("{v:.2}")),
            comp.pe_ratio.map_or("n/a".into(), |v| format!("{v:.2}")),
        );
    }

    println!();
    for kind in MultipleKind::all() {
        if let Some(stats) = comps.summary_metrics.get(kind) {
            println!(
                "{kind}: median {:.2} (low {:.2}, high {:.2}, n={})",
                stats.median, stats.low, stats.high, stats.count
            );
        }
    }
}
