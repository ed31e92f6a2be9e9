/// batch report - several loan groups from upload-style json, one of them broken
use loan_schedule_rs::{compute_batch_input, BatchInput, EngineLimits, PortfolioView, SafeTimeProvider, TimeSource};

const UPLOAD: &str = r#"{
    "as_of": "2025/02/28",
    "groups": [
        {
            "name": "working capital",
            "principal": "500000",
            "nominal_rate": "0.0865",
            "overdue_rate": "0.13",
            "term_count": 12,
            "start_date": "2024-02-21",
            "maturity_date": "2025-02-21",
            "repayment_method": "先息后本",
            "early_repayment_term_count": 2,
            "payments": [
                { "date": "2024-08-21", "amount": "100000", "kind": "本金" },
                { "date": "2024-09-21", "amount": "2600", "kind": "利息" },
                { "date": "2024-10-08", "amount": "300", "kind": "逾期利息" }
            ]
        },
        {
            "name": "equipment",
            "principal": "240000",
            "nominal_rate": "0.06",
            "overdue_rate": "0.09",
            "term_count": 24,
            "start_date": "2024-01-05",
            "maturity_date": "2026-01-21",
            "repayment_method": "等额本息",
            "first_period_over_30_days": false,
            "payments": [
                { "date": "2024-03-21", "amount": "9500", "kind": "principal" }
            ]
        },
        {
            "name": "broken upload",
            "principal": "10000",
            "nominal_rate": "0.1",
            "overdue_rate": "0.15",
            "term_count": 6,
            "start_date": "2024-05-01",
            "maturity_date": "2024-11-01",
            "repayment_method": "balloon"
        }
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    let time = SafeTimeProvider::new(TimeSource::System);
    let input = BatchInput::from_json(UPLOAD)?;
    let (as_of, report) = compute_batch_input(input, &EngineLimits::default(), &time)?;

    let summary = report.summary(as_of);
    for row in &summary.rows {
        println!(
            "#{} {:<16} {:?}  arrears P {:>12}  arrears I {:>10}  {}",
            row.number,
            row.name,
            row.repayment_method,
            row.arrears_principal.round_half_up(2),
            row.arrears_interest.round_half_up(2),
            if row.accelerated { "accelerated" } else { "matured" },
        );
    }
    for bucket in &summary.rate_buckets {
        println!("{}", bucket.description());
    }
    println!("claim amount: {}", summary.claim_amount.round_half_up(2));
    println!("interest continues from {}", summary.open_calculation_start);

    if !report.is_complete() {
        for failure in &report.failures {
            eprintln!("group #{} failed: {}", failure.index + 1, failure.error);
        }
    }

    println!("{}", PortfolioView::from_report(&report, as_of).to_json_pretty()?);

    Ok(())
}
