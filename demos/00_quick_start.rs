/// quick start - schedule for one interest-only loan
use loan_schedule_rs::chrono::NaiveDate;
use loan_schedule_rs::{compute_schedule, LoanTerms, Money, Rate, RepaymentMethod, ScheduleView};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()))
        .init();

    // 100,000 at 12% for 12 monthly cycles, billed on the 21st
    let terms = LoanTerms::builder()
        .principal(Money::from_major(100_000))
        .nominal_rate(Rate::from_percentage(12))
        .overdue_rate(Rate::from_percentage(18))
        .term_count(12)
        .start_date(NaiveDate::from_ymd_opt(2024, 1, 21).ok_or("bad date")?)
        .maturity_date(NaiveDate::from_ymd_opt(2025, 1, 21).ok_or("bad date")?)
        .repayment_method(RepaymentMethod::InterestOnly)
        .as_of(NaiveDate::from_ymd_opt(2024, 7, 21).ok_or("bad date")?)
        .build()?;

    let schedule = compute_schedule(&terms, &[])?;

    for period in &schedule.periods {
        println!(
            "{:>20}  {} -> {}  days {:>3}  interest {:>10}",
            period.label.to_string(),
            period.start_date,
            period.end_date,
            period.due_days,
            period.due_interest.round_half_up(2),
        );
    }
    println!("payoff total: {}", schedule.payoff.total.round_half_up(2));

    println!("{}", ScheduleView::from_schedule(&schedule).to_json_pretty()?);

    Ok(())
}
