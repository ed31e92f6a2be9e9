/// partial repayments - sub-periods, same-day overwrites and overdue interest rows
use loan_schedule_rs::chrono::NaiveDate;
use loan_schedule_rs::{
    LoanTerms, Money, PaymentEvent, Rate, RepaymentMethod, ScheduleEngine, ScheduleEvent, EngineLimits,
};

fn date(y: i32, m: u32, d: u32) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("invalid date {y}-{m}-{d}").into())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "loan_schedule_rs=debug".into()))
        .init();

    let terms = LoanTerms::builder()
        .principal(Money::from_major(120_000))
        .nominal_rate(Rate::from_percentage(10))
        .overdue_rate(Rate::from_percentage(15))
        .term_count(12)
        .start_date(date(2024, 3, 25)?)
        .maturity_date(date(2025, 3, 25)?)
        .repayment_method(RepaymentMethod::EqualPrincipal)
        .as_of(date(2025, 5, 10)?)
        .build()?;

    let payments = vec![
        // mid-cycle interest payment opens a sub-period
        PaymentEvent::interest(date(2024, 5, 2)?, Money::from_major(900)),
        // on a billing day: merges into that cycle's row
        PaymentEvent::principal(date(2024, 6, 21)?, Money::from_major(10_000)),
        // a second payment on the same day replaces the first
        PaymentEvent::principal(date(2024, 6, 21)?, Money::from_major(12_000)),
        // overdue interest between billing days gets a row of its own
        PaymentEvent::overdue_interest(date(2024, 9, 3)?, Money::from_major(150)),
        // after maturity
        PaymentEvent::principal(date(2025, 4, 1)?, Money::from_major(20_000)),
    ];

    let engine = ScheduleEngine::new(EngineLimits::default());
    let schedule = engine.compute(&terms, &payments)?;

    for period in &schedule.periods {
        println!(
            "{:>20} {:?}  {} -> {}  due P {:>10}  paid P {:>10}  arrears P {:>10}",
            period.label.to_string(),
            period.kind,
            period.start_date,
            period.end_date,
            period.due_principal.round_half_up(2),
            period.paid_principal,
            period.cumulative_unpaid_principal.round_half_up(2),
        );
    }

    for event in &schedule.events {
        if let ScheduleEvent::PaymentMerged { replaced: Some(replaced), label, .. } = event {
            println!("row {label}: payment of {replaced} was overwritten");
        }
    }

    let payoff = &schedule.payoff;
    println!("arrears principal: {}", payoff.arrears_principal.round_half_up(2));
    println!("arrears interest:  {}", payoff.arrears_interest.round_half_up(2));
    println!("compound:          {}", payoff.compound.round_half_up(2));
    println!("penalty:           {}", payoff.penalty.round_half_up(2));
    println!("total:             {}", payoff.total.round_half_up(2));

    Ok(())
}
