pub mod batch;
pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod interest;
pub mod payments;
pub mod report;
pub mod schedule;
pub mod types;

// re-export key types
pub use batch::{
    compute_batch, compute_batch_input, BatchReport, GroupFailure, GroupSchedule, LoanGroup, PortfolioSummary,
};
pub use config::{BatchInput, EngineLimits, LoanGroupInput, LoanTerms, LoanTermsBuilder, PaymentInput};
pub use decimal::{Money, Rate};
pub use errors::{ErrorKind, Result, ScheduleError};
pub use events::{EventStore, ScheduleEvent};
pub use interest::{AccrualEngine, CompoundingEngine, DayCountConvention, InterestCalculation, PenaltyEngine};
pub use report::{PeriodView, PortfolioView, ScheduleView};
pub use schedule::{compute_schedule, Payoff, Period, PeriodLabel, RowKind, Schedule, ScheduleEngine, TotalsRow};
pub use types::{FirstCycle, GroupId, PaymentEvent, PaymentKind, RepaymentMethod, ScheduleStatus};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
