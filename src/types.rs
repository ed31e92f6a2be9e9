use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::decimal::Money;
use crate::errors::ScheduleError;

/// unique identifier for a loan group
pub type GroupId = Uuid;

/// how principal and interest fall due
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RepaymentMethod {
    /// interest every cycle, principal in one sum at maturity
    InterestOnly,
    /// equal principal each cycle, interest on the declining balance
    EqualPrincipal,
    /// level payment each cycle, split into principal and interest
    EqualInstallment,
}

impl RepaymentMethod {
    /// amortizing methods spread principal across cycles
    pub fn is_amortizing(&self) -> bool {
        !matches!(self, RepaymentMethod::InterestOnly)
    }
}

impl fmt::Display for RepaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RepaymentMethod::InterestOnly => "interest_only",
            RepaymentMethod::EqualPrincipal => "equal_principal",
            RepaymentMethod::EqualInstallment => "equal_installment",
        };
        f.write_str(name)
    }
}

impl FromStr for RepaymentMethod {
    type Err = ScheduleError;

    /// accepts english names and the loan sheet keywords, which may be embedded in longer text
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        let normalized = value.to_ascii_lowercase().replace(['-', ' '], "_");

        match normalized.as_str() {
            "interest_only" | "interestonly" | "bullet" => return Ok(RepaymentMethod::InterestOnly),
            "equal_principal" | "equalprincipal" => return Ok(RepaymentMethod::EqualPrincipal),
            "equal_installment" | "equalinstallment" | "annuity" => {
                return Ok(RepaymentMethod::EqualInstallment)
            }
            _ => {}
        }

        if value.contains("先息后本") {
            Ok(RepaymentMethod::InterestOnly)
        } else if value.contains("等额本金") {
            Ok(RepaymentMethod::EqualPrincipal)
        } else if value.contains("等额本息") {
            Ok(RepaymentMethod::EqualInstallment)
        } else {
            Err(ScheduleError::UnknownRepaymentMethod {
                value: value.to_string(),
            })
        }
    }
}

/// what a payment settles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PaymentKind {
    Principal,
    Interest,
    /// penalty and compound interest charged after a default
    OverdueInterest,
}

impl fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PaymentKind::Principal => "principal",
            PaymentKind::Interest => "interest",
            PaymentKind::OverdueInterest => "overdue_interest",
        };
        f.write_str(name)
    }
}

impl FromStr for PaymentKind {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim();
        match value.to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "principal" | "本金" => Ok(PaymentKind::Principal),
            "interest" | "利息" => Ok(PaymentKind::Interest),
            "overdue_interest" | "逾期利息" => Ok(PaymentKind::OverdueInterest),
            _ => Err(ScheduleError::UnknownPaymentKind {
                value: value.to_string(),
            }),
        }
    }
}

/// a dated repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub date: NaiveDate,
    pub amount: Money,
    pub kind: PaymentKind,
}

impl PaymentEvent {
    pub fn new(date: NaiveDate, amount: Money, kind: PaymentKind) -> Self {
        Self { date, amount, kind }
    }

    pub fn principal(date: NaiveDate, amount: Money) -> Self {
        Self::new(date, amount, PaymentKind::Principal)
    }

    pub fn interest(date: NaiveDate, amount: Money) -> Self {
        Self::new(date, amount, PaymentKind::Interest)
    }

    pub fn overdue_interest(date: NaiveDate, amount: Money) -> Self {
        Self::new(date, amount, PaymentKind::OverdueInterest)
    }
}

/// how the first billing cycle is cut when the start day differs from the billing day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum FirstCycle {
    /// first cycle runs to a billing day at least a month after the start
    #[default]
    Extended,
    /// short broken first cycle up to the next billing day, counted as an extra cycle
    Stub,
}

/// where the schedule stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScheduleStatus {
    /// ran to maturity on or before the as-of date
    Matured,
    /// cut at the as-of date before maturity
    Open,
}
