use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

/// principal and interest parts of one scheduled installment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstallmentSplit {
    pub installment: u32,
    pub principal: Money,
    pub interest: Money,
}

impl InstallmentSplit {
    pub fn total(&self) -> Money {
        self.principal + self.interest
    }
}

fn overflow(operation: &str) -> ScheduleError {
    ScheduleError::CalculationError {
        message: format!("{operation} overflowed the decimal range"),
    }
}

fn mul(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal> {
    a.checked_mul(b).ok_or_else(|| overflow(operation))
}

fn div(a: Decimal, b: Decimal, operation: &str) -> Result<Decimal> {
    a.checked_div(b).ok_or_else(|| overflow(operation))
}

/// (1 + r)^n by iteration
fn compound_factor(rate: Decimal, periods: u32) -> Result<Decimal> {
    let base = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = mul(factor, base, "compound factor")?;
    }
    Ok(factor)
}

/// level payment per period, spreadsheet PMT with fv = 0 and payments at period end.
/// `pv` is signed as a cash flow: pass `-principal` for a positive payment.
pub fn pmt(rate: Decimal, nper: u32, pv: Decimal) -> Result<Decimal> {
    if nper == 0 {
        return Ok(-pv);
    }
    if rate.is_zero() {
        return Ok(-pv / Decimal::from(nper));
    }
    let factor = compound_factor(rate, nper)?;
    let numerator = mul(mul(pv, rate, "PMT")?, factor, "PMT")?;
    Ok(-div(numerator, factor - Decimal::ONE, "PMT")?)
}

/// interest part of payment `per` (1-based), spreadsheet IPMT with fv = 0
pub fn ipmt(rate: Decimal, per: u32, nper: u32, pv: Decimal) -> Result<Decimal> {
    if rate.is_zero() || per == 0 {
        return Ok(Decimal::ZERO);
    }
    let payment = pmt(rate, nper, pv)?;
    let factor = compound_factor(rate, per - 1)?;
    // signed balance before payment `per`
    let accumulated = div(mul(payment, factor - Decimal::ONE, "IPMT")?, rate, "IPMT")?;
    let balance = mul(pv, factor, "IPMT")?
        .checked_add(accumulated)
        .ok_or_else(|| overflow("IPMT"))?;
    Ok(-mul(balance, rate, "IPMT")?)
}

/// principal part of payment `per` (1-based), spreadsheet PPMT with fv = 0
pub fn ppmt(rate: Decimal, per: u32, nper: u32, pv: Decimal) -> Result<Decimal> {
    pmt(rate, nper, pv)?
        .checked_sub(ipmt(rate, per, nper, pv)?)
        .ok_or_else(|| overflow("PPMT"))
}

/// equal-principal installment, rounded half up to cents
pub fn equal_principal_installment(principal: Money, term_count: u32) -> Result<Money> {
    if term_count == 0 {
        return Err(ScheduleError::InvalidTermCount { term_count });
    }
    Ok((principal / Decimal::from(term_count)).round_half_up(2))
}

/// split of level-payment installment `installment` (1-based) at a monthly rate of
/// `annual_rate / 12`, each part rounded half up to cents
pub fn level_payment_split(
    principal: Money,
    annual_rate: Rate,
    installment: u32,
    term_count: u32,
) -> Result<InstallmentSplit> {
    if installment == 0 || installment > term_count {
        return Err(ScheduleError::CalculationError {
            message: format!("installment {installment} outside 1..={term_count}"),
        });
    }
    let rate = annual_rate.monthly_rate().as_decimal();
    let pv = -principal.as_decimal();

    Ok(InstallmentSplit {
        installment,
        principal: Money::from_decimal(ppmt(rate, installment, term_count, pv)?).round_half_up(2),
        interest: Money::from_decimal(ipmt(rate, installment, term_count, pv)?).round_half_up(2),
    })
}
