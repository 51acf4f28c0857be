use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::RenoDealError;
use crate::types::{Money, Rate};
use crate::RenoDealResult;

/// Lower edge of the IRR search bracket (per period, decimal).
pub const IRR_LOWER_BOUND: Rate = dec!(-0.99);
/// Upper edge of the IRR search bracket (per period, decimal).
pub const IRR_UPPER_BOUND: Rate = dec!(1.0);
/// Bisection stops once the bracket is narrower than this.
pub const IRR_TOLERANCE: Rate = dec!(0.000001);

/// Net Present Value of a series of periodic cash flows.
///
/// Long series at extreme rates leave the 96-bit Decimal range: once
/// `(1+r)^t` overflows the remaining terms are dropped, and once a single
/// term overflows the result saturates to `Decimal::MAX`/`Decimal::MIN`
/// with that term's sign. Only the sign is meaningful after saturation,
/// which is all a bracketing solver needs.
pub fn npv(rate: Rate, cash_flows: &[Money]) -> RenoDealResult<Money> {
    if rate <= dec!(-1) {
        return Err(RenoDealError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    let one_plus_r = Decimal::ONE + rate;
    let mut result = Decimal::ZERO;
    let mut discount = Decimal::ONE;

    for (t, cf) in cash_flows.iter().enumerate() {
        if t > 0 {
            discount = match discount.checked_mul(one_plus_r) {
                Some(d) => d,
                None => break,
            };
        }
        if cf.is_zero() {
            continue;
        }
        let term = match cf.checked_div(discount) {
            Some(term) => term,
            None => return Ok(saturate(*cf)),
        };
        result = match result.checked_add(term) {
            Some(sum) => sum,
            None => return Ok(saturate(term)),
        };
    }

    Ok(result)
}

fn saturate(sign_of: Decimal) -> Decimal {
    if sign_of.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

/// Internal Rate of Return by bisection over `[IRR_LOWER_BOUND, IRR_UPPER_BOUND]`.
///
/// Assumes NPV decreases with the rate across the bracket, which holds for a
/// single outflow followed by non-negative inflows. Returns the midpoint of
/// the final bracket as a per-period decimal rate. When NPV keeps one sign
/// over the whole bracket the result converges onto the matching bound.
pub fn irr_bisection(cash_flows: &[Money]) -> RenoDealResult<Rate> {
    if cash_flows.len() < 2 {
        return Err(RenoDealError::InvalidInput {
            field: "cash_flows".into(),
            reason: "IRR requires at least 2 cash flows".into(),
        });
    }

    let mut left = IRR_LOWER_BOUND;
    let mut right = IRR_UPPER_BOUND;

    while right - left > IRR_TOLERANCE {
        let mid = (left + right) / dec!(2);
        if npv(mid, cash_flows)? > Decimal::ZERO {
            left = mid;
        } else {
            right = mid;
        }
    }

    Ok((left + right) / dec!(2))
}

/// Level monthly payment of a fully amortising loan:
/// `P * r(1+r)^n / ((1+r)^n - 1)` with `r = annual_rate_pct / 12 / 100`.
///
/// Interest-free loans and zero terms yield zero rather than a payment.
pub fn monthly_payment(principal: Money, annual_rate_pct: Rate, months: u32) -> RenoDealResult<Money> {
    if months == 0 || annual_rate_pct.is_zero() {
        return Ok(Decimal::ZERO);
    }

    let monthly_rate = annual_rate_pct / dec!(12) / Decimal::ONE_HUNDRED;
    let mut compound = Decimal::ONE;
    for _ in 0..months {
        compound = compound
            .checked_mul(Decimal::ONE + monthly_rate)
            .ok_or_else(|| RenoDealError::InvalidInput {
                field: "months".into(),
                reason: "Loan term too long for decimal compounding".into(),
            })?;
    }

    let denominator = compound - Decimal::ONE;
    if denominator.is_zero() {
        return Err(RenoDealError::DivisionByZero {
            context: "monthly payment denominator".into(),
        });
    }

    Ok(principal * monthly_rate * compound / denominator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_npv_basic() {
        let cfs = vec![dec!(-1000), dec!(300), dec!(400), dec!(500)];
        let result = npv(dec!(0.10), &cfs).unwrap();
        // NPV at 10%: -1000 + 300/1.1 + 400/1.21 + 500/1.331 ≈ -21.04
        assert!((result - dec!(-21.04)).abs() < dec!(0.01));
    }

    #[test]
    fn test_npv_zero_rate() {
        let cfs = vec![dec!(-100), dec!(50), dec!(50), dec!(50)];
        assert_eq!(npv(dec!(0.0), &cfs).unwrap(), dec!(50));
    }

    #[test]
    fn test_npv_rejects_minus_100_percent() {
        assert!(npv(dec!(-1), &[dec!(-100), dec!(110)]).is_err());
    }

    #[test]
    fn test_npv_saturates_on_long_series() {
        let mut cfs = vec![dec!(-1000)];
        cfs.extend(std::iter::repeat(dec!(10)).take(400));
        assert_eq!(npv(dec!(-0.99), &cfs).unwrap(), Decimal::MAX);
        // Strongly positive rate: only the first few terms matter.
        let high = npv(dec!(1.0), &cfs).unwrap();
        assert!((high - dec!(-990)).abs() < dec!(0.001));
    }

    #[test]
    fn test_irr_bisection_known_answer() {
        // -1000, +400 x3 => IRR ~9.70%
        let cfs = vec![dec!(-1000), dec!(400), dec!(400), dec!(400)];
        let rate = irr_bisection(&cfs).unwrap();
        assert!((rate - dec!(0.0970)).abs() < dec!(0.0001));
    }

    #[test]
    fn test_irr_bisection_single_period() {
        // -100 then +110 => exactly 10%
        let rate = irr_bisection(&[dec!(-100), dec!(110)]).unwrap();
        assert!((rate - dec!(0.10)).abs() < IRR_TOLERANCE);
    }

    #[test]
    fn test_irr_bisection_pins_to_lower_bound_on_total_loss() {
        let rate = irr_bisection(&[dec!(-100), dec!(-5), dec!(-5)]).unwrap();
        assert!((rate - IRR_LOWER_BOUND).abs() < IRR_TOLERANCE);
    }

    #[test]
    fn test_irr_requires_two_flows() {
        assert!(irr_bisection(&[dec!(-100)]).is_err());
    }

    #[test]
    fn test_monthly_payment_known_answer() {
        // 100k over 12 months at 6%: ≈ 8606.64
        let pmt = monthly_payment(dec!(100_000), dec!(6), 12).unwrap();
        assert!((pmt - dec!(8606.64)).abs() < dec!(0.01));
    }

    #[test]
    fn test_monthly_payment_zero_rate_or_term() {
        assert_eq!(monthly_payment(dec!(100_000), Decimal::ZERO, 12).unwrap(), Decimal::ZERO);
        assert_eq!(monthly_payment(dec!(100_000), dec!(4.5), 0).unwrap(), Decimal::ZERO);
    }
}
