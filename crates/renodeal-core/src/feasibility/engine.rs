//! Quarter-by-quarter financing simulation.
//!
//! Each quarter finances its share of costs through the waterfall, accrues
//! interest on the loans' drawn principal, pays the previous quarter's
//! interest (one-quarter lag), and pays a prorated commission. The final
//! quarter also settles its own interest so nothing is left owing.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::{Money, Rate};

use super::costs::CostBreakdown;
use super::inputs::DealInputs;
use super::schedule::QuarterPeriod;
use super::waterfall::{FinancingLedger, SourceAmounts};

/// ACT/365 day-count basis for interest and commission.
pub const DAY_COUNT_BASIS: Decimal = dec!(365);

/// A pair of amounts for the two interest-bearing loans.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoanAmounts {
    pub land_loan: Money,
    pub support_loan: Money,
}

impl LoanAmounts {
    pub fn total(&self) -> Money {
        self.land_loan + self.support_loan
    }

    pub fn is_zero(&self) -> bool {
        self.land_loan.is_zero() && self.support_loan.is_zero()
    }
}

/// What a drawdown pays for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPurpose {
    ProjectCosts,
    LandLoanInterest,
    SupportLoanInterest,
    Commission,
}

impl fmt::Display for DrawPurpose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DrawPurpose::ProjectCosts => "project costs",
            DrawPurpose::LandLoanInterest => "land loan interest",
            DrawPurpose::SupportLoanInterest => "support loan interest",
            DrawPurpose::Commission => "commission",
        };
        f.write_str(s)
    }
}

/// Financing activity for one quarter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuarterlyRecord {
    pub index: u32,
    pub label: String,
    pub days: u32,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// All draws of the quarter (costs, interest, commission) per source
    pub drawn: SourceAmounts,
    /// Interest accrued during this quarter on drawn principal
    pub interest_accrued: LoanAmounts,
    /// Interest paid during this quarter
    pub interest_paid: LoanAmounts,
    pub commission_paid: Money,
    /// Interest paid plus commission paid
    pub financing_cost: Money,
    /// Requested amounts no source could cover
    pub unfinanced: Money,
}

/// Aggregate outcome of the quarterly simulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingRun {
    pub quarters: Vec<QuarterlyRecord>,
    /// Sum of all draws per source over the project
    pub drawn_total: SourceAmounts,
    pub interest_paid: LoanAmounts,
    pub commission_paid: Money,
    pub unfinanced_total: Money,
    /// Interest accrued but still unpaid after the last quarter
    pub deferred_interest: LoanAmounts,
    /// Ledger capacity left after the last quarter
    pub remaining_capacity: SourceAmounts,
    #[serde(skip)]
    pub warnings: Vec<String>,
}

impl FinancingRun {
    pub fn total_interest(&self) -> Money {
        self.interest_paid.total()
    }
}

/// Per-run state. Never shared between runs.
struct FinancingEngine {
    ledger: FinancingLedger,
    /// Drawn principal on which interest accrues; cost draws only
    principal: LoanAmounts,
    /// Interest accrued last quarter, payable this quarter
    deferred: LoanAmounts,
    annual_rate: Rate,
    annual_commission: Money,
    warnings: Vec<String>,
}

/// Draws and shortfalls collected over one quarter.
#[derive(Default)]
struct QuarterDraws {
    drawn: SourceAmounts,
    unfinanced: Money,
}

impl FinancingEngine {
    fn new(inputs: &DealInputs) -> Self {
        let capacity = inputs.financing_capacity();
        Self {
            ledger: FinancingLedger::new(capacity),
            principal: LoanAmounts::default(),
            deferred: LoanAmounts::default(),
            annual_rate: inputs.interest_rate_pct / Decimal::ONE_HUNDRED,
            annual_commission: capacity.debt() * inputs.commission_rate_pct / Decimal::ONE_HUNDRED,
            warnings: Vec::new(),
        }
    }

    /// Draw through the waterfall, recording any shortfall.
    fn draw(
        &mut self,
        amount: Money,
        purpose: DrawPurpose,
        period: &QuarterPeriod,
        acc: &mut QuarterDraws,
    ) -> SourceAmounts {
        let allocation = self.ledger.allocate(amount);
        acc.drawn.accumulate(&allocation.drawn);
        if allocation.unfinanced > Decimal::ZERO {
            warn!(
                "{}: {} of {} could not be financed",
                period.label, allocation.unfinanced, purpose
            );
            self.warnings.push(format!(
                "{}: {} of {} left unfinanced after all sources were exhausted",
                period.label,
                allocation.unfinanced.round_dp(2),
                purpose
            ));
            acc.unfinanced += allocation.unfinanced;
        }
        allocation.drawn
    }

    fn pay_interest(
        &mut self,
        due: LoanAmounts,
        period: &QuarterPeriod,
        acc: &mut QuarterDraws,
    ) {
        self.draw(due.land_loan, DrawPurpose::LandLoanInterest, period, acc);
        self.draw(due.support_loan, DrawPurpose::SupportLoanInterest, period, acc);
    }

    fn step(
        &mut self,
        i: usize,
        n_quarters: usize,
        period: &QuarterPeriod,
        upfront: Money,
        recurring: Money,
    ) -> QuarterlyRecord {
        let mut acc = QuarterDraws::default();
        let is_last = i + 1 == n_quarters;

        // 1. Quarter's share of project costs; acquisition lands in the first.
        let cost = if i == 0 { upfront + recurring } else { recurring };
        let cost_draw = self.draw(cost, DrawPurpose::ProjectCosts, period, &mut acc);
        self.principal.land_loan += cost_draw.land_loan;
        self.principal.support_loan += cost_draw.support_loan;

        // 2. Accrue on principal outstanding at quarter end.
        let accrued = LoanAmounts {
            land_loan: prorate(self.principal.land_loan * self.annual_rate, period.days),
            support_loan: prorate(self.principal.support_loan * self.annual_rate, period.days),
        };

        // 3. Pay what accrued last quarter.
        let mut paid = LoanAmounts::default();
        if i > 0 {
            let due = self.deferred;
            self.pay_interest(due, period, &mut acc);
            paid = due;
        }
        self.deferred = accrued;

        // 4. Final quarter settles its own accrual too.
        if is_last {
            let due = self.deferred;
            self.pay_interest(due, period, &mut acc);
            paid.land_loan += due.land_loan;
            paid.support_loan += due.support_loan;
            self.deferred = LoanAmounts::default();
        }

        // 5. Commission, prorated on days.
        let commission = prorate(self.annual_commission, period.days);
        self.draw(commission, DrawPurpose::Commission, period, &mut acc);

        let record = QuarterlyRecord {
            index: period.index,
            label: period.label.clone(),
            days: period.days,
            start_date: period.start_date,
            end_date: period.end_date,
            drawn: acc.drawn,
            interest_accrued: accrued,
            interest_paid: paid,
            commission_paid: commission,
            financing_cost: paid.total() + commission,
            unfinanced: acc.unfinanced,
        };

        debug!(
            "{} ({} days): drawn {}, interest paid {}, commission {}",
            record.label,
            record.days,
            record.drawn.total(),
            record.interest_paid.total(),
            record.commission_paid
        );

        record
    }
}

/// Share of an annual amount falling in `days` (ACT/365).
pub fn prorate(annual: Money, days: u32) -> Money {
    annual * Decimal::from(days) / DAY_COUNT_BASIS
}

/// Run the quarterly financing simulation over `schedule`.
///
/// Expects the acquisition financing check to have passed already; any
/// residual shortfall is reported on the records rather than raised.
pub fn run_financing(
    inputs: &DealInputs,
    costs: &CostBreakdown,
    schedule: &[QuarterPeriod],
) -> FinancingRun {
    let mut engine = FinancingEngine::new(inputs);
    let n_quarters = schedule.len();
    let divisor = Decimal::from(n_quarters.max(1) as u64);
    let upfront = costs.upfront_requirement(inputs);
    let recurring = costs.works.total / divisor + costs.misc.total / divisor;

    let mut quarters = Vec::with_capacity(n_quarters);
    for (i, period) in schedule.iter().enumerate() {
        quarters.push(engine.step(i, n_quarters, period, upfront, recurring));
    }

    let mut drawn_total = SourceAmounts::default();
    let mut interest_paid = LoanAmounts::default();
    let mut commission_paid = Decimal::ZERO;
    let mut unfinanced_total = Decimal::ZERO;
    for q in &quarters {
        drawn_total.accumulate(&q.drawn);
        interest_paid.land_loan += q.interest_paid.land_loan;
        interest_paid.support_loan += q.interest_paid.support_loan;
        commission_paid += q.commission_paid;
        unfinanced_total += q.unfinanced;
    }

    FinancingRun {
        quarters,
        drawn_total,
        interest_paid,
        commission_paid,
        unfinanced_total,
        deferred_interest: engine.deferred,
        remaining_capacity: *engine.ledger.remaining(),
        warnings: engine.warnings,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feasibility::costs::aggregate_costs;
    use crate::feasibility::schedule::generate_quarters;
    use rust_decimal_macros::dec;

    fn inputs() -> DealInputs {
        DealInputs {
            purchase_price: dec!(200000),
            listed_price: dec!(210000),
            notary_fee_pct: Decimal::ZERO,
            buy_agency_fee_pct: Decimal::ZERO,
            sell_agency_fee_pct: Decimal::ZERO,
            filing_fee: Decimal::ZERO,
            works_cost_per_area: Decimal::ZERO,
            project_management_pct: Decimal::ZERO,
            contingency_pct: Decimal::ZERO,
            terrace_cost: Decimal::ZERO,
            demolition_cost: Decimal::ZERO,
            technical_fees: Decimal::ZERO,
            prorated_land_tax: Decimal::ZERO,
            diagnostics_cost: Decimal::ZERO,
            furniture_cost: Decimal::ZERO,
            land_loan_amount: dec!(150000),
            equity_amount: dec!(30000),
            support_loan_amount: dec!(100000),
            interest_rate_pct: dec!(3.65),
            commission_rate_pct: dec!(1),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            duration_days: 365,
            legal_area_before_works: dec!(40),
            weighted_area_before_works: dec!(40),
            legal_area_after_works: dec!(40),
            terrace_area_after_works: Decimal::ZERO,
            weighted_area_after_works: dec!(40),
            target_price_per_weighted_area: dec!(7000),
        }
    }

    fn run(inputs: &DealInputs) -> FinancingRun {
        let costs = aggregate_costs(inputs);
        let schedule = generate_quarters(inputs.purchase_date, inputs.duration_days).unwrap();
        run_financing(inputs, &costs, &schedule)
    }

    #[test]
    fn test_first_quarter_finances_acquisition_in_priority_order() {
        let r = run(&inputs());
        let q1 = &r.quarters[0];
        // 200k purchase: 150k land loan, 30k equity, 20k support loan,
        // then commission 2_500 * 90/365 from the support loan.
        assert_eq!(q1.drawn.land_loan, dec!(150000));
        assert_eq!(q1.drawn.equity, dec!(30000));
        assert_eq!(q1.interest_paid, LoanAmounts::default());
        assert!(q1.drawn.support_loan > dec!(20000));
    }

    #[test]
    fn test_interest_accrues_on_cost_principal_only() {
        let r = run(&inputs());
        let q1 = &r.quarters[0];
        // 150k * 3.65% * 90/365 = 1_350
        assert_eq!(q1.interest_accrued.land_loan, dec!(1350));
        // 20k * 3.65% * 90/365 = 180
        assert_eq!(q1.interest_accrued.support_loan, dec!(180));
        // Principal never grows after Q1 since there are no works costs.
        let q2 = &r.quarters[1];
        assert_eq!(q2.interest_accrued.land_loan, dec!(1365));
    }

    #[test]
    fn test_interest_paid_one_quarter_late() {
        let r = run(&inputs());
        for i in 1..r.quarters.len() - 1 {
            assert_eq!(
                r.quarters[i].interest_paid,
                r.quarters[i - 1].interest_accrued,
                "quarter {}",
                i + 1
            );
        }
    }

    #[test]
    fn test_last_quarter_settles_everything() {
        let r = run(&inputs());
        let n = r.quarters.len();
        let last = &r.quarters[n - 1];
        let prev = &r.quarters[n - 2];
        assert_eq!(
            last.interest_paid.land_loan,
            prev.interest_accrued.land_loan + last.interest_accrued.land_loan
        );
        assert!(r.deferred_interest.is_zero());
        let accrued: Money = r.quarters.iter().map(|q| q.interest_accrued.total()).sum();
        assert_eq!(r.total_interest(), accrued);
    }

    #[test]
    fn test_commission_prorated_on_debt_capacity() {
        let r = run(&inputs());
        // (150k + 100k) * 1% = 2_500 a year, over 365 days
        assert!((r.commission_paid - dec!(2500)).abs() < dec!(0.000001));
        assert_eq!(r.quarters[0].commission_paid, dec!(2500) * dec!(90) / dec!(365));
    }

    #[test]
    fn test_financing_cost_per_quarter() {
        let r = run(&inputs());
        for q in &r.quarters {
            assert_eq!(q.financing_cost, q.interest_paid.total() + q.commission_paid);
        }
    }

    #[test]
    fn test_draws_match_capacity_consumed() {
        let i = inputs();
        let r = run(&i);
        let mut restored = r.remaining_capacity;
        restored.accumulate(&r.drawn_total);
        assert_eq!(restored, i.financing_capacity());
        assert_eq!(r.unfinanced_total, Decimal::ZERO);
        assert!(r.warnings.is_empty());
    }

    #[test]
    fn test_exhausted_capacity_reported_as_unfinanced() {
        let mut i = inputs();
        i.support_loan_amount = dec!(20000);
        let r = run(&i);
        // Capacity equals the purchase price, so interest and commission
        // cannot be drawn.
        assert!(r.unfinanced_total > Decimal::ZERO);
        assert!(!r.warnings.is_empty());
        assert_eq!(r.remaining_capacity.total(), Decimal::ZERO);
        assert!(r.deferred_interest.is_zero());
    }

    #[test]
    fn test_single_quarter_pays_own_interest() {
        let mut i = inputs();
        i.duration_days = 30;
        let r = run(&i);
        assert_eq!(r.quarters.len(), 1);
        assert_eq!(r.quarters[0].interest_paid, r.quarters[0].interest_accrued);
        assert!(r.deferred_interest.is_zero());
    }
}
