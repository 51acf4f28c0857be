use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::Money;

/// The three funding sources, in drawdown priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FundingSource {
    LandLoan,
    Equity,
    SupportLoan,
}

impl FundingSource {
    /// Fixed drawdown order: land loan, then equity, then support loan.
    pub const PRIORITY: [FundingSource; 3] = [
        FundingSource::LandLoan,
        FundingSource::Equity,
        FundingSource::SupportLoan,
    ];

    /// Whether drawn principal on this source accrues interest.
    pub fn bears_interest(self) -> bool {
        !matches!(self, FundingSource::Equity)
    }
}

/// One amount per funding source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceAmounts {
    pub land_loan: Money,
    pub equity: Money,
    pub support_loan: Money,
}

impl SourceAmounts {
    pub fn get(&self, source: FundingSource) -> Money {
        match source {
            FundingSource::LandLoan => self.land_loan,
            FundingSource::Equity => self.equity,
            FundingSource::SupportLoan => self.support_loan,
        }
    }

    pub fn get_mut(&mut self, source: FundingSource) -> &mut Money {
        match source {
            FundingSource::LandLoan => &mut self.land_loan,
            FundingSource::Equity => &mut self.equity,
            FundingSource::SupportLoan => &mut self.support_loan,
        }
    }

    pub fn total(&self) -> Money {
        self.land_loan + self.equity + self.support_loan
    }

    /// Land loan plus support loan.
    pub fn debt(&self) -> Money {
        self.land_loan + self.support_loan
    }

    /// Add `other` field by field.
    pub fn accumulate(&mut self, other: &SourceAmounts) {
        for source in FundingSource::PRIORITY {
            *self.get_mut(source) += other.get(source);
        }
    }
}

/// Result of one drawdown request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    /// Amount drawn from each source
    pub drawn: SourceAmounts,
    /// Part of the request no source could cover
    pub unfinanced: Money,
}

/// Remaining drawable capacity per source for a single simulation run.
///
/// Counters only ever decrease.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinancingLedger {
    remaining: SourceAmounts,
}

impl FinancingLedger {
    pub fn new(capacity: SourceAmounts) -> Self {
        Self {
            remaining: capacity,
        }
    }

    pub fn remaining(&self) -> &SourceAmounts {
        &self.remaining
    }

    pub fn remaining_total(&self) -> Money {
        self.remaining.total()
    }

    /// Draw `amount` across the sources in priority order.
    ///
    /// Each source gives up to its remaining capacity. Whatever is left once
    /// every source is exhausted comes back as `unfinanced`; the ledger is
    /// never driven negative. Negative requests draw nothing.
    pub fn allocate(&mut self, amount: Money) -> Allocation {
        let mut outstanding = amount.max(Decimal::ZERO);
        let mut drawn = SourceAmounts::default();

        for source in FundingSource::PRIORITY {
            if outstanding.is_zero() {
                break;
            }
            let available = self.remaining.get(source);
            if available <= Decimal::ZERO {
                continue;
            }
            let draw = outstanding.min(available);
            *self.remaining.get_mut(source) -= draw;
            *drawn.get_mut(source) += draw;
            outstanding -= draw;
        }

        Allocation {
            drawn,
            unfinanced: outstanding,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn ledger() -> FinancingLedger {
        FinancingLedger::new(SourceAmounts {
            land_loan: dec!(100),
            equity: dec!(50),
            support_loan: dec!(25),
        })
    }

    #[test]
    fn test_land_loan_drawn_first() {
        let mut l = ledger();
        let a = l.allocate(dec!(80));
        assert_eq!(a.drawn.land_loan, dec!(80));
        assert_eq!(a.drawn.equity, Decimal::ZERO);
        assert_eq!(a.unfinanced, Decimal::ZERO);
        assert_eq!(l.remaining().land_loan, dec!(20));
    }

    #[test]
    fn test_cascade_across_sources() {
        let mut l = ledger();
        let a = l.allocate(dec!(160));
        assert_eq!(a.drawn.land_loan, dec!(100));
        assert_eq!(a.drawn.equity, dec!(50));
        assert_eq!(a.drawn.support_loan, dec!(10));
        assert_eq!(a.drawn.total(), dec!(160));
        assert_eq!(l.remaining().support_loan, dec!(15));
    }

    #[test]
    fn test_shortfall_reported_as_unfinanced() {
        let mut l = ledger();
        let a = l.allocate(dec!(200));
        assert_eq!(a.drawn.total(), dec!(175));
        assert_eq!(a.unfinanced, dec!(25));
        assert_eq!(l.remaining_total(), Decimal::ZERO);

        let again = l.allocate(dec!(10));
        assert_eq!(again.drawn.total(), Decimal::ZERO);
        assert_eq!(again.unfinanced, dec!(10));
    }

    #[test]
    fn test_successive_draws_conserve_capacity() {
        let mut l = ledger();
        let mut drawn = SourceAmounts::default();
        for amount in [dec!(33.33), dec!(0), dec!(71.2), dec!(12.01), dec!(40)] {
            let before = l.remaining_total();
            let a = l.allocate(amount);
            assert_eq!(a.drawn.total(), amount);
            assert_eq!(before - l.remaining_total(), amount);
            drawn.accumulate(&a.drawn);
        }
        let mut restored = *l.remaining();
        restored.accumulate(&drawn);
        assert_eq!(restored, *ledger().remaining());
    }

    #[test]
    fn test_negative_request_draws_nothing() {
        let mut l = ledger();
        let a = l.allocate(dec!(-5));
        assert_eq!(a, Allocation::default());
        assert_eq!(l, ledger());
    }

    #[test]
    fn test_only_loans_bear_interest() {
        assert!(FundingSource::LandLoan.bears_interest());
        assert!(FundingSource::SupportLoan.bears_interest());
        assert!(!FundingSource::Equity.bears_interest());
    }
}
