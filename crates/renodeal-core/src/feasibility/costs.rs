use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::RenoDealError;
use crate::types::Money;
use crate::RenoDealResult;

use super::inputs::DealInputs;

/// Acquisition cost detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcquisitionCosts {
    pub purchase_price: Money,
    pub notary_fee: Money,
    pub buy_agency_fee: Money,
    pub total: Money,
}

/// Works cost detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorksCosts {
    /// Cost per area times post-works legal area
    pub area_works: Money,
    pub terrace: Money,
    pub furniture: Money,
    pub demolition: Money,
    /// area works + terrace + furniture + demolition
    pub base: Money,
    pub contingency: Money,
    pub project_management: Money,
    pub total: Money,
}

/// Miscellaneous cost detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MiscCosts {
    pub technical_fees: Money,
    pub prorated_land_tax: Money,
    pub diagnostics: Money,
    pub total: Money,
}

/// Non-financing project costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostBreakdown {
    pub acquisition: AcquisitionCosts,
    pub works: WorksCosts,
    pub misc: MiscCosts,
}

impl CostBreakdown {
    /// Amount that must be financed on day one: acquisition plus filing fee.
    pub fn upfront_requirement(&self, inputs: &DealInputs) -> Money {
        self.acquisition.total + inputs.filing_fee
    }
}

/// Sum the acquisition, works, and miscellaneous cost categories.
pub fn aggregate_costs(inputs: &DealInputs) -> CostBreakdown {
    let notary_fee = inputs.purchase_price * inputs.notary_fee_pct / Decimal::ONE_HUNDRED;
    let buy_agency_fee = inputs.purchase_price * inputs.buy_agency_fee_pct / Decimal::ONE_HUNDRED;
    let acquisition = AcquisitionCosts {
        purchase_price: inputs.purchase_price,
        notary_fee,
        buy_agency_fee,
        total: inputs.purchase_price + notary_fee + buy_agency_fee,
    };

    let area_works = inputs.works_cost_per_area * inputs.legal_area_after_works;
    let base = area_works + inputs.terrace_cost + inputs.furniture_cost + inputs.demolition_cost;
    let contingency = base * inputs.contingency_pct / Decimal::ONE_HUNDRED;
    // Management fee applies on top of contingency.
    let project_management = (base + contingency) * inputs.project_management_pct / Decimal::ONE_HUNDRED;
    let works = WorksCosts {
        area_works,
        terrace: inputs.terrace_cost,
        furniture: inputs.furniture_cost,
        demolition: inputs.demolition_cost,
        base,
        contingency,
        project_management,
        total: base + contingency + project_management,
    };

    let misc = MiscCosts {
        technical_fees: inputs.technical_fees,
        prorated_land_tax: inputs.prorated_land_tax,
        diagnostics: inputs.diagnostics_cost,
        total: inputs.technical_fees + inputs.prorated_land_tax + inputs.diagnostics_cost,
    };

    CostBreakdown {
        acquisition,
        works,
        misc,
    }
}

/// Whether the three sources together cover acquisition plus filing fee.
pub fn acquisition_financeable(inputs: &DealInputs, costs: &CostBreakdown) -> bool {
    inputs.financing_capacity().total() >= costs.upfront_requirement(inputs)
}

/// Fail with `InsufficientFinancing` when acquisition cannot be financed.
pub fn check_acquisition_financing(inputs: &DealInputs, costs: &CostBreakdown) -> RenoDealResult<()> {
    let available = inputs.financing_capacity().total();
    let required = costs.upfront_requirement(inputs);
    if available < required {
        return Err(RenoDealError::InsufficientFinancing {
            available,
            required,
            shortfall: required - available,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn base_inputs() -> DealInputs {
        DealInputs {
            purchase_price: dec!(300000),
            listed_price: dec!(320000),
            notary_fee_pct: dec!(2.5),
            buy_agency_fee_pct: dec!(4),
            sell_agency_fee_pct: dec!(3.5),
            filing_fee: dec!(5000),
            works_cost_per_area: dec!(1000),
            project_management_pct: dec!(8),
            contingency_pct: dec!(3),
            terrace_cost: dec!(2000),
            demolition_cost: dec!(3000),
            technical_fees: dec!(1500),
            prorated_land_tax: dec!(4500),
            diagnostics_cost: dec!(1500),
            furniture_cost: dec!(5000),
            land_loan_amount: dec!(200000),
            equity_amount: dec!(100000),
            support_loan_amount: dec!(50000),
            interest_rate_pct: dec!(4.5),
            commission_rate_pct: dec!(1),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap(),
            duration_days: 365,
            legal_area_before_works: dec!(50),
            weighted_area_before_works: dec!(50),
            legal_area_after_works: dec!(50),
            terrace_area_after_works: Decimal::ZERO,
            weighted_area_after_works: dec!(50),
            target_price_per_weighted_area: dec!(9000),
        }
    }

    #[test]
    fn test_acquisition_totals() {
        let costs = aggregate_costs(&base_inputs());
        assert_eq!(costs.acquisition.notary_fee, dec!(7500));
        assert_eq!(costs.acquisition.buy_agency_fee, dec!(12000));
        assert_eq!(costs.acquisition.total, dec!(319500));
    }

    #[test]
    fn test_works_contingency_then_management() {
        let costs = aggregate_costs(&base_inputs());
        // base = 50 * 1000 + 2000 + 5000 + 3000 = 60_000
        assert_eq!(costs.works.base, dec!(60000));
        assert_eq!(costs.works.contingency, dec!(1800));
        // (60_000 + 1_800) * 8% = 4_944
        assert_eq!(costs.works.project_management, dec!(4944));
        assert_eq!(costs.works.total, dec!(66744));
    }

    #[test]
    fn test_misc_total() {
        let costs = aggregate_costs(&base_inputs());
        assert_eq!(costs.misc.total, dec!(7500));
    }

    #[test]
    fn test_financing_check_passes_at_exact_requirement() {
        let mut inputs = base_inputs();
        // requirement = 319_500 + 5_000
        inputs.land_loan_amount = dec!(324500);
        inputs.equity_amount = Decimal::ZERO;
        inputs.support_loan_amount = Decimal::ZERO;
        let costs = aggregate_costs(&inputs);
        assert!(acquisition_financeable(&inputs, &costs));
        assert!(check_acquisition_financing(&inputs, &costs).is_ok());
    }

    #[test]
    fn test_financing_check_reports_shortfall() {
        let mut inputs = base_inputs();
        inputs.land_loan_amount = dec!(100000);
        let costs = aggregate_costs(&inputs);
        assert!(!acquisition_financeable(&inputs, &costs));
        match check_acquisition_financing(&inputs, &costs) {
            Err(RenoDealError::InsufficientFinancing {
                available,
                required,
                shortfall,
            }) => {
                assert_eq!(available, dec!(250000));
                assert_eq!(required, dec!(324500));
                assert_eq!(shortfall, dec!(74500));
            }
            other => panic!("expected InsufficientFinancing, got {other:?}"),
        }
    }
}
