//! Deal inputs and the single defaults pass that produces them.
//!
//! Persisted records and request bodies are partial: any field may be
//! missing. [`DealInputsDraft`] models that shape, [`DealInputsDraft::merge`]
//! layers a request over a stored record, and [`resolve`] fills every gap
//! once so the engine only ever sees a fully populated [`DealInputs`].

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::RenoDealError;
use crate::types::{Area, Money, Rate};
use crate::RenoDealResult;

use super::waterfall::SourceAmounts;

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

pub const DEFAULT_NOTARY_FEE_PCT: Rate = dec!(2.5);
pub const DEFAULT_BUY_AGENCY_FEE_PCT: Rate = dec!(0);
pub const DEFAULT_SELL_AGENCY_FEE_PCT: Rate = dec!(3.5);
pub const DEFAULT_FILING_FEE: Money = dec!(5000);
pub const DEFAULT_WORKS_COST_PER_AREA: Money = dec!(1200);
pub const DEFAULT_PROJECT_MANAGEMENT_PCT: Rate = dec!(8);
pub const DEFAULT_CONTINGENCY_PCT: Rate = dec!(3);
pub const DEFAULT_TERRACE_COST: Money = dec!(0);
pub const DEFAULT_DEMOLITION_COST: Money = dec!(3500);
pub const DEFAULT_TECHNICAL_FEES: Money = dec!(1500);
pub const DEFAULT_PRORATED_LAND_TAX: Money = dec!(4500);
pub const DEFAULT_DIAGNOSTICS_COST: Money = dec!(1500);
pub const DEFAULT_FURNITURE_COST: Money = dec!(0);
pub const DEFAULT_LAND_LOAN: Money = dec!(500000);
pub const DEFAULT_EQUITY: Money = dec!(500000);
pub const DEFAULT_SUPPORT_LOAN: Money = dec!(500000);
pub const DEFAULT_INTEREST_RATE_PCT: Rate = dec!(4.5);
pub const DEFAULT_COMMISSION_RATE_PCT: Rate = dec!(1);
pub const DEFAULT_DURATION_DAYS: u32 = 365;
pub const DEFAULT_TARGET_PRICE_PER_AREA: Money = dec!(10000);
/// Share of terrace surface counted in the weighted area.
pub const DEFAULT_TERRACE_WEIGHTING: Rate = dec!(0.3);

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Fully populated inputs for one simulation run.
///
/// Rates ending in `_pct` are on a 0–100 scale and divided by 100 at use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DealInputs {
    /// Negotiated purchase price
    pub purchase_price: Money,
    /// Asking price before negotiation
    pub listed_price: Money,
    pub notary_fee_pct: Rate,
    pub buy_agency_fee_pct: Rate,
    pub sell_agency_fee_pct: Rate,
    /// Lender filing fee, paid once at acquisition
    pub filing_fee: Money,
    /// Works cost per square metre of post-works legal area
    pub works_cost_per_area: Money,
    pub project_management_pct: Rate,
    pub contingency_pct: Rate,
    pub terrace_cost: Money,
    pub demolition_cost: Money,
    pub technical_fees: Money,
    pub prorated_land_tax: Money,
    pub diagnostics_cost: Money,
    pub furniture_cost: Money,
    /// Land loan capacity (drawn first)
    pub land_loan_amount: Money,
    /// Equity capacity (drawn second, bears no interest)
    pub equity_amount: Money,
    /// Support loan capacity (drawn last)
    pub support_loan_amount: Money,
    /// Annual interest rate applied to both loans
    pub interest_rate_pct: Rate,
    /// Annual commission on the combined loan capacities
    pub commission_rate_pct: Rate,
    pub purchase_date: NaiveDate,
    pub duration_days: u32,
    pub legal_area_before_works: Area,
    pub weighted_area_before_works: Area,
    pub legal_area_after_works: Area,
    pub terrace_area_after_works: Area,
    pub weighted_area_after_works: Area,
    /// Realised sale price per weighted square metre, agency fees included
    pub target_price_per_weighted_area: Money,
}

impl DealInputs {
    /// Capacity of each funding source at the start of a run.
    pub fn financing_capacity(&self) -> SourceAmounts {
        SourceAmounts {
            land_loan: self.land_loan_amount,
            equity: self.equity_amount,
            support_loan: self.support_loan_amount,
        }
    }
}

/// General information about the property, recorded before any business plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PropertyProfile {
    /// Legal (habitable) area before works
    pub legal_area: Area,
    /// Terrace area before works
    pub terrace_area: Area,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub terrace_weighting: Option<Rate>,
}

impl PropertyProfile {
    pub fn terrace_weighting(&self) -> Rate {
        self.terrace_weighting.unwrap_or(DEFAULT_TERRACE_WEIGHTING)
    }

    /// Legal area plus the weighted share of the terrace.
    pub fn weighted_area(&self) -> Area {
        self.legal_area + self.terrace_area * self.terrace_weighting()
    }
}

/// Partial deal inputs as persisted or received from a request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DealInputsDraft {
    pub purchase_price: Option<Money>,
    pub listed_price: Option<Money>,
    pub notary_fee_pct: Option<Rate>,
    pub buy_agency_fee_pct: Option<Rate>,
    pub sell_agency_fee_pct: Option<Rate>,
    pub filing_fee: Option<Money>,
    pub works_cost_per_area: Option<Money>,
    pub project_management_pct: Option<Rate>,
    pub contingency_pct: Option<Rate>,
    pub terrace_cost: Option<Money>,
    pub demolition_cost: Option<Money>,
    pub technical_fees: Option<Money>,
    pub prorated_land_tax: Option<Money>,
    pub diagnostics_cost: Option<Money>,
    pub furniture_cost: Option<Money>,
    pub land_loan_amount: Option<Money>,
    pub equity_amount: Option<Money>,
    pub support_loan_amount: Option<Money>,
    pub interest_rate_pct: Option<Rate>,
    pub commission_rate_pct: Option<Rate>,
    pub purchase_date: Option<NaiveDate>,
    pub duration_days: Option<u32>,
    pub legal_area_after_works: Option<Area>,
    pub terrace_area_after_works: Option<Area>,
    pub weighted_area_after_works: Option<Area>,
    pub target_price_per_weighted_area: Option<Money>,
}

impl DealInputsDraft {
    /// Layer `overrides` on top of `self`: any field set in `overrides` wins.
    pub fn merge(self, overrides: DealInputsDraft) -> DealInputsDraft {
        DealInputsDraft {
            purchase_price: overrides.purchase_price.or(self.purchase_price),
            listed_price: overrides.listed_price.or(self.listed_price),
            notary_fee_pct: overrides.notary_fee_pct.or(self.notary_fee_pct),
            buy_agency_fee_pct: overrides.buy_agency_fee_pct.or(self.buy_agency_fee_pct),
            sell_agency_fee_pct: overrides.sell_agency_fee_pct.or(self.sell_agency_fee_pct),
            filing_fee: overrides.filing_fee.or(self.filing_fee),
            works_cost_per_area: overrides.works_cost_per_area.or(self.works_cost_per_area),
            project_management_pct: overrides
                .project_management_pct
                .or(self.project_management_pct),
            contingency_pct: overrides.contingency_pct.or(self.contingency_pct),
            terrace_cost: overrides.terrace_cost.or(self.terrace_cost),
            demolition_cost: overrides.demolition_cost.or(self.demolition_cost),
            technical_fees: overrides.technical_fees.or(self.technical_fees),
            prorated_land_tax: overrides.prorated_land_tax.or(self.prorated_land_tax),
            diagnostics_cost: overrides.diagnostics_cost.or(self.diagnostics_cost),
            furniture_cost: overrides.furniture_cost.or(self.furniture_cost),
            land_loan_amount: overrides.land_loan_amount.or(self.land_loan_amount),
            equity_amount: overrides.equity_amount.or(self.equity_amount),
            support_loan_amount: overrides.support_loan_amount.or(self.support_loan_amount),
            interest_rate_pct: overrides.interest_rate_pct.or(self.interest_rate_pct),
            commission_rate_pct: overrides.commission_rate_pct.or(self.commission_rate_pct),
            purchase_date: overrides.purchase_date.or(self.purchase_date),
            duration_days: overrides.duration_days.or(self.duration_days),
            legal_area_after_works: overrides
                .legal_area_after_works
                .or(self.legal_area_after_works),
            terrace_area_after_works: overrides
                .terrace_area_after_works
                .or(self.terrace_area_after_works),
            weighted_area_after_works: overrides
                .weighted_area_after_works
                .or(self.weighted_area_after_works),
            target_price_per_weighted_area: overrides
                .target_price_per_weighted_area
                .or(self.target_price_per_weighted_area),
        }
    }
}

impl From<&DealInputs> for DealInputsDraft {
    fn from(inputs: &DealInputs) -> Self {
        DealInputsDraft {
            purchase_price: Some(inputs.purchase_price),
            listed_price: Some(inputs.listed_price),
            notary_fee_pct: Some(inputs.notary_fee_pct),
            buy_agency_fee_pct: Some(inputs.buy_agency_fee_pct),
            sell_agency_fee_pct: Some(inputs.sell_agency_fee_pct),
            filing_fee: Some(inputs.filing_fee),
            works_cost_per_area: Some(inputs.works_cost_per_area),
            project_management_pct: Some(inputs.project_management_pct),
            contingency_pct: Some(inputs.contingency_pct),
            terrace_cost: Some(inputs.terrace_cost),
            demolition_cost: Some(inputs.demolition_cost),
            technical_fees: Some(inputs.technical_fees),
            prorated_land_tax: Some(inputs.prorated_land_tax),
            diagnostics_cost: Some(inputs.diagnostics_cost),
            furniture_cost: Some(inputs.furniture_cost),
            land_loan_amount: Some(inputs.land_loan_amount),
            equity_amount: Some(inputs.equity_amount),
            support_loan_amount: Some(inputs.support_loan_amount),
            interest_rate_pct: Some(inputs.interest_rate_pct),
            commission_rate_pct: Some(inputs.commission_rate_pct),
            purchase_date: Some(inputs.purchase_date),
            duration_days: Some(inputs.duration_days),
            legal_area_after_works: Some(inputs.legal_area_after_works),
            terrace_area_after_works: Some(inputs.terrace_area_after_works),
            weighted_area_after_works: Some(inputs.weighted_area_after_works),
            target_price_per_weighted_area: Some(inputs.target_price_per_weighted_area),
        }
    }
}

// ---------------------------------------------------------------------------
// Defaults pass
// ---------------------------------------------------------------------------

/// Fill every missing field of `draft` and validate the result.
///
/// Post-works areas fall back to the pre-works areas of `profile`; the
/// purchase date falls back to `today`, which the caller supplies.
pub fn resolve(
    draft: &DealInputsDraft,
    profile: &PropertyProfile,
    today: NaiveDate,
) -> RenoDealResult<DealInputs> {
    validate_profile(profile)?;

    let inputs = DealInputs {
        purchase_price: draft.purchase_price.unwrap_or(Decimal::ZERO),
        listed_price: draft.listed_price.unwrap_or(Decimal::ZERO),
        notary_fee_pct: draft.notary_fee_pct.unwrap_or(DEFAULT_NOTARY_FEE_PCT),
        buy_agency_fee_pct: draft.buy_agency_fee_pct.unwrap_or(DEFAULT_BUY_AGENCY_FEE_PCT),
        sell_agency_fee_pct: draft
            .sell_agency_fee_pct
            .unwrap_or(DEFAULT_SELL_AGENCY_FEE_PCT),
        filing_fee: draft.filing_fee.unwrap_or(DEFAULT_FILING_FEE),
        works_cost_per_area: draft
            .works_cost_per_area
            .unwrap_or(DEFAULT_WORKS_COST_PER_AREA),
        project_management_pct: draft
            .project_management_pct
            .unwrap_or(DEFAULT_PROJECT_MANAGEMENT_PCT),
        contingency_pct: draft.contingency_pct.unwrap_or(DEFAULT_CONTINGENCY_PCT),
        terrace_cost: draft.terrace_cost.unwrap_or(DEFAULT_TERRACE_COST),
        demolition_cost: draft.demolition_cost.unwrap_or(DEFAULT_DEMOLITION_COST),
        technical_fees: draft.technical_fees.unwrap_or(DEFAULT_TECHNICAL_FEES),
        prorated_land_tax: draft.prorated_land_tax.unwrap_or(DEFAULT_PRORATED_LAND_TAX),
        diagnostics_cost: draft.diagnostics_cost.unwrap_or(DEFAULT_DIAGNOSTICS_COST),
        furniture_cost: draft.furniture_cost.unwrap_or(DEFAULT_FURNITURE_COST),
        land_loan_amount: draft.land_loan_amount.unwrap_or(DEFAULT_LAND_LOAN),
        equity_amount: draft.equity_amount.unwrap_or(DEFAULT_EQUITY),
        support_loan_amount: draft.support_loan_amount.unwrap_or(DEFAULT_SUPPORT_LOAN),
        interest_rate_pct: draft.interest_rate_pct.unwrap_or(DEFAULT_INTEREST_RATE_PCT),
        commission_rate_pct: draft
            .commission_rate_pct
            .unwrap_or(DEFAULT_COMMISSION_RATE_PCT),
        purchase_date: draft.purchase_date.unwrap_or(today),
        duration_days: draft.duration_days.unwrap_or(DEFAULT_DURATION_DAYS),
        legal_area_before_works: profile.legal_area,
        weighted_area_before_works: profile.weighted_area(),
        legal_area_after_works: draft.legal_area_after_works.unwrap_or(profile.legal_area),
        terrace_area_after_works: draft
            .terrace_area_after_works
            .unwrap_or(profile.terrace_area),
        weighted_area_after_works: draft
            .weighted_area_after_works
            .unwrap_or_else(|| profile.weighted_area()),
        target_price_per_weighted_area: draft
            .target_price_per_weighted_area
            .unwrap_or(DEFAULT_TARGET_PRICE_PER_AREA),
    };

    validate_inputs(&inputs)?;
    Ok(inputs)
}

fn validate_profile(profile: &PropertyProfile) -> RenoDealResult<()> {
    require_non_negative("legal_area", profile.legal_area)?;
    require_non_negative("terrace_area", profile.terrace_area)?;
    require_non_negative("terrace_weighting", profile.terrace_weighting())?;
    Ok(())
}

/// Reject negative amounts, rates, and areas.
pub fn validate_inputs(inputs: &DealInputs) -> RenoDealResult<()> {
    let checks: [(&str, Decimal); 26] = [
        ("purchase_price", inputs.purchase_price),
        ("listed_price", inputs.listed_price),
        ("notary_fee_pct", inputs.notary_fee_pct),
        ("buy_agency_fee_pct", inputs.buy_agency_fee_pct),
        ("sell_agency_fee_pct", inputs.sell_agency_fee_pct),
        ("filing_fee", inputs.filing_fee),
        ("works_cost_per_area", inputs.works_cost_per_area),
        ("project_management_pct", inputs.project_management_pct),
        ("contingency_pct", inputs.contingency_pct),
        ("terrace_cost", inputs.terrace_cost),
        ("demolition_cost", inputs.demolition_cost),
        ("technical_fees", inputs.technical_fees),
        ("prorated_land_tax", inputs.prorated_land_tax),
        ("diagnostics_cost", inputs.diagnostics_cost),
        ("furniture_cost", inputs.furniture_cost),
        ("land_loan_amount", inputs.land_loan_amount),
        ("equity_amount", inputs.equity_amount),
        ("support_loan_amount", inputs.support_loan_amount),
        ("interest_rate_pct", inputs.interest_rate_pct),
        ("commission_rate_pct", inputs.commission_rate_pct),
        ("legal_area_before_works", inputs.legal_area_before_works),
        ("weighted_area_before_works", inputs.weighted_area_before_works),
        ("legal_area_after_works", inputs.legal_area_after_works),
        ("terrace_area_after_works", inputs.terrace_area_after_works),
        ("weighted_area_after_works", inputs.weighted_area_after_works),
        (
            "target_price_per_weighted_area",
            inputs.target_price_per_weighted_area,
        ),
    ];
    for (field, value) in checks {
        require_non_negative(field, value)?;
    }
    Ok(())
}

fn require_non_negative(field: &str, value: Decimal) -> RenoDealResult<()> {
    if value < Decimal::ZERO {
        return Err(RenoDealError::InvalidInput {
            field: field.into(),
            reason: "Value cannot be negative".into(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 14).unwrap()
    }

    fn profile() -> PropertyProfile {
        PropertyProfile {
            legal_area: dec!(70),
            terrace_area: dec!(20),
            terrace_weighting: None,
        }
    }

    #[test]
    fn test_resolve_empty_draft_uses_defaults() {
        let inputs = resolve(&DealInputsDraft::default(), &profile(), today()).unwrap();
        assert_eq!(inputs.notary_fee_pct, dec!(2.5));
        assert_eq!(inputs.sell_agency_fee_pct, dec!(3.5));
        assert_eq!(inputs.filing_fee, dec!(5000));
        assert_eq!(inputs.duration_days, 365);
        assert_eq!(inputs.purchase_date, today());
        assert_eq!(inputs.land_loan_amount, dec!(500000));
        assert_eq!(inputs.purchase_price, Decimal::ZERO);
    }

    #[test]
    fn test_areas_fall_back_to_profile() {
        let inputs = resolve(&DealInputsDraft::default(), &profile(), today()).unwrap();
        assert_eq!(inputs.legal_area_after_works, dec!(70));
        assert_eq!(inputs.terrace_area_after_works, dec!(20));
        // 70 + 20 * 0.3
        assert_eq!(inputs.weighted_area_after_works, dec!(76));
        assert_eq!(inputs.weighted_area_before_works, dec!(76));
    }

    #[test]
    fn test_custom_terrace_weighting() {
        let mut p = profile();
        p.terrace_weighting = Some(dec!(0.5));
        assert_eq!(p.weighted_area(), dec!(80));
    }

    #[test]
    fn test_merge_overrides_win() {
        let stored = DealInputsDraft {
            purchase_price: Some(dec!(400000)),
            duration_days: Some(200),
            ..Default::default()
        };
        let request = DealInputsDraft {
            purchase_price: Some(dec!(420000)),
            ..Default::default()
        };
        let merged = stored.merge(request);
        assert_eq!(merged.purchase_price, Some(dec!(420000)));
        assert_eq!(merged.duration_days, Some(200));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let draft = DealInputsDraft {
            purchase_price: Some(dec!(-1)),
            ..Default::default()
        };
        let err = resolve(&draft, &profile(), today()).unwrap_err();
        match err {
            RenoDealError::InvalidInput { field, .. } => assert_eq!(field, "purchase_price"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_draft_round_trips_resolved_inputs() {
        let inputs = resolve(&DealInputsDraft::default(), &profile(), today()).unwrap();
        let again = resolve(&DealInputsDraft::from(&inputs), &profile(), today()).unwrap();
        assert_eq!(inputs, again);
    }

    #[test]
    fn test_partial_json_draft() {
        let draft: DealInputsDraft =
            serde_json::from_str(r#"{"purchase_price":"350000","duration_days":180}"#).unwrap();
        assert_eq!(draft.purchase_price, Some(dec!(350000)));
        assert_eq!(draft.duration_days, Some(180));
        assert!(draft.filing_fee.is_none());
    }
}
