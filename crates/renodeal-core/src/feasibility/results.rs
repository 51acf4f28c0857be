use serde::{Deserialize, Serialize};

use crate::time_value::monthly_payment;
use crate::types::{percent_of, safe_div, Money, Rate};
use crate::RenoDealResult;

use super::costs::CostBreakdown;
use super::engine::{FinancingRun, LoanAmounts, QuarterlyRecord};
use super::inputs::DealInputs;
use super::profitability::Profitability;
use super::waterfall::SourceAmounts;

/// Headline cost totals. `project = acquisition + works + misc + financing`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectTotals {
    pub acquisition: Money,
    pub works: Money,
    pub misc: Money,
    pub financing: Money,
    pub project: Money,
}

/// Indicative level monthly payments over the project duration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyPayments {
    pub months: u32,
    pub land_loan: Money,
    pub support_loan: Money,
    pub total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancingSummary {
    /// Capacity granted per source
    pub allocated: SourceAmounts,
    pub allocated_total: Money,
    /// Amount actually drawn per source over the project
    pub drawn: SourceAmounts,
    pub drawn_total: Money,
    /// Each source's share of the drawn total, in percent
    pub drawn_share_percent: SourceAmounts,
    pub interest: LoanAmounts,
    pub total_interest: Money,
    pub commission: Money,
    pub filing_fee: Money,
    /// Interest + commission + filing fee
    pub total_cost: Money,
    pub monthly_payments: MonthlyPayments,
    /// Costs recognised but not covered by any source
    pub unfinanced_total: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSummary {
    pub notary_fee: Money,
    pub buy_agency_fee: Money,
    pub sell_agency_fee: Money,
    pub filing_fee: Money,
    pub total: Money,
}

/// Price ratios per square metre. Zero areas give zero ratios.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePerArea {
    pub purchase_per_weighted_area: Money,
    pub purchase_per_legal_area: Money,
    pub cost_per_weighted_area: Money,
    pub cost_per_legal_area: Money,
    pub sale_per_weighted_area: Money,
    pub sale_per_legal_area: Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostCategory {
    Acquisition,
    Works,
    Misc,
    Financing,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostShare {
    pub category: CostCategory,
    pub amount: Money,
    /// Share of total project cost, in percent
    pub share_percent: Rate,
}

/// Complete outcome of one simulation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DealResults {
    pub totals: ProjectTotals,
    pub costs: CostBreakdown,
    pub financing: FinancingSummary,
    pub fees: FeeSummary,
    pub price_per_area: PricePerArea,
    pub profitability: Profitability,
    pub cost_breakdown: Vec<CostShare>,
    pub cost_breakdown_total: Money,
    /// Whether the three sources cover acquisition plus filing fee
    pub financing_sufficient: bool,
    /// Whether the three sources cover the total project cost
    pub financing_covers_project: bool,
    pub quarters: Vec<QuarterlyRecord>,
}

/// Whole months covering `days`, rounded up on a 365-day year.
pub fn duration_months(days: u32) -> u32 {
    ((u64::from(days) * 12 + 364) / 365) as u32
}

/// Project totals from the cost breakdown and the financing run.
pub fn project_totals(inputs: &DealInputs, costs: &CostBreakdown, run: &FinancingRun) -> ProjectTotals {
    let financing = run.total_interest() + run.commission_paid + inputs.filing_fee;
    ProjectTotals {
        acquisition: costs.acquisition.total,
        works: costs.works.total,
        misc: costs.misc.total,
        financing,
        project: costs.acquisition.total + costs.works.total + costs.misc.total + financing,
    }
}

/// Package every computed piece into one `DealResults`.
pub fn assemble_results(
    inputs: &DealInputs,
    costs: CostBreakdown,
    run: FinancingRun,
    totals: ProjectTotals,
    profitability: Profitability,
) -> RenoDealResult<DealResults> {
    let allocated = inputs.financing_capacity();
    let drawn_total = run.drawn_total.total();

    let months = duration_months(inputs.duration_days);
    let monthly_payments = MonthlyPayments {
        months,
        land_loan: monthly_payment(inputs.land_loan_amount, inputs.interest_rate_pct, months)?,
        support_loan: monthly_payment(inputs.support_loan_amount, inputs.interest_rate_pct, months)?,
        total: monthly_payment(allocated.debt(), inputs.interest_rate_pct, months)?,
    };

    let financing = FinancingSummary {
        allocated,
        allocated_total: allocated.total(),
        drawn: run.drawn_total,
        drawn_total,
        drawn_share_percent: SourceAmounts {
            land_loan: percent_of(run.drawn_total.land_loan, drawn_total),
            equity: percent_of(run.drawn_total.equity, drawn_total),
            support_loan: percent_of(run.drawn_total.support_loan, drawn_total),
        },
        interest: run.interest_paid,
        total_interest: run.total_interest(),
        commission: run.commission_paid,
        filing_fee: inputs.filing_fee,
        total_cost: totals.financing,
        monthly_payments,
        unfinanced_total: run.unfinanced_total,
    };

    let fees = FeeSummary {
        notary_fee: costs.acquisition.notary_fee,
        buy_agency_fee: costs.acquisition.buy_agency_fee,
        sell_agency_fee: profitability.sell_agency_fee,
        filing_fee: inputs.filing_fee,
        total: costs.acquisition.notary_fee
            + costs.acquisition.buy_agency_fee
            + profitability.sell_agency_fee
            + inputs.filing_fee,
    };

    let price_per_area = PricePerArea {
        purchase_per_weighted_area: safe_div(inputs.purchase_price, inputs.weighted_area_before_works),
        purchase_per_legal_area: safe_div(inputs.purchase_price, inputs.legal_area_before_works),
        cost_per_weighted_area: safe_div(totals.project, inputs.weighted_area_after_works),
        cost_per_legal_area: safe_div(totals.project, inputs.legal_area_after_works),
        sale_per_weighted_area: safe_div(
            profitability.sale_price_incl_fees,
            inputs.weighted_area_after_works,
        ),
        sale_per_legal_area: safe_div(profitability.sale_price_incl_fees, inputs.legal_area_after_works),
    };

    let cost_breakdown: Vec<CostShare> = [
        (CostCategory::Acquisition, totals.acquisition),
        (CostCategory::Works, totals.works),
        (CostCategory::Misc, totals.misc),
        (CostCategory::Financing, totals.financing),
    ]
    .into_iter()
    .map(|(category, amount)| CostShare {
        category,
        amount,
        share_percent: percent_of(amount, totals.project),
    })
    .collect();
    let cost_breakdown_total = cost_breakdown.iter().map(|c| c.amount).sum();

    Ok(DealResults {
        financing_sufficient: allocated.total() >= costs.upfront_requirement(inputs),
        financing_covers_project: allocated.total() >= totals.project,
        totals,
        costs,
        financing,
        fees,
        price_per_area,
        profitability,
        cost_breakdown,
        cost_breakdown_total,
        quarters: run.quarters,
    })
}
