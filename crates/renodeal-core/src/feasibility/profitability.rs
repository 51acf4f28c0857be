use chrono::NaiveDate;
use log::warn;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::time_value::{irr_bisection, IRR_LOWER_BOUND, IRR_TOLERANCE, IRR_UPPER_BOUND};
use crate::types::{percent_of, safe_div, Money, Rate};
use crate::RenoDealResult;

use super::inputs::DealInputs;

/// Resale margins and returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profitability {
    /// Weighted area times target price, agency fees included
    pub sale_price_incl_fees: Money,
    /// Net of the sell-side agency fee
    pub sale_price_excl_fees: Money,
    pub sell_agency_fee: Money,
    pub gross_margin: Money,
    pub net_margin: Money,
    /// Net margin over total project cost, in percent
    pub roi_percent: Rate,
    /// Net margin spread evenly over the duration, per duration unit (day)
    pub monthly_cash_flow: Money,
    /// Per-period IRR of the project cash flows, in percent
    pub irr_percent: Rate,
    pub sale_date: NaiveDate,
}

/// Project cash flows used for the IRR:
/// `[-cost, cash_flow × duration_days, net_margin]`.
pub fn irr_cash_flows(
    total_project_cost: Money,
    monthly_cash_flow: Money,
    duration_days: u32,
    net_margin: Money,
) -> Vec<Money> {
    let mut flows = Vec::with_capacity(duration_days as usize + 2);
    flows.push(-total_project_cost);
    flows.extend(std::iter::repeat(monthly_cash_flow).take(duration_days as usize));
    flows.push(net_margin);
    flows
}

/// Compute sale prices, margins, ROI and IRR for a given total project cost.
pub fn compute_profitability(
    inputs: &DealInputs,
    total_project_cost: Money,
    sale_date: NaiveDate,
    warnings: &mut Vec<String>,
) -> RenoDealResult<Profitability> {
    let sale_price_incl_fees = inputs.weighted_area_after_works * inputs.target_price_per_weighted_area;
    let sale_price_excl_fees = safe_div(
        sale_price_incl_fees,
        Decimal::ONE + inputs.sell_agency_fee_pct / Decimal::ONE_HUNDRED,
    );

    let gross_margin = sale_price_incl_fees - total_project_cost;
    let net_margin = sale_price_excl_fees - total_project_cost;
    let roi_percent = percent_of(net_margin, total_project_cost);
    let monthly_cash_flow = safe_div(net_margin, Decimal::from(inputs.duration_days));

    let flows = irr_cash_flows(
        total_project_cost,
        monthly_cash_flow,
        inputs.duration_days,
        net_margin,
    );
    let irr = irr_bisection(&flows)?;
    if (irr - IRR_LOWER_BOUND).abs() <= IRR_TOLERANCE || (IRR_UPPER_BOUND - irr).abs() <= IRR_TOLERANCE {
        warn!("IRR search converged onto the bracket edge at {irr}");
        warnings.push(format!(
            "IRR pinned to the search bound ({:.2}%); cash flows have no root inside [-99%, 100%]",
            irr * Decimal::ONE_HUNDRED
        ));
    }

    Ok(Profitability {
        sale_price_incl_fees,
        sale_price_excl_fees,
        sell_agency_fee: sale_price_incl_fees - sale_price_excl_fees,
        gross_margin,
        net_margin,
        roi_percent,
        monthly_cash_flow,
        irr_percent: irr * Decimal::ONE_HUNDRED,
        sale_date,
    })
}
