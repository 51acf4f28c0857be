use chrono::Days;
use log::info;
use std::time::Instant;

use crate::error::RenoDealError;
use crate::types::{with_metadata, ComputationOutput};
use crate::RenoDealResult;

use super::costs::{aggregate_costs, check_acquisition_financing};
use super::engine::run_financing;
use super::inputs::DealInputs;
use super::profitability::compute_profitability;
use super::results::{assemble_results, project_totals, DealResults};
use super::schedule::generate_quarters;

/// Simulate a buy-renovate-resell deal from a complete input snapshot.
///
/// Fails with `InsufficientFinancing` when the three sources cannot cover
/// acquisition plus filing fee; nothing is simulated in that case. Every
/// other anomaly (unfinanced residuals, zero areas or duration, an IRR with
/// no root in the bracket) is absorbed and reported in `warnings`.
///
/// Runs are pure: each call builds its own ledger and accumulators.
pub fn simulate(inputs: &DealInputs) -> RenoDealResult<ComputationOutput<DealResults>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    let costs = aggregate_costs(inputs);
    check_acquisition_financing(inputs, &costs)?;

    if inputs.duration_days == 0 {
        warnings.push(
            "Zero project duration: single zero-day quarter, no interest or commission accrued".into(),
        );
    }
    let schedule = generate_quarters(inputs.purchase_date, inputs.duration_days)?;
    let sale_date = inputs
        .purchase_date
        .checked_add_days(Days::new(u64::from(inputs.duration_days)))
        .ok_or_else(|| {
            RenoDealError::DateError(format!(
                "sale date {} + {} days is out of range",
                inputs.purchase_date, inputs.duration_days
            ))
        })?;

    let mut run = run_financing(inputs, &costs, &schedule);
    warnings.append(&mut run.warnings);

    let totals = project_totals(inputs, &costs, &run);
    let profitability = compute_profitability(inputs, totals.project, sale_date, &mut warnings)?;

    let results = assemble_results(inputs, costs, run, totals, profitability)?;

    info!(
        "Simulated {} quarters: project cost {}, net margin {}, IRR {}%",
        results.quarters.len(),
        results.totals.project.round_dp(2),
        results.profitability.net_margin.round_dp(2),
        results.profitability.irr_percent.round_dp(4)
    );

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Buy-Renovate-Resell Feasibility (Quarterly Financing Waterfall)",
        inputs,
        warnings,
        elapsed,
        results,
    ))
}
