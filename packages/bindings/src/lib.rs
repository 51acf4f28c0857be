use chrono::NaiveDate;
use napi::Result as NapiResult;
use napi_derive::napi;
use serde::{Deserialize, Serialize};

use renodeal_core::feasibility::{
    DealInputs, DealInputsDraft, DealRecord, InMemoryDealRepository, PropertyProfile,
};
use renodeal_core::feasibility::results::DealResults;
use renodeal_core::ComputationOutput;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

fn parse_date(value: &str) -> NapiResult<NaiveDate> {
    value.parse::<NaiveDate>().map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Simulation
// ---------------------------------------------------------------------------

/// Simulate a fully populated `DealInputs` JSON document.
#[napi]
pub fn simulate_deal(input_json: String) -> NapiResult<String> {
    let input: DealInputs = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = renodeal_core::feasibility::simulate(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Fill a partial input record with defaults. `today` is `YYYY-MM-DD`.
#[napi]
pub fn resolve_deal_inputs(draft_json: String, profile_json: String, today: String) -> NapiResult<String> {
    let draft: DealInputsDraft = serde_json::from_str(&draft_json).map_err(to_napi_error)?;
    let profile: PropertyProfile = serde_json::from_str(&profile_json).map_err(to_napi_error)?;
    let inputs = renodeal_core::feasibility::resolve(&draft, &profile, parse_date(&today)?)
        .map_err(to_napi_error)?;
    serde_json::to_string(&inputs).map_err(to_napi_error)
}

#[napi]
pub fn quarter_schedule(purchase_date: String, duration_days: u32) -> NapiResult<String> {
    let quarters = renodeal_core::feasibility::generate_quarters(parse_date(&purchase_date)?, duration_days)
        .map_err(to_napi_error)?;
    serde_json::to_string(&quarters).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Recalculation
// ---------------------------------------------------------------------------

/// Output of `recalculate_deal`: the record to persist and the run envelope.
#[derive(Serialize)]
struct Recalculation {
    record: DealRecord,
    output: ComputationOutput<DealResults>,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RecalculateRequest {
    stored: Option<DealInputsDraft>,
    overrides: DealInputsDraft,
    profile: PropertyProfile,
}

/// Merge a stored record with overrides, simulate, and hand back the
/// record the caller should persist. The caller owns the store.
///
/// `request_json` is `{ "stored": {...}?, "overrides": {...}, "profile": {...} }`.
#[napi]
pub fn recalculate_deal(request_json: String, today: String) -> NapiResult<String> {
    let request: RecalculateRequest = serde_json::from_str(&request_json).map_err(to_napi_error)?;
    let repo = InMemoryDealRepository::new();
    if let Some(stored) = request.stored {
        repo.insert(
            0,
            DealRecord {
                inputs: stored,
                results: None,
            },
        )
        .map_err(to_napi_error)?;
    }
    let output = renodeal_core::feasibility::recalculate(
        &repo,
        0,
        request.overrides,
        &request.profile,
        parse_date(&today)?,
    )
    .map_err(to_napi_error)?;
    let record = repo
        .get(0)
        .map_err(to_napi_error)?
        .ok_or_else(|| napi::Error::from_reason("recalculated record was not saved"))?;
    serde_json::to_string(&Recalculation { record, output }).map_err(to_napi_error)
}
