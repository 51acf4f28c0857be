use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use renodeal_core::feasibility::{
    generate_quarters, recalculate, resolve, simulate, DealId, DealInputsDraft, PropertyProfile,
};

use crate::input;
use crate::store::JsonDirDealRepository;

/// Request body accepted by `simulate` and `recalculate`: partial deal
/// inputs plus the property's pre-works areas.
#[derive(Debug, Default, Deserialize)]
pub struct DealRequest {
    #[serde(flatten)]
    pub inputs: DealInputsDraft,
    #[serde(default)]
    pub profile: PropertyProfile,
}

/// Flags shared by the deal commands. Any flag given overrides the file.
#[derive(Args)]
pub struct DealFlags {
    /// Path to JSON or YAML request file
    #[arg(long)]
    pub input: Option<String>,

    /// Purchase price
    #[arg(long)]
    pub purchase_price: Option<Decimal>,

    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub purchase_date: Option<NaiveDate>,

    /// Project duration in days
    #[arg(long)]
    pub duration_days: Option<u32>,

    /// Land loan amount
    #[arg(long)]
    pub land_loan: Option<Decimal>,

    /// Equity contribution
    #[arg(long)]
    pub equity: Option<Decimal>,

    /// Support loan amount
    #[arg(long)]
    pub support_loan: Option<Decimal>,

    /// Annual interest rate in percent
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Target sale price per weighted square metre
    #[arg(long)]
    pub target_price: Option<Decimal>,

    /// Legal area before works
    #[arg(long)]
    pub legal_area: Option<Decimal>,

    /// Terrace area before works
    #[arg(long)]
    pub terrace_area: Option<Decimal>,

    /// Terrace weighting (default 0.3)
    #[arg(long)]
    pub terrace_weighting: Option<Decimal>,

    /// Date used when no purchase date is known (default: today)
    #[arg(long)]
    pub today: Option<NaiveDate>,
}

impl DealFlags {
    fn load_request(&self) -> Result<DealRequest, Box<dyn std::error::Error>> {
        let mut request: DealRequest = if let Some(ref path) = self.input {
            input::file::read_structured(path)?
        } else if let Some(data) = input::stdin::read_stdin()? {
            serde_json::from_value(data)?
        } else {
            DealRequest::default()
        };

        let flags = DealInputsDraft {
            purchase_price: self.purchase_price,
            purchase_date: self.purchase_date,
            duration_days: self.duration_days,
            land_loan_amount: self.land_loan,
            equity_amount: self.equity,
            support_loan_amount: self.support_loan,
            interest_rate_pct: self.interest_rate,
            target_price_per_weighted_area: self.target_price,
            ..Default::default()
        };
        request.inputs = request.inputs.merge(flags);

        if let Some(area) = self.legal_area {
            request.profile.legal_area = area;
        }
        if let Some(area) = self.terrace_area {
            request.profile.terrace_area = area;
        }
        if self.terrace_weighting.is_some() {
            request.profile.terrace_weighting = self.terrace_weighting;
        }
        Ok(request)
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

/// Arguments for a one-off deal simulation
#[derive(Args)]
pub struct SimulateArgs {
    #[command(flatten)]
    pub deal: DealFlags,
}

pub fn run_simulate(args: SimulateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.deal.load_request()?;
    let inputs = resolve(&request.inputs, &request.profile, args.deal.today())?;
    let output = simulate(&inputs)?;
    Ok(serde_json::to_value(output)?)
}

/// Arguments for the quarter schedule
#[derive(Args)]
pub struct ScheduleArgs {
    /// Purchase date (YYYY-MM-DD)
    #[arg(long)]
    pub purchase_date: NaiveDate,

    /// Project duration in days
    #[arg(long, default_value = "365")]
    pub duration_days: u32,
}

pub fn run_schedule(args: ScheduleArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quarters = generate_quarters(args.purchase_date, args.duration_days)?;
    Ok(serde_json::to_value(quarters)?)
}

/// Arguments for recalculating a stored deal
#[derive(Args)]
pub struct RecalculateArgs {
    /// Deal identifier
    #[arg(long)]
    pub deal_id: DealId,

    /// Directory holding one `<id>.json` record per deal
    #[arg(long, default_value = "deals")]
    pub store: String,

    #[command(flatten)]
    pub deal: DealFlags,
}

pub fn run_recalculate(args: RecalculateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request = args.deal.load_request()?;
    let repo = JsonDirDealRepository::open(&args.store)?;
    let output = recalculate(
        &repo,
        args.deal_id,
        request.inputs,
        &request.profile,
        args.deal.today(),
    )?;
    info!("Deal {} saved to {}", args.deal_id, args.store);
    Ok(serde_json::to_value(output)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_request_reads_flattened_inputs_and_profile() {
        let json = r#"{
            "purchase_price": "250000",
            "duration_days": 200,
            "profile": { "legal_area": "40", "terrace_area": "5" }
        }"#;
        let request: DealRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.inputs.purchase_price, Some(dec!(250000)));
        assert_eq!(request.inputs.duration_days, Some(200));
        assert_eq!(request.profile.legal_area, dec!(40));
        assert_eq!(request.profile.terrace_weighting, None);
    }

    #[test]
    fn test_request_without_profile_defaults() {
        let request: DealRequest = serde_json::from_str(r#"{"filing_fee": "4000"}"#).unwrap();
        assert_eq!(request.inputs.filing_fee, Some(dec!(4000)));
        assert_eq!(request.profile, PropertyProfile::default());
    }
}
