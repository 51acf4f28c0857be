//! Persistence seam for deal records.
//!
//! The engine never holds a store; callers pass one in explicitly.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Mutex;

use crate::error::RenoDealError;
use crate::types::ComputationOutput;
use crate::RenoDealResult;

use super::inputs::{resolve, DealInputs, DealInputsDraft, PropertyProfile};
use super::results::DealResults;
use super::simulation::simulate;

pub type DealId = i64;

/// What a store keeps for one deal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DealRecord {
    pub inputs: DealInputsDraft,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results: Option<DealResults>,
}

/// Trait for deal record storage
pub trait DealRepositoryTrait: Send + Sync {
    /// Previously saved inputs for `deal_id`, if any.
    fn load_inputs(&self, deal_id: DealId) -> RenoDealResult<Option<DealInputsDraft>>;
    /// Persist the inputs and results of a successful run, verbatim.
    fn save_run(&self, deal_id: DealId, inputs: &DealInputs, results: &DealResults) -> RenoDealResult<()>;
}

/// Map-backed store for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryDealRepository {
    records: Mutex<HashMap<DealId, DealRecord>>,
}

impl InMemoryDealRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, deal_id: DealId, record: DealRecord) -> RenoDealResult<()> {
        self.lock()?.insert(deal_id, record);
        Ok(())
    }

    pub fn get(&self, deal_id: DealId) -> RenoDealResult<Option<DealRecord>> {
        Ok(self.lock()?.get(&deal_id).cloned())
    }

    fn lock(&self) -> RenoDealResult<std::sync::MutexGuard<'_, HashMap<DealId, DealRecord>>> {
        self.records
            .lock()
            .map_err(|e| RenoDealError::Storage(format!("deal store lock poisoned: {e}")))
    }
}

impl DealRepositoryTrait for InMemoryDealRepository {
    fn load_inputs(&self, deal_id: DealId) -> RenoDealResult<Option<DealInputsDraft>> {
        Ok(self.lock()?.get(&deal_id).map(|r| r.inputs.clone()))
    }

    fn save_run(&self, deal_id: DealId, inputs: &DealInputs, results: &DealResults) -> RenoDealResult<()> {
        self.lock()?.insert(
            deal_id,
            DealRecord {
                inputs: DealInputsDraft::from(inputs),
                results: Some(results.clone()),
            },
        );
        Ok(())
    }
}

/// Load a deal, apply request overrides and defaults, simulate, persist.
///
/// Nothing is written when the simulation is rejected.
pub fn recalculate(
    repo: &dyn DealRepositoryTrait,
    deal_id: DealId,
    overrides: DealInputsDraft,
    profile: &PropertyProfile,
    today: NaiveDate,
) -> RenoDealResult<ComputationOutput<DealResults>> {
    let stored = repo.load_inputs(deal_id)?.unwrap_or_default();
    let inputs = resolve(&stored.merge(overrides), profile, today)?;
    let output = simulate(&inputs)?;
    repo.save_run(deal_id, &inputs, &output.result)?;
    debug!("Deal {deal_id} recalculated and saved");
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn profile() -> PropertyProfile {
        PropertyProfile {
            legal_area: dec!(60),
            terrace_area: dec!(10),
            terrace_weighting: None,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 1).unwrap()
    }

    #[test]
    fn test_recalculate_persists_resolved_inputs() {
        let repo = InMemoryDealRepository::new();
        let overrides = DealInputsDraft {
            purchase_price: Some(dec!(350000)),
            ..Default::default()
        };
        let out = recalculate(&repo, 7, overrides, &profile(), today()).unwrap();
        let record = repo.get(7).unwrap().unwrap();
        assert_eq!(record.inputs.purchase_price, Some(dec!(350000)));
        assert_eq!(record.inputs.purchase_date, Some(today()));
        assert_eq!(record.results.as_ref(), Some(&out.result));
    }

    #[test]
    fn test_recalculate_merges_stored_record() {
        let repo = InMemoryDealRepository::new();
        repo.insert(
            3,
            DealRecord {
                inputs: DealInputsDraft {
                    purchase_price: Some(dec!(300000)),
                    duration_days: Some(200),
                    ..Default::default()
                },
                results: None,
            },
        )
        .unwrap();
        let overrides = DealInputsDraft {
            duration_days: Some(90),
            ..Default::default()
        };
        recalculate(&repo, 3, overrides, &profile(), today()).unwrap();
        let saved = repo.load_inputs(3).unwrap().unwrap();
        assert_eq!(saved.purchase_price, Some(dec!(300000)));
        assert_eq!(saved.duration_days, Some(90));
    }

    #[test]
    fn test_rejected_run_writes_nothing() {
        let repo = InMemoryDealRepository::new();
        let overrides = DealInputsDraft {
            purchase_price: Some(dec!(2000000)),
            ..Default::default()
        };
        let err = recalculate(&repo, 9, overrides, &profile(), today()).unwrap_err();
        assert!(matches!(err, RenoDealError::InsufficientFinancing { .. }));
        assert!(repo.get(9).unwrap().is_none());
    }
}
