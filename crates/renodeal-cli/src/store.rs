use std::fs;
use std::path::{Path, PathBuf};

use renodeal_core::feasibility::results::DealResults;
use renodeal_core::feasibility::{DealId, DealInputs, DealInputsDraft, DealRecord, DealRepositoryTrait};
use renodeal_core::{RenoDealError, RenoDealResult};
use tracing::debug;

/// Deal store backed by a directory of `<id>.json` files.
pub struct JsonDirDealRepository {
    root: PathBuf,
}

impl JsonDirDealRepository {
    /// Open `dir`, creating it when missing.
    pub fn open(dir: impl AsRef<Path>) -> RenoDealResult<Self> {
        let root = dir.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .map_err(|e| RenoDealError::Storage(format!("cannot create {}: {e}", root.display())))?;
        Ok(Self { root })
    }

    fn path_for(&self, deal_id: DealId) -> PathBuf {
        self.root.join(format!("{deal_id}.json"))
    }

    pub fn read_record(&self, deal_id: DealId) -> RenoDealResult<Option<DealRecord>> {
        let path = self.path_for(deal_id);
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&path)
            .map_err(|e| RenoDealError::Storage(format!("cannot read {}: {e}", path.display())))?;
        Ok(Some(serde_json::from_str(&contents)?))
    }
}

impl DealRepositoryTrait for JsonDirDealRepository {
    fn load_inputs(&self, deal_id: DealId) -> RenoDealResult<Option<DealInputsDraft>> {
        Ok(self.read_record(deal_id)?.map(|record| record.inputs))
    }

    fn save_run(&self, deal_id: DealId, inputs: &DealInputs, results: &DealResults) -> RenoDealResult<()> {
        let record = DealRecord {
            inputs: DealInputsDraft::from(inputs),
            results: Some(results.clone()),
        };
        let path = self.path_for(deal_id);
        let body = serde_json::to_string_pretty(&record)?;
        fs::write(&path, body)
            .map_err(|e| RenoDealError::Storage(format!("cannot write {}: {e}", path.display())))?;
        debug!("Wrote {}", path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use renodeal_core::feasibility::{recalculate, PropertyProfile};
    use rust_decimal_macros::dec;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("renodeal-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        dir
    }

    #[test]
    fn test_missing_record_loads_as_none() {
        let repo = JsonDirDealRepository::open(scratch_dir("missing")).unwrap();
        assert!(repo.load_inputs(42).unwrap().is_none());
    }

    #[test]
    fn test_recalculate_writes_record_file() {
        let dir = scratch_dir("write");
        let repo = JsonDirDealRepository::open(&dir).unwrap();
        let profile = PropertyProfile {
            legal_area: dec!(55),
            terrace_area: dec!(0),
            terrace_weighting: None,
        };
        let overrides = DealInputsDraft {
            purchase_price: Some(dec!(280000)),
            ..Default::default()
        };
        let today = NaiveDate::from_ymd_opt(2025, 9, 1).unwrap();
        let out = recalculate(&repo, 5, overrides, &profile, today).unwrap();

        assert!(dir.join("5.json").is_file());
        let record = repo.read_record(5).unwrap().unwrap();
        assert_eq!(record.inputs.purchase_price, Some(dec!(280000)));
        assert_eq!(record.results, Some(out.result));
        let _ = fs::remove_dir_all(&dir);
    }
}
