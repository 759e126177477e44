//! Per-item state files under the output directory.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::naming::resolve_item_json_path;
use crate::vis_item::{VisItem, VisItemError};

/// Reads and writes `<out>/<id>/<id>.json`, the resumable record for one item.
#[derive(Debug, Clone)]
pub struct ItemStore {
    output_dir: PathBuf,
}

impl ItemStore {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn state_path(&self, item_id: &str) -> PathBuf {
        resolve_item_json_path(item_id, &self.output_dir)
    }

    /// Load the item to work on.
    ///
    /// When resuming, a saved state file for the item's id replaces the source
    /// item so that previous generations and judgments are kept.
    pub fn load_item(&self, source_path: &Path, resume: bool) -> Result<VisItem, VisItemError> {
        let item = VisItem::from_path(source_path)?;
        if !resume {
            return Ok(item);
        }

        let state_path = self.state_path(&item.id);
        if state_path.is_file() {
            debug!(item_id = %item.id, path = %state_path.display(), "resuming from saved state");
            VisItem::from_path(&state_path)
        } else {
            debug!(item_id = %item.id, "no saved state, starting from source item");
            Ok(item)
        }
    }

    pub fn save_item(&self, item: &VisItem) -> Result<PathBuf, VisItemError> {
        let path = item.save_to(&self.output_dir)?;
        debug!(item_id = %item.id, path = %path.display(), "item state saved");
        Ok(path)
    }

    pub fn is_generation_complete(&self, item_id: &str, model: &str) -> bool {
        match self.read_state(item_id) {
            Some(item) => item
                .generation_path(model)
                .map(|p| Path::new(p).is_file())
                .unwrap_or(false),
            None => false,
        }
    }

    pub fn is_evaluation_complete(&self, item_id: &str, gen_model: &str, eval_model: &str) -> bool {
        self.read_state(item_id)
            .map(|item| item.is_evaluation_complete(gen_model, eval_model))
            .unwrap_or(false)
    }

    fn read_state(&self, item_id: &str) -> Option<VisItem> {
        let path = self.state_path(item_id);
        if !path.is_file() {
            return None;
        }
        match VisItem::from_path(&path) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!(item_id, error = %e, "failed to read item state");
                None
            }
        }
    }
}
