//! The JSON state file: changeset store and entity model in one document.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use changes_register::ChangesetRegister;
use changes_store::{snapshot, InMemoryChangesetStore, InMemoryModel, ModelSnapshot, StoreSnapshot};

pub type Register = ChangesetRegister<InMemoryChangesetStore, InMemoryModel>;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct StateFile {
    #[serde(default)]
    pub store: StoreSnapshot,
    #[serde(default)]
    pub model: ModelSnapshot,
}

/// Open the register stored at `path`, or an empty one if there is none.
pub fn open(path: &Path) -> anyhow::Result<Register> {
    let state: StateFile = snapshot::load(path)
        .with_context(|| format!("loading state from {}", path.display()))?
        .unwrap_or_default();
    let store = InMemoryChangesetStore::from_snapshot(state.store)
        .with_context(|| format!("restoring changeset store from {}", path.display()))?;
    Ok(ChangesetRegister::new(store, InMemoryModel::from_snapshot(state.model)))
}

pub fn save(path: &Path, register: &Register) -> anyhow::Result<()> {
    let state = StateFile {
        store: register.store().snapshot()?,
        model: register.model().snapshot()?,
    };
    snapshot::save(path, &state).with_context(|| format!("writing state to {}", path.display()))
}
