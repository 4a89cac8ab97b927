//! Medication storage with persistence to `.dosette/medications.json`.
//!
//! Uses `crate::state::{load_state, save_state}` for atomic JSON read/write.
//! The store is the single source of the medication snapshot the scheduler
//! reconciles against; the scheduler itself never touches this file.

use super::types::Medication;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Errors returned by prefix lookups ([`MedicationStore::get`] and friends).
#[derive(Debug)]
pub enum LookupError {
    /// No medication matched the given ID prefix.
    NotFound,
    /// Multiple medications matched the given ID prefix.
    Ambiguous(Vec<String>),
}

impl std::fmt::Display for LookupError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "no medication found"),
            Self::Ambiguous(ids) => {
                write!(f, "ambiguous ID, matches: ")?;
                for (i, id) in ids.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", &id[..8.min(id.len())])?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for LookupError {}

/// On-disk format for the medications file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct MedicationStoreState {
    #[serde(default)]
    medications: Vec<Medication>,
}

/// Manages medication-schedule entries with persistence.
pub struct MedicationStore {
    path: PathBuf,
    state: MedicationStoreState,
}

impl MedicationStore {
    /// Load or create a medication store at `<root>/.dosette/medications.json`.
    pub fn load(root: &Path) -> Self {
        let path = root.join(".dosette/medications.json");
        let state: MedicationStoreState = crate::state::load_state(&path).unwrap_or_default();
        Self { path, state }
    }

    /// Persist current state to disk.
    pub fn save(&self) -> color_eyre::Result<()> {
        crate::state::save_state(&self.path, &self.state)
    }

    /// Add a new medication. Returns the medication's ID.
    pub fn add(&mut self, medication: Medication) -> String {
        let id = medication.id.clone();
        self.state.medications.push(medication);
        id
    }

    /// Look up a medication by ID prefix.
    pub fn get(&self, id_prefix: &str) -> Result<&Medication, LookupError> {
        let index = self.find(id_prefix)?;
        Ok(&self.state.medications[index])
    }

    /// Remove a medication by ID prefix. Returns the removed entry.
    pub fn remove(&mut self, id_prefix: &str) -> Result<Medication, LookupError> {
        let index = self.find(id_prefix)?;
        Ok(self.state.medications.remove(index))
    }

    /// Enable or disable a medication by ID prefix. Returns its full ID.
    pub fn set_disabled(&mut self, id_prefix: &str, disabled: bool) -> Result<String, LookupError> {
        let index = self.find(id_prefix)?;
        let med = &mut self.state.medications[index];
        med.disabled = disabled;
        Ok(med.id.clone())
    }

    /// All medications, insertion order.
    pub fn all(&self) -> &[Medication] {
        &self.state.medications
    }

    /// All enabled medications, insertion order.
    pub fn active(&self) -> Vec<&Medication> {
        self.state.medications.iter().filter(|m| !m.disabled).collect()
    }

    /// A cloned snapshot of every entry, for handing to the scheduler.
    pub fn snapshot(&self) -> Vec<Medication> {
        self.state.medications.clone()
    }

    fn find(&self, id_prefix: &str) -> Result<usize, LookupError> {
        let matches: Vec<usize> = self
            .state
            .medications
            .iter()
            .enumerate()
            .filter(|(_, m)| m.id.starts_with(id_prefix))
            .map(|(i, _)| i)
            .collect();

        match matches.len() {
            0 => Err(LookupError::NotFound),
            1 => Ok(matches[0]),
            _ => Err(LookupError::Ambiguous(
                matches
                    .iter()
                    .map(|&i| self.state.medications[i].id.clone())
                    .collect(),
            )),
        }
    }
}
