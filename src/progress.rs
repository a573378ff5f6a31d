//! Progress state and the progression controller
//!
//! `{global_day, current_phase}` is the whole state machine. Completing a
//! workout moves the day forward by one and, once the global day passes the
//! current phase's own length, moves to the next phase in catalog order.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::db::BlobStore;
use crate::error::{CatalogError, StorageError};
use crate::program::Catalog;

/// Blob key of the serialized progress state
pub const STATE_KEY: &str = "basement_lab_state";

/// Program length ceiling, independent of the catalog
pub const PROGRAM_DAYS: u32 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub global_day: u32,
    pub current_phase: String,
}

impl ProgressState {
    /// Day 1 of the first phase
    pub fn initial(catalog: &Catalog) -> Result<Self, CatalogError> {
        let phase = catalog.first_phase().ok_or(CatalogError::NoPhases)?;
        Ok(Self {
            global_day: 1,
            current_phase: phase.id.clone(),
        })
    }

    /// Read persisted state. `Ok(None)` means nothing usable was stored and the
    /// caller should start from [`ProgressState::initial`].
    pub fn load<S: BlobStore + ?Sized>(store: &S) -> Option<Self> {
        let blob = match store.get(STATE_KEY) {
            Ok(Some(blob)) => blob,
            Ok(None) => return None,
            Err(e) => {
                warn!("Failed to read progress, starting over: {}", e);
                return None;
            }
        };

        match serde_json::from_str::<ProgressState>(&blob) {
            Ok(state) if state.global_day >= 1 => Some(state),
            Ok(state) => {
                warn!("Stored progress has day {}, starting over", state.global_day);
                None
            }
            Err(e) => {
                warn!("Stored progress is corrupt, starting over: {}", e);
                None
            }
        }
    }

    pub fn save<S: BlobStore + ?Sized>(&self, store: &mut S) -> Result<(), StorageError> {
        let blob = serde_json::to_string(self).map_err(|source| StorageError::Encode {
            key: STATE_KEY.to_string(),
            source,
        })?;
        store.set(STATE_KEY, &blob)
    }
}

/// A phase change caused by completing a workout
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PhaseChange {
    pub from: String,
    pub to: String,
}

/// Outcome of [`complete_workout`]
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use]
pub enum Advance {
    Advanced {
        global_day: u32,
        phase_change: Option<PhaseChange>,
    },
    /// Day ceiling reached; nothing changed
    ProgramComplete,
}

/// Move to the next day, advancing at most one phase.
///
/// The boundary is the current phase's own length in days, compared with the
/// global day. A day past several phases still advances only one.
pub fn complete_workout(
    state: &mut ProgressState,
    catalog: &Catalog,
) -> Result<Advance, CatalogError> {
    if state.global_day >= PROGRAM_DAYS {
        info!("Program complete at day {}", state.global_day);
        return Ok(Advance::ProgramComplete);
    }

    let index = catalog.phase_index(&state.current_phase)?;
    let next_day = state.global_day + 1;

    let mut phase_change = None;
    if next_day > catalog.phases[index].days() && index + 1 < catalog.phases.len() {
        let next = &catalog.phases[index + 1];
        phase_change = Some(PhaseChange {
            from: state.current_phase.clone(),
            to: next.id.clone(),
        });
        info!("Phase {} -> {} on day {}", state.current_phase, next.id, next_day);
        state.current_phase = next.id.clone();
    }
    state.global_day = next_day;

    info!("Advanced to day {}", next_day);
    Ok(Advance::Advanced {
        global_day: next_day,
        phase_change,
    })
}
