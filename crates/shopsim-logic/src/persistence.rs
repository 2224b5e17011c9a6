//! Save/Load for a run's ledger.
//!
//! Uses bincode for the state file. The save carries the state and the
//! config it was produced under; the noise streams are not saved, a resumed
//! run is reseeded by the caller. Day summaries can be exported as JSON.

use std::io::{Read, Write};

use serde::{Deserialize, Serialize};

use crate::config::SimConfig;
use crate::engine::DaySummary;
use crate::error::SaveError;
use crate::state::SimulationState;

/// Version number for save file format (increment when format changes)
const SAVE_VERSION: u32 = 1;

/// Serializable snapshot of a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveData {
    pub version: u32,
    pub config: SimConfig,
    pub state: SimulationState,
}

/// Save a state and its config to a writer.
pub fn save_state<W: Write>(
    writer: W,
    config: &SimConfig,
    state: &SimulationState,
) -> Result<(), SaveError> {
    let save_data = SaveData {
        version: SAVE_VERSION,
        config: config.clone(),
        state: state.clone(),
    };
    bincode::serialize_into(writer, &save_data)?;
    log::debug!("saved state at day {}", state.day);
    Ok(())
}

/// Load a state and its config from a reader.
pub fn load_state<R: Read>(reader: R) -> Result<SaveData, SaveError> {
    let save_data: SaveData = bincode::deserialize_from(reader)?;

    if save_data.version != SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: save_data.version,
        });
    }

    log::debug!("loaded state at day {}", save_data.state.day);
    Ok(save_data)
}

/// Write day summaries as a pretty JSON array.
pub fn export_summaries<W: Write>(writer: W, summaries: &[DaySummary]) -> Result<(), SaveError> {
    serde_json::to_writer_pretty(writer, summaries)?;
    Ok(())
}
