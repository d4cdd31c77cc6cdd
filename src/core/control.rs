//! Control state: live settings and the recalibration token
//!
//! The control file is shared with the operator UI, which edits settings and
//! bumps `recalibrate_token` while detection runs. It is re-read every frame;
//! a missing or half-written file never interrupts detection, the previous
//! state is kept instead.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{ControlState, DetectorSettings};

/// Control file failures
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("control file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("control file {path} is not valid JSON: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Anything that can hand the detector a per-frame control snapshot
pub trait ControlSource {
    /// Consistent copy of the current control state
    fn snapshot(&mut self) -> ControlState;
}

/// Make sure a usable control file exists and return its contents
///
/// Missing → defaults written. Present but invalid → overwritten with defaults.
pub fn ensure_control_file(path: &Path) -> Result<ControlState, ControlError> {
    if !path.exists() {
        info!("Creating control file: {}", path.display());
        let state = ControlState::default();
        write_control(path, &state)?;
        return Ok(state);
    }

    match read_control(path) {
        Ok(state) => Ok(state),
        Err(e) => {
            warn!("{e}; restoring defaults");
            let state = ControlState::default();
            write_control(path, &state)?;
            Ok(state)
        }
    }
}

fn read_control(path: &Path) -> Result<ControlState, ControlError> {
    let text = fs::read_to_string(path).map_err(|source| ControlError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ControlError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn write_control(path: &Path, state: &impl serde::Serialize) -> Result<(), ControlError> {
    let text = serde_json::to_string_pretty(state).map_err(|source| ControlError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| ControlError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Control file re-read on every snapshot
#[derive(Debug, Clone)]
pub struct ControlFile {
    path: PathBuf,
    current: ControlState,
}

impl ControlFile {
    /// Open (creating or repairing if needed)
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ControlError> {
        let path = path.into();
        let current = ensure_control_file(&path)?;
        Ok(Self { path, current })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Last successfully read state
    pub fn current(&self) -> &ControlState {
        &self.current
    }

    /// Re-read the file, keeping the previous state on any failure
    pub fn reload(&mut self) -> &ControlState {
        match read_control(&self.path) {
            Ok(state) => self.current = state,
            Err(e) => debug!("{e}; keeping previous control state"),
        }
        &self.current
    }

    /// Bump the recalibration token on disk, preserving keys owned by the UI
    pub fn request_recalibration(&mut self) -> Result<u64, ControlError> {
        let mut document = fs::read_to_string(&self.path)
            .ok()
            .and_then(|text| serde_json::from_str::<Value>(&text).ok())
            .filter(Value::is_object)
            .unwrap_or_else(|| Value::Object(Default::default()));

        let token = document
            .get("recalibrate_token")
            .and_then(Value::as_u64)
            .unwrap_or(self.current.recalibrate_token)
            .wrapping_add(1);
        document["recalibrate_token"] = Value::from(token);

        write_control(&self.path, &document)?;
        self.current.recalibrate_token = token;
        info!(token, "recalibration requested via {}", self.path.display());
        Ok(token)
    }
}

impl ControlSource for ControlFile {
    fn snapshot(&mut self) -> ControlState {
        self.reload().clone()
    }
}

/// In-memory control state shared between the detection loop and the API
#[derive(Debug, Clone, Default)]
pub struct SharedControl {
    inner: Arc<RwLock<ControlState>>,
}

impl SharedControl {
    pub fn new(state: ControlState) -> Self {
        Self {
            inner: Arc::new(RwLock::new(state)),
        }
    }

    /// Consistent copy, never torn mid-update
    pub fn get(&self) -> ControlState {
        self.inner.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replace the live settings
    pub fn set_settings(&self, settings: DetectorSettings) {
        self.inner.write().unwrap_or_else(|e| e.into_inner()).settings = settings;
    }

    /// Bump the token, returning the new value
    pub fn request_recalibration(&self) -> u64 {
        let mut state = self.inner.write().unwrap_or_else(|e| e.into_inner());
        state.recalibrate_token = state.recalibrate_token.wrapping_add(1);
        state.recalibrate_token
    }
}

impl ControlSource for SharedControl {
    fn snapshot(&mut self) -> ControlState {
        self.get()
    }
}

// =============================================================================
// TESTS
// =============================================================================
