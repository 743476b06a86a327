//! Chooses the backend when a store is opened.

use crate::store::{BackendPreference, DocumentStore, EngineApi, EngineStore, Storage};
use crate::{utils, Result};
use anyhow::Context;
use std::path::Path;
use tracing::{debug, error, info};

/// Opens the store at `dir` with the engine built into this crate available.
pub fn open(dir: &Path, preference: BackendPreference) -> Result<Box<dyn Storage>> {
    open_with(dir, preference, Some(EngineApi::linked()))
}

/// Opens the store at `dir`. `engine` is `None` when no engine is available at all.
///
/// With `Auto`, any failure to bring up the engine is logged and the document store is opened on
/// the same directory instead. With `Engine`, that failure is returned.
pub fn open_with(
    dir: &Path,
    preference: BackendPreference,
    engine: Option<EngineApi>,
) -> Result<Box<dyn Storage>> {
    debug!("Opening store at {} with preference {preference}", dir.display());
    if preference != BackendPreference::Document {
        match open_engine(dir, engine) {
            Ok(store) => {
                info!("Using the engine backend");
                return Ok(Box::new(store));
            }
            Err(e) if preference == BackendPreference::Auto => {
                error!("Engine backend unavailable, using documents instead: {e:#}");
            }
            Err(e) => return Err(e),
        }
    }
    let store = DocumentStore::open(dir)?;
    info!("Using the document backend");
    Ok(Box::new(store))
}

fn open_engine(dir: &Path, engine: Option<EngineApi>) -> Result<EngineStore> {
    let api = engine.context("No engine is available")?;
    utils::create_dir_all(dir)?;
    EngineStore::open(api, dir)
}
