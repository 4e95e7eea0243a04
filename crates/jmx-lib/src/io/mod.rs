pub mod manifest;
pub mod text;
pub mod wfdb;

use crate::signal::Events;
use anyhow::Result;
use std::path::Path;

/// Load annotated beats; `.atr` files are WFDB annotations, anything else is
/// newline-delimited sample indices.
pub fn load_annotation_events(path: &Path) -> Result<Events> {
    let is_atr = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("atr"));
    if is_atr {
        wfdb::load_wfdb_events(path)
    } else {
        Ok(Events::from_indices(text::read_event_indices(path)?))
    }
}
