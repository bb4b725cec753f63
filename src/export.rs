//! JSON export of canonical markets.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::info;

use crate::error::ExportError;
use crate::market::MarketInfo;

/// Timestamped default file name, e.g. `polymarket_markets_20250101_120000.json`.
pub fn default_export_filename() -> String {
    format!(
        "polymarket_markets_{}.json",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}

/// Write `markets` as a pretty-printed UTF-8 JSON array.
pub fn export_json(markets: &[MarketInfo], path: impl AsRef<Path>) -> Result<(), ExportError> {
    let path = path.as_ref();
    let io_err = |source| ExportError::Io {
        path: path.display().to_string(),
        source,
    };

    let file = File::create(path).map_err(io_err)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, markets)?;
    writer.write_all(b"\n").map_err(io_err)?;
    writer.flush().map_err(io_err)?;

    info!(path = %path.display(), count = markets.len(), "Exported markets");
    Ok(())
}
