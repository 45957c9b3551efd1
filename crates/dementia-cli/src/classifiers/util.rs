use anyhow::{Context, Result};
use plotly::Plot;
use std::fs;
use std::path::{Path, PathBuf};

/// Check that `path` names an existing `.csv` or `.tsv` file.
pub fn validate_tsv_or_csv_file(path: &str) -> Result<()> {
    let pb = PathBuf::from(path);

    let ext = pb
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    if !matches!(ext.as_deref(), Some("tsv") | Some("csv")) {
        anyhow::bail!("Data file must have a .tsv or .csv extension: {}", path);
    }
    if !pb.is_file() {
        anyhow::bail!("Data file does not exist: {}", path);
    }

    Ok(())
}

/// Replace every character outside `[A-Za-z0-9._-]` with `_`, so that a
/// feature name taken from a table header stays a single path component.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Write `plot` as a standalone HTML page under `dir`, creating it if needed.
pub fn write_plot(plot: &Plot, dir: &str, file_name: &str) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create plot directory {}", dir))?;
    let path = Path::new(dir).join(sanitize_file_name(file_name));
    fs::write(&path, plot.to_html())
        .with_context(|| format!("Failed to write plot {}", path.display()))?;
    log::info!("Plot written to {}", path.display());
    Ok(path)
}
