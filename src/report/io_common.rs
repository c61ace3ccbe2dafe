use std::fs;
use std::path::Path;

use log::{debug, info};
use snafu::prelude::*;

use crate::report::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Reads the whole export in memory.
pub fn read_source(path: &str) -> ReportResult<String> {
    let contents = fs::read_to_string(path).context(ReadingInputSnafu { path })?;
    info!(
        "read_source: {}: {} bytes",
        simplify_file_name(path),
        contents.len()
    );
    Ok(contents)
}

pub fn write_output(path: &str, contents: &[u8]) -> ReportResult<()> {
    fs::write(path, contents).context(WritingOutputSnafu { path })?;
    debug!(
        "write_output: {}: {} bytes",
        simplify_file_name(path),
        contents.len()
    );
    Ok(())
}
