//! JSON output of graphs and the companion artifacts.
//!
//! Every collection in the output types is ordered, so serializing the same
//! value twice yields the same bytes.

use std::io::Write;

use serde::Serialize;

use crate::error::Result;

pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Writes `value` to `writer`, followed by a newline.
pub fn write_json<T: Serialize, W: Write>(value: &T, mut writer: W, pretty: bool) -> Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, value)?;
    } else {
        serde_json::to_writer(&mut writer, value)?;
    }
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}
