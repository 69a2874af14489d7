//! JSON output format.

use super::Report;
use std::io::Write;

/// Write a report as JSON to a writer.
pub fn write_json<W: Write>(
    report: &Report,
    writer: W,
    pretty: bool,
) -> Result<(), serde_json::Error> {
    if pretty {
        serde_json::to_writer_pretty(writer, report)
    } else {
        serde_json::to_writer(writer, report)
    }
}

/// Write a report as a JSON string.
pub fn to_json_string(report: &Report, pretty: bool) -> Result<String, serde_json::Error> {
    if pretty {
        serde_json::to_string_pretty(report)
    } else {
        serde_json::to_string(report)
    }
}
