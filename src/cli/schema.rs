use anyhow::Result;

use nwbconv::interfaces::{AudioInterface, DataInterface};

use super::SchemaKind;

/// Print one of the audio interface schemas as JSON
pub fn run(kind: SchemaKind) -> Result<()> {
    let interface = AudioInterface::new::<&str>(&[], false)?;
    let schema = match kind {
        SchemaKind::Source => interface.get_source_schema()?.to_value()?,
        SchemaKind::Metadata => interface.get_metadata_schema()?,
        SchemaKind::Options => interface.get_conversion_options_schema()?.to_value()?,
    };
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}
