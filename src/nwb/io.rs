use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Cursor, Read, Seek, Write};
use std::path::Path;
use std::sync::Arc;

use arrow::array::{Array, ArrayRef, Float64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use parquet::format::KeyValue;
use serde::{Deserialize, Serialize};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod as ZipCompression, ZipArchive, ZipWriter};

use super::backend::{BackendConfiguration, DatasetIoConfiguration};
use super::file::{dataset_location, NwbFile};
use super::series::{TimeSeries, Timing};
use super::NwbError;
use crate::schema::{
    CHANNEL_COLUMN_PREFIX, KEY_CONVERTER_INFO, KEY_LOCATION, KEY_NEURODATA_TYPE, KEY_OBJECT_ID,
    NWBFILE_ENTRY, NWB_CONTAINER_VERSION, NWB_MIMETYPE, NWB_SCHEMA_VERSION, TIMESTAMPS_COLUMN,
};

/// Upper bound on the buffer reserved up front for one archive entry
const MAX_PREALLOCATION: usize = 64 * 1024 * 1024;

/// Top-level document stored in `nwbfile.json`
#[derive(Debug, Serialize, Deserialize)]
struct Manifest {
    nwb_version: String,
    container_version: String,
    generated_by: String,
    nwbfile: NwbFile,
}

/// Reads and writes NWB containers.
///
/// Layout of the ZIP archive:
///
/// ```text
/// session.nwb
/// ├── mimetype                                (stored, first entry)
/// ├── nwbfile.json                            (deflated)
/// ├── acquisition/<name>/data.parquet         (stored)
/// ├── stimulus/<name>/data.parquet            (stored)
/// └── processing/<module>/<container>/<name>/data.parquet
/// ```
pub struct NwbIo;

impl NwbIo {
    /// Write `nwbfile` to `path`, replacing any existing file atomically.
    ///
    /// The archive is assembled in a temporary file next to `path` and only
    /// renamed into place once complete.
    pub fn write<P: AsRef<Path>>(
        nwbfile: &NwbFile,
        path: P,
        backend: &BackendConfiguration,
    ) -> Result<(), NwbError> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        if !parent.exists() {
            fs::create_dir_all(parent)?;
        }

        let mut temp = tempfile::NamedTempFile::new_in(parent)?;
        {
            let mut writer = BufWriter::new(temp.as_file_mut());
            Self::write_to(nwbfile, &mut writer, backend)?;
            writer.flush()?;
        }
        temp.as_file().sync_all()?;
        temp.persist(path).map_err(|e| NwbError::IoError(e.error))?;

        log::debug!("Wrote {}", path.display());
        Ok(())
    }

    /// Write `nwbfile` as a ZIP archive to any seekable writer
    pub fn write_to<W: Write + Seek>(
        nwbfile: &NwbFile,
        writer: W,
        backend: &BackendConfiguration,
    ) -> Result<(), NwbError> {
        nwbfile.validate()?;
        backend.validate()?;

        let mut zip = ZipWriter::new(writer);

        // mimetype must be the first, uncompressed entry
        let stored = SimpleFileOptions::default()
            .compression_method(ZipCompression::Stored)
            .unix_permissions(0o644);
        zip.start_file("mimetype", stored)?;
        zip.write_all(NWB_MIMETYPE.as_bytes())?;

        let manifest = Manifest {
            nwb_version: NWB_SCHEMA_VERSION.to_string(),
            container_version: NWB_CONTAINER_VERSION.to_string(),
            generated_by: converter_info(),
            nwbfile: nwbfile.clone(),
        };
        let deflated = SimpleFileOptions::default()
            .compression_method(ZipCompression::Deflated)
            .unix_permissions(0o644);
        zip.start_file(NWBFILE_ENTRY, deflated)?;
        serde_json::to_writer_pretty(&mut zip, &manifest)?;

        for (location, series) in nwbfile.series() {
            let location_in_file = dataset_location(&location);
            let configuration = match backend.get(&location_in_file) {
                Some(configuration) => configuration.clone(),
                None => DatasetIoConfiguration::for_series(&location_in_file, series),
            };
            let parquet_bytes = encode_series(series, &configuration)?;

            // Parquet handles compression; storing avoids double compression
            zip.start_file(format!("{}.parquet", location_in_file), stored)?;
            zip.write_all(&parquet_bytes)?;
        }

        zip.finish()?;
        Ok(())
    }

    /// Read a container from `path`
    pub fn read<P: AsRef<Path>>(path: P) -> Result<NwbFile, NwbError> {
        let file = File::open(path.as_ref())?;
        Self::read_from(BufReader::new(file))
    }

    /// Read a container from any seekable reader
    pub fn read_from<R: Read + Seek>(reader: R) -> Result<NwbFile, NwbError> {
        let mut archive = ZipArchive::new(reader)?;

        let mimetype = read_entry(&mut archive, "mimetype")?;
        if mimetype != NWB_MIMETYPE.as_bytes() {
            return Err(NwbError::InvalidFormat(format!(
                "unexpected mimetype '{}'",
                String::from_utf8_lossy(&mimetype)
            )));
        }

        let manifest: Manifest = serde_json::from_slice(&read_entry(&mut archive, NWBFILE_ENTRY)?)?;
        let mut nwbfile = manifest.nwbfile;

        for (location, series) in nwbfile.series_mut() {
            let entry = format!("{}.parquet", dataset_location(&location));
            let bytes = Bytes::from(read_entry(&mut archive, &entry)?);
            decode_series(series, bytes)?;
        }
        Ok(nwbfile)
    }

    /// Read only the file-level fields and hierarchy, without sample data
    pub fn read_hierarchy<P: AsRef<Path>>(path: P) -> Result<NwbFile, NwbError> {
        let file = File::open(path.as_ref())?;
        let mut archive = ZipArchive::new(BufReader::new(file))?;
        let manifest: Manifest = serde_json::from_slice(&read_entry(&mut archive, NWBFILE_ENTRY)?)?;
        Ok(manifest.nwbfile)
    }
}

fn converter_info() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>, NwbError> {
    let mut entry = archive
        .by_name(name)
        .map_err(|_| NwbError::InvalidFormat(format!("container missing {}", name)))?;
    let mut buffer = Vec::with_capacity(preallocation(entry.size()));
    entry.read_to_end(&mut buffer)?;
    Ok(buffer)
}

/// Initial buffer size for an entry; the size declared in the archive is
/// untrusted, so it is capped
pub(crate) fn preallocation(declared_size: u64) -> usize {
    usize::try_from(declared_size)
        .unwrap_or(usize::MAX)
        .min(MAX_PREALLOCATION)
}

fn channel_column(channel: usize) -> String {
    format!("{}{}", CHANNEL_COLUMN_PREFIX, channel)
}

fn encode_series(
    series: &TimeSeries,
    configuration: &DatasetIoConfiguration,
) -> Result<Vec<u8>, NwbError> {
    let data = &series.data;
    let mut fields = Vec::with_capacity(data.num_channels + 1);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(data.num_channels + 1);

    for channel in 0..data.num_channels {
        fields.push(Field::new(channel_column(channel), DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(data.channel(channel))));
    }
    if let Timing::Timestamps { values } = &series.timing {
        fields.push(Field::new(TIMESTAMPS_COLUMN, DataType::Float64, false));
        columns.push(Arc::new(Float64Array::from(values.clone())));
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), columns)?;

    let key_value_metadata: Vec<KeyValue> = [
        (KEY_OBJECT_ID, series.object_id.to_string()),
        (KEY_NEURODATA_TYPE, series.neurodata_type.as_str().to_string()),
        (KEY_LOCATION, configuration.location_in_file.clone()),
        (KEY_CONVERTER_INFO, converter_info()),
    ]
    .into_iter()
    .map(|(key, value)| KeyValue {
        key: key.to_string(),
        value: Some(value),
    })
    .collect();
    let properties = WriterProperties::builder()
        .set_compression(
            configuration
                .compression_method
                .to_parquet(configuration.compression_level)?,
        )
        .set_max_row_group_size(configuration.chunk_frames)
        .set_key_value_metadata(Some(key_value_metadata))
        .build();

    let mut buffer = Cursor::new(Vec::new());
    let mut writer = ArrowWriter::try_new(&mut buffer, schema, Some(properties))?;
    writer.write(&batch)?;
    writer.close()?;
    Ok(buffer.into_inner())
}

fn decode_series(series: &mut TimeSeries, bytes: Bytes) -> Result<(), NwbError> {
    let num_channels = series.data.num_channels;
    let num_frames = series.data.num_frames;
    let mut values = Vec::with_capacity(num_frames * num_channels);
    let mut timestamps = Vec::new();

    let reader = ParquetRecordBatchReaderBuilder::try_new(bytes)?.build()?;
    for batch in reader {
        let batch = batch?;
        let channels = (0..num_channels)
            .map(|channel| float_column(&batch, &channel_column(channel)))
            .collect::<Result<Vec<_>, _>>()?;
        for row in 0..batch.num_rows() {
            values.extend(channels.iter().map(|column| column.value(row)));
        }
        if matches!(series.timing, Timing::Timestamps { .. }) {
            timestamps.extend(float_column(&batch, TIMESTAMPS_COLUMN)?.values().iter().copied());
        }
    }

    if values.len() != num_frames * num_channels {
        return Err(NwbError::InvalidFormat(format!(
            "series '{}' should hold {}x{} samples, found {}",
            series.name,
            num_frames,
            num_channels,
            values.len()
        )));
    }
    series.data.values = values;
    if let Timing::Timestamps { values } = &mut series.timing {
        *values = timestamps;
    }
    Ok(())
}

fn float_column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Float64Array, NwbError> {
    batch
        .column_by_name(name)
        .ok_or_else(|| NwbError::InvalidFormat(format!("missing column {}", name)))?
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| NwbError::InvalidFormat(format!("{} is not Float64", name)))
}
