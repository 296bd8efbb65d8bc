/// NWB schema version the container layout follows
pub const NWB_SCHEMA_VERSION: &str = "2.6.0";

/// Version of the on-disk container layout (ZIP + Parquet)
pub const NWB_CONTAINER_VERSION: &str = "1.0.0";

/// File extension for NWB container files
pub const NWB_EXTENSION: &str = "nwb";

/// MIME type written as the first, uncompressed entry of every container
pub const NWB_MIMETYPE: &str = "application/x-nwb+zip";

/// Name of the ZIP entry holding file-level fields and the object hierarchy
pub const NWBFILE_ENTRY: &str = "nwbfile.json";

/// Metadata key for the object id in Parquet footers
pub const KEY_OBJECT_ID: &str = "nwb:object_id";

/// Metadata key for the neurodata type in Parquet footers
pub const KEY_NEURODATA_TYPE: &str = "nwb:neurodata_type";

/// Metadata key for the dataset location in Parquet footers
pub const KEY_LOCATION: &str = "nwb:location";

/// Metadata key for converter software info
pub const KEY_CONVERTER_INFO: &str = "nwb:converter_info";

/// Column holding explicit timestamps for irregularly sampled series
pub const TIMESTAMPS_COLUMN: &str = "timestamps";

/// Prefix of the per-channel data columns (`channel_0`, `channel_1`, ...)
pub const CHANNEL_COLUMN_PREFIX: &str = "channel_";
