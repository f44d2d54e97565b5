//! Stable error identifiers surfaced in messages and machine-readable output.

pub const CONTAINER_IO: &str = "PBIDOCS_CONTAINER_001";
pub const CONTAINER_NOT_ZIP: &str = "PBIDOCS_CONTAINER_002";
pub const CONTAINER_EMPTY: &str = "PBIDOCS_CONTAINER_003";
pub const CONTAINER_TOO_MANY_ENTRIES: &str = "PBIDOCS_CONTAINER_004";
pub const CONTAINER_ENTRY_TOO_LARGE: &str = "PBIDOCS_CONTAINER_005";
pub const CONTAINER_TOTAL_TOO_LARGE: &str = "PBIDOCS_CONTAINER_006";
pub const CONTAINER_ENTRY_READ: &str = "PBIDOCS_CONTAINER_007";
pub const CONTAINER_ENTRY_NOT_FOUND: &str = "PBIDOCS_CONTAINER_008";
pub const CONTAINER_BAD_INPUT: &str = "PBIDOCS_CONTAINER_009";

pub const EXTRACT_PAYLOAD_NOT_FOUND: &str = "PBIDOCS_EXTRACT_001";
pub const EXTRACT_PARSE: &str = "PBIDOCS_EXTRACT_002";

pub const SCHEMA_VALIDATION: &str = "PBIDOCS_SCHEMA_001";

pub const FORMAT_UNMATCHED_CLOSE: &str = "PBIDOCS_FORMAT_001";
pub const FORMAT_MISMATCHED_CLOSE: &str = "PBIDOCS_FORMAT_002";
pub const FORMAT_UNCLOSED: &str = "PBIDOCS_FORMAT_003";

pub const WRITE_FAILED: &str = "PBIDOCS_WRITE_001";

pub const CONFIG_INVALID: &str = "PBIDOCS_CONFIG_001";
