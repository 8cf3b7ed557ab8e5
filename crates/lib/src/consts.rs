//! Shared constants.

/// Application name, used for data directories.
pub const APP_NAME: &str = "drvpipe";

/// Length of truncated object hashes used in store paths.
pub const OBJ_HASH_PREFIX_LEN: usize = 20;

/// Environment variable overriding the store location.
pub const STORE_ENV: &str = "DRVPIPE_STORE";

/// Default configuration file name.
pub const CONFIG_FILENAME: &str = "drvpipe.lua";

/// `SOURCE_DATE_EPOCH` exported to every stage.
/// 315532800 = January 1, 1980 00:00:00 UTC (ZIP epoch).
pub const SOURCE_DATE_EPOCH: &str = "315532800";
