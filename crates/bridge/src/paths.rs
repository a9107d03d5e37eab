//! Default bridge file locations.

use std::path::PathBuf;

/// File name of the single-value bridge the controller publishes to.
pub const VALUE_FILE_NAME: &str = "hd2_fire_rate.txt";

/// File name of the key/value bridge the override layer edits.
pub const STORE_FILE_NAME: &str = "hd2_bridge.txt";

/// Directory every process sharing the bridge can reach: the public
/// directory, or the temp directory where there is none.
pub fn default_exchange_dir() -> PathBuf {
    dirs::public_dir().unwrap_or_else(std::env::temp_dir)
}

/// Default single-value bridge file.
pub fn default_value_file() -> PathBuf {
    default_exchange_dir().join(VALUE_FILE_NAME)
}

/// Default key/value bridge file.
pub fn default_store_file() -> PathBuf {
    default_exchange_dir().join(STORE_FILE_NAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn both_files_share_the_exchange_dir() {
        let dir = default_exchange_dir();
        assert_eq!(default_value_file().parent(), Some(dir.as_path()));
        assert_eq!(default_store_file().parent(), Some(dir.as_path()));
        assert_ne!(default_value_file(), default_store_file());
    }
}
