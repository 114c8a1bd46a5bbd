//! Data log file naming.

use std::path::{Path, PathBuf};

use chrono::NaiveDate;

/// Path of the data log for one device, operator and UTC day.
///
/// ```text
/// <log_dir>/<device>-<operator>-<YYYY-MM-DD>.csv
/// ```
///
/// # Example
///
/// ```
/// use std::path::{Path, PathBuf};
/// use chrono::NaiveDate;
/// use crowdbike::storage::log_file_path;
///
/// let date = NaiveDate::from_ymd_opt(2019, 1, 21).unwrap();
/// let path = log_file_path(Path::new("/data"), "07", "jane", date);
/// assert_eq!(path, PathBuf::from("/data/07-jane-2019-01-21.csv"));
/// ```
pub fn log_file_path(log_dir: &Path, device_id: &str, operator: &str, date: NaiveDate) -> PathBuf {
    log_dir.join(format!(
        "{}-{}-{}.csv",
        device_id,
        operator,
        date.format("%Y-%m-%d")
    ))
}
