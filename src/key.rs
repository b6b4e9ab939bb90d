//! Object key derivation
//!
//! Builds the partitioned folder path and file-name fragment for one batch
//! from its recorded start timestamp. Pure and deterministic: no clock reads,
//! the same inputs always produce the same key. The batch writer appends the
//! format's `.{extension}` suffix.

use crate::config::{DateGrain, SinkConfig};
use chrono::{Datelike, NaiveDateTime, Timelike};

/// Build the fully qualified object key (without extension) for a batch
///
/// Layout: `{bucket}/{prefix}/{stream}/[date segments/]<filename fragment>`.
/// `stream_name_path_override` replaces the stream name in the folder path
/// only.
pub fn build_key(batch_start: NaiveDateTime, stream_name: &str, cfg: &SinkConfig) -> String {
    let stream = cfg
        .stream_name_path_override
        .as_deref()
        .unwrap_or(stream_name);

    let mut folder_path = format!("{}/{}/{stream}/", cfg.bucket, cfg.prefix);
    let mut file_name = String::new();

    if cfg.append_date_to_prefix {
        folder_path += &folder_structure(
            batch_start,
            cfg.append_date_to_prefix_grain,
            cfg.partition_name_enabled,
        );
    }
    if cfg.append_date_to_filename {
        file_name += &file_structure(batch_start, cfg.append_date_to_filename_grain);
    }

    format!("{folder_path}{file_name}")
}

/// One path segment per grain level from year down to `grain`, inclusive
///
/// Zero-padded to 2 digits except year and microsecond. With
/// `partition_name_enabled`, each segment carries a Hive-style `name=` prefix.
fn folder_structure(batch_start: NaiveDateTime, grain: DateGrain, named: bool) -> String {
    let mut ret = String::new();
    for level in DateGrain::ALL {
        if !grain.includes(level) {
            continue;
        }
        if named {
            ret.push_str(level.level_name());
            ret.push('=');
        }
        ret.push_str(&level_value(batch_start, level));
        ret.push('/');
    }
    ret
}

/// Date digits for the file name, down to `grain`
///
/// A single `-` separator sits before the hour component (date-then-time
/// visual split); no other separators, no level names.
fn file_structure(batch_start: NaiveDateTime, grain: DateGrain) -> String {
    let mut ret = String::new();
    for level in DateGrain::ALL {
        if !grain.includes(level) {
            continue;
        }
        if level == DateGrain::Hour {
            ret.push('-');
        }
        ret.push_str(&level_value(batch_start, level));
    }
    ret
}

fn level_value(ts: NaiveDateTime, level: DateGrain) -> String {
    match level {
        DateGrain::Year => ts.year().to_string(),
        DateGrain::Month => format!("{:02}", ts.month()),
        DateGrain::Day => format!("{:02}", ts.day()),
        DateGrain::Hour => format!("{:02}", ts.hour()),
        DateGrain::Minute => format!("{:02}", ts.minute()),
        DateGrain::Second => format!("{:02}", ts.second()),
        DateGrain::Microsecond => (ts.nanosecond() / 1_000).to_string(),
    }
}
