//! Timestamp and attribute translation.
//!
//! Archive timestamps are carried through the crate as `i64` seconds since
//! the Unix epoch. This module converts ZIP's DOS date/time fields into that
//! form and turns it into whatever the host bridge wants: a [`SystemTime`],
//! a Windows `FILETIME` tick count, or a display string.

use std::ops::BitOr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use ::time::macros::format_description;
use ::time::{Date, Month, OffsetDateTime, PrimitiveDateTime, Time};

/// Seconds between 1601-01-01 (FILETIME epoch) and 1970-01-01.
pub const FILETIME_UNIX_OFFSET_SECS: i64 = 11_644_473_600;

const FILETIME_TICKS_PER_SEC: i128 = 10_000_000;

// Range every supported host can represent in a SystemTime.
const MIN_PORTABLE_SECS: i64 = -FILETIME_UNIX_OFFSET_SECS;
const MAX_PORTABLE_SECS: i64 = 1_833_029_933_770;

/// Convert MS-DOS date and time fields to seconds since the Unix epoch.
///
/// DOS timestamps carry no zone, so they are read as UTC. Zeroed month or
/// day fields (common in archives written by careless tools) are treated as
/// the first month/day rather than rejected.
pub fn dos_to_unix(date: u16, time: u16) -> i64 {
    let year = i32::from((date >> 9) & 0x7F) + 1980;
    let month = Month::try_from(((date >> 5) & 0x0F).clamp(1, 12) as u8).unwrap_or(Month::January);
    let day = i64::from(date & 0x1F).max(1);

    // Days past the end of the month roll over into the next one.
    let day = Date::from_calendar_date(year, month, 1)
        .unwrap_or(Date::MIN)
        .saturating_add(::time::Duration::days(day - 1));
    let midnight = PrimitiveDateTime::new(day, Time::MIDNIGHT)
        .assume_utc()
        .unix_timestamp();

    let hour = i64::from((time >> 11) & 0x1F);
    let minute = i64::from((time >> 5) & 0x3F);
    let second = i64::from(time & 0x1F) * 2;

    midnight + hour * 3600 + minute * 60 + second
}

/// Convert archive seconds to a [`SystemTime`].
///
/// Values outside what the platform can represent are clamped to the
/// portable range; this never panics for any `i64`.
pub fn to_system_time(secs: i64) -> SystemTime {
    offset_from_epoch(secs)
        .or_else(|| offset_from_epoch(secs.clamp(MIN_PORTABLE_SECS, MAX_PORTABLE_SECS)))
        .unwrap_or(UNIX_EPOCH)
}

fn offset_from_epoch(secs: i64) -> Option<SystemTime> {
    let magnitude = Duration::from_secs(secs.unsigned_abs());
    if secs >= 0 {
        UNIX_EPOCH.checked_add(magnitude)
    } else {
        UNIX_EPOCH.checked_sub(magnitude)
    }
}

/// Convert archive seconds to a Windows `FILETIME` value (100 ns ticks since
/// 1601-01-01), clamped to the unsigned 64-bit range.
pub fn to_filetime(secs: i64) -> u64 {
    let ticks = (i128::from(secs) + i128::from(FILETIME_UNIX_OFFSET_SECS)) * FILETIME_TICKS_PER_SEC;
    ticks.clamp(0, i128::from(u64::MAX)) as u64
}

/// Format archive seconds as `YYYY-MM-DD HH:MM` (UTC).
///
/// Instants outside the calendar range fall back to `@<seconds>`.
pub fn format_timestamp(secs: i64) -> String {
    OffsetDateTime::from_unix_timestamp(secs)
        .ok()
        .and_then(|at| {
            at.format(format_description!("[year]-[month]-[day] [hour]:[minute]"))
                .ok()
        })
        .unwrap_or_else(|| format!("@{secs}"))
}

/// Host file attribute bits, using the Win32 `FILE_ATTRIBUTE_*` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileAttributes(u32);

impl FileAttributes {
    pub const READONLY: FileAttributes = FileAttributes(0x0000_0001);
    pub const DIRECTORY: FileAttributes = FileAttributes(0x0000_0010);
    pub const NORMAL: FileAttributes = FileAttributes(0x0000_0080);

    /// Attributes for an archive entry of the given kind.
    pub fn for_entry(is_directory: bool) -> Self {
        if is_directory {
            Self::DIRECTORY
        } else {
            Self::NORMAL
        }
    }

    pub fn bits(self) -> u32 {
        self.0
    }

    pub fn contains(self, other: FileAttributes) -> bool {
        self.0 & other.0 == other.0
    }
}

impl BitOr for FileAttributes {
    type Output = FileAttributes;

    fn bitor(self, rhs: FileAttributes) -> FileAttributes {
        FileAttributes(self.0 | rhs.0)
    }
}

/// Metadata in the shape host bridges consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostStat {
    pub attributes: FileAttributes,
    pub size: u64,
    pub last_write: SystemTime,
    pub last_write_filetime: u64,
}

impl HostStat {
    pub fn new(is_directory: bool, size: u64, mtime: i64) -> Self {
        Self {
            attributes: FileAttributes::for_entry(is_directory),
            size,
            last_write: to_system_time(mtime),
            last_write_filetime: to_filetime(mtime),
        }
    }

    /// Metadata for a directory with no stored entry behind it.
    pub fn directory() -> Self {
        Self::new(true, 0, 0)
    }

    pub fn is_directory(&self) -> bool {
        self.attributes.contains(FileAttributes::DIRECTORY)
    }
}
