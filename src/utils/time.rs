//! Time utilities for offset detection and timestamp conversion

use chrono::{Local, NaiveDateTime, Offset, Utc};
use chrono_tz::Tz;
use std::fmt;

use crate::errors::{MappingError, MappingResult};

/// Timestamp layout used by the vendor, e.g. `2024-03-01 20:15:00`
pub const SOURCE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Timestamp layout used by XMLTV, without the offset suffix
pub const XMLTV_TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// UTC offset shared by every timestamp of a run, rendered as `+HHMM`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcOffset {
    seconds: i32,
}

impl UtcOffset {
    pub fn from_seconds(seconds: i32) -> Self {
        Self { seconds }
    }

    /// The host's current offset, including daylight saving
    pub fn local() -> Self {
        Self::from_seconds(Local::now().offset().local_minus_utc())
    }

    /// The current offset of a named timezone such as `Europe/Berlin`
    pub fn for_timezone(name: &str) -> Result<Self, String> {
        let tz: Tz = name
            .parse()
            .map_err(|_| format!("Invalid timezone: '{name}'. Use a named timezone such as 'Europe/Berlin'"))?;
        let offset = Utc::now().with_timezone(&tz).offset().fix();
        Ok(Self::from_seconds(offset.local_minus_utc()))
    }

    /// Configured timezone when given, the host's offset otherwise
    pub fn detect(timezone: Option<&str>) -> Result<Self, String> {
        match timezone {
            Some(name) if !name.trim().is_empty() => Self::for_timezone(name.trim()),
            _ => Ok(Self::local()),
        }
    }

    pub fn seconds(&self) -> i32 {
        self.seconds
    }
}

impl fmt::Display for UtcOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.seconds < 0 { '-' } else { '+' };
        let total_minutes = self.seconds.abs() / 60;
        write!(f, "{}{:02}{:02}", sign, total_minutes / 60, total_minutes % 60)
    }
}

/// Parse a vendor timestamp; `field` names the code for error reporting
pub fn parse_source_timestamp(value: &str, field: &'static str) -> MappingResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), SOURCE_TIMESTAMP_FORMAT).map_err(|_| {
        MappingError::InvalidTimestamp {
            field,
            value: value.to_string(),
        }
    })
}

/// Render a local timestamp as `YYYYMMDDHHMMSS +HHMM`
pub fn format_xmltv_timestamp(dt: &NaiveDateTime, offset: UtcOffset) -> String {
    format!("{} {}", dt.format(XMLTV_TIMESTAMP_FORMAT), offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_display() {
        assert_eq!(UtcOffset::from_seconds(0).to_string(), "+0000");
        assert_eq!(UtcOffset::from_seconds(7200).to_string(), "+0200");
        assert_eq!(UtcOffset::from_seconds(19800).to_string(), "+0530");
        assert_eq!(UtcOffset::from_seconds(-18000).to_string(), "-0500");
        assert_eq!(UtcOffset::from_seconds(-12600).to_string(), "-0330");
    }

    #[test]
    fn test_named_timezone() {
        let utc = UtcOffset::for_timezone("UTC").unwrap();
        assert_eq!(utc.seconds(), 0);

        let berlin = UtcOffset::for_timezone("Europe/Berlin").unwrap();
        assert!(berlin.seconds() == 3600 || berlin.seconds() == 7200);

        assert!(UtcOffset::for_timezone("Invalid/Timezone").is_err());
    }

    #[test]
    fn test_detect_prefers_configured_timezone() {
        assert_eq!(UtcOffset::detect(Some("UTC")).unwrap().seconds(), 0);
        assert_eq!(UtcOffset::detect(Some("  ")).unwrap(), UtcOffset::local());
        assert_eq!(UtcOffset::detect(None).unwrap(), UtcOffset::local());
    }

    #[test]
    fn test_source_timestamp_roundtrip_to_xmltv() {
        let dt = parse_source_timestamp("2024-03-01 20:15:00", "d4").unwrap();
        assert_eq!(
            format_xmltv_timestamp(&dt, UtcOffset::from_seconds(3600)),
            "20240301201500 +0100"
        );
    }

    #[test]
    fn test_invalid_source_timestamp() {
        let err = parse_source_timestamp("01.03.2024 20:15", "d5").unwrap_err();
        assert_eq!(
            err,
            MappingError::InvalidTimestamp {
                field: "d5",
                value: "01.03.2024 20:15".to_string()
            }
        );
    }
}
