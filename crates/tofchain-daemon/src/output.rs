//! Formatting of readings and scan results for stdout

use anyhow::Result;
use chrono::SecondsFormat;
use tofchain_stream::RangeReading;

use crate::bringup::ScanEntry;

/// One line per reading, either human-readable or a JSON object
pub fn format_reading(reading: &RangeReading, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(reading)?);
    }

    Ok(format!(
        "{}  sensor {} ({:#04x})  {:>3}",
        reading
            .observed_at
            .to_rfc3339_opts(SecondsFormat::Millis, true),
        reading.index,
        reading.address,
        reading.distance
    ))
}

pub fn format_scan(entries: &[ScanEntry], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(entries)?);
    }

    let mut out = format!("Found {} sensor(s):\n", entries.len());
    for entry in entries {
        let id = &entry.identification;
        out.push_str(&format!(
            "  - {:#04x}: model {:#04x} rev {}.{}, module rev {}.{}, date {:#06x} time {:#06x}\n",
            entry.address,
            id.model_id,
            id.model_rev_major,
            id.model_rev_minor,
            id.module_rev_major,
            id.module_rev_minor,
            id.date,
            id.time
        ));
        for value in entry.registers.iter().flatten() {
            out.push_str(&format!(
                "      {:#06x} {:<40} {:#x}\n",
                value.register.address, value.register.name, value.value
            ));
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use tofchain_core::Identification;

    fn reading() -> RangeReading {
        RangeReading {
            index: 2,
            address: 0x32,
            distance: 57,
            observed_at: Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_text_reading() {
        let line = format_reading(&reading(), false).unwrap();
        assert_eq!(line, "2024-05-01T12:00:00.000Z  sensor 2 (0x32)   57");
    }

    #[test]
    fn test_json_reading() {
        let line = format_reading(&reading(), true).unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();

        assert_eq!(value["index"], 2);
        assert_eq!(value["address"], 0x32);
        assert_eq!(value["distance"], 57);
        assert_eq!(value["observed_at"], "2024-05-01T12:00:00Z");
    }

    #[test]
    fn test_scan_listing() {
        let entries = vec![ScanEntry {
            address: 0x30,
            identification: Identification {
                model_id: 0xB4,
                model_rev_major: 1,
                model_rev_minor: 3,
                module_rev_major: 1,
                module_rev_minor: 2,
                date: 0x1234,
                time: 0x5678,
            },
            registers: None,
        }];

        let text = format_scan(&entries, false).unwrap();

        assert!(text.starts_with("Found 1 sensor(s):"));
        assert!(text.contains("0x30: model 0xb4 rev 1.3"));
    }
}
