use std::io::IsTerminal;

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use twibc_client::DeviceDescriptor;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct DeviceRow {
    device_id: u32,
    identification: serde_json::Value,
}

pub fn print_devices(devices: &[DeviceDescriptor], format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let rows: Vec<DeviceRow> = devices
                .iter()
                .map(|device| DeviceRow {
                    device_id: device.device_id,
                    identification: msgpack_to_json(&device.identification),
                })
                .collect();
            println!(
                "{}",
                serde_json::to_string(&rows).unwrap_or_else(|_| "[]".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["DEVICE ID", "NICKNAME", "IDENTIFICATION"]);
            for device in devices {
                table.add_row(vec![
                    format!("{:#010x}", device.device_id),
                    nickname(&device.identification).unwrap_or_else(|| "-".to_string()),
                    preview(&device.identification.to_string(), 60),
                ]);
            }
            println!("{table}");
        }
        OutputFormat::Pretty => {
            for device in devices {
                println!(
                    "device={:#010x} identification={}",
                    device.device_id, device.identification
                );
            }
        }
    }
}

pub fn print_identification(value: &rmpv::Value, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(&msgpack_to_json(value)).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("{value}");
        }
    }
}

/// Identification records are device-defined; the nickname key is the one
/// field worth a column of its own when present.
fn nickname(identification: &rmpv::Value) -> Option<String> {
    let map = identification.as_map()?;
    map.iter()
        .find(|(key, _)| key.as_str() == Some("device_nickname"))
        .and_then(|(_, value)| value.as_str())
        .map(str::to_string)
}

fn msgpack_to_json(value: &rmpv::Value) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or_else(|_| serde_json::Value::String(value.to_string()))
}

fn preview(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let truncated: String = text.chars().take(max).collect();
    format!("{truncated}…")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nickname_extracted_from_identification_map() {
        let value = rmpv::Value::Map(vec![(
            rmpv::Value::from("device_nickname"),
            rmpv::Value::from("mizusu"),
        )]);
        assert_eq!(nickname(&value).as_deref(), Some("mizusu"));
        assert_eq!(nickname(&rmpv::Value::Nil), None);
    }

    #[test]
    fn preview_truncates_long_values() {
        assert_eq!(preview("short", 10), "short");
        assert_eq!(preview("0123456789abc", 10), "0123456789…");
    }

    #[test]
    fn msgpack_binary_survives_json_conversion() {
        let value = rmpv::Value::Binary(vec![1, 2, 3]);
        let json = msgpack_to_json(&value);
        assert!(json.is_array() || json.is_string());
    }
}
