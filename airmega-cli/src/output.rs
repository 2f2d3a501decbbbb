use airmega::protocol::{AirQuality, LightState};
use airmega::{Device, DeviceStatus, FanSpeed, FilterStatus, Mode};
use serde_json::json;

use crate::cli::OutputFormat;
use crate::error::Result;

pub struct OutputManager {
    format: OutputFormat,
}

impl OutputManager {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    pub fn format_devices(&self, devices: &[Device]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let list: Vec<_> = devices
                    .iter()
                    .map(|d| json!({"id": d.id(), "name": d.display_name()}))
                    .collect();
                Ok(serde_json::to_string_pretty(&list)?)
            }
            OutputFormat::Pretty => {
                if devices.is_empty() {
                    return Ok("No devices found".to_string());
                }
                let lines: Vec<String> = devices
                    .iter()
                    .map(|d| format!("  {:<24} {}", d.display_name(), d.id()))
                    .collect();
                Ok(format!("Devices:\n{}", lines.join("\n")))
            }
        }
    }

    pub fn format_status(&self, device: &Device, status: &DeviceStatus) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(status)?),
            OutputFormat::Pretty => {
                let mut output = format!("{}\n", device);
                output.push_str(&format!(
                    "  Power: {}\n",
                    if status.power { "on" } else { "off" }
                ));
                output.push_str(&format!("  Mode: {}\n", mode_label(&status.mode)));
                output.push_str(&format!("  Fan: {}\n", fan_label(&status.fan_speed)));
                output.push_str(&format!(
                    "  Light: {}\n",
                    match status.light {
                        LightState::On => "on",
                        LightState::Off => "off",
                    }
                ));
                output.push_str(&format!(
                    "  Air quality: {}",
                    air_quality_label(&status.air_quality)
                ));
                Ok(output)
            }
        }
    }

    pub fn format_filters(&self, device: &Device, filters: &[FilterStatus]) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(filters)?),
            OutputFormat::Pretty => {
                let mut output = format!("{}\n", device);
                for filter in filters {
                    output.push_str(&format!(
                        "  {:<15} {:>3}%{}  (code {})\n",
                        filter.role.to_string(),
                        filter.life_level_percent,
                        if filter.needs_change() { "  replace" } else { "" },
                        filter.vendor_code
                    ));
                }
                Ok(output.trim_end().to_string())
            }
        }
    }
}

fn mode_label(mode: &Mode) -> String {
    match mode {
        Mode::Auto => "auto".to_string(),
        Mode::Manual => "manual".to_string(),
        Mode::Other(n) => format!("other ({n})"),
    }
}

fn fan_label(speed: &FanSpeed) -> String {
    match speed {
        FanSpeed::Low => "low".to_string(),
        FanSpeed::Medium => "medium".to_string(),
        FanSpeed::High => "high".to_string(),
        FanSpeed::Other(n) => format!("level {n}"),
    }
}

fn air_quality_label(quality: &AirQuality) -> String {
    match quality {
        AirQuality::Excellent => "excellent".to_string(),
        AirQuality::Good => "good".to_string(),
        AirQuality::Fair => "fair".to_string(),
        AirQuality::Inferior => "inferior".to_string(),
        AirQuality::Unknown(n) => format!("unknown ({n})"),
    }
}
