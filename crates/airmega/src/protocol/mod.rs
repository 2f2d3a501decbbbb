//! Vendor device protocol: envelopes, device operations and discovery.

mod client;
mod directory;
pub mod envelope;
mod models;

pub use client::DeviceClient;
pub use directory::{Device, list_devices};
pub use envelope::{
    ControlCommand, ControlFunction, MessageEnvelope, MessageHeader, build_envelope,
};
pub use models::{AirQuality, DeviceStatus, FanSpeed, FilterRole, FilterStatus, LightState, Mode};
