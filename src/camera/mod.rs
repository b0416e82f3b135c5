//! Camera access for test frames and full-resolution stills.
//!
//! - The capture seam via [`CaptureProvider`]
//! - Real captures via [`StillCamera`] (external still-capture command)
//! - Dry-run captures via [`SimulatedCamera`]
//! - Frame data via [`RasterFrame`] and [`Resolution`]

mod capture;
mod frame_utils;
mod provider;
mod simulated;
mod types;

pub use capture::{StillCamera, StillSettings};
pub use frame_utils::{decode_bmp, ensure_resolution};
pub use provider::CaptureProvider;
pub use simulated::SimulatedCamera;
pub use types::{CameraError, RasterFrame, Resolution};
