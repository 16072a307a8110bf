//! Native capture host
//!
//! Microphone acquisition and the lossless processing graph, both on cpal.

mod cpal_devices;
mod cpal_engine;
mod resample;

pub use cpal_devices::{CpalMediaDevices, CpalStream, InputDeviceInfo, StreamTap, TapReceiver};
pub use cpal_engine::{CpalEngine, CpalEngineFactory};
pub use resample::{ResampleError, StreamResampler};
