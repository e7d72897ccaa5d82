//! The camera device contract (spec.md §6.1) and a simulated
//! implementation used in the absence of real hardware.

pub mod camera;
pub mod error;
pub mod simulated;

pub use camera::Camera;
pub use error::CameraError;
pub use simulated::SimulatedCamera;
