//! An in-memory camera used by `ucad`'s default `simulated` camera name,
//! by integration tests, and by the scenarios in spec.md §8. There is no
//! real hardware available to this workspace (spec.md §1 treats the
//! camera driver as an external collaborator), so this stands in for it.

use uca_proto::{PropertyDescriptor, PropertySpec, PropertyType};

use crate::camera::Camera;
use crate::error::CameraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerMode {
    Auto = 0,
    Software = 1,
    External = 2,
}

impl TriggerMode {
    fn from_index(i: i32) -> Option<Self> {
        match i {
            0 => Some(Self::Auto),
            1 => Some(Self::Software),
            2 => Some(Self::External),
            _ => None,
        }
    }
}

pub struct SimulatedCamera {
    name: String,
    recording: bool,
    roi_width: u32,
    roi_height: u32,
    sensor_bitdepth: u32,
    exposure_time: f64,
    trigger_mode: TriggerMode,
    frame_counter: u64,
    /// Test hook: when set, the next `grab()` fails with this error
    /// instead of producing data (drives scenario S3 in spec.md §8).
    pub force_next_grab_failure: Option<CameraError>,
}

impl SimulatedCamera {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            recording: false,
            roi_width: 4,
            roi_height: 4,
            sensor_bitdepth: 8,
            exposure_time: 1.0,
            trigger_mode: TriggerMode::Auto,
            frame_counter: 0,
            force_next_grab_failure: None,
        }
    }

    fn bytes_per_pixel(&self) -> usize {
        if self.sensor_bitdepth <= 8 { 1 } else { 2 }
    }
}

impl Camera for SimulatedCamera {
    // "name" and "is-recording" are the base properties every client
    // already knows about; GetProperties never re-advertises them.
    const N_BASE_PROPERTIES: usize = 2;

    fn get_property(&self, name: &str) -> Result<String, CameraError> {
        Ok(match name {
            "name" => self.name.clone(),
            "is-recording" => if self.recording { "TRUE".into() } else { "FALSE".into() },
            "roi-width" => self.roi_width.to_string(),
            "roi-height" => self.roi_height.to_string(),
            "sensor-bitdepth" => self.sensor_bitdepth.to_string(),
            "exposure-time" => self.exposure_time.to_string(),
            "trigger-mode" => (self.trigger_mode as i32).to_string(),
            other => return Err(CameraError::unknown_property(other)),
        })
    }

    fn set_property(&mut self, name: &str, value: &str) -> Result<(), CameraError> {
        match name {
            "roi-width" => {
                self.roi_width = value.parse().map_err(|_| CameraError::out_of_range(name, value))?;
            }
            "roi-height" => {
                self.roi_height = value.parse().map_err(|_| CameraError::out_of_range(name, value))?;
            }
            "sensor-bitdepth" => {
                let bd: u32 = value.parse().map_err(|_| CameraError::out_of_range(name, value))?;
                if bd != 8 && bd != 16 {
                    return Err(CameraError::out_of_range(name, value));
                }
                self.sensor_bitdepth = bd;
            }
            "exposure-time" => {
                let v: f64 = value.parse().map_err(|_| CameraError::out_of_range(name, value))?;
                if !(0.0..=10.0).contains(&v) {
                    return Err(CameraError::out_of_range(name, value));
                }
                self.exposure_time = v;
            }
            "trigger-mode" => {
                let idx: i32 = value.parse().map_err(|_| CameraError::out_of_range(name, value))?;
                self.trigger_mode = TriggerMode::from_index(idx)
                    .ok_or_else(|| CameraError::out_of_range(name, value))?;
            }
            "name" | "is-recording" => {
                return Err(CameraError::new("camera", 5, format!("property '{name}' is read-only")))
            }
            other => return Err(CameraError::unknown_property(other)),
        }
        Ok(())
    }

    fn start_recording(&mut self) -> Result<(), CameraError> {
        if self.recording {
            return Err(CameraError::already_recording("start_recording"));
        }
        self.recording = true;
        Ok(())
    }

    fn stop_recording(&mut self) -> Result<(), CameraError> {
        if !self.recording {
            return Err(CameraError::not_recording("stop_recording"));
        }
        self.recording = false;
        Ok(())
    }

    fn start_readout(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn stop_readout(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn trigger(&mut self) -> Result<(), CameraError> {
        Ok(())
    }

    fn grab(&mut self, buffer: &mut [u8]) -> Result<(), CameraError> {
        if let Some(err) = self.force_next_grab_failure.take() {
            return Err(err);
        }
        for (i, b) in buffer.iter_mut().enumerate() {
            *b = ((self.frame_counter as usize + i) % 256) as u8;
        }
        self.frame_counter += 1;
        Ok(())
    }

    fn write(&mut self, name: &str, _data: &[u8]) -> Result<(), CameraError> {
        match name {
            "firmware" | "calibration" => Ok(()),
            other => Err(CameraError::unknown_property(other)),
        }
    }

    fn list_properties(&self) -> Vec<PropertyDescriptor> {
        vec![
            PropertyDescriptor {
                type_tag: PropertyType::String,
                flags: 0,
                name: "name".into(),
                nick: "Name".into(),
                blurb: "Camera name".into(),
                valid: true,
                spec: PropertySpec::String { default: self.name.clone() },
            },
            PropertyDescriptor {
                type_tag: PropertyType::Bool,
                flags: 0,
                name: "is-recording".into(),
                nick: "Is Recording".into(),
                blurb: "Whether the camera is currently recording".into(),
                valid: true,
                spec: PropertySpec::Bool { default: false },
            },
            PropertyDescriptor {
                type_tag: PropertyType::UInt32,
                flags: 0,
                name: "roi-width".into(),
                nick: "ROI Width".into(),
                blurb: "Region of interest width in pixels".into(),
                valid: true,
                spec: PropertySpec::Numeric { min: 1.0, max: 4096.0, default: 4.0 },
            },
            PropertyDescriptor {
                type_tag: PropertyType::UInt32,
                flags: 0,
                name: "roi-height".into(),
                nick: "ROI Height".into(),
                blurb: "Region of interest height in pixels".into(),
                valid: true,
                spec: PropertySpec::Numeric { min: 1.0, max: 4096.0, default: 4.0 },
            },
            PropertyDescriptor {
                type_tag: PropertyType::UInt32,
                flags: 0,
                name: "sensor-bitdepth".into(),
                nick: "Sensor Bit Depth".into(),
                blurb: "Bits per pixel sample (8 or 16)".into(),
                valid: true,
                spec: PropertySpec::Numeric { min: 8.0, max: 16.0, default: 8.0 },
            },
            PropertyDescriptor {
                type_tag: PropertyType::Float64,
                flags: 0,
                name: "exposure-time".into(),
                nick: "Exposure Time".into(),
                blurb: "Exposure time in seconds".into(),
                valid: true,
                spec: PropertySpec::Numeric { min: 0.0, max: 10.0, default: 1.0 },
            },
            PropertyDescriptor {
                type_tag: PropertyType::Enum,
                flags: 0,
                name: "trigger-mode".into(),
                nick: "Trigger Mode".into(),
                blurb: "How frame acquisition is triggered".into(),
                valid: true,
                spec: PropertySpec::Enum {
                    default: 0,
                    min: 0,
                    max: 2,
                    values: vec![0, 1, 2],
                    value_names: vec!["auto".into(), "software".into(), "external".into()],
                    value_nicks: vec!["Auto".into(), "Software".into(), "External".into()],
                },
            },
        ]
    }

    fn is_recording(&self) -> bool {
        self.recording
    }

    fn frame_size(&self) -> usize {
        self.roi_width as usize * self.roi_height as usize * self.bytes_per_pixel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn property_round_trip() {
        let mut cam = SimulatedCamera::new("sim0");
        cam.set_property("exposure-time", "2.5").unwrap();
        assert_eq!(cam.get_property("exposure-time").unwrap(), "2.5");
    }

    #[test]
    fn grab_produces_requested_size() {
        let mut cam = SimulatedCamera::new("sim0");
        cam.set_property("roi-width", "4").unwrap();
        cam.set_property("roi-height", "2").unwrap();
        cam.set_property("sensor-bitdepth", "16").unwrap();
        assert_eq!(cam.frame_size(), 16);
        let mut buf = vec![0u8; cam.frame_size()];
        cam.grab(&mut buf).unwrap();
        assert_eq!(buf.len(), 16);
    }

    #[test]
    fn forced_grab_failure_surfaces_error() {
        let mut cam = SimulatedCamera::new("sim0");
        cam.force_next_grab_failure = Some(CameraError::new("cam", 7, "dark"));
        let mut buf = vec![0u8; cam.frame_size()];
        let err = cam.grab(&mut buf).unwrap_err();
        assert_eq!(err.code, 7);
    }

    #[test]
    fn list_properties_excludes_base_count_matches_constant() {
        let cam = SimulatedCamera::new("sim0");
        assert!(cam.list_properties().len() > SimulatedCamera::N_BASE_PROPERTIES);
    }
}
