//! Tilt input
//!
//! The engine reads one signed angle (degrees) per frame. Sources that cannot
//! provide one report an [`InputError`] and the engine treats it as level.

use crate::error::InputError;

/// Anything that can report the device's left/right tilt in degrees
pub trait TiltSource {
    /// Current tilt: negative = left, positive = right
    fn current_tilt(&mut self) -> Result<f32, InputError>;

    /// Drop any sensor subscription (called once on teardown)
    fn release(&mut self) {}
}

/// Device without a tilt sensor
#[derive(Debug, Default, Clone, Copy)]
pub struct NoTilt;

impl TiltSource for NoTilt {
    fn current_tilt(&mut self) -> Result<f32, InputError> {
        Err(InputError::Unavailable)
    }
}

/// Tilt derived from raw accelerometer samples
///
/// Assumes gravity is the only force on the device: whatever the y axis does
/// not take of the sensor's range is split off to the x axis.
#[derive(Debug, Clone)]
pub struct AccelerometerTilt {
    max_range: f32,
    latest: Option<[f32; 3]>,
    subscribed: bool,
}

impl AccelerometerTilt {
    /// Full-scale deflection in degrees
    pub const TILT_MAX: f32 = 90.0;

    pub fn new(max_range: f32) -> Self {
        Self {
            max_range,
            latest: None,
            subscribed: true,
        }
    }

    /// Feed a sample from the sensor callback
    pub fn push_sample(&mut self, accel: [f32; 3]) {
        if self.subscribed {
            self.latest = Some(accel);
        }
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }
}

impl TiltSource for AccelerometerTilt {
    fn current_tilt(&mut self) -> Result<f32, InputError> {
        let accel = self.latest.ok_or(InputError::StaleSample)?;
        let available_range = accel[1] - self.max_range;
        if available_range == 0.0 {
            return Ok(0.0);
        }
        Ok(accel[0] / available_range * Self::TILT_MAX)
    }

    fn release(&mut self) {
        self.subscribed = false;
        self.latest = None;
    }
}

/// Replays a fixed list of readings, looping at the end
#[derive(Debug, Clone)]
pub struct ScriptedTilt {
    samples: Vec<f32>,
    cursor: usize,
}

impl ScriptedTilt {
    pub fn new(samples: Vec<f32>) -> Self {
        Self { samples, cursor: 0 }
    }

    pub fn constant(tilt: f32) -> Self {
        Self::new(vec![tilt])
    }
}

impl TiltSource for ScriptedTilt {
    fn current_tilt(&mut self) -> Result<f32, InputError> {
        if self.samples.is_empty() {
            return Err(InputError::StaleSample);
        }
        let tilt = self.samples[self.cursor % self.samples.len()];
        self.cursor = self.cursor.wrapping_add(1);
        Ok(tilt)
    }
}
