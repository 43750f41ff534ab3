//! Sensor source contract and the simulated sensor

/// One raw reading: acceleration, angular rate and die temperature
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RawSample {
    /// Accelerometer X, Y, Z (raw counts)
    pub accel: [i16; 3],
    /// Gyroscope X, Y, Z (raw counts)
    pub gyro: [i16; 3],
    /// Temperature (raw counts)
    pub temp: i16,
}

impl RawSample {
    /// Convert raw accelerometer values to g
    ///
    /// `counts_per_g` is the full-scale constant of the configured range
    /// (16384 for ±2g).
    pub fn accel_to_g(&self, counts_per_g: f32) -> [f32; 3] {
        [
            self.accel[0] as f32 / counts_per_g,
            self.accel[1] as f32 / counts_per_g,
            self.accel[2] as f32 / counts_per_g,
        ]
    }

    /// Die temperature in degrees Celsius (MPU6050 datasheet formula)
    pub fn temp_celsius(&self) -> f32 {
        self.temp as f32 / 340.0 + 36.53
    }
}

/// Blocking "read one sample" source
///
/// Reads have no failure mode at this level: once a source has been brought
/// up it is assumed to always answer. A hung read hangs the controller.
pub trait SensorSource {
    fn read(&mut self) -> RawSample;
}

impl<T: SensorSource + ?Sized> SensorSource for Box<T> {
    fn read(&mut self) -> RawSample {
        (**self).read()
    }
}

/// Deterministic stand-in for the MPU6050
///
/// Produces a board lying flat (1g on Z) with a slow wobble on X/Y and a
/// matching angular rate, so captured files look plausible.
#[derive(Debug, Clone, Default)]
pub struct SimulatedSensor {
    tick: u32,
}

impl SimulatedSensor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SensorSource for SimulatedSensor {
    fn read(&mut self) -> RawSample {
        let phase = self.tick as f32 * 0.2;
        self.tick = self.tick.wrapping_add(1);

        let wobble = phase.sin();
        RawSample {
            accel: [
                (wobble * 1638.0) as i16,
                (phase.cos() * 819.0) as i16,
                16384 - (wobble.abs() * 200.0) as i16,
            ],
            gyro: [(phase.cos() * 262.0) as i16, (wobble * -131.0) as i16, 0],
            // ~25°C
            temp: -3920,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accel_to_g() {
        let sample = RawSample {
            accel: [16384, -8192, 0],
            ..Default::default()
        };
        let g = sample.accel_to_g(16384.0);
        assert_eq!(g, [1.0, -0.5, 0.0]);
    }

    #[test]
    fn test_temp_celsius() {
        let sample = RawSample {
            temp: -3920,
            ..Default::default()
        };
        assert!((sample.temp_celsius() - 25.0).abs() < 0.05);
    }

    #[test]
    fn test_simulated_sensor_reports_gravity() {
        let mut sensor = SimulatedSensor::new();
        for _ in 0..50 {
            let az = sensor.read().accel_to_g(16384.0)[2];
            assert!(az > 0.9 && az <= 1.0);
        }
    }

    #[test]
    fn test_simulated_sensor_changes_over_time() {
        let mut sensor = SimulatedSensor::new();
        let first = sensor.read();
        let second = sensor.read();
        assert_ne!(first, second);
    }
}
