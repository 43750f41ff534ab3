//! MPU6050 sensor source over an FT232H I2C bridge
//!
//! Bring-up mirrors the logger board: reset the part, wake it, leave the
//! accelerometer at ±2g and the gyroscope at ±250°/s. After that the only
//! thing the controller asks for is one raw sample at a time.

use crate::error::SensorError;
use crate::ffi::*;
use crate::sensor::{RawSample, SensorSource};
use std::ptr;
use std::time::Duration;
use tracing::{debug, warn};

const MPU6050_ADDRESS: u8 = 0x68;

const REG_PWR_MGMT_1: u8 = 0x6B;
const REG_WHO_AM_I: u8 = 0x75;
const REG_ACCEL_CONFIG: u8 = 0x1C;
const REG_GYRO_CONFIG: u8 = 0x1B;
const REG_ACCEL_XOUT_H: u8 = 0x3B;

const PWR_MGMT_1_DEVICE_RESET: u8 = 0x80;
const WHO_AM_I_VALUE: u8 = 0x68;

/// Back-off before retrying a failed bus transfer
const READ_RETRY_DELAY: Duration = Duration::from_millis(500);

fn check(status: FT_STATUS) -> Result<(), SensorError> {
    if status == FT_OK {
        Ok(())
    } else {
        Err(SensorError::Ftdi {
            status,
            description: status_to_string(status).to_string(),
        })
    }
}

/// MPU6050 reached through libMPSSE
pub struct Mpu6050 {
    handle: FT_HANDLE,
    address: u8,
}

impl Mpu6050 {
    /// Open I2C channel `channel_index` and bring the sensor up
    pub fn new(channel_index: u32) -> Result<Self, SensorError> {
        let mut num_channels: DWORD = 0;
        check(unsafe { I2C_GetNumChannels(&mut num_channels) })?;

        if num_channels == 0 {
            return Err(SensorError::NoChannelsFound);
        }
        if channel_index >= num_channels {
            return Err(SensorError::InvalidChannel(channel_index));
        }

        let mut handle: FT_HANDLE = ptr::null_mut();
        check(unsafe { I2C_OpenChannel(channel_index, &mut handle) })?;

        let mut config = ChannelConfig::default();
        if let Err(e) = check(unsafe { I2C_InitChannel(handle, &mut config) }) {
            unsafe { I2C_CloseChannel(handle) };
            return Err(e);
        }

        let mut sensor = Mpu6050 {
            handle,
            address: MPU6050_ADDRESS,
        };
        sensor.reset()?;

        Ok(sensor)
    }

    /// Reset, wake and configure the sensor
    fn reset(&mut self) -> Result<(), SensorError> {
        self.write_register(REG_PWR_MGMT_1, PWR_MGMT_1_DEVICE_RESET)?;
        std::thread::sleep(Duration::from_millis(100));

        // Leave sleep mode
        self.write_register(REG_PWR_MGMT_1, 0x00)?;
        std::thread::sleep(Duration::from_millis(10));

        let mut who_am_i = [0u8];
        self.read_registers(REG_WHO_AM_I, &mut who_am_i)?;
        if who_am_i[0] != WHO_AM_I_VALUE {
            return Err(SensorError::InvalidDeviceId(who_am_i[0]));
        }

        // ±2g, matches ACCEL_COUNTS_PER_G
        self.write_register(REG_ACCEL_CONFIG, 0x00)?;
        // ±250°/s
        self.write_register(REG_GYRO_CONFIG, 0x00)?;

        debug!("MPU6050 ready at 0x{:02X}", self.address);
        Ok(())
    }

    fn write_register(&mut self, reg: u8, value: u8) -> Result<(), SensorError> {
        let buffer = [reg, value];
        let mut transferred: DWORD = 0;

        let options = I2C_TRANSFER_OPTIONS_START_BIT
            | I2C_TRANSFER_OPTIONS_STOP_BIT
            | I2C_TRANSFER_OPTIONS_FAST_TRANSFER_BYTES;

        check(unsafe {
            I2C_DeviceWrite(
                self.handle,
                self.address,
                buffer.len() as DWORD,
                buffer.as_ptr(),
                &mut transferred,
                options,
            )
        })
    }

    /// Read consecutive registers starting at `reg` into `data`
    fn read_registers(&mut self, reg: u8, data: &mut [u8]) -> Result<(), SensorError> {
        let reg_buf = [reg];
        let mut transferred: DWORD = 0;

        // Register address without STOP, then a repeated START for the read
        let options = I2C_TRANSFER_OPTIONS_START_BIT
            | I2C_TRANSFER_OPTIONS_BREAK_ON_NACK
            | I2C_TRANSFER_OPTIONS_FAST_TRANSFER_BYTES;

        check(unsafe {
            I2C_DeviceWrite(
                self.handle,
                self.address,
                1,
                reg_buf.as_ptr(),
                &mut transferred,
                options,
            )
        })?;

        let options = I2C_TRANSFER_OPTIONS_START_BIT
            | I2C_TRANSFER_OPTIONS_STOP_BIT
            | I2C_TRANSFER_OPTIONS_NACK_LAST_BYTE
            | I2C_TRANSFER_OPTIONS_FAST_TRANSFER_BYTES;

        // With FAST_TRANSFER_BYTES the transferred count is in bits; only
        // the status is meaningful.
        transferred = 0;
        check(unsafe {
            I2C_DeviceRead(
                self.handle,
                self.address,
                data.len() as DWORD,
                data.as_mut_ptr(),
                &mut transferred,
                options,
            )
        })
    }

    /// Read accel, temperature and gyro in one 14-byte burst
    pub fn read_raw(&mut self) -> Result<RawSample, SensorError> {
        let mut data = [0u8; 14];
        self.read_registers(REG_ACCEL_XOUT_H, &mut data)?;

        let word = |i: usize| i16::from_be_bytes([data[i], data[i + 1]]);
        Ok(RawSample {
            accel: [word(0), word(2), word(4)],
            temp: word(6),
            gyro: [word(8), word(10), word(12)],
        })
    }
}

impl SensorSource for Mpu6050 {
    /// Blocks until the bus answers; a dead bridge hangs the caller
    fn read(&mut self) -> RawSample {
        loop {
            match self.read_raw() {
                Ok(sample) => return sample,
                Err(e) => {
                    warn!("Error reading sensor: {}, retrying", e);
                    std::thread::sleep(READ_RETRY_DELAY);
                }
            }
        }
    }
}

impl Drop for Mpu6050 {
    fn drop(&mut self) {
        unsafe {
            I2C_CloseChannel(self.handle);
        }
    }
}
