use crate::record::Column;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// The resolution of the sensor when in its power-on 12-bit mode.
pub const MAX_RESOLUTION_F32: f32 = 0.0625;

const RESET_TIME_US: u32 = 480;
// Sensors send a 60-240us presence pulse starting 15-60us after the reset.
const FIRST_PRESENCE_PULSE_DELAY_US: u32 = 30;
const SECOND_PRESENCE_PULSE_DELAY_US: u32 = 30;
const POST_PRESENCE_PULSE_DELAY_US: u32 =
    RESET_TIME_US - FIRST_PRESENCE_PULSE_DELAY_US - SECOND_PRESENCE_PULSE_DELAY_US;

const READ_WRITE_RECOVERY_TIME_US: u32 = 1;
const MIN_SLOT_DURATION_US: u32 = 60;
const WRITE_1_DURATION_US: u32 = 1;
const WRITE_1_POST_BIT_DELAY_US: u32 = MIN_SLOT_DURATION_US - WRITE_1_DURATION_US;
const WRITE_0_DURATION_US: u32 = 60;
const READ_REQUEST_DURATION_US: u32 = 1;
const READ_SAMPLE_DELAY_US: u32 = 15 - READ_REQUEST_DURATION_US;
const READ_POST_SAMPLE_DELAY_US: u32 = MIN_SLOT_DURATION_US - READ_SAMPLE_DELAY_US;

const CONVERSION_TIME_12BIT: Duration = Duration::from_millis(750);

const SCRATCHPAD_LEN: usize = 9;

#[derive(Debug, PartialEq)]
pub enum Error<TIoError> {
    /// Wrapped error from the HAL.
    Wrapped(TIoError),
    /// No presence pulse was seen after a bus reset.
    NoSensorsFound,
    /// The scratchpad failed its CRC check. Check the wiring and try again.
    BadData,
}

impl<TIoError> From<TIoError> for Error<TIoError> {
    fn from(error: TIoError) -> Error<TIoError> {
        Error::Wrapped(error)
    }
}

/// Administrative commands for operating the one-wire line.
enum RomCommand {
    /// Addresses all devices simultaneously.
    ///
    /// With a single sensor on the line this stands in for matching its ROM
    /// code, which is all this driver needs.
    Skip = 0xCC,
}

/// Requests the addressed sensor perform some operation.
enum FunctionCommand {
    /// Stores the current temperature in the 2-byte temperature register in
    /// the scratchpad memory.
    ConvertTemperature = 0x44,
    /// Reads the contents of the sensor's scratchpad, CRC byte last.
    ReadScratchpad = 0xBE,
}

/// A temperature measurement, in sixteenths of a degree Celsius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Temperature {
    sixteenths: i16,
}

impl Temperature {
    /// Constructs a temperature from the first two scratchpad bytes.
    pub fn from_scratchpad(low_sig: u8, high_sig: u8) -> Temperature {
        Temperature {
            sixteenths: i16::from_le_bytes([low_sig, high_sig]),
        }
    }

    /// The raw register value, in units of [`MAX_RESOLUTION_F32`] degrees.
    pub fn sixteenths(&self) -> i16 {
        self.sixteenths
    }

    /// The integer part of the measurement, truncated towards zero.
    ///
    /// Calculated without performing floating-point operations.
    pub fn integer_part(&self) -> i16 {
        self.sixteenths / 16
    }
}

impl From<Temperature> for f32 {
    fn from(temperature: Temperature) -> f32 {
        temperature.sixteenths as f32 * MAX_RESOLUTION_F32
    }
}

impl Column for Temperature {
    const NAME: &'static str = "Temperature";

    fn value(&self) -> f32 {
        f32::from(*self)
    }
}

/// Driver for a single DS18B20 temperature probe.
///
/// The probe's data line must be wired with a pull-up, and `pin` must behave
/// as open-drain: `set_low` drives the line, `set_high` releases it so the
/// sensor (or the pull-up) controls the level. The driver addresses the line
/// with Skip ROM, so it supports exactly one sensor per pin.
#[derive(Debug)]
pub struct Ds18b20<TPin> {
    pin: TPin,
}

impl<TPin, TError> Ds18b20<TPin>
where
    TPin: InputPin<Error = TError> + OutputPin<Error = TError>,
{
    /// Constructs a driver on the given data line.
    ///
    /// The line is released here so the sensor can power up through the
    /// pull-up before the first read.
    pub fn new(pin: TPin) -> Result<Ds18b20<TPin>, Error<TError>> {
        let mut pin = pin;
        pin.set_high()?;
        Ok(Ds18b20 { pin: pin })
    }

    /// Requests a temperature conversion and reads the result.
    ///
    /// This blocks for the full 12-bit conversion time, so a read takes a
    /// little over 750ms.
    pub fn read<TDelay>(&mut self, delay: &mut TDelay) -> Result<Temperature, Error<TError>>
    where
        TDelay: DelayNs,
    {
        self.reset(delay)?;
        self.write_byte(RomCommand::Skip as u8, delay)?;
        self.write_byte(FunctionCommand::ConvertTemperature as u8, delay)?;
        delay.delay_ms(CONVERSION_TIME_12BIT.as_millis() as u32);

        self.reset(delay)?;
        self.write_byte(RomCommand::Skip as u8, delay)?;
        self.write_byte(FunctionCommand::ReadScratchpad as u8, delay)?;
        let mut scratchpad = [0u8; SCRATCHPAD_LEN];
        for byte in scratchpad.iter_mut() {
            *byte = self.read_byte(delay)?;
        }

        if crc8(&scratchpad[..SCRATCHPAD_LEN - 1]) != scratchpad[SCRATCHPAD_LEN - 1] {
            return Err(Error::BadData);
        }
        Ok(Temperature::from_scratchpad(scratchpad[0], scratchpad[1]))
    }

    /// Resets the line and checks for a presence pulse.
    fn reset<TDelay>(&mut self, delay: &mut TDelay) -> Result<(), Error<TError>>
    where
        TDelay: DelayNs,
    {
        self.pin.set_low()?;
        delay.delay_us(RESET_TIME_US);
        self.pin.set_high()?;

        // Sample the line twice to cover the presence pulse's timing range.
        delay.delay_us(FIRST_PRESENCE_PULSE_DELAY_US);
        let mut is_present = self.pin.is_low()?;
        delay.delay_us(SECOND_PRESENCE_PULSE_DELAY_US);
        is_present |= self.pin.is_low()?;
        if !is_present {
            return Err(Error::NoSensorsFound);
        }

        // Wait out the rest of the presence window.
        delay.delay_us(POST_PRESENCE_PULSE_DELAY_US);
        Ok(())
    }

    /// Writes a byte, least-significant bit first.
    fn write_byte<TDelay>(&mut self, byte: u8, delay: &mut TDelay) -> Result<(), Error<TError>>
    where
        TDelay: DelayNs,
    {
        let mut byte = byte;
        for _ in 0..8 {
            self.write_bit(byte & 1, delay)?;
            byte >>= 1;
        }
        Ok(())
    }

    /// Reads a byte, least-significant bit first.
    fn read_byte<TDelay>(&mut self, delay: &mut TDelay) -> Result<u8, Error<TError>>
    where
        TDelay: DelayNs,
    {
        let mut byte = 0u8;
        for bit in 0..8 {
            if self.read_bit(delay)? {
                byte |= 1 << bit;
            }
        }
        Ok(byte)
    }

    fn write_bit<TDelay>(&mut self, bit: u8, delay: &mut TDelay) -> Result<(), Error<TError>>
    where
        TDelay: DelayNs,
    {
        // Recovery period between slots.
        self.pin.set_high()?;
        delay.delay_us(READ_WRITE_RECOVERY_TIME_US);

        self.pin.set_low()?;
        let hold_us = match bit {
            0 => WRITE_0_DURATION_US,
            _ => WRITE_1_DURATION_US,
        };
        delay.delay_us(hold_us);

        self.pin.set_high()?;
        if bit != 0 {
            delay.delay_us(WRITE_1_POST_BIT_DELAY_US);
        }
        Ok(())
    }

    fn read_bit<TDelay>(&mut self, delay: &mut TDelay) -> Result<bool, Error<TError>>
    where
        TDelay: DelayNs,
    {
        // Recovery period between slots.
        self.pin.set_high()?;
        delay.delay_us(READ_WRITE_RECOVERY_TIME_US);

        // Request the bit, then sample 15us into the slot.
        self.pin.set_low()?;
        delay.delay_us(READ_REQUEST_DURATION_US);
        self.pin.set_high()?;
        delay.delay_us(READ_SAMPLE_DELAY_US);
        let bit = self.pin.is_high()?;

        delay.delay_us(READ_POST_SAMPLE_DELAY_US);
        Ok(bit)
    }
}

/// Computes the Dallas CRC-8 (polynomial 0x31, reflected) over `data`.
fn crc8(data: &[u8]) -> u8 {
    let mut crc = 0u8;
    for byte in data.iter() {
        let mut byte = *byte;
        for _ in 0..8 {
            let mix = (crc ^ byte) & 0x01;
            crc >>= 1;
            if mix != 0 {
                crc ^= 0x8C;
            }
            byte >>= 1;
        }
    }
    crc
}
