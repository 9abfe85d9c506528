use super::concurrent;
use embedded_hal::digital::{ErrorKind, ErrorType, InputPin, OutputPin};

#[derive(Debug, PartialEq)]
pub enum Error {}

impl embedded_hal::digital::Error for Error {
    fn kind(&self) -> ErrorKind {
        match *self {}
    }
}

/// A fake digital pin.
///
/// Input reads come from scripted data, one entry per read, where any value
/// above zero means the line is high. Output transitions are recorded under
/// the pin's name so tests can inspect them through
/// [`concurrent::get_named_events`] after a driver has taken ownership of the
/// pin.
#[derive(Debug)]
pub struct Pin {
    data_to_read: Option<Vec<u8>>,
    next_read: usize,
    name: &'static str,
    default_data: bool,
}

impl Pin {
    pub fn new(name: &'static str) -> Pin {
        concurrent::reset_named_events(name);
        Pin {
            data_to_read: None,
            next_read: 0,
            name: name,
            default_data: false,
        }
    }

    /// The level reads report once the script (if any) is exhausted.
    pub fn set_default_data(&mut self, default: bool) {
        self.default_data = default;
    }

    pub fn set_data(&mut self, data: Vec<u8>) {
        self.data_to_read = Some(data);
        self.next_read = 0;
    }
}

impl ErrorType for Pin {
    type Error = Error;
}

impl InputPin for Pin {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        match self.data_to_read.as_ref() {
            None => Ok(self.default_data),
            Some(data) => {
                if self.next_read >= data.len() {
                    return Ok(self.default_data);
                }
                let value = data[self.next_read];
                self.next_read += 1;
                Ok(value > 0)
            }
        }
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        self.is_high().map(|is_high| !is_high)
    }
}

impl OutputPin for Pin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        concurrent::push_named_event(self.name, false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        concurrent::push_named_event(self.name, true);
        Ok(())
    }
}
