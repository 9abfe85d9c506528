use super::concurrent;
use core::time::Duration;
use datalogger_sensors::jsn_sr04t::EchoTimer;

/// A fake echo timer that replays scripted pulse durations.
///
/// Each requested timeout is recorded (in microseconds) under the timer's
/// name, retrievable through [`concurrent::get_named_values`].
#[derive(Debug)]
pub struct Timer {
    durations: Vec<u32>,
    next: usize,
    name: &'static str,
}

impl Timer {
    pub fn new(name: &'static str, durations: Vec<u32>) -> Timer {
        concurrent::reset_named_values(name);
        Timer {
            durations: durations,
            next: 0,
            name: name,
        }
    }
}

impl EchoTimer for Timer {
    type Error = super::digital::Error;

    fn measure(&mut self, timeout: Duration) -> Result<u32, Self::Error> {
        concurrent::push_named_value(self.name, timeout.as_micros() as u64);
        let duration = self.durations[self.next];
        self.next += 1;
        Ok(duration)
    }
}
