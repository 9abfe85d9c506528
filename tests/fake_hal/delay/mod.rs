use embedded_hal::delay::DelayNs;

/// A delay that completes instantly and accumulates the total time requested.
#[derive(Debug, Default)]
pub struct Delay {
    total_ns: u64,
}

impl Delay {
    pub fn new() -> Delay {
        Delay { total_ns: 0 }
    }

    pub fn total_us(&self) -> u64 {
        self.total_ns / 1_000
    }
}

impl DelayNs for Delay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
    }
}
