use crate::record::Column;
use core::time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{InputPin, OutputPin};

/// The number of raw echo samples collected for each reading.
pub const SAMPLES_PER_READ: usize = 15;

/// The default number of samples averaged into the final distance. See
/// [`Options::num_nearest`].
pub const DEFAULT_NUM_NEAREST: usize = 5;

/// The default limit on how long to wait for one echo pulse.
///
/// 26ms of round-trip time corresponds to roughly 4.5m, which is beyond the
/// rated range of the module.
pub const DEFAULT_ECHO_TIMEOUT: Duration = Duration::from_micros(26_000);

/// The default time to let echoes die down between samples.
pub const DEFAULT_SETTLE_INTERVAL: Duration = Duration::from_millis(100);

/// Microseconds of round-trip echo time per centimeter of distance, at room
/// temperature.
const US_PER_CM: f32 = 58.0;

const TRIGGER_SETTLE_US: u32 = 2;
const TRIGGER_PULSE_US: u32 = 20;

#[derive(Debug, PartialEq)]
pub enum Error<TIoError> {
    /// Wrapped error from the HAL.
    Wrapped(TIoError),
    /// Invalid argument was provided.
    InvalidArgument,
}

impl<TIoError> From<TIoError> for Error<TIoError> {
    fn from(error: TIoError) -> Error<TIoError> {
        Error::Wrapped(error)
    }
}

/// Options to modify the behavior of the driver.
#[derive(Clone, Copy, Debug)]
pub struct Options {
    /// How long to wait between samples so that echoes from the previous ping
    /// have died down. Readings become unreliable below roughly 60ms.
    pub settle_interval: Duration,
    /// How long to wait for an echo pulse before giving up on a sample.
    ///
    /// A sample that times out is recorded as a zero duration, not an error.
    /// See [`JsnSr04t::read`].
    pub echo_timeout: Duration,
    /// How many of the samples nearest the maximum to average into the final
    /// distance. Must be in the range `[1, SAMPLES_PER_READ]`.
    pub num_nearest: usize,
}

pub const DEFAULT_OPTIONS: Options = Options {
    settle_interval: DEFAULT_SETTLE_INTERVAL,
    echo_timeout: DEFAULT_ECHO_TIMEOUT,
    num_nearest: DEFAULT_NUM_NEAREST,
};

/// Measures the width of the echo pulse that follows a trigger ping.
///
/// This is the equivalent of `pulseIn` on Arduino-style firmwares: wait for
/// the echo line to go high, then time how long it stays high. Implementations
/// are typically backed by a hardware timer or input-capture peripheral;
/// [`PollingEchoTimer`] is a portable fallback that busy-polls the pin.
pub trait EchoTimer {
    /// Wrapped error from the HAL.
    type Error;

    /// Measures one echo pulse, in microseconds.
    ///
    /// Returns `0` if the pulse has not started and ended within `timeout`.
    fn measure(&mut self, timeout: Duration) -> Result<u32, Self::Error>;
}

// Check the clock every N polls rather than on each one, so that polling
// stays fast relative to the pulse being measured.
const WATCHDOG_COUNTS: u32 = 1000;

/// An [`EchoTimer`] that busy-polls an input pin against a monotonic clock.
///
/// The provided `time_fn` closure should provide some representation of a
/// given instant that can be used with `elapsed_since_fn` to determine how
/// much time has passed since then. It does not need to reflect real dates
/// and times, but only needs to be capable of providing reasonably accurate
/// durations (i.e. with microsecond precision or better).
#[derive(Debug)]
pub struct PollingEchoTimer<TPin, TimeFn, ElapsedFn> {
    pin: TPin,
    time_fn: TimeFn,
    elapsed_since_fn: ElapsedFn,
}

impl<TPin, TError, TimeFn, ElapsedFn, TTime> PollingEchoTimer<TPin, TimeFn, ElapsedFn>
where
    TPin: InputPin<Error = TError>,
    TimeFn: Fn() -> TTime,
    ElapsedFn: Fn(TTime) -> Duration,
    TTime: Copy,
{
    pub fn new(
        pin: TPin,
        time_fn: TimeFn,
        elapsed_since_fn: ElapsedFn,
    ) -> PollingEchoTimer<TPin, TimeFn, ElapsedFn> {
        PollingEchoTimer {
            pin: pin,
            time_fn: time_fn,
            elapsed_since_fn: elapsed_since_fn,
        }
    }
}

impl<TPin, TError, TimeFn, ElapsedFn, TTime> EchoTimer
    for PollingEchoTimer<TPin, TimeFn, ElapsedFn>
where
    TPin: InputPin<Error = TError>,
    TimeFn: Fn() -> TTime,
    ElapsedFn: Fn(TTime) -> Duration,
    TTime: Copy,
{
    type Error = TError;

    fn measure(&mut self, timeout: Duration) -> Result<u32, TError> {
        let start_time = (self.time_fn)();
        let mut counter: u32 = 0;
        while self.pin.is_low()? {
            counter += 1;
            if counter % WATCHDOG_COUNTS == 0 && (self.elapsed_since_fn)(start_time) > timeout {
                return Ok(0);
            }
        }
        let pulse_start = (self.time_fn)();
        while self.pin.is_high()? {
            counter += 1;
            if counter % WATCHDOG_COUNTS == 0 && (self.elapsed_since_fn)(start_time) > timeout {
                return Ok(0);
            }
        }
        Ok((self.elapsed_since_fn)(pulse_start).as_micros() as u32)
    }
}

/// Driver for the JSN-SR04T ultrasonic ranging module.
///
/// The module is pinged [`SAMPLES_PER_READ`] times per reading, and the noisy
/// raw samples are reduced to one distance by [`LevelResponse::distance_cm`].
#[derive(Debug)]
pub struct JsnSr04t<TTrigger, TEcho> {
    trigger: TTrigger,
    echo: TEcho,
    options: Options,
}

impl<TTrigger, TEcho, TError> JsnSr04t<TTrigger, TEcho>
where
    TTrigger: OutputPin<Error = TError>,
    TEcho: EchoTimer<Error = TError>,
{
    /// Constructs a driver that pings over `trigger` and times echoes with
    /// `echo`.
    ///
    /// The trigger line is driven low here and idles low between readings.
    /// The echo line should be configured with its idle level high (i.e. with
    /// a pull-up), matching the module's open-collector output. If `options`
    /// is `None`, then [`DEFAULT_OPTIONS`] is used.
    pub fn new(
        trigger: TTrigger,
        echo: TEcho,
        options: Option<Options>,
    ) -> Result<JsnSr04t<TTrigger, TEcho>, Error<TError>> {
        let options = match options {
            None => DEFAULT_OPTIONS,
            Some(options) => {
                if options.num_nearest < 1
                    || options.num_nearest > SAMPLES_PER_READ
                    || options.echo_timeout.as_micros() == 0
                {
                    return Err(Error::InvalidArgument);
                }
                options
            }
        };
        let mut trigger = trigger;
        trigger.set_low()?;
        Ok(JsnSr04t {
            trigger: trigger,
            echo: echo,
            options: options,
        })
    }

    /// Performs one full reading: [`SAMPLES_PER_READ`] pings, each followed by
    /// the settle interval.
    ///
    /// This blocks the calling thread for the whole acquisition, roughly 1.5s
    /// with the default options. An echo that times out is recorded as a zero
    /// duration and takes part in the filtering like any other sample; with
    /// the module out of range this can drag the average towards zero rather
    /// than reporting "no object". That matches the deployed loggers, so it
    /// is kept as-is.
    pub fn read<TDelay>(&mut self, delay: &mut TDelay) -> Result<LevelResponse, Error<TError>>
    where
        TDelay: DelayNs,
    {
        let mut samples = [0u32; SAMPLES_PER_READ];
        for sample in samples.iter_mut() {
            self.trigger.set_low()?;
            delay.delay_us(TRIGGER_SETTLE_US);
            self.trigger.set_high()?;
            delay.delay_us(TRIGGER_PULSE_US);
            self.trigger.set_low()?;
            *sample = self.echo.measure(self.options.echo_timeout)?;
            delay.delay_us(self.options.settle_interval.as_micros() as u32);
        }
        Ok(LevelResponse::from_raw_samples(
            samples,
            self.options.num_nearest,
        ))
    }
}

/// One reading from the module: the raw samples, plus the filtered distance
/// derived from them.
#[derive(Clone, Debug, PartialEq)]
pub struct LevelResponse {
    samples: [u32; SAMPLES_PER_READ],
    num_nearest: usize,
}

impl LevelResponse {
    /// Constructs a response from raw echo durations, in microseconds.
    ///
    /// This is how [`JsnSr04t::read`] builds its result, but it is also
    /// useful on its own for replaying recorded sample sets.
    /// `num_nearest` is clamped to the range `[1, SAMPLES_PER_READ]`.
    pub fn from_raw_samples(
        samples: [u32; SAMPLES_PER_READ],
        num_nearest: usize,
    ) -> LevelResponse {
        LevelResponse {
            samples: samples,
            num_nearest: num_nearest.max(1).min(SAMPLES_PER_READ),
        }
    }

    /// The filtered distance, in centimeters.
    ///
    /// Single echoes off a rippling water surface scatter, so short spurious
    /// reflections are far more common than long ones. The filter therefore
    /// keeps the `num_nearest` samples whose durations sit closest to the
    /// maximum of the set (the least-attenuated reflections) and averages
    /// those, discarding the near/multi-path echoes. Ranking is by distance
    /// below the maximum, not by raw magnitude.
    pub fn distance_cm(&self) -> f32 {
        let order = rank_by_diff_to_max(&self.samples);
        let mut sum: u32 = 0;
        for index in order[..self.num_nearest].iter() {
            sum += self.samples[*index];
        }
        sum as f32 / (US_PER_CM * self.num_nearest as f32)
    }

    /// The raw echo durations behind this reading, in collection order.
    ///
    /// Timed-out samples appear as zeros.
    pub fn raw_samples(&self) -> &[u32; SAMPLES_PER_READ] {
        &self.samples
    }

    /// The unfiltered centimeter candidate for a single raw sample.
    ///
    /// Handy for debug output when tuning a new installation.
    pub fn sample_cm(&self, index: usize) -> f32 {
        self.samples[index] as f32 / US_PER_CM
    }
}

impl Column for LevelResponse {
    const NAME: &'static str = "Distance";

    fn value(&self) -> f32 {
        self.distance_cm()
    }
}

/// Returns the indices of `samples` ordered by ascending difference from the
/// set's maximum. Samples with equal differences keep their collection order.
fn rank_by_diff_to_max(samples: &[u32; SAMPLES_PER_READ]) -> [usize; SAMPLES_PER_READ] {
    let mut max = samples[0];
    for sample in samples[1..].iter() {
        if *sample > max {
            max = *sample;
        }
    }

    let mut ranked = [(0u32, 0usize); SAMPLES_PER_READ];
    for (index, sample) in samples.iter().enumerate() {
        ranked[index] = (max - *sample, index);
    }
    // The index in the key makes this equivalent to a stable sort on the
    // difference alone.
    ranked.sort_unstable();

    let mut order = [0usize; SAMPLES_PER_READ];
    for (rank, entry) in ranked.iter().enumerate() {
        order[rank] = entry.1;
    }
    order
}
