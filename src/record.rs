use core::fmt;

/// A single value column in a CSV-style log record.
///
/// Both sensor drivers produce readings that implement this, so the logger
/// can be pointed at either one: construct the driver, `read` it once per
/// cycle, and append the reading with [`Column::write_field`]. The full
/// record layout is `Date,Time,<sensor columns>,Bat`, with the date, time and
/// battery columns owned by the logger.
pub trait Column {
    /// Header text identifying this column, e.g. `"Distance"`.
    const NAME: &'static str;

    /// The value to log for one sampling cycle.
    fn value(&self) -> f32;

    /// Appends `,<value>` to `out`, with two decimal places.
    fn write_field<TOut>(&self, out: &mut TOut) -> fmt::Result
    where
        TOut: fmt::Write,
    {
        write!(out, ",{:.2}", self.value())
    }
}
