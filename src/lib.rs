#![no_std]

/// Driver for reading temperatures from a DS18B20 one-wire probe.
pub mod ds18b20;
/// Driver for the JSN-SR04T ultrasonic ranging module, including the noise
/// filtering that turns its jittery echoes into a stable level reading.
///
/// Refer to [this datasheet](https://www.makerguides.com/wp-content/uploads/2019/02/JSN-SR04T-Datasheet.pdf)
/// for more information about the module.
pub mod jsn_sr04t;
/// The column contract shared by the sensor drivers, so a logger can swap one
/// sensor for the other without changes elsewhere.
pub mod record;
