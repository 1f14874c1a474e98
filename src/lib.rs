#![no_std]
//! XPT2046 Resistive Touch Controller Library
//!
//! Turns the controller's noisy 12-bit conversions into stable, display-aligned pixel
//! coordinates: SPI command framing, confidence-window denoising, linear calibration with
//! optional axis inversion and remapping into one of four display orientations. An optional
//! PENIRQ mode runs acquisitions from an interrupt edge behind a reentrancy latch.
//!
//! The driver is written against the `embedded-hal` 1.0 traits. Enable the `async` feature for
//! the `embedded-hal-async` variant and `defmt` for `defmt::Format` on the data types.

/// XPT2046 touch controller driver.
pub mod xpt2046;

pub use xpt2046::blocking::Xpt2046;
pub use xpt2046::{
    Calibration, ConfigError, EdgeOutcome, PenIrq, PixelPoint, Rotation, SamplingConfig,
    TouchConfig, Xpt2046Error,
};

#[cfg(feature = "async")]
pub use xpt2046::asynch::Xpt2046Async;

#[cfg(test)]
extern crate alloc;

#[cfg(test)]
mod tests {
    use crate::xpt2046::{rotate, Channel, ControlByte};
    use crate::{ConfigError, PixelPoint, Rotation};
    use alloc::format;

    #[test]
    fn test_config_error_display() {
        assert_eq!(format!("{}", ConfigError::ZeroSpanX), "x_min and x_max must differ");
        assert_eq!(
            format!("{}", ConfigError::InvalidRotation(7)),
            "rotation 7 is not in 0..=3"
        );
    }

    #[test]
    fn test_pixel_point_display() {
        assert_eq!(format!("{}", PixelPoint::new(12, -3)), "(12, -3)");
    }

    #[test]
    fn test_channel_from() {
        assert_eq!(Channel::try_from(0b101), Ok(Channel::X));
        assert_eq!(Channel::try_from(0b001), Ok(Channel::Y));
        assert_eq!(u8::from(Channel::Aux), 0b110);
    }

    #[test]
    fn test_control_byte_from_bits() {
        let byte = ControlByte::from_bits_truncate(0xD0);
        assert_eq!(byte, Channel::X.control_byte());
        assert!(byte.contains(ControlByte::A2 | ControlByte::A0));
    }

    #[test]
    fn test_rotation_from() {
        assert_eq!(Rotation::try_from(3u8), Ok(Rotation::Deg270));
        assert!(Rotation::try_from(4u8).is_err());
        let p = rotate(PixelPoint::new(0, 0), 240, 320, Rotation::Deg180);
        assert_eq!(p, PixelPoint::new(239, 319));
    }
}
