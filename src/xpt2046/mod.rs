use core::fmt::{self, Display, Formatter};

// https://www.snapeda.com/parts/XPT2046/Xptek/datasheet/
use bitflags::bitflags;
use num_enum::{IntoPrimitive, TryFromPrimitive};

pub mod calibration;
pub mod denoise;
pub mod latch;

#[cfg(feature = "async")]
pub mod asynch;
pub mod blocking;

#[cfg(test)]
pub(crate) mod testing;

pub use calibration::{
    rotate, Calibration, ConfigError, DisplayGeometry, DisplayInfo, Rotation, TouchConfig,
};
pub use denoise::{ConfidenceWindow, Denoiser, SamplingConfig, CONFIDENCE};
pub use latch::InterruptLatch;

/// Bytes clocked per conversion: control byte out, then two bytes carrying the 12-bit result.
pub const FRAME_LEN: usize = 3;

/// Largest value the 12-bit converter reports.
pub const RAW_MAX: u16 = 0x0FFF;

/// Converter input selected by the A2..A0 bits of the control byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    /// X position
    X = 0b101,
    /// Y position
    Y = 0b001,
    /// Pressure plate Z1
    Z1 = 0b011,
    /// Pressure plate Z2
    Z2 = 0b100,
    /// Temperature, first diode current
    Temp0 = 0b000,
    /// Temperature, second diode current
    Temp1 = 0b111,
    /// Battery monitor (VBAT)
    Battery = 0b010,
    /// Auxiliary input
    Aux = 0b110,
}

bitflags! {
    /// XPT2046 control byte, datasheet Table 6.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ControlByte: u8 {
        /// Bit 7: S (start bit, always set)
        const START        = 1 << 7;
        /// Bits 6..4: A2..A0 (channel select)
        const A2           = 1 << 6;
        const A1           = 1 << 5;
        const A0           = 1 << 4;
        /// Bit 3: MODE (8-bit conversion when set, 12-bit when clear)
        const MODE_8BIT    = 1 << 3;
        /// Bit 2: SER/DFR (single-ended reference when set, differential when clear)
        const SINGLE_ENDED = 1 << 2;
        /// Bits 1..0: PD1, PD0 (both clear: power down between conversions, PENIRQ enabled)
        const PD1          = 1 << 1;
        const PD0          = 1 << 0;
    }
}

#[cfg(feature = "defmt")]
impl defmt::Format for ControlByte {
    fn format(&self, f: defmt::Formatter) {
        self.iter_names().for_each(|name| {
            defmt::write!(f, "{}", name);
        });
    }
}

impl Channel {
    /// Control byte for a 12-bit differential conversion of this channel.
    pub fn control_byte(self) -> ControlByte {
        ControlByte::START | ControlByte::from_bits_truncate(u8::from(self) << 4)
    }
}

/// Control byte sent to start a conversion of `channel`.
pub fn encode(channel: Channel) -> u8 {
    channel.control_byte().bits()
}

/// Extracts the 12-bit conversion result from a response frame.
///
/// The first byte is clocked in while the control byte is still going out and carries
/// nothing. The result is MSB-first across the remaining two bytes, left-aligned.
pub fn decode(frame: &[u8; FRAME_LEN]) -> u16 {
    (u16::from(frame[1]) << 4) | (u16::from(frame[2]) >> 4)
}

pub(crate) fn command_frame(channel: Channel) -> [u8; FRAME_LEN] {
    [encode(channel), 0x00, 0x00]
}

/// One X/Y conversion pair, straight from the converter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RawSample {
    pub raw_x: u16,
    pub raw_y: u16,
}

/// Mean of an accepted confidence window, still in converter units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FilteredReading {
    pub mean_x: u16,
    pub mean_y: u16,
}

/// Touch position in display pixels.
///
/// Not clamped: readings near the calibration edges can land slightly outside the panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

impl PixelPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl Display for PixelPoint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// How the PENIRQ line is used, fixed when the driver is built.
#[derive(Debug, Clone, Copy, Default)]
pub enum PenIrq {
    /// No interrupt wiring; only polling with `get_touch`.
    #[default]
    Disabled,
    /// Edges run a latched acquisition. With a handler the result goes to the handler,
    /// otherwise it is handed back from `on_pen_edge`.
    Latched {
        handler: Option<fn(Option<PixelPoint>)>,
    },
}

#[cfg(feature = "defmt")]
impl defmt::Format for PenIrq {
    fn format(&self, f: defmt::Formatter) {
        match self {
            PenIrq::Disabled => defmt::write!(f, "Disabled"),
            PenIrq::Latched { handler } => {
                defmt::write!(f, "Latched(handler: {})", handler.is_some())
            }
        }
    }
}

/// What a PENIRQ edge turned into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeOutcome {
    /// Interrupt mode is not configured.
    Ignored,
    /// An earlier edge still holds the latch; this one was dropped.
    Busy,
    /// The acquisition ran and its result went to the configured handler.
    Delivered,
    /// The acquisition ran and no handler is configured.
    Ready(Option<PixelPoint>),
}

/// Errors that can occur when talking to the XPT2046
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Xpt2046Error<E> {
    /// The SPI exchange failed; the bus error is passed through untouched.
    Spi(E),
    /// The PENIRQ input could not be read or awaited.
    Pin,
}

impl<E: fmt::Debug> Display for Xpt2046Error<E> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Xpt2046Error::Spi(e) => write!(f, "SPI transfer failed: {e:?}"),
            Xpt2046Error::Pin => write!(f, "PENIRQ pin error"),
        }
    }
}
