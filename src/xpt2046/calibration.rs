//! Raw-to-pixel mapping and panel orientation.
//!
//! The mapping is a plain linear fit between two calibration points per axis. Configuring
//! `x_min > x_max` (or `y_min > y_max`) is how a mirrored sensor is described: the scale
//! factor goes negative and the axis flips without any special casing.

use core::fmt::{self, Display, Formatter};
use core::ops::RangeInclusive;

use num_enum::{IntoPrimitive, TryFromPrimitive};

use super::{FilteredReading, PixelPoint, RawSample};

/// Physical mounting of the panel relative to its native portrait orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoPrimitive, TryFromPrimitive)]
#[repr(u8)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rotation {
    /// Portrait
    Deg0 = 0,
    /// Landscape
    Deg90 = 1,
    /// Inverted portrait
    Deg180 = 2,
    /// Inverted landscape
    Deg270 = 3,
}

/// Board-level touch settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TouchConfig {
    /// Physical (unrotated) panel width in pixels
    pub width: u16,
    /// Physical (unrotated) panel height in pixels
    pub height: u16,
    /// Raw X reading at pixel column 0
    pub x_min: u16,
    /// Raw X reading at pixel column `width`
    pub x_max: u16,
    /// Raw Y reading at pixel row 0
    pub y_min: u16,
    /// Raw Y reading at pixel row `height`
    pub y_max: u16,
    /// Mounting, 0..=3 quarter turns
    pub rotation: u8,
}

impl Default for TouchConfig {
    fn default() -> Self {
        // 240x320 portrait panel with the usual XPT2046 dead zone at both ends
        Self {
            width: 240,
            height: 320,
            x_min: 100,
            x_max: 1962,
            y_min: 100,
            y_max: 1900,
            rotation: 0,
        }
    }
}

/// What a display driver reports about itself when the touch driver is built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DisplayInfo {
    /// Unrotated panel size, or `None` when the display does not know it.
    pub physical_size: Option<(u16, u16)>,
    /// Current mounting, 0..=3 quarter turns.
    pub rotation: u8,
}

/// Implemented by display drivers that can describe their geometry to the touch layer.
pub trait DisplayGeometry {
    fn display_info(&self) -> DisplayInfo;
}

/// Errors returned while building a [`Calibration`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// `x_min == x_max`
    ZeroSpanX,
    /// `y_min == y_max`
    ZeroSpanY,
    /// Width of zero pixels
    InvalidWidth,
    /// Height of zero pixels
    InvalidHeight,
    /// Rotation outside 0..=3
    InvalidRotation(u8),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroSpanX => write!(f, "x_min and x_max must differ"),
            ConfigError::ZeroSpanY => write!(f, "y_min and y_max must differ"),
            ConfigError::InvalidWidth => write!(f, "width must be positive"),
            ConfigError::InvalidHeight => write!(f, "height must be positive"),
            ConfigError::InvalidRotation(r) => write!(f, "rotation {r} is not in 0..=3"),
        }
    }
}

/// Validated, frozen mapping from converter units to display pixels.
///
/// A new orientation needs a new `Calibration`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    x_min: u16,
    x_max: u16,
    y_min: u16,
    y_max: u16,
    width: u16,
    height: u16,
    rotation: Rotation,
}

impl Calibration {
    /// Resolves the display collaborator (if any) and validates the result.
    ///
    /// With a display, its rotation always wins; its physical size wins when it reports one,
    /// otherwise `config.width`/`config.height` are used.
    pub fn new(config: &TouchConfig, display: Option<DisplayInfo>) -> Result<Self, ConfigError> {
        let ((width, height), rotation) = match display {
            Some(info) => (
                info.physical_size.unwrap_or((config.width, config.height)),
                info.rotation,
            ),
            None => ((config.width, config.height), config.rotation),
        };

        if width == 0 {
            return Err(ConfigError::InvalidWidth);
        }
        if height == 0 {
            return Err(ConfigError::InvalidHeight);
        }
        if config.x_min == config.x_max {
            return Err(ConfigError::ZeroSpanX);
        }
        if config.y_min == config.y_max {
            return Err(ConfigError::ZeroSpanY);
        }
        let rotation =
            Rotation::try_from(rotation).map_err(|e| ConfigError::InvalidRotation(e.number))?;

        Ok(Self {
            x_min: config.x_min,
            x_max: config.x_max,
            y_min: config.y_min,
            y_max: config.y_max,
            width,
            height,
            rotation,
        })
    }

    /// Shortcut for [`Calibration::new`] with a display driver that describes itself.
    pub fn from_display<D: DisplayGeometry>(
        config: &TouchConfig,
        display: &D,
    ) -> Result<Self, ConfigError> {
        Self::new(config, Some(display.display_info()))
    }

    pub fn width(&self) -> u16 {
        self.width
    }

    pub fn height(&self) -> u16 {
        self.height
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Raw X readings that count as a touch, regardless of axis direction.
    pub fn x_range(&self) -> RangeInclusive<u16> {
        self.x_min.min(self.x_max)..=self.x_min.max(self.x_max)
    }

    /// Raw Y readings that count as a touch, regardless of axis direction.
    pub fn y_range(&self) -> RangeInclusive<u16> {
        self.y_min.min(self.y_max)..=self.y_min.max(self.y_max)
    }

    /// Whether a raw pair lies inside the calibrated area. Anything outside is the idle
    /// signal of the chip, not a fault.
    pub fn accepts(&self, sample: RawSample) -> bool {
        self.x_range().contains(&sample.raw_x) && self.y_range().contains(&sample.raw_y)
    }

    /// Linear map into unrotated pixel space, truncating toward zero.
    pub fn normalize(&self, reading: FilteredReading) -> PixelPoint {
        PixelPoint {
            x: scale(reading.mean_x, self.x_min, self.x_max, self.width),
            y: scale(reading.mean_y, self.y_min, self.y_max, self.height),
        }
    }

    /// [`normalize`](Self::normalize) followed by the configured [`rotate`].
    pub fn to_display(&self, reading: FilteredReading) -> PixelPoint {
        rotate(
            self.normalize(reading),
            self.width,
            self.height,
            self.rotation,
        )
    }
}

// extent / (max - min) * (raw - min), kept in integers so exact boundaries stay exact.
// Saturates at the i32 limits for readings far outside a narrow span.
fn scale(raw: u16, min: u16, max: u16, extent: u16) -> i32 {
    let span = i64::from(max) - i64::from(min);
    let offset = i64::from(raw) - i64::from(min);
    let value = i64::from(extent) * offset / span;
    i32::try_from(value).unwrap_or(if value < 0 { i32::MIN } else { i32::MAX })
}

/// Remaps an unrotated pixel position for the given mounting.
///
/// `width` and `height` are the physical dimensions and do not swap with `rotation`.
pub fn rotate(point: PixelPoint, width: u16, height: u16, rotation: Rotation) -> PixelPoint {
    let (w, h) = (i32::from(width), i32::from(height));
    let PixelPoint { x, y } = point;
    match rotation {
        Rotation::Deg0 => PixelPoint::new(x, y),
        Rotation::Deg90 => PixelPoint::new(y, w - 1 - x),
        Rotation::Deg180 => PixelPoint::new(w - 1 - x, h - 1 - y),
        Rotation::Deg270 => PixelPoint::new(h - 1 - y, x),
    }
}
