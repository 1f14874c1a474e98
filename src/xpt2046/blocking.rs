use super::{
    command_frame, decode, Calibration, Channel, Denoiser, EdgeOutcome, FilteredReading,
    InterruptLatch, PenIrq, PixelPoint, RawSample, SamplingConfig, Xpt2046Error, FRAME_LEN,
};
use embedded_hal::delay::DelayNs;
use embedded_hal::spi::SpiDevice;
use log::{debug, trace};

#[derive(Debug)]
pub struct Xpt2046<SPI, DELAY> {
    spi: SPI,
    delay: DELAY,
    calibration: Calibration,
    denoiser: Denoiser,
    pen_irq: PenIrq,
    latch: InterruptLatch,
}

impl<SPI, DELAY> Xpt2046<SPI, DELAY>
where
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Create a new XPT2046 instance
    ///
    /// `spi` must assert chip select around each transaction; wrap a bare bus and CS pin in
    /// `embedded_hal_bus::spi::ExclusiveDevice` if needed.
    pub fn new(spi: SPI, delay: DELAY, calibration: Calibration) -> Self {
        Self {
            spi,
            delay,
            calibration,
            denoiser: Denoiser::default(),
            pen_irq: PenIrq::Disabled,
            latch: InterruptLatch::new(),
        }
    }

    /// Enable or disable interrupt-latched acquisition
    pub fn with_pen_irq(mut self, pen_irq: PenIrq) -> Self {
        self.pen_irq = pen_irq;
        self
    }

    /// Configure timeout, sample spacing and variance threshold
    pub fn set_sampling_config(&mut self, config: SamplingConfig) {
        self.denoiser = Denoiser::new(config);
    }

    pub fn sampling_config(&self) -> SamplingConfig {
        self.denoiser.config()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn interrupt_latch(&self) -> &InterruptLatch {
        &self.latch
    }

    /// Give back the bus and the delay
    pub fn release(self) -> (SPI, DELAY) {
        (self.spi, self.delay)
    }

    /// Run one conversion on `channel` and return the 12-bit result.
    pub fn read_channel(&mut self, channel: Channel) -> Result<u16, Xpt2046Error<SPI::Error>> {
        read_channel(&mut self.spi, channel)
    }

    /// Read X then Y. `None` when either lies outside the calibrated range, which is what an
    /// untouched panel reports.
    pub fn raw_touch(&mut self) -> Result<Option<RawSample>, Xpt2046Error<SPI::Error>> {
        raw_touch(&mut self.spi, &self.calibration)
    }

    pub fn normalize(&self, reading: FilteredReading) -> PixelPoint {
        self.calibration.normalize(reading)
    }

    /// Denoised, calibrated and rotated touch position.
    ///
    /// Blocks for up to the sampling timeout. `Ok(None)` means no stable touch, which is also
    /// the answer while an interrupt-driven acquisition holds the latch.
    pub fn get_touch(&mut self) -> Result<Option<PixelPoint>, Xpt2046Error<SPI::Error>> {
        Ok(self.locked_touch()?.flatten())
    }

    /// Entry point for the PENIRQ edge interrupt.
    ///
    /// An edge arriving while an earlier one still holds the latch is dropped without touching
    /// the bus. Keep the handler short: it runs in interrupt context.
    pub fn on_pen_edge(&mut self) -> Result<EdgeOutcome, Xpt2046Error<SPI::Error>> {
        let handler = match self.pen_irq {
            PenIrq::Disabled => return Ok(EdgeOutcome::Ignored),
            PenIrq::Latched { handler } => handler,
        };

        let Some(touch) = self.locked_touch()? else {
            return Ok(EdgeOutcome::Busy);
        };

        match handler {
            Some(handler) => {
                handler(touch);
                Ok(EdgeOutcome::Delivered)
            }
            None => Ok(EdgeOutcome::Ready(touch)),
        }
    }

    // Outer `None`: the latch was already held and the bus was left alone
    fn locked_touch(&mut self) -> Result<Option<Option<PixelPoint>>, Xpt2046Error<SPI::Error>> {
        if !self.latch.try_lock() {
            debug!("acquisition in flight, skipping");
            return Ok(None);
        }
        let result = self.acquire();
        self.latch.release();
        result.map(Some)
    }

    fn acquire(&mut self) -> Result<Option<PixelPoint>, Xpt2046Error<SPI::Error>> {
        let spi = &mut self.spi;
        let calibration = &self.calibration;
        let reading = self
            .denoiser
            .acquire(&mut self.delay, || raw_touch(spi, calibration))?;
        Ok(reading.map(|r| calibration.to_display(r)))
    }
}

fn read_channel<SPI: SpiDevice>(
    spi: &mut SPI,
    channel: Channel,
) -> Result<u16, Xpt2046Error<SPI::Error>> {
    let tx = command_frame(channel);
    let mut rx = [0u8; FRAME_LEN];
    spi.transfer(&mut rx, &tx).map_err(Xpt2046Error::Spi)?;
    let value = decode(&rx);
    trace!("{:?} -> {}", channel, value);
    Ok(value)
}

fn raw_touch<SPI: SpiDevice>(
    spi: &mut SPI,
    calibration: &Calibration,
) -> Result<Option<RawSample>, Xpt2046Error<SPI::Error>> {
    let raw_x = read_channel(spi, Channel::X)?;
    let raw_y = read_channel(spi, Channel::Y)?;
    let sample = RawSample { raw_x, raw_y };
    Ok(calibration.accepts(sample).then_some(sample))
}
