use super::{
    command_frame, decode, Calibration, Channel, Denoiser, FilteredReading, PixelPoint, RawSample,
    SamplingConfig, Xpt2046Error, FRAME_LEN,
};
use embedded_hal_async::delay::DelayNs;
use embedded_hal_async::digital::Wait;
use embedded_hal_async::spi::SpiDevice;
use log::trace;

#[derive(Debug)]
pub struct Xpt2046Async<SPI, DELAY> {
    spi: SPI,
    delay: DELAY,
    calibration: Calibration,
    denoiser: Denoiser,
}

impl<SPI, DELAY> Xpt2046Async<SPI, DELAY>
where
    SPI: SpiDevice,
    DELAY: DelayNs,
{
    /// Create a new XPT2046 instance
    pub fn new(spi: SPI, delay: DELAY, calibration: Calibration) -> Self {
        Self {
            spi,
            delay,
            calibration,
            denoiser: Denoiser::default(),
        }
    }

    pub fn set_sampling_config(&mut self, config: SamplingConfig) {
        self.denoiser = Denoiser::new(config);
    }

    pub fn sampling_config(&self) -> SamplingConfig {
        self.denoiser.config()
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    pub fn release(self) -> (SPI, DELAY) {
        (self.spi, self.delay)
    }

    pub async fn read_channel(
        &mut self,
        channel: Channel,
    ) -> Result<u16, Xpt2046Error<SPI::Error>> {
        read_channel(&mut self.spi, channel).await
    }

    pub async fn raw_touch(&mut self) -> Result<Option<RawSample>, Xpt2046Error<SPI::Error>> {
        raw_touch(&mut self.spi, &self.calibration).await
    }

    pub fn normalize(&self, reading: FilteredReading) -> PixelPoint {
        self.calibration.normalize(reading)
    }

    pub async fn get_touch(&mut self) -> Result<Option<PixelPoint>, Xpt2046Error<SPI::Error>> {
        let spi = &mut self.spi;
        let calibration = &self.calibration;
        let reading = self
            .denoiser
            .acquire_async(&mut self.delay, async || {
                raw_touch(&mut *spi, calibration).await
            })
            .await?;
        Ok(reading.map(|r| calibration.to_display(r)))
    }

    /// Wait for the pen to go down on PENIRQ (active low), then acquire.
    pub async fn wait_for_touch<IRQ: Wait>(
        &mut self,
        irq: &mut IRQ,
    ) -> Result<Option<PixelPoint>, Xpt2046Error<SPI::Error>> {
        irq.wait_for_low().await.map_err(|_| Xpt2046Error::Pin)?;
        self.get_touch().await
    }
}

async fn read_channel<SPI: SpiDevice>(
    spi: &mut SPI,
    channel: Channel,
) -> Result<u16, Xpt2046Error<SPI::Error>> {
    let tx = command_frame(channel);
    let mut rx = [0u8; FRAME_LEN];
    spi.transfer(&mut rx, &tx).await.map_err(Xpt2046Error::Spi)?;
    let value = decode(&rx);
    trace!("{:?} -> {}", channel, value);
    Ok(value)
}

async fn raw_touch<SPI: SpiDevice>(
    spi: &mut SPI,
    calibration: &Calibration,
) -> Result<Option<RawSample>, Xpt2046Error<SPI::Error>> {
    let raw_x = read_channel(spi, Channel::X).await?;
    let raw_y = read_channel(spi, Channel::Y).await?;
    let sample = RawSample { raw_x, raw_y };
    Ok(calibration.accepts(sample).then_some(sample))
}
