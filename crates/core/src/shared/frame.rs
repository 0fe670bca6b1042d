use std::time::Duration;

use ndarray::ArrayView3;

/// Bytes per pixel of the RGB24 layout every frame uses.
pub const CHANNELS: usize = 3;

/// One decoded video frame: contiguous RGB24 bytes in row-major order.
///
/// `index` increases monotonically per source; `timestamp` is measured from
/// the moment the source started streaming.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    index: usize,
    timestamp: Duration,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
            index,
            timestamp: Duration::ZERO,
        }
    }

    pub fn with_timestamp(mut self, timestamp: Duration) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn timestamp(&self) -> Duration {
        self.timestamp
    }

    /// `[height, width, channel]` view used by tensor preprocessing.
    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Luma plane (BT.601 weights), one byte per pixel.
    pub fn to_luma(&self) -> Vec<u8> {
        self.data
            .chunks_exact(CHANNELS)
            .map(|px| {
                let y = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
                y.round().clamp(0.0, 255.0) as u8
            })
            .collect()
    }
}
