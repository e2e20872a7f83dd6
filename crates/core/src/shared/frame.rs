use ndarray::{s, ArrayView3};

use crate::shared::bounding_box::BoundingBox;

/// A single decoded camera frame: contiguous RGB bytes in row-major order.
///
/// `index` is the frame's position in its batch. Frames live only as long
/// as the batch that produced them.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
    channels: u8,
    index: usize,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, channels: u8, index: usize) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * (channels as usize),
            "data length must equal width * height * channels"
        );
        Self {
            data,
            width,
            height,
            channels,
            index,
        }
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

    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(self.shape(), &self.data)
            .expect("Frame data length must match dimensions")
    }

    /// Cuts the pixels under `bbox` into a new frame with the same index.
    ///
    /// The box is clamped to the frame first; a box entirely outside the
    /// frame yields an empty (0x0) crop.
    pub fn crop(&self, bbox: &BoundingBox) -> Frame {
        let Some((x1, y1, x2, y2)) = bbox.clamp_to(self.width, self.height) else {
            return Frame::new(Vec::new(), 0, 0, self.channels, self.index);
        };

        let view = self.as_ndarray();
        let region = view.slice(s![y1 as usize..y2 as usize, x1 as usize..x2 as usize, ..]);
        let data: Vec<u8> = region.iter().copied().collect();

        Frame::new(data, x2 - x1, y2 - y1, self.channels, self.index)
    }

    fn shape(&self) -> (usize, usize, usize) {
        (
            self.height as usize,
            self.width as usize,
            self.channels as usize,
        )
    }
}
