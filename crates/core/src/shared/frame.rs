pub type RgbView<'a> = image::ImageBuffer<image::Rgb<u8>, &'a [u8]>;

/// A single decoded interview frame: contiguous RGB bytes in row-major order.
///
/// Color order is RGB everywhere in this crate; the decoder converts on the
/// way in and the landmark models consume RGB directly.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

/// Channels per pixel (RGB).
pub const CHANNELS: usize = 3;

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
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

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Borrowed `image` view for crop/resize work without copying pixels.
    pub fn as_image(&self) -> RgbView<'_> {
        image::ImageBuffer::from_raw(self.width, self.height, self.data.as_slice())
            .expect("Frame data length must match dimensions")
    }
}

impl From<image::RgbImage> for Frame {
    fn from(img: image::RgbImage) -> Self {
        let (width, height) = img.dimensions();
        Self::new(img.into_raw(), width, height)
    }
}
