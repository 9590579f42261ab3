/// A detected face: relative bounding box plus detector confidence.
///
/// Box coordinates are fractions of the image dimensions.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    pub xmin: f64,
    pub ymin: f64,
    pub width: f64,
    pub height: f64,
    pub confidence: f64,
}

/// Pixel-space box derived from a [`Detection`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PixelBox {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Detection {
    /// Scales the relative box to pixels, truncating toward zero.
    pub fn to_pixels(&self, image_width: u32, image_height: u32) -> PixelBox {
        let w = image_width as f64;
        let h = image_height as f64;
        PixelBox {
            x: (self.xmin * w) as i32,
            y: (self.ymin * h) as i32,
            width: (self.width * w) as i32,
            height: (self.height * h) as i32,
        }
    }
}
