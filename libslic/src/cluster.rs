use image::Rgb;
use rand::Rng;

/// One superpixel: accumulated pixel sums, their mean, and a display color
///
/// Sums are collected with [`Cluster::add_pixel`] and turned into a mean by
/// [`Cluster::normalize`]. The mean is only meaningful once normalized; a
/// cluster that received no pixels keeps whatever mean it held before.
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    sum_x: f64,
    sum_y: f64,
    sum_rgb: [f64; 3],
    num_pixels: usize,

    /// Mean position
    pub x: f32,
    pub y: f32,

    /// Mean color
    pub rgb: [f32; 3],

    /// Color painted on this cluster's boundary pixels
    pub edge_color: Rgb<u8>,
}

impl Default for Cluster {
    fn default() -> Self {
        Self::at(0.0, 0.0, [0.0; 3])
    }
}

impl Cluster {
    /// Create an empty cluster whose mean is already set
    pub const fn at(x: f32, y: f32, rgb: [f32; 3]) -> Self {
        Self {
            sum_x: 0.0,
            sum_y: 0.0,
            sum_rgb: [0.0; 3],
            num_pixels: 0,
            x,
            y,
            rgb,
            edge_color: Rgb([0, 0, 0]),
        }
    }

    /// Clear the accumulated sums and pixel count, keeping the current mean
    pub fn reset(&mut self) {
        self.sum_x = 0.0;
        self.sum_y = 0.0;
        self.sum_rgb = [0.0; 3];
        self.num_pixels = 0;
    }

    /// Become an empty accumulator that carries `previous`'s mean
    pub fn reset_from(&mut self, previous: &Self) {
        self.reset();
        self.x = previous.x;
        self.y = previous.y;
        self.rgb = previous.rgb;
        self.edge_color = previous.edge_color;
    }

    /// Accumulate one pixel
    pub fn add_pixel(&mut self, x: u32, y: u32, color: Rgb<u8>) {
        let Rgb([r, g, b]) = color;
        self.sum_x += f64::from(x);
        self.sum_y += f64::from(y);
        self.sum_rgb[0] += f64::from(r);
        self.sum_rgb[1] += f64::from(g);
        self.sum_rgb[2] += f64::from(b);
        self.num_pixels += 1;
    }

    /// Compute the mean from the accumulated sums and roll a new display color
    ///
    /// Returns `false` when the cluster is empty; its mean is left untouched.
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn normalize<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        self.edge_color = Rgb(rng.gen());

        if self.num_pixels == 0 {
            return false;
        }

        let n = self.num_pixels as f64;
        self.x = (self.sum_x / n) as f32;
        self.y = (self.sum_y / n) as f32;
        for (mean, sum) in self.rgb.iter_mut().zip(self.sum_rgb) {
            *mean = (sum / n) as f32;
        }
        true
    }

    /// Number of pixels accumulated since the last reset
    pub const fn num_pixels(&self) -> usize {
        self.num_pixels
    }

    pub const fn is_empty(&self) -> bool {
        self.num_pixels == 0
    }

    /// Mean color quantized to 8 bits, truncating toward zero
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn mean_color(&self) -> Rgb<u8> {
        Rgb(self.rgb.map(|channel| channel.clamp(0.0, 255.0) as u8))
    }
}
