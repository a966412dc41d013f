//! Output rendering: mean-color fill and superpixel boundary overlay

use image::RgbImage;

#[cfg(feature = "performance")]
use rayon::prelude::*;

use crate::cluster::Cluster;
use crate::labels::LabelGrid;

const CHANNELS: usize = 3;

/// Fill every pixel with its cluster's mean color
pub fn render_oversegmented(clusters: &[Cluster], labels: &LabelGrid) -> RgbImage {
    let (width, height) = labels.dimensions();
    let mut output = RgbImage::new(width, height);

    for_each_row(&mut output, |y, row| {
        for (pixel, &label) in row.chunks_exact_mut(CHANNELS).zip(labels.row(y)) {
            pixel.copy_from_slice(&clusters[label].mean_color().0);
        }
    });

    output
}

/// Copy `source` and paint boundary pixels with their cluster's display color
///
/// An interior pixel is a boundary pixel when any of its 8 neighbors carries
/// a different label. Pixels of clusters smaller than `0.5·s²` are never
/// painted, and the one-pixel image border is always copied unchanged.
#[allow(clippy::cast_precision_loss)]
pub fn detect_boundaries(
    source: &RgbImage,
    clusters: &[Cluster],
    labels: &LabelGrid,
    spacing: f32,
) -> RgbImage {
    let (width, height) = labels.dimensions();
    let min_pixels = spacing * spacing * 0.5;
    let mut edges = source.clone();

    if width < 3 || height < 3 {
        return edges;
    }

    for_each_row(&mut edges, |y, row| {
        if y == 0 || y + 1 >= height {
            return;
        }

        for x in 1..width - 1 {
            let label = labels.get(x, y);
            let cluster = &clusters[label];

            if (cluster.num_pixels() as f32) < min_pixels {
                continue;
            }

            if is_boundary(labels, x, y, label) {
                let start = x as usize * CHANNELS;
                row[start..start + CHANNELS].copy_from_slice(&cluster.edge_color.0);
            }
        }
    });

    edges
}

fn is_boundary(labels: &LabelGrid, x: u32, y: u32, label: usize) -> bool {
    (y - 1..=y + 1).any(|ny| {
        (x - 1..=x + 1).any(|nx| (nx != x || ny != y) && labels.get(nx, ny) != label)
    })
}

/// Run `paint` over each row of `image` as `(y, raw_row_bytes)`
#[allow(clippy::cast_possible_truncation)]
fn for_each_row<F>(image: &mut RgbImage, paint: F)
where
    F: Fn(u32, &mut [u8]) + Sync + Send,
{
    let stride = image.width() as usize * CHANNELS;
    if stride == 0 {
        return;
    }

    #[cfg(feature = "performance")]
    image
        .par_chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| paint(y as u32, row));

    #[cfg(not(feature = "performance"))]
    image
        .chunks_mut(stride)
        .enumerate()
        .for_each(|(y, row)| paint(y as u32, row));
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// Partition a flat gray image into two clusters with `label_of`
    fn partition<F>(width: u32, height: u32, label_of: F) -> (RgbImage, Vec<Cluster>, LabelGrid)
    where
        F: Fn(u32, u32) -> usize,
    {
        let source = RgbImage::from_pixel(width, height, Rgb([100, 100, 100]));
        let mut labels = LabelGrid::new(width, height);
        let mut clusters = vec![Cluster::default(), Cluster::default()];
        let mut rng = StdRng::seed_from_u64(42);

        for y in 0..height {
            for x in 0..width {
                let label = label_of(x, y);
                labels.set(x, y, label);
                clusters[label].add_pixel(x, y, *source.get_pixel(x, y));
            }
        }
        for cluster in &mut clusters {
            cluster.normalize(&mut rng);
            // Distinct from the source color so painted pixels are visible
            cluster.edge_color = Rgb([255, 0, 0]);
        }

        (source, clusters, labels)
    }

    fn split_partition(width: u32, height: u32, split: u32) -> (RgbImage, Vec<Cluster>, LabelGrid) {
        partition(width, height, |x, _| usize::from(x >= split))
    }

    #[test]
    fn test_boundary_painted_on_both_sides_of_split() {
        let (source, clusters, labels) = split_partition(6, 6, 3);
        let edges = detect_boundaries(&source, &clusters, &labels, 2.0);

        for y in 1..5 {
            assert_eq!(*edges.get_pixel(2, y), Rgb([255, 0, 0]));
            assert_eq!(*edges.get_pixel(3, y), Rgb([255, 0, 0]));
            assert_eq!(*edges.get_pixel(1, y), Rgb([100, 100, 100]));
            assert_eq!(*edges.get_pixel(4, y), Rgb([100, 100, 100]));
        }
    }

    #[test]
    fn test_border_pixels_are_never_painted() {
        let (source, clusters, labels) = split_partition(6, 6, 3);
        let edges = detect_boundaries(&source, &clusters, &labels, 2.0);

        for x in 0..6 {
            assert_eq!(*edges.get_pixel(x, 0), Rgb([100, 100, 100]));
            assert_eq!(*edges.get_pixel(x, 5), Rgb([100, 100, 100]));
        }
    }

    #[test]
    fn test_small_cluster_boundaries_are_suppressed() {
        // Cluster 1 is a 2×2 block; 0.5·4² = 8 > 4 pixels
        let (source, clusters, labels) =
            partition(8, 8, |x, y| usize::from((3..5).contains(&x) && (3..5).contains(&y)));
        let edges = detect_boundaries(&source, &clusters, &labels, 4.0);

        assert_eq!(clusters[1].num_pixels(), 4);
        for (x, y) in [(3, 3), (4, 3), (3, 4), (4, 4)] {
            assert_eq!(*edges.get_pixel(x, y), Rgb([100, 100, 100]));
        }

        // The large surrounding cluster still outlines the block
        for (x, y) in [(2, 2), (5, 5), (2, 4), (4, 5)] {
            assert_eq!(*edges.get_pixel(x, y), Rgb([255, 0, 0]));
        }
        assert_eq!(*edges.get_pixel(1, 1), Rgb([100, 100, 100]));
    }

    #[test]
    fn test_tiny_images_copy_source() {
        let (source, clusters, labels) = split_partition(2, 5, 1);
        let edges = detect_boundaries(&source, &clusters, &labels, 1.0);
        assert_eq!(edges, source);
    }

    #[test]
    fn test_oversegmented_uses_mean_colors() {
        let mut source = RgbImage::from_pixel(4, 1, Rgb([0, 0, 0]));
        source.put_pixel(1, 0, Rgb([11, 20, 30]));
        let mut labels = LabelGrid::new(4, 1);
        labels.set(2, 0, 1);
        labels.set(3, 0, 1);

        let mut clusters = vec![Cluster::default(), Cluster::default()];
        let mut rng = StdRng::seed_from_u64(1);
        for x in 0..4 {
            clusters[labels.get(x, 0)].add_pixel(x, 0, *source.get_pixel(x, 0));
        }
        for cluster in &mut clusters {
            cluster.normalize(&mut rng);
        }

        let output = render_oversegmented(&clusters, &labels);
        // 11 / 2 = 5.5 truncates to 5
        assert_eq!(*output.get_pixel(0, 0), Rgb([5, 10, 15]));
        assert_eq!(*output.get_pixel(1, 0), Rgb([5, 10, 15]));
        assert_eq!(*output.get_pixel(3, 0), Rgb([0, 0, 0]));
    }
}
