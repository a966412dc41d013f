/// Per-pixel cluster assignment, stored row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGrid {
    width: u32,
    height: u32,
    labels: Vec<usize>,
}

impl LabelGrid {
    /// Create a grid with every pixel assigned to cluster 0
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            labels: vec![0; width as usize * height as usize],
        }
    }

    pub const fn width(&self) -> u32 {
        self.width
    }

    pub const fn height(&self) -> u32 {
        self.height
    }

    pub const fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Offset of pixel `(x, y)` in the backing storage
    pub const fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> usize {
        self.labels[self.offset(x, y)]
    }

    pub fn set(&mut self, x: u32, y: u32, label: usize) {
        let offset = self.offset(x, y);
        self.labels[offset] = label;
    }

    pub fn as_slice(&self) -> &[usize] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Largest label in use
    pub fn max_label(&self) -> Option<usize> {
        self.labels.iter().copied().max()
    }

    /// Number of pixels carrying each label, for `cluster_count` clusters
    pub fn histogram(&self, cluster_count: usize) -> Vec<usize> {
        let mut counts = vec![0; cluster_count];
        for &label in &self.labels {
            if let Some(count) = counts.get_mut(label) {
                *count += 1;
            }
        }
        counts
    }

    /// Row `y` of the grid
    pub fn row(&self, y: u32) -> &[usize] {
        let start = self.offset(0, y);
        &self.labels[start..start + self.width as usize]
    }
}
