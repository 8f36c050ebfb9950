// THEORY:
// The `RegionExtractor` is the engine of the spatial grouping layer. It turns
// the raw, noisy per-pixel mask from the background model into a short list
// of coherent `Region`s, each with an area and a bounding box.
//
// The cleaning pipeline runs in a fixed order:
// 1.  **Morphological close** (dilate then erode) merges nearby fragments of
//     one object and fills small holes inside it.
// 2.  **Morphological open** (erode then dilate) strips isolated noise
//     speckles that survived the close.
// 3.  **Box-blur smoothing** followed by a re-threshold softens jagged edges
//     before component analysis.
// 4.  **Connected-component extraction** (8-connected flood fill, seeded in
//     raster-scan order) groups the surviving pixels into regions. Only
//     outermost components exist by construction: interior holes are simply
//     non-foreground pixels and never produce a region of their own.
//
// The extractor is a stateless utility: it maps one mask to one region list
// and remembers nothing between frames. Region order follows the raster-scan
// position of each region's first pixel, which keeps the output deterministic
// for a given mask.

use crate::core_modules::frame::{ForegroundMask, LABEL_FOREGROUND};

/// Half-width of the square structuring element (radius 2 gives a 5x5 kernel).
const KERNEL_RADIUS: i32 = 2;
/// Half-width of the smoothing window (radius 2 gives a 5x5 box blur).
const BLUR_RADIUS: i32 = 2;
/// A blurred pixel survives re-thresholding when more than half of its
/// window was foreground.
const BLUR_KEEP_THRESHOLD: f32 = 0.5;

/// Axis-aligned rectangle fully containing one extracted region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// One connected cluster of foreground pixels with its geometric measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    /// Number of foreground pixels in the cluster.
    pub area: u32,
    /// Tight rectangle around the cluster.
    pub bounding_box: BoundingBox,
}

/// Stateless mask-to-regions transformer.
pub struct RegionExtractor {
    /// Whether shadow-labelled pixels count as foreground. Off by default:
    /// illumination changes are not motion.
    include_shadows: bool,
}

impl Default for RegionExtractor {
    fn default() -> Self {
        Self::new(false)
    }
}

impl RegionExtractor {
    pub fn new(include_shadows: bool) -> Self {
        Self { include_shadows }
    }

    /// Cleans the mask and extracts its connected foreground regions.
    ///
    /// A mask with no foreground pixels yields an empty list, not an error.
    pub fn extract(&self, mask: &ForegroundMask) -> Vec<Region> {
        let width = mask.width as i32;
        let height = mask.height as i32;

        let binary: Vec<bool> = mask
            .labels
            .iter()
            .map(|&label| {
                label == LABEL_FOREGROUND || (self.include_shadows && label > 0)
            })
            .collect();

        if !binary.iter().any(|&fg| fg) {
            return Vec::new();
        }

        // Close: merge fragments and fill small holes.
        let closed = erode(&dilate(&binary, width, height), width, height);
        // Open: strip isolated speckles.
        let opened = dilate(&erode(&closed, width, height), width, height);
        // Smooth jagged edges, then re-binarize.
        let smoothed = box_blur_threshold(&opened, width, height);

        connected_components(&smoothed, width, height)
    }
}

fn dilate(input: &[bool], width: i32, height: i32) -> Vec<bool> {
    morph(input, width, height, true)
}

fn erode(input: &[bool], width: i32, height: i32) -> Vec<bool> {
    morph(input, width, height, false)
}

/// Square-kernel morphology. For dilation a pixel turns on if any neighbor in
/// the kernel is on; for erosion it stays on only if every neighbor is on.
/// Out-of-bounds neighbors count as background.
fn morph(input: &[bool], width: i32, height: i32, dilating: bool) -> Vec<bool> {
    let mut output = vec![false; input.len()];
    for y in 0..height {
        for x in 0..width {
            let mut hit = !dilating;
            'kernel: for dy in -KERNEL_RADIUS..=KERNEL_RADIUS {
                for dx in -KERNEL_RADIUS..=KERNEL_RADIUS {
                    let nx = x + dx;
                    let ny = y + dy;
                    let neighbor = if nx >= 0 && nx < width && ny >= 0 && ny < height {
                        input[(ny * width + nx) as usize]
                    } else {
                        false
                    };
                    if dilating && neighbor {
                        hit = true;
                        break 'kernel;
                    }
                    if !dilating && !neighbor {
                        hit = false;
                        break 'kernel;
                    }
                }
            }
            output[(y * width + x) as usize] = hit;
        }
    }
    output
}

/// Averages each pixel over its box window and keeps it only when more than
/// half the window was foreground.
fn box_blur_threshold(input: &[bool], width: i32, height: i32) -> Vec<bool> {
    let window = ((2 * BLUR_RADIUS + 1) * (2 * BLUR_RADIUS + 1)) as f32;
    let mut output = vec![false; input.len()];
    for y in 0..height {
        for x in 0..width {
            let mut lit = 0u32;
            for dy in -BLUR_RADIUS..=BLUR_RADIUS {
                for dx in -BLUR_RADIUS..=BLUR_RADIUS {
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx >= 0
                        && nx < width
                        && ny >= 0
                        && ny < height
                        && input[(ny * width + nx) as usize]
                    {
                        lit += 1;
                    }
                }
            }
            output[(y * width + x) as usize] = lit as f32 / window > BLUR_KEEP_THRESHOLD;
        }
    }
    output
}

/// 8-connected flood fill seeded in raster-scan order, so the region list is
/// deterministic for a given mask.
fn connected_components(input: &[bool], width: i32, height: i32) -> Vec<Region> {
    let mut visited = vec![false; input.len()];
    let mut regions = Vec::new();

    for seed in 0..input.len() {
        if !input[seed] || visited[seed] {
            continue;
        }

        let mut area = 0u32;
        let mut min_x = width - 1;
        let mut min_y = height - 1;
        let mut max_x = 0;
        let mut max_y = 0;

        let mut queue = vec![seed];
        visited[seed] = true;
        while let Some(index) = queue.pop() {
            let x = index as i32 % width;
            let y = index as i32 / width;
            area += 1;
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);

            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x + dx;
                    let ny = y + dy;
                    if nx < 0 || nx >= width || ny < 0 || ny >= height {
                        continue;
                    }
                    let neighbor = (ny * width + nx) as usize;
                    if input[neighbor] && !visited[neighbor] {
                        visited[neighbor] = true;
                        queue.push(neighbor);
                    }
                }
            }
        }

        regions.push(Region {
            area,
            bounding_box: BoundingBox {
                x: min_x as u32,
                y: min_y as u32,
                width: (max_x - min_x + 1) as u32,
                height: (max_y - min_y + 1) as u32,
            },
        });
    }

    regions
}
