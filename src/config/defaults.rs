/// Lowest JPEG quality probed by the image search
pub const MIN_QUALITY: u8 = 1;

/// Highest JPEG quality probed by the image search
pub const MAX_QUALITY: u8 = 100;

/// Bisection probes for the image quality search (enough to cover 1-100)
pub const QUALITY_PROBES: u32 = 8;

/// Lowest rasterization DPI probed by the document search
pub const MIN_DPI: u32 = 36;

/// Highest rasterization DPI probed by the document search
pub const MAX_DPI: u32 = 150;

/// Bisection probes for the document DPI search
pub const DPI_PROBES: u32 = 6;

/// Safety margin applied to the square-root downscale factor
pub const DOWNSCALE_MARGIN: f64 = 0.9;

/// Per-step dimension factor of the drastic image shrink loop
pub const SHRINK_FACTOR: f64 = 0.8;

/// JPEG quality used by the drastic image shrink loop
pub const SHRINK_QUALITY: u8 = 10;

/// Smallest width/height the image shrink loop will go down to
pub const MIN_DIMENSION: u32 = 1;

/// Per-step DPI factor of the document fallback loop
pub const DPI_SHRINK_FACTOR: f64 = 0.8;

/// DPI at which the document fallback loop stops
pub const DPI_FLOOR: u32 = 10;

/// JPEG quality of each rasterized document page
pub const PAGE_JPEG_QUALITY: u8 = 95;

/// PDF user-space units per inch
pub const POINTS_PER_INCH: f32 = 72.0;

/// Largest rasterized page, in pixels; bigger pages render at a lower resolution
pub const MAX_PAGE_PIXELS: u64 = 40_000_000;
