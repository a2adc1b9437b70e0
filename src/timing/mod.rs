// Timing and geometry: timeline math, scaled positions, chart queries.

pub mod geometry;
pub mod scaled;
pub mod timeline;

pub use geometry::ChartGeometry;
pub use scaled::{ScaledCacheEntry, ScaledPositionCache};
pub use timeline::{Timeline, TimelineEvent};
