//! Pure geometry kernel for map placement.
//!
//! # Responsibility
//! - Axis-aligned bounding-box tests used by collisions and selection.
//! - Grid snapping and map-centered coordinate transforms.
//! - Composite draw-order keys used by every rendering surface.
//!
//! # Invariants
//! - Every function here is pure and safe to call from any thread.
//! - Coordinates are map units with a top-left origin unless stated otherwise.

pub mod bounds;
pub mod depth;
pub mod snap;

pub use bounds::{aabb_overlap, edge_distance, rect_touches, Bounds, Point};
pub use depth::{category_z_offset, to_world_center, DrawKey, WorldPosition};
pub use snap::{round_to_hundredths, snap_position, snap_size, SnapSettings};
