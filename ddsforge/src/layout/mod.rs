//! Surface layout planning.
//!
//! The pixel-data blob of a container is the concatenation of every
//! subresource in a fixed order:
//!
//! ```text
//! for array in 0..array_size
//!   for face in 0..faces            (6 for cubemaps, else 1)
//!     for mip in 0..mip_count       (largest first)
//!       for slice in 0..depth(mip)  (volumes only, max(1, depth >> mip))
//! ```
//!
//! Sizes and offsets depend only on the descriptor, so a plan can be
//! computed before any pixel data exists. Pitch fields in headers are never
//! consulted.

mod plan;
mod subresource;

pub use plan::{plan, SurfacePlan, Subresources};
pub use subresource::{checked_surface_size, row_pitch, surface_size, Subresource, SubresourceKey};
