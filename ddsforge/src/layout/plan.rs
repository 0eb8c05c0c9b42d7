//! The restartable subresource plan.

use super::subresource::{checked_surface_size, surface_size, Subresource, SubresourceKey};
use crate::descriptor::{mip_extent, TextureDescriptor, TextureKind};

/// Plans the pixel-data blob of `descriptor`.
///
/// The plan is pure and deterministic: identical descriptors yield
/// identical offsets and totals. Validate the descriptor first; the planner
/// does not re-check invariants.
///
/// # Example
///
/// ```
/// use ddsforge::descriptor::TextureDescriptor;
/// use ddsforge::format::{FormatId, FormatRegistry};
/// use ddsforge::layout::plan;
///
/// let rgba = *FormatRegistry::global().lookup(FormatId::R8G8B8A8Unorm).unwrap();
/// let layout = plan(&TextureDescriptor::new_2d(256, 256, rgba));
///
/// assert_eq!(layout.len(), 1);
/// assert_eq!(layout.total_size(), 262_144);
/// ```
pub fn plan(descriptor: &TextureDescriptor) -> SurfacePlan {
    SurfacePlan {
        descriptor: *descriptor,
    }
}

/// Lazy, finite, restartable sequence of subresources for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfacePlan {
    descriptor: TextureDescriptor,
}

impl SurfacePlan {
    pub fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    /// A fresh iterator starting at the first subresource.
    pub fn iter(&self) -> Subresources {
        Subresources {
            plan: *self,
            array: 0,
            face: 0,
            mip: 0,
            slice: 0,
            offset: 0,
            remaining: self.len(),
        }
    }

    /// Number of subresources.
    pub fn len(&self) -> usize {
        let d = &self.descriptor;
        let per_face: usize = (0..d.mip_count).map(|mip| self.slices_at(mip) as usize).sum();
        d.array_size as usize * d.faces() as usize * per_face
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total blob length in bytes.
    ///
    /// Saturates at `usize::MAX`; validated descriptors never reach it.
    pub fn total_size(&self) -> usize {
        self.checked_total_size().unwrap_or(usize::MAX)
    }

    /// Total blob length in bytes, or `None` when it overflows `usize`.
    pub fn checked_total_size(&self) -> Option<usize> {
        let d = &self.descriptor;
        let mut per_face = 0usize;
        for mip in 0..d.mip_count {
            let (w, h) = self.mip_dims(mip);
            let level = checked_surface_size(&d.format, w, h)?
                .checked_mul(self.slices_at(mip) as usize)?;
            per_face = per_face.checked_add(level)?;
        }
        per_face
            .checked_mul(d.array_size as usize)?
            .checked_mul(d.faces() as usize)
    }

    /// The planned subresource at `key`, if the texture has one.
    pub fn find(&self, key: SubresourceKey) -> Option<Subresource> {
        self.iter().find(|s| s.key == key)
    }

    /// Depth slices stored at a mip level (1 for non-volumes).
    pub fn slices_at(&self, mip: u32) -> u32 {
        if self.descriptor.kind() == TextureKind::Texture3D {
            mip_extent(self.descriptor.depth, mip)
        } else {
            1
        }
    }

    fn mip_dims(&self, mip: u32) -> (u32, u32) {
        (
            mip_extent(self.descriptor.width, mip),
            mip_extent(self.descriptor.height, mip),
        )
    }
}

impl IntoIterator for &SurfacePlan {
    type Item = Subresource;
    type IntoIter = Subresources;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over a [`SurfacePlan`] in blob order.
#[derive(Debug, Clone)]
pub struct Subresources {
    plan: SurfacePlan,
    array: u32,
    face: u32,
    mip: u32,
    slice: u32,
    offset: usize,
    remaining: usize,
}

impl Iterator for Subresources {
    type Item = Subresource;

    fn next(&mut self) -> Option<Subresource> {
        if self.remaining == 0 {
            return None;
        }
        let (slice_width, slice_height) = self.plan.mip_dims(self.mip);
        let byte_length = surface_size(&self.plan.descriptor.format, slice_width, slice_height);
        let item = Subresource {
            key: SubresourceKey {
                array_index: self.array,
                face_index: self.face,
                mip_level: self.mip,
                depth_slice: self.slice,
            },
            byte_offset: self.offset,
            byte_length,
            slice_width,
            slice_height,
        };

        self.offset = self.offset.saturating_add(byte_length);
        self.remaining -= 1;
        self.slice += 1;
        if self.slice >= self.plan.slices_at(self.mip) {
            self.slice = 0;
            self.mip += 1;
            if self.mip >= self.plan.descriptor.mip_count {
                self.mip = 0;
                self.face += 1;
                if self.face >= self.plan.descriptor.faces() {
                    self.face = 0;
                    self.array += 1;
                }
            }
        }
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for Subresources {}
