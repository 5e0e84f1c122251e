//! Per-frame dynamic uniform arena.
//!
//! Every constant-buffer bind or update during a frame appends one fixed-size
//! block to a CPU staging vector. At flush the staging data is uploaded with a
//! single `write_buffer` and draws address their blocks with dynamic offsets.
//!
//! Bind groups depend only on the slot mask and the GPU buffer, so they are
//! cached per mask and rebuilt only when the buffer grows.

use std::num::NonZeroU64;

use rustc_hash::FxHashMap;

/// Size and stride of one uniform block. A multiple of the 256-byte dynamic
/// offset alignment wgpu requires by default.
pub const UNIFORM_BLOCK_SIZE: u64 = 1024;

const INITIAL_BLOCKS: u64 = 64;

pub struct UniformArena {
    buffer: wgpu::Buffer,
    staging: Vec<u8>,
    layouts: FxHashMap<u32, wgpu::BindGroupLayout>,
    bind_groups: FxHashMap<u32, wgpu::BindGroup>,
}

impl UniformArena {
    pub fn new(device: &wgpu::Device) -> Self {
        Self {
            buffer: Self::create_buffer(device, INITIAL_BLOCKS * UNIFORM_BLOCK_SIZE),
            staging: Vec::with_capacity((INITIAL_BLOCKS * UNIFORM_BLOCK_SIZE) as usize),
            layouts: FxHashMap::default(),
            bind_groups: FxHashMap::default(),
        }
    }

    fn create_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Uniform Arena"),
            size,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    /// Appends one block and returns its dynamic offset.
    ///
    /// Data longer than [`UNIFORM_BLOCK_SIZE`] is truncated.
    pub fn push(&mut self, data: &[u8]) -> u32 {
        let offset = self.staging.len();
        let block = UNIFORM_BLOCK_SIZE as usize;
        if data.len() > block {
            log::warn!(
                "Constant buffer of {} bytes truncated to {block} bytes",
                data.len()
            );
        }
        let len = data.len().min(block);
        self.staging.extend_from_slice(&data[..len]);
        self.staging.resize(offset + block, 0);
        offset as u32
    }

    /// Blocks pushed since the last reset.
    #[must_use]
    pub fn block_count(&self) -> usize {
        self.staging.len() / UNIFORM_BLOCK_SIZE as usize
    }

    /// Uploads the staged blocks, growing the GPU buffer if needed.
    pub fn upload(&mut self, device: &wgpu::Device, queue: &wgpu::Queue) {
        if self.staging.is_empty() {
            return;
        }
        let needed = self.staging.len() as u64;
        if needed > self.buffer.size() {
            let size = needed.next_power_of_two();
            log::info!("Growing uniform arena to {size} bytes");
            self.buffer = Self::create_buffer(device, size);
            self.bind_groups.clear();
        }
        queue.write_buffer(&self.buffer, 0, &self.staging);
    }

    pub fn reset(&mut self) {
        self.staging.clear();
    }

    /// Layout with one dynamic uniform binding per set bit of `mask`.
    pub fn layout(&mut self, device: &wgpu::Device, mask: u32) -> &wgpu::BindGroupLayout {
        self.layouts.entry(mask).or_insert_with(|| {
            let entries: Vec<wgpu::BindGroupLayoutEntry> = bindings(mask)
                .map(|binding| wgpu::BindGroupLayoutEntry {
                    binding,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: None,
                    },
                    count: None,
                })
                .collect();
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some(&format!("Uniform Slots Layout {mask:#06b}")),
                entries: &entries,
            })
        })
    }

    /// Bind group over the current buffer for `mask`. Call after
    /// [`upload`](Self::upload).
    pub fn bind_group(&mut self, device: &wgpu::Device, mask: u32) -> wgpu::BindGroup {
        if let Some(group) = self.bind_groups.get(&mask) {
            return group.clone();
        }
        let layout = self.layout(device, mask).clone();
        let entries: Vec<wgpu::BindGroupEntry> = bindings(mask)
            .map(|binding| wgpu::BindGroupEntry {
                binding,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &self.buffer,
                    offset: 0,
                    size: NonZeroU64::new(UNIFORM_BLOCK_SIZE),
                }),
            })
            .collect();
        let group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("Uniform Slots {mask:#06b}")),
            layout: &layout,
            entries: &entries,
        });
        self.bind_groups.insert(mask, group.clone());
        group
    }
}

/// Set bits of `mask`, ascending.
pub fn bindings(mask: u32) -> impl Iterator<Item = u32> {
    (0..u32::BITS).filter(move |bit| mask & (1 << bit) != 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bindings_follow_mask_bits() {
        assert_eq!(bindings(0b1010).collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(bindings(0).count(), 0);
    }

    #[test]
    fn block_size_respects_offset_alignment() {
        assert_eq!(UNIFORM_BLOCK_SIZE % 256, 0);
    }
}
