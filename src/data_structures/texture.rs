//! The video-backed texture shown on the overlay quad.
//!
//! Unlike ordinary image textures, a video texture changes content every frame.
//! [`VideoTexture`] carries the sampler setup the overlay needs and a refresh
//! flag that the host renderer consumes before drawing.

use crate::resources::video::VideoFrame;

/// Sampler and refresh state of a video texture.
#[derive(Clone, Debug)]
pub struct VideoTexture {
    pub address_mode: wgpu::AddressMode,
    pub min_filter: wgpu::FilterMode,
    pub mag_filter: wgpu::FilterMode,
    pub flip_y: bool,
    needs_update: bool,
    version: u64,
}

impl VideoTexture {
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8UnormSrgb;

    /// Edge-clamped, linearly filtered and not flipped vertically.
    pub fn new() -> Self {
        Self {
            address_mode: wgpu::AddressMode::ClampToEdge,
            min_filter: wgpu::FilterMode::Linear,
            mag_filter: wgpu::FilterMode::Linear,
            flip_y: false,
            needs_update: false,
            version: 0,
        }
    }

    /// Flags the texture content as stale. Each call bumps [`version`](Self::version) by one.
    pub fn mark_needs_update(&mut self) {
        self.needs_update = true;
        self.version += 1;
    }

    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Number of refreshes requested since construction.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Returns and clears the refresh flag. Called by the renderer once per frame.
    pub fn take_needs_update(&mut self) -> bool {
        std::mem::take(&mut self.needs_update)
    }

    pub fn sampler_descriptor(&self) -> wgpu::SamplerDescriptor<'static> {
        wgpu::SamplerDescriptor {
            label: Some("video sampler"),
            address_mode_u: self.address_mode,
            address_mode_v: self.address_mode,
            address_mode_w: self.address_mode,
            mag_filter: self.mag_filter,
            min_filter: self.min_filter,
            ..Default::default()
        }
    }

    pub fn create_sampler(&self, device: &wgpu::Device) -> wgpu::Sampler {
        device.create_sampler(&self.sampler_descriptor())
    }

    pub fn create_texture(&self, device: &wgpu::Device, width: u32, height: u32) -> wgpu::Texture {
        device.create_texture(&wgpu::TextureDescriptor {
            label: Some("video texture"),
            size: wgpu::Extent3d {
                width: width.max(1),
                height: height.max(1),
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::COPY_DST
                | wgpu::TextureUsages::COPY_SRC,
            view_formats: &[],
        })
    }

    /**
     * Writes `frame` into `texture` when a refresh is pending.
     *
     * Returns whether anything was uploaded. The frame is flipped here when
     * `flip_y` is set since the GPU copy itself never flips.
     */
    pub fn upload(
        &mut self,
        queue: &wgpu::Queue,
        texture: &wgpu::Texture,
        frame: &VideoFrame,
    ) -> bool {
        if !self.take_needs_update() {
            return false;
        }
        let flipped;
        let frame = if self.flip_y {
            flipped = image::imageops::flip_vertical(frame);
            &flipped
        } else {
            frame
        };
        let (width, height) = frame.dimensions();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                aspect: wgpu::TextureAspect::All,
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
            },
            frame.as_raw(),
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(4 * width),
                rows_per_image: Some(height),
            },
            wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
        );
        true
    }
}

impl Default for VideoTexture {
    fn default() -> Self {
        Self::new()
    }
}
