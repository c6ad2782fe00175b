use crate::{
    pipelines::{UniformBlock, uniform_layout},
    renderable::sun::Moon,
};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniform {
    pub position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    pub color: [f32; 3],
    _padding2: u32,
    /// Constant, linear and quadratic falloff over distance.
    pub attenuation: [f32; 3],
    _padding3: u32,
}

impl LightUniform {
    /// A light without falloff.
    pub fn new(position: [f32; 3], color: [f32; 3]) -> Self {
        Self::with_attenuation(position, color, NO_ATTENUATION)
    }

    pub fn with_attenuation(position: [f32; 3], color: [f32; 3], attenuation: [f32; 3]) -> Self {
        Self {
            position,
            _padding: 0,
            color,
            _padding2: 0,
            attenuation,
            _padding3: 0,
        }
    }
}

/// Attenuation factors of a light whose reach is infinite.
pub const NO_ATTENUATION: [f32; 3] = [1.0, 0.0, 0.0];

/// Light uniform buffer shared by the entity and water programs.
pub struct LightResources {
    pub uniform: LightUniform,
    pub block: UniformBlock<LightUniform>,
    pub bind_group_layout: wgpu::BindGroupLayout,
}

impl LightResources {
    pub fn new(device: &wgpu::Device, uniform: LightUniform) -> Self {
        let bind_group_layout = mk_bind_group_layout(device);
        let block = UniformBlock::new(device, &bind_group_layout, &uniform, "Light Buffer");
        Self {
            uniform,
            block,
            bind_group_layout,
        }
    }

    /// Take position and color from `light` (a sun or a moon).
    pub fn update(&mut self, queue: &wgpu::Queue, light: &Moon) {
        self.uniform = light.to_uniform();
        self.block.write(queue, &self.uniform);
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        self.block.bind_group()
    }
}

pub fn mk_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    uniform_layout(
        device,
        wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
        "light_bind_group_layout",
    )
}
