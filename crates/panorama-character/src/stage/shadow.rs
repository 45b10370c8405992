use crate::config::{ShadowFilter, ShadowParams};

use super::{light::LightId, scene::MeshId};

/// Shadow map generator bound to one light.
#[derive(Debug, Clone, PartialEq)]
pub struct ShadowCaster {
    pub light: LightId,
    pub map_size: u32,
    pub filter: ShadowFilter,
    pub darkness: f32,
    pub contact_hardening_light_size_uv_ratio: f32,
    pub bias: f32,
    render_list: Vec<MeshId>,
}

impl ShadowCaster {
    pub fn from_params(params: &ShadowParams, light: LightId) -> Self {
        Self {
            light,
            map_size: params.map_size,
            filter: params.filter,
            darkness: params.darkness.clamp(0.0, 1.0),
            contact_hardening_light_size_uv_ratio: params.contact_hardening_light_size_uv_ratio,
            bias: params.bias,
            render_list: Vec::new(),
        }
    }

    /// Meshes rendered into the shadow map.
    pub fn render_list(&self) -> &[MeshId] {
        &self.render_list
    }

    pub fn add_shadow_caster(&mut self, mesh: MeshId) {
        if !self.render_list.contains(&mesh) {
            self.render_list.push(mesh);
        }
    }

    pub fn remove_shadow_caster(&mut self, mesh: MeshId) {
        self.render_list.retain(|id| *id != mesh);
    }
}
