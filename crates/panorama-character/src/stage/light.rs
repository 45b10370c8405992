use glam::Vec3;

use super::scene::Scene;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LightId(pub(super) usize);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightKind {
    Hemispheric,
    /// Shadow-capable light shining along its direction.
    Directional,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneLight {
    pub name: String,
    pub kind: LightKind,
    pub direction: Vec3,
    pub position: Vec3,
    pub intensity: f32,
}

/// The lights of the panorama stage.
#[derive(Debug, Clone, Copy)]
pub struct StageLight {
    pub ambient_light: LightId,
    /// Lights the character and casts its shadows.
    pub character_light: LightId,
}

impl StageLight {
    pub fn new(scene: &mut Scene) -> Self {
        let ambient_light = scene.add_light(SceneLight {
            name: String::from("ambientLight"),
            kind: LightKind::Hemispheric,
            direction: Vec3::Y,
            position: Vec3::ZERO,
            intensity: 0.7,
        });
        let character_light = scene.add_light(SceneLight {
            name: String::from("characterLight"),
            kind: LightKind::Directional,
            direction: Vec3::new(0.0, -1.0, 1.0).normalize(),
            position: Vec3::new(0.0, 5.0, -5.0),
            intensity: 1.0,
        });
        Self {
            ambient_light,
            character_light,
        }
    }
}
