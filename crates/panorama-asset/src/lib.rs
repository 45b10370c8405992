//! Provide asset handling for the panorama character.
//!
//! This library provides a node structure which is structured upon GLTF,
//! a loader turning a rigged GLTF bundle into that structure, and a parser
//! for the node-material descriptions attached to each character part.
//! The flattened [`scene::CharacterAsset`] view is what the scene consumes:
//! named mesh parts, their morph targets, and the skeleton joints.
//!
pub mod index;
/// Model and material loaders
pub mod loader;
pub mod material;
pub mod mesh;
pub mod node;
pub mod scene;
pub mod skin;

/// In-memory GLTF documents for tests.
#[cfg(any(test, feature = "fixture"))]
pub mod fixture;
