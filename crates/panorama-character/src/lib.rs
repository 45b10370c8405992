//! Character pipeline of the panorama viewer.
//!
//! The viewer loads a rigged character bundle into a [`stage::Scene`],
//! binds a node material and a shadow caster to each named part, and turns
//! the eyes of the rig towards the camera every frame.
//!
//! All scene state lives on the thread driving the frame loop. Probes,
//! fetches and parsing run on the runtime owned by [`dispatch::Dispatcher`],
//! and their results are collected by their owners on the next frame.
pub mod character;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod source;
pub mod stage;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use panorama_asset as asset;
