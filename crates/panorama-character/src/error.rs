use std::{
    error::Error,
    fmt::{self, Display, Formatter},
    io,
    sync::Arc,
};

use panorama_asset::loader::{gltf::GltfLoaderError, material::MaterialError};

/// Failure of an asset source request.
#[derive(Debug, Clone)]
pub enum SourceError {
    NotFound(String),
    Status(String, u16),
    Io(Arc<io::Error>),
    Transport(String),
    /// The request task ended without a result.
    Aborted,
}

impl Display for SourceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::NotFound(path) => write!(f, "Asset {} not found", path),
            SourceError::Status(path, status) => {
                write!(f, "Request for {} failed with status {}", path, status)
            }
            SourceError::Io(error) => Display::fmt(error, f),
            SourceError::Transport(error) => write!(f, "Transport failed: {}", error),
            SourceError::Aborted => write!(f, "Request aborted"),
        }
    }
}

impl Error for SourceError {}

impl From<io::Error> for SourceError {
    fn from(value: io::Error) -> Self {
        Self::Io(Arc::new(value))
    }
}

/// Failure of fetching and parsing the bundle or a material description.
#[derive(Debug, Clone)]
pub enum LoadError {
    Source(SourceError),
    Bundle(Arc<GltfLoaderError>),
    Material(Arc<MaterialError>),
    /// The pending operation was dropped before it produced a result.
    Canceled,
    /// The scene was disposed while the operation was pending.
    Disposed,
}

impl Display for LoadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Source(error) => Display::fmt(error, f),
            LoadError::Bundle(error) => write!(f, "Bad bundle: {}", error),
            LoadError::Material(error) => write!(f, "Bad material description: {}", error),
            LoadError::Canceled => write!(f, "Load canceled"),
            LoadError::Disposed => write!(f, "Scene disposed while loading"),
        }
    }
}

impl Error for LoadError {}

impl From<SourceError> for LoadError {
    fn from(value: SourceError) -> Self {
        Self::Source(value)
    }
}

impl From<GltfLoaderError> for LoadError {
    fn from(value: GltfLoaderError) -> Self {
        Self::Bundle(Arc::new(value))
    }
}

impl From<MaterialError> for LoadError {
    fn from(value: MaterialError) -> Self {
        Self::Material(Arc::new(value))
    }
}

/// Why a part ended up without its material.
#[derive(Debug, Clone)]
pub enum BindError {
    MeshMissing(String),
    Load(LoadError),
}

impl Display for BindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BindError::MeshMissing(mesh) => write!(f, "Mesh {} not found", mesh),
            BindError::Load(error) => Display::fmt(error, f),
        }
    }
}

impl Error for BindError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RigError {
    SceneGone,
    MissingJoint(String),
    NoEyeJoints,
}

impl Display for RigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            RigError::SceneGone => write!(f, "Scene is gone"),
            RigError::MissingJoint(name) => write!(f, "Joint {} not found", name),
            RigError::NoEyeJoints => write!(f, "No eye joint below the rig root"),
        }
    }
}

impl Error for RigError {}

#[derive(Debug, Clone)]
pub enum ViewerError {
    Runtime(Arc<io::Error>),
    Disposed,
}

impl Display for ViewerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            ViewerError::Runtime(error) => write!(f, "Failed to start the runtime: {}", error),
            ViewerError::Disposed => write!(f, "Viewer is disposed"),
        }
    }
}

impl Error for ViewerError {}

impl From<io::Error> for ViewerError {
    fn from(value: io::Error) -> Self {
        Self::Runtime(Arc::new(value))
    }
}
