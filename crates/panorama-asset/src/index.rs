use std::fmt::{self, Display, Formatter, LowerHex};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BundleIndex(pub [u8; 32]);

impl LowerHex for BundleIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

impl From<[u8; 32]> for BundleIndex {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl Display for BundleIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{:x}", self)
    }
}

impl BundleIndex {
    #[cfg(feature = "digest")]
    pub fn digest_from_buffer(buffer: &[u8]) -> Self {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(buffer);
        let hash = hasher.finalize();
        Self(hash.into())
    }

    /// Short form used in log lines.
    pub fn short(&self) -> String {
        self.0[..4].iter().map(|byte| format!("{:02x}", byte)).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum BundleAssetType {
    Node,
    Mesh,
    Skin,
}

impl Display for BundleAssetType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            BundleAssetType::Node => write!(f, "Node"),
            BundleAssetType::Mesh => write!(f, "Mesh"),
            BundleAssetType::Skin => write!(f, "Skin"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetIndex {
    Bundle(BundleIndex),
    BundleTypeIndex(BundleIndex, BundleAssetType, usize),
}

impl AssetIndex {
    pub fn bundle(&self) -> &BundleIndex {
        match self {
            AssetIndex::Bundle(bundle_index) => bundle_index,
            AssetIndex::BundleTypeIndex(bundle_index, _, _) => bundle_index,
        }
    }
}

impl Display for AssetIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AssetIndex::Bundle(bundle_index) => Display::fmt(bundle_index, f),
            AssetIndex::BundleTypeIndex(bundle_index, asset_type, index) => {
                write!(f, "{} - {}: {}", bundle_index, asset_type, index)
            }
        }
    }
}
