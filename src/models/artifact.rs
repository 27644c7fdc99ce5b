// Artifact loading: serde documents on disk, codec picked by extension
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;

use crate::error::ArtifactError;

/// A fitted object that can be checked for internal consistency after decoding.
pub trait Artifact: DeserializeOwned {
    fn validate(&self) -> Result<(), ArtifactError>;
}

/// Reads and decodes an artifact. `.json` files go through serde_json, `.bin`
/// files through bincode's serde codec with the standard configuration.
pub fn load<T: Artifact>(path: impl AsRef<Path>) -> Result<T, ArtifactError> {
    let path = path.as_ref();
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let artifact: T = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
            path: path.to_path_buf(),
            source,
        })?,
        Some("bin") => {
            let (artifact, _) =
                bincode::serde::decode_from_slice(&bytes, bincode::config::standard()).map_err(
                    |source| ArtifactError::Bincode {
                        path: path.to_path_buf(),
                        source,
                    },
                )?;
            artifact
        }
        _ => return Err(ArtifactError::UnsupportedFormat(path.to_path_buf())),
    };

    artifact.validate()?;
    Ok(artifact)
}
