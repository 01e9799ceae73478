use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

mod annotation;
mod color;
mod settings;

pub use annotation::Annotation;
pub use color::Rgb;
pub use settings::{
    AnnotationSettings, PaletteSettings, TransportSettings, ViewerSettings, ViewportSettings,
    WindowSettings, DEFAULT_CHANNEL_COLORS, DEFAULT_TAG_COLORS, DEFAULT_UNTAGGED_COLOR,
    DEFAULT_ZERO_LINE_COLOR,
};

/// Everything needed to seed a viewer: the sample payload plus the annotation state.
///
/// `values` is the flat transport layout: channel `k` occupies `[k*N, (k+1)*N)`
/// where `N = times.len()`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionDefinition {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub channel_names: Vec<String>,
    pub times: Vec<f64>,
    pub values: Vec<f64>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub video: Option<PathBuf>,
}

#[derive(thiserror::Error, Debug)]
pub enum SessionError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("toml serialization error: {0}")]
    TomlSer(#[from] toml::ser::Error),
    #[error("payload of {len} bytes is not a whole number of 64-bit floats")]
    Payload { len: usize },
    #[error("invalid settings: {0}")]
    Validation(String),
    #[error("{field}[{index}] is not a finite number")]
    NonFinite { field: &'static str, index: usize },
}

impl SessionDefinition {
    pub fn new(title: impl Into<String>, times: Vec<f64>, values: Vec<f64>) -> Self {
        Self {
            title: title.into(),
            times,
            values,
            ..Self::default()
        }
    }

    pub fn duration(&self) -> f64 {
        self.times.last().copied().unwrap_or(0.0)
    }

    /// JSON has no NaN or infinity, so samples must be finite to round-trip.
    pub fn check_finite(&self) -> Result<(), SessionError> {
        for (field, samples) in [("times", &self.times), ("values", &self.values)] {
            if let Some(index) = samples.iter().position(|v| !v.is_finite()) {
                return Err(SessionError::NonFinite { field, index });
            }
        }
        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), SessionError> {
        self.check_finite()?;
        let data = serde_json::to_vec_pretty(self)?;
        fs::write(path, data)?;
        Ok(())
    }

    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, SessionError> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let mut definition: SessionDefinition = serde_json::from_slice(&data)?;
        // Relative video paths are relative to the session file.
        if let (Some(video), Some(dir)) = (definition.video.as_ref(), path.parent()) {
            if video.is_relative() {
                definition.video = Some(dir.join(video));
            }
        }
        Ok(definition)
    }
}

/// Decodes a little-endian sequence of 64-bit floats.
pub fn decode_f64_le(bytes: &[u8]) -> Result<Vec<f64>, SessionError> {
    if bytes.len() % 8 != 0 {
        return Err(SessionError::Payload { len: bytes.len() });
    }
    Ok(bytes
        .chunks_exact(8)
        .map(|chunk| {
            let mut raw = [0u8; 8];
            raw.copy_from_slice(chunk);
            f64::from_le_bytes(raw)
        })
        .collect())
}

pub fn encode_f64_le(values: &[f64]) -> Vec<u8> {
    values.iter().flat_map(|value| value.to_le_bytes()).collect()
}

pub fn read_f64_file<P: AsRef<Path>>(path: P) -> Result<Vec<f64>, SessionError> {
    let bytes = fs::read(path)?;
    decode_f64_le(&bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_partial_floats() {
        let err = decode_f64_le(&[0u8; 12]).unwrap_err();
        assert!(matches!(err, SessionError::Payload { len: 12 }));
    }

    #[test]
    fn non_finite_samples_are_not_saved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nan.json");
        let session = SessionDefinition::new("nan", vec![0.0, 1.0, 2.0], vec![0.0, f64::NAN, 1.0]);
        let err = session.save_to_file(&path).unwrap_err();
        assert!(matches!(
            err,
            SessionError::NonFinite {
                field: "values",
                index: 1
            }
        ));
        assert!(!path.exists());
    }

    #[test]
    fn decode_reads_little_endian() {
        let bytes = encode_f64_le(&[1.5, -2.0]);
        assert_eq!(&bytes[..8], &1.5f64.to_le_bytes());
        assert_eq!(decode_f64_le(&bytes).unwrap(), vec![1.5, -2.0]);
    }
}
