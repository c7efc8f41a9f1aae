use crate::AssetError;
use std::path::{Path, PathBuf};

/// WGSL source text and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSource {
    pub name: String,
    pub text: String,
    /// `None` for sources compiled into the binary.
    pub path: Option<PathBuf>,
}

impl ShaderSource {
    pub fn builtin(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            path: None,
        }
    }

    /// Read a shader file from disk. The name is the file stem.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AssetError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| AssetError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(Self {
            name,
            text,
            path: Some(path.to_path_buf()),
        })
    }

    /// Use `<dir>/<name>.wgsl` when it exists, otherwise the built-in text.
    pub fn resolve(dir: Option<&Path>, name: &str, builtin: &str) -> Result<Self, AssetError> {
        if let Some(dir) = dir {
            let path = dir.join(format!("{name}.wgsl"));
            if path.is_file() {
                tracing::info!("using shader override {}", path.display());
                return Self::load(path);
            }
        }
        Ok(Self::builtin(name, builtin))
    }

    pub fn is_builtin(&self) -> bool {
        self.path.is_none()
    }
}
