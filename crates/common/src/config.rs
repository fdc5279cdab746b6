use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::Resolution;

/// Errors from loading a [`ShellConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Top-level shell configuration.
///
/// Every field has a default, so an empty YAML document (or no file at all)
/// yields the stock 800x600 window rendering `shaders/shader.{vs,fs}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub window: WindowConfig,
    pub shaders: ShaderPaths,
    pub camera: CameraConfig,
    /// Framebuffer clear color, RGBA.
    pub clear_color: [f32; 4],
    /// Optional cap, in seconds, on the delta time used for camera motion.
    /// `u_deltatime` always carries the real gap.
    pub max_frame_delta: Option<f32>,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            window: WindowConfig::default(),
            shaders: ShaderPaths::default(),
            camera: CameraConfig::default(),
            clear_color: [0.2, 0.3, 0.3, 1.0],
            max_frame_delta: None,
        }
    }
}

impl ShellConfig {
    /// Load a config from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_yaml_str(&text).map_err(|e| match e {
            ConfigError::Parse { source, .. } => ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            },
            other => other,
        })?;
        tracing::debug!(path = %path.display(), "loaded shell config");
        Ok(config)
    }

    /// Parse a config from YAML text. An empty document yields the defaults.
    pub fn from_yaml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(text).map_err(|source| ConfigError::Parse {
                path: PathBuf::new(),
                source,
            })?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "window size must be non-zero, got {}x{}",
                self.window.width, self.window.height
            )));
        }
        if let Some(cap) = self.max_frame_delta {
            let cap_ok = cap.is_finite() && cap > 0.0;
            if !cap_ok {
                return Err(ConfigError::Invalid(format!(
                    "max_frame_delta must be a positive finite number of seconds, got {cap}"
                )));
            }
        }
        let cam = &self.camera;
        let planes_ok = cam.near > 0.0 && cam.far > cam.near;
        if !planes_ok {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                cam.near, cam.far
            )));
        }
        let fov_ok = cam.fov_degrees > 0.0 && cam.fov_degrees < 180.0;
        if !fov_ok {
            return Err(ConfigError::Invalid(format!(
                "camera fov must be in (0, 180) degrees, got {}",
                cam.fov_degrees
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
}

impl WindowConfig {
    pub fn resolution(&self) -> Resolution {
        Resolution::new(self.width, self.height)
    }
}

impl Default for WindowConfig {
    fn default() -> Self {
        let size = Resolution::default();
        Self {
            title: "quadshade".into(),
            width: size.width,
            height: size.height,
        }
    }
}

/// Vertex and fragment source paths. Relative paths resolve against the
/// working directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderPaths {
    pub vertex: PathBuf,
    pub fragment: PathBuf,
}

impl Default for ShaderPaths {
    fn default() -> Self {
        Self {
            vertex: PathBuf::from("shaders/shader.vs"),
            fragment: PathBuf::from("shaders/shader.fs"),
        }
    }
}

/// Initial camera state and control tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    pub position: Vec3,
    pub yaw_degrees: f32,
    pub pitch_degrees: f32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Mouse-look sensitivity in degrees per pixel.
    pub sensitivity: f32,
    pub boost_multiplier: f32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 3.0),
            yaw_degrees: -90.0,
            pitch_degrees: 0.0,
            fov_degrees: 45.0,
            near: 0.1,
            far: 100.0,
            speed: 2.5,
            sensitivity: 0.1,
            boost_multiplier: 3.0,
        }
    }
}
