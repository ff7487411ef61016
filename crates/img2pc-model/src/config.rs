//! Model configuration shared read-only by every block.
//!
//! `ModelConfig` is built once (defaults, TOML, or environment overrides) and
//! passed by reference to block constructors. Blocks copy the widths they need
//! at construction time and never hold on to the config itself.
//!
//! # Loading Configuration
//!
//! ```rust,ignore
//! use img2pc_model::ModelConfig;
//!
//! let config = ModelConfig::from_file("img2pc.toml")?.with_env_overrides();
//! config.validate()?;
//! ```
//!
//! # TOML Structure
//!
//! ```toml
//! adpt_num_blocks = 2
//! adpt_dim_hidden = 768
//! adpt_dim_intermediate = 1024
//!
//! gnrt_num_points = 1024
//! gnrt_num_blocks = 2
//! gnrt_dim_hidden = 48
//! gnrt_dim_intermediate = 48
//! ```
//!
//! Missing keys take their default. Loading never validates: constructors do,
//! so a block is either fully built from a conforming config or not built.

use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use img2pc_algebra::{BASIS_DIM, DEFAULT_NORM_EPS};

use crate::error::{ModelError, ModelResult};

/// Configuration for the image to point-cloud model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Number of vision encoder adaptor (gated FFN) blocks.
    pub adpt_num_blocks: usize,

    /// Adaptor input and output width. Tied to the vision encoder output and
    /// reshaped into 16-component multi-vectors, so it must be a multiple of 16.
    pub adpt_dim_hidden: usize,

    /// Width of the gated intermediate representation inside adaptor blocks.
    pub adpt_dim_intermediate: usize,

    /// Epsilon of the adaptor RMS norm.
    pub adpt_norm_eps: f64,

    /// Number of points in the generated point cloud.
    pub gnrt_num_points: usize,

    /// Number of point cloud generator blocks.
    pub gnrt_num_blocks: usize,

    /// Number of vision embedding tokens used as the prompt
    /// (a ViT-16x16 encoder yields at most 196 + 1).
    pub gnrt_num_prompt_tokens: usize,

    /// Multi-vector channels passed between generator blocks.
    pub gnrt_dim_hidden: usize,

    /// Channels fed to the geometric bilinear operations. Halved into left and
    /// right operands, so it must be even.
    pub gnrt_dim_intermediate: usize,

    /// Epsilon of the equivariant RMS norm.
    pub gnrt_norm_eps: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            adpt_num_blocks: 2,
            adpt_dim_hidden: 768,
            adpt_dim_intermediate: 1024,
            adpt_norm_eps: f32::EPSILON as f64,
            gnrt_num_points: 1024,
            gnrt_num_blocks: 2,
            gnrt_num_prompt_tokens: 197,
            gnrt_dim_hidden: 48,
            gnrt_dim_intermediate: 48,
            gnrt_norm_eps: DEFAULT_NORM_EPS,
        }
    }
}

fn config_error(message: String) -> ModelError {
    ModelError::ConfigError { message }
}

fn require_positive(name: &str, value: usize) -> ModelResult<()> {
    if value == 0 {
        return Err(config_error(format!("{} must be positive", name)));
    }
    Ok(())
}

fn require_eps(name: &str, value: f64) -> ModelResult<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(config_error(format!(
            "{} must be positive and finite, got {}",
            name, value
        )));
    }
    Ok(())
}

impl ModelConfig {
    /// Number of multi-vector channels produced by the adaptor reshape.
    pub fn adpt_multivector_channels(&self) -> usize {
        self.adpt_dim_hidden / BASIS_DIM
    }

    /// Checks what a single adaptor block needs: non-zero widths and a usable eps.
    pub fn validate_adaptor_block(&self) -> ModelResult<()> {
        require_positive("adpt_dim_hidden", self.adpt_dim_hidden)?;
        require_positive("adpt_dim_intermediate", self.adpt_dim_intermediate)?;
        require_eps("adpt_norm_eps", self.adpt_norm_eps)
    }

    /// Checks the adaptor stack, including the 16-wide multi-vector reshape.
    pub fn validate_adaptor(&self) -> ModelResult<()> {
        self.validate_adaptor_block()?;
        if self.adpt_dim_hidden % BASIS_DIM != 0 {
            return Err(config_error(format!(
                "adpt_dim_hidden must be a multiple of {}, got {}",
                BASIS_DIM, self.adpt_dim_hidden
            )));
        }
        Ok(())
    }

    /// Checks the generator widths used by the bilinear and MLP blocks.
    pub fn validate_generator(&self) -> ModelResult<()> {
        require_positive("gnrt_dim_hidden", self.gnrt_dim_hidden)?;
        require_positive("gnrt_dim_intermediate", self.gnrt_dim_intermediate)?;
        if self.gnrt_dim_intermediate % 2 != 0 {
            return Err(config_error(format!(
                "gnrt_dim_intermediate must be even, got {}",
                self.gnrt_dim_intermediate
            )));
        }
        require_eps("gnrt_norm_eps", self.gnrt_norm_eps)
    }

    /// Validates every invariant of the configuration.
    ///
    /// # Errors
    /// - `ModelError::ConfigError` naming the first violated field
    pub fn validate(&self) -> ModelResult<()> {
        self.validate_adaptor()?;
        self.validate_generator()?;
        require_positive("gnrt_num_points", self.gnrt_num_points)?;
        require_positive("gnrt_num_blocks", self.gnrt_num_blocks)?;
        require_positive("gnrt_num_prompt_tokens", self.gnrt_num_prompt_tokens)
    }

    /// Load configuration from a TOML file.
    ///
    /// # Errors
    /// - `ModelError::IoError` if the file cannot be read
    /// - `ModelError::ConfigError` if TOML parsing fails
    pub fn from_file(path: impl AsRef<Path>) -> ModelResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents).map_err(|e| {
            config_error(format!(
                "Failed to parse TOML in '{}': {}",
                path.display(),
                e
            ))
        })?;
        tracing::debug!("Loaded model config from {}", path.display());
        Ok(config)
    }

    /// Create configuration from a TOML string.
    pub fn from_toml_str(toml: &str) -> ModelResult<Self> {
        toml::from_str(toml).map_err(|e| config_error(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml_string(&self) -> ModelResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| config_error(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Apply `IMG2PC_*` environment overrides. Unparsable values are ignored.
    pub fn with_env_overrides(mut self) -> Self {
        let overrides: [(&str, &mut usize); 6] = [
            ("IMG2PC_ADPT_NUM_BLOCKS", &mut self.adpt_num_blocks),
            ("IMG2PC_ADPT_DIM_HIDDEN", &mut self.adpt_dim_hidden),
            ("IMG2PC_ADPT_DIM_INTERMEDIATE", &mut self.adpt_dim_intermediate),
            ("IMG2PC_GNRT_NUM_BLOCKS", &mut self.gnrt_num_blocks),
            ("IMG2PC_GNRT_DIM_HIDDEN", &mut self.gnrt_dim_hidden),
            ("IMG2PC_GNRT_DIM_INTERMEDIATE", &mut self.gnrt_dim_intermediate),
        ];
        for (key, slot) in overrides {
            if let Ok(val) = env::var(key) {
                match val.parse::<usize>() {
                    Ok(n) => *slot = n,
                    Err(_) => tracing::warn!("Ignoring unparsable {}={}", key, val),
                }
            }
        }
        self
    }
}
