//! Configuration for the tiling worker.
//!
//! `Config` carries two independent sections: the parameters handed to the
//! format codec when it converts raw data, and the default index options used
//! when a load request does not bring its own.
use geotiler_types::MAX_ZOOM;
use serde::de::Error;

/// Worker configuration
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Parameters for the format conversion step
    #[serde(default)]
    pub conversion: ConversionParams,

    /// Index options applied when a request carries none
    #[serde(default)]
    pub index: IndexOptions,
}

/// Parameters for converting raw data into the indexer's representation.
///
/// These are tuned separately from [`IndexOptions`]: the codec decides how much
/// detail survives conversion, the indexer decides how it is sliced into tiles.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConversionParams {
    /// Zoom level at which the conversion tolerance is measured
    #[serde(default = "ConversionParams::default_max_zoom")]
    pub max_zoom: u8,

    /// Simplification tolerance in tile units at `max_zoom`
    #[serde(default = "ConversionParams::default_tolerance")]
    pub tolerance: f64,

    /// Fixed-point resolution of one tile
    #[serde(default = "ConversionParams::default_extent")]
    pub extent: u32,
}

impl ConversionParams {
    const fn default_max_zoom() -> u8 {
        14
    }

    const fn default_tolerance() -> f64 {
        3.0
    }

    const fn default_extent() -> u32 {
        4096
    }

    /// Squared tolerance in projected units, as used for vertex importance.
    pub fn sq_tolerance(&self) -> f64 {
        let tiles = (1u64 << self.max_zoom.min(MAX_ZOOM)) as f64;
        let t = self.tolerance / (tiles * self.extent as f64);
        t * t
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_zoom > MAX_ZOOM {
            return Err(format!(
                "Conversion max zoom {} exceeds {}",
                self.max_zoom, MAX_ZOOM
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(format!(
                "Conversion tolerance must be finite and non-negative, got {}",
                self.tolerance
            ));
        }
        if self.extent == 0 {
            return Err("Conversion extent must be greater than zero".to_string());
        }
        Ok(())
    }
}

impl Default for ConversionParams {
    fn default() -> Self {
        Self {
            max_zoom: Self::default_max_zoom(),
            tolerance: Self::default_tolerance(),
            extent: Self::default_extent(),
        }
    }
}

/// Options controlling how the spatial index slices features into tiles.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IndexOptions {
    /// Deepest zoom served by the index
    #[serde(default = "IndexOptions::default_max_zoom")]
    pub max_zoom: u8,

    /// Deepest zoom whose tiles are sliced eagerly at build time
    #[serde(default = "IndexOptions::default_index_max_zoom")]
    pub index_max_zoom: u8,

    /// Tiles holding at most this many vertices are not split further at
    /// build time. `0` splits every non-empty tile down to `index_max_zoom`.
    #[serde(default = "IndexOptions::default_index_max_points")]
    pub index_max_points: usize,

    /// Simplification tolerance in tile units
    #[serde(default = "IndexOptions::default_tolerance")]
    pub tolerance: f64,

    /// Fixed-point resolution of one tile
    #[serde(default = "IndexOptions::default_extent")]
    pub extent: u32,

    /// Margin around each tile, in tile units, kept when clipping
    #[serde(default = "IndexOptions::default_buffer")]
    pub buffer: u32,

    /// Track each line part's position along its source line
    #[serde(default)]
    pub line_metrics: bool,

    /// Replace feature ids with their position in the collection
    #[serde(default)]
    pub generate_id: bool,

    /// Take feature ids from this property
    #[serde(default)]
    pub promote_id: Option<String>,
}

impl IndexOptions {
    const fn default_max_zoom() -> u8 {
        14
    }

    const fn default_index_max_zoom() -> u8 {
        5
    }

    const fn default_index_max_points() -> usize {
        100_000
    }

    const fn default_tolerance() -> f64 {
        3.0
    }

    const fn default_extent() -> u32 {
        4096
    }

    const fn default_buffer() -> u32 {
        64
    }

    pub fn with_max_zoom(mut self, max_zoom: u8) -> Self {
        self.max_zoom = max_zoom;
        self
    }

    pub fn with_index_max_zoom(mut self, index_max_zoom: u8) -> Self {
        self.index_max_zoom = index_max_zoom;
        self
    }

    pub fn with_index_max_points(mut self, index_max_points: usize) -> Self {
        self.index_max_points = index_max_points;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_extent(mut self, extent: u32) -> Self {
        self.extent = extent;
        self
    }

    pub fn with_buffer(mut self, buffer: u32) -> Self {
        self.buffer = buffer;
        self
    }

    pub fn with_line_metrics(mut self, line_metrics: bool) -> Self {
        self.line_metrics = line_metrics;
        self
    }

    pub fn with_generate_id(mut self, generate_id: bool) -> Self {
        self.generate_id = generate_id;
        self
    }

    pub fn with_promote_id(mut self, property: impl Into<String>) -> Self {
        self.promote_id = Some(property.into());
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.max_zoom > MAX_ZOOM {
            return Err(format!("Max zoom {} exceeds {}", self.max_zoom, MAX_ZOOM));
        }
        if self.index_max_zoom > self.max_zoom {
            return Err(format!(
                "Index max zoom {} exceeds max zoom {}",
                self.index_max_zoom, self.max_zoom
            ));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(format!(
                "Tolerance must be finite and non-negative, got {}",
                self.tolerance
            ));
        }
        if self.extent == 0 {
            return Err("Extent must be greater than zero".to_string());
        }
        if self.buffer > self.extent {
            return Err(format!(
                "Buffer {} exceeds tile extent {}",
                self.buffer, self.extent
            ));
        }
        Ok(())
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self {
            max_zoom: Self::default_max_zoom(),
            index_max_zoom: Self::default_index_max_zoom(),
            index_max_points: Self::default_index_max_points(),
            tolerance: Self::default_tolerance(),
            extent: Self::default_extent(),
            buffer: Self::default_buffer(),
            line_metrics: false,
            generate_id: false,
            promote_id: None,
        }
    }
}

impl Config {
    pub fn with_conversion(mut self, conversion: ConversionParams) -> Self {
        self.conversion = conversion;
        self
    }

    pub fn with_index(mut self, index: IndexOptions) -> Self {
        self.index = index;
        self
    }

    pub fn validate(&self) -> Result<(), String> {
        self.conversion.validate()?;
        self.index.validate()?;
        Ok(())
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let config: Config = serde_json::from_str(json)?;
        if let Err(e) = config.validate() {
            return Err(Error::custom(e));
        }
        Ok(config)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    #[cfg(feature = "toml")]
    pub fn from_toml(toml_str: &str) -> Result<Self, toml::de::Error> {
        let config: Config = toml::from_str(toml_str)?;
        if let Err(e) = config.validate() {
            return Err(toml::de::Error::custom(e));
        }
        Ok(config)
    }

    #[cfg(feature = "toml")]
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            conversion: ConversionParams::default(),
            index: IndexOptions::default(),
        }
    }
}
