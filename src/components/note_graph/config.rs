//! Tunables for layout, interaction and highlighting.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("min_zoom ({min}) must not exceed max_zoom ({max})")]
	InvertedZoom { min: f64, max: f64 },
	#[error("{field} must be a finite number greater than zero, got {value}")]
	NotPositive { field: &'static str, value: f64 },
	#[error("{field} must be a finite number, got {value}")]
	NotFinite { field: &'static str, value: f64 },
	#[error("{field} must lie in [0, 1], got {value}")]
	OutOfUnitRange { field: &'static str, value: f64 },
	#[error("recenter_zoom ({zoom}) lies outside [{min}, {max}]")]
	RecenterOutsideBounds { zoom: f64, min: f64, max: f64 },
	#[error("invalid graph config: {0}")]
	Parse(#[from] serde_json::Error),
}

/// Every field has a default, so a partial JSON document only overrides
/// what it names.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
	/// Pairwise charge; negative repels.
	pub charge_strength: f64,
	/// Spring rest length.
	pub link_distance: f64,
	pub link_strength: f64,
	pub center_strength: f64,
	/// Minimum centre-to-centre distance the collision force works toward.
	pub min_separation: f64,
	pub collision_strength: f64,
	/// Fraction of velocity lost each tick.
	pub velocity_decay: f64,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	/// Temperature held while a node is being dragged.
	pub alpha_drag: f64,
	pub min_zoom: f64,
	pub max_zoom: f64,
	pub wheel_zoom_step: f64,
	pub dimmed_opacity: f64,
	/// Window within which a second click counts as a double click.
	pub double_click_ms: f64,
	/// Max pointer travel in screen pixels for a press to count as a click.
	pub click_tolerance: f64,
	pub recenter_zoom: f64,
	pub transition_ms: f64,
	pub node_radius: f64,
	pub hit_radius: f64,
	pub seed: u64,
}

impl Default for GraphConfig {
	fn default() -> Self {
		Self {
			charge_strength: -2000.0,
			link_distance: 60.0,
			link_strength: 0.5,
			center_strength: 0.1,
			min_separation: 24.0,
			collision_strength: 0.7,
			velocity_decay: 0.4,
			// 1 - 0.001^(1/300): cools to alpha_min in about 300 ticks
			alpha_decay: 0.0228,
			alpha_min: 0.001,
			alpha_drag: 0.3,
			min_zoom: 0.1,
			max_zoom: 8.0,
			wheel_zoom_step: 1.1,
			dimmed_opacity: 0.15,
			double_click_ms: 250.0,
			click_tolerance: 4.0,
			recenter_zoom: 1.5,
			transition_ms: 600.0,
			node_radius: 6.0,
			hit_radius: 12.0,
			seed: 42,
		}
	}
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if value.is_finite() && value > 0.0 {
		Ok(())
	} else {
		Err(ConfigError::NotPositive { field, value })
	}
}

fn finite(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if value.is_finite() {
		Ok(())
	} else {
		Err(ConfigError::NotFinite { field, value })
	}
}

fn unit(field: &'static str, value: f64) -> Result<(), ConfigError> {
	if (0.0..=1.0).contains(&value) {
		Ok(())
	} else {
		Err(ConfigError::OutOfUnitRange { field, value })
	}
}

impl GraphConfig {
	/// Parse a (possibly partial) JSON document and validate the result.
	pub fn from_json(json: &str) -> Result<Self, ConfigError> {
		let config: GraphConfig = serde_json::from_str(json)?;
		config.validate()?;
		Ok(config)
	}

	/// Pick the config a host handed over: a JSON document wins over a typed
	/// value, and neither means the defaults. The result is validated.
	pub fn resolve(config: Option<GraphConfig>, json: Option<&str>) -> Result<Self, ConfigError> {
		match json {
			Some(json) => Self::from_json(json),
			None => {
				let config = config.unwrap_or_default();
				config.validate()?;
				Ok(config)
			}
		}
	}

	pub fn validate(&self) -> Result<(), ConfigError> {
		finite("charge_strength", self.charge_strength)?;
		positive("link_distance", self.link_distance)?;
		finite("link_strength", self.link_strength)?;
		finite("center_strength", self.center_strength)?;
		positive("min_separation", self.min_separation)?;
		unit("collision_strength", self.collision_strength)?;
		unit("velocity_decay", self.velocity_decay)?;
		unit("alpha_decay", self.alpha_decay)?;
		positive("alpha_min", self.alpha_min)?;
		unit("alpha_drag", self.alpha_drag)?;
		positive("min_zoom", self.min_zoom)?;
		positive("max_zoom", self.max_zoom)?;
		if self.min_zoom > self.max_zoom {
			return Err(ConfigError::InvertedZoom {
				min: self.min_zoom,
				max: self.max_zoom,
			});
		}
		positive("wheel_zoom_step", self.wheel_zoom_step)?;
		unit("dimmed_opacity", self.dimmed_opacity)?;
		positive("double_click_ms", self.double_click_ms)?;
		finite("click_tolerance", self.click_tolerance)?;
		positive("recenter_zoom", self.recenter_zoom)?;
		if !(self.min_zoom..=self.max_zoom).contains(&self.recenter_zoom) {
			return Err(ConfigError::RecenterOutsideBounds {
				zoom: self.recenter_zoom,
				min: self.min_zoom,
				max: self.max_zoom,
			});
		}
		positive("transition_ms", self.transition_ms)?;
		positive("node_radius", self.node_radius)?;
		positive("hit_radius", self.hit_radius)?;
		Ok(())
	}

	pub fn clamp_zoom(&self, k: f64) -> f64 {
		k.clamp(self.min_zoom, self.max_zoom)
	}
}
