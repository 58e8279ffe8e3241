use log::warn;
use serde::Deserialize;

use super::error::{ConceptMapError, Result};

/// Tunables for the explorer. Every field has a default, so a host may pass a
/// partial JSON object.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ConceptMapConfig {
	pub layout: LayoutConfig,
	pub zoom: ZoomConfig,
	pub expansion: ExpansionConfig,
}

impl ConceptMapConfig {
	/// Parse a host-supplied config. Out-of-range sections fall back to defaults.
	pub fn from_json(raw: &str) -> serde_json::Result<Self> {
		serde_json::from_str::<Self>(raw).map(Self::sanitized)
	}

	/// Replace every section that fails validation with its defaults.
	pub fn sanitized(mut self) -> Self {
		if let Err(err) = self.layout.validate() {
			warn!("{err}; using default layout settings");
			self.layout = LayoutConfig::default();
		}
		if let Err(err) = self.zoom.validate() {
			warn!("{err}; using default zoom settings");
			self.zoom = ZoomConfig::default();
		}
		self
	}
}

fn check(ok: bool, what: &str) -> Result<()> {
	if ok {
		Ok(())
	} else {
		Err(ConceptMapError::InvalidConfig(what.into()))
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
	pub charge_strength: f64,
	pub link_distance: f64,
	pub link_weight_offset: f64,
	pub min_link_distance: f64,
	pub collide_margin: f64,
	pub merge_alpha: f64,
	pub alpha_decay: f64,
	pub alpha_min: f64,
	pub velocity_decay: f64,
	pub drag_alpha_target: f64,
	pub spawn_radius: f64,
	pub spawn_jitter: f64,
}

impl Default for LayoutConfig {
	fn default() -> Self {
		Self {
			charge_strength: -200.0,
			link_distance: 120.0,
			link_weight_offset: 0.1,
			min_link_distance: 40.0,
			collide_margin: 4.0,
			merge_alpha: 0.5,
			alpha_decay: 0.02,
			alpha_min: 0.001,
			velocity_decay: 0.4,
			drag_alpha_target: 0.3,
			spawn_radius: 60.0,
			spawn_jitter: 60.0,
		}
	}
}

impl LayoutConfig {
	pub fn validate(&self) -> Result<()> {
		let unit = |v: f64| v.is_finite() && (0.0..=1.0).contains(&v);
		check(self.charge_strength.is_finite(), "layout.charge_strength must be finite")?;
		check(
			self.link_distance.is_finite() && self.link_distance > 0.0,
			"layout.link_distance must be positive",
		)?;
		check(
			self.link_weight_offset.is_finite() && self.link_weight_offset > 0.0,
			"layout.link_weight_offset must be positive",
		)?;
		check(
			self.min_link_distance.is_finite() && self.min_link_distance >= 0.0,
			"layout.min_link_distance must be non-negative",
		)?;
		check(
			self.collide_margin.is_finite() && self.collide_margin >= 0.0,
			"layout.collide_margin must be non-negative",
		)?;
		check(
			self.alpha_min > 0.0 && self.alpha_min < 1.0,
			"layout.alpha_min must be in (0, 1)",
		)?;
		check(
			self.alpha_decay > 0.0 && self.alpha_decay <= 1.0,
			"layout.alpha_decay must be in (0, 1]",
		)?;
		check(
			self.velocity_decay >= 0.0 && self.velocity_decay < 1.0,
			"layout.velocity_decay must be in [0, 1)",
		)?;
		check(unit(self.merge_alpha), "layout.merge_alpha must be in [0, 1]")?;
		check(
			unit(self.drag_alpha_target),
			"layout.drag_alpha_target must be in [0, 1]",
		)?;
		check(
			self.spawn_radius.is_finite()
				&& self.spawn_radius >= 0.0
				&& self.spawn_jitter.is_finite()
				&& self.spawn_jitter >= 0.0,
			"layout.spawn_radius and spawn_jitter must be non-negative",
		)
	}

	/// Rest length of an edge; heavier edges are shorter, down to the floor.
	pub fn link_distance_for(&self, weight: f64) -> f64 {
		let weight = if weight.is_finite() { weight.max(0.0) } else { 1.0 };
		(self.link_distance / (weight + self.link_weight_offset)).max(self.min_link_distance)
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomConfig {
	pub min_scale: f64,
	pub max_scale: f64,
	pub wheel_factor: f64,
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			min_scale: 0.1,
			max_scale: 8.0,
			wheel_factor: 1.1,
		}
	}
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
	pub tool_name: String,
	pub depth: u32,
	pub max_entities: u32,
	pub include_content: bool,
	pub queue_capacity: usize,
}

impl Default for ExpansionConfig {
	fn default() -> Self {
		Self {
			tool_name: "BuildContext".into(),
			depth: 1,
			max_entities: 15,
			include_content: false,
			queue_capacity: 32,
		}
	}
}

impl ZoomConfig {
	pub fn validate(&self) -> Result<()> {
		check(
			self.min_scale.is_finite() && self.min_scale > 0.0,
			"zoom.min_scale must be positive",
		)?;
		check(
			self.max_scale.is_finite() && self.max_scale >= self.min_scale,
			"zoom.max_scale must not be below min_scale",
		)?;
		check(
			self.wheel_factor.is_finite() && self.wheel_factor > 1.0,
			"zoom.wheel_factor must be greater than 1",
		)
	}
}

impl ExpansionConfig {
	pub fn bounded_depth(&self) -> u32 {
		self.depth.clamp(1, 3)
	}

	pub fn bounded_max_entities(&self) -> u32 {
		self.max_entities.clamp(1, 100)
	}
}

#[cfg(test)]
mod tests {
	use pretty_assertions::assert_eq;

	use super::*;

	#[test]
	fn partial_json_keeps_defaults() {
		let config = ConceptMapConfig::from_json(r#"{"zoom": {"max_scale": 4.0}}"#).unwrap();
		assert_eq!(config.zoom.max_scale, 4.0);
		assert_eq!(config.zoom.min_scale, 0.1);
		assert_eq!(config.layout, LayoutConfig::default());
		assert_eq!(config.expansion, ExpansionConfig::default());
	}

	#[test]
	fn link_distance_has_a_floor() {
		let layout = LayoutConfig::default();
		assert!((layout.link_distance_for(0.5) - 200.0).abs() < 1e-9);
		assert_eq!(layout.link_distance_for(10.0), 40.0);
		assert!((layout.link_distance_for(f64::NAN) - 120.0 / 1.1).abs() < 1e-9);
		assert!(layout.link_distance_for(0.0) > layout.link_distance_for(0.8));
	}

	#[test]
	fn expansion_bounds_are_clamped() {
		let expansion = ExpansionConfig {
			depth: 9,
			max_entities: 0,
			..ExpansionConfig::default()
		};
		assert_eq!(expansion.bounded_depth(), 3);
		assert_eq!(expansion.bounded_max_entities(), 1);
	}

	#[test]
	fn defaults_are_valid() {
		assert!(LayoutConfig::default().validate().is_ok());
		assert!(ZoomConfig::default().validate().is_ok());
	}

	#[test]
	fn out_of_range_zoom_falls_back_to_defaults() {
		for raw in [
			r#"{"zoom": {"min_scale": 4.0, "max_scale": 2.0}}"#,
			r#"{"zoom": {"min_scale": 0.0}}"#,
			r#"{"zoom": {"min_scale": -1.0}}"#,
			r#"{"zoom": {"wheel_factor": 1.0}}"#,
			r#"{"zoom": {"wheel_factor": 0.5}}"#,
		] {
			let config = ConceptMapConfig::from_json(raw).unwrap();
			assert_eq!(config.zoom, ZoomConfig::default(), "{raw}");
		}
	}

	#[test]
	fn out_of_range_layout_falls_back_to_defaults() {
		for raw in [
			r#"{"layout": {"alpha_min": 0.0}}"#,
			r#"{"layout": {"alpha_min": -0.5}}"#,
			r#"{"layout": {"alpha_decay": 0.0}}"#,
			r#"{"layout": {"alpha_decay": 1.5}}"#,
			r#"{"layout": {"velocity_decay": 1.0}}"#,
			r#"{"layout": {"velocity_decay": -0.1}}"#,
			r#"{"layout": {"link_weight_offset": 0.0}}"#,
		] {
			let config = ConceptMapConfig::from_json(raw).unwrap();
			assert_eq!(config.layout, LayoutConfig::default(), "{raw}");
		}
	}

	#[test]
	fn sanitizing_keeps_valid_sections() {
		let config = ConceptMapConfig::from_json(
			r#"{"layout": {"alpha_min": 0.0}, "zoom": {"max_scale": 4.0}}"#,
		)
		.unwrap();
		assert_eq!(config.layout, LayoutConfig::default());
		assert_eq!(config.zoom.max_scale, 4.0);
	}

	#[test]
	fn boundary_values_are_accepted() {
		let layout = LayoutConfig {
			alpha_decay: 1.0,
			velocity_decay: 0.0,
			..LayoutConfig::default()
		};
		assert!(layout.validate().is_ok());
		let zoom = ZoomConfig {
			min_scale: 2.0,
			max_scale: 2.0,
			..ZoomConfig::default()
		};
		assert!(zoom.validate().is_ok());
	}
}
