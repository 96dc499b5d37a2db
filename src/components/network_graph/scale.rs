//! Zoom-dependent sizing for the network view.
//!
//! World-space values grow and shrink with zoom; screen-space values stay a
//! fixed number of pixels. Overlay labels are screen-space so traffic stays
//! readable when zoomed out on a large network.

/// How a visual property scales with zoom level `k`.
#[derive(Clone, Debug)]
pub enum ScaleBehavior {
	/// Constant world-space size.
	World,
	/// Constant screen-space size in pixels.
	Screen,
	/// World-space size, clamped to a screen-space range.
	Clamped { min_screen: f64, max_screen: f64 },
}

impl ScaleBehavior {
	/// World-space value to draw with, after the canvas transform.
	pub fn apply(&self, base: f64, k: f64) -> f64 {
		match self {
			ScaleBehavior::World => base,
			ScaleBehavior::Screen => base / k,
			ScaleBehavior::Clamped {
				min_screen,
				max_screen,
			} => base.clamp(min_screen / k, max_screen / k),
		}
	}
}

#[derive(Clone, Debug)]
pub struct NodeScaleConfig {
	pub radius: f64,
	pub radius_behavior: ScaleBehavior,
	pub hit_radius: f64,
	pub hit_behavior: ScaleBehavior,
	/// Label font size in screen pixels.
	pub label_size: f64,
	/// Below this zoom, labels stop shrinking.
	pub label_min_k: f64,
}

#[derive(Clone, Debug)]
pub struct LinkScaleConfig {
	/// Structural link width in screen pixels.
	pub line_width: f64,
	/// Overlay stroke width in screen pixels.
	pub overlay_width: f64,
	pub arrow_size: f64,
	pub arrow_behavior: ScaleBehavior,
	/// Overlay label font size in screen pixels.
	pub overlay_label_size: f64,
}

/// Complete scale configuration.
#[derive(Clone, Debug)]
pub struct ScaleConfig {
	pub node: NodeScaleConfig,
	pub link: LinkScaleConfig,
	/// World units per unit of the store's seed position.
	pub seed_scale: f64,
}

impl Default for ScaleConfig {
	fn default() -> Self {
		Self {
			node: NodeScaleConfig {
				radius: 8.0,
				radius_behavior: ScaleBehavior::Clamped {
					min_screen: 5.0,
					max_screen: f64::INFINITY,
				},
				hit_radius: 14.0,
				hit_behavior: ScaleBehavior::Clamped {
					min_screen: 6.0,
					max_screen: f64::INFINITY,
				},
				label_size: 12.0,
				label_min_k: 0.5,
			},
			link: LinkScaleConfig {
				line_width: 1.5,
				overlay_width: 2.0,
				arrow_size: 7.0,
				arrow_behavior: ScaleBehavior::Clamped {
					min_screen: 4.0,
					max_screen: 18.0,
				},
				overlay_label_size: 11.0,
			},
			seed_scale: 500.0,
		}
	}
}

/// Scale values resolved for one frame's zoom level. All world-space.
#[derive(Clone, Debug)]
pub struct ScaledValues {
	pub k: f64,
	pub node_radius: f64,
	pub hit_radius: f64,
	pub label_font: String,
	pub line_width: f64,
	pub overlay_width: f64,
	pub arrow_size: f64,
	pub overlay_font: String,
	/// Screen-pixel conversion factor, `1 / k`.
	pub px: f64,
}

impl ScaledValues {
	pub fn new(config: &ScaleConfig, k: f64) -> Self {
		let label_size = config.node.label_size / k.max(config.node.label_min_k);
		Self {
			k,
			node_radius: config.node.radius_behavior.apply(config.node.radius, k),
			hit_radius: config.node.hit_behavior.apply(config.node.hit_radius, k),
			label_font: format!("{label_size}px sans-serif"),
			line_width: ScaleBehavior::Screen.apply(config.link.line_width, k),
			overlay_width: ScaleBehavior::Screen.apply(config.link.overlay_width, k),
			arrow_size: config.link.arrow_behavior.apply(config.link.arrow_size, k),
			overlay_font: format!(
				"{}px sans-serif",
				ScaleBehavior::Screen.apply(config.link.overlay_label_size, k)
			),
			px: 1.0 / k,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn clamped_keeps_minimum_screen_size() {
		let behavior = ScaleBehavior::Clamped {
			min_screen: 5.0,
			max_screen: f64::INFINITY,
		};
		// At k = 0.1 a 8-unit radius would be 0.8px; clamped up to 5px.
		assert!((behavior.apply(8.0, 0.1) * 0.1 - 5.0).abs() < 1e-9);
		assert_eq!(behavior.apply(8.0, 2.0), 8.0);
		assert_eq!(ScaleBehavior::World.apply(8.0, 4.0), 8.0);
	}

	#[test]
	fn screen_values_counter_zoom() {
		let scaled = ScaledValues::new(&ScaleConfig::default(), 2.0);
		assert_eq!(scaled.line_width, 0.75);
		assert_eq!(scaled.px, 0.5);
		assert_eq!(scaled.overlay_font, "5.5px sans-serif");
	}
}
