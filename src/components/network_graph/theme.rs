//! Visual theming for the network view.
//!
//! Overlay hues live here rather than in the sync engine: the engine only
//! tags an overlay as chat, presence or raw, and the theme decides what
//! that looks like.

use crate::sync::format::OverlayColor;

/// RGBA color representation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
	pub r: u8,
	pub g: u8,
	pub b: u8,
	pub a: f64,
}

impl Color {
	pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
		Self { r, g, b, a: 1.0 }
	}

	pub const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Self {
		Self { r, g, b, a }
	}

	/// Blend towards white (0.0 = unchanged, 1.0 = white)
	pub fn lighten(self, factor: f64) -> Self {
		let f = factor.clamp(0.0, 1.0);
		let up = |c: u8| (c as f64 + (255.0 - c as f64) * f) as u8;
		Self {
			r: up(self.r),
			g: up(self.g),
			b: up(self.b),
			a: self.a,
		}
	}

	/// Blend towards black (0.0 = unchanged, 1.0 = black)
	pub fn darken(self, factor: f64) -> Self {
		let f = 1.0 - factor.clamp(0.0, 1.0);
		let down = |c: u8| (c as f64 * f) as u8;
		Self {
			r: down(self.r),
			g: down(self.g),
			b: down(self.b),
			a: self.a,
		}
	}

	pub fn to_css(self) -> String {
		if (self.a - 1.0).abs() < 0.001 {
			format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
		} else {
			format!("rgba({}, {}, {}, {})", self.r, self.g, self.b, self.a)
		}
	}
}

/// Peer colors, picked by a stable hash of the peer id so a peer keeps its
/// color across layout rebuilds.
#[derive(Clone, Debug)]
pub struct PeerPalette {
	pub colors: Vec<Color>,
}

impl PeerPalette {
	/// Muted slate blues and teals
	pub fn slate() -> Self {
		Self {
			colors: vec![
				Color::rgb(94, 129, 172),
				Color::rgb(129, 161, 193),
				Color::rgb(100, 148, 160),
				Color::rgb(136, 160, 175),
				Color::rgb(108, 142, 173),
				Color::rgb(119, 158, 165),
				Color::rgb(143, 163, 180),
				Color::rgb(122, 153, 168),
			],
		}
	}

	pub fn for_key(&self, key: &str) -> Color {
		let hash = key
			.bytes()
			.fold(2166136261u32, |h, b| (h ^ u32::from(b)).wrapping_mul(16777619));
		self.colors[hash as usize % self.colors.len()]
	}
}

#[derive(Clone, Debug)]
pub struct BackgroundStyle {
	pub color: Color,
	/// Center color of the radial gradient
	pub color_secondary: Color,
	pub use_gradient: bool,
}

/// Structural link style.
#[derive(Clone, Debug)]
pub struct LinkStyle {
	pub color: Color,
	/// Color of links touching the hovered peer
	pub highlight_color: Color,
	/// Color of the rubber band drawn while dragging out a new link
	pub draft_color: Color,
}

#[derive(Clone, Debug)]
pub struct NodeStyle {
	pub use_gradient: bool,
	pub label_color: Color,
	pub hover_ring_color: Color,
}

/// Broadcast overlay style.
#[derive(Clone, Debug)]
pub struct OverlayStyle {
	pub chat: Color,
	pub presence: Color,
	pub raw: Color,
	/// Bend applied per overlay sharing a pair, so stacked overlays fan out
	pub spread: f64,
}

impl OverlayStyle {
	pub fn color(&self, tag: OverlayColor) -> Color {
		match tag {
			OverlayColor::Chat => self.chat,
			OverlayColor::Presence => self.presence,
			OverlayColor::Raw => self.raw,
		}
	}
}

/// Complete visual theme.
#[derive(Clone, Debug)]
pub struct Theme {
	pub background: BackgroundStyle,
	pub link: LinkStyle,
	pub node: NodeStyle,
	pub overlay: OverlayStyle,
	pub palette: PeerPalette,
}

impl Theme {
	/// Dark slate theme (default)
	pub fn default_theme() -> Self {
		Self {
			background: BackgroundStyle {
				color: Color::rgb(22, 27, 34),
				color_secondary: Color::rgb(30, 35, 42),
				use_gradient: true,
			},
			link: LinkStyle {
				color: Color::rgba(140, 160, 180, 0.5),
				highlight_color: Color::rgba(200, 215, 230, 0.9),
				draft_color: Color::rgba(255, 255, 255, 0.6),
			},
			node: NodeStyle {
				use_gradient: true,
				label_color: Color::rgba(255, 255, 255, 0.85),
				hover_ring_color: Color::rgba(255, 255, 255, 0.8),
			},
			overlay: OverlayStyle {
				chat: Color::rgb(102, 187, 106),
				presence: Color::rgb(255, 213, 79),
				raw: Color::rgb(186, 104, 200),
				spread: 0.25,
			},
			palette: PeerPalette::slate(),
		}
	}
}

impl Default for Theme {
	fn default() -> Self {
		Self::default_theme()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn overlay_tags_map_to_distinct_colors() {
		let style = Theme::default().overlay;
		let chat = style.color(OverlayColor::Chat);
		let presence = style.color(OverlayColor::Presence);
		let raw = style.color(OverlayColor::Raw);
		assert_ne!(chat, presence);
		assert_ne!(presence, raw);
		assert_ne!(chat, raw);
	}

	#[test]
	fn peer_color_is_stable() {
		let palette = PeerPalette::slate();
		assert_eq!(palette.for_key("u1"), palette.for_key("u1"));
	}

	#[test]
	fn css_output() {
		assert_eq!(Color::rgb(255, 0, 16).to_css(), "#ff0010");
		assert_eq!(Color::rgba(1, 2, 3, 0.5).to_css(), "rgba(1, 2, 3, 0.5)");
	}
}
