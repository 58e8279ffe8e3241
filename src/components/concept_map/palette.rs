pub const COMMUNITY_COLORS: &[&str] = &[
	"#4A90D9", "#D94A4A", "#4AD9A0", "#D9A04A", "#9B59B6", "#2ECC71", "#E67E22", "#1ABC9C",
	"#E74C3C", "#3498DB", "#F39C12", "#8E44AD",
];

pub const NEUTRAL_COLOR: &str = "#888";

/// Stable fill color for a community; total over all integers.
pub fn color_for(community_id: Option<i64>) -> &'static str {
	match community_id {
		None => NEUTRAL_COLOR,
		Some(id) => COMMUNITY_COLORS[id.rem_euclid(COMMUNITY_COLORS.len() as i64) as usize],
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn missing_community_is_neutral() {
		assert_eq!(color_for(None), NEUTRAL_COLOR);
	}

	#[test]
	fn palette_cycles_by_modulus() {
		assert_eq!(color_for(Some(0)), "#4A90D9");
		assert_eq!(color_for(Some(1)), "#D94A4A");
		assert_eq!(color_for(Some(12)), color_for(Some(0)));
		assert_eq!(color_for(Some(25)), color_for(Some(1)));
	}

	#[test]
	fn negative_ids_still_map_into_palette() {
		assert_eq!(color_for(Some(-1)), "#8E44AD");
		assert_eq!(color_for(Some(i64::MIN)), COMMUNITY_COLORS[(i64::MIN.rem_euclid(12)) as usize]);
	}
}
