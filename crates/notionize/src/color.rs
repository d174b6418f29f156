use regex_lite::Regex;
use serde::Serialize;
use std::fmt::{self, Display};
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").expect("valid hex color pattern"));
static DIGITS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+").expect("valid digit pattern"));

/// Text and option colors understood by the destination schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    #[default]
    Default,
    Gray,
    Brown,
    Orange,
    Yellow,
    Green,
    Blue,
    Purple,
    Pink,
    Red,
}

impl Color {
    pub fn as_str(&self) -> &'static str {
        match self {
            Color::Default => "default",
            Color::Gray => "gray",
            Color::Brown => "brown",
            Color::Orange => "orange",
            Color::Yellow => "yellow",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Pink => "pink",
            Color::Red => "red",
        }
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Reference RGB values for nearest-color matching, in tie-breaking order.
const PALETTE: [(Color, (u8, u8, u8)); 10] = [
    (Color::Default, (0, 0, 0)),
    (Color::Gray, (128, 128, 128)),
    (Color::Brown, (165, 42, 42)),
    (Color::Orange, (255, 165, 0)),
    (Color::Yellow, (255, 255, 0)),
    (Color::Green, (0, 128, 0)),
    (Color::Blue, (0, 0, 255)),
    (Color::Purple, (128, 0, 128)),
    (Color::Pink, (255, 192, 203)),
    (Color::Red, (255, 0, 0)),
];

/// Option colors assigned round-robin to select options.
pub const OPTION_COLORS: [Color; 11] = [
    Color::Pink,
    Color::Purple,
    Color::Red,
    Color::Yellow,
    Color::Green,
    Color::Orange,
    Color::Blue,
    Color::Brown,
    Color::Green,
    Color::Default,
    Color::Gray,
];

pub fn option_color(index: usize) -> Color {
    OPTION_COLORS[index % OPTION_COLORS.len()]
}

/// Nearest palette color by Euclidean distance; the first minimum wins.
pub fn closest_color(r: u8, g: u8, b: u8) -> Color {
    let mut closest = Color::Default;
    let mut closest_distance = i32::MAX;

    for (color, (pr, pg, pb)) in PALETTE {
        // Squared distance orders the same as the Euclidean one.
        let distance = [(r, pr), (g, pg), (b, pb)]
            .into_iter()
            .map(|(c, p)| (i32::from(c) - i32::from(p)).pow(2))
            .sum::<i32>();
        if distance < closest_distance {
            closest_distance = distance;
            closest = color;
        }
    }

    closest
}

fn hex_to_rgb(hex: &str) -> Option<(u8, u8, u8)> {
    let digits = hex.trim_start_matches('#');
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    let channel = |i: usize| u8::from_str_radix(expanded.get(i..i + 2)?, 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

/// Maps a CSS `rgb()`/`rgba()` or 3/6-digit hex color to the palette.
///
/// Anything else, including named colors, resolves to [`Color::Default`].
pub fn match_color(value: Option<&str>) -> Color {
    let Some(value) = value.map(str::trim).filter(|v| !v.is_empty()) else {
        return Color::Default;
    };

    if value.starts_with("rgb") {
        // Out-of-range channels clamp to 255 like CSS does.
        let channels: Vec<u8> = DIGITS
            .find_iter(value)
            .map(|m| m.as_str().parse::<u8>().unwrap_or(u8::MAX))
            .take(3)
            .collect();
        if let [r, g, b] = channels[..] {
            return closest_color(r, g, b);
        }
    } else if HEX_COLOR.is_match(value) {
        if let Some((r, g, b)) = hex_to_rgb(value) {
            return closest_color(r, g, b);
        }
    }

    Color::Default
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::black("rgb(0, 0, 0)", Color::Default)]
    #[case::red("rgb(255,0,0)", Color::Red)]
    #[case::rgba_ignores_alpha("rgba(250, 5, 5, 0.2)", Color::Red)]
    #[case::blue_hex("#0000ff", Color::Blue)]
    #[case::short_hex("#f00", Color::Red)]
    #[case::upper_hex("#FFC0CB", Color::Pink)]
    #[case::gray("rgb(120, 130, 125)", Color::Gray)]
    #[case::font_red("#ff2600", Color::Red)]
    #[case::named("red", Color::Default)]
    #[case::bad_hex("#12345", Color::Default)]
    #[case::too_few_channels("rgb(1, 2)", Color::Default)]
    #[case::clamped_channel("rgb(4000000000, 0, 0)", Color::Red)]
    #[case::huge_channels("rgb(99999999999999999999999, 99999999999999999999999, 0)", Color::Yellow)]
    fn test_match_color(#[case] input: &str, #[case] expected: Color) {
        assert_eq!(match_color(Some(input)), expected);
    }

    #[test]
    fn test_match_color_absent() {
        assert_eq!(match_color(None), Color::Default);
        assert_eq!(match_color(Some("  ")), Color::Default);
    }

    #[test]
    fn test_closest_color_prefers_first_on_tie() {
        // 4096 from both default (0,0,0) and green (0,128,0).
        assert_eq!(closest_color(0, 64, 0), Color::Default);
    }

    #[test]
    fn test_closest_color_mid_gray_is_brown() {
        // brown 11169, default/gray/green/purple 12288.
        assert_eq!(closest_color(64, 64, 64), Color::Brown);
    }

    #[test]
    fn test_every_palette_entry_matches_itself() {
        for (color, (r, g, b)) in PALETTE {
            assert_eq!(closest_color(r, g, b), color);
        }
    }

    #[rstest]
    #[case(0, Color::Pink)]
    #[case(1, Color::Purple)]
    #[case(10, Color::Gray)]
    #[case(11, Color::Pink)]
    fn test_option_color_round_robin(#[case] index: usize, #[case] expected: Color) {
        assert_eq!(option_color(index), expected);
    }
}
