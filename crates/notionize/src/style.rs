//! Inline style resolution.
//!
//! Every element on a leaf's ancestor chain contributes to one [`StyleSet`].
//! Flags only ever turn on while the chain is walked from the outermost
//! element to the innermost one; color and link/image parameters are
//! overwritten by inner elements.

use super::color::{Color, match_color};
use super::error::{ConversionIssue, Diagnostics};
use super::node::HtmlElement;
use rustc_hash::FxHashMap;
use serde::Serialize;

const BOLD_TAGS: &[&str] = &["b", "strong"];
const ITALIC_TAGS: &[&str] = &["i", "em"];
const STRIKETHROUGH_TAGS: &[&str] = &["s", "strike", "del"];
const UNDERLINE_TAG: &str = "u";
const CODE_TAG: &str = "code";
const MONOSPACE_FONTS: &[&str] = &["courier", "monospace"];

/// Parsed `style` attribute, one entry per `property: value` rule.
///
/// Rules are split on `;` and then on the first `:`. Property names and
/// values are trimmed and lower-cased. Rules without a colon are ignored. Values that themselves contain `;` (for example `url(data:...;base64,...)`)
/// are not supported and come out truncated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleDeclarations {
    rules: FxHashMap<String, String>,
}

impl StyleDeclarations {
    pub fn parse(style: &str) -> Self {
        let rules = style
            .split(';')
            .filter_map(|rule| {
                let (name, value) = rule.split_once(':')?;
                Some((name.trim().to_lowercase(), value.trim().to_lowercase()))
            })
            .collect();
        Self { rules }
    }

    pub fn of(element: &HtmlElement) -> Self {
        element.attr("style").map(Self::parse).unwrap_or_default()
    }

    pub fn get(&self, property: &str) -> Option<&str> {
        self.rules.get(property).map(String::as_str)
    }
}

/// Annotation flags of a rich-text object. Only flags that are set are serialized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub struct Annotations {
    #[serde(skip_serializing_if = "is_false")]
    pub bold: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub italic: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub strikethrough: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub underline: bool,
    #[serde(skip_serializing_if = "is_false")]
    pub code: bool,
    #[serde(skip_serializing_if = "is_default_color")]
    pub color: Color,
}

fn is_false(value: &bool) -> bool {
    !*value
}

fn is_default_color(color: &Color) -> bool {
    *color == Color::Default
}

impl Annotations {
    pub fn is_empty(&self) -> bool {
        *self == Annotations::default()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkTarget {
    pub href: String,
    /// Set when the anchor points at a destination database rather than a URL.
    pub database_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageParams {
    pub src: String,
    pub file_upload_id: Option<String>,
    pub mime_type: Option<String>,
}

/// Styles accumulated over one leaf's ancestor chain.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StyleSet {
    pub annotations: Annotations,
    pub link: Option<LinkTarget>,
    pub image: Option<ImageParams>,
}

pub fn is_bold(tag_name: &str, styles: &StyleDeclarations) -> bool {
    if BOLD_TAGS.contains(&tag_name) {
        return true;
    }
    match styles.get("font-weight") {
        Some("bold") => true,
        Some(weight) if !weight.is_empty() && weight.chars().all(|c| c.is_ascii_digit()) => {
            // All digits, so a failed parse means the weight overflowed.
            weight.parse::<u32>().ok().is_none_or(|w| w >= 700)
        }
        _ => false,
    }
}

pub fn is_italic(tag_name: &str, styles: &StyleDeclarations) -> bool {
    ITALIC_TAGS.contains(&tag_name)
        || styles
            .get("font-style")
            .is_some_and(|style| style.contains("italic"))
}

pub fn is_strikethrough(tag_name: &str, styles: &StyleDeclarations) -> bool {
    STRIKETHROUGH_TAGS.contains(&tag_name)
        || styles
            .get("text-decoration")
            .is_some_and(|decoration| decoration.contains("line-through"))
}

pub fn is_underline(tag_name: &str, styles: &StyleDeclarations) -> bool {
    tag_name == UNDERLINE_TAG
        || styles
            .get("text-decoration")
            .is_some_and(|decoration| decoration.contains("underline"))
}

pub fn is_code(tag_name: &str, styles: &StyleDeclarations) -> bool {
    if tag_name == CODE_TAG {
        return true;
    }
    // style="-en-code: true"
    if styles.get("-en-code") == Some("true") {
        return true;
    }
    styles.get("font-family").is_some_and(|family| {
        MONOSPACE_FONTS
            .iter()
            .any(|font| font.eq_ignore_ascii_case(family))
    })
}

/// Color from the `color` declaration, falling back to the legacy `color` attribute.
pub fn resolve_color(styles: &StyleDeclarations, element: &HtmlElement) -> Color {
    let color = styles
        .get("color")
        .filter(|c| !c.is_empty())
        .or_else(|| element.attr("color"));
    match_color(color)
}

impl StyleSet {
    pub fn from_chain(chain: &[&HtmlElement], diagnostics: &mut Diagnostics) -> Self {
        let mut style = StyleSet::default();
        for element in chain {
            style.apply(element, diagnostics);
        }
        style
    }

    pub fn apply(&mut self, element: &HtmlElement, diagnostics: &mut Diagnostics) {
        let tag_name = element.tag_name.as_str();
        let styles = StyleDeclarations::of(element);
        let annotations = &mut self.annotations;

        annotations.bold |= is_bold(tag_name, &styles);
        annotations.italic |= is_italic(tag_name, &styles);
        annotations.strikethrough |= is_strikethrough(tag_name, &styles);
        annotations.underline |= is_underline(tag_name, &styles);
        annotations.code |= is_code(tag_name, &styles);

        let color = resolve_color(&styles, element);
        if color != Color::Default {
            annotations.color = color;
        }

        match tag_name {
            "a" => {
                let href = element.attr("href").unwrap_or_default();
                if href.is_empty() {
                    diagnostics.report(ConversionIssue::EmptyHref);
                }
                self.link = Some(LinkTarget {
                    href: href.to_string(),
                    database_id: element.non_empty_attr("data-database-id").map(str::to_string),
                });
            }
            "img" => {
                let src = element.attr("src").unwrap_or_default();
                if src.is_empty() {
                    diagnostics.report(ConversionIssue::EmptyImageSource);
                }
                let mime_type = element
                    .non_empty_attr("data-coda-mime-type")
                    .or_else(|| element.non_empty_attr("data-notion-file-mime-type"));
                self.image = Some(ImageParams {
                    src: src.to_string(),
                    file_upload_id: element
                        .non_empty_attr("data-notion-file-upload-id")
                        .map(str::to_string),
                    mime_type: mime_type.map(str::to_string),
                });
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::test_helpers::*;
    use rstest::rstest;

    #[rstest]
    #[case("color: Red; font-weight:700", &[("color", "red"), ("font-weight", "700")])]
    #[case("broken; font-style : ITALIC ;", &[("font-style", "italic")])]
    #[case("FONT-WEIGHT: Bold; Color: #FFF", &[("font-weight", "bold"), ("color", "#fff")])]
    #[case("background: url(http://x/y.png)", &[("background", "url(http://x/y.png)")])]
    fn test_parse_declarations(#[case] style: &str, #[case] expected: &[(&str, &str)]) {
        let declarations = StyleDeclarations::parse(style);
        for (name, value) in expected {
            assert_eq!(declarations.get(name), Some(*value));
        }
        assert_eq!(declarations.rules.len(), expected.len());
    }

    #[rstest]
    #[case::tag("b", "", true)]
    #[case::strong("strong", "", true)]
    #[case::keyword("span", "font-weight: bold", true)]
    #[case::numeric("span", "font-weight: 700", true)]
    #[case::light("span", "font-weight: 400", false)]
    #[case::bolder("span", "font-weight: bolder", false)]
    #[case::overflowing_weight("span", "font-weight: 99999999999", true)]
    fn test_is_bold(#[case] tag: &str, #[case] style: &str, #[case] expected: bool) {
        assert_eq!(is_bold(tag, &StyleDeclarations::parse(style)), expected);
    }

    #[rstest]
    #[case::tag("code", "", true)]
    #[case::evernote("div", "-en-code: true", true)]
    #[case::courier("span", "font-family: Courier", true)]
    #[case::font_list("span", "font-family: monospace, serif", false)]
    #[case::plain("span", "", false)]
    fn test_is_code(#[case] tag: &str, #[case] style: &str, #[case] expected: bool) {
        assert_eq!(is_code(tag, &StyleDeclarations::parse(style)), expected);
    }

    #[test]
    fn test_decorations() {
        let styles = StyleDeclarations::parse("text-decoration: underline line-through; font-style: italic");
        assert!(is_underline("span", &styles));
        assert!(is_strikethrough("span", &styles));
        assert!(is_italic("span", &styles));
        assert!(is_strikethrough("del", &StyleDeclarations::default()));
        assert!(!is_underline("ins", &StyleDeclarations::default()));
    }

    #[test]
    fn test_chain_accumulates_flags() {
        let b = element("b", vec![]);
        let u = element("u", vec![]);
        let mut diagnostics = Diagnostics::new();
        let style = StyleSet::from_chain(&[&b, &u], &mut diagnostics);

        assert!(style.annotations.bold);
        assert!(style.annotations.underline);
        assert!(!style.annotations.italic);
        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_color_from_style_then_attribute() {
        let font = element_with_attrs("font", &[("color", "#ff2600")], vec![]);
        let span = element_with_attrs("span", &[("style", "color: rgb(0, 0, 250)")], vec![]);
        let mut diagnostics = Diagnostics::new();

        let style = StyleSet::from_chain(&[&font], &mut diagnostics);
        assert_eq!(style.annotations.color, Color::Red);

        let style = StyleSet::from_chain(&[&font, &span], &mut diagnostics);
        assert_eq!(style.annotations.color, Color::Blue);
    }

    #[test]
    fn test_anchor_and_image_params() {
        let a = element_with_attrs("a", &[("href", "https://example.com"), ("data-database-id", "db-1")], vec![]);
        let img = element_with_attrs(
            "img",
            &[("src", "https://example.com/a.pdf"), ("data-notion-file-mime-type", "application/pdf")],
            vec![],
        );
        let mut diagnostics = Diagnostics::new();
        let style = StyleSet::from_chain(&[&a, &img], &mut diagnostics);

        assert_eq!(
            style.link,
            Some(LinkTarget {
                href: "https://example.com".to_string(),
                database_id: Some("db-1".to_string()),
            })
        );
        let image = style.image.unwrap();
        assert_eq!(image.mime_type.as_deref(), Some("application/pdf"));
        assert_eq!(image.file_upload_id, None);
    }

    #[test]
    fn test_missing_href_is_reported() {
        let a = element("a", vec![]);
        let mut diagnostics = Diagnostics::new();
        let style = StyleSet::from_chain(&[&a], &mut diagnostics);

        assert_eq!(style.link.unwrap().href, "");
        assert_eq!(diagnostics.issues(), &[ConversionIssue::EmptyHref]);
    }
}
