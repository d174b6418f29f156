use super::error::{ConversionIssue, Diagnostics};
use super::extract::{LeafUnit, extract_leaf_units};
use super::node::HtmlElement;
use super::stats::ImportStats;
use super::style::{Annotations, ImageParams, StyleSet};
use super::url_check::is_valid_url;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

// https://developers.notion.com/reference/request-limits
pub const TEXT_MAX_LENGTH: usize = 2000;
pub const URL_MAX_LENGTH: usize = 2000;
pub const EXPRESSION_MAX_LENGTH: usize = 1000;
pub const RICHTEXT_ARRAY_LENGTH: usize = 100;

/// The `type` tag of a text object. Header cells may relabel it with a column hint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TextType {
    #[default]
    Text,
    Files,
    Date,
    Email,
    Select,
}

impl TextType {
    pub fn from_column_hint(hint: &str) -> Option<Self> {
        match hint {
            "image" => Some(TextType::Files),
            "date" => Some(TextType::Date),
            "email" => Some(TextType::Email),
            "select" => Some(TextType::Select),
            _ => None,
        }
    }
}

/// A plain or linked run of text.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TextObject {
    pub kind: TextType,
    pub content: String,
    pub link: Option<String>,
    pub annotations: Annotations,
}

#[derive(Serialize)]
struct LinkRepr<'a> {
    url: &'a str,
}

#[derive(Serialize)]
struct TextContentRepr<'a> {
    content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<LinkRepr<'a>>,
}

#[derive(Serialize)]
struct TextObjectRepr<'a> {
    #[serde(rename = "type")]
    kind: TextType,
    plain_text: &'a str,
    text: TextContentRepr<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    href: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    annotations: Option<&'a Annotations>,
}

impl Serialize for TextObject {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let href = self.link.as_deref();
        TextObjectRepr {
            kind: self.kind,
            plain_text: &self.content,
            text: TextContentRepr {
                content: &self.content,
                link: href.map(|url| LinkRepr { url }),
            },
            href,
            annotations: Some(&self.annotations).filter(|a| !a.is_empty()),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExternalFile {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileUpload {
    pub id: String,
}

/// Where an image or file lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaSource {
    External { external: ExternalFile },
    FileUpload { file_upload: FileUpload },
}

impl MediaSource {
    pub fn external(url: impl Into<String>) -> Self {
        MediaSource::External {
            external: ExternalFile { url: url.into() },
        }
    }

    pub fn file_upload(id: impl Into<String>) -> Self {
        MediaSource::FileUpload {
            file_upload: FileUpload { id: id.into() },
        }
    }

    pub fn is_file_upload(&self) -> bool {
        matches!(self, MediaSource::FileUpload { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    File,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::File => "file",
        }
    }
}

/// An embedded image or file. Serializes as a standalone block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub source: MediaSource,
}

impl Serialize for Media {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("object", "block")?;
        map.serialize_entry("type", self.kind.as_str())?;
        map.serialize_entry(self.kind.as_str(), &self.source)?;
        map.end()
    }
}

/// A link to a destination database. Serializes as a standalone block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageLink {
    pub database_id: String,
}

#[derive(Serialize)]
struct PageLinkRepr<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    database_id: &'a str,
}

impl Serialize for PageLink {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("object", "block")?;
        map.serialize_entry("type", "link_to_page")?;
        map.serialize_entry(
            "link_to_page",
            &PageLinkRepr {
                kind: "database_id",
                database_id: &self.database_id,
            },
        )?;
        map.end()
    }
}

/// One entry of a `rich_text` array as produced from inline content.
///
/// Media and page links are block objects; block converters move them out of
/// `rich_text` where the destination schema does not allow them.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RichText {
    Text(TextObject),
    LinkToPage(PageLink),
    Media(Media),
}

impl RichText {
    pub fn is_block_object(&self) -> bool {
        !matches!(self, RichText::Text(_))
    }

    pub fn as_text(&self) -> Option<&TextObject> {
        match self {
            RichText::Text(text) => Some(text),
            _ => None,
        }
    }
}

pub(crate) fn chunk_chars(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut start = 0;

    for (count, (index, _)) in text.char_indices().enumerate() {
        if count > 0 && count % size == 0 {
            chunks.push(&text[start..index]);
            start = index;
        }
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

/// A plain text object, or `None` for empty content. Counts the text.
pub fn generate_text(
    content: &str,
    annotations: Annotations,
    stats: &mut dyn ImportStats,
) -> Option<TextObject> {
    if content.is_empty() {
        return None;
    }
    stats.add_text(content);
    Some(TextObject {
        content: content.to_string(),
        annotations,
        ..Default::default()
    })
}

/// A link object whose URL is cut to [`URL_MAX_LENGTH`], or `None` for empty content or an invalid URL.
pub fn generate_link(
    content: &str,
    href: &str,
    annotations: Annotations,
    stats: &mut dyn ImportStats,
) -> Option<TextObject> {
    if content.is_empty() || !is_valid_url(href) {
        return None;
    }
    stats.add_text(content);
    Some(TextObject {
        content: content.to_string(),
        link: Some(truncate_chars(href, URL_MAX_LENGTH).to_string()),
        annotations,
        ..Default::default()
    })
}

/// An image block, reclassified as a file when its MIME type is not `image/*`.
///
/// A file upload id wins over the external URL.
pub fn generate_image(
    params: &ImageParams,
    stats: &mut dyn ImportStats,
    diagnostics: &mut Diagnostics,
) -> Option<Media> {
    let source = match params.file_upload_id.as_deref() {
        Some(id) => MediaSource::file_upload(id),
        None if is_valid_url(&params.src) => MediaSource::external(params.src.as_str()),
        None => {
            if !params.src.is_empty() {
                diagnostics.report(ConversionIssue::InvalidImageSource {
                    src: params.src.clone(),
                });
            }
            return None;
        }
    };
    stats.add_image(&params.src);

    let kind = match params.mime_type.as_deref() {
        Some(mime) if !mime.is_empty() && !mime.starts_with("image/") => MediaKind::File,
        _ => MediaKind::Image,
    };

    Some(Media { kind, source })
}

fn push_chunked(
    rich_text: &mut Vec<RichText>,
    content: &str,
    href: Option<&str>,
    annotations: Annotations,
    stats: &mut dyn ImportStats,
) {
    for chunk in chunk_chars(content, TEXT_MAX_LENGTH) {
        let text = match href {
            Some(href) => generate_link(chunk, href, annotations, stats),
            None => generate_text(chunk, annotations, stats),
        };
        if let Some(text) = text {
            rich_text.push(RichText::Text(text));
        }
    }
}

/// Converts the leaves of `root` into rich-text objects, in document order.
pub fn generate_inline_objects(
    root: &HtmlElement,
    stats: &mut dyn ImportStats,
    diagnostics: &mut Diagnostics,
) -> Vec<RichText> {
    let mut rich_text = Vec::new();

    for leaf in extract_leaf_units(root) {
        match leaf {
            LeafUnit::LineBreak => {
                let Some(RichText::Text(previous)) = rich_text.last_mut() else {
                    continue;
                };
                if previous.content.chars().count() < TEXT_MAX_LENGTH {
                    previous.content.push('\n');
                } else {
                    let line_break = TextObject {
                        content: "\n".to_string(),
                        ..previous.clone()
                    };
                    stats.add_text(&line_break.content);
                    rich_text.push(RichText::Text(line_break));
                }
            }
            LeafUnit::Image { chain, .. } => {
                let style = StyleSet::from_chain(&chain, diagnostics);
                if let Some(media) = style
                    .image
                    .as_ref()
                    .and_then(|params| generate_image(params, stats, diagnostics))
                {
                    rich_text.push(RichText::Media(media));
                }
            }
            LeafUnit::Text { content, chain } => {
                let style = StyleSet::from_chain(&chain, diagnostics);
                let annotations = style.annotations;

                match style.link {
                    Some(link) if link.database_id.is_some() => {
                        stats.add_text(content);
                        rich_text.push(RichText::LinkToPage(PageLink {
                            database_id: link.database_id.unwrap_or_default(),
                        }));
                    }
                    Some(link) if is_valid_url(&link.href) => {
                        push_chunked(&mut rich_text, content, Some(&link.href), annotations, stats);
                    }
                    _ => push_chunked(&mut rich_text, content, None, annotations, stats),
                }
            }
        }
    }

    rich_text
}

fn is_mergeable(current: &TextObject, next: &TextObject) -> bool {
    current.kind == TextType::Text
        && next.kind == TextType::Text
        && current.link == next.link
        && current.annotations == next.annotations
        && current.content.chars().count() + next.content.chars().count() <= TEXT_MAX_LENGTH
}

/// Merges adjacent plain text objects that share annotations, keeping each under [`TEXT_MAX_LENGTH`].
///
/// Links only merge with links to the same URL. Media and page links break a run.
pub fn merge_rich_text(rich_text: Vec<RichText>) -> Vec<RichText> {
    let mut merged: Vec<RichText> = Vec::with_capacity(rich_text.len());

    for item in rich_text {
        if let (Some(RichText::Text(current)), RichText::Text(next)) = (merged.last_mut(), &item)
            && is_mergeable(current, next)
        {
            current.content.push_str(&next.content);
            continue;
        }
        merged.push(item);
    }

    merged
}
