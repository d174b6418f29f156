use super::rich_text::{Media, PageLink, RICHTEXT_ARRAY_LENGTH, RichText};
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    One,
    Two,
    Three,
}

impl HeadingLevel {
    /// `h1` and `h2` keep their level; everything else is level three.
    pub fn from_tag(tag_name: &str) -> Self {
        match tag_name {
            "h1" => HeadingLevel::One,
            "h2" => HeadingLevel::Two,
            _ => HeadingLevel::Three,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListKind {
    Bulleted,
    Numbered,
}

impl ListKind {
    pub fn from_tag(tag_name: &str) -> Option<Self> {
        match tag_name {
            "ul" => Some(ListKind::Bulleted),
            "ol" => Some(ListKind::Numbered),
            _ => None,
        }
    }

    pub fn block_type(&self) -> &'static str {
        match self {
            ListKind::Bulleted => "bulleted_list_item",
            ListKind::Numbered => "numbered_list_item",
        }
    }
}

/// Payload of every block that carries a `rich_text` array.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RichTextBody {
    pub rich_text: Vec<RichText>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<Block>>,
}

impl RichTextBody {
    pub fn new(rich_text: Vec<RichText>) -> Self {
        Self {
            rich_text,
            children: None,
        }
    }

    pub fn push_child(&mut self, block: Block) {
        self.children.get_or_insert_with(Vec::new).push(block);
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CodeBody {
    pub rich_text: Vec<RichText>,
    pub language: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EquationBody {
    pub expression: String,
}

/// Files pulled out of a table cell; always placed first in the cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FilesGroup {
    #[serde(rename = "type")]
    kind: &'static str,
    pub files: Vec<Media>,
}

impl FilesGroup {
    pub fn new(files: Vec<Media>) -> Self {
        Self {
            kind: "files",
            files,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellItem {
    Files(FilesGroup),
    RichText(RichText),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TableRow {
    pub cells: Vec<Vec<CellItem>>,
}

impl Serialize for TableRowBlock<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(2))?;
        map.serialize_entry("type", "table_row")?;
        map.serialize_entry("table_row", self.0)?;
        map.end()
    }
}

struct TableRowBlock<'a>(&'a TableRow);

#[derive(Debug, Clone, PartialEq)]
pub struct TableBody {
    pub has_row_header: bool,
    pub has_column_header: bool,
    pub table_width: usize,
    pub rows: Vec<TableRow>,
    pub caption: Option<String>,
}

#[derive(Serialize)]
struct TableBodyRepr<'a> {
    has_row_header: bool,
    has_column_header: bool,
    table_width: usize,
    children: Vec<TableRowBlock<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
}

impl Serialize for TableBody {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        TableBodyRepr {
            has_row_header: self.has_row_header,
            has_column_header: self.has_column_header,
            table_width: self.table_width,
            children: self.rows.iter().map(TableRowBlock).collect(),
            caption: self.caption.as_deref(),
        }
        .serialize(serializer)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Empty {}

/// A top-level unit of the destination page.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Paragraph(RichTextBody),
    Heading(HeadingLevel, RichTextBody),
    Toggle(RichTextBody),
    ListItem(ListKind, RichTextBody),
    Quote(RichTextBody),
    Code(CodeBody),
    Equation(EquationBody),
    Divider,
    Media(Media),
    LinkToPage(PageLink),
    Table(TableBody),
}

impl Block {
    pub fn paragraph(rich_text: Vec<RichText>) -> Self {
        Block::Paragraph(RichTextBody::new(rich_text))
    }

    pub fn block_type(&self) -> &'static str {
        match self {
            Block::Paragraph(_) => "paragraph",
            Block::Heading(HeadingLevel::One, _) => "heading_1",
            Block::Heading(HeadingLevel::Two, _) => "heading_2",
            Block::Heading(HeadingLevel::Three, _) => "heading_3",
            Block::Toggle(_) => "toggle",
            Block::ListItem(kind, _) => kind.block_type(),
            Block::Quote(_) => "quote",
            Block::Code(_) => "code",
            Block::Equation(_) => "equation",
            Block::Divider => "divider",
            Block::Media(media) => media.kind.as_str(),
            Block::LinkToPage(_) => "link_to_page",
            Block::Table(_) => "table",
        }
    }

    pub fn rich_text_body(&self) -> Option<&RichTextBody> {
        match self {
            Block::Paragraph(body)
            | Block::Heading(_, body)
            | Block::Toggle(body)
            | Block::ListItem(_, body)
            | Block::Quote(body) => Some(body),
            _ => None,
        }
    }

    /// The block object held by a rich-text entry, if it is one.
    pub fn from_rich_text(item: RichText) -> Option<Self> {
        match item {
            RichText::Media(media) => Some(Block::Media(media)),
            RichText::LinkToPage(link) => Some(Block::LinkToPage(link)),
            RichText::Text(_) => None,
        }
    }
}

impl Serialize for Block {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let block_type = self.block_type();
        match self {
            Block::Media(media) => return media.serialize(serializer),
            Block::LinkToPage(link) => return link.serialize(serializer),
            _ => {}
        }

        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("object", "block")?;
        map.serialize_entry("type", block_type)?;
        match self {
            Block::Paragraph(body)
            | Block::Heading(_, body)
            | Block::Toggle(body)
            | Block::ListItem(_, body)
            | Block::Quote(body) => map.serialize_entry(block_type, body)?,
            Block::Code(body) => map.serialize_entry(block_type, body)?,
            Block::Equation(body) => map.serialize_entry(block_type, body)?,
            Block::Divider => map.serialize_entry(block_type, &Empty {})?,
            Block::Table(body) => map.serialize_entry(block_type, body)?,
            Block::Media(_) | Block::LinkToPage(_) => {}
        }
        map.end()
    }
}

/// Splits a paragraph's rich text around block objects.
///
/// Text runs become paragraphs and each block object becomes its own block, in
/// the original order.
pub fn split_block_objects(rich_text: Vec<RichText>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut current = Vec::new();

    for item in rich_text {
        if item.is_block_object() {
            if !current.is_empty() {
                blocks.push(Block::paragraph(std::mem::take(&mut current)));
            }
            blocks.extend(Block::from_rich_text(item));
        } else {
            current.push(item);
        }
    }
    if !current.is_empty() {
        blocks.push(Block::paragraph(current));
    }

    blocks
}

/// Splits paragraphs whose `rich_text` exceeds [`RICHTEXT_ARRAY_LENGTH`] into consecutive paragraphs.
///
/// Other blocks pass through unchanged.
pub fn ensure_array_len(blocks: Vec<Block>) -> Vec<Block> {
    let mut result = Vec::with_capacity(blocks.len());

    for block in blocks {
        match block {
            Block::Paragraph(body) if body.rich_text.len() > RICHTEXT_ARRAY_LENGTH => {
                let mut rich_text = body.rich_text.into_iter().peekable();
                while rich_text.peek().is_some() {
                    result.push(Block::paragraph(
                        rich_text.by_ref().take(RICHTEXT_ARRAY_LENGTH).collect(),
                    ));
                }
            }
            other => result.push(other),
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rich_text::{MediaKind, MediaSource, TextObject};
    use rstest::rstest;
    use serde_json::json;

    fn text(content: &str) -> RichText {
        RichText::Text(TextObject {
            content: content.to_string(),
            ..Default::default()
        })
    }

    fn image(url: &str) -> RichText {
        RichText::Media(Media {
            kind: MediaKind::Image,
            source: MediaSource::external(url),
        })
    }

    #[rstest]
    #[case(1, 1)]
    #[case(100, 1)]
    #[case(101, 2)]
    #[case(250, 3)]
    fn test_ensure_array_len(#[case] len: usize, #[case] expected_blocks: usize) {
        let rich_text: Vec<RichText> = (0..len).map(|i| text(&i.to_string())).collect();
        let blocks = ensure_array_len(vec![Block::paragraph(rich_text.clone())]);

        assert_eq!(blocks.len(), expected_blocks);
        let rejoined: Vec<RichText> = blocks
            .iter()
            .filter_map(Block::rich_text_body)
            .flat_map(|body| body.rich_text.clone())
            .collect();
        assert_eq!(rejoined, rich_text);
        assert!(
            blocks
                .iter()
                .filter_map(Block::rich_text_body)
                .all(|body| body.rich_text.len() <= RICHTEXT_ARRAY_LENGTH)
        );
    }

    #[test]
    fn test_ensure_array_len_ignores_other_blocks() {
        let quote = Block::Quote(RichTextBody::new((0..150).map(|_| text("q")).collect()));
        assert_eq!(ensure_array_len(vec![quote.clone(), Block::Divider]), vec![quote, Block::Divider]);
    }

    #[test]
    fn test_split_block_objects() {
        let blocks = split_block_objects(vec![
            text("a"),
            image("https://e.com/1.png"),
            image("https://e.com/2.png"),
            text("b"),
            text("c"),
        ]);

        assert_eq!(
            blocks.iter().map(Block::block_type).collect::<Vec<_>>(),
            vec!["paragraph", "image", "image", "paragraph"]
        );
        assert_eq!(blocks[3], Block::paragraph(vec![text("b"), text("c")]));
    }

    #[test]
    fn test_serialize_blocks() {
        let mut body = RichTextBody::new(vec![text("Title")]);
        body.push_child(Block::from_rich_text(image("https://e.com/1.png")).unwrap());

        assert_eq!(
            serde_json::to_value(vec![Block::Heading(HeadingLevel::Two, body), Block::Divider]).unwrap(),
            json!([
                {
                    "object": "block",
                    "type": "heading_2",
                    "heading_2": {
                        "rich_text": [{"type": "text", "plain_text": "Title", "text": {"content": "Title"}}],
                        "children": [{
                            "object": "block",
                            "type": "image",
                            "image": {"type": "external", "external": {"url": "https://e.com/1.png"}}
                        }]
                    }
                },
                {"object": "block", "type": "divider", "divider": {}}
            ])
        );
    }

    #[test]
    fn test_serialize_table() {
        let table = Block::Table(TableBody {
            has_row_header: false,
            has_column_header: true,
            table_width: 1,
            rows: vec![TableRow {
                cells: vec![vec![
                    CellItem::Files(FilesGroup::new(vec![Media {
                        kind: MediaKind::File,
                        source: MediaSource::file_upload("u1"),
                    }])),
                    CellItem::RichText(text("x")),
                ]],
            }],
            caption: None,
        });

        assert_eq!(
            serde_json::to_value(&table).unwrap(),
            json!({
                "object": "block",
                "type": "table",
                "table": {
                    "has_row_header": false,
                    "has_column_header": true,
                    "table_width": 1,
                    "children": [{
                        "type": "table_row",
                        "table_row": {"cells": [[
                            {"type": "files", "files": [{"object": "block", "type": "file", "file": {"type": "file_upload", "file_upload": {"id": "u1"}}}]},
                            {"type": "text", "plain_text": "x", "text": {"content": "x"}}
                        ]]}
                    }]
                }
            })
        );
    }
}
