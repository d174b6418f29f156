//! # notionize: HTML to Notion block translation
//!
//! This crate turns an HTML document or fragment into the JSON payload of a
//! Notion page: content blocks with annotated rich text, tables, media and
//! page properties. Nothing is sent anywhere; the output is only the value
//! an API client would post.
//!
//! ## Features
//!
//! - **Inline styles**: bold/italic/underline/strikethrough/code and colors from tags and `style` attributes
//! - **Size limits**: text and URLs are chunked or truncated to the destination's limits
//! - **Blocks**: paragraphs, headings, toggles, lists, quotes, code, equations, dividers and tables
//! - **Databases**: tables can be projected onto typed database columns
//!
//! ## Quick Start
//!
//! ```rust
//! use notionize::{ConversionOptions, ImportStat, convert_html};
//!
//! let mut stats = ImportStat::default();
//! let conversion = convert_html("<p>Hello <b>world</b></p>", &ConversionOptions::default(), &mut stats);
//!
//! let json = serde_json::to_value(&conversion.document).unwrap();
//! assert_eq!(json["children"][0]["type"], "paragraph");
//! assert_eq!(stats.texts, 2);
//! assert!(conversion.issues.is_empty());
//! ```
//!
//! ## Database mode
//!
//! ```rust
//! use notionize::{ConversionMode, ConversionOptions, NoStats, convert_html};
//!
//! let options = ConversionOptions {
//!     mode: ConversionMode::Database,
//!     database_id: Some("db-1".to_string()),
//!     ..Default::default()
//! };
//! let html = "<table><tr><th>Name</th></tr><tr><td>Ada</td></tr></table>";
//! let json = serde_json::to_value(convert_html(html, &options, &mut NoStats).document).unwrap();
//!
//! assert_eq!(json["parent"]["database_id"], "db-1");
//! assert_eq!(json["children"][0]["table"]["rows"][0]["Name"]["rich_text"][0]["text"]["content"], "Ada");
//! ```
mod block;
mod color;
mod converter;
mod database;
mod error;
mod extract;
mod node;
mod options;
mod parser;
mod properties;
mod rich_text;
mod stats;
mod style;
mod url_check;

pub use block::{
    Block, CellItem, CodeBody, EquationBody, FilesGroup, HeadingLevel, ListKind, RichTextBody, TableBody, TableRow,
    ensure_array_len, split_block_objects,
};
pub use color::{Color, closest_color, match_color};
pub use converter::{Child, Converter, valid_language};
pub use database::{
    ColumnHeader, DatabaseBody, DatabaseTable, PropertyMap, PropertyValue, SelectOption, convert_database,
};
pub use error::{ConversionIssue, Diagnostics, IssueKind};
pub use extract::{LeafUnit, extract_leaf_units};
pub use node::{HtmlElement, HtmlNode};
pub use options::{ConversionMode, ConversionOptions, DEFAULT_MAX_DEPTH};
pub use parser::{ParsedDocument, parse_html};
pub use properties::{PageMetadata, PageProperty};
pub use rich_text::{
    EXPRESSION_MAX_LENGTH, Media, MediaKind, MediaSource, PageLink, RICHTEXT_ARRAY_LENGTH, RichText, TEXT_MAX_LENGTH,
    TextObject, TextType, URL_MAX_LENGTH, generate_inline_objects, merge_rich_text,
};
pub use stats::{ImportStat, ImportStats, NoStats};
pub use style::{Annotations, StyleDeclarations, StyleSet};
pub use url_check::is_valid_url;

use serde::Serialize;

/// The container the page is created in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Parent {
    DatabaseId { database_id: String },
}

/// The converted page. Empty parts are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DocumentOutput {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Child>,
    #[serde(skip_serializing_if = "PropertyMap::is_empty")]
    pub properties: PropertyMap<PageProperty>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<Parent>,
}

/// Result of [`convert_html`]: the document and everything that was degraded on the way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversion {
    pub document: DocumentOutput,
    pub issues: Vec<ConversionIssue>,
}

/// Converts an HTML document or fragment into a Notion page payload.
///
/// Conversion never fails. Anything that could not be represented is listed
/// in [`Conversion::issues`].
pub fn convert_html(html: &str, options: &ConversionOptions, stats: &mut dyn ImportStats) -> Conversion {
    let parsed = parse_html(html, options.max_depth);
    let mut converter = Converter::new(options, stats);

    if parsed.collapsed_subtrees > 0 {
        converter.diagnostics().report(ConversionIssue::NestingLimitExceeded {
            count: parsed.collapsed_subtrees,
            max_depth: options.max_depth,
        });
    }

    let children = converter.convert_nodes(&parsed.body);
    let properties = parsed
        .head
        .as_ref()
        .map(|head| PageMetadata::from_head(head).into_properties())
        .unwrap_or_default();
    let parent = options
        .database_id
        .as_ref()
        .filter(|id| !id.is_empty())
        .map(|id| Parent::DatabaseId {
            database_id: id.clone(),
        });

    tracing::debug!(blocks = children.len(), properties = properties.len(), "Converted HTML document");

    Conversion {
        document: DocumentOutput {
            children,
            properties,
            parent,
        },
        issues: converter.into_diagnostics().into_issues(),
    }
}
