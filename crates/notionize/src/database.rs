//! Projection of an HTML table onto a typed database schema.
//!
//! The first `<tr>` declares the columns: each `<th>` gives a column name and
//! an optional `data-column-type`. Every following row turns into one mapping
//! of column name to property value, matched to the header by cell position.

use super::color::{Color, option_color};
use super::error::{ConversionIssue, Diagnostics};
use super::node::HtmlElement;
use super::rich_text::{MediaSource, TEXT_MAX_LENGTH, URL_MAX_LENGTH, chunk_chars, truncate_chars};
use serde::Serialize;
use serde::ser::Serializer;

const DEFAULT_COLUMN_TYPE: &str = "text";

/// Insertion-ordered string-keyed map.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMap<V> {
    entries: Vec<(String, V)>,
}

impl<V> Default for PropertyMap<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> PropertyMap<V> {
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts `value` under `key`, replacing an existing value.
    pub fn insert(&mut self, key: &str, value: V) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    /// Inserts `value` only when `key` is not present yet.
    pub fn insert_if_absent(&mut self, key: &str, value: V) {
        if self.get(key).is_none() {
            self.entries.push((key.to_string(), value));
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V: Serialize> Serialize for PropertyMap<V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub name: String,
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SelectOptions {
    pub options: Vec<SelectOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NoConfig {}

/// A column definition in the database header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnHeader {
    Select { select: SelectOptions },
    MultiSelect { multi_select: SelectOptions },
    Date { date: NoConfig },
    Checkbox { checkbox: NoConfig },
    Files { files: NoConfig },
    Url { url: NoConfig },
    Email { email: NoConfig },
    RichText { rich_text: NoConfig },
}

impl ColumnHeader {
    fn with_options(column_type: &str, names: &[String]) -> Self {
        let options = SelectOptions {
            options: names
                .iter()
                .enumerate()
                .map(|(i, name)| SelectOption {
                    name: name.clone(),
                    color: option_color(i),
                })
                .collect(),
        };
        match column_type {
            "multi_select" => ColumnHeader::MultiSelect {
                multi_select: options,
            },
            _ => ColumnHeader::Select { select: options },
        }
    }

    fn of_type(column_type: &str) -> Self {
        match column_type {
            "date" => ColumnHeader::Date { date: NoConfig {} },
            "checkbox" => ColumnHeader::Checkbox {
                checkbox: NoConfig {},
            },
            "image" => ColumnHeader::Files { files: NoConfig {} },
            "link" => ColumnHeader::Url { url: NoConfig {} },
            "email" => ColumnHeader::Email { email: NoConfig {} },
            _ => ColumnHeader::RichText {
                rich_text: NoConfig {},
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionName {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DateValue {
    pub start: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileProperty {
    pub name: String,
    #[serde(flatten)]
    pub source: MediaSource,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextContent {
    pub content: String,
}

/// Rich text without annotations, as database property values carry it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlainRichText {
    #[serde(rename = "type")]
    kind: &'static str,
    pub text: TextContent,
}

impl PlainRichText {
    /// One object per [`TEXT_MAX_LENGTH`] chunk; empty text yields a single empty object.
    fn from_text(text: &str) -> Vec<Self> {
        let chunks = match chunk_chars(text, TEXT_MAX_LENGTH) {
            chunks if chunks.is_empty() => vec![""],
            chunks => chunks,
        };
        chunks
            .into_iter()
            .map(|chunk| PlainRichText {
                kind: "text",
                text: TextContent {
                    content: chunk.to_string(),
                },
            })
            .collect()
    }
}

/// A typed value of one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyValue {
    Select(OptionName),
    MultiSelect(Vec<OptionName>),
    Files(Vec<FileProperty>),
    Date(DateValue),
    Checkbox(bool),
    Url(String),
    Email(String),
    RichText(Vec<PlainRichText>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseBody {
    pub database_id: Option<String>,
    pub headers: PropertyMap<ColumnHeader>,
    pub rows: Vec<PropertyMap<PropertyValue>>,
}

/// A projected table. Serializes as `{"table": {...}}`, not as a block.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatabaseTable {
    pub table: DatabaseBody,
}

struct Column {
    name: String,
    column_type: String,
}

fn extract_columns(header_row: &HtmlElement) -> Vec<Column> {
    header_row
        .find_all(&["th"])
        .into_iter()
        .map(|th| Column {
            name: th.stripped_text(),
            column_type: th
                .attr("data-column-type")
                .unwrap_or(DEFAULT_COLUMN_TYPE)
                .to_string(),
        })
        .collect()
}

fn option_names(cell: &HtmlElement) -> (Vec<String>, Vec<String>) {
    let options = cell.find_all(&["option"]);
    let selected = options
        .iter()
        .filter(|option| option.has_attr("selected"))
        .map(|option| option.stripped_text())
        .collect();
    let all = options.iter().map(|option| option.stripped_text()).collect();
    (all, selected)
}

fn image_value(cell: &HtmlElement) -> Option<PropertyValue> {
    let img = cell.find("img")?;
    let file = match (img.non_empty_attr("data-notion-file-upload-id"), img.non_empty_attr("src")) {
        (Some(id), _) => FileProperty {
            name: img.non_empty_attr("alt").unwrap_or("File").to_string(),
            source: MediaSource::file_upload(id),
        },
        (None, Some(src)) => FileProperty {
            name: "Image".to_string(),
            source: MediaSource::external(src),
        },
        (None, None) => return None,
    };
    Some(PropertyValue::Files(vec![file]))
}

fn checkbox_value(cell: &HtmlElement) -> PropertyValue {
    let checked = cell
        .find_all(&["input"])
        .into_iter()
        .find(|input| input.attr("type") == Some("checkbox"))
        .is_some_and(|checkbox| checkbox.has_attr("checked"));
    PropertyValue::Checkbox(checked)
}

fn link_value(cell: &HtmlElement) -> Option<PropertyValue> {
    let href = cell.find("a")?.non_empty_attr("href")?;
    Some(PropertyValue::Url(truncate_chars(href, URL_MAX_LENGTH).to_string()))
}

fn rich_text_value(cell: &HtmlElement) -> PropertyValue {
    PropertyValue::RichText(PlainRichText::from_text(&cell.stripped_text()))
}

/// Projects `table` onto a database schema.
///
/// Returns `None` when the table has no rows at all.
pub fn convert_database(table: &HtmlElement, diagnostics: &mut Diagnostics) -> Option<DatabaseTable> {
    let rows = table.find_all(&["tr"]);
    let Some((header_row, data_rows)) = rows.split_first() else {
        diagnostics.report(ConversionIssue::EmptyTable);
        return None;
    };

    let columns = extract_columns(header_row);
    let mut body = DatabaseBody {
        database_id: table.non_empty_attr("data-table-id").map(str::to_string),
        ..Default::default()
    };

    for column in &columns {
        if !matches!(
            column.column_type.as_str(),
            "select" | "multi_select" | "image" | "date" | "checkbox" | "link" | "person" | "text" | "rich_text"
        ) {
            diagnostics.report(ConversionIssue::UnsupportedColumnType {
                column_type: column.column_type.clone(),
            });
        }
    }

    for tr in data_rows {
        let cells = tr.find_all(&["td"]);
        let mut properties = PropertyMap::default();

        for (column, cell) in columns.iter().zip(cells) {
            let name = column.name.as_str();
            let column_type = column.column_type.as_str();

            let (header, value) = match column_type {
                "select" | "multi_select" => {
                    let (all, selected) = option_names(cell);
                    let value = match column_type {
                        "select" => selected.into_iter().next().map(|name| PropertyValue::Select(OptionName { name })),
                        _ if all.is_empty() => None,
                        _ => Some(PropertyValue::MultiSelect(
                            selected.into_iter().map(|name| OptionName { name }).collect(),
                        )),
                    };
                    (ColumnHeader::with_options(column_type, &all), value)
                }
                "image" => (ColumnHeader::of_type("image"), image_value(cell)),
                "date" => {
                    let text = cell.stripped_text();
                    let value = (!text.is_empty()).then(|| PropertyValue::Date(DateValue { start: text }));
                    (ColumnHeader::of_type("date"), value)
                }
                "checkbox" => (ColumnHeader::of_type("checkbox"), Some(checkbox_value(cell))),
                "link" => (ColumnHeader::of_type("link"), link_value(cell)),
                "person" => match cell.non_empty_attr("data-person-email") {
                    Some(email) => (
                        ColumnHeader::of_type("email"),
                        Some(PropertyValue::Email(email.to_string())),
                    ),
                    None => (ColumnHeader::of_type("person"), Some(rich_text_value(cell))),
                },
                _ => (ColumnHeader::of_type(column_type), Some(rich_text_value(cell))),
            };

            if let Some(value) = value {
                properties.insert(name, value);
            }
            body.headers.insert_if_absent(name, header);
        }

        body.rows.push(properties);
    }

    tracing::debug!(
        columns = body.headers.len(),
        rows = body.rows.len(),
        "Projected table onto database schema"
    );

    Some(DatabaseTable { table: body })
}
