use super::block::{
    Block, CellItem, CodeBody, EquationBody, FilesGroup, HeadingLevel, ListKind, RichTextBody, TableBody, TableRow,
    ensure_array_len, split_block_objects,
};
use super::database::{DatabaseTable, convert_database};
use super::error::{ConversionIssue, Diagnostics};
use super::node::{HtmlElement, HtmlNode};
use super::options::{ConversionMode, ConversionOptions};
use super::rich_text::{
    EXPRESSION_MAX_LENGTH, MediaKind, RICHTEXT_ARRAY_LENGTH, RichText, TEXT_MAX_LENGTH, TextType, chunk_chars,
    generate_inline_objects, generate_text, merge_rich_text, truncate_chars,
};
use super::stats::ImportStats;
use super::style::Annotations;
use itertools::{Either, Itertools};
use rustc_hash::FxHashMap;
use serde::Serialize;

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];
const LIST_TAGS: &[&str] = &["ul", "ol", "menu", "dir"];
const SKIPPED_TAGS: &[&str] = &[
    "script", "style", "noscript", "template", "head", "title", "meta", "link", "base",
];
const CONTAINER_TAGS: &[&str] = &[
    "div", "section", "article", "main", "header", "footer", "nav", "aside", "figure", "figcaption", "details",
    "summary", "form", "fieldset", "address", "center", "body", "html", "li", "dl", "dt", "dd", "span",
];
const INLINE_TAGS: &[&str] = &[
    "a", "abbr", "b", "bdi", "bdo", "br", "cite", "code", "data", "del", "dfn", "em", "font", "i", "img", "ins",
    "kbd", "label", "mark", "q", "s", "samp", "small", "span", "strike", "strong", "sub", "sup", "time", "u", "var",
    "wbr",
];

const PLAIN_TEXT_LANGUAGE: &str = "plain text";
const LANGUAGES: &[&str] = &[
    "abap", "agda", "arduino", "assembly", "bash", "basic", "bnf", "c", "c#", "c++", "clojure", "coffeescript",
    "coq", "css", "dart", "dhall", "diff", "docker", "ebnf", "elixir", "elm", "erlang", "f#", "flow", "fortran",
    "gherkin", "glsl", "go", "graphql", "groovy", "haskell", "html", "idris", "java", "javascript", "json",
    "julia", "kotlin", "latex", "less", "lisp", "livescript", "llvm ir", "lua", "makefile", "markdown", "markup",
    "matlab", "mathematica", "mermaid", "nix", "objective-c", "ocaml", "pascal", "perl", "php", "plain text",
    "powershell", "prolog", "protobuf", "purescript", "python", "r", "racket", "reason", "ruby", "rust", "sass",
    "scala", "scheme", "scss", "shell", "solidity", "sql", "swift", "toml", "typescript", "vb.net", "verilog",
    "vhdl", "visual basic", "webassembly", "xml", "yaml", "java/c/c++/c#",
];
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("cpp", "c++"),
    ("csharp", "c#"),
    ("cs", "c#"),
    ("fsharp", "f#"),
    ("dockerfile", "docker"),
    ("js", "javascript"),
    ("jsx", "javascript"),
    ("ts", "typescript"),
    ("tsx", "typescript"),
    ("py", "python"),
    ("rb", "ruby"),
    ("rs", "rust"),
    ("sh", "shell"),
    ("zsh", "shell"),
    ("yml", "yaml"),
    ("md", "markdown"),
    ("text", "plain text"),
    ("plaintext", "plain text"),
];

/// One entry of the document's `children`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Child {
    Block(Block),
    Database(DatabaseTable),
}

impl From<Block> for Child {
    fn from(block: Block) -> Self {
        Child::Block(block)
    }
}

/// Destination language for a code block, or `None` when it is not supported.
pub fn valid_language(language: &str) -> Option<&'static str> {
    let language = language.trim().to_lowercase();
    let language = LANGUAGE_ALIASES
        .iter()
        .find(|(alias, _)| *alias == language)
        .map_or(language.as_str(), |(_, name)| *name);
    LANGUAGES.iter().copied().find(|name| *name == language)
}

fn class_language(element: &HtmlElement) -> Option<&str> {
    element
        .attr("class")?
        .split_whitespace()
        .find_map(|class| class.strip_prefix("language-").or_else(|| class.strip_prefix("lang-")))
}

/// Text of a code element with whitespace kept verbatim and `<br>` as a newline.
fn code_text(element: &HtmlElement) -> String {
    let mut text = String::new();
    let mut stack: Vec<&HtmlNode> = element.children.iter().rev().collect();

    while let Some(node) = stack.pop() {
        match node {
            HtmlNode::Text(t) => text.push_str(t),
            HtmlNode::Element(el) if el.is("br") => text.push('\n'),
            HtmlNode::Element(el) => stack.extend(el.children.iter().rev()),
            HtmlNode::Comment(_) => {}
        }
    }

    text
}

fn equation_expression(element: &HtmlElement) -> String {
    if let Some(expression) = element.non_empty_attr("data-equation") {
        return expression.trim().to_string();
    }
    // MathML keeps the TeX source in <annotation encoding="application/x-tex">.
    element
        .find_all(&["annotation"])
        .into_iter()
        .find(|annotation| annotation.attr("encoding") == Some("application/x-tex"))
        .unwrap_or(element)
        .text_content()
        .trim()
        .to_string()
}

fn is_block_level(element: &HtmlElement) -> bool {
    let tag_name = element.tag_name.as_str();
    if element.has_attr("data-equation") {
        return true;
    }
    match tag_name {
        "p" | "hr" | "table" | "blockquote" | "pre" | "math" => true,
        "span" => false,
        _ => {
            HEADING_TAGS.contains(&tag_name) || LIST_TAGS.contains(&tag_name) || CONTAINER_TAGS.contains(&tag_name)
        }
    }
}

fn has_block_children(element: &HtmlElement) -> bool {
    element.child_elements().any(is_block_level)
}

fn wrap_inline_run(nodes: Vec<HtmlNode>) -> HtmlElement {
    HtmlElement::new("p", FxHashMap::default(), nodes)
}

/// Converts parsed HTML nodes into destination blocks.
///
/// Every converter is best effort: problems are reported to [`Diagnostics`]
/// and the affected part is degraded or dropped.
pub struct Converter<'a> {
    options: &'a ConversionOptions,
    stats: &'a mut dyn ImportStats,
    diagnostics: Diagnostics,
}

impl<'a> Converter<'a> {
    pub fn new(options: &'a ConversionOptions, stats: &'a mut dyn ImportStats) -> Self {
        Self {
            options,
            stats,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn diagnostics(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    fn inline_objects(&mut self, element: &HtmlElement) -> Vec<RichText> {
        generate_inline_objects(element, &mut *self.stats, &mut self.diagnostics)
    }

    fn merged_inline_objects(&mut self, element: &HtmlElement) -> Vec<RichText> {
        let rich_text = self.inline_objects(element);
        if self.options.merge_adjacent_text {
            merge_rich_text(rich_text)
        } else {
            rich_text
        }
    }

    /// Dispatches a sequence of sibling nodes. Consecutive inline nodes form one paragraph.
    pub fn convert_nodes(&mut self, nodes: &[HtmlNode]) -> Vec<Child> {
        let mut children = Vec::new();
        let mut inline_run: Vec<HtmlNode> = Vec::new();

        for node in nodes {
            match node {
                HtmlNode::Comment(_) => {}
                HtmlNode::Text(_) => inline_run.push(node.clone()),
                HtmlNode::Element(element) if !is_block_level(element) && !has_block_children(element) => {
                    if INLINE_TAGS.contains(&element.tag_name.as_str()) {
                        inline_run.push(node.clone());
                    } else {
                        self.flush_inline_run(&mut inline_run, &mut children);
                        children.extend(self.convert_element(element));
                    }
                }
                HtmlNode::Element(element) => {
                    self.flush_inline_run(&mut inline_run, &mut children);
                    children.extend(self.convert_element(element));
                }
            }
        }
        self.flush_inline_run(&mut inline_run, &mut children);

        children
    }

    fn flush_inline_run(&mut self, inline_run: &mut Vec<HtmlNode>, children: &mut Vec<Child>) {
        if inline_run.iter().all(|node| node.is_blank_text()) {
            inline_run.clear();
            return;
        }
        let paragraph = wrap_inline_run(std::mem::take(inline_run));
        children.extend(self.convert_paragraph(&paragraph).into_iter().map(Child::from));
    }

    /// Converts one element that starts a new block.
    pub fn convert_element(&mut self, element: &HtmlElement) -> Vec<Child> {
        let tag_name = element.tag_name.as_str();

        if tag_name == "math" || element.has_attr("data-equation") {
            return self.convert_equation(element).map(Child::from).into_iter().collect();
        }

        match tag_name {
            _ if SKIPPED_TAGS.contains(&tag_name) => Vec::new(),
            "p" => self.convert_paragraph(element).into_iter().map(Child::from).collect(),
            _ if HEADING_TAGS.contains(&tag_name) => {
                self.convert_heading(element).map(Child::from).into_iter().collect()
            }
            _ if LIST_TAGS.contains(&tag_name) => {
                let kind = ListKind::from_tag(tag_name).unwrap_or_else(|| {
                    self.diagnostics.report(ConversionIssue::UnsupportedListType {
                        list_type: tag_name.to_string(),
                    });
                    ListKind::Bulleted
                });
                self.convert_list(element, kind).into_iter().map(Child::from).collect()
            }
            "table" => self.convert_table(element).into_iter().collect(),
            "hr" => vec![Child::from(self.convert_divider())],
            "blockquote" => self.convert_quote(element).map(Child::from).into_iter().collect(),
            "pre" => self.convert_code(element).into_iter().map(Child::from).collect(),
            _ if has_block_children(element) => self.convert_nodes(&element.children),
            _ if CONTAINER_TAGS.contains(&tag_name) || INLINE_TAGS.contains(&tag_name) => {
                self.convert_paragraph(element).into_iter().map(Child::from).collect()
            }
            _ => {
                self.diagnostics.report(ConversionIssue::UnsupportedTag {
                    tag_name: tag_name.to_string(),
                });
                if element.stripped_text().is_empty() {
                    Vec::new()
                } else {
                    self.convert_paragraph(element).into_iter().map(Child::from).collect()
                }
            }
        }
    }

    /// A paragraph, split around media and page links, and split again to respect the rich-text array limit.
    pub fn convert_paragraph(&mut self, element: &HtmlElement) -> Vec<Block> {
        let rich_text = self.merged_inline_objects(element);
        if rich_text.is_empty() {
            return vec![Block::paragraph(Vec::new())];
        }
        ensure_array_len(split_block_objects(rich_text))
    }

    pub fn convert_divider(&self) -> Block {
        Block::Divider
    }

    /// A heading, or a toggle when the element carries `data-toggle`.
    ///
    /// Uploaded images move from `rich_text` into `children`.
    pub fn convert_heading(&mut self, element: &HtmlElement) -> Option<Block> {
        let rich_text = self.inline_objects(element);
        if rich_text.is_empty() {
            return None;
        }

        let (uploads, rich_text): (Vec<Block>, Vec<RichText>) =
            rich_text.into_iter().partition_map(|item| match item {
                RichText::Media(media) if media.kind == MediaKind::Image && media.source.is_file_upload() => {
                    Either::Left(Block::Media(media))
                }
                other => Either::Right(other),
            });

        let mut body = RichTextBody::new(rich_text);
        if element.non_empty_attr("data-toggle").is_some() {
            body.children = Some(uploads);
            return Some(Block::Toggle(body));
        }
        if !uploads.is_empty() {
            body.children = Some(uploads);
        }
        Some(Block::Heading(HeadingLevel::from_tag(&element.tag_name), body))
    }

    /// Converts the direct `<li>` children of a list; nested lists become `children`.
    pub fn convert_list(&mut self, list: &HtmlElement, kind: ListKind) -> Vec<Block> {
        let mut list = list.clone();
        list.unwrap_tags(HEADING_TAGS);

        let items: Vec<&HtmlElement> = list.child_elements().filter(|el| el.is("li")).collect();
        if items.is_empty() {
            self.diagnostics.report(ConversionIssue::EmptyList {
                tag_name: list.tag_name.clone(),
            });
            return Vec::new();
        }

        items.into_iter().map(|item| self.convert_list_item(item, kind)).collect()
    }

    fn convert_list_item(&mut self, item: &HtmlElement, kind: ListKind) -> Block {
        let (nested, content): (Vec<HtmlNode>, Vec<HtmlNode>) = item.children.iter().cloned().partition(|node| {
            node.as_element()
                .is_some_and(|el| ListKind::from_tag(&el.tag_name).is_some())
        });
        let content = HtmlElement::new(&item.tag_name, item.attributes.clone(), content);

        let mut body = RichTextBody::default();
        for entry in self.inline_objects(&content) {
            match entry {
                RichText::Media(media) => body.push_child(Block::Media(media)),
                other => body.rich_text.push(other),
            }
        }

        for list in nested.iter().filter_map(HtmlNode::as_element) {
            // Each nested list keeps its own kind.
            let nested_kind = ListKind::from_tag(&list.tag_name).unwrap_or(kind);
            for child in self.convert_list(list, nested_kind) {
                body.push_child(child);
            }
        }

        Block::ListItem(kind, body)
    }

    /// Converts a table. Database mode and `SimpleTable` grids are projected onto a database schema.
    pub fn convert_table(&mut self, table: &HtmlElement) -> Option<Child> {
        let is_simple_table = table.attr("data-coda-grid-configuration-set") == Some("SimpleTable");
        if self.options.mode == ConversionMode::Database || is_simple_table {
            return convert_database(table, &mut self.diagnostics).map(Child::Database);
        }
        self.convert_generic_table(table).map(Child::Block)
    }

    fn convert_generic_table(&mut self, table: &HtmlElement) -> Option<Block> {
        let rows = table.find_all(&["tr"]);
        let first_row = rows.first().or_else(|| {
            self.diagnostics.report(ConversionIssue::EmptyTable);
            None
        })?;

        let caption = table
            .non_empty_attr("data-caption")
            .or_else(|| table.find("table").and_then(|inner| inner.non_empty_attr("data-caption")))
            .map(str::to_string);

        let mut table_width = first_row.find_all(&["td"]).len();
        let mut has_column_header = false;
        let mut table_rows = Vec::with_capacity(rows.len());

        for tr in &rows {
            let mut cells = tr.find_all(&["td"]);
            let is_header_row = cells.is_empty();
            if is_header_row {
                cells = tr.find_all(&["th"]);
                has_column_header = true;
            }
            table_width = table_width.max(cells.len());

            let cells = cells
                .into_iter()
                .map(|cell| {
                    if is_header_row {
                        self.convert_header_cell(cell)
                    } else {
                        self.convert_data_cell(cell)
                    }
                })
                .collect();
            table_rows.push(TableRow { cells });
        }

        Some(Block::Table(TableBody {
            has_row_header: false,
            has_column_header,
            table_width,
            rows: table_rows,
            caption,
        }))
    }

    /// A column-type hint relabels the first entry only when it is text; media keeps its own type.
    fn convert_header_cell(&mut self, cell: &HtmlElement) -> Vec<CellItem> {
        let mut rich_text = self.inline_objects(cell);
        let hint = cell.attr("data-column-type").and_then(TextType::from_column_hint);
        if let (Some(kind), Some(RichText::Text(first))) = (hint, rich_text.first_mut()) {
            first.kind = kind;
        }
        rich_text.into_iter().map(CellItem::RichText).collect()
    }

    fn convert_data_cell(&mut self, cell: &HtmlElement) -> Vec<CellItem> {
        let (files, remaining): (Vec<_>, Vec<_>) =
            self.inline_objects(cell).into_iter().partition_map(|item| match item {
                RichText::Media(media) if media.source.is_file_upload() => Either::Left(media),
                other => Either::Right(CellItem::RichText(other)),
            });

        if files.is_empty() {
            return remaining;
        }
        let mut cell_items = Vec::with_capacity(remaining.len() + 1);
        cell_items.push(CellItem::Files(FilesGroup::new(files)));
        cell_items.extend(remaining);
        cell_items
    }

    /// A quote; media moves into `children`.
    pub fn convert_quote(&mut self, element: &HtmlElement) -> Option<Block> {
        let rich_text = self.merged_inline_objects(element);
        if rich_text.is_empty() {
            return None;
        }

        let mut body = RichTextBody::default();
        for entry in rich_text {
            match entry {
                RichText::Media(media) => body.push_child(Block::Media(media)),
                other => body.rich_text.push(other),
            }
        }
        Some(Block::Quote(body))
    }

    /// One code block per [`RICHTEXT_ARRAY_LENGTH`] text chunks; empty code yields one empty block.
    pub fn convert_code(&mut self, element: &HtmlElement) -> Vec<Block> {
        let code = element.find("code");
        let declared = [Some(element), code]
            .into_iter()
            .flatten()
            .find_map(|el| class_language(el).or_else(|| el.non_empty_attr("data-language")));

        let language = match declared {
            Some(declared) => valid_language(declared).unwrap_or_else(|| {
                self.diagnostics.report(ConversionIssue::UnsupportedLanguage {
                    language: declared.to_string(),
                });
                PLAIN_TEXT_LANGUAGE
            }),
            None => PLAIN_TEXT_LANGUAGE,
        };

        let text = code_text(element);
        let rich_text: Vec<RichText> = chunk_chars(&text, TEXT_MAX_LENGTH)
            .into_iter()
            .filter_map(|chunk| generate_text(chunk, Annotations::default(), &mut *self.stats))
            .map(RichText::Text)
            .collect();

        if rich_text.is_empty() {
            return vec![Block::Code(CodeBody {
                rich_text,
                language: language.to_string(),
            })];
        }

        rich_text
            .chunks(RICHTEXT_ARRAY_LENGTH)
            .map(|chunk| {
                Block::Code(CodeBody {
                    rich_text: chunk.to_vec(),
                    language: language.to_string(),
                })
            })
            .collect()
    }

    /// An equation block with the expression cut to [`EXPRESSION_MAX_LENGTH`], or `None` when it is empty.
    pub fn convert_equation(&mut self, element: &HtmlElement) -> Option<Block> {
        let expression = equation_expression(element);
        if expression.is_empty() {
            return None;
        }
        Some(Block::Equation(EquationBody {
            expression: truncate_chars(&expression, EXPRESSION_MAX_LENGTH).to_string(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;
    use crate::stats::ImportStat;
    use rstest::rstest;
    use serde_json::{Value, json};

    fn convert_with(html: &str, options: &ConversionOptions) -> (Value, Vec<ConversionIssue>) {
        let parsed = parse_html(html, options.max_depth);
        let mut stats = ImportStat::default();
        let mut converter = Converter::new(options, &mut stats);
        let children = converter.convert_nodes(&parsed.body);
        (
            serde_json::to_value(children).unwrap(),
            converter.into_diagnostics().into_issues(),
        )
    }

    fn convert(html: &str) -> Value {
        convert_with(html, &ConversionOptions::default()).0
    }

    fn text(content: &str) -> Value {
        json!({"type": "text", "plain_text": content, "text": {"content": content}})
    }

    #[rstest]
    #[case("h1", "heading_1")]
    #[case("h2", "heading_2")]
    #[case("h3", "heading_3")]
    #[case("h6", "heading_3")]
    fn test_heading_levels(#[case] tag: &str, #[case] expected: &str) {
        let value = convert(&format!("<{tag}>Title</{tag}>"));
        assert_eq!(value[0]["type"], json!(expected));
        assert_eq!(value[0][expected]["rich_text"], json!([text("Title")]));
    }

    #[test]
    fn test_empty_heading_is_dropped() {
        assert_eq!(convert("<h2>  </h2>"), json!([]));
    }

    #[test]
    fn test_toggle_heading_moves_uploads_to_children() {
        let value = convert(
            r#"<h2 data-toggle="true">Details<img src="https://e.com/a.png" data-notion-file-upload-id="up-1"></h2>"#,
        );

        assert_eq!(
            value,
            json!([{
                "object": "block",
                "type": "toggle",
                "toggle": {
                    "rich_text": [text("Details")],
                    "children": [{"object": "block", "type": "image", "image": {"type": "file_upload", "file_upload": {"id": "up-1"}}}]
                }
            }])
        );
    }

    #[test]
    fn test_heading_keeps_external_images_inline() {
        let value = convert(r#"<h1>A<img src="https://e.com/a.png"></h1>"#);
        assert_eq!(value[0]["heading_1"]["rich_text"].as_array().unwrap().len(), 2);
        assert!(value[0]["heading_1"].get("children").is_none());
    }

    #[test]
    fn test_paragraph_is_split_around_images() {
        let value = convert(r#"<p>before<img src="https://e.com/a.png"><img src="https://e.com/b.png">after</p>"#);
        let types: Vec<&str> = value.as_array().unwrap().iter().map(|b| b["type"].as_str().unwrap()).collect();
        assert_eq!(types, vec!["paragraph", "image", "image", "paragraph"]);
    }

    #[test]
    fn test_paragraph_merges_adjacent_text() {
        let html = "<p>a<span>b</span><b>c</b><strong>d</strong></p>";
        let merged = convert(html);
        assert_eq!(merged[0]["paragraph"]["rich_text"].as_array().unwrap().len(), 2);

        let options = ConversionOptions {
            merge_adjacent_text: false,
            ..Default::default()
        };
        let (unmerged, _) = convert_with(html, &options);
        assert_eq!(unmerged[0]["paragraph"]["rich_text"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_empty_paragraph() {
        assert_eq!(
            convert("<p></p>"),
            json!([{"object": "block", "type": "paragraph", "paragraph": {"rich_text": []}}])
        );
    }

    #[test]
    fn test_nested_lists_keep_their_own_kind() {
        let value = convert("<ul><li>A<ol><li>B</li><li>C</li></ol></li><li>D</li></ul>");

        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["type"], json!("bulleted_list_item"));
        assert_eq!(value[0]["bulleted_list_item"]["rich_text"], json!([text("A")]));
        let children = value[0]["bulleted_list_item"]["children"].as_array().unwrap();
        assert_eq!(children.len(), 2);
        assert_eq!(children[0]["type"], json!("numbered_list_item"));
        assert_eq!(children[1]["numbered_list_item"]["rich_text"], json!([text("C")]));
        assert_eq!(value[1]["bulleted_list_item"]["rich_text"], json!([text("D")]));
    }

    #[test]
    fn test_list_item_media_moves_to_children() {
        let value = convert(r#"<ol><li><h3>Step</h3><img src="https://e.com/a.png"></li></ol>"#);
        assert_eq!(
            value,
            json!([{
                "object": "block",
                "type": "numbered_list_item",
                "numbered_list_item": {
                    "rich_text": [text("Step")],
                    "children": [{"object": "block", "type": "image", "image": {"type": "external", "external": {"url": "https://e.com/a.png"}}}]
                }
            }])
        );
    }

    #[test]
    fn test_empty_list() {
        let (value, issues) = convert_with("<ul></ul>", &ConversionOptions::default());
        assert_eq!(value, json!([]));
        assert_eq!(issues, vec![ConversionIssue::EmptyList { tag_name: "ul".to_string() }]);
    }

    #[test]
    fn test_menu_is_converted_as_bulleted_list() {
        let (value, issues) = convert_with("<menu><li>x</li></menu>", &ConversionOptions::default());
        assert_eq!(value[0]["type"], json!("bulleted_list_item"));
        assert_eq!(
            issues,
            vec![ConversionIssue::UnsupportedListType {
                list_type: "menu".to_string()
            }]
        );
    }

    #[test]
    fn test_divider() {
        assert_eq!(convert("<hr>"), json!([{"object": "block", "type": "divider", "divider": {}}]));
    }

    #[test]
    fn test_generic_table() {
        let value = convert(
            r#"<table data-caption="Scores">
                <tr><th data-column-type="date">When</th><th>Who</th></tr>
                <tr><td>Mon</td><td><img src="https://e.com/a.png" data-notion-file-upload-id="up-1">Ann</td><td>extra</td></tr>
            </table>"#,
        );

        assert_eq!(
            value,
            json!([{
                "object": "block",
                "type": "table",
                "table": {
                    "has_row_header": false,
                    "has_column_header": true,
                    "table_width": 3,
                    "caption": "Scores",
                    "children": [
                        {"type": "table_row", "table_row": {"cells": [
                            [{"type": "date", "plain_text": "When", "text": {"content": "When"}}],
                            [text("Who")]
                        ]}},
                        {"type": "table_row", "table_row": {"cells": [
                            [text("Mon")],
                            [
                                {"type": "files", "files": [{"object": "block", "type": "image", "image": {"type": "file_upload", "file_upload": {"id": "up-1"}}}]},
                                text("Ann")
                            ],
                            [text("extra")]
                        ]}}
                    ]
                }
            }])
        );
    }

    #[test]
    fn test_header_hint_skips_leading_media() {
        let value = convert(r#"<table><tr><th data-column-type="date"><img src="https://e.com/a.png">When</th></tr></table>"#);

        assert_eq!(
            value[0]["table"]["children"][0]["table_row"]["cells"][0],
            json!([
                {"object": "block", "type": "image", "image": {"type": "external", "external": {"url": "https://e.com/a.png"}}},
                text("When")
            ])
        );
    }

    #[test]
    fn test_table_without_rows() {
        let mut stats = ImportStat::default();
        let options = ConversionOptions::default();
        let mut converter = Converter::new(&options, &mut stats);
        let table = HtmlElement::new("table", FxHashMap::default(), vec![]);

        assert!(converter.convert_table(&table).is_none());
        assert_eq!(converter.into_diagnostics().into_issues(), vec![ConversionIssue::EmptyTable]);
    }

    #[rstest]
    #[case::database_mode(ConversionMode::Database, "<table><tr><th>Name</th></tr><tr><td>x</td></tr></table>")]
    #[case::simple_table(
        ConversionMode::Page,
        r#"<table data-coda-grid-configuration-set="SimpleTable"><tr><th>Name</th></tr><tr><td>x</td></tr></table>"#
    )]
    fn test_database_tables(#[case] mode: ConversionMode, #[case] html: &str) {
        let options = ConversionOptions {
            mode,
            ..Default::default()
        };
        let (value, _) = convert_with(html, &options);
        assert_eq!(
            value[0]["table"]["rows"],
            json!([{"Name": {"rich_text": [{"type": "text", "text": {"content": "x"}}]}}])
        );
        assert!(value[0].get("object").is_none());
    }

    #[test]
    fn test_quote_moves_media_to_children() {
        let value = convert(r#"<blockquote>Be <i>brave</i><img src="https://e.com/a.png"></blockquote>"#);
        assert_eq!(value[0]["type"], json!("quote"));
        assert_eq!(value[0]["quote"]["rich_text"].as_array().unwrap().len(), 2);
        assert_eq!(value[0]["quote"]["children"][0]["type"], json!("image"));
    }

    #[rstest]
    #[case::class(r#"<pre><code class="language-rust">fn main() {}</code></pre>"#, "rust", vec![])]
    #[case::alias(r#"<pre class="lang-py"><code>print(1)</code></pre>"#, "python", vec![])]
    #[case::attribute(r#"<pre data-language="SQL">select 1</pre>"#, "sql", vec![])]
    #[case::none("<pre>plain</pre>", "plain text", vec![])]
    #[case::unsupported(
        r#"<pre><code class="language-brainfuck">+</code></pre>"#,
        "plain text",
        vec![ConversionIssue::UnsupportedLanguage { language: "brainfuck".to_string() }]
    )]
    fn test_code_language(#[case] html: &str, #[case] language: &str, #[case] issues: Vec<ConversionIssue>) {
        let (value, reported) = convert_with(html, &ConversionOptions::default());
        assert_eq!(value[0]["code"]["language"], json!(language));
        assert_eq!(reported, issues);
    }

    #[test]
    fn test_code_keeps_whitespace_and_line_breaks() {
        let value = convert("<pre><code><span>fn</span> <span>main</span>()<br>  {}</code></pre>");
        assert_eq!(value[0]["code"]["rich_text"], json!([text("fn main()\n  {}")]));
    }

    #[test]
    fn test_long_code_is_chunked() {
        let code = "x".repeat(TEXT_MAX_LENGTH * (RICHTEXT_ARRAY_LENGTH + 1));
        let value = convert(&format!("<pre>{code}</pre>"));

        assert_eq!(value.as_array().unwrap().len(), 2);
        assert_eq!(value[0]["code"]["rich_text"].as_array().unwrap().len(), RICHTEXT_ARRAY_LENGTH);
        assert_eq!(value[1]["code"]["rich_text"].as_array().unwrap().len(), 1);
    }

    #[rstest]
    #[case::attribute(r#"<div data-equation="E = mc^2"></div>"#, "E = mc^2")]
    #[case::mathml(
        r#"<math><semantics><mi>x</mi><annotation encoding="application/x-tex">x^2</annotation></semantics></math>"#,
        "x^2"
    )]
    #[case::math_text("<math><mi>y</mi></math>", "y")]
    fn test_equation(#[case] html: &str, #[case] expected: &str) {
        let value = convert(html);
        assert_eq!(
            value,
            json!([{"object": "block", "type": "equation", "equation": {"expression": expected}}])
        );
    }

    #[test]
    fn test_equation_is_truncated() {
        let expression = "a".repeat(EXPRESSION_MAX_LENGTH + 10);
        let value = convert(&format!(r#"<span data-equation="{expression}"></span>"#));
        assert_eq!(
            value[0]["equation"]["expression"].as_str().unwrap().chars().count(),
            EXPRESSION_MAX_LENGTH
        );
    }

    #[test]
    fn test_inline_runs_and_containers() {
        let value = convert("Loose <b>text</b><div><p>One</p><div>Two</div></div><script>x()</script>tail");
        let paragraphs: Vec<Value> = value
            .as_array()
            .unwrap()
            .iter()
            .map(|block| block["paragraph"]["rich_text"][0]["plain_text"].clone())
            .collect();
        assert_eq!(paragraphs, vec![json!("Loose "), json!("One"), json!("Two"), json!("tail")]);
    }

    #[test]
    fn test_unknown_elements_are_reported() {
        let (value, issues) = convert_with("<video src=\"v.mp4\"></video>", &ConversionOptions::default());
        assert_eq!(value, json!([]));
        assert_eq!(
            issues,
            vec![ConversionIssue::UnsupportedTag {
                tag_name: "video".to_string()
            }]
        );
    }

    #[rstest]
    #[case("rust", Some("rust"))]
    #[case("C++", Some("c++"))]
    #[case("ts", Some("typescript"))]
    #[case("klingon", None)]
    fn test_valid_language(#[case] input: &str, #[case] expected: Option<&str>) {
        assert_eq!(valid_language(input), expected);
    }
}
