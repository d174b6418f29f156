use super::database::{DateValue, OptionName, PropertyMap, TextContent};
use super::node::HtmlElement;
use super::rich_text::{TEXT_MAX_LENGTH, URL_MAX_LENGTH, truncate_chars};
use itertools::Itertools;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TitleText {
    pub text: TextContent,
}

/// A page property derived from document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageProperty {
    Title { id: String, title: Vec<TitleText> },
    Url { url: String },
    MultiSelect { multi_select: Vec<OptionName> },
    Date { date: DateValue },
}

/// Metadata read from `<head>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageMetadata {
    pub title: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    pub created: Option<String>,
}

fn meta_content<'a>(metas: &[&'a HtmlElement], key: &str, value: &str) -> Option<&'a str> {
    metas
        .iter()
        .find(|meta| meta.attr(key).is_some_and(|v| v.eq_ignore_ascii_case(value)))
        .and_then(|meta| meta.non_empty_attr("content"))
        .map(str::trim)
        .filter(|content| !content.is_empty())
}

impl PageMetadata {
    pub fn from_head(head: &HtmlElement) -> Self {
        let metas = head.find_all(&["meta"]);

        let title = head
            .find("title")
            .map(|title| title.text_content().trim().to_string())
            .filter(|title| !title.is_empty());

        let canonical = head
            .find_all(&["link"])
            .into_iter()
            .find(|link| {
                link.attr("rel")
                    .is_some_and(|rel| rel.split_whitespace().any(|r| r.eq_ignore_ascii_case("canonical")))
            })
            .and_then(|link| link.non_empty_attr("href"))
            .map(str::trim);
        let url = canonical
            .or_else(|| meta_content(&metas, "property", "og:url"))
            .map(str::to_string);

        let tags = meta_content(&metas, "name", "keywords")
            .map(|keywords| {
                keywords
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .unique()
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let created = meta_content(&metas, "name", "created")
            .or_else(|| meta_content(&metas, "property", "article:published_time"))
            .map(str::to_string);

        Self {
            title,
            url,
            tags,
            created,
        }
    }

    /// Page properties for every metadata value that is present.
    pub fn into_properties(self) -> PropertyMap<PageProperty> {
        let mut properties = PropertyMap::default();

        if let Some(title) = self.title {
            properties.insert(
                "title",
                PageProperty::Title {
                    id: "title".to_string(),
                    title: vec![TitleText {
                        text: TextContent {
                            content: truncate_chars(&title, TEXT_MAX_LENGTH).to_string(),
                        },
                    }],
                },
            );
        }
        if let Some(url) = self.url {
            properties.insert(
                "URL",
                PageProperty::Url {
                    url: truncate_chars(&url, URL_MAX_LENGTH).to_string(),
                },
            );
        }
        if !self.tags.is_empty() {
            properties.insert(
                "Tags",
                PageProperty::MultiSelect {
                    multi_select: self.tags.into_iter().map(|name| OptionName { name }).collect(),
                },
            );
        }
        if let Some(start) = self.created {
            properties.insert("Created", PageProperty::Date { date: DateValue { start } });
        }

        tracing::debug!(properties = properties.len(), "Extracted page properties");
        properties
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_html;
    use rstest::rstest;
    use serde_json::json;

    fn metadata(head: &str) -> PageMetadata {
        let parsed = parse_html(&format!("<html><head>{head}</head><body></body></html>"), 64);
        PageMetadata::from_head(&parsed.head.unwrap())
    }

    #[test]
    fn test_full_metadata() {
        let properties = metadata(
            r#"<title> My page </title>
            <link rel="canonical" href="https://example.com/page">
            <meta property="og:url" content="https://example.com/og">
            <meta name="keywords" content="rust, html, , rust,notion">
            <meta name="created" content="2024-03-01">"#,
        )
        .into_properties();

        assert_eq!(
            serde_json::to_value(properties).unwrap(),
            json!({
                "title": {"id": "title", "type": "title", "title": [{"text": {"content": "My page"}}]},
                "URL": {"type": "url", "url": "https://example.com/page"},
                "Tags": {"type": "multi_select", "multi_select": [{"name": "rust"}, {"name": "html"}, {"name": "notion"}]},
                "Created": {"type": "date", "date": {"start": "2024-03-01"}}
            })
        );
    }

    #[rstest]
    #[case::og_url(
        r#"<meta property="og:url" content="https://example.com/og">"#,
        PageMetadata { url: Some("https://example.com/og".to_string()), ..Default::default() }
    )]
    #[case::published_time(
        r#"<meta property="article:published_time" content="2023-12-24T10:00:00Z">"#,
        PageMetadata { created: Some("2023-12-24T10:00:00Z".to_string()), ..Default::default() }
    )]
    #[case::blank_title("<title>   </title>", PageMetadata::default())]
    fn test_partial_metadata(#[case] head: &str, #[case] expected: PageMetadata) {
        assert_eq!(metadata(head), expected);
    }

    #[test]
    fn test_empty_metadata_has_no_properties() {
        assert!(PageMetadata::default().into_properties().is_empty());
    }
}
