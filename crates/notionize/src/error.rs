use miette::Diagnostic;
use thiserror::Error;

/// How severe a [`ConversionIssue`] is. None of them stop a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    /// A field was left empty or degraded.
    ValidationWarning,
    /// An input produced no output at all.
    EmptyInput,
    /// Something unknown was replaced by a default representation.
    UnsupportedFeature,
}

#[derive(Debug, Clone, PartialEq, Eq, Error, Diagnostic)]
pub enum ConversionIssue {
    #[error("Link href is empty")]
    #[diagnostic(
        code(notionize::link::empty_href),
        help("The text is kept, but it will not be linked.")
    )]
    EmptyHref,

    #[error("Image src is empty")]
    #[diagnostic(code(notionize::image::empty_src))]
    EmptyImageSource,

    #[error("Invalid image source: {src}")]
    #[diagnostic(
        code(notionize::image::invalid_src),
        help("Images need an http(s) URL or a file upload id.")
    )]
    InvalidImageSource { src: String },

    #[error("No list items found in <{tag_name}>")]
    #[diagnostic(code(notionize::list::empty))]
    EmptyList { tag_name: String },

    #[error("Unsupported list item type: {list_type}")]
    #[diagnostic(code(notionize::list::unsupported_type))]
    UnsupportedListType { list_type: String },

    #[error("No rows found in table")]
    #[diagnostic(
        code(notionize::table::no_rows),
        help("A table needs at least one <tr> to be converted.")
    )]
    EmptyTable,

    #[error("Unsupported code language: {language}")]
    #[diagnostic(code(notionize::code::unsupported_language), help("Falling back to \"plain text\"."))]
    UnsupportedLanguage { language: String },

    #[error("Unsupported column type: {column_type}")]
    #[diagnostic(code(notionize::database::unsupported_column), help("The column is stored as rich text."))]
    UnsupportedColumnType { column_type: String },

    #[error("Element <{tag_name}> is not converted")]
    #[diagnostic(code(notionize::block::unsupported_tag))]
    UnsupportedTag { tag_name: String },

    #[error("{count} subtree(s) nested deeper than {max_depth} levels were flattened to text")]
    #[diagnostic(code(notionize::parse::nesting_limit))]
    NestingLimitExceeded { count: usize, max_depth: usize },
}

impl ConversionIssue {
    pub fn kind(&self) -> IssueKind {
        match self {
            ConversionIssue::EmptyHref
            | ConversionIssue::EmptyImageSource
            | ConversionIssue::InvalidImageSource { .. }
            | ConversionIssue::NestingLimitExceeded { .. } => IssueKind::ValidationWarning,
            ConversionIssue::EmptyList { .. } | ConversionIssue::EmptyTable => IssueKind::EmptyInput,
            ConversionIssue::UnsupportedListType { .. }
            | ConversionIssue::UnsupportedLanguage { .. }
            | ConversionIssue::UnsupportedColumnType { .. }
            | ConversionIssue::UnsupportedTag { .. } => IssueKind::UnsupportedFeature,
        }
    }
}

/// Collects the issues of one conversion and logs each one as it is reported.
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    issues: Vec<ConversionIssue>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, issue: ConversionIssue) {
        match (&issue, issue.kind()) {
            (ConversionIssue::EmptyTable, _) => tracing::error!("{}", issue),
            (_, IssueKind::UnsupportedFeature) => tracing::debug!("{}", issue),
            (_, IssueKind::ValidationWarning | IssueKind::EmptyInput) => tracing::warn!("{}", issue),
        }
        self.issues.push(issue);
    }

    pub fn issues(&self) -> &[ConversionIssue] {
        &self.issues
    }

    pub fn into_issues(self) -> Vec<ConversionIssue> {
        self.issues
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }
}
