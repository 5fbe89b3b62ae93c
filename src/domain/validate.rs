//! Draft schema validation applied when a writer submits for review.

use serde::Serialize;

use crate::domain::entities::{ArticleRecord, MAX_TAGS};

pub const TITLE_MAX_CHARS: usize = 180;
pub const EXCERPT_MAX_CHARS: usize = 300;

/// A single failed constraint, addressed to the field the writer must fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

/// All constraint failures found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct ValidationReport {
    pub fields: Vec<FieldError>,
}

impl ValidationReport {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.fields.push(FieldError {
            field,
            message: message.into(),
        });
    }
}

impl std::fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for error in &self.fields {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{}: {}", error.field, error.message)?;
            first = false;
        }
        Ok(())
    }
}

/// Check the constraints a draft must satisfy before entering review.
pub fn validate_for_submit(article: &ArticleRecord) -> Result<(), ValidationReport> {
    let mut report = ValidationReport::default();

    let title = article.title.trim();
    if title.is_empty() {
        report.push("title", "title is required");
    } else if title.chars().count() > TITLE_MAX_CHARS {
        report.push(
            "title",
            format!("title exceeds {TITLE_MAX_CHARS} characters"),
        );
    }

    let excerpt = article.excerpt.trim();
    if excerpt.is_empty() {
        report.push("excerpt", "excerpt is required");
    } else if excerpt.chars().count() > EXCERPT_MAX_CHARS {
        report.push(
            "excerpt",
            format!("excerpt exceeds {EXCERPT_MAX_CHARS} characters"),
        );
    }

    if article.category_slug.trim().is_empty() {
        report.push("category", "category is required");
    }

    if article.tags.len() > MAX_TAGS {
        report.push("tags", format!("at most {MAX_TAGS} tags are allowed"));
    }

    if article.featured_image.is_none() {
        report.push("featured_image", "a featured image is required");
    }

    if article.body.is_empty() {
        report.push("content", "article body must not be empty");
    }

    if report.is_empty() {
        Ok(())
    } else {
        Err(report)
    }
}
