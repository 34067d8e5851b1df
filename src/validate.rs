//! Write-path validation for content items and contact messages.
//!
//! Every check runs before any insert or update is issued, so a rejected
//! payload never produces a partial write.

use lazy_static::lazy_static;
use regex::Regex;

use crate::db::models::ProjectLinks;

/// Upper bound on tags per item.
pub const MAX_TAGS: usize = 10;

lazy_static! {
    /// Basic http(s) URL shape. Deliberately loose: the stored value is a
    /// display link, not a parsed URL.
    static ref URL_REGEX: Regex = Regex::new(r"^https?://[^\s$.?#].[^\s]*$").unwrap();
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Title cannot be empty.")]
    EmptyTitle,
    #[error("Description cannot be empty.")]
    EmptySlug,
    #[error("Too many tags. Max is {}.", MAX_TAGS)]
    TooManyTags,
    #[error("Invalid website URL.")]
    InvalidWebsiteUrl,
    #[error("Invalid GitHub URL.")]
    InvalidGithubUrl,
    #[error("Reference label cannot be empty.")]
    EmptyReferenceLabel,
    #[error("Reference URL \"{0}\" is invalid.")]
    InvalidReferenceUrl(String),
}

pub fn is_valid_url(url: &str) -> bool {
    URL_REGEX.is_match(url)
}

/// Validate the author-editable fields of a content item.
///
/// Applied on both the create and the update path (the update path is
/// intentionally symmetric, see DESIGN.md).
pub fn validate_item(
    title: &str,
    slug: &str,
    tags: &[String],
    links: Option<&ProjectLinks>,
) -> Result<(), ValidationError> {
    if title.trim().is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if slug.trim().is_empty() {
        return Err(ValidationError::EmptySlug);
    }
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooManyTags);
    }

    if let Some(links) = links {
        if let Some(website) = links.website.as_deref() {
            if !is_valid_url(website) {
                return Err(ValidationError::InvalidWebsiteUrl);
            }
        }
        if let Some(github) = links.github.as_deref() {
            if !is_valid_url(github) {
                return Err(ValidationError::InvalidGithubUrl);
            }
        }
        for reference in &links.references {
            if reference.label.trim().is_empty() {
                return Err(ValidationError::EmptyReferenceLabel);
            }
            if !is_valid_url(&reference.url) {
                return Err(ValidationError::InvalidReferenceUrl(reference.url.clone()));
            }
        }
    }

    Ok(())
}
