use super::{FacilityType, NewComment, NewFacility};
use std::fmt;

/// Write-path validation errors for new facilities
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    MissingTitle,
    InvalidLocation,
    ParentNotAllowed,
    MissingParent(FacilityType),
    ParentNotFound(String),
    ParentNotGym(String),
    MissingAuthor,
    EmptyComment,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::MissingTitle => write!(f, "title is required"),
            ValidationError::InvalidLocation => {
                write!(f, "location must be a valid latitude/longitude pair")
            }
            ValidationError::ParentNotAllowed => write!(f, "a gym cannot have a parent"),
            ValidationError::MissingParent(t) => {
                write!(f, "{} must be attached to a parent gym", t)
            }
            ValidationError::ParentNotFound(id) => write!(f, "parent '{}' does not exist", id),
            ValidationError::ParentNotGym(id) => write!(f, "parent '{}' is not a gym", id),
            ValidationError::MissingAuthor => write!(f, "authorId is required"),
            ValidationError::EmptyComment => write!(f, "comment text is required"),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Validates a new facility against the directory.
///
/// Rules:
/// - Title must be non-blank
/// - Location must be within valid coordinate ranges
/// - A gym must not reference a parent
/// - Every other kind must reference an existing gym
///
/// `parent_type` resolves an id to the type of the stored object, if any.
pub fn validate_new_facility<F>(new: &NewFacility, parent_type: F) -> Result<(), ValidationError>
where
    F: Fn(&str) -> Option<FacilityType>,
{
    if new.title.trim().is_empty() {
        return Err(ValidationError::MissingTitle);
    }

    if !new.location.is_valid() {
        return Err(ValidationError::InvalidLocation);
    }

    let parent_id = new.parent_facility_id.as_deref().filter(|id| !id.is_empty());

    if new.facility_type.is_top_level() {
        if parent_id.is_some() {
            return Err(ValidationError::ParentNotAllowed);
        }
        return Ok(());
    }

    let parent_id = parent_id.ok_or(ValidationError::MissingParent(new.facility_type))?;
    match parent_type(parent_id) {
        None => Err(ValidationError::ParentNotFound(parent_id.to_string())),
        Some(t) if !t.is_top_level() => Err(ValidationError::ParentNotGym(parent_id.to_string())),
        Some(_) => Ok(()),
    }
}

/// A comment needs an author and some non-blank text.
pub fn validate_new_comment(new: &NewComment) -> Result<(), ValidationError> {
    if new.author_id.trim().is_empty() {
        return Err(ValidationError::MissingAuthor);
    }
    if new.text.trim().is_empty() {
        return Err(ValidationError::EmptyComment);
    }
    Ok(())
}
