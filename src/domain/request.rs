use serde_json::Value;

use crate::app::AcquisitionError;

/// A validated lookup: the free-text title to resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    title: String,
}

impl LookupRequest {
    /// Build a request from a title, rejecting the empty string.
    ///
    /// The title is kept exactly as given; no trimming or case folding.
    pub fn new(title: impl Into<String>) -> Result<Self, AcquisitionError> {
        let title = title.into();
        if title.is_empty() {
            return Err(AcquisitionError::invalid_input(
                "Invalid request: title must not be empty",
            ));
        }
        Ok(Self { title })
    }

    /// Validate an inbound JSON body.
    ///
    /// Valid iff the body is an object carrying a non-empty string `title`.
    pub fn from_value(body: &Value) -> Result<Self, AcquisitionError> {
        match body.get("title") {
            Some(Value::String(title)) => Self::new(title.clone()),
            Some(_) => Err(AcquisitionError::invalid_input(
                "Invalid request: title must be a string",
            )),
            None => Err(AcquisitionError::invalid_input(
                "Invalid request: missing title",
            )),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }
}
