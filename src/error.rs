//! implementation for [`SRCError`] and [`ResourceError`]
use std::error::Error;
use std::fmt;
use std::fmt::Display;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Error code returned by the schema registry when the subject does not exist.
pub const SUBJECT_NOT_FOUND_CODE: i32 = 40401;
/// Error code returned by the schema registry when the version does not exist.
pub const VERSION_NOT_FOUND_CODE: i32 = 40402;
/// Error code returned by the schema registry when the schema does not exist.
pub const SCHEMA_NOT_FOUND_CODE: i32 = 40403;
pub const INVALID_SCHEMA_CODE: i32 = 42201;
pub const INVALID_VERSION_CODE: i32 = 42202;

/// Error as send by the schema registry for a call that did not succeed. The uri is kept in its
/// unescaped form.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceError {
    pub error_code: i32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub method: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uri: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
}

impl ResourceError {
    pub fn new(error_code: i32, method: &str, uri: &str, message: &str) -> ResourceError {
        ResourceError {
            error_code,
            method: String::from(method),
            uri: query_unescape(uri),
            message: String::from(message),
        }
    }
}

impl Error for ResourceError {}

impl fmt::Display for ResourceError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "client: ({}: {}) failed with error: {}{}",
            self.uri, self.method, self.error_code, self.message
        )
    }
}

/// Same rules as for a query string, so a `+` becomes a space.
fn query_unescape(uri: &str) -> String {
    let spaced = uri.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(v) => v.into_owned(),
        Err(e) => {
            warn!(uri, error = %e, "could not unescape uri from schema registry error");
            String::from(uri)
        }
    }
}

/// The kind of failure, mainly to tell errors detected before doing any call apart from the ones
/// returned by the schema registry.
#[derive(Clone, Debug, PartialEq)]
pub enum SRCErrorKind {
    /// Settings could not be used to create a client.
    InvalidArgument,
    /// A mandatory input was missing or invalid, no call was done.
    Required,
    /// The schema registry answered with a non successful status.
    Resource(ResourceError),
    /// The call could not be completed.
    Transport,
    /// The response could not be read or parsed.
    Decode,
}

/// Error struct which makes it easy to know what kind of error it is, and whether trying it again
/// might not cause an error.
#[derive(Clone, Debug, PartialEq)]
pub struct SRCError {
    pub error: String,
    pub cause: Option<String>,
    pub retriable: bool,
    pub kind: SRCErrorKind,
}

/// Implements standard error so error handling can be simplified
impl Error for SRCError {}

/// Gives the information from the error in a readable format.
impl fmt::Display for SRCError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match &self.cause {
            Some(cause) => write!(
                f,
                "Error: {}, was cause by {}, it's retriable: {}",
                self.error, &cause, self.retriable
            ),
            None => write!(
                f,
                "Error: {} had no other cause, it's retriable: {}",
                self.error, self.retriable
            ),
        }
    }
}

impl SRCError {
    pub fn new(error: &str, cause: Option<String>, retriable: bool, kind: SRCErrorKind) -> SRCError {
        SRCError {
            error: error.to_owned(),
            cause,
            retriable,
            kind,
        }
    }
    pub fn invalid_argument_with_cause<T: Display>(cause: T, error: &str) -> SRCError {
        SRCError::new(
            error,
            Some(format!("{}", cause)),
            false,
            SRCErrorKind::InvalidArgument,
        )
    }
    pub fn invalid_argument_without_cause(error: &str) -> SRCError {
        SRCError::new(error, None, false, SRCErrorKind::InvalidArgument)
    }
    /// Used when a mandatory value, like the subject, is empty.
    pub fn required(field: &str) -> SRCError {
        SRCError::new(
            &format!("client: {} is required", field),
            None,
            false,
            SRCErrorKind::Required,
        )
    }
    pub fn invalid_version<T: Display>(version: T) -> SRCError {
        SRCError::new(
            &format!(
                "client: {} string is not a valid value for versionNumber",
                version
            ),
            None,
            false,
            SRCErrorKind::Required,
        )
    }
    pub fn transport_with_cause<T: Display>(cause: T, error: &str) -> SRCError {
        SRCError::new(
            error,
            Some(format!("{}", cause)),
            true,
            SRCErrorKind::Transport,
        )
    }
    pub fn decode_with_cause<T: Display>(cause: T, error: &str) -> SRCError {
        SRCError::new(
            error,
            Some(format!("{}", cause)),
            false,
            SRCErrorKind::Decode,
        )
    }
    /// Wraps the error returned by the schema registry, the cause has the http status.
    pub fn resource(resource_error: ResourceError, status: &str, retriable: bool) -> SRCError {
        SRCError::new(
            &resource_error.to_string(),
            Some(format!(
                "HTTP request to schema registry failed with status {}",
                status
            )),
            retriable,
            SRCErrorKind::Resource(resource_error),
        )
    }

    pub fn resource_error(&self) -> Option<&ResourceError> {
        match &self.kind {
            SRCErrorKind::Resource(r) => Some(r),
            _ => None,
        }
    }
    pub fn has_error_code(&self, code: i32) -> bool {
        matches!(self.resource_error(), Some(r) if r.error_code == code)
    }
    pub fn is_subject_not_found(&self) -> bool {
        self.has_error_code(SUBJECT_NOT_FOUND_CODE)
    }
    pub fn is_schema_not_found(&self) -> bool {
        self.has_error_code(SCHEMA_NOT_FOUND_CODE)
    }
    pub fn is_version_not_found(&self) -> bool {
        self.has_error_code(VERSION_NOT_FOUND_CODE)
    }
}

impl From<ResourceError> for SRCError {
    fn from(resource_error: ResourceError) -> Self {
        SRCError::new(
            &resource_error.to_string(),
            None,
            false,
            SRCErrorKind::Resource(resource_error),
        )
    }
}

fn error_has_code(err: Option<&(dyn Error + 'static)>, code: i32) -> bool {
    let err = match err {
        Some(e) => e,
        None => return false,
    };
    if let Some(e) = err.downcast_ref::<SRCError>() {
        return e.has_error_code(code);
    }
    match err.downcast_ref::<ResourceError>() {
        Some(r) => r.error_code == code,
        None => false,
    }
}

/// True when the error is a schema registry error telling the subject does not exist.
pub fn is_subject_not_found(err: Option<&(dyn Error + 'static)>) -> bool {
    error_has_code(err, SUBJECT_NOT_FOUND_CODE)
}

/// True when the error is a schema registry error telling the schema does not exist.
pub fn is_schema_not_found(err: Option<&(dyn Error + 'static)>) -> bool {
    error_has_code(err, SCHEMA_NOT_FOUND_CODE)
}

/// True when the error is a schema registry error telling the version does not exist.
pub fn is_version_not_found(err: Option<&(dyn Error + 'static)>) -> bool {
    error_has_code(err, VERSION_NOT_FOUND_CODE)
}
