//! Contains structs, enums' and functions common to async and blocking implementation of schema
//! registry. So stuff dealing with building the requests, reading the responses, and the errors.
use core::fmt;
use std::io::Read;
use std::str::FromStr;
use std::time::Duration;

use flate2::read::MultiGzDecoder;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, CONTENT_ENCODING, CONTENT_TYPE,
};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::warn;
use url::Url;

use crate::error::{ResourceError, SRCError};

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const CONTENT_TYPE_SCHEMA_JSON: &str = "application/vnd.schemaregistry.v1+json";
pub const GZIP_ENCODING: &str = "gzip";
const ACCEPT_VALUE: &str = "application/json, application/vnd.schemaregistry.v1+json";

/// The only string accepted as version, besides a positive number.
pub const LATEST_VERSION: &str = "latest";

#[derive(Clone)]
pub(crate) enum SrAuthorization {
    None,
    Token(String),
    Basic(String, Option<String>),
}

impl fmt::Debug for SrAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            SrAuthorization::None => write!(f, "None"),
            SrAuthorization::Token(_) => write!(f, "Token"),
            SrAuthorization::Basic(_, _) => write!(f, "Basic"),
        }
    }
}

/// One registered version of the schema of a subject, as retrieved from the schema registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    pub schema: String,
    pub subject: String,
    pub version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct SchemaOnly {
    pub schema: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IdOnly {
    pub id: u32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct IsCompatible {
    pub is_compatible: bool,
}

/// Error envelope as send by the schema registry, a missing code is read as zero.
#[derive(Debug, Deserialize)]
pub(crate) struct RawError {
    #[serde(default)]
    pub error_code: i32,
    pub method: Option<String>,
    pub uri: Option<String>,
    pub message: Option<String>,
}

impl RawError {
    fn into_resource_error(self) -> ResourceError {
        ResourceError::new(
            self.error_code,
            self.method.as_deref().unwrap_or_default(),
            self.uri.as_deref().unwrap_or_default(),
            self.message.as_deref().unwrap_or_default(),
        )
    }
}

/// Deleted versions might be returned as numbers or strings, both end up as string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DeletedVersion {
    Number(i64),
    Text(String),
}

impl From<DeletedVersion> for String {
    fn from(v: DeletedVersion) -> Self {
        match v {
            DeletedVersion::Number(n) => n.to_string(),
            DeletedVersion::Text(s) => s,
        }
    }
}

/// Version of a schema for a subject. Either the latest, or a specific version, which needs to be
/// a positive number.
/// ```
/// use schema_registry_client::schema_registry_common::SchemaVersion;
/// assert_eq!(Ok(SchemaVersion::Latest), "latest".parse::<SchemaVersion>());
/// assert_eq!(Ok(SchemaVersion::Number(3)), "3".parse::<SchemaVersion>());
/// assert!("0".parse::<SchemaVersion>().is_err());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchemaVersion {
    Latest,
    Number(i32),
}

impl SchemaVersion {
    /// Validates the version, any positive 32 bit signed number is valid.
    pub fn check(&self) -> Result<(), SRCError> {
        match self {
            SchemaVersion::Latest => Ok(()),
            SchemaVersion::Number(n) if *n > 0 => Ok(()),
            SchemaVersion::Number(n) => Err(SRCError::invalid_version(n)),
        }
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SchemaVersion::Latest => write!(f, "{}", LATEST_VERSION),
            SchemaVersion::Number(n) => write!(f, "{}", n),
        }
    }
}

impl FromStr for SchemaVersion {
    type Err = SRCError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == LATEST_VERSION {
            return Ok(SchemaVersion::Latest);
        }
        match s.parse::<i32>() {
            Ok(n) => {
                let version = SchemaVersion::Number(n);
                version.check()?;
                Ok(version)
            }
            Err(_) => Err(SRCError::invalid_version(s)),
        }
    }
}

/// Returns an error when the value is empty, for use before doing any call.
pub(crate) fn check_required(value: &str, field: &str) -> Result<(), SRCError> {
    if value.is_empty() {
        Err(SRCError::required(field))
    } else {
        Ok(())
    }
}

/// Checks the base url is present and an absolute uri.
pub(crate) fn check_base_url(url: &str) -> Result<(), SRCError> {
    if url.is_empty() {
        return Err(SRCError::invalid_argument_without_cause(
            "client: baseUrl is required",
        ));
    }
    match Url::parse(url) {
        Ok(_) => Ok(()),
        Err(e) => Err(SRCError::invalid_argument_with_cause(
            e,
            &format!("client: {} is not a valid url", url),
        )),
    }
}

pub(crate) fn schema_body(schema: &str) -> Result<String, SRCError> {
    serde_json::to_string(&SchemaOnly {
        schema: String::from(schema),
    })
    .map_err(|e| SRCError::decode_with_cause(e, "could not create body from schema"))
}

/// All the calls that can be done to the schema registry.
#[derive(Debug, Clone, Copy)]
pub enum SrCall<'a> {
    GetSubjects,
    GetVersions(&'a str),
    DeleteSubject(&'a str),
    PostForLookup(&'a str, &'a str),
    PostNew(&'a str, &'a str),
    GetById(u32),
    GetBySubjectAndVersion(&'a str, SchemaVersion),
    PostCompatibility(&'a str, SchemaVersion, &'a str),
}

impl SrCall<'_> {
    pub fn method(&self) -> Method {
        match self {
            SrCall::GetSubjects
            | SrCall::GetVersions(_)
            | SrCall::GetById(_)
            | SrCall::GetBySubjectAndVersion(_, _) => Method::GET,
            SrCall::DeleteSubject(_) => Method::DELETE,
            SrCall::PostForLookup(_, _)
            | SrCall::PostNew(_, _)
            | SrCall::PostCompatibility(_, _, _) => Method::POST,
        }
    }

    /// Path relative to the base url.
    pub fn path(&self) -> String {
        match self {
            SrCall::GetSubjects => String::from("subjects"),
            SrCall::GetVersions(subject) | SrCall::PostNew(subject, _) => {
                format!("subjects/{}/versions", escape(subject))
            }
            SrCall::DeleteSubject(subject) | SrCall::PostForLookup(subject, _) => {
                format!("subjects/{}", escape(subject))
            }
            SrCall::GetById(id) => format!("schemas/{}", id),
            SrCall::GetBySubjectAndVersion(subject, version) => {
                format!("subjects/{}/versions/{}", escape(subject), version)
            }
            SrCall::PostCompatibility(subject, version, _) => format!(
                "compatibility/subjects/{}/versions/{}",
                escape(subject),
                version
            ),
        }
    }

    /// Only set for calls that change the registry. A lookup is posted without content type.
    pub fn content_type(&self) -> Option<&'static str> {
        match self {
            SrCall::PostNew(_, _) | SrCall::PostCompatibility(_, _, _) => {
                Some(CONTENT_TYPE_SCHEMA_JSON)
            }
            _ => None,
        }
    }

    pub fn body(&self) -> Option<&str> {
        match self {
            SrCall::PostForLookup(_, body)
            | SrCall::PostNew(_, body)
            | SrCall::PostCompatibility(_, _, body) => Some(*body),
            _ => None,
        }
    }
}

// Use escape sequences instead of slashes in the subject
fn escape(subject: &str) -> String {
    subject.replace('/', "%2F")
}

pub(crate) fn url_for_call(base_url: &str, path: &str) -> String {
    let path = path.strip_prefix('/').unwrap_or(path);
    format!("{}/{}", base_url, path)
}

/// A single http request to the schema registry, as passed to the transport.
#[derive(Debug, Clone)]
pub struct SrRequest {
    pub method: Method,
    pub url: String,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl SrRequest {
    pub fn for_call(base_url: &str, sr_call: &SrCall) -> SrRequest {
        let mut headers = HeaderMap::new();
        if let Some(content_type) = sr_call.content_type() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static(GZIP_ENCODING));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        SrRequest {
            method: sr_call.method(),
            url: url_for_call(base_url, &sr_call.path()),
            headers,
            body: sr_call
                .body()
                .map(|b| b.as_bytes().to_vec())
                .unwrap_or_default(),
        }
    }
}

/// A single http response from the schema registry, as returned by the transport. The body is a
/// reader for the blocking implementation, and the bytes for the async one.
#[derive(Debug)]
pub struct SrResponse<B> {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: B,
}

fn is_gzip(headers: &HeaderMap) -> bool {
    match headers.get(CONTENT_ENCODING) {
        Some(v) => v.as_bytes() == GZIP_ENCODING.as_bytes(),
        None => false,
    }
}

/// Reads the whole body, decompressing it when the content encoding is gzip.
pub fn read_response_body<R: Read>(headers: &HeaderMap, mut body: R) -> Result<Vec<u8>, SRCError> {
    let mut bytes = Vec::new();
    if is_gzip(headers) {
        let mut decoder = MultiGzDecoder::new(&mut body);
        decoder.read_to_end(&mut bytes).map_err(|e| {
            SRCError::decode_with_cause(e, "client: failed to read gzip compressed content")
        })?;
    } else {
        body.read_to_end(&mut bytes).map_err(|e| {
            SRCError::transport_with_cause(e, "could not read response from schema registry")
        })?;
    }
    Ok(bytes)
}

pub(crate) fn decode_json<T: DeserializeOwned>(bytes: &[u8], target: &str) -> Result<T, SRCError> {
    serde_json::from_slice(bytes)
        .map_err(|e| SRCError::decode_with_cause(e, &format!("could not parse to {}", target)))
}

/// Drains the body of a failed call, and turns it into an error. When the body is not a valid
/// error envelope, the error code will be zero.
pub(crate) fn error_from_response<R: Read>(
    status: StatusCode,
    headers: &HeaderMap,
    body: R,
) -> SRCError {
    let raw_error = read_response_body(headers, body)
        .and_then(|b| decode_json::<RawError>(&b, "schema registry error"));
    let resource_error = match raw_error {
        Ok(r) => r.into_resource_error(),
        Err(e) => {
            warn!(%status, error = %e, "couldn't parse schema registry error json");
            ResourceError::new(0, "", "", "couldn't parse schema registry error json")
        }
    };
    let retriable = matches!(status.as_u16(), 502 | 503);
    SRCError::resource(resource_error, &status.to_string(), retriable)
}

/// Configuration needed to connect to the schema registry, can be read from a json file.
/// ```
/// use schema_registry_client::schema_registry_common::SrConfig;
/// let config = SrConfig::from_json(r#"{"SchemaRegistryUrl":"http://localhost:8081"}"#).unwrap();
/// assert_eq!("http://localhost:8081", config.schema_registry_url);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SrConfig {
    #[serde(rename = "SchemaRegistryUrl", alias = "schema_registry_url")]
    pub schema_registry_url: String,
    #[serde(
        rename = "TimeoutMs",
        alias = "timeout_ms",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub timeout_ms: Option<u64>,
}

impl SrConfig {
    pub fn new(schema_registry_url: &str) -> SrConfig {
        SrConfig {
            schema_registry_url: String::from(schema_registry_url),
            timeout_ms: None,
        }
    }

    pub fn from_json(json: &str) -> Result<SrConfig, SRCError> {
        serde_json::from_str(json)
            .map_err(|e| SRCError::invalid_argument_with_cause(e, "could not read configuration"))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<SrConfig, SRCError> {
        serde_json::from_reader(reader)
            .map_err(|e| SRCError::invalid_argument_with_cause(e, "could not read configuration"))
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.map(Duration::from_millis)
    }
}
