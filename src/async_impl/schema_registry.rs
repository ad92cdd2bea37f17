//! This module contains the code specific for the schema registry.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures::future::{BoxFuture, FutureExt};
use reqwest::header;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::SRCError;
use crate::schema_registry_common::{
    check_base_url, check_required, decode_json, error_from_response, read_response_body,
    schema_body, DeletedVersion, IdOnly, IsCompatible, Schema, SchemaOnly, SchemaVersion,
    SrAuthorization, SrCall, SrConfig, SrRequest, SrResponse,
};

/// Response as returned by an async transport, with the complete body.
pub type SrAsyncResponse = SrResponse<Vec<u8>>;

/// Does exactly one http call. The default one is based on reqwest, but it can be replaced, for
/// example to mock the schema registry.
pub trait SrTransport: fmt::Debug + Send + Sync {
    fn execute(&self, request: SrRequest) -> BoxFuture<'_, Result<SrAsyncResponse, SRCError>>;
}

#[derive(Debug)]
struct ReqwestTransport {
    client: Client,
    authorization: SrAuthorization,
}

impl SrTransport for ReqwestTransport {
    fn execute(&self, request: SrRequest) -> BoxFuture<'_, Result<SrAsyncResponse, SRCError>> {
        async move {
            let builder = self
                .client
                .request(request.method, &request.url)
                .headers(request.headers)
                .body(request.body);
            let response = send_with_auth(builder, &self.authorization).await?;
            let status = response.status();
            let headers = response.headers().clone();
            let body = response.bytes().await.map_err(|e| {
                SRCError::transport_with_cause(e, "could not read response from schema registry")
            })?;
            Ok(SrResponse {
                status,
                headers,
                body: body.to_vec(),
            })
        }
        .boxed()
    }
}

async fn send_with_auth(
    builder: RequestBuilder,
    authentication: &SrAuthorization,
) -> Result<Response, SRCError> {
    match authentication {
        SrAuthorization::None => builder.send().await,
        SrAuthorization::Token(token) => builder.bearer_auth(token).send().await,
        SrAuthorization::Basic(username, password) => {
            builder.basic_auth(username, password.as_ref()).send().await
        }
    }
    .map_err(|e| SRCError::transport_with_cause(e, "http call to schema registry failed"))
}

/// Settings used to do the calls to schema registry. For simple cases you can use `SrSettings::new`
/// or the `SrSettingsBuilder`. Once created they don't change, and can be shared between tasks.
#[derive(Debug, Clone)]
pub struct SrSettings {
    url: String,
    transport: Arc<dyn SrTransport>,
}

/// Struct to create an SrSettings when used with authorization, custom headers, a proxy or a
/// custom timeout.
pub struct SrSettingsBuilder {
    url: String,
    authorization: SrAuthorization,
    headers: DashMap<String, String>,
    proxy: Option<String>,
    no_proxy: bool,
    timeout: Duration,
}

/// Creates a new SrSettings struct that is needed to make calls to the schema registry
/// ```
/// use schema_registry_client::async_impl::schema_registry::SrSettings;
/// let sr_settings = SrSettings::new(String::from("http://localhost:8081")).unwrap();
/// ```
impl SrSettings {
    /// Will create a new SrSettings with default values, the url should be fully qualified like
    /// `"http://localhost:8081"`.
    pub fn new(url: String) -> Result<SrSettings, SRCError> {
        SrSettings::new_builder(url).build()
    }

    /// Will create a new SrSettingsBuilder with default values, the url should be fully qualified
    /// like `"http://localhost:8081"`.
    pub fn new_builder(url: String) -> SrSettingsBuilder {
        SrSettingsBuilder {
            url,
            authorization: SrAuthorization::None,
            headers: DashMap::new(),
            proxy: None,
            no_proxy: false,
            timeout: Duration::ZERO,
        }
    }

    pub fn from_config(config: &SrConfig) -> Result<SrSettings, SRCError> {
        let mut builder = SrSettings::new_builder(config.schema_registry_url.clone());
        if let Some(timeout) = config.timeout() {
            builder.set_timeout(timeout);
        }
        builder.build()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// Builder for SrSettings
/// ```
/// use schema_registry_client::async_impl::schema_registry::{SrSettings};
/// use std::time::Duration;
/// let sr_settings = SrSettings::new_builder(String::from("http://localhost:8081"))
///     .set_basic_authorization("user", Some("secret"))
///     .add_header("foo", "bar")
///     .set_timeout(Duration::from_secs(5))
///     .build().unwrap();
/// ```
impl SrSettingsBuilder {
    /// Sets the token that needs to be used to authenticate
    pub fn set_token_authorization(&mut self, token: &str) -> &mut SrSettingsBuilder {
        self.authorization = SrAuthorization::Token(String::from(token));
        self
    }

    /// Sets basic authentication, for confluent cloud, the username is the API Key and the password
    /// is the API Secret.
    pub fn set_basic_authorization(
        &mut self,
        username: &str,
        password: Option<&str>,
    ) -> &mut SrSettingsBuilder {
        self.authorization =
            SrAuthorization::Basic(String::from(username), password.map(String::from));
        self
    }

    /// Adds a custom header that will be added to every call.
    pub fn add_header(&mut self, key: &str, value: &str) -> &mut SrSettingsBuilder {
        self.headers.insert(String::from(key), String::from(value));
        self
    }

    /// Sets a proxy that will be used for every call.
    pub fn set_proxy(&mut self, proxy_url: &str) -> &mut SrSettingsBuilder {
        self.proxy = Some(String::from(proxy_url));
        self
    }

    /// prevents using any proxy to every call.
    pub fn no_proxy(&mut self) -> &mut SrSettingsBuilder {
        self.no_proxy = true;
        self
    }

    /// Set a timeout for establishing the connection. A zero duration means no timeout.
    pub fn set_timeout(&mut self, duration: Duration) -> &mut SrSettingsBuilder {
        self.timeout = duration;
        self
    }

    /// Build the settings with your own HTTP client.
    ///
    /// NOTE: The other values (headers, proxy, etc.) will still be merged in
    /// and they all have higher precedence than your own builder's configuration.
    pub fn build_with(&mut self, builder: ClientBuilder) -> Result<SrSettings, SRCError> {
        check_base_url(&self.url)?;
        let client = self.build_client(builder)?;
        let transport = ReqwestTransport {
            client,
            authorization: self.authorization.clone(),
        };
        Ok(SrSettings {
            url: self.url.clone(),
            transport: Arc::new(transport),
        })
    }

    /// Build the settings with a transport doing the calls, the authorization, headers, proxy
    /// and timeout are ignored.
    pub fn build_with_transport(
        &mut self,
        transport: Arc<dyn SrTransport>,
    ) -> Result<SrSettings, SRCError> {
        check_base_url(&self.url)?;
        Ok(SrSettings {
            url: self.url.clone(),
            transport,
        })
    }

    /// Build the settings.
    ///
    /// If you need your own client, see `build_with`.
    pub fn build(&mut self) -> Result<SrSettings, SRCError> {
        self.build_with(Client::builder())
    }

    fn build_client(&mut self, mut builder: ClientBuilder) -> Result<Client, SRCError> {
        if !self.headers.is_empty() {
            let mut header_map = header::HeaderMap::new();
            for ref_multi in self.headers.iter() {
                let header_name =
                    HeaderName::from_bytes(ref_multi.key().as_bytes()).map_err(|e| {
                        SRCError::invalid_argument_with_cause(
                            e,
                            &format!("could not create HeaderName from {}", ref_multi.key()),
                        )
                    })?;
                let header_value = HeaderValue::from_str(ref_multi.value()).map_err(|e| {
                    SRCError::invalid_argument_with_cause(
                        e,
                        &format!("could not create HeaderValue from {}", ref_multi.value()),
                    )
                })?;
                header_map.insert(header_name, header_value);
            }
            builder = builder.default_headers(header_map);
        }
        if let Some(proxy) = &self.proxy {
            match reqwest::Proxy::all(proxy) {
                Ok(v) => builder = builder.proxy(v),
                Err(e) => {
                    return Err(SRCError::invalid_argument_with_cause(
                        e,
                        "invalid proxy value",
                    ))
                }
            };
        }
        if self.no_proxy {
            builder = builder.no_proxy()
        }
        if !self.timeout.is_zero() {
            builder = builder.connect_timeout(self.timeout);
        }
        builder.http1_only().build().map_err(|e| {
            SRCError::invalid_argument_with_cause(e, "could not create new client")
        })
    }
}

/// Does the call, and returns the response when the call was successful. Otherwise the error from
/// the schema registry is returned.
pub async fn perform_sr_call(
    sr_settings: &SrSettings,
    sr_call: SrCall<'_>,
) -> Result<SrAsyncResponse, SRCError> {
    let request = SrRequest::for_call(&sr_settings.url, &sr_call);
    debug!(method = %request.method, url = %request.url, "calling schema registry");
    let response = sr_settings.transport.execute(request).await?;
    if response.status.is_success() {
        return Ok(response);
    }
    debug!(status = %response.status, ?sr_call, "schema registry call failed");
    Err(error_from_response(
        response.status,
        &response.headers,
        response.body.as_slice(),
    ))
}

async fn perform_json_call<T: DeserializeOwned>(
    sr_settings: &SrSettings,
    sr_call: SrCall<'_>,
    target: &str,
) -> Result<T, SRCError> {
    let response = perform_sr_call(sr_settings, sr_call).await?;
    let bytes = read_response_body(&response.headers, response.body.as_slice())?;
    decode_json(&bytes, target)
}

pub async fn get_all_subjects(sr_settings: &SrSettings) -> Result<Vec<String>, SRCError> {
    perform_json_call(sr_settings, SrCall::GetSubjects, "list of subjects").await
}

pub async fn get_all_versions(
    sr_settings: &SrSettings,
    subject: &str,
) -> Result<Vec<u32>, SRCError> {
    check_required(subject, "subject")?;
    perform_json_call(sr_settings, SrCall::GetVersions(subject), "list of versions").await
}

pub async fn delete_subject(
    sr_settings: &SrSettings,
    subject: &str,
) -> Result<Vec<String>, SRCError> {
    check_required(subject, "subject")?;
    let deleted: Vec<DeletedVersion> = perform_json_call(
        sr_settings,
        SrCall::DeleteSubject(subject),
        "list of deleted versions",
    )
    .await?;
    Ok(deleted.into_iter().map(String::from).collect())
}

/// Checks whether the schema is already registered for the subject. When the schema registry
/// doesn't know the schema `None` is returned, any other error from the schema registry is
/// returned as error. A decode error means the schema is registered, but the response could not
/// be read.
pub async fn is_registered(
    sr_settings: &SrSettings,
    subject: &str,
    schema: &str,
) -> Result<Option<Schema>, SRCError> {
    check_required(subject, "subject")?;
    check_required(schema, "schema")?;
    let body = schema_body(schema)?;
    match perform_json_call(sr_settings, SrCall::PostForLookup(subject, &body), "Schema").await {
        Ok(v) => Ok(Some(v)),
        Err(e) if e.is_schema_not_found() => Ok(None),
        Err(e) => Err(e),
    }
}

/// Registers the schema for the subject, and returns the id.
pub async fn register_new_schema(
    sr_settings: &SrSettings,
    subject: &str,
    schema: &str,
) -> Result<u32, SRCError> {
    check_required(subject, "subject")?;
    check_required(schema, "schema")?;
    let body = schema_body(schema)?;
    let id_only: IdOnly =
        perform_json_call(sr_settings, SrCall::PostNew(subject, &body), "id").await?;
    Ok(id_only.id)
}

pub async fn get_schema_by_id(sr_settings: &SrSettings, id: u32) -> Result<String, SRCError> {
    let schema_only: SchemaOnly =
        perform_json_call(sr_settings, SrCall::GetById(id), "schema").await?;
    Ok(schema_only.schema)
}

pub async fn get_schema_by_version(
    sr_settings: &SrSettings,
    subject: &str,
    version: SchemaVersion,
) -> Result<Schema, SRCError> {
    check_required(subject, "subject")?;
    version.check()?;
    perform_json_call(
        sr_settings,
        SrCall::GetBySubjectAndVersion(subject, version),
        "Schema",
    )
    .await
}

pub async fn get_latest_schema(
    sr_settings: &SrSettings,
    subject: &str,
) -> Result<Schema, SRCError> {
    get_schema_by_version(sr_settings, subject, SchemaVersion::Latest).await
}

async fn is_schema_compatible_at_version(
    sr_settings: &SrSettings,
    subject: &str,
    schema: &str,
    version: SchemaVersion,
) -> Result<bool, SRCError> {
    check_required(subject, "subject")?;
    check_required(schema, "schema")?;
    version.check()?;
    let body = schema_body(schema)?;
    let is_compatible: IsCompatible = perform_json_call(
        sr_settings,
        SrCall::PostCompatibility(subject, version, &body),
        "compatibility",
    )
    .await?;
    Ok(is_compatible.is_compatible)
}

pub async fn is_schema_compatible(
    sr_settings: &SrSettings,
    subject: &str,
    schema: &str,
    version: i32,
) -> Result<bool, SRCError> {
    is_schema_compatible_at_version(sr_settings, subject, schema, SchemaVersion::Number(version))
        .await
}

pub async fn is_latest_schema_compatible(
    sr_settings: &SrSettings,
    subject: &str,
    schema: &str,
) -> Result<bool, SRCError> {
    is_schema_compatible_at_version(sr_settings, subject, schema, SchemaVersion::Latest).await
}
