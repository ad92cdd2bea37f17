//! Client for the REST interface of a Confluent compatible schema registry. It can be used to
//! register schemas, look them up, list and delete subjects, and check compatibility.
//!
//! There is a blocking and an async implementation, enabled with the `blocking` and `futures`
//! features. Both take an `SrSettings` with the url of the schema registry, which can be shared.
//!
//! ```no_run
//! use schema_registry_client::blocking::schema_registry::{get_all_versions, register_new_schema, SrSettings};
//! let sr_settings = SrSettings::new(String::from("http://localhost:8081")).unwrap();
//! let id = register_new_schema(&sr_settings, "testsubject", r#"{"type":"string"}"#).unwrap();
//! let versions = get_all_versions(&sr_settings, "testsubject").unwrap();
//! ```
//!
//! Errors from the schema registry can be checked with the helpers in [`error`], for example
//! [`error::is_subject_not_found`].
#[cfg(feature = "futures")]
pub mod async_impl;
#[cfg(feature = "blocking")]
pub mod blocking;
pub mod error;
pub mod schema_registry_common;
