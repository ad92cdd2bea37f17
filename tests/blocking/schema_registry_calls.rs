use std::error::Error;

use mockito::{Matcher, Server};
use schema_registry_client::blocking::schema_registry::{
    delete_subject, get_all_subjects, get_all_versions, get_latest_schema, get_schema_by_id,
    get_schema_by_version, is_latest_schema_compatible, is_registered, is_schema_compatible,
    register_new_schema, SrSettings,
};
use schema_registry_client::error::{
    is_schema_not_found, is_subject_not_found, is_version_not_found, SRCErrorKind,
    INVALID_SCHEMA_CODE, SUBJECT_NOT_FOUND_CODE, VERSION_NOT_FOUND_CODE,
};
use schema_registry_client::schema_registry_common::{SchemaVersion, SrConfig};
use test_utils::{
    get_error_body, get_heartbeat_schema, get_schema_body, get_schema_only_body, get_user_schema,
    gzip,
};

fn get_sr_settings(server: &Server) -> SrSettings {
    SrSettings::new_builder(server.url())
        .no_proxy()
        .build()
        .unwrap()
}

#[test]
fn test_register_and_get_versions() {
    let mut server = Server::new();
    let register = server
        .mock("POST", "/subjects/testsubject/versions")
        .match_header("content-type", "application/vnd.schemaregistry.v1+json")
        .match_body(Matcher::JsonString(get_schema_only_body(get_user_schema())))
        .with_status(200)
        .with_header("content-type", "application/vnd.schemaregistry.v1+json")
        .with_body(r#"{"id":1}"#)
        .create();
    let versions = server
        .mock("GET", "/subjects/testsubject/versions")
        .with_status(200)
        .with_header("content-type", "application/vnd.schemaregistry.v1+json")
        .with_body("[1]")
        .create();
    let sr_settings = get_sr_settings(&server);

    let id = register_new_schema(&sr_settings, "testsubject", get_user_schema()).unwrap();
    assert_eq!(1, id, "Registered schema has id 1");
    let result = get_all_versions(&sr_settings, "testsubject").unwrap();
    assert_eq!(vec![1], result, "List of version is just one");

    register.assert();
    versions.assert();
}

#[test]
fn test_get_all_subjects() {
    let mut server = Server::new();
    let _m = server
        .mock("GET", "/subjects")
        .with_status(200)
        .with_body(r#"["testavro-value","heartbeat-value"]"#)
        .create();

    let result = get_all_subjects(&get_sr_settings(&server)).unwrap();
    assert!(
        result.contains(&String::from("testavro-value")),
        "List of subjects contains testavro-value"
    );
}

#[test]
fn test_lookup_registered_schema() {
    let mut server = Server::new();
    let _found = server
        .mock("POST", "/subjects/heartbeat-value")
        .match_body(Matcher::JsonString(get_schema_only_body(
            get_heartbeat_schema(),
        )))
        .with_status(200)
        .with_body(get_schema_body(
            get_heartbeat_schema(),
            "heartbeat-value",
            2,
            11,
        ))
        .create();
    let _not_found = server
        .mock("POST", "/subjects/other-value")
        .with_status(404)
        .with_body(get_error_body(40403, "Schema not found"))
        .create();
    let sr_settings = get_sr_settings(&server);

    let schema = is_registered(&sr_settings, "heartbeat-value", get_heartbeat_schema())
        .unwrap()
        .expect("schema should be registered");
    assert_eq!(get_heartbeat_schema(), schema.schema);
    assert_eq!(2, schema.version);
    assert_eq!(Some(11), schema.id);

    let result = is_registered(&sr_settings, "other-value", get_heartbeat_schema()).unwrap();
    assert_eq!(None, result);
}

#[test]
fn test_invalid_schema_is_resource_error() {
    let mut server = Server::new();
    let _m = server
        .mock("POST", "/subjects/testsubject/versions")
        .with_status(422)
        .with_body(get_error_body(
            INVALID_SCHEMA_CODE,
            "Input schema is an invalid Avro schema",
        ))
        .create();

    let err = register_new_schema(&get_sr_settings(&server), "testsubject", "not a schema")
        .unwrap_err();
    let resource_error = err.resource_error().expect("should be a resource error");
    assert_eq!(INVALID_SCHEMA_CODE, resource_error.error_code);
    assert_eq!("Input schema is an invalid Avro schema", resource_error.message);
}

#[test]
fn test_not_found_helpers() {
    let mut server = Server::new();
    let _subject = server
        .mock("GET", "/subjects/unknown/versions")
        .with_status(404)
        .with_body(get_error_body(SUBJECT_NOT_FOUND_CODE, "Subject not found"))
        .create();
    let _version = server
        .mock("GET", "/subjects/known/versions/7")
        .with_status(404)
        .with_body(get_error_body(VERSION_NOT_FOUND_CODE, "Version not found"))
        .create();
    let sr_settings = get_sr_settings(&server);

    let err = get_all_versions(&sr_settings, "unknown").unwrap_err();
    assert!(is_subject_not_found(Some(&err as &(dyn Error + 'static))));
    assert!(!is_schema_not_found(Some(&err as &(dyn Error + 'static))));

    let err = get_schema_by_version(&sr_settings, "known", SchemaVersion::Number(7)).unwrap_err();
    assert!(is_version_not_found(Some(&err as &(dyn Error + 'static))));
    assert!(!is_subject_not_found(Some(&err as &(dyn Error + 'static))));
}

#[test]
fn test_gzip_and_plain_decode_the_same() {
    let body = get_schema_body(get_heartbeat_schema(), "heartbeat-value", 1, 3);
    let mut server = Server::new();
    let _plain = server
        .mock("GET", "/subjects/heartbeat-value/versions/1")
        .with_status(200)
        .with_body(&body)
        .create();
    let _gzipped = server
        .mock("GET", "/subjects/heartbeat-value/versions/latest")
        .match_header("accept-encoding", "gzip")
        .with_status(200)
        .with_header("content-encoding", "gzip")
        .with_body(gzip(&body))
        .create();
    let sr_settings = get_sr_settings(&server);

    let plain =
        get_schema_by_version(&sr_settings, "heartbeat-value", SchemaVersion::Number(1)).unwrap();
    let gzipped = get_latest_schema(&sr_settings, "heartbeat-value").unwrap();
    assert_eq!(plain, gzipped);
}

#[test]
fn test_schema_by_id_and_delete() {
    let mut server = Server::new();
    let _id = server
        .mock("GET", "/schemas/3")
        .with_status(200)
        .with_body(get_schema_only_body(get_heartbeat_schema()))
        .create();
    let _delete = server
        .mock("DELETE", "/subjects/heartbeat-value")
        .with_status(200)
        .with_body("[1,2]")
        .create();
    let sr_settings = get_sr_settings(&server);

    assert_eq!(
        get_heartbeat_schema(),
        get_schema_by_id(&sr_settings, 3).unwrap()
    );
    assert_eq!(
        vec!["1", "2"],
        delete_subject(&sr_settings, "heartbeat-value").unwrap()
    );
}

#[test]
fn test_compatibility() {
    let mut server = Server::new();
    let _version = server
        .mock("POST", "/compatibility/subjects/heartbeat-value/versions/1")
        .match_header("content-type", "application/vnd.schemaregistry.v1+json")
        .with_status(200)
        .with_body(r#"{"is_compatible":false}"#)
        .create();
    let _latest = server
        .mock("POST", "/compatibility/subjects/heartbeat-value/versions/latest")
        .with_status(200)
        .with_body(r#"{"is_compatible":true}"#)
        .create();
    let sr_settings = get_sr_settings(&server);

    let compatible =
        is_schema_compatible(&sr_settings, "heartbeat-value", get_heartbeat_schema(), 1).unwrap();
    assert!(!compatible, "Not compatible with version 1");
    let compatible =
        is_latest_schema_compatible(&sr_settings, "heartbeat-value", get_heartbeat_schema())
            .unwrap();
    assert!(compatible, "Compatible with latest version");
}

#[test]
fn test_validation_before_call() {
    let mut server = Server::new();
    let never = server.mock("GET", Matcher::Any).expect(0).create();
    let sr_settings = get_sr_settings(&server);

    let err = get_latest_schema(&sr_settings, "").unwrap_err();
    assert_eq!(SRCErrorKind::Required, err.kind);
    let err = "0".parse::<SchemaVersion>().unwrap_err();
    assert_eq!(SRCErrorKind::Required, err.kind);

    never.assert();
}

#[test]
fn test_settings_from_config() {
    let config =
        SrConfig::from_json(r#"{"SchemaRegistryUrl":"http://localhost:8081","TimeoutMs":1000}"#)
            .unwrap();
    let sr_settings = SrSettings::from_config(&config).unwrap();
    assert_eq!("http://localhost:8081", sr_settings.url());
}
