use mockito::{Matcher, Server};
use schema_registry_client::async_impl::schema_registry::{
    get_all_subjects, get_all_versions, get_latest_schema, is_latest_schema_compatible,
    register_new_schema, SrSettings,
};
use schema_registry_client::error::SUBJECT_NOT_FOUND_CODE;
use test_utils::{get_error_body, get_schema_body, get_schema_only_body, get_user_schema, gzip};

async fn get_sr_settings(server: &Server) -> SrSettings {
    SrSettings::new_builder(server.url())
        .no_proxy()
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_register_and_get_versions() {
    let mut server = Server::new_async().await;
    let _register = server
        .mock("POST", "/subjects/testsubject/versions")
        .match_body(Matcher::JsonString(get_schema_only_body(get_user_schema())))
        .with_status(200)
        .with_body(r#"{"id":1}"#)
        .create_async()
        .await;
    let _versions = server
        .mock("GET", "/subjects/testsubject/versions")
        .with_status(200)
        .with_body("[1]")
        .create_async()
        .await;
    let sr_settings = get_sr_settings(&server).await;

    let id = register_new_schema(&sr_settings, "testsubject", get_user_schema())
        .await
        .unwrap();
    assert_eq!(1, id, "Registered schema has id 1");
    let result = get_all_versions(&sr_settings, "testsubject").await.unwrap();
    assert_eq!(vec![1], result, "List of version is just one");
}

#[tokio::test]
async fn test_get_all_subjects() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/subjects")
        .with_status(200)
        .with_body(r#"["testavro-value"]"#)
        .create_async()
        .await;

    let result = get_all_subjects(&get_sr_settings(&server).await)
        .await
        .unwrap();
    assert_eq!(vec!["testavro-value"], result);
}

#[tokio::test]
async fn test_subject_not_found() {
    let mut server = Server::new_async().await;
    let _m = server
        .mock("GET", "/subjects/unknown/versions")
        .with_status(404)
        .with_body(get_error_body(SUBJECT_NOT_FOUND_CODE, "Subject not found"))
        .create_async()
        .await;

    let err = get_all_versions(&get_sr_settings(&server).await, "unknown")
        .await
        .unwrap_err();
    assert!(err.is_subject_not_found());
}

#[tokio::test]
async fn test_gzipped_latest_and_compatibility() {
    let mut server = Server::new_async().await;
    let _latest = server
        .mock("GET", "/subjects/testsubject/versions/latest")
        .with_status(200)
        .with_header("content-encoding", "gzip")
        .with_body(gzip(&get_schema_body(
            get_user_schema(),
            "testsubject",
            1,
            1,
        )))
        .create_async()
        .await;
    let _compatibility = server
        .mock("POST", "/compatibility/subjects/testsubject/versions/latest")
        .with_status(200)
        .with_body(r#"{"is_compatible":true}"#)
        .create_async()
        .await;
    let sr_settings = get_sr_settings(&server).await;

    let schema = get_latest_schema(&sr_settings, "testsubject").await.unwrap();
    assert_eq!(get_user_schema(), schema.schema);
    assert!(
        is_latest_schema_compatible(&sr_settings, "testsubject", get_user_schema())
            .await
            .unwrap()
    );
}
