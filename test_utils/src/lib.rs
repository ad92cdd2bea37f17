use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde_json::json;

pub fn get_user_schema() -> &'static str {
    r#"{"namespace":"example.avro","type":"record","name":"user","fields":[{"name":"name","type":"string"},{"name":"favorite_number","type":["int","null"]},{"name":"favorite_color","type":["string","null"]}]}"#
}

pub fn get_heartbeat_schema() -> &'static str {
    r#"{"type":"record","name":"Heartbeat","namespace":"nl.openweb.data","fields":[{"name":"beat","type":"long"}]}"#
}

/// Body as send to the schema registry for registering or checking a schema.
pub fn get_schema_only_body(schema: &str) -> String {
    json!({ "schema": schema }).to_string()
}

pub fn get_schema_body(schema: &str, subject: &str, version: u32, id: u32) -> String {
    json!({
        "schema": schema,
        "subject": subject,
        "version": version,
        "id": id,
    })
    .to_string()
}

pub fn get_error_body(error_code: i32, message: &str) -> String {
    json!({ "error_code": error_code, "message": message }).to_string()
}

pub fn gzip(body: &str) -> Vec<u8> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(body.as_bytes())
        .expect("writing to a vec should not fail");
    encoder.finish().expect("finishing gzip should not fail")
}
