//! Response assertions.

use jsonapi_repository::JsonApiResponse;
use serde_json::Value;

/// Asserts that the response has the expected status code.
pub fn assert_status(response: &JsonApiResponse, expected: u16) {
    let actual = response.status.as_u16();
    assert_eq!(
        actual, expected,
        "Expected status {}, got {} with {:?}",
        expected, actual, response.document
    );
}

/// Returns the response document, failing if there is none.
pub fn document(response: &JsonApiResponse) -> &Value {
    response
        .document
        .as_ref()
        .expect("Expected a response document")
}

/// Asserts that the response is an error document with one error of the
/// expected status.
pub fn assert_error(response: &JsonApiResponse, expected: u16) {
    assert_status(response, expected);
    let errors = document(response)["errors"]
        .as_array()
        .expect("Expected an errors array");
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["status"], expected.to_string());
    assert!(errors[0]["title"].is_string());
    assert!(document(response).get("data").is_none());
}

/// Returns the `data` array of a collection response.
pub fn data_array(response: &JsonApiResponse) -> &Vec<Value> {
    document(response)["data"]
        .as_array()
        .expect("Expected a data array")
}

/// Returns the `attributes.name` of every primary resource.
pub fn names(response: &JsonApiResponse) -> Vec<String> {
    data_array(response)
        .iter()
        .map(|item| item["attributes"]["name"].as_str().unwrap_or("").to_string())
        .collect()
}
