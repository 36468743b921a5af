//! Incoming HTTP request type.

use std::collections::HashMap;

use bytes::Bytes;
use serde::de::DeserializeOwned;

/// An incoming HTTP request with its body fully buffered and its path
/// parameters resolved by the router.
pub struct Request {
    pub(crate) body: Bytes,
    pub(crate) params: HashMap<String, String>,
}

impl Request {
    pub(crate) fn new(body: Bytes, params: HashMap<String, String>) -> Self {
        Self { body, params }
    }

    /// Returns a named path parameter.
    ///
    /// For a route `/recipes/{id}`, `req.param("id")` on `/recipes/42` returns `Some("42")`.
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Deserializes the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

#[cfg(test)]
pub(crate) fn test_request(body: &str, params: &[(&str, &str)]) -> Request {
    Request::new(
        Bytes::copy_from_slice(body.as_bytes()),
        params.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_body_and_params() {
        let req = test_request(r#"{"n":1}"#, &[("id", "7")]);
        let v: serde_json::Value = req.json().unwrap();
        assert_eq!(v["n"], 1);
        assert_eq!(req.param("id"), Some("7"));
        assert_eq!(req.param("missing"), None);
    }

    #[test]
    fn empty_body_is_not_json() {
        assert!(test_request("", &[]).json::<serde_json::Value>().is_err());
    }
}
