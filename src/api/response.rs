//! Dispatcher responses

use serde::Serialize;
use serde_json::Value;

use super::errors::ApiError;

/// Outcome of one dispatched call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status")]
pub enum Response {
    #[serde(rename = "ok")]
    Success { data: Value },
    #[serde(rename = "error")]
    Failure { code: String, message: String },
}

impl Response {
    pub fn success(data: Value) -> Self {
        Response::Success { data }
    }

    pub fn failure(err: &ApiError) -> Self {
        Response::Failure {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success { .. })
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Response::Success { data } => Some(data),
            Response::Failure { .. } => None,
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| {
            r#"{"status":"error","code":"ORG_INTERNAL","message":"response serialization failed"}"#
                .to_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_response() {
        let resp = Response::success(json!([{"name": "Alice"}]));
        let json = resp.to_json();
        assert!(json.contains("\"status\":\"ok\""));
        assert!(json.contains("Alice"));
        assert!(resp.is_success());
    }

    #[test]
    fn test_failure_response() {
        let err = ApiError::not_found("Customer", "cust_999");
        let resp = Response::failure(&err);
        let value: Value = serde_json::from_str(&resp.to_json()).unwrap();
        assert_eq!(value["status"], "error");
        assert_eq!(value["code"], "ORG_NOT_FOUND");
        assert_eq!(value["message"], "Customer cust_999 not found");
        assert!(resp.data().is_none());
    }
}
