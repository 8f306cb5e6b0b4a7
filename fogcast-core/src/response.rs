use serde::Serialize;

/// Uniform outcome wrapper for every upstream adapter operation.
///
/// Exactly one of `data` and `error` is present. The constructors are the
/// only way to build a response, and they enforce the pairing together with
/// the `success` flag.
#[derive(Debug, Clone, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub message: String,
}

impl<T> ApiResponse<T> {
    /// Successful outcome carrying `data`.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self { success: true, data: Some(data), error: None, message: message.into() }
    }

    /// Failed outcome carrying the raw error text.
    pub fn err(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self { success: false, data: None, error: Some(error.into()), message: message.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_and_error_are_mutually_exclusive() {
        let ok: ApiResponse<Vec<i32>> = ApiResponse::ok(vec![1], "done");
        assert!(ok.success);
        assert!(ok.data.is_some());
        assert!(ok.error.is_none());

        let err: ApiResponse<Vec<i32>> = ApiResponse::err("boom", "failed");
        assert!(!err.success);
        assert!(err.data.is_none());
        assert_eq!(err.error.as_deref(), Some("boom"));
    }

    #[test]
    fn serialization_omits_the_absent_side() {
        let ok: ApiResponse<Vec<i32>> = ApiResponse::ok(vec![1, 2], "two items");
        let json = serde_json::to_value(&ok).expect("serialize");
        assert_eq!(json["success"], true);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert_eq!(json["message"], "two items");
        assert!(json.get("error").is_none());

        let err: ApiResponse<Vec<i32>> = ApiResponse::err("timeout", "failed");
        let json = serde_json::to_value(&err).expect("serialize");
        assert_eq!(json["success"], false);
        assert_eq!(json["error"], "timeout");
        assert!(json.get("data").is_none());
    }
}
