//! Response classification.
//!
//! A response can fail at three levels: the HTTP status, the envelope's
//! control block, and the operation's authentication and result blocks.
//! [`classify`] walks them in that order and names the first failure it finds,
//! so every decoded response ends up as exactly one [`Outcome`].

use crate::support_id::decode_support_id;
use crate::{ApiErrorKind, Error, Result};
use http::StatusCode;
use serde_json::Value;

/// Status text the gateway uses for a passing block.
pub const SUCCESS: &str = "success";

/// Status text the gateway uses for a failing block.
pub const FAILURE: &str = "failure";

/// What a decoded response amounts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Every status passed; holds the `operation` tree.
    Success(Value),
    /// The control block failed; holds the top-level `errormessage` with
    /// support ids decoded.
    ApiFailure(Value),
    /// Authentication failed; holds the operation's `errormessage`.
    AuthFailure(Value),
    /// Authentication passed but the function failed; holds the result's
    /// `errormessage`.
    OperationFailure(Value),
    /// The HTTP status was not `200 OK`.
    TransportFailure {
        /// The HTTP status
        status: StatusCode,
        /// The error payload found in the body, if any
        details: Value,
    },
    /// A `200 OK` response with statuses that match none of the above.
    UnknownShape(Value),
}

impl Outcome {
    /// Turns the outcome into the operation tree or the matching error.
    pub fn into_result(self) -> Result<Value> {
        match self {
            Outcome::Success(operation) => Ok(operation),
            Outcome::ApiFailure(details) => Err(Error::Api {
                kind: ApiErrorKind::WrongParams,
                status: StatusCode::OK,
                details,
            }),
            Outcome::AuthFailure(details) => Err(Error::Api {
                kind: ApiErrorKind::InvalidToken,
                status: StatusCode::OK,
                details,
            }),
            Outcome::OperationFailure(details) => Err(Error::Sdk {
                message: "Operation failed".to_string(),
                details,
            }),
            Outcome::TransportFailure { status, details } => match ApiErrorKind::from_status(status) {
                Some(kind) => Err(Error::Api {
                    kind,
                    status,
                    details,
                }),
                None => Err(Error::Sdk {
                    message: format!("Unexpected HTTP status {}", status.as_u16()),
                    details,
                }),
            },
            Outcome::UnknownShape(response) => Err(Error::UnexpectedResponse { response }),
        }
    }
}

/// Classifies a decoded response tree (rooted at `response`).
pub fn classify(status: StatusCode, tree: &Value) -> Outcome {
    let response = tree.get("response").unwrap_or(&Value::Null);

    if status != StatusCode::OK {
        return Outcome::TransportFailure {
            status,
            details: error_details(response),
        };
    }

    match status_of(response.get("control")) {
        Some(FAILURE) => {
            let errors = response.get("errormessage").cloned().unwrap_or(Value::Null);
            return Outcome::ApiFailure(decode_support_id(errors));
        }
        Some(SUCCESS) => {}
        _ => return Outcome::UnknownShape(tree.clone()),
    }

    let Some(operation) = response.get("operation") else {
        return Outcome::UnknownShape(tree.clone());
    };

    match status_of(operation.get("authentication")) {
        Some(FAILURE) => {
            let errors = operation
                .get("errormessage")
                .or_else(|| operation.pointer("/authentication/errormessage"))
                .cloned()
                .unwrap_or(Value::Null);
            Outcome::AuthFailure(errors)
        }
        Some(SUCCESS) => match status_of(operation.get("result")) {
            Some(SUCCESS) => Outcome::Success(operation.clone()),
            Some(FAILURE) => Outcome::OperationFailure(
                operation
                    .pointer("/result/errormessage")
                    .cloned()
                    .unwrap_or(Value::Null),
            ),
            _ => Outcome::UnknownShape(tree.clone()),
        },
        _ => Outcome::UnknownShape(tree.clone()),
    }
}

/// Classifies and unwraps in one step.
pub fn classify_and_unwrap(status: StatusCode, tree: Value) -> Result<Value> {
    classify(status, &tree).into_result()
}

fn status_of(block: Option<&Value>) -> Option<&str> {
    block?.get("status")?.as_str()
}

/// The error payload of a rejected response, wherever the gateway put it.
fn error_details(response: &Value) -> Value {
    response
        .get("errormessage")
        .filter(|v| !v.is_null())
        .or_else(|| response.pointer("/operation/result/errormessage"))
        .cloned()
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok_tree(result_status: &str) -> Value {
        json!({"response": {
            "control": {"status": "success"},
            "operation": {
                "authentication": {"status": "success"},
                "result": {
                    "status": result_status,
                    "data": {"@totalcount": "0"},
                    "errormessage": {"error": {"description2": "boom"}}
                }
            }
        }})
    }

    #[test]
    fn test_success_returns_operation_tree() {
        let tree = ok_tree("success");
        let operation = classify_and_unwrap(StatusCode::OK, tree.clone()).unwrap();
        assert_eq!(operation, tree["response"]["operation"]);
    }

    #[test]
    fn test_status_table() {
        let body = json!({"response": {"errormessage": {"error": {"description2": "nope"}}}});
        let cases = [
            (400, Some(ApiErrorKind::WrongParams)),
            (401, Some(ApiErrorKind::InvalidToken)),
            (403, Some(ApiErrorKind::NoPrivilege)),
            (404, Some(ApiErrorKind::NotFound)),
            (498, Some(ApiErrorKind::ExpiredToken)),
            (500, Some(ApiErrorKind::InternalServerError)),
            (502, None),
            (302, None),
        ];

        for (code, kind) in cases {
            let status = StatusCode::from_u16(code).unwrap();
            let err = classify_and_unwrap(status, body.clone()).unwrap_err();
            assert_eq!(err.api_kind(), kind, "status {}", code);
            assert_eq!(
                err.details(),
                Some(&body["response"]["errormessage"]),
                "status {}",
                code
            );
            if kind.is_none() {
                assert!(matches!(err, Error::Sdk { .. }));
            }
        }
    }

    #[test]
    fn test_non_ok_falls_back_to_result_errormessage() {
        let tree = ok_tree("failure");
        let outcome = classify(StatusCode::NOT_FOUND, &tree);
        assert_eq!(
            outcome,
            Outcome::TransportFailure {
                status: StatusCode::NOT_FOUND,
                details: json!({"error": {"description2": "boom"}}),
            }
        );
    }

    #[test]
    fn test_control_failure_decodes_support_id() {
        let tree = json!({"response": {
            "control": {"status": "failure"},
            "errormessage": {"error": {
                "errorno": "XL03000006",
                "description2": "Bad request [Support ID: Foo%20Bar]"
            }}
        }});

        match classify(StatusCode::OK, &tree) {
            Outcome::ApiFailure(details) => {
                assert_eq!(details["error"]["description2"], "Bad request [Support ID: Foo Bar]");
            }
            other => panic!("expected ApiFailure, got {:?}", other),
        }

        let err = classify_and_unwrap(StatusCode::OK, tree).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::WrongParams));
        assert!(err.to_string().contains("Foo Bar"));
    }

    #[test]
    fn test_auth_failure() {
        let tree = json!({"response": {
            "control": {"status": "success"},
            "operation": {
                "authentication": {"status": "failure"},
                "errormessage": {"error": {"description2": "Invalid session"}}
            }
        }});
        let err = classify_and_unwrap(StatusCode::OK, tree).unwrap_err();
        assert_eq!(err.api_kind(), Some(ApiErrorKind::InvalidToken));
        assert_eq!(
            err.details(),
            Some(&json!({"error": {"description2": "Invalid session"}}))
        );
    }

    #[test]
    fn test_result_failure_is_generic() {
        let err = classify_and_unwrap(StatusCode::OK, ok_tree("failure")).unwrap_err();
        match err {
            Error::Sdk { details, .. } => {
                assert_eq!(details, json!({"error": {"description2": "boom"}}));
            }
            other => panic!("expected Sdk, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_shapes() {
        let shapes = [
            ok_tree("aborted"),
            json!({"response": {"control": {"status": "success"}}}),
            json!({"response": {"control": {}}}),
            json!({"something": "else"}),
            json!({"response": {
                "control": {"status": "success"},
                "operation": {"authentication": {}, "result": {"status": "success"}}
            }}),
        ];

        for tree in shapes {
            assert_eq!(
                classify(StatusCode::OK, &tree),
                Outcome::UnknownShape(tree.clone())
            );
            assert!(matches!(
                classify_and_unwrap(StatusCode::OK, tree),
                Err(Error::UnexpectedResponse { .. })
            ));
        }
    }
}
