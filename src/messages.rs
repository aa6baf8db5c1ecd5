// Redfish-style error payloads for aggregator-internal failures.  Satellite
// errors pass through untouched; only these synthesized bodies originate
// here.

use crate::merge::AggregateResponse;
use axum::http::StatusCode;
use serde_json::{Value, json};

const BASE_REGISTRY: &str = "Base.1.13.0";

fn error_body(message_id: &str, message: &str, resolution: &str) -> Value {
    json!({
        "error": {
            "code": message_id,
            "message": message,
            "@Message.ExtendedInfo": [{
                "@odata.type": "#Message.v1_1_1.Message",
                "MessageId": message_id,
                "Message": message,
                "MessageSeverity": "Critical",
                "Resolution": resolution,
            }],
        }
    })
}

pub fn internal_error_body() -> Value {
    error_body(
        &format!("{BASE_REGISTRY}.InternalError"),
        "The request failed due to an internal service error.  The service is still operational.",
        "Resubmit the request.  If the problem persists, consider resetting the service.",
    )
}

pub fn internal_error(res: &mut AggregateResponse) {
    res.set_json(StatusCode::INTERNAL_SERVER_ERROR, internal_error_body());
}

pub fn operation_failed(res: &mut AggregateResponse) {
    res.set_json(
        StatusCode::INTERNAL_SERVER_ERROR,
        error_body(
            &format!("{BASE_REGISTRY}.OperationFailed"),
            "An error occurred internal to the service as part of the overall request.  Partial results may have been returned.",
            "Resubmit the request.  If the problem persists, consider resetting the service or provider.",
        ),
    );
}

pub fn resource_not_found(res: &mut AggregateResponse, resource_type: &str, name: &str) {
    res.set_json(
        StatusCode::NOT_FOUND,
        error_body(
            &format!("{BASE_REGISTRY}.ResourceNotFound"),
            &format!("The requested resource of type {resource_type} named '{name}' was not found."),
            "Provide a valid resource identifier and resubmit the request.",
        ),
    );
}

pub fn method_not_allowed(res: &mut AggregateResponse) {
    res.set_json(
        StatusCode::METHOD_NOT_ALLOWED,
        error_body(
            &format!("{BASE_REGISTRY}.OperationNotAllowed"),
            "The HTTP method is not allowed on this resource.",
            "Retry the request with a method allowed by the resource.",
        ),
    );
}
