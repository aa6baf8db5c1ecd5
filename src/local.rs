// The locally served slice of the resource tree.  Satellite resources are
// folded in on top of these responses by the mergers.

use crate::collections;
use crate::merge::AggregateResponse;
use crate::messages;
use axum::http::{Method, StatusCode, request::Parts};
use serde_json::{Value, json};

/// Locally owned resources, fixed at startup from the configuration.
pub struct LocalTree {
    chassis: Vec<String>,
}

impl LocalTree {
    pub fn new(chassis: Vec<String>) -> Self {
        Self { chassis }
    }

    /// Serves one request against the local tree.  Unknown paths produce a
    /// ResourceNotFound body so subordinate merging can still promote a
    /// satellite's answer on top of it.
    pub fn handle(&self, parts: &Parts) -> AggregateResponse {
        let mut res = AggregateResponse::new();
        let Some(sub) = collections::service_subpath(parts.uri.path()) else {
            not_found(&mut res, parts.uri.path());
            return res;
        };

        let body = match sub.as_str() {
            "" => Some(self.service_root()),
            "/odata" => Some(self.odata_service_document()),
            "/Chassis" => Some(self.chassis_collection()),
            "/JsonSchemas" => Some(self.schema_collection()),
            _ => match sub.strip_prefix("/Chassis/") {
                Some(id) if self.chassis.iter().any(|c| c == id) => Some(self.chassis_member(id)),
                _ => None,
            },
        };
        let Some(body) = body else {
            not_found(&mut res, parts.uri.path());
            return res;
        };
        // The local tree is read-only.
        if parts.method != Method::GET {
            messages::method_not_allowed(&mut res);
            return res;
        }
        res.set_json(StatusCode::OK, body);
        res
    }

    fn service_root(&self) -> Value {
        json!({
            "@odata.id": "/redfish/v1",
            "@odata.type": "#ServiceRoot.v1_11_0.ServiceRoot",
            "Id": "RootService",
            "Name": "Root Service",
            "RedfishVersion": "1.17.0",
            "Chassis": { "@odata.id": "/redfish/v1/Chassis" },
            "JsonSchemas": { "@odata.id": "/redfish/v1/JsonSchemas" },
            "Links": {
                "Sessions": { "@odata.id": "/redfish/v1/SessionService/Sessions" },
            },
        })
    }

    fn chassis_collection(&self) -> Value {
        let members: Vec<Value> = self
            .chassis
            .iter()
            .map(|id| json!({ "@odata.id": format!("/redfish/v1/Chassis/{id}") }))
            .collect();
        json!({
            "@odata.id": "/redfish/v1/Chassis",
            "@odata.type": "#ChassisCollection.ChassisCollection",
            "Name": "Chassis Collection",
            "Members": members,
            "Members@odata.count": self.chassis.len(),
        })
    }

    fn chassis_member(&self, id: &str) -> Value {
        json!({
            "@odata.id": format!("/redfish/v1/Chassis/{id}"),
            "@odata.type": "#Chassis.v1_22_0.Chassis",
            "Id": id,
            "Name": id,
            "ChassisType": "RackMount",
        })
    }

    fn odata_service_document(&self) -> Value {
        json!({
            "@odata.context": "/redfish/v1/$metadata",
            "value": [
                { "name": "Service", "kind": "Singleton", "url": "/redfish/v1" },
                { "name": "Chassis", "kind": "Singleton", "url": "/redfish/v1/Chassis" },
            ],
        })
    }

    fn schema_collection(&self) -> Value {
        json!({
            "@odata.id": "/redfish/v1/JsonSchemas",
            "@odata.type": "#JsonSchemaFileCollection.JsonSchemaFileCollection",
            "Name": "JsonSchemaFile Collection",
            "Members": [],
            "Members@odata.count": 0,
        })
    }
}

fn not_found(res: &mut AggregateResponse, path: &str) {
    let name = path.rsplit('/').find(|s| !s.is_empty()).unwrap_or(path);
    messages::resource_not_found(res, "Resource", name);
}
