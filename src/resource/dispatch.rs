//! Resource Dispatcher
//!
//! Maps a (resource, operation) pair to its registry entry and shapes the
//! outgoing request from the parameter bag:
//! - path placeholders are filled from `path` fields
//! - query = fixed query pairs, `query` fields, sort, paging
//! - body (POST/PUT) = `additionalFields` with `body` fields written at their targets
//!
//! `get-all` is handed to the [`fetcher`](super::fetcher); every other
//! operation performs exactly one remote call.

use super::builder::{is_empty_value, RequestParameters};
use super::fetcher::{self, PageCursor, PagingLimits};
use super::json_path::{has_path, set_path};
use super::registry::{operation_def, FieldLocation, OperationDef, ResponseShape};
use super::types::Operation;
use super::validator::{validate, ValidationPolicy};
use crate::api::client::LexofficeClient;
use crate::api::http::{HttpRequest, HttpResponse};
use crate::error::DispatchError;
use base64::Engine as _;
use serde::Serialize;
use serde_json::{json, Map, Value};

/// Ordered records produced by one invocation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultSequence {
    pub records: Vec<Value>,
    /// Continuation token for the next cursor page, if the remote sent one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<String>,
}

impl ResultSequence {
    pub fn single(record: Value) -> Self {
        Self {
            records: vec![record],
            next_cursor: None,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Executes operations against the remote API
#[derive(Clone)]
pub struct Dispatcher {
    client: LexofficeClient,
    policy: ValidationPolicy,
    limits: PagingLimits,
}

impl Dispatcher {
    pub fn new(client: LexofficeClient) -> Self {
        Self {
            client,
            policy: ValidationPolicy::default(),
            limits: PagingLimits::default(),
        }
    }

    pub fn with_policy(mut self, policy: ValidationPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_limits(mut self, limits: PagingLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> PagingLimits {
        self.limits
    }

    /// Run one operation. Unsupported pairs are rejected before validation.
    pub async fn execute(&self, params: &RequestParameters) -> Result<ResultSequence, DispatchError> {
        let (resource, operation) = (params.resource, params.operation);

        let def = operation_def(resource, operation).ok_or(DispatchError::UnsupportedOperation {
            resource,
            operation,
        })?;

        if self.policy.applies_to(operation) {
            let missing = validate(resource, operation, params);
            if !missing.is_empty() {
                return Err(DispatchError::MissingRequiredFields {
                    resource,
                    operation,
                    fields: missing,
                });
            }
        }

        tracing::info!("execute: resource={}, operation={}", resource, operation);

        if operation == Operation::GetAll {
            return fetcher::fetch_resources(self, def, params).await;
        }

        let request = shape_request(def, params, &PageCursor::None)?;
        let response = self.client.send(&request).await?;
        normalize_single(&def.response, &response).map(ResultSequence::single)
    }

    /// One remote call for an already-shaped request
    pub(crate) async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, DispatchError> {
        self.client.send(request).await
    }
}

/// Build the HTTP request for an entry. Empty path placeholders are refused.
pub fn shape_request(
    def: &OperationDef,
    params: &RequestParameters,
    cursor: &PageCursor,
) -> Result<HttpRequest, DispatchError> {
    let mut segments = Vec::new();
    let mut missing = Vec::new();

    for segment in def.path.split('/') {
        match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => match params.get(name).filter(|v| !is_empty_value(v)) {
                Some(value) => segments.push(urlencoding::encode(&scalar_string(value)).into_owned()),
                None => missing.push(name.to_string()),
            },
            None => segments.push(segment.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(DispatchError::MissingRequiredFields {
            resource: params.resource,
            operation: params.operation,
            fields: missing,
        });
    }

    let mut query: Vec<(String, String)> = def
        .query
        .iter()
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect();

    for field in def.fields.iter().filter(|f| f.location == FieldLocation::Query) {
        let Some(value) = params.get(&field.name).filter(|v| !is_empty_value(v)) else {
            continue;
        };
        match value {
            Value::Array(items) => {
                let joined: Vec<String> = items.iter().map(scalar_string).collect();
                query.push((field.target().to_string(), joined.join(",")));
            },
            _ => query.push((field.target().to_string(), scalar_string(value))),
        }
    }

    if let Some(sort_param) = &def.sort_param {
        query.push((sort_param.clone(), params.sort.api_value().to_string()));
    }

    match cursor {
        PageCursor::Offset { page, size, offset } => {
            query.push(("page".to_string(), page.to_string()));
            query.push(("size".to_string(), size.to_string()));
            if *offset > 0 {
                query.push(("offset".to_string(), offset.to_string()));
            }
        },
        PageCursor::Token(token) if !token.is_empty() => {
            query.push(("cursor".to_string(), token.clone()));
        },
        PageCursor::Token(_) | PageCursor::None => {},
    }

    let body = if def.method.has_body() {
        let mut body = params.additional_fields.clone();
        for field in def.fields.iter().filter(|f| f.location == FieldLocation::Body) {
            let Some(value) = params.get(&field.name).filter(|v| !is_empty_value(v)) else {
                continue;
            };
            // a schema default never replaces data the caller put in additionalFields
            if params.is_defaulted(&field.name) && has_path(&body, field.target()) {
                continue;
            }
            set_path(&mut body, field.target(), value.clone());
        }
        Some(Value::Object(body))
    } else {
        None
    };

    let request = HttpRequest {
        method: def.method,
        path: segments.join("/"),
        query,
        body,
    };

    tracing::debug!(
        "shaped request: {} {} ({} query pairs)",
        request.method,
        request.path,
        request.query.len()
    );

    Ok(request)
}

/// Turn a single-record response into one record
fn normalize_single(shape: &ResponseShape, response: &HttpResponse) -> Result<Value, DispatchError> {
    if let ResponseShape::Binary = shape {
        return Ok(binary_record(response));
    }

    match response.body_json()? {
        Value::Null => Ok(json!({ "success": true })),
        record @ Value::Object(_) => Ok(record),
        other => {
            let mut map = Map::new();
            map.insert("data".to_string(), other);
            Ok(Value::Object(map))
        },
    }
}

/// Binary download as a record with base64 payload
fn binary_record(response: &HttpResponse) -> Value {
    let mime_type = response
        .header("content-type")
        .unwrap_or("application/octet-stream");
    let file_name = response
        .header("content-disposition")
        .and_then(file_name_from_disposition);

    json!({
        "mimeType": mime_type,
        "fileName": file_name,
        "size": response.body.len(),
        "data": base64::engine::general_purpose::STANDARD.encode(&response.body),
    })
}

/// `attachment; filename="RE-1.pdf"` -> `RE-1.pdf`
fn file_name_from_disposition(header: &str) -> Option<String> {
    header
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"').to_string())
        .filter(|name| !name.is_empty())
}

/// Render a JSON scalar for a URL path or query
fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::JsonInput;
    use crate::resource::builder::build;
    use crate::resource::types::{ResourceType, SortOption};

    fn params_for(resource: ResourceType, operation: Operation, raw: Value) -> RequestParameters {
        build(resource, operation, &JsonInput::from_value(raw).unwrap(), 0).unwrap()
    }

    #[test]
    fn test_get_fills_path_placeholder() {
        let params = params_for(
            ResourceType::Contact,
            Operation::Get,
            json!({"contactId": "be9475f4 ef80"}),
        );
        let def = operation_def(ResourceType::Contact, Operation::Get).unwrap();
        let request = shape_request(def, &params, &PageCursor::None).unwrap();
        assert_eq!(request.path, "contacts/be9475f4%20ef80");
        assert!(request.body.is_none());
        assert!(request.query.is_empty());
    }

    #[test]
    fn test_empty_placeholder_is_refused() {
        let params = params_for(ResourceType::Dunning, Operation::Document, json!({"dunningId": ""}));
        let def = operation_def(ResourceType::Dunning, Operation::Document).unwrap();
        let err = shape_request(def, &params, &PageCursor::None).unwrap_err();
        assert!(matches!(
            err,
            DispatchError::MissingRequiredFields { ref fields, .. } if fields == &["dunningId"]
        ));
    }

    #[test]
    fn test_create_body_merges_additional_fields() {
        let params = params_for(
            ResourceType::Invoice,
            Operation::Create,
            json!({
                "invoiceContactId": "c-1",
                "voucherDate": "2024-01-31",
                "lineItems": [{"type": "custom", "name": "Consulting"}],
                "finalize": true,
                "additionalFields": {
                    "totalPrice": {"currency": "USD"},
                    "address": {"supplement": "Building 2"}
                }
            }),
        );
        let def = operation_def(ResourceType::Invoice, Operation::Create).unwrap();
        let request = shape_request(def, &params, &PageCursor::None).unwrap();

        assert_eq!(request.path, "invoices");
        assert_eq!(request.query_value("finalize"), Some("true"));
        let body = request.body.unwrap();
        assert_eq!(body["address"], json!({"supplement": "Building 2", "contactId": "c-1"}));
        // defaults leave caller-supplied additional data alone
        assert_eq!(body["totalPrice"]["currency"], "USD");
        assert_eq!(body["taxConditions"]["taxType"], "net");
        assert_eq!(body["voucherDate"], "2024-01-31T00:00:00.000+00:00");
        assert_eq!(body["shippingConditions"]["shippingType"], "none");
        assert!(body.get("finalize").is_none());
    }

    #[test]
    fn test_explicit_value_equal_to_default_still_wins() {
        let params = params_for(
            ResourceType::Invoice,
            Operation::Create,
            json!({
                "invoiceContactId": "c-1",
                "voucherDate": "2024-01-31",
                "lineItems": [{"type": "custom", "name": "Consulting"}],
                "currency": "EUR",
                "additionalFields": {
                    "totalPrice": {"currency": "USD"},
                    "taxConditions": {"taxType": "gross"}
                }
            }),
        );
        let def = operation_def(ResourceType::Invoice, Operation::Create).unwrap();
        let body = shape_request(def, &params, &PageCursor::None).unwrap().body.unwrap();

        assert_eq!(body["totalPrice"]["currency"], "EUR");
        assert_eq!(body["taxConditions"]["taxType"], "gross");
    }

    #[test]
    fn test_list_query_has_fixed_filter_sort_and_page() {
        let mut params = params_for(
            ResourceType::Invoice,
            Operation::GetAll,
            json!({"status": "open", "contactId": "c-2"}),
        );
        params.sort = SortOption::VoucherDateAsc;
        let def = operation_def(ResourceType::Invoice, Operation::GetAll).unwrap();
        let cursor = PageCursor::Offset {
            page: 2,
            size: 50,
            offset: 0,
        };
        let request = shape_request(def, &params, &cursor).unwrap();

        assert_eq!(request.path, "voucherlist");
        assert_eq!(request.query_value("voucherType"), Some("invoice"));
        assert_eq!(request.query_value("voucherStatus"), Some("open"));
        assert_eq!(request.query_value("contactId"), Some("c-2"));
        assert_eq!(request.query_value("sort"), Some("voucherDate,ASC"));
        assert_eq!(request.query_value("page"), Some("2"));
        assert_eq!(request.query_value("size"), Some("50"));
        assert_eq!(request.query_value("offset"), None);
    }

    #[test]
    fn test_cursor_token_is_forwarded_verbatim() {
        let params = params_for(ResourceType::EventSubscription, Operation::GetAll, json!({}));
        let def = operation_def(ResourceType::EventSubscription, Operation::GetAll).unwrap();
        let request = shape_request(def, &params, &PageCursor::Token("a+b/c".into())).unwrap();
        assert_eq!(request.query_value("cursor"), Some("a+b/c"));

        let request = shape_request(def, &params, &PageCursor::Token(String::new())).unwrap();
        assert_eq!(request.query_value("cursor"), None);
    }

    #[test]
    fn test_profile_update_body_is_the_composite_tree() {
        let params = params_for(
            ResourceType::Profile,
            Operation::Update,
            json!({"companyName": "Acme", "iban": "DE02"}),
        );
        let def = operation_def(ResourceType::Profile, Operation::Update).unwrap();
        let request = shape_request(def, &params, &PageCursor::None).unwrap();
        assert_eq!(
            request.body,
            Some(json!({"company": {"name": "Acme", "banking": {"iban": "DE02"}}}))
        );
    }

    #[test]
    fn test_normalize_single_shapes() {
        let ok = normalize_single(&ResponseShape::Single, &HttpResponse::json(&json!({"id": "x"})));
        assert_eq!(ok.unwrap(), json!({"id": "x"}));

        let empty = HttpResponse {
            status: 204,
            ..Default::default()
        };
        assert_eq!(
            normalize_single(&ResponseShape::Single, &empty).unwrap(),
            json!({"success": true})
        );

        let list = normalize_single(&ResponseShape::Single, &HttpResponse::json(&json!([1, 2])));
        assert_eq!(list.unwrap(), json!({"data": [1, 2]}));
    }

    #[test]
    fn test_binary_record() {
        let mut response = HttpResponse {
            status: 200,
            body: b"%PDF".to_vec(),
            ..Default::default()
        };
        response
            .headers
            .insert("content-type".into(), "application/pdf".into());
        response.headers.insert(
            "content-disposition".into(),
            "attachment; filename=\"RE-1001.pdf\"".into(),
        );

        let record = normalize_single(&ResponseShape::Binary, &response).unwrap();
        assert_eq!(record["mimeType"], "application/pdf");
        assert_eq!(record["fileName"], "RE-1001.pdf");
        assert_eq!(record["size"], 4);
        assert_eq!(record["data"], "JVBERg==");
    }
}
