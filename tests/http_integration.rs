//! Integration tests for the dispatcher using wiremock
//!
//! These tests run the reqwest transport against mocked lexoffice endpoints,
//! covering request shaping, pagination modes and remote error handling.

use lexoffice_dispatch::input::JsonInput;
use lexoffice_dispatch::resource::{build, Dispatcher, Operation, PagingLimits, ResourceType};
use lexoffice_dispatch::{Credentials, DispatchError, LexofficeClient};
use serde_json::{json, Value};
use wiremock::matchers::{
    bearer_token, body_partial_json, method, path, query_param, query_param_is_missing,
};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn dispatcher(server: &MockServer) -> Dispatcher {
    let credentials = Credentials::new("test-token", &server.uri());
    let client = LexofficeClient::with_reqwest(credentials).expect("client should build");
    Dispatcher::new(client)
}

async fn run(
    dispatcher: &Dispatcher,
    resource: ResourceType,
    operation: Operation,
    input: Value,
) -> Result<lexoffice_dispatch::ResultSequence, DispatchError> {
    let input = JsonInput::from_value(input).expect("input should be an object");
    let params = build(resource, operation, &input, 0)?;
    dispatcher.execute(&params).await
}

fn contacts(from: usize, count: usize) -> Vec<Value> {
    (from..from + count)
        .map(|i| json!({"id": format!("contact-{}", i)}))
        .collect()
}

/// Test module for single-call operations
mod single_call_tests {
    use super::*;

    /// GET with a path placeholder returns the record as-is
    #[tokio::test]
    async fn test_get_sends_bearer_token() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/contacts/c-1"))
            .and(bearer_token("test-token"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"id": "c-1", "version": 3})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::Contact,
            Operation::Get,
            json!({"contactId": "c-1"}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records, vec![json!({"id": "c-1", "version": 3})]);
    }

    /// POST body carries targets, defaults and encoded dates
    #[tokio::test]
    async fn test_create_invoice_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/invoices"))
            .and(query_param("finalize", "true"))
            .and(body_partial_json(json!({
                "address": {"contactId": "c-1"},
                "voucherDate": "2026-01-15T00:00:00.000+00:00",
                "totalPrice": {"currency": "EUR"},
                "taxConditions": {"taxType": "net"}
            })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!({"id": "inv-1", "version": 1})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::Invoice,
            Operation::Create,
            json!({
                "invoiceContactId": "c-1",
                "voucherDate": "2026-01-15",
                "lineItems": [{"type": "custom", "name": "Consulting"}],
                "finalize": true
            }),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records[0]["id"], "inv-1");
    }

    /// Empty success body becomes a success marker
    #[tokio::test]
    async fn test_empty_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/dunnings"))
            .and(query_param("finalize", "true"))
            .and(query_param("precedingSalesVoucherId", "inv-1"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::Dunning,
            Operation::Finalize,
            json!({"precedingSalesVoucherId": "inv-1", "voucherDate": "2026-02-01"}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records, vec![json!({"success": true})]);
    }

    /// Binary downloads are returned as a base64 record
    #[tokio::test]
    async fn test_download_file_is_base64_record() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/invoices/inv-1/file"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "application/pdf")
                    .insert_header("content-disposition", "attachment; filename=\"RE-1.pdf\"")
                    .set_body_bytes(b"%PDF".to_vec()),
            )
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::Invoice,
            Operation::DownloadFile,
            json!({"invoiceId": "inv-1"}),
        )
        .await
        .expect("Request should succeed");

        let record = &result.records[0];
        assert_eq!(record["mimeType"], "application/pdf");
        assert_eq!(record["fileName"], "RE-1.pdf");
        assert_eq!(record["size"], 4);
        assert_eq!(record["data"], "JVBERg==");
    }

    /// 406 validation failures keep the status and the remote's issues
    #[tokio::test]
    async fn test_406_returns_remote_failure() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1/articles"))
            .respond_with(ResponseTemplate::new(406).set_body_json(json!({
                "IssueList": [{"i18nKey": "missing_entity", "source": "price.netPrice"}]
            })))
            .mount(&server)
            .await;

        let err = run(
            &dispatcher(&server),
            ResourceType::Article,
            Operation::Create,
            json!({"articleName": "Widget", "articleTypeCreate": "PRODUCT"}),
        )
        .await
        .unwrap_err();

        match err {
            DispatchError::RemoteCallFailure { status, message } => {
                assert_eq!(status, Some(406));
                assert_eq!(message, "price.netPrice: missing_entity");
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }

    /// Missing fields never reach the network
    #[tokio::test]
    async fn test_missing_fields_send_nothing() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = run(
            &dispatcher(&server),
            ResourceType::Invoice,
            Operation::Create,
            json!({"voucherDate": "2026-01-15"}),
        )
        .await
        .unwrap_err();

        match err {
            DispatchError::MissingRequiredFields { fields, .. } => {
                assert_eq!(fields, vec!["invoiceContactId", "lineItems"]);
            },
            other => panic!("unexpected error: {other:?}"),
        }
    }
}

/// Test module for get-all pagination modes
mod pagination_tests {
    use super::*;

    /// ReturnAll drains pages 0..2 and concatenates them in order
    #[tokio::test]
    async fn test_return_all_concatenates_pages() {
        let server = MockServer::start().await;

        for (page, count, last) in [(0, 25, false), (1, 25, false), (2, 10, true)] {
            Mock::given(method("GET"))
                .and(path("/v1/contacts"))
                .and(query_param("page", page.to_string()))
                .and(query_param("size", "25"))
                .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                    "content": contacts(page * 25, count),
                    "number": page,
                    "last": last,
                    "totalPages": 3
                })))
                .expect(1)
                .mount(&server)
                .await;
        }

        let result = run(
            &dispatcher(&server),
            ResourceType::Contact,
            Operation::GetAll,
            json!({"returnAll": true, "limit": 5}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records.len(), 60);
        assert_eq!(result.records[0]["id"], "contact-0");
        assert_eq!(result.records[25]["id"], "contact-25");
        assert_eq!(result.records[59]["id"], "contact-59");
        assert_eq!(result.next_cursor, None);
    }

    /// ReturnAll on a cursor endpoint follows nextCursor until it runs out
    #[tokio::test]
    async fn test_return_all_follows_cursor_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/event-subscriptions"))
            .and(query_param_is_missing("cursor"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"subscriptionId": "s-1"}, {"subscriptionId": "s-2"}],
                "nextCursor": "p2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/v1/event-subscriptions"))
            .and(query_param("cursor", "p2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"subscriptionId": "s-3"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::EventSubscription,
            Operation::GetAll,
            json!({"returnAll": true}),
        )
        .await
        .expect("Request should succeed");

        let ids: Vec<&str> = result
            .records
            .iter()
            .filter_map(|r| r["subscriptionId"].as_str())
            .collect();
        assert_eq!(ids, vec!["s-1", "s-2", "s-3"]);
        assert_eq!(result.next_cursor, None);

        let requests = server.received_requests().await.expect("recording is on");
        assert_eq!(requests.len(), 2);
    }

    /// A remote that never reports a last page hits the page ceiling
    #[tokio::test]
    async fn test_return_all_respects_max_pages() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/contacts"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"content": contacts(0, 2)})),
            )
            .mount(&server)
            .await;

        let dispatcher = dispatcher(&server).with_limits(PagingLimits {
            return_all_page_size: 2,
            max_pages: 3,
        });

        let err = run(
            &dispatcher,
            ResourceType::Contact,
            Operation::GetAll,
            json!({"returnAll": true}),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, DispatchError::PaginationExhaustion { .. }));
    }

    /// Page mode returns at most `limit` records
    #[tokio::test]
    async fn test_limit_truncates_single_page() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/voucherlist"))
            .and(query_param("voucherType", "invoice"))
            .and(query_param("voucherStatus", "any"))
            .and(query_param("sort", "voucherDate,ASC"))
            .and(query_param("page", "2"))
            .and(query_param("size", "10"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"content": contacts(0, 15)})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::Invoice,
            Operation::GetAll,
            json!({"limit": 10, "page": 2, "sort": "voucherDateAsc"}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records.len(), 10);
        assert_eq!(result.records[9]["id"], "contact-9");
    }

    /// Cursor mode fetches one page and exposes the continuation token
    #[tokio::test]
    async fn test_cursor_mode_single_request() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/event-subscriptions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "content": [{"subscriptionId": "s-1"}, {"subscriptionId": "s-2"}],
                "nextCursor": "abc"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::EventSubscription,
            Operation::GetAll,
            json!({"cursor": ""}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records.len(), 2);
        assert_eq!(result.next_cursor.as_deref(), Some("abc"));
    }

    /// A supplied cursor is forwarded verbatim
    #[tokio::test]
    async fn test_cursor_is_forwarded() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/event-subscriptions"))
            .and(query_param("cursor", "abc"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"content": [{"subscriptionId": "s-3"}]})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::EventSubscription,
            Operation::GetAll,
            json!({"cursor": "abc"}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records, vec![json!({"subscriptionId": "s-3"})]);
        assert_eq!(result.next_cursor, None);
    }

    /// Lookup lists are a bare top-level array
    #[tokio::test]
    async fn test_top_level_array_listing() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v1/countries"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                {"countryCode": "DE"},
                {"countryCode": "AT"}
            ])))
            .mount(&server)
            .await;

        let result = run(
            &dispatcher(&server),
            ResourceType::Country,
            Operation::GetAll,
            json!({"returnAll": true}),
        )
        .await
        .expect("Request should succeed");

        assert_eq!(result.records.len(), 2);
    }
}
