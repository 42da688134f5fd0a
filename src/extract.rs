use axum::extract::{FromRequest, FromRequestParts};

use crate::error::AppError;

/// `axum::Json` whose rejections render as `{"error": ...}` with status 400.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with the same error shape as [`ApiJson`].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::dto::{TransactionsQuery, TransferRequest};
    use axum::{
        body::Body,
        http::{header::CONTENT_TYPE, Request, StatusCode},
        response::IntoResponse,
    };

    fn json_request(body: &'static str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/transfer")
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn error_body(err: AppError) -> (StatusCode, serde_json::Value) {
        let res = err.into_response();
        let status = res.status();
        let body = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn parses_well_formed_body() {
        let req = json_request(
            r#"{"fromEmail":"a@example.com","toEmail":"b@example.com","amount":12.5}"#,
        );
        let ApiJson(payload) = ApiJson::<TransferRequest>::from_request(req, &()).await.unwrap();
        assert_eq!(payload.amount, Some(12.5));
    }

    #[tokio::test]
    async fn wrongly_typed_amount_is_a_json_400() {
        let req = json_request(
            r#"{"fromEmail":"a@example.com","toEmail":"b@example.com","amount":"100"}"#,
        );
        let err = ApiJson::<TransferRequest>::from_request(req, &()).await.unwrap_err();
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("amount"));
    }

    #[tokio::test]
    async fn null_field_is_a_json_400() {
        let req = json_request(r#"{"fromEmail":null,"toEmail":"b@example.com","amount":1}"#);
        let err = ApiJson::<TransferRequest>::from_request(req, &()).await.unwrap_err();
        let (status, body) = error_body(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn malformed_json_and_missing_content_type_are_400() {
        let req = json_request("{not json");
        let err = ApiJson::<TransferRequest>::from_request(req, &()).await.unwrap_err();
        assert_eq!(error_body(err).await.0, StatusCode::BAD_REQUEST);

        let req = Request::builder()
            .method("POST")
            .uri("/api/transfer")
            .body(Body::from("{}"))
            .unwrap();
        let err = ApiJson::<TransferRequest>::from_request(req, &()).await.unwrap_err();
        assert_eq!(error_body(err).await.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn query_is_parsed_and_missing_email_defaults() {
        let (mut parts, _) = Request::builder()
            .uri("/api/transactions?email=a%40example.com")
            .body(())
            .unwrap()
            .into_parts();
        let ApiQuery(q) = ApiQuery::<TransactionsQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert_eq!(q.email, "a@example.com");

        let (mut parts, _) = Request::builder()
            .uri("/api/transactions")
            .body(())
            .unwrap()
            .into_parts();
        let ApiQuery(q) = ApiQuery::<TransactionsQuery>::from_request_parts(&mut parts, &())
            .await
            .unwrap();
        assert!(q.email.is_empty());
    }
}
