//! 行情接口处理器
//!
//! - GET /quotes?symbols=AAPL.US,MSFT.US - 实时报价
//! - GET /prices?symbol=AAPL.US&from=2024-01-01&to=2024-01-31 - 日线
//! - GET /polygon/snapshot?tickers=AAPL,MSFT - Polygon 快照

use actix_web::{web, HttpResponse, Result};

use super::params::{date_range, parse_symbol, parse_symbols};
use super::{method_not_allowed, respond_list};
use crate::error::AppError;
use crate::models::{PriceBar, PricesQuery, Quote, QuotesQuery, SnapshotQuery};
use crate::services::eodhd::{EodhdService, PriceRange};
use crate::services::polygon::PolygonService;

/// 获取实时报价
///
/// GET /api/quotes?symbols=AAPL.US,MSFT.US
pub async fn get_quotes(
    eodhd: web::Data<EodhdService>,
    query: web::Query<QuotesQuery>,
) -> Result<HttpResponse> {
    let result: Result<Vec<Quote>, AppError> = async {
        let symbols = parse_symbols("symbols", query.symbols.as_deref())?;
        Ok(eodhd.quotes(&symbols).await?)
    }
    .await;

    Ok(respond_list(result, "items"))
}

/// 获取日线历史
///
/// GET /api/prices?symbol=AAPL.US&from=2024-01-01&to=2024-01-31&period=d
pub async fn get_prices(
    eodhd: web::Data<EodhdService>,
    query: web::Query<PricesQuery>,
) -> Result<HttpResponse> {
    let result: Result<Vec<PriceBar>, AppError> = async {
        let symbol = parse_symbol("symbol", query.symbol.as_deref())?;
        let (from, to) = date_range(query.from.as_deref(), query.to.as_deref())?;
        let period = match query.period.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(p @ ("d" | "w" | "m")) => Some(p.to_string()),
            Some(other) => {
                return Err(AppError::Validation(format!("Invalid period: {} (expected d, w or m)", other)))
            }
        };

        Ok(eodhd.prices(&symbol, &PriceRange { from, to, period }).await?)
    }
    .await;

    Ok(respond_list(result, "prices"))
}

/// 获取 Polygon 快照
///
/// GET /api/polygon/snapshot?tickers=AAPL,MSFT
pub async fn get_polygon_snapshot(
    polygon: web::Data<PolygonService>,
    query: web::Query<SnapshotQuery>,
) -> Result<HttpResponse> {
    let result: Result<Vec<Quote>, AppError> = async {
        let tickers = parse_symbols("tickers", query.tickers.as_deref())?;
        Ok(polygon.snapshot(&tickers).await?)
    }
    .await;

    Ok(respond_list(result, "prices"))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/quotes")
            .route(web::get().to(get_quotes))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/prices")
            .route(web::get().to(get_prices))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/polygon/snapshot")
            .route(web::get().to(get_polygon_snapshot))
            .default_service(web::to(method_not_allowed)),
    );
}

#[cfg(test)]
mod tests {
    use crate::handlers::testing::services;
    use crate::middleware::Cors;
    use crate::test_support::{spawn_responder, spawn_silent, TEST_KEY_ENV, UNSET_KEY_ENV};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    #[actix_web::test]
    async fn test_quotes_scenario() {
        let upstream = spawn_responder(
            200,
            r#"[{"code":"AAPL.US","close":150.2,"change":1.1,"change_p":0.7},{"code":"MSFT.US","close":"NA"}]"#,
        )
        .await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().wrap(Cors).configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/quotes?symbols=AAPL.US,MSFT.US")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 200);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(
            body,
            json!({
                "ok": true,
                "items": [
                    { "code": "AAPL.US", "price": 150.2, "change": 1.1, "changePercent": 0.7 },
                    { "code": "MSFT.US", "price": null, "change": null, "changePercent": null }
                ]
            })
        );
    }

    #[actix_web::test]
    async fn test_quotes_require_symbols() {
        let upstream = spawn_responder(200, "[]").await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/api/quotes?symbols=").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["ok"], false);
        assert_eq!(body["code"], "VALIDATION_ERROR");
        assert_eq!(body["items"], json!([]));
        assert_eq!(upstream.request_count(), 0);
    }

    #[actix_web::test]
    async fn test_prices_timeout_returns_empty_prices() {
        let base_url = spawn_silent().await;
        let services = services(&base_url, TEST_KEY_ENV, 100);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/prices?symbol=AAPL.US&from=2024-01-01&to=2024-01-31")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "UPSTREAM_TIMEOUT");
        assert_eq!(body["prices"], json!([]));
        assert!(body["detail"].as_str().unwrap().contains("timed out"));
    }

    #[actix_web::test]
    async fn test_prices_validates_period() {
        let upstream = spawn_responder(200, "[]").await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/prices?symbol=AAPL.US&from=2024-01-01&to=2024-01-31&period=y")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 400);
    }

    #[actix_web::test]
    async fn test_dot_segment_symbol_never_reaches_upstream() {
        let upstream = spawn_responder(200, "[]").await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        for uri in [
            "/api/prices?symbol=..&from=2024-01-01&to=2024-01-02",
            "/api/quotes?symbols=..,AAPL.US",
        ] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), 400, "{}", uri);
        }
        assert_eq!(upstream.request_count(), 0);
    }

    #[actix_web::test]
    async fn test_missing_api_key_is_configuration_error() {
        let upstream = spawn_responder(200, "[]").await;
        let services = services(&upstream.base_url, UNSET_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get()
            .uri("/api/polygon/snapshot?tickers=AAPL")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 500);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "CONFIGURATION_ERROR");
        assert_eq!(body["prices"], json!([]));
        assert!(body["detail"].as_str().unwrap().contains(UNSET_KEY_ENV));
    }

    #[actix_web::test]
    async fn test_upstream_failure_is_bad_gateway() {
        let upstream = spawn_responder(500, "boom").await;
        let services = services(&upstream.base_url, TEST_KEY_ENV, 2_000);
        let app = test::init_service(App::new().configure(|cfg| services.configure(cfg))).await;

        let req = test::TestRequest::get().uri("/api/quotes?symbols=AAPL.US").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), 502);

        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["code"], "UPSTREAM_ERROR");
        assert!(body["detail"].as_str().unwrap().contains("boom"));
    }
}
