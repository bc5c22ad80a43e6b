//! 新闻接口处理器
//!
//! - GET /news?symbols=AAPL.US&tags=earnings - EODHD 新闻
//! - GET /marketaux/news?symbols=AAPL,TSLA - Marketaux 新闻

use actix_web::{web, HttpResponse, Result};
use serde::Deserialize;

use super::params::{clamp_limit, optional_date, parse_symbol_list, parse_symbols, parse_tags};
use super::{method_not_allowed, respond_list};
use crate::error::AppError;
use crate::models::{NewsArticle, NewsQuery};
use crate::services::eodhd::{EodhdService, NewsFilter};
use crate::services::marketaux::MarketauxService;

const DEFAULT_LIMIT: usize = 20;
const MARKETAUX_DEFAULT_LIMIT: usize = 10;
const MAX_LIMIT: usize = 100;

/// Marketaux 新闻查询参数
#[derive(Debug, Deserialize)]
pub struct MarketauxNewsQuery {
    pub symbols: Option<String>,
    pub limit: Option<usize>,
}

/// 获取 EODHD 新闻，symbols 与 tags 至少提供一个
///
/// GET /api/news?symbols=AAPL.US&tags=earnings&from=2024-01-01&limit=20&offset=0
pub async fn get_news(
    eodhd: web::Data<EodhdService>,
    query: web::Query<NewsQuery>,
) -> Result<HttpResponse> {
    let result: Result<Vec<NewsArticle>, AppError> = async {
        let symbols = parse_symbol_list(query.symbols.as_deref())?;
        let tags = parse_tags(query.tags.as_deref());
        if symbols.is_empty() && tags.is_empty() {
            return Err(AppError::Validation(
                "Missing required parameter: symbols or tags".to_string(),
            ));
        }

        let filter = NewsFilter {
            symbols,
            tags,
            from: optional_date("from", query.from.as_deref())?,
            to: optional_date("to", query.to.as_deref())?,
            limit: clamp_limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT),
            offset: query.offset.unwrap_or(0),
        };
        Ok(eodhd.news(&filter).await?)
    }
    .await;

    Ok(respond_list(result, "articles"))
}

/// 获取 Marketaux 新闻
///
/// GET /api/marketaux/news?symbols=AAPL,TSLA&limit=10
pub async fn get_marketaux_news(
    marketaux: web::Data<MarketauxService>,
    query: web::Query<MarketauxNewsQuery>,
) -> Result<HttpResponse> {
    let result: Result<Vec<NewsArticle>, AppError> = async {
        let symbols = parse_symbols("symbols", query.symbols.as_deref())?;
        let limit = clamp_limit(query.limit, MARKETAUX_DEFAULT_LIMIT, MAX_LIMIT);
        Ok(marketaux.news(&symbols, limit).await?)
    }
    .await;

    Ok(respond_list(result, "articles"))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/news")
            .route(web::get().to(get_news))
            .default_service(web::to(method_not_allowed)),
    )
    .service(
        web::resource("/marketaux/news")
            .route(web::get().to(get_marketaux_news))
            .default_service(web::to(method_not_allowed)),
    );
}
