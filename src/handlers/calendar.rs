//! 经济日历接口处理器

use actix_web::{web, HttpResponse, Result};

use super::params::{clamp_limit, date_range};
use super::{method_not_allowed, respond_list};
use crate::error::AppError;
use crate::models::{CalendarEvent, CalendarQuery};
use crate::services::eodhd::{CalendarFilter, EodhdService};

const DEFAULT_LIMIT: usize = 50;
const MAX_LIMIT: usize = 100;

/// 获取经济日历
///
/// GET /api/calendar?from=2024-01-01&to=2024-01-07&country=US&limit=50
pub async fn get_calendar(
    eodhd: web::Data<EodhdService>,
    query: web::Query<CalendarQuery>,
) -> Result<HttpResponse> {
    let result: Result<Vec<CalendarEvent>, AppError> = async {
        let (from, to) = date_range(query.from.as_deref(), query.to.as_deref())?;
        let country = query
            .country
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(str::to_uppercase);

        let filter = CalendarFilter {
            from,
            to,
            country,
            limit: clamp_limit(query.limit, DEFAULT_LIMIT, MAX_LIMIT),
        };
        Ok(eodhd.calendar(&filter).await?)
    }
    .await;

    Ok(respond_list(result, "events"))
}

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/calendar")
            .route(web::get().to(get_calendar))
            .default_service(web::to(method_not_allowed)),
    );
}
