//! Dashboard statistics

use visa_core::{StatisticsOverview, StatusCount, TrendPoint, VisaTypeCount};

use crate::client::ApiClient;
use crate::error::ClientResult;
use crate::transport::ApiRequest;

/// Default trend window in days
pub const DEFAULT_TREND_DAYS: u32 = 30;

pub struct StatisticsApi<'a> {
    client: &'a ApiClient,
}

impl<'a> StatisticsApi<'a> {
    pub(crate) fn new(client: &'a ApiClient) -> Self {
        Self { client }
    }

    pub async fn overview(&self) -> ClientResult<StatisticsOverview> {
        self.client.fetch(ApiRequest::get("/statistics/overview")).await
    }

    /// Daily created/completed counts for the last `days` days
    pub async fn case_trend(&self, days: u32) -> ClientResult<Vec<TrendPoint>> {
        Ok(self
            .client
            .call(ApiRequest::get("/statistics/case-trend").query(vec![("days".to_string(), days.max(1).to_string())]))
            .await?
            .unwrap_or_default())
    }

    pub async fn status_distribution(&self) -> ClientResult<Vec<StatusCount>> {
        Ok(self
            .client
            .call(ApiRequest::get("/statistics/status-distribution"))
            .await?
            .unwrap_or_default())
    }

    pub async fn visa_type_distribution(&self) -> ClientResult<Vec<VisaTypeCount>> {
        Ok(self
            .client
            .call(ApiRequest::get("/statistics/visa-type-distribution"))
            .await?
            .unwrap_or_default())
    }
}
