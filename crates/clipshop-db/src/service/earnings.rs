//! # Earnings Service
//!
//! Admin-facing view over the earnings aggregation: access control plus
//! mapping into the wire DTOs. The summary combines both revenue sources
//! (confirmed bookings, completed orders); the per-day series backs the
//! monthly dashboard chart.

use chrono::{NaiveDate, Utc};

use crate::pool::Database;
use clipshop_core::dto::{DailySeriesDto, EarningsSummaryDto};
use clipshop_core::{CoreError, CoreResult, User};

/// Earnings reporting service.
#[derive(Debug, Clone)]
pub struct EarningsService {
    db: Database,
}

impl EarningsService {
    /// Creates a new EarningsService.
    pub fn new(db: Database) -> Self {
        EarningsService { db }
    }

    /// Daily/weekly/monthly combined revenue as of now. Admin only.
    pub async fn summary(&self, requester: &User) -> CoreResult<EarningsSummaryDto> {
        self.summary_as_of(requester, Utc::now().date_naive()).await
    }

    /// [`summary`](Self::summary) with an explicit clock.
    pub async fn summary_as_of(
        &self,
        requester: &User,
        today: NaiveDate,
    ) -> CoreResult<EarningsSummaryDto> {
        require_admin(requester)?;

        let summary = self.db.earnings().summary_as_of(today).await?;

        Ok(EarningsSummaryDto {
            daily_earnings: summary.daily.combined(),
            weekly_earnings: summary.weekly.combined(),
            monthly_earnings: summary.monthly.combined(),
        })
    }

    /// Per-day revenue for the current month. Admin only.
    pub async fn daily_series(&self, requester: &User) -> CoreResult<DailySeriesDto> {
        self.daily_series_as_of(requester, Utc::now().date_naive())
            .await
    }

    /// [`daily_series`](Self::daily_series) with an explicit clock.
    pub async fn daily_series_as_of(
        &self,
        requester: &User,
        today: NaiveDate,
    ) -> CoreResult<DailySeriesDto> {
        require_admin(requester)?;

        let series = self.db.earnings().per_day_of_current_month(today).await?;

        Ok(DailySeriesDto {
            labels: series.labels.iter().map(|d| d.to_string()).collect(),
            values: series.values,
        })
    }
}

fn require_admin(requester: &User) -> CoreResult<()> {
    if !requester.is_admin() {
        return Err(CoreError::forbidden("only admins may view earnings"));
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::booking::NewBooking;
    use crate::repository::catalog::NewService;
    use clipshop_core::Role;

    #[tokio::test]
    async fn test_summary_requires_admin_and_combines_sources() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let admin = db
            .users()
            .insert("boss", "boss@clipshop.test", Role::Admin)
            .await
            .unwrap();
        let barber = db
            .users()
            .insert("fig", "fig@clipshop.test", Role::Worker)
            .await
            .unwrap();
        let service = db
            .catalog()
            .create_service(NewService {
                name: "Haircut".to_string(),
                description: None,
                price_cents: 2000,
                duration_minutes: 30,
            })
            .await
            .unwrap();
        let slot = db.catalog().create_time_slot("09:00", "09:30").await.unwrap();

        let today = NaiveDate::from_ymd_opt(2026, 3, 11).unwrap();
        db.bookings()
            .insert(NewBooking {
                user_id: barber.id.clone(),
                barber_id: barber.id.clone(),
                service_id: service.id.clone(),
                date: today,
                time_slot_id: slot.id,
            })
            .await
            .unwrap();

        let svc = EarningsService::new(db);

        let summary = svc.summary_as_of(&admin, today).await.unwrap();
        assert_eq!(summary.daily_earnings.to_string(), "20.00");
        assert_eq!(summary.monthly_earnings.to_string(), "20.00");

        let series = svc.daily_series_as_of(&admin, today).await.unwrap();
        assert_eq!(series.labels.len(), 31);
        assert_eq!(series.labels[10], "2026-03-11");
        assert_eq!(series.values[10].to_string(), "20.00");

        let err = svc.summary_as_of(&barber, today).await.unwrap_err();
        assert!(matches!(err, CoreError::Forbidden(_)));
    }
}
