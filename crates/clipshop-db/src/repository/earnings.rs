//! # Earnings Repository
//!
//! Read-only revenue aggregation over confirmed bookings and completed
//! orders. Nothing here is stored: every figure is recomputed from the
//! source rows at query time, so a service price edit retroactively moves
//! booking earnings while order earnings stay pinned to their frozen line
//! prices.
//!
//! ## Windows
//! ```text
//! daily    [today .. today]
//! weekly   [Monday of today's ISO week .. today]
//! monthly  [1st of today's month .. today]
//! ```
//! All windows are inclusive and clamp at `today`; days with no revenue
//! contribute zero rather than being absent.

use std::collections::HashMap;

use chrono::{Datelike, Duration, NaiveDate};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};
use clipshop_core::Money;

/// Revenue split by source for one window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowTotals {
    /// Sum of `service.price` over CONFIRMED bookings with `date` in window.
    pub bookings: Money,
    /// Sum of derived item totals over COMPLETED orders created in window.
    pub orders: Money,
}

impl WindowTotals {
    /// Combined revenue from both sources.
    #[inline]
    pub fn combined(&self) -> Money {
        self.bookings + self.orders
    }
}

/// The three standard windows, daily through monthly.
#[derive(Debug, Clone, Copy)]
pub struct EarningsSummary {
    pub daily: WindowTotals,
    pub weekly: WindowTotals,
    pub monthly: WindowTotals,
}

/// One month of per-day combined revenue. Future days of the month are
/// present with zero values so the series always spans the whole month.
#[derive(Debug, Clone)]
pub struct DailySeries {
    pub labels: Vec<NaiveDate>,
    pub values: Vec<Money>,
}

/// Repository for earnings aggregation.
#[derive(Debug, Clone)]
pub struct EarningsRepository {
    pool: SqlitePool,
}

impl EarningsRepository {
    /// Creates a new EarningsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EarningsRepository { pool }
    }

    /// Daily, weekly and monthly totals as of `today`.
    ///
    /// `today` is an explicit argument so callers (and tests) control the
    /// clock; production callers pass `Utc::now().date_naive()`.
    pub async fn summary_as_of(&self, today: NaiveDate) -> DbResult<EarningsSummary> {
        let week_start = today - Duration::days(today.weekday().num_days_from_monday() as i64);
        let month_start = first_of_month(today)?;

        debug!(%today, %week_start, %month_start, "Computing earnings summary");

        Ok(EarningsSummary {
            daily: self.window_totals(today, today).await?,
            weekly: self.window_totals(week_start, today).await?,
            monthly: self.window_totals(month_start, today).await?,
        })
    }

    /// Combined per-day revenue for every day of `today`'s month.
    pub async fn per_day_of_current_month(&self, today: NaiveDate) -> DbResult<DailySeries> {
        let first = first_of_month(today)?;
        let last = last_of_month(today)?;

        let booking_rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT b.date, SUM(s.price_cents)
            FROM bookings b
            JOIN services s ON s.id = b.service_id
            WHERE b.status = 'confirmed' AND b.date BETWEEN ?1 AND ?2
            GROUP BY b.date
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch_all(&self.pool)
        .await?;

        let order_rows = sqlx::query_as::<_, (NaiveDate, i64)>(
            r#"
            SELECT date(o.created_at), SUM(oi.quantity * oi.unit_price_cents)
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.status = 'completed' AND date(o.created_at) BETWEEN ?1 AND ?2
            GROUP BY date(o.created_at)
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch_all(&self.pool)
        .await?;

        let mut per_day: HashMap<NaiveDate, i64> = HashMap::new();
        for (date, cents) in booking_rows.into_iter().chain(order_rows) {
            *per_day.entry(date).or_insert(0) += cents;
        }

        let mut labels = Vec::new();
        let mut values = Vec::new();
        let mut day = first;
        while day <= last {
            labels.push(day);
            values.push(Money::from_cents(per_day.get(&day).copied().unwrap_or(0)));
            day += Duration::days(1);
        }

        Ok(DailySeries { labels, values })
    }

    /// Totals for one inclusive [from, to] window.
    async fn window_totals(&self, from: NaiveDate, to: NaiveDate) -> DbResult<WindowTotals> {
        let booking_cents = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(s.price_cents), 0)
            FROM bookings b
            JOIN services s ON s.id = b.service_id
            WHERE b.status = 'confirmed' AND b.date BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        let order_cents = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(oi.quantity * oi.unit_price_cents), 0)
            FROM orders o
            JOIN order_items oi ON oi.order_id = o.id
            WHERE o.status = 'completed' AND date(o.created_at) BETWEEN ?1 AND ?2
            "#,
        )
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(WindowTotals {
            bookings: Money::from_cents(booking_cents),
            orders: Money::from_cents(order_cents),
        })
    }
}

fn first_of_month(date: NaiveDate) -> DbResult<NaiveDate> {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
        .ok_or_else(|| DbError::Internal(format!("invalid date {date}")))
}

fn last_of_month(date: NaiveDate) -> DbResult<NaiveDate> {
    let next_month = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    next_month
        .map(|d| d - Duration::days(1))
        .ok_or_else(|| DbError::Internal(format!("invalid date {date}")))
}

// =============================================================================
// Unit Tests
// =============================================================================
