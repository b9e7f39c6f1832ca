//! # Wire DTOs
//!
//! The representation entities take on the wire.
//!
//! Each DTO is a plain `Serialize` struct built by an explicit constructor
//! from the domain types, so the mapping per entity is chosen at compile
//! time rather than through dynamic attribute lookup. Monetary fields are
//! [`Money`] and therefore serialize as fixed-point 2-decimal strings; dates
//! are ISO-8601 calendar dates and slot times are `HH:MM`.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;
use crate::types::{order_total, Booking, BookingStatus, OrderItem, OrderStatus, Service, TimeSlot};

// =============================================================================
// Booking
// =============================================================================

/// Wire form of a time slot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeSlotDto {
    pub id: String,
    pub start_time: String,
    pub end_time: String,
}

impl TimeSlotDto {
    pub fn from_slot(slot: &TimeSlot) -> Self {
        TimeSlotDto {
            id: slot.id.clone(),
            start_time: slot.start_time.clone(),
            end_time: slot.end_time.clone(),
        }
    }
}

/// Wire form of a service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Money,
    pub duration_minutes: i64,
}

impl ServiceDto {
    pub fn from_service(service: &Service) -> Self {
        ServiceDto {
            id: service.id.clone(),
            name: service.name.clone(),
            description: service.description.clone(),
            price: service.price(),
            duration_minutes: service.duration_minutes,
        }
    }
}

/// Wire form of a booking, with its service and slot embedded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDto {
    pub id: String,
    pub user: String,
    pub service: ServiceDto,
    pub date: NaiveDate,
    pub time_slot: TimeSlotDto,
    pub barber: String,
    pub status: BookingStatus,
    pub created_at: DateTime<Utc>,
}

impl BookingDto {
    pub fn from_parts(booking: &Booking, service: &Service, slot: &TimeSlot) -> Self {
        BookingDto {
            id: booking.id.clone(),
            user: booking.user_id.clone(),
            service: ServiceDto::from_service(service),
            date: booking.date,
            time_slot: TimeSlotDto::from_slot(slot),
            barber: booking.barber_id.clone(),
            status: booking.status,
            created_at: booking.created_at,
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// Wire form of an order line.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItemDto {
    pub product: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub subtotal: Money,
}

impl OrderItemDto {
    pub fn from_item(item: &OrderItem) -> Self {
        OrderItemDto {
            product: item.product_id.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price(),
            subtotal: item.subtotal(),
        }
    }
}

/// Wire form of an order. `price` is computed from the items at mapping
/// time; it has no stored counterpart that could drift.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDto {
    pub id: String,
    pub items: Vec<OrderItemDto>,
    pub price: Money,
    pub created_at: DateTime<Utc>,
    pub status: OrderStatus,
}

impl OrderDto {
    pub fn from_parts(order: &crate::types::Order, items: &[OrderItem]) -> Self {
        OrderDto {
            id: order.id.clone(),
            items: items.iter().map(OrderItemDto::from_item).collect(),
            price: order_total(items),
            created_at: order.created_at,
            status: order.status,
        }
    }
}

// =============================================================================
// Earnings
// =============================================================================

/// Wire form of the time-windowed earnings summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EarningsSummaryDto {
    pub daily_earnings: Money,
    pub weekly_earnings: Money,
    pub monthly_earnings: Money,
}

/// Wire form of the per-day revenue series for the current month:
/// one label (ISO date) and one value per calendar day.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySeriesDto {
    pub labels: Vec<String>,
    pub values: Vec<Money>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Order;

    fn sample_order() -> (Order, Vec<OrderItem>) {
        let now = Utc::now();
        let order = Order {
            id: "o1".to_string(),
            user_id: "u1".to_string(),
            status: OrderStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        let items = vec![
            OrderItem {
                id: "i1".to_string(),
                order_id: "o1".to_string(),
                product_id: "p1".to_string(),
                quantity: 2,
                unit_price_cents: 1000,
            },
            OrderItem {
                id: "i2".to_string(),
                order_id: "o1".to_string(),
                product_id: "p2".to_string(),
                quantity: 1,
                unit_price_cents: 500,
            },
        ];
        (order, items)
    }

    #[test]
    fn test_order_dto_price_is_derived() {
        let (order, items) = sample_order();
        let dto = OrderDto::from_parts(&order, &items);

        assert_eq!(dto.price, Money::from_cents(2500));
        assert_eq!(dto.items.len(), 2);
        assert_eq!(dto.items[0].subtotal, Money::from_cents(2000));
    }

    #[test]
    fn test_order_dto_wire_shape() {
        let (order, items) = sample_order();
        let json = serde_json::to_value(OrderDto::from_parts(&order, &items)).unwrap();

        assert_eq!(json["price"], "25.00");
        assert_eq!(json["status"], "pending");
        assert_eq!(json["items"][0]["unit_price"], "10.00");
        assert_eq!(json["items"][1]["subtotal"], "5.00");
    }
}
