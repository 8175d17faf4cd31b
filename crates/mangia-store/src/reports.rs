//! Read-only reporting views composed from the order queries.
//!
//! Nothing here touches the schema directly; every figure is derived from
//! the materialization and aggregation routines in `orders` and `products`.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::database::Database;
use crate::error::Result;
use crate::models::{Order, Product};

/// Sales summary for one reporting period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesReport {
    /// The period's orders, newest first.
    pub orders: Vec<Order>,
    pub total_orders: usize,
    /// Sum of the order totals, exact.
    pub total_revenue: Decimal,
}

impl SalesReport {
    fn from_orders(orders: Vec<Order>) -> Self {
        let total_revenue = orders.iter().map(Order::total).sum();
        Self {
            total_orders: orders.len(),
            total_revenue,
            orders,
        }
    }
}

/// One row of the popular-products report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductStats {
    pub product: Product,
    /// Order-item rows referencing the product, any status.
    pub times_ordered: u64,
    /// Revenue from `DELIVERED` orders at the current price.
    pub revenue: Decimal,
}

impl Database {
    /// Sales on one calendar day.
    pub fn daily_sales_report(&self, date: NaiveDate) -> Result<SalesReport> {
        Ok(SalesReport::from_orders(self.orders_on_date(date)?))
    }

    /// Sales in one calendar month.
    pub fn monthly_sales_report(&self, year: i32, month: u32) -> Result<SalesReport> {
        Ok(SalesReport::from_orders(self.orders_in_month(year, month)?))
    }

    /// The popularity ranking with per-product order counts and revenue.
    pub fn popular_products_report(&self) -> Result<Vec<ProductStats>> {
        let mut entries = Vec::new();
        for product in self.popular_products()? {
            let times_ordered = self.product_order_count(product.id)?;
            let revenue = self.product_revenue(product.id)?;
            entries.push(ProductStats {
                product,
                times_ordered,
                revenue,
            });
        }
        Ok(entries)
    }
}
