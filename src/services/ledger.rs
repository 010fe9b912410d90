//! Registration ledger: balance derived from payment rows and the payment-driven
//! part of a registration's status.
//!
//! Balances are always computed on read from the payment rows; nothing derived is stored
//! except the coarse `registrations.status`, which [`reconcile_registration`] keeps in step
//! with the payments inside the caller's transaction.

use crate::entities::{
    RegistrationStatus, payment_entity as payments, registration_entity as registrations,
};
use crate::error::AppResult;
use crate::models::{BalanceResponse, PaymentStatus};
use crate::utils::to_decimal;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, QuerySelect, Set,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Balance {
    pub price_cents: i64,
    pub total_paid_cents: i64,
    /// Negative when overpaid
    pub balance_due_cents: i64,
    pub payment_count: u64,
    pub status: PaymentStatus,
}

impl Balance {
    pub fn to_response(&self, registration_id: i64) -> BalanceResponse {
        BalanceResponse {
            registration_id,
            event_price: to_decimal(self.price_cents),
            total_paid: to_decimal(self.total_paid_cents),
            balance_due: to_decimal(self.balance_due_cents),
            payment_count: self.payment_count,
            payment_status: self.status,
        }
    }
}

/// Sum payment amounts (cents) against an event price.
pub fn compute_balance<I>(price_cents: i64, amounts: I) -> Balance
where
    I: IntoIterator<Item = i64>,
{
    let (total_paid_cents, payment_count) = amounts
        .into_iter()
        .fold((0i64, 0u64), |(sum, n), amount| (sum + amount, n + 1));

    Balance {
        price_cents,
        total_paid_cents,
        balance_due_cents: price_cents - total_paid_cents,
        payment_count,
        status: payment_status(price_cents, total_paid_cents),
    }
}

/// Equality with the price is checked first, so a free event with nothing paid is settled.
pub fn payment_status(price_cents: i64, total_paid_cents: i64) -> PaymentStatus {
    if total_paid_cents == price_cents {
        PaymentStatus::Paid
    } else if total_paid_cents > price_cents {
        PaymentStatus::Overpaid
    } else if total_paid_cents == 0 {
        PaymentStatus::Unpaid
    } else {
        PaymentStatus::Partial
    }
}

/// Payment-driven registration status; `pending` is the resting state.
pub fn coarse_status(price_cents: i64, total_paid_cents: i64) -> RegistrationStatus {
    if total_paid_cents >= price_cents {
        RegistrationStatus::Paid
    } else if total_paid_cents > 0 {
        RegistrationStatus::Partial
    } else {
        RegistrationStatus::Pending
    }
}

/// Status a registration should hold given its payments.
///
/// - `cancelled` and `waitlist` are administrative and never overwritten
/// - `confirmed` is only promoted to `paid`, never demoted by a payment change
pub fn next_status(
    current: RegistrationStatus,
    price_cents: i64,
    total_paid_cents: i64,
) -> RegistrationStatus {
    if current.is_administrative_hold() {
        return current;
    }
    let target = coarse_status(price_cents, total_paid_cents);
    if current == RegistrationStatus::Confirmed && target != RegistrationStatus::Paid {
        return current;
    }
    target
}

pub async fn load_amounts<C>(conn: &C, registration_id: i64) -> AppResult<Vec<i64>>
where
    C: ConnectionTrait,
{
    let amounts = payments::Entity::find()
        .select_only()
        .column(payments::Column::AmountCents)
        .filter(payments::Column::RegistrationId.eq(registration_id))
        .into_tuple::<i64>()
        .all(conn)
        .await?;
    Ok(amounts)
}

/// Amounts for many registrations at once, as `(registration_id, amount_cents)` pairs.
pub async fn load_amounts_for<C>(conn: &C, registration_ids: &[i64]) -> AppResult<Vec<(i64, i64)>>
where
    C: ConnectionTrait,
{
    if registration_ids.is_empty() {
        return Ok(Vec::new());
    }
    let rows = payments::Entity::find()
        .select_only()
        .column(payments::Column::RegistrationId)
        .column(payments::Column::AmountCents)
        .filter(payments::Column::RegistrationId.is_in(registration_ids.iter().copied()))
        .into_tuple::<(i64, i64)>()
        .all(conn)
        .await?;
    Ok(rows)
}

pub async fn registration_balance<C>(
    conn: &C,
    registration_id: i64,
    price_cents: i64,
) -> AppResult<Balance>
where
    C: ConnectionTrait,
{
    let amounts = load_amounts(conn, registration_id).await?;
    Ok(compute_balance(price_cents, amounts))
}

/// Recompute and persist the registration status from its current payments.
///
/// Must run on the same connection or transaction that wrote the payment change so the two
/// commit together. Returns the registration as stored afterwards.
pub async fn reconcile_registration<C>(
    conn: &C,
    registration: registrations::Model,
    price_cents: i64,
) -> AppResult<registrations::Model>
where
    C: ConnectionTrait,
{
    let balance = registration_balance(conn, registration.id, price_cents).await?;
    let next = next_status(registration.status, price_cents, balance.total_paid_cents);
    if next == registration.status {
        return Ok(registration);
    }

    log::debug!(
        "Registration {} status {} -> {} (paid {} of {})",
        registration.id,
        registration.status,
        next,
        balance.total_paid_cents,
        price_cents
    );

    let mut am = registration.into_active_model();
    am.status = Set(next);
    am.updated_at = Set(Utc::now());
    let updated = am.update(conn).await?;
    Ok(updated)
}

/// Re-derive every registration status of one event after its price changed.
///
/// Rows are locked in id order; returns how many statuses moved.
pub async fn reconcile_event_registrations<C>(
    conn: &C,
    event_id: i64,
    price_cents: i64,
) -> AppResult<u64>
where
    C: ConnectionTrait,
{
    let rows = registrations::Entity::find()
        .filter(registrations::Column::EventId.eq(event_id))
        .order_by_asc(registrations::Column::Id)
        .lock_exclusive()
        .all(conn)
        .await?;

    let mut corrected = 0;
    for registration in rows {
        let before = registration.status;
        let after = reconcile_registration(conn, registration, price_cents).await?;
        if after.status != before {
            corrected += 1;
        }
    }
    Ok(corrected)
}

#[cfg(test)]
mod tests {
    use super::*;
    use RegistrationStatus::*;

    #[test]
    fn balance_ignores_payment_order() {
        let forward = compute_balance(10_000, [1_000, 2_550, 4_000]);
        let backward = compute_balance(10_000, [4_000, 2_550, 1_000]);
        assert_eq!(forward, backward);
        assert_eq!(forward.balance_due_cents, 2_450);
        assert_eq!(forward.payment_count, 3);
    }

    #[test]
    fn status_is_a_pure_function_of_price_and_total() {
        for (price, total) in [(10_000, 0), (10_000, 4_000), (10_000, 10_000), (5_000, 7_500)] {
            assert_eq!(payment_status(price, total), payment_status(price, total));
            assert_eq!(
                compute_balance(price, [total]).status,
                compute_balance(price, [total]).status
            );
        }
    }

    #[test]
    fn forty_then_sixty_settles_a_hundred_dollar_event() {
        let after_first = compute_balance(10_000, [4_000]);
        assert_eq!(after_first.status, PaymentStatus::Partial);
        assert_eq!(coarse_status(10_000, after_first.total_paid_cents), Partial);

        let after_second = compute_balance(10_000, [4_000, 6_000]);
        assert_eq!(after_second.total_paid_cents, 10_000);
        assert_eq!(after_second.balance_due_cents, 0);
        assert_eq!(after_second.status, PaymentStatus::Paid);
        assert_eq!(coarse_status(10_000, after_second.total_paid_cents), Paid);
        assert_eq!(after_second.to_response(9).balance_due.to_string(), "0.00");
    }

    #[test]
    fn overpayment_goes_negative() {
        let balance = compute_balance(5_000, [7_500]);
        assert_eq!(balance.status, PaymentStatus::Overpaid);
        assert_eq!(balance.balance_due_cents, -2_500);
        assert_eq!(balance.to_response(1).balance_due.to_string(), "-25.00");
    }

    #[test]
    fn free_event_with_no_payments_is_paid() {
        let balance = compute_balance(0, []);
        assert_eq!(balance.status, PaymentStatus::Paid);
        assert_eq!(coarse_status(0, 0), Paid);
        assert_eq!(compute_balance(10_000, []).status, PaymentStatus::Unpaid);
    }

    #[test]
    fn many_small_payments_sum_exactly() {
        let balance = compute_balance(1_000, std::iter::repeat_n(1, 1_000));
        assert_eq!(balance.total_paid_cents, 1_000);
        assert_eq!(balance.status, PaymentStatus::Paid);
    }

    #[test]
    fn next_status_respects_administrative_statuses() {
        assert_eq!(next_status(Pending, 10_000, 4_000), Partial);
        assert_eq!(next_status(Partial, 10_000, 10_000), Paid);
        assert_eq!(next_status(Paid, 10_000, 0), Pending);
        assert_eq!(next_status(Cancelled, 10_000, 10_000), Cancelled);
        assert_eq!(next_status(Waitlist, 10_000, 4_000), Waitlist);
        assert_eq!(next_status(Confirmed, 10_000, 4_000), Confirmed);
        assert_eq!(next_status(Confirmed, 10_000, 0), Confirmed);
        assert_eq!(next_status(Confirmed, 10_000, 10_000), Paid);
    }
}
