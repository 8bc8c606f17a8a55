//! Invoice/commission engine: sweeps completed bookings into invoices,
//! applying the paying fleet's commission model and tax.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::lifecycle::{invoice_editable, invoice_transition_legal};
use crate::domain::money::{fleet_commission, invoice_totals, round_currency};
use crate::entities::booking::{self, BookingStatus};
use crate::entities::fleet::{self, FleetStatus};
use crate::entities::invoice::{self, InvoiceStatus, InvoiceType};
use crate::entities::invoice_item;
use crate::error::{AppError, AppResult};
use crate::services::notify::{self, Notification};
use crate::AppState;

/// How an invoice's counterparty is identified. Fleets and drivers have ids;
/// customers have no persistent account, so their stable key is the
/// (email, name) pair.
#[derive(Debug, Clone)]
pub enum InvoiceEntity {
    Fleet(Uuid),
    Driver(Uuid),
    Customer { email: String, name: String },
}

impl InvoiceEntity {
    pub fn invoice_type(&self) -> InvoiceType {
        match self {
            InvoiceEntity::Fleet(_) => InvoiceType::Fleet,
            InvoiceEntity::Driver(_) => InvoiceType::Driver,
            InvoiceEntity::Customer { .. } => InvoiceType::Customer,
        }
    }
}

/// The line amount a booking contributes: what the customer owes us, or what
/// we owe the executing party.
fn line_amount(invoice_type: InvoiceType, b: &booking::Model) -> Decimal {
    match invoice_type {
        InvoiceType::Customer => b.customer_price,
        InvoiceType::Fleet | InvoiceType::Driver => b.driver_price,
    }
}

/// Booking ids already billed on a non-cancelled invoice of this type.
/// Cancelling an invoice frees its bookings for re-invoicing.
async fn invoiced_booking_ids<C: ConnectionTrait>(
    db: &C,
    invoice_type: InvoiceType,
) -> AppResult<Vec<Uuid>> {
    let invoice_ids: Vec<Uuid> = invoice::Entity::find()
        .filter(invoice::Column::InvoiceType.eq(invoice_type))
        .filter(invoice::Column::Status.ne(InvoiceStatus::Cancelled))
        .all(db)
        .await?
        .into_iter()
        .map(|i| i.id)
        .collect();

    if invoice_ids.is_empty() {
        return Ok(Vec::new());
    }

    Ok(invoice_item::Entity::find()
        .filter(invoice_item::Column::InvoiceId.is_in(invoice_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|item| item.booking_id)
        .collect())
}

/// Keep only bookings not yet billed for this invoice type.
pub fn filter_uninvoiced(
    bookings: Vec<booking::Model>,
    invoiced: &[Uuid],
) -> Vec<booking::Model> {
    bookings
        .into_iter()
        .filter(|b| !invoiced.contains(&b.id))
        .collect()
}

/// Completed bookings for the entity that do not yet appear on a
/// non-cancelled invoice of the matching type.
pub async fn list_uninvoiced<C: ConnectionTrait>(
    db: &C,
    entity: &InvoiceEntity,
) -> AppResult<Vec<booking::Model>> {
    let mut query = booking::Entity::find()
        .filter(booking::Column::Status.eq(BookingStatus::Completed));

    query = match entity {
        InvoiceEntity::Fleet(id) => query.filter(booking::Column::AssignedFleetId.eq(*id)),
        InvoiceEntity::Driver(id) => query.filter(booking::Column::AssignedDriverId.eq(*id)),
        InvoiceEntity::Customer { email, name } => query
            .filter(booking::Column::CustomerEmail.eq(email))
            .filter(booking::Column::CustomerName.eq(name)),
    };

    let completed = query.all(db).await?;
    let invoiced = invoiced_booking_ids(db, entity.invoice_type()).await?;
    Ok(filter_uninvoiced(completed, &invoiced))
}

/// Monotonic, human-legible invoice number. Cancelled invoices keep their
/// number, so the sequence never reuses one.
async fn next_invoice_number<C: ConnectionTrait>(db: &C) -> AppResult<String> {
    let count = invoice::Entity::find().count(db).await?;
    Ok(format!("INV-{:06}", count + 1))
}

/// Pick the requested bookings out of the eligible set. Any id that is not
/// an uninvoiced completed booking for the entity fails the whole request.
pub fn select_billable(
    eligible: &[booking::Model],
    booking_ids: &[Uuid],
) -> AppResult<Vec<booking::Model>> {
    let mut selected = Vec::with_capacity(booking_ids.len());
    for id in booking_ids {
        let Some(b) = eligible.iter().find(|b| b.id == *id) else {
            return Err(AppError::Conflict(format!(
                "Booking {} is not an uninvoiced completed booking for this entity",
                id
            )));
        };
        selected.push(b.clone());
    }
    Ok(selected)
}

#[derive(Debug, Clone)]
pub struct GenerateInvoice {
    pub entity: InvoiceEntity,
    pub booking_ids: Vec<Uuid>,
    pub tax_rate: Decimal,
    pub payment_terms_days: i32,
    pub notes: Option<String>,
}

/// Build one invoice from a validated set of uninvoiced, completed bookings.
///
/// Money rules: subtotal is the sum of line amounts; commission applies only
/// to fleet invoices; tax applies to subtotal minus commission; customer
/// invoices carry per-line profit.
pub async fn generate_invoice(
    state: &AppState,
    req: GenerateInvoice,
) -> AppResult<invoice::Model> {
    if req.booking_ids.is_empty() {
        return Err(AppError::BadRequest(
            "At least one booking is required".to_string(),
        ));
    }
    if req.tax_rate < Decimal::ZERO || req.tax_rate > Decimal::from(100) {
        return Err(AppError::BadRequest(
            "Tax rate must be between 0 and 100".to_string(),
        ));
    }

    let invoice_type = req.entity.invoice_type();

    // One atomic read-modify-write: take row locks on the candidate
    // bookings, then re-check eligibility inside the transaction. A
    // concurrent generation over the same bookings blocks on the locks and,
    // once it proceeds, sees this invoice's line items in the re-read, so
    // its selection fails with a conflict instead of double-billing.
    let txn = state.db.begin().await?;

    booking::Entity::find()
        .filter(booking::Column::Id.is_in(req.booking_ids.clone()))
        .lock_exclusive()
        .all(&txn)
        .await?;

    let eligible = list_uninvoiced(&txn, &req.entity).await?;
    let selected = select_billable(&eligible, &req.booking_ids)?;

    let subtotal = round_currency(
        selected
            .iter()
            .map(|b| line_amount(invoice_type, b))
            .sum::<Decimal>(),
    );

    let (entity_id, entity_name, entity_email, commission) = match &req.entity {
        InvoiceEntity::Fleet(id) => {
            let f = fleet::Entity::find_by_id(*id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Fleet not found".to_string()))?;
            let commission = fleet_commission(&f, subtotal);
            (Some(*id), f.name, Some(f.billing_email), commission)
        }
        InvoiceEntity::Driver(id) => {
            let d = crate::entities::driver::Entity::find_by_id(*id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::NotFound("Driver not found".to_string()))?;
            (Some(*id), d.name, Some(d.email), Decimal::ZERO)
        }
        InvoiceEntity::Customer { email, name } => {
            (None, name.clone(), Some(email.clone()), Decimal::ZERO)
        }
    };

    let totals = invoice_totals(subtotal, commission, req.tax_rate);

    let invoice_id = Uuid::new_v4();
    let new_invoice = invoice::ActiveModel {
        id: Set(invoice_id),
        invoice_number: Set(next_invoice_number(&txn).await?),
        invoice_type: Set(invoice_type),
        entity_id: Set(entity_id),
        entity_name: Set(entity_name),
        entity_email: Set(entity_email),
        subtotal: Set(totals.subtotal),
        commission: Set(totals.commission),
        tax_rate: Set(req.tax_rate),
        tax: Set(totals.tax),
        total: Set(totals.total),
        status: Set(InvoiceStatus::Draft),
        payment_terms_days: Set(req.payment_terms_days),
        notes: Set(req.notes),
        issued_at: Set(None),
        due_date: Set(None),
        ..Default::default()
    };
    let created = new_invoice.insert(&txn).await?;

    let items: Vec<invoice_item::ActiveModel> = selected
        .iter()
        .map(|b| invoice_item::ActiveModel {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice_id),
            booking_id: Set(b.id),
            description: Set(format!(
                "{} | {} -> {}",
                b.reference, b.pickup_location, b.dropoff_location
            )),
            amount: Set(round_currency(line_amount(invoice_type, b))),
            profit: Set((invoice_type == InvoiceType::Customer)
                .then(|| round_currency(b.profit()))),
        })
        .collect();
    invoice_item::Entity::insert_many(items).exec(&txn).await?;

    // Invoice and line items land together or not at all; a failure above
    // rolls the whole generation back, never stranding an itemless invoice
    txn.commit().await?;

    Ok(created)
}

pub async fn find_invoice(db: &DatabaseConnection, id: Uuid) -> AppResult<invoice::Model> {
    crate::db::with_backoff(|| invoice::Entity::find_by_id(id).one(db))
        .await?
        .ok_or_else(|| AppError::NotFound("Invoice not found".to_string()))
}

pub async fn list_items(
    db: &DatabaseConnection,
    invoice_id: Uuid,
) -> AppResult<Vec<invoice_item::Model>> {
    Ok(invoice_item::Entity::find()
        .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
        .all(db)
        .await?)
}

/// Advance an invoice along draft -> pending_approval -> approved -> issued
/// -> paid (cancelled from any pre-paid state). Issuing stamps `issued_at`
/// and derives `due_date` from the payment terms.
pub async fn update_status(
    state: &AppState,
    invoice_id: Uuid,
    target: InvoiceStatus,
) -> AppResult<invoice::Model> {
    let current = find_invoice(&state.db, invoice_id).await?;

    if !invoice_transition_legal(current.status, target) {
        return Err(AppError::Conflict(format!(
            "invoice cannot move from '{}' to '{}'",
            current.status.as_str(),
            target.as_str()
        )));
    }

    let mut active: invoice::ActiveModel = current.clone().into();
    active.status = Set(target);
    if target == InvoiceStatus::Issued {
        let issued_at = Utc::now();
        active.issued_at = Set(Some(issued_at.into()));
        active.due_date =
            Set(Some((issued_at + Duration::days(i64::from(current.payment_terms_days))).into()));
    }
    let updated = active.update(&state.db).await?;

    if target == InvoiceStatus::Issued {
        notify::dispatch(
            &state.config,
            Notification::InvoiceIssued {
                invoice_id,
                invoice_number: updated.invoice_number.clone(),
                entity_name: updated.entity_name.clone(),
            },
        );
    }

    Ok(updated)
}

/// Edit a draft's tax rate and/or notes, recomputing the money columns.
/// Any non-draft invoice is locked.
pub async fn update_draft(
    state: &AppState,
    invoice_id: Uuid,
    tax_rate: Option<Decimal>,
    notes: Option<String>,
) -> AppResult<invoice::Model> {
    let current = find_invoice(&state.db, invoice_id).await?;

    if !invoice_editable(current.status) {
        return Err(AppError::InvoiceLocked(current.status.as_str().to_string()));
    }

    let mut active: invoice::ActiveModel = current.clone().into();
    if let Some(rate) = tax_rate {
        if rate < Decimal::ZERO || rate > Decimal::from(100) {
            return Err(AppError::BadRequest(
                "Tax rate must be between 0 and 100".to_string(),
            ));
        }
        let totals = invoice_totals(current.subtotal, current.commission, rate);
        active.tax_rate = Set(rate);
        active.tax = Set(totals.tax);
        active.total = Set(totals.total);
    }
    if let Some(notes) = notes {
        active.notes = Set(Some(notes));
    }

    Ok(active.update(&state.db).await?)
}

/// Drop a line item from a draft invoice and recompute its totals.
pub async fn remove_item(
    state: &AppState,
    invoice_id: Uuid,
    booking_id: Uuid,
) -> AppResult<invoice::Model> {
    let current = find_invoice(&state.db, invoice_id).await?;

    if !invoice_editable(current.status) {
        return Err(AppError::InvoiceLocked(current.status.as_str().to_string()));
    }

    let deleted = invoice_item::Entity::delete_many()
        .filter(invoice_item::Column::InvoiceId.eq(invoice_id))
        .filter(invoice_item::Column::BookingId.eq(booking_id))
        .exec(&state.db)
        .await?;
    if deleted.rows_affected == 0 {
        return Err(AppError::NotFound("Line item not found".to_string()));
    }

    let remaining = list_items(&state.db, invoice_id).await?;
    let subtotal = round_currency(remaining.iter().map(|i| i.amount).sum::<Decimal>());

    // Re-derive commission against the new subtotal for fleet invoices
    let commission = match (current.invoice_type, current.entity_id) {
        (InvoiceType::Fleet, Some(fleet_id)) => {
            match fleet::Entity::find_by_id(fleet_id).one(&state.db).await? {
                Some(f) => fleet_commission(&f, subtotal),
                None => Decimal::ZERO,
            }
        }
        _ => Decimal::ZERO,
    };

    let totals = invoice_totals(subtotal, commission, current.tax_rate);
    let mut active: invoice::ActiveModel = current.into();
    active.subtotal = Set(totals.subtotal);
    active.commission = Set(totals.commission);
    active.tax = Set(totals.tax);
    active.total = Set(totals.total);

    Ok(active.update(&state.db).await?)
}

#[derive(Debug, Serialize)]
pub struct FleetBatchOutcome {
    pub fleet_id: Uuid,
    pub fleet_name: String,
    pub invoice_number: Option<String>,
    pub bookings_billed: usize,
    pub error: Option<String>,
}

/// Batch sweep: one draft invoice per active fleet with uninvoiced completed
/// bookings. Safe to re-run (already-billed bookings are skipped) and a
/// failure for one fleet never aborts the others; outcomes are reported
/// per fleet.
pub async fn auto_generate_fleet_invoices(
    state: &AppState,
    tax_rate: Decimal,
) -> AppResult<Vec<FleetBatchOutcome>> {
    let fleets = fleet::Entity::find()
        .filter(fleet::Column::Status.eq(FleetStatus::Active))
        .all(&state.db)
        .await?;

    let mut outcomes = Vec::new();
    for f in fleets {
        let uninvoiced = match list_uninvoiced(&state.db, &InvoiceEntity::Fleet(f.id)).await {
            Ok(list) => list,
            Err(err) => {
                tracing::error!(fleet_id = %f.id, error = %err, "fleet sweep: listing failed");
                outcomes.push(FleetBatchOutcome {
                    fleet_id: f.id,
                    fleet_name: f.name.clone(),
                    invoice_number: None,
                    bookings_billed: 0,
                    error: Some(err.to_string()),
                });
                continue;
            }
        };

        if uninvoiced.is_empty() {
            continue;
        }

        let booking_ids: Vec<Uuid> = uninvoiced.iter().map(|b| b.id).collect();
        let count = booking_ids.len();
        let result = generate_invoice(
            state,
            GenerateInvoice {
                entity: InvoiceEntity::Fleet(f.id),
                booking_ids,
                tax_rate,
                payment_terms_days: f.payment_terms_days,
                notes: None,
            },
        )
        .await;

        match result {
            Ok(created) => outcomes.push(FleetBatchOutcome {
                fleet_id: f.id,
                fleet_name: f.name,
                invoice_number: Some(created.invoice_number),
                bookings_billed: count,
                error: None,
            }),
            Err(err) => {
                tracing::error!(fleet_id = %f.id, error = %err, "fleet sweep: generation failed");
                outcomes.push(FleetBatchOutcome {
                    fleet_id: f.id,
                    fleet_name: f.name,
                    invoice_number: None,
                    bookings_billed: 0,
                    error: Some(err.to_string()),
                });
            }
        }
    }

    Ok(outcomes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn completed_booking(id: Uuid) -> booking::Model {
        booking::Model {
            id,
            reference: "ATB-AAAAAA".to_string(),
            customer_name: "A".to_string(),
            customer_email: "a@example.com".to_string(),
            customer_phone: None,
            pickup_location: "X".to_string(),
            pickup_lat: None,
            pickup_lng: None,
            dropoff_location: "Y".to_string(),
            dropoff_lat: None,
            dropoff_lng: None,
            pickup_time: Utc::now().into(),
            passengers: 1,
            luggage: 0,
            vehicle_category: "sedan".to_string(),
            flight_number: None,
            child_seats: 0,
            customer_price: Decimal::new(8000, 2),
            driver_price: Decimal::new(5000, 2),
            status: BookingStatus::Completed,
            payment_status: crate::entities::booking::PaymentStatus::Paid,
            assigned_fleet_id: None,
            assigned_driver_id: None,
            assigned_vehicle_id: None,
            customer_rating: None,
            customer_feedback: None,
            admin_notes: None,
            version: 0,
            created_at: Utc::now().into(),
            assigned_at: None,
            accepted_at: None,
            completed_at: Some(Utc::now().into()),
        }
    }

    #[test]
    fn filter_drops_already_invoiced_bookings() {
        let billed = Uuid::new_v4();
        let open = Uuid::new_v4();
        let bookings = vec![completed_booking(billed), completed_booking(open)];

        let remaining = filter_uninvoiced(bookings, &[billed]);
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, open);
    }

    #[test]
    fn filter_is_idempotent() {
        let billed = Uuid::new_v4();
        let bookings = vec![completed_booking(billed)];

        let first = filter_uninvoiced(bookings, &[billed]);
        assert!(first.is_empty());
        let second = filter_uninvoiced(first, &[billed]);
        assert!(second.is_empty());
    }

    #[test]
    fn second_generation_over_the_same_booking_conflicts() {
        let contested = completed_booking(Uuid::new_v4());
        let eligible = vec![contested.clone()];

        // First generation wins the booking
        let selected = select_billable(&eligible, &[contested.id]).unwrap();
        assert_eq!(selected.len(), 1);

        // The loser re-reads eligibility after the winner's line items are
        // visible and must be refused, not double-billed
        let after_win = filter_uninvoiced(eligible, &[contested.id]);
        match select_billable(&after_win, &[contested.id]) {
            Err(AppError::Conflict(msg)) => {
                assert!(msg.contains(&contested.id.to_string()));
            }
            other => panic!("expected Conflict, got {:?}", other.map(|v| v.len())),
        }
    }

    #[test]
    fn line_amount_depends_on_invoice_type() {
        let b = completed_booking(Uuid::new_v4());
        assert_eq!(line_amount(InvoiceType::Customer, &b), b.customer_price);
        assert_eq!(line_amount(InvoiceType::Fleet, &b), b.driver_price);
        assert_eq!(line_amount(InvoiceType::Driver, &b), b.driver_price);
        assert_eq!(b.profit(), Decimal::new(3000, 2));
    }
}
