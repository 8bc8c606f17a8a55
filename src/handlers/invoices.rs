use axum::{
    extract::{Path, Query, State},
    Json,
};
use rust_decimal::Decimal;
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entities::booking;
use crate::entities::invoice::{self, InvoiceStatus, InvoiceType};
use crate::entities::invoice_item;
use crate::error::{AppError, AppResult};
use crate::services::invoicing::{
    self, FleetBatchOutcome, GenerateInvoice, InvoiceEntity,
};
use crate::AppState;

/// Resolve the entity key from query/body fields: fleets and drivers by id,
/// customers by their (email, name) pair.
fn resolve_entity(
    invoice_type: InvoiceType,
    entity_id: Option<Uuid>,
    entity_email: Option<String>,
    entity_name: Option<String>,
) -> AppResult<InvoiceEntity> {
    match invoice_type {
        InvoiceType::Fleet => entity_id
            .map(InvoiceEntity::Fleet)
            .ok_or_else(|| AppError::BadRequest("entity_id is required".to_string())),
        InvoiceType::Driver => entity_id
            .map(InvoiceEntity::Driver)
            .ok_or_else(|| AppError::BadRequest("entity_id is required".to_string())),
        InvoiceType::Customer => match (entity_email, entity_name) {
            (Some(email), Some(name)) => Ok(InvoiceEntity::Customer { email, name }),
            _ => Err(AppError::BadRequest(
                "entity_email and entity_name are required for customer invoices".to_string(),
            )),
        },
    }
}

#[derive(Debug, Deserialize)]
pub struct UninvoicedQuery {
    pub invoice_type: InvoiceType,
    pub entity_id: Option<Uuid>,
    pub entity_email: Option<String>,
    pub entity_name: Option<String>,
}

/// Completed bookings not yet billed for this entity and invoice type
pub async fn uninvoiced_bookings(
    State(state): State<AppState>,
    Query(query): Query<UninvoicedQuery>,
) -> AppResult<Json<Vec<booking::Model>>> {
    let entity = resolve_entity(
        query.invoice_type,
        query.entity_id,
        query.entity_email,
        query.entity_name,
    )?;

    Ok(Json(invoicing::list_uninvoiced(&state.db, &entity).await?))
}

#[derive(Debug, Deserialize)]
pub struct GenerateInvoiceRequest {
    pub invoice_type: InvoiceType,
    pub entity_id: Option<Uuid>,
    pub entity_email: Option<String>,
    pub entity_name: Option<String>,
    pub booking_ids: Vec<Uuid>,
    #[serde(default)]
    pub tax_rate: Decimal,
    #[serde(default = "default_payment_terms")]
    pub payment_terms_days: i32,
    pub notes: Option<String>,
}

fn default_payment_terms() -> i32 {
    14
}

pub async fn generate(
    State(state): State<AppState>,
    Json(payload): Json<GenerateInvoiceRequest>,
) -> AppResult<Json<invoice::Model>> {
    let entity = resolve_entity(
        payload.invoice_type,
        payload.entity_id,
        payload.entity_email,
        payload.entity_name,
    )?;

    let created = invoicing::generate_invoice(
        &state,
        GenerateInvoice {
            entity,
            booking_ids: payload.booking_ids,
            tax_rate: payload.tax_rate,
            payment_terms_days: payload.payment_terms_days,
            notes: payload.notes,
        },
    )
    .await?;

    Ok(Json(created))
}

#[derive(Debug, Deserialize)]
pub struct AutoGenerateRequest {
    #[serde(default)]
    pub tax_rate: Decimal,
}

/// One draft invoice per active fleet with uninvoiced completed bookings;
/// per-fleet outcomes, partial success allowed
pub async fn auto_generate_fleet(
    State(state): State<AppState>,
    Json(payload): Json<AutoGenerateRequest>,
) -> AppResult<Json<Vec<FleetBatchOutcome>>> {
    let outcomes = invoicing::auto_generate_fleet_invoices(&state, payload.tax_rate).await?;
    Ok(Json(outcomes))
}

pub async fn list_invoices(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<invoice::Model>>> {
    Ok(Json(
        invoice::Entity::find()
            .order_by_desc(invoice::Column::CreatedAt)
            .all(&state.db)
            .await?,
    ))
}

#[derive(Debug, Serialize)]
pub struct InvoiceDetail {
    #[serde(flatten)]
    pub invoice: invoice::Model,
    pub items: Vec<invoice_item::Model>,
}

/// Full invoice document, line items included
pub async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<InvoiceDetail>> {
    let inv = invoicing::find_invoice(&state.db, invoice_id).await?;
    let items = invoicing::list_items(&state.db, invoice_id).await?;

    Ok(Json(InvoiceDetail {
        invoice: inv,
        items,
    }))
}

pub async fn submit_for_approval(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::update_status(&state, invoice_id, InvoiceStatus::PendingApproval).await?,
    ))
}

pub async fn approve(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::update_status(&state, invoice_id, InvoiceStatus::Approved).await?,
    ))
}

pub async fn issue(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::update_status(&state, invoice_id, InvoiceStatus::Issued).await?,
    ))
}

pub async fn mark_paid(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::update_status(&state, invoice_id, InvoiceStatus::Paid).await?,
    ))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::update_status(&state, invoice_id, InvoiceStatus::Cancelled).await?,
    ))
}

#[derive(Debug, Deserialize)]
pub struct UpdateDraftRequest {
    pub tax_rate: Option<Decimal>,
    pub notes: Option<String>,
}

/// Edit a draft's tax rate/notes; locked once it leaves draft
pub async fn update_draft(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(payload): Json<UpdateDraftRequest>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::update_draft(&state, invoice_id, payload.tax_rate, payload.notes).await?,
    ))
}

/// Remove a line item from a draft invoice
pub async fn remove_item(
    State(state): State<AppState>,
    Path((invoice_id, booking_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Json<invoice::Model>> {
    Ok(Json(
        invoicing::remove_item(&state, invoice_id, booking_id).await?,
    ))
}
