use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260301_000004_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(InvoiceType::Enum)
                    .values([InvoiceType::Customer, InvoiceType::Fleet, InvoiceType::Driver])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(InvoiceStatus::Enum)
                    .values([
                        InvoiceStatus::Draft,
                        InvoiceStatus::PendingApproval,
                        InvoiceStatus::Approved,
                        InvoiceStatus::Issued,
                        InvoiceStatus::Paid,
                        InvoiceStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Invoice::Table)
                    .if_not_exists()
                    .col(uuid(Invoice::Id).primary_key())
                    .col(string_len(Invoice::InvoiceNumber, 30).not_null().unique_key())
                    .col(
                        ColumnDef::new(Invoice::InvoiceType)
                            .custom(InvoiceType::Enum)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Invoice::EntityId).uuid().null())
                    .col(string_len(Invoice::EntityName, 150).not_null())
                    .col(string_len_null(Invoice::EntityEmail, 255))
                    .col(decimal_len(Invoice::Subtotal, 10, 2).not_null())
                    .col(decimal_len(Invoice::Commission, 10, 2).not_null())
                    .col(decimal_len(Invoice::TaxRate, 5, 2).not_null())
                    .col(decimal_len(Invoice::Tax, 10, 2).not_null())
                    .col(decimal_len(Invoice::Total, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Invoice::Status)
                            .custom(InvoiceStatus::Enum)
                            .not_null(),
                    )
                    .col(integer(Invoice::PaymentTermsDays).not_null())
                    .col(ColumnDef::new(Invoice::Notes).text().null())
                    .col(
                        timestamp_with_time_zone(Invoice::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Invoice::IssuedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Invoice::DueDate).timestamp_with_time_zone().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(InvoiceItem::Table)
                    .if_not_exists()
                    .col(uuid(InvoiceItem::Id).primary_key())
                    .col(uuid(InvoiceItem::InvoiceId).not_null())
                    .col(uuid(InvoiceItem::BookingId).not_null())
                    .col(string_len(InvoiceItem::Description, 255).not_null())
                    .col(decimal_len(InvoiceItem::Amount, 10, 2).not_null())
                    .col(ColumnDef::new(InvoiceItem::Profit).decimal_len(10, 2).null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_invoice")
                            .from(InvoiceItem::Table, InvoiceItem::InvoiceId)
                            .to(Invoice::Table, Invoice::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_item_booking")
                            .from(InvoiceItem::Table, InvoiceItem::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_item_booking")
                    .table(InvoiceItem::Table)
                    .col(InvoiceItem::BookingId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InvoiceItem::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Invoice::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(InvoiceStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(InvoiceType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Invoice {
    Table,
    Id,
    InvoiceNumber,
    InvoiceType,
    EntityId,
    EntityName,
    EntityEmail,
    Subtotal,
    Commission,
    TaxRate,
    Tax,
    Total,
    Status,
    PaymentTermsDays,
    Notes,
    CreatedAt,
    IssuedAt,
    DueDate,
}

#[derive(DeriveIden)]
pub enum InvoiceItem {
    Table,
    Id,
    InvoiceId,
    BookingId,
    Description,
    Amount,
    Profit,
}

#[derive(DeriveIden)]
pub enum InvoiceType {
    #[sea_orm(iden = "invoice_type")]
    Enum,
    #[sea_orm(iden = "customer")]
    Customer,
    #[sea_orm(iden = "fleet")]
    Fleet,
    #[sea_orm(iden = "driver")]
    Driver,
}

#[derive(DeriveIden)]
pub enum InvoiceStatus {
    #[sea_orm(iden = "invoice_status")]
    Enum,
    #[sea_orm(iden = "draft")]
    Draft,
    #[sea_orm(iden = "pending_approval")]
    PendingApproval,
    #[sea_orm(iden = "approved")]
    Approved,
    #[sea_orm(iden = "issued")]
    Issued,
    #[sea_orm(iden = "paid")]
    Paid,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
