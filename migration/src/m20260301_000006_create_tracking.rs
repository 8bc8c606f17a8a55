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
                    .as_enum(TrackingStatus::Enum)
                    .values([
                        TrackingStatus::Pending,
                        TrackingStatus::Active,
                        TrackingStatus::Expired,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TrackingSession::Table)
                    .if_not_exists()
                    .col(uuid(TrackingSession::Id).primary_key())
                    .col(uuid(TrackingSession::BookingId).not_null().unique_key())
                    .col(string_len(TrackingSession::Token, 64).not_null().unique_key())
                    .col(
                        ColumnDef::new(TrackingSession::Status)
                            .custom(TrackingStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(TrackingSession::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(timestamp_with_time_zone(TrackingSession::ExpiresAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tracking_booking")
                            .from(TrackingSession::Table, TrackingSession::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(LocationPing::Table)
                    .if_not_exists()
                    .col(uuid(LocationPing::Id).primary_key())
                    .col(uuid(LocationPing::SessionId).not_null())
                    .col(double(LocationPing::Lat).not_null())
                    .col(double(LocationPing::Lng).not_null())
                    .col(
                        timestamp_with_time_zone(LocationPing::RecordedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ping_session")
                            .from(LocationPing::Table, LocationPing::SessionId)
                            .to(TrackingSession::Table, TrackingSession::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ping_session_recorded")
                    .table(LocationPing::Table)
                    .col(LocationPing::SessionId)
                    .col(LocationPing::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LocationPing::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(TrackingSession::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(TrackingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TrackingSession {
    Table,
    Id,
    BookingId,
    Token,
    Status,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
pub enum LocationPing {
    Table,
    Id,
    SessionId,
    Lat,
    Lng,
    RecordedAt,
}

#[derive(DeriveIden)]
pub enum TrackingStatus {
    #[sea_orm(iden = "tracking_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "expired")]
    Expired,
}
