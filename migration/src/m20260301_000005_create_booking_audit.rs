use sea_orm_migration::{prelude::*, schema::*};

use super::m20260301_000004_create_bookings::Booking;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BookingNote::Table)
                    .if_not_exists()
                    .col(uuid(BookingNote::Id).primary_key())
                    .col(uuid(BookingNote::BookingId).not_null())
                    .col(string_len(BookingNote::Author, 100).not_null())
                    .col(text(BookingNote::Body).not_null())
                    .col(
                        timestamp_with_time_zone(BookingNote::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_note_booking")
                            .from(BookingNote::Table, BookingNote::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(BookingHistory::Table)
                    .if_not_exists()
                    .col(uuid(BookingHistory::Id).primary_key())
                    .col(uuid(BookingHistory::BookingId).not_null())
                    .col(string_len(BookingHistory::Action, 50).not_null())
                    .col(string_len(BookingHistory::Actor, 150).not_null())
                    .col(string_len_null(BookingHistory::OldValue, 255))
                    .col(string_len_null(BookingHistory::NewValue, 255))
                    .col(
                        timestamp_with_time_zone(BookingHistory::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_history_booking")
                            .from(BookingHistory::Table, BookingHistory::BookingId)
                            .to(Booking::Table, Booking::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_history_booking_created")
                    .table(BookingHistory::Table)
                    .col(BookingHistory::BookingId)
                    .col(BookingHistory::CreatedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BookingHistory::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(BookingNote::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum BookingNote {
    Table,
    Id,
    BookingId,
    Author,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum BookingHistory {
    Table,
    Id,
    BookingId,
    Action,
    Actor,
    OldValue,
    NewValue,
    CreatedAt,
}
