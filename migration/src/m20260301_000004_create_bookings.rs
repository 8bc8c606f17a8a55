use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260301_000002_create_fleets::Fleet;
use super::m20260301_000003_create_drivers_vehicles::{Driver, Vehicle};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(BookingStatus::Enum)
                    .values([
                        BookingStatus::Pending,
                        BookingStatus::Confirmed,
                        BookingStatus::Assigned,
                        BookingStatus::Accepted,
                        BookingStatus::EnRoute,
                        BookingStatus::Arrived,
                        BookingStatus::InProgress,
                        BookingStatus::Completed,
                        BookingStatus::Cancelled,
                        BookingStatus::NoShow,
                        BookingStatus::DriverNoShow,
                        BookingStatus::CustomerNoShow,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(PaymentStatus::Enum)
                    .values([
                        PaymentStatus::Pending,
                        PaymentStatus::Paid,
                        PaymentStatus::Failed,
                        PaymentStatus::Refunded,
                    ])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Booking::Table)
                    .if_not_exists()
                    .col(uuid(Booking::Id).primary_key())
                    .col(string_len(Booking::Reference, 20).not_null().unique_key())
                    .col(string_len(Booking::CustomerName, 100).not_null())
                    .col(string_len(Booking::CustomerEmail, 255).not_null())
                    .col(string_len_null(Booking::CustomerPhone, 50))
                    .col(string_len(Booking::PickupLocation, 255).not_null())
                    .col(ColumnDef::new(Booking::PickupLat).double().null())
                    .col(ColumnDef::new(Booking::PickupLng).double().null())
                    .col(string_len(Booking::DropoffLocation, 255).not_null())
                    .col(ColumnDef::new(Booking::DropoffLat).double().null())
                    .col(ColumnDef::new(Booking::DropoffLng).double().null())
                    .col(timestamp_with_time_zone(Booking::PickupTime).not_null())
                    .col(integer(Booking::Passengers).not_null())
                    .col(integer(Booking::Luggage).not_null().default(0))
                    .col(string_len(Booking::VehicleCategory, 50).not_null())
                    .col(string_len_null(Booking::FlightNumber, 20))
                    .col(integer(Booking::ChildSeats).not_null().default(0))
                    .col(decimal_len(Booking::CustomerPrice, 10, 2).not_null())
                    .col(decimal_len(Booking::DriverPrice, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Booking::Status)
                            .custom(BookingStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Booking::PaymentStatus)
                            .custom(PaymentStatus::Enum)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Booking::AssignedFleetId).uuid().null())
                    .col(ColumnDef::new(Booking::AssignedDriverId).uuid().null())
                    .col(ColumnDef::new(Booking::AssignedVehicleId).uuid().null())
                    .col(ColumnDef::new(Booking::CustomerRating).integer().null())
                    .col(ColumnDef::new(Booking::CustomerFeedback).text().null())
                    .col(ColumnDef::new(Booking::AdminNotes).text().null())
                    .col(integer(Booking::Version).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(Booking::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Booking::AssignedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Booking::AcceptedAt).timestamp_with_time_zone().null())
                    .col(ColumnDef::new(Booking::CompletedAt).timestamp_with_time_zone().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_fleet")
                            .from(Booking::Table, Booking::AssignedFleetId)
                            .to(Fleet::Table, Fleet::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_driver")
                            .from(Booking::Table, Booking::AssignedDriverId)
                            .to(Driver::Table, Driver::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_booking_vehicle")
                            .from(Booking::Table, Booking::AssignedVehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Booking::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(PaymentStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(BookingStatus::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Booking {
    Table,
    Id,
    Reference,
    CustomerName,
    CustomerEmail,
    CustomerPhone,
    PickupLocation,
    PickupLat,
    PickupLng,
    DropoffLocation,
    DropoffLat,
    DropoffLng,
    PickupTime,
    Passengers,
    Luggage,
    VehicleCategory,
    FlightNumber,
    ChildSeats,
    CustomerPrice,
    DriverPrice,
    Status,
    PaymentStatus,
    AssignedFleetId,
    AssignedDriverId,
    AssignedVehicleId,
    CustomerRating,
    CustomerFeedback,
    AdminNotes,
    Version,
    CreatedAt,
    AssignedAt,
    AcceptedAt,
    CompletedAt,
}

#[derive(DeriveIden)]
pub enum BookingStatus {
    #[sea_orm(iden = "booking_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "confirmed")]
    Confirmed,
    #[sea_orm(iden = "assigned")]
    Assigned,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "en_route")]
    EnRoute,
    #[sea_orm(iden = "arrived")]
    Arrived,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
    #[sea_orm(iden = "no_show")]
    NoShow,
    #[sea_orm(iden = "driver_no_show")]
    DriverNoShow,
    #[sea_orm(iden = "customer_no_show")]
    CustomerNoShow,
}

#[derive(DeriveIden)]
pub enum PaymentStatus {
    #[sea_orm(iden = "payment_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "paid")]
    Paid,
    #[sea_orm(iden = "failed")]
    Failed,
    #[sea_orm(iden = "refunded")]
    Refunded,
}
