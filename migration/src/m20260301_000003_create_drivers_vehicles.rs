use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

use super::m20260301_000002_create_fleets::Fleet;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(DriverType::Enum)
                    .values([DriverType::Internal, DriverType::Fleet, DriverType::Freelancer])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(AvailabilityStatus::Enum)
                    .values([AvailabilityStatus::Active, AvailabilityStatus::Inactive])
                    .to_owned(),
            )
            .await?;

        // Vehicles first: drivers hold an optional default vehicle
        manager
            .create_table(
                Table::create()
                    .table(Vehicle::Table)
                    .if_not_exists()
                    .col(uuid(Vehicle::Id).primary_key())
                    .col(ColumnDef::new(Vehicle::FleetId).uuid().null())
                    .col(string_len(Vehicle::Category, 50).not_null())
                    .col(string_len(Vehicle::Make, 100).not_null())
                    .col(string_len(Vehicle::Plate, 20).not_null())
                    .col(integer(Vehicle::MaxPassengers).not_null())
                    .col(integer(Vehicle::MaxLuggage).not_null())
                    .col(
                        ColumnDef::new(Vehicle::Status)
                            .custom(AvailabilityStatus::Enum)
                            .not_null(),
                    )
                    .col(
                        timestamp_with_time_zone(Vehicle::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_vehicle_fleet")
                            .from(Vehicle::Table, Vehicle::FleetId)
                            .to(Fleet::Table, Fleet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Driver::Table)
                    .if_not_exists()
                    .col(uuid(Driver::Id).primary_key())
                    .col(ColumnDef::new(Driver::FleetId).uuid().null())
                    .col(ColumnDef::new(Driver::VehicleId).uuid().null())
                    .col(string_len(Driver::Name, 100).not_null())
                    .col(string_len(Driver::Email, 255).not_null())
                    .col(string_len(Driver::Phone, 50).not_null())
                    .col(
                        ColumnDef::new(Driver::DriverType)
                            .custom(DriverType::Enum)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Driver::Status)
                            .custom(AvailabilityStatus::Enum)
                            .not_null(),
                    )
                    .col(double(Driver::AverageRating).not_null().default(0.0))
                    .col(integer(Driver::TotalRatings).not_null().default(0))
                    .col(
                        timestamp_with_time_zone(Driver::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_driver_fleet")
                            .from(Driver::Table, Driver::FleetId)
                            .to(Fleet::Table, Fleet::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_driver_vehicle")
                            .from(Driver::Table, Driver::VehicleId)
                            .to(Vehicle::Table, Vehicle::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Driver::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Vehicle::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(AvailabilityStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(DriverType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Driver {
    Table,
    Id,
    FleetId,
    VehicleId,
    Name,
    Email,
    Phone,
    DriverType,
    Status,
    AverageRating,
    TotalRatings,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum Vehicle {
    Table,
    Id,
    FleetId,
    Category,
    Make,
    Plate,
    MaxPassengers,
    MaxLuggage,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum DriverType {
    #[sea_orm(iden = "driver_type")]
    Enum,
    #[sea_orm(iden = "internal")]
    Internal,
    #[sea_orm(iden = "fleet")]
    Fleet,
    #[sea_orm(iden = "freelancer")]
    Freelancer,
}

#[derive(DeriveIden)]
pub enum AvailabilityStatus {
    #[sea_orm(iden = "availability_status")]
    Enum,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "inactive")]
    Inactive,
}
