use sea_orm_migration::{prelude::*, schema::*, sea_orm::sea_query::extension::postgres::Type};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_type(
                Type::create()
                    .as_enum(CommissionType::Enum)
                    .values([CommissionType::Percentage, CommissionType::Flat])
                    .to_owned(),
            )
            .await?;

        manager
            .create_type(
                Type::create()
                    .as_enum(FleetStatus::Enum)
                    .values([FleetStatus::Active, FleetStatus::Inactive])
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Fleet::Table)
                    .if_not_exists()
                    .col(uuid(Fleet::Id).primary_key())
                    .col(string_len(Fleet::Name, 150).not_null())
                    .col(string_len(Fleet::BillingEmail, 255).not_null())
                    .col(string_len_null(Fleet::BillingPhone, 50))
                    .col(
                        ColumnDef::new(Fleet::CommissionType)
                            .custom(CommissionType::Enum)
                            .not_null(),
                    )
                    .col(decimal_len(Fleet::CommissionValue, 10, 2).not_null())
                    .col(
                        ColumnDef::new(Fleet::Status)
                            .custom(FleetStatus::Enum)
                            .not_null(),
                    )
                    .col(integer(Fleet::PaymentTermsDays).not_null().default(14))
                    .col(
                        timestamp_with_time_zone(Fleet::CreatedAt)
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Fleet::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(FleetStatus::Enum).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CommissionType::Enum).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Fleet {
    Table,
    Id,
    Name,
    BillingEmail,
    BillingPhone,
    CommissionType,
    CommissionValue,
    Status,
    PaymentTermsDays,
    CreatedAt,
}

#[derive(DeriveIden)]
pub enum CommissionType {
    #[sea_orm(iden = "commission_type")]
    Enum,
    #[sea_orm(iden = "percentage")]
    Percentage,
    #[sea_orm(iden = "flat")]
    Flat,
}

#[derive(DeriveIden)]
pub enum FleetStatus {
    #[sea_orm(iden = "fleet_status")]
    Enum,
    #[sea_orm(iden = "active")]
    Active,
    #[sea_orm(iden = "inactive")]
    Inactive,
}
