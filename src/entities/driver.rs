use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "driver_type")]
#[serde(rename_all = "snake_case")]
pub enum DriverType {
    /// Belongs to the platform's internal pool, no fleet
    #[sea_orm(string_value = "internal")]
    Internal,
    #[sea_orm(string_value = "fleet")]
    Fleet,
    #[sea_orm(string_value = "freelancer")]
    Freelancer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "availability_status")]
#[serde(rename_all = "snake_case")]
pub enum AvailabilityStatus {
    #[sea_orm(string_value = "active")]
    Active,
    #[sea_orm(string_value = "inactive")]
    Inactive,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "driver")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// None = internal (fleet-less) driver
    pub fleet_id: Option<Uuid>,
    /// Optional default vehicle
    pub vehicle_id: Option<Uuid>,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub driver_type: DriverType,
    pub status: AvailabilityStatus,
    pub average_rating: f64,
    pub total_ratings: i32,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fleet::Entity",
        from = "Column::FleetId",
        to = "super::fleet::Column::Id"
    )]
    Fleet,
    #[sea_orm(
        belongs_to = "super::vehicle::Entity",
        from = "Column::VehicleId",
        to = "super::vehicle::Column::Id"
    )]
    Vehicle,
}

impl Related<super::fleet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fleet.def()
    }
}

impl Related<super::vehicle::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Vehicle.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
