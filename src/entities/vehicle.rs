use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::driver::AvailabilityStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicle")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// None = internal pool vehicle
    pub fleet_id: Option<Uuid>,
    pub category: String,
    pub make: String,
    pub plate: String,
    pub max_passengers: i32,
    pub max_luggage: i32,
    pub status: AvailabilityStatus,
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
}

impl Related<super::fleet::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Fleet.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
