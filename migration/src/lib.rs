pub use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260301_000002_create_fleets;
mod m20260301_000003_create_drivers_vehicles;
mod m20260301_000004_create_bookings;
mod m20260301_000005_create_booking_audit;
mod m20260301_000006_create_tracking;
mod m20260301_000007_create_invoices;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260301_000002_create_fleets::Migration),
            Box::new(m20260301_000003_create_drivers_vehicles::Migration),
            Box::new(m20260301_000004_create_bookings::Migration),
            Box::new(m20260301_000005_create_booking_audit::Migration),
            Box::new(m20260301_000006_create_tracking::Migration),
            Box::new(m20260301_000007_create_invoices::Migration),
        ]
    }
}
