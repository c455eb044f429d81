pub use sea_orm_migration::prelude::*;

mod m20250310_000000_create_calculations;
mod m20250310_000001_create_calculation_items;
mod m20250310_000002_create_calculation_offers;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250310_000000_create_calculations::Migration),
            Box::new(m20250310_000001_create_calculation_items::Migration),
            Box::new(m20250310_000002_create_calculation_offers::Migration),
        ]
    }
}
