pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_booking_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    // Kept apart from the host application's own migration history.
    fn migration_table_name() -> sea_orm::DynIden {
        Alias::new("mentor_bookings_migrations").into_iden()
    }

    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![Box::new(m20250101_000001_create_booking_tables::Migration)]
    }
}
