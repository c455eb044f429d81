use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create calculation_status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(CalculationStatus::Enum)
                    .values([
                        CalculationStatus::Draft,
                        CalculationStatus::Submitted,
                        CalculationStatus::InProgress,
                        CalculationStatus::Completed,
                        CalculationStatus::Rejected,
                        CalculationStatus::Cancelled,
                    ])
                    .to_owned(),
            )
            .await?;

        // Create calculations table
        manager
            .create_table(
                Table::create()
                    .table(Calculations::Table)
                    .if_not_exists()
                    .col(pk_uuid(Calculations::Id))
                    .col(uuid(Calculations::CarRequestId))
                    .col(uuid(Calculations::RequestedById))
                    .col(uuid_null(Calculations::AssignedToId))
                    .col(integer(Calculations::Version).default(1))
                    .col(
                        ColumnDef::new(Calculations::Status)
                            .enumeration(
                                CalculationStatus::Enum,
                                [
                                    CalculationStatus::Draft,
                                    CalculationStatus::Submitted,
                                    CalculationStatus::InProgress,
                                    CalculationStatus::Completed,
                                    CalculationStatus::Rejected,
                                    CalculationStatus::Cancelled,
                                ],
                            )
                            .not_null()
                            .default("draft"),
                    )
                    .col(integer(Calculations::DurationMonths))
                    .col(integer(Calculations::AnnualMileageKm))
                    .col(timestamp_with_time_zone_null(
                        Calculations::DeliveryExpectedAt,
                    ))
                    .col(ColumnDef::new(Calculations::Notes).text().null())
                    .col(ColumnDef::new(Calculations::InternalNotes).text().null())
                    .col(ColumnDef::new(Calculations::Metadata).json_binary().null())
                    .col(timestamp_with_time_zone_null(Calculations::SubmittedAt))
                    .col(timestamp_with_time_zone_null(Calculations::CompletedAt))
                    .col(
                        timestamp_with_time_zone(Calculations::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(Calculations::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Create indexes
        manager
            .create_index(
                Index::create()
                    .name("idx_calculations_car_request_id")
                    .table(Calculations::Table)
                    .col(Calculations::CarRequestId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_calculations_status")
                    .table(Calculations::Table)
                    .col(Calculations::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_calculations_submitted_at")
                    .table(Calculations::Table)
                    .col(Calculations::SubmittedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Calculations::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CalculationStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum Calculations {
    Table,
    Id,
    CarRequestId,
    RequestedById,
    AssignedToId,
    Version,
    Status,
    DurationMonths,
    AnnualMileageKm,
    DeliveryExpectedAt,
    Notes,
    InternalNotes,
    Metadata,
    SubmittedAt,
    CompletedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum CalculationStatus {
    #[sea_orm(iden = "calculation_status")]
    Enum,
    #[sea_orm(iden = "draft")]
    Draft,
    #[sea_orm(iden = "submitted")]
    Submitted,
    #[sea_orm(iden = "in_progress")]
    InProgress,
    #[sea_orm(iden = "completed")]
    Completed,
    #[sea_orm(iden = "rejected")]
    Rejected,
    #[sea_orm(iden = "cancelled")]
    Cancelled,
}
