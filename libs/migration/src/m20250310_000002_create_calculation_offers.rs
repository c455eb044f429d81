use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create calculation_offer_status enum
        manager
            .create_type(
                Type::create()
                    .as_enum(CalculationOfferStatus::Enum)
                    .values([
                        CalculationOfferStatus::Pending,
                        CalculationOfferStatus::Quoted,
                        CalculationOfferStatus::Accepted,
                        CalculationOfferStatus::Rejected,
                    ])
                    .to_owned(),
            )
            .await?;

        // Create calculation_offers table
        manager
            .create_table(
                Table::create()
                    .table(CalculationOffers::Table)
                    .if_not_exists()
                    .col(pk_uuid(CalculationOffers::Id))
                    .col(uuid(CalculationOffers::CalculationId))
                    .col(uuid(CalculationOffers::LeasingCompanyId))
                    .col(
                        ColumnDef::new(CalculationOffers::Status)
                            .enumeration(
                                CalculationOfferStatus::Enum,
                                [
                                    CalculationOfferStatus::Pending,
                                    CalculationOfferStatus::Quoted,
                                    CalculationOfferStatus::Accepted,
                                    CalculationOfferStatus::Rejected,
                                ],
                            )
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(CalculationOffers::MonthlyPayment)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CalculationOffers::DownPayment)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CalculationOffers::TotalPrice)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CalculationOffers::InterestRate)
                            .decimal_len(6, 3)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CalculationOffers::AdminFee)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(ColumnDef::new(CalculationOffers::IncludesService).boolean().null())
                    .col(
                        ColumnDef::new(CalculationOffers::IncludesWinterTires)
                            .boolean()
                            .null(),
                    )
                    .col(ColumnDef::new(CalculationOffers::IncludesGap).boolean().null())
                    .col(
                        ColumnDef::new(CalculationOffers::IncludesAssistance)
                            .boolean()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(CalculationOffers::TermsAndConditions)
                            .text()
                            .null(),
                    )
                    .col(ColumnDef::new(CalculationOffers::ValidUntil).date().null())
                    .col(ColumnDef::new(CalculationOffers::Notes).text().null())
                    .col(
                        ColumnDef::new(CalculationOffers::Metadata)
                            .json_binary()
                            .null(),
                    )
                    .col(uuid_null(CalculationOffers::QuotedById))
                    .col(timestamp_with_time_zone_null(CalculationOffers::QuotedAt))
                    .col(
                        timestamp_with_time_zone(CalculationOffers::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        timestamp_with_time_zone(CalculationOffers::UpdatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calculation_offers_calculation")
                            .from(CalculationOffers::Table, CalculationOffers::CalculationId)
                            .to(Calculations::Table, Calculations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One offer per leasing company per calculation. The service performs
        // an advisory pre-check, but this index is the authoritative guard.
        manager
            .create_index(
                Index::create()
                    .name("ux_calculation_offers_company")
                    .table(CalculationOffers::Table)
                    .col(CalculationOffers::CalculationId)
                    .col(CalculationOffers::LeasingCompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_calculation_offers_status")
                    .table(CalculationOffers::Table)
                    .col(CalculationOffers::Status)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CalculationOffers::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CalculationOfferStatus::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CalculationOffers {
    Table,
    Id,
    CalculationId,
    LeasingCompanyId,
    Status,
    MonthlyPayment,
    DownPayment,
    TotalPrice,
    InterestRate,
    AdminFee,
    IncludesService,
    IncludesWinterTires,
    IncludesGap,
    IncludesAssistance,
    TermsAndConditions,
    ValidUntil,
    Notes,
    Metadata,
    QuotedById,
    QuotedAt,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Calculations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CalculationOfferStatus {
    #[sea_orm(iden = "calculation_offer_status")]
    Enum,
    #[sea_orm(iden = "pending")]
    Pending,
    #[sea_orm(iden = "quoted")]
    Quoted,
    #[sea_orm(iden = "accepted")]
    Accepted,
    #[sea_orm(iden = "rejected")]
    Rejected,
}
