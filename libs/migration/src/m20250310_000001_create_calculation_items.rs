use sea_orm_migration::sea_query::extension::postgres::Type;
use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create calculation_item_type enum
        manager
            .create_type(
                Type::create()
                    .as_enum(CalculationItemType::Enum)
                    .values([
                        CalculationItemType::ExteriorColor,
                        CalculationItemType::InteriorColor,
                        CalculationItemType::Package,
                        CalculationItemType::Accessory,
                        CalculationItemType::Service,
                        CalculationItemType::Other,
                    ])
                    .to_owned(),
            )
            .await?;

        // Create calculation_items table
        manager
            .create_table(
                Table::create()
                    .table(CalculationItems::Table)
                    .if_not_exists()
                    .col(pk_uuid(CalculationItems::Id))
                    .col(uuid(CalculationItems::CalculationId))
                    .col(
                        ColumnDef::new(CalculationItems::ItemType)
                            .enumeration(
                                CalculationItemType::Enum,
                                [
                                    CalculationItemType::ExteriorColor,
                                    CalculationItemType::InteriorColor,
                                    CalculationItemType::Package,
                                    CalculationItemType::Accessory,
                                    CalculationItemType::Service,
                                    CalculationItemType::Other,
                                ],
                            )
                            .not_null(),
                    )
                    .col(string(CalculationItems::Name))
                    .col(ColumnDef::new(CalculationItems::Description).text().null())
                    .col(uuid_null(CalculationItems::CatalogColorId))
                    .col(
                        ColumnDef::new(CalculationItems::PriceImpact)
                            .decimal_len(12, 2)
                            .null(),
                    )
                    .col(boolean(CalculationItems::IsRequired).default(false))
                    .col(boolean(CalculationItems::IsIncluded).default(true))
                    .col(integer(CalculationItems::DisplayOrder).default(0))
                    .col(
                        ColumnDef::new(CalculationItems::Metadata)
                            .json_binary()
                            .null(),
                    )
                    .col(
                        timestamp_with_time_zone(CalculationItems::CreatedAt)
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_calculation_items_calculation")
                            .from(CalculationItems::Table, CalculationItems::CalculationId)
                            .to(Calculations::Table, Calculations::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_calculation_items_calculation_id")
                    .table(CalculationItems::Table)
                    .col(CalculationItems::CalculationId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CalculationItems::Table).to_owned())
            .await?;

        manager
            .drop_type(Type::drop().name(CalculationItemType::Enum).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(DeriveIden)]
enum CalculationItems {
    Table,
    Id,
    CalculationId,
    ItemType,
    Name,
    Description,
    CatalogColorId,
    PriceImpact,
    IsRequired,
    IsIncluded,
    DisplayOrder,
    Metadata,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Calculations {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum CalculationItemType {
    #[sea_orm(iden = "calculation_item_type")]
    Enum,
    #[sea_orm(iden = "exterior_color")]
    ExteriorColor,
    #[sea_orm(iden = "interior_color")]
    InteriorColor,
    #[sea_orm(iden = "package")]
    Package,
    #[sea_orm(iden = "accessory")]
    Accessory,
    #[sea_orm(iden = "service")]
    Service,
    #[sea_orm(iden = "other")]
    Other,
}
