use sea_orm::entity::prelude::*;
use sea_orm::ActiveValue::Set;
use serde::{Deserialize, Serialize};

// ===== Calculations Entity =====

pub mod calculations {
    use super::*;
    use crate::models::CalculationStatus;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "calculations")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub car_request_id: Uuid,
        pub requested_by_id: Uuid,
        pub assigned_to_id: Option<Uuid>,
        pub version: i32,
        pub status: CalculationStatus,
        pub duration_months: i32,
        pub annual_mileage_km: i32,
        pub delivery_expected_at: Option<DateTimeWithTimeZone>,
        #[sea_orm(column_type = "Text", nullable)]
        pub notes: Option<String>,
        #[sea_orm(column_type = "Text", nullable)]
        pub internal_notes: Option<String>,
        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub metadata: Option<Json>,
        pub submitted_at: Option<DateTimeWithTimeZone>,
        pub completed_at: Option<DateTimeWithTimeZone>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(has_many = "super::calculation_items::Entity")]
        Items,
        #[sea_orm(has_many = "super::calculation_offers::Entity")]
        Offers,
    }

    impl Related<super::calculation_items::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Items.def()
        }
    }

    impl Related<super::calculation_offers::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Offers.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    // Items and offers are loaded separately; the bare row maps to a
    // calculation with empty collections.
    impl From<Model> for crate::models::Calculation {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                car_request_id: model.car_request_id,
                requested_by_id: model.requested_by_id,
                assigned_to_id: model.assigned_to_id,
                version: model.version,
                status: model.status,
                duration_months: model.duration_months,
                annual_mileage_km: model.annual_mileage_km,
                delivery_expected_at: model.delivery_expected_at.map(Into::into),
                notes: model.notes,
                internal_notes: model.internal_notes,
                metadata: model.metadata,
                submitted_at: model.submitted_at.map(Into::into),
                completed_at: model.completed_at.map(Into::into),
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
                items: Vec::new(),
                offers: Vec::new(),
            }
        }
    }

    impl From<&crate::models::Calculation> for ActiveModel {
        fn from(calculation: &crate::models::Calculation) -> Self {
            ActiveModel {
                id: Set(calculation.id),
                car_request_id: Set(calculation.car_request_id),
                requested_by_id: Set(calculation.requested_by_id),
                assigned_to_id: Set(calculation.assigned_to_id),
                version: Set(calculation.version),
                status: Set(calculation.status),
                duration_months: Set(calculation.duration_months),
                annual_mileage_km: Set(calculation.annual_mileage_km),
                delivery_expected_at: Set(calculation.delivery_expected_at.map(Into::into)),
                notes: Set(calculation.notes.clone()),
                internal_notes: Set(calculation.internal_notes.clone()),
                metadata: Set(calculation.metadata.clone()),
                submitted_at: Set(calculation.submitted_at.map(Into::into)),
                completed_at: Set(calculation.completed_at.map(Into::into)),
                created_at: Set(calculation.created_at.into()),
                updated_at: Set(calculation.updated_at.into()),
            }
        }
    }
}

// ===== Calculation Items Entity =====

pub mod calculation_items {
    use super::*;
    use crate::models::CalculationItemType;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "calculation_items")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub calculation_id: Uuid,
        pub item_type: CalculationItemType,
        pub name: String,
        #[sea_orm(column_type = "Text", nullable)]
        pub description: Option<String>,
        pub catalog_color_id: Option<Uuid>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub price_impact: Option<Decimal>,
        pub is_required: bool,
        pub is_included: bool,
        pub display_order: i32,
        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub metadata: Option<Json>,
        pub created_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::calculations::Entity",
            from = "Column::CalculationId",
            to = "super::calculations::Column::Id"
        )]
        Calculation,
    }

    impl Related<super::calculations::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Calculation.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::CalculationItem {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                calculation_id: model.calculation_id,
                item_type: model.item_type,
                name: model.name,
                description: model.description,
                catalog_color_id: model.catalog_color_id,
                price_impact: model.price_impact,
                is_required: model.is_required,
                is_included: model.is_included,
                display_order: model.display_order,
                metadata: model.metadata,
                created_at: model.created_at.into(),
            }
        }
    }

    impl From<&crate::models::CalculationItem> for ActiveModel {
        fn from(item: &crate::models::CalculationItem) -> Self {
            ActiveModel {
                id: Set(item.id),
                calculation_id: Set(item.calculation_id),
                item_type: Set(item.item_type),
                name: Set(item.name.clone()),
                description: Set(item.description.clone()),
                catalog_color_id: Set(item.catalog_color_id),
                price_impact: Set(item.price_impact),
                is_required: Set(item.is_required),
                is_included: Set(item.is_included),
                display_order: Set(item.display_order),
                metadata: Set(item.metadata.clone()),
                created_at: Set(item.created_at.into()),
            }
        }
    }
}

// ===== Calculation Offers Entity =====

pub mod calculation_offers {
    use super::*;
    use crate::models::OfferStatus;

    #[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
    #[sea_orm(table_name = "calculation_offers")]
    pub struct Model {
        #[sea_orm(primary_key, auto_increment = false)]
        pub id: Uuid,
        pub calculation_id: Uuid,
        pub leasing_company_id: Uuid,
        pub status: OfferStatus,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub monthly_payment: Option<Decimal>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub down_payment: Option<Decimal>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub total_price: Option<Decimal>,
        #[sea_orm(column_type = "Decimal(Some((6, 3)))", nullable)]
        pub interest_rate: Option<Decimal>,
        #[sea_orm(column_type = "Decimal(Some((12, 2)))", nullable)]
        pub admin_fee: Option<Decimal>,
        pub includes_service: Option<bool>,
        pub includes_winter_tires: Option<bool>,
        pub includes_gap: Option<bool>,
        pub includes_assistance: Option<bool>,
        #[sea_orm(column_type = "Text", nullable)]
        pub terms_and_conditions: Option<String>,
        pub valid_until: Option<Date>,
        #[sea_orm(column_type = "Text", nullable)]
        pub notes: Option<String>,
        #[sea_orm(column_type = "JsonBinary", nullable)]
        pub metadata: Option<Json>,
        pub quoted_by_id: Option<Uuid>,
        pub quoted_at: Option<DateTimeWithTimeZone>,
        pub created_at: DateTimeWithTimeZone,
        pub updated_at: DateTimeWithTimeZone,
    }

    #[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
    pub enum Relation {
        #[sea_orm(
            belongs_to = "super::calculations::Entity",
            from = "Column::CalculationId",
            to = "super::calculations::Column::Id"
        )]
        Calculation,
    }

    impl Related<super::calculations::Entity> for Entity {
        fn to() -> RelationDef {
            Relation::Calculation.def()
        }
    }

    impl ActiveModelBehavior for ActiveModel {}

    impl From<Model> for crate::models::CalculationOffer {
        fn from(model: Model) -> Self {
            Self {
                id: model.id,
                calculation_id: model.calculation_id,
                leasing_company_id: model.leasing_company_id,
                status: model.status,
                monthly_payment: model.monthly_payment,
                down_payment: model.down_payment,
                total_price: model.total_price,
                interest_rate: model.interest_rate,
                admin_fee: model.admin_fee,
                includes_service: model.includes_service,
                includes_winter_tires: model.includes_winter_tires,
                includes_gap: model.includes_gap,
                includes_assistance: model.includes_assistance,
                terms_and_conditions: model.terms_and_conditions,
                valid_until: model.valid_until,
                notes: model.notes,
                metadata: model.metadata,
                quoted_by_id: model.quoted_by_id,
                quoted_at: model.quoted_at.map(Into::into),
                created_at: model.created_at.into(),
                updated_at: model.updated_at.into(),
            }
        }
    }

    impl From<&crate::models::CalculationOffer> for ActiveModel {
        fn from(offer: &crate::models::CalculationOffer) -> Self {
            ActiveModel {
                id: Set(offer.id),
                calculation_id: Set(offer.calculation_id),
                leasing_company_id: Set(offer.leasing_company_id),
                status: Set(offer.status),
                monthly_payment: Set(offer.monthly_payment),
                down_payment: Set(offer.down_payment),
                total_price: Set(offer.total_price),
                interest_rate: Set(offer.interest_rate),
                admin_fee: Set(offer.admin_fee),
                includes_service: Set(offer.includes_service),
                includes_winter_tires: Set(offer.includes_winter_tires),
                includes_gap: Set(offer.includes_gap),
                includes_assistance: Set(offer.includes_assistance),
                terms_and_conditions: Set(offer.terms_and_conditions.clone()),
                valid_until: Set(offer.valid_until),
                notes: Set(offer.notes.clone()),
                metadata: Set(offer.metadata.clone()),
                quoted_by_id: Set(offer.quoted_by_id),
                quoted_at: Set(offer.quoted_at.map(Into::into)),
                created_at: Set(offer.created_at.into()),
                updated_at: Set(offer.updated_at.into()),
            }
        }
    }
}

pub use calculation_items::Entity as CalculationItemsEntity;
pub use calculation_offers::Entity as CalculationOffersEntity;
pub use calculations::Entity as CalculationsEntity;
