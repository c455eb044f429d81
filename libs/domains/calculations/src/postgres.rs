use async_trait::async_trait;
use database::BaseRepository;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, LoaderTrait,
    QueryFilter, QueryOrder, SqlErr, TransactionTrait,
};
use uuid::Uuid;

use crate::entity::{
    calculation_items, calculation_offers, calculations, CalculationItemsEntity,
    CalculationOffersEntity, CalculationsEntity,
};
use crate::error::{CalculationError, CalculationResult};
use crate::models::{
    Calculation, CalculationItem, CalculationOffer, CalculationStatus, StatusTransition,
    UpdateCalculation, UpdateOfferQuote,
};
use crate::repository::CalculationRepository;

/// PostgreSQL implementation of CalculationRepository
///
/// Multi-row writes (calculation + items) run in a single transaction;
/// status transitions are conditional updates so two racing writers cannot
/// both take the same transition. The unique index on
/// `(calculation_id, leasing_company_id)` is the authoritative duplicate
/// guard for offers.
#[derive(Clone)]
pub struct PgCalculationRepository {
    calculations: BaseRepository<calculations::Entity>,
    offers: BaseRepository<calculation_offers::Entity>,
}

impl PgCalculationRepository {
    /// Create a new PostgreSQL calculation repository
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            calculations: BaseRepository::new(db.clone()),
            offers: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.calculations.db()
    }

    /// Attach items and offers to a batch of calculation rows
    async fn hydrate_many(
        &self,
        models: Vec<calculations::Model>,
    ) -> Result<Vec<Calculation>, DbErr> {
        let item_groups = models.load_many(CalculationItemsEntity, self.db()).await?;
        let offer_groups = models.load_many(CalculationOffersEntity, self.db()).await?;

        let result = models
            .into_iter()
            .zip(item_groups)
            .zip(offer_groups)
            .map(|((model, items), offers)| {
                let mut calculation: Calculation = model.into();

                let mut items: Vec<CalculationItem> =
                    items.into_iter().map(Into::into).collect();
                items.sort_by_key(|item| item.display_order);

                let mut offers: Vec<CalculationOffer> =
                    offers.into_iter().map(Into::into).collect();
                offers.sort_by(|a, b| a.created_at.cmp(&b.created_at));

                calculation.items = items;
                calculation.offers = offers;
                calculation
            })
            .collect();

        Ok(result)
    }
}

#[async_trait]
impl CalculationRepository for PgCalculationRepository {
    async fn create(&self, calculation: Calculation) -> CalculationResult<Calculation> {
        let txn = self.db().begin().await?;

        let model = calculations::ActiveModel::from(&calculation)
            .insert(&txn)
            .await?;

        let mut items: Vec<CalculationItem> = Vec::with_capacity(calculation.items.len());
        for item in &calculation.items {
            let stored = calculation_items::ActiveModel::from(item).insert(&txn).await?;
            items.push(stored.into());
        }

        txn.commit().await?;

        let mut created: Calculation = model.into();
        created.items = items;

        tracing::info!(calculation_id = %created.id, "Created calculation");
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> CalculationResult<Option<Calculation>> {
        let Some(model) = self.calculations.find_by_id(id).await? else {
            return Ok(None);
        };

        Ok(self.hydrate_many(vec![model]).await?.pop())
    }

    async fn list_by_car_request(
        &self,
        car_request_id: Uuid,
    ) -> CalculationResult<Vec<Calculation>> {
        let models = CalculationsEntity::find()
            .filter(calculations::Column::CarRequestId.eq(car_request_id))
            .order_by_desc(calculations::Column::CreatedAt)
            .all(self.db())
            .await?;

        Ok(self.hydrate_many(models).await?)
    }

    async fn list_pending(&self) -> CalculationResult<Vec<Calculation>> {
        let models = CalculationsEntity::find()
            .filter(calculations::Column::Status.is_in([
                CalculationStatus::Submitted,
                CalculationStatus::InProgress,
            ]))
            .order_by_asc(calculations::Column::SubmittedAt)
            .all(self.db())
            .await?;

        Ok(self.hydrate_many(models).await?)
    }

    async fn update(&self, id: Uuid, input: UpdateCalculation) -> CalculationResult<Calculation> {
        let replace_items = input.items.is_some();
        let txn = self.db().begin().await?;

        let model = CalculationsEntity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(CalculationError::NotFound(id))?;

        let mut calculation: Calculation = model.into();
        calculation.apply_update(input);

        calculations::ActiveModel::from(&calculation)
            .update(&txn)
            .await?;

        if replace_items {
            // Full replace: drop the old set, insert the new one
            CalculationItemsEntity::delete_many()
                .filter(calculation_items::Column::CalculationId.eq(id))
                .exec(&txn)
                .await?;

            for item in &calculation.items {
                calculation_items::ActiveModel::from(item).insert(&txn).await?;
            }
        }

        txn.commit().await?;

        tracing::info!(calculation_id = %id, "Updated calculation");
        self.get_by_id(id)
            .await?
            .ok_or(CalculationError::NotFound(id))
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: CalculationStatus,
        change: StatusTransition,
    ) -> CalculationResult<bool> {
        let mut model = calculations::ActiveModel {
            status: Set(change.to),
            updated_at: Set(chrono::Utc::now().into()),
            ..Default::default()
        };

        if let Some(assigned_to_id) = change.assigned_to_id {
            model.assigned_to_id = Set(Some(assigned_to_id));
        }
        if let Some(submitted_at) = change.submitted_at {
            model.submitted_at = Set(Some(submitted_at.into()));
        }
        if let Some(completed_at) = change.completed_at {
            model.completed_at = Set(Some(completed_at.into()));
        }

        // Compare-and-swap: the update only lands if the stored status is
        // still the one the caller observed
        let result = CalculationsEntity::update_many()
            .set(model)
            .col_expr(
                calculations::Column::Version,
                Expr::col(calculations::Column::Version).add(1),
            )
            .filter(calculations::Column::Id.eq(id))
            .filter(calculations::Column::Status.eq(expected))
            .exec(self.db())
            .await?;

        let won = result.rows_affected > 0;
        if won {
            tracing::info!(calculation_id = %id, status = %change.to, "Calculation transitioned");
        }
        Ok(won)
    }

    async fn delete(&self, id: Uuid) -> CalculationResult<bool> {
        // Items and offers go with the row via ON DELETE CASCADE
        let rows_affected = self.calculations.delete_by_id(id).await?;

        if rows_affected > 0 {
            tracing::info!(calculation_id = %id, "Deleted calculation");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn insert_offer(&self, offer: CalculationOffer) -> CalculationResult<CalculationOffer> {
        let model = calculation_offers::ActiveModel::from(&offer);

        let stored = self.offers.insert(model).await.map_err(|err| {
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
                CalculationError::DuplicateOffer {
                    calculation_id: offer.calculation_id,
                    leasing_company_id: offer.leasing_company_id,
                }
            } else {
                CalculationError::Database(err)
            }
        })?;

        tracing::info!(
            offer_id = %stored.id,
            calculation_id = %stored.calculation_id,
            "Recorded offer quote"
        );
        Ok(stored.into())
    }

    async fn get_offer(&self, id: Uuid) -> CalculationResult<Option<CalculationOffer>> {
        let model = self.offers.find_by_id(id).await?;
        Ok(model.map(Into::into))
    }

    async fn find_offer_by_company(
        &self,
        calculation_id: Uuid,
        leasing_company_id: Uuid,
    ) -> CalculationResult<Option<CalculationOffer>> {
        let model = CalculationOffersEntity::find()
            .filter(calculation_offers::Column::CalculationId.eq(calculation_id))
            .filter(calculation_offers::Column::LeasingCompanyId.eq(leasing_company_id))
            .one(self.db())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn update_offer(
        &self,
        id: Uuid,
        input: UpdateOfferQuote,
    ) -> CalculationResult<CalculationOffer> {
        let model = self
            .offers
            .find_by_id(id)
            .await?
            .ok_or(CalculationError::OfferNotFound(id))?;

        let mut offer: CalculationOffer = model.into();
        offer.apply_update(input);

        let updated = self
            .offers
            .update(calculation_offers::ActiveModel::from(&offer))
            .await?;

        tracing::info!(offer_id = %id, "Updated offer quote");
        Ok(updated.into())
    }
}
