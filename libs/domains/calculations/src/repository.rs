use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{CalculationError, CalculationResult};
use crate::models::{
    Calculation, CalculationOffer, CalculationStatus, StatusTransition, UpdateCalculation,
    UpdateOfferQuote,
};

/// Repository trait for calculation persistence
///
/// Implementations own the transaction boundaries: `create` and `update`
/// write the calculation row and its items atomically, and `transition` only
/// lands when the stored status still equals `expected` (compare-and-swap).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalculationRepository: Send + Sync {
    /// Persist a new calculation together with its items
    async fn create(&self, calculation: Calculation) -> CalculationResult<Calculation>;

    /// Get a calculation by ID, hydrated with items and offers
    async fn get_by_id(&self, id: Uuid) -> CalculationResult<Option<Calculation>>;

    /// All calculations for a car request, newest first
    async fn list_by_car_request(&self, car_request_id: Uuid)
        -> CalculationResult<Vec<Calculation>>;

    /// Submitted and in-progress calculations, oldest submission first
    async fn list_pending(&self) -> CalculationResult<Vec<Calculation>>;

    /// Patch a calculation; a present `items` list replaces the whole set
    async fn update(&self, id: Uuid, input: UpdateCalculation) -> CalculationResult<Calculation>;

    /// Apply a status transition if the stored status still equals `expected`.
    /// Returns false when the row is gone or another writer got there first.
    async fn transition(
        &self,
        id: Uuid,
        expected: CalculationStatus,
        change: StatusTransition,
    ) -> CalculationResult<bool>;

    /// Hard-delete a calculation, cascading items and offers
    async fn delete(&self, id: Uuid) -> CalculationResult<bool>;

    /// Insert an offer; rejects a second offer for the same leasing company
    /// on the same calculation with `DuplicateOffer`
    async fn insert_offer(&self, offer: CalculationOffer) -> CalculationResult<CalculationOffer>;

    /// Get an offer by ID
    async fn get_offer(&self, id: Uuid) -> CalculationResult<Option<CalculationOffer>>;

    /// Find the offer a leasing company placed on a calculation, if any
    async fn find_offer_by_company(
        &self,
        calculation_id: Uuid,
        leasing_company_id: Uuid,
    ) -> CalculationResult<Option<CalculationOffer>>;

    /// Merge supplied fields over an existing offer
    async fn update_offer(
        &self,
        id: Uuid,
        input: UpdateOfferQuote,
    ) -> CalculationResult<CalculationOffer>;
}

/// In-memory implementation of CalculationRepository (for development/testing)
///
/// All operations run under a single lock, so every call is atomic exactly
/// like the transactional Postgres implementation.
#[derive(Debug, Default, Clone)]
pub struct InMemoryCalculationRepository {
    state: Arc<RwLock<State>>,
}

#[derive(Debug, Default)]
struct State {
    calculations: HashMap<Uuid, Calculation>,
    offers: HashMap<Uuid, CalculationOffer>,
}

impl InMemoryCalculationRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl State {
    /// Clone a stored calculation with its offers attached, oldest first
    fn hydrate(&self, calculation: &Calculation) -> Calculation {
        let mut result = calculation.clone();
        let mut offers: Vec<CalculationOffer> = self
            .offers
            .values()
            .filter(|offer| offer.calculation_id == calculation.id)
            .cloned()
            .collect();
        offers.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        result.offers = offers;
        result
    }
}

#[async_trait]
impl CalculationRepository for InMemoryCalculationRepository {
    async fn create(&self, calculation: Calculation) -> CalculationResult<Calculation> {
        let mut state = self.state.write().await;
        state
            .calculations
            .insert(calculation.id, calculation.clone());

        tracing::info!(calculation_id = %calculation.id, "Created calculation");
        // A fresh calculation has no offers yet, so the input is already hydrated
        Ok(calculation)
    }

    async fn get_by_id(&self, id: Uuid) -> CalculationResult<Option<Calculation>> {
        let state = self.state.read().await;
        Ok(state.calculations.get(&id).map(|c| state.hydrate(c)))
    }

    async fn list_by_car_request(
        &self,
        car_request_id: Uuid,
    ) -> CalculationResult<Vec<Calculation>> {
        let state = self.state.read().await;
        let mut result: Vec<Calculation> = state
            .calculations
            .values()
            .filter(|c| c.car_request_id == car_request_id)
            .map(|c| state.hydrate(c))
            .collect();

        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn list_pending(&self) -> CalculationResult<Vec<Calculation>> {
        let state = self.state.read().await;
        let mut result: Vec<Calculation> = state
            .calculations
            .values()
            .filter(|c| {
                matches!(
                    c.status,
                    CalculationStatus::Submitted | CalculationStatus::InProgress
                )
            })
            .map(|c| state.hydrate(c))
            .collect();

        result.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at));
        Ok(result)
    }

    async fn update(&self, id: Uuid, input: UpdateCalculation) -> CalculationResult<Calculation> {
        let mut state = self.state.write().await;
        let calculation = state
            .calculations
            .get_mut(&id)
            .ok_or(CalculationError::NotFound(id))?;

        calculation.apply_update(input);
        let updated = calculation.clone();

        tracing::info!(calculation_id = %id, "Updated calculation");
        Ok(state.hydrate(&updated))
    }

    async fn transition(
        &self,
        id: Uuid,
        expected: CalculationStatus,
        change: StatusTransition,
    ) -> CalculationResult<bool> {
        let mut state = self.state.write().await;
        let Some(calculation) = state.calculations.get_mut(&id) else {
            return Ok(false);
        };

        if calculation.status != expected {
            return Ok(false);
        }

        calculation.apply_transition(&change);
        tracing::info!(calculation_id = %id, status = %change.to, "Calculation transitioned");
        Ok(true)
    }

    async fn delete(&self, id: Uuid) -> CalculationResult<bool> {
        let mut state = self.state.write().await;

        if state.calculations.remove(&id).is_some() {
            // Cascade, like the FK on the offers table
            state.offers.retain(|_, offer| offer.calculation_id != id);
            tracing::info!(calculation_id = %id, "Deleted calculation");
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn insert_offer(&self, offer: CalculationOffer) -> CalculationResult<CalculationOffer> {
        let mut state = self.state.write().await;

        // The unique (calculation_id, leasing_company_id) index
        let duplicate = state.offers.values().any(|existing| {
            existing.calculation_id == offer.calculation_id
                && existing.leasing_company_id == offer.leasing_company_id
        });

        if duplicate {
            return Err(CalculationError::DuplicateOffer {
                calculation_id: offer.calculation_id,
                leasing_company_id: offer.leasing_company_id,
            });
        }

        state.offers.insert(offer.id, offer.clone());
        tracing::info!(offer_id = %offer.id, calculation_id = %offer.calculation_id, "Recorded offer quote");
        Ok(offer)
    }

    async fn get_offer(&self, id: Uuid) -> CalculationResult<Option<CalculationOffer>> {
        let state = self.state.read().await;
        Ok(state.offers.get(&id).cloned())
    }

    async fn find_offer_by_company(
        &self,
        calculation_id: Uuid,
        leasing_company_id: Uuid,
    ) -> CalculationResult<Option<CalculationOffer>> {
        let state = self.state.read().await;
        Ok(state
            .offers
            .values()
            .find(|offer| {
                offer.calculation_id == calculation_id
                    && offer.leasing_company_id == leasing_company_id
            })
            .cloned())
    }

    async fn update_offer(
        &self,
        id: Uuid,
        input: UpdateOfferQuote,
    ) -> CalculationResult<CalculationOffer> {
        let mut state = self.state.write().await;
        let offer = state
            .offers
            .get_mut(&id)
            .ok_or(CalculationError::OfferNotFound(id))?;

        offer.apply_update(input);
        let updated = offer.clone();

        tracing::info!(offer_id = %id, "Updated offer quote");
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CreateCalculation, CreateOfferQuote};

    fn draft_input(car_request_id: Uuid) -> CreateCalculation {
        CreateCalculation {
            car_request_id,
            duration_months: 36,
            annual_mileage_km: 20_000,
            delivery_expected_at: None,
            notes: None,
            internal_notes: None,
            metadata: None,
            items: vec![],
        }
    }

    fn quote_input(calculation_id: Uuid, leasing_company_id: Uuid) -> CreateOfferQuote {
        CreateOfferQuote {
            calculation_id,
            leasing_company_id,
            monthly_payment: None,
            down_payment: None,
            total_price: None,
            interest_rate: None,
            admin_fee: None,
            includes_service: None,
            includes_winter_tires: None,
            includes_gap: None,
            includes_assistance: None,
            terms_and_conditions: None,
            valid_until: None,
            notes: None,
            metadata: None,
        }
    }

    #[tokio::test]
    async fn test_create_and_get_calculation() {
        let repo = InMemoryCalculationRepository::new();
        let calculation = Calculation::new(draft_input(Uuid::new_v4()), Uuid::new_v4());

        let created = repo.create(calculation).await.unwrap();
        assert_eq!(created.status, CalculationStatus::Draft);
        assert_eq!(created.version, 1);

        let fetched = repo.get_by_id(created.id).await.unwrap();
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().id, created.id);
    }

    #[tokio::test]
    async fn test_transition_compare_and_swap() {
        let repo = InMemoryCalculationRepository::new();
        let calculation = Calculation::new(draft_input(Uuid::new_v4()), Uuid::new_v4());
        let id = repo.create(calculation).await.unwrap().id;

        let change = StatusTransition {
            to: CalculationStatus::Submitted,
            submitted_at: Some(chrono::Utc::now()),
            ..Default::default()
        };

        let won = repo
            .transition(id, CalculationStatus::Draft, change.clone())
            .await
            .unwrap();
        assert!(won);

        // Second writer observed Draft too, but the swap must fail now
        let lost = repo
            .transition(id, CalculationStatus::Draft, change)
            .await
            .unwrap();
        assert!(!lost);

        let stored = repo.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.status, CalculationStatus::Submitted);
        assert_eq!(stored.version, 2);
    }

    #[tokio::test]
    async fn test_duplicate_offer_rejected() {
        let repo = InMemoryCalculationRepository::new();
        let calculation = Calculation::new(draft_input(Uuid::new_v4()), Uuid::new_v4());
        let id = repo.create(calculation).await.unwrap().id;
        let company = Uuid::new_v4();

        let offer = CalculationOffer::new(quote_input(id, company), Uuid::new_v4());
        repo.insert_offer(offer).await.unwrap();

        let second = CalculationOffer::new(quote_input(id, company), Uuid::new_v4());
        let result = repo.insert_offer(second).await;
        assert!(matches!(
            result,
            Err(CalculationError::DuplicateOffer { .. })
        ));
    }

    #[tokio::test]
    async fn test_delete_cascades_offers() {
        let repo = InMemoryCalculationRepository::new();
        let calculation = Calculation::new(draft_input(Uuid::new_v4()), Uuid::new_v4());
        let id = repo.create(calculation).await.unwrap().id;

        let offer = CalculationOffer::new(quote_input(id, Uuid::new_v4()), Uuid::new_v4());
        let offer_id = repo.insert_offer(offer).await.unwrap().id;

        assert!(repo.delete(id).await.unwrap());
        assert!(repo.get_offer(offer_id).await.unwrap().is_none());
    }
}
