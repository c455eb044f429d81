use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::error::{CalculationError, CalculationResult};
use crate::models::{
    Calculation, CalculationOffer, CalculationStatus, CreateCalculation, CreateOfferQuote,
    StatusTransition, UpdateCalculation, UpdateOfferQuote,
};
use crate::repository::CalculationRepository;

/// Workflow service for calculations and their offers
///
/// The single entry point for every state-changing operation. The service
/// owns the status state machine; the repository owns transaction boundaries
/// and the storage-level uniqueness guard.
#[derive(Clone)]
pub struct CalculationService<R: CalculationRepository> {
    repository: Arc<R>,
}

impl<R: CalculationRepository> CalculationService<R> {
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Open a new draft calculation with its initial configuration items
    pub async fn create_calculation(
        &self,
        input: CreateCalculation,
        requested_by: Uuid,
    ) -> CalculationResult<Calculation> {
        input
            .validate()
            .map_err(|e| CalculationError::Validation(e.to_string()))?;

        let calculation = Calculation::new(input, requested_by);
        self.repository.create(calculation).await
    }

    /// Get a calculation by ID, hydrated with items and offers
    pub async fn find_one(&self, id: Uuid) -> CalculationResult<Calculation> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or(CalculationError::NotFound(id))
    }

    /// All calculations for a car request, newest first
    pub async fn find_by_car_request(
        &self,
        car_request_id: Uuid,
    ) -> CalculationResult<Vec<Calculation>> {
        self.repository.list_by_car_request(car_request_id).await
    }

    /// The work queue: submitted and in-progress calculations, oldest
    /// submission first
    pub async fn find_pending_calculations(&self) -> CalculationResult<Vec<Calculation>> {
        self.repository.list_pending().await
    }

    /// Patch a calculation; a present `items` list replaces the whole set
    pub async fn update_calculation(
        &self,
        id: Uuid,
        input: UpdateCalculation,
    ) -> CalculationResult<Calculation> {
        input
            .validate()
            .map_err(|e| CalculationError::Validation(e.to_string()))?;

        let existing = self.find_one(id).await?;
        if existing.status == CalculationStatus::Completed {
            return Err(CalculationError::InvalidState(
                "cannot update a completed calculation".to_string(),
            ));
        }

        self.repository.update(id, input).await
    }

    /// Hand a draft calculation over for processing
    pub async fn submit_calculation(&self, id: Uuid) -> CalculationResult<Calculation> {
        let calculation = self.find_one(id).await?;
        if calculation.status != CalculationStatus::Draft {
            return Err(CalculationError::InvalidState(
                "only draft calculations can be submitted".to_string(),
            ));
        }

        let change = StatusTransition {
            to: CalculationStatus::Submitted,
            submitted_at: Some(Utc::now()),
            ..Default::default()
        };

        // A racing submit loses the swap and sees the same invariant error
        if !self
            .repository
            .transition(id, CalculationStatus::Draft, change)
            .await?
        {
            return Err(CalculationError::InvalidState(
                "only draft calculations can be submitted".to_string(),
            ));
        }

        self.find_one(id).await
    }

    /// Claim a submitted calculation for processing
    pub async fn start_processing(
        &self,
        id: Uuid,
        assigned_to: Uuid,
    ) -> CalculationResult<Calculation> {
        let calculation = self.find_one(id).await?;
        if calculation.status != CalculationStatus::Submitted {
            return Err(CalculationError::InvalidState(
                "only submitted calculations can be processed".to_string(),
            ));
        }

        let change = StatusTransition {
            to: CalculationStatus::InProgress,
            assigned_to_id: Some(assigned_to),
            ..Default::default()
        };

        if !self
            .repository
            .transition(id, CalculationStatus::Submitted, change)
            .await?
        {
            return Err(CalculationError::InvalidState(
                "only submitted calculations can be processed".to_string(),
            ));
        }

        self.find_one(id).await
    }

    /// Close a calculation once at least one offer has been quoted
    ///
    /// Any non-completed status may be completed; there is deliberately no
    /// `InProgress`-only guard.
    pub async fn complete_calculation(&self, id: Uuid) -> CalculationResult<Calculation> {
        let calculation = self.find_one(id).await?;
        if calculation.status == CalculationStatus::Completed {
            return Err(CalculationError::InvalidState(
                "calculation is already completed".to_string(),
            ));
        }
        if !calculation.has_quoted_offer() {
            return Err(CalculationError::InvalidState(
                "calculation must have at least one quoted offer to complete".to_string(),
            ));
        }

        let change = StatusTransition {
            to: CalculationStatus::Completed,
            completed_at: Some(Utc::now()),
            ..Default::default()
        };

        if !self
            .repository
            .transition(id, calculation.status, change)
            .await?
        {
            return Err(CalculationError::InvalidState(
                "calculation status changed, please retry".to_string(),
            ));
        }

        self.find_one(id).await
    }

    /// Hard-delete a calculation and everything attached to it
    pub async fn delete_calculation(&self, id: Uuid) -> CalculationResult<bool> {
        let calculation = self.find_one(id).await?;
        if calculation.status == CalculationStatus::Completed {
            return Err(CalculationError::InvalidState(
                "cannot delete a completed calculation".to_string(),
            ));
        }

        self.repository.delete(id).await
    }

    /// Record a leasing company's quote against a calculation
    ///
    /// The offer is created directly in `Quoted`. The duplicate pre-check is
    /// advisory; the storage-level unique index settles races.
    pub async fn add_offer_quote(
        &self,
        input: CreateOfferQuote,
        quoted_by: Uuid,
    ) -> CalculationResult<CalculationOffer> {
        self.find_one(input.calculation_id).await?;

        if self
            .repository
            .find_offer_by_company(input.calculation_id, input.leasing_company_id)
            .await?
            .is_some()
        {
            return Err(CalculationError::DuplicateOffer {
                calculation_id: input.calculation_id,
                leasing_company_id: input.leasing_company_id,
            });
        }

        let offer = CalculationOffer::new(input, quoted_by);
        self.repository.insert_offer(offer).await
    }

    /// Merge updated quote details over an existing offer; status stays as-is
    pub async fn update_offer_quote(
        &self,
        offer_id: Uuid,
        input: UpdateOfferQuote,
    ) -> CalculationResult<CalculationOffer> {
        self.repository
            .get_offer(offer_id)
            .await?
            .ok_or(CalculationError::OfferNotFound(offer_id))?;

        self.repository.update_offer(offer_id, input).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{CalculationItemType, CreateCalculationItem, OfferStatus};
    use crate::repository::MockCalculationRepository;
    use mockall::predicate::eq;

    fn create_input() -> CreateCalculation {
        CreateCalculation {
            car_request_id: Uuid::new_v4(),
            duration_months: 48,
            annual_mileage_km: 15_000,
            delivery_expected_at: None,
            notes: None,
            internal_notes: None,
            metadata: None,
            items: vec![],
        }
    }

    fn item_input(name: &str) -> CreateCalculationItem {
        CreateCalculationItem {
            item_type: CalculationItemType::Package,
            name: name.to_string(),
            description: None,
            catalog_color_id: None,
            price_impact: None,
            is_required: false,
            is_included: true,
            display_order: None,
            metadata: None,
        }
    }

    fn calculation_with_status(status: CalculationStatus) -> Calculation {
        let mut calculation = Calculation::new(create_input(), Uuid::new_v4());
        calculation.status = status;
        calculation
    }

    fn quoted_offer(calculation_id: Uuid) -> CalculationOffer {
        CalculationOffer::new(
            CreateOfferQuote {
                calculation_id,
                leasing_company_id: Uuid::new_v4(),
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
            },
            Uuid::new_v4(),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_duration() {
        let service = CalculationService::new(MockCalculationRepository::new());

        let mut input = create_input();
        input.duration_months = 0;

        let result = service.create_calculation(input, Uuid::new_v4()).await;
        assert!(matches!(result, Err(CalculationError::Validation(_))));
    }

    #[tokio::test]
    async fn test_create_defaults_item_display_order() {
        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_create()
            .returning(|calculation| Ok(calculation));

        let service = CalculationService::new(mock_repo);

        let mut input = create_input();
        let mut third = item_input("winter tires");
        third.display_order = Some(10);
        input.items = vec![item_input("metallic paint"), item_input("tow bar"), third];

        let created = service
            .create_calculation(input, Uuid::new_v4())
            .await
            .unwrap();

        assert_eq!(created.status, CalculationStatus::Draft);
        assert_eq!(created.version, 1);
        let orders: Vec<i32> = created.items.iter().map(|i| i.display_order).collect();
        assert_eq!(orders, vec![0, 1, 10]);
    }

    #[tokio::test]
    async fn test_submit_requires_draft() {
        let calculation = calculation_with_status(CalculationStatus::Submitted);
        let id = calculation.id;

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(calculation.clone())));

        let service = CalculationService::new(mock_repo);
        let result = service.submit_calculation(id).await;

        assert!(matches!(result, Err(CalculationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_submit_surfaces_lost_race_as_invariant_error() {
        let calculation = calculation_with_status(CalculationStatus::Draft);
        let id = calculation.id;

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));
        // Another writer took the transition between our read and our swap
        mock_repo.expect_transition().returning(|_, _, _| Ok(false));

        let service = CalculationService::new(mock_repo);
        let result = service.submit_calculation(id).await;

        assert!(matches!(result, Err(CalculationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_start_processing_requires_submitted() {
        let calculation = calculation_with_status(CalculationStatus::Draft);
        let id = calculation.id;

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));

        let service = CalculationService::new(mock_repo);
        let result = service.start_processing(id, Uuid::new_v4()).await;

        assert!(matches!(result, Err(CalculationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_complete_requires_quoted_offer() {
        let calculation = calculation_with_status(CalculationStatus::InProgress);
        let id = calculation.id;

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));

        let service = CalculationService::new(mock_repo);
        let result = service.complete_calculation(id).await;

        assert!(matches!(result, Err(CalculationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_complete_succeeds_with_quoted_offer() {
        let mut calculation = calculation_with_status(CalculationStatus::InProgress);
        let id = calculation.id;
        calculation.offers.push(quoted_offer(id));

        let mut completed = calculation.clone();
        completed.status = CalculationStatus::Completed;
        completed.completed_at = Some(Utc::now());

        let mut mock_repo = MockCalculationRepository::new();
        let mut in_progress = Some(calculation);
        mock_repo.expect_get_by_id().returning(move |_| {
            // First read sees InProgress, the re-read after the swap sees Completed
            Ok(Some(in_progress.take().unwrap_or_else(|| completed.clone())))
        });
        mock_repo
            .expect_transition()
            .withf(|_, expected, change| {
                *expected == CalculationStatus::InProgress
                    && change.to == CalculationStatus::Completed
                    && change.completed_at.is_some()
            })
            .returning(|_, _, _| Ok(true));

        let service = CalculationService::new(mock_repo);
        let result = service.complete_calculation(id).await.unwrap();

        assert_eq!(result.status, CalculationStatus::Completed);
        assert!(result.completed_at.is_some());
    }

    #[tokio::test]
    async fn test_update_rejected_when_completed() {
        let calculation = calculation_with_status(CalculationStatus::Completed);
        let id = calculation.id;

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));

        let service = CalculationService::new(mock_repo);
        let result = service
            .update_calculation(
                id,
                UpdateCalculation {
                    notes: Some("late note".to_string()),
                    ..Default::default()
                },
            )
            .await;

        assert!(matches!(result, Err(CalculationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_delete_rejected_when_completed() {
        let calculation = calculation_with_status(CalculationStatus::Completed);
        let id = calculation.id;

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));

        let service = CalculationService::new(mock_repo);
        let result = service.delete_calculation(id).await;

        assert!(matches!(result, Err(CalculationError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_update_unknown_calculation_is_not_found() {
        let mut mock_repo = MockCalculationRepository::new();
        mock_repo.expect_get_by_id().returning(|_| Ok(None));

        let service = CalculationService::new(mock_repo);
        let result = service
            .update_calculation(Uuid::new_v4(), UpdateCalculation::default())
            .await;

        assert!(matches!(result, Err(CalculationError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_add_offer_quote_rejects_duplicate_company() {
        let calculation = calculation_with_status(CalculationStatus::InProgress);
        let id = calculation.id;
        let company = Uuid::new_v4();
        let existing = quoted_offer(id);

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));
        mock_repo
            .expect_find_offer_by_company()
            .with(eq(id), eq(company))
            .returning(move |_, _| Ok(Some(existing.clone())));

        let service = CalculationService::new(mock_repo);
        let result = service
            .add_offer_quote(
                CreateOfferQuote {
                    calculation_id: id,
                    leasing_company_id: company,
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
                },
                Uuid::new_v4(),
            )
            .await;

        assert!(matches!(
            result,
            Err(CalculationError::DuplicateOffer { .. })
        ));
    }

    #[tokio::test]
    async fn test_add_offer_quote_creates_quoted_offer() {
        let calculation = calculation_with_status(CalculationStatus::InProgress);
        let id = calculation.id;
        let quoted_by = Uuid::new_v4();

        let mut mock_repo = MockCalculationRepository::new();
        mock_repo
            .expect_get_by_id()
            .returning(move |_| Ok(Some(calculation.clone())));
        mock_repo
            .expect_find_offer_by_company()
            .returning(|_, _| Ok(None));
        mock_repo.expect_insert_offer().returning(|offer| Ok(offer));

        let service = CalculationService::new(mock_repo);
        let offer = service
            .add_offer_quote(
                CreateOfferQuote {
                    calculation_id: id,
                    leasing_company_id: Uuid::new_v4(),
                    monthly_payment: Some(rust_decimal::Decimal::new(5000, 0)),
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
                },
                quoted_by,
            )
            .await
            .unwrap();

        assert_eq!(offer.status, OfferStatus::Quoted);
        assert_eq!(offer.quoted_by_id, Some(quoted_by));
        assert!(offer.quoted_at.is_some());
    }

    #[tokio::test]
    async fn test_update_offer_quote_unknown_offer() {
        let mut mock_repo = MockCalculationRepository::new();
        mock_repo.expect_get_offer().returning(|_| Ok(None));

        let service = CalculationService::new(mock_repo);
        let result = service
            .update_offer_quote(Uuid::new_v4(), UpdateOfferQuote::default())
            .await;

        assert!(matches!(result, Err(CalculationError::OfferNotFound(_))));
    }
}
