use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{DeriveActiveEnum, EnumIter};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;
use validator::Validate;

/// Lifecycle status of a calculation
///
/// `Rejected` and `Cancelled` are reachable only through future transitions;
/// no operation produces them today.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "calculation_status")]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalculationStatus {
    /// Being drafted by the requester
    #[default]
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Handed over for processing
    #[sea_orm(string_value = "submitted")]
    Submitted,
    /// An agent is collecting offers
    #[sea_orm(string_value = "in_progress")]
    InProgress,
    /// Terminal: the calculation is immutable and undeletable
    #[sea_orm(string_value = "completed")]
    Completed,
    #[sea_orm(string_value = "rejected")]
    Rejected,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

/// Kind of configuration line attached to a calculation
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "calculation_item_type"
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum CalculationItemType {
    #[sea_orm(string_value = "exterior_color")]
    ExteriorColor,
    #[sea_orm(string_value = "interior_color")]
    InteriorColor,
    #[sea_orm(string_value = "package")]
    Package,
    #[sea_orm(string_value = "accessory")]
    Accessory,
    #[sea_orm(string_value = "service")]
    Service,
    #[sea_orm(string_value = "other")]
    Other,
}

/// Status of a leasing company offer
///
/// `Pending` is the declared default but `add_offer_quote` creates offers
/// directly in `Quoted`; `Accepted`/`Rejected` await future transitions.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    Default,
    DeriveActiveEnum,
    EnumIter,
)]
#[sea_orm(
    rs_type = "String",
    db_type = "Enum",
    enum_name = "calculation_offer_status"
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OfferStatus {
    #[default]
    #[sea_orm(string_value = "pending")]
    Pending,
    #[sea_orm(string_value = "quoted")]
    Quoted,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "rejected")]
    Rejected,
}

/// A pricing-and-configuration request tied to one car request
///
/// Reads always return the calculation hydrated with its items and offers.
/// Car request, requester, assignee and leasing companies are external
/// aggregates referenced by id only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Calculation {
    /// Unique identifier
    pub id: Uuid,
    /// Car request this calculation prices
    pub car_request_id: Uuid,
    /// User who opened the calculation
    pub requested_by_id: Uuid,
    /// Agent processing the calculation, set by `start_processing`
    pub assigned_to_id: Option<Uuid>,
    /// Bumped by every status transition; the compare-and-swap witness
    pub version: i32,
    pub status: CalculationStatus,
    pub duration_months: i32,
    pub annual_mileage_km: i32,
    pub delivery_expected_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    /// Staff-only notes, never shown to the customer
    pub internal_notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// Set exactly once, by `submit_calculation`
    pub submitted_at: Option<DateTime<Utc>>,
    /// Set exactly once, by `complete_calculation`
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Configuration lines, ordered by display_order
    pub items: Vec<CalculationItem>,
    /// Competing leasing company offers, oldest first
    pub offers: Vec<CalculationOffer>,
}

/// A priced configuration line (color/package/accessory/service)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationItem {
    pub id: Uuid,
    pub calculation_id: Uuid,
    pub item_type: CalculationItemType,
    pub name: String,
    pub description: Option<String>,
    /// Optional reference to a catalog color (external aggregate)
    pub catalog_color_id: Option<Uuid>,
    pub price_impact: Option<Decimal>,
    pub is_required: bool,
    pub is_included: bool,
    pub display_order: i32,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// A financing quote from one leasing company against one calculation
///
/// The `(calculation_id, leasing_company_id)` pair is unique.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationOffer {
    pub id: Uuid,
    pub calculation_id: Uuid,
    pub leasing_company_id: Uuid,
    pub status: OfferStatus,
    pub monthly_payment: Option<Decimal>,
    pub down_payment: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub admin_fee: Option<Decimal>,
    /// Inclusion flags: `None` means unspecified, not "not included"
    pub includes_service: Option<bool>,
    pub includes_winter_tires: Option<bool>,
    pub includes_gap: Option<bool>,
    pub includes_assistance: Option<bool>,
    pub terms_and_conditions: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    /// User who recorded the quote
    pub quoted_by_id: Option<Uuid>,
    pub quoted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a calculation with its initial items
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCalculation {
    pub car_request_id: Uuid,
    #[validate(range(min = 1, message = "duration must be at least one month"))]
    pub duration_months: i32,
    #[validate(range(min = 1, message = "annual mileage must be positive"))]
    pub annual_mileage_km: i32,
    pub delivery_expected_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub internal_notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    #[serde(default)]
    #[validate(nested)]
    pub items: Vec<CreateCalculationItem>,
}

/// Input for one configuration line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCalculationItem {
    pub item_type: CalculationItemType,
    #[validate(length(min = 1, message = "item name must not be empty"))]
    pub name: String,
    pub description: Option<String>,
    pub catalog_color_id: Option<Uuid>,
    pub price_impact: Option<Decimal>,
    #[serde(default)]
    pub is_required: bool,
    #[serde(default = "default_true")]
    pub is_included: bool,
    /// Defaults to the item's position in the input array
    pub display_order: Option<i32>,
    pub metadata: Option<serde_json::Value>,
}

/// Patch input for a calculation
///
/// Absent fields are left untouched. When `items` is present the existing
/// item set is discarded and replaced wholesale.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdateCalculation {
    #[validate(range(min = 1, message = "duration must be at least one month"))]
    pub duration_months: Option<i32>,
    #[validate(range(min = 1, message = "annual mileage must be positive"))]
    pub annual_mileage_km: Option<i32>,
    pub delivery_expected_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub internal_notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
    #[validate(nested)]
    pub items: Option<Vec<CreateCalculationItem>>,
}

/// Input for recording a leasing company quote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateOfferQuote {
    pub calculation_id: Uuid,
    pub leasing_company_id: Uuid,
    pub monthly_payment: Option<Decimal>,
    pub down_payment: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub admin_fee: Option<Decimal>,
    pub includes_service: Option<bool>,
    pub includes_winter_tires: Option<bool>,
    pub includes_gap: Option<bool>,
    pub includes_assistance: Option<bool>,
    pub terms_and_conditions: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// Partial merge input for an existing offer; status is never touched here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateOfferQuote {
    pub monthly_payment: Option<Decimal>,
    pub down_payment: Option<Decimal>,
    pub total_price: Option<Decimal>,
    pub interest_rate: Option<Decimal>,
    pub admin_fee: Option<Decimal>,
    pub includes_service: Option<bool>,
    pub includes_winter_tires: Option<bool>,
    pub includes_gap: Option<bool>,
    pub includes_assistance: Option<bool>,
    pub terms_and_conditions: Option<String>,
    pub valid_until: Option<NaiveDate>,
    pub notes: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

/// A guarded status change applied with compare-and-swap semantics:
/// the update only lands if the stored status still equals the status
/// the caller observed.
#[derive(Debug, Clone, Default)]
pub struct StatusTransition {
    pub to: CalculationStatus,
    pub assigned_to_id: Option<Uuid>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

fn default_true() -> bool {
    true
}

impl Calculation {
    /// Create a new draft calculation from the input DTO
    pub fn new(input: CreateCalculation, requested_by: Uuid) -> Self {
        let id = Uuid::now_v7();
        let now = Utc::now();
        let items = input
            .items
            .into_iter()
            .enumerate()
            .map(|(position, item)| CalculationItem::new(id, position, item))
            .collect();

        Self {
            id,
            car_request_id: input.car_request_id,
            requested_by_id: requested_by,
            assigned_to_id: None,
            version: 1,
            status: CalculationStatus::Draft,
            duration_months: input.duration_months,
            annual_mileage_km: input.annual_mileage_km,
            delivery_expected_at: input.delivery_expected_at,
            notes: input.notes,
            internal_notes: input.internal_notes,
            metadata: input.metadata,
            submitted_at: None,
            completed_at: None,
            created_at: now,
            updated_at: now,
            items,
            offers: Vec::new(),
        }
    }

    /// Apply a patch: present scalar fields overwrite, absent fields stay.
    /// A present `items` list replaces the whole item set.
    pub fn apply_update(&mut self, update: UpdateCalculation) {
        if let Some(duration_months) = update.duration_months {
            self.duration_months = duration_months;
        }
        if let Some(annual_mileage_km) = update.annual_mileage_km {
            self.annual_mileage_km = annual_mileage_km;
        }
        if let Some(delivery_expected_at) = update.delivery_expected_at {
            self.delivery_expected_at = Some(delivery_expected_at);
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(internal_notes) = update.internal_notes {
            self.internal_notes = Some(internal_notes);
        }
        if let Some(metadata) = update.metadata {
            self.metadata = Some(metadata);
        }
        if let Some(items) = update.items {
            self.items = items
                .into_iter()
                .enumerate()
                .map(|(position, item)| CalculationItem::new(self.id, position, item))
                .collect();
        }
        self.updated_at = Utc::now();
    }

    /// Apply a status transition's effects (the caller has already verified
    /// the expected current status)
    pub fn apply_transition(&mut self, change: &StatusTransition) {
        self.status = change.to;
        if let Some(assigned_to_id) = change.assigned_to_id {
            self.assigned_to_id = Some(assigned_to_id);
        }
        if let Some(submitted_at) = change.submitted_at {
            self.submitted_at = Some(submitted_at);
        }
        if let Some(completed_at) = change.completed_at {
            self.completed_at = Some(completed_at);
        }
        self.version += 1;
        self.updated_at = Utc::now();
    }

    /// Whether at least one offer has been quoted
    pub fn has_quoted_offer(&self) -> bool {
        self.offers
            .iter()
            .any(|offer| offer.status == OfferStatus::Quoted)
    }
}

impl CalculationItem {
    /// Create an item for a calculation; `position` supplies the default
    /// display order
    pub fn new(calculation_id: Uuid, position: usize, input: CreateCalculationItem) -> Self {
        Self {
            id: Uuid::now_v7(),
            calculation_id,
            item_type: input.item_type,
            name: input.name,
            description: input.description,
            catalog_color_id: input.catalog_color_id,
            price_impact: input.price_impact,
            is_required: input.is_required,
            is_included: input.is_included,
            display_order: input.display_order.unwrap_or(position as i32),
            metadata: input.metadata,
            created_at: Utc::now(),
        }
    }
}

impl CalculationOffer {
    /// Record a quote: offers are born `Quoted`, stamped with the quoting
    /// user and time
    pub fn new(input: CreateOfferQuote, quoted_by: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            calculation_id: input.calculation_id,
            leasing_company_id: input.leasing_company_id,
            status: OfferStatus::Quoted,
            monthly_payment: input.monthly_payment,
            down_payment: input.down_payment,
            total_price: input.total_price,
            interest_rate: input.interest_rate,
            admin_fee: input.admin_fee,
            includes_service: input.includes_service,
            includes_winter_tires: input.includes_winter_tires,
            includes_gap: input.includes_gap,
            includes_assistance: input.includes_assistance,
            terms_and_conditions: input.terms_and_conditions,
            valid_until: input.valid_until,
            notes: input.notes,
            metadata: input.metadata,
            quoted_by_id: Some(quoted_by),
            quoted_at: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    /// Merge the supplied fields over the offer; absent fields stay untouched
    pub fn apply_update(&mut self, update: UpdateOfferQuote) {
        if let Some(monthly_payment) = update.monthly_payment {
            self.monthly_payment = Some(monthly_payment);
        }
        if let Some(down_payment) = update.down_payment {
            self.down_payment = Some(down_payment);
        }
        if let Some(total_price) = update.total_price {
            self.total_price = Some(total_price);
        }
        if let Some(interest_rate) = update.interest_rate {
            self.interest_rate = Some(interest_rate);
        }
        if let Some(admin_fee) = update.admin_fee {
            self.admin_fee = Some(admin_fee);
        }
        if let Some(includes_service) = update.includes_service {
            self.includes_service = Some(includes_service);
        }
        if let Some(includes_winter_tires) = update.includes_winter_tires {
            self.includes_winter_tires = Some(includes_winter_tires);
        }
        if let Some(includes_gap) = update.includes_gap {
            self.includes_gap = Some(includes_gap);
        }
        if let Some(includes_assistance) = update.includes_assistance {
            self.includes_assistance = Some(includes_assistance);
        }
        if let Some(terms_and_conditions) = update.terms_and_conditions {
            self.terms_and_conditions = Some(terms_and_conditions);
        }
        if let Some(valid_until) = update.valid_until {
            self.valid_until = Some(valid_until);
        }
        if let Some(notes) = update.notes {
            self.notes = Some(notes);
        }
        if let Some(metadata) = update.metadata {
            self.metadata = Some(metadata);
        }
        self.updated_at = Utc::now();
    }
}
