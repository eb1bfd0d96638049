//! Donation model
//!
//! Donations have no public URL and therefore no slug. Amounts are integer
//! minor units.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::campaign::{default_currency, require_currency};
use super::entity::require_text;
use super::{Entity, EntityInput, Reference, RowAccess, SqlValue, ValidationError};

status_enum!(
    DonationStatus {
        Pending => "pending",
        Completed => "completed",
        Failed => "failed",
        Refunded => "refunded",
    }
);

status_enum!(
    /// How the donor paid; the payment itself happens outside this service
    PaymentMethod {
        Stripe => "stripe",
        Paypal => "paypal",
        Flutterwave => "flutterwave",
        Offline => "offline",
    }
);

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Donation {
    pub id: i64,
    pub donor_name: String,
    pub donor_email: String,
    pub amount_cents: i64,
    pub currency: String,
    pub campaign_id: Option<i64>,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub message: Option<String>,
    pub is_anonymous: bool,
    pub category_id: Option<i64>,
    pub status: DonationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DonationInput {
    pub donor_name: String,
    pub donor_email: String,
    pub amount_cents: i64,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub campaign_id: Option<i64>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub payment_reference: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub is_anonymous: bool,
    #[serde(default)]
    pub category_id: Option<i64>,
    #[serde(default)]
    pub status: DonationStatus,
}

impl EntityInput for DonationInput {
    fn validate(&self) -> Result<(), ValidationError> {
        require_text("Donor name", &self.donor_name)?;
        let email = self.donor_email.trim();
        if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
            return Err(ValidationError::new(format!(
                "Invalid donor email '{}'",
                self.donor_email
            )));
        }
        if self.amount_cents <= 0 {
            return Err(ValidationError::new("Donation amount must be greater than zero"));
        }
        require_currency(&self.currency)
    }

    fn title(&self) -> &str {
        &self.donor_name
    }

    fn category_id(&self) -> Option<i64> {
        self.category_id
    }

    fn references(&self) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self.category_id.map(Reference::category).into_iter().collect();
        if let Some(id) = self.campaign_id {
            refs.push(Reference {
                table: "campaigns",
                label: "Campaign",
                id,
            });
        }
        refs
    }
}

impl Entity for Donation {
    type Input = DonationInput;

    const TABLE: &'static str = "donations";
    const LABEL: &'static str = "Donation";
    const COLUMNS: &'static [&'static str] = &[
        "id",
        "donor_name",
        "donor_email",
        "amount_cents",
        "currency",
        "campaign_id",
        "payment_method",
        "payment_reference",
        "message",
        "is_anonymous",
        "category_id",
        "status",
        "created_at",
        "updated_at",
    ];
    const WRITE_COLUMNS: &'static [&'static str] = &[
        "donor_name",
        "donor_email",
        "amount_cents",
        "currency",
        "campaign_id",
        "payment_method",
        "payment_reference",
        "message",
        "is_anonymous",
        "category_id",
        "status",
    ];
    const FILTER_COLUMNS: &'static [&'static str] = &["campaign_id", "currency", "donor_email"];
    const HAS_SLUG: bool = false;
    const TYPE_COLUMN: Option<&'static str> = Some("payment_method");
    const STATUSES: &'static [&'static str] = DonationStatus::NAMES;

    fn from_row(row: &dyn RowAccess) -> anyhow::Result<Self> {
        Ok(Self {
            id: row.int("id")?,
            donor_name: row.text("donor_name")?,
            donor_email: row.text("donor_email")?,
            amount_cents: row.int("amount_cents")?,
            currency: row.text("currency")?,
            campaign_id: row.opt_int("campaign_id")?,
            payment_method: row.text("payment_method")?.parse()?,
            payment_reference: row.opt_text("payment_reference")?,
            message: row.opt_text("message")?,
            is_anonymous: row.flag("is_anonymous")?,
            category_id: row.opt_int("category_id")?,
            status: row.text("status")?.parse()?,
            created_at: row.timestamp("created_at")?,
            updated_at: row.timestamp("updated_at")?,
        })
    }

    fn write_values(input: &DonationInput) -> Vec<SqlValue> {
        vec![
            input.donor_name.trim().into(),
            input.donor_email.trim().to_lowercase().into(),
            input.amount_cents.into(),
            input.currency.to_uppercase().into(),
            input.campaign_id.into(),
            input.payment_method.as_str().into(),
            input.payment_reference.clone().into(),
            input.message.clone().into(),
            input.is_anonymous.into(),
            input.category_id.into(),
            input.status.as_str().into(),
        ]
    }

    fn id(&self) -> i64 {
        self.id
    }

    fn status_str(&self) -> &'static str {
        self.status.as_str()
    }
}
