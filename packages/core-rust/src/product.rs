//! The product upload workflow: form template and six-step wizard.

use regex::Regex;

use crate::form::FormState;
use crate::path::{FieldPath, PathParseError, PathSegment};
use crate::types::Value;
use crate::validation::{FieldErrors, FieldRule, RuleSet, StepValidator};
use crate::wizard::{StepWizard, WizardError, WizardStep};

/// Upper bound on product images.
pub const MAX_IMAGES: usize = 10;

/// The product wizard could not be built.
#[derive(Debug, thiserror::Error)]
pub enum ProductWizardError {
    /// A rule path is malformed.
    #[error(transparent)]
    Path(#[from] PathParseError),
    /// A rule pattern does not compile.
    #[error(transparent)]
    Pattern(#[from] regex::Error),
    /// The steps do not fit the template.
    #[error(transparent)]
    Wizard(#[from] WizardError),
}

/// Blank product form.
#[must_use]
pub fn template() -> FormState {
    let empty = || Value::from("");
    let fields = [
        ("name", empty()),
        ("sku", empty()),
        ("brand", empty()),
        ("category", empty()),
        ("subcategory", empty()),
        ("description", empty()),
        ("status", Value::from("draft")),
        ("tags", Value::list([])),
        (
            "pricing",
            Value::map([
                ("basePrice", empty()),
                ("salePrice", empty()),
                ("costPrice", empty()),
                ("currency", Value::from("USD")),
                ("taxable", Value::from(true)),
            ]),
        ),
        (
            "inventory",
            Value::map([
                ("quantity", empty()),
                ("lowStockThreshold", Value::from(5_i64)),
                ("trackInventory", Value::from(true)),
                ("allowBackorder", Value::from(false)),
            ]),
        ),
        (
            "media",
            Value::map([("images", Value::list([])), ("video", empty())]),
        ),
        (
            "shipping",
            Value::map([
                ("weight", empty()),
                (
                    "dimensions",
                    Value::map([("length", empty()), ("width", empty()), ("height", empty())]),
                ),
                ("freeShipping", Value::from(false)),
            ]),
        ),
        (
            "seo",
            Value::map([("metaTitle", empty()), ("metaDescription", empty()), ("slug", empty())]),
        ),
    ];
    FormState::new(fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect())
}

/// Path of the image list (`media.images`).
#[must_use]
pub fn images_path() -> FieldPath {
    FieldPath::key("media").child(PathSegment::Key("images".to_string()))
}

/// An image entry as stored in the form.
#[must_use]
pub fn image(url: &str, alt: &str) -> Value {
    Value::map([("url", Value::from(url)), ("alt", Value::from(alt))])
}

/// Pricing rules plus the sale-below-base cross check.
struct PricingRules {
    rules: RuleSet,
    base: FieldPath,
    sale: FieldPath,
}

impl StepValidator for PricingRules {
    fn validate(&self, form: &FormState) -> FieldErrors {
        let mut errors = self.rules.validate(form);
        let root = form.to_value();
        let base = self.base.lookup(&root).and_then(Value::as_f64);
        let sale = self.sale.lookup(&root).and_then(Value::as_f64);
        if let (Some(base), Some(sale)) = (base, sale) {
            if sale >= base {
                errors.insert(self.sale.to_string(), "Sale price must be lower than the base price");
            }
        }
        errors
    }

    fn paths(&self) -> Vec<&FieldPath> {
        self.rules.paths()
    }
}

fn basic_information() -> Result<RuleSet, ProductWizardError> {
    let sku = Regex::new(r"^[A-Za-z0-9][A-Za-z0-9-]*$")?;
    Ok(RuleSet::new(vec![
        FieldRule::new("name")?
            .required("Product name is required")
            .min_length(3, "Product name must be at least 3 characters")
            .max_length(120, "Product name must be at most 120 characters"),
        FieldRule::new("sku")?
            .required("SKU is required")
            .pattern(sku, "SKU may only contain letters, numbers and dashes"),
        FieldRule::new("category")?.required("Category is required"),
        FieldRule::new("description")?.max_length(2000, "Description must be at most 2000 characters"),
    ]))
}

fn pricing() -> Result<PricingRules, ProductWizardError> {
    let rules = RuleSet::new(vec![
        FieldRule::new("pricing.basePrice")?
            .required("Base price is required")
            .min(0.01, "Base price must be greater than 0"),
        FieldRule::new("pricing.salePrice")?.min(0.0, "Sale price cannot be negative"),
        FieldRule::new("pricing.costPrice")?.min(0.0, "Cost price cannot be negative"),
    ]);
    Ok(PricingRules {
        rules,
        base: FieldPath::parse("pricing.basePrice")?,
        sale: FieldPath::parse("pricing.salePrice")?,
    })
}

fn inventory() -> Result<RuleSet, ProductWizardError> {
    Ok(RuleSet::new(vec![
        FieldRule::new("inventory.quantity")?
            .required("Stock quantity is required")
            .min(0.0, "Stock quantity cannot be negative"),
        FieldRule::new("inventory.lowStockThreshold")?.min(0.0, "Threshold cannot be negative"),
    ]))
}

fn media() -> Result<RuleSet, ProductWizardError> {
    Ok(RuleSet::new(vec![FieldRule::new("media.images")?
        .non_empty_list("At least one product image is required")
        .max_length(MAX_IMAGES, "A product can have at most 10 images")]))
}

fn shipping() -> Result<RuleSet, ProductWizardError> {
    let mut rules = vec![FieldRule::new("shipping.weight")?
        .required("Weight is required")
        .min(0.0, "Weight cannot be negative")];
    for side in ["length", "width", "height"] {
        rules.push(
            FieldRule::new(&format!("shipping.dimensions.{side}"))?
                .min(0.0, format!("Dimension {side} cannot be negative")),
        );
    }
    Ok(RuleSet::new(rules))
}

fn seo() -> Result<RuleSet, ProductWizardError> {
    let slug = Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$")?;
    Ok(RuleSet::new(vec![
        FieldRule::new("seo.metaTitle")?.max_length(60, "Meta title must be at most 60 characters"),
        FieldRule::new("seo.metaDescription")?
            .max_length(160, "Meta description must be at most 160 characters"),
        FieldRule::new("seo.slug")?.pattern(slug, "Slug may only contain lowercase letters, numbers and dashes"),
    ]))
}

/// The six-step product creation wizard over [`template`].
///
/// # Errors
///
/// Only if the built-in rules are inconsistent with the template.
pub fn wizard() -> Result<StepWizard, ProductWizardError> {
    let steps = vec![
        WizardStep::new("Basic information", basic_information()?),
        WizardStep::new("Pricing", pricing()?),
        WizardStep::new("Inventory", inventory()?),
        WizardStep::new("Media", media()?),
        WizardStep::new("Shipping", shipping()?),
        WizardStep::new("SEO & review", seo()?),
    ];
    Ok(StepWizard::new(template(), steps)?)
}
