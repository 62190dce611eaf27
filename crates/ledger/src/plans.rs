//! Subscription plan catalog.

use database::PlanType;
use serde::Serialize;

/// A purchasable plan.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub id: PlanType,
    pub name: &'static str,
    /// Price in minor currency units.
    pub price_minor: i64,
    pub features: Vec<&'static str>,
    /// Recurring plan code at the payment gateway, if one is configured.
    pub plan_code: Option<String>,
}

impl Plan {
    /// Price in major currency units.
    pub fn price(&self) -> f64 {
        self.price_minor as f64 / 100.0
    }

    pub fn is_free(&self) -> bool {
        self.price_minor == 0
    }
}

/// The fixed set of plans, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self::with_plan_codes(None, None)
    }
}

impl PlanCatalog {
    /// Build the catalog with the gateway codes for the paid plans.
    pub fn with_plan_codes(basic: Option<String>, pro: Option<String>) -> Self {
        let plans = vec![
            Plan {
                id: PlanType::Free,
                name: "Free",
                price_minor: 0,
                features: vec![
                    "Basic concept learning",
                    "Limited analogies per day",
                    "Basic progress tracking",
                    "Community access",
                ],
                plan_code: None,
            },
            Plan {
                id: PlanType::Basic,
                name: "Basic",
                price_minor: 999,
                features: vec![
                    "Unlimited concept learning",
                    "Unlimited analogies",
                    "Advanced progress tracking",
                    "Priority support",
                    "Custom learning paths",
                    "Offline access",
                ],
                plan_code: basic,
            },
            Plan {
                id: PlanType::Pro,
                name: "Pro",
                price_minor: 1999,
                features: vec![
                    "Everything in Basic",
                    "AI-powered learning insights",
                    "Personalized learning recommendations",
                    "Advanced analytics",
                    "Priority support",
                    "Early access to new features",
                ],
                plan_code: pro,
            },
        ];

        Self { plans }
    }

    /// All plans.
    pub fn all(&self) -> &[Plan] {
        &self.plans
    }

    /// The plan for a tier.
    pub fn get(&self, plan: PlanType) -> &Plan {
        self.plans
            .iter()
            .find(|p| p.id == plan)
            .unwrap_or(&self.plans[0])
    }

    /// The plan for an id string; unknown ids resolve to the free plan.
    pub fn from_id(&self, id: &str) -> &Plan {
        self.get(PlanType::from_id(id))
    }

    /// The plan with the given gateway code; unknown codes resolve to the free plan.
    pub fn by_plan_code(&self, code: &str) -> &Plan {
        self.plans
            .iter()
            .find(|p| p.plan_code.as_deref() == Some(code))
            .unwrap_or(&self.plans[0])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prices_and_fallback() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.all().len(), 3);
        assert_eq!(catalog.from_id("basic").price_minor, 999);
        assert_eq!(catalog.from_id("PRO").price(), 19.99);
        assert_eq!(catalog.from_id("platinum").id, PlanType::Free);
        assert!(catalog.from_id("").is_free());
    }

    #[test]
    fn test_lookup_by_plan_code() {
        let catalog =
            PlanCatalog::with_plan_codes(Some("PLN_basic".to_string()), Some("PLN_pro".to_string()));
        assert_eq!(catalog.by_plan_code("PLN_pro").id, PlanType::Pro);
        assert_eq!(catalog.by_plan_code("PLN_basic").id, PlanType::Basic);
        assert_eq!(catalog.by_plan_code("PLN_other").id, PlanType::Free);

        let catalog = PlanCatalog::default();
        assert_eq!(catalog.by_plan_code("PLN_pro").id, PlanType::Free);
    }

    #[test]
    fn test_serialized_shape() {
        let catalog = PlanCatalog::default();
        let json = serde_json::to_value(catalog.get(PlanType::Basic)).unwrap();
        assert_eq!(json["id"], "basic");
        assert_eq!(json["priceMinor"], 999);
        assert_eq!(json["features"][0], "Unlimited concept learning");
        assert!(json["planCode"].is_null());
    }
}
