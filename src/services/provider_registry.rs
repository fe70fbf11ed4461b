use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::services::errors::RegistryError;

/// Minimal structural validator standing in for the dynamic, runtime-inferred schemas of the
/// upstream system: each provider declares the field names it requires on input and on output,
/// and validation only checks presence. Unknown fields are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RequiredFieldsSchema {
    pub required: Vec<String>,
}

impl RequiredFieldsSchema {
    pub fn new(required: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self { required: required.into_iter().map(Into::into).collect() }
    }

    /// Returns `Ok(())` or a human-readable `"body.<field>: required"` message list.
    pub fn validate(&self, value: &serde_json::Value) -> Result<(), String> {
        let obj = value.as_object();
        let mut issues = Vec::new();

        for field in &self.required {
            let present = obj.and_then(|o| o.get(field)).is_some_and(|v| !v.is_null());
            if !present {
                issues.push(format!("body.{field}: required"));
            }
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(issues.join("; "))
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderDefinition {
    pub slug: String,
    pub display_name: String,
    pub supported_fields: BTreeSet<String>,
    pub credit_cost_per_call: i64,
    pub input_schema: RequiredFieldsSchema,
    pub output_schema: RequiredFieldsSchema,
    pub required_credential_type: String,
}

/// Per-field, ordered provider preference used when no waterfall is configured: providers
/// supporting a field are tried cheapest-first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WaterfallConfig {
    pub fields: BTreeMap<String, FieldWaterfall>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldWaterfall {
    pub providers: Vec<String>,
}

/// Process-wide, read-only catalog of provider capabilities. Constructed once at boot.
#[derive(Debug, Clone)]
pub struct ProviderRegistry {
    providers: BTreeMap<String, ProviderDefinition>,
}

impl ProviderRegistry {
    pub fn new(providers: Vec<ProviderDefinition>) -> Result<Self, RegistryError> {
        let mut by_slug = BTreeMap::new();

        for provider in providers {
            if provider.credit_cost_per_call <= 0 {
                return Err(RegistryError::NonPositiveCost(provider.slug));
            }
            let dup = provider.slug.clone();
            if by_slug.insert(dup.clone(), provider).is_some() {
                return Err(RegistryError::DuplicateSlug(dup));
            }
        }

        Ok(Self { providers: by_slug })
    }

    /// The default catalog shipped with the service: apollo, clearbit, hunter.
    pub fn default_registry() -> Self {
        Self::new(vec![
            ProviderDefinition {
                slug: "apollo".to_string(),
                display_name: "Apollo.io".to_string(),
                supported_fields: ["email", "phone", "company_info", "job_title"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                credit_cost_per_call: 2,
                input_schema: RequiredFieldsSchema::new(["email"]),
                output_schema: RequiredFieldsSchema::new([] as [&str; 0]),
                required_credential_type: "apollo".to_string(),
            },
            ProviderDefinition {
                slug: "clearbit".to_string(),
                display_name: "Clearbit".to_string(),
                supported_fields: ["email", "company_info", "social_profiles"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
                credit_cost_per_call: 3,
                input_schema: RequiredFieldsSchema::new(["email"]),
                output_schema: RequiredFieldsSchema::new([] as [&str; 0]),
                required_credential_type: "clearbit".to_string(),
            },
            ProviderDefinition {
                slug: "hunter".to_string(),
                display_name: "Hunter.io".to_string(),
                supported_fields: ["email"].into_iter().map(String::from).collect(),
                credit_cost_per_call: 1,
                input_schema: RequiredFieldsSchema::new(["email"]),
                output_schema: RequiredFieldsSchema::new([] as [&str; 0]),
                required_credential_type: "hunter".to_string(),
            },
        ])
        .expect("default provider catalog is well-formed")
    }

    pub fn get_provider(&self, slug: &str) -> Option<&ProviderDefinition> {
        self.providers.get(slug)
    }

    pub fn get_all_providers(&self) -> Vec<&ProviderDefinition> {
        self.providers.values().collect()
    }

    pub fn get_providers_for_field(&self, field: &str) -> Vec<&ProviderDefinition> {
        self.providers
            .values()
            .filter(|p| p.supported_fields.contains(field))
            .collect()
    }

    /// Cheapest-first ordering of providers supporting `field`.
    pub fn get_providers_for_field_by_cost(&self, field: &str) -> Vec<&ProviderDefinition> {
        let mut providers = self.get_providers_for_field(field);
        providers.sort_by_key(|p| p.credit_cost_per_call);
        providers
    }

    pub fn validate_providers(&self, slugs: &[String]) -> Result<(), RegistryError> {
        let unknown: Vec<&str> = slugs
            .iter()
            .filter(|slug| !self.providers.contains_key(slug.as_str()))
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(RegistryError::UnknownSlugs(unknown.join(", ")))
        }
    }

    /// Resolves the ordered provider list consumed by the workflow for each field: a configured
    /// waterfall wins; otherwise all supporting providers, cheapest first.
    pub fn resolve_field_providers(
        &self,
        fields: &[String],
        waterfall_config: Option<&WaterfallConfig>,
    ) -> Result<BTreeMap<String, Vec<String>>, RegistryError> {
        let mut resolved = BTreeMap::new();

        for field in fields {
            let providers = if let Some(cfg) = waterfall_config.and_then(|c| c.fields.get(field)) {
                self.validate_providers(&cfg.providers)?;
                cfg.providers.clone()
            } else {
                self.get_providers_for_field_by_cost(field)
                    .into_iter()
                    .map(|p| p.slug.clone())
                    .collect()
            };

            resolved.insert(field.clone(), providers);
        }

        Ok(resolved)
    }

    /// Optimistic per-record-set estimate: waterfall head's cost (or cheapest supporting
    /// provider's cost) per field, multiplied by record count, summed across fields. A field
    /// with no providers contributes zero.
    pub fn estimate_credits(
        &self,
        records: i64,
        fields: &[String],
        waterfall_config: Option<&WaterfallConfig>,
    ) -> Result<i64, RegistryError> {
        let mut total = 0i64;

        for field in fields {
            let cost = if let Some(cfg) = waterfall_config.and_then(|c| c.fields.get(field)) {
                self.validate_providers(&cfg.providers)?;
                cfg.providers
                    .first()
                    .and_then(|slug| self.get_provider(slug))
                    .map(|p| p.credit_cost_per_call)
                    .unwrap_or(0)
            } else {
                self.get_providers_for_field_by_cost(field)
                    .first()
                    .map(|p| p.credit_cost_per_call)
                    .unwrap_or(0)
            };

            total += cost * records;
        }

        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_duplicate_slugs() {
        let def = ProviderDefinition {
            slug: "hunter".to_string(),
            display_name: "Hunter".to_string(),
            supported_fields: BTreeSet::new(),
            credit_cost_per_call: 1,
            input_schema: RequiredFieldsSchema::default(),
            output_schema: RequiredFieldsSchema::default(),
            required_credential_type: "hunter".to_string(),
        };

        let err = ProviderRegistry::new(vec![def.clone(), def]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateSlug(_)));
    }

    #[test]
    fn rejects_non_positive_cost() {
        let def = ProviderDefinition {
            slug: "hunter".to_string(),
            display_name: "Hunter".to_string(),
            supported_fields: BTreeSet::new(),
            credit_cost_per_call: 0,
            input_schema: RequiredFieldsSchema::default(),
            output_schema: RequiredFieldsSchema::default(),
            required_credential_type: "hunter".to_string(),
        };

        let err = ProviderRegistry::new(vec![def]).unwrap_err();
        assert!(matches!(err, RegistryError::NonPositiveCost(_)));
    }

    #[test]
    fn estimate_uses_cheapest_without_waterfall() {
        let registry = ProviderRegistry::default_registry();
        let estimate = registry
            .estimate_credits(10, &["email".to_string()], None)
            .unwrap();
        assert_eq!(estimate, 10); // hunter, cost 1, x10 records
    }

    #[test]
    fn estimate_uses_waterfall_head() {
        let registry = ProviderRegistry::default_registry();
        let mut fields = BTreeMap::new();
        fields.insert(
            "email".to_string(),
            FieldWaterfall { providers: vec!["apollo".to_string(), "hunter".to_string()] },
        );
        let waterfall = WaterfallConfig { fields };

        let estimate = registry
            .estimate_credits(10, &["email".to_string()], Some(&waterfall))
            .unwrap();
        assert_eq!(estimate, 20); // apollo, cost 2, x10 records
    }

    #[test]
    fn estimate_unknown_field_is_zero() {
        let registry = ProviderRegistry::default_registry();
        let estimate = registry
            .estimate_credits(10, &["nonexistent_field".to_string()], None)
            .unwrap();
        assert_eq!(estimate, 0);
    }

    #[test]
    fn validate_providers_rejects_unknown() {
        let registry = ProviderRegistry::default_registry();
        let err = registry
            .validate_providers(&["apollo".to_string(), "nope".to_string()])
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownSlugs(_)));
    }
}
