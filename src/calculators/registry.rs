//! Process-wide calculator catalogue.
//!
//! The registry instantiates each calculator once at registration time,
//! indexes it by name and category, and hands out shared handles
//! (`Arc<dyn Calculator>`). A default shared instance seeded with the
//! standard calculator set exists for convenience; engines and tests can
//! also own an isolated registry so parallel test runs never leak state
//! into each other. Registration is the single place a structurally
//! invalid calculator is rejected.

use super::{
    Calculator, CalculatorCategory, CalculatorConfig, CyclomaticComplexityCalculator,
    DepthOfInheritanceCalculator, FromConfig, HalsteadVolumeCalculator, LinesOfCodeCalculator,
    MaintainabilityIndexCalculator,
};
use crate::core::{Language, RegistryError};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

type Factory =
    Box<dyn Fn(&CalculatorConfig) -> Result<Arc<dyn Calculator>, RegistryError> + Send + Sync>;

struct RegistryEntry {
    calculator: Arc<dyn Calculator>,
    category: CalculatorCategory,
    factory: Factory,
}

#[derive(Default)]
struct RegistryInner {
    entries: HashMap<String, RegistryEntry>,
    /// Names in registration order; the engine runs calculators in this
    /// order
    order: Vec<String>,
}

/// Catalogue of calculator instances, queryable by name, category, and
/// language support
#[derive(Default)]
pub struct CalculatorRegistry {
    inner: RwLock<RegistryInner>,
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh registry seeded with the five standard calculators in
    /// their canonical order
    pub fn with_standard_calculators() -> Result<Self, RegistryError> {
        let registry = Self::new();
        let config = CalculatorConfig::default();
        registry.register::<CyclomaticComplexityCalculator>(
            CalculatorCategory::Complexity,
            config.clone(),
        )?;
        registry
            .register::<HalsteadVolumeCalculator>(CalculatorCategory::Complexity, config.clone())?;
        registry.register::<LinesOfCodeCalculator>(CalculatorCategory::Size, config.clone())?;
        registry.register::<MaintainabilityIndexCalculator>(
            CalculatorCategory::Maintainability,
            config.clone(),
        )?;
        registry
            .register::<DepthOfInheritanceCalculator>(CalculatorCategory::Inheritance, config)?;
        Ok(registry)
    }

    /// The process-wide shared instance
    pub fn shared() -> &'static CalculatorRegistry {
        static SHARED: Lazy<CalculatorRegistry> = Lazy::new(|| {
            CalculatorRegistry::with_standard_calculators().unwrap_or_else(|e| {
                log::error!("Failed to seed standard calculators: {e}");
                CalculatorRegistry::new()
            })
        });
        &SHARED
    }

    /// Instantiate `C` from `config` once and add it to the catalogue
    pub fn register<C>(
        &self,
        category: CalculatorCategory,
        config: CalculatorConfig,
    ) -> Result<(), RegistryError>
    where
        C: Calculator + FromConfig + 'static,
    {
        let calculator: Arc<dyn Calculator> = Arc::new(C::from_config(&config)?);
        Self::validate_metadata(calculator.as_ref())?;

        let name = calculator.name().to_string();
        let mut inner = self.inner.write();
        if inner.entries.contains_key(&name) {
            return Err(RegistryError::DuplicateName(name));
        }

        let factory: Factory = Box::new(|config| {
            let instance: Arc<dyn Calculator> = Arc::new(C::from_config(config)?);
            Ok(instance)
        });

        log::debug!("Registered calculator '{name}' in category {category}");
        inner.order.push(name.clone());
        inner.entries.insert(
            name,
            RegistryEntry {
                calculator,
                category,
                factory,
            },
        );
        Ok(())
    }

    fn validate_metadata(calculator: &dyn Calculator) -> Result<(), RegistryError> {
        let name = calculator.name();
        for (field, value) in [
            ("name", calculator.name()),
            ("description", calculator.description()),
            ("version", calculator.version()),
        ] {
            if value.trim().is_empty() {
                return Err(RegistryError::MissingMetadata {
                    calculator: if name.trim().is_empty() {
                        "<unnamed>".to_string()
                    } else {
                        name.to_string()
                    },
                    field: field.to_string(),
                });
            }
        }
        Ok(())
    }

    /// Remove a calculator; returns whether it was present
    pub fn unregister(&self, name: &str) -> bool {
        let mut inner = self.inner.write();
        inner.order.retain(|n| n != name);
        inner.entries.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Calculator>> {
        self.inner
            .read()
            .entries
            .get(name)
            .map(|e| Arc::clone(&e.calculator))
    }

    pub fn get_by_category(&self, category: CalculatorCategory) -> Vec<Arc<dyn Calculator>> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.entries.get(name))
            .filter(|e| e.category == category)
            .map(|e| Arc::clone(&e.calculator))
            .collect()
    }

    /// Calculators whose `supports_language` accepts `language`, in
    /// registration order
    pub fn get_for_language(&self, language: Language) -> Vec<Arc<dyn Calculator>> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.entries.get(name))
            .filter(|e| e.calculator.supports_language(language))
            .map(|e| Arc::clone(&e.calculator))
            .collect()
    }

    /// Every registered calculator in registration order
    pub fn in_registration_order(&self) -> Vec<Arc<dyn Calculator>> {
        let inner = self.inner.read();
        inner
            .order
            .iter()
            .filter_map(|name| inner.entries.get(name))
            .map(|e| Arc::clone(&e.calculator))
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.inner.read().order.clone()
    }

    pub fn len(&self) -> usize {
        self.inner.read().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().entries.is_empty()
    }

    /// Produce an independent, differently-configured instance outside
    /// the shared catalogue
    pub fn create_instance(
        &self,
        name: &str,
        config: &CalculatorConfig,
    ) -> Result<Arc<dyn Calculator>, RegistryError> {
        let inner = self.inner.read();
        let entry = inner
            .entries
            .get(name)
            .ok_or_else(|| RegistryError::UnknownCalculator(name.to_string()))?;
        (entry.factory)(config)
    }

    /// Re-check contract metadata for every registered calculator and
    /// return human-readable warnings for anything out of shape
    pub fn validate_all(&self) -> Vec<String> {
        let inner = self.inner.read();
        let mut warnings = Vec::new();
        for name in &inner.order {
            let Some(entry) = inner.entries.get(name) else {
                continue;
            };
            if let Err(e) = Self::validate_metadata(entry.calculator.as_ref()) {
                warnings.push(e.to_string());
            }
        }
        warnings
    }

    pub fn clear(&self) {
        let mut inner = self.inner.write();
        inner.entries.clear();
        inner.order.clear();
    }
}
