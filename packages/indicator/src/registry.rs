//! Embedded indicator and province registry.
//!
//! Each entry is a `(name, toml_content)` pair embedded via `include_str!`.
//! Adding an indicator means adding a `[[indicators]]` block to the TOML
//! file of its parent category.

use std::collections::BTreeMap;

use ccvi_map_indicator_models::{
    IndicatorCategory, IndicatorDescriptor, IndicatorDefinition, IndicatorGroup, Province,
};
use serde::Deserialize;

use crate::RegistryError;

/// Number of registered indicators. Enforced by a test.
#[cfg(test)]
const EXPECTED_INDICATOR_COUNT: usize = 29;

/// Embedded indicator TOML definitions.
const INDICATOR_TOMLS: &[(&str, &str)] = &[
    ("composite", include_str!("../indicators/composite.toml")),
    ("exposure", include_str!("../indicators/exposure.toml")),
    ("sensitivity", include_str!("../indicators/sensitivity.toml")),
    (
        "adaptive_capacity",
        include_str!("../indicators/adaptive_capacity.toml"),
    ),
];

const PROVINCES_TOML: &str = include_str!("../indicators/provinces.toml");

#[derive(Deserialize)]
struct ProvinceFile {
    provinces: Vec<Province>,
}

/// A composite indicator with its leaf sub-indicators, as shown in the
/// indicator navigator.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IndicatorNode {
    /// The composite indicator.
    pub indicator: IndicatorDescriptor,
    /// Sub-indicators grouped under it, in registry order.
    pub children: Vec<IndicatorDescriptor>,
}

/// Immutable lookup table of every known indicator.
#[derive(Debug, Clone)]
pub struct IndicatorRegistry {
    definitions: Vec<IndicatorDefinition>,
    by_id: BTreeMap<String, usize>,
}

impl IndicatorRegistry {
    /// Loads the registry from the embedded TOML files.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError`] if an embedded file fails to parse or two
    /// indicators share an id.
    pub fn load() -> Result<Self, RegistryError> {
        let mut groups = Vec::with_capacity(INDICATOR_TOMLS.len());
        for &(name, toml_str) in INDICATOR_TOMLS {
            let group: IndicatorGroup = toml::de::from_str(toml_str)
                .map_err(|source| RegistryError::Parse { name, source })?;
            groups.push(group);
        }
        let registry = Self::from_groups(groups)?;
        log::debug!("Loaded {} indicators", registry.definitions.len());
        Ok(registry)
    }

    /// Builds a registry from already-parsed groups, assigning each
    /// definition its group's parent category.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::DuplicateId`] if two definitions share an id.
    pub fn from_groups(groups: Vec<IndicatorGroup>) -> Result<Self, RegistryError> {
        let mut definitions = Vec::new();
        let mut by_id = BTreeMap::new();

        for group in groups {
            for mut definition in group.indicators {
                definition.parent_category = group.category;
                if by_id.contains_key(&definition.id) {
                    return Err(RegistryError::DuplicateId { id: definition.id });
                }
                by_id.insert(definition.id.clone(), definitions.len());
                definitions.push(definition);
            }
        }

        Ok(Self { definitions, by_id })
    }

    /// Looks up an indicator definition by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&IndicatorDefinition> {
        self.by_id.get(id).map(|&idx| &self.definitions[idx])
    }

    /// Returns every definition in registry order.
    #[must_use]
    pub fn all(&self) -> &[IndicatorDefinition] {
        &self.definitions
    }

    /// Returns the descriptors of every indicator.
    #[must_use]
    pub fn descriptors(&self) -> Vec<IndicatorDescriptor> {
        self.definitions
            .iter()
            .map(IndicatorDefinition::descriptor)
            .collect()
    }

    /// Returns the sub-indicators of a category.
    pub fn children(
        &self,
        category: IndicatorCategory,
    ) -> impl Iterator<Item = &IndicatorDefinition> {
        self.definitions
            .iter()
            .filter(move |d| d.parent_category == Some(category))
    }

    /// Returns the navigator tree: every composite indicator followed by
    /// its sub-indicators.
    #[must_use]
    pub fn tree(&self) -> Vec<IndicatorNode> {
        IndicatorCategory::all()
            .iter()
            .filter_map(|category| {
                let indicator = self.get(category.indicator_id())?.descriptor();
                let children = self
                    .children(*category)
                    .map(IndicatorDefinition::descriptor)
                    .collect();
                Some(IndicatorNode {
                    indicator,
                    children,
                })
            })
            .collect()
    }
}

/// Returns the static province table.
///
/// # Errors
///
/// Returns [`RegistryError::Parse`] if the embedded province file fails to
/// parse.
pub fn provinces() -> Result<Vec<Province>, RegistryError> {
    let file: ProvinceFile = toml::de::from_str(PROVINCES_TOML).map_err(|source| {
        RegistryError::Parse {
            name: "provinces",
            source,
        }
    })?;
    Ok(file.provinces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn loads_all_indicators() {
        let registry = IndicatorRegistry::load().unwrap();
        assert_eq!(
            registry.all().len(),
            EXPECTED_INDICATOR_COUNT,
            "Expected {EXPECTED_INDICATOR_COUNT} indicators, found {}. \
             Update EXPECTED_INDICATOR_COUNT after adding/removing indicators.",
            registry.all().len()
        );
    }

    #[test]
    fn composites_have_no_parent() {
        let registry = IndicatorRegistry::load().unwrap();
        for category in IndicatorCategory::all() {
            let def = registry
                .get(category.indicator_id())
                .unwrap_or_else(|| panic!("Missing composite {category}"));
            assert_eq!(def.parent_category, None);
        }
    }

    #[test]
    fn all_indicators_have_required_fields() {
        let registry = IndicatorRegistry::load().unwrap();
        for def in registry.all() {
            assert!(!def.id.is_empty(), "Indicator has empty id");
            assert!(!def.name.is_empty(), "Indicator {} has empty name", def.id);
            assert!(
                !def.endpoint.is_empty() && !def.endpoint.starts_with('/'),
                "Indicator {} has invalid endpoint: {}",
                def.id,
                def.endpoint
            );
            assert!(
                !def.value_fields.is_empty(),
                "Indicator {} has no value fields",
                def.id
            );
        }
    }

    #[test]
    fn leaf_indicators_select_with_params() {
        let registry = IndicatorRegistry::load().unwrap();
        let precipitation = registry.get("avg-precipitation").unwrap();
        assert_eq!(
            precipitation.params.get("metric").map(String::as_str),
            Some("precipitation")
        );
        let depth = registry.get("water-level-depth").unwrap();
        assert_eq!(
            depth.params.get("parameter").map(String::as_str),
            Some("water_level_depth")
        );
        assert!(registry.get("vulnerability").unwrap().params.is_empty());
    }

    #[test]
    fn rejects_duplicate_ids() {
        let group: IndicatorGroup = toml::de::from_str(
            r#"
            [[indicators]]
            id = "dup"
            name = "A"
            description = ""
            endpoint = "a"

            [[indicators]]
            id = "dup"
            name = "B"
            description = ""
            endpoint = "b"
            "#,
        )
        .unwrap();
        let err = IndicatorRegistry::from_groups(vec![group]).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateId { id } if id == "dup"));
    }

    #[test]
    fn tree_groups_every_leaf_under_a_composite() {
        let registry = IndicatorRegistry::load().unwrap();
        let tree = registry.tree();
        assert_eq!(tree.len(), IndicatorCategory::all().len());
        let leaves: usize = tree.iter().map(|node| node.children.len()).sum();
        assert_eq!(leaves + tree.len(), registry.all().len());
    }

    #[test]
    fn province_ids_are_unique() {
        let provinces = provinces().unwrap();
        assert_eq!(provinces.len(), 7);
        let mut seen = BTreeSet::new();
        for province in &provinces {
            assert!(seen.insert(province.id), "Duplicate province id {}", province.id);
            assert_eq!(province.code.len(), 2);
        }
    }
}
