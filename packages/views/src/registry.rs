//! View registry: built-in view definitions from embedded TOML configs,
//! optionally extended by a user file.
//!
//! Each `.toml` file in `packages/views/views/` is baked into the binary at
//! compile time via [`include_str!`]. Adding a view is as simple as
//! creating a new TOML file and adding it to the list below.

use std::path::Path;

use serde::Deserialize;

use crate::{ViewDefinition, ViewError, parse_view_toml};

/// TOML configs embedded at compile time.
const VIEW_TOMLS: &[(&str, &str)] = &[
    // ── Bangkok-wide ─────────────────────────────────────────────────
    ("default", include_str!("../views/default.toml")),
    (
        "bkk_distance_csmbs",
        include_str!("../views/bkk_distance_csmbs.toml"),
    ),
    (
        "bkk_distance_uhc",
        include_str!("../views/bkk_distance_uhc.toml"),
    ),
    (
        "bkk_distance_sss",
        include_str!("../views/bkk_distance_sss.toml"),
    ),
    (
        "bkk_rights_csmbs",
        include_str!("../views/bkk_rights_csmbs.toml"),
    ),
    ("bkk_under_gov", include_str!("../views/bkk_under_gov.toml")),
    (
        "bkk_under_private",
        include_str!("../views/bkk_under_private.toml"),
    ),
    // ── Ratchathewi district ─────────────────────────────────────────
    (
        "ratchathewi_default",
        include_str!("../views/ratchathewi_default.toml"),
    ),
    (
        "ratchathewi_distance_default",
        include_str!("../views/ratchathewi_distance_default.toml"),
    ),
    (
        "ratchathewi_distance_csmbs",
        include_str!("../views/ratchathewi_distance_csmbs.toml"),
    ),
    (
        "ratchathewi_under_gov",
        include_str!("../views/ratchathewi_under_gov.toml"),
    ),
    (
        "ratchathewi_under_private",
        include_str!("../views/ratchathewi_under_private.toml"),
    ),
];

/// Total number of built-in views (used in tests).
#[cfg(test)]
const EXPECTED_VIEW_COUNT: usize = 12;

/// Id of the view used when none is requested.
pub const DEFAULT_VIEW: &str = "default";

/// Returns all built-in view definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (this is a compile-time guarantee
/// since the configs are embedded).
#[must_use]
pub fn builtin_views() -> Vec<ViewDefinition> {
    VIEW_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_view_toml(name, toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Shape of a user view file: a list of `[[views]]` tables.
#[derive(Debug, Deserialize)]
struct ViewFile {
    #[serde(default)]
    views: Vec<ViewDefinition>,
}

/// An ordered, id-unique collection of views.
#[derive(Debug, Clone)]
pub struct ViewRegistry {
    views: Vec<ViewDefinition>,
}

impl ViewRegistry {
    /// Registry of the built-in views.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            views: builtin_views(),
        }
    }

    /// Adds views from a `[[views]]` TOML document. A view whose id already
    /// exists replaces it in place; new ids are appended.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not parse or repeats an id.
    pub fn extend_from_str(&mut self, name: &str, toml_str: &str) -> Result<(), ViewError> {
        let file: ViewFile = toml::de::from_str(toml_str).map_err(|e| ViewError::Parse {
            name: name.to_owned(),
            message: e.to_string(),
        })?;

        let mut seen = std::collections::BTreeSet::new();
        for view in &file.views {
            if !seen.insert(view.id.as_str()) {
                return Err(ViewError::DuplicateId(view.id.clone()));
            }
        }

        for view in file.views {
            if let Some(existing) = self.views.iter_mut().find(|v| v.id == view.id) {
                log::info!("{name}: overriding built-in view {:?}", view.id);
                *existing = view;
            } else {
                log::debug!("{name}: adding view {:?}", view.id);
                self.views.push(view);
            }
        }

        Ok(())
    }

    /// Adds views from a user file (see [`Self::extend_from_str`]).
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn extend_from_file(&mut self, path: &Path) -> Result<(), ViewError> {
        let text = std::fs::read_to_string(path)?;
        self.extend_from_str(&path.display().to_string(), &text)
    }

    /// Looks up a view by id.
    ///
    /// # Errors
    ///
    /// Returns [`ViewError::UnknownView`] if no view has this id.
    pub fn get(&self, id: &str) -> Result<&ViewDefinition, ViewError> {
        self.views
            .iter()
            .find(|v| v.id == id)
            .ok_or_else(|| ViewError::UnknownView {
                id: id.to_owned(),
                available: self
                    .views
                    .iter()
                    .map(|v| v.id.as_str())
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// All views in registration order.
    #[must_use]
    pub fn views(&self) -> &[ViewDefinition] {
        &self.views
    }
}

#[cfg(test)]
mod tests {
    use care_map_report_models::ReportSection;

    use super::*;
    use crate::EligibilityRule;

    #[test]
    fn loads_all_views() {
        let views = builtin_views();
        assert_eq!(views.len(), EXPECTED_VIEW_COUNT);
    }

    #[test]
    fn view_ids_are_unique_and_match_file_names() {
        let views = builtin_views();
        let mut ids: Vec<&str> = views.iter().map(|v| v.id.as_str()).collect();
        for ((name, _), id) in VIEW_TOMLS.iter().zip(&ids) {
            assert_eq!(name, id, "{name}.toml declares id {id}");
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), EXPECTED_VIEW_COUNT);
    }

    #[test]
    fn all_views_have_required_fields() {
        for view in &builtin_views() {
            assert!(!view.name.is_empty(), "{}: name is empty", view.id);
            assert!(!view.sections.is_empty(), "{}: no sections", view.id);
            if let EligibilityRule::Accepts { columns, keywords } = &view.eligibility {
                assert!(!columns.is_empty(), "{}: no eligibility columns", view.id);
                assert!(!keywords.is_empty(), "{}: no fallback keywords", view.id);
            }
        }
    }

    #[test]
    fn default_view_is_registered() {
        let registry = ViewRegistry::builtin();
        let view = registry.get(DEFAULT_VIEW).unwrap();
        assert_eq!(view.eligibility, EligibilityRule::Any);
        assert!(view.emits(ReportSection::Assignments));
    }

    #[test]
    fn unknown_view_lists_available_ids() {
        let registry = ViewRegistry::builtin();
        let err = registry.get("nope").unwrap_err();
        let message = err.to_string();
        assert!(message.contains("nope"));
        assert!(message.contains("bkk_distance_csmbs"));
    }

    #[test]
    fn user_file_overrides_and_appends() {
        let mut registry = ViewRegistry::builtin();
        registry
            .extend_from_str(
                "custom.toml",
                r#"
                [[views]]
                id = "default"
                name = "Only facilities"
                sections = ["facilities"]

                [[views]]
                id = "pathum_wan"
                name = "Pathum Wan"
                region_filter = { name = "ปทุมวัน" }
                "#,
            )
            .unwrap();

        assert_eq!(registry.views().len(), EXPECTED_VIEW_COUNT + 1);
        assert_eq!(registry.views()[0].name, "Only facilities");
        let added = registry.get("pathum_wan").unwrap();
        assert_eq!(added.region_filter.as_ref().unwrap().name, "ปทุมวัน");
    }

    #[test]
    fn user_file_rejects_duplicate_ids() {
        let mut registry = ViewRegistry::builtin();
        let err = registry
            .extend_from_str(
                "dup.toml",
                "[[views]]\nid = \"a\"\nname = \"A\"\n\n[[views]]\nid = \"a\"\nname = \"B\"\n",
            )
            .unwrap_err();
        assert!(matches!(err, ViewError::DuplicateId(id) if id == "a"));
        assert_eq!(registry.views().len(), EXPECTED_VIEW_COUNT);
    }
}
