//! Conversion options.

use serde::{Deserialize, Serialize};

/// How to decide that a record describes a company rather than a person.
///
/// Apple's 3.0 export does not mark organization contacts unambiguously, so
/// the heuristic is selectable.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "kebab-case")]
pub enum OrganizationDetection {
    /// Either signal below.
    #[default]
    Auto,
    /// Empty (or missing) `N` and an `ORG` property.
    EmptyName,
    /// Apple's `X-ABShowAs:COMPANY` marker.
    ShowAsCompany,
    /// Treat every record as a person.
    Never,
}

impl OrganizationDetection {
    /// Combine the two signals according to the selected heuristic.
    #[must_use]
    pub const fn is_organization(self, empty_name_with_org: bool, shown_as_company: bool) -> bool {
        match self {
            Self::Auto => empty_name_with_org || shown_as_company,
            Self::EmptyName => empty_name_with_org,
            Self::ShowAsCompany => shown_as_company,
            Self::Never => false,
        }
    }
}

impl std::fmt::Display for OrganizationDetection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Auto => "auto",
            Self::EmptyName => "empty-name",
            Self::ShowAsCompany => "show-as-company",
            Self::Never => "never",
        })
    }
}

/// Options for [`convert`](super::convert).
///
/// The default removes nothing and only applies the rewrites every 4.0
/// record needs; all other lines pass through byte for byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(clippy::struct_excessive_bools)]
pub struct ConversionOptions {
    /// Drop `PHOTO` properties.
    pub remove_photos: bool,
    /// Drop `FN` properties.
    pub remove_formatted_name: bool,
    pub organization_detection: OrganizationDetection,
    /// Insert `KIND:org` after `VERSION` for organization contacts.
    pub mark_organizations: bool,
    /// Upper-case `type=` parameter names on `TEL`, `EMAIL`, `ADR` and `URL`.
    pub normalize_parameters: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            remove_photos: false,
            remove_formatted_name: false,
            organization_detection: OrganizationDetection::Auto,
            mark_organizations: false,
            normalize_parameters: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detection_matrix() {
        use OrganizationDetection::{Auto, EmptyName, Never, ShowAsCompany};

        assert!(Auto.is_organization(true, false));
        assert!(Auto.is_organization(false, true));
        assert!(!Auto.is_organization(false, false));
        assert!(EmptyName.is_organization(true, false));
        assert!(!EmptyName.is_organization(false, true));
        assert!(ShowAsCompany.is_organization(false, true));
        assert!(!ShowAsCompany.is_organization(true, false));
        assert!(!Never.is_organization(true, true));
    }

    #[test]
    fn test_detection_serde_names() {
        let json = serde_json::to_string(&OrganizationDetection::ShowAsCompany).unwrap();
        assert_eq!(json, "\"show-as-company\"");
        let parsed: OrganizationDetection = serde_json::from_str("\"empty-name\"").unwrap();
        assert_eq!(parsed, OrganizationDetection::EmptyName);
        assert_eq!(OrganizationDetection::default().to_string(), "auto");
    }

    #[test]
    fn test_default_options_remove_nothing() {
        let options = ConversionOptions::default();
        assert!(!options.remove_photos);
        assert!(!options.remove_formatted_name);
        assert!(!options.mark_organizations);
        assert!(!options.normalize_parameters);
    }
}
