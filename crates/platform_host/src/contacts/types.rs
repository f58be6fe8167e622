//! Contact data model and field-projection types shared by contact store adapters.

use serde::{Deserialize, Serialize};

/// Current version of the [`ContactFieldSelection`] schema understood by store adapters.
pub const CONTACT_FIELD_SELECTION_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// OS-level permission state for the contacts database.
///
/// The OS does not guarantee monotonic transitions (users can revoke access in system settings at
/// any time), so callers re-read this value instead of caching it.
pub enum AuthorizationStatus {
    /// The user has not been asked yet.
    NotDetermined,
    /// Access is blocked by device policy; the user cannot grant it.
    Restricted,
    /// The user declined access.
    Denied,
    /// Access is granted.
    Authorized,
}

impl AuthorizationStatus {
    /// Returns `true` once the user (or policy) has made a decision.
    pub const fn is_determined(self) -> bool {
        !matches!(self, Self::NotDetermined)
    }

    /// Returns `true` when contacts may be enumerated.
    pub const fn is_authorized(self) -> bool {
        matches!(self, Self::Authorized)
    }

    /// Returns a stable token for diagnostics.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotDetermined => "not-determined",
            Self::Restricted => "restricted",
            Self::Denied => "denied",
            Self::Authorized => "authorized",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
/// User-preferred ordering for contact names.
pub enum ContactSortOrder {
    /// Sort by given name, then family name.
    #[default]
    GivenNameFirst,
    /// Sort by family name, then given name.
    FamilyNameFirst,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
/// One projectable contact field.
pub enum ContactField {
    /// Stable platform identifier.
    Identifier,
    /// Given (first) name.
    GivenName,
    /// Family (last) name.
    FamilyName,
    /// Nickname.
    Nickname,
    /// Organization or company name.
    OrganizationName,
    /// Phone numbers.
    PhoneNumbers,
    /// Email addresses.
    EmailAddresses,
    /// Postal addresses.
    PostalAddresses,
    /// Thumbnail image data.
    Thumbnail,
}

impl ContactField {
    /// Every field, in projection order.
    pub const ALL: [ContactField; 9] = [
        Self::Identifier,
        Self::GivenName,
        Self::FamilyName,
        Self::Nickname,
        Self::OrganizationName,
        Self::Thumbnail,
        Self::PhoneNumbers,
        Self::EmailAddresses,
        Self::PostalAddresses,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Versioned set of fields a store adapter must load during enumeration.
///
/// Adapters reject versions they do not understand instead of guessing at a projection.
pub struct ContactFieldSelection {
    /// Selection schema version.
    pub version: u32,
    /// Fields to load. Unlisted fields come back empty.
    pub fields: Vec<ContactField>,
}

impl Default for ContactFieldSelection {
    fn default() -> Self {
        Self {
            version: CONTACT_FIELD_SELECTION_VERSION,
            fields: ContactField::ALL.to_vec(),
        }
    }
}

impl ContactFieldSelection {
    /// Returns whether `field` is part of the projection.
    pub fn includes(&self, field: ContactField) -> bool {
        self.fields.contains(&field)
    }

    /// Returns whether this selection's version is understood by this crate.
    pub const fn is_supported(&self) -> bool {
        self.version == CONTACT_FIELD_SELECTION_VERSION
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
/// Phone number or email address with an optional user-visible label.
pub struct LabeledValue {
    /// Label such as `mobile` or `work`.
    pub label: Option<String>,
    /// Raw value as entered by the user.
    pub value: String,
}

impl LabeledValue {
    /// Creates a labeled value.
    pub fn new(label: Option<&str>, value: impl Into<String>) -> Self {
        Self {
            label: label.map(str::to_string),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// Postal address with an optional label.
pub struct PostalAddress {
    /// Label such as `home`.
    pub label: Option<String>,
    /// Street lines.
    pub street: String,
    /// City.
    pub city: String,
    /// State, province or region.
    pub state: String,
    /// Postal code.
    pub postal_code: String,
    /// Country.
    pub country: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
/// Normalized, immutable snapshot of one platform contact.
///
/// Equality and hashing cover every user-visible field, so any visible edit changes the hash.
pub struct Contact {
    /// Stable platform identifier.
    pub identifier: String,
    /// Given name.
    pub given_name: String,
    /// Family name.
    pub family_name: String,
    /// Nickname.
    pub nickname: String,
    /// Organization name.
    pub organization_name: String,
    /// Phone numbers.
    pub phone_numbers: Vec<LabeledValue>,
    /// Email addresses.
    pub email_addresses: Vec<LabeledValue>,
    /// Postal addresses.
    pub postal_addresses: Vec<PostalAddress>,
    /// Thumbnail image bytes.
    pub thumbnail: Option<Vec<u8>>,
}

impl Contact {
    /// Creates a contact with an identifier and name; other fields start empty.
    pub fn new(
        identifier: impl Into<String>,
        given_name: impl Into<String>,
        family_name: impl Into<String>,
    ) -> Self {
        Self {
            identifier: identifier.into(),
            given_name: given_name.into(),
            family_name: family_name.into(),
            ..Self::default()
        }
    }

    /// Adds a phone number.
    pub fn with_phone(mut self, label: Option<&str>, number: impl Into<String>) -> Self {
        self.phone_numbers.push(LabeledValue::new(label, number));
        self
    }

    /// Adds an email address.
    pub fn with_email(mut self, label: Option<&str>, address: impl Into<String>) -> Self {
        self.email_addresses.push(LabeledValue::new(label, address));
        self
    }

    /// Adds a postal address.
    pub fn with_postal_address(mut self, address: PostalAddress) -> Self {
        self.postal_addresses.push(address);
        self
    }

    /// Returns the display name, falling back to nickname and organization.
    pub fn display_name(&self, order: ContactSortOrder) -> String {
        let (first, second) = match order {
            ContactSortOrder::GivenNameFirst => (&self.given_name, &self.family_name),
            ContactSortOrder::FamilyNameFirst => (&self.family_name, &self.given_name),
        };
        let full = [first.as_str(), second.as_str()]
            .into_iter()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            full
        } else if !self.nickname.is_empty() {
            self.nickname.clone()
        } else {
            self.organization_name.clone()
        }
    }

    /// Case-insensitive key used to order contacts for `order`.
    pub fn sort_key(&self, order: ContactSortOrder) -> (String, String, String) {
        let (first, second) = match order {
            ContactSortOrder::GivenNameFirst => (&self.given_name, &self.family_name),
            ContactSortOrder::FamilyNameFirst => (&self.family_name, &self.given_name),
        };
        (
            first.to_lowercase(),
            second.to_lowercase(),
            self.identifier.clone(),
        )
    }

    /// Returns a copy with every field outside `selection` cleared.
    pub fn project(&self, selection: &ContactFieldSelection) -> Self {
        let keep = |field| selection.includes(field);
        Self {
            identifier: if keep(ContactField::Identifier) {
                self.identifier.clone()
            } else {
                String::new()
            },
            given_name: if keep(ContactField::GivenName) {
                self.given_name.clone()
            } else {
                String::new()
            },
            family_name: if keep(ContactField::FamilyName) {
                self.family_name.clone()
            } else {
                String::new()
            },
            nickname: if keep(ContactField::Nickname) {
                self.nickname.clone()
            } else {
                String::new()
            },
            organization_name: if keep(ContactField::OrganizationName) {
                self.organization_name.clone()
            } else {
                String::new()
            },
            phone_numbers: if keep(ContactField::PhoneNumbers) {
                self.phone_numbers.clone()
            } else {
                Vec::new()
            },
            email_addresses: if keep(ContactField::EmailAddresses) {
                self.email_addresses.clone()
            } else {
                Vec::new()
            },
            postal_addresses: if keep(ContactField::PostalAddresses) {
                self.postal_addresses.clone()
            } else {
                Vec::new()
            },
            thumbnail: if keep(ContactField::Thumbnail) {
                self.thumbnail.clone()
            } else {
                None
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ada() -> Contact {
        Contact::new("c-1", "Ada", "Lovelace")
            .with_phone(Some("mobile"), "+44 20 7946 0000")
            .with_email(None, "ada@example.org")
    }

    #[test]
    fn default_selection_is_current_version_with_every_field() {
        let selection = ContactFieldSelection::default();
        assert!(selection.is_supported());
        for field in ContactField::ALL {
            assert!(selection.includes(field), "{field:?} missing");
        }
    }

    #[test]
    fn projection_clears_unselected_fields() {
        let selection = ContactFieldSelection {
            version: CONTACT_FIELD_SELECTION_VERSION,
            fields: vec![ContactField::Identifier, ContactField::GivenName],
        };
        let projected = ada().project(&selection);
        assert_eq!(projected.identifier, "c-1");
        assert_eq!(projected.given_name, "Ada");
        assert!(projected.family_name.is_empty());
        assert!(projected.phone_numbers.is_empty());
        assert!(projected.email_addresses.is_empty());
    }

    #[test]
    fn display_name_follows_sort_order_and_falls_back() {
        let contact = ada();
        assert_eq!(
            contact.display_name(ContactSortOrder::GivenNameFirst),
            "Ada Lovelace"
        );
        assert_eq!(
            contact.display_name(ContactSortOrder::FamilyNameFirst),
            "Lovelace Ada"
        );

        let org_only = Contact {
            organization_name: "Analytical Engines Ltd".to_string(),
            ..Contact::default()
        };
        assert_eq!(
            org_only.display_name(ContactSortOrder::GivenNameFirst),
            "Analytical Engines Ltd"
        );
    }

    #[test]
    fn authorization_status_serializes_kebab_case() {
        let raw = serde_json::to_string(&AuthorizationStatus::NotDetermined).expect("serialize");
        assert_eq!(raw, "\"not-determined\"");
        assert!(!AuthorizationStatus::NotDetermined.is_determined());
        assert!(AuthorizationStatus::Denied.is_determined());
        assert!(AuthorizationStatus::Authorized.is_authorized());
    }
}
