//! Order-sensitive fingerprint over a fetched contact set.

use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
};

use platform_host::Contact;

/// Starting value for [`content_hash`].
pub const CONTENT_HASH_SEED: u64 = 1_825_038_313;

/// Hash of one contact over every user-visible field.
///
/// Uses fixed-key SipHash, so values are stable for the life of the process.
pub fn contact_hash(contact: &Contact) -> u64 {
    let mut hasher = DefaultHasher::new();
    contact.hash(&mut hasher);
    hasher.finish()
}

/// Fingerprint of `contacts` in fetch order.
///
/// Each contact's hash is offset by its 1-based position before being folded in, so reordering
/// otherwise identical contacts changes the result. Collisions are possible and accepted.
pub fn content_hash(contacts: &[Contact]) -> u64 {
    contacts
        .iter()
        .zip(1u64..)
        .fold(CONTENT_HASH_SEED, |acc, (contact, position)| {
            acc ^ contact_hash(contact).wrapping_add(position)
        })
}

#[cfg(test)]
mod tests {
    use pretty_assertions::{assert_eq, assert_ne};

    use super::*;

    fn sample() -> Vec<Contact> {
        vec![
            Contact::new("1", "Ada", "Lovelace").with_phone(Some("mobile"), "+1 555 0100"),
            Contact::new("2", "Grace", "Hopper").with_email(None, "grace@example.org"),
            Contact::new("3", "Alan", "Turing"),
        ]
    }

    #[test]
    fn empty_set_hashes_to_seed() {
        assert_eq!(content_hash(&[]), CONTENT_HASH_SEED);
    }

    #[test]
    fn identical_fetches_hash_identically() {
        let first = sample();
        let second = sample();
        assert_eq!(content_hash(&first), content_hash(&second));
    }

    #[test]
    fn swapping_adjacent_contacts_changes_hash() {
        let ordered = sample();
        let mut swapped = sample();
        swapped.swap(0, 1);
        assert_ne!(content_hash(&ordered), content_hash(&swapped));

        let mut tail_swapped = sample();
        tail_swapped.swap(1, 2);
        assert_ne!(content_hash(&ordered), content_hash(&tail_swapped));
    }

    #[test]
    fn any_visible_field_edit_changes_hash() {
        let base = sample();

        let mut renamed = sample();
        renamed[2].nickname = "Prof".to_string();
        assert_ne!(content_hash(&base), content_hash(&renamed));

        let mut new_thumbnail = sample();
        new_thumbnail[0].thumbnail = Some(vec![0x89, 0x50, 0x4e, 0x47]);
        assert_ne!(content_hash(&base), content_hash(&new_thumbnail));

        let mut relabeled = sample();
        relabeled[0].phone_numbers[0].label = Some("work".to_string());
        assert_ne!(content_hash(&base), content_hash(&relabeled));
    }
}
