//! Delegate contract implemented by the UI layer.

use platform_host::Contact;

use crate::fetcher::ContactsFetcher;

/// Receiver of contact set updates.
///
/// Called on the UI context. Implementations must not block.
pub trait ContactsDelegate {
    /// A fetched contact set passed the debounce policy.
    fn contacts_updated(
        &self,
        fetcher: &ContactsFetcher,
        contacts: &[Contact],
        is_user_requested: bool,
    );
}
