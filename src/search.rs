//! Free-text filtering of the roster.

use crate::contact::Contact;

/// Whether a contact is included for the given query.
///
/// Empty query matches everything. Otherwise the query must be a
/// case-insensitive substring of the name, an exact substring of the
/// phone string, or a case-insensitive substring of the email when one
/// is present. Pure substring containment, no ranking.
pub fn matches(query: &str, contact: &Contact) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    if contact.name.to_lowercase().contains(&needle) {
        return true;
    }
    if contact.phone.contains(query) {
        return true;
    }
    contact
        .email
        .as_ref()
        .is_some_and(|email| email.to_lowercase().contains(&needle))
}

/// Indices of matching contacts, preserving roster order.
pub fn filter(contacts: &[Contact], query: &str) -> Vec<usize> {
    contacts
        .iter()
        .enumerate()
        .filter(|(_, c)| matches(query, c))
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::ContactId;

    fn contact(name: &str, phone: &str, email: Option<&str>) -> Contact {
        Contact::new(ContactId(1), name, phone, email.map(String::from))
    }

    #[test]
    fn test_empty_query_matches_everything() {
        let c = contact("Alice Johnson", "+1 (555) 123-4567", None);
        assert!(matches("", &c));
    }

    #[test]
    fn test_name_match_is_case_insensitive() {
        let c = contact("Alice Johnson", "+1 (555) 123-4567", None);
        assert!(matches("alice", &c));
        assert!(matches("JOHN", &c));
        assert!(!matches("bob", &c));
    }

    #[test]
    fn test_phone_match_is_exact_substring() {
        let c = contact("Alice Johnson", "+1 (555) 123-4567", None);
        assert!(matches("555", &c));
        assert!(matches("(555) 123", &c));
        // Digits only, no normalization of the stored formatting.
        assert!(!matches("5551234567", &c));
    }

    #[test]
    fn test_email_match_is_case_insensitive() {
        let with = contact("Alice", "+1 555", Some("Alice@Example.com"));
        let without = contact("Alice", "+1 555", None);
        assert!(matches("example.COM", &with));
        assert!(!matches("example.com", &without));
    }

    #[test]
    fn test_filter_preserves_order() {
        let contacts = vec![
            contact("Alice", "+1 5550001", None),
            contact("Bob", "+1 5550002", None),
            contact("Alicia", "+1 5550003", None),
        ];
        assert_eq!(filter(&contacts, "ali"), [0, 2]);
        assert_eq!(filter(&contacts, ""), [0, 1, 2]);
        assert_eq!(filter(&contacts, "zzz"), Vec::<usize>::new());
    }
}
