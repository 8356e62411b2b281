//! The in-memory contact roster.
//!
//! Single-writer collection owned by the UI layer. Insertion re-sorts the
//! whole roster (digit-first, then accent- and case-insensitive name
//! order); deletion never re-sorts since removal cannot violate the order.

use std::cmp::Ordering;
use std::time::{SystemTime, UNIX_EPOCH};

use deunicode::deunicode;

use crate::contact::{Contact, ContactId};

/// Issues time-based ids, bumping on collision so ids stay unique and
/// strictly increasing even for adds within the same millisecond.
#[derive(Debug, Default)]
struct IdGen {
    last: i64,
}

impl IdGen {
    fn next(&mut self) -> ContactId {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0);
        let id = now_ms.max(self.last + 1);
        self.last = id;
        ContactId(id)
    }
}

#[derive(Debug, Default)]
pub struct Roster {
    contacts: Vec<Contact>,
    ids: IdGen,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Roster pre-populated with sample contacts.
    pub fn seeded() -> Self {
        let mut roster = Self::new();
        let samples: [(&str, &str, &str); 5] = [
            ("Alice Johnson", "+1 (555) 123-4567", "alice@example.com"),
            ("Bob Smith", "+1 (555) 234-5678", "bob@example.com"),
            ("Charlie Davis", "+44 20 7123 4567", "charlie@example.com"),
            ("Diana Prince", "+1 (555) 345-6789", "diana@example.com"),
            ("Ethan Hunt", "+1 (555) 456-7890", "ethan@example.com"),
        ];
        for (name, phone, email) in samples {
            let id = roster.ids.next();
            roster
                .contacts
                .push(Contact::new(id, name, phone, Some(email.to_string())));
        }
        roster.contacts.sort_by(|a, b| compare_names(&a.name, &b.name));
        roster
    }

    /// Create a contact from already-validated parts and insert it in
    /// sorted position. Returns the assigned id.
    pub fn add(&mut self, name: String, phone: String, email: Option<String>) -> ContactId {
        let id = self.ids.next();
        self.contacts.push(Contact::new(id, name, phone, email));
        // Stable sort: equal keys keep the pre-sort relative order, so a
        // duplicate name lands after the existing entry.
        self.contacts.sort_by(|a, b| compare_names(&a.name, &b.name));
        id
    }

    /// Remove exactly the contact with the given id, if present.
    /// Relative order of the remaining entries is untouched.
    pub fn remove(&mut self, id: ContactId) -> bool {
        let before = self.contacts.len();
        self.contacts.retain(|c| c.id != id);
        self.contacts.len() != before
    }

    pub fn contacts(&self) -> &[Contact] {
        &self.contacts
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// Roster ordering: trimmed lower-cased keys, names starting with a digit
/// first, then accent-insensitive comparison of the full key.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    let a_key = a.trim().to_lowercase();
    let b_key = b.trim().to_lowercase();

    let a_digit = a_key.chars().next().is_some_and(|c| c.is_ascii_digit());
    let b_digit = b_key.chars().next().is_some_and(|c| c.is_ascii_digit());

    match (a_digit, b_digit) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => deunicode(&a_key).cmp(&deunicode(&b_key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(roster: &Roster) -> Vec<&str> {
        roster.contacts().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_ids_unique_and_monotonic() {
        let mut gen = IdGen::default();
        let a = gen.next();
        let b = gen.next();
        let c = gen.next();
        assert!(a < b && b < c);
    }

    #[test]
    fn test_add_keeps_alphabetical_order() {
        let mut roster = Roster::new();
        roster.add("Charlie".into(), "+1 5550001".into(), None);
        roster.add("alice".into(), "+1 5550002".into(), None);
        roster.add("Bob".into(), "+1 5550003".into(), None);
        assert_eq!(names(&roster), ["alice", "Bob", "Charlie"]);
    }

    #[test]
    fn test_digit_first_rule() {
        let mut roster = Roster::new();
        roster.add("Alice".into(), "+1 5550001".into(), None);
        roster.add("7 Eleven".into(), "+1 5550002".into(), None);
        assert_eq!(names(&roster), ["7 Eleven", "Alice"]);

        // Insertion order must not matter.
        let mut roster = Roster::new();
        roster.add("7 Eleven".into(), "+1 5550002".into(), None);
        roster.add("Alice".into(), "+1 5550001".into(), None);
        assert_eq!(names(&roster), ["7 Eleven", "Alice"]);
    }

    #[test]
    fn test_accent_insensitive_order() {
        let mut roster = Roster::new();
        roster.add("Zoe".into(), "+1 5550001".into(), None);
        roster.add("Émile".into(), "+1 5550002".into(), None);
        roster.add("Adam".into(), "+1 5550003".into(), None);
        assert_eq!(names(&roster), ["Adam", "Émile", "Zoe"]);
    }

    #[test]
    fn test_duplicate_names_keep_insertion_order() {
        let mut roster = Roster::new();
        let first = roster.add("Sam".into(), "+1 5550001".into(), None);
        let second = roster.add("sam".into(), "+1 5550002".into(), None);
        assert_eq!(roster.contacts()[0].id, first);
        assert_eq!(roster.contacts()[1].id, second);
    }

    #[test]
    fn test_remove_preserves_relative_order() {
        let mut roster = Roster::new();
        roster.add("Alice".into(), "+1 5550001".into(), None);
        let bob = roster.add("Bob".into(), "+1 5550002".into(), None);
        roster.add("Charlie".into(), "+1 5550003".into(), None);

        assert!(roster.remove(bob));
        assert_eq!(names(&roster), ["Alice", "Charlie"]);
        assert!(!roster.remove(bob));
        assert_eq!(roster.len(), 2);
    }

    #[test]
    fn test_is_empty_tracks_contents() {
        let mut roster = Roster::new();
        assert!(roster.is_empty());
        let id = roster.add("Alice".into(), "+1 5550001".into(), None);
        assert!(!roster.is_empty());
        roster.remove(id);
        assert!(roster.is_empty());
    }

    #[test]
    fn test_seeded_roster() {
        let roster = Roster::seeded();
        assert_eq!(roster.len(), 5);
        assert_eq!(names(&roster)[0], "Alice Johnson");
        let alice = &roster.contacts()[0];
        assert_eq!(alice.avatar, "AJ");
        assert_eq!(alice.email.as_deref(), Some("alice@example.com"));
    }
}
