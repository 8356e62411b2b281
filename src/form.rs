//! Add-contact form: field editors, submit-time validation, and the
//! validated draft handed to the roster.
//!
//! Validation runs only on a submit attempt. The error record is
//! recomputed from scratch on every attempt, so corrected fields clear
//! and a successful submit resets the form to its pristine state.

use crossterm::event::{Event, KeyEvent};
use tui_input::backend::crossterm::EventHandler;
use tui_input::Input;

use crate::contact::CountryCode;

pub const ERR_NAME_REQUIRED: &str = "Name is required";
pub const ERR_NAME_TOO_SHORT: &str = "Name must be at least 2 characters";
pub const ERR_PHONE_REQUIRED: &str = "Phone number is required";
pub const ERR_PHONE_FORMAT: &str = "Invalid phone number format";
pub const ERR_EMAIL_FORMAT: &str = "Invalid email format";

/// Focusable form fields, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Country,
    Phone,
    Email,
}

impl FormField {
    pub const ALL: [FormField; 4] = [
        FormField::Name,
        FormField::Country,
        FormField::Phone,
        FormField::Email,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Name => "Full Name *",
            FormField::Country => "Country Code",
            FormField::Phone => "Phone Number *",
            FormField::Email => "Email (optional)",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|f| *f == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Field-scoped validation errors from the last submit attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    pub name: Option<&'static str>,
    pub phone: Option<&'static str>,
    pub email: Option<&'static str>,
}

impl FieldErrors {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.phone.is_none() && self.email.is_none()
    }
}

/// Validated parts ready for `Roster::add`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactDraft {
    pub name: String,
    /// Already formatted as "<dial> <local number>".
    pub phone: String,
    pub email: Option<String>,
}

/// Validate raw form input against all field rules at once.
pub fn validate(
    name: &str,
    country: CountryCode,
    phone: &str,
    email: &str,
) -> Result<ContactDraft, FieldErrors> {
    let mut errors = FieldErrors::default();

    let name = name.trim();
    if name.is_empty() {
        errors.name = Some(ERR_NAME_REQUIRED);
    } else if name.chars().count() < 2 {
        errors.name = Some(ERR_NAME_TOO_SHORT);
    }

    let phone = phone.trim();
    if phone.is_empty() {
        errors.phone = Some(ERR_PHONE_REQUIRED);
    } else if !local_number_is_valid(phone) {
        errors.phone = Some(ERR_PHONE_FORMAT);
    }

    let email = email.trim();
    if !email.is_empty() && !email_is_valid(email) {
        errors.email = Some(ERR_EMAIL_FORMAT);
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    Ok(ContactDraft {
        name: name.to_string(),
        phone: format!("{} {}", country.dial(), phone),
        email: if email.is_empty() {
            None
        } else {
            Some(email.to_string())
        },
    })
}

/// 7 to 15 digits once spaces, parentheses, and hyphens are stripped.
fn local_number_is_valid(phone: &str) -> bool {
    let mut digits = 0usize;
    for c in phone.chars() {
        match c {
            '0'..='9' => digits += 1,
            c if c.is_whitespace() => {}
            '(' | ')' | '-' => {}
            _ => return false,
        }
    }
    (7..=15).contains(&digits)
}

/// Basic `local@domain.tld` shape: no whitespace, exactly one `@`, and a
/// dot inside the domain with at least one character on either side.
fn email_is_valid(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let mut parts = email.splitn(2, '@');
    let (Some(local), Some(domain)) = (parts.next(), parts.next()) else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    // A dot somewhere strictly inside the domain.
    domain
        .char_indices()
        .any(|(i, c)| c == '.' && i > 0 && i + 1 < domain.len())
}

/// Live state of the add-contact form.
pub struct ContactForm {
    pub name: Input,
    pub phone: Input,
    pub email: Input,
    pub country: CountryCode,
    pub focus: FormField,
    pub errors: FieldErrors,
}

impl ContactForm {
    pub fn new(default_country: CountryCode) -> Self {
        Self {
            name: Input::default(),
            phone: Input::default(),
            email: Input::default(),
            country: default_country,
            focus: FormField::Name,
            errors: FieldErrors::default(),
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Route a key to the focused text field. The country selector has
    /// no text editor; cycling is handled by the caller.
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        let input = match self.focus {
            FormField::Name => &mut self.name,
            FormField::Phone => &mut self.phone,
            FormField::Email => &mut self.email,
            FormField::Country => return false,
        };
        input.handle_event(&Event::Key(key)).is_some()
    }

    /// Submit attempt: on failure the error record is stored for
    /// rendering and `None` is returned; on success the caller receives
    /// the draft and drops the form.
    pub fn submit(&mut self) -> Option<ContactDraft> {
        match validate(
            self.name.value(),
            self.country,
            self.phone.value(),
            self.email.value(),
        ) {
            Ok(draft) => {
                self.errors = FieldErrors::default();
                Some(draft)
            }
            Err(errors) => {
                self.errors = errors;
                None
            }
        }
    }

    pub fn error_for(&self, field: FormField) -> Option<&'static str> {
        match field {
            FormField::Name => self.errors.name,
            FormField::Phone => self.errors.phone,
            FormField::Email => self.errors.email,
            FormField::Country => None,
        }
    }
}
