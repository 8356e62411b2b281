//! Contact record and the fixed country-code enumeration.

/// Unique contact identifier.
///
/// Milliseconds since the Unix epoch at creation time. The roster bumps
/// colliding values so ids stay strictly monotonic within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContactId(pub i64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contact {
    pub id: ContactId,
    pub name: String,
    /// Formatted as "<dial code> <local number>", e.g. "+1 555-234-5678".
    pub phone: String,
    pub email: Option<String>,
    /// Initials derived from `name`; recomputed only at creation.
    pub avatar: String,
}

impl Contact {
    pub fn new(
        id: ContactId,
        name: impl Into<String>,
        phone: impl Into<String>,
        email: Option<String>,
    ) -> Self {
        let name = name.into();
        let avatar = initials(&name);
        Self {
            id,
            name,
            phone: phone.into(),
            email: email.filter(|e| !e.is_empty()),
            avatar,
        }
    }
}

/// Derive the avatar label from a display name: one initial per
/// whitespace-separated token, uppercased, at most 2 characters.
pub fn initials(name: &str) -> String {
    name.split_whitespace()
        .filter_map(|token| token.chars().next())
        .flat_map(|c| c.to_uppercase())
        .take(2)
        .collect()
}

/// Dialing-code prefixes selectable when entering a phone number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountryCode {
    UsCa,
    Uk,
    In,
    Au,
    Jp,
}

impl CountryCode {
    pub const ALL: [CountryCode; 5] = [
        CountryCode::UsCa,
        CountryCode::Uk,
        CountryCode::In,
        CountryCode::Au,
        CountryCode::Jp,
    ];

    /// The dial string stored into `Contact::phone`.
    pub fn dial(self) -> &'static str {
        match self {
            CountryCode::UsCa => "+1",
            CountryCode::Uk => "+44",
            CountryCode::In => "+91",
            CountryCode::Au => "+61",
            CountryCode::Jp => "+81",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CountryCode::UsCa => "US/CA",
            CountryCode::Uk => "UK",
            CountryCode::In => "IN",
            CountryCode::Au => "AU",
            CountryCode::Jp => "JP",
        }
    }

    /// Parse from a dial string like "+44".
    pub fn from_dial(s: &str) -> Option<Self> {
        match s.trim() {
            "+1" => Some(CountryCode::UsCa),
            "+44" => Some(CountryCode::Uk),
            "+91" => Some(CountryCode::In),
            "+61" => Some(CountryCode::Au),
            "+81" => Some(CountryCode::Jp),
            _ => None,
        }
    }

    /// Next code in `ALL`, wrapping around.
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    /// Previous code in `ALL`, wrapping around.
    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}
