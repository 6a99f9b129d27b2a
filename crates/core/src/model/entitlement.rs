use serde::{Deserialize, Serialize};

/// Paid access tier of the learner.
///
/// Granted once by a successful purchase and never revoked: there is no
/// expiry or refund path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Entitlement {
    premium: bool,
}

impl Entitlement {
    #[must_use]
    pub fn free() -> Self {
        Self { premium: false }
    }

    #[must_use]
    pub fn premium() -> Self {
        Self { premium: true }
    }

    #[must_use]
    pub fn from_flag(premium: bool) -> Self {
        Self { premium }
    }

    /// Reads the persisted text form. Only `"true"` grants premium; anything
    /// else, including a missing value, is the free tier.
    #[must_use]
    pub fn from_persisted(raw: Option<&str>) -> Self {
        Self::from_flag(raw.is_some_and(|value| value.trim() == "true"))
    }

    #[must_use]
    pub fn is_premium(&self) -> bool {
        self.premium
    }

    /// Applies a purchase. Returns `true` when the tier actually changed.
    pub fn grant(&mut self) -> bool {
        let changed = !self.premium;
        self.premium = true;
        changed
    }

    #[must_use]
    pub fn as_persisted(&self) -> &'static str {
        if self.premium { "true" } else { "false" }
    }
}
