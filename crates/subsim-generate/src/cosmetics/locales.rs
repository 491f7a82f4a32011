use subsim_core::Currency;

/// Locales user contact fields are drawn from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LocaleKey {
    En,
    FrFr,
}

/// Locale and country a user tied to `currency` is drawn from.
pub fn region_for(currency: Currency) -> (LocaleKey, &'static str) {
    match currency {
        Currency::Usd => (LocaleKey::En, "United States"),
        Currency::Eur => (LocaleKey::FrFr, "France"),
        Currency::Gbp => (LocaleKey::En, "United Kingdom"),
    }
}
