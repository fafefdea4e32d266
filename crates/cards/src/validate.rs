use std::{fmt, ops::Deref, str::FromStr};

use masking::{PeekInterface, Secret, Strategy, WithType};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Debug, Deserialize, Serialize, Error)]
#[error("not a valid credit card number")]
pub struct CCValError;

impl From<core::convert::Infallible> for CCValError {
    fn from(_: core::convert::Infallible) -> Self {
        Self
    }
}

/// Card number
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct CardNumber(Secret<String, CardNumberStrategy>);

/// The card network a number belongs to, detected from its prefix.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum CardIssuer {
    Visa,
    Mastercard,
    Discover,
    Amex,
    Jcb,
    Diners,
    Maestro,
}

// Prefix patterns overlap (e.g. Maestro shares leading digits with
// MasterCard), so detection walks this list in order and takes the first
// match.
static ISSUER_PATTERNS: Lazy<Vec<(CardIssuer, Regex)>> = Lazy::new(|| {
    [
        (CardIssuer::Visa, r"^4[0-9]{12}(?:[0-9]{3,6})?$"),
        (
            CardIssuer::Mastercard,
            r"^(?:5[1-5][0-9]{2}|222[1-9]|22[3-9][0-9]|2[3-6][0-9]{2}|27[01][0-9]|2720)[0-9]{12}$",
        ),
        (CardIssuer::Discover, r"^6(?:011|5[0-9]{2})[0-9]{12,15}$"),
        (CardIssuer::Amex, r"^3[47][0-9]{13}$"),
        (CardIssuer::Jcb, r"^(?:(?:2131|1800|35\d{3})\d{11})$"),
        (CardIssuer::Diners, r"^(?:3(?:0[0-5]|[68][0-9])[0-9]{11})$"),
        (
            CardIssuer::Maestro,
            r"^(?:5[0678]\d\d|6304|6390|67\d\d)\d{8,15}$",
        ),
    ]
    .into_iter()
    .filter_map(|(issuer, pattern)| Regex::new(pattern).ok().map(|regex| (issuer, regex)))
    .collect()
});

impl CardNumber {
    pub fn get_card_isin(&self) -> String {
        self.0.peek().chars().take(6).collect::<String>()
    }

    pub fn get_last4(&self) -> String {
        self.0
            .peek()
            .chars()
            .rev()
            .take(4)
            .collect::<String>()
            .chars()
            .rev()
            .collect::<String>()
    }

    pub fn get_card_no(&self) -> String {
        self.0.peek().clone()
    }

    /// Detect the card network from the number prefix, first match wins.
    pub fn issuer(&self) -> Option<CardIssuer> {
        let number = self.0.peek();
        ISSUER_PATTERNS
            .iter()
            .find(|(_, regex)| regex.is_match(number))
            .map(|(issuer, _)| *issuer)
    }
}

impl FromStr for CardNumber {
    type Err = CCValError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let cc_no_whitespace: String = s.split_whitespace().collect();
        match luhn::valid(&cc_no_whitespace) {
            true => Ok(Self(Secret::new(cc_no_whitespace))),
            false => Err(CCValError),
        }
    }
}

impl TryFrom<String> for CardNumber {
    type Error = CCValError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str(&value)
    }
}

impl Deref for CardNumber {
    type Target = Secret<String, CardNumberStrategy>;

    fn deref(&self) -> &Secret<String, CardNumberStrategy> {
        &self.0
    }
}

impl<'de> Deserialize<'de> for CardNumber {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Self::from_str(&s).map_err(serde::de::Error::custom)
    }
}

pub enum CardNumberStrategy {}

impl<T> Strategy<T> for CardNumberStrategy
where
    T: AsRef<str>,
{
    fn fmt(val: &T, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val_str: &str = val.as_ref();

        if val_str.len() < 15 || val_str.len() > 19 {
            return WithType::fmt(val, f);
        }

        if let Some(value) = val_str.get(..6) {
            write!(f, "{}{}", value, "*".repeat(val_str.len() - 6))
        } else {
            WithType::fmt(val, f)
        }
    }
}
