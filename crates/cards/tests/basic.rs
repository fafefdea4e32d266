#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::str::FromStr;

use cards::{CardExpiration, CardIssuer, CardNumber, CardSecurityCode};
use common_utils::date_time;
use masking::PeekInterface;

#[test]
fn card_number_validation_and_detection() {
    let card = CardNumber::from_str("4111 1111 1111 1111").unwrap();

    assert_eq!(card.get_card_no(), "4111111111111111");
    assert_eq!(card.get_card_isin(), "411111");
    assert_eq!(card.get_last4(), "1111");
    assert_eq!(card.issuer(), Some(CardIssuer::Visa));

    // Luhn failure
    assert!(CardNumber::from_str("4111 1111 1111 1112").is_err());
}

#[test]
fn card_number_never_leaks_in_debug_output() {
    let card = CardNumber::from_str("5555 5555 5555 4444").unwrap();
    let formatted = format!("{:?}", *card);

    assert!(!formatted.contains("5555555555554444"));
    assert!(formatted.starts_with("555555"));
}

#[test]
fn expiration_against_the_current_date() {
    let curr_date = date_time::now();
    let curr_year = u16::try_from(curr_date.year()).expect("valid year");
    let curr_month = u8::from(curr_date.month());

    // a card expiring this month is still valid
    let current = CardExpiration::new(curr_month.into(), curr_year.into()).unwrap();
    assert!(!current.is_expired().unwrap());

    let past = CardExpiration::new(1.into(), (curr_year - 1).into()).unwrap();
    assert!(past.is_expired().unwrap());

    assert!(CardExpiration::new(13.into(), curr_year.into()).is_err());
}

#[test]
fn expiration_wire_digits() {
    let expiration = CardExpiration::new(3.into(), 2031.into()).unwrap();

    assert_eq!(expiration.get_month().two_digits(), "03");
    assert_eq!(expiration.get_year().four_digits(), "2031");
}

#[test]
fn security_code_accepts_three_and_four_digits() {
    let csc = CardSecurityCode::new(1234.into()).unwrap();
    assert_eq!(*csc.peek().peek(), 1234);

    assert!(CardSecurityCode::new(100.into()).is_ok());
    assert!(CardSecurityCode::new(0.into()).is_err());
}
