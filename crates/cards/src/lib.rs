pub mod validate;

use common_utils::{date_time, errors};
use error_stack::report;
use masking::{PeekInterface, Secret};
use time::{util::days_in_year_month, Date, Duration, Month, PrimitiveDateTime, Time};
pub use validate::{CCValError, CardIssuer, CardNumber, CardNumberStrategy};

pub struct CardSecurityCode(Secret<u16>);

impl CardSecurityCode {
    pub fn new(secret: Secret<u16>) -> errors::CustomResult<Self, errors::ValidationError> {
        let csc = secret.peek();

        if *csc > 99 && *csc < 10000 {
            Ok(Self(secret))
        } else {
            Err(report!(errors::ValidationError::InvalidValue {
                message: "invalid card security code".to_string()
            }))
        }
    }
}

pub struct CardExpirationMonth(Secret<u8>);

impl CardExpirationMonth {
    pub fn new(secret: Secret<u8>) -> errors::CustomResult<Self, errors::ValidationError> {
        let month = secret.peek();

        if *month >= 1 && *month <= 12 {
            Ok(Self(secret))
        } else {
            Err(report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration month".to_string()
            }))
        }
    }

    pub fn two_digits(&self) -> String {
        let month = self.0.peek();
        let month_str: String = month.to_string();
        if month_str.len() == 1 {
            format!("0{month_str}")
        } else {
            month_str
        }
    }
}

pub struct CardExpirationYear(Secret<u16>);

impl CardExpirationYear {
    pub fn new(secret: Secret<u16>) -> errors::CustomResult<Self, errors::ValidationError> {
        let year = secret.peek();

        if *year >= 1997 {
            Ok(Self(secret))
        } else {
            Err(report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration year".to_string()
            }))
        }
    }

    pub fn four_digits(&self) -> String {
        self.0.peek().to_string()
    }
}

pub struct CardExpiration {
    pub month: CardExpirationMonth,
    pub year: CardExpirationYear,
}

impl CardExpiration {
    pub fn new(
        secret_month: Secret<u8>,
        secret_year: Secret<u16>,
    ) -> errors::CustomResult<Self, errors::ValidationError> {
        let month = CardExpirationMonth::new(secret_month)?;
        let year = CardExpirationYear::new(secret_year)?;
        Ok(Self { month, year })
    }

    /// The expiration as a calendar date, pinned to the first of the month.
    pub fn as_date(&self) -> errors::CustomResult<Date, errors::ValidationError> {
        let month = Month::try_from(*self.month.0.peek()).map_err(|_| {
            report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration month".to_string()
            })
        })?;
        Date::from_calendar_date(i32::from(*self.year.0.peek()), month, 1).map_err(|_| {
            report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration date".to_string()
            })
        })
    }

    pub fn is_expired(&self) -> errors::CustomResult<bool, errors::ValidationError> {
        let current_datetime_utc = date_time::now();

        let month = Month::try_from(*self.month.0.peek()).map_err(|_| {
            report!(errors::ValidationError::InvalidValue {
                message: "invalid card expiration month".to_string()
            })
        })?;

        // card expiry day is last day of the expiration month
        let expiration_day = days_in_year_month(i32::from(*self.year.0.peek()), month);

        let expiration_date =
            Date::from_calendar_date(i32::from(*self.year.0.peek()), month, expiration_day)
                .map_err(|_| {
                    report!(errors::ValidationError::InvalidValue {
                        message: "invalid card expiration date".to_string()
                    })
                })?;

        // actual expiry is local to the cardholder; compensate for the
        // maximum utc offset by allowing an extra day
        let expiration_datetime_utc = PrimitiveDateTime::new(expiration_date, Time::MIDNIGHT)
            .saturating_add(Duration::days(1));

        Ok(current_datetime_utc
            > time::OffsetDateTime::new_utc(
                expiration_datetime_utc.date(),
                expiration_datetime_utc.time(),
            ))
    }

    pub fn get_month(&self) -> &CardExpirationMonth {
        &self.month
    }

    pub fn get_year(&self) -> &CardExpirationYear {
        &self.year
    }
}

impl PeekInterface<Secret<u16>> for CardSecurityCode {
    fn peek(&self) -> &Secret<u16> {
        &self.0
    }
}

impl PeekInterface<Secret<u8>> for CardExpirationMonth {
    fn peek(&self) -> &Secret<u8> {
        &self.0
    }
}

impl PeekInterface<Secret<u16>> for CardExpirationYear {
    fn peek(&self) -> &Secret<u16> {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn expiration_validates_month_and_year() {
        assert!(CardExpiration::new(5.into(), 2031.into()).is_ok());
        assert!(CardExpiration::new(13.into(), 2031.into()).is_err());
        assert!(CardExpiration::new(5.into(), 1901.into()).is_err());
    }

    #[test]
    fn expiration_as_date_pins_the_first_of_month() {
        let expiration = CardExpiration::new(5.into(), 2031.into()).unwrap();
        let date = expiration.as_date().unwrap();
        assert_eq!(date.day(), 1);
        assert_eq!(date.month(), Month::May);
        assert_eq!(date.year(), 2031);
    }

    #[test]
    fn expiration_in_the_past_is_expired() {
        let expired = CardExpiration::new(1.into(), 2020.into()).unwrap();
        assert!(expired.is_expired().unwrap());

        let valid = CardExpiration::new(12.into(), 2099.into()).unwrap();
        assert!(!valid.is_expired().unwrap());
    }

    #[test]
    fn security_code_bounds() {
        assert!(CardSecurityCode::new(123.into()).is_ok());
        assert!(CardSecurityCode::new(99.into()).is_err());
        assert!(CardSecurityCode::new(10000.into()).is_err());
    }

    #[test]
    fn expiration_month_two_digits_pads() {
        let month = CardExpirationMonth::new(5.into()).unwrap();
        assert_eq!(month.two_digits(), "05");
    }
}
