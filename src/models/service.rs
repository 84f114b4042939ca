use serde::{Deserialize, Serialize};

/// A bookable service offering. Bookings snapshot duration and price at
/// creation time, so editing a service never rewrites past bookings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub name: String,
    pub duration_minutes: u16,
    pub price_cents: i64,
    pub upfront_fee_cents: i64,
    pub category: Option<String>,
    pub active: bool,
}

impl Service {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.duration_minutes == 0 {
            anyhow::bail!("service duration must be positive");
        }
        if self.price_cents < 0 {
            anyhow::bail!("price must be non-negative");
        }
        if self.upfront_fee_cents < 0 || self.upfront_fee_cents > self.price_cents {
            anyhow::bail!("upfront fee must be between 0 and the price");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> Service {
        Service {
            id: "svc-1".to_string(),
            name: "Haircut".to_string(),
            duration_minutes: 30,
            price_cents: 4500,
            upfront_fee_cents: 1000,
            category: None,
            active: true,
        }
    }

    #[test]
    fn test_valid_service() {
        assert!(service().validate().is_ok());
    }

    #[test]
    fn test_zero_duration_rejected() {
        let mut s = service();
        s.duration_minutes = 0;
        assert!(s.validate().is_err());
    }

    #[test]
    fn test_upfront_fee_above_price_rejected() {
        let mut s = service();
        s.upfront_fee_cents = 5000;
        assert!(s.validate().is_err());
    }
}
