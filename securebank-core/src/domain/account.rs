//! Account-level requests: registration and transfers

use std::sync::OnceLock;

use regex::Regex;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::identity::validate_secret;
use super::result::{Error, Result};

/// Categories offered when sending money, as the server stores them
pub const DEFAULT_CATEGORIES: &[&str] = &[
    "Compras Online",
    "Investimentos",
    "Assinaturas",
    "Viagens",
    "Presentes",
    "Serviços",
    "Doações",
];

/// Description used when the sender leaves it blank
pub const DEFAULT_TRANSFER_DESCRIPTION: &str = "Transferência";

fn cpf_pattern() -> &'static Regex {
    static CPF: OnceLock<Regex> = OnceLock::new();
    CPF.get_or_init(|| Regex::new(r"^\d{3}\.\d{3}\.\d{3}-\d{2}$").expect("static CPF pattern"))
}

/// Sign-up form
#[derive(Clone, Serialize, Deserialize)]
pub struct Registration {
    pub name: String,
    /// Formatted as `000.000.000-00`
    pub cpf: String,
    pub alias: String,
    pub secret: String,
    pub secret_confirmation: String,
}

impl Registration {
    pub fn validate(&self) -> Result<()> {
        let required = [
            &self.name,
            &self.cpf,
            &self.alias,
            &self.secret,
            &self.secret_confirmation,
        ];
        if required.iter().any(|f| f.trim().is_empty()) {
            return Err(Error::validation("All fields are required"));
        }
        if !cpf_pattern().is_match(self.cpf.trim()) {
            return Err(Error::validation("Invalid CPF. Use the format 123.456.789-00"));
        }
        validate_secret(&self.secret)?;
        if self.secret != self.secret_confirmation {
            return Err(Error::validation("Secrets do not match"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("alias", &self.alias)
            .finish_non_exhaustive()
    }
}

/// Outgoing transfer to another alias
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRequest {
    pub destination_alias: String,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
}

impl TransferRequest {
    pub fn new(
        destination_alias: impl Into<String>,
        amount: Decimal,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            destination_alias: destination_alias.into(),
            amount,
            description: description.into(),
            category: category.into(),
        }
    }

    /// Validate and fill in defaults, returning the request to send
    pub fn normalized(&self) -> Result<Self> {
        let destination = self.destination_alias.trim();
        if destination.is_empty() || self.category.trim().is_empty() {
            return Err(Error::validation("Destination and category are required"));
        }
        if self.amount <= Decimal::ZERO {
            return Err(Error::validation("Amount must be greater than zero"));
        }
        let description = match self.description.trim() {
            "" => DEFAULT_TRANSFER_DESCRIPTION.to_string(),
            d => d.to_string(),
        };
        Ok(Self {
            destination_alias: destination.to_string(),
            amount: self.amount.round_dp(2),
            description,
            category: self.category.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registration() -> Registration {
        Registration {
            name: "Kaua Zipf".into(),
            cpf: "123.456.789-00".into(),
            alias: "kauazinho".into(),
            secret: "123456".into(),
            secret_confirmation: "123456".into(),
        }
    }

    #[test]
    fn test_registration_valid() {
        assert!(registration().validate().is_ok());
    }

    #[test]
    fn test_registration_rules() {
        let mut r = registration();
        r.cpf = "12345678900".into();
        assert!(r.validate().unwrap_err().to_string().contains("CPF"));

        let mut r = registration();
        r.secret_confirmation = "654321".into();
        assert!(r.validate().unwrap_err().to_string().contains("do not match"));

        let mut r = registration();
        r.secret = "123".into();
        r.secret_confirmation = "123".into();
        assert!(matches!(r.validate(), Err(Error::Validation(_))));

        let mut r = registration();
        r.name = "  ".into();
        assert!(r.validate().unwrap_err().to_string().contains("required"));
    }

    #[test]
    fn test_transfer_normalization() {
        let request = TransferRequest::new(" maria ", Decimal::new(1050, 2), "  ", "Presentes");
        let normalized = request.normalized().unwrap();
        assert_eq!(normalized.destination_alias, "maria");
        assert_eq!(normalized.description, "Transferência");
        assert_eq!(normalized.category, "Presentes");

        let zero = TransferRequest::new("maria", Decimal::ZERO, "", "Presentes");
        assert!(zero.normalized().is_err());

        let no_category = TransferRequest::new("maria", Decimal::ONE, "", "");
        assert!(no_category.normalized().is_err());
    }
}
