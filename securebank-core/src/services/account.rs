//! Account service - registration, balance and transfers

use std::sync::Arc;

use rust_decimal::Decimal;

use crate::domain::result::Result;
use crate::domain::{Registration, Session, TransferRequest};
use crate::ports::BankApi;
use crate::services::logging::{record, LogEvent, LoggingService};

/// Account operations that sit outside the session lifecycle
pub struct AccountService {
    api: Arc<dyn BankApi>,
    logger: Option<Arc<LoggingService>>,
}

impl AccountService {
    pub fn new(api: Arc<dyn BankApi>) -> Self {
        Self { api, logger: None }
    }

    pub fn with_logger(mut self, logger: Arc<LoggingService>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Create an account. The form is validated before any request is made.
    pub async fn register(&self, registration: &Registration) -> Result<()> {
        registration.validate()?;

        match self.api.register(registration).await {
            Ok(()) => {
                record(self.logger.as_deref(), LogEvent::new("account_registered").with_screen("register"));
                Ok(())
            }
            Err(e) => {
                record(
                    self.logger.as_deref(),
                    LogEvent::new("registration_failed")
                        .with_screen("register")
                        .with_error(e.to_string()),
                );
                Err(e)
            }
        }
    }

    pub async fn balance(&self, session: &Session) -> Result<Decimal> {
        self.api.balance(&session.token).await
    }

    /// Send money; returns the request as it was sent (defaults filled in)
    pub async fn transfer(&self, session: &Session, request: &TransferRequest) -> Result<TransferRequest> {
        let request = request.normalized()?;

        if let Err(e) = self.api.send_transfer(&session.token, &request).await {
            record(
                self.logger.as_deref(),
                LogEvent::new("transfer_failed")
                    .with_screen("send")
                    .with_error(e.to_string()),
            );
            return Err(e);
        }

        record(self.logger.as_deref(), LogEvent::new("transfer_sent").with_screen("send"));
        Ok(request)
    }
}
