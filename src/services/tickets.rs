//! Проверка билетов по QR-коду.
//!
//! Распознавание QR на картинке - внешняя способность ([`QrDecoder`]).
//! Если распознать не удалось, картинка уходит на сервер data-URL'ом.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use thiserror::Error;
use tracing::{debug, info};

use crate::api_client::{ApiClient, ApiError, TicketValidation, TicketValidationRequest};
use crate::session::Credentials;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrDecodeError {
    #[error("no QR code found in image")]
    NotFound,
    #[error("QR decoding is not available")]
    Unsupported,
    #[error("QR decoding failed: {0}")]
    Failed(String),
}

pub trait QrDecoder: Send + Sync {
    fn decode(&self, image: &[u8]) -> Result<String, QrDecodeError>;
}

/// Декодер-заглушка: всегда отдаёт распознавание серверу.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQrDecoder;

impl QrDecoder for NoQrDecoder {
    fn decode(&self, _image: &[u8]) -> Result<String, QrDecodeError> {
        Err(QrDecodeError::Unsupported)
    }
}

pub struct TicketValidator<D = NoQrDecoder> {
    api: ApiClient,
    decoder: D,
}

impl TicketValidator<NoQrDecoder> {
    pub fn new(api: ApiClient) -> Self {
        Self { api, decoder: NoQrDecoder }
    }
}

impl<D: QrDecoder> TicketValidator<D> {
    pub fn with_decoder(api: ApiClient, decoder: D) -> Self {
        Self { api, decoder }
    }

    /// Пустой текст считается недействительным билетом без обращения к серверу.
    pub async fn validate_text(&self, credentials: &Credentials, qr: &str) -> Result<TicketValidation, ApiError> {
        let qr = qr.trim();
        if qr.is_empty() {
            return Ok(TicketValidation {
                valid: false,
                message: Some("QR code is empty".to_string()),
                ticket: None,
            });
        }

        let result = self
            .api
            .validate_ticket(credentials, &TicketValidationRequest { qr: Some(qr.to_string()), qr_image: None })
            .await?;
        info!("Ticket validation result: valid={}", result.valid);
        Ok(result)
    }

    pub async fn validate_image(
        &self,
        credentials: &Credentials,
        image: &[u8],
        mime_type: &str,
    ) -> Result<TicketValidation, ApiError> {
        match self.decoder.decode(image) {
            Ok(text) => self.validate_text(credentials, &text).await,
            Err(e) => {
                debug!("Local QR decoding failed ({}), sending image to server", e);
                let request = TicketValidationRequest { qr: None, qr_image: Some(data_url(image, mime_type)) };
                self.api.validate_ticket(credentials, &request).await
            }
        }
    }
}

pub fn data_url(bytes: &[u8], mime_type: &str) -> String {
    format!("data:{};base64,{}", mime_type, STANDARD.encode(bytes))
}
