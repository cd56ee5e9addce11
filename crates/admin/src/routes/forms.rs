//! Multipart form reading for the item and banner editors.

use std::collections::HashMap;

use axum::extract::Multipart;
use rust_decimal::Decimal;

use crate::api::Upload;
use crate::error::{AppError, Result};

/// Largest image accepted from the editors.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// Text fields plus the optional `image` file of a multipart form.
#[derive(Debug, Default)]
pub struct FormFields {
    text: HashMap<String, String>,
    pub image: Option<Upload>,
}

impl FormFields {
    /// Drain `multipart`. An `image` part with no file name or no bytes
    /// means "keep the current image".
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for malformed bodies or oversized images.
    pub async fn read(mut multipart: Multipart) -> Result<Self> {
        let mut fields = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?
        {
            let name = field.name().unwrap_or_default().to_string();

            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;

                if bytes.len() > MAX_IMAGE_BYTES {
                    return Err(AppError::BadRequest("Image is larger than 5 MB".to_string()));
                }
                if !file_name.is_empty() && !bytes.is_empty() {
                    fields.image = Some(Upload {
                        file_name,
                        content_type,
                        bytes: bytes.to_vec(),
                    });
                }
                continue;
            }

            let value = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(e.to_string()))?;
            fields.text.insert(name, value);
        }

        Ok(fields)
    }

    /// Build from plain pairs.
    #[cfg(test)]
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        Self {
            text: pairs
                .iter()
                .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
                .collect(),
            image: None,
        }
    }

    /// Trimmed text value, empty when absent.
    #[must_use]
    pub fn text(&self, name: &str) -> &str {
        self.text.get(name).map_or("", |v| v.trim())
    }

    /// Whether a checkbox was ticked.
    #[must_use]
    pub fn checked(&self, name: &str) -> bool {
        matches!(self.text(name), "on" | "true" | "1")
    }
}

/// Parse a non-negative money amount.
///
/// # Errors
///
/// Returns a message naming `label` when the value is not a valid amount.
pub fn parse_amount(raw: &str, label: &str) -> std::result::Result<Decimal, String> {
    let amount: Decimal = raw
        .trim_start_matches('$')
        .parse()
        .map_err(|_| format!("{label} must be a number"))?;
    if amount.is_sign_negative() {
        return Err(format!("{label} cannot be negative"));
    }
    Ok(amount.round_dp(2))
}

/// Split a comma-separated list, dropping blanks.
#[must_use]
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("19.99", "Price").unwrap(), Decimal::new(1999, 2));
        assert_eq!(parse_amount("$5", "Price").unwrap(), Decimal::from(5));
        assert_eq!(parse_amount("abc", "Price").unwrap_err(), "Price must be a number");
        assert_eq!(parse_amount("-1", "Price").unwrap_err(), "Price cannot be negative");
    }

    #[test]
    fn test_split_list_drops_blanks() {
        assert_eq!(split_list(" S, M ,,L "), vec!["S", "M", "L"]);
        assert!(split_list("").is_empty());
    }

    #[test]
    fn test_checkbox_values() {
        let fields = FormFields::from_pairs(&[("shipping", "on"), ("other", "off")]);
        assert!(fields.checked("shipping"));
        assert!(!fields.checked("other"));
        assert!(!fields.checked("missing"));
    }
}
