// src/middleware/i18n.rs

use axum::extract::FromRequestParts;
use axum::http::{header, request::Parts};

use crate::common::i18n::DEFAULT_LANG;

/// Idioma preferido do cliente, lido do `Accept-Language`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale(pub String);

impl Locale {
    pub fn from_header(value: Option<&str>) -> Self {
        let lang = value
            .and_then(|header_str| {
                accept_language::parse(header_str)
                    .first()
                    // "pt-BR" -> "pt"
                    .map(|tag| tag.split('-').next().unwrap_or(tag).to_ascii_lowercase())
            })
            .filter(|lang| !lang.is_empty() && lang != "*")
            .unwrap_or_else(|| DEFAULT_LANG.to_string());

        Locale(lang)
    }
}

impl Default for Locale {
    fn default() -> Self {
        Locale(DEFAULT_LANG.to_string())
    }
}

impl<S> FromRequestParts<S> for Locale
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::ACCEPT_LANGUAGE)
            .and_then(|value| value.to_str().ok());

        Ok(Locale::from_header(header_value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_primary_tag_of_highest_quality() {
        assert_eq!(Locale::from_header(Some("en-US,en;q=0.9,pt;q=0.8")).0, "en");
        assert_eq!(Locale::from_header(Some("pt;q=0.5, EN-gb;q=0.9")).0, "en");
    }

    #[test]
    fn falls_back_to_default() {
        assert_eq!(Locale::from_header(None).0, DEFAULT_LANG);
        assert_eq!(Locale::from_header(Some("")).0, DEFAULT_LANG);
    }
}
