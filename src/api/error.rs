use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Error {status} - {summary} ({reason}) - {url}", summary = status_summary(.status))]
    HttpStatus {
        status: u16,
        reason: String,
        url: String,
    },

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("Failed to decode JSON body from {0}")]
    BodyDecode(String, #[source] reqwest::Error),

    #[error("Failed to sign the API token")]
    TokenSigning(#[source] jsonwebtoken::errors::Error),
}

impl ApiError {
    /// The upstream HTTP status, if the request got far enough to receive one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::HttpStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}

fn status_summary(status: &u16) -> &'static str {
    match status {
        401 => "Unauthorized",
        404 => "Not found",
        500 => "Internal server error",
        _ => "Unknown error",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_message() {
        let err = ApiError::HttpStatus {
            status: 404,
            reason: "Not Found".to_string(),
            url: "https://api.euskadi.eus/euskalmet/sensors/X".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Error 404 - Not found (Not Found) - https://api.euskadi.eus/euskalmet/sensors/X"
        );
        assert!(err.is_not_found());
    }

    #[test]
    fn test_unknown_status_summary() {
        let err = ApiError::HttpStatus {
            status: 418,
            reason: "I'm a teapot".to_string(),
            url: "u".to_string(),
        };
        assert_eq!(err.to_string(), "Error 418 - Unknown error (I'm a teapot) - u");
        assert_eq!(err.status(), Some(418));
        assert!(!err.is_not_found());
    }
}
