use serde::{Deserialize, Serialize};

/// The gateway token, as Flow posts it to the confirmation webhook and the return URL.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TokenParams {
    #[serde(default)]
    pub token: Option<String>,
}

impl TokenParams {
    /// The first non-blank token among the candidates.
    pub fn first_token(candidates: &[Option<&TokenParams>]) -> Option<String> {
        candidates
            .iter()
            .flatten()
            .filter_map(|p| p.token.as_deref())
            .map(str::trim)
            .find(|t| !t.is_empty())
            .map(String::from)
    }
}

/// The only body the confirmation webhook ever returns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfirmationAck {
    pub status: String,
}

impl ConfirmationAck {
    pub fn received() -> Self {
        Self { status: "received".to_string() }
    }
}
