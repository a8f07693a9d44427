use super::poller::ReconcileError;
use reqwest::Url;

const TRADE_NO_PARAM: &str = "trade_no";
const STATUS_PARAM: &str = "status";

/// Parameters the gateway appends to the return URL after a 3DS challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReturnParams {
    pub trade_no: Option<String>,
    pub status: Option<String>,
    /// The URL with `trade_no` and `status` removed and every other
    /// parameter left in place.
    pub cleaned_url: String,
}

impl ReturnParams {
    pub fn parse(url: &str) -> Result<Self, ReconcileError> {
        let mut parsed =
            Url::parse(url).map_err(|e| ReconcileError::InvalidReturnUrl(e.to_string()))?;

        let mut trade_no = None;
        let mut status = None;
        let mut kept = Vec::new();
        for (key, value) in parsed.query_pairs() {
            match key.as_ref() {
                TRADE_NO_PARAM => trade_no = Some(value.into_owned()).filter(|v| !v.is_empty()),
                STATUS_PARAM => status = Some(value.into_owned()).filter(|v| !v.is_empty()),
                _ => kept.push((key.into_owned(), value.into_owned())),
            }
        }

        if kept.is_empty() {
            parsed.set_query(None);
        } else {
            parsed.query_pairs_mut().clear().extend_pairs(kept);
        }

        Ok(Self {
            trade_no,
            status,
            cleaned_url: parsed.to_string(),
        })
    }

    pub fn has_callback(&self) -> bool {
        self.trade_no.is_some() || self.status.is_some()
    }
}
