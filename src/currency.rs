use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
    #[serde(rename = "NOK")]
    Nok,
    #[serde(rename = "UNITS")]
    Units,
}

impl Currency {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "USD" => Some(Currency::Usd),
            "NOK" => Some(Currency::Nok),
            "UNITS" => Some(Currency::Units),
            _ => None,
        }
    }

    pub fn format(self, value: f64) -> String {
        match self {
            Currency::Usd => format!("${value:.2}"),
            Currency::Nok => format!("{value:.2} kr"),
            Currency::Units => format!("{value:.2} U"),
        }
    }

    pub fn format_signed(self, value: f64) -> String {
        if value >= 0.0 {
            format!("+{}", self.format(value))
        } else {
            self.format(value)
        }
    }
}
