use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Placeholder symbol for hours where no forecast horizon carried one
pub const UNKNOWN_SYMBOL: &str = "unknown";

/// met.no base symbol codes with display label and comfort score
const WEATHER_SYMBOLS: &[(&str, &str, i32)] = &[
    ("clearsky", "Sunny", 7),
    ("fair", "Mostly Sunny", 5),
    ("partlycloudy", "Partly Cloudy", 3),
    ("cloudy", "Cloudy", 1),
    ("lightrain", "Light Rain", -3),
    ("lightrainshowers", "Light Rain", -3),
    ("lightsleet", "Light Sleet", -4),
    ("lightsleetshowers", "Light Sleet", -4),
    ("lightsnow", "Light Snow", -4),
    ("lightsnowshowers", "Light Snow", -4),
    ("rain", "Rain", -6),
    ("rainshowers", "Rain", -6),
    ("sleet", "Sleet", -7),
    ("sleetshowers", "Sleet", -7),
    ("snow", "Snow", -7),
    ("snowshowers", "Snow", -7),
    ("heavyrain", "Heavy Rain", -10),
    ("heavyrainshowers", "Heavy Rain", -10),
    ("heavysleet", "Heavy Sleet", -10),
    ("heavysleetshowers", "Heavy Sleet", -10),
    ("heavysnow", "Heavy Snow", -10),
    ("heavysnowshowers", "Heavy Snow", -10),
    ("fog", "Foggy", -5),
    ("thunderstorm", "Thunderstorm", -15),
    ("lightrainandthunder", "Light Rain and Thunder", -12),
    ("lightrainshowersandthunder", "Light Rain and Thunder", -12),
    ("rainandthunder", "Rain and Thunder", -13),
    ("rainshowersandthunder", "Rain and Thunder", -13),
    ("heavyrainandthunder", "Heavy Rain and Thunder", -15),
    ("heavyrainshowersandthunder", "Heavy Rain and Thunder", -15),
    ("lightsleetandthunder", "Light Sleet and Thunder", -12),
    // met.no spells the light showers variants with a double "s"
    ("lightssleetshowersandthunder", "Light Sleet and Thunder", -12),
    ("sleetandthunder", "Sleet and Thunder", -13),
    ("sleetshowersandthunder", "Sleet and Thunder", -13),
    ("heavysleetandthunder", "Heavy Sleet and Thunder", -15),
    ("heavysleetshowersandthunder", "Heavy Sleet and Thunder", -15),
    ("lightsnowandthunder", "Light Snow and Thunder", -12),
    ("lightssnowshowersandthunder", "Light Snow and Thunder", -12),
    ("snowandthunder", "Snow and Thunder", -13),
    ("snowshowersandthunder", "Snow and Thunder", -13),
    ("heavysnowandthunder", "Heavy Snow and Thunder", -15),
    ("heavysnowshowersandthunder", "Heavy Snow and Thunder", -15),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SymbolInfo {
    pub label: String,
    pub score: i32,
}

/// Look up a base symbol. Unknown symbols score 0 with a humanized label.
pub fn symbol_info(symbol: &str) -> SymbolInfo {
    match WEATHER_SYMBOLS.iter().find(|(code, _, _)| *code == symbol) {
        Some((_, label, score)) => SymbolInfo {
            label: (*label).to_string(),
            score: *score,
        },
        None => SymbolInfo {
            label: humanize(symbol),
            score: 0,
        },
    }
}

fn humanize(symbol: &str) -> String {
    if symbol.is_empty() {
        return "Unknown".to_string();
    }
    let spaced = symbol.replace('_', " ");
    let mut chars = spaced.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => "Unknown".to_string(),
    }
}

/// Strip the `_day` / `_night` / `_polartwilight` suffix from a met.no code
pub fn base_symbol(symbol_code: Option<&str>) -> String {
    match symbol_code.map(str::trim).filter(|s| !s.is_empty()) {
        Some(code) => code.split('_').next().unwrap_or(code).to_string(),
        None => UNKNOWN_SYMBOL.to_string(),
    }
}

/// Coarse weather classification of an hour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum WeatherClass {
    Sunny,
    Cloudy,
    Rainy,
}

impl WeatherClass {
    pub fn from_symbol(symbol: &str) -> Self {
        if symbol == "clearsky" || symbol == "fair" {
            Self::Sunny
        } else if symbol.contains("rain") {
            Self::Rainy
        } else {
            Self::Cloudy
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sunny => "sunny",
            Self::Cloudy => "cloudy",
            Self::Rainy => "rainy",
        }
    }
}

impl std::fmt::Display for WeatherClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
