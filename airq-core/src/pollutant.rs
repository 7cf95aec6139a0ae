use serde::{Deserialize, Serialize};
use std::fmt;

/// Pollutants the remote service can report on (TEMPO satellite products).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub enum Pollutant {
    #[default]
    No2,
    O3,
    Hcho,
}

impl Pollutant {
    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::No2 => "NO2",
            Pollutant::O3 => "O3",
            Pollutant::Hcho => "HCHO",
        }
    }

    pub const fn all() -> &'static [Pollutant] {
        &[Pollutant::No2, Pollutant::O3, Pollutant::Hcho]
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Pollutant {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let upper = value.trim().to_uppercase();

        match upper.as_str() {
            "NO2" => Ok(Pollutant::No2),
            "O3" => Ok(Pollutant::O3),
            "HCHO" => Ok(Pollutant::Hcho),
            _ => Err(anyhow::anyhow!(
                "Unknown pollutant '{value}'. Supported pollutants: NO2, O3, HCHO."
            )),
        }
    }
}

impl TryFrom<String> for Pollutant {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Pollutant::try_from(value.as_str())
    }
}

impl From<Pollutant> for String {
    fn from(value: Pollutant) -> Self {
        value.as_str().to_string()
    }
}
