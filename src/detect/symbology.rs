use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Barcode/QR encoding standards the detector can be asked for.
///
/// Wire names follow the host capability's format identifiers
/// ("qr_code", "ean_13", ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Symbology {
    #[serde(rename = "qr_code")]
    QrCode,
    #[serde(rename = "code_128")]
    Code128,
    #[serde(rename = "ean_13")]
    Ean13,
    #[serde(rename = "code_39")]
    Code39,
    #[serde(rename = "code_93")]
    Code93,
    #[serde(rename = "upc_a")]
    UpcA,
    #[serde(rename = "upc_e")]
    UpcE,
    #[serde(rename = "ean_8")]
    Ean8,
    #[serde(rename = "itf")]
    Itf,
    #[serde(rename = "pdf417")]
    Pdf417,
    #[serde(rename = "aztec")]
    Aztec,
    #[serde(rename = "data_matrix")]
    DataMatrix,
}

impl Symbology {
    pub fn as_str(&self) -> &'static str {
        match self {
            Symbology::QrCode => "qr_code",
            Symbology::Code128 => "code_128",
            Symbology::Ean13 => "ean_13",
            Symbology::Code39 => "code_39",
            Symbology::Code93 => "code_93",
            Symbology::UpcA => "upc_a",
            Symbology::UpcE => "upc_e",
            Symbology::Ean8 => "ean_8",
            Symbology::Itf => "itf",
            Symbology::Pdf417 => "pdf417",
            Symbology::Aztec => "aztec",
            Symbology::DataMatrix => "data_matrix",
        }
    }

    /// Every symbology the capture tool requests by default.
    pub fn all() -> &'static [Symbology] {
        &[
            Symbology::QrCode,
            Symbology::Code128,
            Symbology::Ean13,
            Symbology::Code39,
            Symbology::Code93,
            Symbology::UpcA,
            Symbology::UpcE,
            Symbology::Ean8,
            Symbology::Itf,
            Symbology::Pdf417,
            Symbology::Aztec,
            Symbology::DataMatrix,
        ]
    }
}

impl fmt::Display for Symbology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Symbology {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Symbology::all()
            .iter()
            .find(|sym| sym.as_str() == s)
            .copied()
            .ok_or_else(|| format!("unknown symbology: {}", s))
    }
}
