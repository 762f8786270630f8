//! Asset and venue identifiers, validated once at the boundary

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

const MAX_CODE_LEN: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    #[error("asset code `{0}` must be 1-12 ASCII alphanumerics")]
    InvalidCode(String),
    #[error("asset issuer `{0}` must be non-empty ASCII alphanumerics")]
    InvalidIssuer(String),
    #[error("venue name must not be empty")]
    EmptyVenue,
}

/// A tradable asset: either the network's native asset or an issued token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "AssetRepr", into = "AssetRepr")]
pub enum Asset {
    Native { code: String },
    Issued { code: String, issuer: String },
}

/// Wire forms: `"XLM"`, `"USDC:GISSUER"` or `{"code": "USDC", "issuer": "GISSUER"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum AssetRepr {
    Code(String),
    Object {
        code: String,
        #[serde(default)]
        issuer: Option<String>,
    },
}

impl Asset {
    pub fn native(code: &str) -> Result<Self, IdentifierError> {
        Ok(Asset::Native { code: normalize_code(code)? })
    }

    pub fn issued(code: &str, issuer: &str) -> Result<Self, IdentifierError> {
        let issuer = issuer.trim();
        if issuer.is_empty() || !issuer.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(IdentifierError::InvalidIssuer(issuer.to_string()));
        }
        Ok(Asset::Issued {
            code: normalize_code(code)?,
            issuer: issuer.to_string(),
        })
    }

    pub fn code(&self) -> &str {
        match self {
            Asset::Native { code } | Asset::Issued { code, .. } => code,
        }
    }

    pub fn issuer(&self) -> Option<&str> {
        match self {
            Asset::Native { .. } => None,
            Asset::Issued { issuer, .. } => Some(issuer),
        }
    }
}

fn normalize_code(code: &str) -> Result<String, IdentifierError> {
    let code = code.trim();
    let valid = !code.is_empty()
        && code.len() <= MAX_CODE_LEN
        && code.chars().all(|c| c.is_ascii_alphanumeric());
    if !valid {
        return Err(IdentifierError::InvalidCode(code.to_string()));
    }
    Ok(code.to_ascii_uppercase())
}

impl FromStr for Asset {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((code, issuer)) => Asset::issued(code, issuer),
            None => Asset::native(s),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native { code } => write!(f, "{}", code),
            Asset::Issued { code, issuer } => write!(f, "{}:{}", code, issuer),
        }
    }
}

impl TryFrom<AssetRepr> for Asset {
    type Error = IdentifierError;

    fn try_from(repr: AssetRepr) -> Result<Self, Self::Error> {
        match repr {
            AssetRepr::Code(s) => s.parse(),
            AssetRepr::Object { code, issuer: Some(issuer) } => Asset::issued(&code, &issuer),
            AssetRepr::Object { code, issuer: None } => Asset::native(&code),
        }
    }
}

impl From<Asset> for AssetRepr {
    fn from(asset: Asset) -> Self {
        match asset {
            Asset::Native { code } => AssetRepr::Code(code),
            Asset::Issued { code, issuer } => AssetRepr::Object { code, issuer: Some(issuer) },
        }
    }
}

/// A trading venue (centralized or decentralized exchange).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Venue(String);

impl Venue {
    pub fn new(name: &str) -> Result<Self, IdentifierError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(IdentifierError::EmptyVenue);
        }
        Ok(Venue(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Venue {
    type Error = IdentifierError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Venue::new(&value)
    }
}

impl From<Venue> for String {
    fn from(venue: Venue) -> Self {
        venue.0
    }
}

impl FromStr for Venue {
    type Err = IdentifierError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Venue::new(s)
    }
}

impl fmt::Display for Venue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_native_and_issued() {
        assert_eq!("xlm".parse::<Asset>().unwrap(), Asset::Native { code: "XLM".into() });
        let usdc: Asset = "USDC:GA5ZSEJYB37".parse().unwrap();
        assert_eq!(usdc.code(), "USDC");
        assert_eq!(usdc.issuer(), Some("GA5ZSEJYB37"));
        assert_eq!(usdc.to_string(), "USDC:GA5ZSEJYB37");
    }

    #[test]
    fn test_rejects_malformed_codes() {
        assert!("".parse::<Asset>().is_err());
        assert!("TOOLONGASSETCODE".parse::<Asset>().is_err());
        assert!("BT-C".parse::<Asset>().is_err());
        assert!("USDC:".parse::<Asset>().is_err());
    }

    #[test]
    fn test_asset_wire_forms() {
        let plain: Asset = serde_json::from_str(r#""BTC""#).unwrap();
        assert_eq!(plain, Asset::native("BTC").unwrap());

        let object: Asset = serde_json::from_str(r#"{"code":"USDC","issuer":"GISSUER"}"#).unwrap();
        assert_eq!(object, Asset::issued("USDC", "GISSUER").unwrap());

        let bare_object: Asset = serde_json::from_str(r#"{"code":"XLM"}"#).unwrap();
        assert_eq!(bare_object, Asset::native("XLM").unwrap());

        assert!(serde_json::from_str::<Asset>(r#""$$$""#).is_err());
    }

    #[test]
    fn test_venue_must_not_be_blank() {
        assert_eq!(Venue::new("   "), Err(IdentifierError::EmptyVenue));
        assert_eq!(Venue::new(" Stellar DEX ").unwrap().as_str(), "Stellar DEX");
    }
}
