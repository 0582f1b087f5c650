/*
    Parsing of BIP32 derivation path strings like "m/44'/1669'/0'/0/0".
    An apostrophe or 'h' suffix marks a hardened component.
*/

use std::fmt;

use crate::hdwallet::{HARDENED_OFFSET, HDWError};

/// A parsed derivation path. Each component carries the hardened bit
/// folded into the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub components: Vec<u32>,
}

impl Path {
    pub fn from_str(path: &str) -> Result<Self, HDWError> {
        let mut parts = path.trim().split('/');
        if parts.next() != Some("m") {
            return Err(HDWError::MalformedPath(path.to_string()));
        }

        let mut components = Vec::new();
        for part in parts {
            let (digits, hardened) = match part.strip_suffix('\'').or(part.strip_suffix('h')) {
                Some(stripped) => (stripped, true),
                None => (part, false),
            };

            let index: u32 = digits
                .parse()
                .map_err(|_| HDWError::MalformedPath(path.to_string()))?;
            if index >= HARDENED_OFFSET {
                return Err(HDWError::IndexTooLarge(index));
            }

            components.push(if hardened { index + HARDENED_OFFSET } else { index });
        }

        Ok(Self { components })
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m")?;
        for &component in &self.components {
            if component >= HARDENED_OFFSET {
                write!(f, "/{}'", component - HARDENED_OFFSET)?;
            } else {
                write!(f, "/{}", component)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_mixed_path() {
        let path = Path::from_str("m/44'/1669'/0'/0/5").unwrap();
        assert_eq!(
            path.components,
            vec![
                44 + HARDENED_OFFSET,
                1669 + HARDENED_OFFSET,
                HARDENED_OFFSET,
                0,
                5
            ]
        );
        assert_eq!(path.to_string(), "m/44'/1669'/0'/0/5");
    }

    #[test]
    fn accepts_h_suffix() {
        assert_eq!(
            Path::from_str("m/44h/0h").unwrap(),
            Path::from_str("m/44'/0'").unwrap()
        );
    }

    #[test]
    fn master_only() {
        assert!(Path::from_str("m").unwrap().components.is_empty());
    }

    #[test]
    fn rejects_missing_m() {
        assert!(matches!(
            Path::from_str("44'/0'/0'"),
            Err(HDWError::MalformedPath(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_component() {
        assert!(matches!(
            Path::from_str("m/44'/x/0"),
            Err(HDWError::MalformedPath(_))
        ));
    }

    #[test]
    fn rejects_oversized_index() {
        assert_eq!(
            Path::from_str("m/2147483648"),
            Err(HDWError::IndexTooLarge(2_147_483_648))
        );
    }
}
