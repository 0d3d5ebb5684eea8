//! Saving and loading named constant tables (feature-gated formats).
//!
//! Compiling a program can be expensive, so the resulting
//! [`NamedConstantTable`] can be cached on disk and loaded back with
//! [`load`]. Available formats depend on the enabled Cargo features:
//! `serialize-bincode` (default) and `serialize-ron`.

use crate::error::{ParamsError, ParamsResult};
use crate::named::NamedConstantTable;

/// Supported encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// RON, human-readable text.
    #[cfg(feature = "serialize-ron")]
    Ron,
    /// Bincode, compact binary.
    #[cfg(feature = "serialize-bincode")]
    Bincode,
}

/// Encode a named constant table.
#[allow(unused_variables)]
pub fn save(table: &NamedConstantTable, format: Format) -> ParamsResult<Vec<u8>> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => ron::ser::to_string_pretty(table, ron::ser::PrettyConfig::default())
            .map(|s| s.into_bytes())
            .map_err(|e| ParamsError::Persistence(e.to_string())),
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode => {
            bincode::serialize(table).map_err(|e| ParamsError::Persistence(e.to_string()))
        }
    }
}

/// Decode a named constant table.
#[allow(unused_variables)]
pub fn load(bytes: &[u8], format: Format) -> ParamsResult<NamedConstantTable> {
    match format {
        #[cfg(feature = "serialize-ron")]
        Format::Ron => {
            let s = std::str::from_utf8(bytes)
                .map_err(|e| ParamsError::Persistence(e.to_string()))?;
            ron::from_str(s).map_err(|e| ParamsError::Persistence(e.to_string()))
        }
        #[cfg(feature = "serialize-bincode")]
        Format::Bincode => {
            bincode::deserialize(bytes).map_err(|e| ParamsError::Persistence(e.to_string()))
        }
    }
}
