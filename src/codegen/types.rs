//! Vendor type code to target-language type mapping
//!
//! This is the only place where database type semantics are translated into
//! the output language. Each target language owns one lookup table keyed by
//! the lower-cased catalog `DATA_TYPE` value.

use std::fmt;
use std::str::FromStr;

use crate::error::EtoomapError;

/// Languages templates can be generated for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetLanguage {
    Java,
}

impl TargetLanguage {
    /// Vendor code to type name table
    fn type_table(self) -> &'static [(&'static str, &'static str)] {
        match self {
            TargetLanguage::Java => JAVA_TYPES,
        }
    }

    /// Type used for vendor codes missing from the table
    fn fallback_type(self) -> &'static str {
        match self {
            TargetLanguage::Java => "String",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TargetLanguage::Java => "java",
        }
    }
}

impl FromStr for TargetLanguage {
    type Err = EtoomapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "java" => Ok(TargetLanguage::Java),
            _ => Err(EtoomapError::UnsupportedLanguage(s.to_string())),
        }
    }
}

impl fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const JAVA_TYPES: &[(&str, &str)] = &[
    // Character and text
    ("character", "String"),
    ("national character", "String"),
    ("character varying", "String"),
    ("national character varying", "String"),
    ("text", "String"),
    ("money", "String"),
    ("char", "String"),
    ("varchar", "String"),
    ("tinytext", "String"),
    ("mediumtext", "String"),
    ("longtext", "String"),
    ("enum", "String"),
    ("set", "String"),
    // Byte sequences
    ("bytea", "byte[]"),
    ("binary", "byte[]"),
    ("varbinary", "byte[]"),
    ("tinyblob", "byte[]"),
    ("blob", "byte[]"),
    ("mediumblob", "byte[]"),
    ("longblob", "byte[]"),
    // Integers
    ("smallint", "int"),
    ("smallserial", "int"),
    ("integer", "int"),
    ("serial", "int"),
    ("tinyint", "int"),
    ("mediumint", "int"),
    ("int", "int"),
    ("bigint", "long"),
    ("bigserial", "long"),
    ("oid", "long"),
    // Floating point
    ("real", "float"),
    ("float", "float"),
    ("double precision", "double"),
    ("double", "double"),
    // Arbitrary precision
    ("numeric", "java.math.BigDecimal"),
    ("decimal", "java.math.BigDecimal"),
    // Temporal
    ("date", "java.sql.Date"),
    ("time", "java.sql.Time"),
    ("time with time zone", "java.sql.Time"),
    ("time without time zone", "java.sql.Time"),
    ("timestamp", "java.sql.Timestamp"),
    ("timestamp with time zone", "java.sql.Timestamp"),
    ("timestamp without time zone", "java.sql.Timestamp"),
    ("datetime", "java.sql.Timestamp"),
    // Boolean
    ("boolean", "boolean"),
    ("bit", "boolean"),
];

/// Map a vendor type code to a type name in `language`
///
/// Unrecognized codes fall back to the language's string type.
pub fn resolve_type(vendor_code: &str, language: TargetLanguage) -> &'static str {
    let code = vendor_code.trim().to_lowercase();
    language
        .type_table()
        .iter()
        .find(|(vendor, _)| *vendor == code)
        .map(|(_, target)| *target)
        .unwrap_or_else(|| language.fallback_type())
}

/// [`resolve_type`] for a language given by name
pub fn resolve_type_for(vendor_code: &str, language: &str) -> Result<&'static str, EtoomapError> {
    let language = language.parse::<TargetLanguage>()?;
    Ok(resolve_type(vendor_code, language))
}
