//! Reports on value words
//!
//! Each subcommand of the CLI builds one report type. Reports serialize to
//! JSON with serde and implement `Display` for the text format.

use crate::config::OutputFormat;
use nanval_core::{EncodeError, LayoutInfo, LayoutKind, StaticValue, TypedValue, ValueType};
use serde::Serialize;
use std::fmt;

/// Error while building or printing a report
#[derive(Debug)]
pub enum InspectError {
    /// Command-line word is not a number
    BadWord(String),
    /// Word or pointer is not encodable
    Encode(EncodeError),
    /// JSON encoding error
    Json(serde_json::Error),
}

impl fmt::Display for InspectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InspectError::BadWord(msg) => write!(f, "Invalid word {}", msg),
            InspectError::Encode(e) => write!(f, "{}", e),
            InspectError::Json(e) => write!(f, "JSON error: {}", e),
        }
    }
}

impl std::error::Error for InspectError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            InspectError::Encode(e) => Some(e),
            InspectError::Json(e) => Some(e),
            InspectError::BadWord(_) => None,
        }
    }
}

impl From<EncodeError> for InspectError {
    fn from(e: EncodeError) -> Self {
        InspectError::Encode(e)
    }
}

impl From<serde_json::Error> for InspectError {
    fn from(e: serde_json::Error) -> Self {
        InspectError::Json(e)
    }
}

/// Parse a word given as `0x…` hex or decimal. Underscores are ignored.
pub fn parse_word(s: &str) -> Result<u64, InspectError> {
    let cleaned: String = s.trim().chars().filter(|c| *c != '_').collect();
    let parsed = match cleaned
        .strip_prefix("0x")
        .or_else(|| cleaned.strip_prefix("0X"))
    {
        Some(digits) => u64::from_str_radix(digits, 16),
        None => cleaned.parse::<u64>(),
    };
    parsed.map_err(|e| InspectError::BadWord(format!("'{}': {}", s, e)))
}

fn hex_word(raw: u64) -> String {
    format!("0x{:016x}", raw)
}

/// Print a report in the requested format
pub fn render<T: Serialize + fmt::Display>(
    report: &T,
    format: OutputFormat,
) -> Result<String, InspectError> {
    match format {
        OutputFormat::Text => Ok(report.to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(report)?),
    }
}

// =============================================================================
// decode
// =============================================================================

type Predicate = fn(StaticValue) -> bool;

const PREDICATES: [(&str, Predicate); 13] = [
    ("undefined", StaticValue::is_undefined),
    ("null", StaticValue::is_null),
    ("boolean", StaticValue::is_boolean),
    ("integer", StaticValue::is_integer),
    ("double", StaticValue::is_double),
    ("empty", StaticValue::is_empty),
    ("managed", StaticValue::is_managed),
    ("number", StaticValue::is_number),
    ("null_or_undefined", StaticValue::is_null_or_undefined),
    ("managed_or_undefined", StaticValue::is_managed_or_undefined),
    ("int_or_bool", StaticValue::is_int_or_bool),
    ("nan", StaticValue::is_nan),
    ("positive_int", StaticValue::is_positive_int),
];

#[derive(Debug, Clone, Serialize)]
pub struct DecodeReport {
    pub word: String,
    pub tag: String,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub value: TypedValue,
    /// Human form of the value (JSON has no NaN or Infinity)
    pub display: String,
    /// Layout used to decode a managed word
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutKind>,
    /// Names of the predicates that hold
    pub predicates: Vec<&'static str>,
}

impl DecodeReport {
    pub fn new(raw: u64, layout: LayoutKind) -> Result<Self, InspectError> {
        let v = StaticValue::checked(raw)?;
        let value_type = v.value_type();
        let (value, layout) = match value_type {
            ValueType::Managed => (TypedValue::Managed(layout.decode(raw)), Some(layout)),
            _ => (v.decode(), None),
        };

        let mut predicates: Vec<&'static str> = PREDICATES
            .iter()
            .filter(|(_, check)| check(v))
            .map(|(name, _)| *name)
            .collect();
        if !v.is_empty() && v.integer_compatible() {
            predicates.push("integer_compatible");
        }

        Ok(DecodeReport {
            word: hex_word(raw),
            tag: format!("0x{:08x}", v.tag()),
            value_type,
            value,
            display: value.to_string(),
            layout,
            predicates,
        })
    }
}

impl fmt::Display for DecodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "word:       {}", self.word)?;
        writeln!(f, "tag:        {}", self.tag)?;
        writeln!(f, "type:       {}", self.value_type)?;
        writeln!(f, "value:      {}", self.display)?;
        if let Some(layout) = self.layout {
            writeln!(f, "layout:     {}", layout)?;
        }
        writeln!(f, "predicates: {}", self.predicates.join(", "))
    }
}

// =============================================================================
// encode
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct EncodeReport {
    pub value: TypedValue,
    #[serde(rename = "type")]
    pub value_type: ValueType,
    pub word: String,
    /// In-memory bytes of the word, little-endian, as hex
    pub bytes_le: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layout: Option<LayoutKind>,
}

impl EncodeReport {
    pub fn new(value: TypedValue) -> Self {
        Self::from_word(value, value.encode().raw_value(), None)
    }

    /// Encode a heap address with an explicit pointer layout
    pub fn managed(address: u64, layout: LayoutKind) -> Result<Self, InspectError> {
        if address & 0x1F != 0 {
            return Err(EncodeError::Misaligned { address }.into());
        }
        if !layout.is_encodable(address) {
            return Err(EncodeError::OutOfReach {
                address,
                layout: layout.name(),
            }
            .into());
        }
        Ok(Self::from_word(
            TypedValue::Managed(address),
            layout.encode(address),
            Some(layout),
        ))
    }

    fn from_word(value: TypedValue, raw: u64, layout: Option<LayoutKind>) -> Self {
        EncodeReport {
            value,
            value_type: StaticValue::from_returned_value(raw).value_type(),
            word: hex_word(raw),
            bytes_le: hex::encode(raw.to_le_bytes()),
            layout,
        }
    }
}

impl fmt::Display for EncodeReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "value: {}", self.value)?;
        writeln!(f, "type:  {}", self.value_type)?;
        if let Some(layout) = self.layout {
            writeln!(f, "layout: {}", layout)?;
        }
        writeln!(f, "word:  {}", self.word)?;
        writeln!(f, "bytes: {}", self.bytes_le)
    }
}

// =============================================================================
// layouts
// =============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct LayoutRow {
    #[serde(flatten)]
    pub info: LayoutInfo,
    pub native: bool,
}

/// All supported layouts, the native one flagged
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct LayoutTable(pub Vec<LayoutRow>);

impl LayoutTable {
    pub fn collect() -> Self {
        let native = LayoutKind::native();
        LayoutTable(
            LayoutKind::ALL
                .iter()
                .map(|k| LayoutRow {
                    info: k.info(),
                    native: *k == native,
                })
                .collect(),
        )
    }
}

impl fmt::Display for LayoutTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<20} {:>5} {:>7} {:>7}  {}",
            "LAYOUT", "TOP1", "UPPER3", "LOWER5", "ADDRESS MASK"
        )?;
        for row in &self.0 {
            let name = if row.native {
                format!("{} *", row.info.name)
            } else {
                row.info.name.to_string()
            };
            writeln!(
                f,
                "{:<20} {:>5} {:>7} {:>7}  0x{:016x}",
                name,
                row.info.top1_shift,
                row.info.upper3_shift,
                row.info.lower5_shift,
                row.info.address_mask
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_word() {
        assert_eq!(parse_word("0x0003_8000_0000_0001").unwrap(), 0x0003_8000_0000_0001);
        assert_eq!(parse_word("0XFF").unwrap(), 255);
        assert_eq!(parse_word(" 42 ").unwrap(), 42);
        assert!(matches!(parse_word("0xZZ"), Err(InspectError::BadWord(_))));
        assert!(parse_word("-1").is_err());
    }

    #[test]
    fn test_decode_true() {
        let report = DecodeReport::new(0x0003_8000_0000_0001, LayoutKind::Flat).unwrap();
        assert_eq!(report.value_type, ValueType::Boolean);
        assert_eq!(report.value, TypedValue::Boolean(true));
        assert_eq!(report.tag, "0x00038000");
        assert!(report.predicates.contains(&"int_or_bool"));
        assert!(report.predicates.contains(&"integer_compatible"));
        assert!(!report.predicates.contains(&"number"));
    }

    #[test]
    fn test_decode_managed_uses_layout() {
        let raw = LayoutKind::Ia64.encode(0xE000_0000_0000_1000);
        let report = DecodeReport::new(raw, LayoutKind::Ia64).unwrap();
        assert_eq!(report.value, TypedValue::Managed(0xE000_0000_0000_1000));
        assert_eq!(report.layout, Some(LayoutKind::Ia64));
        assert_eq!(report.predicates, vec!["managed", "managed_or_undefined"]);
    }

    #[test]
    fn test_decode_rejects_invalid() {
        // Unmanaged bit with a tag no encoder produces
        let err = DecodeReport::new(0x0001_4000_0000_0000, LayoutKind::Flat).unwrap_err();
        assert!(matches!(err, InspectError::Encode(EncodeError::InvalidWord(_))));
    }

    #[test]
    fn test_decode_text() {
        let report = DecodeReport::new(0, LayoutKind::Flat).unwrap();
        let text = report.to_string();
        assert!(text.contains("type:       undefined"));
        assert!(text.contains("undefined, null_or_undefined, managed_or_undefined"));
    }

    #[test]
    fn test_encode_double() {
        let report = EncodeReport::new(TypedValue::Double(3.5));
        assert_eq!(report.word, "0x3ff9400000000000");
        assert_eq!(report.value_type, ValueType::Double);
    }

    #[test]
    fn test_encode_bytes() {
        let report = EncodeReport::new(TypedValue::Integer(42));
        assert_eq!(report.word, "0x0003c0000000002a");
        assert_eq!(report.bytes_le, "2a00000000c00300");
    }

    #[test]
    fn test_encode_managed_checks() {
        assert!(matches!(
            EncodeReport::managed(0x1001, LayoutKind::Flat),
            Err(InspectError::Encode(EncodeError::Misaligned { address: 0x1001 }))
        ));
        assert!(matches!(
            EncodeReport::managed(1 << 50, LayoutKind::Flat),
            Err(InspectError::Encode(EncodeError::OutOfReach { .. }))
        ));
        let report = EncodeReport::managed(1 << 50, LayoutKind::Sparc64).unwrap();
        assert_eq!(report.value_type, ValueType::Managed);
    }

    #[test]
    fn test_layout_table() {
        let table = LayoutTable::collect();
        assert_eq!(table.0.iter().filter(|r| r.native).count(), 1);
        let text = table.to_string();
        assert!(text.starts_with("LAYOUT"));
        assert!(text.contains("0xff00ffffffffffe0"));
        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json[1]["name"], "ia64");
        assert_eq!(json[1]["upper3_shift"], 12);
    }

    #[test]
    fn test_render_json() {
        let report = DecodeReport::new(0x0003_c000_0000_002a, LayoutKind::Flat).unwrap();
        let json = render(&report, OutputFormat::Json).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["type"], "integer");
        assert_eq!(parsed["value"]["integer"], 42);
        assert!(parsed.get("layout").is_none());
    }
}
