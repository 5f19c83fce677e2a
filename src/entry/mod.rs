use std::fmt;

use nom::branch::alt;
use nom::character::complete::{char, digit0, digit1, one_of};
use nom::combinator::{opt, recognize};
use nom::sequence::{pair, tuple};
use nom::IResult;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::common::Error;

/// Shown to the user whenever a line cannot be turned into an entry
pub(crate) const FORMAT_HINT: &str = "Format: date - flat - item - amount";

const SEGMENT_DELIMITER: char = '-';

/// A single ledger line, as stored on disk and shown in tables
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct Entry {
    pub(crate) date: String,
    pub(crate) flat: String,
    pub(crate) item: String,
    #[serde(default, deserialize_with = "lenient_amount")]
    pub(crate) amount: f64,

    // 0 means "not assigned yet", the ledger replaces it on load
    #[serde(default, deserialize_with = "lenient_id")]
    pub(crate) id: u32,
}

/// Entry fields which can be edited after creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Date,
    Flat,
    Item,
    Amount,
}

impl TryFrom<&str> for Field {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "date" => Ok(Field::Date),
            "flat" => Ok(Field::Flat),
            "item" => Ok(Field::Item),
            "amount" => Ok(Field::Amount),
            _ => Err(Error::new(format!("Unknown field '{value}', expected date, flat, item or amount"))),
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Field::Date => write!(f, "date"),
            Field::Flat => write!(f, "flat"),
            Field::Item => write!(f, "item"),
            Field::Amount => write!(f, "amount"),
        }
    }
}

impl Entry {
    /// Replace one field. Amounts go through the same lenient coercion as parsed input.
    pub(crate) fn set_field(&mut self, field: Field, value: &str) {
        let value = value.trim();
        match field {
            Field::Date => self.date = value.to_string(),
            Field::Flat => self.flat = value.to_string(),
            Field::Item => self.item = value.to_string(),
            Field::Amount => self.amount = parse_amount(value),
        }
    }
}

/// Result of parsing a free-text line. Does not carry an id yet.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ParsedEntry {
    pub(crate) date: String,
    pub(crate) flat: String,
    pub(crate) item: String,
    pub(crate) amount: f64,
}

impl ParsedEntry {
    pub(crate) fn into_entry(self, id: u32) -> Entry {
        Entry {
            date: self.date,
            flat: self.flat,
            item: self.item,
            amount: self.amount,
            id,
        }
    }
}

/// The input line had fewer than four `-` separated segments
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParseFailure {
    pub(crate) segments: usize,
}

impl fmt::Display for ParseFailure {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{FORMAT_HINT} (got {} of 4 parts)", self.segments)
    }
}

impl std::error::Error for ParseFailure {}

/// Parse `date - flat - item - amount`. Segments after the fourth are ignored.
pub(crate) fn parse_entry(text: &str) -> Result<ParsedEntry, ParseFailure> {
    let segments: Vec<&str> = split_segments(text).into_iter().map(str::trim).collect();

    match segments.as_slice() {
        [date, flat, item, amount, ..] => Ok(ParsedEntry {
            date: date.to_string(),
            flat: flat.to_string(),
            item: item.to_string(),
            amount: parse_amount(amount),
        }),
        _ => Err(ParseFailure { segments: segments.len() }),
    }
}

/// Split on `-`. When the line uses a whitespace padded ` - ` anywhere, only padded dashes
/// separate segments, so `2024-01-01` and `-5` stay whole. Otherwise every `-` separates.
fn split_segments(text: &str) -> Vec<&str> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let padded: Vec<usize> = chars.iter().enumerate()
        .filter(|(_, (_, c))| *c == SEGMENT_DELIMITER)
        .filter(|(i, _)| {
            let before = if *i == 0 { true } else { chars[i - 1].1.is_whitespace() };
            let after = chars.get(i + 1).map_or(true, |(_, c)| c.is_whitespace());
            before && after
        })
        .map(|(_, (byte_index, _))| *byte_index)
        .collect();

    if padded.is_empty() {
        return text.split(SEGMENT_DELIMITER).collect();
    }

    let mut segments = Vec::with_capacity(padded.len() + 1);
    let mut start = 0;
    for index in padded {
        segments.push(&text[start..index]);
        start = index + SEGMENT_DELIMITER.len_utf8();
    }
    segments.push(&text[start..]);
    segments
}

/// Read the leading decimal number of `text`, or 0.0 when there is none.
/// `"12.5kg"` gives 12.5, `"abc"` gives 0.0.
pub(crate) fn parse_amount(text: &str) -> f64 {
    match decimal_prefix(text.trim()) {
        Ok((_, number)) => match number.parse::<f64>() {
            Ok(amount) if !amount.is_nan() => amount,
            _ => 0.0,
        },
        Err(_) => 0.0,
    }
}

fn decimal_prefix(input: &str) -> IResult<&str, &str> {
    recognize(tuple((
        opt(one_of("+-")),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    )))(input)
}

/// Stored amounts may have been written by hand, accept numbers, numeric strings and nulls.
fn lenient_amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount(&s),
        _ => 0.0,
    })
}

/// Ids written by other tools may be floats, negative or strings. Those load as unassigned (0).
fn lenient_id<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let id = match value {
        Some(Value::Number(n)) => n.as_u64().and_then(|id| u32::try_from(id).ok()),
        Some(Value::String(s)) => s.trim().parse::<u32>().ok(),
        _ => None,
    };
    Ok(id.unwrap_or(0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_well_formed() {
        let parsed = parse_entry("d - f - i - 12.5").unwrap();
        assert_eq!(parsed, ParsedEntry {
            date: "d".to_string(),
            flat: "f".to_string(),
            item: "i".to_string(),
            amount: 12.5,
        });
    }

    #[test]
    fn test_parse_too_few_segments() {
        let result = parse_entry("2024-01-01 - A1 - Rent");
        assert_eq!(result, Err(ParseFailure { segments: 3 }));
        assert!(result.unwrap_err().to_string().starts_with(FORMAT_HINT));

        assert_eq!(parse_entry("Rent 500"), Err(ParseFailure { segments: 1 }));
    }

    #[test]
    fn test_parse_dates_and_negative_amounts() {
        let parsed = parse_entry("2024-01-01 - A1 - Rent - abc").unwrap();
        assert_eq!(parsed.date, "2024-01-01");
        assert_eq!(parsed.flat, "A1");
        assert_eq!(parsed.item, "Rent");
        assert_eq!(parsed.amount, 0.0);

        let parsed = parse_entry("Jan - B2 - Refund - -5").unwrap();
        assert_eq!(parsed.amount, -5.0);
    }

    #[test]
    fn test_parse_without_padding() {
        let parsed = parse_entry("Jan-A1-Rent-500").unwrap();
        assert_eq!(parsed.date, "Jan");
        assert_eq!(parsed.flat, "A1");
        assert_eq!(parsed.item, "Rent");
        assert_eq!(parsed.amount, 500.0);
    }

    #[test]
    fn test_parse_non_numeric_amount() {
        let parsed = parse_entry("Jan - A1 - Rent - abc").unwrap();
        assert_eq!(parsed.amount, 0.0);
        assert_eq!(parsed.item, "Rent");
    }

    #[test]
    fn test_parse_ignores_extra_segments() {
        let parsed = parse_entry("  Jan  -  A1 -  Water bill -  30 - extra - more ").unwrap();
        assert_eq!(parsed.date, "Jan");
        assert_eq!(parsed.flat, "A1");
        assert_eq!(parsed.item, "Water bill");
        assert_eq!(parsed.amount, 30.0);
    }

    #[test]
    fn test_parse_amount_is_lenient() {
        assert_eq!(parse_amount("20.5"), 20.5);
        assert_eq!(parse_amount(" 42 "), 42.0);
        assert_eq!(parse_amount("12abc"), 12.0);
        assert_eq!(parse_amount(".5"), 0.5);
        assert_eq!(parse_amount("+3"), 3.0);
        assert_eq!(parse_amount("1e3"), 1000.0);
        assert_eq!(parse_amount("1e"), 1.0);
        assert_eq!(parse_amount("abc"), 0.0);
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("."), 0.0);
    }

    #[test]
    fn test_empty_segments_are_kept() {
        let parsed = parse_entry(" - - - ").unwrap();
        assert_eq!(parsed.date, "");
        assert_eq!(parsed.flat, "");
        assert_eq!(parsed.amount, 0.0);
    }

    #[test]
    fn test_set_field() {
        let mut entry = parse_entry("Jan - A1 - Rent - 500").unwrap().into_entry(7);
        entry.set_field(Field::Item, "  Deposit ");
        entry.set_field(Field::Amount, "oops");
        assert_eq!(entry.item, "Deposit");
        assert_eq!(entry.amount, 0.0);
        assert_eq!(entry.id, 7);
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::try_from("AMOUNT"), Ok(Field::Amount));
        assert_eq!(Field::try_from("Flat"), Ok(Field::Flat));
        assert!(Field::try_from("price").is_err());
    }

    #[test]
    fn test_entry_serde() {
        let json = r#"[{"date":"Jan","flat":"A1","item":"Rent","amount":"7.5","id":3},
                       {"date":"Feb","flat":"B2","item":"Gas","amount":null,"id":4},
                       {"date":"Mar","flat":"C3","item":"Tap"}]"#;
        let entries: Vec<Entry> = serde_json::from_str(json).unwrap();
        assert_eq!(entries[0].amount, 7.5);
        assert_eq!(entries[1].amount, 0.0);
        assert_eq!(entries[2].amount, 0.0);
        assert_eq!(entries[2].id, 0);

        let s = serde_json::to_string(&entries[0]).unwrap();
        assert_eq!(s, r#"{"date":"Jan","flat":"A1","item":"Rent","amount":7.5,"id":3}"#);
    }

    #[test]
    fn test_foreign_ids_load_as_unassigned() {
        let json = r#"[{"date":"Jan","flat":"A1","item":"Rent","amount":1,"id":1700000000000.123},
                       {"date":"Jan","flat":"A1","item":"Rent","amount":1,"id":-2},
                       {"date":"Jan","flat":"A1","item":"Rent","amount":1,"id":4294967296},
                       {"date":"Jan","flat":"A1","item":"Rent","amount":1,"id":"12"},
                       {"date":"Jan","flat":"A1","item":"Rent","amount":1,"id":null}]"#;
        let entries: Vec<Entry> = serde_json::from_str(json).unwrap();
        let ids: Vec<u32> = entries.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![0, 0, 0, 12, 0]);
    }
}
