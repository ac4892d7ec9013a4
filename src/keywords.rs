//! Closed keyword sets emitted by the `datepart` and `orderby` tags

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A keyword that didn't name any member of its set
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownKeyword {
    pub kind: &'static str,
    pub value: String,
}

/// `DATEPART`/`DATEADD`/`DATEDIFF` date parts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    DayOfYear,
    Day,
    Week,
    Hour,
    Minute,
    Second,
    Millisecond,
    Microsecond,
    Nanosecond,
}

impl DatePart {
    pub const ALL: [DatePart; 12] = [
        DatePart::Year,
        DatePart::Quarter,
        DatePart::Month,
        DatePart::DayOfYear,
        DatePart::Day,
        DatePart::Week,
        DatePart::Hour,
        DatePart::Minute,
        DatePart::Second,
        DatePart::Millisecond,
        DatePart::Microsecond,
        DatePart::Nanosecond,
    ];

    /// SQL keyword for this date part
    pub fn keyword(self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::DayOfYear => "DAYOFYEAR",
            DatePart::Day => "DAY",
            DatePart::Week => "WEEK",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
            DatePart::Millisecond => "MILLISECOND",
            DatePart::Microsecond => "MICROSECOND",
            DatePart::Nanosecond => "NANOSECOND",
        }
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for DatePart {
    type Err = UnknownKeyword;

    /// Case-insensitive; `day_of_year` is accepted alongside `dayofyear`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.replace('_', "").to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|part| part.keyword() == normalized)
            .ok_or_else(|| UnknownKeyword {
                kind: "date part",
                value: s.to_string(),
            })
    }
}

/// Sort direction for `ORDER BY`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrderBy {
    #[default]
    Asc,
    Desc,
}

impl OrderBy {
    pub fn keyword(self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

impl fmt::Display for OrderBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

impl FromStr for OrderBy {
    type Err = UnknownKeyword;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" | "ascending" => Ok(OrderBy::Asc),
            "desc" | "descending" => Ok(OrderBy::Desc),
            _ => Err(UnknownKeyword {
                kind: "order direction",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_part_keywords() {
        assert_eq!(DatePart::Year.to_string(), "YEAR");
        assert_eq!(DatePart::DayOfYear.keyword(), "DAYOFYEAR");
    }

    #[test]
    fn test_date_part_from_str() {
        assert_eq!("year".parse::<DatePart>(), Ok(DatePart::Year));
        assert_eq!("day_of_year".parse::<DatePart>(), Ok(DatePart::DayOfYear));
        assert_eq!("DayOfYear".parse::<DatePart>(), Ok(DatePart::DayOfYear));
        assert!("fortnight".parse::<DatePart>().is_err());
    }

    #[test]
    fn test_order_by() {
        assert_eq!(OrderBy::default(), OrderBy::Asc);
        assert_eq!("DESC".parse::<OrderBy>(), Ok(OrderBy::Desc));
        assert_eq!(OrderBy::Desc.to_string(), "DESC");
        let err = "sideways".parse::<OrderBy>().unwrap_err();
        assert_eq!(err.to_string(), "unknown order direction 'sideways'");
    }
}
