//! The `db:"…"` tag grammar.
//!
//! ```text
//! db:"column:<name>;primary;unique[:<name>];index[:<name>];not null;
//!     default:<expr>;type:<dbtype>;generator:<name>;min_length:<n>;
//!     max_length:<n>;enum:<a>|<b>;foreign_key:<table>.<column>;
//!     auto_create_time;auto_update_time"
//! db:"-"   // skip this field entirely
//! ```
//!
//! Malformed syntax is a hard construction error, never skipped over.

use nom::IResult;
use nom::bytes::complete::{tag, take_while1};
use nom::character::complete::{char, digit1, multispace0};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::multi::separated_list1;
use nom::sequence::{delimited, preceded, separated_pair};

/// A `foreign_key:<table>.<column>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKey {
    pub table: String,
    pub column: String,
}

/// The parsed form of one field tag.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TagSpec {
    pub skip: bool,
    pub column: Option<String>,
    pub primary: bool,
    pub unique: bool,
    pub unique_name: Option<String>,
    pub indexed: bool,
    pub index_name: Option<String>,
    pub not_null: bool,
    pub default: Option<String>,
    pub db_type: Option<String>,
    pub generator: Option<String>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub enum_values: Vec<String>,
    pub foreign_key: Option<ForeignKey>,
    pub auto_create_time: bool,
    pub auto_update_time: bool,
}

#[derive(Debug, Clone, PartialEq)]
enum Entry {
    Column(String),
    Primary,
    Unique(Option<String>),
    Index(Option<String>),
    NotNull,
    Default(String),
    DbType(String),
    Generator(String),
    MinLength(usize),
    MaxLength(usize),
    Enum(Vec<String>),
    ForeignKey(ForeignKey),
    AutoCreateTime,
    AutoUpdateTime,
}

fn ident(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || c == '_')(input)
}

fn raw_expr(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c != ';')(input)
}

fn enum_value(input: &str) -> IResult<&str, &str> {
    take_while1(|c| c != ';' && c != '|')(input)
}

fn entry(input: &str) -> IResult<&str, Entry> {
    // `not null` carries an embedded space, so it cannot go through the
    // generic key dispatch below.
    if let Ok((rest, _)) = tag::<&str, &str, nom::error::Error<&str>>("not null")(input) {
        return Ok((rest, Entry::NotNull));
    }

    let (rest, key) = ident(input)?;
    match key {
        "column" => map(preceded(char(':'), ident), |v: &str| {
            Entry::Column(v.to_string())
        })(rest),
        "primary" => Ok((rest, Entry::Primary)),
        "unique" => {
            let (rest, name) = opt(preceded(char(':'), ident))(rest)?;
            Ok((rest, Entry::Unique(name.map(str::to_string))))
        }
        "index" => {
            let (rest, name) = opt(preceded(char(':'), ident))(rest)?;
            Ok((rest, Entry::Index(name.map(str::to_string))))
        }
        "default" => map(preceded(char(':'), raw_expr), |v: &str| {
            Entry::Default(v.trim().to_string())
        })(rest),
        "type" => map(preceded(char(':'), raw_expr), |v: &str| {
            Entry::DbType(v.trim().to_string())
        })(rest),
        "generator" => map(preceded(char(':'), ident), |v: &str| {
            Entry::Generator(v.to_string())
        })(rest),
        "min_length" => map_res(preceded(char(':'), digit1), |d: &str| {
            d.parse().map(Entry::MinLength)
        })(rest),
        "max_length" => map_res(preceded(char(':'), digit1), |d: &str| {
            d.parse().map(Entry::MaxLength)
        })(rest),
        "enum" => map(
            preceded(char(':'), separated_list1(char('|'), enum_value)),
            |vals: Vec<&str>| Entry::Enum(vals.into_iter().map(|v| v.trim().to_string()).collect()),
        )(rest),
        "foreign_key" => map(
            preceded(char(':'), separated_pair(ident, char('.'), ident)),
            |(t, c): (&str, &str)| {
                Entry::ForeignKey(ForeignKey {
                    table: t.to_string(),
                    column: c.to_string(),
                })
            },
        )(rest),
        "auto_create_time" => Ok((rest, Entry::AutoCreateTime)),
        "auto_update_time" => Ok((rest, Entry::AutoUpdateTime)),
        _ => Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        ))),
    }
}

fn entries(input: &str) -> IResult<&str, Vec<Entry>> {
    all_consuming(separated_list1(
        char(';'),
        delimited(multispace0, entry, multispace0),
    ))(input)
}

/// Parse a field tag. Returns a descriptive message on malformed input;
/// the caller wraps it into a construction error.
pub fn parse_tag(input: &str) -> Result<TagSpec, String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(TagSpec::default());
    }
    if trimmed == "-" {
        return Ok(TagSpec {
            skip: true,
            ..TagSpec::default()
        });
    }

    let parsed = entries(trimmed).map_err(|e| format!("malformed tag {:?}: {}", input, e))?;

    let mut spec = TagSpec::default();
    let mut seen: Vec<&'static str> = Vec::new();
    let mut check = |key: &'static str, seen: &mut Vec<&'static str>| -> Result<(), String> {
        if seen.contains(&key) {
            return Err(format!("duplicate tag key `{}`", key));
        }
        seen.push(key);
        Ok(())
    };

    for e in parsed.1 {
        match e {
            Entry::Column(v) => {
                check("column", &mut seen)?;
                spec.column = Some(v);
            }
            Entry::Primary => {
                check("primary", &mut seen)?;
                spec.primary = true;
                spec.not_null = true;
            }
            Entry::Unique(name) => {
                check("unique", &mut seen)?;
                spec.unique = true;
                spec.unique_name = name;
            }
            Entry::Index(name) => {
                check("index", &mut seen)?;
                spec.indexed = true;
                spec.index_name = name;
            }
            Entry::NotNull => {
                check("not null", &mut seen)?;
                spec.not_null = true;
            }
            Entry::Default(v) => {
                check("default", &mut seen)?;
                spec.default = Some(v);
            }
            Entry::DbType(v) => {
                check("type", &mut seen)?;
                spec.db_type = Some(v);
            }
            Entry::Generator(v) => {
                check("generator", &mut seen)?;
                spec.generator = Some(v);
            }
            Entry::MinLength(n) => {
                check("min_length", &mut seen)?;
                spec.min_length = Some(n);
            }
            Entry::MaxLength(n) => {
                check("max_length", &mut seen)?;
                spec.max_length = Some(n);
            }
            Entry::Enum(vals) => {
                check("enum", &mut seen)?;
                spec.enum_values = vals;
            }
            Entry::ForeignKey(fk) => {
                check("foreign_key", &mut seen)?;
                spec.foreign_key = Some(fk);
            }
            Entry::AutoCreateTime => {
                check("auto_create_time", &mut seen)?;
                spec.auto_create_time = true;
            }
            Entry::AutoUpdateTime => {
                check("auto_update_time", &mut seen)?;
                spec.auto_update_time = true;
            }
        }
    }

    if let (Some(min), Some(max)) = (spec.min_length, spec.max_length) {
        if min > max {
            return Err(format!("min_length {} exceeds max_length {}", min, max));
        }
    }

    Ok(spec)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_grammar() {
        let spec = parse_tag(
            "column:user_email;unique:uq_email;not null;default:'';type:VARCHAR(255);min_length:3;max_length:255",
        )
        .unwrap();
        assert_eq!(spec.column.as_deref(), Some("user_email"));
        assert!(spec.unique);
        assert_eq!(spec.unique_name.as_deref(), Some("uq_email"));
        assert!(spec.not_null);
        assert_eq!(spec.default.as_deref(), Some("''"));
        assert_eq!(spec.db_type.as_deref(), Some("VARCHAR(255)"));
        assert_eq!(spec.min_length, Some(3));
        assert_eq!(spec.max_length, Some(255));
    }

    #[test]
    fn test_primary_and_generator() {
        let spec = parse_tag("primary;generator:uuid").unwrap();
        assert!(spec.primary);
        assert!(spec.not_null);
        assert_eq!(spec.generator.as_deref(), Some("uuid"));
    }

    #[test]
    fn test_enum_values() {
        let spec = parse_tag("enum:red|green|blue").unwrap();
        assert_eq!(spec.enum_values, vec!["red", "green", "blue"]);
    }

    #[test]
    fn test_foreign_key() {
        let spec = parse_tag("foreign_key:users.id;not null").unwrap();
        let fk = spec.foreign_key.unwrap();
        assert_eq!(fk.table, "users");
        assert_eq!(fk.column, "id");
    }

    #[test]
    fn test_auto_timestamps() {
        let spec = parse_tag("auto_create_time").unwrap();
        assert!(spec.auto_create_time);
        let spec = parse_tag("auto_update_time").unwrap();
        assert!(spec.auto_update_time);
    }

    #[test]
    fn test_skip_marker() {
        assert!(parse_tag("-").unwrap().skip);
    }

    #[test]
    fn test_malformed_rejected() {
        assert!(parse_tag("column").is_err());
        assert!(parse_tag("bogus_key:1").is_err());
        assert!(parse_tag("primary;;unique").is_err());
        assert!(parse_tag("min_length:abc").is_err());
    }

    #[test]
    fn test_duplicate_key_rejected() {
        let err = parse_tag("column:a;column:b").unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_length_bounds_checked() {
        assert!(parse_tag("min_length:10;max_length:3").is_err());
    }
}
