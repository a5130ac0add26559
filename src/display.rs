//! Cell values and the HTML helpers used to render them in the changelist.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::TreeEditorSettings;
use crate::dateformat;

/// Placeholder shown for missing values.
pub const EMPTY_CHANGELIST_VALUE: &str = "(None)";

/// A dynamically typed column value read off a model for display.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
}

impl FieldValue {
    pub fn is_null(&self) -> bool {
        matches!(self, FieldValue::Null)
    }

    /// Whether the value counts as "set" for date-like columns. Null and
    /// empty text do not.
    fn is_truthy(&self) -> bool {
        match self {
            FieldValue::Null => false,
            FieldValue::Bool(value) => *value,
            FieldValue::Int(value) => *value != 0,
            FieldValue::Float(value) => *value != 0.0,
            FieldValue::Decimal(value) => !value.is_zero(),
            FieldValue::Text(value) => !value.is_empty(),
            FieldValue::Date(_) | FieldValue::DateTime(_) | FieldValue::Time(_) => true,
        }
    }

    pub(crate) fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(value) => Some(*value),
            FieldValue::Int(value) => Some(*value != 0),
            _ => None,
        }
    }

    /// Exact decimal view; floats are excluded since they were never exact.
    fn as_decimal(&self) -> Option<Decimal> {
        match self {
            FieldValue::Int(value) => Some(Decimal::from(*value)),
            FieldValue::Decimal(value) => Some(*value),
            FieldValue::Text(value) => Decimal::from_str(value.trim()).ok(),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Null => f.write_str("None"),
            FieldValue::Bool(true) => f.write_str("True"),
            FieldValue::Bool(false) => f.write_str("False"),
            FieldValue::Int(value) => write!(f, "{value}"),
            FieldValue::Float(value) => write!(f, "{value}"),
            FieldValue::Decimal(value) => write!(f, "{value}"),
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Date(value) => write!(f, "{value}"),
            FieldValue::DateTime(value) => write!(f, "{value}"),
            FieldValue::Time(value) => write!(f, "{value}"),
        }
    }
}

macro_rules! field_value_from_int {
    ($($ty:ty),*) => {
        $(impl From<$ty> for FieldValue {
            fn from(value: $ty) -> Self {
                FieldValue::Int(i64::from(value))
            }
        })*
    };
}

field_value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(f64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<Decimal> for FieldValue {
    fn from(value: Decimal) -> Self {
        FieldValue::Decimal(value)
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_owned())
    }
}

impl From<NaiveDate> for FieldValue {
    fn from(value: NaiveDate) -> Self {
        FieldValue::Date(value)
    }
}

impl From<NaiveDateTime> for FieldValue {
    fn from(value: NaiveDateTime) -> Self {
        FieldValue::DateTime(value)
    }
}

impl From<NaiveTime> for FieldValue {
    fn from(value: NaiveTime) -> Self {
        FieldValue::Time(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::DateTime(value.naive_utc())
    }
}

impl From<DateTime<FixedOffset>> for FieldValue {
    fn from(value: DateTime<FixedOffset>) -> Self {
        FieldValue::DateTime(value.naive_local())
    }
}

impl<T> From<Option<T>> for FieldValue
where
    T: Into<FieldValue>,
{
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Rendered text that remembers whether it is already HTML-safe.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Markup {
    text: String,
    safe: bool,
}

impl Markup {
    /// Text that still needs escaping before it reaches HTML.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            safe: false,
        }
    }

    /// Text trusted as HTML.
    pub fn safe(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            safe: true,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_safe(&self) -> bool {
        self.safe
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

impl fmt::Display for Markup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Escape `& < > " '` and mark the result safe.
pub fn escape(text: &str) -> Markup {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    Markup::safe(escaped)
}

/// Escape unless the markup is already safe.
pub fn conditional_escape(markup: &Markup) -> Markup {
    if markup.is_safe() {
        markup.clone()
    } else {
        escape(markup.as_str())
    }
}

/// Upper-case the first character.
pub fn capfirst(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// The stock admin yes/no/unknown icon.
pub fn boolean_icon(media_prefix: &str, value: Option<bool>) -> Markup {
    let (icon, alt) = match value {
        Some(true) => ("yes", "True"),
        Some(false) => ("no", "False"),
        None => ("unknown", "None"),
    };
    Markup::safe(format!(
        r#"<img src="{media_prefix}img/admin/icon-{icon}.gif" alt="{alt}" />"#
    ))
}

/// How a model field is formatted in the changelist.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum ColumnKind {
    /// Escaped display text.
    #[default]
    Plain,
    /// A relation; the model supplies the related object's label.
    ForeignKey,
    Date,
    DateTime,
    Time,
    Boolean,
    /// Fixed-point with the given number of decimal places.
    Decimal { places: usize },
    /// Stored value mapped to a human-readable label.
    Choices(Vec<(FieldValue, String)>),
}

impl ColumnKind {
    pub fn decimal(places: usize) -> Self {
        ColumnKind::Decimal { places }
    }

    pub fn choices<V, L>(choices: impl IntoIterator<Item = (V, L)>) -> Self
    where
        V: Into<FieldValue>,
        L: Into<String>,
    {
        ColumnKind::Choices(
            choices
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
        )
    }

    /// Render a field value according to this column kind.
    pub fn render(&self, value: &FieldValue, settings: &TreeEditorSettings) -> Markup {
        match self {
            ColumnKind::ForeignKey => {
                if value.is_null() {
                    Markup::plain(EMPTY_CHANGELIST_VALUE)
                } else {
                    escape(&value.to_string())
                }
            }
            ColumnKind::Date | ColumnKind::DateTime | ColumnKind::Time => {
                if !value.is_truthy() {
                    return Markup::plain(EMPTY_CHANGELIST_VALUE);
                }
                let format = match self {
                    ColumnKind::Date => &settings.date_format,
                    ColumnKind::DateTime => &settings.datetime_format,
                    _ => &settings.time_format,
                };
                Markup::plain(capfirst(&format_temporal(value, format)))
            }
            ColumnKind::Boolean => boolean_icon(&settings.admin_media_prefix, value.as_bool()),
            ColumnKind::Decimal { places } => {
                let places = *places;
                match value {
                    FieldValue::Float(number) => Markup::plain(format!("{number:.places$}")),
                    other => other.as_decimal().map_or_else(
                        || Markup::plain(EMPTY_CHANGELIST_VALUE),
                        |number| Markup::plain(format_decimal(number, places)),
                    ),
                }
            }
            ColumnKind::Choices(choices) => choices
                .iter()
                .find(|(choice, _)| choice == value)
                .map_or_else(
                    || Markup::plain(EMPTY_CHANGELIST_VALUE),
                    |(_, label)| Markup::plain(label.clone()),
                ),
            ColumnKind::Plain => escape(&value.to_string()),
        }
    }
}

fn format_temporal(value: &FieldValue, format: &str) -> String {
    match value {
        FieldValue::Date(date) => dateformat::format(Some(*date), None, format),
        FieldValue::DateTime(datetime) => {
            dateformat::format(Some(datetime.date()), Some(datetime.time()), format)
        }
        FieldValue::Time(time) => dateformat::format(None, Some(*time), format),
        other => other.to_string(),
    }
}

/// Round half to even at `places`, then pad with zeros to exactly `places`.
fn format_decimal(value: Decimal, places: usize) -> String {
    let scale = u32::try_from(places).unwrap_or(u32::MAX);
    let rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
    format!("{rounded:.places$}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> TreeEditorSettings {
        TreeEditorSettings::default()
    }

    #[test]
    fn escape_covers_html_metacharacters() {
        let escaped = escape(r#"<a href="x">Tom & 'Jerry'</a>"#);
        assert!(escaped.is_safe());
        assert_eq!(
            escaped.as_str(),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn conditional_escape_leaves_safe_markup_alone() {
        let safe = Markup::safe("<b>bold</b>");
        assert_eq!(conditional_escape(&safe), safe);
        let plain = Markup::plain("<b>");
        assert_eq!(conditional_escape(&plain).as_str(), "&lt;b&gt;");
    }

    #[test]
    fn boolean_icon_uses_media_prefix() {
        assert_eq!(
            boolean_icon("/media/", Some(true)).as_str(),
            r#"<img src="/media/img/admin/icon-yes.gif" alt="True" />"#
        );
        assert_eq!(
            boolean_icon("/static/", None).as_str(),
            r#"<img src="/static/img/admin/icon-unknown.gif" alt="None" />"#
        );
    }

    #[test]
    fn dates_are_capitalised_and_nulls_are_placeholders() {
        let date = NaiveDate::from_ymd_opt(2009, 3, 7).expect("valid date");
        let rendered = ColumnKind::Date.render(&FieldValue::from(date), &settings());
        assert_eq!(rendered.as_str(), "March 7, 2009");
        let missing = ColumnKind::DateTime.render(&FieldValue::Null, &settings());
        assert_eq!(missing.as_str(), EMPTY_CHANGELIST_VALUE);
    }

    #[test]
    fn time_uses_time_format() {
        let time = NaiveTime::from_hms_opt(14, 5, 0).expect("valid time");
        let rendered = ColumnKind::Time.render(&FieldValue::from(time), &settings());
        assert_eq!(rendered.as_str(), "2:05 p.m.");
    }

    #[test]
    fn datetimes_combine_date_and_time_tokens() {
        let datetime = NaiveDate::from_ymd_opt(2009, 9, 1)
            .and_then(|date| date.and_hms_opt(12, 0, 0))
            .expect("valid datetime");
        let rendered = ColumnKind::DateTime.render(&FieldValue::from(datetime), &settings());
        assert_eq!(rendered.as_str(), "Sept. 1, 2009, noon");
    }

    #[test]
    fn custom_formats_are_capitalised() {
        let settings = TreeEditorSettings {
            date_format: "l j F".to_string(),
            ..TreeEditorSettings::default()
        };
        let date = NaiveDate::from_ymd_opt(2009, 3, 7).expect("valid date");
        let rendered = ColumnKind::Date.render(&FieldValue::from(date), &settings);
        assert_eq!(rendered.as_str(), "Saturday 7 March");
    }

    #[test]
    fn decimals_are_zero_padded() {
        let rendered = ColumnKind::decimal(2).render(&FieldValue::Float(3.5), &settings());
        assert_eq!(rendered.as_str(), "3.50");
        let from_int = ColumnKind::decimal(1).render(&FieldValue::Int(4), &settings());
        assert_eq!(from_int.as_str(), "4.0");
        let null = ColumnKind::decimal(2).render(&FieldValue::Null, &settings());
        assert_eq!(null.as_str(), EMPTY_CHANGELIST_VALUE);
    }

    #[test]
    fn decimals_keep_every_digit() {
        let large = Decimal::from_str("12345678901234567.89").expect("valid decimal");
        let rendered = ColumnKind::decimal(2).render(&FieldValue::from(large), &settings());
        assert_eq!(rendered.as_str(), "12345678901234567.89");

        let padded = ColumnKind::decimal(3).render(&FieldValue::from(large), &settings());
        assert_eq!(padded.as_str(), "12345678901234567.890");

        let big_int = ColumnKind::decimal(2).render(&FieldValue::Int(i64::MAX), &settings());
        assert_eq!(big_int.as_str(), "9223372036854775807.00");
    }

    #[test]
    fn decimals_round_half_to_even() {
        let kind = ColumnKind::decimal(2);
        assert_eq!(kind.render(&FieldValue::from("0.125"), &settings()).as_str(), "0.12");
        assert_eq!(kind.render(&FieldValue::from("0.135"), &settings()).as_str(), "0.14");
        assert_eq!(
            kind.render(&FieldValue::from(" 2.675 "), &settings()).as_str(),
            "2.68"
        );
        assert_eq!(
            kind.render(&FieldValue::from("n/a"), &settings()).as_str(),
            EMPTY_CHANGELIST_VALUE
        );
    }

    #[test]
    fn choices_map_to_labels() {
        let kind = ColumnKind::choices([("d", "Draft"), ("p", "Published")]);
        let rendered = kind.render(&FieldValue::from("p"), &settings());
        assert_eq!(rendered.as_str(), "Published");
        let unknown = kind.render(&FieldValue::from("x"), &settings());
        assert_eq!(unknown.as_str(), EMPTY_CHANGELIST_VALUE);
    }

    #[test]
    fn foreign_keys_escape_labels() {
        let rendered = ColumnKind::ForeignKey.render(&FieldValue::from("A & B"), &settings());
        assert_eq!(rendered.as_str(), "A &amp; B");
        let null = ColumnKind::ForeignKey.render(&FieldValue::Null, &settings());
        assert_eq!(null.as_str(), EMPTY_CHANGELIST_VALUE);
    }

    #[test]
    fn option_values_collapse_to_null() {
        assert_eq!(FieldValue::from(None::<i32>), FieldValue::Null);
        assert_eq!(FieldValue::from(Some(7_i32)), FieldValue::Int(7));
        assert_eq!(FieldValue::from(Some(false)).to_string(), "False");
    }
}
