//! Built-in hooks for types with a conventional text form: timestamps,
//! durations, anything `Display + FromStr`, and base64 binary data.

use crate::decoder::Decoder;
use crate::encoder::Encoder;
use crate::error::{Error, ErrorKind, Result};
use crate::impls::binary_bytes;
use crate::traits::{Decode, Encode};
use base64::Engine as _;
use chrono::{
    DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;
use yamlbind_node::{Node, NodeKind, Tag};

/// Text of a scalar that a hook parses, or `None` for null.
fn hook_text<T>(node: &Node) -> Result<Option<String>> {
    match &node.kind {
        NodeKind::Null => Ok(None),
        NodeKind::Mapping(_) | NodeKind::Sequence(_) | NodeKind::Alias { .. } => Err(Error::at(
            ErrorKind::type_mismatch(std::any::type_name::<T>(), node),
            node,
        )),
        _ => Ok(node.scalar_text()),
    }
}

fn invalid<T>(node: &Node, text: &str) -> Error {
    Error::at(
        ErrorKind::TypeMismatch {
            expected: std::any::type_name::<T>().to_string(),
            found: format!("\"{}\"", text),
        },
        node,
    )
}

/// Parse a YAML timestamp: RFC 3339, a lowercase `t` or a space before the
/// time, one-digit month, day and hour fields, a `Z` or `±h[h][:mm]` zone
/// (UTC when absent), or a bare date.
pub fn parse_timestamp(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime);
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date.and_time(NaiveTime::MIN).and_utc().fixed_offset());
    }

    let (date, rest) = text.split_once(['t', 'T', ' '])?;
    let rest = rest.trim_start();
    let (time, zone) = split_zone(rest);
    let naive = NaiveDateTime::parse_from_str(
        &format!("{} {}", date, time.trim_end()),
        "%Y-%m-%d %H:%M:%S%.f",
    )
    .ok()?;
    let offset = match zone {
        Some(zone) => parse_offset(zone)?,
        None => FixedOffset::east_opt(0)?,
    };
    offset.from_local_datetime(&naive).single()
}

fn split_zone(time: &str) -> (&str, Option<&str>) {
    if let Some(stripped) = time.strip_suffix(['Z', 'z']) {
        return (stripped, Some("+00:00"));
    }
    match time.rfind(['+', '-']) {
        Some(i) => (&time[..i], Some(&time[i..])),
        None => (time, None),
    }
}

fn parse_offset(zone: &str) -> Option<FixedOffset> {
    let sign = if zone.starts_with('-') { -1 } else { 1 };
    let body = &zone[1..];
    let (hours, minutes) = match body.split_once(':') {
        Some((h, m)) => (h, m),
        None if body.len() > 2 => body.split_at(body.len() - 2),
        None => (body, "0"),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

macro_rules! datetime_impls {
    ($ty:ty, $convert:expr) => {
        impl Encode for $ty {
            fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
                Ok(encoder.string(&self.to_rfc3339_opts(SecondsFormat::AutoSi, true)))
            }

            fn is_zero(&self) -> bool {
                *self == <$ty>::default()
            }
        }

        impl Decode for $ty {
            fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
                let Some(text) = hook_text::<$ty>(node)? else {
                    return Ok(<$ty>::default());
                };
                let convert: fn(DateTime<FixedOffset>) -> $ty = $convert;
                parse_timestamp(&text)
                    .map(convert)
                    .ok_or_else(|| invalid::<$ty>(node, &text))
            }
        }
    };
}

datetime_impls!(DateTime<Utc>, |dt| dt.with_timezone(&Utc));
datetime_impls!(DateTime<FixedOffset>, |dt| dt);

impl Encode for NaiveDate {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        Ok(encoder.string(&self.format("%Y-%m-%d").to_string()))
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDate::default()
    }
}

impl Decode for NaiveDate {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        let Some(text) = hook_text::<NaiveDate>(node)? else {
            return Ok(NaiveDate::default());
        };
        parse_timestamp(&text)
            .map(|dt| dt.date_naive())
            .ok_or_else(|| invalid::<NaiveDate>(node, &text))
    }
}

impl Encode for NaiveDateTime {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        Ok(encoder.string(&self.format("%Y-%m-%dT%H:%M:%S%.f").to_string()))
    }

    fn is_zero(&self) -> bool {
        *self == NaiveDateTime::default()
    }
}

/// A zone in the text is dropped; the wall clock time is kept.
impl Decode for NaiveDateTime {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        let Some(text) = hook_text::<NaiveDateTime>(node)? else {
            return Ok(NaiveDateTime::default());
        };
        parse_timestamp(&text)
            .map(|dt| dt.naive_local())
            .ok_or_else(|| invalid::<NaiveDateTime>(node, &text))
    }
}

/// Render a duration as `1h2m3.5s`, or in `ms`, `µs` or `ns` below one
/// second.
pub fn format_duration(duration: Duration) -> String {
    let nanos = duration.as_nanos();
    if nanos == 0 {
        return "0s".to_string();
    }
    if nanos < 1_000 {
        return format!("{}ns", nanos);
    }
    if nanos < 1_000_000 {
        return format!("{}µs", with_fraction(nanos, 1_000));
    }
    if nanos < 1_000_000_000 {
        return format!("{}ms", with_fraction(nanos, 1_000_000));
    }
    let secs = duration.as_secs();
    let (hours, minutes) = (secs / 3600, secs % 3600 / 60);
    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    let rest = u128::from(secs % 60) * 1_000_000_000 + u128::from(duration.subsec_nanos());
    out.push_str(&format!("{}s", with_fraction(rest, 1_000_000_000)));
    out
}

fn with_fraction(value: u128, unit: u128) -> String {
    let (whole, fraction) = (value / unit, value % unit);
    if fraction == 0 {
        return whole.to_string();
    }
    let width = unit.ilog10() as usize;
    let digits = format!("{:0width$}", fraction, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parse a duration such as `1h30m`, `2.5s` or `150ms`. Units are `h`,
/// `m`, `s`, `ms`, `us`/`µs` and `ns`; a bare `0` is accepted.
pub fn parse_duration(text: &str) -> Option<Duration> {
    let mut rest = text.trim();
    if rest == "0" {
        return Some(Duration::ZERO);
    }
    if rest.is_empty() {
        return None;
    }
    let mut total: u128 = 0;
    while !rest.is_empty() {
        let number_end = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        if number_end == 0 {
            return None;
        }
        let (number, tail) = rest.split_at(number_end);
        let unit_end = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_end);
        let scale: u128 = match unit {
            "ns" => 1,
            "us" | "µs" | "μs" => 1_000,
            "ms" => 1_000_000,
            "s" => 1_000_000_000,
            "m" => 60 * 1_000_000_000,
            "h" => 3600 * 1_000_000_000,
            _ => return None,
        };
        total = total.checked_add(scaled(number, scale)?)?;
        rest = tail;
    }
    Some(Duration::from_nanos(u64::try_from(total).ok()?))
}

fn scaled(number: &str, scale: u128) -> Option<u128> {
    let (whole, fraction) = number.split_once('.').unwrap_or((number, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }
    let whole: u128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut value = whole.checked_mul(scale)?;
    // Digits past nanosecond precision cannot change the result.
    let fraction = &fraction[..fraction.len().min(18)];
    if !fraction.is_empty() {
        let digits: u128 = fraction.parse().ok()?;
        let part = digits.checked_mul(scale)? / 10u128.pow(fraction.len() as u32);
        value = value.checked_add(part)?;
    }
    Some(value)
}

impl Encode for Duration {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        Ok(encoder.string(&format_duration(*self)))
    }

    fn is_zero(&self) -> bool {
        Duration::is_zero(self)
    }
}

impl Decode for Duration {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        match &node.kind {
            NodeKind::Null => Ok(Duration::ZERO),
            NodeKind::String(text) | NodeKind::Literal(text) => {
                parse_duration(text).ok_or_else(|| invalid::<Duration>(node, text))
            }
            _ => Err(Error::at(ErrorKind::type_mismatch("duration", node), node)),
        }
    }
}

/// Encodes through `Display` and decodes through `FromStr`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Text<T>(pub T);

impl<T: Display + 'static> Encode for Text<T> {
    fn encode(&self, encoder: &mut Encoder) -> Result<Node> {
        Ok(encoder.string(&self.0.to_string()))
    }
}

impl<T> Decode for Text<T>
where
    T: FromStr + 'static,
    T::Err: Display,
{
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        let text = hook_text::<T>(node)?.unwrap_or_default();
        text.parse().map(Text).map_err(|e: T::Err| {
            Error::at(ErrorKind::Codec(e.to_string().into()), node)
        })
    }
}

impl<T: Display> Display for Text<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Bytes written as a `!!binary` base64 scalar. Untagged strings decode
/// to their UTF-8 bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Binary(pub Vec<u8>);

impl Encode for Binary {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
        let text = base64::engine::general_purpose::STANDARD.encode(&self.0);
        Ok(Node::tagged(Tag::Binary, Node::string(text)))
    }

    fn is_zero(&self) -> bool {
        self.0.is_empty()
    }
}

impl Decode for Binary {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        if let Some(bytes) = binary_bytes(node) {
            return bytes.map(Binary);
        }
        match &node.kind {
            NodeKind::Null => Ok(Binary::default()),
            NodeKind::String(s) | NodeKind::Literal(s) => Ok(Binary(s.clone().into_bytes())),
            _ => Err(Error::at(ErrorKind::type_mismatch("binary", node), node)),
        }
    }
}

/// A value with no built-in encoding. Encoding or decoding succeeds only
/// through a codec registered for `Registered<T>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registered<T>(pub T);

impl<T: 'static> Encode for Registered<T> {
    fn encode(&self, _encoder: &mut Encoder) -> Result<Node> {
        Err(Error::new(ErrorKind::UnimplementedCodec {
            type_name: std::any::type_name::<Self>(),
        }))
    }
}

impl<T: 'static> Decode for Registered<T> {
    fn decode(_decoder: &mut Decoder, node: &Node) -> Result<Self> {
        Err(Error::at(
            ErrorKind::UnimplementedCodec {
                type_name: std::any::type_name::<Self>(),
            },
            node,
        ))
    }
}
