//! Message rendering.
//!
//! Turns a template plus positional parameters into a label and body
//! ([`PreparedLine`]), which the dispatcher stamps into a complete line:
//!
//! ```text
//! <local date-time>: <label><formatted template>\r\n
//! ```
//!
//! Templates use printf-style placeholders matched to parameters by
//! position:
//!
//! | Placeholder | Accepts                         | Output                     |
//! |-------------|---------------------------------|----------------------------|
//! | `%s` `%S`   | anything                        | display form (`S` upper)   |
//! | `%d`        | integer                         | decimal                    |
//! | `%x` `%X`   | integer                         | hexadecimal                |
//! | `%f`        | float                           | fixed, 6 decimals default  |
//! | `%e` `%E`   | float                           | scientific, `1.5e+00`      |
//! | `%b` `%B`   | anything (non-bool is `true`)   | `true` / `false`           |
//! | `%c` `%C`   | char, one-char string, integer  | a single character         |
//! | `%%`        | nothing                         | `%`                        |
//! | `%n`        | nothing                         | newline                    |
//!
//! Placeholders take optional `n$` argument indices, the flags `-`, `+`,
//! `0`, `,` and space, a width and a `.precision`. Any mismatch between
//! the template and the parameters is an `InvalidArgument` error, including
//! parameters that no placeholder consumes.

use catlog_types::{bug, CatlogError, CategoryName, LogParam, Result};
use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::{Captures, Regex};

use crate::time::format_timestamp;

/// Terminator appended to every rendered line.
pub const LINE_TERMINATOR: &str = "\r\n";

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%(?:(\d+)\$)?([-+0, ]*)(\d+)?(?:\.(\d+))?([a-zA-Z%])")
        .expect("placeholder pattern is a valid regex")
});

/// Substitute `params` into `template`.
///
/// # Errors
///
/// Returns `InvalidArgument` if the template is empty, contains an unknown
/// or malformed placeholder, references a missing parameter, receives a
/// parameter of the wrong kind, or leaves a parameter unused.
///
/// # Example
///
/// ```
/// use catlog_core::render::format_template;
/// use catlog_types::params;
///
/// let s = format_template("%s took %.2f ms", &params!["query", 1.257]).unwrap();
/// assert_eq!(s, "query took 1.26 ms");
/// ```
pub fn format_template(template: &str, params: &[LogParam]) -> Result<String> {
    if template.is_empty() {
        return Err(CatlogError::invalid("message is empty"));
    }

    let mut out = String::with_capacity(template.len() + 16 * params.len());
    let mut used = vec![false; params.len()];
    let mut next = 0usize;
    let mut last = 0usize;

    for caps in PLACEHOLDER.captures_iter(template) {
        let whole = match caps.get(0) {
            Some(m) => m,
            None => bug!("placeholder match without a span in '{}'", template),
        };
        push_literal(&mut out, &template[last..whole.start()])?;
        last = whole.end();

        let placeholder = Placeholder::parse(&caps)?;
        match placeholder.conversion {
            '%' => {
                out.push_str(&placeholder.pad_text("%".to_string()));
                continue;
            }
            'n' => {
                out.push('\n');
                continue;
            }
            _ => {}
        }

        let index = match placeholder.index {
            Some(0) => {
                return Err(CatlogError::invalid(format!(
                    "Illegal argument index in '{}': indices start at 1",
                    placeholder.raw
                )))
            }
            Some(i) => i - 1,
            None => {
                next += 1;
                next - 1
            }
        };
        let param = params.get(index).ok_or_else(|| {
            CatlogError::invalid(format!(
                "Format specifier '{}' has no matching argument ({} given)",
                placeholder.raw,
                params.len()
            ))
        })?;
        used[index] = true;
        out.push_str(&placeholder.apply(param)?);
    }
    push_literal(&mut out, &template[last..])?;

    if let Some(unused) = used.iter().position(|u| !u) {
        return Err(CatlogError::invalid(format!(
            "Argument {} ({} '{}') is not consumed by template '{}'",
            unused + 1,
            params[unused].kind(),
            params[unused],
            template
        )));
    }

    Ok(out)
}

/// Join the parts of a log line.
pub fn render_line(timestamp: &str, label: &str, body: &str) -> String {
    let mut line =
        String::with_capacity(timestamp.len() + label.len() + body.len() + 2 + LINE_TERMINATOR.len());
    line.push_str(timestamp);
    line.push_str(": ");
    line.push_str(label);
    line.push_str(body);
    line.push_str(LINE_TERMINATOR);
    line
}

fn push_literal(out: &mut String, literal: &str) -> Result<()> {
    if let Some(pos) = literal.find('%') {
        return Err(CatlogError::invalid(format!(
            "Unknown format conversion near '{}'",
            &literal[pos..]
        )));
    }
    out.push_str(literal);
    Ok(())
}

#[derive(Debug, Default, Clone, Copy)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
}

#[derive(Debug)]
struct Placeholder<'t> {
    raw: &'t str,
    index: Option<usize>,
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

impl<'t> Placeholder<'t> {
    fn parse(caps: &Captures<'t>) -> Result<Self> {
        let raw = caps.get(0).map_or("", |m| m.as_str());
        let number = |group: usize| -> Result<Option<usize>> {
            caps.get(group)
                .map(|m| {
                    m.as_str().parse::<usize>().map_err(|_| {
                        CatlogError::invalid(format!("Number out of range in '{}'", raw))
                    })
                })
                .transpose()
        };

        let mut flags = Flags::default();
        for c in caps.get(2).map_or("", |m| m.as_str()).chars() {
            let seen = match c {
                '-' => std::mem::replace(&mut flags.left, true),
                '+' => std::mem::replace(&mut flags.plus, true),
                ' ' => std::mem::replace(&mut flags.space, true),
                '0' => std::mem::replace(&mut flags.zero, true),
                ',' => std::mem::replace(&mut flags.group, true),
                _ => false,
            };
            if seen {
                return Err(CatlogError::invalid(format!("Duplicate flag '{}' in '{}'", c, raw)));
            }
        }

        let conversion = caps
            .get(5)
            .and_then(|m| m.as_str().chars().next())
            .ok_or_else(|| CatlogError::invalid(format!("Missing conversion in '{}'", raw)))?;

        let placeholder = Self {
            raw,
            index: number(1)?,
            flags,
            width: number(3)?,
            precision: number(4)?,
            conversion,
        };
        placeholder.validate()?;
        Ok(placeholder)
    }

    fn validate(&self) -> Result<()> {
        let f = self.flags;
        if (f.left || f.zero) && self.width.is_none() {
            return Err(self.error("flags '-' and '0' require a width"));
        }
        if f.left && f.zero {
            return Err(self.error("flags '-' and '0' cannot be combined"));
        }
        if f.plus && f.space {
            return Err(self.error("flags '+' and ' ' cannot be combined"));
        }

        let numeric_flags = f.plus || f.space || f.zero || f.group;
        match self.conversion {
            's' | 'S' | 'b' | 'B' | 'c' | 'C' | '%' | 'n' if numeric_flags => {
                Err(self.error("numeric flags are not allowed"))
            }
            'n' if self.width.is_some() || f.left => Err(self.error("'%n' takes no width")),
            'c' | 'C' | 'd' | 'x' | 'X' | '%' | 'n' if self.precision.is_some() => {
                Err(self.error("precision is not allowed"))
            }
            'x' | 'X' if f.plus || f.space || f.group => {
                Err(self.error("flags '+', ' ' and ',' are not allowed"))
            }
            'e' | 'E' if f.group => Err(self.error("flag ',' is not allowed")),
            's' | 'S' | 'd' | 'x' | 'X' | 'f' | 'e' | 'E' | 'b' | 'B' | 'c' | 'C' | '%' | 'n' => {
                Ok(())
            }
            other => Err(CatlogError::invalid(format!(
                "Unknown format conversion '{}' in '{}'",
                other, self.raw
            ))),
        }
    }

    fn error(&self, reason: &str) -> CatlogError {
        CatlogError::invalid(format!("Illegal format specifier '{}': {}", self.raw, reason))
    }

    fn mismatch(&self, expected: &str, param: &LogParam) -> CatlogError {
        CatlogError::invalid(format!(
            "Format specifier '{}' expects {}, got {} '{}'",
            self.raw,
            expected,
            param.kind(),
            param
        ))
    }

    fn apply(&self, param: &LogParam) -> Result<String> {
        let upper = self.conversion.is_ascii_uppercase();
        let text = match self.conversion.to_ascii_lowercase() {
            's' => {
                let s = self.truncate(param.to_string());
                return Ok(self.pad_text(case(s, upper)));
            }
            'b' => {
                let b = match param {
                    LogParam::Bool(b) => *b,
                    _ => true,
                };
                let s = self.truncate(b.to_string());
                return Ok(self.pad_text(case(s, upper)));
            }
            'c' => {
                let c = match param {
                    LogParam::Char(c) => Some(*c),
                    LogParam::Str(s) if s.chars().count() == 1 => s.chars().next(),
                    LogParam::Int(i) => u32::try_from(*i).ok().and_then(char::from_u32),
                    _ => None,
                };
                let c = c.ok_or_else(|| self.mismatch("a single character", param))?;
                return Ok(self.pad_text(case(c.to_string(), upper)));
            }
            'd' => {
                let v = self.int(param)?;
                let digits = v.unsigned_abs().to_string();
                let digits = if self.flags.group { group_thousands(&digits) } else { digits };
                self.pad_number(v < 0, digits)
            }
            'x' => {
                let v = self.int(param)?;
                let digits = format!("{:x}", v);
                self.pad_number(false, case(digits, upper))
            }
            'f' => {
                let x = self.float(param)?;
                if !x.is_finite() {
                    return Ok(self.pad_text(self.non_finite(x)));
                }
                let digits = format!("{:.*}", self.precision.unwrap_or(6), x.abs());
                let digits = if self.flags.group { group_fixed(&digits) } else { digits };
                self.pad_number(x.is_sign_negative(), digits)
            }
            'e' => {
                let x = self.float(param)?;
                if !x.is_finite() {
                    return Ok(self.pad_text(case(self.non_finite(x), upper)));
                }
                let digits = scientific(x.abs(), self.precision.unwrap_or(6));
                self.pad_number(x.is_sign_negative(), case(digits, upper))
            }
            other => {
                return Err(CatlogError::Bug(format!(
                    "conversion '{}' passed validation but has no renderer",
                    other
                )))
            }
        };
        Ok(text)
    }

    fn int(&self, param: &LogParam) -> Result<i64> {
        match param {
            LogParam::Int(i) => Ok(*i),
            other => Err(self.mismatch("an integer", other)),
        }
    }

    fn float(&self, param: &LogParam) -> Result<f64> {
        match param {
            LogParam::Float(x) => Ok(*x),
            other => Err(self.mismatch("a float", other)),
        }
    }

    fn non_finite(&self, x: f64) -> String {
        if x.is_nan() {
            "NaN".to_string()
        } else if x.is_sign_negative() {
            "-Infinity".to_string()
        } else if self.flags.plus {
            "+Infinity".to_string()
        } else {
            "Infinity".to_string()
        }
    }

    fn truncate(&self, s: String) -> String {
        match self.precision {
            Some(p) => s.chars().take(p).collect(),
            None => s,
        }
    }

    fn pad_text(&self, s: String) -> String {
        let len = s.chars().count();
        match self.width {
            Some(w) if w > len => {
                let fill = " ".repeat(w - len);
                if self.flags.left {
                    s + &fill
                } else {
                    fill + &s
                }
            }
            _ => s,
        }
    }

    fn pad_number(&self, negative: bool, digits: String) -> String {
        let sign = if negative {
            "-"
        } else if self.flags.plus {
            "+"
        } else if self.flags.space {
            " "
        } else {
            ""
        };

        let len = sign.len() + digits.len();
        match self.width {
            Some(w) if w > len && self.flags.zero => {
                format!("{}{}{}", sign, "0".repeat(w - len), digits)
            }
            _ => self.pad_text(format!("{}{}", sign, digits)),
        }
    }
}

fn case(s: String, upper: bool) -> String {
    if upper {
        s.to_uppercase()
    } else {
        s
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn group_fixed(digits: &str) -> String {
    match digits.split_once('.') {
        Some((int, frac)) => format!("{}.{}", group_thousands(int), frac),
        None => group_thousands(digits),
    }
}

fn scientific(x: f64, precision: usize) -> String {
    let s = format!("{:.*e}", precision, x);
    let (mantissa, exponent) = s.split_once('e').unwrap_or((s.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{:02}", mantissa, sign, exponent.unsigned_abs())
}

/// Renders complete log lines, including the optional category label.
#[derive(Debug, Default)]
pub struct MessageRenderer {
    label_format: RwLock<Option<String>>,
}

impl MessageRenderer {
    /// Create a renderer with no label format.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the template used to render the category label.
    ///
    /// The template receives the category name as its only parameter, so
    /// it must contain exactly one placeholder that accepts a string.
    pub fn set_label_format(&self, format: &str) -> Result<()> {
        if format.is_empty() {
            return Err(CatlogError::invalid("category format is empty"));
        }
        format_template(format, &[LogParam::Str("category".to_string())])?;
        *self.label_format.write() = Some(format.to_string());
        Ok(())
    }

    /// Stop rendering category labels.
    pub fn clear_label_format(&self) {
        *self.label_format.write() = None;
    }

    /// The current label format, if any.
    pub fn label_format(&self) -> Option<String> {
        self.label_format.read().clone()
    }

    /// The label for `category`; empty unless both a format and a category
    /// are present.
    pub fn label(&self, category: Option<&CategoryName>) -> Result<String> {
        match (self.label_format.read().as_deref(), category) {
            (Some(format), Some(category)) => {
                format_template(format, &[LogParam::Str(category.as_str().to_string())])
            }
            _ => Ok(String::new()),
        }
    }

    /// Render the label and body of a line. The timestamp is added when
    /// the line is stamped.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `template` does not match `params`.
    pub fn prepare(
        &self,
        category: Option<&CategoryName>,
        template: &str,
        params: &[LogParam],
    ) -> Result<PreparedLine> {
        let body = format_template(template, params)?;
        let label = self.label(category)?;
        Ok(PreparedLine { label, body })
    }
}

/// A rendered label and body waiting for its timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedLine {
    label: String,
    body: String,
}

impl PreparedLine {
    /// Build a line from an already rendered label and body.
    pub fn new(label: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            body: body.into(),
        }
    }

    /// The rendered category label, possibly empty.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The rendered template.
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The complete line stamped with `at`.
    pub fn stamp(&self, at: &DateTime<Local>) -> String {
        render_line(&format_timestamp(at), &self.label, &self.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use catlog_types::params;
    use chrono::TimeZone;

    fn fmt(template: &str, params: &[LogParam]) -> String {
        format_template(template, params).unwrap()
    }

    fn fails(template: &str, params: &[LogParam]) -> String {
        match format_template(template, params) {
            Err(CatlogError::InvalidArgument(msg)) => msg,
            other => panic!("expected InvalidArgument for {:?}, got {:?}", template, other),
        }
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(fmt("hello world", &[]), "hello world");
        assert_eq!(fmt("100%% done%n", &[]), "100% done\n");
    }

    #[test]
    fn test_string_conversions() {
        assert_eq!(fmt("[%s]", &params!["db"]), "[db]");
        assert_eq!(fmt("[%S]", &params!["db"]), "[DB]");
        assert_eq!(fmt("[%5s]", &params!["db"]), "[   db]");
        assert_eq!(fmt("[%-5s]", &params!["db"]), "[db   ]");
        assert_eq!(fmt("[%.2s]", &params!["database"]), "[da]");
        assert_eq!(fmt("%s %s %s", &params![1, 2.5, true]), "1 2.5 true");
    }

    #[test]
    fn test_integer_conversions() {
        assert_eq!(fmt("%d", &params![42]), "42");
        assert_eq!(fmt("%d", &params![-42]), "-42");
        assert_eq!(fmt("%+d", &params![42]), "+42");
        assert_eq!(fmt("% d", &params![42]), " 42");
        assert_eq!(fmt("%05d", &params![-42]), "-0042");
        assert_eq!(fmt("%5d|", &params![42]), "   42|");
        assert_eq!(fmt("%-5d|", &params![42]), "42   |");
        assert_eq!(fmt("%,d", &params![1234567]), "1,234,567");
        assert_eq!(fmt("%,d", &params![-999]), "-999");
        assert_eq!(fmt("%x %X", &params![255, 255]), "ff FF");
        assert_eq!(fmt("%04x", &params![10]), "000a");
    }

    #[test]
    fn test_float_conversions() {
        assert_eq!(fmt("%f", &params![1.5]), "1.500000");
        assert_eq!(fmt("%.2f", &params![2.0 / 3.0]), "0.67");
        assert_eq!(fmt("%.0f", &params![2.7]), "3");
        assert_eq!(fmt("%8.3f|", &params![-1.5]), "  -1.500|");
        assert_eq!(fmt("%08.3f", &params![-1.5]), "-001.500");
        assert_eq!(fmt("%,.1f", &params![1234567.26]), "1,234,567.3");
        assert_eq!(fmt("%e", &params![1234.5]), "1.234500e+03");
        assert_eq!(fmt("%.2E", &params![0.000123]), "1.23E-04");
        assert_eq!(fmt("%e", &params![0.0]), "0.000000e+00");
        assert_eq!(fmt("%f", &params![f64::NAN]), "NaN");
        assert_eq!(fmt("%f", &params![f64::NEG_INFINITY]), "-Infinity");
    }

    #[test]
    fn test_bool_and_char_conversions() {
        assert_eq!(fmt("%b %b", &params![false, "anything"]), "false true");
        assert_eq!(fmt("%B", &params![true]), "TRUE");
        assert_eq!(fmt("%c%c%c", &params!['a', "b", 67]), "abC");
        assert_eq!(fmt("%C", &params!['q']), "Q");
    }

    #[test]
    fn test_explicit_indices() {
        assert_eq!(fmt("%2$s %1$s", &params!["a", "b"]), "b a");
        assert_eq!(fmt("%1$s=%1$s", &params!["x"]), "x=x");
        assert_eq!(fmt("%2$d then %s", &params!["first", 2]), "2 then first");
    }

    #[test]
    fn test_empty_template_rejected() {
        let msg = fails("", &[]);
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_arity_errors() {
        assert!(fails("%s and %s", &params!["one"]).contains("no matching argument"));
        assert!(fails("plain", &params!["extra"]).contains("not consumed"));
        assert!(fails("%s", &params!["a", "b"]).contains("Argument 2"));
        assert!(fails("%0$s", &params!["a"]).contains("indices start at 1"));
    }

    #[test]
    fn test_type_errors() {
        assert!(fails("%d", &params!["seven"]).contains("expects an integer"));
        assert!(fails("%f", &params![3]).contains("expects a float"));
        assert!(fails("%x", &params![1.0]).contains("expects an integer"));
        assert!(fails("%c", &params!["two"]).contains("single character"));
    }

    #[test]
    fn test_malformed_placeholders() {
        assert!(fails("50%", &[]).contains("Unknown format conversion"));
        assert!(fails("%q", &params![1]).contains("Unknown format conversion 'q'"));
        assert!(fails("%-d", &params![1]).contains("require a width"));
        assert!(fails("%.2d", &params![1]).contains("precision"));
        assert!(fails("%+s", &params!["a"]).contains("numeric flags"));
        assert!(fails("%--5d", &params![1]).contains("Duplicate flag"));
    }

    #[test]
    fn test_render_line_layout() {
        let line = render_line("2024-01-01T00:00:00", "[db] ", "hi");
        assert_eq!(line, "2024-01-01T00:00:00: [db] hi\r\n");
    }

    #[test]
    fn test_renderer_label() {
        let renderer = MessageRenderer::new();
        let db = CategoryName::new("db").unwrap();
        let at = Local.with_ymd_and_hms(2024, 5, 6, 7, 8, 9).unwrap();

        let line = renderer.prepare(Some(&db), "n=%d", &params![3]).unwrap();
        assert_eq!(line.stamp(&at), "2024-05-06T07:08:09: n=3\r\n");

        renderer.set_label_format("<%s> ").unwrap();
        let line = renderer.prepare(Some(&db), "n=%d", &params![3]).unwrap();
        assert_eq!(line.label(), "<db> ");
        assert_eq!(line.body(), "n=3");
        assert_eq!(line.stamp(&at), "2024-05-06T07:08:09: <db> n=3\r\n");

        let line = renderer.prepare(None, "no category", &[]).unwrap();
        assert_eq!(line.stamp(&at), "2024-05-06T07:08:09: no category\r\n");

        renderer.clear_label_format();
        assert_eq!(renderer.label(Some(&db)).unwrap(), "");
    }

    #[test]
    fn test_label_format_validated() {
        let renderer = MessageRenderer::new();
        assert!(renderer.set_label_format("").is_err());
        assert!(renderer.set_label_format("%d: ").is_err());
        assert!(renderer.set_label_format("no placeholder").is_err());
        assert!(renderer.label_format().is_none());

        renderer.set_label_format("%-6s|").unwrap();
        assert_eq!(renderer.label_format().as_deref(), Some("%-6s|"));
    }

    #[test]
    fn test_render_fails_before_label() {
        let renderer = MessageRenderer::new();
        renderer.set_label_format("%s: ").unwrap();
        let cat = CategoryName::new("x").unwrap();
        assert!(renderer.prepare(Some(&cat), "%d", &params!["nope"]).is_err());
    }
}
