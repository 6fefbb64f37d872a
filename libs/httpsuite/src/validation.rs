//! Validation adapter over the `validator` crate.
//!
//! Constraint evaluation is delegated to `#[derive(Validate)]`; this module only
//! shapes the outcome into a [`ValidationReport`]: field name → messages of the
//! form `<field> failed <constraint> validation`.

use indexmap::IndexMap;
use serde::de::{self, DeserializeOwned, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// Field-indexed validation failures, in declared field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ValidationReport {
    errors: IndexMap<String, Vec<String>>,
}

impl ValidationReport {
    /// Builds a report from `validator` output.
    ///
    /// `declared` lists the top-level wire names in declaration order. A field
    /// matches its wire name when both agree ignoring case, `_` and `-`, so
    /// `rename_all` casings line up and the report is keyed by the wire name.
    /// Fields that match nothing are appended in lexical order.
    pub fn from_errors(errors: &ValidationErrors, declared: &[&str]) -> Self {
        let mut entries = Vec::new();
        collect(errors, "", &mut entries);

        let wire: Vec<String> = declared.iter().map(|f| fold_name(f)).collect();
        let mut ranked: Vec<(Option<usize>, Entry)> = entries
            .into_iter()
            .map(|mut e| {
                let rank = wire.iter().position(|w| *w == fold_name(&e.top));
                if let Some(i) = rank {
                    e.path = format!("{}{}", declared[i], &e.path[e.top.len()..]);
                }
                (rank, e)
            })
            .collect();

        ranked.sort_by(|(ra, a), (rb, b)| match (ra, rb) {
            (Some(x), Some(y)) => x.cmp(y).then_with(|| a.path.cmp(&b.path)),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.path.cmp(&b.path),
        });

        let errors = ranked
            .into_iter()
            .map(|(_, e)| {
                let messages = e
                    .codes
                    .iter()
                    .map(|code| violation_message(&e.path, code))
                    .collect();
                (e.path, messages)
            })
            .collect();
        Self { errors }
    }

    /// Messages recorded for `field`.
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Number of fields with at least one violation.
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// JSON object `{field: [messages...]}` suitable for problem extensions.
    pub fn to_value(&self) -> Value {
        let map = self
            .errors
            .iter()
            .map(|(field, messages)| {
                let list = messages.iter().cloned().map(Value::String).collect();
                (field.clone(), Value::Array(list))
            })
            .collect();
        Value::Object(map)
    }
}

impl From<&ValidationReport> for Value {
    fn from(report: &ValidationReport) -> Self {
        report.to_value()
    }
}

/// Runs the declared constraints of `target`.
///
/// Returns `None` when every constraint holds.
pub fn validate<T>(target: &T) -> Option<ValidationReport>
where
    T: Validate + DeserializeOwned,
{
    match target.validate() {
        Ok(()) => None,
        Err(errors) => Some(ValidationReport::from_errors(
            &errors,
            declared_fields::<T>(),
        )),
    }
}

/// Canonical message for one violated constraint.
pub fn violation_message(field: &str, constraint: &str) -> String {
    format!("{field} failed {constraint} validation")
}

struct Entry {
    top: String,
    path: String,
    codes: Vec<String>,
}

fn collect(errors: &ValidationErrors, prefix: &str, out: &mut Vec<Entry>) {
    for (field, kind) in errors.errors() {
        let field = field.to_string();
        let path = if prefix.is_empty() {
            field.clone()
        } else {
            format!("{prefix}.{field}")
        };
        collect_kind(kind, prefix, &path, out);
    }
}

fn collect_kind(kind: &ValidationErrorsKind, prefix: &str, path: &str, out: &mut Vec<Entry>) {
    let top = top_segment(prefix, path);
    match kind {
        ValidationErrorsKind::Field(list) => out.push(Entry {
            top,
            path: path.to_string(),
            codes: list.iter().map(|e| e.code.to_string()).collect(),
        }),
        ValidationErrorsKind::Struct(nested) => {
            let mut inner = Vec::new();
            collect(nested, path, &mut inner);
            out.extend(inner.into_iter().map(|e| Entry { top: top.clone(), ..e }));
        }
        ValidationErrorsKind::List(items) => {
            for (index, nested) in items {
                let mut inner = Vec::new();
                collect(nested, &format!("{path}[{index}]"), &mut inner);
                out.extend(inner.into_iter().map(|e| Entry { top: top.clone(), ..e }));
            }
        }
    }
}

/// Case-insensitive form with `_` and `-` removed.
fn fold_name(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

fn top_segment(prefix: &str, path: &str) -> String {
    let root = if prefix.is_empty() { path } else { prefix };
    root.split(['.', '['])
        .next()
        .unwrap_or(root)
        .to_string()
}

/// Field names of `T` in declaration order, as seen by its `Deserialize` impl.
///
/// Returns an empty slice for types that don't deserialize from a plain
/// struct (maps, enums, `#[serde(flatten)]` containers).
pub fn declared_fields<T: DeserializeOwned>() -> &'static [&'static str] {
    let mut fields: &'static [&'static str] = &[];
    let _ = T::deserialize(FieldNames {
        fields: &mut fields,
    });
    fields
}

struct FieldNames<'a> {
    fields: &'a mut &'static [&'static str],
}

impl<'de> Deserializer<'de> for FieldNames<'_> {
    type Error = de::value::Error;

    fn deserialize_any<V: Visitor<'de>>(self, _visitor: V) -> Result<V::Value, Self::Error> {
        Err(de::Error::custom("not a struct"))
    }

    fn deserialize_struct<V: Visitor<'de>>(
        self,
        _name: &'static str,
        fields: &'static [&'static str],
        _visitor: V,
    ) -> Result<V::Value, Self::Error> {
        *self.fields = fields;
        Err(de::Error::custom("field names captured"))
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf option unit unit_struct newtype_struct seq tuple
        tuple_struct map enum identifier ignored_any
    }
}
