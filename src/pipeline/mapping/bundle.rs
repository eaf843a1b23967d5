//! FHIR Bundle traversal.
//!
//! The bundle skeleton (root object → `entry` array → entry objects →
//! `resource` objects) is checked strictly. Below a resource, [`Node::get`]
//! and [`Node::first`] read leniently (a missing, empty or differently-typed
//! field reads as absent), while [`Node::member`] and [`Node::first_of`]
//! reject a field that is present but cannot be traversed.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use super::{json_type_name, MapperError};

/// Resources of a bundle with their entry index, in entry order.
#[derive(Debug)]
pub struct Bundle<'a> {
    resources: Vec<(usize, &'a Value)>,
}

impl<'a> Bundle<'a> {
    /// Index the `entry[].resource` objects of a bundle document.
    ///
    /// A missing `entry` key is an empty bundle. Entries without a
    /// `resource` are skipped.
    pub fn index(document: &'a Value) -> Result<Self, MapperError> {
        let root = document
            .as_object()
            .ok_or_else(|| MapperError::NotAnObject(json_type_name(document)))?;

        let entries = match root.get("entry") {
            None => return Ok(Self { resources: vec![] }),
            Some(Value::Array(entries)) => entries,
            Some(other) => return Err(MapperError::EntriesNotArray(json_type_name(other))),
        };

        let mut resources = Vec::with_capacity(entries.len());
        for (index, entry) in entries.iter().enumerate() {
            let entry = entry.as_object().ok_or(MapperError::EntryNotObject {
                index,
                found: json_type_name(entry),
            })?;
            match entry.get("resource") {
                None => {}
                Some(resource) if resource.is_object() => resources.push((index, resource)),
                Some(other) => {
                    return Err(MapperError::ResourceNotObject {
                        index,
                        found: json_type_name(other),
                    })
                }
            }
        }

        Ok(Self { resources })
    }

    /// Every resource whose `resourceType` equals `resource_type`, paired
    /// with its index in `entry`.
    pub fn entries(&self, resource_type: &str) -> impl Iterator<Item = (usize, Node<'a>)> + '_ {
        let resource_type = resource_type.to_owned();
        self.resources
            .iter()
            .copied()
            .filter(move |(_, r)| {
                r.get("resourceType").and_then(Value::as_str) == Some(resource_type.as_str())
            })
            .map(|(index, r)| (index, Node(Some(r))))
    }

    /// Every resource whose `resourceType` equals `resource_type`.
    pub fn all(&self, resource_type: &str) -> impl Iterator<Item = Node<'a>> + '_ {
        self.entries(resource_type).map(|(_, node)| node)
    }

    /// First matching resource with its entry index.
    pub fn first_entry(&self, resource_type: &str) -> Option<(usize, Node<'a>)> {
        self.entries(resource_type).next()
    }

    /// First matching resource, or an absent node when there is none.
    pub fn first(&self, resource_type: &str) -> Node<'a> {
        self.all(resource_type).next().unwrap_or(Node(None))
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Lenient cursor into a resource.
#[derive(Debug, Clone, Copy)]
pub struct Node<'a>(Option<&'a Value>);

impl<'a> Node<'a> {
    pub fn new(value: &'a Value) -> Self {
        Self(Some(value))
    }

    /// Object member `key`.
    pub fn get(self, key: &str) -> Node<'a> {
        Node(self.0.and_then(|v| v.get(key)))
    }

    /// First element of an array.
    pub fn first(self) -> Node<'a> {
        Node(self.0.and_then(Value::as_array).and_then(|a| a.first()))
    }

    /// Object member `key`, read strictly. An absent node or a missing key
    /// is absent; a node that is present but not an object is an error
    /// carrying the JSON type found.
    pub fn member(self, key: &str) -> Result<Node<'a>, &'static str> {
        match self.0 {
            None => Ok(Node(None)),
            Some(Value::Object(map)) => Ok(Node(map.get(key))),
            Some(other) => Err(json_type_name(other)),
        }
    }

    /// First object of the array under `key`, read strictly. A missing key is
    /// absent; a key holding an empty array, a non-array, or an array whose
    /// first element is not an object is an error.
    pub fn first_of(self, key: &str) -> Result<Node<'a>, &'static str> {
        match self.member(key)?.0 {
            None => Ok(Node(None)),
            Some(Value::Array(items)) => match items.first() {
                None => Err("empty array"),
                Some(first) if first.is_object() => Ok(Node(Some(first))),
                Some(other) => Err(json_type_name(other)),
            },
            Some(other) => Err(json_type_name(other)),
        }
    }

    /// Array elements; empty when this is not an array.
    pub fn items(self) -> impl Iterator<Item = Node<'a>> {
        self.0
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .map(|v| Node(Some(v)))
    }

    pub fn is_present(self) -> bool {
        !matches!(self.0, None | Some(Value::Null))
    }

    pub fn as_str(self) -> Option<&'a str> {
        self.0.and_then(Value::as_str)
    }

    /// Scalar as text. Numbers are rendered, everything else is absent.
    pub fn text(self) -> Option<String> {
        match self.0? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    /// ISO-8601 date or date-time; absent when missing or unparsable.
    pub fn date(self) -> Option<NaiveDate> {
        self.as_str().and_then(parse_fhir_date)
    }
}

/// Parse an ISO-8601 date (`2024-01-15`) or date-time
/// (`2024-01-15T09:30:00`, `2024-01-15T09:30:00+02:00`, `...Z`).
///
/// Date-times keep the calendar date as written, without converting the
/// offset. Never fails: bad input yields `None`.
pub fn parse_fhir_date(text: &str) -> Option<NaiveDate> {
    if text.is_empty() {
        return None;
    }

    if let Ok(d) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(d);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(text, format) {
            return Some(dt.date());
        }
    }
    None
}

/// Compose a FHIR `HumanName` list into `"<given> <family>"`.
///
/// Uses the first name entry. An empty result is absent.
pub fn human_name(names: Node<'_>) -> Option<String> {
    let name = names.first();
    if !name.is_present() {
        return None;
    }

    let given = name
        .get("given")
        .items()
        .filter_map(Node::as_str)
        .collect::<Vec<_>>()
        .join(" ");
    let family = name.get("family").as_str().unwrap_or("");

    let full = format!("{given} {family}");
    let full = full.trim();
    if full.is_empty() {
        None
    } else {
        Some(full.to_string())
    }
}

/// Trailing path segment of a FHIR reference (`Practitioner/123` → `123`).
pub fn reference_id(reference: &str) -> Option<String> {
    reference
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
}
