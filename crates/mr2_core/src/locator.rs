//! Schema-free lookup of save sections.
//!
//! Saves do not keep their sections at a fixed path, so a section is found
//! by walking mapping nodes depth-first, in key order, until one directly
//! holds the wanted key. Sequence elements are never descended into.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Shape the value under a matched key must have for the match to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Any,
    Sequence,
    Mapping,
}

impl Shape {
    pub fn matches(self, value: &Value) -> bool {
        match self {
            Shape::Any => true,
            Shape::Sequence => value.is_array(),
            Shape::Mapping => value.is_object(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKey {
    Resources,
    Buildings,
    Inventory,
    Equipment,
}

impl SectionKey {
    pub const ALL: [SectionKey; 4] = [
        SectionKey::Resources,
        SectionKey::Buildings,
        SectionKey::Inventory,
        SectionKey::Equipment,
    ];

    pub fn as_str(&self) -> &'static str {
        match *self {
            Self::Resources => "resources",
            Self::Buildings => "buildings",
            Self::Inventory => "inventory",
            Self::Equipment => "equipment",
        }
    }

    pub fn shape(&self) -> Shape {
        match *self {
            Self::Resources | Self::Buildings => Shape::Any,
            Self::Inventory => Shape::Sequence,
            Self::Equipment => Shape::Mapping,
        }
    }
}

impl fmt::Display for SectionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keys leading from the document root to a container.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct SectionPath(Vec<String>);

impl SectionPath {
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SectionPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if segment.contains('.') {
                write!(f, "{segment:?}")?;
            } else {
                f.write_str(segment)?;
            }
        }
        Ok(())
    }
}

pub fn locate<'a>(root: &'a Value, target: &str) -> Option<&'a Map<String, Value>> {
    locate_shaped(root, target, Shape::Any)
}

pub fn locate_section(root: &Value, key: SectionKey) -> Option<&Map<String, Value>> {
    locate_shaped(root, key.as_str(), key.shape())
}

pub fn locate_shaped<'a>(
    root: &'a Value,
    target: &str,
    shape: Shape,
) -> Option<&'a Map<String, Value>> {
    match root {
        Value::Object(map) => find_container(map, target, shape),
        _ => None,
    }
}

pub fn locate_path(root: &Value, target: &str, shape: Shape) -> Option<SectionPath> {
    let Value::Object(map) = root else {
        return None;
    };
    let mut path = Vec::new();
    if find_path(map, target, shape, &mut path) {
        Some(SectionPath(path))
    } else {
        None
    }
}

pub fn locate_mut<'a>(
    root: &'a mut Value,
    target: &str,
    shape: Shape,
) -> Option<&'a mut Map<String, Value>> {
    let path = locate_path(root, target, shape)?;
    resolve_mut(root, &path)
}

pub fn resolve_mut<'a>(root: &'a mut Value, path: &SectionPath) -> Option<&'a mut Map<String, Value>> {
    let mut node = root;
    for segment in path.segments() {
        node = node.as_object_mut()?.get_mut(segment)?;
    }
    node.as_object_mut()
}

fn holds_target(map: &Map<String, Value>, target: &str, shape: Shape) -> bool {
    map.get(target).is_some_and(|value| shape.matches(value))
}

fn find_container<'a>(
    map: &'a Map<String, Value>,
    target: &str,
    shape: Shape,
) -> Option<&'a Map<String, Value>> {
    if holds_target(map, target, shape) {
        return Some(map);
    }
    map.values().find_map(|value| match value {
        Value::Object(child) => find_container(child, target, shape),
        _ => None,
    })
}

fn find_path(map: &Map<String, Value>, target: &str, shape: Shape, path: &mut Vec<String>) -> bool {
    if holds_target(map, target, shape) {
        return true;
    }
    for (key, value) in map {
        let Value::Object(child) = value else {
            continue;
        };
        path.push(key.clone());
        if find_path(child, target, shape, path) {
            return true;
        }
        path.pop();
    }
    false
}
