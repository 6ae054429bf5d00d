//! A heap-independent snapshot of a runtime value, for embedders (the
//! debug driver's `inspect <name>` command, a test assertion) that want
//! to look at a value's shape without holding a borrow on the
//! evaluator's heap.

use std::collections::BTreeMap;
use std::collections::HashSet;
use std::fmt;

use crate::heap::{Heap, ObjectId};
use crate::value::{Value, ValueData};

/// An owned, recursively-expanded view of a [`Value`]. Field maps are
/// sorted by name for stable display; the synthesized `self` field is
/// omitted since it is always a cycle back to the same object.
#[derive(Debug, Clone, PartialEq)]
pub enum GraceObject {
    Boolean(bool),
    Number(f64),
    String(String),
    Done,
    Block { arity: usize },
    UserObject { fields: BTreeMap<String, GraceObject> },
    Scope { fields: BTreeMap<String, GraceObject> },
    /// A cycle back to a heap object already being expanded (e.g. an
    /// object holding a field that points at itself).
    Cycle,
}

impl GraceObject {
    pub fn snapshot(value: &Value, heap: &Heap) -> Self {
        let mut seen = HashSet::new();
        Self::snapshot_inner(value, heap, &mut seen)
    }

    fn snapshot_inner(value: &Value, heap: &Heap, seen: &mut HashSet<ObjectId>) -> Self {
        match value {
            Value::Boolean(b) => GraceObject::Boolean(*b),
            Value::Number(n) => GraceObject::Number(*n),
            Value::String(s) => GraceObject::String(s.to_string()),
            Value::Done => GraceObject::Done,
            Value::Ref(id) => {
                if !seen.insert(*id) {
                    return GraceObject::Cycle;
                }
                let result = match heap.get(*id) {
                    ValueData::Block { params, .. } => GraceObject::Block { arity: params.len() },
                    ValueData::UserObject { fields, .. } => GraceObject::UserObject {
                        fields: snapshot_fields(fields, heap, seen),
                    },
                    ValueData::Scope { fields, .. } => GraceObject::Scope {
                        fields: snapshot_fields(fields, heap, seen),
                    },
                    ValueData::Done => GraceObject::Done,
                };
                seen.remove(id);
                result
            }
        }
    }
}

impl fmt::Display for GraceObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraceObject::Boolean(b) => write!(f, "{b}"),
            GraceObject::Number(n) => write!(f, "{n}"),
            GraceObject::String(s) => write!(f, "{s}"),
            GraceObject::Done => write!(f, "done"),
            GraceObject::Block { arity } => write!(f, "<block/{arity}>"),
            GraceObject::UserObject { fields } => write!(f, "<object {}>", format_fields(fields)),
            GraceObject::Scope { fields } => write!(f, "<scope {}>", format_fields(fields)),
            GraceObject::Cycle => write!(f, "<cycle>"),
        }
    }
}

fn format_fields(fields: &BTreeMap<String, GraceObject>) -> String {
    let rendered: Vec<String> = fields.iter().map(|(name, value)| format!("{name} = {value}")).collect();
    format!("{{{}}}", rendered.join(", "))
}

fn snapshot_fields(
    fields: &std::collections::HashMap<String, crate::value::Binding>,
    heap: &Heap,
    seen: &mut HashSet<ObjectId>,
) -> BTreeMap<String, GraceObject> {
    fields
        .iter()
        .filter(|(name, _)| name.as_str() != "self")
        .map(|(name, binding)| (name.clone(), GraceObject::snapshot_inner(&binding.value, heap, seen)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::Evaluator;

    #[test]
    fn primitive_snapshots_round_trip() {
        let heap = Heap::new();
        assert_eq!(GraceObject::snapshot(&Value::Number(2.0), &heap), GraceObject::Number(2.0));
        assert_eq!(GraceObject::snapshot(&Value::Done, &heap), GraceObject::Done);
    }

    #[test]
    fn display_renders_primitives_plainly_and_objects_as_field_lists() {
        assert_eq!(GraceObject::Boolean(true).to_string(), "true");
        assert_eq!(GraceObject::Number(2.5).to_string(), "2.5");
        assert_eq!(GraceObject::Done.to_string(), "done");

        let mut fields = BTreeMap::new();
        fields.insert("x".to_owned(), GraceObject::Number(1.0));
        assert_eq!(GraceObject::UserObject { fields }.to_string(), "<object {x = 1}>");
    }

    #[test]
    fn self_referential_object_reports_cycle_not_infinite_recursion() {
        let mut ev = Evaluator::new(None);
        let obj = ev.make_user_object();
        obj.declare_field(ev.heap_mut(), "me", obj.clone(), true).unwrap();

        let snap = GraceObject::snapshot(&obj, ev.heap());
        match snap {
            GraceObject::UserObject { fields } => {
                assert_eq!(fields.get("me"), Some(&GraceObject::Cycle));
            }
            other => panic!("expected UserObject, got {other:?}"),
        }
    }
}
