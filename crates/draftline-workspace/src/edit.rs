//! Path-addressed mutation of a section tree.
//!
//! Missing map entries along a path are created as the container the next
//! segment needs (a map for a key, a list for an index). A list index may
//! address an existing element or the position just past the end, which
//! appends. Anything else (indexing into a scalar, a key on a list, an
//! index on a map, an index beyond the end) is a [`PathResolutionError`].

use draftline_types::{FieldPath, FieldValue, PathSegment, SectionTree};

use crate::error::{EditResult, PathErrorReason, PathResolutionError};

fn container_for(next: &PathSegment) -> FieldValue {
    match next {
        PathSegment::Key(_) => FieldValue::empty_map(),
        PathSegment::Index(_) => FieldValue::empty_list(),
    }
}

fn shape(value: &FieldValue) -> &'static str {
    match value {
        FieldValue::Scalar(_) => "scalar",
        FieldValue::List(_) => "list",
        FieldValue::Map(_) => "map",
    }
}

fn expected_for(segment: &PathSegment) -> &'static str {
    match segment {
        PathSegment::Key(_) => "map",
        PathSegment::Index(_) => "list",
    }
}

fn split_section(path: &FieldPath) -> EditResult<(&str, &[PathSegment])> {
    let (first, rest) = path
        .segments()
        .split_first()
        .ok_or_else(|| PathResolutionError::new(path, 0, PathErrorReason::EmptyPath))?;
    match first {
        PathSegment::Key(section) => Ok((section.as_str(), rest)),
        PathSegment::Index(_) => Err(PathResolutionError::new(
            path,
            0,
            PathErrorReason::SectionKeyRequired,
        )),
    }
}

/// Step from `node` into `segment`, creating a container for `next` when
/// the step lands on a missing entry.
fn descend<'a>(
    node: &'a mut FieldValue,
    segment: &PathSegment,
    next: &PathSegment,
    path: &FieldPath,
    position: usize,
) -> EditResult<&'a mut FieldValue> {
    match (node, segment) {
        (FieldValue::Map(map), PathSegment::Key(key)) => {
            Ok(map.entry(key.clone()).or_insert_with(|| container_for(next)))
        }
        (FieldValue::List(items), PathSegment::Index(index)) => {
            let len = items.len();
            if *index == len {
                items.push(container_for(next));
            } else if *index > len {
                return Err(PathResolutionError::new(
                    path,
                    position,
                    PathErrorReason::IndexOutOfRange { index: *index, len },
                ));
            }
            Ok(&mut items[*index])
        }
        (other, segment) => Err(PathResolutionError::new(
            path,
            position,
            PathErrorReason::Mismatch {
                expected: expected_for(segment),
                found: shape(other),
            },
        )),
    }
}

/// Set the value at `path`, creating intermediate nesting as needed.
///
/// Returns the value previously stored at that location, if any. On error,
/// containers created for a missing prefix may remain in `tree`; edit a
/// copy when the original must stay untouched.
pub fn set_value(
    tree: &mut SectionTree,
    path: &FieldPath,
    value: FieldValue,
) -> EditResult<Option<FieldValue>> {
    let (section, rest) = split_section(path)?;
    let Some((last, inner)) = rest.split_last() else {
        return Ok(tree.insert_section(section, value));
    };

    let mut node = tree
        .as_map_mut()
        .entry(section.to_string())
        .or_insert_with(|| container_for(inner.first().unwrap_or(last)));

    for (i, segment) in inner.iter().enumerate() {
        let next = inner.get(i + 1).unwrap_or(last);
        node = descend(node, segment, next, path, i + 1)?;
    }

    let position = path.len() - 1;
    match (node, last) {
        (FieldValue::Map(map), PathSegment::Key(key)) => Ok(map.insert(key.clone(), value)),
        (FieldValue::List(items), PathSegment::Index(index)) => {
            let len = items.len();
            if *index < len {
                Ok(Some(std::mem::replace(&mut items[*index], value)))
            } else if *index == len {
                items.push(value);
                Ok(None)
            } else {
                Err(PathResolutionError::new(
                    path,
                    position,
                    PathErrorReason::IndexOutOfRange { index: *index, len },
                ))
            }
        }
        (other, segment) => Err(PathResolutionError::new(
            path,
            position,
            PathErrorReason::Mismatch {
                expected: expected_for(segment),
                found: shape(other),
            },
        )),
    }
}

/// Remove and return the value at `path`.
///
/// Map entries are removed by key; list elements are removed and later
/// elements shift down. Nothing is created along the way.
pub fn remove_value(tree: &mut SectionTree, path: &FieldPath) -> EditResult<FieldValue> {
    let (section, rest) = split_section(path)?;
    let not_found = |position| PathResolutionError::new(path, position, PathErrorReason::NotFound);

    let Some((last, inner)) = rest.split_last() else {
        return tree
            .as_map_mut()
            .remove(section)
            .ok_or_else(|| not_found(0));
    };

    let mut node = tree.as_map_mut().get_mut(section).ok_or_else(|| not_found(0))?;
    for (i, segment) in inner.iter().enumerate() {
        let position = i + 1;
        node = match (node, segment) {
            (FieldValue::Map(map), PathSegment::Key(key)) => {
                map.get_mut(key).ok_or_else(|| not_found(position))?
            }
            (FieldValue::List(items), PathSegment::Index(index)) => {
                items.get_mut(*index).ok_or_else(|| not_found(position))?
            }
            (other, segment) => {
                return Err(PathResolutionError::new(
                    path,
                    position,
                    PathErrorReason::Mismatch {
                        expected: expected_for(segment),
                        found: shape(other),
                    },
                ))
            }
        };
    }

    let position = path.len() - 1;
    match (node, last) {
        (FieldValue::Map(map), PathSegment::Key(key)) => {
            map.remove(key).ok_or_else(|| not_found(position))
        }
        (FieldValue::List(items), PathSegment::Index(index)) if *index < items.len() => {
            Ok(items.remove(*index))
        }
        (FieldValue::List(_), PathSegment::Index(_)) => Err(not_found(position)),
        (other, segment) => Err(PathResolutionError::new(
            path,
            position,
            PathErrorReason::Mismatch {
                expected: expected_for(segment),
                found: shape(other),
            },
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn tree(v: Value) -> SectionTree {
        SectionTree::from_json(v).unwrap()
    }

    fn path(s: &str) -> FieldPath {
        FieldPath::parse(s).unwrap()
    }

    #[test]
    fn set_existing_scalar_returns_previous() {
        let mut t = tree(json!({"budget": {"personnel": 100}}));
        let previous = set_value(&mut t, &path("budget.personnel"), 150.into()).unwrap();
        assert_eq!(previous, Some(100.into()));
        assert_eq!(t, tree(json!({"budget": {"personnel": 150}})));
    }

    #[test]
    fn set_creates_intermediate_maps() {
        let mut t = SectionTree::new();
        set_value(&mut t, &path("budget.capital.vehicles"), 3.into()).unwrap();
        assert_eq!(t, tree(json!({"budget": {"capital": {"vehicles": 3}}})));
    }

    #[test]
    fn set_creates_intermediate_lists_by_appending() {
        let mut t = SectionTree::new();
        set_value(&mut t, &path("goals.items[0].title"), "Cleaner air".into()).unwrap();
        assert_eq!(t, tree(json!({"goals": {"items": [{"title": "Cleaner air"}]}})));
    }

    #[test]
    fn set_whole_section() {
        let mut t = tree(json!({"a": 1}));
        set_value(&mut t, &path("b"), json!({"x": true}).into()).unwrap();
        assert_eq!(t, tree(json!({"a": 1, "b": {"x": true}})));
    }

    #[test]
    fn set_appends_at_list_end() {
        let mut t = tree(json!({"s": {"items": ["a"]}}));
        assert_eq!(set_value(&mut t, &path("s.items[1]"), "b".into()).unwrap(), None);
        assert_eq!(t, tree(json!({"s": {"items": ["a", "b"]}})));
    }

    #[test]
    fn set_beyond_list_end_fails() {
        let mut t = tree(json!({"s": {"items": ["a"]}}));
        let err = set_value(&mut t, &path("s.items[3]"), "b".into()).unwrap_err();
        assert_eq!(err.reason, PathErrorReason::IndexOutOfRange { index: 3, len: 1 });
        assert_eq!(err.position, 2);
    }

    #[test]
    fn set_into_scalar_fails() {
        let mut t = tree(json!({"budget": {"personnel": 100}}));
        let before = t.clone();
        let err = set_value(&mut t, &path("budget.personnel.salaries"), 1.into()).unwrap_err();
        assert_eq!(
            err.reason,
            PathErrorReason::Mismatch {
                expected: "map",
                found: "scalar"
            }
        );
        assert_eq!(err.position, 2);
        assert_eq!(t, before);
    }

    #[test]
    fn set_index_on_map_fails() {
        let mut t = tree(json!({"budget": {"personnel": 100}}));
        let err = set_value(&mut t, &path("budget[0]"), 1.into()).unwrap_err();
        assert!(matches!(err.reason, PathErrorReason::Mismatch { expected: "list", found: "map" }));
    }

    #[test]
    fn set_requires_section_key() {
        let mut t = SectionTree::new();
        let err = set_value(&mut t, &FieldPath::root().index(0), 1.into()).unwrap_err();
        assert_eq!(err.reason, PathErrorReason::SectionKeyRequired);
        let err = set_value(&mut t, &FieldPath::root(), 1.into()).unwrap_err();
        assert_eq!(err.reason, PathErrorReason::EmptyPath);
    }

    #[test]
    fn remove_map_entry_and_list_element() {
        let mut t = tree(json!({"s": {"a": 1, "items": ["x", "y", "z"]}}));
        assert_eq!(remove_value(&mut t, &path("s.a")).unwrap(), 1.into());
        assert_eq!(remove_value(&mut t, &path("s.items[0]")).unwrap(), "x".into());
        assert_eq!(t, tree(json!({"s": {"items": ["y", "z"]}})));
    }

    #[test]
    fn remove_whole_section() {
        let mut t = tree(json!({"s": {"a": 1}, "k": 2}));
        remove_value(&mut t, &path("s")).unwrap();
        assert_eq!(t, tree(json!({"k": 2})));
    }

    #[test]
    fn remove_missing_fails_without_creating() {
        let mut t = tree(json!({"s": {"a": 1}}));
        let before = t.clone();
        let err = remove_value(&mut t, &path("s.b.c")).unwrap_err();
        assert_eq!(err.reason, PathErrorReason::NotFound);
        assert_eq!(err.position, 1);
        assert_eq!(t, before);

        let err = remove_value(&mut t, &path("nope")).unwrap_err();
        assert_eq!(err.reason, PathErrorReason::NotFound);
    }
}
