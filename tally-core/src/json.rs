//! JSON path resolver
//!
//! Remote APIs bury the one number we care about somewhere inside a
//! nested document. A panel declares the path to it as a literal list
//! of keys and indices; `resolve` walks that path and hands back the
//! leaf value, or a typed error when the response shape has drifted
//! from what the panel expects.

pub use serde_json::Value;

/// One step into a JSON document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep<'a> {
    /// Index into an object by key
    Key(&'a str),
    /// Index into an array
    Index(usize),
}

/// Path resolution failures
///
/// Any of these means the remote API's response shape did not match
/// the schema the panel was written against. There is no retry; the
/// caller decides whether to skip the cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PathError {
    /// Object present but the key is absent
    MissingKey,
    /// Array present but the index is out of range
    IndexOutOfRange,
    /// Tried to index into a scalar (or keyed into an array / indexed
    /// into an object)
    NotIndexable,
}

/// Walk `path` into `doc`, returning the leaf value it reaches.
pub fn resolve<'v>(doc: &'v Value, path: &[PathStep<'_>]) -> Result<&'v Value, PathError> {
    let mut value = doc;
    for step in path {
        value = match (step, value) {
            (PathStep::Key(key), Value::Object(map)) => {
                map.get(*key).ok_or(PathError::MissingKey)?
            }
            (PathStep::Index(i), Value::Array(items)) => {
                items.get(*i).ok_or(PathError::IndexOutOfRange)?
            }
            _ => return Err(PathError::NotIndexable),
        };
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use PathStep::{Index, Key};

    #[test]
    fn test_nested_object_and_array() {
        // {"a": {"b": [10, 20]}} at ["a", "b", 1] -> 20
        let doc = json!({"a": {"b": [10, 20]}});
        let leaf = resolve(&doc, &[Key("a"), Key("b"), Index(1)]).unwrap();
        assert_eq!(leaf, &json!(20));
    }

    #[test]
    fn test_string_leaf() {
        let doc = json!({"items": [{"statistics": {"viewCount": "500"}}]});
        let path = [Key("items"), Index(0), Key("statistics"), Key("viewCount")];
        let leaf = resolve(&doc, &path).unwrap();
        assert_eq!(leaf, &json!("500"));
    }

    #[test]
    fn test_empty_path_is_identity() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, &[]).unwrap(), &doc);
    }

    #[test]
    fn test_missing_key() {
        let doc = json!({"a": 1});
        assert_eq!(resolve(&doc, &[Key("b")]), Err(PathError::MissingKey));
    }

    #[test]
    fn test_index_out_of_range() {
        let doc = json!([1, 2]);
        assert_eq!(resolve(&doc, &[Index(2)]), Err(PathError::IndexOutOfRange));
    }

    #[test]
    fn test_scalar_is_not_indexable() {
        let doc = json!({"a": 42});
        assert_eq!(
            resolve(&doc, &[Key("a"), Key("b")]),
            Err(PathError::NotIndexable)
        );
        // Keying into an array is a shape mismatch, not a missing key
        let doc = json!([1, 2]);
        assert_eq!(resolve(&doc, &[Key("a")]), Err(PathError::NotIndexable));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn leaf_strategy() -> impl Strategy<Value = Value> {
            prop_oneof![
                any::<i64>().prop_map(|n| json!(n)),
                "[a-z]{0,8}".prop_map(|s| json!(s)),
                any::<bool>().prop_map(|b| json!(b)),
            ]
        }

        proptest! {
            /// Wrapping a leaf under an arbitrary key/index path and
            /// resolving that exact path always returns the leaf.
            #[test]
            fn resolves_exact_leaf(
                leaf in leaf_strategy(),
                steps in proptest::collection::vec(
                    prop_oneof![
                        "[a-z]{1,6}".prop_map(Some),
                        (0usize..4).prop_map(|_| None),
                    ],
                    0..6,
                )
            ) {
                // Build the document outside-in so the path reaches the leaf
                let mut doc = leaf.clone();
                let mut path_owned = alloc::vec::Vec::new();
                for step in steps.iter().rev() {
                    match step {
                        Some(key) => {
                            doc = json!({ key.as_str(): doc });
                            path_owned.push(OwnedStep::Key(key.clone()));
                        }
                        None => {
                            doc = json!([doc]);
                            path_owned.push(OwnedStep::Index(0));
                        }
                    }
                }
                path_owned.reverse();
                let path: alloc::vec::Vec<PathStep<'_>> = path_owned
                    .iter()
                    .map(|s| match s {
                        OwnedStep::Key(k) => PathStep::Key(k.as_str()),
                        OwnedStep::Index(i) => PathStep::Index(*i),
                    })
                    .collect();

                prop_assert_eq!(resolve(&doc, &path).unwrap(), &leaf);
            }
        }

        enum OwnedStep {
            Key(alloc::string::String),
            Index(usize),
        }
    }
}
