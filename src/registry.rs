//! Process-wide cache of published type metadata
//!
//! Metadata is built off to the side with no lock held, then installed with
//! insert-if-absent. When two threads race on the same type both builds
//! complete, but only the first one installed is ever handed out, so every
//! caller observes the same fully built [`TypeMetadata`]. Nested types built
//! along the way are installed together with the outer type, and only when
//! the whole build succeeded.

use std::any::{type_name, TypeId};
use std::collections::hash_map::Entry;
use std::sync::{Arc, OnceLock, PoisonError, RwLock};
use std::vec::Vec;

use rustc_hash::FxHashMap;

use crate::error::Result;
use crate::schema::{BuildContext, Erased, Record, TypeMetadata};

fn entries() -> &'static RwLock<FxHashMap<TypeId, Erased>> {
    static ENTRIES: OnceLock<RwLock<FxHashMap<TypeId, Erased>>> = OnceLock::new();
    ENTRIES.get_or_init(Default::default)
}

/// Shared metadata for `T`, building and publishing it on first use
pub fn metadata<T: Record>() -> Result<Arc<TypeMetadata<T>>> {
    if let Some(found) = lookup::<T>() {
        return Ok(found);
    }
    let mut cx = BuildContext::new();
    let built = Arc::new(TypeMetadata::<T>::build_in(&mut cx)?);
    Ok(install(built, cx.into_built()))
}

/// Whether metadata for `T` has been published
pub fn contains<T: Record>() -> bool {
    lookup::<T>().is_some()
}

/// Number of published types
pub fn len() -> usize {
    entries()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .len()
}

pub(crate) fn lookup<T: Record>() -> Option<Arc<TypeMetadata<T>>> {
    // The map only ever holds fully built entries, so a poisoned lock is
    // still consistent.
    let map = entries().read().unwrap_or_else(PoisonError::into_inner);
    let entry = map.get(&TypeId::of::<T>())?.clone();
    entry.downcast::<TypeMetadata<T>>().ok()
}

fn install<T: Record>(
    built: Arc<TypeMetadata<T>>,
    nested: Vec<(TypeId, Erased)>,
) -> Arc<TypeMetadata<T>> {
    let mut map = entries().write().unwrap_or_else(PoisonError::into_inner);
    for (id, entry) in nested {
        if let Entry::Vacant(slot) = map.entry(id) {
            slot.insert(entry);
        }
    }
    let published = match map.entry(TypeId::of::<T>()) {
        Entry::Occupied(existing) => {
            tracing::trace!(
                type_name = type_name::<T>(),
                "type metadata already published, discarding local build"
            );
            existing.get().clone()
        }
        Entry::Vacant(slot) => {
            tracing::debug!(type_name = type_name::<T>(), "published type metadata");
            slot.insert(built.clone()).clone()
        }
    };
    drop(map);

    published.downcast::<TypeMetadata<T>>().unwrap_or(built)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::schema::Schema;
    use std::sync::Barrier;
    use std::thread;

    struct Point {
        x: i64,
        y: i64,
    }

    impl Record for Point {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema.field("x", |p| &p.x).field("y", |p| &p.y);
        }
    }

    struct Line {
        from: Point,
        to: Point,
    }

    impl Record for Line {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema.object("from", |l| &l.from).object("to", |l| &l.to);
        }
    }

    struct Raced {
        value: f64,
    }

    impl Record for Raced {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema.field("value", |r| &r.value);
        }
    }

    struct Broken {
        raw: Vec<u8>,
    }

    impl Record for Broken {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema.field("raw", |b| &b.raw);
        }
    }

    struct Leaf {
        weight: u8,
    }

    impl Record for Leaf {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema.field("weight", |l| &l.weight);
        }
    }

    struct Branch {
        leaf: Leaf,
        size: u64,
    }

    impl Record for Branch {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema
                .object("leaf", |b| &b.leaf)
                .field("size", |b| &b.size);
        }
    }

    struct Pair {
        left: Leaf,
        right: Leaf,
    }

    impl Record for Pair {
        fn describe(schema: &mut Schema<'_, Self>) {
            schema
                .object("left", |p| &p.left)
                .object("right", |p| &p.right);
        }
    }

    #[test]
    fn test_metadata_is_published_once() {
        let first = metadata::<Point>().unwrap();
        let second = metadata::<Point>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(contains::<Point>());
        assert!(len() >= 1);
    }

    #[test]
    fn test_nested_metadata_is_shared() {
        let line = metadata::<Line>().unwrap();
        assert!(contains::<Point>());
        assert_eq!(line.fields().len(), 2);
    }

    #[test]
    fn test_concurrent_build_publishes_single_instance() {
        const THREADS: usize = 8;
        let barrier = Arc::new(Barrier::new(THREADS));

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    metadata::<Raced>().unwrap()
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        for result in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], result));
        }
        assert!(Arc::ptr_eq(&results[0], &metadata::<Raced>().unwrap()));
    }

    #[test]
    fn test_failed_outer_build_publishes_nothing_nested() {
        assert_eq!(
            metadata::<Branch>().unwrap_err(),
            Error::UnsupportedFieldType {
                field: "size",
                type_name: "u64"
            }
        );
        assert!(!contains::<Branch>());
        assert!(!contains::<Leaf>());

        // A later successful build publishes the nested type once
        let pair = metadata::<Pair>().unwrap();
        let leaf = metadata::<Leaf>().unwrap();
        assert!(contains::<Leaf>());
        assert_eq!(pair.type_id(), TypeId::of::<Pair>());
        assert_eq!(leaf.type_id(), TypeId::of::<Leaf>());
    }

    #[test]
    fn test_failed_build_is_not_published() {
        assert_eq!(
            metadata::<Broken>().unwrap_err(),
            Error::UnsupportedFieldType {
                field: "raw",
                type_name: "alloc::vec::Vec<u8>"
            }
        );
        assert!(!contains::<Broken>());
    }
}
