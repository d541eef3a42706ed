//! Independent copies of propagated state
//!
//! The walker hands each child of a node its own state value. `Fork` produces
//! the copy given to the excluded child; the original moves into the included
//! child. Implementations must not share mutable structure between the copy and
//! the original, so that work inside one subtree is never observed by its sibling.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::hash::Hash;

/// State that can be split into an independent copy for a sibling subtree
pub trait Fork {
    fn fork(&self) -> Self;
}

macro_rules! fork_by_clone {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Fork for $ty {
                fn fork(&self) -> Self {
                    self.clone()
                }
            }
        )*
    };
}

fork_by_clone!(
    (), bool, char, u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64,
    String,
);

impl<T: Fork> Fork for Vec<T> {
    fn fork(&self) -> Self {
        self.iter().map(Fork::fork).collect()
    }
}

impl<T: Fork> Fork for Option<T> {
    fn fork(&self) -> Self {
        self.as_ref().map(Fork::fork)
    }
}

impl<T: Fork> Fork for Box<T> {
    fn fork(&self) -> Self {
        Box::new((**self).fork())
    }
}

impl<K: Clone + Eq + Hash, V: Fork> Fork for HashMap<K, V> {
    fn fork(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.fork())).collect()
    }
}

impl<T: Clone + Eq + Hash> Fork for HashSet<T> {
    fn fork(&self) -> Self {
        self.clone()
    }
}

impl<K: Clone + Ord, V: Fork> Fork for BTreeMap<K, V> {
    fn fork(&self) -> Self {
        self.iter().map(|(k, v)| (k.clone(), v.fork())).collect()
    }
}

impl<T: Clone + Ord> Fork for BTreeSet<T> {
    fn fork(&self) -> Self {
        self.clone()
    }
}

macro_rules! fork_tuple {
    ($($name:ident),+) => {
        impl<$($name: Fork),+> Fork for ($($name,)+) {
            #[allow(non_snake_case)]
            fn fork(&self) -> Self {
                let ($($name,)+) = self;
                ($($name.fork(),)+)
            }
        }
    };
}

fork_tuple!(A);
fork_tuple!(A, B);
fork_tuple!(A, B, C);
fork_tuple!(A, B, C, D);
