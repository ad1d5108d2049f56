//! Depth-guarded structural equality.
//!
//! Types are compared by shape, never by identity. The comparison walks
//! nested values and gives up with [`DepthExceeded`] instead of recursing
//! without bound through a runaway structure.

use thiserror::Error;

pub const DEFAULT_DEPTH: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("structural comparison exceeded the maximum depth of {limit}")]
pub struct DepthExceeded {
    pub limit: usize,
}

/// Deep, order-sensitive equality with a recursion budget.
///
/// Implementors that nest other values spend one unit of `depth` per level
/// and fail once the budget is gone. Leaves and sequences compare without
/// spending any.
pub trait DeepEq {
    fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded>;
}

/// Compare with the default depth budget.
pub fn eq<T: DeepEq + ?Sized>(a: &T, b: &T) -> Result<bool, DepthExceeded> {
    a.deep_eq(b, DEFAULT_DEPTH)
}

impl DeepEq for str {
    fn deep_eq(&self, other: &Self, _depth: usize) -> Result<bool, DepthExceeded> {
        Ok(self == other)
    }
}

impl DeepEq for String {
    fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded> {
        self.as_str().deep_eq(other.as_str(), depth)
    }
}

impl DeepEq for bool {
    fn deep_eq(&self, other: &Self, _depth: usize) -> Result<bool, DepthExceeded> {
        Ok(self == other)
    }
}

impl<T: DeepEq> DeepEq for [T] {
    fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded> {
        if self.len() != other.len() {
            return Ok(false);
        }
        for (a, b) in self.iter().zip(other) {
            if !a.deep_eq(b, depth)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl<T: DeepEq> DeepEq for Vec<T> {
    fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded> {
        self.as_slice().deep_eq(other.as_slice(), depth)
    }
}

impl<T: DeepEq> DeepEq for Option<T> {
    fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded> {
        match (self, other) {
            (Some(a), Some(b)) => a.deep_eq(b, depth),
            (None, None) => Ok(true),
            _ => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Node {
        label: String,
        children: Vec<Node>,
    }

    impl DeepEq for Node {
        fn deep_eq(&self, other: &Self, depth: usize) -> Result<bool, DepthExceeded> {
            let depth = depth
                .checked_sub(1)
                .ok_or(DepthExceeded { limit: DEFAULT_DEPTH })?;
            Ok(self.label.deep_eq(&other.label, depth)?
                && self.children.deep_eq(&other.children, depth)?)
        }
    }

    fn chain(levels: usize) -> Node {
        let mut node = Node {
            label: "leaf".to_string(),
            children: Vec::new(),
        };
        for _ in 0..levels {
            node = Node {
                label: "inner".to_string(),
                children: vec![node],
            };
        }
        node
    }

    #[test]
    fn sequences_are_order_sensitive() {
        let a = vec!["x".to_string(), "y".to_string()];
        let b = vec!["y".to_string(), "x".to_string()];
        assert!(eq(&a, &a).unwrap());
        assert!(!eq(&a, &b).unwrap());
    }

    #[test]
    fn length_mismatch_is_unequal() {
        let a = vec![true];
        let b = vec![true, true];
        assert!(!eq(&a, &b).unwrap());
    }

    #[test]
    fn shallow_trees_compare() {
        assert!(eq(&chain(3), &chain(3)).unwrap());
        assert!(!eq(&chain(3), &chain(4)).unwrap());
    }

    #[test]
    fn deep_trees_exceed_budget() {
        let err = eq(&chain(20), &chain(20)).unwrap_err();
        assert_eq!(err, DepthExceeded { limit: DEFAULT_DEPTH });
    }
}
