//! List partitioning used by the batch reconciler.

/// Split `items` into `(matching, rest)` by `predicate`, preserving the
/// relative order of items within each side.
///
/// Every item lands in exactly one of the two halves; the halves' lengths
/// always sum to the input length.
pub fn partition<T, F>(items: Vec<T>, predicate: F) -> (Vec<T>, Vec<T>)
where
    F: FnMut(&T) -> bool,
{
    items.into_iter().partition(predicate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partition_with_empty_list() {
        let (yes, no) = partition(Vec::<i32>::new(), |_| true);
        assert!(yes.is_empty());
        assert!(no.is_empty());
    }

    #[test]
    fn test_partition_with_always_true_predicate() {
        let (yes, no) = partition(vec![1, 2, 3], |_| true);
        assert_eq!(yes, vec![1, 2, 3]);
        assert!(no.is_empty());
    }

    #[test]
    fn test_partition_with_always_false_predicate() {
        let (yes, no) = partition(vec![1, 2, 3], |_| false);
        assert!(yes.is_empty());
        assert_eq!(no, vec![1, 2, 3]);
    }

    #[test]
    fn test_partition_with_predicate_filtering() {
        let (yes, no) = partition(vec![1, 2, 3, 4], |x| x % 2 == 0);
        assert_eq!(yes, vec![2, 4]);
        assert_eq!(no, vec![1, 3]);
    }

    #[test]
    fn test_partition_is_total() {
        let input: Vec<i32> = (0..100).collect();
        let len = input.len();
        let (yes, no) = partition(input, |x| x % 7 == 0);
        assert_eq!(yes.len() + no.len(), len);
    }
}
