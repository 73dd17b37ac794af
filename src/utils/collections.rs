//! Ordered-set helpers for the id lists stored on documents

/// Append `item` unless it is already present. Returns whether it was added.
pub fn insert_unique<T: PartialEq>(items: &mut Vec<T>, item: T) -> bool {
    if items.contains(&item) {
        false
    } else {
        items.push(item);
        true
    }
}

/// Remove `item`, keeping the order of the rest. Returns whether it was present.
pub fn remove_item<T: PartialEq>(items: &mut Vec<T>, item: &T) -> bool {
    let before = items.len();
    items.retain(|existing| existing != item);
    items.len() != before
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_unique() {
        let mut items = vec![1, 2];
        assert!(insert_unique(&mut items, 3));
        assert!(!insert_unique(&mut items, 2));
        assert_eq!(items, vec![1, 2, 3]);
    }

    #[test]
    fn test_remove_item_keeps_order() {
        let mut items = vec![1, 2, 3, 4];
        assert!(remove_item(&mut items, &2));
        assert!(!remove_item(&mut items, &9));
        assert_eq!(items, vec![1, 3, 4]);
    }
}
