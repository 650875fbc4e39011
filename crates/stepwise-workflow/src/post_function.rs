//! Ordered post-function lists of a transition result.

use stepwise_core::InsertPosition;

use crate::descriptor::Descriptor;
use crate::error::EditError;

/// Looks up the declared weight of a function implementation class.
pub trait WeightResolver {
    fn weight_of(&self, class_name: &str) -> Option<i32>;
}

impl<F> WeightResolver for F
where
    F: Fn(&str) -> Option<i32>,
{
    fn weight_of(&self, class_name: &str) -> Option<i32> {
        self(class_name)
    }
}

/// Insert `function` into `list` and return its 1-based position.
///
/// Unweighted functions go to the head of the list (or the tail when
/// `unweighted` says so). A weighted function lands before the first class
/// function whose own weight is strictly greater, or at the end.
pub fn insert<R>(
    list: &mut Vec<Descriptor>,
    function: Descriptor,
    declared_weight: Option<i32>,
    resolver: &R,
    unweighted: InsertPosition,
) -> usize
where
    R: WeightResolver + ?Sized,
{
    let index = match declared_weight {
        None => match unweighted {
            InsertPosition::Head => 0,
            InsertPosition::Tail => list.len(),
        },
        Some(weight) => list
            .iter()
            .position(|existing| {
                existing.is_class()
                    && existing
                        .class_name()
                        .and_then(|name| resolver.weight_of(name))
                        .is_some_and(|w| w > weight)
            })
            .unwrap_or(list.len()),
    };
    list.insert(index, function);
    index + 1
}

/// Swap the function at 0-based `index` with the one before it.
pub fn move_up(list: &mut [Descriptor], index: usize) -> Result<(), EditError> {
    if index == 0 || index >= list.len() {
        return Err(EditError::InvalidIndex { index, len: list.len() });
    }
    list.swap(index - 1, index);
    Ok(())
}

/// Swap the function at 0-based `index` with the one after it.
pub fn move_down(list: &mut [Descriptor], index: usize) -> Result<(), EditError> {
    if index + 1 >= list.len() {
        return Err(EditError::InvalidIndex { index, len: list.len() });
    }
    list.swap(index, index + 1);
    Ok(())
}

/// Remove the entry at 1-based `position`, as shown to the user.
pub fn remove_at(list: &mut Vec<Descriptor>, position: usize) -> Result<Descriptor, EditError> {
    if position == 0 || position > list.len() {
        return Err(EditError::InvalidIndex { index: position, len: list.len() });
    }
    Ok(list.remove(position - 1))
}
