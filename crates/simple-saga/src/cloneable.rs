use std::any::Any;

/// Type-erased action result that can be cloned and inspected.
///
/// The ledger keeps one copy of every result for inspection and hands a
/// fresh clone to the compensation during unwind.
pub(crate) trait CloneableAny: Any + Send {
    /// Clone the value into a new boxed trait object.
    fn clone_box(&self) -> Box<dyn CloneableAny>;

    /// Borrow as `Any` for `downcast_ref`.
    fn as_any(&self) -> &dyn Any;

    /// Convert into a boxed `Any` for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any + Send>;
}

impl<T> CloneableAny for T
where
    T: Clone + Send + 'static,
{
    fn clone_box(&self) -> Box<dyn CloneableAny> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send> {
        self
    }
}
