//! Composable predicates.
//!
//! Any `Fn(T) -> bool` is a [`Predicate`], and predicates combine with
//! [`and`](Predicate::and), [`or`](Predicate::or),
//! [`negate`](Predicate::negate) and [`and_if`](Predicate::and_if). The
//! combinators are plain structs, so a composed predicate is still a
//! concrete type and costs nothing to build.

/// A boolean test over `T`.
pub trait Predicate<T> {
    fn test(&self, value: T) -> bool;

    fn and<P: Predicate<T>>(self, other: P) -> And<Self, P>
    where
        Self: Sized,
    {
        And(self, other)
    }

    fn or<P: Predicate<T>>(self, other: P) -> Or<Self, P>
    where
        Self: Sized,
    {
        Or(self, other)
    }

    fn negate(self) -> Not<Self>
    where
        Self: Sized,
    {
        Not(self)
    }

    /// Adds `other` as a conjunct only when `condition` holds.
    fn and_if<P: Predicate<T>>(self, condition: bool, other: P) -> AndIf<Self, P>
    where
        Self: Sized,
    {
        AndIf(self, condition, other)
    }

    fn boxed<'a>(self) -> BoxPredicate<'a, T>
    where
        Self: Sized + 'a,
    {
        BoxPredicate(Box::new(self))
    }
}

impl<T, F: Fn(T) -> bool> Predicate<T> for F {
    fn test(&self, value: T) -> bool {
        self(value)
    }
}

/// A type-erased predicate, for holding predicates of different shapes in
/// one list.
pub struct BoxPredicate<'a, T>(Box<dyn Predicate<T> + 'a>);

impl<T> Predicate<T> for BoxPredicate<'_, T> {
    fn test(&self, value: T) -> bool {
        self.0.test(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct And<A, B>(A, B);

impl<T: Copy, A: Predicate<T>, B: Predicate<T>> Predicate<T> for And<A, B> {
    fn test(&self, value: T) -> bool {
        self.0.test(value) && self.1.test(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Or<A, B>(A, B);

impl<T: Copy, A: Predicate<T>, B: Predicate<T>> Predicate<T> for Or<A, B> {
    fn test(&self, value: T) -> bool {
        self.0.test(value) || self.1.test(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Not<A>(A);

impl<T, A: Predicate<T>> Predicate<T> for Not<A> {
    fn test(&self, value: T) -> bool {
        !self.0.test(value)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct AndIf<A, B>(A, bool, B);

impl<T: Copy, A: Predicate<T>, B: Predicate<T>> Predicate<T> for AndIf<A, B> {
    fn test(&self, value: T) -> bool {
        self.0.test(value) && (!self.1 || self.2.test(value))
    }
}

/// Always true.
pub fn always<T>(_: T) -> bool {
    true
}
