//! The predicate type and its logical combinators.
//!
//! A [`Predicate<T>`] is a shareable, side-effect free test over a borrowed
//! `T`. String tests are `Predicate<str>`, request tests are
//! `Predicate<MockRequest>`; the two only meet through
//! [`extracted_value_accepted`](super::extracted_value_accepted).

use std::fmt;
use std::sync::Arc;

/// Boolean test over a borrowed value.
pub struct Predicate<T: ?Sized> {
    test: Arc<dyn Fn(&T) -> bool + Send + Sync>,
}

impl<T: ?Sized + 'static> Predicate<T> {
    pub fn new<F>(test: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }

    #[inline]
    pub fn accept(&self, value: &T) -> bool {
        (self.test)(value)
    }
}

impl<T: ?Sized> Clone for Predicate<T> {
    fn clone(&self) -> Self {
        Self {
            test: Arc::clone(&self.test),
        }
    }
}

impl<T: ?Sized> fmt::Debug for Predicate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate")
    }
}

impl<T: ?Sized + 'static> std::ops::Not for Predicate<T> {
    type Output = Predicate<T>;

    fn not(self) -> Self::Output {
        not(self)
    }
}

/// Matches if ALL of the predicates match. Stops at the first rejection;
/// an empty list accepts everything.
pub fn and<T, I>(predicates: I) -> Predicate<T>
where
    T: ?Sized + 'static,
    I: IntoIterator<Item = Predicate<T>>,
{
    let predicates: Vec<_> = predicates.into_iter().collect();
    Predicate::new(move |v: &T| predicates.iter().all(|p| p.accept(v)))
}

/// Matches if ANY of the predicates match. Stops at the first acceptance;
/// an empty list rejects everything.
pub fn or<T, I>(predicates: I) -> Predicate<T>
where
    T: ?Sized + 'static,
    I: IntoIterator<Item = Predicate<T>>,
{
    let predicates: Vec<_> = predicates.into_iter().collect();
    Predicate::new(move |v: &T| predicates.iter().any(|p| p.accept(v)))
}

/// Negates the inner predicate.
pub fn not<T: ?Sized + 'static>(predicate: Predicate<T>) -> Predicate<T> {
    Predicate::new(move |v: &T| !predicate.accept(v))
}

pub fn always<T: ?Sized + 'static>() -> Predicate<T> {
    Predicate::new(|_: &T| true)
}

pub fn never<T: ?Sized + 'static>() -> Predicate<T> {
    Predicate::new(|_: &T| false)
}
