use crate::error::{Error, Result};

use super::Attribute;

/// One tracked attribute: its current value plus the values saved by
/// enclosing scopes.
#[derive(Clone, Debug)]
pub struct AttributeStack<T: Clone> {
    attribute: Attribute,
    current: T,
    saved: Vec<T>,
}

impl<T: Clone> AttributeStack<T> {
    pub fn new(attribute: Attribute, initial: T) -> Self {
        Self {
            attribute,
            current: initial,
            saved: Vec::new(),
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn set(&mut self, value: T) {
        self.current = value;
    }

    pub fn update(&mut self, f: impl FnOnce(&T) -> T) {
        self.current = f(&self.current);
    }

    /// Saves a copy of the current value.
    pub fn push(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// Restores the most recently saved value.
    pub fn pop(&mut self) -> Result<()> {
        let value = self.saved.pop().ok_or(Error::StackUnderflow {
            attribute: self.attribute,
        })?;
        self.current = value;
        Ok(())
    }

    pub fn depth(&self) -> usize {
        self.saved.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pop_restores_pushed_value() {
        let mut stack = AttributeStack::new(Attribute::Color, 1);
        stack.push();
        stack.set(2);
        stack.push();
        stack.update(|v| v * 10);
        assert_eq!(*stack.current(), 20);
        assert_eq!(stack.depth(), 2);
        stack.pop().unwrap();
        assert_eq!(*stack.current(), 2);
        stack.pop().unwrap();
        assert_eq!(*stack.current(), 1);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn empty_pop_is_an_underflow_and_keeps_value() {
        let mut stack = AttributeStack::new(Attribute::Material, "current");
        assert_eq!(
            stack.pop(),
            Err(Error::StackUnderflow {
                attribute: Attribute::Material
            })
        );
        assert_eq!(*stack.current(), "current");
    }
}
