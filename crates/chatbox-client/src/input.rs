//! The input control a submission is taken from.

/// Holds the text the user is composing.
///
/// A successful send clears it; a rejected send leaves it untouched so the
/// user can retry.
pub trait InputControl {
    /// Current text, exactly as typed.
    fn text(&self) -> &str;

    /// Empty the control.
    fn clear(&mut self);
}

impl InputControl for String {
    fn text(&self) -> &str {
        self
    }

    fn clear(&mut self) {
        String::clear(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_is_an_input_control() {
        let mut input = String::from("  hello ");
        assert_eq!(InputControl::text(&input), "  hello ");
        InputControl::clear(&mut input);
        assert!(input.is_empty());
    }
}
