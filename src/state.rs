use crate::city::{City, CITIES};

/// User-controlled widget state. Only the input loop writes this; everything
/// else reads it once per tick.
#[derive(Copy, Clone, Debug)]
pub struct UserState {
    pub city: &'static City,
}

impl UserState {
    /// Move the city selector forward, wrapping at the end of the table
    pub fn select_next(&mut self) {
        self.city = self.city.next();
    }

    /// Move the city selector backward, wrapping at the start of the table
    pub fn select_prev(&mut self) {
        self.city = self.city.prev();
    }
}

impl Default for UserState {
    fn default() -> Self {
        // Cairo leads the table
        Self { city: &CITIES[0] }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_city() {
        assert_eq!(UserState::default().city.id, "Cairo");
    }

    #[test]
    fn test_selection_wraps() {
        let mut state = UserState::default();
        state.select_prev();
        assert_eq!(state.city.id, "Sohag");
        state.select_next();
        assert_eq!(state.city.id, "Cairo");

        for _ in 0..CITIES.len() {
            state.select_next();
        }
        assert_eq!(state.city.id, "Cairo");
    }
}
