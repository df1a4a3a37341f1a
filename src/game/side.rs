#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    North,
    South,
}

impl Side {
    /// Get the opposing side
    pub fn opponent(self) -> Side {
        match self {
            Side::North => Side::South,
            Side::South => Side::North,
        }
    }

    /// Get side name for display and logs
    pub fn name(self) -> &'static str {
        match self {
            Side::North => "north",
            Side::South => "south",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opponent_side() {
        assert_eq!(Side::North.opponent(), Side::South);
        assert_eq!(Side::South.opponent(), Side::North);
    }

    #[test]
    fn test_side_name() {
        assert_eq!(Side::North.name(), "north");
        assert_eq!(Side::South.name(), "south");
    }
}
