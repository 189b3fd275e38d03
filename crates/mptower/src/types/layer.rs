/// One level of the numeric tower.
///
/// The derived ordering is the tower order: every value of a lower layer
/// embeds into each higher one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Layer {
    Integer,
    Rational,
    Real,
    Complex,
}

impl Layer {
    /// All layers in dispatch order.
    pub const ALL: [Self; 4] = [Self::Integer, Self::Rational, Self::Real, Self::Complex];

    /// True if a value whose own layer is `value_layer` embeds into `self`.
    #[must_use]
    pub fn admits(self, value_layer: Self) -> bool {
        value_layer <= self
    }

    /// Layers from `self` upwards, in dispatch order.
    pub fn and_above(self) -> impl Iterator<Item = Self> {
        Self::ALL.into_iter().filter(move |layer| *layer >= self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn and_above_keeps_tower_order() {
        let layers: Vec<_> = Layer::Rational.and_above().collect();
        assert_eq!(layers, vec![Layer::Rational, Layer::Real, Layer::Complex]);
    }

    #[test]
    fn admits_lower_layers_only() {
        assert!(Layer::Real.admits(Layer::Integer));
        assert!(Layer::Real.admits(Layer::Real));
        assert!(!Layer::Rational.admits(Layer::Real));
    }
}
