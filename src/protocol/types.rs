use enum_repr::EnumRepr;

/// Operating mode, property `2 4` on the wire.
///
/// Code 3 ("preset") is not a mode of its own; the device reports it while
/// a preset program is running and the last real mode stays in effect. See
/// [`PurifierState::preset_active`](super::PurifierState).
#[EnumRepr(type = "u8")]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Mode {
    Auto = 0,
    Night = 1,
    Manual = 2,
}

/// Display brightness, property `7 2` on the wire.
///
/// The codes run opposite to intensity: 0 is the brightest setting.
#[EnumRepr(type = "u8")]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Brightness {
    High = 0,
    Low = 1,
    Off = 2,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_round_trips_through_wire_codes() {
        assert_eq!(Mode::Night.repr(), 1);
        assert_eq!(Mode::from_repr(2), Some(Mode::Manual));
        assert_eq!(Mode::from_repr(3), None);
    }

    #[test]
    fn brightness_codes_are_inverted() {
        assert_eq!(Brightness::High.repr(), 0);
        assert_eq!(Brightness::from_repr(2), Some(Brightness::Off));
        assert_eq!(Brightness::from_repr(9), None);
    }
}
