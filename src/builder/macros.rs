//! Macros for ergonomic state and event declarations.

/// Declare a unit-variant enum implementing [`State`](crate::core::State).
///
/// The enum derives `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Debug` and
/// serde's traits, and gains an `ALL` constant listing every variant.
///
/// # Example
///
/// ```
/// use statemaps::state_enum;
/// use statemaps::core::State;
///
/// state_enum! {
///     pub enum TurnstileState {
///         Locked,
///         Unlocked,
///         Broken,
///     }
///     final: [Broken]
/// }
///
/// assert_eq!(TurnstileState::ALL.len(), 3);
/// assert_eq!(TurnstileState::Locked.name(), "Locked");
/// assert!(TurnstileState::Broken.is_final());
/// ```
#[macro_export]
macro_rules! state_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }

        $(final: [$($final:ident),* $(,)?])?
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, serde::Serialize, serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $name {
            #[allow(dead_code)]
            pub const ALL: &'static [$name] = &[$($name::$variant),*];
        }

        impl $crate::core::State for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }

            fn is_final(&self) -> bool {
                match self {
                    $($(Self::$final => true,)*)?
                    #[allow(unreachable_patterns)]
                    _ => false,
                }
            }
        }
    };
}

/// Declare a unit-variant enum implementing [`Event`](crate::core::Event).
///
/// ```
/// use statemaps::event_enum;
/// use statemaps::core::Event;
///
/// event_enum! {
///     pub enum TurnstileEvent {
///         Coin,
///         Pass,
///     }
/// }
///
/// assert_eq!(TurnstileEvent::Pass.name(), "Pass");
/// ```
#[macro_export]
macro_rules! event_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
        $vis enum $name {
            $(
                $(#[$variant_meta])*
                $variant
            ),*
        }

        impl $crate::core::Event for $name {
            fn name(&self) -> &str {
                match self {
                    $(Self::$variant => stringify!($variant)),*
                }
            }
        }
    };
}
