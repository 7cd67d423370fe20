/// Beyond the Shadows: simulation core.
///
/// Tile collision, a shadow grid lit by moving lights, two enemy behaviours
/// and a potion lifecycle, advanced one fixed-order tick at a time by
/// [`sim::step::step`]. Rendering, audio and input capture stay outside;
/// they talk to the core through [`domain::entity::FrameInput`],
/// [`sim::event::GameEvent`] and the read accessors on
/// [`sim::world::WorldState`].

pub mod config;
pub mod domain;
pub mod error;
pub mod sim;
