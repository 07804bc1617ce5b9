//! Client controller for a backend-driven dinosaur-runner game.
//!
//! The backend owns the simulation (physics, collision, scoring); this crate
//! turns user input into HTTP JSON requests against it and reflects the
//! returned state into a [`view::GameView`]. While a session is active the
//! controller polls the backend's update endpoint on a fixed cadence and
//! stops on game-over or failure.

pub mod api;
pub mod controller;
pub mod error;
pub mod protocol;
pub mod view;

pub use api::{GameApi, HttpApi};
pub use controller::{GameController, InputEvent, Session};
pub use error::ApiError;
pub use view::{GameView, NullView};
