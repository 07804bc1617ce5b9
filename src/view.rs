//! UI seam between the controller and a concrete frontend.

/// Every UI mutation the controller performs, and nothing else.
///
/// Implementations should be cheap and non-blocking; the controller calls
/// these from its event loop between backend round trips.
pub trait GameView {
    /// Update the score readout.
    fn set_score(&mut self, score: u64);
    /// Replace the status line.
    fn set_status(&mut self, text: &str);
    /// Apply or clear the duck posture visual.
    fn set_ducking(&mut self, ducking: bool);
    /// Apply or clear the jump lift visual.
    fn set_jumping(&mut self, lifted: bool);
    /// Show or hide the obstacle.
    fn set_obstacle_visible(&mut self, visible: bool);
    /// Swap the start control for the restart control after the first start.
    fn show_restart_control(&mut self);
    /// Surface an error to the player.
    fn alert(&mut self, message: &str);
}

/// View that drops everything, for headless use (`dinorun-cli`).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullView;

impl GameView for NullView {
    fn set_score(&mut self, _score: u64) {}
    fn set_status(&mut self, _text: &str) {}
    fn set_ducking(&mut self, _ducking: bool) {}
    fn set_jumping(&mut self, _lifted: bool) {}
    fn set_obstacle_visible(&mut self, _visible: bool) {}
    fn show_restart_control(&mut self) {}
    fn alert(&mut self, _message: &str) {}
}
