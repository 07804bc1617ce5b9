//! Session controller: turns user input into backend requests and backend
//! replies into view updates.
//!
//! The controller owns the session flags and both timers (the poll interval
//! and the pending jump revert) and runs everything on a single task, so
//! "at most one poll cadence" and "at most one pending revert" hold by
//! construction: arming a timer replaces, and thereby cancels, the old one.

use std::pin::Pin;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior, Sleep};
use tracing::{debug, warn};

use crate::api::GameApi;
use crate::error::ApiError;
use crate::view::GameView;

/// Name sent when the player leaves the name field blank.
pub const DEFAULT_PLAYER: &str = "anonymous";

/// Cadence of the update poll while a session is active.
pub const POLL_PERIOD: Duration = Duration::from_millis(100);

/// How long the jump lift visual is held before reverting.
pub const JUMP_REVERT_AFTER: Duration = Duration::from_millis(500);

const STATUS_RUNNING: &str = "Game in progress...";

/// User input, normalized across frontends. Keyboard and on-screen controls
/// both reduce to these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    Start { name: String },
    Restart,
    Jump,
    DuckPressed,
    DuckReleased,
    Quit,
}

/// Client-side session flags: one playthrough from start/restart to
/// game-over. Cleared when a poll reports the game over or fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct Session {
    pub running: bool,
    pub ducking: bool,
}

enum Wake {
    Input(Option<InputEvent>),
    PollTick,
    RevertDue,
}

/// The controller proper, generic over the backend API and the view so both
/// can be substituted in tests.
pub struct GameController<A, V> {
    api: A,
    view: V,
    session: Session,
    poll_timer: Option<Interval>,
    jump_revert: Option<Pin<Box<Sleep>>>,
}

impl<A: GameApi, V: GameView> GameController<A, V> {
    pub fn new(api: A, view: V) -> Self {
        Self {
            api,
            view,
            session: Session::default(),
            poll_timer: None,
            jump_revert: None,
        }
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn is_running(&self) -> bool {
        self.session.running
    }

    /// Whether a poll interval is currently armed.
    pub fn is_polling(&self) -> bool {
        self.poll_timer.is_some()
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    /// Start a session under `name`; blank names fall back to
    /// [`DEFAULT_PLAYER`]. On success the poll cadence begins; on failure
    /// the error is surfaced and nothing else changes.
    pub async fn start(&mut self, name: &str) {
        let trimmed = name.trim();
        let player = if trimmed.is_empty() {
            DEFAULT_PLAYER
        } else {
            trimmed
        };
        match self.api.start_game(player).await {
            Ok(reply) if reply.success => {
                debug!(player, game_id = reply.game_id.as_deref(), "session started");
                self.session.running = true;
                self.view.show_restart_control();
                self.view.set_status(STATUS_RUNNING);
                self.view.set_obstacle_visible(true);
                self.arm_poll();
            }
            Ok(reply) => self.alert_backend("start game", reply.error),
            Err(err) => self.alert_transport("start game", &err),
        }
    }

    /// Reset the current session. On success the score display, duck
    /// posture, and obstacle are reset and the poll interval is replaced
    /// with a fresh one; on failure prior state (including any live poll
    /// interval) is left untouched.
    pub async fn restart(&mut self) {
        match self.api.restart().await {
            Ok(reply) if reply.success => {
                debug!("session restarted");
                self.view.set_score(0);
                self.view.set_status(STATUS_RUNNING);
                self.session.ducking = false;
                self.view.set_ducking(false);
                self.view.set_obstacle_visible(true);
                self.session.running = true;
                self.arm_poll();
            }
            Ok(reply) => self.alert_backend("restart", reply.error),
            Err(err) => self.alert_transport("restart", &err),
        }
    }

    /// Attempt a jump. No-op while idle. The lift visual is applied only
    /// when the backend confirms the jump, and a fresh confirmation
    /// replaces any pending revert so exactly one is ever outstanding.
    pub async fn jump(&mut self) {
        if !self.session.running {
            return;
        }
        match self.api.jump().await {
            Ok(reply) if reply.success && reply.jump_ok => {
                self.view.set_jumping(true);
                self.jump_revert = Some(Box::pin(time::sleep(JUMP_REVERT_AFTER)));
            }
            Ok(_) => {} // refused: already airborne or game over
            Err(err) => self.alert_transport("jump", &err),
        }
    }

    /// Set the duck posture: explicit value if given, else the negation of
    /// the current flag. No-op while idle. The local flag and the visual
    /// flip only after the backend confirms the posture.
    pub async fn toggle_duck(&mut self, force: Option<bool>) {
        if !self.session.running {
            return;
        }
        let target = force.unwrap_or(!self.session.ducking);
        match self.api.duck(target).await {
            Ok(reply) if reply.success => {
                self.session.ducking = target;
                self.view.set_ducking(target);
            }
            Ok(_) => {}
            Err(err) => self.alert_transport("duck", &err),
        }
    }

    /// One poll tick: fetch the status snapshot and reflect it. Game-over
    /// ends the session cleanly; any failure abandons it.
    pub async fn poll(&mut self) {
        match self.api.update().await {
            Ok(reply) if reply.success => match reply.status {
                Some(status) => {
                    self.view.set_score(status.score);
                    if status.over {
                        self.finish(status.score);
                    }
                }
                None => self.abandon("reply carried no status"),
            },
            Ok(reply) => {
                let detail = reply.error.unwrap_or_else(|| "unknown error".to_string());
                self.abandon(&detail);
            }
            Err(err) => self.abandon(&err.to_string()),
        }
    }

    /// Drive the controller from an input channel until it closes or a
    /// [`InputEvent::Quit`] arrives. Poll ticks and jump reverts interleave
    /// with input on the same task.
    pub async fn run(&mut self, events: &mut mpsc::Receiver<InputEvent>) {
        loop {
            let wake = {
                let poll_timer = &mut self.poll_timer;
                let jump_revert = &mut self.jump_revert;
                tokio::select! {
                    ev = events.recv() => Wake::Input(ev),
                    _ = async {
                        match poll_timer.as_mut() {
                            Some(timer) => {
                                timer.tick().await;
                            }
                            None => std::future::pending().await,
                        }
                    } => Wake::PollTick,
                    _ = async {
                        match jump_revert.as_mut() {
                            Some(sleep) => sleep.as_mut().await,
                            None => std::future::pending().await,
                        }
                    } => Wake::RevertDue,
                }
            };
            match wake {
                Wake::Input(None) | Wake::Input(Some(InputEvent::Quit)) => break,
                Wake::Input(Some(event)) => self.handle(event).await,
                Wake::PollTick => self.poll().await,
                Wake::RevertDue => {
                    self.jump_revert = None;
                    self.view.set_jumping(false);
                }
            }
        }
    }

    async fn handle(&mut self, event: InputEvent) {
        match event {
            InputEvent::Start { name } => self.start(&name).await,
            InputEvent::Restart => self.restart().await,
            InputEvent::Jump => self.jump().await,
            InputEvent::DuckPressed => self.toggle_duck(Some(true)).await,
            InputEvent::DuckReleased => self.toggle_duck(Some(false)).await,
            InputEvent::Quit => {} // handled by the run loop
        }
    }

    /// Arm a fresh poll interval, dropping any previous one. The first tick
    /// lands one full period out, matching the backend's expected cadence.
    fn arm_poll(&mut self) {
        let mut timer = time::interval_at(Instant::now() + POLL_PERIOD, POLL_PERIOD);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        self.poll_timer = Some(timer);
    }

    fn finish(&mut self, score: u64) {
        debug!(score, "game over");
        self.session.running = false;
        self.poll_timer = None;
        self.view
            .set_status(&format!("Game over! Final score: {score}"));
        self.view.set_obstacle_visible(false);
    }

    /// A failed poll ends the session client-side even though the backend
    /// may still be simulating; retrying is out of scope.
    fn abandon(&mut self, detail: &str) {
        warn!(detail, "update poll failed, abandoning session");
        self.session.running = false;
        self.poll_timer = None;
        self.view.alert(&format!("Failed to update game: {detail}"));
    }

    fn alert_backend(&mut self, what: &str, error: Option<String>) {
        let detail = error.unwrap_or_else(|| "unknown error".to_string());
        self.view.alert(&format!("Failed to {what}: {detail}"));
    }

    fn alert_transport(&mut self, what: &str, err: &ApiError) {
        self.view.alert(&format!("Failed to {what}: {err}"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{AckReply, GameStatus, JumpReply, StartReply, UpdateReply};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::io;

    /// Scripted backend: every call pops the next reply for its endpoint and
    /// records itself. An empty queue means the test did not expect the call.
    #[derive(Default)]
    struct MockApi {
        calls: RefCell<Vec<String>>,
        start: RefCell<VecDeque<Result<StartReply, ApiError>>>,
        restart: RefCell<VecDeque<Result<AckReply, ApiError>>>,
        jump: RefCell<VecDeque<Result<JumpReply, ApiError>>>,
        duck: RefCell<VecDeque<Result<AckReply, ApiError>>>,
        update: RefCell<VecDeque<Result<UpdateReply, ApiError>>>,
    }

    impl MockApi {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn expect_start(&self, reply: Result<StartReply, ApiError>) {
            self.start.borrow_mut().push_back(reply);
        }

        fn expect_restart(&self, reply: Result<AckReply, ApiError>) {
            self.restart.borrow_mut().push_back(reply);
        }

        fn expect_jump(&self, reply: Result<JumpReply, ApiError>) {
            self.jump.borrow_mut().push_back(reply);
        }

        fn expect_duck(&self, reply: Result<AckReply, ApiError>) {
            self.duck.borrow_mut().push_back(reply);
        }

        fn expect_update(&self, reply: Result<UpdateReply, ApiError>) {
            self.update.borrow_mut().push_back(reply);
        }
    }

    impl GameApi for &MockApi {
        async fn start_game(&self, name: &str) -> Result<StartReply, ApiError> {
            self.calls.borrow_mut().push(format!("start:{name}"));
            self.start
                .borrow_mut()
                .pop_front()
                .expect("unexpected start_game call")
        }

        async fn restart(&self) -> Result<AckReply, ApiError> {
            self.calls.borrow_mut().push("restart".into());
            self.restart
                .borrow_mut()
                .pop_front()
                .expect("unexpected restart call")
        }

        async fn jump(&self) -> Result<JumpReply, ApiError> {
            self.calls.borrow_mut().push("jump".into());
            self.jump
                .borrow_mut()
                .pop_front()
                .expect("unexpected jump call")
        }

        async fn duck(&self, duck: bool) -> Result<AckReply, ApiError> {
            self.calls.borrow_mut().push(format!("duck:{duck}"));
            self.duck
                .borrow_mut()
                .pop_front()
                .expect("unexpected duck call")
        }

        async fn update(&self) -> Result<UpdateReply, ApiError> {
            self.calls.borrow_mut().push("update".into());
            self.update
                .borrow_mut()
                .pop_front()
                .expect("unexpected update call")
        }
    }

    #[derive(Debug, Default)]
    struct RecordingView {
        score: Option<u64>,
        status: String,
        ducking: bool,
        jumping: bool,
        obstacle_visible: bool,
        restart_shown: bool,
        alerts: Vec<String>,
    }

    impl GameView for RecordingView {
        fn set_score(&mut self, score: u64) {
            self.score = Some(score);
        }

        fn set_status(&mut self, text: &str) {
            self.status = text.to_string();
        }

        fn set_ducking(&mut self, ducking: bool) {
            self.ducking = ducking;
        }

        fn set_jumping(&mut self, lifted: bool) {
            self.jumping = lifted;
        }

        fn set_obstacle_visible(&mut self, visible: bool) {
            self.obstacle_visible = visible;
        }

        fn show_restart_control(&mut self) {
            self.restart_shown = true;
        }

        fn alert(&mut self, message: &str) {
            self.alerts.push(message.to_string());
        }
    }

    fn started() -> Result<StartReply, ApiError> {
        Ok(StartReply {
            success: true,
            game_id: Some("a1b2c3".into()),
            error: None,
        })
    }

    fn ack() -> Result<AckReply, ApiError> {
        Ok(AckReply {
            success: true,
            error: None,
        })
    }

    fn jump_reply(jump_ok: bool) -> Result<JumpReply, ApiError> {
        Ok(JumpReply {
            success: true,
            jump_ok,
        })
    }

    fn snapshot(score: u64, over: bool) -> Result<UpdateReply, ApiError> {
        Ok(UpdateReply {
            success: true,
            status: Some(GameStatus {
                name: "Alice".into(),
                score,
                jumping: false,
                ducking: false,
                over,
            }),
            error: None,
        })
    }

    fn broken_pipe(endpoint: &'static str) -> ApiError {
        ApiError::transport(endpoint, io::Error::new(io::ErrorKind::BrokenPipe, "boom"))
    }

    fn controller(api: &MockApi) -> GameController<&MockApi, RecordingView> {
        GameController::new(api, RecordingView::default())
    }

    #[tokio::test]
    async fn blank_name_falls_back_to_anonymous() {
        let api = MockApi::default();
        api.expect_start(started());
        let mut c = controller(&api);
        c.start("   ").await;
        assert_eq!(api.calls(), vec!["start:anonymous"]);
    }

    #[tokio::test]
    async fn start_success_begins_polling() {
        let api = MockApi::default();
        api.expect_start(started());
        let mut c = controller(&api);
        c.start("Alice").await;
        assert!(c.is_running());
        assert!(c.is_polling());
        assert_eq!(c.view().status, "Game in progress...");
        assert!(c.view().obstacle_visible);
        assert!(c.view().restart_shown);
        assert!(c.view().alerts.is_empty());
    }

    #[tokio::test]
    async fn start_failure_alerts_and_does_not_poll() {
        let api = MockApi::default();
        api.expect_start(Ok(StartReply {
            success: false,
            game_id: None,
            error: Some("name taken".into()),
        }));
        let mut c = controller(&api);
        c.start("Alice").await;
        assert!(!c.is_running());
        assert!(!c.is_polling());
        assert_eq!(c.view().alerts.len(), 1);
        assert!(c.view().alerts[0].contains("name taken"));
    }

    #[tokio::test]
    async fn start_transport_error_leaves_state_unchanged() {
        let api = MockApi::default();
        api.expect_start(Err(broken_pipe(crate::api::START_GAME)));
        let mut c = controller(&api);
        c.start("Alice").await;
        assert!(!c.is_running());
        assert!(!c.is_polling());
        assert!(c.view().alerts[0].contains("/api/start-game"));
    }

    #[tokio::test]
    async fn restart_resets_score_duck_and_timer() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_duck(ack());
        api.expect_restart(ack());
        let mut c = controller(&api);
        c.start("Alice").await;
        c.toggle_duck(Some(true)).await;
        assert!(c.session().ducking);

        c.restart().await;
        assert!(c.is_running());
        assert!(c.is_polling());
        assert_eq!(c.view().score, Some(0));
        assert!(!c.session().ducking);
        assert!(!c.view().ducking);
        assert!(c.view().obstacle_visible);
    }

    #[tokio::test]
    async fn restart_failure_leaves_prior_session_alone() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_restart(Err(broken_pipe(crate::api::RESTART)));
        let mut c = controller(&api);
        c.start("Alice").await;
        c.restart().await;
        // Old session keeps running on its old timer.
        assert!(c.is_running());
        assert!(c.is_polling());
        assert_eq!(c.view().alerts.len(), 1);
    }

    #[tokio::test]
    async fn jump_when_idle_sends_nothing() {
        let api = MockApi::default();
        let mut c = controller(&api);
        c.jump().await;
        assert!(api.calls().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn confirmed_jump_lifts_and_later_jump_supersedes_revert() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_jump(jump_reply(true));
        api.expect_jump(jump_reply(true));
        let mut c = controller(&api);
        c.start("Alice").await;

        c.jump().await;
        assert!(c.view().jumping);
        let first_deadline = c.jump_revert.as_ref().map(|s| s.deadline()).unwrap();

        time::advance(Duration::from_millis(200)).await;
        c.jump().await;
        let second_deadline = c.jump_revert.as_ref().map(|s| s.deadline()).unwrap();
        // The pending revert was replaced, not stacked.
        assert!(second_deadline > first_deadline);
    }

    #[tokio::test]
    async fn refused_jump_applies_no_lift() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_jump(jump_reply(false));
        let mut c = controller(&api);
        c.start("Alice").await;
        c.jump().await;
        assert!(!c.view().jumping);
        assert!(c.jump_revert.is_none());
    }

    #[tokio::test]
    async fn duck_when_idle_sends_nothing_and_keeps_class() {
        let api = MockApi::default();
        let mut c = controller(&api);
        c.toggle_duck(None).await;
        assert!(api.calls().is_empty());
        assert!(!c.view().ducking);
    }

    #[tokio::test]
    async fn duck_flag_flips_only_after_confirmation() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_duck(Err(broken_pipe(crate::api::DUCK)));
        api.expect_duck(ack());
        let mut c = controller(&api);
        c.start("Alice").await;

        c.toggle_duck(None).await;
        assert!(!c.session().ducking, "unconfirmed duck must not flip");
        assert!(!c.view().ducking);
        assert_eq!(c.view().alerts.len(), 1);

        c.toggle_duck(None).await;
        assert!(c.session().ducking);
        assert!(c.view().ducking);
        // The unconfirmed attempt did not consume the toggle: both sends
        // targeted duck=true.
        assert_eq!(api.calls(), vec!["start:Alice", "duck:true", "duck:true"]);
    }

    #[tokio::test]
    async fn forced_duck_twice_is_idempotent() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_duck(ack());
        api.expect_duck(ack());
        let mut c = controller(&api);
        c.start("Alice").await;
        c.toggle_duck(Some(true)).await;
        c.toggle_duck(Some(true)).await;
        assert!(c.session().ducking);
        assert!(c.view().ducking);
        assert_eq!(api.calls(), vec!["start:Alice", "duck:true", "duck:true"]);
    }

    #[tokio::test]
    async fn unforced_duck_negates_current_posture() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_duck(ack());
        api.expect_duck(ack());
        let mut c = controller(&api);
        c.start("Alice").await;
        c.toggle_duck(None).await;
        c.toggle_duck(None).await;
        assert_eq!(api.calls(), vec!["start:Alice", "duck:true", "duck:false"]);
        assert!(!c.session().ducking);
    }

    #[tokio::test]
    async fn poll_game_over_ends_session() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_update(snapshot(42, true));
        let mut c = controller(&api);
        c.start("Alice").await;
        c.poll().await;
        assert_eq!(c.view().score, Some(42));
        assert!(c.view().status.contains("42"));
        assert!(!c.view().obstacle_visible);
        assert!(!c.is_running());
        assert!(!c.is_polling());
        assert!(c.view().alerts.is_empty());
    }

    #[tokio::test]
    async fn poll_backend_failure_abandons_session() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_update(Ok(UpdateReply {
            success: false,
            status: None,
            error: Some("game not started".into()),
        }));
        let mut c = controller(&api);
        c.start("Alice").await;
        c.poll().await;
        assert!(!c.is_running());
        assert!(!c.is_polling());
        assert!(c.view().alerts[0].contains("game not started"));
    }

    #[tokio::test]
    async fn poll_missing_status_abandons_session() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_update(Ok(UpdateReply {
            success: true,
            status: None,
            error: None,
        }));
        let mut c = controller(&api);
        c.start("Alice").await;
        c.poll().await;
        assert!(!c.is_running());
        assert!(!c.is_polling());
        assert_eq!(c.view().alerts.len(), 1);
    }

    #[tokio::test]
    async fn poll_transport_error_abandons_session() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_update(Err(broken_pipe(crate::api::UPDATE)));
        let mut c = controller(&api);
        c.start("Alice").await;
        c.poll().await;
        assert!(!c.is_running());
        assert!(!c.is_polling());
        assert!(c.view().alerts[0].contains("/api/update"));
    }

    /// Drives the full event loop under a paused clock: one poll fires at
    /// +100ms and reports game over; the mock would panic on any further
    /// update call, proving the cadence stopped.
    #[tokio::test(start_paused = true)]
    async fn run_loop_stops_issuing_requests_after_game_over() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_update(snapshot(500, true));
        let mut c = controller(&api);

        let (tx, mut rx) = mpsc::channel(8);
        let script = async {
            tx.send(InputEvent::Start {
                name: "Alice".into(),
            })
            .await
            .unwrap();
            // Long enough for ten cadences, had the timer survived.
            time::sleep(Duration::from_millis(1000)).await;
            drop(tx);
        };
        tokio::join!(c.run(&mut rx), script);

        assert_eq!(api.calls(), vec!["start:Alice", "update"]);
        assert!(!c.is_running());
    }

    /// The revert arm of the run loop clears the lift after 500ms.
    #[tokio::test(start_paused = true)]
    async fn run_loop_reverts_jump_lift() {
        let api = MockApi::default();
        api.expect_start(started());
        api.expect_jump(jump_reply(true));
        // Polls keep firing while we wait out the revert.
        for _ in 0..12 {
            api.expect_update(snapshot(1, false));
        }
        let mut c = controller(&api);

        let (tx, mut rx) = mpsc::channel(8);
        let script = async {
            tx.send(InputEvent::Start {
                name: "Alice".into(),
            })
            .await
            .unwrap();
            tx.send(InputEvent::Jump).await.unwrap();
            time::sleep(Duration::from_millis(700)).await;
            drop(tx);
        };
        tokio::join!(c.run(&mut rx), script);

        assert!(!c.view().jumping, "lift must revert after the delay");
        assert!(c.jump_revert.is_none());
    }
}
