/// ┌──────────────── Lifecycle Transitions ─────────────────────┐
/// │  From State     →  Event              →  To State          │
/// ├────────────────────────────────────────────────────────────┤
/// │  Uninitialized  →  Load               →  Loading           │
/// │  Loading        →  Ready { running }  →  Running / Paused  │
/// │  Paused         →  Start | Toggle     →  Running           │
/// │  Running        →  Stop  | Toggle     →  Paused            │
/// │  -------           ------                                  │
/// │  anything else  →  ignored            →  same state        │
/// └────────────────────────────────────────────────────────────┘
///
/// Frames, resizes and timers don't change the state, they're handled by the
/// controller on top of whatever state it's in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Uninitialized,
    Loading,
    Paused,
    Running,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Load,
    Ready { running: bool },
    Start,
    Stop,
    Toggle,
}

impl State {
    pub fn transition(self, event: Event) -> Self {
        use State::*;
        match (self, event) {
            (Uninitialized, Event::Load) => Loading,
            (Loading, Event::Ready { running: true }) => Running,
            (Loading, Event::Ready { running: false }) => Paused,
            (Paused, Event::Start | Event::Toggle) => Running,
            (Running, Event::Stop | Event::Toggle) => Paused,
            (state, _) => state,
        }
    }

    pub fn is_running(self) -> bool {
        self == State::Running
    }

    pub fn name(self) -> &'static str {
        match self {
            State::Uninitialized => "uninitialized",
            State::Loading => "loading",
            State::Paused => "paused",
            State::Running => "running",
        }
    }
}
