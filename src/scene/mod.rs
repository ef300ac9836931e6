//! Scene tracking and scene events.

pub mod events;
pub mod manager;

pub use events::{
    EventHandler, EventHandlers, HandlerId, LoadSceneFailureEventArgs, LoadSceneSuccessEventArgs,
    NotifyOutcome, UnloadSceneFailureEventArgs, UnloadSceneSuccessEventArgs,
};
pub use manager::SceneManager;
